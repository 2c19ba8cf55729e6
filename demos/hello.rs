use gable::{Config, Env, Outcome, Request, Response, StatusCode, middleware};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), gable::ServeError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::new().middleware(middleware::from_fn(handle));

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build runtime")
        .block_on(gable::listen("0.0.0.0:3000", config))
}

async fn handle(mut req: Request, env: Env) -> Outcome {
    tracing::debug!("{req:#?}");

    let body = format!(
        "hello {} from {}\n",
        String::from_utf8_lossy(req.path()),
        req.peer(),
    );
    req.respond(
        Response::new(StatusCode::OK)
            .with_header(&b"content-type"[..], &b"text/plain"[..])
            .with_body(body.into_bytes()),
    );
    Outcome::Next(req, env)
}
