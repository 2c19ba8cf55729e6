//! Request-processing middleware chain.
//!
//! Middlewares run in order; each execution resolves to an [`Outcome`]:
//! continue with the next middleware, suspend and re-enter through a
//! captured call, or stop the chain. Long-running steps return
//! [`Outcome::Suspend`] so the task yields instead of holding the executor.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::env::{Env, HandlerResult};
use crate::request::Request;

/// Future resolving to a middleware [`Outcome`].
pub type MiddlewareFuture = Pin<Box<dyn Future<Output = Outcome> + Send>>;

/// One step of the request-processing chain.
pub trait Middleware: Send + Sync {
    fn execute(&self, req: Request, env: Env) -> MiddlewareFuture;
}

/// Three-way outcome of a middleware execution.
pub enum Outcome {
    /// Advance to the next middleware with the updated request and
    /// environment.
    Next(Request, Env),
    /// Park the task, then re-enter through the captured call. The call's
    /// own outcome is interpreted exactly like a direct return, with the
    /// remaining chain tail unchanged.
    Suspend(Continuation),
    /// Skip the remaining middlewares.
    Stop(Request),
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Next(..) => f.write_str("Next"),
            Self::Suspend(..) => f.write_str("Suspend"),
            Self::Stop(..) => f.write_str("Stop"),
        }
    }
}

/// Call captured by [`Outcome::Suspend`], re-entered after the task yields.
pub struct Continuation(Box<dyn FnOnce() -> MiddlewareFuture + Send>);

impl Continuation {
    pub fn new(call: impl FnOnce() -> MiddlewareFuture + Send + 'static) -> Self {
        Self(Box::new(call))
    }

    fn resume(self) -> MiddlewareFuture {
        (self.0)()
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation").finish_non_exhaustive()
    }
}

/// Adapt an async function into a [`Middleware`].
pub fn from_fn<F, Fut>(f: F) -> FromFn<F>
where
    F: Fn(Request, Env) -> Fut + Send + Sync,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    FromFn { f }
}

#[derive(Debug)]
pub struct FromFn<F> {
    f: F,
}

impl<F, Fut> Middleware for FromFn<F>
where
    F: Fn(Request, Env) -> Fut + Send + Sync,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    fn execute(&self, req: Request, env: Env) -> MiddlewareFuture {
        Box::pin((self.f)(req, env))
    }
}

/// Run `req` through the chain, returning it with the handler result.
///
/// An exhausted chain reads the result from the environment entry `result`;
/// [`Outcome::Stop`] short-circuits with [`HandlerResult::Ok`].
pub(crate) async fn execute(
    middlewares: &[Arc<dyn Middleware>],
    mut req: Request,
    mut env: Env,
) -> (Request, HandlerResult) {
    for middleware in middlewares {
        let mut outcome = middleware.execute(req, env).await;
        loop {
            match outcome {
                Outcome::Next(r, e) => {
                    req = r;
                    env = e;
                    break;
                }
                Outcome::Suspend(continuation) => {
                    tokio::task::yield_now().await;
                    outcome = continuation.resume().await;
                }
                Outcome::Stop(r) => return (r, HandlerResult::Ok),
            }
        }
    }
    let result = env.handler_result();
    (req, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Env, HandlerResult};
    use crate::request::Request;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_chain_order_and_env_threading() {
        let chain: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(from_fn(|req: Request, mut env: Env| async move {
                env.insert("step", 1u32);
                Outcome::Next(req, env)
            })),
            Arc::new(from_fn(|req: Request, mut env: Env| async move {
                let step = *env.get::<u32>("step").unwrap();
                env.insert("step", step + 1);
                Outcome::Next(req, env)
            })),
        ];

        let (_, result) = execute(&chain, Request::stub(), Env::new()).await;
        assert_eq!(result, HandlerResult::Ok);
    }

    #[tokio::test]
    async fn test_stop_skips_tail() {
        let reached = Arc::new(AtomicUsize::new(0));
        let tail_reached = Arc::clone(&reached);

        let chain: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(from_fn(|req: Request, _: Env| async move { Outcome::Stop(req) })),
            Arc::new(from_fn(move |req: Request, env: Env| {
                tail_reached.fetch_add(1, Ordering::SeqCst);
                async move { Outcome::Next(req, env) }
            })),
        ];

        let (_, result) = execute(&chain, Request::stub(), Env::new()).await;
        assert_eq!(result, HandlerResult::Ok);
        assert_eq!(reached.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_suspend_resumes_with_tail() {
        let order = Arc::new(AtomicUsize::new(0));

        let resumed = Arc::clone(&order);
        let after = Arc::clone(&order);

        let chain: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(from_fn(move |req: Request, env: Env| {
                let resumed = Arc::clone(&resumed);
                async move {
                    Outcome::Suspend(Continuation::new(move || {
                        Box::pin(async move {
                            resumed.fetch_add(1, Ordering::SeqCst);
                            Outcome::Next(req, env)
                        })
                    }))
                }
            })),
            Arc::new(from_fn(move |req: Request, env: Env| {
                // the tail still runs, after the resumed call
                assert_eq!(after.load(Ordering::SeqCst), 1);
                async move { Outcome::Next(req, env) }
            })),
        ];

        let (_, result) = execute(&chain, Request::stub(), Env::new()).await;
        assert_eq!(result, HandlerResult::Ok);
        assert_eq!(order.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_chain_reads_result_entry() {
        let chain: Vec<Arc<dyn Middleware>> = vec![Arc::new(from_fn(|req: Request, mut env: Env| {
            async move {
                env.insert("result", HandlerResult::Close);
                Outcome::Next(req, env)
            }
        }))];

        let (_, result) = execute(&chain, Request::stub(), Env::new()).await;
        assert_eq!(result, HandlerResult::Close);
    }

    #[tokio::test]
    async fn test_empty_chain_defaults_ok() {
        let (_, result) = execute(&[], Request::stub(), Env::new()).await;
        assert_eq!(result, HandlerResult::Ok);
    }
}
