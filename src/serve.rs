use std::io;
use std::sync::Arc;
use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::{debug, info};

use crate::config::Config;
use crate::connection::Connection;
use crate::transport::TcpTransport;

/// Failed to set up the accept loop.
#[derive(thiserror::Error, Debug)]
pub enum ServeError {
    #[error("failed to bind tcp: {0}")]
    Bind(io::Error),
}

/// Bind `addr` and serve connections with `config`.
pub async fn listen(addr: impl ToSocketAddrs, config: Config) -> Result<(), ServeError> {
    let tcp = TcpListener::bind(addr).await.map_err(ServeError::Bind)?;
    serve(tcp, config).await
}

/// Serve an already-bound listener, one spawned task per accepted
/// connection.
///
/// Every request's environment carries the acceptor's local address under
/// `listener`, overriding any seed entry of that name.
pub async fn serve(tcp: TcpListener, mut config: Config) -> Result<(), ServeError> {
    if let Ok(addr) = tcp.local_addr() {
        info!(listener = %addr, "accepting connections");
        config.env.insert("listener", addr);
    }
    let config = Arc::new(config);

    loop {
        match tcp.accept().await {
            Ok((stream, _)) => {
                let connection = Connection::new(TcpTransport::new(stream), Arc::clone(&config));
                tokio::spawn(connection.run());
            }
            Err(err) => debug!(error = %err, "failed to accept connection"),
        }
    }
}
