use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use hyper::{server::conn::http1, service::service_fn};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::app::App;

pub mod auth;
pub mod response;
pub mod routes;

pub async fn serve(app: Arc<App>, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{addr}");
    info!("1. Login first: http://{addr}/auth/login");
    info!("2. Then POST to: http://{addr}/playlist/generate");

    loop {
        let accepted = tokio::select! {
            accepted = listener.accept() => accepted,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                return Ok(());
            }
        };
        let (stream, peer) = match accepted {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Failed to accept connection: {e}");
                continue;
            }
        };

        let app = app.clone();
        tokio::spawn(async move {
            let service = service_fn(move |req| routes::handle(app.clone(), req));
            if let Err(e) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                debug!(%peer, "connection ended with error: {e}");
            }
        });
    }
}
