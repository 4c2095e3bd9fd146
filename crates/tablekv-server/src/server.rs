//! HTTP server
//!
//! Accepts TCP connections and serves each one with hyper on its own task.

use crate::routes::{self, AppState};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ServerBuilder;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Bind a listener on `addr`
pub async fn bind(addr: SocketAddr) -> anyhow::Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))
}

/// Serve connections from `listener` until `shutdown` resolves.
///
/// Connections already accepted keep running after shutdown.
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    let builder = ServerBuilder::new(TokioExecutor::new());
    tokio::pin!(shutdown);

    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "listening");
    }

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, remote_addr)) => {
                        let io = TokioIo::new(stream);
                        let builder = builder.clone();
                        let state = Arc::clone(&state);

                        tokio::spawn(async move {
                            let svc = service_fn(move |req| {
                                let state = Arc::clone(&state);
                                async move { Ok::<_, Infallible>(routes::handle(&state, req).await) }
                            });

                            if let Err(e) = builder.serve_connection(io, svc).await {
                                tracing::warn!(%remote_addr, error = %e, "HTTP connection error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "accept error");
                    }
                }
            }
            _ = &mut shutdown => {
                tracing::info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}
