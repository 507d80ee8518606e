//! HTTP/1 server loop.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::Instrument;
use uuid::Uuid;

use crate::router::Router;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Serves `router` on `addr` until Ctrl-C, then waits for open connections
/// to finish.
pub async fn serve(router: Router, addr: &str) -> std::io::Result<()> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let listener = TcpListener::bind(addr).await?;
    serve_listener(router, listener, shutdown_signal()).await
}

/// Serves `router` on an already bound listener until `shutdown` completes.
pub async fn serve_listener<S>(
    router: Router,
    listener: TcpListener,
    shutdown: S,
) -> std::io::Result<()>
where
    S: std::future::Future<Output = ()>,
{
    tracing::info!(addr = %listener.local_addr()?, routes = router.len(), "listening");

    let router = Arc::new(router);
    let graceful = GracefulShutdown::new();
    let mut shutdown = std::pin::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                        continue;
                    }
                };

                let router = router.clone();
                let service = service_fn(move |req: Request<Incoming>| {
                    let router = router.clone();
                    let span = tracing::info_span!(
                        "request",
                        method = %req.method(),
                        path = %req.uri().path(),
                        request_id = %Uuid::new_v4(),
                    );
                    async move {
                        let response = router.handle(req).await;
                        tracing::debug!(status = response.status().as_u16(), "handled");
                        Ok::<_, Infallible>(response)
                    }
                    .instrument(span)
                });

                let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
                let conn = graceful.watch(conn);
                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        tracing::debug!(peer = %peer, error = %e, "connection closed with error");
                    }
                });
            }
            () = &mut shutdown => {
                tracing::info!("shutting down");
                break;
            }
        }
    }

    tokio::select! {
        () = graceful.shutdown() => {}
        () = tokio::time::sleep(SHUTDOWN_GRACE) => {
            tracing::warn!("timed out waiting for connections to close");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
