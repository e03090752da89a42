use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::debug;

/// A stub upstream service running on an ephemeral loopback port.
///
/// The server task is aborted when the handle is dropped.
pub struct UpstreamHandle {
    pub addr: SocketAddr,
    task: JoinHandle<()>,
}

impl UpstreamHandle {
    /// Absolute URL for `path` on this upstream, e.g. `http://127.0.0.1:41234/api`.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Same as [`url`](Self::url) but addressed as `localhost`.
    pub fn localhost_url(&self, path: &str) -> String {
        format!("http://localhost:{}{}", self.addr.port(), path)
    }
}

impl Drop for UpstreamHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Serve `router` on `127.0.0.1:0` in a background task.
pub async fn spawn_upstream(router: Router) -> Result<UpstreamHandle> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            debug!(error = %e, "stub upstream stopped");
        }
    });
    Ok(UpstreamHandle { addr, task })
}

/// Serve `response` verbatim to every connection, then close it.
///
/// For upstreams no well-behaved HTTP server would produce, such as a body
/// shorter than its `Content-Length`. The request head is read and ignored.
pub async fn spawn_raw_upstream(response: &'static [u8]) -> Result<UpstreamHandle> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let task = tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                if let Err(e) = stream.write_all(response).await {
                    debug!(error = %e, "raw upstream write failed");
                }
                let _ = stream.shutdown().await;
            });
        }
    });
    Ok(UpstreamHandle { addr, task })
}

/// A loopback address nothing is listening on.
///
/// The port is bound and released immediately, so connecting to it is
/// refused unless another process grabs it in between.
pub async fn unused_local_addr() -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}
