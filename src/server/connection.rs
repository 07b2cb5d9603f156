// Connection handling module
// Admits an accepted TCP stream and serves HTTP/1.1 on it in a local task

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Response;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpStream;

use crate::config::AppState;
use crate::handler;
use crate::http;
use crate::logger;

/// Admit a connection unless the configured limit is reached, then serve it.
///
/// The counter is incremented before the limit check and rolled back on
/// rejection, so concurrent accepts never overshoot the limit.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Rejected {peer_addr}"
            ));
            drop(stream);
            return;
        }
    }

    handle_connection(stream, peer_addr, Arc::clone(state), Arc::clone(conn_counter));
}

/// Serve one connection on the current `LocalSet`.
///
/// `read_timeout` bounds the wait for each request head, including idle
/// keep-alive time. `write_timeout` bounds each request from head to
/// response, so an upload must complete within it. The counter is released
/// however the connection ends.
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::task::spawn_local(async move {
        let performance = &state.config.performance;
        let request_timeout = Duration::from_secs(performance.write_timeout);

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(Duration::from_secs(performance.read_timeout))
            .keep_alive(performance.keep_alive_timeout > 0);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            TokioIo::new(stream),
            service_fn(move |req| {
                let request = handler::handle_request(req, Arc::clone(&service_state), peer_addr);
                respond_within(request_timeout, peer_addr, request)
            }),
        );

        if let Err(err) = conn.await {
            logger::log_connection_error(&err);
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Answer 408 when the request is not handled within `limit`
async fn respond_within<F>(
    limit: Duration,
    peer_addr: SocketAddr,
    request: F,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    F: Future<Output = Result<Response<Full<Bytes>>, Infallible>>,
{
    if let Ok(response) = tokio::time::timeout(limit, request).await {
        response
    } else {
        logger::log_warning(&format!(
            "Request from {peer_addr} timed out after {} seconds",
            limit.as_secs()
        ));
        Ok(http::build_408_response())
    }
}
