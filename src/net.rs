//! Shared HTTP plumbing for the three remote services.
//!
//! All external calls are blocking request/response from the user's point of
//! view; there is no task-level concurrency. Transient transport failures
//! (connect errors, timeouts, 5xx responses) are retried a bounded number of
//! times with exponential backoff. Client errors (4xx) are never retried —
//! a 404 from the polygon host is a real answer, not an outage.

use std::time::Duration;

use tracing::{debug, warn};

use crate::errors::FetchError;

/// User agent sent on every outbound request. Nominatim in particular
/// rejects requests without one.
pub const USER_AGENT: &str = concat!("pricemap/", env!("CARGO_PKG_VERSION"));

const BACKOFF_BASE_MS: u64 = 250;

/// Build a reqwest client with the configured request timeout.
pub fn client(timeout: Duration) -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|source| FetchError::Transport {
            service: "http client",
            source,
        })
}

/// Whether a failed send is worth retrying: connection problems and
/// timeouts are transient; anything else (TLS, redirect loops, bad
/// request construction) will not improve on a second attempt.
fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}

/// Send a request, retrying up to `retries` times on transient failures.
///
/// Server errors (5xx) count as transient; the last 5xx response is
/// converted into `FetchError::Transport` once the budget is exhausted.
/// Any non-5xx response — including 404 — is returned to the caller
/// untouched so service-specific status handling stays with the service.
pub async fn send_with_retry(
    request: reqwest::RequestBuilder,
    service: &'static str,
    retries: u32,
) -> Result<reqwest::Response, FetchError> {
    let mut attempt = 0u32;
    loop {
        let this_try = request
            .try_clone()
            .ok_or_else(|| FetchError::Malformed {
                service,
                message: "request body is not cloneable for retry".to_string(),
            })?;

        let outcome = this_try.send().await;
        let retryable = match &outcome {
            Ok(resp) => resp.status().is_server_error(),
            Err(err) => is_transient(err),
        };

        if retryable && attempt < retries {
            let delay = Duration::from_millis(BACKOFF_BASE_MS << attempt);
            warn!(service, attempt, ?delay, "transient failure, backing off");
            tokio::time::sleep(delay).await;
            attempt += 1;
            continue;
        }

        return match outcome {
            Ok(resp) if resp.status().is_server_error() => match resp.error_for_status() {
                Ok(resp) => Ok(resp),
                Err(source) => Err(FetchError::Transport { service, source }),
            },
            Ok(resp) => {
                debug!(service, status = %resp.status(), "response received");
                Ok(resp)
            }
            Err(source) => Err(FetchError::Transport { service, source }),
        };
    }
}

/// Test-only HTTP stub: bind a localhost listener, answer one request with
/// a canned response, then exit. Lets client tests drive real status codes
/// and bodies without a mock-server dependency.
#[cfg(test)]
pub(crate) fn serve_once(response: String) -> String {
    use std::io::{Read, Write};
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind localhost listener");
    let addr = listener.local_addr().expect("listener address");
    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            while let Ok(n) = stream.read(&mut chunk) {
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                if request_complete(&request) {
                    break;
                }
            }
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{addr}")
}

/// Render a canned HTTP/1.1 response for [`serve_once`].
#[cfg(test)]
pub(crate) fn http_response(status_line: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

// Headers received in full, plus the body its Content-Length promises.
#[cfg(test)]
fn request_complete(request: &[u8]) -> bool {
    let Some(header_end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    request.len() >= header_end + 4 + content_length
}
