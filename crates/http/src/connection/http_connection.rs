use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use http::StatusCode;
use http::header::CONNECTION;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, error, info, warn};

use crate::codec::{RequestDecoder, ResponseEncoder};
use crate::handler::Handler;
use crate::protocol::{HttpError, ParseError, Request, Response};

pub const DEFAULT_READ_BUFFER_CAPACITY: usize = 8 * 1024;
pub const DEFAULT_MISSING_CONTENT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A server-side HTTP/1.1 connection.
///
/// Requests are served strictly one after another: the next request is not handed to the
/// handler before the response to the previous one has been written, so pipelined requests are
/// answered in arrival order.
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, ResponseEncoder>,
    missing_content_timeout: Duration,
    poll_interval: Duration,
}

impl<R, W> fmt::Debug for HttpConnection<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConnection")
            .field("missing_content_timeout", &self.missing_content_timeout)
            .field("poll_interval", &self.poll_interval)
            .field("buffered", &self.framed_read.decoder().parser().buffered_len())
            .finish_non_exhaustive()
    }
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_capacity(reader, writer, DEFAULT_READ_BUFFER_CAPACITY)
    }

    pub fn with_capacity(reader: R, writer: W, read_buffer_capacity: usize) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::new(), read_buffer_capacity),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
            missing_content_timeout: DEFAULT_MISSING_CONTENT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// How long a partially received request may wait for its remaining bytes.
    #[must_use]
    pub fn missing_content_timeout(mut self, missing_content_timeout: Duration) -> Self {
        self.missing_content_timeout = missing_content_timeout;
        self
    }

    /// How often a waiting read wakes up to check the missing-content timeout.
    #[must_use]
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
    {
        loop {
            match self.next_request().await {
                Some(Ok(request)) => {
                    let close = request.wants_close();
                    self.do_process(request, &handler, close).await?;
                    if close {
                        info!("client asked to close, break this connection down");
                        return Ok(());
                    }
                }

                Some(Err(e)) => {
                    error!(cause = %e, "can't receive next request");
                    if let Some(status) = error_status(&e) {
                        self.do_send_response(error_response(status)).await?;
                    }
                    return Err(e.into());
                }

                None => {
                    info!("cant read more request, break this connection down");
                    return Ok(());
                }
            }
        }
    }

    /// Waits for the next complete request, failing once a partial one has waited too long.
    ///
    /// An idle connection, with nothing buffered, is not subject to the timeout.
    async fn next_request(&mut self) -> Option<Result<Request, ParseError>> {
        loop {
            match timeout(self.poll_interval, self.framed_read.next()).await {
                Ok(next) => return next,
                Err(_elapsed) => {
                    let decoder = self.framed_read.decoder();
                    if decoder.has_missing_content_time_expired(self.missing_content_timeout) {
                        let waited_ms = decoder.parser().missing_content_elapsed().unwrap_or_default().as_millis();
                        warn!(waited_ms, buffered = decoder.parser().buffered_len(), "missing content timeout");
                        return Some(Err(ParseError::MissingContentTimeout { waited_ms }));
                    }
                    debug!(missing_content = decoder.is_missing_content(), "waiting for more request bytes");
                }
            }
        }
    }

    async fn do_process<H>(&mut self, request: Request, handler: &Arc<H>, close: bool) -> Result<(), HttpError>
    where
        H: Handler,
    {
        let response = match handler.call(request).await {
            Ok(response) => response,
            Err(e) => {
                let cause: Box<dyn Error + Send + Sync> = e.into();
                error!(%cause, "handle request error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        };

        let response = if close && !response.headers().contains(CONNECTION.as_str()) {
            response.and_header(CONNECTION.as_str(), "close")
        } else {
            response
        };

        self.do_send_response(response).await
    }

    async fn do_send_response(&mut self, response: Response) -> Result<(), HttpError> {
        self.framed_write.send(response).await?;
        Ok(())
    }
}

fn error_status(e: &ParseError) -> Option<StatusCode> {
    match e {
        ParseError::MissingContentTimeout { .. } => Some(StatusCode::REQUEST_TIMEOUT),
        ParseError::TooLargeHeader { .. } | ParseError::TooManyHeaders { .. } => Some(StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE),
        ParseError::Io { .. } => None,
        _ => Some(StatusCode::BAD_REQUEST),
    }
}

fn error_response(status: StatusCode) -> Response {
    Response::of(status).and_header(CONNECTION.as_str(), "close")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ResponseDecoder;
    use crate::handler::make_handler;
    use std::io;
    use tokio::io::{AsyncWriteExt, DuplexStream, ReadHalf};

    fn echo_path_connection(server: DuplexStream, missing_content_timeout: Duration) -> tokio::task::JoinHandle<Result<(), HttpError>> {
        let (reader, writer) = tokio::io::split(server);
        let handler = Arc::new(make_handler(|request: Request| async move {
            if request.uri().path() == "/fail" {
                return Err(io::Error::other("handler failed"));
            }
            Ok(Response::with_body(StatusCode::OK, request.uri().path().to_string()))
        }));
        let connection = HttpConnection::new(reader, writer).missing_content_timeout(missing_content_timeout).poll_interval(Duration::from_millis(10));
        tokio::spawn(connection.process(handler))
    }

    async fn read_responses(reader: ReadHalf<DuplexStream>) -> Vec<Response> {
        FramedRead::new(reader, ResponseDecoder::new()).filter_map(|r| async move { r.ok() }).collect().await
    }

    #[tokio::test]
    async fn pipelined_requests_are_answered_in_order() {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let task = echo_path_connection(server, DEFAULT_MISSING_CONTENT_TIMEOUT);

        let (reader, mut writer) = tokio::io::split(client);
        writer
            .write_all(b"GET /1 HTTP/1.1\r\n\r\nPOST /2 HTTP/1.1\r\nContent-Length: 3\r\n\r\nabcGET /3 HTTP/1.1\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();

        let responses = read_responses(reader).await;
        let bodies = responses.iter().map(|r| r.body().text()).collect::<Vec<_>>();
        assert_eq!(bodies, vec!["/1", "/2", "/3"]);
        assert_eq!(responses[2].headers().get("connection"), Some("close"));

        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn handler_error_is_internal_server_error() {
        let (client, server) = tokio::io::duplex(4096);
        let task = echo_path_connection(server, DEFAULT_MISSING_CONTENT_TIMEOUT);

        let (reader, mut writer) = tokio::io::split(client);
        writer.write_all(b"GET /fail HTTP/1.1\r\n\r\nGET /ok HTTP/1.1\r\nConnection: close\r\n\r\n").await.unwrap();

        let responses = read_responses(reader).await;
        assert_eq!(responses[0].status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(responses[1].body().text(), "/ok");
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn malformed_request_is_bad_request() {
        let (client, server) = tokio::io::duplex(4096);
        let task = echo_path_connection(server, DEFAULT_MISSING_CONTENT_TIMEOUT);

        let (reader, mut writer) = tokio::io::split(client);
        writer.write_all(b"GARBAGE\r\n\r\n").await.unwrap();

        let responses = read_responses(reader).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].status(), StatusCode::BAD_REQUEST);
        assert!(matches!(task.await.unwrap(), Err(HttpError::RequestError { .. })));
    }

    #[tokio::test]
    async fn partial_request_times_out() {
        let (client, server) = tokio::io::duplex(4096);
        let task = echo_path_connection(server, Duration::from_millis(50));

        let (reader, mut writer) = tokio::io::split(client);
        writer.write_all(b"POST /slow HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc").await.unwrap();

        let responses = read_responses(reader).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].status(), StatusCode::REQUEST_TIMEOUT);
        assert!(matches!(
            task.await.unwrap(),
            Err(HttpError::RequestError { source: ParseError::MissingContentTimeout { .. } })
        ));
    }

    #[tokio::test]
    async fn oversized_head_is_header_fields_too_large() {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let task = echo_path_connection(server, DEFAULT_MISSING_CONTENT_TIMEOUT);

        let (reader, mut writer) = tokio::io::split(client);
        let request = format!("GET / HTTP/1.1\r\nX-Big: {}\r\n\r\n", "x".repeat(9 * 1024));
        writer.write_all(request.as_bytes()).await.unwrap();

        let responses = read_responses(reader).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].status(), StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE);
        assert!(matches!(task.await.unwrap(), Err(HttpError::RequestError { source: ParseError::TooLargeHeader { .. } })));
    }

    #[tokio::test]
    async fn trailing_blank_line_does_not_time_out() {
        let (client, server) = tokio::io::duplex(4096);
        let task = echo_path_connection(server, Duration::from_millis(30));

        let (reader, mut writer) = tokio::io::split(client);
        writer.write_all(b"GET /a HTTP/1.1\r\n\r\n\r\n").await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        writer.write_all(b"GET /b HTTP/1.1\r\nConnection: close\r\n\r\n").await.unwrap();

        let responses = read_responses(reader).await;
        let bodies = responses.iter().map(|r| r.body().text()).collect::<Vec<_>>();
        assert_eq!(bodies, vec!["/a", "/b"]);
        assert!(task.await.unwrap().is_ok());
    }

    #[test]
    fn debug_shows_timing() {
        let (_client, server) = tokio::io::duplex(64);
        let (reader, writer) = tokio::io::split(server);
        let connection = HttpConnection::new(reader, writer).poll_interval(Duration::from_millis(25));

        let debug = format!("{connection:?}");
        assert!(debug.starts_with("HttpConnection {"));
        assert!(debug.contains("poll_interval: 25ms"));
        assert!(debug.contains("buffered: 0"));
    }
}
