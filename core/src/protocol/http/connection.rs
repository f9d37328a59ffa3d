/*
 * connection.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Luxe, a small web browser.
 *
 * Luxe is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Luxe is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Luxe.  If not, see <http://www.gnu.org/licenses/>.
 */

//! HTTP connection: one TCP or TLS stream for a (scheme, host, port) identity. Writes GET
//! requests and drives the H1 parser into a [`Response`].
//!
//! Lifecycle: `connect` opens the stream lazily and is a no-op while it is open; `close` drops
//! it and is safe to call repeatedly. `read_response` closes the stream itself unless the
//! exchange was keep-alive and the body was length-delimited.

use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::client::TlsStream as TokioTlsStream;

use crate::error::{FetchError, ProtocolError};
use crate::net::wrap_tls;
use crate::protocol::http::h1::{H1ResponseHandler, ParseState, ResponseParser};
use crate::protocol::http::request::Request;
use crate::protocol::http::response::Response;
use crate::uri::{HttpTarget, Scheme};

const READ_CHUNK: usize = 8192;

/// Response headers whose presence fails the fetch: only identity, non-chunked bodies are read.
const UNSUPPORTED_ENCODINGS: [&str; 2] = ["transfer-encoding", "content-encoding"];

/// Reuse key for a connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
}

impl ConnectionKey {
    pub fn for_target(target: &HttpTarget) -> Self {
        Self {
            scheme: target.scheme(),
            host: target.host.clone(),
            port: target.port,
        }
    }

    pub fn is_secure(&self) -> bool {
        self.scheme == Scheme::Https
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// Unified stream: plain TCP or TLS. Implements AsyncRead + AsyncWrite.
pub enum HttpStream {
    Plain(TcpStream),
    Tls(Box<TokioTlsStream<TcpStream>>),
}

impl AsyncRead for HttpStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            HttpStream::Tls(s) => Pin::new(&mut **s).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for HttpStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            HttpStream::Tls(s) => Pin::new(&mut **s).poll_write(cx, buf),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_flush(cx),
            HttpStream::Tls(s) => Pin::new(&mut **s).poll_flush(cx),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            HttpStream::Tls(s) => Pin::new(&mut **s).poll_shutdown(cx),
        }
    }
}

/// Bridges H1 parser callbacks into a Response.
#[derive(Default)]
struct ResponseCollector {
    response: Response,
    body: Vec<u8>,
}

impl H1ResponseHandler for ResponseCollector {
    fn status(&mut self, version: &str, code: u16, reason: Option<&str>) {
        self.response.version = version.to_string();
        self.response.status = code;
        self.response.reason = reason.map(str::to_string);
    }

    fn header(&mut self, name: &str, value: &str) {
        self.response
            .headers
            .insert(name.to_string(), value.to_string());
    }

    fn body_chunk(&mut self, data: &[u8]) {
        self.body.extend_from_slice(data);
    }

    fn complete(&mut self) {
        let body = std::mem::take(&mut self.body);
        self.response.body = String::from_utf8_lossy(&body).into_owned();
    }
}

/// HTTP connection for one identity. Owned by a single Fetcher; requests on it never overlap.
pub struct HttpConnection {
    key: ConnectionKey,
    stream: Option<HttpStream>,
    read_buf: BytesMut,
    parser: ResponseParser,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    connects: u32,
}

impl HttpConnection {
    /// Create a closed connection for `key`. Nothing is opened until `connect`.
    pub fn new(key: ConnectionKey) -> Self {
        Self {
            key,
            stream: None,
            read_buf: BytesMut::with_capacity(READ_CHUNK),
            parser: ResponseParser::new(),
            connect_timeout: None,
            read_timeout: None,
            connects: 0,
        }
    }

    pub fn with_timeouts(mut self, connect: Option<Duration>, read: Option<Duration>) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }

    pub fn key(&self) -> &ConnectionKey {
        &self.key
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// How many times a socket has been opened for this identity.
    pub fn connect_count(&self) -> u32 {
        self.connects
    }

    /// Open the stream (TCP, then TLS for https). No-op if already open.
    pub async fn connect(&mut self) -> Result<(), FetchError> {
        if self.stream.is_some() {
            log::debug!("reusing connection to {}", self.key);
            return Ok(());
        }
        let open = open_stream(&self.key);
        let stream = match self.connect_timeout {
            Some(after) => timeout(after, open).await.map_err(|_| FetchError::Timeout {
                operation: "connect",
                after,
            })??,
            None => open.await?,
        };
        self.stream = Some(stream);
        self.connects += 1;
        log::debug!("connected to {}", self.key);
        Ok(())
    }

    /// Close the stream if open. Safe to call when already closed.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                log::debug!("shutdown of {} failed: {}", self.key, e);
            }
            log::debug!("closed connection to {}", self.key);
        }
        self.read_buf.clear();
    }

    /// Write `request` to the open stream.
    pub async fn send_request(&mut self, request: &Request) -> Result<(), FetchError> {
        let stream = self.stream.as_mut().ok_or_else(not_connected)?;
        log::debug!("GET {} on {}", request.path, self.key);
        stream.write_all(&request.to_bytes()).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Read one response. `keep_alive` is whether the request asked for a persistent
    /// connection; the stream is closed afterwards unless that was granted.
    pub async fn read_response(&mut self, keep_alive: bool) -> Result<Response, FetchError> {
        self.parser.reset();
        let mut collector = ResponseCollector::default();
        let mut length_delimited = false;

        loop {
            self.parser.receive(&mut self.read_buf, &mut collector)?;
            match self.parser.state() {
                ParseState::HeadersComplete => {
                    check_encodings(&collector.response)?;
                    let body_length = match content_length(&collector.response)? {
                        Some(n) if n > 0 => Some(n),
                        Some(0) if keep_alive => Some(0),
                        _ => None,
                    };
                    length_delimited = body_length.is_some();
                    self.parser.set_body_mode(body_length, &mut collector);
                    continue;
                }
                ParseState::Idle => break,
                _ => {}
            }
            if self.fill_buf().await? == 0 {
                self.parser.finish(&mut collector)?;
                break;
            }
        }

        let response = collector.response;
        log::debug!(
            "{} {} from {} ({} body bytes)",
            response.status,
            response.reason.as_deref().unwrap_or(""),
            self.key,
            response.body.len()
        );
        if keep_alive && length_delimited && !response.closes_connection() {
            // No pipelining: anything after the body is not ours.
            self.read_buf.clear();
        } else {
            self.close().await;
        }
        Ok(response)
    }

    /// Read more bytes into read_buf. Returns 0 at end of stream.
    async fn fill_buf(&mut self) -> Result<usize, FetchError> {
        let stream = self.stream.as_mut().ok_or_else(not_connected)?;
        self.read_buf.reserve(READ_CHUNK);
        let read = stream.read_buf(&mut self.read_buf);
        let result = match self.read_timeout {
            Some(after) => timeout(after, read).await.map_err(|_| FetchError::Timeout {
                operation: "read",
                after,
            })?,
            None => read.await,
        };
        match result {
            Ok(n) => Ok(n),
            // TLS peers that close without close_notify end a close-delimited body.
            Err(e)
                if e.kind() == io::ErrorKind::UnexpectedEof
                    && matches!(stream, HttpStream::Tls(_)) =>
            {
                Ok(0)
            }
            Err(e) => Err(e.into()),
        }
    }
}

async fn open_stream(key: &ConnectionKey) -> Result<HttpStream, FetchError> {
    let tcp = TcpStream::connect((key.host.as_str(), key.port))
        .await
        .map_err(|source| FetchError::Connect {
            host: key.host.clone(),
            port: key.port,
            source,
        })?;
    if key.is_secure() {
        let tls = wrap_tls(tcp, &key.host)
            .await
            .map_err(|source| FetchError::Tls {
                host: key.host.clone(),
                source,
            })?;
        Ok(HttpStream::Tls(Box::new(tls)))
    } else {
        Ok(HttpStream::Plain(tcp))
    }
}

fn not_connected() -> FetchError {
    FetchError::Io(io::Error::new(
        io::ErrorKind::NotConnected,
        "connection is closed",
    ))
}

fn check_encodings(response: &Response) -> Result<(), FetchError> {
    for header in UNSUPPORTED_ENCODINGS {
        if let Some(value) = response.header(header) {
            return Err(FetchError::UnsupportedEncoding {
                header,
                value: value.to_string(),
            });
        }
    }
    Ok(())
}

/// Declared body length. Zero or negative values come back as `Some(0)`; anything that is
/// not an integer is a protocol error.
fn content_length(response: &Response) -> Result<Option<u64>, ProtocolError> {
    response
        .header("content-length")
        .map(|v| {
            v.parse::<i64>()
                .map(|n| u64::try_from(n).unwrap_or(0))
                .map_err(|_| ProtocolError::InvalidContentLength(v.to_string()))
        })
        .transpose()
}
