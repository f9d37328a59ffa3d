/*
 * parser.rs
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

//! HTTP/1.0 response push parser: status line, headers, body (Content-Length or until close).
//!
//! Chunked bodies are not parsed here; the connection rejects them once the headers are in.

use bytes::BytesMut;

use crate::error::ProtocolError;

/// Callback for HTTP/1.x response events. The connection implements this to build a `Response`.
pub trait H1ResponseHandler {
    fn status(&mut self, version: &str, code: u16, reason: Option<&str>);
    /// `name` is already lower-case; `value` is trimmed.
    fn header(&mut self, name: &str, value: &str);
    fn body_chunk(&mut self, data: &[u8]);
    fn complete(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    Idle,
    StatusLine,
    Headers,
    /// Headers done; connection must call set_body_mode().
    HeadersComplete,
    Body,
}

/// Push parser for one response. Feed bytes via `receive`; call `finish` when the peer closes.
pub struct ResponseParser {
    state: ParseState,
    /// None while reading until close.
    content_length: Option<u64>,
    bytes_received: u64,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::StatusLine,
            content_length: None,
            bytes_received: 0,
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = ParseState::StatusLine;
        self.content_length = None;
        self.bytes_received = 0;
    }

    /// Take one line (without its terminator) off the front of `buf`. Accepts CRLF or bare LF.
    fn take_line(buf: &mut BytesMut) -> Option<BytesMut> {
        let lf = buf.iter().position(|&b| b == b'\n')?;
        let mut line = buf.split_to(lf + 1);
        line.truncate(lf);
        if line.last() == Some(&b'\r') {
            line.truncate(lf - 1);
        }
        Some(line)
    }

    /// Consume and parse as much as possible from buf. Partial lines stay in buf.
    pub fn receive<H: H1ResponseHandler>(
        &mut self,
        buf: &mut BytesMut,
        handler: &mut H,
    ) -> Result<(), ProtocolError> {
        while !buf.is_empty() {
            match self.state {
                ParseState::StatusLine => {
                    let line = match Self::take_line(buf) {
                        Some(l) => l,
                        None => return Ok(()),
                    };
                    let line = std::str::from_utf8(&line)
                        .map_err(|_| ProtocolError::InvalidUtf8("status line"))?;
                    // HTTP/1.0 200 OK, reason may contain spaces or be absent
                    let mut parts = line.splitn(3, ' ');
                    let version = parts.next().unwrap_or("");
                    let code = parts
                        .next()
                        .and_then(|s| s.trim().parse::<u16>().ok())
                        .ok_or_else(|| ProtocolError::MalformedStatusLine(line.to_string()))?;
                    let reason = parts.next().map(str::trim).filter(|s| !s.is_empty());
                    handler.status(version, code, reason);
                    self.state = ParseState::Headers;
                }
                ParseState::Headers => {
                    let line = match Self::take_line(buf) {
                        Some(l) => l,
                        None => return Ok(()),
                    };
                    if line.is_empty() {
                        self.state = ParseState::HeadersComplete;
                        return Ok(()); // Connection will set_body_mode and call receive again
                    }
                    let line = std::str::from_utf8(&line)
                        .map_err(|_| ProtocolError::InvalidUtf8("header line"))?;
                    match line.split_once(':') {
                        Some((name, value)) => {
                            handler.header(&name.trim().to_ascii_lowercase(), value.trim())
                        }
                        None => log::warn!("skipping header line without ':': {:?}", line),
                    }
                }
                ParseState::Body => {
                    match self.content_length {
                        Some(expected) => {
                            let remaining = (expected - self.bytes_received) as usize;
                            let to_read = remaining.min(buf.len());
                            if to_read > 0 {
                                let chunk = buf.split_to(to_read);
                                handler.body_chunk(&chunk);
                                self.bytes_received += to_read as u64;
                            }
                            if self.bytes_received >= expected {
                                handler.complete();
                                self.state = ParseState::Idle;
                            }
                        }
                        None => {
                            // Read until close: deliver all available
                            handler.body_chunk(buf);
                            self.bytes_received += buf.len() as u64;
                            buf.clear();
                        }
                    }
                }
                ParseState::HeadersComplete | ParseState::Idle => return Ok(()),
            }
        }
        Ok(())
    }

    /// Called by the connection once the headers are in (state HeadersComplete).
    /// `Some(n)` reads exactly n bytes; `None` reads until the peer closes.
    pub fn set_body_mode<H: H1ResponseHandler>(
        &mut self,
        content_length: Option<u64>,
        handler: &mut H,
    ) {
        if self.state != ParseState::HeadersComplete {
            return;
        }
        self.content_length = content_length;
        self.bytes_received = 0;
        if content_length == Some(0) {
            handler.complete();
            self.state = ParseState::Idle;
        } else {
            self.state = ParseState::Body;
        }
    }

    /// The peer closed the stream. Completes a read-until-close body; anything else
    /// unfinished is truncated.
    pub fn finish<H: H1ResponseHandler>(&mut self, handler: &mut H) -> Result<(), ProtocolError> {
        match self.state {
            ParseState::Idle => Ok(()),
            ParseState::Body => match self.content_length {
                None => {
                    handler.complete();
                    self.state = ParseState::Idle;
                    Ok(())
                }
                Some(expected) => Err(ProtocolError::TruncatedBody {
                    received: self.bytes_received,
                    expected,
                }),
            },
            ParseState::StatusLine | ParseState::Headers | ParseState::HeadersComplete => {
                Err(ProtocolError::TruncatedHeaders)
            }
        }
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}
