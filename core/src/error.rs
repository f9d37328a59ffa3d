/*
 * error.rs
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

//! Fetch errors. Malformed URLs are not here: they become about:blank (see `uri`).

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// The response could not be understood as HTTP/1.0.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed status line \"{0}\"")]
    MalformedStatusLine(String),

    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(&'static str),

    #[error("connection closed before the end of the response headers")]
    TruncatedHeaders,

    #[error("connection closed after {received} of {expected} body bytes")]
    TruncatedBody { received: u64, expected: u64 },

    #[error("invalid content-length \"{0}\"")]
    InvalidContentLength(String),
}

/// Errors from a single fetch. None of these are retried.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Only identity-encoded, non-chunked bodies are supported.
    #[error("unsupported {header}: {value}")]
    UnsupportedEncoding { header: &'static str, value: String },

    #[error("redirect status {status} without a location header")]
    MissingLocation { status: u16 },

    #[error("cannot follow redirect to \"{location}\"")]
    InvalidRedirect { location: String },

    #[error("too many redirects (limit is {max})")]
    TooManyRedirects { max: u32 },

    #[error("cannot connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("TLS handshake with {host} failed: {source}")]
    Tls {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot read {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FetchError {
    /// True for errors where the peer sent something this client refuses to handle,
    /// as opposed to transport or disk failures.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            FetchError::Protocol(_)
                | FetchError::UnsupportedEncoding { .. }
                | FetchError::MissingLocation { .. }
                | FetchError::InvalidRedirect { .. }
        )
    }
}
