/*
 * uri.rs
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

//! Browser addresses. Hierarchical URLs for http, https and file (`scheme://authority/path`),
//! opaque `data:<media-type>,<payload>` URLs, and the `view-source:` wrapper around a
//! hierarchical URL. Anything else is malformed and loads as about:blank.

use std::fmt;
use std::path::{PathBuf, MAIN_SEPARATOR, MAIN_SEPARATOR_STR};
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_HTTP_PORT: u16 = 80;
pub const DEFAULT_HTTPS_PORT: u16 = 443;

/// Address scheme. `About` is only produced for malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
    File,
    Data,
    ViewSource,
    About,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::File => "file",
            Scheme::Data => "data",
            Scheme::ViewSource => "view-source",
            Scheme::About => "about",
        }
    }

    /// Port used when the URL does not name one (network schemes only).
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Scheme::Http => Some(DEFAULT_HTTP_PORT),
            Scheme::Https => Some(DEFAULT_HTTPS_PORT),
            _ => None,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a URL string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedUri {
    #[error("missing \"://\" after the scheme")]
    MissingSchemeDelimiter,

    #[error("unsupported scheme \"{0}\"")]
    UnsupportedScheme(String),

    #[error("data URL has no \",\" before the payload")]
    MissingDataSeparator,

    #[error("empty host")]
    EmptyHost,

    #[error("invalid port \"{0}\"")]
    InvalidPort(String),
}

/// Where an http or https request goes. `path` always starts with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HttpTarget {
    pub secure: bool,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl HttpTarget {
    pub fn scheme(&self) -> Scheme {
        if self.secure {
            Scheme::Https
        } else {
            Scheme::Http
        }
    }

    pub fn has_default_port(&self) -> bool {
        self.scheme().default_port() == Some(self.port)
    }

    /// `host`, or `host:port` when the port is not the scheme default.
    pub fn authority(&self) -> String {
        if self.has_default_port() {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for HttpTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme(), self.authority(), self.path)
    }
}

/// A parsed URL. Immutable once built; exactly one shape per scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Http(HttpTarget),
    /// Local path, with `/` already mapped to the platform separator.
    File { path: PathBuf },
    /// Inline payload, kept verbatim (no percent-decoding).
    Data { media_type: String, body: String },
    /// Raw-markup view of the wrapped address (never itself a view-source).
    ViewSource(Box<Address>),
    /// about:blank, the terminal address for malformed input.
    Blank,
}

impl Address {
    /// Parse `input`; malformed input yields [`Address::Blank`] instead of an error.
    pub fn parse_or_blank(input: &str) -> Address {
        match parse(input) {
            Ok(address) => address,
            Err(e) => {
                log::warn!("malformed URL \"{}\" ({}), loading about:blank", input, e);
                Address::Blank
            }
        }
    }

    pub fn scheme(&self) -> Scheme {
        match self {
            Address::Http(target) => target.scheme(),
            Address::File { .. } => Scheme::File,
            Address::Data { .. } => Scheme::Data,
            Address::ViewSource(_) => Scheme::ViewSource,
            Address::Blank => Scheme::About,
        }
    }

    pub fn http_target(&self) -> Option<&HttpTarget> {
        match self {
            Address::Http(target) => Some(target),
            _ => None,
        }
    }

    pub fn inline_body(&self) -> Option<&str> {
        match self {
            Address::Data { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn wrapped(&self) -> Option<&Address> {
        match self {
            Address::ViewSource(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Address::Blank)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Http(target) => target.fmt(f),
            Address::File { path } => {
                let path = path.to_string_lossy().replace(MAIN_SEPARATOR, "/");
                write!(f, "file://{}", path)
            }
            Address::Data { media_type, body } => write!(f, "data:{},{}", media_type, body),
            Address::ViewSource(inner) => write!(f, "view-source:{}", inner),
            Address::Blank => f.write_str("about:blank"),
        }
    }
}

impl FromStr for Address {
    type Err = MalformedUri;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Parse a URL string. Scheme names are matched case-insensitively.
pub fn parse(input: &str) -> Result<Address, MalformedUri> {
    let input = input.trim();
    if input
        .get(..5)
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case("data:"))
    {
        return parse_data(&input[5..]);
    }
    let (scheme, rest) = input
        .split_once("://")
        .ok_or(MalformedUri::MissingSchemeDelimiter)?;
    let scheme = scheme.to_ascii_lowercase();
    if let Some((outer, inner)) = scheme.split_once(':') {
        if outer != "view-source" {
            return Err(MalformedUri::UnsupportedScheme(scheme));
        }
        let wrapped = parse_hierarchical(inner, rest)?;
        return Ok(Address::ViewSource(Box::new(wrapped)));
    }
    parse_hierarchical(&scheme, rest)
}

fn parse_data(rest: &str) -> Result<Address, MalformedUri> {
    let (media_type, body) = rest
        .split_once(',')
        .ok_or(MalformedUri::MissingDataSeparator)?;
    Ok(Address::Data {
        media_type: media_type.to_string(),
        body: body.to_string(),
    })
}

fn parse_hierarchical(scheme: &str, rest: &str) -> Result<Address, MalformedUri> {
    match scheme {
        "http" => parse_http(false, rest),
        "https" => parse_http(true, rest),
        "file" => Ok(Address::File {
            path: PathBuf::from(rest.replace('/', MAIN_SEPARATOR_STR)),
        }),
        other => Err(MalformedUri::UnsupportedScheme(other.to_string())),
    }
}

fn parse_http(secure: bool, rest: &str) -> Result<Address, MalformedUri> {
    let (authority, path) = match rest.find('/') {
        Some(slash) => (&rest[..slash], &rest[slash..]),
        None => (rest, "/"),
    };
    let (host, port) = match authority.split_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| MalformedUri::InvalidPort(port.to_string()))?;
            (host, port)
        }
        None if secure => (authority, DEFAULT_HTTPS_PORT),
        None => (authority, DEFAULT_HTTP_PORT),
    };
    if host.is_empty() {
        return Err(MalformedUri::EmptyHost);
    }
    Ok(Address::Http(HttpTarget {
        secure,
        host: host.to_string(),
        port,
        path: path.to_string(),
    }))
}
