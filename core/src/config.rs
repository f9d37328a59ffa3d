/*
 * config.rs
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

//! Fetch configuration: defaults, plus overrides read from ~/.luxe/config.xml.
//!
//! ```xml
//! <luxe>
//!   <user-agent>luxe-ashllxyy</user-agent>
//!   <max-redirects>5</max-redirects>
//!   <connect-timeout>15</connect-timeout>
//!   <read-timeout>30</read-timeout>
//!   <keep-alive>false</keep-alive>
//! </luxe>
//! ```
//!
//! Timeouts are whole seconds; 0 means no timeout. Unknown elements are ignored.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use thiserror::Error;

pub const DEFAULT_USER_AGENT: &str = "luxe-ashllxyy";
pub const DEFAULT_MAX_REDIRECTS: u32 = 5;

/// Settings for a [`crate::Fetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Value of the User-Agent request header.
    pub user_agent: String,
    /// Redirect hops followed before giving up.
    pub max_redirects: u32,
    /// TCP connect plus TLS handshake deadline. None blocks indefinitely.
    pub connect_timeout: Option<Duration>,
    /// Deadline for each socket read. None blocks indefinitely.
    pub read_timeout: Option<Duration>,
    /// Ask for `Connection: keep-alive` and reuse the connection for the same
    /// (scheme, host, port) when the server allows it.
    pub keep_alive: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            connect_timeout: None,
            read_timeout: None,
            keep_alive: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("invalid value \"{value}\" for <{element}>")]
    InvalidValue { element: String, value: String },
}

/// Default config directory: ~/.luxe.
pub fn default_config_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .map(|h| h.join(".luxe"))
}

/// Default config file: ~/.luxe/config.xml.
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|d| d.join("config.xml"))
}

/// Load configuration from `path`. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<FetchConfig, ConfigError> {
    match fs::read_to_string(path) {
        Ok(content) => parse_config_xml(&content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(FetchConfig::default()),
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Parse configuration XML, starting from the defaults.
pub fn parse_config_xml(content: &str) -> Result<FetchConfig, ConfigError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut config = FetchConfig::default();
    let mut element = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Err(e) => return Err(ConfigError::Xml(e.to_string())),
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                element = String::from_utf8_lossy(e.name().as_ref()).into_owned();
            }
            Ok(Event::Text(e)) => {
                if element.is_empty() {
                    continue;
                }
                let text = e
                    .unescape()
                    .map_err(|e| ConfigError::Xml(e.to_string()))?
                    .trim()
                    .to_string();
                apply(&mut config, &element, &text)?;
                element.clear();
            }
            Ok(Event::End(_)) => element.clear(),
            _ => {}
        }
        buf.clear();
    }
    Ok(config)
}

fn apply(config: &mut FetchConfig, element: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        element: element.to_string(),
        value: value.to_string(),
    };
    match element {
        "user-agent" => config.user_agent = value.to_string(),
        "max-redirects" => config.max_redirects = value.parse().map_err(|_| invalid())?,
        "connect-timeout" => config.connect_timeout = parse_seconds(value).ok_or_else(invalid)?,
        "read-timeout" => config.read_timeout = parse_seconds(value).ok_or_else(invalid)?,
        "keep-alive" => config.keep_alive = parse_bool(value).ok_or_else(invalid)?,
        _ => log::debug!("ignoring config element <{}>", element),
    }
    Ok(())
}

/// Whole seconds; 0 disables the timeout.
fn parse_seconds(value: &str) -> Option<Option<Duration>> {
    let secs: u64 = value.parse().ok()?;
    Some((secs > 0).then(|| Duration::from_secs(secs)))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}
