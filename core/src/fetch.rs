/*
 * fetch.rs
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

//! Fetcher: load an address and hand back body text.
//!
//! Dispatch is on the address scheme. http and https go through one [`HttpConnection`]
//! (kept for reuse while requests stay on the same identity) and follow redirects up to
//! `FetchConfig::max_redirects`. view-source loads the wrapped address and marks the
//! result for raw display.

use std::path::Path;

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::protocol::http::redirect::{self, RedirectBudget};
use crate::protocol::http::{ConnectionKey, HttpConnection, Request, Response};
use crate::uri::{Address, HttpTarget, Scheme};

/// How the renderer should treat a document body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Normal page: the renderer strips tags.
    Rendered,
    /// view-source: show the markup itself, entity-decoded.
    Source,
}

/// Result of a fetch: the scheme of the requested address and the body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub scheme: Scheme,
    pub display: DisplayMode,
    pub body: String,
}

impl Document {
    pub fn is_source(&self) -> bool {
        self.display == DisplayMode::Source
    }
}

/// Loads addresses one at a time. Owns at most one HTTP connection.
pub struct Fetcher {
    config: FetchConfig,
    connection: Option<HttpConnection>,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self {
            config,
            connection: None,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// The current HTTP connection, if one has been created.
    pub fn connection(&self) -> Option<&HttpConnection> {
        self.connection.as_ref()
    }

    /// Parse `url` and load it. Malformed URLs load as about:blank (empty body).
    pub async fn fetch(&mut self, url: &str) -> Result<Document, FetchError> {
        let address = Address::parse_or_blank(url);
        self.fetch_address(&address).await
    }

    pub async fn fetch_address(&mut self, address: &Address) -> Result<Document, FetchError> {
        let display = match address {
            Address::ViewSource(_) => DisplayMode::Source,
            _ => DisplayMode::Rendered,
        };
        let body = self.load(address).await?;
        Ok(Document {
            scheme: address.scheme(),
            display,
            body,
        })
    }

    /// Close the HTTP connection, if any.
    pub async fn close(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close().await;
        }
    }

    async fn load(&mut self, address: &Address) -> Result<String, FetchError> {
        match address {
            Address::Blank => Ok(String::new()),
            Address::Data { body, .. } => Ok(body.clone()),
            Address::File { path } => read_file(path).await,
            Address::Http(target) => self.load_http(target.clone()).await,
            Address::ViewSource(inner) => Box::pin(self.load(inner)).await,
        }
    }

    async fn load_http(&mut self, mut target: HttpTarget) -> Result<String, FetchError> {
        let mut budget = RedirectBudget::new(self.config.max_redirects);
        loop {
            let response = self.request(&target).await?;
            match redirect::next_target(&target, &response)? {
                Some(next) => {
                    let hop = budget.take_hop()?;
                    log::info!(
                        "redirect {}/{}: {} {} -> {}",
                        hop,
                        budget.max(),
                        response.status,
                        target,
                        next
                    );
                    target = next;
                }
                None => return Ok(response.body),
            }
        }
    }

    /// One GET exchange with `target`: connect (or reuse), send, read. No redirect handling.
    pub async fn request(&mut self, target: &HttpTarget) -> Result<Response, FetchError> {
        let keep_alive = self.config.keep_alive;
        let request = Request::get(target, &self.config.user_agent, keep_alive);
        let connection = self.connection_for(target).await;
        let result = exchange(connection, &request, keep_alive).await;
        if result.is_err() {
            connection.close().await;
        }
        result
    }

    /// Connection for `target`'s identity, replacing one held for a different identity.
    async fn connection_for(&mut self, target: &HttpTarget) -> &mut HttpConnection {
        let key = ConnectionKey::for_target(target);
        let stale = matches!(&self.connection, Some(c) if c.key() != &key);
        if stale {
            if let Some(mut old) = self.connection.take() {
                old.close().await;
            }
        }
        let connect_timeout = self.config.connect_timeout;
        let read_timeout = self.config.read_timeout;
        self.connection.get_or_insert_with(|| {
            HttpConnection::new(key).with_timeouts(connect_timeout, read_timeout)
        })
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new(FetchConfig::default())
    }
}

async fn exchange(
    connection: &mut HttpConnection,
    request: &Request,
    keep_alive: bool,
) -> Result<Response, FetchError> {
    connection.connect().await?;
    connection.send_request(request).await?;
    connection.read_response(keep_alive).await
}

async fn read_file(path: &Path) -> Result<String, FetchError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FetchError::File {
            path: path.to_path_buf(),
            source,
        })
}
