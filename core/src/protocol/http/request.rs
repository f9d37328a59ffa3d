/*
 * request.rs
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

//! HTTP/1.0 GET request: request line, Host, Connection, User-Agent, blank line.

use crate::uri::HttpTarget;

pub const HTTP_VERSION: &str = "HTTP/1.0";

/// A GET request. Headers are written in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// GET for `target` with the fixed header set. `keep_alive` selects the
    /// Connection header value (`keep-alive` instead of `close`).
    pub fn get(target: &HttpTarget, user_agent: &str, keep_alive: bool) -> Self {
        let connection = if keep_alive { "keep-alive" } else { "close" };
        Self {
            path: target.path.clone(),
            headers: vec![
                ("Host".to_string(), target.authority()),
                ("Connection".to_string(), connection.to_string()),
                ("User-Agent".to_string(), user_agent.to_string()),
            ],
        }
    }

    /// Value of the first header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Serialize as UTF-8 text, CRLF line endings.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut req = format!("GET {} {}\r\n", self.path, HTTP_VERSION);
        for (k, v) in &self.headers {
            req.push_str(k);
            req.push_str(": ");
            req.push_str(v);
            req.push_str("\r\n");
        }
        req.push_str("\r\n");
        req.into_bytes()
    }
}
