/*
 * redirect.rs
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

//! Redirects: a 3xx response names the next target in `location`; the chain is bounded by a
//! hop budget.

use crate::error::FetchError;
use crate::protocol::http::response::Response;
use crate::uri::{self, Address, HttpTarget};

/// Resolve `location` against the target that returned it. A path starting with `/` stays on
/// the same scheme, host and port; anything else must be an absolute URL.
pub fn resolve_location(current: &HttpTarget, location: &str) -> String {
    if location.starts_with('/') {
        format!("{}://{}{}", current.scheme(), current.authority(), location)
    } else {
        location.to_string()
    }
}

/// Next target if `response` is a redirect, None otherwise.
pub fn next_target(
    current: &HttpTarget,
    response: &Response,
) -> Result<Option<HttpTarget>, FetchError> {
    if !response.is_redirect() {
        return Ok(None);
    }
    let location = response
        .header("location")
        .ok_or(FetchError::MissingLocation {
            status: response.status,
        })?;
    let resolved = resolve_location(current, location);
    match uri::parse(&resolved) {
        Ok(Address::Http(target)) => Ok(Some(target)),
        _ => Err(FetchError::InvalidRedirect { location: resolved }),
    }
}

/// Hop counter for one redirect chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectBudget {
    max: u32,
    hops: u32,
}

impl RedirectBudget {
    pub fn new(max: u32) -> Self {
        Self { max, hops: 0 }
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn hops(&self) -> u32 {
        self.hops
    }

    /// Spend one hop. Fails with `TooManyRedirects` once `max` hops have been followed.
    pub fn take_hop(&mut self) -> Result<u32, FetchError> {
        if self.hops >= self.max {
            return Err(FetchError::TooManyRedirects { max: self.max });
        }
        self.hops += 1;
        Ok(self.hops)
    }
}
