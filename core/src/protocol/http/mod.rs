/*
 * mod.rs
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

//! HTTP/1.0 client: one GET per request, identity-encoded bodies only.
//!
//! - `request`: request line and the fixed header set.
//! - `h1`: push parser for the response (status line, headers, body by content-length or
//!   until the server closes).
//! - `connection`: one TCP or TLS stream per (scheme, host, port); sends requests and
//!   drives the parser.
//! - `redirect`: 3xx handling and the hop budget.

pub mod h1;

mod request;
mod response;

pub mod connection;
pub mod redirect;

pub use connection::{ConnectionKey, HttpConnection, HttpStream};
pub use h1::{H1ResponseHandler, ParseState, ResponseParser};
pub use redirect::RedirectBudget;
pub use request::{Request, HTTP_VERSION};
pub use response::Response;
