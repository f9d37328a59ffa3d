/*
 * lib.rs
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

//! Luxe core: turn a URL string into body text for the renderer.
//!
//! Schemes: http, https (HTTP/1.0 over TCP or TLS), file, data, and the view-source: wrapper.
//! The renderer is not part of this crate; it receives a [`Document`] and decides whether to
//! strip tags or show the raw markup.

pub mod config;
pub mod error;
pub mod fetch;
pub mod net;
pub mod protocol;
pub mod uri;

pub use config::FetchConfig;
pub use error::{FetchError, ProtocolError};
pub use fetch::{DisplayMode, Document, Fetcher};
pub use uri::{Address, HttpTarget, MalformedUri, Scheme};
