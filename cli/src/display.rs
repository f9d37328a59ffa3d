/*
 * display.rs
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

//! Text output for fetched documents.
//!
//! Rendered pages lose their markup; view-source documents keep it. Both get the common
//! entities decoded.

use luxe_core::{DisplayMode, Document, Scheme};
use percent_encoding::percent_decode_str;

const ENTITIES: &[(&str, char)] = &[
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&amp;", '&'),
    ("&quot;", '"'),
    ("&#39;", '\''),
];

/// Text for `doc` as the terminal should show it.
pub fn render(doc: &Document) -> String {
    match doc.display {
        DisplayMode::Source => unescape_entities(&doc.body),
        DisplayMode::Rendered => {
            let text = if doc.scheme == Scheme::Data {
                percent_decode_str(&doc.body).decode_utf8_lossy().into_owned()
            } else {
                doc.body.clone()
            };
            unescape_entities(&strip_tags(&text))
        }
    }
}

/// Drop everything between `<` and the next `>`.
pub fn strip_tags(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut in_tag = false;
    for c in body.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Decode the named and numeric entities in ENTITIES. Unknown entities pass through.
pub fn unescape_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        rest = &rest[at..];
        match ENTITIES.iter().find(|(name, _)| rest.starts_with(name)) {
            Some((name, c)) => {
                out.push(*c);
                rest = &rest[name.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
