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

//! C FFI for luxe core. Each calling thread owns one fetcher and one current-thread
//! runtime, created on first use; the fetch blocks the caller until the body is loaded.
//! All string parameters are UTF-8 NUL-terminated. Do not call from inside a tokio runtime.

use libc::{c_char, c_int, size_t};
use luxe_core::config::{default_config_path, load_config};
use luxe_core::{DisplayMode, Document, FetchConfig, Fetcher};
use once_cell::sync::Lazy;
use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::fmt::Display;
use std::ptr;
use tokio::runtime::Runtime;

/// Loaded once per process from ~/.luxe/config.xml. A broken file is logged and ignored.
static CONFIG: Lazy<FetchConfig> = Lazy::new(|| {
    let Some(path) = default_config_path() else {
        return FetchConfig::default();
    };
    load_config(&path).unwrap_or_else(|e| {
        log::warn!("ignoring config: {}", e);
        FetchConfig::default()
    })
});

struct Session {
    runtime: Runtime,
    fetcher: Fetcher,
}

thread_local! {
    static SESSION: RefCell<Option<Session>> = const { RefCell::new(None) };
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(err: impl Display) {
    let msg = to_c_string(&err.to_string());
    LAST_ERROR.with(|e| *e.borrow_mut() = Some(msg));
}

fn clear_last_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = None);
}

/// Interior NULs cannot cross the boundary; they are dropped.
fn to_c_string(s: &str) -> CString {
    CString::new(s.replace('\0', "")).unwrap_or_default()
}

/// Fetched document. Caller frees with luxe_free_document.
#[repr(C)]
pub struct LuxeDocument {
    /// Scheme of the requested address ("http", "view-source", ...).
    pub scheme: *mut c_char,
    /// Body text, NUL-terminated.
    pub body: *mut c_char,
    /// Length of body in bytes, excluding the terminator.
    pub body_len: size_t,
    /// 1 when the body should be shown as markup (view-source), 0 when rendered.
    pub source: c_int,
}

impl LuxeDocument {
    fn from_document(doc: Document) -> Self {
        let body = to_c_string(&doc.body);
        Self {
            scheme: to_c_string(doc.scheme.as_str()).into_raw(),
            body_len: body.as_bytes().len(),
            body: body.into_raw(),
            source: c_int::from(doc.display == DisplayMode::Source),
        }
    }
}

fn fetch_on_this_thread(url: &str) -> Result<Document, String> {
    SESSION.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| format!("cannot start runtime: {}", e))?;
            *slot = Some(Session {
                runtime,
                fetcher: Fetcher::new(CONFIG.clone()),
            });
        }
        let session = slot.as_mut().ok_or("no session")?;
        session
            .runtime
            .block_on(session.fetcher.fetch(url))
            .map_err(|e| e.to_string())
    })
}

/// Version string (static, do not free).
#[no_mangle]
pub extern "C" fn luxe_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

/// Last error message from a failed call on this thread. Valid until the next FFI call. Do not free.
#[no_mangle]
pub extern "C" fn luxe_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        e.borrow()
            .as_ref()
            .map(|s| s.as_ptr())
            .unwrap_or(ptr::null())
    })
}

/// Fetch `url`. Returns NULL on failure (see luxe_last_error). A malformed URL is not a
/// failure: it yields the blank page.
///
/// # Safety
/// `url` must be NULL or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn luxe_fetch(url: *const c_char) -> *mut LuxeDocument {
    clear_last_error();
    if url.is_null() {
        set_last_error("url is NULL");
        return ptr::null_mut();
    }
    let url = match CStr::from_ptr(url).to_str() {
        Ok(s) => s,
        Err(e) => {
            set_last_error(e);
            return ptr::null_mut();
        }
    };
    match fetch_on_this_thread(url) {
        Ok(doc) => Box::into_raw(Box::new(LuxeDocument::from_document(doc))),
        Err(msg) => {
            set_last_error(msg);
            ptr::null_mut()
        }
    }
}

/// Close any connection held by this thread's fetcher.
#[no_mangle]
pub extern "C" fn luxe_close() {
    SESSION.with(|cell| {
        if let Some(session) = cell.borrow_mut().as_mut() {
            session.runtime.block_on(session.fetcher.close());
        }
    });
}

/// Free a document returned by luxe_fetch. No-op if ptr is NULL.
///
/// # Safety
/// `ptr` must be NULL or a pointer from luxe_fetch not yet freed.
#[no_mangle]
pub unsafe extern "C" fn luxe_free_document(ptr: *mut LuxeDocument) {
    if ptr.is_null() {
        return;
    }
    let doc = Box::from_raw(ptr);
    if !doc.scheme.is_null() {
        drop(CString::from_raw(doc.scheme));
    }
    if !doc.body.is_null() {
        drop(CString::from_raw(doc.body));
    }
}

/// Free a string allocated by this library. No-op if ptr is NULL.
///
/// # Safety
/// `ptr` must be NULL or a string allocated by this library not yet freed.
#[no_mangle]
pub unsafe extern "C" fn luxe_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe fn fetch(url: &str) -> *mut LuxeDocument {
        let url = CString::new(url).unwrap();
        luxe_fetch(url.as_ptr())
    }

    unsafe fn text(p: *const c_char) -> String {
        CStr::from_ptr(p).to_str().unwrap().to_string()
    }

    #[test]
    fn version_is_package_version() {
        let v = unsafe { text(luxe_version()) };
        assert_eq!(v, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn fetch_data_url() {
        unsafe {
            let doc = fetch("data:text/html,<b>hi</b>");
            assert!(!doc.is_null());
            assert_eq!(text((*doc).scheme), "data");
            assert_eq!(text((*doc).body), "<b>hi</b>");
            assert_eq!((*doc).body_len, 9);
            assert_eq!((*doc).source, 0);
            assert!(luxe_last_error().is_null());
            luxe_free_document(doc);
        }
    }

    #[test]
    fn view_source_is_flagged() {
        let path = std::env::temp_dir().join(format!("luxe-ffi-{}.html", std::process::id()));
        std::fs::write(&path, "<p>x</p>").unwrap();
        let url = format!(
            "view-source:file://{}",
            path.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/")
        );
        unsafe {
            let doc = fetch(&url);
            assert!(!doc.is_null());
            assert_eq!(text((*doc).scheme), "view-source");
            assert_eq!(text((*doc).body), "<p>x</p>");
            assert_eq!((*doc).source, 1);
            luxe_free_document(doc);
        }
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn malformed_url_is_blank_page() {
        unsafe {
            let doc = fetch("not a url");
            assert!(!doc.is_null());
            assert_eq!((*doc).body_len, 0);
            luxe_free_document(doc);
        }
    }

    #[test]
    fn null_url_sets_last_error() {
        unsafe {
            assert!(luxe_fetch(ptr::null()).is_null());
            assert_eq!(text(luxe_last_error()), "url is NULL");
        }
    }

    #[test]
    fn missing_file_sets_last_error() {
        unsafe {
            let doc = fetch("file:///nonexistent/luxe/page.html");
            assert!(doc.is_null());
            assert!(text(luxe_last_error()).contains("page.html"));
            luxe_close();
        }
    }

    #[test]
    fn free_null_is_noop() {
        unsafe {
            luxe_free_document(ptr::null_mut());
            luxe_free_string(ptr::null_mut());
        }
    }

    #[test]
    fn interior_nul_is_dropped() {
        assert_eq!(to_c_string("a\0b").as_bytes(), b"ab");
    }
}
