//! Request context handed to generated code.
//!
//! [`RequestContext`] is what the host knows about the request; every field
//! is optional. [`Request`] is the resolved form stored in a capability
//! table: defaults applied, text NUL-terminated for C, and the query
//! parameter lookup cached.

use std::ffi::{CStr, CString};

use crate::scan::{self, Scanned};

pub const DEFAULT_METHOD: &str = "GET";
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Separator between the query prefix and its parameters.
const PARAM_SEPARATOR: u8 = b'?';

/// Raw request inputs; `None` means "not provided".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub method: Option<String>,
    pub query_string: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<usize>,
    pub body: Option<Vec<u8>>,
}

impl RequestContext {
    /// Read the CGI-style variables from the process environment.
    ///
    /// `REQUEST_METHOD`, `QUERY_STRING`, `CONTENT_TYPE`, `CONTENT_LENGTH`,
    /// and `REQUEST_BODY`. An unparsable `CONTENT_LENGTH` counts as absent.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            method: lookup("REQUEST_METHOD"),
            query_string: lookup("QUERY_STRING"),
            content_type: lookup("CONTENT_TYPE"),
            content_length: lookup("CONTENT_LENGTH").and_then(|v| v.trim().parse().ok()),
            body: lookup("REQUEST_BODY").map(String::into_bytes),
        }
    }
}

/// Result of looking for the parameter separator in the query string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QueryState {
    /// Not looked up yet.
    #[default]
    Unscanned,
    /// The query string has no `?`.
    Absent,
    /// Byte offset of the `?`.
    Found(usize),
}

/// Resolved request stored in a capability table.
#[derive(Debug)]
pub struct Request {
    method: CString,
    query_string: CString,
    content_type: CString,
    content_length: usize,
    body: CString,
    query: QueryState,
}

impl Request {
    /// Apply defaults: `GET`, empty query, `text/plain`, length 0, empty body.
    pub fn resolve(context: RequestContext) -> Self {
        Self {
            method: c_string(
                context
                    .method
                    .unwrap_or_else(|| DEFAULT_METHOD.to_owned())
                    .into_bytes(),
            ),
            query_string: c_string(context.query_string.unwrap_or_default().into_bytes()),
            content_type: c_string(
                context
                    .content_type
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned())
                    .into_bytes(),
            ),
            content_length: context.content_length.unwrap_or(0),
            body: c_string(context.body.unwrap_or_default()),
            query: QueryState::Unscanned,
        }
    }

    pub fn method(&self) -> &CStr {
        &self.method
    }

    pub fn query_string(&self) -> &CStr {
        &self.query_string
    }

    pub fn content_type(&self) -> &CStr {
        &self.content_type
    }

    pub fn content_length(&self) -> usize {
        self.content_length
    }

    pub fn body(&self) -> &CStr {
        &self.body
    }

    pub fn query_state(&self) -> QueryState {
        self.query
    }

    /// Parameter text after the `?`, or `None` if there is no `?`.
    ///
    /// The separator is looked up once; later calls reuse the offset.
    pub fn query_params(&mut self) -> Option<&[u8]> {
        let query = self.query_string.to_bytes();
        if self.query == QueryState::Unscanned {
            self.query = match query.iter().position(|&b| b == PARAM_SEPARATOR) {
                Some(offset) => QueryState::Found(offset),
                None => QueryState::Absent,
            };
        }
        match self.query {
            QueryState::Found(offset) => query.get(offset + 1..),
            QueryState::Absent | QueryState::Unscanned => None,
        }
    }

    /// Match `fmt` against the query parameters.
    pub fn scan_query(&mut self, fmt: &[u8]) -> Option<Vec<Scanned>> {
        scan::scan(self.query_params()?, fmt)
    }
}

/// NUL-terminate `bytes`, cutting at an embedded NUL.
fn c_string(mut bytes: Vec<u8>) -> CString {
    if let Some(nul) = bytes.iter().position(|&b| b == 0) {
        bytes.truncate(nul);
    }
    CString::new(bytes).unwrap_or_default()
}
