//
//  jamfpro
//  api/rsql.rs
//
//  Created by Ngonidzashe Mangudya on 2026/08/07.
//  Copyright (c) 2026 IAMNGONI. All rights reserved.
//

//! # RSQL Filter Expressions and Query Parameters
//!
//! Jamf Pro API list endpoints accept an RSQL `filter` expression plus
//! `sort`, `page`, and `page-size` parameters. This module provides:
//!
//! - [`RsqlFilterBuilder`]: a fluent builder for RSQL expressions
//! - [`QueryParams`]: the flat string-to-string parameter mapping passed to
//!   transport operations, with typed helpers for the recognized keys
//!
//! No client-side validation of RSQL grammar is performed. The filter
//! grammar is vendor-defined and evolves; malformed filters are rejected by
//! the server and surface through the error classifier. Unrecognized query
//! keys pass through verbatim for forward compatibility.
//!
//! ## Example
//!
//! ```rust
//! use jamfpro::api::{QueryParams, RsqlFilterBuilder, SortDirection};
//!
//! let filter = RsqlFilterBuilder::new()
//!     .equal_to("general.name", "MacBook Pro")
//!     .and()
//!     .greater_than("hardware.totalRamMegabytes", "8192")
//!     .build();
//! assert_eq!(
//!     filter,
//!     r#"general.name=="MacBook Pro";hardware.totalRamMegabytes>"8192""#
//! );
//!
//! let query = QueryParams::new()
//!     .filter(filter)
//!     .sort(&[("general.name", SortDirection::Asc)])
//!     .page_size(100);
//! assert_eq!(query.get("sort"), Some("general.name:asc"));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use url::form_urlencoded;

/// Sort direction for a [`QueryParams::sort`] field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (`field:asc`).
    Asc,
    /// Descending order (`field:desc`).
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

/// Fluent builder for RSQL filter expressions.
///
/// Accumulates RSQL tokens into a buffer; create a new builder per
/// expression. The completed expression is passed as the `filter` query
/// parameter via [`QueryParams::filter`].
///
/// # Example
///
/// ```rust
/// use jamfpro::api::RsqlFilterBuilder;
///
/// let expr = RsqlFilterBuilder::new()
///     .open_group()
///     .equal_to("city", "Harare")
///     .or()
///     .equal_to("city", "Bulawayo")
///     .close_group()
///     .and()
///     .is_in("country", &["ZW", "ZA"])
///     .build();
/// assert_eq!(expr, r#"(city=="Harare",city=="Bulawayo");country=in=("ZW","ZA")"#);
/// ```
///
/// # Notes
///
/// - All values are double-quoted; Jamf Pro accepts quoted numeric values.
/// - Wildcards (`*`) already present in `equal_to`/`not_equal_to` values
///   are preserved as RSQL wildcards.
/// - `contains`/`starts_with`/`ends_with` escape literal asterisks in the
///   value so only the wildcards they add themselves are significant.
#[derive(Debug, Clone, Default)]
pub struct RsqlFilterBuilder {
    buf: String,
}

impl RsqlFilterBuilder {
    /// Returns a new, empty filter expression builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Produces `field=="value"`. Wildcards in `value` are preserved.
    pub fn equal_to(mut self, field: &str, value: &str) -> Self {
        self.buf.push_str(&format!("{field}=={}", quote(value)));
        self
    }

    /// Produces `field!="value"`. Wildcards in `value` are preserved.
    pub fn not_equal_to(mut self, field: &str, value: &str) -> Self {
        self.buf.push_str(&format!("{field}!={}", quote(value)));
        self
    }

    /// Produces `field<"value"`.
    pub fn less_than(mut self, field: &str, value: &str) -> Self {
        self.buf.push_str(&format!("{field}<{}", quote(value)));
        self
    }

    /// Produces `field<="value"`.
    pub fn less_or_equal(mut self, field: &str, value: &str) -> Self {
        self.buf.push_str(&format!("{field}<={}", quote(value)));
        self
    }

    /// Produces `field>"value"`.
    pub fn greater_than(mut self, field: &str, value: &str) -> Self {
        self.buf.push_str(&format!("{field}>{}", quote(value)));
        self
    }

    /// Produces `field>="value"`.
    pub fn greater_or_equal(mut self, field: &str, value: &str) -> Self {
        self.buf.push_str(&format!("{field}>={}", quote(value)));
        self
    }

    /// Produces `field=in=(v1,v2,...)`.
    pub fn is_in(mut self, field: &str, values: &[&str]) -> Self {
        let quoted: Vec<String> = values.iter().map(|v| quote(v)).collect();
        self.buf
            .push_str(&format!("{field}=in=({})", quoted.join(",")));
        self
    }

    /// Produces `field=out=(v1,v2,...)`.
    pub fn not_in(mut self, field: &str, values: &[&str]) -> Self {
        let quoted: Vec<String> = values.iter().map(|v| quote(v)).collect();
        self.buf
            .push_str(&format!("{field}=out=({})", quoted.join(",")));
        self
    }

    /// Produces `field=="*value*"` (substring match). Literal asterisks in
    /// `value` are escaped.
    pub fn contains(mut self, field: &str, value: &str) -> Self {
        self.buf
            .push_str(&format!("{field}==\"*{}*\"", escape_literal_wildcard(value)));
        self
    }

    /// Produces `field=="value*"` (prefix match). Literal asterisks in
    /// `value` are escaped.
    pub fn starts_with(mut self, field: &str, value: &str) -> Self {
        self.buf
            .push_str(&format!("{field}==\"{}*\"", escape_literal_wildcard(value)));
        self
    }

    /// Produces `field=="*value"` (suffix match). Literal asterisks in
    /// `value` are escaped.
    pub fn ends_with(mut self, field: &str, value: &str) -> Self {
        self.buf
            .push_str(&format!("{field}==\"*{}\"", escape_literal_wildcard(value)));
        self
    }

    /// Appends a semicolon, logical AND in RSQL.
    pub fn and(mut self) -> Self {
        self.buf.push(';');
        self
    }

    /// Appends a comma, logical OR in RSQL.
    pub fn or(mut self) -> Self {
        self.buf.push(',');
        self
    }

    /// Appends a left parenthesis for grouping sub-expressions.
    pub fn open_group(mut self) -> Self {
        self.buf.push('(');
        self
    }

    /// Appends a right parenthesis.
    pub fn close_group(mut self) -> Self {
        self.buf.push(')');
        self
    }

    /// Returns the completed RSQL expression string.
    pub fn build(self) -> String {
        self.buf
    }

    /// Reports whether no tokens have been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Wraps `value` in double quotes and escapes embedded double quotes.
/// Wildcards already present in the value are preserved, allowing callers
/// to embed wildcards in `equal_to`/`not_equal_to` expressions.
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\\\""))
}

/// Escapes literal asterisks and backslashes in a value used with
/// `contains`/`starts_with`/`ends_with`, so the user's value is treated as
/// a plain string rather than a wildcard pattern.
fn escape_literal_wildcard(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('*', "\\*")
        .replace('"', "\\\"")
}

/// Flat query parameter mapping for list and pagination operations.
///
/// The recognized keys are `filter` (RSQL expression), `sort`
/// (comma-joined `field:direction` pairs), `page` (zero-based), and
/// `page-size`. Any other key is passed through to the server verbatim,
/// so new vendor parameters work without an SDK release.
///
/// Keys are held in a sorted map, so encoding is deterministic.
///
/// # Example
///
/// ```rust
/// use jamfpro::api::{QueryParams, SortDirection};
///
/// let query = QueryParams::new()
///     .filter(r#"name=="x""#)
///     .sort(&[("name", SortDirection::Asc), ("id", SortDirection::Desc)])
///     .page(0)
///     .page_size(50)
///     .set("section", "GENERAL");
///
/// assert_eq!(query.get("sort"), Some("name:asc,id:desc"));
/// assert_eq!(query.get("section"), Some("GENERAL"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: BTreeMap<String, String>,
}

impl QueryParams {
    /// Returns an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the RSQL `filter` expression.
    pub fn filter(self, expression: impl Into<String>) -> Self {
        self.set("filter", expression.into())
    }

    /// Sets the `sort` parameter from `(field, direction)` pairs, joined
    /// as `field:direction,field:direction`.
    pub fn sort(self, fields: &[(&str, SortDirection)]) -> Self {
        let joined = fields
            .iter()
            .map(|(field, direction)| format!("{field}:{direction}"))
            .collect::<Vec<_>>()
            .join(",");
        self.set("sort", joined)
    }

    /// Sets the zero-based `page` index.
    pub fn page(self, page: u32) -> Self {
        self.set("page", page.to_string())
    }

    /// Sets the `page-size` parameter.
    pub fn page_size(self, size: u32) -> Self {
        self.set("page-size", size.to_string())
    }

    /// Sets an arbitrary key verbatim. Unrecognized keys are forwarded to
    /// the server unchanged.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// In-place variant of [`set`](Self::set).
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Returns the value for `key`, if set.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Reports whether no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterates over `(key, value)` pairs in key order. Pairs with empty
    /// values are skipped, matching the transport's behaviour of never
    /// sending empty parameters.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encodes the parameters as a query string (without leading `?`).
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.iter() {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }

    /// Decodes a query string (without leading `?`) back into parameters.
    /// Inverse of [`encode`](Self::encode) for single-valued keys.
    pub fn decode(query: &str) -> Self {
        let mut params = Self::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            params.insert(key.into_owned(), value.into_owned());
        }
        params
    }
}
