//! HTML page rendering
//!
//! Page shells are embedded in the binary and filled by replacing
//! `{{name}}` placeholders in a single pass. Data for the client scripts is
//! embedded as JSON inside `<script type="application/json">` blocks.

use super::error::AppError;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rust_embed::RustEmbed;
use serde::Serialize;

#[derive(RustEmbed)]
#[folder = "src/http/templates/"]
struct Templates;

#[derive(RustEmbed)]
#[folder = "src/http/static/"]
struct Assets;

/// Characters escaped when an edge name is placed in a URL path segment
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Values substituted into a template
#[derive(Debug, Default)]
pub struct PageContext {
    values: Vec<(&'static str, String)>,
}

impl PageContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert text, HTML-escaped
    pub fn text(mut self, key: &'static str, value: &str) -> Self {
        self.values.push((key, escape_html(value)));
        self
    }

    /// Insert a value as JSON safe to place inside a script block
    pub fn json<T: Serialize>(mut self, key: &'static str, value: &T) -> Result<Self, AppError> {
        let json = script_json(value)
            .map_err(|e| AppError::Internal(format!("Failed to encode page data: {}", e)))?;
        self.values.push((key, json));
        Ok(self)
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// JSON with `<` escaped so the text cannot close its script element
pub fn script_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?.replace('<', "\\u003c"))
}

/// URL path segment for an edge or experiment name
pub fn path_segment(raw: &str) -> String {
    utf8_percent_encode(raw, PATH_SEGMENT).to_string()
}

/// Replace every `{{key}}` known to the context. Unknown keys are left as is.
pub fn fill(template: &str, context: &PageContext) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                match context.get(key) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn render(template: &str, context: &PageContext) -> Result<Html<String>, AppError> {
    let file = Templates::get(template)
        .ok_or_else(|| AppError::Internal(format!("Missing template {}", template)))?;
    let source = std::str::from_utf8(file.data.as_ref())
        .map_err(|e| AppError::Internal(format!("Template {} is not UTF-8: {}", template, e)))?;
    Ok(Html(fill(source, context)))
}

/// Embedded script or stylesheet
pub fn asset(path: &str) -> Response {
    let Some(file) = Assets::get(path) else {
        return AppError::NotFound(format!("No asset {}", path)).into_response();
    };
    let content_type = match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("js") => mime::APPLICATION_JAVASCRIPT_UTF_8,
        Some("css") => mime::TEXT_CSS_UTF_8,
        _ => mime::APPLICATION_OCTET_STREAM,
    };
    (
        StatusCode::OK,
        [(CONTENT_TYPE, content_type.to_string())],
        file.data.into_owned(),
    )
        .into_response()
}
