//! Parsing of content references (`content://` and `file://` URIs).

use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::ResolveError;

pub const SCHEME_CONTENT: &str = "content";
pub const SCHEME_FILE: &str = "file";

/// A parsed content reference.
///
/// Keeps the caller's original string next to the parsed parts: some
/// providers are recognised by a literal prefix of the reference rather than
/// by its authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentReference {
    raw: String,
    scheme: String,
    authority: Option<String>,
    path: String,
    segments: Vec<String>,
}

impl ContentReference {
    pub fn parse(input: &str) -> Result<Self, ResolveError> {
        if input.is_empty() {
            return Err(ResolveError::Empty);
        }

        let url = Url::parse(input)
            .map_err(|e| ResolveError::InvalidReference(format!("{}: {}", input, e)))?;

        let authority = url
            .host_str()
            .filter(|host| !host.is_empty())
            .map(str::to_string);
        let segments = url
            .path_segments()
            .map(|segments| segments.map(str::to_string).collect())
            .unwrap_or_default();

        Ok(Self {
            raw: input.to_string(),
            scheme: url.scheme().to_ascii_lowercase(),
            authority,
            path: decode(url.path()),
            segments,
        })
    }

    /// The reference exactly as the caller supplied it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }

    /// Percent-decoded path component.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The provider-specific document id, percent-decoded.
    ///
    /// Recognises both `/document/<id>` and `/tree/<tree>/document/<id>`.
    pub fn document_id(&self) -> Option<String> {
        let segments: Vec<&str> = self.segments.iter().map(String::as_str).collect();
        match segments.as_slice() {
            ["document", id, ..] => Some(decode(id)),
            ["tree", _, "document", id, ..] => Some(decode(id)),
            _ => None,
        }
    }
}

/// Split a document id into its `<kind>:<value>` halves at the first `:`.
pub fn split_document_id(id: &str) -> Result<(&str, &str), ResolveError> {
    id.split_once(':')
        .ok_or_else(|| ResolveError::MalformedDocumentId(id.to_string()))
}

fn decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}
