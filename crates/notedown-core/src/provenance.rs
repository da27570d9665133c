// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Rendered fields remember the Markdown they came from.
//!
//! The source text is stored, base64-encoded, in an attribute on the first
//! element of the rendered HTML. Newlines are written as `<br />` before
//! encoding so the payload stays readable when decoded by hand.

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::html::first_element;

/// Attribute holding the encoded source.
pub const PROVENANCE_ATTRIBUTE: &str = "data-original-markdown";

const LINE_BREAK: &str = "<br />";

/// The value of a field, as produced by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Text stored as it is.
    Plain(String),
    /// HTML rendered from Markdown. `body` always has a first element.
    Generated { body: String, source: String },
}

impl Fragment {
    /// Serialize for storage. The provenance attribute is spliced into the
    /// first start tag; the rest of the body is left byte for byte.
    pub fn to_html(&self) -> String {
        match self {
            Fragment::Plain(text) => text.clone(),
            Fragment::Generated { body, source } => {
                let attribute = format!(" {PROVENANCE_ATTRIBUTE}=\"{}\"", encode_source(source));
                match first_element(body) {
                    Some(tag) => {
                        let (head, tail) = body.split_at(tag.name_end);
                        format!("{head}{attribute}{tail}")
                    }
                    None => format!("<div{attribute}>{body}</div>"),
                }
            }
        }
    }

    /// The text the fragment was made from.
    pub fn source(&self) -> &str {
        match self {
            Fragment::Plain(text) => text,
            Fragment::Generated { source, .. } => source,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, Fragment::Generated { .. })
    }
}

impl Display for Fragment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_html())
    }
}

#[derive(Debug, PartialEq)]
pub enum ProvenanceError {
    /// The first element has no provenance attribute.
    MissingMarker,
    /// The attribute is not valid base64.
    InvalidBase64(String),
    /// The decoded payload is not UTF-8.
    InvalidUtf8,
}

impl Display for ProvenanceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProvenanceError::MissingMarker => write!(f, "HTML has no {PROVENANCE_ATTRIBUTE} marker."),
            ProvenanceError::InvalidBase64(e) => write!(f, "marker is not valid base64: {e}"),
            ProvenanceError::InvalidUtf8 => write!(f, "marker does not decode to UTF-8."),
        }
    }
}

impl Error for ProvenanceError {}

pub fn encode_source(source: &str) -> String {
    STANDARD.encode(source.replace('\n', LINE_BREAK))
}

/// Whether `html` was produced by the renderer.
pub fn is_generated(html: &str) -> bool {
    first_element(html).is_some_and(|tag| tag.has_attribute(PROVENANCE_ATTRIBUTE))
}

/// Recover the Markdown that `html` was rendered from. Callers should check
/// [`is_generated`] first.
pub fn extract_markdown(html: &str) -> Result<String, ProvenanceError> {
    let payload = first_element(html)
        .and_then(|tag| tag.attribute(PROVENANCE_ATTRIBUTE))
        .ok_or(ProvenanceError::MissingMarker)?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| ProvenanceError::InvalidBase64(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|_| ProvenanceError::InvalidUtf8)?;
    Ok(text.replace(LINE_BREAK, "\n").replace("<br>", "\n"))
}
