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

use std::collections::BTreeMap;

/// The `key: value` properties of a note, or of a whole file when they
/// appear before the first note heading.
///
/// Keys are normalized once, when the line is read: keys are lower-cased,
/// `tag` is an alias of `tags`, and the `markdown`/`md` flags are parsed into
/// booleans immediately.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    pub model: Option<String>,
    pub tags: Option<String>,
    markdown: Option<bool>,
    md: Option<bool>,
    /// Keys with no meaning to the assembler. Kept so that nothing the user
    /// typed vanishes without a trace.
    pub extra: BTreeMap<String, String>,
}

/// File-scoped properties.
pub type Defaults = Properties;

impl Properties {
    /// Record a property. The key is normalized, the value is trimmed.
    pub fn set(&mut self, key: &str, value: &str) {
        let key = key.to_lowercase();
        let value = value.trim();
        match key.as_str() {
            "model" => self.model = Some(value.to_string()),
            "tag" | "tags" => self.tags = Some(value.to_string()),
            "markdown" => self.markdown = Some(parse_flag(value)),
            "md" => self.md = Some(parse_flag(value)),
            _ => {
                self.extra.insert(key, value.to_string());
            }
        }
    }

    /// The markdown flag, if either spelling was given. `markdown` wins over
    /// `md` when both are present.
    pub fn markdown(&self) -> Option<bool> {
        self.markdown.or(self.md)
    }

    /// Overwrite these properties with every property set in `other`.
    pub fn merge(&mut self, other: Properties) {
        if other.model.is_some() {
            self.model = other.model;
        }
        if other.tags.is_some() {
            self.tags = other.tags;
        }
        if other.markdown.is_some() {
            self.markdown = other.markdown;
        }
        if other.md.is_some() {
            self.md = other.md;
        }
        self.extra.extend(other.extra);
    }

    pub fn is_empty(&self) -> bool {
        self.model.is_none()
            && self.tags.is_none()
            && self.markdown.is_none()
            && self.md.is_none()
            && self.extra.is_empty()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value, "true" | "yes")
}
