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

use crate::types::properties::Properties;

/// One note's raw data, as read from the file, before defaults and schema
/// resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNoteBlock {
    /// The text of the `#` heading. Informational only.
    pub title: String,
    pub properties: Properties,
    /// Field names and their trimmed text, in file order. Names are unique.
    pub fields: Vec<(String, String)>,
}

impl RawNoteBlock {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, text)| text.as_str())
    }
}
