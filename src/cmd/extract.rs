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

use std::fs::read_to_string;
use std::io::stdin;

use notedown_core::error::Fallible;
use notedown_core::provenance::extract_markdown;

/// Recover the Markdown of a rendered field read from `file`, or stdin.
pub fn extract_field(file: Option<String>) -> Fallible<String> {
    let html = match file {
        Some(path) => read_to_string(path)?,
        None => std::io::read_to_string(stdin())?,
    };
    Ok(extract_markdown(html.trim())?)
}
