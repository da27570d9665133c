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

use notedown_core::error::Fallible;

use crate::cmd::read_stored;

/// Print the stored notes in a JSON file.
pub fn show_notes(json: &str, parseable: bool, summary: Option<usize>) -> Fallible<String> {
    let notes = read_stored(json)?;
    let mut out = String::new();
    for note in &notes {
        match summary {
            Some(width) => out.push_str(&note.summary_line(width)),
            None if parseable => out.push_str(&note.to_markdown()),
            None => out.push_str(&note.print()),
        }
        out.push('\n');
    }
    Ok(out)
}
