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

pub mod apply;
pub mod check;
pub mod extract;
pub mod render;
pub mod show;
pub mod template;

use std::fs::read_to_string;
use std::fs::write;

use notedown_core::error::Fallible;
use notedown_core::stored::StoredNote;

/// Read stored notes from a JSON file, as written by `render`.
pub fn read_stored(path: &str) -> Fallible<Vec<StoredNote>> {
    let text = read_to_string(path)?;
    let notes: Vec<StoredNote> = serde_json::from_str(&text)?;
    Ok(notes)
}

/// Write stored notes as pretty JSON to `output`, or to stdout.
pub fn write_stored(notes: &[StoredNote], output: Option<String>) -> Fallible<()> {
    let json = serde_json::to_string_pretty(notes)?;
    match output {
        Some(path) => {
            write(&path, format!("{json}\n"))?;
            log::info!("Wrote {} notes to {path}", notes.len());
        }
        None => println!("{json}"),
    }
    Ok(())
}
