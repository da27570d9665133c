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

use notedown_core::config::Config;
use notedown_core::error::Fallible;
use notedown_core::error::fail;

use crate::cmd::render::render_notes;

/// A skeleton for a new note, modelled on the first note of a file.
pub fn note_template(file: &str, config: &Config) -> Fallible<String> {
    let notes = render_notes(file, "", config)?;
    match notes.first() {
        Some(note) => Ok(note.to_template()),
        None => fail(format!("No notes in {file}.")),
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_template() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("notes.md");
        write(&path, "# One\ntags: x\n## Front\n**a**\n## Back\nb\n")?;
        assert_eq!(
            note_template(&path.display().to_string(), &Config::default())?,
            "model: Basic\ntags: x\n\n# Note\n\n## Front\n**a**\n\n## Back\nb\n"
        );
        Ok(())
    }

    #[test]
    fn test_template_of_empty_file() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("notes.md");
        write(&path, "model: Basic\n")?;
        assert!(note_template(&path.display().to_string(), &Config::default()).is_err());
        Ok(())
    }
}
