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

use std::path::Path;

use notedown_core::assemble::assemble;
use notedown_core::config::Config;
use notedown_core::error::Fallible;
use notedown_core::parser::parse_file;
use notedown_core::stored::StoredNote;

use crate::cmd::write_stored;

/// Parse, check and render every note in a file.
pub fn render_notes(file: &str, tags: &str, config: &Config) -> Fallible<Vec<StoredNote>> {
    let render_config = config.render_config()?;
    let parsed = parse_file(Path::new(file))?;
    let assembled = assemble(parsed, config)?;
    let notes = assembled
        .notes
        .iter()
        .map(|note| StoredNote::from_parsed(note, &render_config, tags))
        .collect();
    Ok(notes)
}

pub fn render_file(file: &str, tags: &str, output: Option<String>, config: &Config) -> Fallible<()> {
    let notes = render_notes(file, tags, config)?;
    write_stored(&notes, output)
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use notedown_core::provenance::is_generated;
    use tempfile::tempdir;

    use super::*;
    use crate::cmd::read_stored;

    #[test]
    fn test_render_file() -> Fallible<()> {
        let dir = tempdir()?;
        let input = dir.path().join("notes.md");
        let output = dir.path().join("notes.json");
        write(
            &input,
            "tags: deck\n\n# One\n## Front\nWhat is **this**?\n## Back\nA test\n",
        )?;
        render_file(
            &input.display().to_string(),
            "imported",
            Some(output.display().to_string()),
            &Config::default(),
        )?;
        let notes = read_stored(&output.display().to_string())?;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].tags, vec!["imported".to_string(), "deck".to_string()]);
        assert!(is_generated(&notes[0].fields[0].value));
        assert_eq!(notes[0].fields[1].value, "A test");
        Ok(())
    }

    #[test]
    fn test_render_unknown_model() -> Fallible<()> {
        let dir = tempdir()?;
        let input = dir.path().join("notes.md");
        write(&input, "# One\nmodel: Cloze\n## Text\nx\n")?;
        let result = render_notes(&input.display().to_string(), "", &Config::default());
        assert!(result.is_err());
        Ok(())
    }
}
