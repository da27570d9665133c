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

use notedown_core::config::Config;
use notedown_core::error::Fallible;
use notedown_core::error::fail;
use notedown_core::stored::StoredNote;

use crate::cmd::read_stored;
use crate::cmd::write_stored;

/// Apply an edited note file to the first stored note. Notes added in the
/// edit are rendered and appended.
pub fn apply_edit(json: &str, edited: &str, config: &Config) -> Fallible<Vec<StoredNote>> {
    let render_config = config.render_config()?;
    let mut notes = read_stored(json)?;
    let text = read_to_string(edited)?;
    let Some(first) = notes.first_mut() else {
        return fail(format!("No stored notes in {json}."));
    };
    let added = first.apply_edited_text(edited, &text, &render_config, config)?;
    notes.extend(
        added
            .notes
            .iter()
            .map(|note| StoredNote::from_parsed(note, &render_config, "")),
    );
    Ok(notes)
}

pub fn apply_edit_file(
    json: &str,
    edited: &str,
    output: Option<String>,
    config: &Config,
) -> Fallible<()> {
    let notes = apply_edit(json, edited, config)?;
    write_stored(&notes, output)
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use tempfile::tempdir;

    use super::*;
    use crate::cmd::render::render_notes;

    #[test]
    fn test_apply_edit() -> Fallible<()> {
        let dir = tempdir()?;
        let notes_md = dir.path().join("notes.md");
        let json = dir.path().join("notes.json").display().to_string();
        let edited = dir.path().join("edited.md");
        write(&notes_md, "# One\n## Front\n*a*\n## Back\nb\n")?;
        let config = Config::default();
        let notes = render_notes(&notes_md.display().to_string(), "", &config)?;
        write_stored(&notes, Some(json.clone()))?;

        let text = notes[0].to_markdown().replace("*a*", "*changed*")
            + "\n# Added\n## Front\nc\n## Back\nd\n";
        write(&edited, text)?;
        let updated = apply_edit(&json, &edited.display().to_string(), &config)?;
        assert_eq!(updated.len(), 2);
        assert_eq!(
            updated[0].field_markdown(notedown_core::stored::FieldRef::Index(0))?,
            "*changed*"
        );
        assert_eq!(updated[1].fields[0].value, "c");
        Ok(())
    }

    #[test]
    fn test_apply_to_empty_store() -> Fallible<()> {
        let dir = tempdir()?;
        let json = dir.path().join("notes.json").display().to_string();
        let edited = dir.path().join("edited.md");
        write_stored(&[], Some(json.clone()))?;
        write(&edited, "# One\n## Front\na\n## Back\nb\n")?;
        assert!(apply_edit(&json, &edited.display().to_string(), &Config::default()).is_err());
        Ok(())
    }
}
