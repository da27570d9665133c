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
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;

use crate::parser::ParsedFile;
use crate::types::block::RawNoteBlock;
use crate::types::note::ParsedNote;
use crate::types::properties::Defaults;

/// The model used when neither the note nor the file names one.
pub const DEFAULT_MODEL: &str = "Basic";

/// Source of the expected field names of each model. Owned by the note store.
pub trait SchemaLookup {
    /// The ordered field names of `model`, or `None` if the model is unknown.
    fn field_names(&self, model: &str) -> Option<&[String]>;
}

impl SchemaLookup for BTreeMap<String, Vec<String>> {
    fn field_names(&self, model: &str) -> Option<&[String]> {
        self.get(model).map(Vec::as_slice)
    }
}

impl SchemaLookup for HashMap<String, Vec<String>> {
    fn field_names(&self, model: &str) -> Option<&[String]> {
        self.get(model).map(Vec::as_slice)
    }
}

#[derive(Debug, PartialEq)]
pub struct ValidationError {
    pub model: String,
    pub message: String,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (model '{}')", self.message, self.model)
    }
}

impl Error for ValidationError {}

/// A field whose name differs from the schema's name at the same position.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldNameWarning {
    pub model: String,
    pub expected: String,
    pub found: String,
}

impl Display for FieldNameWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Inconsistent field names for model '{}' ({} != {})",
            self.model, self.expected, self.found
        )
    }
}

/// Notes assembled from one file, plus the warnings raised along the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembled {
    pub notes: Vec<ParsedNote>,
    pub warnings: Vec<FieldNameWarning>,
}

/// Resolve a block against the file defaults. No schema checks happen here.
pub fn resolve_note(defaults: &Defaults, block: RawNoteBlock) -> ParsedNote {
    let properties = block.properties;
    let markdown = properties
        .markdown()
        .or_else(|| defaults.markdown())
        .unwrap_or(true);
    let tags = properties
        .tags
        .as_deref()
        .or(defaults.tags.as_deref())
        .map(split_tags)
        .unwrap_or_default();
    let model = properties
        .model
        .or_else(|| defaults.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    ParsedNote {
        title: block.title,
        model,
        tags,
        markdown,
        fields: block.fields,
    }
}

/// Tags may be separated by commas or whitespace.
pub fn split_tags(tags: &str) -> BTreeSet<String> {
    tags.replace(',', " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Resolve every block of a file and check each note against its model.
///
/// A field count that differs from the model's is fatal, as is a model the
/// schema doesn't know. Field names that differ position by position are
/// only warnings.
pub fn assemble(
    file: ParsedFile,
    schema: &impl SchemaLookup,
) -> Result<Assembled, ValidationError> {
    let ParsedFile { defaults, blocks, .. } = file;
    let mut assembled = Assembled::default();
    for block in blocks {
        let note = resolve_note(&defaults, block);
        let warnings = validate(&note, schema)?;
        for warning in &warnings {
            log::warn!("{warning}");
        }
        assembled.warnings.extend(warnings);
        assembled.notes.push(note);
    }
    Ok(assembled)
}

/// Check one note against its model.
pub fn validate(
    note: &ParsedNote,
    schema: &impl SchemaLookup,
) -> Result<Vec<FieldNameWarning>, ValidationError> {
    let Some(expected) = schema.field_names(&note.model) else {
        return Err(ValidationError {
            model: note.model.clone(),
            message: "Unknown model.".to_string(),
        });
    };
    if expected.len() != note.fields.len() {
        return Err(ValidationError {
            model: note.model.clone(),
            message: format!(
                "Note '{}' has {} fields, expected {}.",
                note.title,
                note.fields.len(),
                expected.len()
            ),
        });
    }
    let warnings = expected
        .iter()
        .zip(note.field_names())
        .filter(|(expected, found)| expected.as_str() != *found)
        .map(|(expected, found)| FieldNameWarning {
            model: note.model.clone(),
            expected: expected.clone(),
            found: found.to_string(),
        })
        .collect();
    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_notes;

    fn schema() -> BTreeMap<String, Vec<String>> {
        let mut schema = BTreeMap::new();
        schema.insert(
            "Basic".to_string(),
            vec!["Front".to_string(), "Back".to_string()],
        );
        schema.insert("Cloze".to_string(), vec!["Text".to_string(), "Extra".to_string()]);
        schema
    }

    fn tags(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_concrete_scenario() -> crate::error::Fallible<()> {
        let input = "model: Basic\ntags: marked\n\n# Note 1\n## Front\nQuestion?\n\n## Back\nAnswer.\n";
        let assembled = assemble(parse_notes("test.md", input)?, &schema())?;
        assert_eq!(assembled.notes.len(), 1);
        assert!(assembled.warnings.is_empty());
        let note = &assembled.notes[0];
        assert_eq!(note.model, "Basic");
        assert_eq!(note.tags, tags(&["marked"]));
        assert!(note.markdown);
        assert_eq!(note.field("Front"), Some("Question?"));
        assert_eq!(note.field("Back"), Some("Answer."));
        Ok(())
    }

    #[test]
    fn test_defaults_inheritance() -> crate::error::Fallible<()> {
        let input = "model: Basic\ntags: x,y\n# N\n## Front\nq\n## Back\na";
        let assembled = assemble(parse_notes("test.md", input)?, &schema())?;
        let note = &assembled.notes[0];
        assert_eq!(note.tags, tags(&["x", "y"]));
        assert_eq!(note.model, "Basic");
        Ok(())
    }

    #[test]
    fn test_note_overrides_defaults() -> crate::error::Fallible<()> {
        let input = "tags: x, y\nmarkdown: false\n# N\nmodel: Cloze\ntags: z\nmd: yes\n## Text\nq\n## Extra\na";
        let assembled = assemble(parse_notes("test.md", input)?, &schema())?;
        let note = &assembled.notes[0];
        assert_eq!(note.model, "Cloze");
        assert_eq!(note.tags, tags(&["z"]));
        assert!(note.markdown);
        Ok(())
    }

    #[test]
    fn test_builtin_defaults() {
        let block = RawNoteBlock {
            title: "N".to_string(),
            properties: Default::default(),
            fields: vec![("Front".to_string(), "q".to_string())],
        };
        let note = resolve_note(&Defaults::default(), block);
        assert_eq!(note.model, DEFAULT_MODEL);
        assert!(note.tags.is_empty());
        assert!(note.markdown);
    }

    #[test]
    fn test_default_markdown_flag() -> crate::error::Fallible<()> {
        let input = "md: no\n# N\n## Front\nq\n## Back\na";
        let assembled = assemble(parse_notes("test.md", input)?, &schema())?;
        assert!(!assembled.notes[0].markdown);
        Ok(())
    }

    #[test]
    fn test_split_tags() {
        assert_eq!(split_tags("a, b  c,d"), tags(&["a", "b", "c", "d"]));
        assert!(split_tags(" , ").is_empty());
    }

    #[test]
    fn test_field_count_mismatch() -> crate::error::Fallible<()> {
        let input = "# N\n## Front\nq\n## Back\na\n## Extra\ne";
        let result = assemble(parse_notes("test.md", input)?, &schema());
        let err = result.err().unwrap();
        assert_eq!(err.model, "Basic");
        Ok(())
    }

    #[test]
    fn test_field_name_mismatch_warns() -> crate::error::Fallible<()> {
        let input = "# N\n## Question\nq\n## Back\na";
        let assembled = assemble(parse_notes("test.md", input)?, &schema())?;
        assert_eq!(assembled.notes.len(), 1);
        assert_eq!(
            assembled.warnings,
            vec![FieldNameWarning {
                model: "Basic".to_string(),
                expected: "Front".to_string(),
                found: "Question".to_string(),
            }]
        );
        Ok(())
    }

    #[test]
    fn test_unknown_model() -> crate::error::Fallible<()> {
        let input = "# N\nmodel: Nope\n## Front\nq";
        let result = assemble(parse_notes("test.md", input)?, &schema());
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn test_error_aborts_whole_file() -> crate::error::Fallible<()> {
        let input = "# A\n## Front\nq\n## Back\na\n# B\n## Front\nq";
        let result = assemble(parse_notes("test.md", input)?, &schema());
        assert!(result.is_err());
        Ok(())
    }
}
