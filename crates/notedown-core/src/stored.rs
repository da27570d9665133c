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

use crossterm::style::Attribute;
use crossterm::style::Stylize;
use serde::Deserialize;
use serde::Serialize;

use crate::assemble::Assembled;
use crate::assemble::SchemaLookup;
use crate::assemble::assemble;
use crate::assemble::resolve_note;
use crate::config::RenderConfig;
use crate::error::Fallible;
use crate::error::fail;
use crate::markdown::render;
use crate::parser::ParsedFile;
use crate::parser::escape_field_text;
use crate::parser::parse_edited_notes;
use crate::provenance::extract_markdown;
use crate::provenance::is_generated;
use crate::screen::html_to_screen;
use crate::types::note::ParsedNote;

/// Width of the model column in [`StoredNote::summary_line`].
const MODEL_COLUMN: usize = 14;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredField {
    pub name: String,
    /// HTML, or plain text for fields stored without rendering.
    pub value: String,
}

/// A note as the note store holds it: field values are stored HTML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredNote {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub model: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub fields: Vec<StoredField>,
}

/// Selects a field by position or by name.
#[derive(Debug, Clone, Copy)]
pub enum FieldRef<'a> {
    Index(usize),
    Name(&'a str),
}

impl StoredNote {
    /// Render a parsed note for storage. `extra_tags` are added to the
    /// note's own tags.
    pub fn from_parsed(note: &ParsedNote, config: &RenderConfig, extra_tags: &str) -> Self {
        let mut tags: Vec<String> = Vec::new();
        for tag in extra_tags
            .split_whitespace()
            .chain(note.tags.iter().map(String::as_str))
        {
            if !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        let fields = note
            .fields
            .iter()
            .map(|(name, text)| StoredField {
                name: name.clone(),
                value: render(text, note.markdown, config).to_html(),
            })
            .collect();
        StoredNote {
            id: None,
            model: note.model.clone(),
            tags,
            fields,
        }
    }

    /// Whether any field holds rendered Markdown.
    pub fn is_markdown(&self) -> bool {
        self.fields.iter().any(|field| is_generated(&field.value))
    }

    pub fn tag_string(&self) -> String {
        self.tags.join(", ")
    }

    /// The note in the note file format, for editing.
    pub fn to_markdown(&self) -> String {
        let heading = match self.id {
            Some(id) => format!("# Note ID: {id}"),
            None => "# Note".to_string(),
        };
        let mut lines = vec![heading];
        lines.extend(self.property_lines());
        lines.push(String::new());
        lines.extend(self.field_lines());
        lines.join("\n")
    }

    /// The note as a skeleton for a new note of the same kind.
    pub fn to_template(&self) -> String {
        let mut lines = self.property_lines();
        lines.push(String::new());
        lines.push("# Note".to_string());
        lines.push(String::new());
        lines.extend(self.field_lines());
        lines.join("\n")
    }

    fn property_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("model: {}", self.model),
            format!("tags: {}", self.tag_string()),
        ];
        if !self.is_markdown() {
            lines.push("markdown: false".to_string());
        }
        lines
    }

    fn field_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for field in &self.fields {
            lines.push(format!("## {}", field.name));
            lines.push(escape_field_text(&html_to_screen(&field.value, true)));
            lines.push(String::new());
        }
        lines
    }

    /// The note styled for the terminal.
    pub fn print(&self) -> String {
        let heading = match self.id {
            Some(id) => format!("# Note ID: {id}"),
            None => "# Note".to_string(),
        };
        let mut lines = vec![
            heading.green().to_string(),
            format!("{}{}", "model: ".yellow(), self.model),
            format!("{}{}", "tags: ".yellow(), self.tag_string()),
        ];
        if !self.is_markdown() {
            lines.push(format!("{} false", "markdown:".yellow()));
        }
        lines.push(String::new());
        for field in &self.fields {
            let name = if is_generated(&field.value) {
                format!("# {} (md)", field.name)
            } else {
                format!("# {}", field.name)
            };
            lines.push(name.blue().to_string());
            lines.push(html_to_screen(&field.value, false));
            lines.push(String::new());
        }
        lines.join("\n")
    }

    /// One line for a list of notes: the model, then as much of the first
    /// field as fits in `width` columns.
    pub fn summary_line(&self, width: usize) -> String {
        let first = self
            .fields
            .first()
            .map(|field| html_to_screen(&field.value, false))
            .unwrap_or_default();
        let first = collapse_whitespace(&first.replace('\n', " "));
        let first: String = first.chars().take(width.saturating_sub(MODEL_COLUMN)).collect();
        let model: String = self.model.chars().take(MODEL_COLUMN - 1).collect();
        let model = format!("{model:<width$}", width = MODEL_COLUMN);
        let model = if self.tags.iter().any(|tag| tag == "marked") {
            model.yellow()
        } else {
            model.green()
        };
        format!("{model}{first}{}", Attribute::Reset)
    }

    fn field_index(&self, field: FieldRef) -> Option<usize> {
        match field {
            FieldRef::Index(index) => (index < self.fields.len()).then_some(index),
            FieldRef::Name(name) => self.fields.iter().position(|f| f.name == name),
        }
    }

    /// A field's text, as Markdown if it was rendered from Markdown.
    pub fn field_markdown(&self, field: FieldRef) -> Fallible<String> {
        let Some(index) = self.field_index(field) else {
            return fail(format!("Note has no field {field:?}."));
        };
        let value = &self.fields[index].value;
        if is_generated(value) {
            Ok(extract_markdown(value)?)
        } else {
            Ok(value.clone())
        }
    }

    /// Turn a rendered field back into its Markdown, or render a plain one.
    pub fn toggle_markdown(&mut self, field: FieldRef, config: &RenderConfig) -> Fallible<()> {
        let Some(index) = self.field_index(field) else {
            return fail(format!("Note has no field {field:?}."));
        };
        let value = &mut self.fields[index].value;
        *value = if is_generated(value) {
            extract_markdown(value)?
        } else {
            render(value, true, config).to_html()
        };
        Ok(())
    }

    /// Replace tags and field values with those of an edited note. Fields
    /// are matched by position.
    pub fn apply_edit(&mut self, edit: &ParsedNote, config: &RenderConfig) -> Fallible<()> {
        if edit.fields.len() != self.fields.len() {
            return fail(format!(
                "Edited note has {} fields, expected {}.",
                edit.fields.len(),
                self.fields.len()
            ));
        }
        self.tags = edit.tags.iter().cloned().collect();
        for (field, (_, text)) in self.fields.iter_mut().zip(&edit.fields) {
            field.value = render(text, edit.markdown, config).to_html();
        }
        Ok(())
    }

    /// Apply the text of an edited [`StoredNote::to_markdown`]. The first
    /// note in the text updates this one; any further notes are returned,
    /// checked against the schema, to be added as new notes.
    pub fn apply_edited_text(
        &mut self,
        source_path: &str,
        text: &str,
        config: &RenderConfig,
        schema: &impl SchemaLookup,
    ) -> Fallible<Assembled> {
        let ParsedFile {
            defaults,
            mut blocks,
            fieldless,
        } = parse_edited_notes(source_path, text)?;
        if blocks.is_empty() {
            return fail("Edited text contains no note.");
        }
        if !fieldless.is_empty() {
            return fail(format!(
                "Edited text has notes without fields: {}.",
                fieldless.join(", ")
            ));
        }
        let first = resolve_note(&defaults, blocks.remove(0));
        let rest = assemble(
            ParsedFile {
                defaults,
                blocks,
                fieldless,
            },
            schema,
        )?;
        self.apply_edit(&first, config)?;
        Ok(rest)
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = String::new();
    for c in text.chars() {
        if c.is_whitespace() {
            run.push(c);
            continue;
        }
        if run.chars().count() >= 3 {
            out.push(' ');
        } else {
            out.push_str(&run);
        }
        run.clear();
        out.push(c);
    }
    out.push_str(&run);
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::assemble::split_tags;

    fn parsed(markdown: bool) -> ParsedNote {
        ParsedNote {
            title: "Note 1".to_string(),
            model: "Basic".to_string(),
            tags: split_tags("marked"),
            markdown,
            fields: vec![
                ("Front".to_string(), "Question?".to_string()),
                ("Back".to_string(), "**Answer**\n\nwith detail".to_string()),
            ],
        }
    }

    fn schema() -> BTreeMap<String, Vec<String>> {
        let mut schema = BTreeMap::new();
        schema.insert(
            "Basic".to_string(),
            vec!["Front".to_string(), "Back".to_string()],
        );
        schema
    }

    #[test]
    fn test_from_parsed() {
        let note = StoredNote::from_parsed(&parsed(true), &RenderConfig::default(), "new marked");
        assert_eq!(note.tags, vec!["new".to_string(), "marked".to_string()]);
        assert_eq!(note.fields[0].value, "Question?");
        assert!(is_generated(&note.fields[1].value));
        assert!(note.is_markdown());
    }

    #[test]
    fn test_from_parsed_without_markdown() {
        let note = StoredNote::from_parsed(&parsed(false), &RenderConfig::default(), "");
        assert_eq!(note.fields[1].value, "**Answer**\n\nwith detail");
        assert!(!note.is_markdown());
    }

    #[test]
    fn test_to_markdown() {
        let mut note = StoredNote::from_parsed(&parsed(true), &RenderConfig::default(), "");
        note.id = Some(42);
        assert_eq!(
            note.to_markdown(),
            "# Note ID: 42\nmodel: Basic\ntags: marked\n\n## Front\nQuestion?\n\n## Back\n**Answer**\n\nwith detail\n"
        );
    }

    #[test]
    fn test_to_template() {
        let note = StoredNote::from_parsed(&parsed(false), &RenderConfig::default(), "");
        assert_eq!(
            note.to_template(),
            "model: Basic\ntags: marked\nmarkdown: false\n\n# Note\n\n## Front\nQuestion?\n\n## Back\n**Answer**\n\nwith detail\n"
        );
    }

    #[test]
    fn test_edit_round_trip() -> Fallible<()> {
        let config = RenderConfig::default();
        let original = StoredNote::from_parsed(&parsed(true), &config, "");
        let mut note = original.clone();
        let added = note.apply_edited_text("edit.md", &note.to_markdown(), &config, &schema())?;
        assert!(added.notes.is_empty());
        assert_eq!(note, original);
        Ok(())
    }

    #[test]
    fn test_edit_with_new_notes() -> Fallible<()> {
        let config = RenderConfig::default();
        let mut note = StoredNote::from_parsed(&parsed(true), &config, "");
        let text = "# Note\ntags: changed\n## Front\nNew *front*\n## Back\nB\n# Extra\n## Front\nq\n## Back\na\n";
        let added = note.apply_edited_text("edit.md", text, &config, &schema())?;
        assert_eq!(added.notes.len(), 1);
        assert_eq!(note.tags, vec!["changed".to_string()]);
        assert_eq!(note.field_markdown(FieldRef::Name("Front"))?, "New *front*");
        assert_eq!(note.field_markdown(FieldRef::Index(1))?, "B");
        Ok(())
    }

    #[test]
    fn test_edit_keeps_field_with_headings() -> Fallible<()> {
        let config = RenderConfig::default();
        let mut note = StoredNote::from_parsed(&parsed(true), &config, "");
        note.fields[1].value = render("# Title\n\nBody *x*\n## Sub", true, &config).to_html();
        let original = note.clone();
        let text = note.to_markdown();
        assert!(text.contains("\n # Title\n"));
        assert!(text.contains("\n ## Sub\n"));
        let added = note.apply_edited_text("edit.md", &text, &config, &schema())?;
        assert!(added.notes.is_empty());
        assert_eq!(note, original);
        assert_eq!(
            note.field_markdown(FieldRef::Name("Back"))?,
            "# Title\n\nBody *x*\n## Sub"
        );
        Ok(())
    }

    #[test]
    fn test_edit_with_fieldless_note_is_rejected() {
        let config = RenderConfig::default();
        let mut note = StoredNote::from_parsed(&parsed(true), &config, "");
        let original = note.clone();
        let text = "# Note\n## Front\nq\n## Back\n# Title\n\nBody *x*\n";
        let result = note.apply_edited_text("edit.md", text, &config, &schema());
        assert!(result.is_err());
        assert_eq!(note, original);
    }

    #[test]
    fn test_edit_with_wrong_field_count() {
        let config = RenderConfig::default();
        let mut note = StoredNote::from_parsed(&parsed(true), &config, "");
        let result = note.apply_edited_text("edit.md", "# N\n## Front\nx\n", &config, &schema());
        assert!(result.is_err());
    }

    #[test]
    fn test_toggle_markdown() -> Fallible<()> {
        let config = RenderConfig::default();
        let mut note = StoredNote::from_parsed(&parsed(true), &config, "");
        note.toggle_markdown(FieldRef::Name("Back"), &config)?;
        assert_eq!(note.fields[1].value, "**Answer**\n\nwith detail");
        note.toggle_markdown(FieldRef::Index(1), &config)?;
        assert!(is_generated(&note.fields[1].value));
        assert!(note.toggle_markdown(FieldRef::Index(5), &config).is_err());
        Ok(())
    }

    #[test]
    fn test_field_markdown() -> Fallible<()> {
        let note = StoredNote::from_parsed(&parsed(true), &RenderConfig::default(), "");
        assert_eq!(note.field_markdown(FieldRef::Index(0))?, "Question?");
        assert_eq!(
            note.field_markdown(FieldRef::Name("Back"))?,
            "**Answer**\n\nwith detail"
        );
        assert!(note.field_markdown(FieldRef::Name("Extra")).is_err());
        Ok(())
    }

    #[test]
    fn test_print() {
        let note = StoredNote::from_parsed(&parsed(true), &RenderConfig::default(), "");
        let printed = note.print();
        assert!(printed.contains("Back (md)"));
        assert!(!printed.contains("Front (md)"));
        assert!(!printed.contains("**"));
    }

    #[test]
    fn test_summary_line() {
        let note = StoredNote {
            id: None,
            model: "A very long model name".to_string(),
            tags: vec![],
            fields: vec![StoredField {
                name: "Front".to_string(),
                value: "<div>one</div><div>two     three</div>".to_string(),
            }],
        };
        let line = note.summary_line(30);
        assert!(line.contains("A very long m "));
        assert!(line.contains("one two three"));
        assert!(!line.contains("model name"));
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("a  b     c"), "a  b c");
    }

    #[test]
    fn test_json_shape() -> Fallible<()> {
        let note = StoredNote::from_parsed(&parsed(false), &RenderConfig::default(), "");
        let json = serde_json::to_string(&note)?;
        assert!(!json.contains("\"id\""));
        let back: StoredNote = serde_json::from_str(&json)?;
        assert_eq!(back, note);
        Ok(())
    }
}
