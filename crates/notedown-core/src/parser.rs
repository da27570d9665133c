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

//! Parser for note files.
//!
//! A note file looks like this:
//!
//! ```text
//! model: Basic
//! tags: marked
//!
//! # Note 1
//! ## Front
//! Question?
//!
//! ## Back
//! Answer.
//! ```
//!
//! `key: value` lines before the first `#` heading are file defaults. A `#`
//! heading starts a note, whose own properties come before its first `##`
//! heading. Each `##` heading starts a field. Fenced code blocks are copied
//! verbatim into the open field.

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fs::read_to_string;
use std::path::Path;

use crate::error::Fallible;
use crate::types::block::RawNoteBlock;
use crate::types::properties::Defaults;
use crate::types::properties::Properties;

/// Everything read from one note file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFile {
    pub defaults: Defaults,
    pub blocks: Vec<RawNoteBlock>,
    /// Titles of notes that were dropped because they had no fields.
    pub fieldless: Vec<String>,
}

/// Parse the text of a note file.
///
/// # Arguments
/// * `source_path` - A reference path for error messages
/// * `text` - The content to parse
pub fn parse_notes(source_path: &str, text: &str) -> Result<ParsedFile, ParserError> {
    let parser = Parser::new(source_path.to_string());
    parser.parse(text)
}

/// Parse the text of an edited stored note. Field lines escaped by
/// [`escape_field_text`] are restored.
pub fn parse_edited_notes(source_path: &str, text: &str) -> Result<ParsedFile, ParserError> {
    let parser = Parser {
        source_path: source_path.to_string(),
        escaped_headings: true,
    };
    parser.parse(text)
}

/// Indent field lines that would read as `#` or `##` headings by one space,
/// outside code fences. [`parse_edited_notes`] removes the space again.
pub fn escape_field_text(text: &str) -> String {
    let mut in_fence = false;
    let mut lines = Vec::new();
    for line in text.lines() {
        if in_fence {
            in_fence = !is_fence_close(line);
            lines.push(line.to_string());
        } else if is_fence_open(line) {
            in_fence = true;
            lines.push(line.to_string());
        } else if is_escapable(line) {
            lines.push(format!(" {line}"));
        } else {
            lines.push(line.to_string());
        }
    }
    lines.join("\n")
}

/// Read and parse a note file.
pub fn parse_file(path: &Path) -> Fallible<ParsedFile> {
    let text = read_to_string(path)?;
    let parsed = parse_notes(&path.display().to_string(), &text)?;
    Ok(parsed)
}

pub struct Parser {
    source_path: String,
    escaped_headings: bool,
}

#[derive(Debug)]
pub struct ParserError {
    pub message: String,
    pub source_path: String,
    pub line_num: usize,
}

impl ParserError {
    fn new(message: impl Into<String>, source_path: String, line_num: usize) -> Self {
        ParserError {
            message: message.into(),
            source_path,
            line_num,
        }
    }
}

impl Display for ParserError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} Location: {}:{}",
            self.message,
            self.source_path,
            self.line_num + 1
        )
    }
}

impl Error for ParserError {}

/// A field whose text is still being collected.
struct OpenField {
    name: String,
    text: String,
}

impl OpenField {
    fn new(name: &str) -> Self {
        OpenField {
            name: name.to_string(),
            text: String::new(),
        }
    }

    fn push_line(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
    }

    fn finish(self) -> (String, String) {
        (self.name, self.text.trim().to_string())
    }
}

/// A note whose fields are still being collected.
struct OpenBlock {
    title: String,
    properties: Properties,
    fields: Vec<(String, String)>,
    /// Whether non-blank text outside any field was skipped.
    skipped_text: bool,
}

/// What an [`OpenBlock`] turns into once its note heading is closed.
enum Finished {
    /// The block had at least one field.
    Note(RawNoteBlock),
    /// The block had no fields. Its properties may become file defaults.
    Fieldless {
        title: String,
        properties: Properties,
        skipped_text: bool,
    },
}

impl OpenBlock {
    fn new(title: &str) -> Self {
        OpenBlock {
            title: title.to_string(),
            properties: Properties::default(),
            fields: Vec::new(),
            skipped_text: false,
        }
    }

    fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|(field_name, _)| field_name == name)
    }

    fn with_field(mut self, field: OpenField) -> Self {
        self.fields.push(field.finish());
        self
    }

    fn finish(self) -> Finished {
        if self.fields.is_empty() {
            Finished::Fieldless {
                title: self.title,
                properties: self.properties,
                skipped_text: self.skipped_text,
            }
        } else {
            Finished::Note(RawNoteBlock {
                title: self.title,
                properties: self.properties,
                fields: self.fields,
            })
        }
    }
}

enum State {
    /// No field is open: property lines and headings are structural.
    ExpectingPropertyOrStructure { block: Option<OpenBlock> },
    /// Collecting the text of a field.
    InFieldBody { block: OpenBlock, field: OpenField },
    /// Inside a code fence. Lines go to the field open in `outer`, if any,
    /// and are never interpreted. `outer` is never itself a fence.
    InFencedBlock { outer: Box<State> },
}

impl State {
    fn push_line(&mut self, line: &str) {
        match self {
            State::InFieldBody { field, .. } => field.push_line(line),
            State::InFencedBlock { outer } => outer.push_line(line),
            State::ExpectingPropertyOrStructure { .. } => {}
        }
    }
}

enum Line<'a> {
    /// A line like ```` ```rust ````.
    FenceOpen(&'a str),
    /// A line that's just ```` ``` ````, read inside a fence.
    FenceClose(&'a str),
    /// A line like `key: value`.
    Property {
        key: &'a str,
        value: &'a str,
        line: &'a str,
    },
    /// A line like `## Title`.
    Heading {
        level: usize,
        title: &'a str,
        line: &'a str,
    },
    /// Any other line.
    Text(&'a str),
}

impl<'a> Line<'a> {
    fn read(line: &'a str, in_fence: bool) -> Self {
        if in_fence {
            if is_fence_close(line) {
                Line::FenceClose(line)
            } else {
                Line::Text(line)
            }
        } else if is_fence_open(line) {
            Line::FenceOpen(line)
        } else if let Some((key, value)) = read_property(line) {
            Line::Property { key, value, line }
        } else if let Some((level, title)) = read_heading(line) {
            Line::Heading { level, title, line }
        } else {
            Line::Text(line)
        }
    }

    fn raw(&self) -> &'a str {
        match self {
            Line::FenceOpen(line) | Line::FenceClose(line) | Line::Text(line) => line,
            Line::Property { line, .. } | Line::Heading { line, .. } => line,
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_fence_open(line: &str) -> bool {
    match line.strip_prefix("```") {
        Some(rest) => {
            let lang_end = rest.find(|c: char| !is_word_char(c)).unwrap_or(rest.len());
            rest[lang_end..].chars().all(char::is_whitespace)
        }
        None => false,
    }
}

fn is_fence_close(line: &str) -> bool {
    match line.strip_prefix("```") {
        Some(rest) => rest.chars().all(char::is_whitespace),
        None => false,
    }
}

fn read_property(line: &str) -> Option<(&str, &str)> {
    let key_end = line.find(|c: char| !is_word_char(c)).unwrap_or(line.len());
    if key_end == 0 {
        return None;
    }
    let value = line[key_end..].strip_prefix(": ")?;
    Some((&line[..key_end], value))
}

fn read_heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if level == 0 {
        None
    } else {
        Some((level, line[level..].trim()))
    }
}

/// Whether a field line, after any leading spaces, is a `#` or `##` heading.
fn is_escapable(line: &str) -> bool {
    matches!(read_heading(line.trim_start_matches(' ')), Some((1 | 2, _)))
}

fn unescape_field_line(line: &str) -> &str {
    match line.strip_prefix(' ') {
        Some(rest) if is_escapable(rest) => rest,
        _ => line,
    }
}

#[derive(Default)]
struct Output {
    defaults: Defaults,
    blocks: Vec<RawNoteBlock>,
    fieldless: Vec<String>,
}

impl Output {
    /// Close a note at a `#` heading.
    fn close_block(&mut self, block: OpenBlock) {
        match block.finish() {
            Finished::Note(note) => {
                log::debug!("Finished note '{}' with {} fields", note.title, note.fields.len());
                self.blocks.push(note);
            }
            Finished::Fieldless {
                title,
                properties,
                skipped_text,
            } => {
                if skipped_text || properties.is_empty() {
                    self.drop_fieldless(title);
                }
                self.defaults.merge(properties);
            }
        }
    }

    /// Close a note at the end of the file. Properties of a note without
    /// fields only become defaults if no note has been read yet.
    fn close_last_block(&mut self, block: OpenBlock) {
        match block.finish() {
            Finished::Note(note) => {
                log::debug!("Finished note '{}' with {} fields", note.title, note.fields.len());
                self.blocks.push(note);
            }
            Finished::Fieldless {
                title,
                properties,
                skipped_text,
            } => {
                if self.blocks.is_empty() && !properties.is_empty() && !skipped_text {
                    self.defaults.merge(properties);
                } else {
                    if self.blocks.is_empty() {
                        self.defaults.merge(properties);
                    }
                    self.drop_fieldless(title);
                }
            }
        }
    }

    fn drop_fieldless(&mut self, title: String) {
        log::warn!("Note '{title}' has no fields, its content is ignored");
        self.fieldless.push(title);
    }
}

impl Parser {
    pub fn new(source_path: String) -> Self {
        Parser {
            source_path,
            escaped_headings: false,
        }
    }

    /// Parse all the notes in the given text.
    pub fn parse(&self, text: &str) -> Result<ParsedFile, ParserError> {
        let mut output = Output::default();
        let mut state = State::ExpectingPropertyOrStructure { block: None };
        for (line_num, line) in text.lines().enumerate() {
            let in_fence = matches!(state, State::InFencedBlock { .. });
            let line = Line::read(line, in_fence);
            state = self.parse_line(state, line, line_num, &mut output)?;
        }
        self.finalize(state, &mut output);
        Ok(ParsedFile {
            defaults: output.defaults,
            blocks: output.blocks,
            fieldless: output.fieldless,
        })
    }

    fn parse_line(
        &self,
        state: State,
        line: Line,
        line_num: usize,
        output: &mut Output,
    ) -> Result<State, ParserError> {
        match state {
            State::ExpectingPropertyOrStructure { block } => match line {
                Line::FenceOpen(_) => Ok(State::InFencedBlock {
                    outer: Box::new(State::ExpectingPropertyOrStructure { block }),
                }),
                Line::Property { key, value, .. } => match block {
                    Some(mut block) => {
                        block.properties.set(key, value);
                        Ok(State::ExpectingPropertyOrStructure { block: Some(block) })
                    }
                    None => {
                        output.defaults.set(key, value);
                        Ok(State::ExpectingPropertyOrStructure { block: None })
                    }
                },
                Line::Heading {
                    level: 1, title, ..
                } => {
                    if let Some(block) = block {
                        output.close_block(block);
                    }
                    Ok(State::ExpectingPropertyOrStructure {
                        block: Some(OpenBlock::new(title)),
                    })
                }
                Line::Heading {
                    level: 2, title, ..
                } => match block {
                    Some(block) => self.open_field(block, title, line_num),
                    None => Err(ParserError::new(
                        format!("Found field heading '{title}' before any note heading."),
                        self.source_path.clone(),
                        line_num,
                    )),
                },
                // Stray content outside of any field.
                Line::Heading { .. } | Line::FenceClose(_) | Line::Text(_) => {
                    let block = block.map(|mut block| {
                        block.skipped_text |= !line.raw().trim().is_empty();
                        block
                    });
                    Ok(State::ExpectingPropertyOrStructure { block })
                }
            },
            State::InFieldBody { block, mut field } => match line {
                Line::FenceOpen(text) => {
                    field.push_line(text);
                    Ok(State::InFencedBlock {
                        outer: Box::new(State::InFieldBody { block, field }),
                    })
                }
                Line::Heading {
                    level: 1, title, ..
                } => {
                    output.close_block(block.with_field(field));
                    Ok(State::ExpectingPropertyOrStructure {
                        block: Some(OpenBlock::new(title)),
                    })
                }
                Line::Heading {
                    level: 2, title, ..
                } => self.open_field(block.with_field(field), title, line_num),
                Line::Text(text) if self.escaped_headings => {
                    field.push_line(unescape_field_line(text));
                    Ok(State::InFieldBody { block, field })
                }
                // Deeper headings and property-like lines are field content.
                other => {
                    field.push_line(other.raw());
                    Ok(State::InFieldBody { block, field })
                }
            },
            State::InFencedBlock { mut outer } => {
                outer.push_line(line.raw());
                match line {
                    Line::FenceClose(_) => Ok(*outer),
                    _ => Ok(State::InFencedBlock { outer }),
                }
            }
        }
    }

    fn open_field(
        &self,
        block: OpenBlock,
        title: &str,
        line_num: usize,
    ) -> Result<State, ParserError> {
        if block.has_field(title) {
            return Err(ParserError::new(
                format!("Duplicate field '{title}' in note '{}'.", block.title),
                self.source_path.clone(),
                line_num,
            ));
        }
        Ok(State::InFieldBody {
            block,
            field: OpenField::new(title),
        })
    }

    fn finalize(&self, state: State, output: &mut Output) {
        match state {
            State::ExpectingPropertyOrStructure { block } => {
                if let Some(block) = block {
                    output.close_last_block(block);
                }
            }
            State::InFieldBody { block, field } => {
                output.close_last_block(block.with_field(field));
            }
            State::InFencedBlock { outer } => {
                log::warn!("{}: file ended inside a code fence", self.source_path);
                self.finalize(*outer, output);
            }
        }
    }
}
