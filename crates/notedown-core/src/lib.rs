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

//! notedown-core: Core library for notedown, a plain text note format for
//! flashcard decks.
//!
//! This library provides:
//! - Parsing Markdown-like note files into note blocks
//! - Resolving notes against file defaults and checking them against models
//! - Rendering fields to HTML that remembers its Markdown source
//! - Recovering that source, and showing stored fields on a terminal

pub mod assemble;
pub mod config;
pub mod error;
pub mod html;
pub mod markdown;
pub mod parser;
pub mod provenance;
pub mod screen;
pub mod stored;
pub mod types;

// Re-exports for convenience
pub use assemble::{Assembled, FieldNameWarning, SchemaLookup, ValidationError, assemble};
pub use config::{Config, RenderConfig};
pub use error::{ErrorReport, Fallible, fail};
pub use markdown::render;
pub use parser::{ParsedFile, ParserError, parse_file, parse_notes};
pub use provenance::{Fragment, ProvenanceError, extract_markdown, is_generated};
pub use screen::html_to_screen;
pub use stored::{FieldRef, StoredField, StoredNote};
pub use types::note::ParsedNote;
