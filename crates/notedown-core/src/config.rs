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
use std::fs::read_to_string;
use std::path::Path;

use regex::Captures;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

use crate::assemble::SchemaLookup;
use crate::error::Fallible;

pub const DEFAULT_HIGHLIGHT_THEME: &str = "InspiredGitHub";

/// Replacement for a custom inline tag: `<name>text</name>` becomes
/// `begin + text + end`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Substitution {
    pub begin: String,
    pub end: String,
}

/// User configuration, read from a TOML file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Custom inline tags, keyed by tag name.
    pub subfields: BTreeMap<String, Substitution>,
    /// Field names of each model, in order.
    pub models: BTreeMap<String, Vec<String>>,
    /// Name of the syntect theme used for code blocks.
    pub highlight_theme: String,
}

impl Default for Config {
    fn default() -> Self {
        let front_back = vec!["Front".to_string(), "Back".to_string()];
        let mut models = BTreeMap::new();
        models.insert("Basic".to_string(), front_back.clone());
        models.insert("Basic (and reversed card)".to_string(), front_back);
        Config {
            subfields: BTreeMap::new(),
            models,
            highlight_theme: DEFAULT_HIGHLIGHT_THEME.to_string(),
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Fallible<Self> {
        let config: Config = toml::from_str(text)?;
        Ok(config)
    }

    /// Load the configuration file. A missing file means the defaults.
    pub fn load(path: &Path) -> Fallible<Self> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        let text = read_to_string(path)?;
        Config::from_toml(&text)
    }

    pub fn render_config(&self) -> Fallible<RenderConfig> {
        RenderConfig::new(&self.subfields, &self.highlight_theme)
    }
}

impl SchemaLookup for Config {
    fn field_names(&self, model: &str) -> Option<&[String]> {
        self.models.field_names(model)
    }
}

struct CompiledSubstitution {
    pattern: Regex,
    substitution: Substitution,
}

/// Everything the renderer reads. Built once, then shared read-only.
pub struct RenderConfig {
    substitutions: Vec<CompiledSubstitution>,
    highlight_theme: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            substitutions: Vec::new(),
            highlight_theme: DEFAULT_HIGHLIGHT_THEME.to_string(),
        }
    }
}

impl RenderConfig {
    pub fn new(
        subfields: &BTreeMap<String, Substitution>,
        highlight_theme: &str,
    ) -> Fallible<Self> {
        let substitutions = subfields
            .iter()
            .map(|(name, substitution)| {
                let name = regex::escape(name);
                let pattern = Regex::new(&format!(r"<{name}>([\w\s.,&]*?)</{name}>"))?;
                Ok(CompiledSubstitution {
                    pattern,
                    substitution: substitution.clone(),
                })
            })
            .collect::<Fallible<Vec<_>>>()?;
        Ok(RenderConfig {
            substitutions,
            highlight_theme: highlight_theme.to_string(),
        })
    }

    pub fn highlight_theme(&self) -> &str {
        &self.highlight_theme
    }

    /// Rewrite every custom inline tag in `text`.
    pub fn apply_substitutions(&self, text: &str) -> String {
        let mut text = text.to_string();
        for compiled in &self.substitutions {
            let Substitution { begin, end } = &compiled.substitution;
            text = compiled
                .pattern
                .replace_all(&text, |caps: &Captures| format!("{begin}{}{end}", &caps[1]))
                .into_owned();
        }
        text
    }
}
