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

use std::sync::LazyLock;

use pulldown_cmark::CodeBlockKind;
use pulldown_cmark::CowStr;
use pulldown_cmark::Event;
use pulldown_cmark::Options;
use pulldown_cmark::Parser;
use pulldown_cmark::Tag;
use pulldown_cmark::TagEnd;
use pulldown_cmark::html::push_html;
use regex::Regex;
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxReference;
use syntect::parsing::SyntaxSet;

use crate::config::RenderConfig;
use crate::html::first_element;
use crate::provenance::Fragment;

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

static THEMES: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

/// A line like `*[HTML]: Hyper Text Markup Language`.
static ABBREVIATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*\[([^\]]+)\]:\s*(.*)$").expect("Static regex ill-formed.")
});

/// Characters of text that is rendered as-is.
const PLAIN_PUNCTUATION: &str = "æøåÆØÅ ,.?+-";

/// Placeholder for an empty rendering, so fields never collapse in editors.
const EMPTY_PLACEHOLDER: &str = "&nbsp;";

/// A Markdown to HTML converter.
pub trait MarkdownEngine {
    fn to_html(&self, markdown: &str) -> String;
}

/// The default engine: pulldown-cmark with tables, footnotes, definition
/// lists, abbreviations, and syntect-highlighted code blocks.
pub struct PulldownEngine<'a> {
    highlight_theme: &'a str,
}

impl<'a> PulldownEngine<'a> {
    pub fn new(highlight_theme: &'a str) -> Self {
        PulldownEngine { highlight_theme }
    }
}

impl MarkdownEngine for PulldownEngine<'_> {
    fn to_html(&self, markdown: &str) -> String {
        markdown_to_html(markdown, self.highlight_theme)
    }
}

/// Render a field.
///
/// Text is left alone when `markdown` is false or when it has nothing
/// Markdown could change. Otherwise the result carries its source.
pub fn render(text: &str, markdown: bool, config: &RenderConfig) -> Fragment {
    let engine = PulldownEngine::new(config.highlight_theme());
    render_with(&engine, text, markdown, config)
}

pub fn render_with(
    engine: &impl MarkdownEngine,
    text: &str,
    markdown: bool,
    config: &RenderConfig,
) -> Fragment {
    if !markdown {
        return Fragment::Plain(text.to_string());
    }
    if is_plain(text) {
        log::debug!("Skipping rendering of plain text");
        return Fragment::Plain(text.to_string());
    }
    let prepared = config.apply_substitutions(&escape_markup(text));
    let html = engine.to_html(&prepared);
    Fragment::Generated {
        body: ensure_root(html),
        source: text.to_string(),
    }
}

/// Whether the text has nothing Markdown could change.
pub fn is_plain(text: &str) -> bool {
    text.chars()
        .all(|c| c.is_ascii_alphanumeric() || PLAIN_PUNCTUATION.contains(c))
}

/// Protect constructs meant for a math typesetter from the Markdown pass,
/// and turn non-breaking spaces into spaces.
fn escape_markup(text: &str) -> String {
    text.replace(r"\\", r"\\\\")
        .replace(r"\{", r"\\{")
        .replace(r"\}", r"\\}")
        .replace("*}", r"\*}")
        .replace("\u{c2}\u{a0}", " ")
        .replace(['\u{a0}', '\u{202f}'], " ")
        .replace(r"\[", r"\\[")
        .replace(r"\]", r"\\]")
        .replace(r"\(", r"\\(")
        .replace(r"\)", r"\\)")
}

/// Make sure the fragment starts with an element the marker can go on.
fn ensure_root(html: String) -> String {
    if first_element(&html).is_some() {
        return html;
    }
    if html.trim().is_empty() {
        format!("<div>{EMPTY_PLACEHOLDER}</div>")
    } else {
        format!("<div>{html}</div>")
    }
}

/// Convert Markdown to HTML.
pub fn markdown_to_html(markdown: &str, highlight_theme: &str) -> String {
    let (markdown, abbreviations) = extract_abbreviations(markdown);
    let abbreviation_pattern = abbreviation_pattern(&abbreviations);
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_DEFINITION_LIST);
    let parser = Parser::new_ext(&markdown, options);

    let mut events: Vec<Event<'_>> = Vec::new();
    // A fenced block being collected for highlighting.
    let mut highlighted: Option<(&SyntaxReference, String)> = None;
    let mut in_code_block = false;
    let mut image_depth = 0usize;
    for event in parser {
        match event {
            Event::Text(text) if highlighted.is_some() => {
                if let Some((_, code)) = highlighted.as_mut() {
                    code.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) if highlighted.is_some() => {
                if let Some((syntax, code)) = highlighted.take() {
                    let html = highlight_code(&code, syntax, highlight_theme);
                    events.push(Event::Html(CowStr::Boxed(html.into_boxed_str())));
                }
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let syntax = match &kind {
                    CodeBlockKind::Fenced(info) => find_syntax(info),
                    CodeBlockKind::Indented => None,
                };
                match syntax {
                    Some(syntax) => highlighted = Some((syntax, String::new())),
                    None => {
                        in_code_block = true;
                        events.push(Event::Start(Tag::CodeBlock(kind)));
                    }
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                events.push(event);
            }
            Event::Start(Tag::Image { .. }) => {
                image_depth += 1;
                events.push(event);
            }
            Event::End(TagEnd::Image) => {
                image_depth = image_depth.saturating_sub(1);
                events.push(event);
            }
            Event::Text(text) if !in_code_block && image_depth == 0 => {
                match &abbreviation_pattern {
                    Some(pattern) => push_abbreviated(&mut events, &text, pattern, &abbreviations),
                    None => events.push(Event::Text(text)),
                }
            }
            _ => events.push(event),
        }
    }
    let mut html_output: String = String::new();
    push_html(&mut html_output, events.into_iter());
    html_output
}

/// The syntax named by the first word of a fence's info string.
fn find_syntax(info: &str) -> Option<&'static SyntaxReference> {
    let lang = info.split_whitespace().next()?;
    SYNTAXES.find_syntax_by_token(lang)
}

/// Highlight with inline styles, so the HTML needs no stylesheet.
fn highlight_code(code: &str, syntax: &SyntaxReference, theme: &str) -> String {
    match THEMES.themes.get(theme) {
        Some(theme) => match highlighted_html_for_string(code, &SYNTAXES, syntax, theme) {
            Ok(html) => return html,
            Err(e) => log::warn!("Failed to highlight code block: {e}"),
        },
        None => log::warn!("Unknown highlight theme '{theme}'"),
    }
    format!("<pre><code>{}</code></pre>\n", escape_html(code))
}

/// Remove abbreviation definitions from the text, outside code fences.
fn extract_abbreviations(markdown: &str) -> (String, Vec<(String, String)>) {
    let mut abbreviations = Vec::new();
    let mut kept = Vec::new();
    let mut in_fence = false;
    for line in markdown.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
        }
        if !in_fence {
            if let Some(caps) = ABBREVIATION.captures(line) {
                abbreviations.push((caps[1].to_string(), caps[2].trim().to_string()));
                continue;
            }
        }
        kept.push(line);
    }
    if abbreviations.is_empty() {
        (markdown.to_string(), abbreviations)
    } else {
        (kept.join("\n"), abbreviations)
    }
}

fn abbreviation_pattern(abbreviations: &[(String, String)]) -> Option<Regex> {
    if abbreviations.is_empty() {
        return None;
    }
    let mut names: Vec<&str> = abbreviations.iter().map(|(name, _)| name.as_str()).collect();
    // Longest first, so that `HTML5` wins over `HTML`.
    names.sort_by_key(|name| std::cmp::Reverse(name.len()));
    let alternatives: Vec<String> = names.into_iter().map(regex::escape).collect();
    match Regex::new(&alternatives.join("|")) {
        Ok(pattern) => Some(pattern),
        Err(e) => {
            log::warn!("Ignoring abbreviations: {e}");
            None
        }
    }
}

fn push_abbreviated(
    events: &mut Vec<Event<'_>>,
    text: &str,
    pattern: &Regex,
    abbreviations: &[(String, String)],
) {
    let mut last = 0;
    let mut at = 0;
    while let Some(m) = pattern.find_at(text, at) {
        if !is_whole_word(text, m.start(), m.end()) {
            at = m.start() + text[m.start()..].chars().next().map_or(1, char::len_utf8);
            continue;
        }
        if m.start() > last {
            events.push(Event::Text(CowStr::Boxed(text[last..m.start()].into())));
        }
        let title = abbreviations
            .iter()
            .find(|(name, _)| name == m.as_str())
            .map(|(_, title)| title.as_str())
            .unwrap_or_default();
        events.push(Event::InlineHtml(CowStr::Boxed(
            format!("<abbr title=\"{}\">", escape_html(title)).into_boxed_str(),
        )));
        events.push(Event::Text(CowStr::Boxed(m.as_str().into())));
        events.push(Event::InlineHtml(CowStr::Borrowed("</abbr>")));
        last = m.end();
        at = m.end();
    }
    if last < text.len() {
        events.push(Event::Text(CowStr::Boxed(text[last..].into())));
    }
}

/// Whether `text[start..end]` is not glued to a neighbouring word. Ends of
/// the match that are punctuation, as in `C++`, need no boundary.
fn is_whole_word(text: &str, start: usize, end: usize) -> bool {
    let matched = &text[start..end];
    let glued_before = matched.chars().next().is_some_and(is_word_char)
        && text[..start].chars().next_back().is_some_and(is_word_char);
    let glued_after = matched.chars().next_back().is_some_and(is_word_char)
        && text[end..].chars().next().is_some_and(is_word_char);
    !glued_before && !glued_after
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
