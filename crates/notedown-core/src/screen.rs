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

use crossterm::style::Stylize;
use regex::Captures;
use regex::Regex;

use crate::provenance::extract_markdown;
use crate::provenance::is_generated;

static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<style>.*?</style>").expect("Static regex ill-formed."));

static EMPTY_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<b>\s*</b>|<i>\s*</i>|<div>\s*</div>").expect("Static regex ill-formed.")
});

static BOLD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*(.*?)\*\*|<b>(.*?)</b>").expect("Static regex ill-formed.")
});

static UNDERLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(.*?)_|<i>(.*?)</i>").expect("Static regex ill-formed."));

/// Convert a stored field to text for the terminal.
///
/// Generated HTML is shown as the Markdown it came from. Any other HTML goes
/// through a rough conversion to text. With `parseable` set the result can be
/// fed back to the note parser; otherwise bold and italic spans are styled
/// with terminal escape codes.
pub fn html_to_screen(html: &str, parseable: bool) -> String {
    let html = STYLE_BLOCK.replace_all(html, "");
    let plain = match generated_source(&html) {
        Some(markdown) => markdown,
        None => foreign_to_text(&html),
    };
    let plain = if parseable { plain } else { stylize(&plain) };
    plain.trim().to_string()
}

fn generated_source(html: &str) -> Option<String> {
    if !is_generated(html) {
        return None;
    }
    match extract_markdown(html) {
        Ok(markdown) => Some(markdown),
        Err(e) => {
            log::warn!("Showing field as plain HTML: {e}");
            None
        }
    }
}

fn foreign_to_text(html: &str) -> String {
    let text = html
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .replace("&nbsp;", " ")
        .replace("<br>", "\n")
        .replace("<br/>", "\n")
        .replace("<br />", "\n");
    EMPTY_TAG
        .replace_all(&text, "")
        .replace("<div>", "\n")
        .replace("</div>", "")
}

fn stylize(text: &str) -> String {
    let text = BOLD.replace_all(text, |caps: &Captures| styled_span(caps, |s| s.bold().to_string()));
    let text = UNDERLINE.replace_all(&text, |caps: &Captures| {
        styled_span(caps, |s| s.underlined().to_string())
    });
    text.into_owned()
}

/// Apply `style` to whichever alternative of the pattern matched.
fn styled_span(caps: &Captures, style: impl Fn(&str) -> String) -> String {
    let inner = caps
        .get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str())
        .unwrap_or_default();
    style(inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::markdown::render;

    #[test]
    fn test_generated_shows_source() {
        let source = "**Bold** and \\(x\\) &amp;\n\n- item";
        let html = render(source, true, &RenderConfig::default()).to_html();
        assert_eq!(html_to_screen(&html, true), source);
    }

    #[test]
    fn test_generated_source_is_trimmed() {
        let html = render("\n  *x*  \n", true, &RenderConfig::default()).to_html();
        assert_eq!(html_to_screen(&html, true), "*x*");
    }

    #[test]
    fn test_foreign_html() {
        let html = "<div>Line one</div><div>Line two<br>three<br />four</div>";
        assert_eq!(html_to_screen(html, true), "Line one\nLine two\nthree\nfour");
    }

    #[test]
    fn test_foreign_entities() {
        assert_eq!(html_to_screen("a &lt; b &amp;&amp; c&nbsp;d", true), "a < b && c d");
    }

    #[test]
    fn test_foreign_math_is_untouched() {
        assert_eq!(html_to_screen(r"\(x\) and \[y\]", true), r"\(x\) and \[y\]");
    }

    #[test]
    fn test_empty_tags_are_dropped() {
        assert_eq!(html_to_screen("<b> </b>x<i></i><div>\n</div>", true), "x");
    }

    #[test]
    fn test_tags_holding_only_entities_are_dropped() {
        assert_eq!(html_to_screen("<b>&nbsp;</b>x<i>&nbsp;</i>", true), "x");
        assert_eq!(html_to_screen("a<div><br></div>b", true), "ab");
    }

    #[test]
    fn test_style_block_is_dropped() {
        let html = "<style>\n.card { color: red; }\n</style>Front side";
        assert_eq!(html_to_screen(html, true), "Front side");
    }

    #[test]
    fn test_corrupt_marker_falls_back() {
        let html = "<p data-original-markdown=\"!!!\">Shown&nbsp;anyway</p>";
        assert_eq!(
            html_to_screen(html, true),
            "<p data-original-markdown=\"!!!\">Shown anyway</p>"
        );
    }

    #[test]
    fn test_parseable_keeps_markup() {
        assert_eq!(
            html_to_screen("**bold** <b>b</b> _u_ <i>i</i>", true),
            "**bold** <b>b</b> _u_ <i>i</i>"
        );
    }

    #[test]
    fn test_colourised_styles_markup() {
        let text = html_to_screen("**bold** <b>b</b> _under_ <i>it</i>", false);
        assert!(!text.contains("**"));
        assert!(!text.contains("<b>"));
        assert!(!text.contains('_'));
        assert!(!text.contains("<i>"));
        assert!(text.contains("bold"));
        assert!(text.contains("under"));
        assert!(text.contains("it"));
    }
}
