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

//! Just enough HTML scanning to find the first element of a fragment and
//! read its attributes.
//!
//! Nothing before the first start tag can be an open element, so the first
//! start tag is always a top-level element. Text, comments, doctypes and
//! stray end tags before it are skipped.

/// The start tag of the first element in a fragment.
#[derive(Debug, PartialEq)]
pub struct StartTag<'a> {
    pub name: &'a str,
    /// Byte offset just past the tag name. New attributes are inserted here.
    pub name_end: usize,
    attributes: Vec<(&'a str, &'a str)>,
}

impl<'a> StartTag<'a> {
    /// The value of an attribute, matched case-insensitively. Attributes
    /// without a value read as the empty string.
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.attributes
            .iter()
            .find(|(attr, _)| attr.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }
}

/// Find the first element of an HTML fragment.
pub fn first_element(html: &str) -> Option<StartTag<'_>> {
    let bytes = html.as_bytes();
    let mut pos = 0;
    while let Some(offset) = html[pos..].find('<') {
        let start = pos + offset;
        let rest = &html[start..];
        if rest.starts_with("<!--") {
            let end = rest.find("-->")?;
            pos = start + end + 3;
        } else if rest.starts_with("<!") || rest.starts_with("<?") || rest.starts_with("</") {
            let end = rest.find('>')?;
            pos = start + end + 1;
        } else if bytes.get(start + 1).is_some_and(u8::is_ascii_alphabetic) {
            return read_start_tag(html, start);
        } else {
            // A literal `<` in text.
            pos = start + 1;
        }
    }
    None
}

fn read_start_tag(html: &str, start: usize) -> Option<StartTag<'_>> {
    let bytes = html.as_bytes();
    let mut pos = start + 1;
    while pos < bytes.len() && is_name_byte(bytes[pos]) {
        pos += 1;
    }
    let name = &html[start + 1..pos];
    let name_end = pos;
    let mut attributes = Vec::new();
    loop {
        while pos < bytes.len() && (bytes[pos].is_ascii_whitespace() || bytes[pos] == b'/') {
            pos += 1;
        }
        match bytes.get(pos) {
            None => return None,
            Some(b'>') => break,
            Some(_) => {}
        }
        let attr_start = pos;
        while pos < bytes.len() && !is_attribute_delimiter(bytes[pos]) {
            pos += 1;
        }
        let attr_name = &html[attr_start..pos];
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if bytes.get(pos) != Some(&b'=') {
            attributes.push((attr_name, ""));
            continue;
        }
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let value = match bytes.get(pos) {
            Some(quote @ (b'"' | b'\'')) => {
                let value_start = pos + 1;
                let len = html[value_start..].find(*quote as char)?;
                pos = value_start + len + 1;
                &html[value_start..value_start + len]
            }
            Some(_) => {
                let value_start = pos;
                while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() && bytes[pos] != b'>'
                {
                    pos += 1;
                }
                &html[value_start..pos]
            }
            None => return None,
        };
        attributes.push((attr_name, value));
    }
    Some(StartTag {
        name,
        name_end,
        attributes,
    })
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b':'
}

fn is_attribute_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'=' || b == b'>' || b == b'/'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_element() {
        assert_eq!(first_element(""), None);
        assert_eq!(first_element("just text"), None);
        assert_eq!(first_element("1 < 2"), None);
        assert_eq!(first_element("<!-- <p> -->"), None);
    }

    #[test]
    fn test_first_element() {
        let tag = first_element("<p>Hello</p><div>x</div>").unwrap();
        assert_eq!(tag.name, "p");
        assert_eq!(tag.name_end, 2);
    }

    #[test]
    fn test_skips_text_and_comments() {
        let html = "text <!-- <b> --> </i> <em class=\"x\">y</em>";
        let tag = first_element(html).unwrap();
        assert_eq!(tag.name, "em");
        assert_eq!(tag.attribute("class"), Some("x"));
    }

    #[test]
    fn test_attributes() {
        let html = "<div id=one data-X='two' hidden title = \"a > b\"/>";
        let tag = first_element(html).unwrap();
        assert_eq!(tag.attribute("id"), Some("one"));
        assert_eq!(tag.attribute("data-x"), Some("two"));
        assert_eq!(tag.attribute("hidden"), Some(""));
        assert_eq!(tag.attribute("title"), Some("a > b"));
        assert!(!tag.has_attribute("class"));
    }

    #[test]
    fn test_unterminated_tag() {
        assert_eq!(first_element("<p class=\"x"), None);
        assert_eq!(first_element("<p"), None);
    }
}
