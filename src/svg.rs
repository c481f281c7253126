//! Structure-preserving SVG minification.
//!
//! The input is split into markup tokens and re-emitted without content that
//! never affects rendering: the XML declaration, comments, external-only
//! doctypes, `<metadata>` and editor-only (`sodipodi`/`inkscape`) elements
//! and attributes. Whitespace-only text between tags is dropped except inside
//! text-content elements and `xml:space="preserve"` scopes. Attribute values
//! such as `viewBox`, `width` and `height` are copied verbatim.

use once_cell::sync::Lazy;
use regex::Regex;

static ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([^\s=/>]+)\s*=\s*("[^"]*"|'[^']*')"#).unwrap());

const EDITOR_PREFIXES: [&str; 2] = ["sodipodi", "inkscape"];

/// Elements whose whitespace-only children are rendered as text.
const TEXT_CONTENT: [&str; 3] = ["text", "tspan", "textPath"];

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Declaration,
    Instruction(&'a str),
    Comment,
    Doctype { raw: &'a str, internal_subset: bool },
    CData(&'a str),
    /// Everything between `<` and `>` of a start or empty-element tag.
    Start { inner: &'a str },
    End(&'a str),
    Text(&'a str),
}

struct Tokens<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Consume `len` bytes and return them.
    fn take(&mut self, len: usize) -> &'a str {
        let raw = &self.input[self.pos..self.pos + len];
        self.pos += len;
        raw
    }

    /// Take everything up to and including `terminator`, or the remaining
    /// input as text when the construct is never closed.
    fn take_until(&mut self, from: usize, terminator: &str) -> Option<&'a str> {
        let rest = &self.input[self.pos..];
        let end = rest[from..].find(terminator)? + from + terminator.len();
        Some(self.take(end))
    }

    fn rest_as_text(&mut self) -> Token<'a> {
        let len = self.input.len() - self.pos;
        Token::Text(self.take(len))
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let rest = &self.input[self.pos..];
        if rest.is_empty() {
            return None;
        }

        if !rest.starts_with('<') {
            let len = rest.find('<').unwrap_or(rest.len());
            return Some(Token::Text(self.take(len)));
        }

        let token = if rest.starts_with("<!--") {
            self.take_until(4, "-->").map(|_| Token::Comment)
        } else if rest.starts_with("<![CDATA[") {
            self.take_until(9, "]]>").map(Token::CData)
        } else if rest.starts_with("<!DOCTYPE") {
            doctype_end(rest).map(|(len, internal_subset)| Token::Doctype {
                raw: self.take(len),
                internal_subset,
            })
        } else if rest.starts_with("<?") {
            self.take_until(2, "?>").map(|raw| {
                let is_declaration = raw
                    .strip_prefix("<?xml")
                    .and_then(|after| after.chars().next())
                    .is_some_and(|c| c.is_whitespace() || c == '?');
                if is_declaration {
                    Token::Declaration
                } else {
                    Token::Instruction(raw)
                }
            })
        } else if rest.starts_with("</") {
            self.take_until(2, ">")
                .map(|raw| Token::End(raw[2..raw.len() - 1].trim()))
        } else {
            tag_end(rest).map(|len| {
                let raw = self.take(len);
                Token::Start {
                    inner: &raw[1..raw.len() - 1],
                }
            })
        };

        Some(token.unwrap_or_else(|| self.rest_as_text()))
    }
}

/// Length of a start tag including its closing `>`, skipping quoted values.
fn tag_end(rest: &str) -> Option<usize> {
    let mut quote = None;
    for (i, b) in rest.bytes().enumerate().skip(1) {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return Some(i + 1),
            (None, b'<') => return None,
            _ => {}
        }
    }
    None
}

/// Length of a doctype declaration and whether it carries an internal subset.
fn doctype_end(rest: &str) -> Option<(usize, bool)> {
    let mut quote = None;
    let mut in_subset = false;
    let mut internal_subset = false;
    for (i, b) in rest.bytes().enumerate().skip(2) {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'[') if !in_subset => {
                in_subset = true;
                internal_subset = true;
            }
            (None, b']') if in_subset => in_subset = false,
            (None, b'>') if !in_subset => return Some((i + 1, internal_subset)),
            _ => {}
        }
    }
    None
}

struct Attribute<'a> {
    name: &'a str,
    quoted: &'a str,
}

/// Split a tag body into its attributes. `None` when the body holds
/// anything besides well-formed `name="value"` pairs.
fn parse_attributes(body: &str) -> Option<Vec<Attribute<'_>>> {
    let mut attributes = Vec::new();
    let mut last = 0;
    for caps in ATTRIBUTE.captures_iter(body) {
        let (whole, name, quoted) = (caps.get(0)?, caps.get(1)?, caps.get(2)?);
        if !body[last..whole.start()].trim().is_empty() {
            return None;
        }
        attributes.push(Attribute {
            name: name.as_str(),
            quoted: quoted.as_str(),
        });
        last = whole.end();
    }
    body[last..].trim().is_empty().then_some(attributes)
}

fn prefix(name: &str) -> Option<&str> {
    name.split_once(':').map(|(prefix, _)| prefix)
}

fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn is_editor_element(name: &str) -> bool {
    name == "metadata" || prefix(name).is_some_and(|p| EDITOR_PREFIXES.contains(&p))
}

/// Editor attributes and the namespace declarations that bind their
/// prefixes. Every element and attribute using those prefixes is dropped
/// along with the declaration, so no prefix is left unbound.
fn is_editor_attribute(name: &str) -> bool {
    match prefix(name) {
        Some("xmlns") => EDITOR_PREFIXES.contains(&local_name(name)),
        Some(p) => EDITOR_PREFIXES.contains(&p),
        None => false,
    }
}

fn unquote(quoted: &str) -> &str {
    &quoted[1..quoted.len() - 1]
}

/// Run a single minification pass.
pub fn minify_pass(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    // One entry per open element: whether whitespace inside it is kept.
    let mut preserve: Vec<bool> = Vec::new();
    let mut skipped_depth = 0usize;

    for token in Tokens::new(input) {
        if skipped_depth > 0 {
            match token {
                Token::Start { inner } if !inner.trim_end().ends_with('/') => skipped_depth += 1,
                Token::End(_) => skipped_depth -= 1,
                _ => {}
            }
            continue;
        }

        match token {
            Token::Declaration | Token::Comment => {}
            Token::Doctype {
                raw,
                internal_subset,
            } => {
                // Entities declared in the subset may be referenced below.
                if internal_subset {
                    out.push_str(raw);
                }
            }
            Token::Instruction(raw) | Token::CData(raw) => out.push_str(raw),
            Token::Text(text) => {
                let keep = preserve.last().copied().unwrap_or(false);
                if keep || !text.trim().is_empty() {
                    out.push_str(text);
                }
            }
            Token::End(name) => {
                preserve.pop();
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            Token::Start { inner } => {
                let trimmed = inner.trim_end();
                let self_closing = trimmed.ends_with('/');
                let body = trimmed.trim_end_matches('/');
                let name_len = body
                    .find(|c: char| c.is_whitespace())
                    .unwrap_or(body.len());
                let (name, attribute_text) = body.split_at(name_len);

                if is_editor_element(name) {
                    if !self_closing {
                        skipped_depth = 1;
                    }
                    continue;
                }

                let Some(attributes) = parse_attributes(attribute_text) else {
                    out.push('<');
                    out.push_str(inner);
                    out.push('>');
                    if !self_closing {
                        preserve.push(true);
                    }
                    continue;
                };

                out.push('<');
                out.push_str(name);
                let mut space = None;
                for attribute in &attributes {
                    if attribute.name == "xml:space" {
                        space = Some(unquote(attribute.quoted) == "preserve");
                    }
                    if is_editor_attribute(attribute.name) {
                        continue;
                    }
                    out.push(' ');
                    out.push_str(attribute.name);
                    out.push('=');
                    out.push_str(attribute.quoted);
                }
                out.push_str(if self_closing { "/>" } else { ">" });

                if !self_closing {
                    let inherited = preserve.last().copied().unwrap_or(false);
                    let keep = space.unwrap_or(
                        inherited || TEXT_CONTENT.contains(&local_name(name)),
                    );
                    preserve.push(keep);
                }
            }
        }
    }
    out.trim().to_string()
}

/// Repeat [`minify_pass`] until the output stops changing or `max_passes`
/// is reached.
pub fn minify(input: &str, max_passes: usize) -> String {
    let mut current = input.to_string();
    for _ in 0..max_passes.max(1) {
        let next = minify_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}
