//! Mustache tag scanner.
//!
//! Produces a flat token list: literal text plus one token per tag. Set
//! delimiter tags (`{{=<% %>=}}`) are honored while scanning. Standalone
//! block tags (sections, closes, comments, partials, delimiter changes on a
//! line of their own) swallow that line.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{TemplateError, TemplateToken, TokenKind};

static DELIMITER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^=\s*(\S+)\s+(\S+)\s*=$").unwrap());

const DEFAULT_OPEN: &str = "{{";
const DEFAULT_CLOSE: &str = "}}";

/// Scan `template` into tokens.
pub fn tokenize(template: &str) -> Result<Vec<TemplateToken>, TemplateError> {
    let mut tokens = Vec::new();
    let mut open = DEFAULT_OPEN.to_string();
    let mut close = DEFAULT_CLOSE.to_string();
    let mut pos = 0;

    while pos < template.len() {
        let Some(rel) = template[pos..].find(open.as_str()) else {
            push_text(&mut tokens, &template[pos..], pos);
            break;
        };
        let start = pos + rel;
        push_text(&mut tokens, &template[pos..start], pos);
        let inner = start + open.len();

        // {{{name}}} only exists with the default delimiters
        if open == DEFAULT_OPEN && template[inner..].starts_with('{') {
            let end = template[inner..]
                .find("}}}")
                .ok_or(TemplateError::UnclosedTag { offset: start })?;
            let name = template[inner + 1..inner + end].trim();
            tokens.push(tag(TokenKind::Unescaped, name, start)?);
            pos = inner + end + 3;
            continue;
        }

        let end = template[inner..]
            .find(close.as_str())
            .ok_or(TemplateError::UnclosedTag { offset: start })?;
        let content = template[inner..inner + end].trim();
        pos = inner + end + close.len();

        let mut chars = content.chars();
        let sigil = chars.next().ok_or(TemplateError::EmptyTag { offset: start })?;
        let rest = chars.as_str().trim();

        let token = match sigil {
            '#' => tag(TokenKind::Section, rest, start)?,
            '^' => tag(TokenKind::Inverted, rest, start)?,
            '/' => tag(TokenKind::Close, rest, start)?,
            '>' => tag(TokenKind::Partial, rest, start)?,
            '&' => tag(TokenKind::Unescaped, rest, start)?,
            '{' => tag(
                TokenKind::Unescaped,
                rest.strip_suffix('}').unwrap_or(rest).trim(),
                start,
            )?,
            '!' => TemplateToken {
                kind: TokenKind::Comment,
                name: rest.to_string(),
                offset: start,
            },
            '=' => {
                let caps = DELIMITER_RE.captures(content).ok_or_else(|| {
                    TemplateError::InvalidDelimiter {
                        offset: start,
                        content: content.to_string(),
                    }
                })?;
                open = caps[1].to_string();
                close = caps[2].to_string();
                TemplateToken {
                    kind: TokenKind::Delimiter,
                    name: format!("{} {}", open, close),
                    offset: start,
                }
            }
            _ => tag(TokenKind::Variable, content, start)?,
        };
        tokens.push(token);
    }

    strip_standalone(&mut tokens);
    Ok(tokens)
}

fn push_text(tokens: &mut Vec<TemplateToken>, text: &str, offset: usize) {
    if !text.is_empty() {
        tokens.push(TemplateToken {
            kind: TokenKind::Text,
            name: text.to_string(),
            offset,
        });
    }
}

fn tag(kind: TokenKind, name: &str, offset: usize) -> Result<TemplateToken, TemplateError> {
    if name.is_empty() {
        return Err(TemplateError::EmptyTag { offset });
    }
    Ok(TemplateToken {
        kind,
        name: name.to_string(),
        offset,
    })
}

fn is_block(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Section
            | TokenKind::Inverted
            | TokenKind::Close
            | TokenKind::Comment
            | TokenKind::Partial
            | TokenKind::Delimiter
    )
}

fn is_blank(s: &str) -> bool {
    s.chars().all(|c| c == ' ' || c == '\t')
}

/// Byte index where the last line of `text` starts, if that line is blank
/// and is a line start (preceded by a newline, or the template start).
fn blank_tail(text: &str, at_template_start: bool) -> Option<usize> {
    match text.rfind('\n') {
        Some(nl) if is_blank(&text[nl + 1..]) => Some(nl + 1),
        None if at_template_start && is_blank(text) => Some(0),
        _ => None,
    }
}

/// Byte index just past the first newline of `text`, if everything before
/// it is blank. At the template end a blank remainder also counts.
fn blank_head(text: &str, at_template_end: bool) -> Option<usize> {
    match text.find('\n') {
        Some(nl) => {
            let line = text[..nl].strip_suffix('\r').unwrap_or(&text[..nl]);
            is_blank(line).then_some(nl + 1)
        }
        None if at_template_end && is_blank(text) => Some(text.len()),
        None => None,
    }
}

fn strip_standalone(tokens: &mut [TemplateToken]) {
    let n = tokens.len();
    // (keep_from, keep_to) per token; only text tokens are ever cut
    let mut bounds: Vec<(usize, usize)> = tokens.iter().map(|t| (0, t.name.len())).collect();

    for i in 0..n {
        if !is_block(tokens[i].kind) {
            continue;
        }
        let before = if i == 0 {
            Some(None)
        } else if tokens[i - 1].kind == TokenKind::Text {
            blank_tail(&tokens[i - 1].name, i == 1).map(Some)
        } else {
            None
        };
        let after = if i + 1 == n {
            Some(None)
        } else if tokens[i + 1].kind == TokenKind::Text {
            blank_head(&tokens[i + 1].name, i + 2 == n).map(Some)
        } else {
            None
        };

        if let (Some(before), Some(after)) = (before, after) {
            if let Some(cut) = before {
                bounds[i - 1].1 = bounds[i - 1].1.min(cut);
            }
            if let Some(cut) = after {
                bounds[i + 1].0 = bounds[i + 1].0.max(cut);
            }
        }
    }

    for (token, (from, to)) in tokens.iter_mut().zip(bounds) {
        if token.kind == TokenKind::Text && (from, to) != (0, token.name.len()) {
            token.name = if from < to {
                token.name[from..to].to_string()
            } else {
                String::new()
            };
        }
    }
}
