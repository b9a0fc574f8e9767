//! Logic-less Mustache renderer.
//!
//! Supports variables, unescaped variables, sections (lists iterate,
//! truthy values push a context), inverted sections, comments, partials,
//! set-delimiter tags, dotted names and the implicit iterator `{{.}}`.
//! Lambdas are not supported.

use std::collections::HashMap;

use serde_json::Value;

use super::lexer::tokenize;
use super::{TemplateError, TemplateRenderer, TemplateToken, TokenKind};
use crate::spec::postprocess::is_truthy;

const MAX_PARTIAL_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Var {
        name: String,
        escape: bool,
    },
    Section {
        name: String,
        inverted: bool,
        children: Vec<Node>,
    },
    Partial(String),
}

/// The default [`TemplateRenderer`].
///
/// Output is not HTML-escaped unless `escape_html` is set; templates
/// typically produce markup from trusted data.
#[derive(Debug, Clone, Default)]
pub struct Mustache {
    escape_html: bool,
    partials: HashMap<String, String>,
}

impl Mustache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_escape_html(mut self, escape: bool) -> Self {
        self.escape_html = escape;
        self
    }

    pub fn with_partial(mut self, name: &str, template: &str) -> Self {
        self.partials.insert(name.to_string(), template.to_string());
        self
    }

    fn render_nodes<'a>(
        &self,
        nodes: &[Node],
        stack: &mut Vec<&'a Value>,
        out: &mut String,
        depth: usize,
    ) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Var { name, escape } => {
                    if let Some(value) = lookup(stack, name) {
                        let text = display(value);
                        if *escape && self.escape_html {
                            out.push_str(&escape_html(&text));
                        } else {
                            out.push_str(&text);
                        }
                    }
                }
                Node::Section {
                    name,
                    inverted,
                    children,
                } => {
                    let value = lookup(stack, name);
                    if *inverted {
                        if !value.is_some_and(is_truthy) {
                            self.render_nodes(children, stack, out, depth)?;
                        }
                        continue;
                    }
                    match value {
                        Some(Value::Array(items)) => {
                            for item in items {
                                stack.push(item);
                                let result = self.render_nodes(children, stack, out, depth);
                                stack.pop();
                                result?;
                            }
                        }
                        Some(v) if is_truthy(v) => {
                            stack.push(v);
                            let result = self.render_nodes(children, stack, out, depth);
                            stack.pop();
                            result?;
                        }
                        _ => {}
                    }
                }
                Node::Partial(name) => {
                    let Some(template) = self.partials.get(name) else {
                        continue;
                    };
                    if depth >= MAX_PARTIAL_DEPTH {
                        return Err(TemplateError::RecursionLimit(MAX_PARTIAL_DEPTH));
                    }
                    let nodes = parse(tokenize(template)?)?;
                    self.render_nodes(&nodes, stack, out, depth + 1)?;
                }
            }
        }
        Ok(())
    }
}

impl TemplateRenderer for Mustache {
    fn render(&self, template: &str, data: &Value) -> Result<String, TemplateError> {
        let nodes = parse(tokenize(template)?)?;
        let mut out = String::with_capacity(template.len());
        let mut stack = vec![data];
        self.render_nodes(&nodes, &mut stack, &mut out, 0)?;
        Ok(out)
    }

    fn tokenize(&self, template: &str) -> Result<Vec<TemplateToken>, TemplateError> {
        tokenize(template)
    }
}

fn parse(tokens: Vec<TemplateToken>) -> Result<Vec<Node>, TemplateError> {
    // (section name, inverted, children collected so far)
    let mut open: Vec<(String, bool, Vec<Node>)> = Vec::new();
    let mut root: Vec<Node> = Vec::new();

    for token in tokens {
        let node = match token.kind {
            TokenKind::Text => Node::Text(token.name),
            TokenKind::Variable => Node::Var {
                name: token.name,
                escape: true,
            },
            TokenKind::Unescaped => Node::Var {
                name: token.name,
                escape: false,
            },
            TokenKind::Partial => Node::Partial(token.name),
            TokenKind::Comment | TokenKind::Delimiter => continue,
            TokenKind::Section | TokenKind::Inverted => {
                open.push((token.name, token.kind == TokenKind::Inverted, Vec::new()));
                continue;
            }
            TokenKind::Close => {
                let Some((name, inverted, children)) = open.pop() else {
                    return Err(TemplateError::UnexpectedClose {
                        name: token.name,
                        offset: token.offset,
                    });
                };
                if name != token.name {
                    return Err(TemplateError::MismatchedClose {
                        expected: name,
                        found: token.name,
                        offset: token.offset,
                    });
                }
                Node::Section {
                    name,
                    inverted,
                    children,
                }
            }
        };
        match open.last_mut() {
            Some((_, _, children)) => children.push(node),
            None => root.push(node),
        }
    }

    if let Some((name, _, _)) = open.pop() {
        return Err(TemplateError::UnclosedSection { name });
    }
    Ok(root)
}

/// Resolve `name` against the context stack. The first segment of a dotted
/// name is searched from the innermost context outwards; the remaining
/// segments must resolve inside that value.
fn lookup<'a>(stack: &[&'a Value], name: &str) -> Option<&'a Value> {
    if name == "." {
        return stack.last().copied();
    }
    let mut segments = name.split('.');
    let first = segments.next()?;
    let mut value = stack
        .iter()
        .rev()
        .find_map(|ctx| ctx.as_object().and_then(|m| m.get(first)))?;
    for segment in segments {
        value = match value {
            Value::Object(m) => m.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(value)
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => String::new(),
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
