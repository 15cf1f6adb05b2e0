//! Path template parsing and rendering.
//!
//! Templates reference fields as `$name` or `${name}` and call functions as `%name{arg1,arg2}`.
//! A `$` followed by one of `$ % } ,` produces that character literally.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use titlecase::titlecase;
use unicode_normalization::UnicodeNormalization;

/// Field name to value mapping used when rendering a template.
pub type Fields = HashMap<String, String>;

/// Default separator used by `%first`.
const FIRST_SEPARATOR: &str = "; ";

/// Renders a parsed template against a field mapping.
pub trait TemplateEngine {
    /// Render the template, substituting fields and evaluating function calls.
    ///
    /// # Errors
    /// Returns an error if the template references an unknown field or function,
    /// or a function receives invalid arguments.
    fn render(&self, template: &Template, fields: &Fields) -> Result<String>;
}

/// A parsed path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    Field(String),
    Call { name: String, args: Vec<Vec<Node>> },
}

/// The default function library: `lower`, `upper`, `capitalize`, `title`,
/// `left`, `right`, `if`, `ifdef`, `asciify` and `first`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardFunctions;

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl Template {
    /// Parse a template string.
    ///
    /// # Errors
    /// Returns an error for an unclosed `${` field or `%func{` call.
    pub fn parse(source: &str) -> Result<Self> {
        let mut parser = Parser::new(source);
        let nodes = parser.parse_sequence(false)?;
        Ok(Self {
            source: source.to_string(),
            nodes,
        })
    }

    /// The original template string.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names of all fields referenced anywhere in the template.
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        collect_field_names(&self.nodes, &mut names);
        names
    }
}

impl FromStr for Template {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

fn collect_field_names<'a>(nodes: &'a [Node], names: &mut Vec<&'a str>) {
    for node in nodes {
        match node {
            Node::Text(_) => {}
            Node::Field(name) => names.push(name),
            Node::Call { args, .. } => {
                for arg in args {
                    collect_field_names(arg, names);
                }
            }
        }
    }
}

const fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn read_identifier(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_identifier_char) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// Parse until end of input, or until an argument separator or closing brace when inside a call.
    fn parse_sequence(&mut self, in_args: bool) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        let mut text = String::new();

        while let Some(c) = self.peek() {
            if in_args && (c == ',' || c == '}') {
                break;
            }
            self.pos += 1;
            match c {
                '$' => match self.peek() {
                    Some(next @ ('$' | '%' | '}' | ',')) => {
                        self.pos += 1;
                        text.push(next);
                    }
                    Some('{') => {
                        self.pos += 1;
                        let name = self.read_identifier();
                        if self.peek() != Some('}') || name.is_empty() {
                            anyhow::bail!("Unclosed field reference in template: '{}'", self.source);
                        }
                        self.pos += 1;
                        flush_text(&mut text, &mut nodes);
                        nodes.push(Node::Field(name));
                    }
                    Some(next) if is_identifier_char(next) => {
                        let name = self.read_identifier();
                        flush_text(&mut text, &mut nodes);
                        nodes.push(Node::Field(name));
                    }
                    _ => text.push('$'),
                },
                '%' => {
                    let start = self.pos;
                    let name = self.read_identifier();
                    if name.is_empty() || self.peek() != Some('{') {
                        self.pos = start;
                        text.push('%');
                        continue;
                    }
                    self.pos += 1;
                    let args = self.parse_arguments()?;
                    flush_text(&mut text, &mut nodes);
                    nodes.push(Node::Call { name, args });
                }
                _ => text.push(c),
            }
        }

        flush_text(&mut text, &mut nodes);
        Ok(nodes)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Vec<Node>>> {
        let mut args = Vec::new();
        loop {
            args.push(self.parse_sequence(true)?);
            match self.peek() {
                Some(',') => self.pos += 1,
                Some('}') => {
                    self.pos += 1;
                    return Ok(args);
                }
                _ => anyhow::bail!("Unclosed function call in template: '{}'", self.source),
            }
        }
    }
}

fn flush_text(text: &mut String, nodes: &mut Vec<Node>) {
    if !text.is_empty() {
        nodes.push(Node::Text(std::mem::take(text)));
    }
}

impl TemplateEngine for StandardFunctions {
    fn render(&self, template: &Template, fields: &Fields) -> Result<String> {
        self.render_nodes(&template.nodes, fields)
            .with_context(|| format!("Failed to render template '{}'", template.source))
    }
}

impl StandardFunctions {
    fn render_nodes(self, nodes: &[Node], fields: &Fields) -> Result<String> {
        let mut output = String::new();
        for node in nodes {
            match node {
                Node::Text(text) => output.push_str(text),
                Node::Field(name) => {
                    let value = fields
                        .get(name)
                        .with_context(|| format!("Unknown field '${name}'"))?;
                    output.push_str(value);
                }
                Node::Call { name, args } => {
                    let values = args
                        .iter()
                        .map(|arg| self.render_nodes(arg, fields))
                        .collect::<Result<Vec<_>>>()?;
                    output.push_str(&Self::call(name, &values, fields)?);
                }
            }
        }
        Ok(output)
    }

    fn call(name: &str, args: &[String], fields: &Fields) -> Result<String> {
        let arg = |index: usize| {
            args.get(index)
                .map(String::as_str)
                .with_context(|| format!("Missing argument {} for function '%{name}'", index + 1))
        };
        let optional = |index: usize| args.get(index).map_or("", String::as_str);

        let value = match name {
            "lower" => arg(0)?.to_lowercase(),
            "upper" => arg(0)?.to_uppercase(),
            "capitalize" => capitalize(arg(0)?),
            "title" => titlecase(arg(0)?),
            "left" => {
                let count = parse_count(name, arg(1)?)?;
                arg(0)?.chars().take(count).collect()
            }
            "right" => {
                let text = arg(0)?;
                let count = parse_count(name, arg(1)?)?;
                let skip = text.chars().count().saturating_sub(count);
                text.chars().skip(skip).collect()
            }
            "if" => {
                if is_truthy(arg(0)?) {
                    optional(1).to_string()
                } else {
                    optional(2).to_string()
                }
            }
            "ifdef" => {
                let defined = fields.get(arg(0)?).is_some_and(|value| !value.is_empty());
                if defined {
                    optional(1).to_string()
                } else {
                    optional(2).to_string()
                }
            }
            "asciify" => asciify(arg(0)?),
            "first" => {
                let count = args.get(1).map_or(Ok(1), |c| parse_count(name, c))?;
                let skip = args.get(2).map_or(Ok(0), |s| parse_count(name, s))?;
                let separator = args.get(3).map_or(FIRST_SEPARATOR, String::as_str);
                let join_with = args.get(4).map_or(FIRST_SEPARATOR, String::as_str);
                arg(0)?.split(separator).skip(skip).take(count).collect::<Vec<_>>().join(join_with)
            }
            _ => anyhow::bail!("Unknown function '%{name}'"),
        };
        Ok(value)
    }
}

fn parse_count(function: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse::<usize>()
        .with_context(|| format!("Invalid number '{value}' for function '%{function}'"))
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Strip diacritics and drop any remaining non-ASCII characters.
fn asciify(text: &str) -> String {
    text.nfd().filter(char::is_ascii).collect()
}

/// Integers are true when non-zero, `false` in any case is false, otherwise non-empty is true.
fn is_truthy(condition: &str) -> bool {
    let condition = condition.trim();
    if let Ok(number) = condition.parse::<i64>() {
        return number != 0;
    }
    !condition.is_empty() && !condition.eq_ignore_ascii_case("false")
}
