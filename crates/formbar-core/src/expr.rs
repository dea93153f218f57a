//! Expression tokens and value substitution.
//!
//! Conditional expressions are written in the evaluator's grammar with field
//! references marked by the `$` sigil, e.g. `$age >= 18 and $smoker == False`.
//! Expressions are split on whitespace; each token is kept verbatim except
//! for the `$name` references inside it, which are replaced with the field's
//! current value rendered as a literal.

use formbar_model::{Datatype, FieldName, FieldRecord, FieldValue};

use crate::error::SubstituteError;
use crate::store::FieldStore;

/// Literal the evaluator grammar uses for a missing value.
pub const NULL_LITERAL: &str = "None";

const SIGIL: char = '$';

/// Part of a whitespace-separated token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece<'a> {
    Literal(&'a str),
    FieldRef(&'a str),
}

/// One whitespace-separated token of an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub raw: &'a str,
    pub pieces: Vec<Piece<'a>>,
}

impl<'a> Token<'a> {
    pub fn parse(raw: &'a str) -> Self {
        let mut pieces = Vec::new();
        let mut rest = raw;
        while let Some(at) = rest.find(SIGIL) {
            let after = &rest[at + SIGIL.len_utf8()..];
            let name = field_name_prefix(after);
            if name.is_empty() {
                // Lone sigil: keep it and continue after it.
                let end = at + SIGIL.len_utf8();
                push_literal(&mut pieces, &rest[..end]);
                rest = &rest[end..];
                continue;
            }
            push_literal(&mut pieces, &rest[..at]);
            pieces.push(Piece::FieldRef(name));
            rest = &after[name.len()..];
        }
        push_literal(&mut pieces, rest);
        Self { raw, pieces }
    }

    pub fn is_field_ref(&self) -> bool {
        self.pieces.iter().any(|p| matches!(p, Piece::FieldRef(_)))
    }

    pub fn field_refs(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.pieces.iter().filter_map(|p| match p {
            Piece::FieldRef(name) => Some(*name),
            Piece::Literal(_) => None,
        })
    }
}

fn push_literal<'a>(pieces: &mut Vec<Piece<'a>>, text: &'a str) {
    if !text.is_empty() {
        pieces.push(Piece::Literal(text));
    }
}

/// Longest field name at the start of `s`. Names start with a letter or
/// underscore; a trailing dot belongs to the surrounding grammar.
fn field_name_prefix(s: &str) -> &str {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return "",
    }
    let end = chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '.'))
        .map_or(s.len(), |(i, _)| i);
    s[..end].trim_end_matches('.')
}

/// Split an expression into tokens.
pub fn tokenize(expr: &str) -> Vec<Token<'_>> {
    expr.split_whitespace().map(Token::parse).collect()
}

/// Field names referenced by `expr`, deduplicated, in order of first
/// appearance.
pub fn referenced_fields(expr: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for token in tokenize(expr) {
        for name in token.field_refs() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// An expression with every field reference replaced by a literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substituted {
    pub expr: String,
    /// Fields whose value could not be represented in their datatype and was
    /// sent as `None`.
    pub fallbacks: Vec<FieldName>,
}

/// Replace every field reference in `expr` with the referenced field's
/// current value.
pub fn substitute(expr: &str, store: &FieldStore) -> Result<Substituted, SubstituteError> {
    let mut fallbacks: Vec<FieldName> = Vec::new();
    let mut out: Vec<String> = Vec::new();

    for token in tokenize(expr) {
        let mut text = String::with_capacity(token.raw.len());
        for piece in &token.pieces {
            match piece {
                Piece::Literal(literal) => text.push_str(literal),
                Piece::FieldRef(name) => {
                    let record = store.get(name).ok_or_else(|| SubstituteError::UnknownField {
                        field: (*name).to_string(),
                        expr: expr.to_string(),
                    })?;
                    let rendered = render(record);
                    if rendered.fallback && !fallbacks.contains(&record.name) {
                        fallbacks.push(record.name.clone());
                    }
                    text.push_str(&rendered.text);
                }
            }
        }
        out.push(text);
    }

    Ok(Substituted {
        expr: out.join(" "),
        fallbacks,
    })
}

struct Rendered {
    text: String,
    fallback: bool,
}

impl Rendered {
    fn literal(text: String) -> Self {
        Self {
            text,
            fallback: false,
        }
    }

    fn null(fallback: bool) -> Self {
        Self {
            text: NULL_LITERAL.to_string(),
            fallback,
        }
    }
}

/// Render a field's value as an expression literal.
///
/// List elements follow the field's declared datatype, so a checkbox group
/// without `datatype="string"` renders bare elements (`[chess,music]`).
fn render(record: &FieldRecord) -> Rendered {
    if !record.is_active() {
        return Rendered::null(false);
    }
    match &record.value {
        FieldValue::Unset => Rendered::null(false),
        FieldValue::Scalar(raw) => match render_scalar(raw, record.datatype) {
            Some(text) => Rendered::literal(text),
            None => Rendered::null(true),
        },
        FieldValue::List(items) => {
            let mut fallback = false;
            let elements: Vec<String> = items
                .iter()
                .map(|item| {
                    render_scalar(item, record.datatype).unwrap_or_else(|| {
                        fallback = true;
                        NULL_LITERAL.to_string()
                    })
                })
                .collect();
            Rendered {
                text: format!("[{}]", elements.join(",")),
                fallback,
            }
        }
    }
}

/// Render one scalar; `None` when the value is not valid for `datatype`.
fn render_scalar(raw: &str, datatype: Datatype) -> Option<String> {
    if raw.is_empty() {
        return Some(NULL_LITERAL.to_string());
    }
    match datatype {
        _ if datatype.is_quoted() => {
            if raw.starts_with('[') {
                Some(raw.to_string())
            } else {
                Some(quote(raw))
            }
        }
        Datatype::Number => {
            let trimmed = raw.trim();
            trimmed.parse::<f64>().ok().map(|_| trimmed.to_string())
        }
        Datatype::Boolean => match raw.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some("True".to_string()),
            "false" | "0" | "no" | "off" => Some("False".to_string()),
            _ => None,
        },
        _ => Some(raw.to_string()),
    }
}

/// Single-quote a string literal. Line breaks are dropped.
fn quote(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('\'');
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\r' | '\n' => {}
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}
