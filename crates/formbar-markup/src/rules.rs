//! Inline validation rules declared on a field.

use formbar_model::{RuleKind, RuleRef};

/// Parse a `rules` attribute: `expression,kind` pairs separated by `;`.
///
/// Expressions may themselves contain commas, so each pair is split on its
/// last comma, and only when the tail is a known rule kind. A pair without a
/// kind defaults to an error rule.
pub fn parse_rules(attr: &str) -> Vec<RuleRef> {
    attr.split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.rsplit_once(',') {
            Some((expr, kind)) => match RuleKind::parse(kind) {
                Some(kind) => RuleRef::new(expr.trim(), kind),
                None => RuleRef::new(pair, RuleKind::Error),
            },
            None => RuleRef::new(pair, RuleKind::Error),
        })
        .collect()
}
