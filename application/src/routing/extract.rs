//! Best-effort parameter extraction driven by [`ExtractionHint`]s.
//!
//! Extraction never invents values: a parameter whose hint finds nothing
//! is left out, so the router can fill its default or mark it missing.
//! Values are taken case-folded; only paths keep the case they were typed in.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Value, json};
use steward_domain::{ExtractionHint, ParamKind, ToolArguments, ToolDescriptor, ToolParameter};

use super::normalize::Token;

/// Words skipped when looking for the word after a keyword
const FILLER: &[&str] = &[
    "the", "a", "an", "package", "packages", "service", "me", "my", "new", "latest", "software",
];

/// Words that end the search for a keyword's argument
const STOP: &[&str] = &[
    "with", "without", "on", "using", "via", "and", "in", "at", "from", "as", "version", "to",
];

/// How far (in tokens) a quantity may be from its context word
const QUANTITY_WINDOW: usize = 4;

static QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)([a-z]*)$").expect("quantity pattern is valid")
});

static DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,}$").expect("domain pattern is valid")
});

static VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?\d+(?:\.\d+)+(?:[-.][a-z0-9]+)?$").expect("version pattern is valid")
});

/// Extract every parameter of `descriptor` that its hint can find in `tokens`
pub fn extract_params(descriptor: &ToolDescriptor, tokens: &[Token]) -> ToolArguments {
    let mut args = ToolArguments::new();
    for param in &descriptor.parameters {
        if let Some(value) = extract_one(param, tokens) {
            args.insert(param.name.clone(), value);
        }
    }
    args
}

fn extract_one(param: &ToolParameter, tokens: &[Token]) -> Option<Value> {
    match &param.hint {
        ExtractionHint::None => None,
        ExtractionHint::AfterKeyword { words } => {
            after_keyword(tokens, words).map(|t| shape(param, t.norm.clone()))
        }
        ExtractionHint::Choice => tokens
            .iter()
            .find(|t| param.allowed.iter().any(|a| a.eq_ignore_ascii_case(&t.norm)))
            .map(|t| Value::String(t.norm.clone())),
        ExtractionHint::Quantity { unit, context } => {
            quantity(tokens, unit, context).map(|n| number(param.kind, n))
        }
        ExtractionHint::Flag { on, off } => {
            if off.iter().any(|p| contains_phrase(tokens, p)) {
                Some(Value::Bool(false))
            } else if on.iter().any(|p| contains_phrase(tokens, p)) {
                Some(Value::Bool(true))
            } else {
                None
            }
        }
        ExtractionHint::Domain => tokens
            .iter()
            .find(|t| DOMAIN.is_match(&t.norm) && !VERSION.is_match(&t.norm))
            .map(|t| Value::String(t.norm.clone())),
        ExtractionHint::Path => tokens
            .iter()
            .find(|t| t.text.starts_with('/') || t.text.starts_with("~/"))
            .map(|t| Value::String(t.text.clone())),
        ExtractionHint::Version => tokens
            .iter()
            .find(|t| VERSION.is_match(&t.norm))
            .map(|t| Value::String(t.norm.trim_start_matches('v').to_string())),
    }
}

fn shape(param: &ToolParameter, text: String) -> Value {
    match param.kind {
        ParamKind::StringList => json!([text]),
        _ => Value::String(text),
    }
}

fn after_keyword<'a>(tokens: &'a [Token], words: &[String]) -> Option<&'a Token> {
    let start = tokens
        .iter()
        .position(|t| words.iter().any(|w| w == &t.norm))?;

    tokens[start + 1..]
        .iter()
        .filter(|t| !FILLER.contains(&t.norm.as_str()))
        .find(|t| !words.iter().any(|w| w == &t.norm))
        .filter(|t| !STOP.contains(&t.norm.as_str()) && t.norm != "then")
}

/// Whether `phrase` appears as a run of consecutive tokens
pub fn contains_phrase(tokens: &[Token], phrase: &str) -> bool {
    phrase_span(tokens, phrase).is_some()
}

/// Word count of `phrase` if it appears in `tokens`
pub fn phrase_span(tokens: &[Token], phrase: &str) -> Option<usize> {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    if words.is_empty() || words.len() > tokens.len() {
        return None;
    }
    tokens
        .windows(words.len())
        .any(|window| window.iter().zip(&words).all(|(t, w)| t.norm == *w))
        .then_some(words.len())
}

fn unit_aliases(unit: &str) -> Vec<String> {
    match unit {
        "gb" => ["gb", "g", "gib", "gigabyte", "gigabytes"]
            .map(String::from)
            .to_vec(),
        "mb" => ["mb", "m", "mib", "megabyte", "megabytes"]
            .map(String::from)
            .to_vec(),
        other => vec![other.to_string()],
    }
}

/// Find `<n><unit>` or `<n> <unit>` closest to a context word
fn quantity(tokens: &[Token], unit: &str, context: &[String]) -> Option<f64> {
    let aliases = unit_aliases(unit);
    let mut found: Vec<(usize, f64)> = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        let Some(caps) = QUANTITY.captures(&token.norm) else {
            continue;
        };
        let Ok(value) = caps[1].parse::<f64>() else {
            continue;
        };
        let suffix = &caps[2];
        let unit_ok = if suffix.is_empty() {
            tokens
                .get(i + 1)
                .is_some_and(|next| aliases.contains(&next.norm))
        } else {
            aliases.iter().any(|a| a == suffix)
        };
        if unit_ok {
            found.push((i, value));
        }
    }

    if context.is_empty() {
        return found.first().map(|(_, v)| *v);
    }

    found
        .iter()
        .filter_map(|(i, value)| {
            tokens
                .iter()
                .enumerate()
                .filter(|(_, t)| context.iter().any(|c| c == &t.norm))
                .map(|(j, _)| i.abs_diff(j))
                .filter(|d| *d <= QUANTITY_WINDOW)
                .min()
                .map(|distance| (distance, *value))
        })
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, v)| v)
}

fn number(kind: ParamKind, n: f64) -> Value {
    match kind {
        ParamKind::Integer => json!(n.round() as i64),
        _ => json!(n),
    }
}
