use serde_json::Value;

use crate::json_blob::{extract_json_blob, parse_json_relaxed};

fn looks_like_container(s: &str) -> bool {
    let t = s.trim();
    t.starts_with('[') || t.starts_with('{')
}

fn parse_whole(text: &str) -> Option<Value> {
    let v = serde_json::from_str::<Value>(text).ok()?;
    if let Value::String(inner) = &v
        && looks_like_container(inner)
        && let Ok(unwrapped) = serde_json::from_str::<Value>(inner.trim())
    {
        return Some(unwrapped);
    }
    Some(v)
}

fn parse_blob(text: &str) -> Option<Value> {
    extract_json_blob(text)
        .and_then(|blob| serde_json::from_str::<Value>(blob).ok())
        .or_else(|| parse_json_relaxed(text))
}

fn strip_matching_quotes(s: &str) -> &str {
    for q in ['"', '\''] {
        if s.len() >= 2
            && let Some(inner) = s.strip_prefix(q).and_then(|r| r.strip_suffix(q))
        {
            return inner;
        }
    }
    s
}

/// Decodes one line as a JSON scalar, falling back to the unquoted text.
pub fn decode_scalar(line: &str) -> Value {
    match serde_json::from_str::<Value>(line) {
        Ok(v) => v,
        Err(_) => Value::String(strip_matching_quotes(line).to_string()),
    }
}

fn porcelain_token(tok: &str) -> Value {
    if !tok.is_empty()
        && tok.bytes().all(|b| b.is_ascii_digit())
        && let Ok(n) = tok.parse::<i64>()
    {
        return Value::from(n);
    }
    Value::String(tok.to_string())
}

/// Whitespace-free lines of multi-line output, numeric ones cast to ints.
pub fn decode_porcelain(text: &str) -> Option<Value> {
    let tokens: Vec<Value> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.chars().any(char::is_whitespace))
        .map(porcelain_token)
        .collect();
    if tokens.is_empty() {
        None
    } else {
        Some(Value::Array(tokens))
    }
}

/// Reduces already noise-filtered tool output to a payload.
///
/// Order: whole-text JSON (unwrapping one level of string-encoded JSON),
/// first balanced blob, single-line scalar, porcelain token list.
pub fn decode_payload(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Some(v) = parse_whole(text) {
        return Some(v);
    }
    if let Some(v) = parse_blob(text) {
        return Some(v);
    }
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if let [only] = lines.as_slice() {
        return Some(decode_scalar(only));
    }
    decode_porcelain(text)
}

fn value_as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Integer ids carried by a payload: a bare int, a numeric string, a
/// whitespace separated id string, or a list of those.
pub fn payload_ids(v: &Value) -> Vec<i64> {
    match v {
        Value::Number(_) => value_as_i64(v).into_iter().collect(),
        Value::String(s) => s
            .split_whitespace()
            .filter_map(|t| t.parse::<i64>().ok())
            .collect(),
        Value::Array(items) => items.iter().filter_map(value_as_i64).collect(),
        _ => Vec::new(),
    }
}

/// Last integer found in a scalar or list payload; porcelain create/import
/// calls print the new id last.
pub fn last_int(v: &Value) -> Option<i64> {
    match v {
        Value::String(s) => s
            .split(|c: char| !c.is_ascii_digit())
            .filter(|t| !t.is_empty())
            .filter_map(|t| t.parse::<i64>().ok())
            .last(),
        Value::Array(items) => items.iter().rev().find_map(value_as_i64),
        _ => value_as_i64(v),
    }
}

/// `key` of the first object in an array payload, stringified.
pub fn first_row_field(v: &Value, key: &str) -> Option<String> {
    let field = v.as_array()?.first()?.get(key)?;
    let s = match field {
        Value::String(s) => s.trim().to_string(),
        Value::Null => return None,
        other => other.to_string(),
    };
    Some(s)
}
