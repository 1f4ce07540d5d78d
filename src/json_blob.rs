use serde_json::Value;

use crate::noise::strip_ansi;

const BOM: char = '\u{feff}';

fn balanced_from(s: &str, start: usize) -> Option<&str> {
    let bytes = s.as_bytes();
    let (open_c, close_c) = match bytes[start] {
        b'{' => (b'{', b'}'),
        _ => (b'[', b']'),
    };
    let mut depth = 1usize;
    let mut in_str = false;
    let mut esc = false;
    for (i, &ch) in bytes.iter().enumerate().skip(start + 1) {
        if in_str {
            if esc {
                esc = false;
            } else if ch == b'\\' {
                esc = true;
            } else if ch == b'"' {
                in_str = false;
            }
            continue;
        }
        if ch == b'"' {
            in_str = true;
        } else if ch == open_c {
            depth += 1;
        } else if ch == close_c {
            depth -= 1;
            if depth == 0 {
                return Some(&s[start..=i]);
            }
        }
    }
    None
}

/// Returns the balanced `[...]` or `{...}` span that starts at the earliest
/// opener in `s`.
///
/// Brackets inside double-quoted strings (escapes honoured) do not move the
/// depth counter. An earliest opener that never closes yields `None`.
pub fn extract_json_blob(s: &str) -> Option<&str> {
    let start = s.find(['[', '{'])?;
    balanced_from(s, start)
}

fn between(s: &str, open: char, close: char) -> Option<&str> {
    let lb = s.find(open)?;
    let rb = s.rfind(close)?;
    (rb > lb).then(|| &s[lb..=rb])
}

/// Tolerant parse for payloads wrapped in noise: drops a leading BOM and
/// escape codes, tries the whole text, then the widest array span, then the
/// widest object span.
pub fn parse_json_relaxed(text: &str) -> Option<Value> {
    let cleaned = strip_ansi(text.trim_start_matches(BOM).trim());
    let s = cleaned.trim();
    if let Ok(v) = serde_json::from_str::<Value>(s) {
        return Some(v);
    }
    [between(s, '[', ']'), between(s, '{', '}')]
        .into_iter()
        .flatten()
        .find_map(|span| serde_json::from_str::<Value>(span).ok())
}
