use std::sync::OnceLock;

use regex_lite::Regex;

/// Line prefixes the PHP runtime and WP-CLI emit around the real payload.
const NOISE_PREFIXES: &[&str] = &[
    "php warning:",
    "php notice:",
    "php deprecated:",
    "php fatal error:",
    "php parse error:",
    "php stack trace:",
    "warning:",
    "notice:",
    "deprecated:",
    "fatal error:",
    "stack trace:",
];

fn ansi_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\x1b(\[[0-9;?]*[ -/]*[@-~]|\][^\x07]*\x07|[@-_])").expect("ansi regex")
    })
}

/// Stack frames (`#0 /x.php(12): f()`, `PHP   1. {main}() ...`), trailing
/// `thrown in ... on line N` markers and print_r punctuation.
fn structural_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(#\d+\s|#\d+$|PHP\s+\d+\.\s|thrown in\s.*on line\s+\d+$|Array$|\($|\)$)")
            .expect("structural noise regex")
    })
}

pub fn strip_ansi(text: &str) -> String {
    let mut cur = text.to_string();
    loop {
        let next = ansi_re().replace_all(&cur, "").into_owned();
        if next == cur {
            return cur;
        }
        cur = next;
    }
}

pub fn is_noise_line(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    NOISE_PREFIXES.iter().any(|p| lower.starts_with(p)) || structural_re().is_match(line)
}

/// Drops escape codes, blank lines and known non-payload lines. Surviving
/// lines are trimmed and keep their order; the transform is idempotent.
pub fn filter_noise(text: &str) -> String {
    strip_ansi(text)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !is_noise_line(l))
        .collect::<Vec<_>>()
        .join("\n")
}
