use std::path::Path;

use crate::error::{AdapterError, AdapterResult};
use crate::flags::exclusive_group;

/// A tool command as callers hand it over: one shell-style string or an
/// explicit argument list. Resolved once by [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSpec {
    Raw(String),
    Argv(Vec<String>),
}

impl From<&str> for CommandSpec {
    fn from(s: &str) -> Self {
        CommandSpec::Raw(s.to_string())
    }
}

impl From<String> for CommandSpec {
    fn from(s: String) -> Self {
        CommandSpec::Raw(s)
    }
}

impl From<Vec<String>> for CommandSpec {
    fn from(v: Vec<String>) -> Self {
        CommandSpec::Argv(v)
    }
}

impl From<Vec<&str>> for CommandSpec {
    fn from(v: Vec<&str>) -> Self {
        CommandSpec::Argv(v.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for CommandSpec {
    fn from(v: &[&str]) -> Self {
        CommandSpec::Argv(v.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for CommandSpec {
    fn from(v: [&str; N]) -> Self {
        CommandSpec::Argv(v.iter().map(|s| s.to_string()).collect())
    }
}

fn tokenize(spec: &CommandSpec) -> AdapterResult<Vec<String>> {
    match spec {
        CommandSpec::Raw(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(AdapterError::invalid("empty command"));
            }
            shell_words::split(text)
                .map_err(|e| AdapterError::invalid(format!("could not parse command: {e}")))
        }
        CommandSpec::Argv(parts) => {
            if parts.iter().all(|p| p.trim().is_empty()) {
                return Err(AdapterError::invalid("empty argv list"));
            }
            Ok(parts.clone())
        }
    }
}

fn is_tool_token(tok: &str, tool_path: &str, tool_base: Option<&str>) -> bool {
    if tok == tool_path {
        return true;
    }
    match (tool_base, Path::new(tok).file_name().and_then(|n| n.to_str())) {
        (Some(base), Some(tok_base)) => base == tok_base,
        _ => false,
    }
}

fn strip_path_flags(parts: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(parts.len());
    let mut it = parts.into_iter().peekable();
    while let Some(tok) = it.next() {
        if tok == "--path" {
            if it.peek().is_some_and(|next| !next.starts_with('-')) {
                it.next();
            }
            continue;
        }
        if tok.starts_with("--path=") {
            continue;
        }
        out.push(tok);
    }
    out
}

/// Keeps the first of each quiet/color/format flag and drops later ones.
pub fn dedupe_exclusive_flags(parts: Vec<String>) -> Vec<String> {
    let mut seen: Vec<&'static str> = Vec::new();
    parts
        .into_iter()
        .filter(|tok| match exclusive_group(tok) {
            Some(group) if seen.contains(&group) => false,
            Some(group) => {
                seen.push(group);
                true
            }
            None => true,
        })
        .collect()
}

/// Resolves a [`CommandSpec`] into the canonical argv passed after the
/// runner's own `<tool> --path=<site>` prefix.
pub fn normalize(spec: &CommandSpec, tool_path: &Path) -> AdapterResult<Vec<String>> {
    let mut parts = tokenize(spec)?;
    let tool_str = tool_path.to_string_lossy();
    let tool_base = tool_path.file_name().and_then(|n| n.to_str());
    let lead = parts
        .iter()
        .take_while(|t| is_tool_token(t, &tool_str, tool_base))
        .count();
    parts.drain(..lead);
    let parts = dedupe_exclusive_flags(strip_path_flags(parts));
    if parts.is_empty() {
        return Err(AdapterError::invalid("command has no arguments after normalization"));
    }
    Ok(parts)
}

fn is_secret_flag(name: &str) -> bool {
    name.to_ascii_lowercase().contains("pass")
}

fn redact(tok: &str) -> String {
    if let Some(rest) = tok.strip_prefix("--")
        && let Some((name, _)) = rest.split_once('=')
        && is_secret_flag(name)
    {
        return format!("--{name}=***");
    }
    tok.to_string()
}

/// Shell-quoted, secret-redacted rendering of an argv for log lines.
///
/// Covers both `--admin_password=x` and `--admin_password x`.
pub fn sanitize_for_log(parts: &[String]) -> String {
    let mut redacted = Vec::with_capacity(parts.len());
    let mut hide_next = false;
    for tok in parts {
        if hide_next && !tok.starts_with('-') {
            redacted.push("***".to_string());
            hide_next = false;
            continue;
        }
        hide_next = tok
            .strip_prefix("--")
            .is_some_and(|name| !name.contains('=') && is_secret_flag(name));
        redacted.push(redact(tok));
    }
    shell_words::join(redacted)
}
