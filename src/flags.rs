const READ_VERBS: &[&str] = &["list", "get", "search"];
const PROJECTION_FLAGS: &[&str] = &["--field", "--fields"];

/// Flags appended to read-ish calls that did not pick an output format.
pub const READ_FLAGS: &[&str] = &[
    "--format=json",
    "--skip-plugins",
    "--skip-themes",
    "--no-color",
    "--quiet",
];

pub const QUIET_FLAG: &str = "--quiet";

fn flag_name(tok: &str) -> &str {
    tok.split('=').next().unwrap_or(tok)
}

/// Flags that must appear at most once per argv, whatever their spelling.
pub fn exclusive_group(tok: &str) -> Option<&'static str> {
    match flag_name(tok) {
        "--quiet" => Some("quiet"),
        "--color" | "--no-color" => Some("color"),
        "--format" => Some("format"),
        _ => None,
    }
}

fn has_flag(parts: &[String], flag: &str) -> bool {
    let name = flag_name(flag);
    let group = exclusive_group(flag);
    parts
        .iter()
        .any(|p| flag_name(p) == name || (group.is_some() && exclusive_group(p) == group))
}

fn has_output_selector(parts: &[String]) -> bool {
    parts
        .iter()
        .any(|p| flag_name(p) == "--format" || p == "--porcelain")
}

/// A call is read-ish when any positional token is a query verb or any flag
/// projects fields.
pub fn is_readish(parts: &[String]) -> bool {
    parts.iter().any(|p| {
        if p.starts_with('-') {
            PROJECTION_FLAGS.contains(&flag_name(p))
        } else {
            READ_VERBS.contains(&p.as_str())
        }
    })
}

/// Appends `flag` unless a flag of the same name, or of the same exclusive
/// group, is already present.
pub fn push_flag_once(parts: &mut Vec<String>, flag: &str) {
    if !has_flag(parts, flag) {
        parts.push(flag.to_string());
    }
}

/// Classifies `parts` and, for read-ish calls without an explicit output
/// selector, appends the structured-output flag set. Returns the
/// classification.
pub fn inject_read_flags(parts: &mut Vec<String>) -> bool {
    let readish = is_readish(parts);
    if readish && !has_output_selector(parts) {
        for flag in READ_FLAGS {
            push_flag_once(parts, flag);
        }
    }
    readish
}
