// src/core/help.rs

//! Node-level usage and help rendering.
//!
//! Leaf command help comes from the synthesized parser; the blocks here
//! cover the parser nodes above it (the program level and named group
//! levels). Everything is rendered to a `String` first so the output
//! format stays pinned by tests, and the dispatcher decides the stream.

/// The one-line usage header for a parser node.
pub(crate) fn usage_line(prog: &str, group: Option<&str>) -> String {
    match group {
        Some(group) => format!("Usage: {prog} {group} <command> [-h]"),
        None => format!("Usage: {prog} <command> [-h]"),
    }
}

/// The full help block for a parser node: usage line, description, and
/// the selectable command names in registration order.
pub(crate) fn node_help(
    prog: &str,
    group: Option<&str>,
    description: Option<&str>,
    commands: &[String],
) -> String {
    let mut out = usage_line(prog, group);
    out.push_str("\n\n");

    if let Some(description) = description {
        out.push_str(description);
        out.push_str("\n\n");
    }

    out.push_str("Available Commands:\n");
    for name in commands {
        out.push_str("   ");
        out.push_str(name);
        out.push('\n');
    }
    out
}
