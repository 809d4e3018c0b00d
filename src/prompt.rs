//! Prompt template rendering.
//!
//! Templates live under `prompts/` and are embedded at compile time. Values
//! are substituted in one pass so user text that happens to contain
//! `{placeholder}` syntax is emitted verbatim.

/// Render `template`, replacing each `{key}` with its value.
///
/// Unknown placeholders are left as-is.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let substituted = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (close, *value))
        });
        match substituted {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Trimmed value of an optional field, `None` when absent or blank.
pub fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// `## heading` followed by `body`, or nothing when the field is absent.
pub fn optional_section(heading: &str, value: Option<&str>) -> String {
    match present(value) {
        Some(body) => format!("## {heading}\n{body}\n\n"),
        None => String::new(),
    }
}

/// `## heading` followed by one bullet per item, or nothing when empty.
pub fn list_section<S: AsRef<str>>(heading: &str, items: &[S]) -> String {
    if items.is_empty() {
        return String::new();
    }
    format!("## {heading}\n{}\n\n", bullet_lines(items))
}

/// One `- item` line per element, in the given order.
pub fn bullet_lines<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}
