//! `{{name}}` placeholder scanning
//!
//! A placeholder is `{{` + name + `}}` where the name is non-empty and holds
//! no brace. Text that does not form a complete placeholder is copied through
//! untouched, and a placeholder the resolver does not know stays literal.

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Replace every placeholder the resolver knows in a single left-to-right pass.
///
/// Replacement values are written to the output as-is and never scanned again.
pub fn replace_placeholders<'v, F>(content: &str, mut resolve: F) -> String
where
    F: FnMut(&str) -> Option<&'v str>,
{
    let mut output = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(open) = rest.find(OPEN) {
        let after_open = &rest[open + OPEN.len()..];
        let Some(close) = after_open.find(CLOSE) else {
            break;
        };
        let name = &after_open[..close];

        if name.contains('{') {
            // Another opener sits inside; the real token starts further right.
            output.push_str(&rest[..open + 1]);
            rest = &rest[open + 1..];
            continue;
        }

        let token_end = open + OPEN.len() + close + CLOSE.len();
        match is_valid_name(name).then(|| resolve(name)).flatten() {
            Some(value) => {
                output.push_str(&rest[..open]);
                output.push_str(value);
            }
            None => output.push_str(&rest[..token_end]),
        }
        rest = &rest[token_end..];
    }

    output.push_str(rest);
    output
}

/// Replace one placeholder name (ASCII case-insensitive) with `value`
pub fn replace_named(content: &str, name: &str, value: &str) -> String {
    replace_placeholders(content, |found| {
        found.eq_ignore_ascii_case(name).then_some(value)
    })
}

/// Distinct placeholder names in order of first appearance
pub fn placeholders(content: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    replace_placeholders(content, |name| {
        if !names.iter().any(|seen| seen == name) {
            names.push(name.to_string());
        }
        None
    });
    names
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('}')
}
