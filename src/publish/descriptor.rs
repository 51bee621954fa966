//! Module descriptor (`go.mod`) parsing.

/// File name of the module descriptor.
pub const DESCRIPTOR_FILE: &str = "go.mod";

/// Extract the module path from the `module` directive.
///
/// Accepts bare, double-quoted and back-quoted paths, a trailing `//`
/// comment, and the parenthesized block form. Returns `None` if no
/// directive is present.
pub fn module_path(content: &str) -> Option<String> {
    let mut in_block = false;

    for line in content.lines() {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            continue;
        }

        if in_block {
            if line == ")" {
                in_block = false;
                continue;
            }
            return unquote(line);
        }

        let Some(rest) = line.strip_prefix("module") else {
            continue;
        };
        // `modulex` is not a directive
        if !rest.is_empty() && !rest.starts_with(|c: char| c.is_whitespace() || c == '(') {
            continue;
        }

        let rest = rest.trim();
        if rest == "(" {
            in_block = true;
            continue;
        }
        return unquote(rest);
    }

    None
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        // `//` inside a quoted path is not a comment start
        Some(idx) if line[..idx].matches('"').count() % 2 == 0 => &line[..idx],
        _ => line,
    }
}

fn unquote(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let path = if let Some(inner) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        inner
    } else if let Some(inner) = raw.strip_prefix('`').and_then(|r| r.strip_suffix('`')) {
        inner
    } else {
        raw
    };

    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}
