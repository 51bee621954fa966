//! Case-encoding of module paths for the wire.
//!
//! Module paths may contain uppercase letters, but proxies are often backed by
//! case-insensitive file systems, so every uppercase ASCII letter travels as
//! `!` followed by its lowercase form (`github.com/Azure` ↔ `github.com/!azure`).

use thiserror::Error;

/// Failure to encode or decode a module path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscapeError {
    #[error("module path is empty")]
    Empty,

    #[error("module path {path:?} contains reserved character {ch:?}")]
    ReservedChar { path: String, ch: char },

    #[error("escaped module path {path:?} contains uppercase letter {ch:?}")]
    UnescapedUppercase { path: String, ch: char },

    #[error("escaped module path {path:?} has '!' not followed by a lowercase letter")]
    DanglingBang { path: String },

    #[error("module path {path:?} contains invalid character {ch:?}")]
    InvalidChar { path: String, ch: char },

    #[error("module path {path:?} has an empty, '.' or '..' element")]
    InvalidElement { path: String },
}

/// Characters a module path may carry besides ASCII letters and digits.
const PATH_PUNCTUATION: &[char] = &['-', '.', '_', '~', '+', '/'];

/// Encode uppercase letters as `!` + lowercase.
pub fn escape_path(path: &str) -> Result<String, EscapeError> {
    if path.is_empty() {
        return Err(EscapeError::Empty);
    }

    let mut out = String::with_capacity(path.len());
    for ch in path.chars() {
        match ch {
            '!' | '@' => {
                return Err(EscapeError::ReservedChar {
                    path: path.to_string(),
                    ch,
                })
            }
            'A'..='Z' => {
                out.push('!');
                out.push(ch.to_ascii_lowercase());
            }
            _ => out.push(ch),
        }
    }
    Ok(out)
}

/// Decode `!`-escaped letters back to uppercase.
pub fn unescape_path(escaped: &str) -> Result<String, EscapeError> {
    if escaped.is_empty() {
        return Err(EscapeError::Empty);
    }

    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '!' => match chars.next() {
                Some(next @ 'a'..='z') => out.push(next.to_ascii_uppercase()),
                _ => {
                    return Err(EscapeError::DanglingBang {
                        path: escaped.to_string(),
                    })
                }
            },
            'A'..='Z' => {
                return Err(EscapeError::UnescapedUppercase {
                    path: escaped.to_string(),
                    ch,
                })
            }
            '@' => {
                return Err(EscapeError::ReservedChar {
                    path: escaped.to_string(),
                    ch,
                })
            }
            'a'..='z' | '0'..='9' => out.push(ch),
            _ if PATH_PUNCTUATION.contains(&ch) => out.push(ch),
            _ => {
                return Err(EscapeError::InvalidChar {
                    path: escaped.to_string(),
                    ch,
                })
            }
        }
    }

    if out.split('/').any(|elem| elem.is_empty() || elem == "." || elem == "..") {
        return Err(EscapeError::InvalidElement {
            path: escaped.to_string(),
        });
    }
    Ok(out)
}
