//! Literal post-processing.

/// Process escape sequences in a string literal body (quotes stripped).
pub(crate) fn unescape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('\\') | None => result.push('\\'),
                Some('"') => result.push('"'),
                Some('\'') => result.push('\''),
                Some(c) => {
                    result.push('\\');
                    result.push(c);
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Strip the quotes from a string literal slice. Unterminated literals only
/// have the opening quote.
pub(crate) fn string_body(slice: &str, terminated: bool) -> &str {
    let end = if terminated && slice.len() >= 2 {
        slice.len() - 1
    } else {
        slice.len()
    };
    slice.get(1..end).unwrap_or("")
}

/// Normalise a colour literal to `#RRGGBB` or `#RRGGBBAA`.
pub(crate) fn normalize_color(slice: &str) -> String {
    let hex = slice.trim_start_matches('#');
    let mut out = String::with_capacity(9);
    out.push('#');
    if hex.len() == 3 {
        for c in hex.chars() {
            out.push(c.to_ascii_uppercase());
            out.push(c.to_ascii_uppercase());
        }
    } else {
        out.extend(hex.chars().map(|c| c.to_ascii_uppercase()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape() {
        assert_eq!(unescape_string(r"a\nb"), "a\nb");
        assert_eq!(unescape_string(r#"say \"hi\""#), "say \"hi\"");
        assert_eq!(unescape_string(r"it\'s"), "it's");
        assert_eq!(unescape_string(r"\q"), "\\q");
    }

    #[test]
    fn test_string_body() {
        assert_eq!(string_body("\"abc\"", true), "abc");
        assert_eq!(string_body("'abc", false), "abc");
        assert_eq!(string_body("\"", false), "");
    }

    #[test]
    fn test_normalize_color() {
        assert_eq!(normalize_color("#f0a"), "#FF00AA");
        assert_eq!(normalize_color("#2962ff"), "#2962FF");
        assert_eq!(normalize_color("#00000080"), "#00000080");
    }
}
