//! Identifier and literal spelling in the generated TypeScript.

use std::fmt::Write;

/// Names a Pine identifier may not take verbatim: TypeScript keywords and
/// globals, plus every name the generated module itself binds.
const RESERVED: &[&str] = &[
    // Keywords and contextual keywords.
    "any", "arguments", "as", "async", "await", "boolean", "break", "case", "catch", "class",
    "const", "constructor", "continue", "debugger", "declare", "default", "delete", "do", "else",
    "enum", "eval", "export", "extends", "false", "finally", "for", "from", "function", "get",
    "if", "implements", "import", "in", "instanceof", "interface", "let", "module", "namespace",
    "never", "new", "null", "number", "object", "of", "package", "private", "protected",
    "public", "require", "return", "set", "static", "string", "super", "switch", "symbol",
    "this", "throw", "true", "try", "type", "typeof", "undefined", "unknown", "var", "void",
    "while", "with", "yield",
    // Globals.
    "Array", "Boolean", "Date", "Infinity", "JSON", "Math", "NaN", "Number", "Object",
    "Promise", "String", "console", "globalThis", "window",
    // Generated bindings and runtime imports.
    "bars", "inputs", "metadata", "defaultInputs", "inputConfig", "plotConfig", "fillConfig",
    "calculate", "Series", "Bar", "IndicatorResult", "InputConfig", "PlotConfig", "FillConfig",
    "at", "truthy", "na", "nz", "fixnan", "timestamp", "toInt", "toFloat", "toBool",
    // Runtime namespaces.
    "ta", "math", "array", "str", "color", "request", "syminfo", "timeframe", "barstate",
    "matrix",
];

/// Whether `name` must be renamed before use as a binding.
pub(crate) fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

/// Spelling of a user identifier: reserved names, and the indicator's own
/// name, get a trailing underscore.
pub(crate) fn mangle(name: &str, indicator: &str) -> String {
    if is_reserved(name) || name == indicator {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

/// Sanitized PascalCase form of an indicator title.
///
/// Letters outside ASCII are kept, since TypeScript identifiers accept them.
pub(crate) fn pascal_case(title: &str) -> String {
    let mut name = String::with_capacity(title.len());
    for word in title.split(|c: char| !is_name_char(c)) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.extend(chars);
        }
    }
    if name.is_empty() {
        return "Indicator".to_string();
    }
    if !name.starts_with(char::is_alphabetic) {
        name.insert_str(0, "Indicator");
    }
    name
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_alphabetic()
}

/// Double-quoted string literal.
pub(crate) fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if u32::from(c) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Float literal that reads back as the same value.
pub(crate) fn float_literal(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        if f.is_sign_positive() { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        format!("{f:?}")
    }
}

/// TypeScript type of a written Pine type.
pub(crate) fn ts_type(pine: &str) -> String {
    match pine {
        "int" | "float" => "number".to_string(),
        "bool" => "boolean".to_string(),
        "string" | "color" => "string".to_string(),
        _ if pine.starts_with("array<") => "any[]".to_string(),
        _ if pine.starts_with("matrix<") || pine.starts_with("map<") => "any".to_string(),
        _ if pine.starts_with(|c: char| c.is_ascii_uppercase()) => pine.to_string(),
        _ => "any".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pascal_case() {
        assert_eq!(pascal_case("Balance of Power"), "BalanceOfPower");
        assert_eq!(pascal_case("RSI"), "RSI");
        assert_eq!(pascal_case("my-indicator v2"), "MyIndicatorV2");
        assert_eq!(pascal_case("  "), "Indicator");
        assert_eq!(pascal_case("3 Line Break"), "Indicator3LineBreak");
        assert_eq!(pascal_case("über-RSI"), "ÜberRSI");
        assert_ne!(pascal_case("über-RSI"), pascal_case("öber-RSI"));
        assert_eq!(pascal_case("Δ momentum"), "ΔMomentum");
    }

    #[test]
    fn test_mangle() {
        assert_eq!(mangle("length", "Rsi"), "length");
        assert_eq!(mangle("function", "Rsi"), "function_");
        assert_eq!(mangle("bars", "Rsi"), "bars_");
        assert_eq!(mangle("Rsi", "Rsi"), "Rsi_");
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("a\"b\\c\nd"), r#""a\"b\\c\nd""#);
        assert_eq!(quote("\u{1}"), r#""\u0001""#);
    }

    #[test]
    fn test_float_literal() {
        assert_eq!(float_literal(2.0), "2.0");
        assert_eq!(float_literal(0.5), "0.5");
        assert_eq!(float_literal(f64::NAN), "NaN");
    }
}
