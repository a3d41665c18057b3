use super::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source).tokens.kinds().cloned().collect()
}

fn ident(name: &str) -> TokenKind {
    TokenKind::Ident(name.to_string())
}

#[test]
fn test_lex_assignment() {
    assert_eq!(
        kinds("x = 42"),
        vec![
            ident("x"),
            TokenKind::Eq,
            TokenKind::Int(42),
            TokenKind::Newline,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_lex_empty_source() {
    assert_eq!(kinds(""), vec![TokenKind::Eof]);
    assert_eq!(kinds("// only a comment\n\n"), vec![TokenKind::Eof]);
}

#[test]
fn test_lex_operators() {
    assert_eq!(
        kinds("a := b += c -= d *= e /= f %= g => h == i != j <= k >= l"),
        vec![
            ident("a"),
            TokenKind::ColonEq,
            ident("b"),
            TokenKind::PlusEq,
            ident("c"),
            TokenKind::MinusEq,
            ident("d"),
            TokenKind::StarEq,
            ident("e"),
            TokenKind::SlashEq,
            ident("f"),
            TokenKind::PercentEq,
            ident("g"),
            TokenKind::FatArrow,
            ident("h"),
            TokenKind::EqEq,
            ident("i"),
            TokenKind::NotEq,
            ident("j"),
            TokenKind::LtEq,
            ident("k"),
            TokenKind::GtEq,
            ident("l"),
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_lex_keywords_and_na() {
    let tokens = kinds("if not a and b or na");
    assert_eq!(tokens[0], TokenKind::If);
    assert_eq!(tokens[1], TokenKind::Not);
    assert_eq!(tokens[3], TokenKind::And);
    assert_eq!(tokens[5], TokenKind::Or);
    assert_eq!(tokens[6], ident("na"));
}

#[test]
fn test_lex_numbers() {
    let tokens = kinds("1 2.5 .5 1e3 3.");
    assert_eq!(tokens[0], TokenKind::Int(1));
    assert_eq!(tokens[1], TokenKind::Float(2.5f64.to_bits()));
    assert_eq!(tokens[2], TokenKind::Float(0.5f64.to_bits()));
    assert_eq!(tokens[3], TokenKind::Float(1000.0f64.to_bits()));
    assert_eq!(tokens[4], TokenKind::Float(3.0f64.to_bits()));
}

#[test]
fn test_lex_strings() {
    let tokens = kinds(r#"a = "dq \"x\"" + 'sq'"#);
    assert_eq!(tokens[2], TokenKind::Str("dq \"x\"".into()));
    assert_eq!(tokens[4], TokenKind::Str("sq".into()));
}

#[test]
fn test_lex_unterminated_string() {
    let out = lex("t = \"open");
    assert_eq!(out.errors.len(), 1);
    assert_eq!(out.errors[0].code, ErrorCode::UnterminatedString);
    assert_eq!(out.tokens[2].kind, TokenKind::Str("open".into()));
}

#[test]
fn test_lex_colors() {
    let tokens = kinds("#f00 #2962ff #00000080");
    assert_eq!(tokens[0], TokenKind::Color("#FF0000".into()));
    assert_eq!(tokens[1], TokenKind::Color("#2962FF".into()));
    assert_eq!(tokens[2], TokenKind::Color("#00000080".into()));
}

#[test]
fn test_lex_invalid_token_reports_and_continues() {
    let out = lex("a = 1 @ 2");
    assert_eq!(out.errors.len(), 1);
    assert_eq!(out.errors[0].code, ErrorCode::InvalidToken);
    assert_eq!(out.errors[0].primary_span(), Some(Span::new(6, 7)));
    let tokens: Vec<_> = out.tokens.kinds().cloned().collect();
    assert!(tokens.contains(&TokenKind::Error));
    assert!(tokens.contains(&TokenKind::Int(2)));
}

#[test]
fn test_lex_bad_color_length_is_invalid() {
    let out = lex("c = #12345");
    assert_eq!(out.errors[0].code, ErrorCode::InvalidToken);
}

#[test]
fn test_layout_indent_dedent() {
    let source = "if a\n    b = 1\n    c = 2\nd = 3\n";
    assert_eq!(
        kinds(source),
        vec![
            TokenKind::If,
            ident("a"),
            TokenKind::Newline,
            TokenKind::Indent,
            ident("b"),
            TokenKind::Eq,
            TokenKind::Int(1),
            TokenKind::Newline,
            ident("c"),
            TokenKind::Eq,
            TokenKind::Int(2),
            TokenKind::Newline,
            TokenKind::Dedent,
            ident("d"),
            TokenKind::Eq,
            TokenKind::Int(3),
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_layout_closes_blocks_at_eof() {
    let source = "if a\n    if b\n        c = 1";
    let tokens = kinds(source);
    let tail: Vec<_> = tokens[tokens.len() - 4..].to_vec();
    assert_eq!(
        tail,
        vec![
            TokenKind::Newline,
            TokenKind::Dedent,
            TokenKind::Dedent,
            TokenKind::Eof
        ]
    );
}

#[test]
fn test_layout_ignores_newlines_in_parens() {
    let source = "plot(close,\n     color = #fff,\n\n  linewidth = 2)\n";
    let tokens = kinds(source);
    assert!(!tokens.contains(&TokenKind::Indent));
    assert_eq!(
        tokens.iter().filter(|t| **t == TokenKind::Newline).count(),
        1
    );
}

#[test]
fn test_layout_trailing_operator_continues_line() {
    let source = "x = a +\n      b\ny = c ?\n  d :\n  e\n";
    let tokens = kinds(source);
    assert!(!tokens.contains(&TokenKind::Indent));
    assert_eq!(
        tokens.iter().filter(|t| **t == TokenKind::Newline).count(),
        2
    );
}

#[test]
fn test_layout_blank_and_comment_lines() {
    let source = "if a\n\n    // note\n    b = 1\n\n\nc = 2";
    let tokens = kinds(source);
    assert_eq!(
        tokens.iter().filter(|t| **t == TokenKind::Indent).count(),
        1
    );
    assert_eq!(
        tokens.iter().filter(|t| **t == TokenKind::Newline).count(),
        3
    );
}

#[test]
fn test_layout_tabs_count_as_four() {
    let source = "if a\n\tb = 1\n    c = 2\n";
    let out = lex(source);
    assert!(out.errors.is_empty(), "{:?}", out.errors);
    let tokens: Vec<_> = out.tokens.kinds().cloned().collect();
    assert_eq!(
        tokens.iter().filter(|t| **t == TokenKind::Indent).count(),
        1
    );
}

#[test]
fn test_layout_inconsistent_indent() {
    let source = "if a\n    b = 1\n  c = 2\n";
    let out = lex(source);
    assert_eq!(out.errors.len(), 1);
    assert_eq!(out.errors[0].code, ErrorCode::InconsistentIndent);
}

#[test]
fn test_spans_point_into_source() {
    let source = "bop = (close - open)";
    let out = lex(source);
    let close = &out.tokens[3];
    assert_eq!(close.kind, ident("close"));
    assert_eq!(&source[close.span.to_range()], "close");
}

proptest! {
    #[test]
    fn prop_lex_never_panics_and_balances(src in "[ a-z0-9\\n\\t()\\[\\]+=:?#\"'.,-]{0,80}") {
        let out = lex(&src);
        let tokens: Vec<_> = out.tokens.kinds().cloned().collect();
        prop_assert_eq!(tokens.last(), Some(&TokenKind::Eof));
        let indents = tokens.iter().filter(|t| **t == TokenKind::Indent).count();
        let dedents = tokens.iter().filter(|t| **t == TokenKind::Dedent).count();
        prop_assert_eq!(indents, dedents);
    }

    #[test]
    fn prop_integer_literals_round_trip(n in 0u64..1_000_000_000) {
        let out = lex(&n.to_string());
        prop_assert_eq!(&out.tokens[0].kind, &TokenKind::Int(n));
    }
}
