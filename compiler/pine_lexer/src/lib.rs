//! Lexer for the pine indicator language.
//!
//! Two stages:
//! 1. logos splits the source into raw tokens ([`raw_token`]);
//! 2. the layout pass ([`layout`]) turns physical newlines and leading
//!    whitespace into `Newline`, `Indent` and `Dedent` tokens.
//!
//! Lexing never fails: unrecognised input becomes [`TokenKind::Error`] plus
//! an `INVALID_TOKEN` diagnostic, and the token list always ends in `Eof`.

mod escape;
mod layout;
mod raw_token;

use logos::Logos;
use pine_diagnostic::{Diagnostic, ErrorCode};
use pine_ir::{Span, Token, TokenKind, TokenList};

use crate::escape::{normalize_color, string_body, unescape_string};
use crate::raw_token::RawToken;

/// Tokens plus the lexical errors found while producing them.
#[derive(Clone, Debug, Default)]
pub struct LexOutput {
    pub tokens: TokenList,
    pub errors: Vec<Diagnostic>,
}

impl LexOutput {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Tokenize `source`, including layout tokens.
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn lex(source: &str) -> LexOutput {
    let mut errors = Vec::new();
    let raw = lex_raw(source, &mut errors);
    let tokens = layout::apply(source, raw, &mut errors);
    tracing::debug!(tokens = tokens.len(), errors = errors.len(), "lexed");
    LexOutput { tokens, errors }
}

/// First stage: logos tokens with physical newlines and no `Eof`.
fn lex_raw(source: &str, errors: &mut Vec<Diagnostic>) -> Vec<Token> {
    let mut result = Vec::new();
    let mut logos = RawToken::lexer(source);

    while let Some(token_result) = logos.next() {
        let span = Span::from_range(logos.span());
        let slice = logos.slice();

        match token_result {
            Ok(RawToken::LineComment) => {}
            Ok(RawToken::UnterminatedStr) => {
                errors.push(
                    Diagnostic::error(ErrorCode::UnterminatedString)
                        .with_message("unterminated string literal")
                        .with_label(span, "missing closing quote"),
                );
                let body = unescape_string(string_body(slice, false));
                result.push(Token::new(TokenKind::Str(body), span));
            }
            Ok(raw) => result.push(Token::new(convert_token(raw, slice), span)),
            Err(()) => {
                errors.push(
                    Diagnostic::error(ErrorCode::InvalidToken)
                        .with_message(format!("invalid token `{slice}`"))
                        .with_label(span, "not recognised"),
                );
                result.push(Token::new(TokenKind::Error, span));
            }
        }
    }

    result
}

fn convert_token(raw: RawToken, slice: &str) -> TokenKind {
    match raw {
        RawToken::Int(n) => TokenKind::Int(n),
        RawToken::Float(f) => TokenKind::Float(f.to_bits()),
        RawToken::Str => TokenKind::Str(unescape_string(string_body(slice, true))),
        RawToken::Color => TokenKind::Color(normalize_color(slice)),
        RawToken::Ident => TokenKind::Ident(slice.to_string()),

        RawToken::If => TokenKind::If,
        RawToken::Else => TokenKind::Else,
        RawToken::For => TokenKind::For,
        RawToken::To => TokenKind::To,
        RawToken::By => TokenKind::By,
        RawToken::In => TokenKind::In,
        RawToken::While => TokenKind::While,
        RawToken::Switch => TokenKind::Switch,
        RawToken::Break => TokenKind::Break,
        RawToken::Continue => TokenKind::Continue,
        RawToken::Var => TokenKind::Var,
        RawToken::Varip => TokenKind::Varip,
        RawToken::And => TokenKind::And,
        RawToken::Or => TokenKind::Or,
        RawToken::Not => TokenKind::Not,
        RawToken::Import => TokenKind::Import,
        RawToken::Export => TokenKind::Export,
        RawToken::As => TokenKind::As,
        RawToken::Type => TokenKind::Type,
        RawToken::Method => TokenKind::Method,
        RawToken::True => TokenKind::True,
        RawToken::False => TokenKind::False,

        RawToken::LParen => TokenKind::LParen,
        RawToken::RParen => TokenKind::RParen,
        RawToken::LBracket => TokenKind::LBracket,
        RawToken::RBracket => TokenKind::RBracket,
        RawToken::LBrace => TokenKind::LBrace,
        RawToken::RBrace => TokenKind::RBrace,
        RawToken::Comma => TokenKind::Comma,
        RawToken::Dot => TokenKind::Dot,
        RawToken::Question => TokenKind::Question,
        RawToken::Colon => TokenKind::Colon,
        RawToken::FatArrow => TokenKind::FatArrow,

        RawToken::Plus => TokenKind::Plus,
        RawToken::Minus => TokenKind::Minus,
        RawToken::Star => TokenKind::Star,
        RawToken::Slash => TokenKind::Slash,
        RawToken::Percent => TokenKind::Percent,
        RawToken::EqEq => TokenKind::EqEq,
        RawToken::NotEq => TokenKind::NotEq,
        RawToken::Lt => TokenKind::Lt,
        RawToken::LtEq => TokenKind::LtEq,
        RawToken::Gt => TokenKind::Gt,
        RawToken::GtEq => TokenKind::GtEq,
        RawToken::Eq => TokenKind::Eq,
        RawToken::ColonEq => TokenKind::ColonEq,
        RawToken::PlusEq => TokenKind::PlusEq,
        RawToken::MinusEq => TokenKind::MinusEq,
        RawToken::StarEq => TokenKind::StarEq,
        RawToken::SlashEq => TokenKind::SlashEq,
        RawToken::PercentEq => TokenKind::PercentEq,

        RawToken::Newline => TokenKind::Newline,
        // Filtered out by `lex_raw`.
        RawToken::LineComment | RawToken::UnterminatedStr => TokenKind::Error,
    }
}

#[cfg(test)]
mod tests;
