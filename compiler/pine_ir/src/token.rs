//! Token types produced by the lexer.

use std::fmt;

use crate::Span;

/// A token with its span in the source.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {}", self.kind, self.span)
    }
}

/// Token kinds.
///
/// Float literals store their bits so the enum stays `Eq + Hash`.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum TokenKind {
    Int(u64),
    Float(u64),
    /// String literal with escapes already processed.
    Str(String),
    /// Colour literal including the leading `#`.
    Color(String),
    Ident(String),

    // Keywords
    If,
    Else,
    For,
    To,
    By,
    In,
    While,
    Switch,
    Break,
    Continue,
    Var,
    Varip,
    And,
    Or,
    Not,
    Import,
    Export,
    As,
    Type,
    Method,
    True,
    False,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Question,
    Colon,
    FatArrow,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    ColonEq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,

    // Layout
    Newline,
    Indent,
    Dedent,

    /// Unrecognised input; the lexer also records a diagnostic for it.
    Error,
    Eof,
}

impl TokenKind {
    /// Human-readable name used in parse error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            TokenKind::Int(_) => "integer",
            TokenKind::Float(_) => "float",
            TokenKind::Str(_) => "string",
            TokenKind::Color(_) => "color literal",
            TokenKind::Ident(_) => "identifier",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::For => "for",
            TokenKind::To => "to",
            TokenKind::By => "by",
            TokenKind::In => "in",
            TokenKind::While => "while",
            TokenKind::Switch => "switch",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Var => "var",
            TokenKind::Varip => "varip",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Not => "not",
            TokenKind::Import => "import",
            TokenKind::Export => "export",
            TokenKind::As => "as",
            TokenKind::Type => "type",
            TokenKind::Method => "method",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Question => "?",
            TokenKind::Colon => ":",
            TokenKind::FatArrow => "=>",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::Eq => "=",
            TokenKind::ColonEq => ":=",
            TokenKind::PlusEq => "+=",
            TokenKind::MinusEq => "-=",
            TokenKind::StarEq => "*=",
            TokenKind::SlashEq => "/=",
            TokenKind::PercentEq => "%=",
            TokenKind::Newline => "end of line",
            TokenKind::Indent => "indentation",
            TokenKind::Dedent => "end of block",
            TokenKind::Error => "invalid token",
            TokenKind::Eof => "end of file",
        }
    }

    /// Whether a line ending in this token continues onto the next line.
    pub fn continues_line(&self) -> bool {
        matches!(
            self,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Slash
                | TokenKind::Percent
                | TokenKind::EqEq
                | TokenKind::NotEq
                | TokenKind::Lt
                | TokenKind::LtEq
                | TokenKind::Gt
                | TokenKind::GtEq
                | TokenKind::And
                | TokenKind::Or
                | TokenKind::Comma
                | TokenKind::Question
                | TokenKind::Colon
        )
    }

    /// Whether this token is a keyword that may also be read as a name
    /// (reassignment targets such as `true := ...` are reported by the
    /// analyzer rather than rejected by the parser).
    pub fn keyword_as_name(&self) -> Option<&'static str> {
        match self {
            TokenKind::True => Some("true"),
            TokenKind::False => Some("false"),
            TokenKind::Type => Some("type"),
            TokenKind::Method => Some("method"),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int(n) => write!(f, "{n}"),
            TokenKind::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            TokenKind::Str(s) => write!(f, "\"{s}\""),
            TokenKind::Color(c) | TokenKind::Ident(c) => write!(f, "{c}"),
            other => write!(f, "{}", other.display_name()),
        }
    }
}

/// Token stream; the last token is always [`TokenKind::Eof`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenList {
    tokens: Vec<Token>,
}

impl TokenList {
    pub fn new() -> Self {
        TokenList { tokens: Vec::new() }
    }

    #[inline]
    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn last(&self) -> Option<&Token> {
        self.tokens.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &TokenKind> {
        self.tokens.iter().map(|t| &t.kind)
    }
}

impl std::ops::Index<usize> for TokenList {
    type Output = Token;

    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}

impl<'a> IntoIterator for &'a TokenList {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}
