use std::fmt;

/// Codes for every diagnostic the compiler can report.
///
/// The string form ([`ErrorCode::as_str`]) is the stable public name callers
/// match on, e.g. `UNDEFINED_VARIABLE`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Syntax
    /// Character sequence that starts no token
    InvalidToken,
    /// String literal without a closing quote
    UnterminatedString,
    /// Dedent to a width that matches no enclosing block
    InconsistentIndent,
    UnexpectedToken,
    ExpectedExpression,
    UnclosedDelimiter,

    // Semantic
    DuplicateDeclaration,
    UndefinedVariable,
    /// `:=` on a fixed built-in such as `close` or `true`
    ConstReassignment,
    BreakOutsideLoop,
    ContinueOutsideLoop,
    WrongArgumentCount,
    TypeMismatch,

    // Semantic warnings
    NegativeHistoryOffset,
    UnreachableCode,
    DeprecatedDeclaration,

    // Codegen
    /// Construct with no generated counterpart; dropped from the output
    UnsupportedConstruct,
    /// Code generation aborted
    CodegenFailed,
}

/// Pipeline stage a code belongs to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Tier {
    Syntax,
    Semantic,
    Codegen,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidToken => "INVALID_TOKEN",
            ErrorCode::UnterminatedString => "UNTERMINATED_STRING",
            ErrorCode::InconsistentIndent => "INCONSISTENT_INDENT",
            ErrorCode::UnexpectedToken => "UNEXPECTED_TOKEN",
            ErrorCode::ExpectedExpression => "EXPECTED_EXPRESSION",
            ErrorCode::UnclosedDelimiter => "UNCLOSED_DELIMITER",
            ErrorCode::DuplicateDeclaration => "DUPLICATE_DECLARATION",
            ErrorCode::UndefinedVariable => "UNDEFINED_VARIABLE",
            ErrorCode::ConstReassignment => "CONST_REASSIGNMENT",
            ErrorCode::BreakOutsideLoop => "BREAK_OUTSIDE_LOOP",
            ErrorCode::ContinueOutsideLoop => "CONTINUE_OUTSIDE_LOOP",
            ErrorCode::WrongArgumentCount => "WRONG_ARGUMENT_COUNT",
            ErrorCode::TypeMismatch => "TYPE_MISMATCH",
            ErrorCode::NegativeHistoryOffset => "NEGATIVE_HISTORY_OFFSET",
            ErrorCode::UnreachableCode => "UNREACHABLE_CODE",
            ErrorCode::DeprecatedDeclaration => "DEPRECATED_DECLARATION",
            ErrorCode::UnsupportedConstruct => "UNSUPPORTED_CONSTRUCT",
            ErrorCode::CodegenFailed => "CODEGEN_FAILED",
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            ErrorCode::InvalidToken
            | ErrorCode::UnterminatedString
            | ErrorCode::InconsistentIndent
            | ErrorCode::UnexpectedToken
            | ErrorCode::ExpectedExpression
            | ErrorCode::UnclosedDelimiter => Tier::Syntax,
            ErrorCode::DuplicateDeclaration
            | ErrorCode::UndefinedVariable
            | ErrorCode::ConstReassignment
            | ErrorCode::BreakOutsideLoop
            | ErrorCode::ContinueOutsideLoop
            | ErrorCode::WrongArgumentCount
            | ErrorCode::TypeMismatch
            | ErrorCode::NegativeHistoryOffset
            | ErrorCode::UnreachableCode
            | ErrorCode::DeprecatedDeclaration => Tier::Semantic,
            ErrorCode::UnsupportedConstruct | ErrorCode::CodegenFailed => Tier::Codegen,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
