//! Error recovery: skip to the next statement boundary.

use pine_ir::TokenKind;

use crate::Cursor;

/// Advance past the rest of the current statement.
///
/// Stops after the next `Newline` (also skipping a block indented under
/// the broken line), or before a `Dedent`, `}` or `Eof`.
pub fn synchronize(cursor: &mut Cursor<'_>) {
    loop {
        match cursor.current_kind() {
            TokenKind::Eof | TokenKind::Dedent | TokenKind::RBrace => return,
            TokenKind::Newline => {
                cursor.advance();
                if cursor.check(&TokenKind::Indent) {
                    skip_indented_block(cursor);
                }
                return;
            }
            _ => {
                cursor.advance();
            }
        }
    }
}

/// Skip from an `Indent` to just past its matching `Dedent`.
fn skip_indented_block(cursor: &mut Cursor<'_>) {
    let mut depth = 0usize;
    loop {
        match cursor.current_kind() {
            TokenKind::Eof => return,
            TokenKind::Indent => depth += 1,
            TokenKind::Dedent => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    cursor.advance();
                    return;
                }
            }
            _ => {}
        }
        cursor.advance();
    }
}
