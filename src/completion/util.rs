use crate::latex_utils::{is_inside_comment, start_of_line};
use crate::position::Span;

use super::Context;

/// Offset of the current line's start and the text from there to the cursor.
pub fn line_before<'a>(context: &Context<'a>) -> Option<(usize, &'a str)> {
    let start = start_of_line(context.text, context.offset);
    let before = context.text.get(start..context.offset)?;
    Some((start, before))
}

pub fn check_in_comment(context: &Context) -> bool {
    is_inside_comment(context.text, context.offset)
}

/// The key being typed in a comma-separated argument: the text after the
/// last comma, without leading whitespace. `arg_start` is the absolute
/// offset of `arg`.
pub fn last_key(arg: &str, arg_start: usize) -> (Span, &str) {
    let piece_start = arg.rfind(',').map_or(0, |comma| comma + 1);
    let piece = &arg[piece_start..];
    let key = piece.trim_start();
    let start = arg_start + piece_start + (piece.len() - key.len());
    (Span::new(start, key.len()), key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_key() {
        assert_eq!(last_key("a, ke", 10), (Span::new(13, 2), "ke"));
        assert_eq!(last_key("", 4), (Span::new(4, 0), ""));
        assert_eq!(last_key("a,", 0), (Span::new(2, 0), ""));
    }
}
