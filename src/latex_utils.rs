//! Escape, comment and command helpers for raw LaTeX buffers.
//!
//! All offsets are byte offsets. Out-of-range indices are clamped to the
//! buffer instead of failing.

use crate::position::Span;
use crate::scanner::Side;

/// True if the character at `index` is preceded by an odd number of
/// backslashes.
pub fn is_escaped(input: &str, index: usize) -> bool {
    let bytes = input.as_bytes();
    let index = index.min(bytes.len());
    let backslashes = bytes[..index]
        .iter()
        .rev()
        .take_while(|b| **b == b'\\')
        .count();
    backslashes % 2 == 1
}

/// Offset of the first character on the line containing `index`.
pub fn start_of_line(input: &str, index: usize) -> usize {
    let index = index.min(input.len());
    input.as_bytes()[..index]
        .iter()
        .rposition(|b| *b == b'\n' || *b == b'\r')
        .map_or(0, |newline| newline + 1)
}

/// True if an unescaped `%` occurs on the same line before `index`.
pub fn is_inside_comment(input: &str, index: usize) -> bool {
    let bytes = input.as_bytes();
    let index = index.min(bytes.len());
    let mut p = start_of_line(input, index);
    while p < index {
        match bytes[p] {
            b'%' => return true,
            // skips the escaped character
            b'\\' => p += 2,
            _ => p += 1,
        }
    }
    false
}

fn is_command_at(input: &str, command: &str, index: usize) -> bool {
    if is_escaped(input, index) {
        return false;
    }
    let next = input.as_bytes().get(index + command.len());
    if next.is_some_and(|b| b.is_ascii_alphabetic()) {
        return false;
    }
    !is_inside_comment(input, index)
}

/// Finds the next occurrence of `command` (e.g. `\label`) at or after
/// `from` that is neither escaped, commented out nor a prefix of a longer
/// command name.
pub fn find_command(input: &str, command: &str, from: usize) -> Option<usize> {
    let mut pos = from;
    while let Some(found) = input.get(pos..).and_then(|rest| rest.find(command)) {
        let candidate = pos + found;
        if is_command_at(input, command, candidate) {
            return Some(candidate);
        }
        pos = candidate + command.len();
    }
    None
}

/// Like [`find_command`] but searching backward from `from` (inclusive).
pub fn find_last_command(input: &str, command: &str, from: usize) -> Option<usize> {
    let mut limit = (from + command.len()).min(input.len());
    while let Some(candidate) = input.get(..limit).and_then(|head| head.rfind(command)) {
        if is_command_at(input, command, candidate) {
            return Some(candidate);
        }
        limit = candidate + command.len() - 1;
    }
    None
}

/// Finds the peer of the character at `offset`.
///
/// `direction` is [`Side::Right`] to scan forward and [`Side::Left`] to
/// scan backward. `opening` is the character at `offset`, `closing` the one
/// being looked for; escaped or commented characters are ignored.
pub fn find_peer_char(
    input: &str,
    offset: usize,
    direction: Side,
    opening: u8,
    closing: u8,
) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut stack = 1usize;
    let mut index = offset;
    loop {
        index = match direction {
            Side::Right => index + 1,
            Side::Left => index.checked_sub(1)?,
        };
        let c = *bytes.get(index)?;
        if c != opening && c != closing {
            continue;
        }
        if is_escaped(input, index) || is_inside_comment(input, index) {
            continue;
        }
        if c == closing {
            stack -= 1;
            if stack == 0 {
                return Some(index);
            }
        } else {
            stack += 1;
        }
    }
}

/// Region of the first `{...}` argument of the command at `index`, without
/// the braces. Only whitespace may separate the command name and the brace.
pub fn command_argument(input: &str, index: usize) -> Option<Span> {
    let bytes = input.as_bytes();
    let mut pos = index;
    if bytes.get(pos) == Some(&b'\\') {
        pos += 1;
    }
    while bytes.get(pos).is_some_and(|b| b.is_ascii_alphabetic()) {
        pos += 1;
    }
    while bytes.get(pos).is_some_and(|b| b.is_ascii_whitespace()) {
        pos += 1;
    }
    if bytes.get(pos) != Some(&b'{') {
        return None;
    }
    let end = find_peer_char(input, pos, Side::Right, b'{', b'}')?;
    Some(Span::new(pos + 1, end - pos - 1))
}

/// Region of the command name (`\name`) that `index` belongs to.
///
/// `index` may sit on the command itself or inside its first argument.
/// Returns `None` inside comments, for escaped backslashes, and when a
/// non-whitespace character separates the name from the argument.
pub fn command_at(input: &str, index: usize) -> Option<Span> {
    let bytes = input.as_bytes();
    if bytes.is_empty() {
        return None;
    }
    let mut pos = index.min(bytes.len() - 1);
    if is_inside_comment(input, pos) {
        return None;
    }

    if pos > 0 && bytes[pos] == b'}' {
        pos -= 1;
    }
    let mut whitespace = false;
    while !((pos == 0 || matches!(bytes[pos], b'\\' | b'{' | b'}' | b'%'))
        && !is_escaped(input, pos))
    {
        if bytes[pos].is_ascii_whitespace() {
            whitespace = true;
        }
        pos -= 1;
    }

    match bytes[pos] {
        b'\\' if !whitespace => {
            let letters = bytes[pos + 1..]
                .iter()
                .take_while(|b| b.is_ascii_alphabetic())
                .count();
            (letters > 0).then(|| Span::new(pos, letters + 1))
        }
        b'{' if pos > 0 => {
            let mut name_end = pos;
            while name_end > 0 && bytes[name_end - 1].is_ascii_whitespace() {
                name_end -= 1;
            }
            let mut start = name_end;
            while start > 0 && bytes[start - 1].is_ascii_alphabetic() {
                start -= 1;
            }
            let backslash = start.checked_sub(1)?;
            if bytes[backslash] == b'\\' && !is_escaped(input, backslash) {
                Some(Span::new(backslash, name_end - backslash))
            } else {
                None
            }
        }
        _ => None,
    }
}

fn environment_at(input: &str, env: &str, command: &str, start: usize) -> Option<Span> {
    let after = start + command.len();
    let rest = input.get(after..)?;
    let trimmed = rest.trim_start();
    let braced = format!("{{{}}}", env);
    if !trimmed.starts_with(&braced) {
        return None;
    }
    let end = after + (rest.len() - trimmed.len()) + braced.len();
    Some(Span::new(start, end - start))
}

fn find_environment(input: &str, env: &str, command: &str, from: usize) -> Option<Span> {
    let mut pos = from;
    while let Some(start) = find_command(input, command, pos) {
        if let Some(found) = environment_at(input, env, command, start) {
            return Some(found);
        }
        pos = start + command.len();
    }
    None
}

/// Next `\begin{env}` starting at or after `from`.
pub fn find_begin_environment(input: &str, env: &str, from: usize) -> Option<Span> {
    find_environment(input, env, "\\begin", from)
}

/// Next `\end{env}` starting at or after `from`.
pub fn find_end_environment(input: &str, env: &str, from: usize) -> Option<Span> {
    find_environment(input, env, "\\end", from)
}

/// Every `\begin{env}` (true) and `\end{env}` (false) in document order.
fn environment_marks(input: &str, env: &str) -> Vec<(Span, bool)> {
    let mut marks = Vec::new();
    for (command, is_begin) in [("\\begin", true), ("\\end", false)] {
        let mut pos = 0;
        while let Some(found) = find_environment(input, env, command, pos) {
            marks.push((found, is_begin));
            pos = found.end();
        }
    }
    marks.sort_by_key(|(span, _)| span.offset);
    marks
}

/// The `\end{env}` closing the environment opened at `begin_index`.
///
/// Only markers starting after `begin_index` are considered, so nested
/// environments of the same name are skipped.
pub fn find_matching_end_environment(input: &str, env: &str, begin_index: usize) -> Option<Span> {
    let mut level = 0usize;
    for (span, is_begin) in environment_marks(input, env) {
        if span.offset <= begin_index {
            continue;
        }
        if is_begin {
            level += 1;
        } else if level == 0 {
            return Some(span);
        } else {
            level -= 1;
        }
    }
    None
}

/// The `\begin{env}` opening the environment closed at `end_index`.
pub fn find_matching_begin_environment(
    input: &str,
    env: &str,
    end_index: usize,
) -> Option<Span> {
    let mut level = 0usize;
    for (span, is_begin) in environment_marks(input, env).into_iter().rev() {
        if span.end() > end_index {
            continue;
        }
        if !is_begin {
            level += 1;
        } else if level == 0 {
            return Some(span);
        } else {
            level -= 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_of_line() {
        assert_eq!(start_of_line("test", 2), 0);
        assert_eq!(start_of_line("prev \rtest", 8), 6);
        assert_eq!(start_of_line("prev \ntest", 8), 6);
        assert_eq!(start_of_line("prev \r\ntest", 8), 7);
    }

    #[test]
    fn test_is_inside_comment() {
        let text = "% Comment %";
        assert!(!is_inside_comment(text, 0));
        for i in 1..text.len() {
            assert!(is_inside_comment(text, i), "offset {} should be commented", i);
        }

        let text = "No % Comment ";
        for i in 0..4 {
            assert!(!is_inside_comment(text, i));
        }
        for i in 4..text.len() {
            assert!(is_inside_comment(text, i));
        }

        let text = "No %\n Comment ";
        for i in 5..text.len() {
            assert!(!is_inside_comment(text, i));
        }

        let text = "\\% No Comment";
        for i in 0..4 {
            assert!(!is_inside_comment(text, i));
        }

        for i in 3..6 {
            assert!(is_inside_comment("\\%% Comment", i));
        }
        for i in 3..5 {
            assert!(is_inside_comment("\\\\% Comment", i));
        }
    }

    #[test]
    fn test_is_escaped() {
        assert!(is_escaped("\\%", 1));
        assert!(!is_escaped("\\\\%", 2));
        assert!(!is_escaped("%", 0));
    }

    #[test]
    fn test_find_command() {
        assert_eq!(find_command("\\test", "\\test", 0), Some(0));
        assert_eq!(find_command("\\test", "\\test", 1), None);
        assert_eq!(find_command("\\testt", "\\test", 0), None);
        assert_eq!(find_command("\\test1", "\\test", 0), Some(0));
        assert_eq!(find_command("\\test{arg1}", "\\test", 0), Some(0));
        assert_eq!(find_command("% \\test", "\\test", 0), None);
        assert_eq!(find_command("\\testt \\test", "\\test", 0), Some(7));
    }

    #[test]
    fn test_find_last_command() {
        let text = "\\end{a} \\end{b} \\endx";
        assert_eq!(find_last_command(text, "\\end", text.len()), Some(8));
        assert_eq!(find_last_command(text, "\\end", 7), Some(0));
    }

    #[test]
    fn test_find_peer_char() {
        assert_eq!(find_peer_char("{aa}", 0, Side::Right, b'{', b'}'), Some(3));
        assert_eq!(find_peer_char("{aa}", 3, Side::Left, b'}', b'{'), Some(0));

        let text = "{{}}";
        assert_eq!(find_peer_char(text, 0, Side::Right, b'{', b'}'), Some(3));
        assert_eq!(find_peer_char(text, 1, Side::Right, b'{', b'}'), Some(2));
        assert_eq!(find_peer_char(text, 3, Side::Left, b'}', b'{'), Some(0));
        assert_eq!(find_peer_char(text, 2, Side::Left, b'}', b'{'), Some(1));

        assert_eq!(find_peer_char("{\\}", 0, Side::Right, b'{', b'}'), None);
        assert_eq!(find_peer_char("{%}", 0, Side::Right, b'{', b'}'), None);
    }

    #[test]
    fn test_command_argument() {
        assert_eq!(command_argument("\\test", 1), None);
        assert_eq!(command_argument("\\test{arg}", 1), Some(Span::new(6, 3)));
        assert_eq!(command_argument("\\test  {arg}", 1), Some(Span::new(8, 3)));
        assert_eq!(command_argument("\\test  a{arg}", 1), None);
        assert_eq!(command_argument("\\test{}", 0), Some(Span::new(6, 0)));
    }

    #[test]
    fn test_command_at() {
        let whole = Some(Span::new(0, 5));
        let text = "\\test{arg}";
        assert_eq!(command_at(text, 0), whole);
        assert_eq!(command_at(text, 5), whole);
        assert_eq!(command_at(text, 6), whole);
        assert_eq!(command_at(text, 102), whole);

        let text = " \\test{arg} ";
        assert_eq!(command_at(text, 0), None);
        assert_eq!(command_at(text, 5), Some(Span::new(1, 5)));
        assert_eq!(command_at(text, 6), Some(Span::new(1, 5)));
        assert_eq!(command_at(text, 102), None);

        let text = "\\test  \r   {arg}";
        assert_eq!(command_at(text, 0), whole);
        assert_eq!(command_at(text, 13), whole);

        assert_eq!(command_at("\\test  u   {arg}", 12), None);
        assert_eq!(command_at("\\test{arg1}{arg2}", 12), None);
        assert_eq!(command_at("\\test a", 6), None);
        assert_eq!(command_at("% \\test", 4), None);
        assert_eq!(command_at("\\\\test", 4), None);
        assert_eq!(command_at("", 0), None);
    }

    #[test]
    fn test_find_matching_end_environment() {
        let text = " \\begin{a}\\end{a}";
        let end = Some(Span::new(10, 7));
        assert_eq!(find_matching_end_environment(text, "a", 0), None);
        for i in 1..10 {
            assert_eq!(find_matching_end_environment(text, "a", i), end, "from {}", i);
        }
        for i in 10..text.len() {
            assert_eq!(find_matching_end_environment(text, "a", i), None);
        }

        let text = "\\begin{a}\\begin{a}\\end{a}\\end{a}";
        assert_eq!(
            find_matching_end_environment(text, "a", 2),
            Some(Span::new(25, 7))
        );

        let text = "\\begin{a}\\begin{a}\\end{a}%\\end{a}";
        assert_eq!(find_matching_end_environment(text, "a", 0), None);

        assert_eq!(
            find_matching_end_environment("\\begin{a}\\end{b}{a}", "a", 0),
            None
        );
    }

    #[test]
    fn test_find_matching_begin_environment() {
        let text = "\\begin{a}\\begin{a}\\end{a}\\end{a}";
        assert_eq!(
            find_matching_begin_environment(text, "a", 25),
            Some(Span::new(0, 9))
        );
        assert_eq!(
            find_matching_begin_environment(text, "a", 18),
            Some(Span::new(9, 9))
        );
        assert_eq!(find_matching_begin_environment("\\end{a}", "a", 0), None);
    }

    #[test]
    fn test_environment_allows_whitespace_before_name() {
        let text = "\\begin {itemize} x \\end  {itemize}";
        assert_eq!(
            find_begin_environment(text, "itemize", 0),
            Some(Span::new(0, 16))
        );
        assert_eq!(
            find_end_environment(text, "itemize", 0),
            Some(Span::new(19, 15))
        );
    }
}
