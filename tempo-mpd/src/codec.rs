//! Outbound command encoding and inbound line framing.

use crate::errors::{MpdError, MpdResult};

pub const COMMAND_LIST_BEGIN: &str = "command_list_begin";
pub const COMMAND_LIST_END: &str = "command_list_end";

/// Doubles every backslash in `input`. When `quote` is `'"'` or `'\''` that
/// quote character is escaped as well and the result is wrapped in it. Any
/// other quote character only gets the backslash treatment.
pub fn escape(input: &str, quote: Option<char>) -> String {
    escape_inner(input, quote, true)
}

/// Same escaping as [`escape`] but never wraps the result in quotes.
pub(crate) fn escape_unwrapped(input: &str, quote: Option<char>) -> String {
    escape_inner(input, quote, false)
}

fn escape_inner(input: &str, quote: Option<char>, wrap: bool) -> String {
    let quote = quote.filter(|q| matches!(q, '"' | '\''));
    let wrap_with = quote.filter(|_| wrap);
    // reserve at least the input len + 2 for surrounding quotes
    let mut result = String::with_capacity(input.len() + 2);
    if let Some(q) = wrap_with {
        result.push(q);
    }
    for c in input.chars() {
        if c == '\\' || Some(c) == quote {
            result.push('\\');
        }
        result.push(c);
    }
    if let Some(q) = wrap_with {
        result.push(q);
    }
    result
}

pub(crate) trait StrExt {
    fn quote_and_escape(self) -> String;
}

impl StrExt for &str {
    fn quote_and_escape(self) -> String {
        escape(self, Some('"'))
    }
}

/// Joins commands into the text sent over the wire. More than one command is
/// wrapped into a command list so MPD executes them in a single round trip.
pub fn build_command_line<S: AsRef<str>>(commands: &[S]) -> String {
    let mut buf = String::new();
    let is_list = commands.len() > 1;
    if is_list {
        buf.push_str(COMMAND_LIST_BEGIN);
        buf.push('\n');
    }
    for command in commands {
        buf.push_str(command.as_ref());
        buf.push('\n');
    }
    if is_list {
        buf.push_str(COMMAND_LIST_END);
        buf.push('\n');
    }
    buf
}

/// Removes the first newline terminated line from `buffer` and decodes it.
/// Returns `None` when no complete line is buffered yet.
pub(crate) fn take_line(buffer: &mut Vec<u8>) -> MpdResult<Option<String>> {
    let Some(idx) = buffer.iter().position(|b| *b == b'\n') else {
        return Ok(None);
    };
    let mut line: Vec<u8> = buffer.drain(..=idx).collect();
    line.pop();

    String::from_utf8(line)
        .map(Some)
        .map_err(|err| MpdError::Malformed(format!("Response line is not valid UTF-8: {err}")))
}
