//! Line and token splitting.
//!
//! Both splitters follow `strtok` rules: runs of delimiters never produce
//! empty pieces, and a piece that begins with [`COMMENT_SIGN`] ends the scan,
//! dropping it and everything after it.
//!
//! The pieces borrow from the input, so a token list lives exactly as long as
//! the line buffer it was cut from.

use alloc::vec::Vec;
use core::fmt;

/// Separates commands within a line.
pub const COMMAND_DELIMS: &[char] = &[';', '\n'];

/// Separates tokens within a command.
pub const TOKEN_DELIMS: &[char] = &[' ', '\t'];

/// Starts a comment.
pub const COMMENT_SIGN: char = '#';

/// Splitting errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitError {
    /// The piece list could not grow to hold piece number `at`
    OutOfMemory { at: usize },
}

impl fmt::Display for SplitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitError::OutOfMemory { at } => write!(f, "String division failed at token {}", at),
        }
    }
}

/// Splits `source` on any of `delims`.
pub fn divide<'a>(source: &'a str, delims: &[char]) -> Result<Vec<&'a str>, SplitError> {
    let mut pieces = Vec::new();

    for piece in source.split(|c: char| delims.contains(&c)).filter(|p| !p.is_empty()) {
        if piece.starts_with(COMMENT_SIGN) {
            break;
        }
        pieces
            .try_reserve(1)
            .map_err(|_| SplitError::OutOfMemory { at: pieces.len() + 1 })?;
        pieces.push(piece);
    }

    Ok(pieces)
}

/// Splits one input line into commands.
pub fn split_commands(line: &str) -> Result<Vec<&str>, SplitError> {
    divide(line, COMMAND_DELIMS)
}

/// Splits one command into tokens.
pub fn split_tokens(command: &str) -> Result<Vec<&str>, SplitError> {
    divide(command, TOKEN_DELIMS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_split_on_semicolon_and_newline() {
        assert_eq!(
            split_commands("echo a;echo b\n").unwrap(),
            ["echo a", "echo b"]
        );
        assert_eq!(split_commands(";;echo a;;\n\n").unwrap(), ["echo a"]);
        assert!(split_commands("\n").unwrap().is_empty());
    }

    #[test]
    fn test_tokens_split_on_space_and_tab() {
        assert_eq!(
            split_tokens("  echo\ta \t b  ").unwrap(),
            ["echo", "a", "b"]
        );
        assert!(split_tokens(" \t ").unwrap().is_empty());
    }

    #[test]
    fn test_other_whitespace_is_not_a_delimiter() {
        assert_eq!(split_tokens("a\rb c\r").unwrap(), ["a\rb", "c\r"]);
        assert_eq!(split_commands("a,b").unwrap(), ["a,b"]);
    }

    #[test]
    fn test_comment_ends_line() {
        assert_eq!(split_commands("echo a;# note;echo b\n").unwrap(), ["echo a"]);
        assert!(split_commands("#echo a;echo b").unwrap().is_empty());
    }

    #[test]
    fn test_comment_ends_command() {
        assert_eq!(split_tokens("echo a # b c").unwrap(), ["echo", "a"]);
        assert_eq!(split_tokens("echo a #b").unwrap(), ["echo", "a"]);
        assert!(split_tokens("#").unwrap().is_empty());
    }

    #[test]
    fn test_hash_inside_token_is_kept() {
        assert_eq!(split_tokens("echo a#b").unwrap(), ["echo", "a#b"]);
    }

    #[test]
    fn test_indented_comment_only_ends_its_command() {
        let commands = split_commands("echo a; # note;echo b\n").unwrap();
        assert_eq!(commands, ["echo a", " # note", "echo b"]);
        assert!(split_tokens(commands[1]).unwrap().is_empty());
    }

    #[test]
    fn test_pieces_borrow_from_source() {
        let line = "echo a";
        let tokens = split_tokens(line).unwrap();
        assert!(core::ptr::eq(tokens[1], &line[5..]));
    }
}
