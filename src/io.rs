//! Input cursor and output buffer used by the I/O instructions.
use std::str::FromStr;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::vm::OperationError;

/// Sequential reader over the program input.
#[derive(Debug, Clone)]
pub struct Input<'a> {
    text: &'a str,
    cursor: usize,
}

impl<'a> Input<'a> {
    pub fn new(text: &'a str) -> Self {
        Input { text, cursor: 0 }
    }

    /// Byte offset of the next unread character.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> &'a str {
        &self.text[self.cursor..]
    }

    pub fn read_char(&mut self) -> Result<char, OperationError> {
        let c = self.remaining().chars().next().ok_or(OperationError::InputExhausted)?;
        self.cursor += c.len_utf8();
        Ok(c)
    }

    /// Consumes everything up to and including the next line feed and returns the
    /// text before it. The last line does not need a line feed.
    pub fn read_line(&mut self) -> Result<&'a str, OperationError> {
        let remaining = self.remaining();
        if remaining.is_empty() {
            return Err(OperationError::InputExhausted);
        }
        match remaining.find('\n') {
            Some(end) => {
                self.cursor += end + 1;
                Ok(&remaining[..end])
            }
            None => {
                self.cursor = self.text.len();
                Ok(remaining)
            }
        }
    }

    /// Reads one line and parses it as a decimal integer.
    pub fn read_number(&mut self) -> Result<BigInt, OperationError> {
        let line = self.read_line()?;
        BigInt::from_str(line.trim()).map_err(|_| OperationError::InvalidNumber { text: line.to_string() })
    }
}

/// Append-only program output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    buffer: String,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn into_string(self) -> String {
        self.buffer
    }

    /// Writes the character with code point `value`.
    pub fn write_char(&mut self, value: &BigInt) -> Result<(), OperationError> {
        let c = value
            .to_u32()
            .and_then(char::from_u32)
            .ok_or_else(|| OperationError::InvalidCharacter { value: value.clone() })?;
        self.buffer.push(c);
        Ok(())
    }

    pub fn write_number(&mut self, value: &BigInt) {
        self.buffer.push_str(&value.to_str_radix(10));
    }
}
