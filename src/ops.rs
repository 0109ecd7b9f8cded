//! The Whitespace instruction set.
use std::fmt;

use num_bigint::BigInt;

/// One of the three significant characters of a Whitespace program.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Symbol {
    Space,
    Tab,
    LineFeed,
}

impl Symbol {
    /// Returns the symbol for `c`, or `None` if `c` is a comment character.
    pub fn from_char(c: char) -> Option<Symbol> {
        match c {
            ' ' => Some(Symbol::Space),
            '\t' => Some(Symbol::Tab),
            '\n' => Some(Symbol::LineFeed),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Symbol::Space => ' ',
            Symbol::Tab => '\t',
            Symbol::LineFeed => '\n',
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Space => write!(f, "S"),
            Symbol::Tab => write!(f, "T"),
            Symbol::LineFeed => write!(f, "L"),
        }
    }
}

/// A jump or call target.
///
/// Labels are identified by their exact sequence of space/tab symbols. They are
/// never converted to numbers, so `SST` and `ST` are different labels even though
/// both would read as the binary number 1.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Label(Vec<Symbol>);

impl Label {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        debug_assert!(!symbols.contains(&Symbol::LineFeed));
        Label(symbols)
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<empty>");
        }
        for symbol in &self.0 {
            write!(f, "{symbol}")?;
        }
        Ok(())
    }
}

/// A single decoded instruction.
///
/// Binary operations pop `a` first, then `b`, and push `b op a`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Instruction {
    // Stack manipulation
    Push(BigInt),
    Duplicate,
    Copy(BigInt),
    Swap,
    Discard,
    Slide(BigInt),
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    // Heap access
    Store,
    Retrieve,
    // Flow control
    Mark(Label),
    Call(Label),
    Jump(Label),
    JumpIfZero(Label),
    JumpIfNegative(Label),
    Return,
    Terminate,
    // I/O
    OutputChar,
    OutputNumber,
    ReadChar,
    ReadNumber,
}

impl Instruction {
    /// The label this instruction jumps to, if it is a call or a jump.
    pub fn target(&self) -> Option<&Label> {
        match self {
            Instruction::Call(label)
            | Instruction::Jump(label)
            | Instruction::JumpIfZero(label)
            | Instruction::JumpIfNegative(label) => Some(label),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Push(n) => write!(f, "push {n}"),
            Instruction::Duplicate => write!(f, "dup"),
            Instruction::Copy(n) => write!(f, "copy {n}"),
            Instruction::Swap => write!(f, "swap"),
            Instruction::Discard => write!(f, "discard"),
            Instruction::Slide(n) => write!(f, "slide {n}"),
            Instruction::Add => write!(f, "add"),
            Instruction::Subtract => write!(f, "sub"),
            Instruction::Multiply => write!(f, "mul"),
            Instruction::Divide => write!(f, "div"),
            Instruction::Modulo => write!(f, "mod"),
            Instruction::Store => write!(f, "store"),
            Instruction::Retrieve => write!(f, "retrieve"),
            Instruction::Mark(label) => write!(f, "label {label}"),
            Instruction::Call(label) => write!(f, "call {label}"),
            Instruction::Jump(label) => write!(f, "jmp {label}"),
            Instruction::JumpIfZero(label) => write!(f, "jz {label}"),
            Instruction::JumpIfNegative(label) => write!(f, "jn {label}"),
            Instruction::Return => write!(f, "ret"),
            Instruction::Terminate => write!(f, "end"),
            Instruction::OutputChar => write!(f, "putc"),
            Instruction::OutputNumber => write!(f, "putn"),
            Instruction::ReadChar => write!(f, "getc"),
            Instruction::ReadNumber => write!(f, "getn"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::Symbol::*;

    #[test]
    fn test_labels_compare_by_symbols() {
        let short = Label::new(vec![Tab]);
        let padded = Label::new(vec![Space, Tab]);
        assert_ne!(short, padded);
        assert_eq!(short, Label::new(vec![Tab]));
        assert_eq!(padded.to_string(), "ST");
        assert_eq!(Label::default().to_string(), "<empty>");
    }

    #[test]
    fn test_display() {
        assert_eq!(Instruction::Push(BigInt::from(-12)).to_string(), "push -12");
        assert_eq!(Instruction::Call(Label::new(vec![Tab, Space])).to_string(), "call TS");
        assert_eq!(Instruction::Terminate.to_string(), "end");
    }

    #[test]
    fn test_target() {
        let label = Label::new(vec![Space]);
        assert_eq!(Instruction::JumpIfZero(label.clone()).target(), Some(&label));
        assert_eq!(Instruction::Mark(label).target(), None);
        assert_eq!(Instruction::Return.target(), None);
    }

    #[test]
    fn test_symbols() {
        assert_eq!(Symbol::from_char('\t'), Some(Tab));
        assert_eq!(Symbol::from_char('x'), None);
        assert_eq!(Symbol::from_char('\r'), None);
        assert_eq!(LineFeed.to_char(), '\n');
    }
}
