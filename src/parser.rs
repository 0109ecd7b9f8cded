//! Decoding of program text into instructions.
//!
//! Only space, tab and line feed are significant; every other character is a
//! comment and is dropped before decoding. Offsets in errors and spans count
//! significant symbols only.
use std::ops::Range;

use num_bigint::BigInt;
use num_traits::Zero;
use thiserror::Error;

use crate::ops::{Instruction, Label, Symbol};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParserError {
    #[error("Unexpected end of program in {context} starting at symbol {offset}.")]
    UnexpectedEnd { context: &'static str, offset: usize },
    #[error("Unknown {context} command `{found}` at symbol {offset}.")]
    InvalidCommand { context: &'static str, found: String, offset: usize },
    #[error("Number at symbol {offset} has no sign.")]
    MissingSign { offset: usize },
}

/// Returns the significant symbols of `source`.
pub fn symbols(source: &str) -> impl Iterator<Item = Symbol> + '_ {
    source.chars().filter_map(Symbol::from_char)
}

/// Decodes `source` into a sequence of instructions.
pub fn parse(source: &str) -> Result<Vec<Instruction>, ParserError> {
    Ok(parse_spanned(source)?.into_iter().map(|(instruction, _)| instruction).collect())
}

/// Decodes `source`, keeping the range of symbols each instruction was decoded from.
pub fn parse_spanned(source: &str) -> Result<Vec<(Instruction, Range<usize>)>, ParserError> {
    let mut decoder = Decoder { symbols: symbols(source).collect(), pos: 0 };
    let mut result = Vec::new();
    while decoder.pos < decoder.symbols.len() {
        let start = decoder.pos;
        let instruction = decoder.instruction()?;
        result.push((instruction, start..decoder.pos));
    }
    Ok(result)
}

struct Decoder {
    symbols: Vec<Symbol>,
    pos: usize,
}

impl Decoder {
    fn next(&mut self, context: &'static str, start: usize) -> Result<Symbol, ParserError> {
        let symbol = self
            .symbols
            .get(self.pos)
            .copied()
            .ok_or(ParserError::UnexpectedEnd { context, offset: start })?;
        self.pos += 1;
        Ok(symbol)
    }

    fn invalid(&self, context: &'static str, start: usize) -> ParserError {
        ParserError::InvalidCommand {
            context,
            found: self.symbols[start..self.pos].iter().map(|s| s.to_string()).collect(),
            offset: start,
        }
    }

    fn instruction(&mut self) -> Result<Instruction, ParserError> {
        use Symbol::*;

        let start = self.pos;
        match self.next("instruction", start)? {
            Space => self.stack(start),
            LineFeed => self.flow(start),
            Tab => match self.next("instruction", start)? {
                Space => self.arithmetic(start),
                Tab => self.heap(start),
                LineFeed => self.io(start),
            },
        }
    }

    fn stack(&mut self, start: usize) -> Result<Instruction, ParserError> {
        use Symbol::*;

        const CONTEXT: &str = "stack";
        Ok(match self.next(CONTEXT, start)? {
            Space => Instruction::Push(self.number()?),
            LineFeed => match self.next(CONTEXT, start)? {
                Space => Instruction::Duplicate,
                Tab => Instruction::Swap,
                LineFeed => Instruction::Discard,
            },
            Tab => match self.next(CONTEXT, start)? {
                Space => Instruction::Copy(self.number()?),
                LineFeed => Instruction::Slide(self.number()?),
                Tab => return Err(self.invalid(CONTEXT, start)),
            },
        })
    }

    fn arithmetic(&mut self, start: usize) -> Result<Instruction, ParserError> {
        use Symbol::*;

        const CONTEXT: &str = "arithmetic";
        Ok(match self.next(CONTEXT, start)? {
            Space => match self.next(CONTEXT, start)? {
                Space => Instruction::Add,
                Tab => Instruction::Subtract,
                LineFeed => Instruction::Multiply,
            },
            Tab => match self.next(CONTEXT, start)? {
                Space => Instruction::Divide,
                Tab => Instruction::Modulo,
                LineFeed => return Err(self.invalid(CONTEXT, start)),
            },
            LineFeed => return Err(self.invalid(CONTEXT, start)),
        })
    }

    fn heap(&mut self, start: usize) -> Result<Instruction, ParserError> {
        const CONTEXT: &str = "heap";
        Ok(match self.next(CONTEXT, start)? {
            Symbol::Space => Instruction::Store,
            Symbol::Tab => Instruction::Retrieve,
            Symbol::LineFeed => return Err(self.invalid(CONTEXT, start)),
        })
    }

    fn io(&mut self, start: usize) -> Result<Instruction, ParserError> {
        use Symbol::*;

        const CONTEXT: &str = "I/O";
        Ok(match self.next(CONTEXT, start)? {
            Space => match self.next(CONTEXT, start)? {
                Space => Instruction::OutputChar,
                Tab => Instruction::OutputNumber,
                LineFeed => return Err(self.invalid(CONTEXT, start)),
            },
            Tab => match self.next(CONTEXT, start)? {
                Space => Instruction::ReadChar,
                Tab => Instruction::ReadNumber,
                LineFeed => return Err(self.invalid(CONTEXT, start)),
            },
            LineFeed => return Err(self.invalid(CONTEXT, start)),
        })
    }

    fn flow(&mut self, start: usize) -> Result<Instruction, ParserError> {
        use Symbol::*;

        const CONTEXT: &str = "flow control";
        Ok(match self.next(CONTEXT, start)? {
            Space => match self.next(CONTEXT, start)? {
                Space => Instruction::Mark(self.label()?),
                Tab => Instruction::Call(self.label()?),
                LineFeed => Instruction::Jump(self.label()?),
            },
            Tab => match self.next(CONTEXT, start)? {
                Space => Instruction::JumpIfZero(self.label()?),
                Tab => Instruction::JumpIfNegative(self.label()?),
                LineFeed => Instruction::Return,
            },
            LineFeed => match self.next(CONTEXT, start)? {
                LineFeed => Instruction::Terminate,
                _ => return Err(self.invalid(CONTEXT, start)),
            },
        })
    }

    /// Sign symbol, binary digits (most significant first), line feed.
    fn number(&mut self) -> Result<BigInt, ParserError> {
        const CONTEXT: &str = "number";
        let start = self.pos;
        let negative = match self.next(CONTEXT, start)? {
            Symbol::Space => false,
            Symbol::Tab => true,
            Symbol::LineFeed => return Err(ParserError::MissingSign { offset: start }),
        };

        let mut value = BigInt::zero();
        loop {
            match self.next(CONTEXT, start)? {
                Symbol::Space => value = value * 2u32,
                Symbol::Tab => value = value * 2u32 + 1u32,
                Symbol::LineFeed => break,
            }
        }
        Ok(if negative { -value } else { value })
    }

    fn label(&mut self) -> Result<Label, ParserError> {
        let start = self.pos;
        let mut symbols = Vec::new();
        loop {
            match self.next("label", start)? {
                Symbol::LineFeed => break,
                symbol => symbols.push(symbol),
            }
        }
        Ok(Label::new(symbols))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use crate::ops::Symbol::*;

    fn parse_one(notation: &str) -> Instruction {
        let ops = parse(&ws(notation)).unwrap();
        assert_eq!(ops.len(), 1, "{notation} decoded to {ops:?}");
        ops.into_iter().next().unwrap()
    }

    #[test]
    fn test_empty() {
        assert_eq!(parse(""), Ok(vec![]));
        assert_eq!(parse("only_comments_here"), Ok(vec![]));
    }

    #[test]
    fn test_full_opcode_table() {
        assert_eq!(parse_one("SSSTSTL"), Instruction::Push(BigInt::from(5)));
        assert_eq!(parse_one(DUP), Instruction::Duplicate);
        assert_eq!(parse_one("STSSTL"), Instruction::Copy(BigInt::from(1)));
        assert_eq!(parse_one(SWAP), Instruction::Swap);
        assert_eq!(parse_one(DISCARD), Instruction::Discard);
        assert_eq!(parse_one("STLSTSL"), Instruction::Slide(BigInt::from(2)));
        assert_eq!(parse_one(ADD), Instruction::Add);
        assert_eq!(parse_one(SUB), Instruction::Subtract);
        assert_eq!(parse_one(MUL), Instruction::Multiply);
        assert_eq!(parse_one(DIV), Instruction::Divide);
        assert_eq!(parse_one(MOD), Instruction::Modulo);
        assert_eq!(parse_one(STORE), Instruction::Store);
        assert_eq!(parse_one(RETRIEVE), Instruction::Retrieve);
        assert_eq!(parse_one("LSSTSL"), Instruction::Mark(Label::new(vec![Tab, Space])));
        assert_eq!(parse_one("LSTTSL"), Instruction::Call(Label::new(vec![Tab, Space])));
        assert_eq!(parse_one("LSLTSL"), Instruction::Jump(Label::new(vec![Tab, Space])));
        assert_eq!(parse_one("LTSTSL"), Instruction::JumpIfZero(Label::new(vec![Tab, Space])));
        assert_eq!(parse_one("LTTTSL"), Instruction::JumpIfNegative(Label::new(vec![Tab, Space])));
        assert_eq!(parse_one(RET), Instruction::Return);
        assert_eq!(parse_one(END), Instruction::Terminate);
        assert_eq!(parse_one(PUTC), Instruction::OutputChar);
        assert_eq!(parse_one(PUTN), Instruction::OutputNumber);
        assert_eq!(parse_one(GETC), Instruction::ReadChar);
        assert_eq!(parse_one(GETN), Instruction::ReadNumber);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse_one(&push(0)), Instruction::Push(BigInt::from(0)));
        assert_eq!(parse_one("SSSL"), Instruction::Push(BigInt::from(0)));
        assert_eq!(parse_one("SSTL"), Instruction::Push(BigInt::from(0)));
        assert_eq!(parse_one("SSSSSSTL"), Instruction::Push(BigInt::from(1)));
        assert_eq!(parse_one(&push(-7)), Instruction::Push(BigInt::from(-7)));
        assert_eq!(parse_one(&push(i64::MIN)), Instruction::Push(BigInt::from(i64::MIN)));

        // 2^100 does not fit in any machine integer
        let big = format!("SSS{}L", "T".to_string() + &"S".repeat(100));
        assert_eq!(parse_one(&big), Instruction::Push(BigInt::from(1) << 100usize));
    }

    #[test]
    fn test_labels_are_kept_verbatim() {
        assert_eq!(parse_one("LSSL"), Instruction::Mark(Label::default()));
        assert_eq!(parse_one("LSSSSTL"), Instruction::Mark(Label::new(vec![Space, Space, Tab])));
        assert_ne!(parse_one("LSSSTL"), parse_one("LSSTL"));
    }

    #[test]
    fn test_comments_are_ignored() {
        let source = "push   five\t \t\ndone";
        let ops = parse(source).unwrap();
        assert_eq!(ops, vec![Instruction::Push(BigInt::from(5))]);
        assert_eq!(parse(&format!("a{}b", ws(END))).unwrap(), vec![Instruction::Terminate]);
        // carriage returns are comments too
        assert_eq!(parse("\n\r\n\r\n").unwrap(), vec![Instruction::Terminate]);
    }

    #[test]
    fn test_sequence_and_spans() {
        let source = program(&[push(1), mark("T"), jz("T"), END.to_string()]);
        let ops = parse_spanned(&source).unwrap();
        let spans: Vec<_> = ops.iter().map(|(_, span)| span.clone()).collect();
        assert_eq!(spans, vec![0..5, 5..10, 10..15, 15..18]);
        assert_eq!(ops[2].0, Instruction::JumpIfZero(Label::new(vec![Tab])));
    }

    #[test]
    fn test_invalid_commands() {
        assert!(matches!(parse(&ws("STT")), Err(ParserError::InvalidCommand { context: "stack", offset: 0, .. })));
        assert!(matches!(parse(&ws("TSTL")), Err(ParserError::InvalidCommand { context: "arithmetic", .. })));
        assert!(matches!(parse(&ws("TTL")), Err(ParserError::InvalidCommand { context: "heap", .. })));
        assert!(matches!(parse(&ws("TLLS")), Err(ParserError::InvalidCommand { context: "I/O", .. })));
        assert!(matches!(parse(&ws("LLS")), Err(ParserError::InvalidCommand { context: "flow control", .. })));
        assert!(matches!(parse(&ws("LTSL LLT")), Err(ParserError::InvalidCommand { context: "flow control", .. })));

        let err = parse(&ws("SLS LLT")).unwrap_err();
        assert_eq!(err, ParserError::InvalidCommand { context: "flow control", found: "LLT".to_string(), offset: 3 });
    }

    #[test]
    fn test_invalid_first_sub_symbol() {
        // The sub-code is already unknown after its first symbol, so nothing more is read.
        assert_eq!(
            parse(&ws("TSL")),
            Err(ParserError::InvalidCommand { context: "arithmetic", found: "TSL".to_string(), offset: 0 })
        );
        assert_eq!(
            parse(&ws("SSSL TLL")),
            Err(ParserError::InvalidCommand { context: "I/O", found: "TLL".to_string(), offset: 4 })
        );
        assert_eq!(
            parse(&ws("TLSL")),
            Err(ParserError::InvalidCommand { context: "I/O", found: "TLSL".to_string(), offset: 0 })
        );
        assert!(matches!(parse(&ws("TS")), Err(ParserError::UnexpectedEnd { context: "arithmetic", offset: 0 })));
    }

    #[test]
    fn test_unexpected_end() {
        assert!(matches!(parse(&ws("S")), Err(ParserError::UnexpectedEnd { context: "stack", .. })));
        assert!(matches!(parse(&ws("T")), Err(ParserError::UnexpectedEnd { context: "instruction", .. })));
        assert!(matches!(parse(&ws("SSSTT")), Err(ParserError::UnexpectedEnd { context: "number", offset: 2 })));
        assert!(matches!(parse(&ws("LSSTT")), Err(ParserError::UnexpectedEnd { context: "label", offset: 3 })));
        assert!(matches!(parse(&ws("LLLL")), Err(ParserError::UnexpectedEnd { context: "flow control", offset: 3 })));
    }

    #[test]
    fn test_missing_sign() {
        assert_eq!(parse(&ws("SSL")), Err(ParserError::MissingSign { offset: 2 }));
    }
}
