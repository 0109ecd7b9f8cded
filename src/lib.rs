//! # whitespace
//! An interpreter for Whitespace, a stack-based programming language written
//! entirely in spaces, tabs and line feeds.
//! ## Introduction
//! Every other character of a program is a comment, so a Whitespace program can
//! hide between the lines of any text. Programs work on a stack of arbitrary
//! precision integers, a heap addressed by integers and a call stack, and
//! talk to the outside world through a text input and a text output.
//!
//! Running a program happens in three steps:
//! 1. [`parser::parse`] decodes the source into [`ops::Instruction`]s,
//! 2. [`program::Program::new`] resolves the labels (duplicates are rejected here),
//! 3. [`vm::run`] executes the program until it terminates.
//!
//! [`interpret`] does all three at once.
//!
//! ```
//! // push 72; output char; push 105; output char; terminate
//! let source = "   \t  \t   \n\t\n     \t\t \t  \t\n\t\n  \n\n\n";
//! assert_eq!(whitespace::interpret(source, "").unwrap(), "Hi");
//! ```
use thiserror::Error;

pub mod config;
pub mod io;
pub mod ops;
pub mod parser;
pub mod program;
pub mod vm;

#[cfg(test)]
pub(crate) mod test_utils;

use crate::parser::ParserError;
use crate::program::{LoadError, Program, ProgramError};
use crate::vm::{RunError, VMOptions};

/// Any error of decoding, loading or running a program.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] ParserError),
    #[error("Load error: {0}")]
    Load(#[from] LoadError),
    #[error("Runtime error: {0}")]
    Run(#[from] RunError),
}

impl From<ProgramError> for Error {
    fn from(err: ProgramError) -> Self {
        match err {
            ProgramError::Parse(err) => Error::Parse(err),
            ProgramError::Load(err) => Error::Load(err),
        }
    }
}

/// Runs `source` with `input` and returns everything it printed.
pub fn interpret(source: &str, input: &str) -> Result<String, Error> {
    let program = Program::from_source(source)?;
    let result = vm::run(&program, input, VMOptions::default())?;
    Ok(result.output)
}
