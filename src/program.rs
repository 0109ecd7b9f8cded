//! Decoded programs and their label tables.
use std::ops::Range;

use rustc_hash::FxHashMap as HashMap;
use thiserror::Error;
use tracing::debug;

use crate::ops::{Instruction, Label};
use crate::parser::{self, ParserError};

/// An error found while resolving the labels of a program.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Label {label} is defined twice (instructions {first} and {second}).")]
    DuplicateLabel { label: Label, first: usize, second: usize },
}

/// An error from building a [`Program`] directly out of source text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProgramError {
    #[error(transparent)]
    Parse(#[from] ParserError),
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// A decoded program with its resolved label table.
#[derive(Debug, Clone)]
pub struct Program {
    instructions: Vec<Instruction>,
    /// Symbol range of each instruction; empty if built without source.
    spans: Vec<Range<usize>>,
    /// Index of the instruction right after each label's definition.
    labels: HashMap<Label, usize>,
}

impl Program {
    /// Resolves the labels of `instructions`.
    ///
    /// Fails if any label is marked twice, before anything is executed.
    pub fn new(instructions: Vec<Instruction>) -> Result<Self, LoadError> {
        let labels = resolve_labels(&instructions)?;
        debug!(instructions = instructions.len(), labels = labels.len(), "program loaded");
        Ok(Program { instructions, spans: Vec::new(), labels })
    }

    /// Decodes and loads `source`.
    pub fn from_source(source: &str) -> Result<Self, ProgramError> {
        let (instructions, spans): (Vec<_>, Vec<_>) = parser::parse_spanned(source)?.into_iter().unzip();
        let mut program = Program::new(instructions)?;
        program.spans = spans;
        Ok(program)
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The instruction index a jump to `label` continues at.
    pub fn target(&self, label: &Label) -> Option<usize> {
        self.labels.get(label).copied()
    }

    /// The range of significant source symbols instruction `index` was decoded from.
    pub fn span(&self, index: usize) -> Option<Range<usize>> {
        self.spans.get(index).cloned()
    }

    pub fn labels(&self) -> impl Iterator<Item = (&Label, usize)> {
        self.labels.iter().map(|(label, &target)| (label, target))
    }
}

fn resolve_labels(instructions: &[Instruction]) -> Result<HashMap<Label, usize>, LoadError> {
    let mut labels: HashMap<Label, usize> = HashMap::default();
    for (index, instruction) in instructions.iter().enumerate() {
        if let Instruction::Mark(label) = instruction {
            if let Some(&target) = labels.get(label) {
                return Err(LoadError::DuplicateLabel { label: label.clone(), first: target - 1, second: index });
            }
            labels.insert(label.clone(), index + 1);
        }
    }
    Ok(labels)
}
