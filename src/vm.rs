//! Functions for executing Whitespace programs.
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};
use rustc_hash::FxHashMap as HashMap;
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    config::get_config,
    io::{Input, Output},
    ops::{Instruction, Label},
    program::Program,
};


/// An implementation of [`Tracer`] that does not track anything.
///
/// This is the best choice if you do not need to observe the program while it
/// is executed.
#[derive(Default, Debug, Clone, Copy)]
pub struct NoStats {}

impl Tracer for NoStats {
    #[inline(always)]
    fn instruction(&mut self, _ip: usize, _instruction: &Instruction, _: &Result<Effect, OperationError>) {}
    #[inline(always)]
    fn should_continue(&mut self, _ip: usize, _instruction: &Instruction) -> bool { true }
}

/// A hook for observing execution.
///
/// You can implement this trait to collect any statistics you need.
pub trait Tracer {
    /// Called after every executed instruction with its outcome.
    fn instruction(&mut self, ip: usize, instruction: &Instruction, result: &Result<Effect, OperationError>);
    /// Called before every instruction; returning `false` stops the run with
    /// [`RunError::Interrupted`].
    fn should_continue(&mut self, ip: usize, instruction: &Instruction) -> bool;
}

/// An error that can occur during the execution of a single instruction.
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperationError {
    #[error("Not enough elements on the stack: {stack_len} elements, {required} required")]
    StackUnderflow { required: usize, stack_len: usize },
    #[error("Adding to a full stack")]
    PushFailed,
    #[error("Copy depth {depth} is out of range for a stack of {stack_len} elements")]
    CopyOutOfRange { depth: BigInt, stack_len: usize },
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Reading heap address {address} which was never written")]
    UnknownHeapAddress { address: BigInt },
    #[error("Label {label} is not defined")]
    UndefinedLabel { label: Label },
    #[error("Returning with an empty call stack")]
    CallStackUnderflow,
    #[error("No input left to read")]
    InputExhausted,
    #[error("Input `{text}` is not a valid integer")]
    InvalidNumber { text: String },
    #[error("{value} is not a valid character code")]
    InvalidCharacter { value: BigInt },
}

/// How an instruction moves the instruction pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Continue with the next instruction.
    None,
    SetInstructionPointer(usize),
    /// Save the index of the next instruction on the call stack, then jump.
    SaveAndSetInstructionPointer(usize),
    Terminate,
}

/// Options for the Whitespace virtual machine.
#[derive(Debug, Clone)]
pub struct VMOptions {
    /// The maximum size of the value stack.
    max_stack_size: usize,
    /// The maximum number of instructions to run, if this is reached,
    /// the program will stop with an error.
    ///
    /// Set to [`u64::MAX`] to disable this limit.
    max_op_count: u64,
}

impl VMOptions {
    /// Create a new set of VM options.
    pub fn new(max_stack_size: usize, max_op_count: u64) -> Self {
        Self { max_stack_size, max_op_count }
    }
}

impl Default for VMOptions {
    fn default() -> Self {
        let config = get_config();
        Self { max_stack_size: config.max_stack_size, max_op_count: config.max_op_count }
    }
}

/// An error that happened while running a Whitespace program.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunError {
    /// A specific instruction failed.
    #[error("Instruction {index} ({instruction}) failed (instruction counter {instruction_counter}): {error}")]
    InstructionFailed {
        /// The instruction which failed.
        instruction: Instruction,
        /// The 0-based index of this instruction in the program.
        index: usize,
        /// The position of the instruction in the source, counted in significant
        /// symbols, if the program was decoded from source.
        offset: Option<usize>,
        /// The number of instructions which have been run before this one.
        /// May differ from index in case of loops/jumps being present.
        instruction_counter: u64,
        /// The specific error within the instruction.
        error: OperationError,
    },
    /// Execution ran past the last instruction without reaching a terminate instruction.
    #[error("The program ended without terminating ({instruction_counter} instructions had been run).")]
    NonTermination { instruction_counter: u64 },
    /// The program executed more instructions than the limit specified within [`VMOptions`].
    #[error("The program ran for too long ({instruction_counter} instructions had been run).")]
    RunTooLong { instruction_counter: u64 },
    /// The [`Tracer`] stopped the run.
    #[error("Tracer interrupted program execution.")]
    Interrupted { instruction_counter: u64 },
}

impl RunError {
    /// The error of the failed instruction, if an instruction failed.
    pub fn operation_error(&self) -> Option<&OperationError> {
        match self {
            RunError::InstructionFailed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// The execution state of one run of a program.
#[derive(Debug, Clone)]
pub struct Machine<'a, T: Tracer = NoStats> {
    program: &'a Program,
    stack: Vec<BigInt>,
    heap: HashMap<BigInt, BigInt>,
    call_stack: Vec<usize>,
    ip: usize,
    input: Input<'a>,
    output: Output,
    terminated: bool,
    instructions_run: u64,
    options: VMOptions,
    tracer: T,
}

impl<'a> Machine<'a, NoStats> {
    pub fn new(program: &'a Program, input: &'a str, options: VMOptions) -> Self {
        Machine::with_tracer(program, input, options, NoStats::default())
    }
}

impl<'a, T: Tracer> Machine<'a, T> {
    pub fn with_tracer(program: &'a Program, input: &'a str, options: VMOptions, tracer: T) -> Self {
        Machine {
            program,
            stack: Vec::new(),
            heap: HashMap::default(),
            call_stack: Vec::new(),
            ip: 0,
            input: Input::new(input),
            output: Output::new(),
            terminated: false,
            instructions_run: 0,
            options,
            tracer,
        }
    }

    /// The value stack, top last.
    pub fn stack(&self) -> &[BigInt] {
        &self.stack
    }

    pub fn heap(&self) -> &HashMap<BigInt, BigInt> {
        &self.heap
    }

    /// Return points of the active calls, innermost last.
    pub fn call_stack(&self) -> &[usize] {
        &self.call_stack
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    /// Everything written so far. Stays readable after a failed run.
    pub fn output(&self) -> &str {
        self.output.as_str()
    }

    pub fn input(&self) -> &Input<'a> {
        &self.input
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn instruction_counter(&self) -> u64 {
        self.instructions_run
    }

    pub fn tracer(&self) -> &T {
        &self.tracer
    }

    pub fn into_output(self) -> String {
        self.output.into_string()
    }

    fn require(&self, required: usize) -> Result<(), OperationError> {
        if self.stack.len() < required {
            return Err(OperationError::StackUnderflow { required, stack_len: self.stack.len() });
        }
        Ok(())
    }

    fn pop(&mut self) -> Result<BigInt, OperationError> {
        self.require(1)?;
        self.stack.pop().ok_or(OperationError::StackUnderflow { required: 1, stack_len: 0 })
    }

    /// Pops `a` and then `b`, returning `(b, a)`.
    fn pop2(&mut self) -> Result<(BigInt, BigInt), OperationError> {
        self.require(2)?;
        let a = self.pop()?;
        let b = self.pop()?;
        Ok((b, a))
    }

    fn push(&mut self, value: BigInt) -> Result<(), OperationError> {
        if self.stack.len() >= self.options.max_stack_size {
            return Err(OperationError::PushFailed);
        }
        self.stack.push(value);
        Ok(())
    }

    fn peek_n(&self, depth: &BigInt) -> Result<&BigInt, OperationError> {
        let len = self.stack.len();
        depth
            .to_usize()
            .filter(|&n| n < len)
            .map(|n| &self.stack[len - 1 - n])
            .ok_or_else(|| OperationError::CopyOutOfRange { depth: depth.clone(), stack_len: len })
    }

    /// The top of the stack, left in place.
    fn top(&self) -> Result<&BigInt, OperationError> {
        self.stack.last().ok_or(OperationError::StackUnderflow { required: 1, stack_len: 0 })
    }

    /// Fails with [`OperationError::DivisionByZero`] before any operand is popped.
    fn require_divisor(&self) -> Result<(), OperationError> {
        self.require(2)?;
        if self.top()?.is_zero() {
            return Err(OperationError::DivisionByZero);
        }
        Ok(())
    }

    fn target(&self, label: &Label) -> Result<usize, OperationError> {
        self.program.target(label).ok_or_else(|| OperationError::UndefinedLabel { label: label.clone() })
    }

    fn apply(&mut self, instruction: &Instruction) -> Result<Effect, OperationError> {
        match instruction {
            Instruction::Push(value) => self.push(value.clone())?,
            Instruction::Duplicate => {
                let top = self.top()?.clone();
                self.push(top)?;
            }
            Instruction::Copy(depth) => {
                let value = self.peek_n(depth)?.clone();
                self.push(value)?;
            }
            Instruction::Swap => {
                self.require(2)?;
                let len = self.stack.len();
                self.stack.swap(len - 1, len - 2);
            }
            Instruction::Discard => {
                self.pop()?;
            }
            Instruction::Slide(count) => {
                let top = self.pop()?;
                let len = self.stack.len();
                // Sliding off more than is there (or a negative amount) clears the rest.
                let count = match count.to_usize() {
                    Some(count) if count <= len => count,
                    _ => len,
                };
                self.stack.truncate(len - count);
                self.push(top)?;
            }
            Instruction::Add => {
                let (b, a) = self.pop2()?;
                self.push(b + a)?;
            }
            Instruction::Subtract => {
                let (b, a) = self.pop2()?;
                self.push(b - a)?;
            }
            Instruction::Multiply => {
                let (b, a) = self.pop2()?;
                self.push(b * a)?;
            }
            Instruction::Divide => {
                self.require_divisor()?;
                let (b, a) = self.pop2()?;
                self.push(b.div_floor(&a))?;
            }
            Instruction::Modulo => {
                self.require_divisor()?;
                let (b, a) = self.pop2()?;
                self.push(b.mod_floor(&a))?;
            }
            Instruction::Store => {
                let (address, value) = self.pop2()?;
                self.heap.insert(address, value);
            }
            Instruction::Retrieve => {
                let address = self.top()?;
                let value = self
                    .heap
                    .get(address)
                    .cloned()
                    .ok_or_else(|| OperationError::UnknownHeapAddress { address: address.clone() })?;
                self.pop()?;
                self.push(value)?;
            }
            Instruction::Mark(_) => {}
            Instruction::Call(label) => {
                return Ok(Effect::SaveAndSetInstructionPointer(self.target(label)?));
            }
            Instruction::Jump(label) => {
                return Ok(Effect::SetInstructionPointer(self.target(label)?));
            }
            Instruction::JumpIfZero(label) => {
                self.require(1)?;
                let target = self.target(label)?;
                if self.pop()?.is_zero() {
                    return Ok(Effect::SetInstructionPointer(target));
                }
            }
            Instruction::JumpIfNegative(label) => {
                self.require(1)?;
                let target = self.target(label)?;
                if self.pop()?.is_negative() {
                    return Ok(Effect::SetInstructionPointer(target));
                }
            }
            Instruction::Return => {
                let ip = self.call_stack.pop().ok_or(OperationError::CallStackUnderflow)?;
                return Ok(Effect::SetInstructionPointer(ip));
            }
            Instruction::Terminate => return Ok(Effect::Terminate),
            Instruction::OutputChar => {
                self.output.write_char(self.stack.last().ok_or(OperationError::StackUnderflow {
                    required: 1,
                    stack_len: 0,
                })?)?;
                self.pop()?;
            }
            Instruction::OutputNumber => {
                let value = self.pop()?;
                self.output.write_number(&value);
            }
            Instruction::ReadChar => {
                self.require(1)?;
                let c = self.input.read_char()?;
                let address = self.pop()?;
                self.heap.insert(address, BigInt::from(u32::from(c)));
            }
            Instruction::ReadNumber => {
                self.require(1)?;
                let value = self.input.read_number()?;
                let address = self.pop()?;
                self.heap.insert(address, value);
            }
        }

        Ok(Effect::None)
    }

    /// Executes a single instruction.
    ///
    /// Returns `false` once the program has terminated.
    pub fn step(&mut self) -> Result<bool, RunError> {
        if self.terminated {
            return Ok(false);
        }

        let program = self.program;
        let ip = self.ip;
        let instruction_counter = self.instructions_run;
        let Some(instruction) = program.get(ip) else {
            return Err(RunError::NonTermination { instruction_counter });
        };
        if instruction_counter >= self.options.max_op_count {
            return Err(RunError::RunTooLong { instruction_counter });
        }
        if !self.tracer.should_continue(ip, instruction) {
            return Err(RunError::Interrupted { instruction_counter });
        }

        trace!(ip, %instruction, stack = self.stack.len(), "executing");
        let result = self.apply(instruction);
        self.tracer.instruction(ip, instruction, &result);

        let effect = result.map_err(|error| RunError::InstructionFailed {
            instruction: instruction.clone(),
            index: ip,
            offset: program.span(ip).map(|span| span.start),
            instruction_counter,
            error,
        })?;

        self.instructions_run += 1;
        match effect {
            Effect::None => self.ip += 1,
            Effect::SetInstructionPointer(new_ip) => {
                trace!(from = ip, to = new_ip, "branching");
                self.ip = new_ip;
            }
            Effect::SaveAndSetInstructionPointer(new_ip) => {
                trace!(from = ip, to = new_ip, depth = self.call_stack.len() + 1, "calling");
                self.call_stack.push(ip + 1);
                self.ip = new_ip;
            }
            Effect::Terminate => {
                self.terminated = true;
            }
        }
        Ok(!self.terminated)
    }

    /// Runs until the program terminates or fails.
    pub fn run(&mut self) -> Result<(), RunError> {
        let result = self.run_inner();
        debug!(
            instructions = self.instructions_run,
            output_len = self.output.as_str().len(),
            ok = result.is_ok(),
            "run finished"
        );
        result
    }

    fn run_inner(&mut self) -> Result<(), RunError> {
        while self.step()? {}
        Ok(())
    }
}

/// The successful result of running a Whitespace program.
#[derive(Debug, Clone)]
pub struct RunResult<T: Tracer> {
    /// Everything the program printed.
    pub output: String,
    /// The value stack at termination.
    pub stack: Vec<BigInt>,
    /// The heap at termination.
    pub heap: HashMap<BigInt, BigInt>,
    /// The number of instructions which have been run.
    pub instruction_counter: u64,
    pub tracer: T,
}

impl<T: Tracer> From<Machine<'_, T>> for RunResult<T> {
    fn from(m: Machine<T>) -> Self {
        RunResult {
            output: m.output.into_string(),
            stack: m.stack,
            heap: m.heap,
            instruction_counter: m.instructions_run,
            tracer: m.tracer,
        }
    }
}

/// Run a Whitespace program with the given input and options.
///
/// # Example
/// ```
/// use whitespace::program::Program;
/// use whitespace::vm::{run, VMOptions};
///
/// // push 5; push 3; add; output number; terminate
/// let program = Program::from_source("   \t \t\n   \t\t\n\t   \t\n \t\n\n\n").unwrap();
/// let result = run(&program, "", VMOptions::default()).unwrap();
/// assert_eq!(result.output, "8");
/// ```
pub fn run(program: &Program, input: &str, options: VMOptions) -> Result<RunResult<NoStats>, RunError> {
    run_with_stats(program, input, options, NoStats::default())
}

/// Run a Whitespace program and collect statistics with `tracer`.
/// If you do not need statistics, use the [`run`] function instead.
pub fn run_with_stats<T: Tracer>(
    program: &Program,
    input: &str,
    options: VMOptions,
    tracer: T,
) -> Result<RunResult<T>, RunError> {
    let mut machine = Machine::with_tracer(program, input, options, tracer);
    machine.run()?;
    Ok(machine.into())
}
