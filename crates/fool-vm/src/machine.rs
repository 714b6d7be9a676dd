//! The fetch-decode-execute loop.

use std::io::{self, Write};

use fool_core::{OpCode, RuntimeError, Word};

use crate::assembler::Program;
use crate::config::MachineConfig;
use crate::memory::Memory;

/// Whether the machine can still execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    Running,
    Halted,
}

/// Snapshot of the register set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub ip: usize,
    pub sp: Word,
    pub fp: Word,
    pub ra: Word,
    pub hp: Word,
    pub tm: Word,
}

/// Result of a run that reached `halt`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Every value `print` emitted, in order.
    pub printed: Vec<Word>,
    /// Top of the stack at `halt`.
    pub top: Option<Word>,
    /// Instructions executed.
    pub steps: u64,
}

pub struct Machine<'p> {
    program: &'p Program,
    config: MachineConfig,
    memory: Memory,
    ip: usize,
    fp: Word,
    ra: Word,
    hp: Word,
    tm: Word,
    state: MachineState,
    steps: u64,
    printed: Vec<Word>,
}

impl<'p> Machine<'p> {
    pub fn new(program: &'p Program, config: MachineConfig) -> Self {
        Self {
            program,
            config,
            memory: Memory::new(config.memory_size),
            ip: 0,
            fp: config.memory_size,
            ra: 0,
            hp: 0,
            tm: 0,
            state: MachineState::Running,
            steps: 0,
            printed: Vec::new(),
        }
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn registers(&self) -> Registers {
        Registers {
            ip: self.ip,
            sp: self.memory.sp(),
            fp: self.fp,
            ra: self.ra,
            hp: self.hp,
            tm: self.tm,
        }
    }

    /// A heap cell, if it was ever written.
    pub fn heap_cell(&self, address: Word) -> Option<Word> {
        self.memory.heap_cell(address)
    }

    /// Run to `halt`, discarding printed text.
    pub fn run(&mut self) -> Result<Outcome, RuntimeError> {
        self.run_with_output(&mut io::sink())
    }

    /// Run to `halt`, writing each printed value on its own line to `out`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run_with_output(&mut self, out: &mut dyn Write) -> Result<Outcome, RuntimeError> {
        while self.state == MachineState::Running {
            self.step(out)?;
        }
        Ok(Outcome {
            printed: self.printed.clone(),
            top: self.memory.peek(),
            steps: self.steps,
        })
    }

    /// Execute one instruction.
    pub fn step(&mut self, out: &mut dyn Write) -> Result<(), RuntimeError> {
        if self.state == MachineState::Halted {
            return Ok(());
        }
        if let Some(limit) = self.config.step_limit {
            if self.steps >= limit {
                return Err(RuntimeError::StepLimitExceeded { limit });
            }
        }

        let at = self.ip;
        let program = self.program;
        let code = program.code();
        let word = *code.get(at).ok_or(RuntimeError::MissingHalt)?;
        let op = OpCode::from_word(word).ok_or(RuntimeError::InvalidOpcode { word, ip: at })?;
        self.ip += 1;
        let operand = if op.has_operand() {
            let operand = *code.get(self.ip).ok_or(RuntimeError::MissingHalt)?;
            self.ip += 1;
            operand
        } else {
            0
        };
        self.steps += 1;

        self.execute_instruction(op, operand, at, out)
    }

    fn execute_instruction(
        &mut self,
        op: OpCode,
        operand: Word,
        at: usize,
        out: &mut dyn Write,
    ) -> Result<(), RuntimeError> {
        match op {
            OpCode::Push => self.push(operand, at)?,
            OpCode::Pop => {
                self.pop(at)?;
            }

            // Arithmetic
            OpCode::Add => {
                let (left, right) = self.pop_pair(at)?;
                self.push(left.wrapping_add(right), at)?;
            }
            OpCode::Sub => {
                let (left, right) = self.pop_pair(at)?;
                self.push(left.wrapping_sub(right), at)?;
            }
            OpCode::Mult => {
                let (left, right) = self.pop_pair(at)?;
                self.push(left.wrapping_mul(right), at)?;
            }
            OpCode::Div => {
                let (left, right) = self.pop_pair(at)?;
                if right == 0 {
                    return Err(RuntimeError::DivisionByZero { ip: at });
                }
                self.push(left.wrapping_div(right), at)?;
            }

            // Control flow
            OpCode::Branch => self.ip = self.jump_target(operand, at)?,
            OpCode::BranchEq => {
                let (left, right) = self.pop_pair(at)?;
                if left == right {
                    self.ip = self.jump_target(operand, at)?;
                }
            }
            OpCode::BranchLessEq => {
                let (left, right) = self.pop_pair(at)?;
                if left <= right {
                    self.ip = self.jump_target(operand, at)?;
                }
            }
            OpCode::JumpSub => {
                let target = self.pop(at)?;
                let target = self.jump_target(target, at)?;
                self.ra = self.ip as Word;
                self.ip = target;
            }

            // Memory
            OpCode::LoadWord => {
                let address = self.pop(at)?;
                let value = self.memory.load(address).map_err(|fault| fault.at(at))?;
                self.push(value, at)?;
            }
            OpCode::StoreWord => {
                let address = self.pop(at)?;
                let value = self.pop(at)?;
                self.memory
                    .store(address, value)
                    .map_err(|fault| fault.at(at))?;
            }

            // Registers
            OpCode::LoadFp => self.push(self.fp, at)?,
            OpCode::StoreFp => self.fp = self.pop(at)?,
            OpCode::CopyFp => self.fp = self.memory.sp(),
            OpCode::LoadRa => self.push(self.ra, at)?,
            OpCode::StoreRa => self.ra = self.pop(at)?,
            OpCode::LoadHp => self.push(self.hp, at)?,
            OpCode::StoreHp => self.hp = self.pop(at)?,
            OpCode::StoreTm => self.tm = self.pop(at)?,
            OpCode::LoadTm => self.push(self.tm, at)?,

            OpCode::Print => {
                let value = self
                    .memory
                    .peek()
                    .ok_or(RuntimeError::StackUnderflow { ip: at })?;
                writeln!(out, "{value}").map_err(|error| RuntimeError::Output {
                    message: error.to_string(),
                })?;
                self.printed.push(value);
            }
            OpCode::Halt => self.state = MachineState::Halted,
        }
        Ok(())
    }

    // ==========================================================================
    // Helpers
    // ==========================================================================

    fn push(&mut self, value: Word, at: usize) -> Result<(), RuntimeError> {
        self.memory.push(value).map_err(|fault| fault.at(at))
    }

    fn pop(&mut self, at: usize) -> Result<Word, RuntimeError> {
        self.memory.pop().map_err(|fault| fault.at(at))
    }

    /// Pop `top`, then `second`; returns `(second, top)`.
    fn pop_pair(&mut self, at: usize) -> Result<(Word, Word), RuntimeError> {
        let top = self.pop(at)?;
        let second = self.pop(at)?;
        Ok((second, top))
    }

    fn jump_target(&self, target: Word, at: usize) -> Result<usize, RuntimeError> {
        usize::try_from(target)
            .ok()
            .filter(|&address| address < self.program.len())
            .ok_or(RuntimeError::InvalidJump { target, ip: at })
    }
}
