//! The machine's data memory.
//!
//! One address space of `size` words is shared by two regions:
//!
//! ```text
//!   0                     hp ...            sp                  size
//!   | heap (grows up) ->  |     free        | <- stack (grows down) |
//! ```
//!
//! The stack is a `Vec` whose element `i` lives at address `size - 1 - i`,
//! so pushing never moves existing cells. The heap is a sparse vector of
//! cells indexed by address; a cell that was never stored reads as a fault.
//! An address at or above `sp` names a stack cell, anything below it a heap
//! cell. A push that would land on a heap cell already written exhausts
//! memory.

use fool_core::{RuntimeError, Word};

/// A memory fault before the instruction pointer is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Underflow,
    OutOfRange(Word),
    Uninitialized(Word),
    Exhausted,
}

impl Fault {
    /// Attach the address of the faulting instruction.
    pub fn at(self, ip: usize) -> RuntimeError {
        match self {
            Fault::Underflow => RuntimeError::StackUnderflow { ip },
            Fault::OutOfRange(address) => RuntimeError::AddressOutOfRange { address, ip },
            Fault::Uninitialized(address) => RuntimeError::UninitializedRead { address, ip },
            Fault::Exhausted => RuntimeError::MemoryExhausted { ip },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Memory {
    size: Word,
    stack: Vec<Word>,
    heap: Vec<Option<Word>>,
}

impl Memory {
    pub fn new(size: Word) -> Self {
        Self {
            size: size.max(0),
            stack: Vec::new(),
            heap: Vec::new(),
        }
    }

    /// Address of the top of the stack; equals `size` when the stack is empty.
    pub fn sp(&self) -> Word {
        self.size - self.stack.len() as Word
    }

    /// One past the highest heap address written so far.
    pub fn heap_end(&self) -> Word {
        self.heap.len() as Word
    }

    // ==========================================================================
    // Stack
    // ==========================================================================

    pub fn push(&mut self, value: Word) -> Result<(), Fault> {
        if self.sp() - 1 < self.heap_end() {
            return Err(Fault::Exhausted);
        }
        self.stack.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Word, Fault> {
        self.stack.pop().ok_or(Fault::Underflow)
    }

    pub fn peek(&self) -> Option<Word> {
        self.stack.last().copied()
    }

    // ==========================================================================
    // Addressed access
    // ==========================================================================

    pub fn load(&self, address: Word) -> Result<Word, Fault> {
        if address < 0 || address >= self.size {
            return Err(Fault::OutOfRange(address));
        }
        if address >= self.sp() {
            let index = (self.size - 1 - address) as usize;
            return Ok(self.stack[index]);
        }
        match self.heap.get(address as usize) {
            Some(Some(value)) => Ok(*value),
            _ => Err(Fault::Uninitialized(address)),
        }
    }

    pub fn store(&mut self, address: Word, value: Word) -> Result<(), Fault> {
        if address < 0 || address >= self.size {
            return Err(Fault::OutOfRange(address));
        }
        if address >= self.sp() {
            let index = (self.size - 1 - address) as usize;
            self.stack[index] = value;
            return Ok(());
        }
        let index = address as usize;
        if index >= self.heap.len() {
            self.heap.resize(index + 1, None);
        }
        self.heap[index] = Some(value);
        Ok(())
    }

    /// The heap cell at `address`, if it was ever written.
    pub fn heap_cell(&self, address: Word) -> Option<Word> {
        usize::try_from(address)
            .ok()
            .and_then(|index| self.heap.get(index).copied().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_grows_down_from_the_top() {
        let mut memory = Memory::new(8);
        assert_eq!(memory.sp(), 8);
        memory.push(10).unwrap();
        memory.push(20).unwrap();
        assert_eq!(memory.sp(), 6);
        assert_eq!(memory.load(7), Ok(10));
        assert_eq!(memory.load(6), Ok(20));

        memory.store(7, 11).unwrap();
        assert_eq!(memory.pop(), Ok(20));
        assert_eq!(memory.pop(), Ok(11));
        assert_eq!(memory.pop(), Err(Fault::Underflow));
    }

    #[test]
    fn heap_cells_must_be_written_before_read() {
        let mut memory = Memory::new(8);
        memory.store(2, 5).unwrap();
        assert_eq!(memory.load(2), Ok(5));
        assert_eq!(memory.load(1), Err(Fault::Uninitialized(1)));
        assert_eq!(memory.load(3), Err(Fault::Uninitialized(3)));
        assert_eq!(memory.heap_end(), 3);
        assert_eq!(memory.heap_cell(2), Some(5));
        assert_eq!(memory.heap_cell(0), None);
    }

    #[test]
    fn addresses_outside_memory() {
        let mut memory = Memory::new(4);
        assert_eq!(memory.load(-1), Err(Fault::OutOfRange(-1)));
        assert_eq!(memory.store(4, 0), Err(Fault::OutOfRange(4)));
    }

    #[test]
    fn stack_and_heap_collide() {
        let mut memory = Memory::new(4);
        memory.store(1, 0).unwrap();
        memory.push(1).unwrap();
        memory.push(2).unwrap();
        assert_eq!(memory.push(3), Err(Fault::Exhausted));
        assert_eq!(memory.sp(), 2);
    }
}
