//! Planner-side block queue contract and a fixed-capacity ring buffer.

use heapless::Deque;

use crate::error::{EngineError, Error, Result};

use super::block::Block;

/// What the engine needs from the planner.
///
/// The engine reads the head with [`peek_next`](BlockQueue::peek_next) from
/// the step interrupt and only calls [`discard_head`](BlockQueue::discard_head)
/// once that block has finished. Implementations must not modify or drop the
/// head block in between.
pub trait BlockQueue {
    /// Head of the queue, if any. Must not block.
    fn peek_next(&mut self) -> Option<&Block>;

    /// Remove the head block after it has completed.
    fn discard_head(&mut self);
}

/// Fixed-capacity FIFO of blocks.
///
/// Producers [`push`](BlockBuffer::push) at the tail; the engine consumes
/// from the head.
#[derive(Debug)]
pub struct BlockBuffer<const N: usize> {
    blocks: Deque<Block, N>,
    discarded: u32,
}

impl<const N: usize> Default for BlockBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> BlockBuffer<N> {
    /// Create an empty buffer.
    pub const fn new() -> Self {
        Self {
            blocks: Deque::new(),
            discarded: 0,
        }
    }

    /// Append a block at the tail.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::QueueFull` if the buffer is at capacity.
    pub fn push(&mut self, block: Block) -> Result<()> {
        self.blocks
            .push_back(block)
            .map_err(|_| Error::Engine(EngineError::QueueFull))
    }

    /// Number of queued blocks, including the one executing.
    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check whether the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Check whether the buffer is at capacity.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.blocks.is_full()
    }

    /// Total blocks discarded since creation.
    #[inline]
    pub fn discarded(&self) -> u32 {
        self.discarded
    }
}

impl<const N: usize> BlockQueue for BlockBuffer<N> {
    fn peek_next(&mut self) -> Option<&Block> {
        self.blocks.front()
    }

    fn discard_head(&mut self) {
        if self.blocks.pop_front().is_some() {
            self.discarded = self.discarded.wrapping_add(1);
        }
    }
}
