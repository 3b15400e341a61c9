//! Read-through block cache over a constrained file.
//!
//! Single-byte reads of the base file are batched into aligned fixed-size
//! blocks so a run of small reads costs one syscall per block instead of
//! one each. Blocks hold *base file* bytes; pending edits live in the
//! action log overlay above this layer, so a block only goes stale when a
//! save actually rewrites the file, and the facade clears the cache then.

use core_file::{ConstrainedFile, Natural, ReadError};
use tracing::trace;

#[derive(Debug)]
struct Block {
    /// Aligned start (a multiple of the block size).
    start: Natural,
    /// At most one block's worth; shorter only at end of file.
    data: Vec<u8>,
    last_used: u64,
}

#[derive(Debug)]
pub struct BlockCache {
    blocks: Vec<Block>,
    block_size: usize,
    max_blocks: usize,
    tick: u64,
}

impl BlockCache {
    pub fn new(block_size: usize, max_blocks: usize) -> Self {
        debug_assert!(block_size > 0, "block size must be positive");
        Self {
            blocks: Vec::new(),
            block_size,
            max_blocks: max_blocks.max(1),
            tick: 0,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Drop every cached block. Called after a save rewrites the file.
    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    /// Read one byte of the base file at `pos`, filling the covering block
    /// on a miss. `None` means the position is past end of file (or past
    /// the window, which clamped reads surface the same way).
    pub fn read(
        &mut self,
        file: &mut ConstrainedFile,
        pos: Natural,
    ) -> Result<Option<u8>, ReadError> {
        let aligned = pos.align_down(self.block_size);
        self.tick += 1;
        let tick = self.tick;

        let index = match self.find(aligned) {
            Some(i) => i,
            None => match self.fill(file, aligned)? {
                Some(i) => i,
                None => return Ok(None),
            },
        };

        let block = &mut self.blocks[index];
        block.last_used = tick;
        let offset = (pos - aligned).get();
        Ok(block.data.get(offset).copied())
    }

    fn find(&self, aligned: Natural) -> Option<usize> {
        self.blocks.iter().position(|b| b.start == aligned)
    }

    /// Read one block's worth from the file and cache it, evicting the
    /// least recently used block when the cache is full. Returns `None`
    /// when the file has no bytes at all at this block (end of file).
    fn fill(
        &mut self,
        file: &mut ConstrainedFile,
        aligned: Natural,
    ) -> Result<Option<usize>, ReadError> {
        let data = file.read_range(aligned, self.block_size)?;
        if data.is_empty() {
            return Ok(None);
        }

        if self.blocks.len() >= self.max_blocks {
            if let Some(victim) = self
                .blocks
                .iter()
                .enumerate()
                .min_by_key(|(_, b)| b.last_used)
                .map(|(i, _)| i)
            {
                let evicted = self.blocks.swap_remove(victim);
                trace!(
                    target: "editor.cache",
                    start = evicted.start.get(),
                    "block_evicted"
                );
            }
        }

        trace!(
            target: "editor.cache",
            start = aligned.get(),
            len = data.len(),
            cached = self.blocks.len() + 1,
            "block_filled"
        );
        self.blocks.push(Block {
            start: aligned,
            data,
            last_used: self.tick,
        });
        Ok(Some(self.blocks.len() - 1))
    }
}
