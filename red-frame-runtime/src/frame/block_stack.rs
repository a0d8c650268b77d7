/// The most blocks a routine may nest. The compiler refuses deeper nesting,
/// so exceeding it at run time means the routine is malformed.
pub const MAX_BLOCKS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Loop,
    Except,
    Finally,
}

impl BlockKind {
    /// Whether an exception unwinding the frame stops at this block.
    pub fn is_handler(self) -> bool {
        matches!(self, BlockKind::Except | BlockKind::Finally)
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BlockKind::Loop => "SETUP_LOOP",
            BlockKind::Except => "SETUP_EXCEPT",
            BlockKind::Finally => "SETUP_FINALLY",
        };
        f.pad(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    // The offset to continue at when the block is left.
    pub handler: usize,
    // The value stack depth to truncate to when the block is left.
    pub level: usize,
}

impl Block {
    const EMPTY: Block = Block {
        kind: BlockKind::Loop,
        handler: 0,
        level: 0,
    };
}

pub struct BlockStack {
    blocks: [Block; MAX_BLOCKS],
    count: usize,
}

impl BlockStack {
    pub fn new() -> Self {
        Self {
            blocks: [Block::EMPTY; MAX_BLOCKS],
            count: 0,
        }
    }

    /// Panics when MAX_BLOCKS blocks are already active.
    pub fn push(&mut self, kind: BlockKind, handler: usize, level: usize) {
        if self.count >= MAX_BLOCKS {
            panic!("internal error: block stack overflow (limit {})", MAX_BLOCKS);
        }
        self.blocks[self.count] = Block {
            kind,
            handler,
            level,
        };
        self.count += 1;
    }

    /// Panics when no block is active.
    pub fn pop(&mut self) -> Block {
        if self.count == 0 {
            panic!("internal error: block stack underflow");
        }
        self.count -= 1;
        self.blocks[self.count]
    }

    pub fn peek(&self) -> Option<&Block> {
        self.active().last()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The active blocks, innermost last.
    pub fn active(&self) -> &[Block] {
        &self.blocks[..self.count]
    }

    pub fn clear(&mut self) {
        self.count = 0;
    }
}

impl Default for BlockStack {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BlockStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.active()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1)]
    #[case(5)]
    #[case(MAX_BLOCKS)]
    fn pops_in_reverse_push_order(#[case] n: usize) {
        let mut stack = BlockStack::new();
        for i in 0..n {
            stack.push(BlockKind::Loop, i * 10, i);
        }
        let popped: Vec<usize> = (0..n).map(|_| stack.pop().handler).collect();
        let expected: Vec<usize> = (0..n).rev().map(|i| i * 10).collect();
        assert_eq!(popped, expected);
        assert!(stack.is_empty());
    }

    #[test]
    #[should_panic(expected = "block stack underflow")]
    fn popping_past_the_bottom_is_a_defect() {
        let mut stack = BlockStack::new();
        stack.push(BlockKind::Except, 4, 0);
        stack.pop();
        stack.pop();
    }

    #[test]
    #[should_panic(expected = "block stack overflow")]
    fn pushing_past_the_limit_is_a_defect() {
        let mut stack = BlockStack::new();
        for _ in 0..=MAX_BLOCKS {
            stack.push(BlockKind::Loop, 0, 0);
        }
    }

    #[test]
    fn peek_shows_the_innermost_block() {
        let mut stack = BlockStack::new();
        assert_eq!(stack.peek(), None);
        stack.push(BlockKind::Loop, 50, 1);
        stack.push(BlockKind::Finally, 70, 2);
        assert_eq!(stack.peek().map(|b| b.kind), Some(BlockKind::Finally));
        assert_eq!(stack.len(), 2);
    }
}
