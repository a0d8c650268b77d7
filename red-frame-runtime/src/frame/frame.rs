use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use crate::{
    common::{Cell, DictRef, Value},
    generator::Generator,
    routine::{Routine, SlotKind},
    trace::TraceFunction,
    Error, Result,
};

use super::{Block, BlockKind, BlockStack, SlotArray};

pub type FrameRef = Rc<RefCell<Frame>>;

/// The activation record of a running (or suspended, or finished but still
/// referenced) routine.
pub struct Frame {
    // The calling frame. Not an owner: the caller is kept alive by whoever runs it.
    back: Option<Weak<RefCell<Frame>>>,
    routine: Rc<Routine>,
    builtins: DictRef,
    globals: DictRef,
    // Absent for optimized routines until somebody asks for a locals mapping.
    locals: Option<DictRef>,
    slots: SlotArray,
    // The offset of the last executed instruction, None before the first one.
    lasti: Option<usize>,
    // Only meaningful while `trace` is set. Read it through `line_number`.
    lineno: usize,
    blocks: BlockStack,
    executing: bool,
    trace: Option<Rc<dyn TraceFunction>>,
    trace_lines: bool,
    trace_opcodes: bool,
    generator: Option<Weak<Generator>>,
}

impl Frame {
    /// Builds a frame on top of `slots`, which must already be reset to the
    /// routine's variable count. Frames are created through `FrameAllocator`.
    pub(super) fn new(
        slots: SlotArray,
        back: Option<&FrameRef>,
        routine: Rc<Routine>,
        builtins: DictRef,
        globals: DictRef,
        locals: Option<DictRef>,
    ) -> Self {
        let mut frame = Self {
            back: back.map(Rc::downgrade),
            lineno: routine.first_line(),
            routine,
            builtins,
            globals,
            locals,
            slots,
            lasti: None,
            blocks: BlockStack::new(),
            executing: true,
            trace: None,
            trace_lines: true,
            trace_opcodes: false,
            generator: None,
        };
        frame.init_cells();
        frame
    }

    // Every cell and free variable slot starts out holding an empty cell.
    fn init_cells(&mut self) {
        for slot in self.routine.nlocals()..self.routine.nlocalsplus() {
            self.slots
                .set_variable(slot, Some(Value::Cell(Cell::default())));
        }
    }

    pub(super) fn into_slots(self) -> SlotArray {
        self.slots
    }

    pub fn back(&self) -> Option<FrameRef> {
        self.back.as_ref().and_then(Weak::upgrade)
    }

    pub fn routine(&self) -> &Rc<Routine> {
        &self.routine
    }

    pub fn builtins(&self) -> &DictRef {
        &self.builtins
    }

    pub fn globals(&self) -> &DictRef {
        &self.globals
    }

    pub fn locals(&self) -> Option<&DictRef> {
        self.locals.as_ref()
    }

    /// Returns the locals mapping, creating an empty one when there is none.
    pub fn locals_or_create(&mut self) -> DictRef {
        self.locals
            .get_or_insert_with(crate::common::Dict::new_ref)
            .clone()
    }

    pub fn is_executing(&self) -> bool {
        self.executing
    }

    pub fn generator(&self) -> Option<Rc<Generator>> {
        self.generator.as_ref().and_then(Weak::upgrade)
    }

    pub(crate) fn set_generator(&mut self, generator: Weak<Generator>) {
        self.generator = Some(generator);
    }

    // Execution cursor and line numbers.

    pub fn lasti(&self) -> Option<usize> {
        self.lasti
    }

    pub fn set_lasti(&mut self, offset: usize) {
        self.lasti = Some(offset);
    }

    /// The line the frame is executing. While a trace function is installed
    /// this is the line maintained by the dispatcher; otherwise it is looked up
    /// from the execution cursor every time.
    pub fn line_number(&self) -> usize {
        if self.trace.is_some() {
            self.lineno
        } else {
            self.routine.addr_to_line(self.lasti)
        }
    }

    /// Called by the dispatcher on every line boundary while tracing.
    pub fn set_line_number(&mut self, line: usize) {
        self.lineno = line;
    }

    // Tracing.

    pub fn trace(&self) -> Option<&Rc<dyn TraceFunction>> {
        self.trace.as_ref()
    }

    /// Installs or removes the trace function. Installing one starts the
    /// traced line number from the line of the execution cursor.
    pub fn set_trace(&mut self, trace: Option<Rc<dyn TraceFunction>>) {
        if trace.is_some() && self.trace.is_none() {
            self.lineno = self.routine.addr_to_line(self.lasti);
        }
        self.trace = trace;
    }

    pub fn trace_lines(&self) -> bool {
        self.trace_lines
    }

    pub fn set_trace_lines(&mut self, enabled: bool) {
        self.trace_lines = enabled;
    }

    pub fn trace_opcodes(&self) -> bool {
        self.trace_opcodes
    }

    pub fn set_trace_opcodes(&mut self, enabled: bool) {
        self.trace_opcodes = enabled;
    }

    // Lifecycle.

    /// Marks a generator-backed frame as no longer on the call stack. The value
    /// stack is preserved for the next resume.
    pub fn mark_suspended(&mut self) {
        self.executing = false;
    }

    pub fn mark_resumed(&mut self) {
        self.executing = true;
    }

    /// Called when evaluation of the frame has returned. Temporaries on the
    /// value stack are dropped; variables stay readable for introspection.
    pub fn post_eval_cleanup(&mut self) {
        self.executing = false;
        self.slots.truncate(0);
        self.blocks.clear();
    }

    // Block stack.

    pub fn setup_block(&mut self, kind: BlockKind, handler: usize, level: usize) {
        self.blocks.push(kind, handler, level);
    }

    pub fn pop_block(&mut self) -> Block {
        self.blocks.pop()
    }

    pub fn blocks(&self) -> &BlockStack {
        &self.blocks
    }

    /// Unwinds the block stack for a raised exception: pops blocks until a
    /// handler block is found, truncates the value stack to its level and moves
    /// the cursor to its handler. Returns None when the exception leaves the frame.
    pub fn unwind_exception(&mut self) -> Option<Block> {
        while !self.blocks.is_empty() {
            let block = self.blocks.pop();
            if block.kind.is_handler() {
                self.slots.truncate(block.level);
                self.lasti = Some(block.handler);
                return Some(block);
            }
        }
        None
    }

    // Value stack.

    pub fn push(&mut self, value: Value) {
        self.slots.push(value);
    }

    pub fn pop(&mut self) -> Value {
        self.slots.pop()
    }

    pub fn peek(&self, depth: usize) -> Option<&Value> {
        self.slots.peek(depth)
    }

    pub fn stack_depth(&self) -> usize {
        self.slots.depth()
    }

    pub fn stack_top(&self) -> usize {
        self.slots.stack_top()
    }

    pub fn set_stack_top(&mut self, stack_top: usize) {
        self.slots.set_stack_top(stack_top);
    }

    pub fn truncate_stack(&mut self, level: usize) {
        self.slots.truncate(level);
    }

    /// Grows the value stack by `extra` slots and returns the stack top.
    /// Stack top values fetched before the call must be fetched again.
    pub fn extend_stack(&mut self, extra: usize) -> Result<usize> {
        self.slots
            .extend(extra)
            .map_err(|source| Error::AllocationError {
                what: "value stack extension",
                routine: self.routine.name().clone(),
                requested: extra,
                source,
            })
    }

    pub fn slots(&self) -> &SlotArray {
        &self.slots
    }

    // Variables.

    /// Reads a variable slot, looking through cells.
    pub fn variable(&self, slot: usize) -> Option<Value> {
        match (self.routine.kind_of(slot), self.slots.variable(slot)) {
            (SlotKind::Local, v) => v.cloned(),
            (_, Some(Value::Cell(cell))) => cell.get(),
            (_, v) => v.cloned(),
        }
    }

    /// Writes a variable slot, looking through cells, and returns the old value.
    pub fn set_variable(&mut self, slot: usize, value: Option<Value>) -> Option<Value> {
        match self.routine.kind_of(slot) {
            SlotKind::Local => self.slots.set_variable(slot, value),
            SlotKind::Cell | SlotKind::Free => match self.slots.variable(slot) {
                Some(Value::Cell(cell)) => cell.set(value),
                _ => self.slots.set_variable(slot, value),
            },
        }
    }

    pub fn local(&self, index: usize) -> Option<&Value> {
        self.slots.variable(index)
    }

    /// Writes a plain local slot. Cell and free slots go through `set_variable`
    /// so the shared cell is kept.
    pub fn set_local(&mut self, index: usize, value: Value) {
        assert_eq!(
            self.routine.kind_of(index),
            SlotKind::Local,
            "internal error: slot {} of {} is not a plain local",
            index,
            self.routine
        );
        self.slots.set_variable(index, Some(value));
    }

    /// Installs the cells a closure captured into the free variable slots.
    pub fn bind_free_vars(&mut self, cells: &[Cell]) {
        let start = self.routine.nlocals() + self.routine.cell_vars().len();
        assert_eq!(
            cells.len(),
            self.routine.free_vars().len(),
            "internal error: {} expects {} free variables",
            self.routine,
            self.routine.free_vars().len()
        );
        for (offset, cell) in cells.iter().enumerate() {
            self.slots
                .set_variable(start + offset, Some(Value::Cell(cell.clone())));
        }
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("routine", &self.routine.name())
            .field("lasti", &self.lasti)
            .field("executing", &self.executing)
            .field("blocks", &self.blocks)
            .field("slots", &self.slots)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{common::Dict, frame::FrameAllocator};
    use rstest::rstest;

    fn frame(routine: Rc<Routine>) -> FrameRef {
        FrameAllocator::default()
            .create(None, &routine, &Dict::new_ref(), None)
            .unwrap()
    }

    fn function(nlocals: usize, stack_size: usize) -> Rc<Routine> {
        let names = ["a", "b", "c", "d"];
        Routine::builder("f")
            .var_names(&names[..nlocals])
            .stack_size(stack_size)
            .optimized(true)
            .first_line(10)
            .lines(&[(0, 10), (5, 11), (12, 13)])
            .build()
    }

    #[rstest]
    #[case(0, 10)]
    #[case(7, 11)]
    #[case(20, 13)]
    fn line_number_follows_the_cursor_without_tracing(#[case] lasti: usize, #[case] line: usize) {
        let frame = frame(function(1, 1));
        let mut frame = frame.borrow_mut();
        frame.set_lasti(lasti);
        // A stale traced line must not leak out while tracing is off.
        frame.set_line_number(99);
        assert_eq!(frame.line_number(), line);
    }

    #[test]
    fn line_number_before_the_first_instruction_is_the_first_line() {
        let frame = frame(function(1, 1));
        assert_eq!(frame.borrow().line_number(), 10);
    }

    #[test]
    fn block_exit_truncates_the_stack() {
        let frame = frame(function(2, 3));
        let mut frame = frame.borrow_mut();
        frame.setup_block(BlockKind::Loop, 50, 1);
        frame.push(Value::Number(1.0));
        frame.push(Value::Number(2.0));
        let block = frame.pop_block();
        frame.truncate_stack(block.level);
        assert_eq!(frame.stack_depth(), 1);
        assert_eq!(frame.peek(0), Some(&Value::Number(1.0)));
        assert_eq!(frame.stack_top(), 3);
    }

    #[test]
    fn exceptions_unwind_to_the_innermost_handler() {
        let frame = frame(function(0, 4));
        let mut frame = frame.borrow_mut();
        frame.push(Value::Nil);
        frame.setup_block(BlockKind::Except, 30, 1);
        frame.push(Value::Nil);
        frame.setup_block(BlockKind::Loop, 40, 2);
        frame.push(Value::Nil);
        frame.push(Value::Nil);

        let block = frame.unwind_exception();
        assert_eq!(
            block,
            Some(Block {
                kind: BlockKind::Except,
                handler: 30,
                level: 1
            })
        );
        assert_eq!(frame.stack_depth(), 1);
        assert_eq!(frame.lasti(), Some(30));
        assert!(frame.blocks().is_empty());
    }

    #[test]
    fn exceptions_without_a_handler_leave_the_frame() {
        let frame = frame(function(0, 2));
        let mut frame = frame.borrow_mut();
        frame.setup_block(BlockKind::Loop, 8, 0);
        frame.push(Value::Nil);
        assert_eq!(frame.unwind_exception(), None);
        assert!(frame.blocks().is_empty());
        assert_eq!(frame.stack_depth(), 1);
    }

    #[test]
    fn extend_stack_makes_room_for_more_values() {
        let frame = frame(function(1, 1));
        let mut frame = frame.borrow_mut();
        frame.push(Value::Nil);
        let stack_top = frame.extend_stack(2).unwrap();
        assert_eq!(stack_top, 2);
        frame.push(Value::Bool(true));
        frame.push(Value::Bool(false));
        assert_eq!(frame.stack_depth(), 3);
        assert_eq!(frame.slots().capacity(), 4);
    }

    #[test]
    fn post_eval_cleanup_keeps_variables() {
        let frame = frame(function(1, 2));
        let mut frame = frame.borrow_mut();
        frame.set_local(0, Value::Number(4.0));
        frame.push(Value::Nil);
        frame.setup_block(BlockKind::Loop, 3, 0);
        frame.post_eval_cleanup();
        assert!(!frame.is_executing());
        assert_eq!(frame.stack_depth(), 0);
        assert!(frame.blocks().is_empty());
        assert_eq!(frame.local(0), Some(&Value::Number(4.0)));
    }

    #[test]
    #[should_panic(expected = "is not a plain local")]
    fn set_local_refuses_cell_slots() {
        let routine = Routine::builder("f")
            .var_names(&["a"])
            .cell_vars(&["c"])
            .stack_size(1)
            .optimized(true)
            .build();
        let frame = frame(routine);
        frame.borrow_mut().set_local(1, Value::Number(1.0));
    }

    #[test]
    #[should_panic(expected = "block stack underflow")]
    fn popping_a_block_that_was_never_pushed_is_a_defect() {
        let frame = frame(function(0, 1));
        frame.borrow_mut().pop_block();
    }

    #[test]
    fn back_is_not_an_owner() {
        let mut allocator = FrameAllocator::default();
        let routine = function(0, 1);
        let globals = Dict::new_ref();
        let caller = allocator.create(None, &routine, &globals, None).unwrap();
        let callee = allocator
            .create(Some(&caller), &routine, &globals, None)
            .unwrap();
        assert!(Rc::ptr_eq(&callee.borrow().back().unwrap(), &caller));
        assert_eq!(Rc::strong_count(&caller), 1);
        drop(caller);
        assert!(callee.borrow().back().is_none());
    }
}
