use std::collections::TryReserveError;

use crate::common::Value;

/// The trailing storage of a frame: variable slots followed by the value stack.
/// `None` marks an unbound variable or an unused stack slot.
pub struct SlotArray {
    slots: Vec<Option<Value>>,
    // The index of the first value stack slot (the number of variable slots).
    stack_base: usize,
    // The index of the next free value stack slot.
    stack_top: usize,
}

impl SlotArray {
    pub fn new(capacity: usize, stack_base: usize) -> Result<Self, TryReserveError> {
        assert!(
            stack_base <= capacity,
            "internal error: {} variable slots do not fit in {} slots",
            stack_base,
            capacity
        );
        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity)?;
        slots.resize(capacity, None);
        Ok(Self {
            slots,
            stack_base,
            stack_top: stack_base,
        })
    }

    /// Unbinds every slot and moves the value stack to start at `stack_base`.
    pub fn reset(&mut self, stack_base: usize) {
        assert!(
            stack_base <= self.capacity(),
            "internal error: {} variable slots do not fit in {} slots",
            stack_base,
            self.capacity()
        );
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.stack_base = stack_base;
        self.stack_top = stack_base;
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn stack_base(&self) -> usize {
        self.stack_base
    }

    pub fn stack_top(&self) -> usize {
        self.stack_top
    }

    pub fn set_stack_top(&mut self, stack_top: usize) {
        assert!(
            (self.stack_base..=self.capacity()).contains(&stack_top),
            "internal error: stack top {} is outside of [{}, {}]",
            stack_top,
            self.stack_base,
            self.capacity()
        );
        for slot in &mut self.slots[stack_top..self.stack_top.max(stack_top)] {
            *slot = None;
        }
        self.stack_top = stack_top;
    }

    /// The number of values on the value stack.
    pub fn depth(&self) -> usize {
        self.stack_top - self.stack_base
    }

    pub fn variable(&self, index: usize) -> Option<&Value> {
        self.check_variable(index);
        self.slots[index].as_ref()
    }

    /// Binds (or unbinds, with `None`) a variable slot and returns the old value.
    pub fn set_variable(&mut self, index: usize, value: Option<Value>) -> Option<Value> {
        self.check_variable(index);
        std::mem::replace(&mut self.slots[index], value)
    }

    pub fn push(&mut self, value: Value) {
        assert!(
            self.stack_top < self.capacity(),
            "internal error: value stack overflow (capacity {})",
            self.capacity() - self.stack_base
        );
        self.slots[self.stack_top] = Some(value);
        self.stack_top += 1;
    }

    pub fn pop(&mut self) -> Value {
        assert!(
            self.stack_top > self.stack_base,
            "internal error: value stack underflow"
        );
        self.stack_top -= 1;
        self.slots[self.stack_top]
            .take()
            .unwrap_or_else(|| panic!("internal error: unset value stack slot {}", self.stack_top))
    }

    pub fn peek(&self, depth: usize) -> Option<&Value> {
        if depth >= self.depth() {
            return None;
        }
        self.slots[self.stack_top - 1 - depth].as_ref()
    }

    /// Drops values until the stack holds `level` values.
    pub fn truncate(&mut self, level: usize) {
        assert!(
            level <= self.depth(),
            "internal error: cannot truncate a stack of depth {} to {}",
            self.depth(),
            level
        );
        self.set_stack_top(self.stack_base + level);
    }

    /// Adds `extra` value stack slots and returns the stack top, which is unchanged.
    pub fn extend(&mut self, extra: usize) -> Result<usize, TryReserveError> {
        self.slots.try_reserve_exact(extra)?;
        self.slots.resize(self.slots.len() + extra, None);
        Ok(self.stack_top)
    }

    /// The values on the value stack, bottom first.
    pub fn stack_values(&self) -> impl Iterator<Item = &Value> {
        self.slots[self.stack_base..self.stack_top].iter().flatten()
    }

    fn check_variable(&self, index: usize) {
        assert!(
            index < self.stack_base,
            "internal error: slot {} is not a variable slot (there are {})",
            index,
            self.stack_base
        );
    }
}

impl std::fmt::Debug for SlotArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SlotArray {{ capacity: {}, stack_base: {}, stack_top: {} }}",
            self.capacity(),
            self.stack_base,
            self.stack_top
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_starts_after_the_variables() {
        let slots = SlotArray::new(5, 2).unwrap();
        assert_eq!(slots.stack_top(), 2);
        assert_eq!(slots.depth(), 0);
        assert_eq!(slots.variable(1), None);
    }

    #[test]
    fn push_pop_and_peek() {
        let mut slots = SlotArray::new(4, 1).unwrap();
        slots.push(Value::Number(1.0));
        slots.push(Value::Number(2.0));
        assert_eq!(slots.peek(0), Some(&Value::Number(2.0)));
        assert_eq!(slots.peek(1), Some(&Value::Number(1.0)));
        assert_eq!(slots.peek(2), None);
        assert_eq!(slots.pop(), Value::Number(2.0));
        assert_eq!(slots.depth(), 1);
    }

    #[test]
    fn truncate_drops_values_above_the_level() {
        let mut slots = SlotArray::new(5, 2).unwrap();
        slots.push(Value::Bool(true));
        slots.push(Value::Bool(false));
        slots.push(Value::Nil);
        slots.truncate(1);
        assert_eq!(slots.depth(), 1);
        assert_eq!(slots.stack_values().collect::<Vec<_>>(), vec![&Value::Bool(true)]);
    }

    #[test]
    fn extend_keeps_values_and_adds_room() {
        let mut slots = SlotArray::new(2, 1).unwrap();
        slots.set_variable(0, Some(Value::Number(7.0)));
        slots.push(Value::Nil);
        assert_eq!(slots.extend(2).unwrap(), 2);
        slots.push(Value::Bool(true));
        slots.push(Value::Bool(false));
        assert_eq!(slots.capacity(), 4);
        assert_eq!(slots.variable(0), Some(&Value::Number(7.0)));
    }

    #[test]
    fn reset_unbinds_everything() {
        let mut slots = SlotArray::new(3, 1).unwrap();
        slots.set_variable(0, Some(Value::Nil));
        slots.push(Value::Nil);
        slots.reset(2);
        assert_eq!(slots.stack_top(), 2);
        assert_eq!(slots.variable(0), None);
    }

    #[test]
    #[should_panic(expected = "value stack overflow")]
    fn pushing_past_capacity_is_a_defect() {
        let mut slots = SlotArray::new(1, 0).unwrap();
        slots.push(Value::Nil);
        slots.push(Value::Nil);
    }

    #[test]
    #[should_panic(expected = "is outside of")]
    fn stack_top_below_the_variables_is_a_defect() {
        let mut slots = SlotArray::new(4, 2).unwrap();
        slots.set_stack_top(1);
    }
}
