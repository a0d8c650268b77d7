use std::{collections::HashMap, rc::Rc};

use crate::common::InternedString;

use super::LineTable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoutineFlags {
    // Locals live only in the slot array (function scopes).
    pub optimized: bool,
    // A fresh locals dictionary is created for every frame (class bodies).
    pub new_locals: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Local,
    Cell,
    Free,
}

/// The static descriptor of a compiled function or module body, as far as
/// frames are concerned.
#[derive(Debug)]
pub struct Routine {
    name: InternedString,
    first_line: usize,
    var_names: Vec<InternedString>,
    cell_vars: Vec<InternedString>,
    free_vars: Vec<InternedString>,
    stack_size: usize,
    flags: RoutineFlags,
    line_table: LineTable,
    // variable name -> index into the slot array.
    slot_index: HashMap<InternedString, usize>,
}

impl Routine {
    pub fn builder(name: &str) -> RoutineBuilder {
        RoutineBuilder::new(name)
    }

    pub fn name(&self) -> &InternedString {
        &self.name
    }

    pub fn first_line(&self) -> usize {
        self.first_line
    }

    pub fn var_names(&self) -> &[InternedString] {
        &self.var_names
    }

    pub fn cell_vars(&self) -> &[InternedString] {
        &self.cell_vars
    }

    pub fn free_vars(&self) -> &[InternedString] {
        &self.free_vars
    }

    pub fn flags(&self) -> RoutineFlags {
        self.flags
    }

    pub fn line_table(&self) -> &LineTable {
        &self.line_table
    }

    pub fn nlocals(&self) -> usize {
        self.var_names.len()
    }

    /// The number of variable slots: locals, cells and free variables.
    pub fn nlocalsplus(&self) -> usize {
        self.var_names.len() + self.cell_vars.len() + self.free_vars.len()
    }

    pub fn stack_size(&self) -> usize {
        self.stack_size
    }

    /// The slot array capacity a frame running this routine requires.
    pub fn frame_size(&self) -> usize {
        self.nlocalsplus() + self.stack_size
    }

    pub fn slot_of(&self, name: &str) -> Option<(usize, SlotKind)> {
        self.slot_index
            .get(name)
            .map(|&index| (index, self.kind_of(index)))
    }

    pub fn kind_of(&self, slot: usize) -> SlotKind {
        let ncells_end = self.var_names.len() + self.cell_vars.len();
        if slot < self.var_names.len() {
            SlotKind::Local
        } else if slot < ncells_end {
            SlotKind::Cell
        } else {
            SlotKind::Free
        }
    }

    /// Iterates over the variables in slot order. A name with two slots (a
    /// parameter that is also captured) is reported once, at the slot
    /// `slot_of` resolves it to.
    pub fn variables(&self) -> impl Iterator<Item = (usize, &InternedString, SlotKind)> {
        self.var_names
            .iter()
            .chain(self.cell_vars.iter())
            .chain(self.free_vars.iter())
            .enumerate()
            .filter(|(slot, name)| self.slot_index.get(*name) == Some(slot))
            .map(|(slot, name)| (slot, name, self.kind_of(slot)))
    }

    /// Maps an execution cursor to a source line. An unset cursor or one that
    /// precedes the first table entry resolves to the first line.
    pub fn addr_to_line(&self, lasti: Option<usize>) -> usize {
        lasti
            .and_then(|offset| self.line_table.line_of(offset))
            .unwrap_or(self.first_line)
    }
}

impl std::fmt::Display for Routine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.name.as_ref().is_empty() {
            write!(f, "<module>")
        } else {
            write!(f, "<fn {}>", self.name)
        }
    }
}

pub struct RoutineBuilder {
    name: InternedString,
    first_line: usize,
    var_names: Vec<InternedString>,
    cell_vars: Vec<InternedString>,
    free_vars: Vec<InternedString>,
    stack_size: usize,
    flags: RoutineFlags,
    line_table: LineTable,
}

impl RoutineBuilder {
    fn new(name: &str) -> Self {
        Self {
            name: InternedString::new(name),
            first_line: 1,
            var_names: Vec::new(),
            cell_vars: Vec::new(),
            free_vars: Vec::new(),
            stack_size: 0,
            flags: RoutineFlags::default(),
            line_table: LineTable::new(),
        }
    }

    pub fn first_line(mut self, line: usize) -> Self {
        self.first_line = line;
        self
    }

    pub fn var_names(mut self, names: &[&str]) -> Self {
        self.var_names = names.iter().map(|n| InternedString::new(n)).collect();
        self
    }

    pub fn cell_vars(mut self, names: &[&str]) -> Self {
        self.cell_vars = names.iter().map(|n| InternedString::new(n)).collect();
        self
    }

    pub fn free_vars(mut self, names: &[&str]) -> Self {
        self.free_vars = names.iter().map(|n| InternedString::new(n)).collect();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = size;
        self
    }

    pub fn optimized(mut self, optimized: bool) -> Self {
        self.flags.optimized = optimized;
        self
    }

    pub fn new_locals(mut self, new_locals: bool) -> Self {
        self.flags.new_locals = new_locals;
        self
    }

    pub fn lines(mut self, pairs: &[(usize, usize)]) -> Self {
        self.line_table = LineTable::from_pairs(pairs);
        self
    }

    pub fn build(self) -> Rc<Routine> {
        let mut slot_index = HashMap::new();
        for (slot, name) in self
            .var_names
            .iter()
            .chain(self.cell_vars.iter())
            .chain(self.free_vars.iter())
            .enumerate()
        {
            // A parameter that is also captured keeps its ordinary local slot.
            slot_index.entry(name.clone()).or_insert(slot);
        }
        Rc::new(Routine {
            name: self.name,
            first_line: self.first_line,
            var_names: self.var_names,
            cell_vars: self.cell_vars,
            free_vars: self.free_vars,
            stack_size: self.stack_size,
            flags: self.flags,
            line_table: self.line_table,
            slot_index,
        })
    }
}
