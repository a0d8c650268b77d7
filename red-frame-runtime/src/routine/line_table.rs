#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
pub struct LineInfo {
    pub offset: usize,
    pub line: usize,
}

/// A monotone mapping from instruction offset ranges to source lines.
/// Each entry covers the offsets from its own `offset` up to (but excluding)
/// the `offset` of the next entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineTable {
    lines: Vec<LineInfo>,
}

impl LineTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(offset, line)` pairs sorted by offset.
    pub fn from_pairs(pairs: &[(usize, usize)]) -> Self {
        let mut table = Self::new();
        for &(offset, line) in pairs {
            table.maybe_update_line_info(offset, line);
        }
        table
    }

    /// Records that the code starting at `offset` belongs to `line`.
    /// Consecutive entries for the same line are merged.
    pub fn maybe_update_line_info(&mut self, offset: usize, line: usize) {
        match self.lines.last() {
            Some(line_info) if line_info.line == line => (),
            Some(line_info) if line_info.offset >= offset => {
                panic!(
                    "internal error: line table offsets must increase ({} after {})",
                    offset, line_info.offset
                )
            }
            _ => self.lines.push(LineInfo { offset, line }),
        }
    }

    /// Returns the line of the last entry starting at or before `offset`,
    /// or None when `offset` precedes every entry.
    pub fn line_of(&self, offset: usize) -> Option<usize> {
        match self
            .lines
            .binary_search_by_key(&offset, |LineInfo { offset, .. }| *offset)
        {
            Ok(index) => Some(self.lines[index].line),
            Err(0) => None,
            Err(index) => Some(self.lines[index - 1].line),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
