mod line_table;
mod routine;

pub use line_table::*;
pub use routine::*;
