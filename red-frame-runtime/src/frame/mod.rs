mod allocator;
mod block_stack;
pub mod debug;
mod frame;
mod slot_array;

pub use allocator::*;
pub use block_stack::*;
pub use frame::*;
pub use slot_array::*;
