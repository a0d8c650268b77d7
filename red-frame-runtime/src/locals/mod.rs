//! Bridges between the slot array of a frame, which the dispatcher reads and
//! writes directly, and the mapping views used by introspection.
//!
//! The slot array is the source of truth. `fast_to_locals` copies it into the
//! frame's locals dictionary on demand; nothing copies the dictionary back.
//! Writes from outside go through `FastLocalsProxy`, which targets the slots.

mod proxy;
mod synchronizer;

pub use proxy::*;
pub use synchronizer::*;
