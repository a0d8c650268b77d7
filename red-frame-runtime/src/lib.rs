pub mod common;
pub mod error;
pub mod frame;
pub mod generator;
pub mod locals;
pub mod routine;
pub mod trace;

pub use error::{Error, Result};
