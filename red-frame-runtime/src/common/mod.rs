mod cell;
mod dict;
mod interned_string;
mod mapping;
mod value;

pub use cell::*;
pub use dict::*;
pub use interned_string::*;
pub use mapping::*;
pub use value::*;
