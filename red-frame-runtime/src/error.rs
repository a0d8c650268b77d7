use std::collections::TryReserveError;

use crate::common::InternedString;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to allocate {requested} slots for {what} of {routine}: {source}")]
    AllocationError {
        what: &'static str,
        routine: InternedString,
        requested: usize,
        source: TryReserveError,
    },
    #[error(
        "copying a locals mapping back into the slot array is no longer supported; \
         write through the frame locals proxy instead"
    )]
    LocalsToFastUnsupported,
    #[error("generator '{name}' is already executing")]
    GeneratorAlreadyExecuting { name: InternedString },
    #[error("generator '{name}' has already finished")]
    GeneratorExhausted { name: InternedString },
    #[error("[At line {line}] the trace function failed: {msg}")]
    TraceFunctionError { line: usize, msg: String },
}

pub type Result<T> = std::result::Result<T, Error>;
