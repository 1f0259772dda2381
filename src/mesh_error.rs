//! MeshError: unified error type for stl-handle public APIs
//!
//! Native failures arrive as a single sticky flag; the handle drains it and
//! turns it into one of the native-signalled variants below. Argument and
//! index errors are raised by the wrapper before any native call.

use thiserror::Error;

/// Unified error type for mesh handle operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// Opening, reading or writing a path failed.
    #[error("I/O error: {0}")]
    Io(String),
    /// The engine could not allocate backing storage.
    #[error("Out of memory: {0}")]
    NoMemory(String),
    /// A native operation (repair and friends) reported failure.
    #[error("Operation failed: {0}")]
    Operation(String),
    /// Malformed vector, axis or plane argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Wrong number of arguments for a vector or plane.
    #[error("wrong number of arguments ({given} for {expected})")]
    ArgumentCount { given: usize, expected: &'static str },
    /// Facet access outside `0..len`.
    #[error("index {index} outside of STL bounds: 0..{len}")]
    IndexOutOfBounds { index: usize, len: usize },
    /// The handle is not in a state that allows the operation.
    #[error("cannot {operation} on a handle that is {state}")]
    InvalidState {
        state: &'static str,
        operation: &'static str,
    },
}

/// Convenience alias used across the crate.
pub type Result<T, E = MeshError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let e = MeshError::IndexOutOfBounds { index: 13, len: 12 };
        assert_eq!(e.to_string(), "index 13 outside of STL bounds: 0..12");
        let e = MeshError::ArgumentCount {
            given: 2,
            expected: "1 or 3",
        };
        assert_eq!(e.to_string(), "wrong number of arguments (2 for 1 or 3)");
    }
}
