//! Draining the engine's sticky error flag into [`MeshError`].
//!
//! The engine has no structured errors: after a call that can fail the
//! caller reads the flag, and when it is set the caller clears it and picks
//! the error kind itself. Leaving the flag raised turns every later entry
//! point into a silent no-op, so [`drain`] always clears before returning.

use crate::mesh_error::MeshError;
use crate::native::StlFile;
use crate::native::api;

/// Which error a raised flag is reported as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Failure {
    Io,
    NoMemory,
    Operation,
}

impl Failure {
    pub(crate) fn into_error(self, message: String) -> MeshError {
        match self {
            Failure::Io => MeshError::Io(message),
            Failure::NoMemory => MeshError::NoMemory(message),
            Failure::Operation => MeshError::Operation(message),
        }
    }
}

/// Checks the flag after a native call. A raised flag is cleared and turned
/// into `failure` carrying `message`.
///
/// # Safety
/// `stl` must point to a live [`StlFile`].
pub(crate) unsafe fn drain(
    stl: *mut StlFile,
    failure: Failure,
    message: impl FnOnce() -> String,
) -> Result<(), MeshError> {
    if unsafe { api::stl_get_error(stl) } == 0 {
        return Ok(());
    }
    unsafe { api::stl_clear_error(stl) };
    let err = failure.into_error(message());
    log::warn!("native call failed: {err}");
    Err(err)
}
