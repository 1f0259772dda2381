//! # stl-handle
//!
//! stl-handle wraps a triangle-mesh (STL) processing engine behind a safe,
//! owning handle. The engine lives in [`native`] and is driven exactly as a C
//! library would be: through `#[repr(C)]` records, raw pointers and a sticky
//! error flag. The [`handle`] module is the safe layer on top.
//!
//! ## Features
//! - [`Stl`](handle::Stl): owns one native mesh, released exactly once on drop
//! - Typed errors drained from the engine's error flag ([`MeshError`](mesh_error::MeshError))
//! - Owned, serde-serializable snapshots of stats and facets
//! - Flexible vector, axis and plane arguments
//! - Composite repair configured by [`RepairOptions`](handle::repair::RepairOptions)
//! - Deep cloning and a pure (clone-then-apply) variant of every mutating operation
//! - Reading ASCII and binary STL; writing STL, OBJ, OFF, DXF and VRML
//!
//! ## Usage
//!
//! ```no_run
//! use stl_handle::prelude::*;
//!
//! # fn main() -> Result<(), MeshError> {
//! let mut stl = Stl::open("block.stl")?;
//! println!("{} facets, volume {}", stl.len(), stl.calculate_volume()?.stats().volume);
//! let mirrored = stl.pure().mirror(('z', 'x'))?;
//! assert_eq!(stl.len(), mirrored.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//! The crate logs through the `log` facade and never installs a logger:
//! lifecycle and file I/O at `debug`, drained engine failures at `warn`, the
//! verbose repair report at `info`.

pub mod handle;
pub mod mesh_error;
pub mod native;

/// A convenient prelude to import the most-used types & traits:
pub mod prelude {
    pub use crate::handle::axis::{Axis, IntoAxis, IntoPlane, Plane};
    pub use crate::handle::pure::PureOps;
    pub use crate::handle::records::{EngineCounters, Facet, Stats, StlType, Vector3};
    pub use crate::handle::repair::{RepairOptions, RepairParams};
    pub use crate::handle::vector::{PointLike, VectorArg};
    pub use crate::handle::{DEFAULT_LABEL, HandleState, Stl};
    pub use crate::mesh_error::MeshError;
}
