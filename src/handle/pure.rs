//! Non-mutating counterparts of the mutating operations.
//!
//! `stl.pure().scale(10.0)` clones `stl`, scales the clone and returns it;
//! `stl` itself is untouched. The table below is the single list of
//! operations that get a counterpart. `clear_error` is deliberately absent:
//! it only lowers a flag on the receiver.

use super::Stl;
use super::axis::{IntoAxis, IntoPlane};
use super::repair::RepairOptions;
use super::vector::VectorArg;
use crate::mesh_error::MeshError;
use std::path::Path;

/// Borrowed view of a handle exposing the clone-then-apply operations.
#[derive(Debug, Clone, Copy)]
pub struct PureOps<'a>(&'a Stl);

impl Stl {
    pub fn pure(&self) -> PureOps<'_> {
        PureOps(self)
    }
}

macro_rules! pure_ops {
    ($( $(#[$doc:meta])* $name:ident ( $($arg:ident : $ty:ty),* ); )*) => {
        impl PureOps<'_> {
            /// Names of every operation with a pure counterpart.
            pub const OPERATIONS: &'static [&'static str] = &[$(stringify!($name)),*];

            $(
                $(#[$doc])*
                pub fn $name(&self, $($arg: $ty),*) -> Result<Stl, MeshError> {
                    let mut copy = self.0.try_clone()?;
                    copy.$name($($arg),*)?;
                    Ok(copy)
                }
            )*
        }
    };
}

pure_ops! {
    calculate_volume();
    check_facets_exact();
    check_facets_nearby(tolerance: f32);
    remove_unconnected_facets();
    verify_neighbors();
    fill_holes();
    fix_normal_directions();
    fix_normal_values();
    reverse_all_facets();
    generate_shared_vertices();
    /// See [`Stl::translate`].
    translate(target: impl Into<VectorArg>);
    translate_relative(offset: impl Into<VectorArg>);
    scale(factor: f32);
    /// See [`Stl::scale_versor`].
    scale_versor(versor: impl Into<VectorArg>);
    rotate_x(degrees: f32);
    rotate_y(degrees: f32);
    rotate_z(degrees: f32);
    rotate(axis: impl IntoAxis, degrees: f32);
    mirror_xy();
    mirror_yz();
    mirror_xz();
    mirror(plane: impl IntoPlane);
    /// A failure only discards the copy; the receiver stays usable.
    open_merge(path: impl AsRef<Path>);
    repair(opts: &RepairOptions);
}
