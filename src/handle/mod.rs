//! The owning mesh handle.
//!
//! [`Stl`] owns exactly one engine record for its whole life. Every method
//! that reaches the engine checks the handle state first, then drains the
//! error flag right after the call (see [`signal`]). A failed load, merge or
//! repair leaves the handle [`HandleState::Failed`]: it can still be
//! inspected and closed, but nothing else.
//!
//! ```no_run
//! use stl_handle::prelude::*;
//!
//! # fn main() -> Result<(), MeshError> {
//! let mut stl = Stl::open("part.stl")?;
//! stl.translate((10, 20, 30))?.scale(25.4)?;
//! stl.repair(&RepairOptions { verbose: false, ..Default::default() })?;
//! let mut preview = stl.pure().rotate_z(90.0)?;
//! preview.write_binary("preview.stl", DEFAULT_LABEL)?;
//! # Ok(())
//! # }
//! ```

pub mod axis;
mod clone;
pub mod pure;
pub mod records;
pub mod repair;
pub(crate) mod signal;
pub mod vector;

use crate::mesh_error::MeshError;
use crate::native::{StlFile, api};
use axis::{Axis, IntoAxis, IntoPlane, Plane};
use records::{Facet, Stats};
use repair::RepairOptions;
use signal::Failure;
use std::ffi::CString;
use std::fmt;
use std::os::raw::c_char;
use std::path::Path;
use std::ptr::NonNull;
use vector::{VectorArg, normalize};

/// Label written by the STL and DXF writers when callers have no better one.
pub const DEFAULT_LABEL: &str = "admesh";

/// Lifecycle of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleState {
    /// Allocated but neither initialized nor loaded.
    Uninitialized,
    Initialized,
    /// A mutating call failed; the mesh may be inconsistent.
    Failed,
    /// Native storage has been released.
    Closed,
}

impl HandleState {
    pub fn as_str(self) -> &'static str {
        match self {
            HandleState::Uninitialized => "uninitialized",
            HandleState::Initialized => "initialized",
            HandleState::Failed => "failed",
            HandleState::Closed => "closed",
        }
    }
}

impl fmt::Display for HandleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An STL mesh backed by the native engine.
pub struct Stl {
    raw: NonNull<StlFile>,
    state: HandleState,
    /// Exact adjacency has been computed.
    exact: bool,
    /// The shared vertex table is current.
    shared: bool,
}

fn c_text(what: &str, text: &str) -> Result<CString, MeshError> {
    CString::new(text)
        .map_err(|_| MeshError::InvalidArgument(format!("{what} contains a NUL byte")))
}

fn finite_angle(degrees: f32) -> Result<f32, MeshError> {
    if degrees.is_finite() {
        Ok(degrees)
    } else {
        Err(MeshError::InvalidArgument(format!("rotation angle must be finite, got {degrees}")))
    }
}

fn c_path(path: &Path) -> Result<CString, MeshError> {
    let text = path.to_str().ok_or_else(|| {
        MeshError::InvalidArgument(format!("path {} is not valid UTF-8", path.display()))
    })?;
    c_text("path", text)
}

impl Stl {
    /// A handle with a zeroed record. Call [`init`](Self::init) or
    /// [`load`](Self::load) before anything else.
    pub fn uninitialized() -> Self {
        let raw = NonNull::from(Box::leak(Box::new(StlFile::zeroed())));
        Self {
            raw,
            state: HandleState::Uninitialized,
            exact: false,
            shared: false,
        }
    }

    /// An empty in-memory mesh.
    pub fn new() -> Result<Self, MeshError> {
        let mut stl = Self::uninitialized();
        stl.init()?;
        Ok(stl)
    }

    /// Loads an ASCII or binary STL file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MeshError> {
        let mut stl = Self::uninitialized();
        stl.load(path)?;
        Ok(stl)
    }

    pub fn init(&mut self) -> Result<&mut Self, MeshError> {
        self.expect(HandleState::Uninitialized, "init")?;
        self.call(|stl| unsafe { api::stl_initialize(stl) });
        self.settle(Failure::NoMemory, || "Could not initialize".to_string())?;
        self.state = HandleState::Initialized;
        log::debug!("initialized empty mesh");
        Ok(self)
    }

    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, MeshError> {
        let path = path.as_ref();
        self.expect(HandleState::Uninitialized, "load")?;
        let c = c_path(path)?;
        self.call(|stl| unsafe { api::stl_open(stl, c.as_ptr()) });
        self.settle(Failure::Io, || format!("Could not open {}", path.display()))?;
        self.state = HandleState::Initialized;
        log::debug!("loaded {}: {} facets", path.display(), self.len());
        Ok(self)
    }

    /// Releases native storage. Safe to call any number of times and in any
    /// state; `Drop` calls it too.
    pub fn close(&mut self) {
        if self.state == HandleState::Closed {
            return;
        }
        self.call(|stl| unsafe { api::stl_close(stl) });
        log::debug!("closed {} handle", self.state);
        self.state = HandleState::Closed;
        self.exact = false;
        self.shared = false;
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    /// Whether the engine's error flag is raised. Only ever true between a
    /// native call and the drain that follows it, or after manual tampering.
    pub fn error_flag(&self) -> bool {
        unsafe { api::stl_get_error(self.raw.as_ptr()) != 0 }
    }

    /// Lowers the engine's error flag without reporting it.
    pub fn clear_error(&mut self) -> &mut Self {
        self.call(|stl| unsafe { api::stl_clear_error(stl) });
        self
    }

    pub fn is_exact(&self) -> bool {
        self.exact
    }

    pub fn has_shared_vertices(&self) -> bool {
        self.shared
    }

    pub fn stats(&self) -> Stats {
        records::read_stats(self.file())
    }

    /// Number of facets.
    pub fn len(&self) -> usize {
        self.file().facet_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn facet(&self, index: usize) -> Result<Facet, MeshError> {
        self.ready("read a facet")?;
        records::read_facet(self.file(), index)
    }

    /// Walks every facet in storage order.
    pub fn facets(&self) -> Facets<'_> {
        let len = if self.state == HandleState::Initialized { self.len() } else { 0 };
        Facets { stl: self, next: 0, len }
    }

    pub fn to_vec(&self) -> Vec<Facet> {
        self.facets().collect()
    }

    pub fn calculate_volume(&mut self) -> Result<&mut Self, MeshError> {
        self.mutate("calculate_volume", |stl| unsafe { api::stl_calculate_volume(stl) })
    }

    pub fn write_ascii(
        &mut self,
        path: impl AsRef<Path>,
        label: &str,
    ) -> Result<&mut Self, MeshError> {
        let label = c_text("label", label)?;
        self.export("write_ascii", path.as_ref(), |stl, p| unsafe {
            api::stl_write_ascii(stl, p, label.as_ptr())
        })
    }

    pub fn write_binary(
        &mut self,
        path: impl AsRef<Path>,
        label: &str,
    ) -> Result<&mut Self, MeshError> {
        let label = c_text("label", label)?;
        self.export("write_binary", path.as_ref(), |stl, p| unsafe {
            api::stl_write_binary(stl, p, label.as_ptr())
        })
    }

    pub fn write_obj(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, MeshError> {
        self.ensure_shared()?;
        self.export("write_obj", path.as_ref(), |stl, p| unsafe { api::stl_write_obj(stl, p) })
    }

    pub fn write_off(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, MeshError> {
        self.ensure_shared()?;
        self.export("write_off", path.as_ref(), |stl, p| unsafe { api::stl_write_off(stl, p) })
    }

    pub fn write_dxf(
        &mut self,
        path: impl AsRef<Path>,
        label: &str,
    ) -> Result<&mut Self, MeshError> {
        let label = c_text("label", label)?;
        self.export("write_dxf", path.as_ref(), |stl, p| unsafe {
            api::stl_write_dxf(stl, p, label.as_ptr())
        })
    }

    pub fn write_vrml(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, MeshError> {
        self.ensure_shared()?;
        self.export("write_vrml", path.as_ref(), |stl, p| unsafe { api::stl_write_vrml(stl, p) })
    }

    /// Links facets whose edges share two identical vertices and drops
    /// degenerate facets.
    pub fn check_facets_exact(&mut self) -> Result<&mut Self, MeshError> {
        self.reshape("check_facets_exact", |stl| unsafe { api::stl_check_facets_exact(stl) })?;
        self.exact = true;
        Ok(self)
    }

    /// Snaps almost-matching open edges within `tolerance` together.
    pub fn check_facets_nearby(&mut self, tolerance: f32) -> Result<&mut Self, MeshError> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(MeshError::InvalidArgument(format!(
                "tolerance must be a finite non-negative number, got {tolerance}"
            )));
        }
        self.ensure_exact()?;
        self.reshape("check_facets_nearby", |stl| unsafe {
            api::stl_check_facets_nearby(stl, tolerance)
        })
    }

    /// Drops facets that have no neighbor at all.
    pub fn remove_unconnected_facets(&mut self) -> Result<&mut Self, MeshError> {
        self.ensure_exact()?;
        self.reshape("remove_unconnected_facets", |stl| unsafe {
            api::stl_remove_unconnected_facets(stl)
        })
    }

    /// Checks the adjacency table; inconsistencies are logged.
    pub fn verify_neighbors(&mut self) -> Result<&mut Self, MeshError> {
        self.ensure_exact()?;
        self.mutate("verify_neighbors", |stl| unsafe { api::stl_verify_neighbors(stl) })
    }

    pub fn fill_holes(&mut self) -> Result<&mut Self, MeshError> {
        self.ensure_exact()?;
        self.reshape("fill_holes", |stl| unsafe { api::stl_fill_holes(stl) })
    }

    /// Orients every part consistently and outwards.
    pub fn fix_normal_directions(&mut self) -> Result<&mut Self, MeshError> {
        self.ensure_exact()?;
        self.reshape("fix_normal_directions", |stl| unsafe {
            api::stl_fix_normal_directions(stl)
        })
    }

    /// Recomputes stored normals from the vertex winding.
    pub fn fix_normal_values(&mut self) -> Result<&mut Self, MeshError> {
        self.mutate("fix_normal_values", |stl| unsafe { api::stl_fix_normal_values(stl) })
    }

    pub fn reverse_all_facets(&mut self) -> Result<&mut Self, MeshError> {
        self.reshape("reverse_all_facets", |stl| unsafe { api::stl_reverse_all_facets(stl) })
    }

    /// Builds the deduplicated vertex table used by OBJ, OFF and VRML output.
    pub fn generate_shared_vertices(&mut self) -> Result<&mut Self, MeshError> {
        self.ensure_exact()?;
        self.mutate("generate_shared_vertices", |stl| unsafe {
            api::stl_generate_shared_vertices(stl)
        })?;
        self.shared = true;
        Ok(self)
    }

    /// Moves the mesh so its minimum corner lands on `target`. Missing
    /// mapping keys default to 0.
    pub fn translate(&mut self, target: impl Into<VectorArg>) -> Result<&mut Self, MeshError> {
        let v = normalize(target.into(), 0.0)?;
        self.reshape("translate", |stl| unsafe { api::stl_translate(stl, v.x, v.y, v.z) })
    }

    /// Moves the mesh by `offset`. Missing mapping keys default to 0.
    pub fn translate_relative(
        &mut self,
        offset: impl Into<VectorArg>,
    ) -> Result<&mut Self, MeshError> {
        let v = normalize(offset.into(), 0.0)?;
        self.reshape("translate_relative", |stl| unsafe {
            api::stl_translate_relative(stl, v.x, v.y, v.z)
        })
    }

    pub fn scale(&mut self, factor: f32) -> Result<&mut Self, MeshError> {
        if !factor.is_finite() {
            return Err(MeshError::InvalidArgument(format!(
                "scale factor must be finite, got {factor}"
            )));
        }
        self.reshape("scale", |stl| unsafe { api::stl_scale(stl, factor) })
    }

    /// Scales each axis separately. Missing mapping keys default to 1.
    pub fn scale_versor(&mut self, versor: impl Into<VectorArg>) -> Result<&mut Self, MeshError> {
        let v = normalize(versor.into(), 1.0)?.to_array();
        self.reshape("scale_versor", |stl| unsafe { api::stl_scale_versor(stl, v.as_ptr()) })
    }

    /// Rotates counter-clockwise about X, looking from +X towards the origin.
    pub fn rotate_x(&mut self, degrees: f32) -> Result<&mut Self, MeshError> {
        let degrees = finite_angle(degrees)?;
        self.reshape("rotate_x", |stl| unsafe { api::stl_rotate_x(stl, degrees) })
    }

    pub fn rotate_y(&mut self, degrees: f32) -> Result<&mut Self, MeshError> {
        let degrees = finite_angle(degrees)?;
        self.reshape("rotate_y", |stl| unsafe { api::stl_rotate_y(stl, degrees) })
    }

    pub fn rotate_z(&mut self, degrees: f32) -> Result<&mut Self, MeshError> {
        let degrees = finite_angle(degrees)?;
        self.reshape("rotate_z", |stl| unsafe { api::stl_rotate_z(stl, degrees) })
    }

    pub fn rotate(&mut self, axis: impl IntoAxis, degrees: f32) -> Result<&mut Self, MeshError> {
        match axis.into_axis()? {
            Axis::X => self.rotate_x(degrees),
            Axis::Y => self.rotate_y(degrees),
            Axis::Z => self.rotate_z(degrees),
        }
    }

    /// Mirrors about the XY plane, negating every z.
    pub fn mirror_xy(&mut self) -> Result<&mut Self, MeshError> {
        self.reshape("mirror_xy", |stl| unsafe { api::stl_mirror_xy(stl) })
    }

    /// Mirrors about the YZ plane, negating every x.
    pub fn mirror_yz(&mut self) -> Result<&mut Self, MeshError> {
        self.reshape("mirror_yz", |stl| unsafe { api::stl_mirror_yz(stl) })
    }

    /// Mirrors about the XZ plane, negating every y.
    pub fn mirror_xz(&mut self) -> Result<&mut Self, MeshError> {
        self.reshape("mirror_xz", |stl| unsafe { api::stl_mirror_xz(stl) })
    }

    pub fn mirror(&mut self, plane: impl IntoPlane) -> Result<&mut Self, MeshError> {
        match plane.into_plane()? {
            Plane::XY => self.mirror_xy(),
            Plane::YZ => self.mirror_yz(),
            Plane::XZ => self.mirror_xz(),
        }
    }

    /// Appends the facets of another STL file. No translation is applied.
    ///
    /// A failure leaves the handle [`HandleState::Failed`]; discard it.
    pub fn open_merge(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, MeshError> {
        let path = path.as_ref();
        self.ready("open_merge")?;
        let c = c_path(path)?;
        self.call(|stl| unsafe { api::stl_open_merge(stl, c.as_ptr()) });
        self.exact = false;
        self.shared = false;
        self.settle(Failure::Io, || format!("Could not open {}", path.display()))?;
        log::debug!("merged {}: now {} facets", path.display(), self.len());
        Ok(self)
    }

    /// Runs the composite repair selected by `opts`.
    pub fn repair(&mut self, opts: &RepairOptions) -> Result<&mut Self, MeshError> {
        self.ready("repair")?;
        let p = opts.encode()?;
        self.call(|stl| unsafe {
            api::stl_repair(
                stl,
                p.fixall,
                p.exact,
                p.tolerance_flag,
                p.tolerance,
                p.increment_flag,
                p.increment,
                p.nearby,
                p.iterations,
                p.remove_unconnected,
                p.fill_holes,
                p.normal_directions,
                p.normal_values,
                p.reverse_all,
                p.verbose,
            )
        });
        self.shared = false;
        self.settle(Failure::Operation, || "something went wrong during repair".to_string())?;
        if opts.requires_exact() {
            self.exact = true;
        }
        Ok(self)
    }

    fn file(&self) -> &StlFile {
        unsafe { self.raw.as_ref() }
    }

    fn call(&mut self, f: impl FnOnce(*mut StlFile)) {
        f(self.raw.as_ptr())
    }

    fn expect(&self, state: HandleState, operation: &'static str) -> Result<(), MeshError> {
        if self.state == state {
            Ok(())
        } else {
            Err(MeshError::InvalidState {
                state: self.state.as_str(),
                operation,
            })
        }
    }

    fn ready(&self, operation: &'static str) -> Result<(), MeshError> {
        self.expect(HandleState::Initialized, operation)
    }

    /// Drains the flag after a state-changing call; failure poisons the
    /// handle.
    fn settle(
        &mut self,
        failure: Failure,
        message: impl FnOnce() -> String,
    ) -> Result<(), MeshError> {
        let res = unsafe { signal::drain(self.raw.as_ptr(), failure, message) };
        if res.is_err() {
            self.state = HandleState::Failed;
        }
        res
    }

    fn mutate(
        &mut self,
        operation: &'static str,
        f: impl FnOnce(*mut StlFile),
    ) -> Result<&mut Self, MeshError> {
        self.ready(operation)?;
        self.call(f);
        self.settle(Failure::Operation, || format!("{operation} failed"))?;
        Ok(self)
    }

    /// Like [`mutate`](Self::mutate) for calls that move vertices or change
    /// topology, which invalidate the shared vertex table.
    fn reshape(
        &mut self,
        operation: &'static str,
        f: impl FnOnce(*mut StlFile),
    ) -> Result<&mut Self, MeshError> {
        self.ready(operation)?;
        self.call(f);
        self.call(|stl| unsafe { api::stl_invalidate_shared_vertices(stl) });
        self.shared = false;
        self.settle(Failure::Operation, || format!("{operation} failed"))?;
        Ok(self)
    }

    /// Writers leave the handle usable when they fail.
    fn export(
        &mut self,
        operation: &'static str,
        path: &Path,
        f: impl FnOnce(*mut StlFile, *const c_char),
    ) -> Result<&mut Self, MeshError> {
        self.ready(operation)?;
        let c = c_path(path)?;
        f(self.raw.as_ptr(), c.as_ptr());
        unsafe {
            signal::drain(self.raw.as_ptr(), Failure::Io, || {
                format!("Could not write to {}", path.display())
            })
        }?;
        log::debug!("{operation}: wrote {}", path.display());
        Ok(self)
    }

    /// Computes exact adjacency unless it is already current. Returns whether
    /// it had to run.
    fn ensure_exact(&mut self) -> Result<bool, MeshError> {
        if self.exact {
            return Ok(false);
        }
        self.check_facets_exact()?;
        Ok(true)
    }

    fn ensure_shared(&mut self) -> Result<(), MeshError> {
        if !self.shared {
            self.generate_shared_vertices()?;
        }
        Ok(())
    }
}

impl Drop for Stl {
    fn drop(&mut self) {
        self.close();
        // SAFETY: `raw` came from `Box::leak` in `uninitialized` and is
        // released only here.
        unsafe { drop(Box::from_raw(self.raw.as_ptr())) };
    }
}

impl fmt::Display for Stl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "STL header=\"{}\"", records::header_text(&self.file().stats.header))
    }
}

impl fmt::Debug for Stl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stl")
            .field("state", &self.state)
            .field("facets", &self.len())
            .field("exact", &self.exact)
            .field("shared", &self.shared)
            .finish()
    }
}

/// Iterator over facet snapshots, see [`Stl::facets`].
pub struct Facets<'a> {
    stl: &'a Stl,
    next: usize,
    len: usize,
}

impl Iterator for Facets<'_> {
    type Item = Facet;

    fn next(&mut self) -> Option<Facet> {
        if self.next >= self.len {
            return None;
        }
        let facet = records::read_facet(self.stl.file(), self.next).ok()?;
        self.next += 1;
        Some(facet)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.len - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Facets<'_> {}

impl<'a> IntoIterator for &'a Stl {
    type Item = Facet;
    type IntoIter = Facets<'a>;

    fn into_iter(self) -> Facets<'a> {
        self.facets()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Stl {
        Stl::open(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/block.stl")).unwrap()
    }

    #[test]
    fn operations_before_init_are_refused() {
        let mut stl = Stl::uninitialized();
        assert_eq!(stl.state(), HandleState::Uninitialized);
        assert_eq!(
            stl.scale(2.0).unwrap_err(),
            MeshError::InvalidState {
                state: "uninitialized",
                operation: "scale"
            }
        );
        stl.init().unwrap();
        assert!(stl.is_empty());
        assert!(matches!(stl.init(), Err(MeshError::InvalidState { .. })));
    }

    #[test]
    fn close_is_idempotent() {
        let mut stl = fixture();
        stl.close();
        stl.close();
        assert_eq!(stl.state(), HandleState::Closed);
        assert!(stl.facet(0).is_err());
        assert_eq!(stl.facets().count(), 0);
    }

    #[test]
    fn repair_marks_adjacency_exact() {
        let mut stl = fixture();
        assert!(!stl.is_exact());
        stl.repair(&RepairOptions {
            verbose: false,
            ..Default::default()
        })
        .unwrap();
        assert!(stl.is_exact());
        let degenerate = stl.stats().counters.degenerate_facets;
        assert_eq!(stl.ensure_exact(), Ok(false));
        assert_eq!(stl.stats().counters.degenerate_facets, degenerate);
    }

    #[test]
    fn exactness_is_computed_on_demand() {
        let mut stl = fixture();
        assert_eq!(stl.ensure_exact(), Ok(true));
        assert_eq!(stl.ensure_exact(), Ok(false));
        stl.open_merge(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/block.stl"))
            .unwrap();
        assert!(!stl.is_exact());
    }

    #[test]
    fn geometry_changes_drop_shared_vertices() {
        let mut stl = fixture();
        stl.generate_shared_vertices().unwrap();
        assert!(stl.has_shared_vertices());
        assert_eq!(stl.stats().counters.shared_vertices, 8);
        stl.translate_relative((1, 0, 0)).unwrap();
        assert!(!stl.has_shared_vertices());
        assert_eq!(stl.stats().counters.shared_vertices, 0);
    }

    #[test]
    fn failed_merge_poisons_the_handle() {
        let mut stl = fixture();
        let err = stl.open_merge("/nonexistent/other.stl").unwrap_err();
        assert!(matches!(err, MeshError::Io(_)));
        assert_eq!(stl.state(), HandleState::Failed);
        assert!(!stl.error_flag());
        assert!(matches!(stl.scale(2.0), Err(MeshError::InvalidState { state: "failed", .. })));
    }

    #[test]
    fn failed_write_keeps_the_handle_usable() {
        let mut stl = fixture();
        let err = stl.write_ascii("/nonexistent/dir/out.stl", DEFAULT_LABEL).unwrap_err();
        assert!(matches!(err, MeshError::Io(_)));
        assert_eq!(stl.state(), HandleState::Initialized);
        stl.scale(2.0).unwrap();
    }
}
