//! Fixed-layout records shared across the engine boundary.
//!
//! Every type here is `#[repr(C)]` and mirrors the record the engine reads
//! and writes in place. The wrapper never owns these records by value for
//! longer than a copy: it reads them through the raw pointers stored in
//! [`StlFile`] and converts them into owned snapshots.

use bytemuck::{Pod, Zeroable};
use std::os::raw::{c_char, c_int, c_uint, c_void};
use std::ptr;

/// Size of the label written into binary STL headers.
pub const LABEL_SIZE: usize = 80;
/// Size of the header buffer in [`StlStats`] (label plus terminating NUL).
pub const HEADER_SIZE: usize = LABEL_SIZE + 1;
/// On-disk size of one binary STL facet record.
pub const SIZEOF_STL_FACET: usize = 50;

pub const STL_BINARY: c_int = 0;
pub const STL_ASCII: c_int = 1;
pub const STL_INMEMORY: c_int = 2;

/// A point or a normal, three single precision components.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct StlVertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl StlVertex {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Bit pattern used for exact vertex matching; `-0.0` and `0.0` collapse.
    #[inline]
    pub fn key(&self) -> [u32; 3] {
        [
            (self.x + 0.0).to_bits(),
            (self.y + 0.0).to_bits(),
            (self.z + 0.0).to_bits(),
        ]
    }

    #[inline]
    pub fn component(&self, axis: usize) -> f32 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    #[inline]
    pub fn component_mut(&mut self, axis: usize) -> &mut f32 {
        match axis {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => &mut self.z,
        }
    }
}

/// One triangle: normal, three vertices and two attribute bytes.
///
/// `_align` is the trailing padding a C compiler would insert after
/// `extra`; it is spelled out so the record stays `Pod`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct StlFacet {
    pub normal: StlVertex,
    pub vertex: [StlVertex; 3],
    pub extra: [u8; 2],
    pub _align: [u8; 2],
}

/// Adjacency of one facet. `neighbor[i]` is the facet across edge `i`
/// (`vertex[i]` to `vertex[(i + 1) % 3]`) or `-1`. `which_vertex_not[i]` is
/// the index of the neighbor's vertex that is not on the shared edge, plus 3
/// when the neighbor runs the edge in the same direction.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct StlNeighbors {
    pub neighbor: [c_int; 3],
    pub which_vertex_not: [i8; 3],
    pub _align: u8,
}

impl StlNeighbors {
    pub const UNCONNECTED: Self = Self {
        neighbor: [-1; 3],
        which_vertex_not: [-1; 3],
        _align: 0,
    };

    pub fn connected_edges(&self) -> usize {
        self.neighbor.iter().filter(|&&n| n >= 0).count()
    }
}

impl Default for StlNeighbors {
    fn default() -> Self {
        Self::UNCONNECTED
    }
}

/// Indices into the shared vertex table for one facet.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct StlVIndices {
    pub vertex: [c_int; 3],
}

/// Statistics block. Counters after `volume` belong to the engine and are
/// passed through to callers untouched.
#[repr(C)]
#[derive(Copy, Clone, Zeroable)]
pub struct StlStats {
    pub header: [c_char; HEADER_SIZE],
    pub kind: c_int,
    pub number_of_facets: c_int,
    pub max: StlVertex,
    pub min: StlVertex,
    pub size: StlVertex,
    pub bounding_diameter: f32,
    pub shortest_edge: f32,
    pub volume: f32,
    pub number_of_blocks: c_uint,
    pub connected_edges: c_int,
    pub connected_facets_1_edge: c_int,
    pub connected_facets_2_edge: c_int,
    pub connected_facets_3_edge: c_int,
    pub facets_w_1_bad_edge: c_int,
    pub facets_w_2_bad_edge: c_int,
    pub facets_w_3_bad_edge: c_int,
    pub original_num_facets: c_int,
    pub edges_fixed: c_int,
    pub degenerate_facets: c_int,
    pub facets_removed: c_int,
    pub facets_added: c_int,
    pub facets_reversed: c_int,
    pub backwards_edges: c_int,
    pub normals_fixed: c_int,
    pub number_of_parts: c_int,
    pub malloced: c_int,
    pub freed: c_int,
    pub facets_malloced: c_int,
    pub collisions: c_int,
    pub shared_vertices: c_int,
    pub shared_malloced: c_int,
}

/// The engine's mesh record. The wrapper owns the allocation of this struct;
/// the engine owns every array hanging off it.
#[repr(C)]
pub struct StlFile {
    pub fp: *mut c_void,
    pub facet_start: *mut StlFacet,
    pub m: c_int,
    pub neighbors_start: *mut StlNeighbors,
    pub v_indices: *mut StlVIndices,
    pub v_shared: *mut StlVertex,
    pub stats: StlStats,
    pub error: c_char,
}

impl StlFile {
    /// An all-zero record, the state the engine expects before
    /// `stl_initialize` or `stl_open`.
    pub fn zeroed() -> Self {
        Self {
            fp: ptr::null_mut(),
            facet_start: ptr::null_mut(),
            m: 0,
            neighbors_start: ptr::null_mut(),
            v_indices: ptr::null_mut(),
            v_shared: ptr::null_mut(),
            stats: StlStats::zeroed(),
            error: 0,
        }
    }
}

mod layout_checks {
    //! Compile-time checks that the records keep their C layout. These hold
    //! in every build, not only under test.
    use super::*;
    use static_assertions::{assert_eq_align, assert_eq_size, const_assert_eq};
    use std::mem::offset_of;

    assert_eq_size!(StlVertex, [f32; 3]);
    assert_eq_size!(StlFacet, [u8; 52]);
    assert_eq_align!(StlFacet, f32);
    assert_eq_size!(StlNeighbors, [u8; 16]);
    assert_eq_size!(StlVIndices, [c_int; 3]);
    const_assert_eq!(offset_of!(StlFacet, vertex), 12);
    const_assert_eq!(offset_of!(StlFacet, extra), 48);
    const_assert_eq!(offset_of!(StlStats, kind), 84);
    const_assert_eq!(offset_of!(StlStats, number_of_facets), 88);
}

#[cfg(test)]
mod layout_tests {
    use super::*;

    #[test]
    fn vertex_key_ignores_sign_of_zero() {
        let a = StlVertex::new(0.0, -0.0, 1.0);
        let b = StlVertex::new(-0.0, 0.0, 1.0);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn unconnected_neighbors_have_no_edges() {
        assert_eq!(StlNeighbors::default().connected_edges(), 0);
    }
}
