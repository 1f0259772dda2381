//! Owned snapshots of the engine's fixed-layout records.
//!
//! Everything here is copied out of native memory: a [`Stats`] or [`Facet`]
//! stays valid and unchanged however the handle is mutated afterwards.

use crate::mesh_error::MeshError;
use crate::native::{STL_ASCII, STL_BINARY, STL_INMEMORY, StlFacet, StlFile, StlStats, StlVertex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::mem::size_of;
use std::os::raw::{c_char, c_int, c_uint};

/// Size of one facet record in the engine's contiguous facet array.
pub const FACET_RECORD_SIZE: usize = size_of::<StlFacet>();

/// Three components, the canonical vector form on both sides of the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<StlVertex> for Vector3 {
    fn from(v: StlVertex) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Vector3> for StlVertex {
    fn from(v: Vector3) -> Self {
        StlVertex::new(v.x, v.y, v.z)
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Where the mesh came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StlType {
    Binary,
    Ascii,
    InMemory,
}

impl StlType {
    fn from_raw(kind: c_int) -> Option<Self> {
        match kind {
            STL_BINARY => Some(StlType::Binary),
            STL_ASCII => Some(StlType::Ascii),
            STL_INMEMORY => Some(StlType::InMemory),
            _ => None,
        }
    }
}

/// One triangle: outward normal, three corners and the two attribute bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Facet {
    pub normal: Vector3,
    pub vertex: [Vector3; 3],
    pub extra: [u8; 2],
}

impl From<&StlFacet> for Facet {
    fn from(f: &StlFacet) -> Self {
        Self {
            normal: f.normal.into(),
            vertex: f.vertex.map(Vector3::from),
            extra: f.extra,
        }
    }
}

/// Counters the engine maintains for itself. They are reported untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineCounters {
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

/// Snapshot of the statistics block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub header: String,
    #[serde(rename = "type")]
    pub kind: StlType,
    pub number_of_facets: usize,
    pub max: Vector3,
    pub min: Vector3,
    pub size: Vector3,
    pub bounding_diameter: f32,
    pub shortest_edge: f32,
    pub volume: f32,
    #[serde(flatten)]
    pub counters: EngineCounters,
}

/// Text up to the first NUL of a fixed-size character buffer.
pub(crate) fn header_text(raw: &[c_char]) -> String {
    let bytes: Vec<u8> = raw.iter().take_while(|&&c| c != 0).map(|&c| c as u8).collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

pub(crate) fn read_stats(file: &StlFile) -> Stats {
    let s: &StlStats = &file.stats;
    Stats {
        header: header_text(&s.header),
        kind: StlType::from_raw(s.kind).unwrap_or(StlType::InMemory),
        number_of_facets: file.facet_count(),
        max: s.max.into(),
        min: s.min.into(),
        size: s.size.into(),
        bounding_diameter: s.bounding_diameter,
        shortest_edge: s.shortest_edge,
        volume: s.volume,
        counters: EngineCounters {
            number_of_blocks: s.number_of_blocks,
            connected_edges: s.connected_edges,
            connected_facets_1_edge: s.connected_facets_1_edge,
            connected_facets_2_edge: s.connected_facets_2_edge,
            connected_facets_3_edge: s.connected_facets_3_edge,
            facets_w_1_bad_edge: s.facets_w_1_bad_edge,
            facets_w_2_bad_edge: s.facets_w_2_bad_edge,
            facets_w_3_bad_edge: s.facets_w_3_bad_edge,
            original_num_facets: s.original_num_facets,
            edges_fixed: s.edges_fixed,
            degenerate_facets: s.degenerate_facets,
            facets_removed: s.facets_removed,
            facets_added: s.facets_added,
            facets_reversed: s.facets_reversed,
            backwards_edges: s.backwards_edges,
            normals_fixed: s.normals_fixed,
            number_of_parts: s.number_of_parts,
            malloced: s.malloced,
            freed: s.freed,
            facets_malloced: s.facets_malloced,
            collisions: s.collisions,
            shared_vertices: s.shared_vertices,
            shared_malloced: s.shared_malloced,
        },
    }
}

/// Address of facet `index` inside the array starting at `base`.
///
/// # Safety
/// `base` must point to an array holding more than `index` facets.
pub(crate) unsafe fn facet_at(base: *const StlFacet, index: usize) -> *const StlFacet {
    unsafe { base.byte_add(index * FACET_RECORD_SIZE) }
}

/// Copies facet `index` out of native memory. Out-of-range indices fail
/// before any read.
pub(crate) fn read_facet(file: &StlFile, index: usize) -> Result<Facet, MeshError> {
    let len = file.facet_count();
    if index >= len || file.facet_start.is_null() {
        return Err(MeshError::IndexOutOfBounds { index, len });
    }
    let record = unsafe { facet_at(file.facet_start, index).read() };
    Ok(Facet::from(&record))
}
