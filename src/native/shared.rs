//! Shared vertex table used by the indexed output formats.

use super::alloc;
use super::layout::{StlFile, StlVIndices, StlVertex};
use hashbrown::HashMap;
use std::os::raw::c_int;
use std::{ptr, slice};

impl StlFile {
    pub(crate) fn invalidate_shared_vertices(&mut self) {
        unsafe {
            alloc::free(self.v_indices);
            alloc::free(self.v_shared);
        }
        self.v_indices = ptr::null_mut();
        self.v_shared = ptr::null_mut();
        self.stats.shared_vertices = 0;
        self.stats.shared_malloced = 0;
    }

    /// Deduplicates facet vertices into `v_shared` and records per-facet
    /// indices in `v_indices`. Returns false on allocation failure.
    pub(crate) fn generate_shared_vertices(&mut self) -> bool {
        self.invalidate_shared_vertices();
        let mut seen: HashMap<[u32; 3], c_int> = HashMap::new();
        let mut table: Vec<StlVertex> = Vec::new();
        let indices: Vec<StlVIndices> = self
            .facets()
            .iter()
            .map(|f| StlVIndices {
                vertex: f.vertex.map(|v| {
                    *seen.entry(v.key()).or_insert_with(|| {
                        table.push(v);
                        (table.len() - 1) as c_int
                    })
                }),
            })
            .collect();

        unsafe {
            let v_indices = alloc::calloc::<StlVIndices>(indices.len());
            let v_shared = alloc::calloc::<StlVertex>(table.len());
            if v_indices.is_null() || v_shared.is_null() {
                alloc::free(v_indices);
                alloc::free(v_shared);
                return false;
            }
            ptr::copy_nonoverlapping(indices.as_ptr(), v_indices, indices.len());
            ptr::copy_nonoverlapping(table.as_ptr(), v_shared, table.len());
            self.v_indices = v_indices;
            self.v_shared = v_shared;
        }
        self.stats.shared_vertices = table.len() as c_int;
        self.stats.shared_malloced = table.len() as c_int;
        true
    }

    /// The shared table and indices, when generated.
    pub(crate) fn shared(&self) -> Option<(&[StlVertex], &[StlVIndices])> {
        if self.v_shared.is_null() || self.v_indices.is_null() {
            return None;
        }
        let vertices = usize::try_from(self.stats.shared_vertices).unwrap_or(0);
        unsafe {
            Some((
                slice::from_raw_parts(self.v_shared, vertices),
                slice::from_raw_parts(self.v_indices, self.facet_count()),
            ))
        }
    }
}
