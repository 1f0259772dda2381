//! Safe views and storage management over a raw [`StlFile`].

use super::alloc;
use super::layout::{HEADER_SIZE, StlFacet, StlFile, StlNeighbors, StlVertex};
use std::os::raw::c_int;
use std::{ptr, slice};

impl StlFile {
    #[inline]
    pub(crate) fn facet_count(&self) -> usize {
        usize::try_from(self.stats.number_of_facets).unwrap_or(0)
    }

    pub(crate) fn facets(&self) -> &[StlFacet] {
        let n = self.facet_count();
        if self.facet_start.is_null() || n == 0 {
            return &[];
        }
        unsafe { slice::from_raw_parts(self.facet_start, n) }
    }

    pub(crate) fn facets_mut(&mut self) -> &mut [StlFacet] {
        let n = self.facet_count();
        if self.facet_start.is_null() || n == 0 {
            return &mut [];
        }
        unsafe { slice::from_raw_parts_mut(self.facet_start, n) }
    }

    pub(crate) fn neighbors(&self) -> &[StlNeighbors] {
        let n = self.facet_count();
        if self.neighbors_start.is_null() || n == 0 {
            return &[];
        }
        unsafe { slice::from_raw_parts(self.neighbors_start, n) }
    }

    pub(crate) fn facets_and_neighbors_mut(&mut self) -> (&mut [StlFacet], &mut [StlNeighbors]) {
        let n = self.facet_count();
        if self.facet_start.is_null() || self.neighbors_start.is_null() || n == 0 {
            return (&mut [], &mut []);
        }
        unsafe {
            (
                slice::from_raw_parts_mut(self.facet_start, n),
                slice::from_raw_parts_mut(self.neighbors_start, n),
            )
        }
    }

    /// Sets the sticky error flag.
    #[inline]
    pub(crate) fn raise(&mut self) {
        self.error = 1;
    }

    #[inline]
    pub(crate) fn raised(&self) -> bool {
        self.error != 0
    }

    /// Resizes facet and neighbor storage to `number_of_facets`, keeping the
    /// existing prefix. New neighbor slots start unconnected.
    pub(crate) fn reallocate(&mut self) -> bool {
        let n = self.facet_count();
        let old = unsafe { alloc::capacity(self.neighbors_start) };
        let facets = unsafe { alloc::realloc(self.facet_start, n) };
        if facets.is_null() {
            return false;
        }
        self.facet_start = facets;
        let neighbors = unsafe { alloc::realloc(self.neighbors_start, n) };
        if neighbors.is_null() {
            return false;
        }
        self.neighbors_start = neighbors;
        for i in old.min(n)..n {
            unsafe { neighbors.add(i).write(StlNeighbors::UNCONNECTED) };
        }
        self.stats.facets_malloced = c_int::try_from(n).unwrap_or(c_int::MAX);
        self.stats.malloced += 1;
        true
    }

    /// Appends facets, growing storage as needed.
    pub(crate) fn push_facets(&mut self, new: &[StlFacet]) -> bool {
        let start = self.facet_count();
        let Ok(total) = c_int::try_from(start + new.len()) else {
            return false;
        };
        self.stats.number_of_facets = total;
        if !self.reallocate() {
            self.stats.number_of_facets = start as c_int;
            return false;
        }
        self.facets_mut()[start..].copy_from_slice(new);
        true
    }

    /// Compacts storage to the facets for which `keep` holds and returns how
    /// many were dropped. Adjacency is reset.
    pub(crate) fn retain_facets(&mut self, keep: impl Fn(usize, &StlFacet) -> bool) -> usize {
        let kept: Vec<StlFacet> = self
            .facets()
            .iter()
            .enumerate()
            .filter(|(i, f)| keep(*i, f))
            .map(|(_, f)| *f)
            .collect();
        let dropped = self.facet_count() - kept.len();
        if dropped == 0 {
            return 0;
        }
        self.facets_mut()[..kept.len()].copy_from_slice(&kept);
        self.stats.number_of_facets = kept.len() as c_int;
        let (_, neighbors) = self.facets_and_neighbors_mut();
        neighbors.fill(StlNeighbors::UNCONNECTED);
        dropped
    }

    /// Frees every array hanging off the record. Safe on a zeroed record.
    pub(crate) fn release(&mut self) {
        unsafe {
            alloc::free(self.facet_start);
            alloc::free(self.neighbors_start);
            alloc::free(self.v_indices);
            alloc::free(self.v_shared);
        }
        self.facet_start = ptr::null_mut();
        self.neighbors_start = ptr::null_mut();
        self.v_indices = ptr::null_mut();
        self.v_shared = ptr::null_mut();
        self.stats.freed += 1;
    }

    /// Recomputes min/max/size and the bounding diameter from the facets.
    pub(crate) fn update_bounds(&mut self) {
        let mut vertices = self.facets().iter().flat_map(|f| f.vertex.iter());
        let Some(first) = vertices.next().copied() else {
            self.stats.min = StlVertex::default();
            self.stats.max = StlVertex::default();
            self.stats.size = StlVertex::default();
            self.stats.bounding_diameter = 0.0;
            return;
        };
        let (mut min, mut max) = (first, first);
        for v in vertices {
            for axis in 0..3 {
                let c = v.component(axis);
                let lo = min.component_mut(axis);
                *lo = lo.min(c);
                let hi = max.component_mut(axis);
                *hi = hi.max(c);
            }
        }
        let size = StlVertex::new(max.x - min.x, max.y - min.y, max.z - min.z);
        self.stats.min = min;
        self.stats.max = max;
        self.stats.size = size;
        self.stats.bounding_diameter = (size.x * size.x + size.y * size.y + size.z * size.z).sqrt();
    }

    /// Stores `text` in the fixed-size header buffer, truncated and
    /// NUL-terminated.
    pub(crate) fn set_header(&mut self, text: &[u8]) {
        self.stats.header = [0; HEADER_SIZE];
        for (slot, &byte) in self
            .stats
            .header
            .iter_mut()
            .zip(text.iter().take(HEADER_SIZE - 1))
        {
            *slot = byte as _;
        }
    }
}
