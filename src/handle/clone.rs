//! Deep copies of a handle's native storage.

use super::Stl;
use super::signal::Failure;
use crate::mesh_error::MeshError;
use crate::native::api;
use std::ptr;

impl Stl {
    /// A fully independent copy: fresh record, fresh facet and neighbor
    /// arrays, nothing aliased with `self`. The shared vertex table is not
    /// copied and is regenerated on demand.
    pub fn try_clone(&self) -> Result<Stl, MeshError> {
        self.ready("clone")?;
        let mut copy = Stl::new()?;
        let (src, dst) = (self.raw.as_ptr(), copy.raw.as_ptr());
        unsafe {
            (*dst).fp = (*src).fp;
            (*dst).m = (*src).m;
            (*dst).error = (*src).error;
            ptr::copy_nonoverlapping(&raw const (*src).stats, &raw mut (*dst).stats, 1);
            (*dst).stats.shared_vertices = 0;
            (*dst).stats.shared_malloced = 0;
            api::stl_reallocate(dst);
        }
        copy.settle(Failure::NoMemory, || "could not clone".to_string())?;

        let n = self.len();
        unsafe {
            let (from, to) = ((*src).facet_start, (*dst).facet_start);
            if n > 0 && !from.is_null() && !to.is_null() {
                ptr::copy_nonoverlapping(from, to, n);
            }
            let (from, to) = ((*src).neighbors_start, (*dst).neighbors_start);
            if n > 0 && !from.is_null() && !to.is_null() {
                ptr::copy_nonoverlapping(from, to, n);
            }
        }
        copy.exact = self.exact;
        log::debug!("cloned handle with {n} facets");
        Ok(copy)
    }
}
