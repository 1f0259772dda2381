//! malloc/realloc/free style storage for the engine's arrays.
//!
//! Each block carries a small header recording its byte size so that
//! [`free`] and [`realloc`] can rebuild the `Layout` from the pointer alone,
//! which is what lets arrays be handed around as bare pointers inside
//! [`StlFile`](super::StlFile).

use bytemuck::Zeroable;
use std::alloc::{self, Layout};
use std::mem::size_of;
use std::ptr;

const HEADER: usize = 16;
const ALIGN: usize = 16;

fn layout_for<T>(count: usize) -> Option<Layout> {
    let bytes = count.checked_mul(size_of::<T>())?.checked_add(HEADER)?;
    Layout::from_size_align(bytes, ALIGN).ok()
}

/// Allocates `count` zeroed elements. Returns null on failure.
pub unsafe fn calloc<T: Zeroable>(count: usize) -> *mut T {
    let Some(layout) = layout_for::<T>(count) else {
        return ptr::null_mut();
    };
    unsafe {
        let base = alloc::alloc_zeroed(layout);
        if base.is_null() {
            return ptr::null_mut();
        }
        (base as *mut usize).write(layout.size());
        base.add(HEADER) as *mut T
    }
}

/// Resizes a block to `count` elements, zeroing any new tail. A null `block`
/// behaves like [`calloc`]. On failure the old block is left untouched and
/// null is returned.
pub unsafe fn realloc<T: Zeroable>(block: *mut T, count: usize) -> *mut T {
    if block.is_null() {
        return unsafe { calloc(count) };
    }
    let Some(new_layout) = layout_for::<T>(count) else {
        return ptr::null_mut();
    };
    unsafe {
        let base = (block as *mut u8).sub(HEADER);
        let old_size = (base as *const usize).read();
        let old_layout = Layout::from_size_align_unchecked(old_size, ALIGN);
        let grown = alloc::realloc(base, old_layout, new_layout.size());
        if grown.is_null() {
            return ptr::null_mut();
        }
        if new_layout.size() > old_size {
            ptr::write_bytes(grown.add(old_size), 0, new_layout.size() - old_size);
        }
        (grown as *mut usize).write(new_layout.size());
        grown.add(HEADER) as *mut T
    }
}

/// Releases a block obtained from [`calloc`] or [`realloc`]. Null is a no-op.
pub unsafe fn free<T>(block: *mut T) {
    if block.is_null() {
        return;
    }
    unsafe {
        let base = (block as *mut u8).sub(HEADER);
        let size = (base as *const usize).read();
        alloc::dealloc(base, Layout::from_size_align_unchecked(size, ALIGN));
    }
}

/// Number of `T` elements the block can hold.
pub unsafe fn capacity<T>(block: *const T) -> usize {
    if block.is_null() || size_of::<T>() == 0 {
        return 0;
    }
    unsafe {
        let base = (block as *const u8).sub(HEADER);
        ((base as *const usize).read() - HEADER) / size_of::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::layout::StlFacet;

    #[test]
    fn realloc_preserves_prefix_and_zeroes_tail() {
        unsafe {
            let block = calloc::<u32>(2);
            assert!(!block.is_null());
            block.write(7);
            block.add(1).write(9);
            let grown = realloc(block, 5);
            assert_eq!(capacity(grown), 5);
            assert_eq!(grown.read(), 7);
            assert_eq!(grown.add(1).read(), 9);
            assert_eq!(grown.add(4).read(), 0);
            free(grown);
        }
    }

    #[test]
    fn null_block_is_tolerated() {
        unsafe {
            free::<StlFacet>(ptr::null_mut());
            assert_eq!(capacity::<StlFacet>(ptr::null()), 0);
            let fresh = realloc::<StlFacet>(ptr::null_mut(), 3);
            assert_eq!(capacity(fresh), 3);
            free(fresh);
        }
    }

    #[test]
    fn oversized_request_fails_cleanly() {
        unsafe {
            assert!(calloc::<StlFacet>(usize::MAX / 8).is_null());
        }
    }
}
