//! The mesh engine behind a C ABI.
//!
//! The wrapper in [`crate::handle`] talks to this module the way it would
//! talk to a shared library: it allocates an all-zero [`StlFile`], passes a
//! raw pointer to the `stl_*` entry points in [`api`], and polls the sticky
//! `error` byte afterwards. Nothing outside this module touches the arrays
//! hanging off the record except through those entry points, plus the
//! read-only views and bulk copies the wrapper performs for marshaling and
//! cloning.
//!
//! Storage is managed with [`alloc`], a malloc-style allocator that keeps the
//! block size in a header so `realloc` and `free` need only the pointer.

pub mod alloc;
pub mod api;
mod connect;
mod file;
mod format;
pub mod layout;
mod shared;
mod transform;

pub use layout::{
    HEADER_SIZE, LABEL_SIZE, STL_ASCII, STL_BINARY, STL_INMEMORY, StlFacet, StlFile, StlNeighbors,
    StlStats, StlVIndices, StlVertex,
};
