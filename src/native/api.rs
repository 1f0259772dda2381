//! C ABI entry points.
//!
//! These are the only functions the wrapper calls. Each takes the raw
//! record pointer; a null pointer is ignored. Apart from `stl_get_error`,
//! `stl_clear_error` and `stl_close`, every entry point does nothing while
//! the error flag is set, and reports its own failures by setting it.

use super::format::{self, Encoding};
use super::layout::{STL_ASCII, STL_BINARY, STL_INMEMORY, StlFile, StlVertex};
use std::ffi::CStr;
use std::os::raw::{c_char, c_float, c_int};
use std::path::Path;

/// Borrows the record unless it is null or already failed.
unsafe fn live<'a>(stl: *mut StlFile) -> Option<&'a mut StlFile> {
    let stl = unsafe { stl.as_mut() }?;
    (!stl.raised()).then_some(stl)
}

unsafe fn text<'a>(stl: &mut StlFile, raw: *const c_char, what: &str) -> Option<&'a str> {
    if raw.is_null() {
        log::warn!("stl: null {what}");
        stl.raise();
        return None;
    }
    match unsafe { CStr::from_ptr(raw) }.to_str() {
        Ok(s) => Some(s),
        Err(_) => {
            log::warn!("stl: {what} is not valid UTF-8");
            stl.raise();
            None
        }
    }
}

pub unsafe extern "C" fn stl_get_error(stl: *const StlFile) -> c_int {
    unsafe { stl.as_ref() }.map_or(0, |s| c_int::from(s.raised()))
}

pub unsafe extern "C" fn stl_clear_error(stl: *mut StlFile) {
    if let Some(stl) = unsafe { stl.as_mut() } {
        stl.error = 0;
    }
}

pub unsafe extern "C" fn stl_initialize(stl: *mut StlFile) {
    let Some(stl) = (unsafe { live(stl) }) else {
        return;
    };
    stl.release();
    *stl = StlFile::zeroed();
    stl.stats.kind = STL_INMEMORY;
}

pub unsafe extern "C" fn stl_open(stl: *mut StlFile, path: *const c_char) {
    unsafe { stl_initialize(stl) };
    let Some(stl) = (unsafe { live(stl) }) else {
        return;
    };
    let Some(path) = (unsafe { text(stl, path, "path") }) else {
        return;
    };
    let parsed = match format::read_stl(Path::new(path)) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::warn!("stl_open: {path}: {e}");
            stl.raise();
            return;
        }
    };
    log::debug!(
        "stl_open: {path}: {} facets ({:?})",
        parsed.facets.len(),
        parsed.encoding
    );
    if !stl.push_facets(&parsed.facets) {
        log::warn!("stl_open: {path}: cannot allocate {} facets", parsed.facets.len());
        stl.raise();
        return;
    }
    stl.stats.kind = match parsed.encoding {
        Encoding::Binary => STL_BINARY,
        Encoding::Ascii => STL_ASCII,
    };
    stl.set_header(&parsed.header);
    stl.stats.original_num_facets = stl.stats.number_of_facets;
    stl.update_bounds();
}

pub unsafe extern "C" fn stl_open_merge(stl: *mut StlFile, path: *const c_char) {
    let Some(stl) = (unsafe { live(stl) }) else {
        return;
    };
    let Some(path) = (unsafe { text(stl, path, "path") }) else {
        return;
    };
    let parsed = match format::read_stl(Path::new(path)) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::warn!("stl_open_merge: {path}: {e}");
            stl.raise();
            return;
        }
    };
    stl.invalidate_shared_vertices();
    if !stl.push_facets(&parsed.facets) {
        log::warn!("stl_open_merge: {path}: cannot allocate merged facets");
        stl.raise();
        return;
    }
    stl.stats.original_num_facets = stl.stats.number_of_facets;
    stl.update_bounds();
}

pub unsafe extern "C" fn stl_close(stl: *mut StlFile) {
    if let Some(stl) = unsafe { stl.as_mut() } {
        stl.release();
    }
}

pub unsafe extern "C" fn stl_reallocate(stl: *mut StlFile) {
    let Some(stl) = (unsafe { live(stl) }) else {
        return;
    };
    if !stl.reallocate() {
        log::warn!("stl_reallocate: cannot allocate {} facets", stl.facet_count());
        stl.raise();
    }
}

fn write_result(stl: &mut StlFile, what: &str, path: &str, result: std::io::Result<()>) {
    match result {
        Ok(()) => log::debug!("{what}: wrote {path}"),
        Err(e) => {
            log::warn!("{what}: {path}: {e}");
            stl.raise();
        }
    }
}

pub unsafe extern "C" fn stl_write_ascii(
    stl: *mut StlFile,
    path: *const c_char,
    label: *const c_char,
) {
    let Some(stl) = (unsafe { live(stl) }) else {
        return;
    };
    let Some(path) = (unsafe { text(stl, path, "path") }) else {
        return;
    };
    let Some(label) = (unsafe { text(stl, label, "label") }) else {
        return;
    };
    let result = format::write_ascii(Path::new(path), label, stl.facets());
    write_result(stl, "stl_write_ascii", path, result);
}

pub unsafe extern "C" fn stl_write_binary(
    stl: *mut StlFile,
    path: *const c_char,
    label: *const c_char,
) {
    let Some(stl) = (unsafe { live(stl) }) else {
        return;
    };
    let Some(path) = (unsafe { text(stl, path, "path") }) else {
        return;
    };
    let Some(label) = (unsafe { text(stl, label, "label") }) else {
        return;
    };
    let result = format::write_binary(Path::new(path), label, stl.facets());
    write_result(stl, "stl_write_binary", path, result);
}

pub unsafe extern "C" fn stl_write_dxf(
    stl: *mut StlFile,
    path: *const c_char,
    label: *const c_char,
) {
    let Some(stl) = (unsafe { live(stl) }) else {
        return;
    };
    let Some(path) = (unsafe { text(stl, path, "path") }) else {
        return;
    };
    let Some(label) = (unsafe { text(stl, label, "label") }) else {
        return;
    };
    let result = format::write_dxf(Path::new(path), label, stl.facets());
    write_result(stl, "stl_write_dxf", path, result);
}

type IndexedWriter = fn(&Path, &[StlVertex], &[super::layout::StlVIndices]) -> std::io::Result<()>;

unsafe fn write_indexed(stl: *mut StlFile, path: *const c_char, what: &str, writer: IndexedWriter) {
    let Some(stl) = (unsafe { live(stl) }) else {
        return;
    };
    let Some(path) = (unsafe { text(stl, path, "path") }) else {
        return;
    };
    let result = match stl.shared() {
        Some((vertices, indices)) => writer(Path::new(path), vertices, indices),
        None => Err(std::io::Error::other("shared vertices have not been generated")),
    };
    write_result(stl, what, path, result);
}

pub unsafe extern "C" fn stl_write_obj(stl: *mut StlFile, path: *const c_char) {
    unsafe { write_indexed(stl, path, "stl_write_obj", format::write_obj) }
}

pub unsafe extern "C" fn stl_write_off(stl: *mut StlFile, path: *const c_char) {
    unsafe { write_indexed(stl, path, "stl_write_off", format::write_off) }
}

pub unsafe extern "C" fn stl_write_vrml(stl: *mut StlFile, path: *const c_char) {
    unsafe { write_indexed(stl, path, "stl_write_vrml", format::write_vrml) }
}

pub unsafe extern "C" fn stl_check_facets_exact(stl: *mut StlFile) {
    if let Some(stl) = unsafe { live(stl) } {
        stl.invalidate_shared_vertices();
        stl.check_facets_exact();
    }
}

pub unsafe extern "C" fn stl_check_facets_nearby(stl: *mut StlFile, tolerance: c_float) {
    if let Some(stl) = unsafe { live(stl) } {
        stl.invalidate_shared_vertices();
        stl.check_facets_nearby(tolerance);
    }
}

pub unsafe extern "C" fn stl_remove_unconnected_facets(stl: *mut StlFile) {
    if let Some(stl) = unsafe { live(stl) } {
        stl.invalidate_shared_vertices();
        stl.remove_unconnected_facets();
        stl.update_bounds();
    }
}

pub unsafe extern "C" fn stl_verify_neighbors(stl: *mut StlFile) {
    if let Some(stl) = unsafe { live(stl) } {
        let bad = stl.verify_neighbors();
        log::debug!("stl_verify_neighbors: {bad} inconsistent links");
    }
}

pub unsafe extern "C" fn stl_fill_holes(stl: *mut StlFile) {
    if let Some(stl) = unsafe { live(stl) } {
        stl.invalidate_shared_vertices();
        if !stl.fill_holes() {
            log::warn!("stl_fill_holes: cannot allocate patch facets");
            stl.raise();
        }
    }
}

pub unsafe extern "C" fn stl_fix_normal_directions(stl: *mut StlFile) {
    if let Some(stl) = unsafe { live(stl) } {
        stl.invalidate_shared_vertices();
        stl.fix_normal_directions();
    }
}

pub unsafe extern "C" fn stl_fix_normal_values(stl: *mut StlFile) {
    if let Some(stl) = unsafe { live(stl) } {
        stl.fix_normal_values();
    }
}

pub unsafe extern "C" fn stl_reverse_all_facets(stl: *mut StlFile) {
    if let Some(stl) = unsafe { live(stl) } {
        stl.invalidate_shared_vertices();
        stl.reverse_all_facets();
    }
}

pub unsafe extern "C" fn stl_translate(stl: *mut StlFile, x: c_float, y: c_float, z: c_float) {
    if let Some(stl) = unsafe { live(stl) } {
        stl.invalidate_shared_vertices();
        stl.translate(StlVertex::new(x, y, z));
    }
}

pub unsafe extern "C" fn stl_translate_relative(
    stl: *mut StlFile,
    x: c_float,
    y: c_float,
    z: c_float,
) {
    if let Some(stl) = unsafe { live(stl) } {
        stl.invalidate_shared_vertices();
        stl.translate_relative(StlVertex::new(x, y, z));
    }
}

/// `versor` points at three consecutive floats.
pub unsafe extern "C" fn stl_scale_versor(stl: *mut StlFile, versor: *const c_float) {
    let Some(stl) = (unsafe { live(stl) }) else {
        return;
    };
    if versor.is_null() {
        log::warn!("stl_scale_versor: null versor");
        stl.raise();
        return;
    }
    let versor = unsafe { versor.cast::<[c_float; 3]>().read_unaligned() };
    stl.invalidate_shared_vertices();
    stl.scale_versor(versor);
}

pub unsafe extern "C" fn stl_scale(stl: *mut StlFile, factor: c_float) {
    let versor = [factor; 3];
    unsafe { stl_scale_versor(stl, versor.as_ptr()) }
}

unsafe fn rotate(stl: *mut StlFile, axis: usize, angle: c_float) {
    if let Some(stl) = unsafe { live(stl) } {
        stl.invalidate_shared_vertices();
        stl.rotate(axis, angle);
    }
}

pub unsafe extern "C" fn stl_rotate_x(stl: *mut StlFile, angle: c_float) {
    unsafe { rotate(stl, 0, angle) }
}

pub unsafe extern "C" fn stl_rotate_y(stl: *mut StlFile, angle: c_float) {
    unsafe { rotate(stl, 1, angle) }
}

pub unsafe extern "C" fn stl_rotate_z(stl: *mut StlFile, angle: c_float) {
    unsafe { rotate(stl, 2, angle) }
}

unsafe fn mirror(stl: *mut StlFile, axis: usize) {
    if let Some(stl) = unsafe { live(stl) } {
        stl.invalidate_shared_vertices();
        stl.mirror(axis);
    }
}

/// Mirrors about the XY plane (negates z).
pub unsafe extern "C" fn stl_mirror_xy(stl: *mut StlFile) {
    unsafe { mirror(stl, 2) }
}

/// Mirrors about the YZ plane (negates x).
pub unsafe extern "C" fn stl_mirror_yz(stl: *mut StlFile) {
    unsafe { mirror(stl, 0) }
}

/// Mirrors about the XZ plane (negates y).
pub unsafe extern "C" fn stl_mirror_xz(stl: *mut StlFile) {
    unsafe { mirror(stl, 1) }
}

pub unsafe extern "C" fn stl_invalidate_shared_vertices(stl: *mut StlFile) {
    if let Some(stl) = unsafe { live(stl) } {
        stl.invalidate_shared_vertices();
    }
}

pub unsafe extern "C" fn stl_generate_shared_vertices(stl: *mut StlFile) {
    if let Some(stl) = unsafe { live(stl) } {
        if !stl.generate_shared_vertices() {
            log::warn!("stl_generate_shared_vertices: cannot allocate vertex table");
            stl.raise();
        }
    }
}

pub unsafe extern "C" fn stl_calculate_volume(stl: *mut StlFile) {
    if let Some(stl) = unsafe { live(stl) } {
        stl.calculate_volume();
    }
}

/// Composite repair. Flag arguments are 0 or 1; `tolerance` and
/// `increment` are only honoured when their flags are set.
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn stl_repair(
    stl: *mut StlFile,
    fixall_flag: c_int,
    exact_flag: c_int,
    tolerance_flag: c_int,
    tolerance: c_float,
    increment_flag: c_int,
    increment: c_float,
    nearby_flag: c_int,
    iterations: c_int,
    remove_unconnected_flag: c_int,
    fill_holes_flag: c_int,
    normal_directions_flag: c_int,
    normal_values_flag: c_int,
    reverse_all_flag: c_int,
    verbose_flag: c_int,
) {
    let Some(file) = (unsafe { live(stl) }) else {
        return;
    };
    let fixall = fixall_flag != 0;
    let on = |flag: c_int| fixall || flag != 0;
    file.invalidate_shared_vertices();

    if on(exact_flag)
        || on(nearby_flag)
        || on(remove_unconnected_flag)
        || on(fill_holes_flag)
        || on(normal_directions_flag)
    {
        file.check_facets_exact();
    }
    if on(nearby_flag) {
        let mut tolerance = if tolerance_flag != 0 { tolerance } else { file.stats.shortest_edge };
        let increment = if increment_flag != 0 {
            increment
        } else {
            file.stats.bounding_diameter / 10_000.0
        };
        for _ in 0..iterations.max(0) {
            if file.stats.connected_facets_3_edge >= file.stats.number_of_facets {
                break;
            }
            file.check_facets_nearby(tolerance);
            tolerance += increment;
        }
    }
    if on(remove_unconnected_flag)
        && file.stats.connected_facets_3_edge < file.stats.number_of_facets
    {
        file.remove_unconnected_facets();
    }
    if on(fill_holes_flag) && file.stats.connected_facets_3_edge < file.stats.number_of_facets {
        if !file.fill_holes() {
            log::warn!("stl_repair: cannot allocate patch facets");
            file.raise();
            return;
        }
    }
    if on(normal_directions_flag) {
        file.fix_normal_directions();
    }
    if on(normal_values_flag) {
        file.fix_normal_values();
    }
    if reverse_all_flag != 0 {
        file.reverse_all_facets();
    }
    file.update_bounds();
    file.calculate_volume();
    if verbose_flag != 0 {
        report(file);
    }
}

fn report(stl: &StlFile) {
    let s = &stl.stats;
    log::info!("stl_repair: {} facets ({} originally)", s.number_of_facets, s.original_num_facets);
    log::info!(
        "stl_repair: min ({}, {}, {}) max ({}, {}, {}) volume {}",
        s.min.x,
        s.min.y,
        s.min.z,
        s.max.x,
        s.max.y,
        s.max.z,
        s.volume
    );
    log::info!(
        "stl_repair: degenerate {} edges fixed {} removed {} added {} reversed {} parts {}",
        s.degenerate_facets,
        s.edges_fixed,
        s.facets_removed,
        s.facets_added,
        s.facets_reversed,
        s.number_of_parts
    );
}
