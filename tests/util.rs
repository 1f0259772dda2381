#![allow(dead_code)]
use std::path::PathBuf;
use stl_handle::prelude::*;

/// The 12-facet unit cube with header `solid  admesh`.
pub const BLOCK: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/block.stl");

pub fn block() -> Stl {
    Stl::open(BLOCK).unwrap()
}

/// A path in cargo's scratch directory for integration tests.
pub fn scratch(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name)
}

pub fn quiet() -> RepairOptions {
    RepairOptions {
        verbose: false,
        ..Default::default()
    }
}

/// Assert two floats agree to `eps`.
pub fn assert_close(got: f32, want: f32, eps: f32) {
    assert!((got - want).abs() <= eps, "got {got}, want {want} (eps {eps})");
}

pub fn assert_vec_close(got: Vector3, want: Vector3, eps: f32) {
    assert_close(got.x, want.x, eps);
    assert_close(got.y, want.y, eps);
    assert_close(got.z, want.z, eps);
}

pub fn vector(x: f32, y: f32, z: f32) -> Vector3 {
    Vector3::new(x, y, z)
}

pub type Triangle = [[f32; 3]; 3];

/// Corners of the fixture cube, outward wound, in file order.
pub const CUBE: [Triangle; 12] = [
    [[0.0, 1.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0]],
    [[0.0, 1.0, 1.0], [0.0, 0.0, 1.0], [1.0, 0.0, 1.0]],
    [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0]],
    [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]],
    [[0.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
    [[1.0, 0.0, 1.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
    [[1.0, 0.0, 1.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
    [[1.0, 1.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 0.0]],
    [[1.0, 1.0, 1.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
    [[0.0, 1.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 0.0]],
    [[0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0]],
    [[0.0, 0.0, 0.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0]],
];

/// Writes `facets` as an ASCII STL in the scratch directory. Stored normals
/// are left at zero.
pub fn write_mesh(name: &str, facets: &[Triangle]) -> PathBuf {
    let mut text = String::from("solid  test\n");
    for tri in facets {
        text.push_str("  facet normal 0 0 0\n    outer loop\n");
        for [x, y, z] in tri {
            text.push_str(&format!("      vertex {x} {y} {z}\n"));
        }
        text.push_str("    endloop\n  endfacet\n");
    }
    text.push_str("endsolid  test\n");
    let path = scratch(name);
    std::fs::write(&path, text).unwrap();
    path
}
