mod util;
use stl_handle::prelude::*;
use util::*;

#[test]
fn block_stats() {
    let stl = block();
    let stats = stl.stats();
    assert_eq!(stats.number_of_facets, 12);
    assert_eq!(stats.header, "solid  admesh");
    assert_eq!(stats.kind, StlType::Ascii);
    assert_eq!(stats.size, vector(1.0, 1.0, 1.0));
    assert_eq!(stats.max, vector(1.0, 1.0, 1.0));
    assert_eq!(stats.min, vector(0.0, 0.0, 0.0));
    assert_eq!(stats.counters.original_num_facets, 12);
}

#[test]
fn volume_is_one() {
    let mut stl = block();
    assert_eq!(stl.calculate_volume().unwrap().stats().volume, 1.0);
}

#[test]
fn empty_handle_is_in_memory() {
    let stl = Stl::new().unwrap();
    assert_eq!(stl.state(), HandleState::Initialized);
    assert_eq!(stl.stats().kind, StlType::InMemory);
    assert!(stl.is_empty());
    assert_eq!(stl.to_string(), "STL header=\"\"");
}

#[test]
fn display_shows_header() {
    assert_eq!(block().to_string(), "STL header=\"solid  admesh\"");
}

#[test]
fn missing_file_is_io_error_and_flag_is_drained() {
    let mut stl = Stl::uninitialized();
    let err = stl.load("/nonexistent/block.stl").unwrap_err();
    assert!(matches!(err, MeshError::Io(ref m) if m.contains("/nonexistent/block.stl")));
    assert!(!stl.error_flag());
    assert_eq!(stl.state(), HandleState::Failed);
    assert!(Stl::open("/nonexistent/block.stl").is_err());
}

#[test]
fn garbage_file_is_io_error() {
    let path = scratch("garbage.stl");
    std::fs::write(&path, "this is not an stl file\n").unwrap();
    assert!(matches!(Stl::open(&path), Err(MeshError::Io(_))));
}

#[test]
fn facet_by_index() {
    let stl = block();
    let facet = stl.facet(5).unwrap();
    assert_eq!(
        facet,
        Facet {
            normal: vector(0.0, -1.0, 0.0),
            vertex: [vector(1.0, 0.0, 1.0), vector(0.0, 0.0, 0.0), vector(1.0, 0.0, 0.0)],
            extra: [0, 0],
        }
    );
    assert_eq!(
        stl.facet(13),
        Err(MeshError::IndexOutOfBounds { index: 13, len: 12 })
    );
    assert!(stl.facet(12).is_err());
}

#[test]
fn walk_facets() {
    let stl = block();
    assert_eq!(stl.facets().len(), 12);
    let mut count = 0;
    for facet in &stl {
        assert!(
            facet
                .vertex
                .iter()
                .all(|v| [v.x, v.y, v.z].iter().all(|c| *c == 0.0 || *c == 1.0))
        );
        count += 1;
    }
    assert_eq!(count, 12);
    assert_eq!(stl.to_vec().len(), 12);
    assert_eq!(stl.to_vec()[5], stl.facet(5).unwrap());
}

#[test]
fn snapshots_do_not_follow_later_changes() {
    let mut stl = block();
    let before = stl.stats();
    let facet = stl.facet(0).unwrap();
    stl.scale(3.0).unwrap();
    assert_eq!(before.size, vector(1.0, 1.0, 1.0));
    assert_eq!(facet, block().facet(0).unwrap());
    assert_ne!(stl.facet(0).unwrap(), facet);
}

#[test]
fn clear_error_is_harmless_on_clean_handle() {
    let mut stl = block();
    assert!(!stl.clear_error().error_flag());
    stl.scale(2.0).unwrap();
}

#[test]
fn closed_handle_refuses_work() {
    let mut stl = block();
    stl.close();
    assert!(matches!(
        stl.translate((1, 2, 3)),
        Err(MeshError::InvalidState { state: "closed", operation: "translate" })
    ));
    stl.close();
}
