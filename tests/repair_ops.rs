mod util;
use serial_test::serial;
use stl_handle::prelude::*;
use util::*;

#[test]
fn repair_with_defaults() {
    let mut stl = block();
    stl.repair(&quiet()).unwrap();
    assert!(stl.is_exact());
    let stats = stl.stats();
    assert_eq!(stats.number_of_facets, 12);
    assert_eq!(stats.counters.connected_facets_3_edge, 12);
    assert_eq!(stats.volume, 1.0);
}

#[test]
fn repair_with_tolerance() {
    let mut stl = block();
    stl.repair(&RepairOptions {
        tolerance: 0.2,
        verbose: false,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(stl.len(), 12);
}

#[test]
fn verbose_repair_only_logs() {
    let mut stl = block();
    stl.repair(&RepairOptions::default()).unwrap();
    assert_eq!(stl.len(), 12);
}

#[test]
fn repair_rejects_bad_options_before_running() {
    let mut stl = block();
    let err = stl
        .repair(&RepairOptions {
            tolerance: -0.5,
            ..quiet()
        })
        .unwrap_err();
    assert!(matches!(err, MeshError::InvalidArgument(_)));
    assert_eq!(stl.state(), HandleState::Initialized);
    assert!(!stl.is_exact());
}

#[test]
fn repair_of_empty_mesh_is_fine() {
    let mut stl = Stl::new().unwrap();
    stl.repair(&quiet()).unwrap();
    assert!(stl.is_empty());
}

#[test]
fn values_only_repair_leaves_exactness_alone() {
    let mut stl = block();
    stl.repair(&RepairOptions {
        fixall: false,
        normal_values: true,
        ..quiet()
    })
    .unwrap();
    assert!(!stl.is_exact());
}

#[test]
fn adjacency_passes_run_on_a_closed_mesh() {
    let mut stl = block();
    stl.check_facets_nearby(0.001).unwrap();
    stl.remove_unconnected_facets().unwrap();
    stl.verify_neighbors().unwrap();
    stl.fill_holes().unwrap();
    stl.fix_normal_directions().unwrap();
    stl.fix_normal_values().unwrap();
    assert_eq!(stl.len(), 12);
    assert_eq!(stl.calculate_volume().unwrap().stats().volume, 1.0);
}

#[test]
fn reverse_all_twice() {
    let mut stl = block();
    stl.reverse_all_facets().unwrap();
    assert_eq!(stl.calculate_volume().unwrap().stats().volume, -1.0);
    stl.reverse_all_facets().unwrap();
    assert_eq!(stl.calculate_volume().unwrap().stats().volume, 1.0);
    assert_eq!(stl.stats().counters.facets_reversed, 24);
}

#[test]
fn open_merge_adds_a_second_block() {
    let mut stl = block();
    stl.check_facets_exact().unwrap();
    stl.translate((10, 10, 10)).unwrap();
    stl.open_merge(BLOCK).unwrap();
    assert!(!stl.is_exact());
    assert_eq!(stl.len(), 24);
    assert_eq!(stl.calculate_volume().unwrap().stats().volume, 2.0);
    assert_eq!(stl.stats().min, vector(0.0, 0.0, 0.0));
    assert_eq!(stl.stats().max, vector(11.0, 11.0, 11.0));
}

#[test]
fn open_merge_into_empty_mesh() {
    let mut stl = Stl::new().unwrap();
    stl.open_merge(BLOCK).unwrap();
    assert_eq!(stl.len(), 12);
    assert_eq!(stl.to_vec(), block().to_vec());
}

#[test]
#[serial]
fn hole_is_filled() {
    let path = write_mesh("open_cube.stl", &CUBE[1..]);
    let mut stl = Stl::open(&path).unwrap();
    stl.check_facets_exact().unwrap();
    assert!(stl.stats().counters.connected_facets_3_edge < 11);
    stl.fill_holes().unwrap();
    let stats = stl.stats();
    assert_eq!(stats.number_of_facets, 12);
    assert_eq!(stats.counters.facets_added, 1);
    assert_eq!(stats.counters.connected_facets_3_edge, 12);
    assert_eq!(stl.calculate_volume().unwrap().stats().volume, 1.0);
}

#[test]
#[serial]
fn selected_repair_passes_close_holes() {
    let path = write_mesh("open_cube_repair.stl", &CUBE[1..]);
    let mut stl = Stl::open(&path).unwrap();
    stl.repair(&RepairOptions {
        fixall: false,
        exact: true,
        fill_holes: true,
        ..quiet()
    })
    .unwrap();
    assert!(stl.is_exact());
    assert_eq!(stl.len(), 12);
    assert_eq!(stl.stats().volume, 1.0);
}

#[test]
#[serial]
fn fixall_repair_of_open_mesh_succeeds() {
    let path = write_mesh("open_cube_fixall.stl", &CUBE[1..]);
    let mut stl = Stl::open(&path).unwrap();
    stl.repair(&quiet()).unwrap();
    assert_eq!(stl.state(), HandleState::Initialized);
    assert!(stl.is_exact());
}

#[test]
#[serial]
fn flipped_facet_is_turned_back() {
    let mut facets = CUBE.to_vec();
    facets[3].swap(1, 2);
    let path = write_mesh("flipped_cube.stl", &facets);
    let mut stl = Stl::open(&path).unwrap();
    stl.fix_normal_directions().unwrap();
    assert!(stl.stats().counters.facets_reversed >= 1);
    assert_eq!(stl.calculate_volume().unwrap().stats().volume, 1.0);
}

#[test]
#[serial]
fn stray_facet_is_removed() {
    let mut facets = CUBE.to_vec();
    facets.push([[5.0, 5.0, 5.0], [6.0, 5.0, 5.0], [5.0, 6.0, 5.0]]);
    let path = write_mesh("stray_cube.stl", &facets);
    let mut stl = Stl::open(&path).unwrap();
    stl.remove_unconnected_facets().unwrap();
    assert_eq!(stl.len(), 12);
    assert_eq!(stl.stats().counters.facets_removed, 1);
    assert_eq!(stl.stats().max, vector(1.0, 1.0, 1.0));
}

#[test]
#[serial]
fn nearby_edges_are_joined() {
    let mut facets = CUBE.to_vec();
    facets[0][2] = [1.0001, 1.0, 1.0];
    let path = write_mesh("nudged_cube.stl", &facets);
    let mut stl = Stl::open(&path).unwrap();
    stl.check_facets_exact().unwrap();
    assert!(stl.stats().counters.connected_facets_3_edge < 12);
    stl.check_facets_nearby(0.001).unwrap();
    let stats = stl.stats();
    assert_eq!(stats.counters.connected_facets_3_edge, 12);
    assert!(stats.counters.edges_fixed > 0);
}

#[test]
#[serial]
fn degenerate_facets_are_dropped_by_exact_check() {
    let mut facets = CUBE.to_vec();
    facets.push([[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
    let path = write_mesh("degenerate_cube.stl", &facets);
    let mut stl = Stl::open(&path).unwrap();
    assert_eq!(stl.len(), 13);
    stl.check_facets_exact().unwrap();
    assert_eq!(stl.len(), 12);
    assert_eq!(stl.stats().counters.degenerate_facets, 1);
}

#[test]
fn nearby_rejects_negative_tolerance() {
    let mut stl = block();
    assert!(matches!(
        stl.check_facets_nearby(-1.0),
        Err(MeshError::InvalidArgument(_))
    ));
}
