mod util;
use serde_json::{Value, json};
use stl_handle::prelude::*;
use util::*;

#[test]
fn stats_shape() {
    let mut stl = block();
    stl.calculate_volume().unwrap();
    let v = serde_json::to_value(stl.stats()).unwrap();
    assert_eq!(v["header"], "solid  admesh");
    assert_eq!(v["type"], "ascii");
    assert_eq!(v["number_of_facets"], 12);
    assert_eq!(v["min"], json!({"x": 0.0, "y": 0.0, "z": 0.0}));
    assert_eq!(v["size"], json!({"x": 1.0, "y": 1.0, "z": 1.0}));
    assert_eq!(v["volume"], 1.0);
    // engine counters sit next to the named fields
    assert_eq!(v["original_num_facets"], 12);
    assert!(v.get("counters").is_none());
    assert!(v["degenerate_facets"].is_i64());
}

#[test]
fn facet_shape() {
    let v = serde_json::to_value(block().facet(5).unwrap()).unwrap();
    assert_eq!(
        v,
        json!({
            "normal": {"x": 0.0, "y": -1.0, "z": 0.0},
            "vertex": [
                {"x": 1.0, "y": 0.0, "z": 1.0},
                {"x": 0.0, "y": 0.0, "z": 0.0},
                {"x": 1.0, "y": 0.0, "z": 0.0}
            ],
            "extra": [0, 0]
        })
    );
}

#[test]
fn in_memory_type_name() {
    let v = serde_json::to_value(Stl::new().unwrap().stats()).unwrap();
    assert_eq!(v["type"], Value::from("inmemory"));
}

#[test]
fn stats_survive_a_json_round_trip() {
    let stats = block().stats();
    let text = serde_json::to_string(&stats).unwrap();
    let back: Stats = serde_json::from_str(&text).unwrap();
    assert_eq!(back, stats);
}

#[test]
fn partial_repair_options_merge_with_defaults() {
    let opts: RepairOptions =
        serde_json::from_value(json!({"tolerance": 0.2, "verbose": false})).unwrap();
    assert_eq!(
        opts,
        RepairOptions {
            tolerance: 0.2,
            verbose: false,
            ..Default::default()
        }
    );
    let mut stl = block();
    stl.repair(&opts).unwrap();
    assert!(stl.is_exact());
}

#[test]
fn unknown_repair_option_is_rejected() {
    let res: Result<RepairOptions, _> = serde_json::from_value(json!({"fill_hole": true}));
    assert!(res.is_err());
}
