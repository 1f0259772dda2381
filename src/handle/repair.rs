//! Options for the composite repair and their encoding into the engine's
//! fixed parameter list.

use crate::mesh_error::MeshError;
use serde::{Deserialize, Serialize};
use std::os::raw::{c_float, c_int};

/// Which repair passes to run.
///
/// Partial option sets deserialize on top of the defaults:
///
/// ```
/// use stl_handle::handle::repair::RepairOptions;
/// let opts: RepairOptions =
///     serde_json::from_str(r#"{"tolerance": 0.2, "verbose": false}"#).unwrap();
/// assert!(opts.fixall);
/// assert_eq!(opts.iterations, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepairOptions {
    /// Run every pass, ignoring the individual flags below.
    pub fixall: bool,
    pub exact: bool,
    /// Starting distance for the nearby check; 0 lets the engine pick the
    /// shortest edge.
    pub tolerance: f64,
    /// Tolerance growth per nearby iteration; 0 lets the engine pick.
    pub increment: f64,
    pub nearby: bool,
    pub iterations: u32,
    pub remove_unconnected: bool,
    pub fill_holes: bool,
    pub normal_directions: bool,
    pub normal_values: bool,
    pub reverse_all: bool,
    /// Log a statistics report at `info` level.
    pub verbose: bool,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            fixall: true,
            exact: false,
            tolerance: 0.0,
            increment: 0.0,
            nearby: false,
            iterations: 2,
            remove_unconnected: false,
            fill_holes: false,
            normal_directions: false,
            normal_values: false,
            reverse_all: false,
            verbose: true,
        }
    }
}

/// Arguments of `stl_repair`, in call order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepairParams {
    pub fixall: c_int,
    pub exact: c_int,
    pub tolerance_flag: c_int,
    pub tolerance: c_float,
    pub increment_flag: c_int,
    pub increment: c_float,
    pub nearby: c_int,
    pub iterations: c_int,
    pub remove_unconnected: c_int,
    pub fill_holes: c_int,
    pub normal_directions: c_int,
    pub normal_values: c_int,
    pub reverse_all: c_int,
    pub verbose: c_int,
}

/// Narrows a distance to the engine's float, rejecting values it cannot hold.
fn distance(name: &str, value: f64) -> Result<c_float, MeshError> {
    let narrowed = value as c_float;
    if !narrowed.is_finite() || value < 0.0 {
        return Err(MeshError::InvalidArgument(format!(
            "{name} must be a finite non-negative f32 value, got {value}"
        )));
    }
    Ok(narrowed)
}

impl RepairOptions {
    /// Validates the options and lays them out for the native call.
    pub fn encode(&self) -> Result<RepairParams, MeshError> {
        let flag = c_int::from;
        let tolerance = distance("tolerance", self.tolerance)?;
        let increment = distance("increment", self.increment)?;
        let iterations = c_int::try_from(self.iterations).map_err(|_| {
            MeshError::InvalidArgument(format!("iterations out of range: {}", self.iterations))
        })?;
        Ok(RepairParams {
            fixall: flag(self.fixall),
            exact: flag(self.exact),
            tolerance_flag: flag(self.tolerance != 0.0),
            tolerance,
            increment_flag: flag(self.increment != 0.0),
            increment,
            nearby: flag(self.nearby),
            iterations,
            remove_unconnected: flag(self.remove_unconnected),
            fill_holes: flag(self.fill_holes),
            normal_directions: flag(self.normal_directions),
            normal_values: flag(self.normal_values),
            reverse_all: flag(self.reverse_all),
            verbose: flag(self.verbose),
        })
    }

    /// Whether a successful repair leaves exact adjacency computed.
    pub fn requires_exact(&self) -> bool {
        self.exact
            || self.fixall
            || self.nearby
            || self.remove_unconnected
            || self.fill_holes
            || self.normal_directions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_encode_in_call_order() {
        let p = RepairOptions::default().encode().unwrap();
        assert_eq!(
            p,
            RepairParams {
                fixall: 1,
                exact: 0,
                tolerance_flag: 0,
                tolerance: 0.0,
                increment_flag: 0,
                increment: 0.0,
                nearby: 0,
                iterations: 2,
                remove_unconnected: 0,
                fill_holes: 0,
                normal_directions: 0,
                normal_values: 0,
                reverse_all: 0,
                verbose: 1,
            }
        );
    }

    #[test]
    fn nonzero_tolerance_raises_its_flag() {
        let opts = RepairOptions {
            tolerance: 0.2,
            verbose: false,
            ..Default::default()
        };
        let p = opts.encode().unwrap();
        assert_eq!((p.tolerance_flag, p.tolerance), (1, 0.2));
        assert_eq!(p.increment_flag, 0);
        assert_eq!(p.verbose, 0);

        // The flag follows the option, even when f32 cannot represent it.
        let tiny = RepairOptions {
            tolerance: 1e-50,
            increment: 1e-60,
            ..Default::default()
        };
        let p = tiny.encode().unwrap();
        assert_eq!((p.tolerance_flag, p.increment_flag), (1, 1));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        for opts in [
            RepairOptions {
                tolerance: -1.0,
                ..Default::default()
            },
            RepairOptions {
                increment: f64::INFINITY,
                ..Default::default()
            },
            RepairOptions {
                tolerance: 1e300,
                ..Default::default()
            },
            RepairOptions {
                increment: 1e39,
                ..Default::default()
            },
            RepairOptions {
                iterations: u32::MAX,
                ..Default::default()
            },
        ] {
            assert!(matches!(opts.encode(), Err(MeshError::InvalidArgument(_))));
        }
    }

    #[test]
    fn exactness_follows_adjacency_passes() {
        assert!(RepairOptions::default().requires_exact());
        let only_values = RepairOptions {
            fixall: false,
            normal_values: true,
            ..Default::default()
        };
        assert!(!only_values.requires_exact());
        let nearby = RepairOptions {
            fixall: false,
            nearby: true,
            ..Default::default()
        };
        assert!(nearby.requires_exact());
    }

    #[test]
    fn unknown_option_names_fail_to_parse() {
        let res: Result<RepairOptions, _> = serde_json::from_str(r#"{"fix_all": true}"#);
        assert!(res.is_err());
    }
}
