//! Vector arguments for translation and scaling.
//!
//! Callers may hand over a vector in several shapes; [`normalize`] turns any
//! of them into a [`Vector3`] before the engine sees it.
//!
//! ```
//! use stl_handle::handle::vector::{normalize, VectorArg};
//! let a = normalize((10, 20, 30).into(), 0.0).unwrap();
//! let b = normalize([10.0, 20.0, 30.0].into(), 0.0).unwrap();
//! let c = normalize(VectorArg::mapping([("x", 10), ("y", 20), ("z", 30)]), 0.0).unwrap();
//! assert_eq!(a, b);
//! assert_eq!(b, c);
//! ```

use super::records::Vector3;
use crate::mesh_error::MeshError;
use num_traits::AsPrimitive;

/// Anything exposing `x`, `y` and `z` accessors.
pub trait PointLike {
    fn x(&self) -> f64;
    fn y(&self) -> f64;
    fn z(&self) -> f64;
}

impl PointLike for Vector3 {
    fn x(&self) -> f64 {
        self.x as f64
    }
    fn y(&self) -> f64 {
        self.y as f64
    }
    fn z(&self) -> f64 {
        self.z as f64
    }
}

/// The accepted call shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorArg {
    /// Three positional scalars.
    Positional([f64; 3]),
    /// An ordered sequence; must hold exactly three values.
    Sequence(Vec<f64>),
    /// Named components; absent keys take the caller's default.
    Mapping(Vec<(String, f64)>),
    /// Components read through [`PointLike`].
    Point([f64; 3]),
}

impl VectorArg {
    /// A mapping from `x`/`y`/`z` keys to values.
    pub fn mapping<K, T, I>(pairs: I) -> Self
    where
        K: Into<String>,
        T: AsPrimitive<f64>,
        I: IntoIterator<Item = (K, T)>,
    {
        VectorArg::Mapping(pairs.into_iter().map(|(k, v)| (k.into(), v.as_())).collect())
    }

    pub fn point<P: PointLike + ?Sized>(p: &P) -> Self {
        VectorArg::Point([p.x(), p.y(), p.z()])
    }

    /// Resolves a raw argument list: three scalars are positional, anything
    /// else is an arity error.
    pub fn from_scalars(args: &[f64]) -> Result<Self, MeshError> {
        match *args {
            [x, y, z] => Ok(VectorArg::Positional([x, y, z])),
            _ => Err(MeshError::ArgumentCount {
                given: args.len(),
                expected: "1 or 3",
            }),
        }
    }
}

impl<A, B, C> From<(A, B, C)> for VectorArg
where
    A: AsPrimitive<f64>,
    B: AsPrimitive<f64>,
    C: AsPrimitive<f64>,
{
    fn from((x, y, z): (A, B, C)) -> Self {
        VectorArg::Positional([x.as_(), y.as_(), z.as_()])
    }
}

impl<T: AsPrimitive<f64>, const N: usize> From<[T; N]> for VectorArg {
    fn from(values: [T; N]) -> Self {
        VectorArg::Sequence(values.iter().map(|v| v.as_()).collect())
    }
}

impl<T: AsPrimitive<f64>> From<&[T]> for VectorArg {
    fn from(values: &[T]) -> Self {
        VectorArg::Sequence(values.iter().map(|v| v.as_()).collect())
    }
}

impl<T: AsPrimitive<f64>> From<Vec<T>> for VectorArg {
    fn from(values: Vec<T>) -> Self {
        VectorArg::Sequence(values.iter().map(|v| v.as_()).collect())
    }
}

impl From<Vector3> for VectorArg {
    fn from(v: Vector3) -> Self {
        VectorArg::point(&v)
    }
}

/// Resolves `arg` to a vector, filling absent mapping keys with `default`.
pub fn normalize(arg: VectorArg, default: f64) -> Result<Vector3, MeshError> {
    let [x, y, z] = match arg {
        VectorArg::Positional(v) | VectorArg::Point(v) => v,
        VectorArg::Sequence(values) => match values[..] {
            [x, y, z] => [x, y, z],
            _ => {
                return Err(MeshError::ArgumentCount {
                    given: values.len(),
                    expected: "3",
                });
            }
        },
        VectorArg::Mapping(pairs) => {
            let mut out = [None; 3];
            for (key, value) in pairs {
                let slot = match key.as_str() {
                    "x" => 0,
                    "y" => 1,
                    "z" => 2,
                    other => {
                        return Err(MeshError::InvalidArgument(format!(
                            "unknown vector key `{other}` (expected x, y or z)"
                        )));
                    }
                };
                if out[slot].replace(value).is_some() {
                    return Err(MeshError::InvalidArgument(format!(
                        "vector key `{key}` given twice"
                    )));
                }
            }
            out.map(|v| v.unwrap_or(default))
        }
    };
    // The engine works in f32; anything past f32::MAX would arrive as inf.
    let v = Vector3::new(x as f32, y as f32, z as f32);
    if ![v.x, v.y, v.z].iter().all(|c| c.is_finite()) {
        return Err(MeshError::InvalidArgument(format!(
            "vector components must be finite f32 values, got ({x}, {y}, {z})"
        )));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn missing_keys_take_default() {
        let v = normalize(VectorArg::mapping([("y", 20), ("z", 30)]), 0.0).unwrap();
        assert_eq!(v, Vector3::new(0.0, 20.0, 30.0));
        let v = normalize(VectorArg::mapping([("y", 10.0), ("z", 100.0)]), 1.0).unwrap();
        assert_eq!(v, Vector3::new(1.0, 10.0, 100.0));
    }

    #[test]
    fn unknown_and_repeated_keys_are_rejected() {
        assert!(matches!(
            normalize(VectorArg::mapping([("w", 1)]), 0.0),
            Err(MeshError::InvalidArgument(_))
        ));
        assert!(matches!(
            normalize(VectorArg::mapping([("x", 1), ("x", 2)]), 0.0),
            Err(MeshError::InvalidArgument(_))
        ));
    }

    #[test]
    fn sequence_length_is_checked() {
        assert_eq!(
            normalize(vec![1.0, 2.0].into(), 0.0),
            Err(MeshError::ArgumentCount {
                given: 2,
                expected: "3"
            })
        );
    }

    #[test]
    fn argument_lists_need_three_scalars() {
        assert_eq!(
            VectorArg::from_scalars(&[1.0, 2.0]),
            Err(MeshError::ArgumentCount {
                given: 2,
                expected: "1 or 3"
            })
        );
        assert_eq!(
            VectorArg::from_scalars(&[1.0, 2.0, 3.0]),
            Ok(VectorArg::Positional([1.0, 2.0, 3.0]))
        );
    }

    #[test]
    fn non_finite_components_are_rejected() {
        assert!(normalize((f64::NAN, 0, 0).into(), 0.0).is_err());
    }

    #[test]
    fn components_beyond_f32_range_are_rejected() {
        assert!(matches!(
            normalize((1e300, 0, 0).into(), 0.0),
            Err(MeshError::InvalidArgument(_))
        ));
        assert!(matches!(
            normalize(VectorArg::mapping([("y", -1e39)]), 1.0),
            Err(MeshError::InvalidArgument(_))
        ));
        let edge = f64::from(f32::MAX);
        assert_eq!(normalize((edge, 0, 0).into(), 0.0).unwrap().x, f32::MAX);
    }

    #[test]
    fn point_like_values_are_read_through_accessors() {
        let p = Vector3::new(1.5, -2.0, 4.0);
        assert_eq!(normalize(p.into(), 0.0).unwrap(), p);
    }

    proptest! {
        #[test]
        fn every_shape_agrees(x in -1e6f64..1e6, y in -1e6f64..1e6, z in -1e6f64..1e6) {
            let positional = normalize((x, y, z).into(), 0.0).unwrap();
            let sequence = normalize([x, y, z].into(), 0.0).unwrap();
            let mapping =
                normalize(VectorArg::mapping([("z", z), ("x", x), ("y", y)]), 0.0).unwrap();
            prop_assert_eq!(positional, sequence);
            prop_assert_eq!(sequence, mapping);
        }
    }
}
