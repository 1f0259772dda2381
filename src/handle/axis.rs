//! Axis and plane arguments for rotation and mirroring.

use crate::mesh_error::MeshError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn as_char(self) -> char {
        match self {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
        }
    }

    /// The axis after this one in x, y, z order, wrapping around.
    pub fn next(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::Z,
            Axis::Z => Axis::X,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Mirror planes, named by the two axes they contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plane {
    XY,
    YZ,
    XZ,
}

impl Plane {
    /// The plane spanned by two distinct axes, in either order.
    pub fn from_axes(a: Axis, b: Axis) -> Result<Self, MeshError> {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        match (lo, hi) {
            (Axis::X, Axis::Y) => Ok(Plane::XY),
            (Axis::Y, Axis::Z) => Ok(Plane::YZ),
            (Axis::X, Axis::Z) => Ok(Plane::XZ),
            _ => Err(MeshError::InvalidArgument(format!("invalid axis pair {lo}{hi}"))),
        }
    }

    /// The axis whose coordinates change sign when mirroring.
    pub fn normal(self) -> Axis {
        match self {
            Plane::XY => Axis::Z,
            Plane::YZ => Axis::X,
            Plane::XZ => Axis::Y,
        }
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Plane::XY => "xy",
            Plane::YZ => "yz",
            Plane::XZ => "xz",
        })
    }
}

/// Values usable as an axis argument.
pub trait IntoAxis {
    fn into_axis(self) -> Result<Axis, MeshError>;
}

impl IntoAxis for Axis {
    fn into_axis(self) -> Result<Axis, MeshError> {
        Ok(self)
    }
}

impl IntoAxis for char {
    fn into_axis(self) -> Result<Axis, MeshError> {
        match self.to_ascii_lowercase() {
            'x' => Ok(Axis::X),
            'y' => Ok(Axis::Y),
            'z' => Ok(Axis::Z),
            _ => Err(MeshError::InvalidArgument(format!("invalid axis {self}"))),
        }
    }
}

impl IntoAxis for &str {
    fn into_axis(self) -> Result<Axis, MeshError> {
        let mut chars = self.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => c.into_axis(),
            _ => Err(MeshError::InvalidArgument(format!("invalid axis {self}"))),
        }
    }
}

impl IntoAxis for &String {
    fn into_axis(self) -> Result<Axis, MeshError> {
        self.as_str().into_axis()
    }
}

impl IntoAxis for String {
    fn into_axis(self) -> Result<Axis, MeshError> {
        self.as_str().into_axis()
    }
}

/// Values usable as a plane argument.
pub trait IntoPlane {
    fn into_plane(self) -> Result<Plane, MeshError>;
}

impl IntoPlane for Plane {
    fn into_plane(self) -> Result<Plane, MeshError> {
        Ok(self)
    }
}

impl<A: IntoAxis, B: IntoAxis> IntoPlane for (A, B) {
    fn into_plane(self) -> Result<Plane, MeshError> {
        Plane::from_axes(self.0.into_axis()?, self.1.into_axis()?)
    }
}

impl<A: IntoAxis> IntoPlane for [A; 2] {
    fn into_plane(self) -> Result<Plane, MeshError> {
        let [a, b] = self;
        (a, b).into_plane()
    }
}

impl<A: IntoAxis + Clone> IntoPlane for &[A] {
    fn into_plane(self) -> Result<Plane, MeshError> {
        match self {
            [a, b] => (a.clone(), b.clone()).into_plane(),
            _ => Err(MeshError::ArgumentCount {
                given: self.len(),
                expected: "2",
            }),
        }
    }
}

impl<A: IntoAxis + Clone> IntoPlane for Vec<A> {
    fn into_plane(self) -> Result<Plane, MeshError> {
        self.as_slice().into_plane()
    }
}

/// Two axis letters such as `"xy"` or `"zx"`.
impl IntoPlane for &str {
    fn into_plane(self) -> Result<Plane, MeshError> {
        let axes: Vec<char> = self.chars().collect();
        axes.as_slice().into_plane()
    }
}
