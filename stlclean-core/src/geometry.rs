/// Geometry kernel and the facet value type
use nalgebra::Vector3;
use thiserror::Error;

/// A point or direction with double-precision coordinates.
pub type Vec3 = Vector3<f64>;

/// Default tolerance for degeneracy and zero-normal checks.
///
/// Degeneracy is measured relative to edge lengths (see [`is_degenerate`]),
/// so this value is independent of the mesh scale.
pub const DEFAULT_EPSILON: f64 = 1e-7;

/// Per-component tolerance when comparing a stored normal with the geometric one.
pub const NORMAL_TOLERANCE: f64 = 1e-3;

/// Unit vector in the direction of `v`, or the zero vector when `v` has no length.
pub fn normalize_or_zero(v: &Vec3) -> Vec3 {
    let magnitude = v.norm();
    if magnitude == 0.0 {
        Vec3::zeros()
    } else {
        v / magnitude
    }
}

/// Cross product of the two edges leaving the first vertex.
pub fn face_cross(vertices: &[Vec3; 3]) -> Vec3 {
    let edge1 = vertices[1] - vertices[0];
    let edge2 = vertices[2] - vertices[0];
    edge1.cross(&edge2)
}

/// Outward normal implied by the vertex order (right-hand rule).
pub fn geometric_normal(vertices: &[Vec3; 3]) -> Vec3 {
    normalize_or_zero(&face_cross(vertices))
}

/// Round a coordinate to the `f32` value both encodings store.
pub fn stored_precision(value: f64) -> f64 {
    value as f32 as f64
}

/// [`stored_precision`] applied per component.
pub fn to_stored_precision(v: &Vec3) -> Vec3 {
    v.map(stored_precision)
}

/// Whether the three vertices are coincident or collinear.
///
/// The cross product magnitude is compared against `epsilon * |e1| * |e2|`,
/// i.e. the sine of the angle between the edges must exceed `epsilon`.
/// A zero-length edge always counts as degenerate.
pub fn is_degenerate(vertices: &[Vec3; 3], epsilon: f64) -> bool {
    let edge1 = vertices[1] - vertices[0];
    let edge2 = vertices[2] - vertices[0];
    edge1.cross(&edge2).norm() <= epsilon * edge1.norm() * edge2.norm()
}

pub fn vectors_close(a: &Vec3, b: &Vec3, tolerance: f64) -> bool {
    (a - b).iter().all(|component| component.abs() <= tolerance)
}

/// A facet coordinate was NaN or infinite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidFacet {
    #[error("normal has a non-finite component")]
    Normal,
    #[error("vertex {0} has a non-finite coordinate")]
    Vertex(usize),
}

/// One triangular surface element: a normal, three ordered vertices and the
/// binary attribute byte count.
///
/// Coordinates are held at `f32` precision so that every check runs on the
/// geometry that will be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Facet {
    normal: Vec3,
    vertices: [Vec3; 3],
    attribute: u16,
}

impl Facet {
    pub fn new(normal: Vec3, vertices: [Vec3; 3]) -> Result<Self, InvalidFacet> {
        let normal = to_stored_precision(&normal);
        let vertices = vertices.map(|v| to_stored_precision(&v));
        if !normal.iter().all(|c| c.is_finite()) {
            return Err(InvalidFacet::Normal);
        }
        if let Some(index) = vertices
            .iter()
            .position(|v| !v.iter().all(|c| c.is_finite()))
        {
            return Err(InvalidFacet::Vertex(index));
        }

        Ok(Self {
            normal,
            vertices,
            attribute: 0,
        })
    }

    /// Attach the attribute byte count carried by a binary record.
    pub fn with_attribute(mut self, attribute: u16) -> Self {
        self.attribute = attribute;
        self
    }

    pub fn normal(&self) -> &Vec3 {
        &self.normal
    }

    /// Vertices in winding order.
    pub fn vertices(&self) -> &[Vec3; 3] {
        &self.vertices
    }

    pub fn attribute(&self) -> u16 {
        self.attribute
    }

    pub fn geometric_normal(&self) -> Vec3 {
        geometric_normal(&self.vertices)
    }

    pub fn is_degenerate(&self, epsilon: f64) -> bool {
        is_degenerate(&self.vertices, epsilon)
    }

    pub(crate) fn set_normal(&mut self, normal: Vec3) {
        self.normal = to_stored_precision(&normal);
    }

    /// Move one coordinate, rounding it to stored precision.
    pub(crate) fn set_coordinate(&mut self, vertex: usize, axis: usize, value: f64) {
        self.vertices[vertex][axis] = stored_precision(value);
    }
}
