/// In-memory mesh model shared by all decoders and encoders
use std::fmt;

use crate::geometry::{Facet, Vec3};

/// Size of the opaque binary STL header.
pub const HEADER_SIZE: usize = 80;

/// STL encoding of a source or destination file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Ascii,
    Binary,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Ascii => write!(f, "ASCII"),
            Encoding::Binary => write!(f, "binary"),
        }
    }
}

/// A named group of facets.
///
/// `end_name` is the label found after `endsolid`, or `None` when it was not
/// read (binary sources, or when endsolid names are ignored).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Solid {
    pub name: String,
    pub end_name: Option<String>,
    pub facets: Vec<Facet>,
}

impl Solid {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            end_name: None,
            facets: Vec::new(),
        }
    }

    pub fn with_facets(mut self, facets: Vec<Facet>) -> Self {
        self.facets = facets;
        self
    }

    /// Label written after `endsolid`.
    pub fn closing_name(&self) -> &str {
        self.end_name.as_deref().unwrap_or(&self.name)
    }
}

/// A decoded STL file.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub solids: Vec<Solid>,
    /// Encoding the model was decoded from.
    pub encoding: Encoding,
    /// Raw header of a binary source.
    pub header: Option<[u8; HEADER_SIZE]>,
}

impl Model {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            solids: Vec::new(),
            encoding,
            header: None,
        }
    }

    pub fn with_solid(mut self, solid: Solid) -> Self {
        self.solids.push(solid);
        self
    }

    pub fn facet_count(&self) -> usize {
        self.solids.iter().map(|s| s.facets.len()).sum()
    }

    pub fn facets(&self) -> impl Iterator<Item = &Facet> {
        self.solids.iter().flat_map(|s| s.facets.iter())
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vec3> {
        self.facets().flat_map(|f| f.vertices().iter())
    }

    /// Axis-aligned bounds of every vertex, or `None` for an empty model.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.vertices())
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = *points.next()?;
        Some(points.fold(
            Self {
                min: first,
                max: first,
            },
            |bounds, p| Self {
                min: bounds.min.inf(p),
                max: bounds.max.sup(p),
            },
        ))
    }
}
