//! STL Cleaner Core Library - validation and correction of STL meshes
//!
//! This library reads ASCII and binary STL files into a shared mesh model,
//! corrects facet normals, moves the model onto a minimum position,
//! reconciles solid names and writes the result back in either encoding.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod model;
pub mod names;
pub mod pipeline;
pub mod stl;
pub mod transform;
pub mod validate;

// Re-export commonly used types
pub use config::{CleanerConfig, ForceMode, NormalPolicy, OutputEncoding};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSummary, Locator, Severity};
pub use error::{StlError, StlResult};
pub use geometry::{Facet, Vec3};
pub use model::{BoundingBox, Encoding, Model, Solid};
pub use pipeline::{clean_bytes, clean_file, default_output_path, CleanOutcome, CleanedFile};
