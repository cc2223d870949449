/// Run configuration, built once and passed by reference to every stage
use crate::error::{StlError, StlResult};
use crate::geometry::{Vec3, DEFAULT_EPSILON};
use crate::model::Encoding;

/// Default minimum position of the model bounding box.
pub const DEFAULT_MIN_POSITION: [f64; 3] = [0.01, 0.01, 0.01];

/// Facet count per solid from which validation runs on the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// How `force_repos` realigns the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForceMode {
    /// Every axis is moved onto the minimum position, violated or not.
    #[default]
    AllAxes,
    /// Every axis is moved onto the minimum position, but only when at least
    /// one axis is below it.
    WhenAnyViolates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputEncoding {
    /// Write the same encoding as the source.
    #[default]
    Preserve,
    Ascii,
    Binary,
}

impl OutputEncoding {
    pub fn resolve(self, source: Encoding) -> Encoding {
        match self {
            OutputEncoding::Preserve => source,
            OutputEncoding::Ascii => Encoding::Ascii,
            OutputEncoding::Binary => Encoding::Binary,
        }
    }
}

/// Which stored normals get replaced by the geometric normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalPolicy {
    /// Zero normals and normals pointing against the winding.
    #[default]
    ReconcileSign,
    /// Any normal further than `NORMAL_TOLERANCE` from the geometric one.
    Recompute,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanerConfig {
    /// Spaces per nesting level in ASCII output.
    pub indent: usize,
    /// Per-axis floor for the bounding-box minimum corner.
    pub min_position: Vec3,
    pub force_repos: bool,
    pub force_mode: ForceMode,
    /// Never read `endsolid` labels; the `solid` label is authoritative.
    pub ignore_endsolid_name: bool,
    /// Return the individual diagnostics, not only their counts.
    pub emit_warnings: bool,
    pub output_encoding: OutputEncoding,
    pub normal_policy: NormalPolicy,
    /// Degeneracy and zero-normal tolerance.
    pub epsilon: f64,
    pub parallel_threshold: usize,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            indent: 1,
            min_position: Vec3::from(DEFAULT_MIN_POSITION),
            force_repos: false,
            force_mode: ForceMode::default(),
            ignore_endsolid_name: false,
            emit_warnings: false,
            output_encoding: OutputEncoding::default(),
            normal_policy: NormalPolicy::default(),
            epsilon: DEFAULT_EPSILON,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl CleanerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_min_position(mut self, min_position: Vec3) -> Self {
        self.min_position = min_position;
        self
    }

    pub fn with_force_repos(mut self, force_mode: ForceMode) -> Self {
        self.force_repos = true;
        self.force_mode = force_mode;
        self
    }

    pub fn with_ignore_endsolid_name(mut self, ignore: bool) -> Self {
        self.ignore_endsolid_name = ignore;
        self
    }

    pub fn with_emit_warnings(mut self, emit: bool) -> Self {
        self.emit_warnings = emit;
        self
    }

    pub fn with_output_encoding(mut self, output_encoding: OutputEncoding) -> Self {
        self.output_encoding = output_encoding;
        self
    }

    pub fn with_normal_policy(mut self, normal_policy: NormalPolicy) -> Self {
        self.normal_policy = normal_policy;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn validate(&self) -> StlResult<()> {
        if !self.min_position.iter().all(|c| c.is_finite()) {
            return Err(StlError::invalid_config(format!(
                "minimum position must be finite, got ({}, {}, {})",
                self.min_position.x, self.min_position.y, self.min_position.z
            )));
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(StlError::invalid_config(format!(
                "epsilon must be a non-negative finite number, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}
