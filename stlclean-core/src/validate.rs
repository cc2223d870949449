//! Per-facet validation and normal correction.
//!
//! Vertex order is authoritative: the stored normal is compared with the
//! normal implied by the winding and replaced when it disagrees. Vertices are
//! never reordered and no facet is ever dropped.

use rayon::prelude::*;
use tracing::debug;

use crate::config::{CleanerConfig, NormalPolicy};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Locator};
use crate::geometry::{vectors_close, Facet, NORMAL_TOLERANCE};
use crate::model::{Model, Solid};

/// What the checks found on one facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FacetFindings {
    pub degenerate: bool,
    pub normal_corrected: bool,
}

/// Check one facet and correct its normal in place.
///
/// Degenerate facets have no geometric normal, so they are only flagged.
pub fn check_facet(facet: &mut Facet, config: &CleanerConfig) -> FacetFindings {
    if facet.is_degenerate(config.epsilon) {
        return FacetFindings {
            degenerate: true,
            normal_corrected: false,
        };
    }

    let geometric = facet.geometric_normal();
    let stored = *facet.normal();
    let replace = match config.normal_policy {
        NormalPolicy::ReconcileSign => {
            stored.norm() <= config.epsilon || stored.dot(&geometric) < 0.0
        }
        NormalPolicy::Recompute => !vectors_close(&stored, &geometric, NORMAL_TOLERANCE),
    };
    if replace {
        facet.set_normal(geometric);
    }

    FacetFindings {
        degenerate: false,
        normal_corrected: replace,
    }
}

/// Check every facet of a solid. The result is indexed by facet position,
/// whether or not the work ran on the rayon pool.
pub fn check_solid(solid: &mut Solid, config: &CleanerConfig) -> Vec<FacetFindings> {
    if solid.facets.len() >= config.parallel_threshold {
        solid
            .facets
            .par_iter_mut()
            .map(|facet| check_facet(facet, config))
            .collect()
    } else {
        solid
            .facets
            .iter_mut()
            .map(|facet| check_facet(facet, config))
            .collect()
    }
}

/// Validate and correct every facet, returning diagnostics in file order.
pub fn validate_model(model: &mut Model, config: &CleanerConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for (solid_index, solid) in model.solids.iter_mut().enumerate() {
        let findings = check_solid(solid, config);

        let mut degenerate = 0usize;
        let mut corrected = 0usize;
        for (facet_index, found) in findings.iter().enumerate() {
            let locator = Locator::Facet {
                solid: solid_index,
                facet: facet_index,
            };
            if found.degenerate {
                degenerate += 1;
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::DegenerateFacet,
                    locator,
                    "degenerate facet: vertices are collinear or coincident",
                ));
            }
            if found.normal_corrected {
                corrected += 1;
                diagnostics.push(Diagnostic::warning(
                    DiagnosticKind::NormalCorrected,
                    locator,
                    "normal corrected",
                ));
            }
        }

        debug!(
            solid = solid_index,
            facets = findings.len(),
            degenerate,
            corrected,
            "validated solid"
        );
    }

    diagnostics
}
