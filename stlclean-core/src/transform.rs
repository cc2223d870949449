/// Whole-model translation onto the minimum-position floor
use tracing::debug;

use crate::config::{CleanerConfig, ForceMode};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Locator};
use crate::geometry::{stored_precision, Vec3};
use crate::model::Model;

// Coordinates end up as f32 in either encoding, so the floor is compared at
// that precision. Otherwise a value printed and re-read could land one f64
// ulp below the floor and trigger another translation on the next run.
fn below(value: f64, floor: f64) -> bool {
    (value as f32) < (floor as f32)
}

fn aligned(value: f64, floor: f64) -> bool {
    (value as f32) == (floor as f32)
}

/// Axes that must be moved so that `bbox_min` lands on the configured floor.
pub fn axes_to_move(bbox_min: &Vec3, config: &CleanerConfig) -> [bool; 3] {
    let floor = &config.min_position;
    let violating: [bool; 3] = std::array::from_fn(|axis| below(bbox_min[axis], floor[axis]));
    if !config.force_repos {
        return violating;
    }

    let realign = match config.force_mode {
        ForceMode::AllAxes => true,
        ForceMode::WhenAnyViolates => violating.iter().any(|&v| v),
    };
    std::array::from_fn(|axis| realign && !aligned(bbox_min[axis], floor[axis]))
}

/// Translate the selected axes so the bounding-box minimum equals `floor` at
/// stored precision, and return the applied translation.
///
/// Vertices on the minimum are set to the floor itself; every other
/// translated coordinate is kept at or above it.
pub fn translate_to_floor(
    model: &mut Model,
    bbox_min: &Vec3,
    floor: &Vec3,
    axes: [bool; 3],
) -> Vec3 {
    let delta = Vec3::from_fn(|axis, _| {
        if axes[axis] {
            floor[axis] - bbox_min[axis]
        } else {
            0.0
        }
    });

    for solid in &mut model.solids {
        for facet in &mut solid.facets {
            for index in 0..3 {
                for axis in (0..3).filter(|&axis| axes[axis]) {
                    let value = facet.vertices()[index][axis];
                    let moved = if value == bbox_min[axis] {
                        floor[axis]
                    } else {
                        (value + delta[axis]).max(floor[axis])
                    };
                    facet.set_coordinate(index, axis, moved);
                }
            }
        }
    }

    delta
}

/// Move the model onto the configured minimum position when required.
///
/// Normals are untouched: a translation does not change orientation.
pub fn reposition_model(model: &mut Model, config: &CleanerConfig) -> Vec<Diagnostic> {
    let Some(bounds) = model.bounding_box() else {
        return Vec::new();
    };

    let axes = axes_to_move(&bounds.min, config);
    if !axes.iter().any(|&a| a) {
        debug!(min = ?bounds.min, "model already satisfies the minimum position");
        return Vec::new();
    }

    let floor = config.min_position;
    let delta = translate_to_floor(model, &bounds.min, &floor, axes);
    debug!(?delta, "repositioned model");

    vec![Diagnostic::warning(
        DiagnosticKind::Repositioned,
        Locator::Model,
        format!(
            "model translated by ({}, {}, {}) from minimum ({}, {}, {}) to ({}, {}, {})",
            delta.x,
            delta.y,
            delta.z,
            bounds.min.x,
            bounds.min.y,
            bounds.min.z,
            floor.x,
            floor.y,
            floor.z
        ),
    )]
}
