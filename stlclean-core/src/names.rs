/// Solid / endsolid label reconciliation
use crate::config::CleanerConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Locator};
use crate::model::{Model, Solid};

/// Name given to a solid that has no label at either end.
pub const FALLBACK_SOLID_NAME: &str = "model";

/// Give an unnamed solid the `endsolid` label when one was read, otherwise
/// [`FALLBACK_SOLID_NAME`].
fn name_unnamed(solid: &mut Solid) {
    if !solid.name.is_empty() {
        return;
    }
    solid.name = match solid.end_name.as_deref() {
        Some(end_name) if !end_name.is_empty() => end_name.to_string(),
        _ => FALLBACK_SOLID_NAME.to_string(),
    };
    if solid.end_name.as_deref() == Some("") {
        solid.end_name = Some(solid.name.clone());
    }
}

/// Make every `endsolid` label match its `solid` label.
///
/// The `solid` label is authoritative. With `ignore_endsolid_name` set the
/// closing labels are dropped unchecked.
pub fn reconcile_names(model: &mut Model, config: &CleanerConfig) -> Vec<Diagnostic> {
    if config.ignore_endsolid_name {
        for solid in &mut model.solids {
            solid.end_name = None;
            name_unnamed(solid);
        }
        return Vec::new();
    }

    let mut diagnostics = Vec::new();
    for (index, solid) in model.solids.iter_mut().enumerate() {
        name_unnamed(solid);
        let Some(end_name) = &solid.end_name else {
            continue;
        };
        if *end_name == solid.name {
            continue;
        }

        diagnostics.push(Diagnostic::warning(
            DiagnosticKind::NameMismatch,
            Locator::Solid { solid: index },
            format!(
                "endsolid name '{}' does not match solid name '{}'",
                end_name, solid.name
            ),
        ));
        solid.end_name = Some(solid.name.clone());
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Encoding, Solid};

    fn model_with(name: &str, end_name: Option<&str>) -> Model {
        let mut solid = Solid::new(name);
        solid.end_name = end_name.map(str::to_string);
        Model::new(Encoding::Ascii).with_solid(solid)
    }

    #[test]
    fn test_mismatch_is_overwritten() {
        let mut model = model_with("Box", Some("Box2"));
        let diagnostics = reconcile_names(&mut model, &CleanerConfig::default());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::NameMismatch);
        assert_eq!(diagnostics[0].locator, Locator::Solid { solid: 0 });
        assert_eq!(model.solids[0].closing_name(), "Box");
    }

    #[test]
    fn test_matching_and_unread_names() {
        let mut model = model_with("Box", Some("Box"));
        assert!(reconcile_names(&mut model, &CleanerConfig::default()).is_empty());

        let mut model = model_with("Box", None);
        assert!(reconcile_names(&mut model, &CleanerConfig::default()).is_empty());
    }

    #[test]
    fn test_unnamed_solid_takes_endsolid_name() {
        let mut model = model_with("", Some("part"));
        assert!(reconcile_names(&mut model, &CleanerConfig::default()).is_empty());
        assert_eq!(model.solids[0].name, "part");
        assert_eq!(model.solids[0].closing_name(), "part");
    }

    #[test]
    fn test_unnamed_solid_falls_back_to_model() {
        for end_name in [Some(""), None] {
            let mut model = model_with("", end_name);
            assert!(reconcile_names(&mut model, &CleanerConfig::default()).is_empty());
            assert_eq!(model.solids[0].name, FALLBACK_SOLID_NAME);
            assert_eq!(model.solids[0].closing_name(), FALLBACK_SOLID_NAME);
        }

        let mut model = model_with("", Some("part"));
        let config = CleanerConfig::default().with_ignore_endsolid_name(true);
        reconcile_names(&mut model, &config);
        assert_eq!(model.solids[0].name, FALLBACK_SOLID_NAME);
    }

    #[test]
    fn test_ignore_endsolid_name() {
        let mut model = model_with("Box", Some("Box2"));
        let config = CleanerConfig::default().with_ignore_endsolid_name(true);
        assert!(reconcile_names(&mut model, &config).is_empty());
        assert_eq!(model.solids[0].closing_name(), "Box");
    }
}
