//! The decode → reposition → validate → reconcile → encode pipeline.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::CleanerConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSummary, Locator};
use crate::error::{StlError, StlResult};
use crate::model::Encoding;
use crate::stl::{self, DecodeOptions, Decoded};
use crate::{names, transform, validate};

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanOutcome {
    /// Encoded output file.
    pub bytes: Vec<u8>,
    pub source_encoding: Encoding,
    pub output_encoding: Encoding,
    pub solid_count: usize,
    pub facet_count: usize,
    /// Counts of every finding, reported or not.
    pub summary: DiagnosticSummary,
    /// Findings in pipeline order; empty unless `emit_warnings` is set.
    pub diagnostics: Vec<Diagnostic>,
}

/// Clean an in-memory STL file.
pub fn clean_bytes(input: &[u8], config: &CleanerConfig) -> StlResult<CleanOutcome> {
    config.validate()?;

    let Decoded {
        mut model,
        mut diagnostics,
    } = stl::decode(input, &DecodeOptions::from(config))?;
    let source_encoding = model.encoding;
    debug!(encoding = %source_encoding, bytes = input.len(), "decoded input");

    // Facets are checked on their final coordinates: rounding a translated
    // vertex can flip the winding of a sliver.
    let repositioned = transform::reposition_model(&mut model, config);
    diagnostics.extend(validate::validate_model(&mut model, config));
    diagnostics.extend(repositioned);
    diagnostics.extend(names::reconcile_names(&mut model, config));

    let output_encoding = config.output_encoding.resolve(source_encoding);
    if output_encoding == Encoding::Binary && model.solids.len() > 1 {
        diagnostics.push(Diagnostic::warning(
            DiagnosticKind::SolidsMerged,
            Locator::Model,
            format!(
                "{} solids merged into the single solid of a binary STL",
                model.solids.len()
            ),
        ));
    }

    let bytes = stl::encode(&model, output_encoding, config.indent)?;
    let summary = DiagnosticSummary::from_diagnostics(&diagnostics);

    info!(
        source = %source_encoding,
        output = %output_encoding,
        facets = model.facet_count(),
        warnings = summary.warnings,
        errors = summary.errors,
        "cleaned STL"
    );

    if !config.emit_warnings {
        diagnostics.clear();
    }

    Ok(CleanOutcome {
        bytes,
        source_encoding,
        output_encoding,
        solid_count: model.solids.len(),
        facet_count: model.facet_count(),
        summary,
        diagnostics,
    })
}

/// `part.stl` → `part-cleaned.stl`; other names get the suffix appended.
pub fn default_output_path(source: &Path) -> PathBuf {
    let is_stl = source
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("stl"));
    let stem = if is_stl {
        source.file_stem()
    } else {
        source.file_name()
    };

    let mut name = stem.map(|s| s.to_os_string()).unwrap_or_default();
    name.push("-cleaned.stl");
    source.with_file_name(name)
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// A cleaned file on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedFile {
    pub destination: PathBuf,
    pub outcome: CleanOutcome,
}

/// Clean `source` and write the result to `destination` (or the default
/// output path).
///
/// The output goes through a temporary file in the destination directory, so
/// a failed run never leaves a partial file behind. The written file keeps the
/// permissions of the file it replaces, or those of `source`.
pub fn clean_file(
    source: &Path,
    destination: Option<&Path>,
    config: &CleanerConfig,
) -> StlResult<CleanedFile> {
    let destination = destination
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(source));
    if same_file(source, &destination) {
        return Err(StlError::SameInputOutput { path: destination });
    }

    let input = fs::read(source)?;
    let outcome = clean_bytes(&input, config)?;

    let dir = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    // temp files are created owner-only; take the mode of the file being
    // replaced, or of the source for a new file
    let permissions = match fs::metadata(&destination) {
        Ok(existing) => existing.permissions(),
        Err(_) => fs::metadata(source)?.permissions(),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(&outcome.bytes)?;
    file.as_file().set_permissions(permissions)?;
    file.persist(&destination).map_err(|e| StlError::Io(e.error))?;

    debug!(destination = %destination.display(), "wrote cleaned STL");

    Ok(CleanedFile {
        destination,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("models/part.stl")),
            PathBuf::from("models/part-cleaned.stl")
        );
        assert_eq!(
            default_output_path(Path::new("PART.STL")),
            PathBuf::from("PART-cleaned.stl")
        );
        assert_eq!(
            default_output_path(Path::new("scan.bin")),
            PathBuf::from("scan.bin-cleaned.stl")
        );
    }

    #[test]
    fn test_same_input_output_is_rejected() {
        let err = clean_file(
            Path::new("a.stl"),
            Some(Path::new("a.stl")),
            &CleanerConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, StlError::SameInputOutput { .. }));
    }

    #[test]
    fn test_invalid_config_fails_before_decoding() {
        let config = CleanerConfig::default().with_epsilon(f64::NAN);
        assert!(matches!(
            clean_bytes(b"not even stl", &config),
            Err(StlError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_warnings_hidden_unless_requested() {
        let text = b"solid a\nfacet normal 0 0 -1\nouter loop\n\
                     vertex 1 1 1\nvertex 2 1 1\nvertex 1 2 1\n\
                     endloop\nendfacet\nendsolid a\n";

        let quiet = clean_bytes(text, &CleanerConfig::default()).unwrap();
        assert!(quiet.diagnostics.is_empty());
        assert_eq!(quiet.summary.warnings, 1);

        let loud = clean_bytes(text, &CleanerConfig::default().with_emit_warnings(true)).unwrap();
        assert_eq!(loud.diagnostics.len(), 1);
        assert_eq!(loud.diagnostics[0].kind, DiagnosticKind::NormalCorrected);
    }
}
