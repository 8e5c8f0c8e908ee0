//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! # Output Format
//!
//! ## Render
//!
//! ```text
//! 001 photo.jpg → cache/photo-3f2a9c1b0d4e.webp (300x200, rendered)
//!     Source: fallback
//!     degraded watermark:/logo.png:center:α: watermark: cannot read /logo.png (…)
//! ```
//!
//! ## Plan
//!
//! ```text
//! photo.jpg
//!     Signature: 3f2a9c1b0d4e
//!     Artifact: cache/photo-3f2a9c1b0d4e.webp (cached)
//!     001 fit:300x200:center:inherit
//!     002 filter:sepia:80
//! ```
//!
//! ## Info
//!
//! ```text
//! cache/photo-3f2a9c1b0d4e.webp
//!     Size: 300x200 (ratio 1.50)
//!     Type: image/webp
//! ```

use crate::info::ImageInfo;
use crate::operations::Operation;
use crate::process::{Render, RenderPlan, SourceKind};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Where the render actually started from, when it is not the request.
fn source_line(kind: SourceKind, effective: &Path) -> Option<String> {
    match kind {
        SourceKind::Primary => None,
        SourceKind::Fallback | SourceKind::Blank => Some(format!(
            "{}Source: {} ({})",
            indent(1),
            kind,
            effective.display()
        )),
    }
}

// ============================================================================
// Render
// ============================================================================

pub fn format_render(index: usize, source: &Path, render: &Render) -> Vec<String> {
    let info = &render.info;
    let mut lines = vec![format!(
        "{} {} → {} ({}x{}, {})",
        format_index(index),
        source.display(),
        info.path.display(),
        info.width,
        info.height,
        render.outcome
    )];
    if render.source_kind != SourceKind::Primary {
        lines.push(format!("{}Source: {}", indent(1), render.source_kind));
    }
    for d in &render.diagnostics {
        lines.push(format!(
            "{}{} {}: {}",
            indent(1),
            d.severity,
            d.operation,
            d.message
        ));
    }
    lines
}

pub fn print_render(index: usize, source: &Path, render: &Render) {
    for line in format_render(index, source, render) {
        println!("{}", line);
    }
}

// ============================================================================
// Plan
// ============================================================================

pub fn format_plan(source: &Path, plan: &RenderPlan, operations: &[Operation]) -> Vec<String> {
    let mut lines = vec![source.display().to_string()];
    lines.extend(source_line(plan.source_kind, &plan.source));
    lines.push(format!("{}Signature: {}", indent(1), plan.signature));
    lines.push(format!(
        "{}Artifact: {} ({})",
        indent(1),
        plan.destination.display(),
        if plan.cached { "cached" } else { "to render" }
    ));
    for (i, op) in operations.iter().enumerate() {
        lines.push(format!("{}{} {}", indent(1), format_index(i + 1), op.key()));
    }
    lines
}

pub fn print_plan(source: &Path, plan: &RenderPlan, operations: &[Operation]) {
    for line in format_plan(source, plan, operations) {
        println!("{}", line);
    }
}

// ============================================================================
// Info
// ============================================================================

pub fn format_info(info: &ImageInfo) -> Vec<String> {
    vec![
        info.path.display().to_string(),
        format!(
            "{}Size: {}x{} (ratio {:.2})",
            indent(1),
            info.width,
            info.height,
            info.ratio()
        ),
        format!("{}Type: {}", indent(1), info.mime_type()),
    ]
}

pub fn print_info(info: &ImageInfo) {
    for line in format_info(info) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheOutcome, RenderSignature};
    use crate::imaging::{OutputFormat, Quality};
    use crate::process::{Diagnostic, Severity};
    use std::path::PathBuf;

    fn signature() -> RenderSignature {
        RenderSignature::compute(0, &[], OutputFormat::WebP, Quality::default(), None)
    }

    #[test]
    fn render_line_shows_destination_size_and_outcome() {
        let render = Render {
            info: ImageInfo::new("out/cat-abc.webp", 30, 20),
            outcome: CacheOutcome::Rendered,
            source_kind: SourceKind::Primary,
            diagnostics: vec![],
        };
        assert_eq!(
            format_render(1, Path::new("cat.jpg"), &render),
            vec!["001 cat.jpg → out/cat-abc.webp (30x20, rendered)"]
        );
    }

    #[test]
    fn render_lists_fallback_and_diagnostics() {
        let render = Render {
            info: ImageInfo::new("out/cat-abc.webp", 100, 100),
            outcome: CacheOutcome::Rendered,
            source_kind: SourceKind::Blank,
            diagnostics: vec![Diagnostic {
                operation: "crop:5x5-50-50".into(),
                severity: Severity::Failed,
                message: "invalid geometry: outside".into(),
            }],
        };
        let lines = format_render(2, Path::new("cat.jpg"), &render);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "    Source: blank");
        assert_eq!(
            lines[2],
            "    failed crop:5x5-50-50: invalid geometry: outside"
        );
    }

    #[test]
    fn cache_hit_is_labelled() {
        let render = Render {
            info: ImageInfo::new("a.png", 1, 1),
            outcome: CacheOutcome::Hit,
            source_kind: SourceKind::Primary,
            diagnostics: vec![],
        };
        assert!(format_render(1, Path::new("a"), &render)[0].ends_with("(1x1, cached)"));
    }

    #[test]
    fn plan_lists_operations_in_order() {
        let sig = signature();
        let plan = RenderPlan {
            source: PathBuf::from("missing-fallback.png"),
            source_kind: SourceKind::Fallback,
            destination: PathBuf::from(format!("out/cat-{sig}.webp")),
            signature: sig.clone(),
            cached: false,
        };
        let ops = [Operation::rotate(90.0), Operation::crop(5, 5, 0, 0)];
        let lines = format_plan(Path::new("cat.jpg"), &plan, &ops);
        assert_eq!(
            lines,
            vec![
                "cat.jpg".to_string(),
                "    Source: fallback (missing-fallback.png)".to_string(),
                format!("    Signature: {sig}"),
                format!("    Artifact: out/cat-{sig}.webp (to render)"),
                "    001 rotate:90".to_string(),
                "    002 crop:5x5-0-0".to_string(),
            ]
        );
    }

    #[test]
    fn info_shows_size_ratio_and_type() {
        let lines = format_info(&ImageInfo::new("x.webp", 300, 200));
        assert_eq!(
            lines,
            vec!["x.webp", "    Size: 300x200 (ratio 1.50)", "    Type: image/webp"]
        );
    }
}
