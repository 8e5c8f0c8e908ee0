//! The render pipeline and its cache gate.
//!
//! [`Processor::process`] turns a source path plus [`RenderOptions`] into an
//! artifact on disk:
//!
//! ```text
//! 1. Resolve source    source → fallback → blank placeholder
//! 2. Output directory  created if missing (failure is fatal)
//! 3. Signature         mtime + operation keys + format + quality
//! 4. Cache lookup      artifact exists → identify and return, nothing decoded
//! 5. Render            decode → operations in order → strip → encode → rename
//! ```
//!
//! ## Fault isolation
//!
//! An operation whose `apply` fails is reported as a [`Diagnostic`] and the
//! pipeline moves on with whatever state the canvas is in. Operations that
//! succeed but could not do everything (missing watermark, unreadable font,
//! no clipping path) are reported the same way with a lower severity. Only
//! filesystem and codec failures abort a render.
//!
//! ## Atomic writes
//!
//! Artifacts (and the blank placeholder) are encoded into a staging file and
//! renamed onto their final name, so readers never observe a half-written
//! file. Two processes missing the same signature at once both render; the
//! last rename wins and both results are identical.

use crate::cache::{
    self, CacheOutcome, RenderSignature, artifact_path, blank_path, source_mtime,
};
use crate::config::{ConfigError, ProcessorConfig};
use crate::imaging::{
    BackendError, Canvas, Color, ImageBackend, OutputFormat, Quality, RustBackend,
};
use crate::info::ImageInfo;
use crate::operations::{Context, Operation};
use crate::recipe::RenderOptions;
use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Side of the square placeholder rendered when no source is readable.
const BLANK_SIZE: u32 = 100;

/// Prefix of staging files, so stray ones are easy to spot.
const STAGING_PREFIX: &str = ".imagesmith-";

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Cannot create directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The operation ran but skipped part of its work.
    Degraded,
    /// The operation returned an error and left the canvas as it was.
    Failed,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Degraded => "degraded",
            Self::Failed => "failed",
        })
    }
}

/// Something that went wrong inside one operation without stopping the
/// render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Key of the operation that reported it, or `encode:<ext>` for what
    /// the encoder could not write.
    pub operation: String,
    pub severity: Severity,
    pub message: String,
}

/// Which file a render actually started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Primary,
    Fallback,
    Blank,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Primary => "source",
            Self::Fallback => "fallback",
            Self::Blank => "blank",
        })
    }
}

/// Everything decided before rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPlan {
    /// The file that will be decoded.
    pub source: PathBuf,
    pub source_kind: SourceKind,
    pub signature: RenderSignature,
    pub destination: PathBuf,
    /// The destination exists and `force` is off.
    pub cached: bool,
}

/// Result of one [`Processor::process`] call.
#[derive(Debug, Clone)]
pub struct Render {
    pub info: ImageInfo,
    pub outcome: CacheOutcome,
    pub source_kind: SourceKind,
    /// Empty on a cache hit; operations did not run.
    pub diagnostics: Vec<Diagnostic>,
}

/// Pipeline executor bound to one backend and configuration.
pub struct Processor<B: ImageBackend = RustBackend> {
    backend: B,
    config: ProcessorConfig,
}

impl Processor<RustBackend> {
    pub fn new(config: ProcessorConfig) -> Result<Self, ProcessError> {
        Self::with_backend(RustBackend::new(), config)
    }
}

impl<B: ImageBackend> Processor<B> {
    /// Validates `config` and creates its temp directory, if any.
    pub fn with_backend(backend: B, config: ProcessorConfig) -> Result<Self, ProcessError> {
        config.validate()?;
        if let Some(dir) = &config.temp_dir {
            create_dir(dir)?;
        }
        Ok(Self { backend, config })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    fn quality(&self) -> Quality {
        Quality::new(self.config.quality)
    }

    /// Resolve the source, prepare the output directory and compute where
    /// the artifact lives, without rendering it.
    ///
    /// May create the output directory and the blank placeholder.
    pub fn plan(&self, source: &Path, options: &RenderOptions) -> Result<RenderPlan, ProcessError> {
        let output_dir = options.resolve_output_dir(source);
        create_dir(&output_dir)?;

        let (effective, source_kind) = self.resolve_source(source, options, &output_dir)?;

        let keys: Vec<String> = options.operations.iter().map(Operation::key).collect();
        let digest = if self.config.content_digest {
            cache::hash_file(&effective).ok()
        } else {
            None
        };
        let signature = RenderSignature::compute(
            source_mtime(&effective),
            &keys,
            options.format,
            self.quality(),
            digest.as_deref(),
        );
        let destination = artifact_path(&output_dir, &effective, &signature, options.format);
        let cached = !options.force && destination.is_file();

        Ok(RenderPlan {
            source: effective,
            source_kind,
            signature,
            destination,
            cached,
        })
    }

    /// Render `source` through `options.operations`, or return the cached
    /// artifact when an identical request was served before.
    pub fn process(&self, source: &Path, options: &RenderOptions) -> Result<Render, ProcessError> {
        let plan = self.plan(source, options)?;

        if plan.cached {
            debug!(destination = %plan.destination.display(), "cache hit");
            return Ok(Render {
                info: self.identify_cached(&plan.destination),
                outcome: CacheOutcome::Hit,
                source_kind: plan.source_kind,
                diagnostics: Vec::new(),
            });
        }

        debug!(
            source = %plan.source.display(),
            destination = %plan.destination.display(),
            operations = options.operations.len(),
            "cache miss, rendering"
        );
        let mut canvas = self.backend.decode(&plan.source)?;
        let mut diagnostics = self.run_operations(&mut canvas, &options.operations);
        diagnostics.extend(self.encode_losses(&canvas, options.format));
        canvas.strip_metadata();
        self.write_atomic(&canvas, &plan.destination, options.format)?;

        let (width, height) = canvas.dimensions();
        Ok(Render {
            info: ImageInfo::new(plan.destination, width, height),
            outcome: CacheOutcome::Rendered,
            source_kind: plan.source_kind,
            diagnostics,
        })
    }

    /// Apply every operation in order, collecting what went wrong.
    fn run_operations(&self, canvas: &mut Canvas, operations: &[Operation]) -> Vec<Diagnostic> {
        let mut ctx = Context::new(&self.backend, self.config.default_font.as_deref());
        let mut diagnostics = Vec::new();

        for op in operations {
            let key = op.key();
            let result = op.apply(canvas, &mut ctx);

            for message in ctx.take_notes() {
                warn!(operation = %key, "{message}");
                diagnostics.push(Diagnostic {
                    operation: key.clone(),
                    severity: Severity::Degraded,
                    message,
                });
            }
            if let Err(e) = result {
                warn!(operation = %key, error = %e, "operation failed, continuing");
                diagnostics.push(Diagnostic {
                    operation: key,
                    severity: Severity::Failed,
                    message: e.to_string(),
                });
            }
        }
        diagnostics
    }

    /// What writing `canvas` as `format` will leave out.
    fn encode_losses(&self, canvas: &Canvas, format: OutputFormat) -> Vec<Diagnostic> {
        let mut messages = Vec::new();
        if let Some(scheme) = canvas.interlace() {
            if !self.backend.supports_interlace(format, scheme) {
                messages.push(format!(
                    "{} interlacing is not supported for {format}; written non-interlaced",
                    scheme.as_str()
                ));
            }
        }
        if canvas.is_animated() && !format.keeps_frames() {
            messages.push(format!(
                "{format} holds a single frame; {} of {} frames dropped",
                canvas.frame_count() - 1,
                canvas.frame_count()
            ));
        }

        let operation = format!("encode:{format}");
        messages
            .into_iter()
            .map(|message| {
                warn!(operation = %operation, "{message}");
                Diagnostic {
                    operation: operation.clone(),
                    severity: Severity::Degraded,
                    message,
                }
            })
            .collect()
    }

    /// Dimensions of an existing artifact, 0×0 when it cannot be read.
    fn identify_cached(&self, path: &Path) -> ImageInfo {
        match self.backend.identify(path) {
            Ok(dims) => ImageInfo::new(path, dims.width, dims.height),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "cannot identify cached artifact");
                ImageInfo::new(path, 0, 0)
            }
        }
    }

    fn resolve_source(
        &self,
        source: &Path,
        options: &RenderOptions,
        output_dir: &Path,
    ) -> Result<(PathBuf, SourceKind), ProcessError> {
        if is_readable(source) {
            return Ok((source.to_path_buf(), SourceKind::Primary));
        }
        if let Some(fallback) = options.fallback.as_deref().filter(|p| is_readable(p)) {
            warn!(
                source = %source.display(),
                fallback = %fallback.display(),
                "source unreadable, using fallback"
            );
            return Ok((fallback.to_path_buf(), SourceKind::Fallback));
        }
        warn!(source = %source.display(), "source unreadable, using blank placeholder");
        let blank = self.ensure_blank(output_dir, options.format)?;
        Ok((blank, SourceKind::Blank))
    }

    /// The blank placeholder for `format`, rendered on first use only so its
    /// mtime (and every signature built on it) stays stable.
    fn ensure_blank(&self, output_dir: &Path, format: OutputFormat) -> Result<PathBuf, ProcessError> {
        let path = blank_path(output_dir, format);
        if !path.is_file() {
            let canvas = Canvas::blank(BLANK_SIZE, BLANK_SIZE, Color::WHITE);
            self.write_atomic(&canvas, &path, format)?;
        }
        Ok(path)
    }

    /// Encode into a staging file, then rename it onto `destination`.
    fn write_atomic(
        &self,
        canvas: &Canvas,
        destination: &Path,
        format: OutputFormat,
    ) -> Result<(), ProcessError> {
        let dest_dir = destination.parent().unwrap_or(Path::new("."));
        let staging_dir = self.config.temp_dir.as_deref().unwrap_or(dest_dir);
        let staged = staging_file(staging_dir, format)?;
        self.backend
            .encode(canvas, staged.path(), format, self.quality())?;

        match staged.persist(destination) {
            Ok(_) => Ok(()),
            Err(e) => {
                // Rename fails across filesystems; copy next to the target
                // and rename from there instead.
                debug!(error = %e.error, "rename from staging failed, copying");
                let local = staging_file(dest_dir, format)?;
                fs::copy(e.file.path(), local.path())?;
                local.persist(destination).map_err(|e| e.error)?;
                Ok(())
            }
        }
    }
}

fn staging_file(dir: &Path, format: OutputFormat) -> io::Result<tempfile::NamedTempFile> {
    tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(&format!(".{}", format.extension()))
        .tempfile_in(dir)
}

fn create_dir(path: &Path) -> Result<(), ProcessError> {
    fs::create_dir_all(path).map_err(|source| ProcessError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

fn is_readable(path: &Path) -> bool {
    path.is_file() && File::open(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::{Dimensions, Edges, Placement};
    use crate::operations::Filter;
    use crate::test_helpers::write_test_png;
    use tempfile::TempDir;

    fn config() -> ProcessorConfig {
        ProcessorConfig {
            default_font: None,
            ..ProcessorConfig::default()
        }
    }

    /// A mock processor whose backend decodes `source` to a `w`×`h` canvas.
    fn processor(source: &Path, w: u32, h: u32) -> Processor<MockBackend> {
        let backend = MockBackend::new().with_canvas(source, Canvas::blank(w, h, Color::WHITE));
        Processor::with_backend(backend, config()).unwrap()
    }

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("photo.png");
        fs::write(&source, b"not really a png").unwrap();
        let out = tmp.path().join("out");
        (tmp, source, out)
    }

    fn decodes(backend: &MockBackend) -> usize {
        backend
            .get_operations()
            .iter()
            .filter(|op| matches!(op, RecordedOp::Decode(_)))
            .count()
    }

    // =========================================================================
    // Construction
    // =========================================================================

    #[test]
    fn construction_creates_temp_dir() {
        let tmp = TempDir::new().unwrap();
        let stage = tmp.path().join("stage/nested");
        let config = ProcessorConfig {
            temp_dir: Some(stage.clone()),
            ..config()
        };
        Processor::with_backend(MockBackend::new(), config).unwrap();
        assert!(stage.is_dir());
    }

    #[test]
    fn uncreatable_temp_dir_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("file");
        fs::write(&file, b"").unwrap();
        let config = ProcessorConfig {
            temp_dir: Some(file.join("sub")),
            ..config()
        };
        let result = Processor::with_backend(MockBackend::new(), config);
        assert!(matches!(result, Err(ProcessError::CreateDir { .. })));
    }

    #[test]
    fn invalid_config_is_fatal() {
        let config = ProcessorConfig {
            quality: 0,
            ..config()
        };
        let result = Processor::with_backend(MockBackend::new(), config);
        assert!(matches!(result, Err(ProcessError::Config(_))));
    }

    // =========================================================================
    // Cache gate
    // =========================================================================

    #[test]
    fn second_call_is_a_cache_hit() {
        let (_tmp, source, out) = setup();
        let p = processor(&source, 10, 10);
        p.backend().identify_results.lock().unwrap().push(Dimensions {
            width: 5,
            height: 5,
        });
        let options = RenderOptions::new()
            .output_dir(&out)
            .operation(Operation::resize(5, 5, false));

        let first = p.process(&source, &options).unwrap();
        assert_eq!(first.outcome, CacheOutcome::Rendered);
        assert_eq!((first.info.width, first.info.height), (5, 5));

        let second = p.process(&source, &options).unwrap();
        assert_eq!(second.outcome, CacheOutcome::Hit);
        assert_eq!(second.info, first.info);

        assert_eq!(decodes(p.backend()), 1);
        assert_eq!(p.backend().encodes().len(), 1);
    }

    #[test]
    fn unreadable_cached_artifact_reports_zero_size() {
        let (_tmp, source, out) = setup();
        let p = processor(&source, 10, 10);
        let options = RenderOptions::new().output_dir(&out);
        p.process(&source, &options).unwrap();

        // MockBackend has no identify results queued.
        let hit = p.process(&source, &options).unwrap();
        assert_eq!(hit.outcome, CacheOutcome::Hit);
        assert_eq!((hit.info.width, hit.info.height), (0, 0));
    }

    #[test]
    fn force_renders_again() {
        let (_tmp, source, out) = setup();
        let p = processor(&source, 10, 10);
        let options = RenderOptions::new().output_dir(&out).force(true);

        let a = p.process(&source, &options).unwrap();
        let b = p.process(&source, &options).unwrap();
        assert_eq!(a.outcome, CacheOutcome::Rendered);
        assert_eq!(b.outcome, CacheOutcome::Rendered);
        assert_eq!(a.info.path, b.info.path);
        assert_eq!(p.backend().encodes().len(), 2);
    }

    #[test]
    fn parameter_change_changes_artifact_name() {
        let (_tmp, source, out) = setup();
        let p = processor(&source, 10, 10);
        let crop = |w| {
            RenderOptions::new()
                .output_dir(&out)
                .operation(Operation::crop(w, 5, 0, 0))
        };
        let a = p.plan(&source, &crop(5)).unwrap();
        let b = p.plan(&source, &crop(6)).unwrap();
        assert_ne!(a.signature, b.signature);
        assert_ne!(a.destination, b.destination);
    }

    #[test]
    fn artifact_named_after_stem_and_signature() {
        let (_tmp, source, out) = setup();
        let p = processor(&source, 10, 10);
        let options = RenderOptions::new().output_dir(&out).format(OutputFormat::Png);
        let plan = p.plan(&source, &options).unwrap();
        assert_eq!(
            plan.destination,
            out.join(format!("photo-{}.png", plan.signature))
        );
        assert!(!plan.cached);
    }

    #[test]
    fn content_digest_changes_signature_on_same_mtime_rewrite() {
        let (_tmp, source, out) = setup();
        let backend = MockBackend::new();
        let config = ProcessorConfig {
            content_digest: true,
            ..config()
        };
        let p = Processor::with_backend(backend, config).unwrap();
        let options = RenderOptions::new().output_dir(&out);

        let before = p.plan(&source, &options).unwrap();
        let mtime = fs::metadata(&source).unwrap().modified().unwrap();
        fs::write(&source, b"different bytes").unwrap();
        File::options()
            .write(true)
            .open(&source)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
        let after = p.plan(&source, &options).unwrap();
        assert_ne!(before.signature, after.signature);
    }

    #[test]
    fn output_dir_is_created() {
        let (_tmp, source, out) = setup();
        let p = processor(&source, 10, 10);
        p.process(&source, &RenderOptions::new().output_dir(out.join("a/b")))
            .unwrap();
        assert!(out.join("a/b").is_dir());
    }

    #[test]
    fn uncreatable_output_dir_is_fatal() {
        let (tmp, source, _out) = setup();
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, b"").unwrap();
        let p = processor(&source, 10, 10);
        let result = p.process(&source, &RenderOptions::new().output_dir(blocker.join("x")));
        assert!(matches!(result, Err(ProcessError::CreateDir { .. })));
    }

    #[test]
    fn no_staging_files_left_behind() {
        let (_tmp, source, out) = setup();
        let p = processor(&source, 10, 10);
        p.process(&source, &RenderOptions::new().output_dir(&out))
            .unwrap();
        let names: Vec<String> = fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(!names[0].starts_with(STAGING_PREFIX));
    }

    #[test]
    fn staging_in_configured_temp_dir() {
        let (tmp, source, out) = setup();
        let stage = tmp.path().join("stage");
        let backend = MockBackend::new().with_canvas(&source, Canvas::blank(4, 4, Color::WHITE));
        let config = ProcessorConfig {
            temp_dir: Some(stage.clone()),
            ..config()
        };
        let p = Processor::with_backend(backend, config).unwrap();
        let render = p
            .process(&source, &RenderOptions::new().output_dir(&out))
            .unwrap();

        let encodes = p.backend().encodes();
        let RecordedOp::Encode { output, .. } = &encodes[0] else {
            panic!("expected encode");
        };
        assert!(Path::new(output).starts_with(&stage));
        assert!(render.info.path.is_file());
        assert_eq!(fs::read_dir(&stage).unwrap().count(), 0);
    }

    // =========================================================================
    // Source resolution
    // =========================================================================

    #[test]
    fn missing_source_uses_fallback() {
        let (tmp, _source, out) = setup();
        let fallback = tmp.path().join("fallback.png");
        fs::write(&fallback, b"x").unwrap();
        let p = processor(&fallback, 7, 3);

        let render = p
            .process(
                &tmp.path().join("missing.png"),
                &RenderOptions::new().output_dir(&out).fallback(&fallback),
            )
            .unwrap();
        assert_eq!(render.source_kind, SourceKind::Fallback);
        assert_eq!((render.info.width, render.info.height), (7, 3));
        let name = render.info.path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("fallback-"), "{name}");
    }

    #[test]
    fn missing_sources_sharing_a_fallback_share_the_artifact() {
        let (tmp, _source, out) = setup();
        let fallback = tmp.path().join("fallback.png");
        fs::write(&fallback, b"x").unwrap();
        let p = processor(&fallback, 7, 3);
        let options = RenderOptions::new().output_dir(&out).fallback(&fallback);

        let a = p.process(&tmp.path().join("a.png"), &options).unwrap();
        let b = p.process(&tmp.path().join("b.png"), &options).unwrap();

        assert_eq!(a.outcome, CacheOutcome::Rendered);
        assert_eq!(b.outcome, CacheOutcome::Hit);
        assert_eq!(a.info.path, b.info.path);
        assert_eq!(p.backend().encodes().len(), 1);
    }

    #[test]
    fn missing_source_and_fallback_use_blank() {
        let (tmp, _source, out) = setup();
        let blank = out.join("blank.webp");
        let backend =
            MockBackend::new().with_canvas(&blank, Canvas::blank(100, 100, Color::WHITE));
        let p = Processor::with_backend(backend, config()).unwrap();

        let render = p
            .process(
                &tmp.path().join("missing.png"),
                &RenderOptions::new()
                    .output_dir(&out)
                    .fallback(tmp.path().join("also-missing.png")),
            )
            .unwrap();
        assert_eq!(render.source_kind, SourceKind::Blank);
        assert!(blank.is_file());
        assert_eq!((render.info.width, render.info.height), (100, 100));
        let name = render.info.path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("blank-") && name.ends_with(".webp"), "{name}");

        let encodes = p.backend().encodes();
        assert_eq!(encodes.len(), 2);
        assert!(matches!(
            &encodes[0],
            RecordedOp::Encode { width: 100, height: 100, format: OutputFormat::WebP, .. }
        ));
    }

    #[test]
    fn existing_blank_is_reused() {
        let (tmp, _source, out) = setup();
        fs::create_dir_all(&out).unwrap();
        let blank = out.join("blank.png");
        fs::write(&blank, b"placeholder").unwrap();
        let p = processor(&blank, 100, 100);

        p.process(
            &tmp.path().join("missing.png"),
            &RenderOptions::new().output_dir(&out).format(OutputFormat::Png),
        )
        .unwrap();
        assert_eq!(p.backend().encodes().len(), 1);
        assert_eq!(fs::read(&blank).unwrap(), b"placeholder");
    }

    // =========================================================================
    // Encoder losses
    // =========================================================================

    #[test]
    fn unsupported_interlace_is_reported() {
        let (_tmp, source, out) = setup();
        let p = processor(&source, 10, 10);
        let render = p
            .process(
                &source,
                &RenderOptions::new()
                    .output_dir(&out)
                    .format(OutputFormat::Png)
                    .operation(Operation::filter(Filter::interlace("png"))),
            )
            .unwrap();

        assert_eq!(render.diagnostics.len(), 1);
        let d = &render.diagnostics[0];
        assert_eq!(d.operation, "encode:png");
        assert_eq!(d.severity, Severity::Degraded);
        assert!(d.message.contains("png interlacing"), "{}", d.message);
    }

    #[test]
    fn supported_interlace_is_silent() {
        let (_tmp, source, out) = setup();
        let backend = MockBackend::new()
            .with_interlace()
            .with_canvas(&source, Canvas::blank(10, 10, Color::WHITE));
        let p = Processor::with_backend(backend, config()).unwrap();
        let render = p
            .process(
                &source,
                &RenderOptions::new()
                    .output_dir(&out)
                    .operation(Operation::filter(Filter::interlace("plane"))),
            )
            .unwrap();
        assert!(render.diagnostics.is_empty());
    }

    #[test]
    fn dropped_frames_are_reported_for_still_formats() {
        let (_tmp, source, out) = setup();
        let frames = (0..3)
            .map(|_| crate::imaging::Frame::still(image::RgbaImage::new(4, 4)))
            .collect();
        let backend =
            MockBackend::new().with_canvas(&source, Canvas::from_frames(frames).unwrap());
        let p = Processor::with_backend(backend, config()).unwrap();

        let still = p
            .process(&source, &RenderOptions::new().output_dir(&out).format(OutputFormat::Png))
            .unwrap();
        assert_eq!(still.diagnostics.len(), 1);
        assert!(still.diagnostics[0].message.contains("2 of 3 frames dropped"));

        let animated = p
            .process(&source, &RenderOptions::new().output_dir(&out).format(OutputFormat::Gif))
            .unwrap();
        assert!(animated.diagnostics.is_empty());
    }

    // =========================================================================
    // Fault isolation
    // =========================================================================

    #[test]
    fn failing_operation_does_not_abort_render() {
        let (_tmp, source, out) = setup();
        let p = processor(&source, 10, 10);
        let options = RenderOptions::new()
            .output_dir(&out)
            .operation(Operation::crop(5, 5, 50, 50))
            .operation(Operation::margin(Edges::uniform(2), None));

        let render = p.process(&source, &options).unwrap();
        assert_eq!(render.outcome, CacheOutcome::Rendered);
        assert_eq!(render.diagnostics.len(), 1);
        assert_eq!(render.diagnostics[0].operation, "crop:5x5-50-50");
        assert_eq!(render.diagnostics[0].severity, Severity::Failed);
        // margin still ran on the untouched 10x10 canvas
        assert_eq!((render.info.width, render.info.height), (14, 14));
    }

    #[test]
    fn degraded_operations_are_reported() {
        let (_tmp, source, out) = setup();
        let p = processor(&source, 10, 10);
        let options = RenderOptions::new()
            .output_dir(&out)
            .operation(Operation::watermark("/nonexistent.png", Placement::Center, None))
            .operation(Operation::clip_path(false));

        let render = p.process(&source, &options).unwrap();
        assert_eq!(render.diagnostics.len(), 2);
        assert!(
            render
                .diagnostics
                .iter()
                .all(|d| d.severity == Severity::Degraded)
        );
        assert_eq!((render.info.width, render.info.height), (10, 10));
    }

    #[test]
    fn operations_apply_in_order() {
        let (_tmp, source, out) = setup();
        let p = processor(&source, 10, 10);
        let options = RenderOptions::new()
            .output_dir(&out)
            .operation(Operation::crop(4, 6, 0, 0))
            .operation(Operation::rotate(90.0))
            .operation(Operation::filter(Filter::Grayscale));

        let render = p.process(&source, &options).unwrap();
        assert!(render.diagnostics.is_empty());
        assert_eq!((render.info.width, render.info.height), (6, 4));
        assert!(matches!(
            &p.backend().encodes()[0],
            RecordedOp::Encode { width: 6, height: 4, quality: 75, .. }
        ));
    }

    #[test]
    fn corrupt_source_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("broken.png");
        fs::write(&source, b"garbage").unwrap();
        let p = Processor::new(config()).unwrap();
        let result = p.process(&source, &RenderOptions::new().output_dir(tmp.path()));
        assert!(matches!(result, Err(ProcessError::Imaging(_))));
    }

    #[test]
    fn real_backend_renders_png() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("src.png");
        write_test_png(&source, 20, 10);
        let p = Processor::new(config()).unwrap();
        let render = p
            .process(
                &source,
                &RenderOptions::new()
                    .output_dir(tmp.path().join("out"))
                    .format(OutputFormat::Png)
                    .operation(Operation::resize(10, 10, true)),
            )
            .unwrap();
        assert_eq!((render.info.width, render.info.height), (10, 5));
        assert_eq!(
            image::image_dimensions(&render.info.path).unwrap(),
            (10, 5)
        );
    }

    #[test]
    fn real_backend_crop_keeps_requested_quadrant() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("src.png");
        write_test_png(&source, 20, 10);
        let p = Processor::new(config()).unwrap();
        let render = p
            .process(
                &source,
                &RenderOptions::new()
                    .output_dir(tmp.path())
                    .format(OutputFormat::Png)
                    .operation(Operation::crop(10, 5, 10, 0)),
            )
            .unwrap();
        let img = image::open(&render.info.path).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (10, 5));
        assert!(img.pixels().all(|p| *p == image::Rgba([0, 255, 0, 255])));
    }
}
