//! Per-render options, optionally loaded from a TOML recipe.
//!
//! A recipe is everything a single render needs besides the source path:
//!
//! ```toml
//! output_dir = "cache"      # default: the source's directory
//! format = "webp"           # webp, png, jpg, gif, avif, bmp, tiff
//! force = false             # render even when the artifact exists
//! fallback = "missing.png"  # used when the source cannot be read
//!
//! [[operations]]
//! op = "fit"
//! width = 300
//! height = 200
//! mode = "fill"
//!
//! [[operations]]
//! op = "watermark"
//! path = "logo.png"
//! placement = "bottom-right"
//! opacity = 0.4
//! ```
//!
//! Operations run in file order. An entry whose `op` is not a known
//! operation, or whose parameters do not parse, rejects the whole recipe.

use crate::imaging::OutputFormat;
use crate::operations::Operation;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Recipe parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    /// Directory artifacts are written to. `None` means next to the source.
    pub output_dir: Option<PathBuf>,
    #[serde(alias = "output_ext")]
    pub format: OutputFormat,
    pub force: bool,
    pub fallback: Option<PathBuf>,
    pub operations: Vec<Operation>,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml(content: &str) -> Result<Self, RecipeError> {
        Ok(toml::from_str(content)?)
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn fallback(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallback = Some(path.into());
        self
    }

    pub fn operation(mut self, op: Operation) -> Self {
        self.operations.push(op);
        self
    }

    pub fn operations(mut self, ops: impl IntoIterator<Item = Operation>) -> Self {
        self.operations.extend(ops);
        self
    }

    /// The directory artifacts for `source` go to.
    pub fn resolve_output_dir(&self, source: &Path) -> PathBuf {
        if let Some(dir) = &self.output_dir {
            return dir.clone();
        }
        match source.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// Load a recipe file.
pub fn load_recipe(path: &Path) -> Result<RenderOptions, RecipeError> {
    let content = fs::read_to_string(path)?;
    RenderOptions::from_toml(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{Color, Placement};
    use tempfile::TempDir;

    #[test]
    fn empty_recipe_is_default() {
        let options = RenderOptions::from_toml("").unwrap();
        assert_eq!(options, RenderOptions::default());
        assert_eq!(options.format, OutputFormat::WebP);
        assert!(!options.force);
        assert!(options.operations.is_empty());
    }

    #[test]
    fn parse_full_recipe() {
        let options = RenderOptions::from_toml(
            r##"
output_dir = "cache"
format = "PNG"
force = true
fallback = "missing.png"

[[operations]]
op = "background"
color = "#000"

[[operations]]
op = "watermark"
path = "logo.png"
placement = "bottom-right"
opacity = 0.4
"##,
        )
        .unwrap();

        assert_eq!(
            options,
            RenderOptions::new()
                .output_dir("cache")
                .format(OutputFormat::Png)
                .force(true)
                .fallback("missing.png")
                .operation(Operation::background(Color::BLACK))
                .operation(Operation::watermark(
                    "logo.png",
                    Placement::BottomRight,
                    Some(0.4)
                ))
        );
    }

    #[test]
    fn output_ext_alias_accepted() {
        let options = RenderOptions::from_toml(r#"output_ext = "jpeg""#).unwrap();
        assert_eq!(options.format, OutputFormat::Jpeg);
    }

    #[test]
    fn unknown_operation_rejects_recipe() {
        let result = RenderOptions::from_toml(
            r#"
[[operations]]
op = "crop"
width = 1
height = 1
x = 0
y = 0

[[operations]]
op = "sharpen"
"#,
        );
        assert!(matches!(result, Err(RecipeError::Toml(_))));
    }

    #[test]
    fn unknown_format_rejects_recipe() {
        let result = RenderOptions::from_toml(r#"format = "psd""#);
        assert!(matches!(result, Err(RecipeError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejects_recipe() {
        let result = RenderOptions::from_toml("forse = true");
        assert!(matches!(result, Err(RecipeError::Toml(_))));
    }

    #[test]
    fn output_dir_defaults_to_source_parent() {
        let options = RenderOptions::new();
        assert_eq!(
            options.resolve_output_dir(Path::new("/photos/cat.jpg")),
            PathBuf::from("/photos")
        );
        assert_eq!(
            options.resolve_output_dir(Path::new("cat.jpg")),
            PathBuf::from(".")
        );
        let options = options.output_dir("/out");
        assert_eq!(
            options.resolve_output_dir(Path::new("/photos/cat.jpg")),
            PathBuf::from("/out")
        );
    }

    #[test]
    fn load_recipe_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("thumb.toml");
        fs::write(
            &path,
            r#"
[[operations]]
op = "rotate"
degrees = 90
"#,
        )
        .unwrap();
        let options = load_recipe(&path).unwrap();
        assert_eq!(options.operations, vec![Operation::rotate(90.0)]);
    }
}
