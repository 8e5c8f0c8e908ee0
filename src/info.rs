//! Descriptor of a rendered artifact.
//!
//! Width and height are what the processor saw when it produced (or found)
//! the file; they are not re-read. The embedding helpers read the file on
//! every call and never cache its bytes.

use crate::imaging::OutputFormat;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InfoError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl ImageInfo {
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            width,
            height,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `width / height`, or `0.0` for a zero height.
    pub fn ratio(&self) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f64 / self.height as f64
    }

    /// MIME type guessed from the file extension.
    pub fn mime_type(&self) -> &'static str {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse::<OutputFormat>().ok())
            .map_or("application/octet-stream", OutputFormat::mime_type)
    }

    /// The whole file as a base64 `data:` URI.
    pub fn inline_data_uri(&self) -> Result<String, InfoError> {
        self.ensure_exists()?;
        let bytes = std::fs::read(&self.path)?;
        Ok(format!(
            "data:{};base64,{}",
            self.mime_type(),
            STANDARD.encode(bytes)
        ))
    }

    /// An empty SVG with this image's proportions, as a `data:` URI.
    /// Useful to reserve layout space before the real image loads.
    pub fn svg_placeholder(&self) -> Result<String, InfoError> {
        self.ensure_exists()?;
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}"></svg>"#,
            self.width, self.height
        );
        Ok(format!("data:image/svg+xml,{}", percent_encode(&svg)))
    }

    fn ensure_exists(&self) -> Result<(), InfoError> {
        if self.path.is_file() {
            Ok(())
        } else {
            Err(InfoError::NotFound(self.path.clone()))
        }
    }
}

/// RFC 3986 percent-encoding: everything except unreserved characters.
pub(crate) fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn ratio_divides_width_by_height() {
        assert_eq!(ImageInfo::new("a.png", 200, 100).ratio(), 2.0);
    }

    #[test]
    fn ratio_with_zero_height_is_zero() {
        assert_eq!(ImageInfo::new("a.png", 200, 0).ratio(), 0.0);
    }

    #[test]
    fn mime_type_follows_extension() {
        assert_eq!(ImageInfo::new("a.webp", 1, 1).mime_type(), "image/webp");
        assert_eq!(ImageInfo::new("a.JPG", 1, 1).mime_type(), "image/jpeg");
        assert_eq!(
            ImageInfo::new("a.xyz", 1, 1).mime_type(),
            "application/octet-stream"
        );
    }

    #[test]
    fn inline_data_uri_encodes_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("x.png");
        fs::write(&path, b"abc").unwrap();
        let info = ImageInfo::new(&path, 1, 1);
        assert_eq!(info.inline_data_uri().unwrap(), "data:image/png;base64,YWJj");
    }

    #[test]
    fn inline_data_uri_reads_lazily() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("x.png");
        fs::write(&path, b"abc").unwrap();
        let info = ImageInfo::new(&path, 1, 1);
        fs::write(&path, b"abcd").unwrap();
        assert_eq!(info.inline_data_uri().unwrap(), "data:image/png;base64,YWJjZA==");
    }

    #[test]
    fn missing_file_is_not_found() {
        let info = ImageInfo::new("/nonexistent/x.png", 10, 10);
        assert!(matches!(info.inline_data_uri(), Err(InfoError::NotFound(_))));
        assert!(matches!(info.svg_placeholder(), Err(InfoError::NotFound(_))));
    }

    #[test]
    fn svg_placeholder_has_image_viewbox() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("x.png");
        fs::write(&path, b"").unwrap();
        let uri = ImageInfo::new(&path, 40, 30).svg_placeholder().unwrap();
        assert_eq!(
            uri,
            "data:image/svg+xml,%3Csvg%20xmlns%3D%22http%3A%2F%2Fwww.w3.org%2F2000%2Fsvg%22%20viewBox%3D%220%200%2040%2030%22%3E%3C%2Fsvg%3E"
        );
    }

    #[test]
    fn percent_encode_keeps_unreserved() {
        assert_eq!(percent_encode("aZ09-_.~"), "aZ09-_.~");
        assert_eq!(percent_encode("a b/é"), "a%20b%2F%C3%A9");
    }
}
