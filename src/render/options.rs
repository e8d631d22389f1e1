//! # Render Options
//!
//! Caller-supplied inputs for one render call, their pre-flight validation,
//! and the result type handed back.
//!
//! ## Validation Order
//!
//! ```text
//! code ──► non-empty, ≤ MAX_CODE_LENGTH
//! dpi, width, height ──► finite and > 0
//! pixel size ──► 1..=MAX_PIXEL_DIMENSION per axis
//! output path (file mode) ──► clean name, inside the allowed directory
//! ```
//!
//! Everything here runs before a surface is created; a rejected option never
//! costs any drawing work.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize, Serializer};

use crate::error::EtiquetaError;
use crate::fonts::FontMap;
use crate::printer::PrinterConfig;

/// Largest accepted label source, in bytes.
pub const MAX_CODE_LENGTH: usize = 1024 * 1024;

/// Largest accepted frame size along either axis, in dots.
pub const MAX_PIXEL_DIMENSION: i64 = 20_000;

/// Characters never accepted in an output path.
const INVALID_PATH_CHARS: [char; 6] = ['<', '>', '"', '|', '?', '*'];

fn default_dpi() -> f32 {
    PrinterConfig::DPMM_8.dpi
}

fn default_width() -> f32 {
    4.0
}

fn default_height() -> f32 {
    6.0
}

/// Directory file output is confined to unless overridden.
pub fn default_allowed_dir() -> PathBuf {
    std::env::temp_dir().join("etiqueta")
}

/// Where the encoded frame goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Return PNG bytes in the result
    #[default]
    Bytes,
    /// Also write the PNG to `output_path`
    File,
}

/// Inputs for one render call.
///
/// ```
/// use etiqueta::render::RenderOptions;
///
/// let options: RenderOptions = serde_json::from_str(r#"{"code": "^XA^XZ"}"#).unwrap();
/// assert_eq!(options.dpi, 203.0);
/// assert_eq!(options.pixel_dimensions().unwrap(), (812, 1218));
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderOptions {
    /// Label source text
    pub code: String,
    #[serde(default = "default_dpi")]
    pub dpi: f32,
    /// Label width in inches
    #[serde(default = "default_width")]
    pub width: f32,
    /// Label height in inches
    #[serde(default = "default_height")]
    pub height: f32,
    #[serde(default)]
    pub output: OutputMode,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    /// Overrides [`default_allowed_dir`]
    #[serde(default)]
    pub allowed_dir: Option<PathBuf>,
    /// Entries layered over the probed font map
    #[serde(default)]
    pub font_map: Option<FontMap>,
}

impl RenderOptions {
    /// Options for `code` with a 4×6 inch label at 203 dpi.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            dpi: default_dpi(),
            width: default_width(),
            height: default_height(),
            output: OutputMode::Bytes,
            output_path: None,
            allowed_dir: None,
            font_map: None,
        }
    }

    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Label size in inches.
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Write the PNG to `path` as well as returning it.
    pub fn save_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = OutputMode::File;
        self.output_path = Some(path.into());
        self
    }

    pub fn with_allowed_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.allowed_dir = Some(dir.into());
        self
    }

    pub fn with_font_map(mut self, map: FontMap) -> Self {
        self.font_map = Some(map);
        self
    }

    /// Frame size in dots, checked against [`MAX_PIXEL_DIMENSION`].
    pub fn pixel_dimensions(&self) -> Result<(u32, u32), EtiquetaError> {
        let (width, height) = PrinterConfig::custom(self.dpi).pixel_dimensions(self.width, self.height);
        let in_range = |dots: i64| dots > 0 && dots <= MAX_PIXEL_DIMENSION;
        if !in_range(width) || !in_range(height) {
            return Err(EtiquetaError::InvalidOptions(format!(
                "frame of {}x{} dots is outside 1..={} per axis",
                width, height, MAX_PIXEL_DIMENSION
            )));
        }
        Ok((width as u32, height as u32))
    }

    /// Pre-flight checks. Returns the frame size and, in file mode, the
    /// normalized destination.
    pub fn validate(&self) -> Result<((u32, u32), Option<PathBuf>), EtiquetaError> {
        if self.code.trim().is_empty() {
            return Err(EtiquetaError::InvalidOptions("label source is empty".to_string()));
        }
        if self.code.len() > MAX_CODE_LENGTH {
            return Err(EtiquetaError::InvalidOptions(format!(
                "label source is {} bytes, limit is {}",
                self.code.len(),
                MAX_CODE_LENGTH
            )));
        }
        for (name, value) in [("dpi", self.dpi), ("width", self.width), ("height", self.height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(EtiquetaError::InvalidOptions(format!(
                    "{} must be greater than 0, got {}",
                    name, value
                )));
            }
        }
        let size = self.pixel_dimensions()?;

        let target = match self.output {
            OutputMode::Bytes => None,
            OutputMode::File => {
                let path = self.output_path.as_deref().ok_or_else(|| {
                    EtiquetaError::InvalidPath("file output requested without a path".to_string())
                })?;
                let allowed = self.allowed_dir.clone().unwrap_or_else(default_allowed_dir);
                Some(resolve_output_path(path, &allowed)?)
            }
        };

        Ok((size, target))
    }
}

/// Lexically normalize `path`: drop `.` and fold `..` into its parent.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Check `path` and place it inside `allowed_dir`.
///
/// Relative paths are taken relative to `allowed_dir`. The normalized result
/// must lie strictly inside the normalized directory.
pub fn resolve_output_path(path: &Path, allowed_dir: &Path) -> Result<PathBuf, EtiquetaError> {
    let text = path.to_string_lossy();
    if let Some(bad) = text
        .chars()
        .find(|c| INVALID_PATH_CHARS.contains(c) || c.is_control())
    {
        return Err(EtiquetaError::InvalidPath(format!(
            "{:?} contains invalid character {:?}",
            text, bad
        )));
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    if file_name.trim().is_empty() {
        return Err(EtiquetaError::InvalidPath(format!("{:?} has no file name", text)));
    }
    if file_name.contains(':') {
        return Err(EtiquetaError::InvalidPath(format!(
            "file name {:?} contains invalid character ':'",
            file_name
        )));
    }

    let base = normalize(&std::path::absolute(allowed_dir)?);
    let candidate = if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    };

    if candidate == base || !candidate.starts_with(&base) {
        return Err(EtiquetaError::InvalidPath(format!(
            "{} is outside {}",
            candidate.display(),
            base.display()
        )));
    }
    Ok(candidate)
}

fn serialize_image<S: Serializer>(image: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
    use base64::Engine as _;

    match image {
        Some(bytes) => serializer.serialize_some(&base64::engine::general_purpose::STANDARD.encode(bytes)),
        None => serializer.serialize_none(),
    }
}

/// Outcome of a render call.
///
/// `image` may be present on failure when encoding succeeded but writing the
/// file did not. Serializes the image as base64.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderResult {
    pub success: bool,
    pub error: Option<String>,
    #[serde(serialize_with = "serialize_image")]
    pub image: Option<Vec<u8>>,
    /// Where the image was written, in file mode
    pub path: Option<PathBuf>,
}

impl RenderResult {
    pub fn ok(image: Vec<u8>, path: Option<PathBuf>) -> Self {
        Self {
            success: true,
            error: None,
            image: Some(image),
            path,
        }
    }

    pub fn failure(error: impl ToString, image: Option<Vec<u8>>) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            image,
            path: None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
