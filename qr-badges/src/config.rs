//! Layout configuration: built-in defaults overlaid by an optional JSON or
//! YAML file.
//!
//! The resolved [`LayoutConfig`] is immutable and passed by reference to
//! every stage of the pipeline.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{BadgeError, Result};

// ============================================================================
// Defaults (Avery 5395, 2 x 4 labels on US Letter)
// ============================================================================

const DEFAULT_PAGE_WIDTH_IN: f32 = 8.5;
const DEFAULT_PAGE_HEIGHT_IN: f32 = 11.0;

const DEFAULT_MARGIN_TOP_IN: f32 = 0.5;
const DEFAULT_MARGIN_BOTTOM_IN: f32 = 0.5;
const DEFAULT_MARGIN_LEFT_IN: f32 = 0.25;
const DEFAULT_MARGIN_RIGHT_IN: f32 = 0.25;

const DEFAULT_CELL_WIDTH_IN: f32 = 3.5;
const DEFAULT_CELL_HEIGHT_IN: f32 = 2.5;

const DEFAULT_COLUMNS: usize = 2;
const DEFAULT_ROWS: usize = 4;

const DEFAULT_FONT_FAMILY: &str = "Calibri";
const DEFAULT_FONT_SIZE_PT: f32 = 12.0;
const DEFAULT_NAME_FONT_SIZE_PT: f32 = 18.0;

const DEFAULT_QR_SIZE_IN: f32 = 1.2;
const DEFAULT_QR_PIXELS: u32 = 360;
const DEFAULT_LOGO_HEIGHT_IN: f32 = 0.35;

const DEFAULT_FULL_LOGO: &str = "full_logo.png";
const DEFAULT_SMALL_LOGO: &str = "small_logo.png";
const DEFAULT_RIBBON: &str = "ribbon.png";

/// Smallest bitmap that still leaves a few pixels per module at version 1.
const MIN_QR_PIXELS: u32 = 64;

/// Largest QR bitmap edge.
const MAX_QR_PIXELS: u32 = 4096;

/// Tolerance when checking the grid against the content area, in points.
const FIT_TOLERANCE_PT: f32 = 0.05;

// ============================================================================
// Lengths
// ============================================================================

const POINTS_PER_INCH: f32 = 72.0;
const POINTS_PER_MM: f32 = 72.0 / 25.4;
const TWIPS_PER_POINT: f32 = 20.0;
const EMU_PER_POINT: f32 = 12_700.0;

/// A physical distance, stored in points.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Length(f32);

impl Length {
    pub fn points(value: f32) -> Self {
        Length(value)
    }

    pub fn inches(value: f32) -> Self {
        Length(value * POINTS_PER_INCH)
    }

    pub fn mm(value: f32) -> Self {
        Length(value * POINTS_PER_MM)
    }

    pub fn as_points(self) -> f32 {
        self.0
    }

    pub fn as_inches(self) -> f32 {
        self.0 / POINTS_PER_INCH
    }

    /// Twentieths of a point, the WordprocessingML geometry unit.
    pub fn twips(self) -> u32 {
        (self.0 * TWIPS_PER_POINT).round().max(0.0) as u32
    }

    /// English Metric Units, the DrawingML unit.
    pub fn emu(self) -> u64 {
        (self.0 * EMU_PER_POINT).round().max(0.0) as u64
    }

    /// Half points, the unit of `w:sz`.
    pub fn half_points(self) -> u32 {
        (self.0 * 2.0).round().max(0.0) as u32
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}in", self.as_inches())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Inch,
    Point,
    Millimetre,
    Centimetre,
}

impl Unit {
    fn from_suffix(suffix: &str) -> Option<Unit> {
        match suffix {
            "in" | "inch" | "inches" | "\"" => Some(Unit::Inch),
            "pt" => Some(Unit::Point),
            "mm" => Some(Unit::Millimetre),
            "cm" => Some(Unit::Centimetre),
            _ => None,
        }
    }

    fn apply(self, value: f32) -> Length {
        match self {
            Unit::Inch => Length::inches(value),
            Unit::Point => Length::points(value),
            Unit::Millimetre => Length::mm(value),
            Unit::Centimetre => Length::mm(value * 10.0),
        }
    }
}

/// Parse a length such as `0.5`, `"0.5in"`, `"14pt"` or `"12.7 mm"`.
/// A bare number is read in `default_unit`.
pub fn parse_length(text: &str, default_unit: Unit) -> std::result::Result<Length, String> {
    let text = text.trim();
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(text.len());
    let (number, suffix) = text.split_at(split);
    let value: f32 = number
        .parse()
        .map_err(|_| format!("invalid length '{}'", text))?;
    if !value.is_finite() {
        return Err(format!("invalid length '{}'", text));
    }
    let suffix = suffix.trim().to_ascii_lowercase();
    let unit = if suffix.is_empty() {
        default_unit
    } else {
        Unit::from_suffix(&suffix).ok_or_else(|| format!("unknown unit '{}' in '{}'", suffix, text))?
    };
    Ok(unit.apply(value))
}

/// A length as written in a config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LengthValue {
    Number(f32),
    Text(String),
}

impl LengthValue {
    fn resolve(&self, key: &str, default_unit: Unit) -> Result<Length> {
        match self {
            LengthValue::Number(v) if v.is_finite() => Ok(default_unit.apply(*v)),
            LengthValue::Number(v) => Err(BadgeError::config(format!(
                "{}: length must be a finite number, got {}",
                key, v
            ))),
            LengthValue::Text(s) => parse_length(s, default_unit)
                .map_err(|e| BadgeError::config(format!("{}: {}", key, e))),
        }
    }
}

// ============================================================================
// Resolved configuration
// ============================================================================

/// Where a logo image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoPath {
    /// Built-in default, relative to the asset directory. Skipped if absent.
    Asset(PathBuf),
    /// Set by a config file. Must exist.
    File(PathBuf),
    /// Set by a config file as an `http://` or `https://` address.
    Url(String),
}

impl LogoPath {
    fn from_config(value: String, base_dir: &Path) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            LogoPath::Url(value)
        } else {
            LogoPath::File(base_dir.join(value))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoPaths {
    pub full: LogoPath,
    pub small: LogoPath,
    pub ribbon: LogoPath,
}

/// Page, cell and typography parameters for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub page_width: Length,
    pub page_height: Length,
    pub landscape: bool,

    pub page_margin_top: Length,
    pub page_margin_bottom: Length,
    pub page_margin_left: Length,
    pub page_margin_right: Length,

    pub cell_width: Length,
    pub cell_height: Length,
    pub columns_per_page: usize,
    pub rows_per_page: usize,

    pub font_family: String,
    /// Last name and other secondary text
    pub font_size: Length,
    /// Preferred name
    pub name_font_size: Length,

    pub qr_size: Length,
    pub qr_pixels: u32,
    pub logo_height: Length,
    pub logo_paths: LogoPaths,

    /// 1-based page whose badges carry the full logo instead of the small one
    pub full_logo_page: Option<usize>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            page_width: Length::inches(DEFAULT_PAGE_WIDTH_IN),
            page_height: Length::inches(DEFAULT_PAGE_HEIGHT_IN),
            landscape: false,
            page_margin_top: Length::inches(DEFAULT_MARGIN_TOP_IN),
            page_margin_bottom: Length::inches(DEFAULT_MARGIN_BOTTOM_IN),
            page_margin_left: Length::inches(DEFAULT_MARGIN_LEFT_IN),
            page_margin_right: Length::inches(DEFAULT_MARGIN_RIGHT_IN),
            cell_width: Length::inches(DEFAULT_CELL_WIDTH_IN),
            cell_height: Length::inches(DEFAULT_CELL_HEIGHT_IN),
            columns_per_page: DEFAULT_COLUMNS,
            rows_per_page: DEFAULT_ROWS,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: Length::points(DEFAULT_FONT_SIZE_PT),
            name_font_size: Length::points(DEFAULT_NAME_FONT_SIZE_PT),
            qr_size: Length::inches(DEFAULT_QR_SIZE_IN),
            qr_pixels: DEFAULT_QR_PIXELS,
            logo_height: Length::inches(DEFAULT_LOGO_HEIGHT_IN),
            logo_paths: LogoPaths {
                full: LogoPath::Asset(PathBuf::from(DEFAULT_FULL_LOGO)),
                small: LogoPath::Asset(PathBuf::from(DEFAULT_SMALL_LOGO)),
                ribbon: LogoPath::Asset(PathBuf::from(DEFAULT_RIBBON)),
            },
            full_logo_page: None,
        }
    }
}

impl LayoutConfig {
    /// Defaults, overlaid by the file at `path` when one is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            log::debug!("No config file given, using built-in defaults");
            return Ok(Self::default());
        };

        let content =
            std::fs::read_to_string(path).map_err(|e| BadgeError::io(path, e))?;
        let format = ConfigFormat::detect(path, &content);
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        log::info!("Loading {} config from {}", format, path.display());

        Self::parse(&content, format, base_dir)
    }

    /// Overlay `content` on the defaults. Relative logo paths resolve
    /// against `base_dir`.
    pub fn parse(content: &str, format: ConfigFormat, base_dir: &Path) -> Result<Self> {
        let overrides: ConfigFile = if content.trim().is_empty() {
            ConfigFile::default()
        } else {
            match format {
                ConfigFormat::Json => serde_json::from_str(content)
                    .map_err(|e| BadgeError::config(format!("Invalid JSON config: {}", e)))?,
                ConfigFormat::Yaml => serde_yaml::from_str(content)
                    .map_err(|e| BadgeError::config(format!("Invalid YAML config: {}", e)))?,
            }
        };

        let config = Self::default().overlay(overrides, base_dir)?;
        config.validate()?;
        Ok(config)
    }

    /// Switch to landscape and re-check that the grid still fits.
    pub fn into_landscape(mut self) -> Result<Self> {
        self.landscape = true;
        self.validate()?;
        Ok(self)
    }

    pub fn cells_per_page(&self) -> usize {
        self.columns_per_page * self.rows_per_page
    }

    /// Page (width, height) after applying the orientation.
    pub fn page_size(&self) -> (Length, Length) {
        let (w, h) = (self.page_width, self.page_height);
        let (short, long) = if w <= h { (w, h) } else { (h, w) };
        if self.landscape {
            (long, short)
        } else {
            (short, long)
        }
    }

    /// Width and height available inside the margins.
    pub fn content_size(&self) -> (Length, Length) {
        let (w, h) = self.page_size();
        (
            Length::points(
                w.as_points() - self.page_margin_left.as_points() - self.page_margin_right.as_points(),
            ),
            Length::points(
                h.as_points() - self.page_margin_top.as_points() - self.page_margin_bottom.as_points(),
            ),
        )
    }

    fn overlay(mut self, file: ConfigFile, base_dir: &Path) -> Result<Self> {
        fn set(slot: &mut Length, value: Option<LengthValue>, key: &str, unit: Unit) -> Result<()> {
            if let Some(v) = value {
                *slot = v.resolve(key, unit)?;
            }
            Ok(())
        }

        set(&mut self.page_width, file.page_width, "page_width", Unit::Inch)?;
        set(&mut self.page_height, file.page_height, "page_height", Unit::Inch)?;
        set(&mut self.page_margin_top, file.page_margin_top, "page_margin_top", Unit::Inch)?;
        set(&mut self.page_margin_bottom, file.page_margin_bottom, "page_margin_bottom", Unit::Inch)?;
        set(&mut self.page_margin_left, file.page_margin_left, "page_margin_left", Unit::Inch)?;
        set(&mut self.page_margin_right, file.page_margin_right, "page_margin_right", Unit::Inch)?;
        set(&mut self.cell_width, file.cell_width, "cell_width", Unit::Inch)?;
        set(&mut self.cell_height, file.cell_height, "cell_height", Unit::Inch)?;
        set(&mut self.font_size, file.font_size, "font_size", Unit::Point)?;
        set(&mut self.name_font_size, file.name_font_size, "name_font_size", Unit::Point)?;
        set(&mut self.qr_size, file.qr_size, "qr_size", Unit::Inch)?;
        set(&mut self.logo_height, file.logo_height, "logo_height", Unit::Inch)?;

        if let Some(landscape) = file.landscape {
            self.landscape = landscape;
        }
        if let Some(columns) = file.columns_per_page {
            self.columns_per_page = columns;
        }
        if let Some(rows) = file.rows_per_page {
            self.rows_per_page = rows;
        }
        if let Some(family) = file.font_family {
            self.font_family = family;
        }
        if let Some(pixels) = file.qr_pixels {
            self.qr_pixels = pixels;
        }
        if let Some(page) = file.full_logo_page {
            self.full_logo_page = Some(page);
        }

        if let Some(logos) = file.logo_paths {
            let resolve = |p: String| LogoPath::from_config(p, base_dir);
            if let Some(p) = logos.full {
                self.logo_paths.full = resolve(p);
            }
            if let Some(p) = logos.small {
                self.logo_paths.small = resolve(p);
            }
            if let Some(p) = logos.ribbon {
                self.logo_paths.ribbon = resolve(p);
            }
        }

        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.columns_per_page == 0 || self.rows_per_page == 0 {
            return Err(BadgeError::config(
                "columns_per_page and rows_per_page must be at least 1",
            ));
        }

        let positive = [
            ("page_width", self.page_width),
            ("page_height", self.page_height),
            ("cell_width", self.cell_width),
            ("cell_height", self.cell_height),
            ("font_size", self.font_size),
            ("name_font_size", self.name_font_size),
            ("qr_size", self.qr_size),
            ("logo_height", self.logo_height),
        ];
        for (key, length) in positive {
            if !length.as_points().is_finite() || length.as_points() <= 0.0 {
                return Err(BadgeError::config(format!("{} must be greater than zero", key)));
            }
        }

        let margins = [
            ("page_margin_top", self.page_margin_top),
            ("page_margin_bottom", self.page_margin_bottom),
            ("page_margin_left", self.page_margin_left),
            ("page_margin_right", self.page_margin_right),
        ];
        for (key, length) in margins {
            if !length.as_points().is_finite() || length.as_points() < 0.0 {
                return Err(BadgeError::config(format!("{} must not be negative", key)));
            }
        }

        if self.font_family.trim().is_empty() {
            return Err(BadgeError::config("font_family must not be empty"));
        }
        if !(MIN_QR_PIXELS..=MAX_QR_PIXELS).contains(&self.qr_pixels) {
            return Err(BadgeError::config(format!(
                "qr_pixels must be between {} and {}",
                MIN_QR_PIXELS, MAX_QR_PIXELS
            )));
        }
        if self.full_logo_page == Some(0) {
            return Err(BadgeError::config("full_logo_page is 1-based"));
        }
        if self.qr_size > self.cell_width || self.qr_size > self.cell_height {
            return Err(BadgeError::config(format!(
                "qr_size {} does not fit in a {} x {} cell",
                self.qr_size, self.cell_width, self.cell_height
            )));
        }

        let (content_w, content_h) = self.content_size();
        let grid_w = self.cell_width.as_points() * self.columns_per_page as f32;
        let grid_h = self.cell_height.as_points() * self.rows_per_page as f32;
        if grid_w > content_w.as_points() + FIT_TOLERANCE_PT {
            return Err(BadgeError::config(format!(
                "{} columns of {} exceed the {} content width",
                self.columns_per_page, self.cell_width, content_w
            )));
        }
        if grid_h > content_h.as_points() + FIT_TOLERANCE_PT {
            return Err(BadgeError::config(format!(
                "{} rows of {} exceed the {} content height",
                self.rows_per_page, self.cell_height, content_h
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Config file format
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Pick the format from the file extension, falling back to the content.
    pub fn detect(path: &Path, content: &str) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("json") => ConfigFormat::Json,
            Some("yml") | Some("yaml") => ConfigFormat::Yaml,
            _ if content.trim_start().starts_with('{') => ConfigFormat::Json,
            _ => ConfigFormat::Yaml,
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFormat::Json => f.write_str("JSON"),
            ConfigFormat::Yaml => f.write_str("YAML"),
        }
    }
}

/// Fields a user may override. Absent fields keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(alias = "pageWidth")]
    page_width: Option<LengthValue>,
    #[serde(alias = "pageHeight")]
    page_height: Option<LengthValue>,
    landscape: Option<bool>,

    #[serde(alias = "pageMarginTop")]
    page_margin_top: Option<LengthValue>,
    #[serde(alias = "pageMarginBottom")]
    page_margin_bottom: Option<LengthValue>,
    #[serde(alias = "pageMarginLeft")]
    page_margin_left: Option<LengthValue>,
    #[serde(alias = "pageMarginRight")]
    page_margin_right: Option<LengthValue>,

    #[serde(alias = "cellWidth")]
    cell_width: Option<LengthValue>,
    #[serde(alias = "cellHeight")]
    cell_height: Option<LengthValue>,
    #[serde(alias = "columnsPerPage")]
    columns_per_page: Option<usize>,
    #[serde(alias = "rowsPerPage")]
    rows_per_page: Option<usize>,

    #[serde(alias = "fontFamily")]
    font_family: Option<String>,
    #[serde(alias = "fontSize")]
    font_size: Option<LengthValue>,
    #[serde(alias = "nameFontSize")]
    name_font_size: Option<LengthValue>,

    #[serde(alias = "qrSize")]
    qr_size: Option<LengthValue>,
    #[serde(alias = "qrPixels")]
    qr_pixels: Option<u32>,
    #[serde(alias = "logoHeight")]
    logo_height: Option<LengthValue>,
    #[serde(alias = "logoPaths")]
    logo_paths: Option<LogoPathsFile>,
    #[serde(alias = "fullLogoPage")]
    full_logo_page: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LogoPathsFile {
    full: Option<String>,
    small: Option<String>,
    ribbon: Option<String>,
}
