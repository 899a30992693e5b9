//! Logo images, loaded once per run and shared by every badge.

use ::image::{DynamicImage, ImageFormat};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{Length, LogoPath, LogoPaths};
use crate::error::{BadgeError, Result};

/// Directory searched for the built-in logo file names.
pub const ASSET_DIR_NAME: &str = "assets";

/// Limit for downloading a logo given as a URL.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogoKind {
    Full,
    Small,
    Ribbon,
}

impl LogoKind {
    pub const ALL: [LogoKind; 3] = [LogoKind::Full, LogoKind::Small, LogoKind::Ribbon];

    pub fn name(self) -> &'static str {
        match self {
            LogoKind::Full => "full",
            LogoKind::Small => "small",
            LogoKind::Ribbon => "ribbon",
        }
    }
}

/// A decoded image, re-encoded as PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logo {
    pub png: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl Logo {
    pub fn from_image(image: &DynamicImage) -> std::result::Result<Self, ::image::ImageError> {
        let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
        let mut png = Vec::new();
        rgba.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(Logo {
            png,
            width_px: image.width(),
            height_px: image.height(),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, ::image::ImageError> {
        let image = ::image::load_from_memory(bytes)?;
        Self::from_image(&image)
    }

    /// Largest size with the image's aspect ratio inside `max_width` x `max_height`.
    pub fn fit(&self, max_width: Length, max_height: Length) -> (Length, Length) {
        let aspect_ratio = self.width_px as f32 / self.height_px.max(1) as f32;
        let (max_w, max_h) = (max_width.as_points(), max_height.as_points());
        if max_w / max_h > aspect_ratio {
            // Height-constrained
            (Length::points(max_h * aspect_ratio), max_height)
        } else {
            // Width-constrained
            (max_width, Length::points(max_w / aspect_ratio))
        }
    }

    /// Size when scaled to exactly `width`.
    pub fn at_width(&self, width: Length) -> (Length, Length) {
        let aspect_ratio = self.width_px as f32 / self.height_px.max(1) as f32;
        (width, Length::points(width.as_points() / aspect_ratio))
    }
}

/// The three logo images. A missing built-in asset is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assets {
    pub full: Option<Logo>,
    pub small: Option<Logo>,
    pub ribbon: Option<Logo>,
}

impl Assets {
    /// No images at all; badges carry only text and the QR code.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn load(paths: &LogoPaths, asset_dir: &Path) -> Result<Self> {
        let mut assets = Self::none();
        for kind in LogoKind::ALL {
            let path = match kind {
                LogoKind::Full => &paths.full,
                LogoKind::Small => &paths.small,
                LogoKind::Ribbon => &paths.ribbon,
            };
            let logo = load_logo(path, asset_dir, kind)?;
            match kind {
                LogoKind::Full => assets.full = logo,
                LogoKind::Small => assets.small = logo,
                LogoKind::Ribbon => assets.ribbon = logo,
            }
        }
        Ok(assets)
    }

    pub fn get(&self, kind: LogoKind) -> Option<&Logo> {
        match kind {
            LogoKind::Full => self.full.as_ref(),
            LogoKind::Small => self.small.as_ref(),
            LogoKind::Ribbon => self.ribbon.as_ref(),
        }
    }
}

/// `assets/` beside the running executable, or in the working directory
/// when the executable path is unknown.
pub fn default_asset_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(ASSET_DIR_NAME)))
        .unwrap_or_else(|| PathBuf::from(ASSET_DIR_NAME))
}

fn load_logo(path: &LogoPath, asset_dir: &Path, kind: LogoKind) -> Result<Option<Logo>> {
    let (source, bytes) = match path {
        LogoPath::Asset(name) => {
            let file = asset_dir.join(name);
            if !file.is_file() {
                log::warn!(
                    "No {} logo at {}, badges will be rendered without it",
                    kind.name(),
                    file.display()
                );
                return Ok(None);
            }
            let bytes = std::fs::read(&file).map_err(|e| BadgeError::io(&file, e))?;
            (file.display().to_string(), bytes)
        }
        LogoPath::File(file) => {
            let bytes = std::fs::read(file).map_err(|e| BadgeError::io(file, e))?;
            (file.display().to_string(), bytes)
        }
        LogoPath::Url(url) => (url.clone(), fetch_url(url, FETCH_TIMEOUT)?),
    };

    let logo = Logo::from_bytes(&bytes).map_err(|e| {
        BadgeError::config(format!(
            "Failed to decode {} logo {}: {}",
            kind.name(),
            source,
            e
        ))
    })?;
    log::debug!(
        "Loaded {} logo from {} ({}x{} px)",
        kind.name(),
        source,
        logo.width_px,
        logo.height_px
    );
    Ok(Some(logo))
}

fn fetch_url(url: &str, timeout: Duration) -> Result<Vec<u8>> {
    let to_io = |message: String| BadgeError::io(url, std::io::Error::other(message));

    let agent = ureq::AgentBuilder::new().timeout(timeout).build();
    let response = agent
        .get(url)
        .call()
        .map_err(|e| to_io(format!("Failed to fetch URL: {}", e)))?;

    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| to_io(format!("Failed to read response: {}", e)))?;
    Ok(bytes)
}
