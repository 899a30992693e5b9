//! QR code rendering.
//!
//! Error correction is fixed at level M. Version and mask selection is
//! left to the `qrcode` crate, which picks the same ones for the same
//! input, so a payload renders to byte-identical PNG data on every run.

use ::image::{DynamicImage, ImageFormat, Luma};
use qrcode::types::QrError;
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;
use thiserror::Error;

use crate::error::{BadgeError, Result};
use crate::roster::BadgeRecord;

pub const ERROR_CORRECTION: EcLevel = EcLevel::M;

/// An encoded QR code as PNG bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrBitmap {
    pub png: Vec<u8>,
    /// Edge length in pixels (the bitmap is square)
    pub pixels: u32,
    /// Modules per side, excluding the quiet zone
    pub modules: usize,
}

#[derive(Error, Debug)]
pub enum QrRenderError {
    #[error("{0}")]
    Encode(#[from] QrError),
    #[error("PNG encoding failed: {0}")]
    Png(#[from] ::image::ImageError),
}

/// Encode `payload` into a square bitmap at least `min_pixels` wide.
pub fn render_qr(payload: &str, min_pixels: u32) -> std::result::Result<QrBitmap, QrRenderError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), ERROR_CORRECTION)?;
    let modules = code.width();

    let image = code
        .render::<Luma<u8>>()
        .quiet_zone(true)
        .min_dimensions(min_pixels, min_pixels)
        .build();
    let pixels = image.width();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(image)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    Ok(QrBitmap {
        png,
        pixels,
        modules,
    })
}

/// Render the QR code for one roster record.
pub fn render_record(record: &BadgeRecord, min_pixels: u32) -> Result<QrBitmap> {
    render_qr(&record.code, min_pixels).map_err(|e| {
        let message = match e {
            QrRenderError::Encode(QrError::DataTooLong) => format!(
                "`Code` is too long for a QR code ({} bytes)",
                record.code.len()
            ),
            other => format!("Failed to generate QR code: {}", other),
        };
        BadgeError::data(
            record.row,
            message,
            format!("{},{}", record.preferred_name, record.last_name),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn record(code: &str) -> BadgeRecord {
        BadgeRecord {
            row: 7,
            preferred_name: "Ada".into(),
            last_name: "Lovelace".into(),
            code: code.into(),
        }
    }

    #[test]
    fn same_payload_gives_identical_bytes() {
        let a = render_qr("https://example.com/checkin/1234", 360).unwrap();
        let b = render_qr("https://example.com/checkin/1234", 360).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_payloads_differ() {
        let a = render_qr("https://example.com/checkin/1", 360).unwrap();
        let b = render_qr("https://example.com/checkin/2", 360).unwrap();
        assert_ne!(a.png, b.png);
    }

    #[test]
    fn bitmap_is_png_and_at_least_requested_size() {
        let qr = render_qr("https://example.com", 200).unwrap();
        assert!(qr.pixels >= 200);
        assert_eq!(&qr.png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = ::image::load_from_memory(&qr.png).unwrap();
        assert_eq!(decoded.width(), qr.pixels);
        assert_eq!(decoded.height(), qr.pixels);
    }

    #[test]
    fn modules_follow_the_version() {
        // Version 1 is 21 modules wide; a short URL at level M fits in version 2 or below.
        let qr = render_qr("https://x.io", 64).unwrap();
        assert!(qr.modules == 21 || qr.modules == 25, "{}", qr.modules);
    }

    #[test]
    fn oversized_payload_is_a_data_error() {
        let huge = "x".repeat(5000);
        let err = render_record(&record(&huge), 360).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
        match err {
            BadgeError::Data { row, message, .. } => {
                assert_eq!(row, 7);
                assert!(message.contains("too long"));
            }
            _ => unreachable!(),
        }
    }
}
