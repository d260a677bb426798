//! Poster image re-encoding.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::error::TransformError;

/// Pure bytes → compressed-bytes transform at a given JPEG quality.
pub trait ImageTransform: Send + Sync {
    fn compress(&self, raw: &[u8], quality: u8) -> Result<Vec<u8>, TransformError>;
}

/// Re-encodes any decodable image to JPEG, flattening alpha.
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegTransform;

impl ImageTransform for JpegTransform {
    fn compress(&self, raw: &[u8], quality: u8) -> Result<Vec<u8>, TransformError> {
        let decoded =
            image::load_from_memory(raw).map_err(|e| TransformError(e.to_string()))?;
        let rgb = decoded.into_rgb8();

        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality)
            .encode(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| TransformError(e.to_string()))?;

        tracing::debug!(
            raw_bytes = raw.len(),
            jpeg_bytes = out.len(),
            quality,
            "Poster re-encoded"
        );
        Ok(out)
    }
}
