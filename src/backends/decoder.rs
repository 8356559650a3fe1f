// SPDX-License-Identifier: MPL-2.0

//! Barcode decoding
//!
//! [`QrDecoder`] turns an encoded still into decoded QR payloads using rqrr.
//! The image is converted to grayscale and downscaled before detection.

use crate::backends::camera::CapturedImage;
use crate::errors::ScanError;
use async_trait::async_trait;
use image::GrayImage;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Barcode family of a decoded value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbology {
    Qr,
}

/// One decoded barcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Barcode {
    pub text: String,
    pub symbology: Symbology,
}

/// Recognizes barcodes in a still image
#[async_trait]
pub trait BarcodeDecoder: Send + Sync {
    /// Every barcode found, in detection order. Empty when none is visible.
    async fn decode(&self, image: &CapturedImage) -> Result<Vec<Barcode>, ScanError>;
}

/// QR code decoder
pub struct QrDecoder {
    /// Images are downscaled so neither side exceeds this
    max_dimension: u32,
}

impl Default for QrDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDecoder {
    pub fn new() -> Self {
        Self {
            max_dimension: 1280,
        }
    }

    /// Decode an encoded image (JPEG, PNG, ...)
    pub async fn decode_bytes(&self, data: Arc<[u8]>) -> Result<Vec<Barcode>, ScanError> {
        let max_dimension = self.max_dimension;
        tokio::task::spawn_blocking(move || decode_sync(&data, max_dimension))
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "QR decode task panicked");
                Err(ScanError::DecodeFailed(e.to_string()))
            })
    }
}

#[async_trait]
impl BarcodeDecoder for QrDecoder {
    async fn decode(&self, image: &CapturedImage) -> Result<Vec<Barcode>, ScanError> {
        self.decode_bytes(Arc::clone(&image.data)).await
    }
}

fn decode_sync(data: &[u8], max_dimension: u32) -> Result<Vec<Barcode>, ScanError> {
    let start = std::time::Instant::now();

    let luma = image::load_from_memory(data)
        .map_err(|e| ScanError::DecodeFailed(e.to_string()))?
        .to_luma8();
    let luma = downscale(luma, max_dimension);

    let (width, height) = luma.dimensions();
    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
            luma.get_pixel(x as u32, y as u32).0[0]
        });

    let grids = prepared.detect_grids();
    trace!(
        grids = grids.len(),
        width,
        height,
        elapsed_ms = start.elapsed().as_millis(),
        "QR grids detected"
    );

    let barcodes: Vec<Barcode> = grids
        .iter()
        .filter_map(|grid| match grid.decode() {
            Ok((_meta, text)) => Some(Barcode {
                text,
                symbology: Symbology::Qr,
            }),
            Err(e) => {
                debug!(error = ?e, "QR grid could not be decoded");
                None
            }
        })
        .collect();

    debug!(count = barcodes.len(), "QR decode complete");
    Ok(barcodes)
}

fn downscale(image: GrayImage, max_dimension: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width <= max_dimension && height <= max_dimension {
        return image;
    }

    let scale = (width as f32 / max_dimension as f32).max(height as f32 / max_dimension as f32);
    let new_width = ((width as f32 / scale) as u32).max(1);
    let new_height = ((height as f32 / scale) as u32).max(1);
    image::imageops::resize(
        &image,
        new_width,
        new_height,
        image::imageops::FilterType::Triangle,
    )
}
