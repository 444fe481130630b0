//! # Question Images
//!
//! Loads the figures attached to answer-writing questions and prepares them
//! for PDF embedding. JPEG files pass through without re-encoding (PDF reads
//! them with DCTDecode). PNG files are decoded to RGB pixels with a separate
//! alpha channel for SMask transparency.
//!
//! Image paths in a question bank are relative to the `questions_data`
//! directory under the project root, and may or may not spell that prefix.

use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Directory that question-bank image paths are relative to.
pub const IMAGE_DIR: &str = "questions_data";

/// A loaded image ready for PDF embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
}

impl LoadedImage {
    /// Height over width.
    pub fn aspect(&self) -> f64 {
        if self.width_px == 0 {
            return 0.0;
        }
        self.height_px as f64 / self.width_px as f64
    }
}

/// The pixel data in a format the PDF serializer can consume directly.
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePixelData {
    /// Raw JPEG bytes, embedded as they are.
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    Decoded {
        /// width * height * 3 bytes (RGB)
        rgb: Vec<u8>,
        /// width * height bytes of alpha. None if fully opaque.
        alpha: Option<Vec<u8>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
}

/// Where a bank's image reference lives on disk, given the project root.
pub fn resolve_image_path(root: &Path, src: &str) -> PathBuf {
    let prefix = format!("{}/", IMAGE_DIR);
    if src.starts_with(&prefix) {
        root.join(src)
    } else {
        root.join(IMAGE_DIR).join(src)
    }
}

/// Read and decode the image file at `path`.
pub fn load_image(path: &Path) -> Result<LoadedImage, String> {
    let data = std::fs::read(path)
        .map_err(|e| format!("Failed to read image file '{}': {}", path.display(), e))?;
    decode_image_bytes(&data)
}

/// Detect image format from magic bytes and decode accordingly.
fn decode_image_bytes(data: &[u8]) -> Result<LoadedImage, String> {
    if data.len() < 4 {
        return Err("Image data too short".to_string());
    }

    if is_jpeg(data) {
        decode_jpeg(data)
    } else if is_png(data) {
        decode_png(data)
    } else {
        Err("Unsupported image format (expected JPEG or PNG)".to_string())
    }
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == [0x89, 0x50, 0x4E, 0x47]
}

/// JPEG: read dimensions and color space without decoding pixels.
fn decode_jpeg(data: &[u8]) -> Result<LoadedImage, String> {
    let reader = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("JPEG format detection error: {}", e))?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| format!("Failed to read JPEG dimensions: {}", e))?;

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Jpeg {
            data: data.to_vec(),
            color_space: detect_jpeg_color_space(data),
        },
        width_px: width,
        height_px: height,
    })
}

/// Component count from the first SOF segment. RGB when none is found.
fn detect_jpeg_color_space(data: &[u8]) -> JpegColorSpace {
    let mut i = 2; // after SOI
    while i + 3 < data.len() && data[i] == 0xFF {
        let marker = data[i + 1];
        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof && i + 9 < data.len() {
            return if data[i + 9] == 1 {
                JpegColorSpace::DeviceGray
            } else {
                JpegColorSpace::DeviceRGB
            };
        }
        let segment_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        i += 2 + segment_len;
    }
    JpegColorSpace::DeviceRGB
}

/// PNG: decode to RGBA, split into RGB + alpha.
fn decode_png(data: &[u8]) -> Result<LoadedImage, String> {
    let img = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("PNG format detection error: {}", e))?
        .decode()
        .map_err(|e| format!("Failed to decode PNG: {}", e))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let pixel_count = (width * height) as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel[3]);
    }
    let opaque = alpha.iter().all(|&a| a == 255);

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Decoded {
            rgb,
            alpha: (!opaque).then_some(alpha),
        },
        width_px: width,
        height_px: height,
    })
}
