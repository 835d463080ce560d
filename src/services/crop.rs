//! Interactive crop sessions.
//!
//! A session is the bounded period between selecting a source image and
//! confirming or cancelling its crop. The region is adjusted in percent of
//! the displayed frame and rasterized against the source's natural pixel
//! dimensions on confirm.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView};
use thiserror::Error;

pub const MIN_SCALE: f32 = 0.5;
pub const MAX_SCALE: f32 = 3.0;

#[derive(Debug, Error)]
pub enum CropError {
    #[error("Not a readable image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("No file selected")]
    NoSelection,

    #[error("Crop rendering failed: {0}")]
    Render(String),
}

/// Crop rectangle in percent of the displayed image, plus zoom and
/// quarter-turn rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub scale: f32,
    pub rotation_degrees: i32,
}

impl Default for CropRegion {
    /// Centered default covering 90% of the frame.
    fn default() -> Self {
        Self {
            x: 5.0,
            y: 5.0,
            width: 90.0,
            height: 90.0,
            scale: 1.0,
            rotation_degrees: 0,
        }
    }
}

impl CropRegion {
    /// Clamp zoom into [0.5, 3.0] and snap rotation to a multiple of 90
    /// wrapped into [0, 360). The rectangle itself is not validated here;
    /// rasterization clamps it into the image bounds.
    pub fn normalized(mut self) -> Self {
        self.scale = self.scale.clamp(MIN_SCALE, MAX_SCALE);
        let quarter_turns = (self.rotation_degrees as f32 / 90.0).round() as i32;
        self.rotation_degrees = quarter_turns.rem_euclid(4) * 90;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropStage {
    Idle,
    FileSelected,
    Cropping,
}

/// Rasterized crop output, re-encoded as JPEG and named after the
/// original file.
#[derive(Debug, Clone)]
pub struct CroppedImage {
    pub data: Bytes,
    pub file_name: String,
    pub content_type: String,
    pub width: u32,
    pub height: u32,
}

pub struct CropSession {
    stage: CropStage,
    selected: Option<Selected>,
    region: CropRegion,
    jpeg_quality: u8,
}

struct Selected {
    file_name: String,
    decoded: DynamicImage,
}

impl Default for CropSession {
    fn default() -> Self {
        Self::new(95)
    }
}

impl CropSession {
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            stage: CropStage::Idle,
            selected: None,
            region: CropRegion::default(),
            jpeg_quality,
        }
    }

    pub fn stage(&self) -> CropStage {
        self.stage
    }

    pub fn region(&self) -> CropRegion {
        self.region
    }

    /// Open a crop session on a user-selected file. The file must decode
    /// as an image; the region resets to the centered default.
    pub fn select_file(&mut self, data: &[u8], file_name: &str) -> Result<(), CropError> {
        let decoded = image::load_from_memory(data)?;
        self.selected = Some(Selected {
            file_name: file_name.to_string(),
            decoded,
        });
        self.region = CropRegion::default();
        self.stage = CropStage::FileSelected;
        Ok(())
    }

    /// Update the crop region. Re-entrant: the region can be adjusted any
    /// number of times before confirm or cancel.
    pub fn adjust_region(&mut self, region: CropRegion) -> Result<(), CropError> {
        if self.selected.is_none() {
            return Err(CropError::NoSelection);
        }
        self.region = region.normalized();
        self.stage = CropStage::Cropping;
        Ok(())
    }

    /// Rasterize the current region and close the session. On failure the
    /// selection and region are kept so the user can retry.
    pub fn confirm(&mut self) -> Result<CroppedImage, CropError> {
        let selected = self.selected.as_ref().ok_or(CropError::NoSelection)?;

        let (data, width, height) =
            rasterize(&selected.decoded, &self.region, self.jpeg_quality)?;

        let cropped = CroppedImage {
            data: Bytes::from(data),
            file_name: selected.file_name.clone(),
            content_type: mime::IMAGE_JPEG.to_string(),
            width,
            height,
        };

        self.reset();
        Ok(cropped)
    }

    /// Discard the selection and region with no side effects.
    pub fn cancel(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.selected = None;
        self.region = CropRegion::default();
        self.stage = CropStage::Idle;
    }
}

/// Apply a crop region to a decoded image and re-encode as JPEG.
///
/// Rotation is applied as quarter-turns first; the region percentages then
/// map onto the rotated image's natural pixel dimensions. `scale` zooms
/// the sampled window around the region center, and the result is resized
/// back to the region's pixel size, so the output dimensions depend only
/// on the rectangle.
pub fn rasterize(
    img: &DynamicImage,
    region: &CropRegion,
    jpeg_quality: u8,
) -> Result<(Vec<u8>, u32, u32), CropError> {
    let region = region.normalized();

    let rotated = match region.rotation_degrees {
        90 => img.rotate90(),
        180 => img.rotate180(),
        270 => img.rotate270(),
        _ => img.clone(),
    };

    let (nat_w, nat_h) = rotated.dimensions();
    let (crop_x, crop_y, crop_w, crop_h) = region_to_pixels(&region, nat_w, nat_h);

    // Zoom shrinks the sampled source window around the region center
    let window_w = ((crop_w as f32 / region.scale).round() as u32).clamp(1, nat_w);
    let window_h = ((crop_h as f32 / region.scale).round() as u32).clamp(1, nat_h);
    let center_x = crop_x + crop_w / 2;
    let center_y = crop_y + crop_h / 2;
    let window_x = center_x
        .saturating_sub(window_w / 2)
        .min(nat_w - window_w);
    let window_y = center_y
        .saturating_sub(window_h / 2)
        .min(nat_h - window_h);

    let mut cropped = rotated.crop_imm(window_x, window_y, window_w, window_h);
    if (window_w, window_h) != (crop_w, crop_h) {
        cropped = cropped.resize_exact(crop_w, crop_h, image::imageops::FilterType::Lanczos3);
    }

    // JPEG has no alpha channel
    let rgb = cropped.to_rgb8();
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, jpeg_quality);
    encoder
        .encode_image(&rgb)
        .map_err(|e| CropError::Render(e.to_string()))?;

    if out.is_empty() {
        return Err(CropError::Render("encoder produced no data".to_string()));
    }

    Ok((out, crop_w, crop_h))
}

fn region_to_pixels(region: &CropRegion, nat_w: u32, nat_h: u32) -> (u32, u32, u32, u32) {
    let x_pct = region.x.clamp(0.0, 100.0);
    let y_pct = region.y.clamp(0.0, 100.0);
    let w_pct = region.width.clamp(0.0, 100.0 - x_pct);
    let h_pct = region.height.clamp(0.0, 100.0 - y_pct);

    let crop_x = (nat_w as f32 * x_pct / 100.0).round() as u32;
    let crop_y = (nat_h as f32 * y_pct / 100.0).round() as u32;
    let crop_w = ((nat_w as f32 * w_pct / 100.0).round() as u32).max(1);
    let crop_h = ((nat_h as f32 * h_pct / 100.0).round() as u32).max(1);

    (
        crop_x.min(nat_w - 1),
        crop_y.min(nat_h - 1),
        crop_w.min(nat_w - crop_x.min(nat_w - 1)),
        crop_h.min(nat_h - crop_y.min(nat_h - 1)),
    )
}
