//! Raster surfaces the grid is sampled from.
//!
//! A [`Surface`] is the decoded map as laid out for sampling (stretched onto the
//! canvas, or at native size for uploads) together with the tile pitch derived
//! for that layout.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Per-pixel RGB reads at arbitrary coordinates. Reads outside the surface yield `None`.
pub trait Raster {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn rgb(&self, x: i64, y: i64) -> Option<[u8; 3]>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Stretch the image onto a fixed canvas; pitch scales with the fit.
    Canvas { width: u32, height: u32 },
    /// Keep the image's own pixel dimensions; pitch is the base pitch.
    #[default]
    Native,
}

/// `floor(min(canvas_w / image_w, canvas_h / image_h) * base)`, never below 1.
pub fn tile_pitch(canvas: (u32, u32), image: (u32, u32), base: u32) -> Result<u32> {
    if image.0 == 0 || image.1 == 0 || canvas.0 == 0 || canvas.1 == 0 {
        return Err(CoreError::EmptySurface);
    }
    let sx = canvas.0 as f64 / image.0 as f64;
    let sy = canvas.1 as f64 / image.1 as f64;
    let pitch = (sx.min(sy) * base as f64).floor() as u32;
    Ok(pitch.max(1))
}

#[derive(Debug, Clone)]
pub struct Surface {
    image: RgbaImage,
    pitch: u32,
}

impl Surface {
    pub fn new(image: RgbaImage, pitch: u32) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(CoreError::EmptySurface);
        }
        Ok(Self { image, pitch: pitch.max(1) })
    }

    pub fn from_image(img: DynamicImage, layout: Layout, base_pitch: u32) -> Result<Self> {
        let (iw, ih) = (img.width(), img.height());
        match layout {
            Layout::Canvas { width, height } => {
                let pitch = tile_pitch((width, height), (iw, ih), base_pitch)?;
                let stretched = imageops::resize(&img.to_rgba8(), width, height, FilterType::Triangle);
                Surface::new(stretched, pitch)
            }
            Layout::Native => {
                let pitch = tile_pitch((iw, ih), (iw, ih), base_pitch)?;
                Surface::new(img.to_rgba8(), pitch)
            }
        }
    }

    pub fn decode(bytes: &[u8], layout: Layout, base_pitch: u32) -> Result<Self> {
        let img = image::load_from_memory(bytes)?;
        Surface::from_image(img, layout, base_pitch)
    }

    pub fn open<P: AsRef<Path>>(path: P, layout: Layout, base_pitch: u32) -> Result<Self> {
        let img = image::open(path.as_ref())?;
        Surface::from_image(img, layout, base_pitch)
    }

    pub fn pitch(&self) -> u32 { self.pitch }

    /// Columns and rows of the tile grid, counting trailing partial tiles.
    pub fn grid_dimensions(&self) -> (u32, u32) {
        (self.image.width().div_ceil(self.pitch), self.image.height().div_ceil(self.pitch))
    }

    pub fn image(&self) -> &RgbaImage { &self.image }
}

impl Raster for Surface {
    fn width(&self) -> u32 { self.image.width() }
    fn height(&self) -> u32 { self.image.height() }

    fn rgb(&self, x: i64, y: i64) -> Option<[u8; 3]> {
        let x = u32::try_from(x).ok()?;
        let y = u32::try_from(y).ok()?;
        self.image.get_pixel_checked(x, y).map(|p| [p[0], p[1], p[2]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn pitch_scales_with_canvas_fit() {
        assert_eq!(tile_pitch((1000, 700), (1000, 700), 40).unwrap(), 40);
        assert_eq!(tile_pitch((1000, 700), (500, 350), 40).unwrap(), 80);
        // width-limited: 1000/2000 = 0.5, 700/700 = 1.0
        assert_eq!(tile_pitch((1000, 700), (2000, 700), 40).unwrap(), 20);
        // 1000/3000 * 40 = 13.33..
        assert_eq!(tile_pitch((1000, 700), (3000, 700), 40).unwrap(), 13);
        assert_eq!(tile_pitch((10, 10), (10_000, 10_000), 40).unwrap(), 1);
        assert!(matches!(tile_pitch((1000, 700), (0, 5), 40), Err(CoreError::EmptySurface)));
    }

    #[test]
    fn canvas_layout_stretches_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(50, 35, Rgba([120, 120, 120, 255])));
        let s = Surface::from_image(img, Layout::Canvas { width: 1000, height: 700 }, 40).unwrap();
        assert_eq!((s.width(), s.height()), (1000, 700));
        assert_eq!(s.pitch(), 800);
        assert_eq!(s.grid_dimensions(), (2, 1));
    }

    #[test]
    fn native_layout_keeps_size_and_base_pitch() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(90, 50, Rgba([0, 0, 0, 255])));
        let s = Surface::from_image(img, Layout::Native, 40).unwrap();
        assert_eq!((s.width(), s.height()), (90, 50));
        assert_eq!(s.pitch(), 40);
        assert_eq!(s.grid_dimensions(), (3, 2));
    }

    #[test]
    fn reads_outside_are_none() {
        let s = Surface::new(RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 0])), 2).unwrap();
        assert_eq!(s.rgb(0, 0), Some([1, 2, 3]));
        assert_eq!(s.rgb(-1, 0), None);
        assert_eq!(s.rgb(4, 0), None);
        assert_eq!(s.rgb(0, 4), None);
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = Surface::decode(b"not an image", Layout::Native, 40).unwrap_err();
        assert!(matches!(err, CoreError::Decode(_)));
    }
}
