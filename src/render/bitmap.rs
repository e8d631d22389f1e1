//! One-bit bitmaps for downloaded graphics and encoded symbols.
//!
//! Storage is packed 1 bit per pixel, MSB first, each row padded to a whole
//! byte: the same layout label graphics arrive in.
//!
//! ```text
//! byte 0xA5 = 1010_0101 → ■□■□□■□■
//! ```

use image::DynamicImage;

/// Packed monochrome bitmap; a set bit is black.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Bitmap {
    /// All-white bitmap.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width.div_ceil(8) * height],
        }
    }

    /// Wrap packed rows of `width_bytes` bytes. Short data is padded white.
    pub fn from_packed(width_bytes: usize, height: usize, data: &[u8]) -> Self {
        let mut packed = vec![0u8; width_bytes * height];
        let n = packed.len().min(data.len());
        packed[..n].copy_from_slice(&data[..n]);
        Self {
            width: width_bytes * 8,
            height,
            data: packed,
        }
    }

    /// Build from a per-pixel predicate.
    pub fn from_fn(width: usize, height: usize, mut black: impl FnMut(usize, usize) -> bool) -> Self {
        let mut bitmap = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if black(x, y) {
                    bitmap.set(x, y, true);
                }
            }
        }
        bitmap
    }

    /// Threshold a decoded image: dark, opaque pixels become black.
    pub fn from_image(image: &DynamicImage) -> Self {
        let gray = image.to_luma_alpha8();
        Self::from_fn(gray.width() as usize, gray.height() as usize, |x, y| {
            let px = gray.get_pixel(x as u32, y as u32);
            px[1] >= 128 && px[0] < 128
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn width_bytes(&self) -> usize {
        self.width.div_ceil(8)
    }

    /// Pixel value; out-of-range reads are white.
    pub fn get(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let byte = self.data[y * self.width_bytes() + x / 8];
        (byte >> (7 - (x % 8))) & 1 == 1
    }

    pub fn set(&mut self, x: usize, y: usize, black: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y * self.width_bytes() + x / 8;
        let mask = 1u8 << (7 - (x % 8));
        if black {
            self.data[idx] |= mask;
        } else {
            self.data[idx] &= !mask;
        }
    }

    /// Number of black pixels.
    pub fn count_black(&self) -> usize {
        self.data.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Packed row data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_unpack_msb_first() {
        let bitmap = Bitmap::from_packed(1, 1, &[0xA5]);
        let row: Vec<bool> = (0..8).map(|x| bitmap.get(x, 0)).collect();
        assert_eq!(row, vec![true, false, true, false, false, true, false, true]);
    }

    #[test]
    fn test_from_packed_pads_short_data() {
        let bitmap = Bitmap::from_packed(2, 2, &[0xFF]);
        assert_eq!(bitmap.width(), 16);
        assert_eq!(bitmap.count_black(), 8);
        assert!(!bitmap.get(0, 1));
    }

    #[test]
    fn test_set_and_get() {
        let mut bitmap = Bitmap::new(10, 3);
        bitmap.set(9, 2, true);
        assert!(bitmap.get(9, 2));
        bitmap.set(9, 2, false);
        assert!(!bitmap.get(9, 2));
        // Out of range is ignored / white
        bitmap.set(10, 0, true);
        assert!(!bitmap.get(10, 0));
        assert_eq!(bitmap.count_black(), 0);
    }

    #[test]
    fn test_from_image_threshold() {
        let mut gray = GrayImage::from_pixel(2, 1, Luma([255u8]));
        gray.put_pixel(1, 0, Luma([10u8]));
        let bitmap = Bitmap::from_image(&DynamicImage::ImageLuma8(gray));
        assert!(!bitmap.get(0, 0));
        assert!(bitmap.get(1, 0));
    }
}
