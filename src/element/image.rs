use egui::{Color32, ColorImage, Rect};
use serde::{Deserialize, Serialize};

/// Decoded bitmap placed on a page
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageObject {
    pub rect: Rect,
    /// Pixel dimensions of `rgba`
    pub size: [usize; 2],
    /// Unmultiplied RGBA8 pixels, row-major
    pub rgba: Vec<u8>,
}

// Custom Debug implementation to keep pixel buffers out of logs
impl std::fmt::Debug for ImageObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageObject")
            .field("rect", &self.rect)
            .field("size", &self.size)
            .field("data_len", &self.rgba.len())
            .finish()
    }
}

impl ImageObject {
    pub fn new(rect: Rect, size: [usize; 2], rgba: Vec<u8>) -> Self {
        Self { rect, size, rgba }
    }

    /// Decode PNG, JPEG, GIF, WebP or BMP bytes with the `image` crate
    pub fn decode(bytes: &[u8], rect: Rect) -> Result<Self, String> {
        let decoded = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
        let rgba = decoded.to_rgba8();
        let size = [rgba.width() as usize, rgba.height() as usize];
        Ok(Self::new(rect, size, rgba.into_raw()))
    }

    pub fn is_valid(&self) -> bool {
        self.size[0] > 0 && self.size[1] > 0 && self.rgba.len() == self.size[0] * self.size[1] * 4
    }

    /// Pixel at (x, y), or transparent when out of range
    pub fn pixel(&self, x: usize, y: usize) -> Color32 {
        if x >= self.size[0] || y >= self.size[1] {
            return Color32::TRANSPARENT;
        }
        let i = (y * self.size[0] + x) * 4;
        match self.rgba.get(i..i + 4) {
            Some(&[r, g, b, a]) => Color32::from_rgba_unmultiplied(r, g, b, a),
            _ => Color32::TRANSPARENT,
        }
    }

    pub fn to_color_image(&self) -> ColorImage {
        ColorImage::from_rgba_unmultiplied(self.size, &self.rgba)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{pos2, vec2};

    #[test]
    fn decodes_png_bytes() {
        let mut png = Vec::new();
        let img = image::RgbaImage::from_pixel(2, 3, image::Rgba([10, 20, 30, 255]));
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(20.0, 30.0));
        let object = ImageObject::decode(&png, rect).unwrap();
        assert_eq!(object.size, [2, 3]);
        assert!(object.is_valid());
        assert_eq!(object.pixel(1, 2), Color32::from_rgb(10, 20, 30));
        assert_eq!(object.pixel(5, 5), Color32::TRANSPARENT);
    }

    #[test]
    fn decodes_the_other_picker_formats() {
        let pixels = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 40, 40]));
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(4.0, 4.0));
        for format in [
            image::ImageFormat::Jpeg,
            image::ImageFormat::Gif,
            image::ImageFormat::WebP,
            image::ImageFormat::Bmp,
        ] {
            let mut bytes = Vec::new();
            image::DynamicImage::ImageRgb8(pixels.clone())
                .write_to(&mut std::io::Cursor::new(&mut bytes), format)
                .unwrap();
            let object = ImageObject::decode(&bytes, rect).unwrap_or_else(|err| panic!("{format:?}: {err}"));
            assert_eq!(object.size, [4, 4], "{format:?}");
        }
    }

    #[test]
    fn rejects_garbage() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(1.0, 1.0));
        assert!(ImageObject::decode(b"not an image", rect).is_err());
    }
}
