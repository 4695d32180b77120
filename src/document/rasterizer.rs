use egui::{Color32, ColorImage, Vec2, vec2};

use crate::error::RenderError;

/// US Letter in points, used when a page declares no `/MediaBox`
pub const DEFAULT_MEDIA_BOX: Vec2 = vec2(612.0, 792.0);

/// Largest raster edge accepted from a rasterizer, in pixels
pub const MAX_RASTER_EDGE: u32 = 16_384;

/// Rendered page bitmap
#[derive(Clone, PartialEq)]
pub struct Raster {
    /// 1-based page index
    pub page: u32,
    /// Page size in page units (points)
    pub page_size: Vec2,
    /// Pixel dimensions of `rgba`
    pub size: [usize; 2],
    /// Unmultiplied RGBA8 pixels, row-major
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("page", &self.page)
            .field("page_size", &self.page_size)
            .field("size", &self.size)
            .finish()
    }
}

impl Raster {
    /// Solid raster of `page_size` at `scale` pixels per page unit
    pub fn blank(page: u32, page_size: Vec2, scale: f32, color: Color32) -> Result<Self, RenderError> {
        let width = (page_size.x * scale).round();
        let height = (page_size.y * scale).round();
        if !(width >= 1.0 && height >= 1.0)
            || width > MAX_RASTER_EDGE as f32
            || height > MAX_RASTER_EDGE as f32
        {
            return Err(RenderError::InvalidDimensions {
                width: width.max(0.0) as u32,
                height: height.max(0.0) as u32,
            });
        }
        let size = [width as usize, height as usize];
        let rgba = color.to_srgba_unmultiplied().repeat(size[0] * size[1]);
        Ok(Self {
            page,
            page_size,
            size,
            rgba,
        })
    }

    /// Pixels per page unit along x
    pub fn scale(&self) -> f32 {
        self.size[0] as f32 / self.page_size.x.max(f32::EPSILON)
    }

    pub fn to_color_image(&self) -> ColorImage {
        ColorImage::from_rgba_unmultiplied(self.size, &self.rgba)
    }
}

/// Turns PDF bytes into page counts and page bitmaps
pub trait Rasterizer: Send + Sync {
    fn page_count(&self, bytes: &[u8]) -> Result<u32, RenderError>;

    /// Render 1-based `page` at `scale` pixels per point
    fn render_page(&self, bytes: &[u8], page: u32, scale: f32) -> Result<Raster, RenderError>;
}

/// Rasterizer without a PDF engine.
///
/// Pages are found by their `/Type /Page` dictionaries and rendered blank at
/// the size of their `/MediaBox`. Enough to annotate and flatten a document
/// when no real renderer is linked in.
#[derive(Debug, Clone, Default)]
pub struct MediaBoxRasterizer;

impl MediaBoxRasterizer {
    pub fn new() -> Self {
        Self
    }

    /// Media box size of every page object, in file order
    fn page_sizes(bytes: &[u8]) -> Vec<Vec2> {
        let text = String::from_utf8_lossy(bytes);
        let inherited = find_media_box(&text).unwrap_or(DEFAULT_MEDIA_BOX);
        page_markers(&text)
            .into_iter()
            .map(|marker| {
                let start = text[..marker].rfind(" obj").map_or(0, |i| i + 4);
                let end = text[marker..].find("endobj").map_or(text.len(), |i| marker + i);
                find_media_box(&text[start..end]).unwrap_or(inherited)
            })
            .collect()
    }
}

impl Rasterizer for MediaBoxRasterizer {
    fn page_count(&self, bytes: &[u8]) -> Result<u32, RenderError> {
        match Self::page_sizes(bytes).len() {
            0 => Err(RenderError::NoPages),
            n => u32::try_from(n).map_err(|_| RenderError::Malformed("too many pages".to_owned())),
        }
    }

    fn render_page(&self, bytes: &[u8], page: u32, scale: f32) -> Result<Raster, RenderError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(RenderError::Malformed(format!("invalid render scale {scale}")));
        }
        let sizes = Self::page_sizes(bytes);
        let size = page
            .checked_sub(1)
            .and_then(|index| sizes.get(index as usize))
            .copied()
            .ok_or(RenderError::MissingPage(page))?;
        Raster::blank(page, size, scale, Color32::WHITE)
    }
}

/// Byte offsets of `/Type /Page` entries, skipping `/Type /Pages`
fn page_markers(text: &str) -> Vec<usize> {
    let mut markers = Vec::new();
    let mut from = 0;
    while let Some(offset) = text[from..].find("/Type") {
        let at = from + offset;
        let rest = text[at + 5..].trim_start();
        if let Some(after) = rest.strip_prefix("/Page") {
            if !after.starts_with(|c: char| c.is_ascii_alphanumeric()) {
                markers.push(at);
            }
        }
        from = at + 5;
    }
    markers
}

/// Width and height of the first `/MediaBox [x0 y0 x1 y1]` in `text`
fn find_media_box(text: &str) -> Option<Vec2> {
    let at = text.find("/MediaBox")?;
    let rest = text[at + 9..].trim_start().strip_prefix('[')?;
    let inner = &rest[..rest.find(']')?];
    let numbers: Vec<f32> = inner
        .split_whitespace()
        .filter_map(|token| token.parse().ok())
        .collect();
    let [x0, y0, x1, y1] = numbers[..] else {
        return None;
    };
    let size = vec2((x1 - x0).abs(), (y1 - y0).abs());
    (size.x > 0.0 && size.y > 0.0).then_some(size)
}
