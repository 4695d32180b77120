//! Page-space ↔ display-space mapping.
//!
//! Page space is the unrotated page at scale 1.0, origin top-left, y down,
//! measured in page units (PDF points). Display space is the rotated,
//! zoomed page in logical (CSS) pixels, origin at the top-left of the
//! displayed page. The backing surface is display space multiplied by the
//! clamped device pixel ratio.

use egui::{Pos2, Rect, Vec2, pos2, vec2};
use serde::{Deserialize, Serialize};

/// Page rotation, clockwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    /// Parse a rotation from degrees; only multiples of 90 are accepted
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Self::R0),
            90 => Some(Self::R90),
            180 => Some(Self::R180),
            270 => Some(Self::R270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Self::R0 => 0,
            Self::R90 => 90,
            Self::R180 => 180,
            Self::R270 => 270,
        }
    }

    pub fn rotated_cw(self) -> Self {
        match self {
            Self::R0 => Self::R90,
            Self::R90 => Self::R180,
            Self::R180 => Self::R270,
            Self::R270 => Self::R0,
        }
    }

    pub fn rotated_ccw(self) -> Self {
        match self {
            Self::R0 => Self::R270,
            Self::R90 => Self::R0,
            Self::R180 => Self::R90,
            Self::R270 => Self::R180,
        }
    }

    /// True when width and height trade places
    pub fn is_sideways(self) -> bool {
        matches!(self, Self::R90 | Self::R270)
    }
}

/// Clamp a raw device pixel ratio into `range` to bound raster memory on
/// very dense displays while still oversampling for sharp text.
pub fn clamp_pixel_ratio(raw: f32, range: (f32, f32)) -> f32 {
    let (lo, hi) = range;
    if !raw.is_finite() {
        return lo;
    }
    raw.clamp(lo, hi.max(lo))
}

/// Scale that fits a page of `page_width` into `container_width` minus `padding`
pub fn fit_to_width(container_width: f32, page_width: f32, padding: f32) -> f32 {
    if page_width <= 0.0 {
        return 1.0;
    }
    let usable = (container_width - padding).max(1.0);
    usable / page_width
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    page_size: Vec2,
    scale: f32,
    rotation: Rotation,
    pixel_ratio: f32,
}

impl ViewTransform {
    /// `pixel_ratio` is expected to be already clamped, see [`clamp_pixel_ratio`]
    pub fn new(page_size: Vec2, scale: f32, rotation: Rotation, pixel_ratio: f32) -> Self {
        Self {
            page_size,
            scale,
            rotation,
            pixel_ratio,
        }
    }

    pub fn page_size(&self) -> Vec2 {
        self.page_size
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Page bounds in page space
    pub fn page_rect(&self) -> Rect {
        Rect::from_min_size(Pos2::ZERO, self.page_size)
    }

    /// Size of the page after rotation, before zoom
    fn rotated_page_size(&self) -> Vec2 {
        if self.rotation.is_sideways() {
            vec2(self.page_size.y, self.page_size.x)
        } else {
            self.page_size
        }
    }

    /// Logical size of the displayed page
    pub fn display_size(&self) -> Vec2 {
        self.rotated_page_size() * self.scale
    }

    /// Pixel size of the backing surface
    pub fn backing_size(&self) -> [u32; 2] {
        let size = self.display_size() * self.pixel_ratio;
        [size.x.ceil().max(1.0) as u32, size.y.ceil().max(1.0) as u32]
    }

    pub fn page_to_display(&self, p: Pos2) -> Pos2 {
        let (w, h) = (self.page_size.x, self.page_size.y);
        let rotated = match self.rotation {
            Rotation::R0 => p,
            Rotation::R90 => pos2(h - p.y, p.x),
            Rotation::R180 => pos2(w - p.x, h - p.y),
            Rotation::R270 => pos2(p.y, w - p.x),
        };
        pos2(rotated.x * self.scale, rotated.y * self.scale)
    }

    pub fn display_to_page(&self, d: Pos2) -> Pos2 {
        let (w, h) = (self.page_size.x, self.page_size.y);
        let r = if self.scale > 0.0 {
            pos2(d.x / self.scale, d.y / self.scale)
        } else {
            d
        };
        match self.rotation {
            Rotation::R0 => r,
            Rotation::R90 => pos2(r.y, h - r.x),
            Rotation::R180 => pos2(w - r.x, h - r.y),
            Rotation::R270 => pos2(w - r.y, r.x),
        }
    }

    /// Map a page-space rect; the result is axis aligned because rotations are quarter turns
    pub fn page_rect_to_display(&self, rect: Rect) -> Rect {
        Rect::from_two_pos(self.page_to_display(rect.min), self.page_to_display(rect.max))
    }

    pub fn display_rect_to_page(&self, rect: Rect) -> Rect {
        Rect::from_two_pos(self.display_to_page(rect.min), self.display_to_page(rect.max))
    }

    /// Length in page units → display pixels
    pub fn page_len_to_display(&self, len: f32) -> f32 {
        len * self.scale
    }

    pub fn display_len_to_page(&self, len: f32) -> f32 {
        if self.scale > 0.0 { len / self.scale } else { len }
    }
}
