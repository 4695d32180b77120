use egui::epaint::{EllipseShape, Mesh, TextShape, Vertex};
use egui::{Color32, Painter, Pos2, Rect, Shape, Stroke, TextureId, Vec2, emath::Rot2, pos2, vec2};

use crate::document::Raster;
use crate::element::{ImageObject, ObjectKind, SceneObject, TEXT_PADDING, TextObject, arrow_head_points};
use crate::geometry::hit_testing::triangle_points;
use crate::geometry::{Corner, ViewTransform};
use crate::state::Editor;
use crate::texture_manager::{TextureGenerationError, TextureKey, TextureManager};

const HANDLE_SIZE: f32 = 8.0;
const HANDLE_COLOR: Color32 = Color32::from_rgb(30, 144, 255);
const SELECTION_MARGIN: f32 = 3.0;
const CARET_WIDTH: f32 = 1.5;
const TEXTURE_CACHE_SIZE: usize = 64;
const GRID_COLOR: Color32 = Color32::from_rgba_premultiplied(40, 80, 140, 40);
/// Grid lines closer than this on screen are skipped
const MIN_GRID_GAP: f32 = 4.0;

/// Where the current page sits on screen and how to map onto it
#[derive(Debug, Clone, Copy)]
pub struct PageView<'a> {
    /// Screen position of the displayed page's top-left corner
    pub origin: Pos2,
    pub transform: ViewTransform,
    pub raster: &'a Raster,
    /// Document session generation the raster belongs to
    pub generation: u64,
}

impl PageView<'_> {
    pub fn to_screen(&self, p: Pos2) -> Pos2 {
        self.origin + self.transform.page_to_display(p).to_vec2()
    }

    pub fn from_screen(&self, s: Pos2) -> Pos2 {
        self.transform.display_to_page((s - self.origin).to_pos2())
    }

    pub fn rect_to_screen(&self, rect: Rect) -> Rect {
        self.transform.page_rect_to_display(rect).translate(self.origin.to_vec2())
    }

    pub fn screen_rect(&self) -> Rect {
        Rect::from_min_size(self.origin, self.transform.display_size())
    }

    fn len(&self, page_len: f32) -> f32 {
        self.transform.page_len_to_display(page_len)
    }

    /// Clockwise angle applied to upright content such as text
    fn angle(&self) -> f32 {
        f32::from(self.transform.rotation().degrees()).to_radians()
    }

    /// Page-space rect corners in screen space, clockwise from top-left
    fn quad(&self, rect: Rect) -> [Pos2; 4] {
        [rect.left_top(), rect.right_top(), rect.right_bottom(), rect.left_bottom()].map(|p| self.to_screen(p))
    }
}

/// Paints the page raster and the annotation overlay with an egui painter
#[derive(Debug)]
pub struct Renderer {
    textures: TextureManager,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            textures: TextureManager::new(TEXTURE_CACHE_SIZE),
        }
    }

    pub fn textures(&self) -> &TextureManager {
        &self.textures
    }

    /// Forget every texture, used when another document is loaded
    pub fn reset(&mut self) {
        self.textures.clear_cache();
    }

    /// Paint one frame of the page: raster, committed objects, the shape
    /// under construction, selection chrome, and the text caret
    pub fn render(&mut self, painter: &Painter, view: &PageView<'_>, editor: &Editor) {
        self.textures.begin_frame();
        self.paint_page(painter, view);
        if editor.preferences().show_grid {
            paint_grid(painter, view, editor.config().grid_spacing);
        }
        for object in editor.visible_objects(editor.page()) {
            self.paint_object(painter, view, object);
        }
        if let Some(preview) = editor.session().preview() {
            self.paint_object(painter, view, preview);
        }
        self.paint_selection(painter, view, editor);
        self.paint_caret(painter, view, editor);
    }

    fn paint_page(&mut self, painter: &Painter, view: &PageView<'_>) {
        let key = TextureKey::Page {
            page: view.raster.page,
            generation: view.generation,
        };
        let raster = view.raster;
        let texture = self.textures.get_or_create_texture(
            key,
            || {
                if raster.rgba.len() != raster.size[0] * raster.size[1] * 4 {
                    return Err(TextureGenerationError::GenerationFailed);
                }
                Ok(raster.to_color_image())
            },
            painter.ctx(),
        );
        match texture {
            Ok(texture) => textured_quad(painter, texture, view.quad(view.transform.page_rect()), Color32::WHITE),
            Err(err) => {
                log::error!("Page {} texture: {}", raster.page, err);
                painter.rect_filled(view.screen_rect(), 0.0, Color32::WHITE);
            }
        }
    }

    pub fn paint_object(&mut self, painter: &Painter, view: &PageView<'_>, object: &SceneObject) {
        let style = &object.style;
        let stroke = Stroke::new(view.len(style.stroke_width), style.faded(style.stroke_color));
        let fill = style.fill.map_or(Color32::TRANSPARENT, |fill| style.faded(fill));

        match &object.kind {
            ObjectKind::Rectangle { rect } => {
                painter.rect(view.rect_to_screen(*rect), 0.0, fill, stroke);
            }
            ObjectKind::Triangle { rect } => {
                let points = triangle_points(*rect).map(|p| view.to_screen(p)).to_vec();
                painter.add(Shape::convex_polygon(points, fill, stroke));
            }
            ObjectKind::Circle { center, radius } => {
                painter.circle(view.to_screen(*center), view.len(*radius), fill, stroke);
            }
            ObjectKind::Ellipse { center, radii } => {
                let radii = if view.transform.rotation().is_sideways() {
                    vec2(radii.y, radii.x)
                } else {
                    *radii
                };
                painter.add(Shape::Ellipse(EllipseShape {
                    center: view.to_screen(*center),
                    radius: radii * view.transform.scale(),
                    fill,
                    stroke,
                }));
            }
            ObjectKind::Line { start, end } => {
                painter.line_segment([view.to_screen(*start), view.to_screen(*end)], stroke);
            }
            ObjectKind::Arrow { start, end } => {
                painter.line_segment([view.to_screen(*start), view.to_screen(*end)], stroke);
                let head = arrow_head_points(*start, *end, style.stroke_width).map(|p| view.to_screen(p));
                painter.add(Shape::convex_polygon(head.to_vec(), stroke.color, Stroke::NONE));
            }
            ObjectKind::Freehand { points } => {
                let points: Vec<Pos2> = points.iter().map(|p| view.to_screen(*p)).collect();
                painter.add(Shape::line(points, stroke));
            }
            ObjectKind::Image(image) => self.paint_image(painter, view, object, image),
            ObjectKind::Stamp { rect, label } => {
                let screen = view.rect_to_screen(*rect);
                painter.rect_stroke(screen, view.len(4.0), stroke);
                let font = egui::FontId::proportional(view.len(rect.height() * 0.6).max(1.0));
                let galley = painter.layout_no_wrap(label.clone(), font, stroke.color);
                let pos = view.to_screen(rect.center()) - rotate(galley.size() / 2.0, view.angle());
                painter.add(TextShape::new(pos, galley, stroke.color).with_angle(view.angle()));
            }
            ObjectKind::Text(text) => paint_text(painter, view, text, style.faded(text.color), style.opacity),
        }
    }

    fn paint_image(&mut self, painter: &Painter, view: &PageView<'_>, object: &SceneObject, image: &ImageObject) {
        let texture = self.textures.get_or_create_texture(
            TextureKey::Image(object.id()),
            || {
                if !image.is_valid() {
                    return Err(TextureGenerationError::InvalidDimensions);
                }
                Ok(image.to_color_image())
            },
            painter.ctx(),
        );
        match texture {
            Ok(texture) => {
                let tint = Color32::WHITE.gamma_multiply(object.style.opacity.clamp(0.0, 1.0));
                textured_quad(painter, texture, view.quad(image.rect), tint);
            }
            Err(err) => {
                log::warn!("Image {} texture: {}", object.id(), err);
                painter.rect_stroke(view.rect_to_screen(image.rect), 0.0, Stroke::new(1.0, Color32::RED));
            }
        }
    }

    fn paint_selection(&self, painter: &Painter, view: &PageView<'_>, editor: &Editor) {
        let scene = editor.scene();
        let selected: Vec<&SceneObject> = scene
            .selection()
            .iter()
            .filter_map(|id| scene.get(*id))
            .filter(|object| object.page == editor.page())
            .collect();
        let outline = Stroke::new(1.0, HANDLE_COLOR);
        for object in &selected {
            let rect = view.rect_to_screen(object.bounds()).expand(SELECTION_MARGIN);
            painter.rect_stroke(rect, 0.0, outline);
        }
        // Resize handles only for a single selection
        if let [object] = selected[..] {
            for corner in Corner::ALL {
                let pos = view.to_screen(corner.position(object.bounds()));
                let handle = Rect::from_center_size(pos, Vec2::splat(HANDLE_SIZE));
                painter.rect_filled(handle, 0.0, HANDLE_COLOR);
                painter.rect_stroke(handle, 0.0, Stroke::new(1.0, Color32::WHITE));
            }
        }
    }

    fn paint_caret(&self, painter: &Painter, view: &PageView<'_>, editor: &Editor) {
        let (Some(id), Some(cursor)) = (editor.session().editing_id(), editor.session().text_cursor()) else {
            return;
        };
        let Some(text) = editor.scene().get(id).and_then(SceneObject::as_text) else {
            return;
        };
        let font = text.font_id(view.transform.scale());
        let box_rect = view.rect_to_screen(text.rect());
        if cursor.select_all {
            painter.rect_filled(box_rect, 0.0, HANDLE_COLOR.gamma_multiply(0.25));
            return;
        }

        let prefix: String = text.content.chars().take(cursor.caret).collect();
        let line_index = prefix.matches('\n').count();
        let last_line = prefix.rsplit('\n').next().unwrap_or_default().to_owned();
        let row_height = painter.ctx().fonts(|fonts| fonts.row_height(&font));
        let x = painter.layout_no_wrap(last_line, font, text.color).size().x;

        let top = view.to_screen(text.anchor + Vec2::splat(TEXT_PADDING));
        let offset = rotate(vec2(x, line_index as f32 * row_height), view.angle());
        let down = rotate(vec2(0.0, row_height), view.angle());
        painter.line_segment([top + offset, top + offset + down], Stroke::new(CARET_WIDTH, text.color));
    }
}

fn paint_grid(painter: &Painter, view: &PageView<'_>, spacing: f32) {
    if spacing <= 0.0 || view.len(spacing) < MIN_GRID_GAP {
        return;
    }
    let page = view.transform.page_rect();
    let stroke = Stroke::new(1.0, GRID_COLOR);
    let mut x = spacing;
    while x < page.max.x {
        painter.line_segment([view.to_screen(pos2(x, 0.0)), view.to_screen(pos2(x, page.max.y))], stroke);
        x += spacing;
    }
    let mut y = spacing;
    while y < page.max.y {
        painter.line_segment([view.to_screen(pos2(0.0, y)), view.to_screen(pos2(page.max.x, y))], stroke);
        y += spacing;
    }
}

fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Rot2::from_angle(angle) * v
}

fn paint_text(painter: &Painter, view: &PageView<'_>, text: &TextObject, color: Color32, opacity: f32) {
    if let Some(background) = text.background {
        let bg = background.gamma_multiply(opacity.clamp(0.0, 1.0));
        painter.rect_filled(view.rect_to_screen(text.rect()), 0.0, bg);
    }
    let galley = painter.layout_no_wrap(text.content.clone(), text.font_id(view.transform.scale()), color);
    let pos = view.to_screen(text.anchor + Vec2::splat(TEXT_PADDING));
    if text.bold {
        let nudge = rotate(vec2(view.len(text.font_size * 0.04).max(0.5), 0.0), view.angle());
        painter.add(TextShape::new(pos + nudge, galley.clone(), color).with_angle(view.angle()));
    }
    painter.add(TextShape::new(pos, galley, color).with_angle(view.angle()));
}

fn textured_quad(painter: &Painter, texture: TextureId, corners: [Pos2; 4], tint: Color32) {
    let uvs = [pos2(0.0, 0.0), pos2(1.0, 0.0), pos2(1.0, 1.0), pos2(0.0, 1.0)];
    let mut mesh = Mesh::with_texture(texture);
    for (pos, uv) in corners.into_iter().zip(uvs) {
        mesh.vertices.push(Vertex { pos, uv, color: tint });
    }
    mesh.add_triangle(0, 1, 2);
    mesh.add_triangle(0, 2, 3);
    painter.add(Shape::mesh(mesh));
}
