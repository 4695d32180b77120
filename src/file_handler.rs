use egui::{DroppedFile, Rect};

use crate::element::ImageObject;
use crate::error::LoadError;

/// What a dropped file turned out to be
#[derive(Debug)]
pub enum DroppedPayload {
    /// A PDF to open as the document
    Pdf { name: String, bytes: Vec<u8> },
    /// A decoded image, ready for the image tool
    Image { name: String, image: ImageObject },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Pdf,
    Image,
    Other,
}

#[derive(Debug, Default)]
pub struct FileHandler {
    dropped_files: Vec<DroppedFile>,
}

impl FileHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick up files dropped on the window this frame.
    /// Returns true if there is anything to process.
    pub fn check_for_dropped_files(&mut self, ctx: &egui::Context) -> bool {
        ctx.input(|i| {
            if !i.raw.dropped_files.is_empty() {
                self.dropped_files = i.raw.dropped_files.clone();
            }
        });
        !self.dropped_files.is_empty()
    }

    /// Classify and read the queued files.
    ///
    /// Files with the same name are only handled once per drop.
    pub fn process_dropped_files(&mut self) -> Vec<Result<DroppedPayload, LoadError>> {
        let mut seen: Vec<String> = Vec::new();
        let mut results = Vec::new();
        for file in std::mem::take(&mut self.dropped_files) {
            let name = file_name(&file);
            if seen.contains(&name) {
                continue;
            }
            seen.push(name.clone());
            results.push(process_file(&file, name));
        }
        results
    }

    /// Dim the window while files hover over it
    pub fn preview_files_being_dropped(&self, ctx: &egui::Context) {
        use egui::{Align2, Color32, FontId, Id, LayerId, Order};

        let hovered: Vec<String> = ctx.input(|i| {
            i.raw
                .hovered_files
                .iter()
                .map(|file| match &file.path {
                    Some(path) => path.display().to_string(),
                    None => file.mime.clone(),
                })
                .collect()
        });
        if hovered.is_empty() {
            return;
        }

        let mut text = "Drop a PDF to open it, or an image to place it:\n".to_owned();
        for name in &hovered {
            text += &format!("\n{name}");
        }
        let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("file_drop_target")));
        let screen_rect = ctx.screen_rect();
        painter.rect_filled(screen_rect, 0.0, Color32::from_black_alpha(192));
        painter.text(
            screen_rect.center(),
            Align2::CENTER_CENTER,
            text,
            FontId::proportional(20.0),
            Color32::WHITE,
        );
    }
}

fn file_name(file: &DroppedFile) -> String {
    if let Some(path) = &file.path {
        path.display().to_string()
    } else if !file.name.is_empty() {
        file.name.clone()
    } else {
        "unknown".to_owned()
    }
}

fn process_file(file: &DroppedFile, name: String) -> Result<DroppedPayload, LoadError> {
    let kind = classify(file);
    if kind == FileKind::Other {
        log::warn!("Dropped file is not a supported type: {}", name);
        return Err(LoadError::UnsupportedType(name));
    }
    let bytes = read_bytes(file, &name)?;
    match kind {
        FileKind::Pdf => {
            log::info!("Opening dropped PDF {} ({} bytes)", name, bytes.len());
            Ok(DroppedPayload::Pdf { name, bytes })
        }
        _ => {
            let image = ImageObject::decode(&bytes, Rect::NOTHING).map_err(|err| {
                log::error!("Failed to decode image {}: {}", name, err);
                LoadError::UnsupportedType(name.clone())
            })?;
            log::debug!("Decoded image {}: {}x{}", name, image.size[0], image.size[1]);
            Ok(DroppedPayload::Image { name, image })
        }
    }
}

/// MIME type first, extension as a fallback
fn classify(file: &DroppedFile) -> FileKind {
    if !file.mime.is_empty() {
        return if file.mime == "application/pdf" {
            FileKind::Pdf
        } else if file.mime.starts_with("image/") {
            FileKind::Image
        } else {
            FileKind::Other
        };
    }
    let name = file
        .path
        .as_ref()
        .and_then(|path| path.file_name())
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| file.name.to_lowercase());
    match name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("pdf") => FileKind::Pdf,
        Some("png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp") => FileKind::Image,
        _ => FileKind::Other,
    }
}

fn read_bytes(file: &DroppedFile, name: &str) -> Result<Vec<u8>, LoadError> {
    if let Some(bytes) = &file.bytes {
        return Ok(bytes.to_vec());
    }

    #[cfg(not(target_arch = "wasm32"))]
    if let Some(path) = &file.path {
        return std::fs::read(path).map_err(|err| {
            log::error!("Failed to read {}: {}", path.display(), err);
            LoadError::Empty
        });
    }

    log::warn!("Dropped file has no accessible data: {}", name);
    Err(LoadError::Empty)
}
