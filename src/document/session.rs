use std::collections::HashMap;
use std::sync::Arc;

use egui::Vec2;
use image::RgbaImage;

use super::loader::PendingLoad;
use super::rasterizer::{Raster, Rasterizer};
use super::writer::DocumentWriter;
use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult, ExportError, LoadError};
use crate::geometry::{Rotation, ViewTransform, clamp_pixel_ratio, fit_to_width};

/// Magic bytes every PDF starts with
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Pages are cached at this scale and resampled for other zoom levels
pub const CACHE_SCALE: f32 = 1.0;

/// Summary handed back to the caller after a successful load
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    pub page_count: u32,
    pub first_page: Arc<Raster>,
}

/// Output of the off-thread part of a load, ready to be installed
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    pub(crate) bytes: Arc<[u8]>,
    pub(crate) page_count: u32,
    pub(crate) first_page: Raster,
}

/// Reject anything that does not look like a PDF
pub fn validate_pdf(bytes: &[u8]) -> Result<(), LoadError> {
    if bytes.is_empty() {
        return Err(LoadError::Empty);
    }
    // Some writers emit a few bytes of junk before the header
    let window = &bytes[..bytes.len().min(1024)];
    if window.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC) {
        Ok(())
    } else {
        Err(LoadError::NotPdf)
    }
}

/// Validate and rasterize page 1. Runs on a worker during async loads.
pub fn prepare(rasterizer: &dyn Rasterizer, bytes: Arc<[u8]>) -> Result<PreparedDocument, LoadError> {
    validate_pdf(&bytes)?;
    let page_count = rasterizer.page_count(&bytes)?;
    if page_count == 0 {
        return Err(LoadError::Rasterizer(crate::error::RenderError::NoPages));
    }
    let first_page = rasterizer.render_page(&bytes, 1, CACHE_SCALE)?;
    Ok(PreparedDocument {
        bytes,
        page_count,
        first_page,
    })
}

/// A loaded PDF and its view state
#[derive(Debug)]
pub struct Document {
    bytes: Arc<[u8]>,
    page_count: u32,
    current_page: u32,
    scale: f32,
    rotation: Rotation,
    cache: HashMap<u32, Arc<Raster>>,
}

impl Document {
    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn cached_pages(&self) -> usize {
        self.cache.len()
    }
}

/// Owns the loaded document and talks to the rasterizer.
///
/// Every change to page, scale or rotation bumps [`generation`]. Work that
/// was requested under an older generation is stale and gets dropped.
///
/// [`generation`]: DocumentSession::generation
pub struct DocumentSession {
    config: EditorConfig,
    rasterizer: Arc<dyn Rasterizer>,
    document: Option<Document>,
    generation: u64,
}

impl std::fmt::Debug for DocumentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSession")
            .field("document", &self.document)
            .field("generation", &self.generation)
            .finish()
    }
}

impl DocumentSession {
    pub fn new(config: EditorConfig, rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self {
            config,
            rasterizer,
            document: None,
            generation: 0,
        }
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn loaded(&self) -> EditorResult<&Document> {
        self.document.as_ref().ok_or(EditorError::NoDocument)
    }

    fn loaded_mut(&mut self) -> EditorResult<&mut Document> {
        self.document.as_mut().ok_or(EditorError::NoDocument)
    }

    /// Load a document synchronously. On failure the current document is kept.
    pub fn load(&mut self, bytes: impl Into<Arc<[u8]>>) -> EditorResult<LoadedDocument> {
        let prepared = prepare(self.rasterizer.as_ref(), bytes.into()).inspect_err(|err| {
            log::error!("load: {}", err);
        })?;
        Ok(self.install(prepared))
    }

    /// Start loading on a worker. The returned ticket is polled each frame and
    /// its result handed to [`finish_load`](Self::finish_load).
    pub fn begin_load(&mut self, bytes: impl Into<Arc<[u8]>>, name: &str) -> EditorResult<PendingLoad> {
        let bytes = bytes.into();
        validate_pdf(&bytes).inspect_err(|err| log::warn!("Rejected {}: {}", name, err))?;
        let generation = self.bump();
        log::info!("Loading {} ({} bytes), generation {}", name, bytes.len(), generation);
        Ok(PendingLoad::spawn(Arc::clone(&self.rasterizer), bytes, generation, name))
    }

    /// Install the result of a finished [`PendingLoad`]. Returns `Ok(None)` if
    /// the load was superseded by a newer request.
    pub fn finish_load(
        &mut self,
        generation: u64,
        result: Result<PreparedDocument, LoadError>,
    ) -> EditorResult<Option<LoadedDocument>> {
        if !self.accept_render(generation) {
            log::debug!("Dropping stale load from generation {}", generation);
            return Ok(None);
        }
        let prepared = result.inspect_err(|err| log::error!("load: {}", err))?;
        Ok(Some(self.install(prepared)))
    }

    fn install(&mut self, prepared: PreparedDocument) -> LoadedDocument {
        let first_page = Arc::new(prepared.first_page);
        let mut cache = HashMap::new();
        cache.insert(1, Arc::clone(&first_page));
        // Replacing the document drops the previous raster cache
        self.document = Some(Document {
            bytes: prepared.bytes,
            page_count: prepared.page_count,
            current_page: 1,
            scale: 1.0,
            rotation: Rotation::R0,
            cache,
        });
        self.bump();
        log::info!("Loaded document with {} pages", prepared.page_count);
        LoadedDocument {
            page_count: prepared.page_count,
            first_page,
        }
    }

    /// True if work requested under `generation` still applies
    pub fn accept_render(&self, generation: u64) -> bool {
        generation == self.generation
    }

    fn check_page(&self, page: u32) -> EditorResult<()> {
        let page_count = self.loaded()?.page_count;
        if page == 0 || page > page_count {
            log::warn!("Page {} requested, document has {}", page, page_count);
            return Err(EditorError::PageIndex {
                requested: page,
                page_count,
            });
        }
        Ok(())
    }

    /// Raster of a 1-based page, rendered on first use
    pub fn page(&mut self, page: u32) -> EditorResult<Arc<Raster>> {
        self.check_page(page)?;
        let rasterizer = Arc::clone(&self.rasterizer);
        let document = self.loaded_mut()?;
        if let Some(raster) = document.cache.get(&page) {
            return Ok(Arc::clone(raster));
        }
        let raster = rasterizer
            .render_page(&document.bytes, page, CACHE_SCALE)
            .map_err(|source| {
                log::error!("render_page {}: {}", page, source);
                EditorError::Render { page, source }
            })?;
        let raster = Arc::new(raster);
        document.cache.insert(page, Arc::clone(&raster));
        Ok(raster)
    }

    pub fn current_page(&mut self) -> EditorResult<Arc<Raster>> {
        let page = self.loaded()?.current_page;
        self.page(page)
    }

    /// Page size in page units
    pub fn page_size(&mut self, page: u32) -> EditorResult<Vec2> {
        Ok(self.page(page)?.page_size)
    }

    /// Show another page. Out-of-range pages are rejected.
    pub fn go_to_page(&mut self, page: u32) -> EditorResult<()> {
        self.check_page(page)?;
        let document = self.loaded_mut()?;
        if document.current_page == page {
            return Ok(());
        }
        document.current_page = page;
        self.bump();
        Ok(())
    }

    /// Set the zoom factor, clamped into the configured range. Returns the
    /// applied scale.
    pub fn set_scale(&mut self, scale: f32) -> EditorResult<f32> {
        let scale = self.config.clamp_scale(scale);
        let document = self.loaded_mut()?;
        if (document.scale - scale).abs() > f32::EPSILON {
            document.scale = scale;
            self.bump();
        }
        Ok(scale)
    }

    pub fn set_rotation(&mut self, rotation: Rotation) -> EditorResult<()> {
        let document = self.loaded_mut()?;
        if document.rotation != rotation {
            document.rotation = rotation;
            self.bump();
        }
        Ok(())
    }

    /// Zoom so the current page fills `container_width`
    pub fn fit_to_width(&mut self, container_width: f32) -> EditorResult<f32> {
        let page = self.loaded()?.current_page;
        let size = self.page_size(page)?;
        let width = if self.loaded()?.rotation.is_sideways() { size.y } else { size.x };
        let scale = fit_to_width(container_width, width, self.config.fit_padding);
        self.set_scale(scale)
    }

    /// Transform for the current page at the current zoom and rotation
    pub fn view_transform(&mut self, raw_pixel_ratio: f32) -> EditorResult<ViewTransform> {
        let page = self.loaded()?.current_page;
        let size = self.page_size(page)?;
        let document = self.loaded()?;
        Ok(ViewTransform::new(
            size,
            document.scale,
            document.rotation,
            clamp_pixel_ratio(raw_pixel_ratio, self.config.pixel_ratio_range),
        ))
    }

    /// Hand the original bytes and a flattened overlay to `writer`
    pub fn export(&self, writer: &dyn DocumentWriter, overlay: Option<&RgbaImage>) -> EditorResult<Vec<u8>> {
        let document = self.loaded().map_err(|_| EditorError::Export(ExportError::NoDocument))?;
        let bytes = writer.save(&document.bytes, overlay).inspect_err(|err| {
            log::error!("export: {}", err);
        })?;
        log::info!("Exported {} bytes", bytes.len());
        Ok(bytes)
    }
}
