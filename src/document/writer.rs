use std::io::Cursor;

use image::{ImageFormat, RgbaImage};

use crate::error::ExportError;

/// Produces the saved document from the original bytes and a flattened overlay
pub trait DocumentWriter {
    /// `overlay` is the current page with every visible annotation painted on
    fn save(&self, original: &[u8], overlay: Option<&RgbaImage>) -> Result<Vec<u8>, ExportError>;

    /// File extension of the output, used to name downloads
    fn extension(&self) -> &'static str;
}

/// Writes the flattened page as a PNG image
#[derive(Debug, Clone, Default)]
pub struct FlattenedPngWriter;

impl DocumentWriter for FlattenedPngWriter {
    fn save(&self, _original: &[u8], overlay: Option<&RgbaImage>) -> Result<Vec<u8>, ExportError> {
        let overlay = overlay.ok_or_else(|| ExportError::Writer("nothing to flatten".to_owned()))?;
        let mut out = Cursor::new(Vec::new());
        overlay
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|err| ExportError::Encode(err.to_string()))?;
        log::info!(
            "Flattened {}x{} page into {} bytes of PNG",
            overlay.width(),
            overlay.height(),
            out.get_ref().len()
        );
        Ok(out.into_inner())
    }

    fn extension(&self) -> &'static str {
        "png"
    }
}
