//! Open and save dialogs.
//!
//! Picking is asynchronous on the web, so both targets hand the chosen file
//! over through a shared slot that the app drains each frame.

use std::sync::Arc;

use parking_lot::Mutex;

/// What the open dialog is asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickKind {
    Pdf,
    Image,
}

impl PickKind {
    fn filter(self) -> (&'static str, &'static [&'static str]) {
        match self {
            PickKind::Pdf => ("PDF", &["pdf"]),
            PickKind::Image => ("Image", &["png", "jpg", "jpeg", "gif", "webp", "bmp"]),
        }
    }
}

/// A file the user chose in the open dialog
#[derive(Debug, Clone)]
pub struct PickedFile {
    pub kind: PickKind,
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct FilePicker {
    picked: Arc<Mutex<Option<PickedFile>>>,
}

impl FilePicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the file picked since the last call
    pub fn take(&self) -> Option<PickedFile> {
        self.picked.lock().take()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn open(&self, kind: PickKind) {
        let (filter, extensions) = kind.filter();
        let Some(path) = rfd::FileDialog::new()
            .set_title(format!("Open {filter}"))
            .add_filter(filter, extensions)
            .pick_file()
        else {
            return;
        };
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        match std::fs::read(&path) {
            Ok(bytes) => {
                log::info!("Picked {} ({} bytes)", path.display(), bytes.len());
                *self.picked.lock() = Some(PickedFile { kind, name, bytes });
            }
            Err(err) => log::error!("Failed to read {}: {}", path.display(), err),
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn open(&self, kind: PickKind) {
        let picked = Arc::clone(&self.picked);
        wasm_bindgen_futures::spawn_local(async move {
            let (filter, extensions) = kind.filter();
            let Some(file) = rfd::AsyncFileDialog::new()
                .add_filter(filter, extensions)
                .pick_file()
                .await
            else {
                return;
            };
            let name = file.file_name();
            let bytes = file.read().await;
            log::info!("Picked {} ({} bytes)", name, bytes.len());
            *picked.lock() = Some(PickedFile { kind, name, bytes });
        });
    }
}

/// Name for the flattened export of `document_name`
pub fn export_file_name(document_name: &str, page: u32, extension: &str) -> String {
    let stem = document_name
        .rsplit_once('.')
        .map_or(document_name, |(stem, _)| stem);
    let stem = if stem.is_empty() { "document" } else { stem };
    format!("{stem}-page{page}-annotated.{extension}")
}

/// Ask where to save `bytes`. Returns false if the user cancelled.
#[cfg(not(target_arch = "wasm32"))]
pub fn save_export(file_name: &str, bytes: &[u8]) -> std::io::Result<bool> {
    let extension = file_name.rsplit_once('.').map_or("png", |(_, ext)| ext);
    let Some(path) = rfd::FileDialog::new()
        .set_title("Export")
        .set_file_name(file_name)
        .add_filter(extension.to_uppercase(), &[extension])
        .save_file()
    else {
        return Ok(false);
    };
    std::fs::write(&path, bytes)?;
    log::info!("Exported to {}", path.display());
    Ok(true)
}

/// How long a download's object URL outlives the click that starts it
#[cfg(target_arch = "wasm32")]
const REVOKE_DELAY_MS: i32 = 10_000;

/// Trigger a browser download of `bytes`
#[cfg(target_arch = "wasm32")]
pub fn save_export(file_name: &str, bytes: &[u8]) -> std::io::Result<bool> {
    use web_sys::wasm_bindgen::JsCast;
    use web_sys::wasm_bindgen::closure::Closure;
    use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url, js_sys};

    let failed = |what: &str| std::io::Error::other(format!("download failed: {what}"));

    let array = js_sys::Array::new();
    array.push(&js_sys::Uint8Array::from(bytes));
    let options = BlobPropertyBag::new();
    options.set_type("application/octet-stream");
    let blob = Blob::new_with_u8_array_sequence_and_options(&array, &options).map_err(|_| failed("blob"))?;
    let href = Url::create_object_url_with_blob(&blob).map_err(|_| failed("object url"))?;

    let window = web_sys::window().ok_or_else(|| failed("no window"))?;
    let document = window.document().ok_or_else(|| failed("no document"))?;
    let anchor = document
        .create_element("a")
        .ok()
        .and_then(|element| element.dyn_into::<HtmlAnchorElement>().ok())
        .ok_or_else(|| failed("anchor"))?;
    anchor.set_href(&href);
    anchor.set_download(file_name);
    anchor.click();

    // The download reads the object URL asynchronously; release it later
    let revoke = Closure::once_into_js(move || {
        if let Err(err) = Url::revoke_object_url(&href) {
            log::warn!("Failed to revoke download URL: {:?}", err);
        }
    });
    if let Err(err) =
        window.set_timeout_with_callback_and_timeout_and_arguments_0(revoke.unchecked_ref(), REVOKE_DELAY_MS)
    {
        log::warn!("Failed to schedule download URL release: {:?}", err);
    }
    log::info!("Downloaded {}", file_name);
    Ok(true)
}
