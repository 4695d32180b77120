use std::sync::Arc;

use futures::channel::oneshot;

use super::rasterizer::Rasterizer;
use super::session::{PreparedDocument, prepare};
use crate::error::LoadError;

type LoadResult = Result<PreparedDocument, LoadError>;

/// Outcome of polling a [`PendingLoad`]
#[derive(Debug)]
pub enum LoadPoll {
    Pending,
    Ready(LoadResult),
    /// The worker went away without answering
    Lost,
}

/// A document load running off the UI thread, tagged with the session
/// generation it was requested under
#[derive(Debug)]
pub struct PendingLoad {
    receiver: oneshot::Receiver<LoadResult>,
    generation: u64,
    name: String,
}

impl PendingLoad {
    pub fn spawn(rasterizer: Arc<dyn Rasterizer>, bytes: Arc<[u8]>, generation: u64, name: &str) -> Self {
        let (sender, receiver) = oneshot::channel();
        let work = move || {
            let result = prepare(rasterizer.as_ref(), bytes);
            if sender.send(result).is_err() {
                log::debug!("Load finished after its ticket was dropped");
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        std::thread::spawn(work);

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(async move { work() });

        Self {
            receiver,
            generation,
            name: name.to_owned(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Non-blocking check, called once per frame
    pub fn poll(&mut self) -> LoadPoll {
        match self.receiver.try_recv() {
            Ok(Some(result)) => LoadPoll::Ready(result),
            Ok(None) => LoadPoll::Pending,
            Err(oneshot::Canceled) => LoadPoll::Lost,
        }
    }
}
