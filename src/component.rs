//! The image compressor component as seen by its host.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::compressor::{CompressionRequest, ImageRecompressor, MediaIndex, TracingMediaIndex};
use crate::config::Config;
use crate::events::{self, Event, EventReceiver, EventSender};
use crate::logging::{LogSwitch, LOG_TAG};
use crate::provider::ContentProvider;
use crate::resolver::PathResolver;

/// Outcome of an external picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerResult {
    /// The user picked something; carries its content reference.
    Selected(String),
    Cancelled,
}

/// Resolves content references and recompresses images, reporting results as
/// [`Event`]s on the channel returned by [`ImageCompressor::new`].
///
/// Cheap to clone; clones share the log switch and the event channel.
#[derive(Clone)]
pub struct ImageCompressor {
    resolver: PathResolver,
    recompressor: ImageRecompressor,
    log: LogSwitch,
    events: EventSender,
}

impl ImageCompressor {
    pub fn new(config: &Config, provider: Arc<dyn ContentProvider>) -> (Self, EventReceiver) {
        let (events, receiver) = events::channel();
        let log = LogSwitch::new(config.log_enabled);
        let media_index = Arc::new(TracingMediaIndex::new(log.clone()));
        let recompressor =
            ImageRecompressor::new(config.output_dir(), media_index).with_log_switch(log.clone());

        let component = Self {
            resolver: PathResolver::new(provider, config.storage.clone()),
            recompressor,
            log,
            events,
        };
        (component, receiver)
    }

    /// Replace the media index new outputs are registered with.
    pub fn with_media_index(mut self, media_index: Arc<dyn MediaIndex>) -> Self {
        self.recompressor =
            ImageRecompressor::new(self.recompressor.output_dir().to_path_buf(), media_index)
                .with_log_switch(self.log.clone());
        self
    }

    pub fn set_log_enabled(&self, enabled: bool) {
        self.log.set(enabled);
    }

    pub fn log_enabled(&self) -> bool {
        self.log.enabled()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.recompressor.output_dir().to_path_buf()
    }

    /// Resolve a content reference to a local path, or `""` when it cannot be.
    pub fn path_from_uri(&self, uri: &str) -> String {
        if self.log.enabled() {
            tracing::debug!(target: LOG_TAG, "Converting URI to path: {}", uri);
        }
        if uri.is_empty() {
            return String::new();
        }

        match self.resolver.resolve(uri) {
            Ok(path) => path.to_string_lossy().into_owned(),
            Err(e) => {
                if self.log.enabled() {
                    tracing::error!(target: LOG_TAG, "Error converting URI to path: {}", e);
                }
                String::new()
            }
        }
    }

    /// Recompress `image_path` in the background.
    ///
    /// Exactly one event follows: `Saved` with `id` on success, `Error`
    /// otherwise. Requests cannot be cancelled once started.
    pub fn compress_image(
        &self,
        image_path: &str,
        image_name: &str,
        quality: i32,
        id: i32,
    ) -> JoinHandle<()> {
        if self.log.enabled() {
            tracing::debug!(target: LOG_TAG, "Starting image compression: {}", image_path);
        }

        let request = CompressionRequest {
            source: PathBuf::from(image_path),
            base_name: image_name.to_string(),
            quality,
            id,
        };
        let component = self.clone();

        tokio::task::spawn_blocking(move || {
            let event = match component.recompressor.recompress(&request) {
                Ok(path) => {
                    let path = path.to_string_lossy().into_owned();
                    if component.log.enabled() {
                        tracing::info!(target: LOG_TAG, "Image compressed and saved: {}", path);
                    }
                    Event::Saved {
                        id: request.id,
                        path,
                    }
                }
                Err(e) => {
                    if component.log.enabled() {
                        tracing::error!(
                            target: LOG_TAG,
                            "Error compressing and saving image: {}",
                            e
                        );
                    }
                    Event::Error {
                        message: e.to_string(),
                    }
                }
            };
            component.emit(event);
        })
    }

    /// Deliver the result of an external picker as a `Selected` event.
    pub fn picker_result(&self, result: PickerResult) {
        if let PickerResult::Selected(uri) = result {
            let path = self.path_from_uri(&uri);
            self.emit(Event::Selected { path });
        }
    }

    fn emit(&self, event: Event) {
        if self.events.send(event).is_err() && self.log.enabled() {
            tracing::warn!(target: LOG_TAG, "Event receiver dropped");
        }
    }
}
