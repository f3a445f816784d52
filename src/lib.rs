//! Content-reference resolution and image recompression.
//!
//! [`PathResolver`] turns `content://` and `file://` references into local
//! paths, querying a [`ContentProvider`] or copying provider bytes into a
//! cache. [`ImageRecompressor`] re-encodes an image as JPEG, PNG or WebP into
//! an output directory without ever overwriting an existing file.
//! [`ImageCompressor`] ties both together behind an event channel.

pub mod codec;
pub mod component;
pub mod compressor;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod provider;
pub mod resolver;
pub mod uri;

pub use codec::OutputFormat;
pub use component::{ImageCompressor, PickerResult};
pub use compressor::{CompressionRequest, ImageRecompressor, MediaIndex, TracingMediaIndex};
pub use config::{Config, StorageLayout};
pub use error::{CompressError, ConfigError, ResolveError};
pub use events::{Event, EventReceiver, EventSender};
pub use logging::{LogSwitch, LOG_TAG};
pub use provider::{ContentProvider, MemoryProvider, ProviderKind, RowFilter};
pub use resolver::PathResolver;
pub use uri::ContentReference;
