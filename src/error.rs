//! Error types for path resolution, recompression and configuration.

use std::path::PathBuf;

/// Why a content reference could not be turned into a local path.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The reference string was empty.
    #[error("Empty content reference")]
    Empty,

    /// The reference could not be parsed as a URI.
    #[error("Invalid content reference: {0}")]
    InvalidReference(String),

    /// No known provider handles this reference.
    #[error("Unsupported content reference: {0}")]
    UnsupportedReference(String),

    /// The provider needs a document id but the reference carries none.
    #[error("Content reference has no document id: {0}")]
    MissingDocumentId(String),

    /// The document id lacks the `<type>:<value>` separator.
    #[error("Malformed document id: {0}")]
    MalformedDocumentId(String),

    /// No external storage root matches the requested volume.
    #[error("Unknown storage volume: {0}")]
    UnknownVolume(String),

    /// A downloads document id is neither `raw:` nor a row number.
    #[error("Invalid row id: {0}")]
    InvalidRowId(String),

    /// A media document names a collection other than image, video or audio.
    #[error("Unknown media type: {0}")]
    UnknownMediaType(String),

    /// The provider answered but had no matching row or value.
    #[error("No provider entry for {0}")]
    NotFound(String),

    /// The provider reported a display name unusable as a cache file name.
    #[error("Invalid display name: {0}")]
    InvalidDisplayName(String),

    /// The provider query itself failed.
    #[error("Provider query failed: {0}")]
    Provider(#[source] std::io::Error),

    /// Copying provider bytes into the cache failed.
    #[error("Failed to copy content to {}: {source}", .path.display())]
    CacheCopy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why an image could not be recompressed.
#[derive(Debug, thiserror::Error)]
pub enum CompressError {
    /// Quality outside `0..=100`.
    #[error("Quality must be between 0 and 100, got {0}")]
    InvalidQuality(i32),

    /// The output base name is empty or is not a single file-name component.
    #[error("Invalid output name: {0:?}")]
    InvalidName(String),

    /// The source file could not be opened or read.
    #[error("Failed to read source image: {0}")]
    Io(#[from] std::io::Error),

    /// The source bytes could not be decoded.
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The source extension does not map to an output codec.
    #[error("Unsupported file format: {0:?}")]
    UnsupportedFormat(String),

    /// The codec rejected the pixel buffer.
    #[error("Failed to encode image: {0}")]
    Encode(String),

    /// The output directory could not be created.
    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output file could not be created or written.
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a configuration file could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
