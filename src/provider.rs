//! Content providers: classification of references and the query interface.

use std::collections::HashMap;
use std::io::{self, Read};
use std::sync::Mutex;

use crate::uri::{ContentReference, SCHEME_CONTENT, SCHEME_FILE};

pub const EXTERNAL_STORAGE_AUTHORITY: &str = "com.android.externalstorage.documents";
pub const DOWNLOADS_AUTHORITY: &str = "com.android.providers.downloads.documents";
pub const MEDIA_AUTHORITY: &str = "com.android.providers.media.documents";
pub const GOOGLE_DRIVE_AUTHORITY: &str = "com.google.android.apps.docs.storage";
pub const GOOGLE_PHOTOS_PREFIX: &str = "content://com.google.android.apps.photos.contentprovider/";
pub const MEDIA_PICKER_PREFIX: &str = "content://media/picker/";

pub const PUBLIC_DOWNLOADS_URI: &str = "content://downloads/public_downloads";
pub const IMAGES_COLLECTION_URI: &str = "content://media/external/images/media";
pub const VIDEO_COLLECTION_URI: &str = "content://media/external/video/media";
pub const AUDIO_COLLECTION_URI: &str = "content://media/external/audio/media";

/// Column holding a row's file-system path.
pub const DATA_COLUMN: &str = "_data";
/// Column holding a document's user-visible file name.
pub const DISPLAY_NAME_COLUMN: &str = "_display_name";
/// Row id column used in collection selections.
pub const ID_COLUMN: &str = "_id";

/// The provider owning a content reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    ExternalStorageDocument,
    DownloadsDocument,
    MediaDocument,
    GooglePhotos,
    GoogleDrive,
    MediaPicker,
    RawFile,
    Unknown,
}

impl ProviderKind {
    /// Classify a reference from its scheme, authority and literal prefix.
    pub fn classify(reference: &ContentReference) -> Self {
        match reference.scheme() {
            SCHEME_FILE => Self::RawFile,
            SCHEME_CONTENT => match reference.authority() {
                Some(EXTERNAL_STORAGE_AUTHORITY) => Self::ExternalStorageDocument,
                Some(DOWNLOADS_AUTHORITY) => Self::DownloadsDocument,
                Some(MEDIA_AUTHORITY) => Self::MediaDocument,
                _ if reference.as_str().starts_with(GOOGLE_PHOTOS_PREFIX) => Self::GooglePhotos,
                Some(GOOGLE_DRIVE_AUTHORITY) => Self::GoogleDrive,
                _ if reference.as_str().starts_with(MEDIA_PICKER_PREFIX) => Self::MediaPicker,
                _ => Self::Unknown,
            },
            _ => Self::Unknown,
        }
    }
}

/// `<column> = <value>` selection applied to a collection query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFilter {
    pub column: String,
    pub value: String,
}

impl RowFilter {
    pub fn by_id(id: &str) -> Self {
        Self {
            column: ID_COLUMN.to_string(),
            value: id.to_string(),
        }
    }
}

/// Host storage-provider interface.
///
/// A query that finds no row returns `Ok(None)`; `Err` is reserved for
/// failures of the provider itself.
pub trait ContentProvider: Send + Sync {
    /// Read one column from the first row matching `uri` and `filter`.
    fn query_column(
        &self,
        uri: &str,
        column: &str,
        filter: Option<&RowFilter>,
    ) -> io::Result<Option<String>>;

    /// Open the raw byte stream behind `uri`.
    fn open_stream(&self, uri: &str) -> io::Result<Box<dyn Read + Send>>;
}

/// A query issued against a [`MemoryProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedQuery {
    pub uri: String,
    pub column: String,
    pub filter: Option<RowFilter>,
}

#[derive(Debug, Default)]
struct MemoryRow {
    columns: HashMap<String, String>,
    content: Option<Vec<u8>>,
}

/// In-memory provider.
///
/// Rows are keyed by URI. A filtered query searches the rows stored directly
/// under `<uri>/`: an `_id` filter matches the trailing key segment, any other
/// column is compared against the row's stored value. Every query is recorded.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    rows: HashMap<String, MemoryRow>,
    queries: Mutex<Vec<RecordedQuery>>,
    failing: bool,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose every query and stream fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_column(mut self, uri: &str, column: &str, value: &str) -> Self {
        self.rows
            .entry(uri.to_string())
            .or_default()
            .columns
            .insert(column.to_string(), value.to_string());
        self
    }

    pub fn with_content(mut self, uri: &str, content: impl Into<Vec<u8>>) -> Self {
        self.rows.entry(uri.to_string()).or_default().content = Some(content.into());
        self
    }

    /// Queries issued so far, oldest first.
    pub fn queries(&self) -> Vec<RecordedQuery> {
        self.queries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn unavailable(uri: &str) -> io::Error {
        io::Error::new(io::ErrorKind::Other, format!("provider unavailable: {}", uri))
    }
}

impl ContentProvider for MemoryProvider {
    fn query_column(
        &self,
        uri: &str,
        column: &str,
        filter: Option<&RowFilter>,
    ) -> io::Result<Option<String>> {
        self.queries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedQuery {
                uri: uri.to_string(),
                column: column.to_string(),
                filter: filter.cloned(),
            });

        if self.failing {
            return Err(Self::unavailable(uri));
        }

        let row = match filter {
            Some(filter) => self
                .rows
                .iter()
                .filter(|(key, row)| row_matches(key, row, uri, filter))
                .min_by(|(a, _), (b, _)| a.cmp(b))
                .map(|(_, row)| row),
            None => self.rows.get(uri),
        };
        Ok(row.and_then(|row| row.columns.get(column)).cloned())
    }

    fn open_stream(&self, uri: &str) -> io::Result<Box<dyn Read + Send>> {
        if self.failing {
            return Err(Self::unavailable(uri));
        }
        match self.rows.get(uri).and_then(|row| row.content.clone()) {
            Some(bytes) => Ok(Box::new(io::Cursor::new(bytes))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no content for {}", uri),
            )),
        }
    }
}

fn row_matches(key: &str, row: &MemoryRow, uri: &str, filter: &RowFilter) -> bool {
    let Some(id) = key.strip_prefix(uri).and_then(|rest| rest.strip_prefix('/')) else {
        return false;
    };
    if id.is_empty() || id.contains('/') {
        return false;
    }
    if filter.column == ID_COLUMN {
        id == filter.value
    } else {
        row.columns.get(&filter.column) == Some(&filter.value)
    }
}
