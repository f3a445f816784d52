//! Resolution of content references to local file-system paths.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::config::StorageLayout;
use crate::error::ResolveError;
use crate::provider::{
    ContentProvider, ProviderKind, RowFilter, AUDIO_COLLECTION_URI, DATA_COLUMN,
    DISPLAY_NAME_COLUMN, IMAGES_COLLECTION_URI, PUBLIC_DOWNLOADS_URI, VIDEO_COLLECTION_URI,
};
use crate::uri::{split_document_id, ContentReference};

/// Transfer buffer used when copying provider content into the cache.
const COPY_BUFFER_SIZE: usize = 1024;

const PRIMARY_VOLUME: &str = "primary";
const RAW_PREFIX: &str = "raw:";
const ANDROID_SEGMENT: &str = "/Android";

/// Maps content references to local paths.
///
/// Never logs: every failure comes back as a [`ResolveError`] and the caller
/// decides what to report.
#[derive(Clone)]
pub struct PathResolver {
    provider: Arc<dyn ContentProvider>,
    layout: StorageLayout,
}

impl PathResolver {
    pub fn new(provider: Arc<dyn ContentProvider>, layout: StorageLayout) -> Self {
        Self { provider, layout }
    }

    pub fn resolve(&self, reference: &str) -> Result<PathBuf, ResolveError> {
        let reference = ContentReference::parse(reference)?;

        match ProviderKind::classify(&reference) {
            ProviderKind::RawFile => Ok(PathBuf::from(reference.path())),
            ProviderKind::ExternalStorageDocument => self.external_storage_path(&reference),
            ProviderKind::DownloadsDocument => self.downloads_path(&reference),
            ProviderKind::MediaDocument => self.media_path(&reference),
            ProviderKind::GooglePhotos | ProviderKind::GoogleDrive | ProviderKind::MediaPicker => {
                self.copy_to_cache(&reference)
            }
            ProviderKind::Unknown => Err(ResolveError::UnsupportedReference(
                reference.as_str().to_string(),
            )),
        }
    }

    fn external_storage_path(&self, reference: &ContentReference) -> Result<PathBuf, ResolveError> {
        let doc_id = document_id(reference)?;
        let (volume, relative) = split_document_id(&doc_id)?;

        if volume.eq_ignore_ascii_case(PRIMARY_VOLUME) {
            return Ok(join_path(&self.layout.external_storage_root.to_string_lossy(), relative));
        }

        self.layout
            .external_cache_dirs
            .iter()
            .map(|dir| dir.to_string_lossy())
            .find(|dir| dir.contains(volume))
            .map(|dir| {
                let root = dir.split(ANDROID_SEGMENT).next().unwrap_or_default();
                join_path(root, relative)
            })
            .ok_or_else(|| ResolveError::UnknownVolume(volume.to_string()))
    }

    fn downloads_path(&self, reference: &ContentReference) -> Result<PathBuf, ResolveError> {
        let doc_id = document_id(reference)?;

        if let Some(raw) = doc_id.strip_prefix(RAW_PREFIX) {
            return Ok(PathBuf::from(raw));
        }

        let row: i64 = doc_id
            .parse()
            .map_err(|_| ResolveError::InvalidRowId(doc_id.clone()))?;
        let uri = format!("{}/{}", PUBLIC_DOWNLOADS_URI, row);
        self.data_column(&uri, None)
    }

    fn media_path(&self, reference: &ContentReference) -> Result<PathBuf, ResolveError> {
        let doc_id = document_id(reference)?;
        let (media_type, row) = split_document_id(&doc_id)?;

        let collection = match media_type {
            "image" => IMAGES_COLLECTION_URI,
            "video" => VIDEO_COLLECTION_URI,
            "audio" => AUDIO_COLLECTION_URI,
            other => return Err(ResolveError::UnknownMediaType(other.to_string())),
        };

        self.data_column(collection, Some(&RowFilter::by_id(row)))
    }

    fn data_column(&self, uri: &str, filter: Option<&RowFilter>) -> Result<PathBuf, ResolveError> {
        self.provider
            .query_column(uri, DATA_COLUMN, filter)
            .map_err(ResolveError::Provider)?
            .map(PathBuf::from)
            .ok_or_else(|| match filter {
                Some(filter) => ResolveError::NotFound(format!("{}/{}", uri, filter.value)),
                None => ResolveError::NotFound(uri.to_string()),
            })
    }

    /// Copy the referenced bytes into the cache under the provider's display
    /// name. An interrupted copy leaves the partial file in place.
    fn copy_to_cache(&self, reference: &ContentReference) -> Result<PathBuf, ResolveError> {
        let uri = reference.as_str();
        let display_name = self
            .provider
            .query_column(uri, DISPLAY_NAME_COLUMN, None)
            .map_err(ResolveError::Provider)?
            .ok_or_else(|| ResolveError::NotFound(uri.to_string()))?;

        if !is_plain_file_name(&display_name) {
            return Err(ResolveError::InvalidDisplayName(display_name));
        }

        let target = self.layout.cache_dir.join(&display_name);
        let copy = || -> io::Result<()> {
            let mut input = self.provider.open_stream(uri)?;
            std::fs::create_dir_all(&self.layout.cache_dir)?;
            let mut output = File::create(&target)?;
            copy_stream(&mut input, &mut output)
        };
        copy().map_err(|source| ResolveError::CacheCopy {
            path: target.clone(),
            source,
        })?;

        Ok(target)
    }
}

fn document_id(reference: &ContentReference) -> Result<String, ResolveError> {
    reference
        .document_id()
        .ok_or_else(|| ResolveError::MissingDocumentId(reference.as_str().to_string()))
}

fn join_path(root: &str, relative: &str) -> PathBuf {
    PathBuf::from(format!("{}/{}", root.trim_end_matches('/'), relative))
}

/// True when `name` is exactly one normal path component.
pub(crate) fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn copy_stream(input: &mut dyn Read, output: &mut dyn Write) -> io::Result<()> {
    let mut buffer = [0u8; COPY_BUFFER_SIZE];
    loop {
        let read = match input.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        output.write_all(&buffer[..read])?;
    }
    output.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MemoryProvider;

    const PHOTOS_URI: &str =
        "content://com.google.android.apps.photos.contentprovider/-1/1/content%3A%2F%2Fmedia/ORIGINAL/NONE/123";
    const DRIVE_URI: &str = "content://com.google.android.apps.docs.storage/document/acc%3D1%3Bdoc%3Dencoded";
    const PICKER_URI: &str =
        "content://media/picker/0/com.android.providers.media.photopicker/media/1000000034";

    fn layout(cache_dir: &Path) -> StorageLayout {
        StorageLayout {
            external_storage_root: PathBuf::from("/storage/emulated/0"),
            external_cache_dirs: vec![
                PathBuf::from("/storage/emulated/0/Android/data/com.example/cache"),
                PathBuf::from("/storage/1A2B-3C4D/Android/data/com.example/cache"),
            ],
            cache_dir: cache_dir.to_path_buf(),
            pictures_dir: PathBuf::from("/storage/emulated/0/Pictures"),
        }
    }

    fn resolver(provider: MemoryProvider) -> (PathResolver, Arc<MemoryProvider>) {
        let provider = Arc::new(provider);
        let resolver = PathResolver::new(provider.clone(), layout(Path::new("/tmp/unused-cache")));
        (resolver, provider)
    }

    #[test]
    fn test_file_scheme_returns_path_unchanged() {
        let (resolver, provider) = resolver(MemoryProvider::new());
        for path in ["/sdcard/a.jpg", "/data/x/y z.png", "/"] {
            let uri = url::Url::from_file_path(path).unwrap();
            assert_eq!(resolver.resolve(uri.as_str()).unwrap(), PathBuf::from(path));
        }
        assert!(provider.queries().is_empty());
    }

    #[test]
    fn test_primary_external_storage() {
        let (resolver, _) = resolver(MemoryProvider::new());
        let path = resolver
            .resolve("content://com.android.externalstorage.documents/document/primary%3APictures%2Fx.jpg")
            .unwrap();
        assert_eq!(path, PathBuf::from("/storage/emulated/0/Pictures/x.jpg"));
    }

    #[test]
    fn test_secondary_volume_uses_matching_cache_root() {
        let (resolver, _) = resolver(MemoryProvider::new());
        let path = resolver
            .resolve("content://com.android.externalstorage.documents/document/1A2B-3C4D%3ADCIM%2Fb.png")
            .unwrap();
        assert_eq!(path, PathBuf::from("/storage/1A2B-3C4D/DCIM/b.png"));
    }

    #[test]
    fn test_unknown_volume() {
        let (resolver, _) = resolver(MemoryProvider::new());
        let err = resolver
            .resolve("content://com.android.externalstorage.documents/document/FFFF-0000%3Ab.png")
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnknownVolume(v) if v == "FFFF-0000"));
    }

    #[test]
    fn test_malformed_document_ids_are_errors() {
        let (resolver, _) = resolver(MemoryProvider::new());
        let ext = resolver
            .resolve("content://com.android.externalstorage.documents/document/primary")
            .unwrap_err();
        let media = resolver
            .resolve("content://com.android.providers.media.documents/document/image42")
            .unwrap_err();
        assert!(matches!(ext, ResolveError::MalformedDocumentId(_)));
        assert!(matches!(media, ResolveError::MalformedDocumentId(_)));
    }

    #[test]
    fn test_missing_document_id() {
        let (resolver, _) = resolver(MemoryProvider::new());
        let err = resolver
            .resolve("content://com.android.providers.downloads.documents/root/downloads")
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingDocumentId(_)));
    }

    #[test]
    fn test_raw_download_skips_provider() {
        let (resolver, provider) = resolver(MemoryProvider::new());
        let path = resolver
            .resolve("content://com.android.providers.downloads.documents/document/raw%3A%2Ffoo%2Fbar.png")
            .unwrap();
        assert_eq!(path, PathBuf::from("/foo/bar.png"));
        assert!(provider.queries().is_empty());
    }

    #[test]
    fn test_numeric_download_queries_public_downloads() {
        let (resolver, provider) = resolver(MemoryProvider::new().with_column(
            "content://downloads/public_downloads/17",
            DATA_COLUMN,
            "/storage/emulated/0/Download/report.jpg",
        ));
        let path = resolver
            .resolve("content://com.android.providers.downloads.documents/document/17")
            .unwrap();
        assert_eq!(path, PathBuf::from("/storage/emulated/0/Download/report.jpg"));
        assert_eq!(provider.queries()[0].uri, "content://downloads/public_downloads/17");
    }

    #[test]
    fn test_non_numeric_download_id() {
        let (resolver, _) = resolver(MemoryProvider::new());
        let err = resolver
            .resolve("content://com.android.providers.downloads.documents/document/msf%3A99")
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidRowId(id) if id == "msf:99"));
    }

    #[test]
    fn test_media_document_queries_image_collection() {
        let (resolver, provider) = resolver(MemoryProvider::new().with_column(
            "content://media/external/images/media/42",
            DATA_COLUMN,
            "/storage/emulated/0/DCIM/Camera/IMG_42.jpg",
        ));
        let path = resolver
            .resolve("content://com.android.providers.media.documents/document/image%3A42")
            .unwrap();
        assert_eq!(path, PathBuf::from("/storage/emulated/0/DCIM/Camera/IMG_42.jpg"));

        let queries = provider.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].uri, IMAGES_COLLECTION_URI);
        assert_eq!(queries[0].column, DATA_COLUMN);
        assert_eq!(queries[0].filter, Some(RowFilter::by_id("42")));
    }

    #[test]
    fn test_media_document_missing_row() {
        let (resolver, _) = resolver(MemoryProvider::new());
        let err = resolver
            .resolve("content://com.android.providers.media.documents/document/video%3A42")
            .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(_)));
    }

    #[test]
    fn test_unknown_media_type() {
        let (resolver, provider) = resolver(MemoryProvider::new());
        let err = resolver
            .resolve("content://com.android.providers.media.documents/document/document%3A3")
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnknownMediaType(t) if t == "document"));
        assert!(provider.queries().is_empty());
    }

    #[test]
    fn test_provider_failure_is_reported() {
        let (resolver, _) = resolver(MemoryProvider::failing());
        let err = resolver
            .resolve("content://com.android.providers.media.documents/document/audio%3A1")
            .unwrap_err();
        assert!(matches!(err, ResolveError::Provider(_)));
    }

    #[test]
    fn test_cloud_providers_copy_into_cache() {
        let cache = tempfile::tempdir().unwrap();
        let content: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();

        for (uri, name) in [
            (PHOTOS_URI, "photo.jpg"),
            (DRIVE_URI, "scan.png"),
            (PICKER_URI, "picked.webp"),
        ] {
            let provider = MemoryProvider::new()
                .with_column(uri, DISPLAY_NAME_COLUMN, name)
                .with_content(uri, content.clone());
            let resolver = PathResolver::new(Arc::new(provider), layout(cache.path()));

            let path = resolver.resolve(uri).unwrap();
            assert_eq!(path, cache.path().join(name));
            assert_eq!(std::fs::read(&path).unwrap(), content);
        }
    }

    #[test]
    fn test_cloud_provider_without_display_name() {
        let cache = tempfile::tempdir().unwrap();
        let provider = MemoryProvider::new().with_content(PICKER_URI, b"bytes".to_vec());
        let resolver = PathResolver::new(Arc::new(provider), layout(cache.path()));

        let err = resolver.resolve(PICKER_URI).unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(_)));
        assert_eq!(std::fs::read_dir(cache.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_cloud_provider_rejects_path_like_display_name() {
        let cache = tempfile::tempdir().unwrap();
        let provider = MemoryProvider::new()
            .with_column(DRIVE_URI, DISPLAY_NAME_COLUMN, "../escape.jpg")
            .with_content(DRIVE_URI, b"bytes".to_vec());
        let resolver = PathResolver::new(Arc::new(provider), layout(cache.path()));

        let err = resolver.resolve(DRIVE_URI).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidDisplayName(_)));
    }

    #[test]
    fn test_cloud_stream_failure_is_cache_copy_error() {
        let cache = tempfile::tempdir().unwrap();
        let provider = MemoryProvider::new().with_column(PHOTOS_URI, DISPLAY_NAME_COLUMN, "p.jpg");
        let resolver = PathResolver::new(Arc::new(provider), layout(cache.path()));

        let err = resolver.resolve(PHOTOS_URI).unwrap_err();
        assert!(matches!(err, ResolveError::CacheCopy { .. }));
    }

    #[test]
    fn test_unknown_references_are_absent() {
        let (resolver, _) = resolver(MemoryProvider::new());
        assert!(matches!(resolver.resolve(""), Err(ResolveError::Empty)));
        assert!(matches!(
            resolver.resolve("content:///document/1"),
            Err(ResolveError::UnsupportedReference(_))
        ));
        assert!(matches!(
            resolver.resolve("ftp://host/a.jpg"),
            Err(ResolveError::UnsupportedReference(_))
        ));
    }

    #[test]
    fn test_copy_stream_handles_partial_buffers() {
        let data = vec![7u8; COPY_BUFFER_SIZE * 3 + 17];
        let mut out = Vec::new();
        copy_stream(&mut io::Cursor::new(data.clone()), &mut out).unwrap();
        assert_eq!(out, data);
    }
}
