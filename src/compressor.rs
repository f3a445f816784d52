//! Decode, recompress and write images into the output directory.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;

use crate::codec::{extension_token, OutputFormat};
use crate::error::CompressError;
use crate::logging::{LogSwitch, LOG_TAG};
use crate::resolver::is_plain_file_name;

/// One recompression job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionRequest {
    pub source: PathBuf,
    /// File name for the output, without extension.
    pub base_name: String,
    pub quality: i32,
    /// Correlation id echoed back in the completion event.
    pub id: i32,
}

/// Makes freshly written files visible to other applications.
pub trait MediaIndex: Send + Sync {
    fn register(&self, path: &Path) -> io::Result<()>;
}

/// Media index for hosts without one; records the registration in the log.
#[derive(Debug, Default, Clone)]
pub struct TracingMediaIndex {
    log: LogSwitch,
}

impl TracingMediaIndex {
    pub fn new(log: LogSwitch) -> Self {
        Self { log }
    }
}

impl MediaIndex for TracingMediaIndex {
    fn register(&self, path: &Path) -> io::Result<()> {
        if self.log.enabled() {
            tracing::debug!(target: LOG_TAG, "Registered {} with media index", path.display());
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct ImageRecompressor {
    output_dir: PathBuf,
    media_index: Arc<dyn MediaIndex>,
    log: LogSwitch,
}

impl ImageRecompressor {
    pub fn new(output_dir: PathBuf, media_index: Arc<dyn MediaIndex>) -> Self {
        Self {
            output_dir,
            media_index,
            log: LogSwitch::default(),
        }
    }

    /// Gate this recompressor's diagnostics behind `log`.
    pub fn with_log_switch(mut self, log: LogSwitch) -> Self {
        self.log = log;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run one request to completion and return the written file's path.
    ///
    /// Nothing is written unless the image decodes and encodes successfully.
    pub fn recompress(&self, request: &CompressionRequest) -> Result<PathBuf, CompressError> {
        let quality = u8::try_from(request.quality)
            .ok()
            .filter(|q| *q <= 100)
            .ok_or(CompressError::InvalidQuality(request.quality))?;

        if !is_plain_file_name(&request.base_name) {
            return Err(CompressError::InvalidName(request.base_name.clone()));
        }

        let img = decode(&request.source)?;

        let token = extension_token(&request.source);
        let format = OutputFormat::from_extension(&token)
            .ok_or_else(|| CompressError::UnsupportedFormat(token.clone()))?;

        let data = format.encode(&img, quality)?;

        fs::create_dir_all(&self.output_dir).map_err(|source| CompressError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let output_path = write_unique(&self.output_dir, &request.base_name, &token, &data)?;
        let output_path = output_path.canonicalize().unwrap_or(output_path);

        if let Err(e) = self.media_index.register(&output_path) {
            if self.log.enabled() {
                tracing::warn!(
                    target: LOG_TAG,
                    "Failed to register {} with media index: {}",
                    output_path.display(),
                    e
                );
            }
        }

        Ok(output_path)
    }
}

fn decode(path: &Path) -> Result<DynamicImage, CompressError> {
    let img = image::io::Reader::open(path)?
        .with_guessed_format()?
        .decode()?;
    Ok(img)
}

/// Candidate file name for the `attempt`-th try: `base.ext`, then
/// `base_1.ext`, `base_2.ext`, ...
pub fn candidate_name(base_name: &str, extension: &str, attempt: u32) -> String {
    if attempt == 0 {
        format!("{}.{}", base_name, extension)
    } else {
        format!("{}_{}.{}", base_name, attempt, extension)
    }
}

/// Claim the first free candidate name in `dir` and write `data` into it.
///
/// The existence check and the create are one `create_new` open, so
/// concurrent writers never share a name. A failed write removes the
/// claimed file.
fn write_unique(
    dir: &Path,
    base_name: &str,
    extension: &str,
    data: &[u8],
) -> Result<PathBuf, CompressError> {
    let mut attempt = 0u32;
    let (path, mut file) = loop {
        let path = dir.join(candidate_name(base_name, extension, attempt));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => break (path, file),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(source) => return Err(CompressError::Write { path, source }),
        }
    };

    if let Err(source) = write_all(&mut file, data) {
        drop(file);
        let _ = fs::remove_file(&path);
        return Err(CompressError::Write { path, source });
    }

    Ok(path)
}

fn write_all(file: &mut File, data: &[u8]) -> io::Result<()> {
    file.write_all(data)?;
    file.sync_all()
}
