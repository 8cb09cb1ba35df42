// Camera capture seam and the file-based adapter used on the command line

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// JPEG compression quality in `(0.0, 1.0]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureQuality(f32);

impl CaptureQuality {
    pub fn new(quality: f32) -> Result<Self, CameraError> {
        if quality > 0.0 && quality <= 1.0 {
            Ok(Self(quality))
        } else {
            Err(CameraError::InvalidQuality(quality))
        }
    }

    pub fn value(&self) -> f32 {
        self.0
    }

    /// Quality on the 1..=100 scale JPEG encoders use
    pub fn jpeg_quality(&self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for CaptureQuality {
    fn default() -> Self {
        Self(0.6)
    }
}

/// A captured photo: where it lives on the device plus the encoded bytes to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub local_uri: String,
    pub jpeg: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("capture quality must be within (0, 1], got {0}")]
    InvalidQuality(f32),
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode photo: {0}")]
    Encode(#[from] image::ImageError),
}

/// Device camera capability
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait Camera: Send + Sync {
    async fn request_permission(&self) -> PermissionStatus;

    /// Take one photo. `Ok(None)` means the user backed out.
    async fn capture(&self, quality: CaptureQuality) -> Result<Option<CapturedImage>, CameraError>;
}

/// Re-encode any supported image as JPEG at the given quality
pub fn encode_jpeg(raw: &[u8], quality: CaptureQuality) -> Result<Vec<u8>, CameraError> {
    let decoded = image::load_from_memory(raw)?;
    let rgb = image::DynamicImage::ImageRgb8(decoded.to_rgb8());
    let mut out = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality.jpeg_quality());
    rgb.write_with_encoder(encoder)?;
    Ok(out)
}

/// Camera backed by image files on disk.
///
/// The next "shot" is loaded with [`FileCamera::load`]; capturing with nothing
/// loaded behaves like a cancelled capture.
#[derive(Debug)]
pub struct FileCamera {
    permission: PermissionStatus,
    pending: Mutex<Option<PathBuf>>,
}

impl FileCamera {
    pub fn new() -> Self {
        Self {
            permission: PermissionStatus::Granted,
            pending: Mutex::new(None),
        }
    }

    pub fn with_permission(mut self, permission: PermissionStatus) -> Self {
        self.permission = permission;
        self
    }

    pub fn load(&self, path: impl AsRef<Path>) {
        if let Ok(mut pending) = self.pending.lock() {
            *pending = Some(path.as_ref().to_path_buf());
        }
    }

    fn take_pending(&self) -> Option<PathBuf> {
        self.pending.lock().ok().and_then(|mut pending| pending.take())
    }
}

impl Default for FileCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Camera for FileCamera {
    async fn request_permission(&self) -> PermissionStatus {
        self.permission
    }

    async fn capture(&self, quality: CaptureQuality) -> Result<Option<CapturedImage>, CameraError> {
        let Some(path) = self.take_pending() else {
            return Ok(None);
        };
        let raw = tokio::fs::read(&path).await.map_err(|source| CameraError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let jpeg = encode_jpeg(&raw, quality)?;
        debug!(path = %path.display(), bytes = jpeg.len(), "Captured photo from file");
        Ok(Some(CapturedImage {
            local_uri: format!("file://{}", path.display()),
            jpeg,
        }))
    }
}
