//! Image upload validation, loading, and the upload surface state machine.

use std::fmt;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::model::ClassificationResult;

/// MIME type declared for files with an unrecognised extension.
pub const UNKNOWN_MIME: &str = "application/octet-stream";

#[derive(thiserror::Error, Debug)]
/// Errors raised while accepting an image.
pub enum UploadError {
    /// The declared MIME type is not an accepted image type.
    #[error("Unsupported file type {mime}: please upload a JPG, PNG, WEBP or GIF image")]
    UnsupportedType {
        /// MIME type that was declared for the file.
        mime: String,
    },
    /// A previous upload is still being read or classified.
    #[error("Still identifying the previous photo")]
    Busy,
    /// Reading the file failed.
    #[error("Could not read {path}: {source}")]
    Read {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A transition was requested that the current phase does not allow.
    #[error("Cannot {action} while {phase}")]
    InvalidTransition {
        /// Transition that was attempted.
        action: &'static str,
        /// Phase the surface was in.
        phase: UploadPhase,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Image types accepted for classification.
pub enum AcceptedMime {
    /// `image/jpeg`
    Jpeg,
    /// `image/png`
    Png,
    /// `image/webp`
    Webp,
    /// `image/gif`
    Gif,
}

impl AcceptedMime {
    /// Parse a declared MIME type, `None` when it is not accepted.
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Canonical MIME string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
        }
    }
}

impl fmt::Display for AcceptedMime {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// MIME type a file declares through its extension.
#[must_use]
pub fn declared_mime(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => UNKNOWN_MIME,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A file the user picked, not yet read.
pub struct ImageFile {
    /// Location of the file.
    pub path: PathBuf,
    /// MIME type the file declares.
    pub mime: String,
}

impl ImageFile {
    /// Describe a file on disk, declaring its MIME type from the extension.
    #[must_use]
    pub fn from_path<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let mime = declared_mime(&path).to_owned();
        Self { path, mime }
    }

    /// Check the declared type against the accepted image types.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::UnsupportedType`] for anything but JPEG, PNG, WEBP or GIF.
    pub fn validate(&self) -> Result<AcceptedMime, UploadError> {
        AcceptedMime::from_mime(&self.mime).ok_or_else(|| UploadError::UnsupportedType {
            mime: self.mime.clone(),
        })
    }

    /// Display name of the file.
    #[must_use]
    pub fn name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
    }
}

#[derive(Clone, PartialEq, Eq)]
/// An accepted image held in memory.
pub struct ImageData {
    /// Display name of the source file.
    pub name: String,
    /// Image type.
    pub mime: AcceptedMime,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ImageData {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ImageData")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageData {
    /// Base64 payload of the image without any prefix.
    #[must_use]
    pub fn base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    /// `data:` URL representation of the image.
    #[must_use]
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64())
    }
}

/// Validate `file` and read it into memory.
///
/// # Errors
///
/// Returns [`UploadError::UnsupportedType`] before touching the disk when the type is
/// not accepted, and [`UploadError::Read`] when reading fails.
pub async fn read_image(file: &ImageFile) -> Result<ImageData, UploadError> {
    let mime = file.validate()?;
    let bytes = tokio::fs::read(&file.path)
        .await
        .map_err(|source| UploadError::Read {
            path: file.path.clone(),
            source,
        })?;

    Ok(ImageData {
        name: file.name(),
        mime,
        bytes,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Phases of the upload surface.
pub enum UploadPhase {
    /// Nothing uploaded yet.
    Idle,
    /// A file was accepted and is being read.
    Reading,
    /// The image is being classified.
    Classifying,
    /// A result is available.
    Ready,
}

impl fmt::Display for UploadPhase {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadPhase::Idle => "idle",
            UploadPhase::Reading => "reading",
            UploadPhase::Classifying => "classifying",
            UploadPhase::Ready => "ready",
        };
        formatter.write_str(name)
    }
}

/// State of the upload surface: current phase, last preview, last result.
///
/// Previews and results are replaced as whole values, never edited in place.
#[derive(Debug, Clone)]
pub struct UploadSurface {
    phase: UploadPhase,
    pending: Option<ImageFile>,
    loading: Option<ImageData>,
    preview: Option<ImageData>,
    result: Option<ClassificationResult>,
}

impl Default for UploadSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadSurface {
    /// Fresh surface in the idle phase.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: UploadPhase::Idle,
            pending: None,
            loading: None,
            preview: None,
            result: None,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    /// Whether a file is being read or classified.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, UploadPhase::Reading | UploadPhase::Classifying)
    }

    /// Last successfully classified image.
    #[must_use]
    pub fn preview(&self) -> Option<&ImageData> {
        self.preview.as_ref()
    }

    /// Result for the last classified image.
    #[must_use]
    pub fn result(&self) -> Option<&ClassificationResult> {
        self.result.as_ref()
    }

    /// File currently being read.
    #[must_use]
    pub fn pending(&self) -> Option<&ImageFile> {
        self.pending.as_ref()
    }

    /// Accept a new file.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Busy`] while a previous upload is in flight and
    /// [`UploadError::UnsupportedType`] for rejected types; both leave the
    /// surface unchanged.
    pub fn select(&mut self, file: ImageFile) -> Result<AcceptedMime, UploadError> {
        if self.is_busy() {
            return Err(UploadError::Busy);
        }
        let mime = file.validate()?;
        self.pending = Some(file);
        self.phase = UploadPhase::Reading;
        Ok(mime)
    }

    /// The selected file was read; classification starts.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::InvalidTransition`] unless a file is being read.
    pub fn loaded(&mut self, image: ImageData) -> Result<(), UploadError> {
        self.expect_phase(UploadPhase::Reading, "finish reading")?;
        self.pending = None;
        self.loading = Some(image);
        self.phase = UploadPhase::Classifying;
        Ok(())
    }

    /// Reading the selected file failed; the previous preview stays.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::InvalidTransition`] unless a file is being read.
    pub fn read_failed(&mut self) -> Result<(), UploadError> {
        self.expect_phase(UploadPhase::Reading, "abandon reading")?;
        self.pending = None;
        self.phase = self.settled_phase();
        Ok(())
    }

    /// Classification finished; the loaded image becomes the preview.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::InvalidTransition`] unless an image is being classified.
    pub fn classified(&mut self, result: ClassificationResult) -> Result<(), UploadError> {
        self.expect_phase(UploadPhase::Classifying, "store a result")?;
        if let Some(image) = self.loading.take() {
            self.preview = Some(image);
        }
        self.result = Some(result);
        self.phase = UploadPhase::Ready;
        Ok(())
    }

    /// Label for the upload button.
    #[must_use]
    pub fn status_label(&self) -> &'static str {
        match self.phase {
            UploadPhase::Idle => "Upload a photo",
            UploadPhase::Reading | UploadPhase::Classifying => "Identifying…",
            UploadPhase::Ready => "Try another photo",
        }
    }

    fn settled_phase(&self) -> UploadPhase {
        if self.preview.is_some() {
            UploadPhase::Ready
        } else {
            UploadPhase::Idle
        }
    }

    fn expect_phase(&self, phase: UploadPhase, action: &'static str) -> Result<(), UploadError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(UploadError::InvalidTransition {
                action,
                phase: self.phase,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WasteCategory;

    fn image(name: &str) -> ImageData {
        ImageData {
            name: name.to_owned(),
            mime: AcceptedMime::Png,
            bytes: vec![1, 2, 3],
        }
    }

    fn result(label: &str) -> ClassificationResult {
        ClassificationResult {
            label: label.to_owned(),
            score: 0.5,
            category: WasteCategory::Paper,
        }
    }

    #[test]
    fn accepted_mime_types() {
        for mime in ["image/jpeg", "image/png", "image/webp", "image/gif", "IMAGE/PNG"] {
            assert!(AcceptedMime::from_mime(mime).is_some(), "{mime}");
        }
        for mime in ["image/bmp", "image/svg+xml", "application/pdf", ""] {
            assert!(AcceptedMime::from_mime(mime).is_none(), "{mime}");
        }
    }

    #[test]
    fn extension_declares_mime() {
        assert_eq!(declared_mime(Path::new("a/b/photo.JPG")), "image/jpeg");
        assert_eq!(declared_mime(Path::new("photo.jpeg")), "image/jpeg");
        assert_eq!(declared_mime(Path::new("photo.webp")), "image/webp");
        assert_eq!(declared_mime(Path::new("notes.txt")), UNKNOWN_MIME);
        assert_eq!(declared_mime(Path::new("no_extension")), UNKNOWN_MIME);
    }

    #[test]
    fn data_url_carries_mime_and_payload() {
        let data = ImageData {
            name: String::from("x.gif"),
            mime: AcceptedMime::Gif,
            bytes: b"GIF89a".to_vec(),
        };
        assert_eq!(data.to_data_url(), "data:image/gif;base64,R0lGODlh");
    }

    #[test]
    fn full_cycle_replaces_preview_and_result() {
        let mut surface = UploadSurface::new();
        assert_eq!(surface.phase(), UploadPhase::Idle);
        assert_eq!(surface.status_label(), "Upload a photo");

        surface.select(ImageFile::from_path("first.png")).unwrap();
        assert_eq!(surface.phase(), UploadPhase::Reading);
        assert_eq!(surface.pending().map(ImageFile::name).as_deref(), Some("first.png"));
        surface.loaded(image("first.png")).unwrap();
        assert_eq!(surface.phase(), UploadPhase::Classifying);
        assert!(surface.pending().is_none());
        assert_eq!(surface.status_label(), "Identifying…");
        assert!(surface.preview().is_none());
        surface.classified(result("newspaper")).unwrap();
        assert_eq!(surface.phase(), UploadPhase::Ready);
        assert_eq!(surface.status_label(), "Try another photo");
        assert_eq!(surface.preview().map(|img| img.name.as_str()), Some("first.png"));

        surface.select(ImageFile::from_path("second.webp")).unwrap();
        surface.loaded(image("second.webp")).unwrap();
        surface.classified(result("carton")).unwrap();
        assert_eq!(surface.preview().map(|img| img.name.as_str()), Some("second.webp"));
        assert_eq!(surface.result().map(|res| res.label.as_str()), Some("carton"));
    }

    #[test]
    fn rejected_type_leaves_state_untouched() {
        let mut surface = UploadSurface::new();
        let err = surface.select(ImageFile::from_path("doc.pdf")).unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType { .. }));
        assert_eq!(surface.phase(), UploadPhase::Idle);

        surface.select(ImageFile::from_path("ok.png")).unwrap();
        surface.loaded(image("ok.png")).unwrap();
        surface.classified(result("book")).unwrap();

        let err = surface.select(ImageFile::from_path("anim.bmp")).unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType { .. }));
        assert_eq!(surface.phase(), UploadPhase::Ready);
        assert_eq!(surface.preview().map(|img| img.name.as_str()), Some("ok.png"));
    }

    #[test]
    fn resubmission_is_blocked_while_busy() {
        let mut surface = UploadSurface::new();
        surface.select(ImageFile::from_path("a.png")).unwrap();
        assert!(matches!(
            surface.select(ImageFile::from_path("b.png")),
            Err(UploadError::Busy)
        ));
        surface.loaded(image("a.png")).unwrap();
        assert!(matches!(
            surface.select(ImageFile::from_path("b.png")),
            Err(UploadError::Busy)
        ));
    }

    #[test]
    fn read_failure_returns_to_previous_settled_phase() {
        let mut surface = UploadSurface::new();
        surface.select(ImageFile::from_path("a.png")).unwrap();
        surface.read_failed().unwrap();
        assert_eq!(surface.phase(), UploadPhase::Idle);

        surface.select(ImageFile::from_path("a.png")).unwrap();
        surface.loaded(image("a.png")).unwrap();
        surface.classified(result("book")).unwrap();
        surface.select(ImageFile::from_path("b.png")).unwrap();
        surface.read_failed().unwrap();
        assert_eq!(surface.phase(), UploadPhase::Ready);
        assert_eq!(surface.preview().map(|img| img.name.as_str()), Some("a.png"));
    }

    #[test]
    fn out_of_order_transitions_are_rejected() {
        let mut surface = UploadSurface::new();
        assert!(matches!(
            surface.classified(result("x")),
            Err(UploadError::InvalidTransition { .. })
        ));
        assert!(matches!(
            surface.loaded(image("x.png")),
            Err(UploadError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn read_image_rejects_before_touching_disk() {
        let err = read_image(&ImageFile::from_path("/definitely/missing.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedType { .. }));

        let err = read_image(&ImageFile::from_path("/definitely/missing.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Read { .. }));
    }
}
