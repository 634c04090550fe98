//! Error taxonomy for the canvas engine.
//!
//! Every failure belongs to one of three categories. Input errors are the
//! user's to fix and never mutate state. Integrity violations mean the scene
//! was built wrong (a missing page region) and must not be papered over with
//! a default. Resource errors come from a collaborator (rasterizer, encoder,
//! store) failing at runtime.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

/// Broad failure category used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed upload or import; surfaced to the user, no state mutated.
    InputRejected,
    /// The scene is structurally broken (construction bug).
    IntegrityViolation,
    /// An external dependency is missing or failed.
    ResourceUnavailable,
}

/// Stable machine-readable code for an error.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Errors returned by canvas operations.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    /// The uploaded file is not a supported document type.
    #[error("unsupported upload type: {0}")]
    UnsupportedUpload(String),
    /// The snapshot JSON could not be parsed or is structurally invalid.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
    /// The snapshot declares a format version this build does not read.
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: i64, expected: i64 },
    /// A drop payload or scene object names an asset that is not registered.
    #[error("unknown asset: {0}")]
    UnknownAsset(String),
    /// An image payload (data URL, raster buffer) is malformed.
    #[error("invalid image data: {0}")]
    InvalidImage(String),
    /// Export parameters are out of range.
    #[error("invalid export request: {0}")]
    InvalidExport(String),
    /// The configuration is self-contradictory.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// No page region exists in the scene.
    #[error("page region missing from scene")]
    PageRegionMissing,
    /// The scene holds more than one page region.
    #[error("scene holds {0} page regions, expected exactly one")]
    DuplicatePageRegion(usize),
    /// The document rasterizer is unavailable or failed.
    #[error("rasterizer unavailable: {0}")]
    RasterizerUnavailable(String),
    /// An image or document encoder failed.
    #[error("encoder failed: {0}")]
    Encoder(String),
    /// The snapshot store could not complete the request.
    #[error("snapshot store error: {0}")]
    Store(String),
}

impl CanvasError {
    /// Category of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedUpload(_)
            | Self::InvalidSnapshot(_)
            | Self::UnsupportedVersion { .. }
            | Self::UnknownAsset(_)
            | Self::InvalidImage(_)
            | Self::InvalidExport(_)
            | Self::InvalidConfig(_) => ErrorCategory::InputRejected,
            Self::PageRegionMissing | Self::DuplicatePageRegion(_) => ErrorCategory::IntegrityViolation,
            Self::RasterizerUnavailable(_) | Self::Encoder(_) | Self::Store(_) => ErrorCategory::ResourceUnavailable,
        }
    }
}

impl ErrorCode for CanvasError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedUpload(_) => "E_UNSUPPORTED_UPLOAD",
            Self::InvalidSnapshot(_) => "E_INVALID_SNAPSHOT",
            Self::UnsupportedVersion { .. } => "E_SNAPSHOT_VERSION",
            Self::UnknownAsset(_) => "E_UNKNOWN_ASSET",
            Self::InvalidImage(_) => "E_INVALID_IMAGE",
            Self::InvalidExport(_) => "E_INVALID_EXPORT",
            Self::InvalidConfig(_) => "E_INVALID_CONFIG",
            Self::PageRegionMissing => "E_PAGE_REGION_MISSING",
            Self::DuplicatePageRegion(_) => "E_PAGE_REGION_DUPLICATE",
            Self::RasterizerUnavailable(_) => "E_RASTERIZER",
            Self::Encoder(_) => "E_ENCODER",
            Self::Store(_) => "E_STORE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Encoder(_) | Self::Store(_))
    }
}

/// Result alias for canvas operations.
pub type Result<T> = std::result::Result<T, CanvasError>;
