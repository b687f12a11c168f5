/*!
 * Error types for the pagelift pipeline.
 *
 * This module contains custom error types for the different pipeline stages,
 * using the thiserror crate for ergonomic error definitions. The taxonomy
 * follows the recovery granularity: layout and backend errors are recovered
 * locally, page errors are recorded per page, and a pipeline error is only
 * raised when no page succeeded at all.
 */

use std::path::PathBuf;

use thiserror::Error;

use crate::layout::Rect;

/// Errors raised by invariant-preserving layout graph constructors
#[derive(Error, Debug)]
pub enum LayoutError {
    /// A block's bounding box falls outside its page
    #[error("block bounding box {bbox:?} outside page {page_index} ({page_width}x{page_height}pt)")]
    InvalidGeometry {
        /// Index of the offending page
        page_index: usize,
        /// Page width in points
        page_width: f32,
        /// Page height in points
        page_height: f32,
        /// The rejected bounding box
        bbox: Rect,
    },

    /// Page dimensions must be strictly positive
    #[error("invalid page dimensions {width}x{height}pt for page {page_index}")]
    InvalidPageDimensions {
        /// Index of the offending page
        page_index: usize,
        /// Rejected width
        width: f32,
        /// Rejected height
        height: f32,
    },

    /// A run reference does not resolve to a text run
    #[error("run reference (block {block}, run {run}) does not exist on page {page_index}")]
    DanglingRunRef {
        /// Index of the page
        page_index: usize,
        /// Block index of the reference
        block: usize,
        /// Run index of the reference
        run: usize,
    },
}

/// Errors that can occur while extracting a page into a layout graph
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The content source could not read the text layer
    #[error("text layer extraction failed: {0}")]
    TextLayer(String),

    /// The content source could not rasterize the page
    #[error("page rasterization failed: {0}")]
    Rasterize(String),

    /// The OCR engine failed on a rasterized page
    #[error("OCR recognition failed: {0}")]
    Ocr(String),

    /// OCR fallback was required but no OCR engine is configured
    #[error("page {0} needs OCR fallback but no OCR engine is configured")]
    OcrUnavailable(usize),

    /// A page index beyond the document was requested
    #[error("page index {index} out of bounds (document has {page_count} pages)")]
    PageOutOfBounds {
        /// Requested page index
        index: usize,
        /// Number of pages in the document
        page_count: usize,
    },

    /// The extracted content violated a layout graph invariant
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
}

/// Errors returned by a single translation backend call
#[derive(Error, Debug)]
pub enum BackendError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The backend produced an empty or whitespace-only translation
    #[error("backend returned an empty translation")]
    EmptyTranslation,

    /// The backend has no translation for this text (dictionary backends)
    #[error("no translation available for the given text")]
    NoTranslation,
}

impl BackendError {
    /// Whether a retry against the same backend could plausibly succeed.
    ///
    /// Authentication failures and missing dictionary entries are permanent;
    /// everything else is treated as transient.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            BackendError::AuthenticationError(_) | BackendError::NoTranslation
        )
    }
}

/// Record of one translation unit for which every backend was exhausted.
///
/// This is a diagnostic record rather than a propagated error: the owning
/// runs receive the failure sentinel and page processing continues.
#[derive(Error, Debug, Clone)]
#[error("all backends failed for \"{text_preview}\" on page {page_index} ({attempts} attempts): {last_error}")]
pub struct TranslationUnitError {
    /// Index of the owning page
    pub page_index: usize,
    /// Truncated preview of the source text
    pub text_preview: String,
    /// Total backend attempts made
    pub attempts: u32,
    /// Message of the last backend error seen
    pub last_error: String,
}

/// Errors that can occur during the translation stage of a page
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from a backend that aborted the whole stage (configuration level)
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// No backends were configured
    #[error("no translation backends configured")]
    NoBackends,

    /// Cancellation was requested; resolved results were discarded
    #[error("translation stage cancelled")]
    Cancelled,

    /// A write-back reference did not resolve
    #[error("layout error during write-back: {0}")]
    Layout(#[from] LayoutError),
}

/// Errors that can occur while reconstructing output for a page
#[derive(Error, Debug)]
pub enum RenderError {
    /// A block could not be laid out even after floor shrink and truncation
    #[error("block on page {page_index} cannot be laid out: {reason}")]
    LayoutImpossible {
        /// Index of the owning page
        page_index: usize,
        /// Why layout failed
        reason: String,
    },

    /// PDF serialization failed
    #[error("PDF emission failed: {0}")]
    PdfEmit(String),
}

/// A page-scoped failure recorded in the document result
#[derive(Error, Debug)]
pub enum PageError {
    /// The extraction stage failed for this page
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// The translation stage failed for this page
    #[error("translation failed: {0}")]
    Translation(#[from] TranslationError),

    /// The reconstruction stage failed for this page
    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    /// The page was skipped because cancellation was requested
    #[error("processing cancelled before this page completed")]
    Cancelled,
}

/// Fatal pipeline-level errors
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Every page failed end-to-end
    #[error("no pages succeeded ({failed} of {failed} pages failed)")]
    NoPagesSucceeded {
        /// Number of failed pages
        failed: usize,
    },

    /// The document reported zero pages
    #[error("document contains no pages")]
    EmptyDocument,

    /// The content source could not be opened at all
    #[error("cannot open document: {0}")]
    Source(#[from] ExtractionError),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from configuration loading or validation
    #[error("Configuration error: {path:?}: {message}")]
    Config {
        /// Configuration file involved, if any
        path: Option<PathBuf>,
        /// What went wrong
        message: String,
    },

    /// Error from the pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Error from a backend
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
