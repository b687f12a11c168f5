/*!
 * # pagelift
 *
 * A Rust library for layout-preserving translation of Japanese magazine
 * PDFs into English.
 *
 * ## Features
 *
 * - Structured extraction of PDF pages into a layout graph, with OCR
 *   fallback for scanned pages
 * - Translation orchestration with multi-backend fallback, retries, and a
 *   process-wide cache (optionally persisted across runs)
 * - Re-flow of translated text into the original geometry, emitted as
 *   positioned HTML and reconstructed PDF
 * - Page-level parallelism with partial-failure semantics: a partially
 *   translated document always beats no output
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `layout`: The layout graph model (pages, blocks, runs, geometry)
 * - `extraction`: Text-layer/OCR extraction behind capability traits
 * - `translation`: Unit collection, caching, and orchestration
 * - `backends`: Client implementations for translation services:
 *   - `backends::openai`: OpenAI-compatible chat API client
 *   - `backends::anthropic`: Anthropic messages API client
 *   - `backends::glossary`: Offline dictionary backend
 *   - `backends::mock`: Scripted behaviors for tests
 * - `render`: Text re-flow and the HTML/PDF emitters
 * - `pipeline`: The per-page coordinator and cancellation
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod backends;
pub mod errors;
pub mod extraction;
pub mod file_utils;
pub mod language_utils;
pub mod layout;
pub mod pipeline;
pub mod render;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, BackendError, ExtractionError, PipelineError, RenderError};
pub use layout::{Document, Page};
pub use pipeline::{CancelToken, DocumentResult, PipelineCoordinator};
pub use translation::{TranslationCache, TranslationOrchestrator};
