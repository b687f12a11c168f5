/*!
 * Extraction engine: produces a layout graph page from a PDF page, using
 * text-layer extraction with OCR fallback for scanned pages.
 *
 * - `source`: the narrow capability traits the engine consumes
 * - `clustering`: span-to-block spatial clustering
 * - `columns`: gap-histogram column bands and the reading-order sort
 * - `engine`: the extraction driver
 */

pub use self::clustering::ClusteringOptions;
pub use self::columns::ColumnOptions;
pub use self::engine::{ExtractionEngine, ExtractionOptions};
pub use self::source::{FontInfo, ImageRegion, OcrEngine, OcrSpan, PdfContentSource, TextSpan};

pub mod clustering;
pub mod columns;
pub mod engine;
pub mod lopdf_source;
pub mod source;
