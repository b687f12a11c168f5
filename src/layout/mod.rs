/*!
 * Layout graph model: geometry primitives and the in-memory representation
 * of a document's structured content.
 *
 * - `geometry`: rectangles in top-left-origin page coordinates
 * - `model`: Document/Page/LayoutBlock and the reading-order run traversal
 */

// Re-export the full model surface; downstream stages address everything
// through this module.
pub use self::geometry::{GEOMETRY_EPSILON, Rect};
pub use self::model::{
    BlockKind, Color, Document, FontStyle, ImageBlock, ImageFormat, ImageRef, LayoutBlock, Page,
    RunRef, RunTranslation, TableBlock, TableCell, TextBlock, TextRun, WritingDirection,
    TEXT_LAYER_CONFIDENCE, TRANSLATION_FAILED_SENTINEL,
};

pub mod geometry;
pub mod model;
