//! # Folio
//!
//! A page-native layout engine for paginated documents.
//!
//! A document tree of sections, blocks, spans, text and images goes in; a
//! fully positioned layout tree comes out: pages, blocks split into
//! per-page fragments, multi-column regions, lines of runs, and the
//! arrangements, link annotations, outlines and tiling patterns a PDF
//! writer needs. Nothing here writes PDF bytes.
//!
//! Content flows *into* pages and columns. Every overflow decision is made
//! against the real space left in the current column, and each overflow
//! policy (new page, clip, drop) is honoured at the block that declares it.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]     Document tree: sections, blocks, inline content
//!       ↓
//!   [style]     Inheritance, defaults, pens and brushes
//!       ↓
//!   [layout]    Pages, columns, lines, arrangements, artefacts
//!       ↓
//!   LayoutDocument (serializable)
//! ```

pub mod error;
pub mod font;
pub mod layout;
pub mod model;
pub mod resources;
pub mod style;
pub mod text;
pub mod units;

pub use error::FolioError;
pub use layout::{LayoutDocument, LayoutEngine};
pub use model::Document;

use font::FontContext;

/// Lay out a document.
///
/// This is the primary entry point. Registers the document's fonts, then
/// runs the layout pass.
pub fn layout(document: &Document) -> Result<LayoutDocument, FolioError> {
    let font_context = FontContext::with_fonts(&document.fonts)?;
    let engine = LayoutEngine::new();
    engine.layout(document, &font_context)
}

/// Lay out a document described as JSON.
pub fn layout_json(json: &str) -> Result<LayoutDocument, FolioError> {
    let document: Document = serde_json::from_str(json)?;
    layout(&document)
}
