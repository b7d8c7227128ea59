//! # Ticket Render
//!
//! Composes event tickets from three layers: a background image, an encoded
//! QR code and a list of positioned text overlays.
//!
//! The pipeline is deliberately synchronous and CPU-bound; callers that run
//! it inside an async job are expected to move the work onto a blocking
//! thread themselves.
//!
//! - [`TicketTemplate`] describes the layout (immutable configuration)
//! - [`TicketData`] carries the per-attendee values
//! - [`TicketRenderer`] produces a flattened RGBA image or PNG bytes

pub mod assets;
pub mod error;
pub mod fonts;
pub mod render;
pub mod template;
pub mod text;

pub use assets::{AssetSource, FsAssetSource, MemoryAssetSource};
pub use error::RenderError;
pub use fonts::FontLibrary;
pub use render::{BatchItemReport, TicketRenderer};
pub use template::{
    Align, BackgroundSource, EcLevel, QrPlacement, TextOverlay, TicketData, TicketField,
    TicketTemplate,
};
