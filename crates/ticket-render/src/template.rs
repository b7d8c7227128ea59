//! Ticket template and per-attendee data models.
//!
//! Templates are immutable configuration produced by an external design
//! tool; the renderer only ever reads them.

use serde::{Deserialize, Serialize};

/// QR error-correction level. Higher levels survive more damage at the
/// cost of data density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum EcLevel {
    L,
    #[default]
    M,
    Q,
    H,
}

impl From<EcLevel> for qrcode::EcLevel {
    fn from(level: EcLevel) -> Self {
        match level {
            EcLevel::L => qrcode::EcLevel::L,
            EcLevel::M => qrcode::EcLevel::M,
            EcLevel::Q => qrcode::EcLevel::Q,
            EcLevel::H => qrcode::EcLevel::H,
        }
    }
}

/// Horizontal alignment of a text overlay relative to its anchor x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Data field an overlay draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TicketField {
    Name,
    TicketNumber,
    Email,
    EventTitle,
    EventDate,
    Venue,
}

/// Where the template's background pixels come from.
///
/// `Solid` lets headless deployments (and tests) render without any image
/// asset on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum BackgroundSource {
    /// Load an image by asset path (resolved through an [`crate::AssetSource`]).
    Asset { path: String },
    /// A flat colour canvas of the given dimensions.
    Solid {
        width: u32,
        height: u32,
        color: [u8; 4],
    },
}

/// Placement and encoding parameters for the ticket's QR code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPlacement {
    pub x: u32,
    pub y: u32,
    /// Side length of the composited (square) QR image in pixels.
    pub size: u32,
    #[serde(default)]
    pub ec_level: EcLevel,
}

/// A single positioned text overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOverlay {
    /// Which [`TicketData`] field to draw.
    pub field: TicketField,
    /// Anchor x coordinate; meaning depends on `align`.
    pub x: i32,
    pub y: i32,
    pub font_size: f32,
    pub font_family: String,
    /// RGBA colour.
    pub color: [u8; 4],
    #[serde(default)]
    pub align: Align,
    /// Maximum rendered width in pixels. Longer text is truncated with an
    /// ellipsis.
    #[serde(default)]
    pub max_width: Option<u32>,
}

/// The full layout description for one ticket design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketTemplate {
    pub background: BackgroundSource,
    pub qr: QrPlacement,
    /// Overlays are drawn in order, later entries on top.
    #[serde(default)]
    pub overlays: Vec<TextOverlay>,
}

/// Per-attendee values substituted into a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketData {
    pub name: String,
    pub ticket_number: String,
    pub email: String,
    #[serde(default)]
    pub event_title: Option<String>,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
}

impl TicketData {
    /// Look up the value for an overlay field. Optional event fields may be
    /// absent, in which case the overlay is skipped.
    pub fn field(&self, field: TicketField) -> Option<&str> {
        match field {
            TicketField::Name => Some(self.name.as_str()),
            TicketField::TicketNumber => Some(self.ticket_number.as_str()),
            TicketField::Email => Some(self.email.as_str()),
            TicketField::EventTitle => self.event_title.as_deref(),
            TicketField::EventDate => self.event_date.as_deref(),
            TicketField::Venue => self.venue.as_deref(),
        }
    }
}
