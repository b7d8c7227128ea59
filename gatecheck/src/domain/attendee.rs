//! Attendee records and checkpoint slots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// RSVP approval status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    #[default]
    Approved,
    Rejected,
}

/// How a scan reached the checkpoint store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMethod {
    Qr,
    Ticket,
    Email,
    Manual,
}

/// The three physical stations an attendee is scanned through.
///
/// A closed enum: every dispatch site matches exhaustively, so adding a
/// fourth station is a compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointKind {
    Entry,
    Refreshment,
    Swag,
}

impl CheckpointKind {
    pub const ALL: [CheckpointKind; 3] = [
        CheckpointKind::Entry,
        CheckpointKind::Refreshment,
        CheckpointKind::Swag,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointKind::Entry => "entry",
            CheckpointKind::Refreshment => "refreshment",
            CheckpointKind::Swag => "swag",
        }
    }
}

/// One checkpoint slot on an attendee.
///
/// Invariant: `scanned`, `scanned_at` and `scan_method` are either all set
/// or all cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointSlot {
    pub scanned: bool,
    pub scanned_at: Option<DateTime<Utc>>,
    pub scan_method: Option<ScanMethod>,
}

impl CheckpointSlot {
    /// Mark the slot as scanned now. No-op when already scanned, so the
    /// original `scanned_at` is preserved.
    pub(crate) fn mark(&mut self, method: ScanMethod) -> bool {
        if self.scanned {
            return false;
        }
        self.scanned = true;
        self.scanned_at = Some(Utc::now());
        self.scan_method = Some(method);
        true
    }

    /// Clear the slot back to unscanned. Returns whether it was scanned.
    pub(crate) fn clear(&mut self) -> bool {
        let was_scanned = self.scanned;
        self.scanned = false;
        self.scanned_at = None;
        self.scan_method = None;
        was_scanned
    }
}

/// All three checkpoint slots for one attendee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointSlots {
    pub entry: CheckpointSlot,
    pub refreshment: CheckpointSlot,
    pub swag: CheckpointSlot,
}

impl CheckpointSlots {
    pub fn get(&self, kind: CheckpointKind) -> &CheckpointSlot {
        match kind {
            CheckpointKind::Entry => &self.entry,
            CheckpointKind::Refreshment => &self.refreshment,
            CheckpointKind::Swag => &self.swag,
        }
    }

    pub fn get_mut(&mut self, kind: CheckpointKind) -> &mut CheckpointSlot {
        match kind {
            CheckpointKind::Entry => &mut self.entry,
            CheckpointKind::Refreshment => &mut self.refreshment,
            CheckpointKind::Swag => &mut self.swag,
        }
    }
}

/// One registrant record for one event.
///
/// Identity fields are immutable once created; checkpoint slots are
/// mutated only through the attendee directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub id: String,
    pub name: String,
    pub email: String,
    pub ticket_number: String,
    /// Opaque string encoded in the attendee's QR code; matched by exact
    /// equality, never decoded.
    pub qr_payload: String,
    pub approval: ApprovalStatus,
    pub checkpoints: CheckpointSlots,
}

impl Attendee {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        ticket_number: impl Into<String>,
        qr_payload: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into(),
            ticket_number: ticket_number.into(),
            qr_payload: qr_payload.into(),
            approval: ApprovalStatus::default(),
            checkpoints: CheckpointSlots::default(),
        }
    }

    pub fn with_approval(mut self, approval: ApprovalStatus) -> Self {
        self.approval = approval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_fields_stay_consistent() {
        let mut slot = CheckpointSlot::default();
        assert!(!slot.scanned);
        assert!(slot.scanned_at.is_none());
        assert!(slot.scan_method.is_none());

        assert!(slot.mark(ScanMethod::Qr));
        assert!(slot.scanned);
        assert!(slot.scanned_at.is_some());
        assert_eq!(slot.scan_method, Some(ScanMethod::Qr));

        assert!(slot.clear());
        assert!(!slot.scanned);
        assert!(slot.scanned_at.is_none());
        assert!(slot.scan_method.is_none());
    }

    #[test]
    fn double_mark_preserves_first_timestamp() {
        let mut slot = CheckpointSlot::default();
        assert!(slot.mark(ScanMethod::Ticket));
        let first = slot.scanned_at;
        assert!(!slot.mark(ScanMethod::Manual));
        assert_eq!(slot.scanned_at, first);
        assert_eq!(slot.scan_method, Some(ScanMethod::Ticket));
    }

    #[test]
    fn kind_dispatch_is_exhaustive() {
        let mut slots = CheckpointSlots::default();
        for kind in CheckpointKind::ALL {
            assert!(slots.get_mut(kind).mark(ScanMethod::Manual));
        }
        assert!(slots.entry.scanned && slots.refreshment.scanned && slots.swag.scanned);
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&CheckpointKind::Refreshment).unwrap(),
            "\"refreshment\""
        );
        let parsed: CheckpointKind = serde_json::from_str("\"swag\"").unwrap();
        assert_eq!(parsed, CheckpointKind::Swag);
    }
}
