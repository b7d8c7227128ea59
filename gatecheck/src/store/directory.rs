//! Per-event attendee directory with checkpoint mark/unmark operations.
//!
//! The trait is the seam a persistent store would slot into later; the
//! in-memory implementation keys attendees by event and guarantees
//! per-attendee atomicity through the map's entry locks, so two racing
//! scans for the same attendee serialize and the loser observes
//! `already_scanned` instead of corrupting the slot.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use tracing::info;

use crate::domain::{ApprovalStatus, Attendee, CheckpointKind, ScanMethod};
use crate::{Error, Result};

/// Result of a mark operation.
#[derive(Debug, Clone)]
pub struct MarkResult {
    /// True when the slot was already scanned; no mutation happened and
    /// the original `scanned_at` is preserved.
    pub already_scanned: bool,
    /// The attendee after the operation.
    pub attendee: Attendee,
}

/// Result of an unmark operation.
#[derive(Debug, Clone)]
pub struct UnmarkResult {
    /// Whether the slot was scanned before clearing.
    pub was_scanned: bool,
}

/// Scan counts for one checkpoint kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointTally {
    pub count: u64,
    /// Rounded percentage of approved attendees; 0 when there are none.
    pub percentage: u32,
}

/// Per-event checkpoint statistics over approved attendees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointStats {
    pub total: u64,
    pub entry: CheckpointTally,
    pub refreshment: CheckpointTally,
    pub swag: CheckpointTally,
}

/// Storage seam for attendee records and their checkpoint slots.
#[async_trait]
pub trait AttendeeDirectory: Send + Sync {
    /// Insert an attendee into an event. Ticket numbers are unique within
    /// an event.
    async fn insert(&self, event_id: &str, attendee: Attendee) -> Result<Attendee>;

    async fn get(&self, event_id: &str, attendee_id: &str) -> Result<Attendee>;

    async fn list(&self, event_id: &str) -> Result<Vec<Attendee>>;

    async fn find_by_ticket_number(
        &self,
        event_id: &str,
        ticket_number: &str,
    ) -> Result<Option<Attendee>>;

    async fn find_by_email(&self, event_id: &str, email: &str) -> Result<Option<Attendee>>;

    /// Exact string match against the stored payload; payloads are opaque
    /// and never decoded.
    async fn find_by_qr(&self, event_id: &str, qr_payload: &str) -> Result<Option<Attendee>>;

    /// Mark a checkpoint slot. Idempotent: an already-scanned slot is
    /// reported, not re-stamped.
    async fn mark(
        &self,
        event_id: &str,
        attendee_id: &str,
        kind: CheckpointKind,
        method: ScanMethod,
    ) -> Result<MarkResult>;

    /// Clear a checkpoint slot regardless of prior value. Idempotent.
    async fn unmark(
        &self,
        event_id: &str,
        attendee_id: &str,
        kind: CheckpointKind,
    ) -> Result<UnmarkResult>;

    /// Scan statistics over the event's approved attendees.
    async fn stats(&self, event_id: &str) -> Result<CheckpointStats>;
}

/// In-memory directory backed by nested concurrent maps.
#[derive(Default)]
pub struct InMemoryDirectory {
    events: DashMap<String, DashMap<String, Attendee>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

fn percentage(count: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((count as f64 / total as f64) * 100.0).round() as u32
}

#[async_trait]
impl AttendeeDirectory for InMemoryDirectory {
    async fn insert(&self, event_id: &str, attendee: Attendee) -> Result<Attendee> {
        let event = self.events.entry(event_id.to_string()).or_default();
        let duplicate = event.iter().any(|existing| {
            existing.ticket_number == attendee.ticket_number && existing.id != attendee.id
        });
        if duplicate {
            return Err(Error::validation(format!(
                "ticket number {} already exists in event {}",
                attendee.ticket_number, event_id
            )));
        }
        event.insert(attendee.id.clone(), attendee.clone());
        Ok(attendee)
    }

    async fn get(&self, event_id: &str, attendee_id: &str) -> Result<Attendee> {
        self.events
            .get(event_id)
            .and_then(|event| event.get(attendee_id).map(|a| a.clone()))
            .ok_or_else(|| Error::not_found("attendee", attendee_id))
    }

    async fn list(&self, event_id: &str) -> Result<Vec<Attendee>> {
        let Some(event) = self.events.get(event_id) else {
            return Ok(Vec::new());
        };
        let mut attendees: Vec<Attendee> = event.iter().map(|a| a.clone()).collect();
        attendees.sort_by(|a, b| a.ticket_number.cmp(&b.ticket_number));
        Ok(attendees)
    }

    async fn find_by_ticket_number(
        &self,
        event_id: &str,
        ticket_number: &str,
    ) -> Result<Option<Attendee>> {
        let Some(event) = self.events.get(event_id) else {
            return Ok(None);
        };
        Ok(event
            .iter()
            .find(|a| a.ticket_number == ticket_number)
            .map(|a| a.clone()))
    }

    async fn find_by_email(&self, event_id: &str, email: &str) -> Result<Option<Attendee>> {
        let Some(event) = self.events.get(event_id) else {
            return Ok(None);
        };
        Ok(event
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .map(|a| a.clone()))
    }

    async fn find_by_qr(&self, event_id: &str, qr_payload: &str) -> Result<Option<Attendee>> {
        let Some(event) = self.events.get(event_id) else {
            return Ok(None);
        };
        Ok(event
            .iter()
            .find(|a| a.qr_payload == qr_payload)
            .map(|a| a.clone()))
    }

    async fn mark(
        &self,
        event_id: &str,
        attendee_id: &str,
        kind: CheckpointKind,
        method: ScanMethod,
    ) -> Result<MarkResult> {
        let event = self
            .events
            .get(event_id)
            .ok_or_else(|| Error::not_found("attendee", attendee_id))?;
        let mut attendee = event
            .get_mut(attendee_id)
            .ok_or_else(|| Error::not_found("attendee", attendee_id))?;

        let changed = attendee.checkpoints.get_mut(kind).mark(method);
        if changed {
            // Audit trail: append-only, one structured event per mutation.
            info!(
                event_id = %event_id,
                attendee_id = %attendee_id,
                checkpoint = %kind.as_str(),
                method = ?method,
                "Checkpoint marked"
            );
        }
        Ok(MarkResult {
            already_scanned: !changed,
            attendee: attendee.clone(),
        })
    }

    async fn unmark(
        &self,
        event_id: &str,
        attendee_id: &str,
        kind: CheckpointKind,
    ) -> Result<UnmarkResult> {
        let event = self
            .events
            .get(event_id)
            .ok_or_else(|| Error::not_found("attendee", attendee_id))?;
        let mut attendee = event
            .get_mut(attendee_id)
            .ok_or_else(|| Error::not_found("attendee", attendee_id))?;

        let was_scanned = attendee.checkpoints.get_mut(kind).clear();
        if was_scanned {
            info!(
                event_id = %event_id,
                attendee_id = %attendee_id,
                checkpoint = %kind.as_str(),
                "Checkpoint cleared"
            );
        }
        Ok(UnmarkResult { was_scanned })
    }

    async fn stats(&self, event_id: &str) -> Result<CheckpointStats> {
        let Some(event) = self.events.get(event_id) else {
            return Ok(CheckpointStats::default());
        };

        let mut total = 0u64;
        let mut counts = [0u64; 3];
        for attendee in event.iter() {
            if attendee.approval != ApprovalStatus::Approved {
                continue;
            }
            total += 1;
            for (i, kind) in CheckpointKind::ALL.into_iter().enumerate() {
                if attendee.checkpoints.get(kind).scanned {
                    counts[i] += 1;
                }
            }
        }

        let tally = |count: u64| CheckpointTally {
            count,
            percentage: percentage(count, total),
        };
        Ok(CheckpointStats {
            total,
            entry: tally(counts[0]),
            refreshment: tally(counts[1]),
            swag: tally(counts[2]),
        })
    }
}
