//! Bulk operation adapters: thin translators in front of the job engine.
//!
//! Each adapter turns one external request into job work items plus an
//! [`crate::jobs::ItemHandler`], and maps per-item results onto the
//! success/skipped/error outcome taxonomy.

pub mod checkpoint;
pub mod email;
pub mod tickets;

pub use checkpoint::{BulkCheckpointRequest, CheckpointAction, submit_bulk_checkpoint};
pub use email::{LogMailer, Mailer, NotifyRequest, OutboundEmail, RecipientFilter, SmtpMailer, submit_bulk_email};
pub use tickets::{BulkTicketRequest, submit_bulk_ticket_gen};
