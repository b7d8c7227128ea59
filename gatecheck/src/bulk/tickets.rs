//! Bulk ticket-image generation adapter.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use ticket_render::{TicketData, TicketRenderer, TicketTemplate};
use tracing::{info, warn};

use crate::domain::{ApprovalStatus, Attendee, ItemOutcome, JobType};
use crate::jobs::{ItemHandler, JobEngine};
use crate::store::AttendeeDirectory;
use crate::Result;

/// One bulk ticket-generation request: a template plus the attendees to
/// render.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkTicketRequest {
    pub template: TicketTemplate,
    /// Explicit attendee ids; defaults to every approved attendee.
    #[serde(default)]
    pub attendee_ids: Option<Vec<String>>,
    #[serde(default)]
    pub event_title: Option<String>,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
}

impl BulkTicketRequest {
    fn ticket_data(&self, attendee: &Attendee) -> TicketData {
        TicketData {
            name: attendee.name.clone(),
            ticket_number: attendee.ticket_number.clone(),
            email: attendee.email.clone(),
            event_title: self.event_title.clone(),
            event_date: self.event_date.clone(),
            venue: self.venue.clone(),
        }
    }
}

struct TicketBatchHandler {
    renderer: Arc<TicketRenderer>,
    template: Arc<TicketTemplate>,
    out_dir: PathBuf,
}

/// Keep ticket numbers filesystem-safe when used as file names.
fn sanitize_file_stem(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl ItemHandler for TicketBatchHandler {
    type Item = TicketData;

    async fn handle(&self, data: TicketData) -> ItemOutcome {
        let renderer = self.renderer.clone();
        let template = self.template.clone();
        let item = data.clone();
        // Rendering is CPU-bound; keep it off the async workers.
        let rendered =
            tokio::task::spawn_blocking(move || renderer.render_png(&template, &item)).await;

        let png = match rendered {
            Ok(Ok(png)) => png,
            Ok(Err(e)) => {
                warn!(ticket_number = %data.ticket_number, error = %e, "Ticket render failed");
                return ItemOutcome::Error;
            }
            Err(e) => {
                warn!(ticket_number = %data.ticket_number, error = %e, "Ticket render task aborted");
                return ItemOutcome::Error;
            }
        };

        let path = self
            .out_dir
            .join(format!("{}.png", sanitize_file_stem(&data.ticket_number)));
        match tokio::fs::write(&path, &png).await {
            Ok(()) => {
                info!(ticket_number = %data.ticket_number, path = %path.display(), "Ticket image stored");
                ItemOutcome::Success
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to store ticket image");
                ItemOutcome::Error
            }
        }
    }
}

/// Submit a bulk ticket-generation job. Unknown attendee ids are rejected
/// up front, before any work is queued.
pub async fn submit_bulk_ticket_gen(
    engine: &JobEngine,
    directory: &dyn AttendeeDirectory,
    renderer: Arc<TicketRenderer>,
    out_dir: PathBuf,
    event_id: &str,
    request: BulkTicketRequest,
) -> Result<(String, usize)> {
    let attendees: Vec<Attendee> = match &request.attendee_ids {
        Some(ids) => {
            let mut selected = Vec::with_capacity(ids.len());
            for id in ids {
                selected.push(directory.get(event_id, id).await?);
            }
            selected
        }
        None => directory
            .list(event_id)
            .await?
            .into_iter()
            .filter(|attendee| attendee.approval == ApprovalStatus::Approved)
            .collect(),
    };

    let items: Vec<TicketData> = attendees
        .iter()
        .map(|attendee| request.ticket_data(attendee))
        .collect();
    let total = items.len();

    tokio::fs::create_dir_all(&out_dir).await?;
    let handler = TicketBatchHandler {
        renderer,
        template: Arc::new(request.template.clone()),
        out_dir,
    };
    let job_id = engine.submit(JobType::BulkTicketGen, items, handler);
    Ok((job_id, total))
}
