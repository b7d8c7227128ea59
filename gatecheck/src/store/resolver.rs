//! Maps scan input to exactly one attendee within an event.

use serde::Deserialize;

use crate::domain::Attendee;
use crate::store::AttendeeDirectory;
use crate::{Error, Result};

/// A scan identifier; callers are expected to populate exactly one field,
/// but when several are set the resolver tries them in the fixed
/// precedence order `id`, `ticket_number`, `email`, `qr`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeIdentifier {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub ticket_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub qr: Option<String>,
}

impl AttendeeIdentifier {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.ticket_number.is_none() && self.email.is_none() && self.qr.is_none()
    }
}

/// Resolve an identifier to an attendee, or `Error::NotFound` when nothing
/// matches. An identifier with no populated field is a validation error,
/// rejected before any lookup.
pub async fn resolve(
    directory: &dyn AttendeeDirectory,
    event_id: &str,
    identifier: &AttendeeIdentifier,
) -> Result<Attendee> {
    if identifier.is_empty() {
        return Err(Error::validation("identifier has no populated field"));
    }

    if let Some(id) = &identifier.id
        && let Ok(attendee) = directory.get(event_id, id).await
    {
        return Ok(attendee);
    }
    if let Some(ticket_number) = &identifier.ticket_number
        && let Some(attendee) = directory
            .find_by_ticket_number(event_id, ticket_number)
            .await?
    {
        return Ok(attendee);
    }
    if let Some(email) = &identifier.email
        && let Some(attendee) = directory.find_by_email(event_id, email).await?
    {
        return Ok(attendee);
    }
    if let Some(qr) = &identifier.qr
        && let Some(attendee) = directory.find_by_qr(event_id, qr).await?
    {
        return Ok(attendee);
    }

    Err(Error::not_found("attendee", describe(identifier)))
}

fn describe(identifier: &AttendeeIdentifier) -> String {
    identifier
        .id
        .clone()
        .or_else(|| identifier.ticket_number.clone())
        .or_else(|| identifier.email.clone())
        .or_else(|| identifier.qr.clone())
        .unwrap_or_default()
}
