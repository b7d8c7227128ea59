//! Bulk email dispatch adapter.
//!
//! The recipient set is snapshotted once at submission; attendees added
//! afterwards are not picked up mid-run. Throttling to `rate_per_minute`
//! is local to this adapter, not an engine feature.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::SmtpConfig;
use crate::domain::{ApprovalStatus, Attendee, CheckpointKind, ItemOutcome, JobType};
use crate::jobs::{ItemHandler, JobEngine};
use crate::store::AttendeeDirectory;
use crate::{Error, Result};

/// A rendered, ready-to-send email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Delivery seam so bulk email can run against SMTP in production and a
/// recording double in tests.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutboundEmail) -> Result<()>;
}

/// SMTP mailer backed by lettre.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| Error::mail(format!("SMTP relay error: {e}")))?
            .port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        let from = config
            .from_address
            .parse::<Mailbox>()
            .map_err(|e| Error::mail(format!("Invalid from address: {e}")))?;
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &OutboundEmail) -> Result<()> {
        let to = mail
            .to
            .parse::<Mailbox>()
            .map_err(|e| Error::mail(format!("Invalid recipient {}: {e}", mail.to)))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(mail.html.clone())
            .map_err(|e| Error::mail(format!("Failed to build message: {e}")))?;
        self.transport
            .send(message)
            .await
            .map_err(|e| Error::mail(format!("SMTP send failed: {e}")))?;
        Ok(())
    }
}

/// Development mailer that logs instead of delivering. Used when SMTP is
/// not configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &OutboundEmail) -> Result<()> {
        info!(to = %mail.to, subject = %mail.subject, "Email delivery skipped (no SMTP configured)");
        Ok(())
    }
}

/// Recipient selection criteria, evaluated once at submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientFilter {
    /// Approval status to require; default approved-only.
    #[serde(default)]
    pub approval: Option<ApprovalStatus>,
    /// Restrict by one checkpoint's scan state.
    #[serde(default)]
    pub checkpoint: Option<CheckpointKind>,
    /// With `checkpoint`: require scanned (`true`, the default) or
    /// unscanned (`false`).
    #[serde(default)]
    pub scanned: Option<bool>,
}

impl RecipientFilter {
    pub fn matches(&self, attendee: &Attendee) -> bool {
        let required = self.approval.unwrap_or(ApprovalStatus::Approved);
        if attendee.approval != required {
            return false;
        }
        if let Some(kind) = self.checkpoint {
            let want_scanned = self.scanned.unwrap_or(true);
            if attendee.checkpoints.get(kind).scanned != want_scanned {
                return false;
            }
        }
        true
    }
}

/// One bulk notification request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyRequest {
    pub subject: String,
    #[serde(default)]
    pub preheader: Option<String>,
    pub html: String,
    #[serde(default)]
    pub filter: RecipientFilter,
    #[serde(default = "default_rate")]
    pub rate_per_minute: u32,
}

fn default_rate() -> u32 {
    60
}

/// Substitute `{{placeholder}}` tokens with attendee fields.
pub fn render_placeholders(template: &str, attendee: &Attendee) -> String {
    template
        .replace("{{name}}", &attendee.name)
        .replace("{{ticketNumber}}", &attendee.ticket_number)
        .replace("{{email}}", &attendee.email)
        .replace("{{qrPayload}}", &attendee.qr_payload)
}

struct EmailBatchHandler {
    mailer: Arc<dyn Mailer>,
    subject: String,
    html: String,
    /// Minimum spacing between delivery attempts: `60 / rate_per_minute`.
    min_gap: Duration,
    last_attempt: Mutex<Option<Instant>>,
}

impl EmailBatchHandler {
    async fn throttle(&self) {
        let wait = {
            let last = self.last_attempt.lock();
            last.map(|at| self.min_gap.saturating_sub(at.elapsed()))
                .unwrap_or(Duration::ZERO)
        };
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}

#[async_trait]
impl ItemHandler for EmailBatchHandler {
    type Item = Attendee;

    async fn handle(&self, attendee: Attendee) -> ItemOutcome {
        if attendee.email.trim().is_empty() {
            return ItemOutcome::Skipped;
        }

        self.throttle().await;
        let mail = OutboundEmail {
            to: attendee.email.clone(),
            subject: render_placeholders(&self.subject, &attendee),
            html: render_placeholders(&self.html, &attendee),
        };
        let result = self.mailer.send(&mail).await;
        // Failed attempts still count toward the rate limit.
        *self.last_attempt.lock() = Some(Instant::now());

        match result {
            Ok(()) => ItemOutcome::Success,
            Err(e) => {
                warn!(to = %mail.to, error = %e, "Email delivery failed");
                ItemOutcome::Error
            }
        }
    }
}

/// Submit a bulk email job. The recipient snapshot is taken here; returns
/// the job id and snapshot size.
pub async fn submit_bulk_email(
    engine: &JobEngine,
    directory: &dyn AttendeeDirectory,
    mailer: Arc<dyn Mailer>,
    event_id: &str,
    request: NotifyRequest,
) -> Result<(String, usize)> {
    if request.subject.trim().is_empty() {
        return Err(Error::validation("subject must not be empty"));
    }
    if request.rate_per_minute == 0 {
        return Err(Error::validation("ratePerMinute must be at least 1"));
    }

    let recipients: Vec<Attendee> = directory
        .list(event_id)
        .await?
        .into_iter()
        .filter(|attendee| request.filter.matches(attendee))
        .collect();
    let total = recipients.len();

    let html = match request.preheader.as_deref() {
        Some(preheader) if !preheader.is_empty() => format!(
            "<span style=\"display:none;max-height:0;overflow:hidden\">{preheader}</span>{}",
            request.html
        ),
        _ => request.html.clone(),
    };

    let handler = EmailBatchHandler {
        mailer,
        subject: request.subject.clone(),
        html,
        min_gap: Duration::from_secs_f64(60.0 / f64::from(request.rate_per_minute)),
        last_attempt: Mutex::new(None),
    };
    let job_id = engine.submit(JobType::BulkEmail, recipients, handler);
    Ok((job_id, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attendee() -> Attendee {
        Attendee::new("Ada Lovelace", "ada@example.com", "TKT-42", "QR-42")
    }

    #[test]
    fn placeholder_substitution() {
        let out = render_placeholders(
            "Hi {{name}}, ticket {{ticketNumber}} ({{qrPayload}}) for {{email}}",
            &attendee(),
        );
        assert_eq!(
            out,
            "Hi Ada Lovelace, ticket TKT-42 (QR-42) for ada@example.com"
        );
    }

    #[test]
    fn unknown_placeholders_are_left_alone() {
        let out = render_placeholders("Hello {{nickname}}", &attendee());
        assert_eq!(out, "Hello {{nickname}}");
    }

    #[test]
    fn filter_defaults_to_approved_only() {
        let filter = RecipientFilter::default();
        assert!(filter.matches(&attendee()));
        assert!(!filter.matches(
            &attendee().with_approval(ApprovalStatus::Rejected)
        ));
    }

    #[test]
    fn filter_by_checkpoint_state() {
        let mut scanned = attendee();
        scanned
            .checkpoints
            .get_mut(CheckpointKind::Entry)
            .mark(crate::domain::ScanMethod::Qr);
        let unscanned = attendee();

        let want_scanned = RecipientFilter {
            checkpoint: Some(CheckpointKind::Entry),
            scanned: Some(true),
            ..Default::default()
        };
        assert!(want_scanned.matches(&scanned));
        assert!(!want_scanned.matches(&unscanned));

        let want_unscanned = RecipientFilter {
            checkpoint: Some(CheckpointKind::Entry),
            scanned: Some(false),
            ..Default::default()
        };
        assert!(!want_unscanned.matches(&scanned));
        assert!(want_unscanned.matches(&unscanned));
    }

    #[tokio::test]
    async fn throttle_enforces_minimum_gap_between_attempts() {
        let handler = EmailBatchHandler {
            mailer: Arc::new(LogMailer),
            subject: "s".to_string(),
            html: "h".to_string(),
            min_gap: Duration::from_millis(40),
            last_attempt: Mutex::new(None),
        };

        // First attempt goes out immediately.
        let start = Instant::now();
        handler.throttle().await;
        assert!(start.elapsed() < Duration::from_millis(20));
        *handler.last_attempt.lock() = Some(Instant::now());

        // Second attempt waits out the remainder of the gap.
        let before = Instant::now();
        handler.throttle().await;
        assert!(before.elapsed() >= Duration::from_millis(30));

        // A stale clock means no wait at all.
        *handler.last_attempt.lock() = Some(Instant::now() - Duration::from_millis(100));
        let before = Instant::now();
        handler.throttle().await;
        assert!(before.elapsed() < Duration::from_millis(20));
    }
}
