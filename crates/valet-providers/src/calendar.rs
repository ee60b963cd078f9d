//! Built-in calendar provider over CalDAV.
//!
//! Creates events on any CalDAV-compatible server (Radicale, Nextcloud,
//! etc.) by PUTting an iCalendar VEVENT (RFC 5545).  The event URL becomes
//! the link returned to the user.  Events are written with floating local
//! times, matching the no-timezone-suffix convention of the extraction
//! prompts.

use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use valet_core::{CalendarSettings, EventSlots};

use crate::error::{ProviderError, ProviderResult};

/// Tool name reported in audit metadata for calendar dispatches.
pub const CALENDAR_TOOL: &str = "create_event";

/// Bound on every calendar call.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// iCalendar datetime format for floating local times.
const ICAL_FORMAT: &str = "%Y%m%dT%H%M%S";

/// A created calendar event.
#[derive(Debug, Clone)]
pub struct CalendarEvent {
    /// The generated event UID.
    pub uid: String,
    /// URL of the stored event, when the server exposes one.
    pub link: Option<String>,
}

/// The calendar collaborator: event slots in, stored event out.
#[async_trait]
pub trait Calendar: Send + Sync {
    /// Create an event.  `description` is free text attached to the event.
    async fn create_event(
        &self,
        slots: &EventSlots,
        description: Option<&str>,
    ) -> ProviderResult<CalendarEvent>;
}

/// CalDAV-backed calendar.
pub struct CaldavCalendar {
    collection: Url,
    username: Option<String>,
    password: Option<String>,
    http: reqwest::Client,
}

impl CaldavCalendar {
    /// Create a calendar client from settings.
    pub fn new(settings: &CalendarSettings) -> ProviderResult<Self> {
        let mut base = settings.url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let collection = Url::parse(&base).map_err(|e| ProviderError::Config {
            reason: format!("invalid CalDAV URL '{}': {e}", settings.url),
        })?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Config {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            collection,
            username: settings.username.clone(),
            password: settings.password.clone(),
            http,
        })
    }
}

#[async_trait]
impl Calendar for CaldavCalendar {
    async fn create_event(
        &self,
        slots: &EventSlots,
        description: Option<&str>,
    ) -> ProviderResult<CalendarEvent> {
        let uid = Uuid::now_v7().to_string();
        let ical = build_vevent(&uid, slots, description);

        let event_url =
            self.collection
                .join(&format!("{uid}.ics"))
                .map_err(|e| ProviderError::Config {
                    reason: format!("could not build event URL: {e}"),
                })?;

        debug!(url = %event_url, title = %slots.title, "putting calendar event");

        let mut request = self
            .http
            .put(event_url.clone())
            .header("Content-Type", "text/calendar; charset=utf-8")
            .body(ical);
        if let Some(user) = &self.username {
            request = request.basic_auth(user, self.password.as_deref());
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Invocation {
                tool: CALENDAR_TOOL.to_string(),
                reason: format!("calendar server returned {status}: {text}"),
            });
        }

        info!(uid = %uid, "calendar event created");
        Ok(CalendarEvent {
            uid,
            link: Some(event_url.to_string()),
        })
    }
}

/// Render a VCALENDAR wrapping one VEVENT.
fn build_vevent(uid: &str, slots: &EventSlots, description: Option<&str>) -> String {
    let dtstart = slots.start.format(ICAL_FORMAT);
    let dtend = slots.end.format(ICAL_FORMAT);
    let summary = escape_ical_text(&slots.title);

    let mut ical = String::with_capacity(512);
    ical.push_str("BEGIN:VCALENDAR\r\n");
    ical.push_str("VERSION:2.0\r\n");
    ical.push_str("PRODID:-//Valet//Calendar//EN\r\n");
    ical.push_str("BEGIN:VEVENT\r\n");
    ical.push_str(&format!("UID:{uid}\r\n"));
    ical.push_str(&format!("DTSTART:{dtstart}\r\n"));
    ical.push_str(&format!("DTEND:{dtend}\r\n"));
    ical.push_str(&format!("SUMMARY:{summary}\r\n"));
    if let Some(desc) = description {
        ical.push_str(&format!("DESCRIPTION:{}\r\n", escape_ical_text(desc)));
    }
    ical.push_str("END:VEVENT\r\n");
    ical.push_str("END:VCALENDAR\r\n");
    ical
}

/// Escape text per RFC 5545 (commas, semicolons, backslashes, newlines).
fn escape_ical_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace(';', "\\;")
        .replace('\n', "\\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
