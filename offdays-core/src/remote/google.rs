//! Google Calendar v3 adapter.
//!
//! Vacations are mirrored as all-day events on the account's primary
//! calendar. Google treats the end date of an all-day event as exclusive, so
//! the inclusive ledger interval is widened by one day on the way out.

use async_trait::async_trait;
use chrono::Duration;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::remote::adapter::{CalendarSync, MirrorEvent};
use crate::remote::auth::Credential;

const EVENTS_URL: &str = "https://www.googleapis.com/calendar/v3/calendars/primary/events";

/// Google Calendar REST client.
#[derive(Default)]
pub struct GoogleCalendar {
    http: reqwest::Client,
}

#[derive(Serialize)]
struct EventBody {
    summary: String,
    description: String,
    start: EventDate,
    end: EventDate,
}

#[derive(Serialize)]
struct EventDate {
    date: String,
}

#[derive(Deserialize)]
struct InsertedEvent {
    id: String,
}

impl GoogleCalendar {
    pub fn new() -> Self {
        GoogleCalendar {
            http: reqwest::Client::new(),
        }
    }

    fn body(event: &MirrorEvent) -> EventBody {
        EventBody {
            summary: event.summary.clone(),
            description: event.description.clone(),
            start: EventDate {
                date: event.start_date.to_string(),
            },
            end: EventDate {
                // exclusive all-day end date
                date: (event.end_date + Duration::days(1)).to_string(),
            },
        }
    }

    /// Already-gone events count as deleted.
    fn delete_outcome(status: StatusCode) -> LedgerResult<()> {
        if status.is_success() || status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Ok(());
        }

        Err(LedgerError::Sync(format!(
            "event delete failed: HTTP {status}"
        )))
    }
}

#[async_trait]
impl CalendarSync for GoogleCalendar {
    async fn create_event(
        &self,
        credential: &Credential,
        event: &MirrorEvent,
    ) -> LedgerResult<String> {
        let response = self
            .http
            .post(EVENTS_URL)
            .bearer_auth(&credential.access_token)
            .json(&Self::body(event))
            .send()
            .await
            .map_err(|e| LedgerError::Sync(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LedgerError::Sync(format!(
                "event insert failed: HTTP {}",
                response.status()
            )));
        }

        let inserted: InsertedEvent = response
            .json()
            .await
            .map_err(|e| LedgerError::Sync(e.to_string()))?;

        Ok(inserted.id)
    }

    async fn update_event(
        &self,
        credential: &Credential,
        event_id: &str,
        event: &MirrorEvent,
    ) -> LedgerResult<()> {
        let response = self
            .http
            .put(format!("{EVENTS_URL}/{event_id}"))
            .bearer_auth(&credential.access_token)
            .json(&Self::body(event))
            .send()
            .await
            .map_err(|e| LedgerError::Sync(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LedgerError::Sync(format!(
                "event update failed: HTTP {}",
                response.status()
            )));
        }

        Ok(())
    }

    async fn delete_event(&self, credential: &Credential, event_id: &str) -> LedgerResult<()> {
        let response = self
            .http
            .delete(format!("{EVENTS_URL}/{event_id}"))
            .bearer_auth(&credential.access_token)
            .send()
            .await
            .map_err(|e| LedgerError::Sync(e.to_string()))?;

        Self::delete_outcome(response.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_day_end_date_is_exclusive() {
        let event = MirrorEvent::vacation(
            "Jane Doe",
            "2025-06-01".parse().unwrap(),
            "2025-06-05".parse().unwrap(),
        );
        let body = GoogleCalendar::body(&event);

        assert_eq!(body.start.date, "2025-06-01");
        assert_eq!(body.end.date, "2025-06-06");
        assert_eq!(body.summary, "Jane Doe - Vacation");
    }

    #[test]
    fn single_day_vacation_spans_one_day() {
        let event = MirrorEvent::vacation(
            "Jane Doe",
            "2025-06-03".parse().unwrap(),
            "2025-06-03".parse().unwrap(),
        );
        let body = GoogleCalendar::body(&event);

        assert_eq!(body.start.date, "2025-06-03");
        assert_eq!(body.end.date, "2025-06-04");
    }

    #[test]
    fn delete_swallows_already_gone_events() {
        assert!(GoogleCalendar::delete_outcome(StatusCode::NO_CONTENT).is_ok());
        assert!(GoogleCalendar::delete_outcome(StatusCode::NOT_FOUND).is_ok());
        assert!(GoogleCalendar::delete_outcome(StatusCode::GONE).is_ok());
    }

    #[test]
    fn delete_surfaces_other_failures() {
        let err = GoogleCalendar::delete_outcome(StatusCode::INTERNAL_SERVER_ERROR).unwrap_err();
        assert!(matches!(err, LedgerError::Sync(_)));

        let err = GoogleCalendar::delete_outcome(StatusCode::UNAUTHORIZED).unwrap_err();
        assert!(matches!(err, LedgerError::Sync(_)));
    }
}
