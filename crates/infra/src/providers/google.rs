//! Google Calendar free/busy client

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use slotwise_domain::{BusyInterval, CalendarCredential, ProviderKind, Result, SlotwiseError};

use crate::errors::InfraError;

const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Client for the Google Calendar `freeBusy` endpoint.
pub struct GoogleBusyClient {
    client: Client,
    base_url: String,
}

impl GoogleBusyClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, GOOGLE_CALENDAR_API_BASE)
    }

    /// Points the client at a different API base, used by tests that run
    /// against a local mock server.
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }

    /// Fetches busy intervals for the token owner's primary calendar.
    pub async fn fetch_busy(
        &self,
        credential: &CalendarCredential,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>> {
        let url = format!("{}/freeBusy", self.base_url);
        let body = FreeBusyRequest {
            time_min: window_start.to_rfc3339_opts(SecondsFormat::Secs, true),
            time_max: window_end.to_rfc3339_opts(SecondsFormat::Secs, true),
            items: vec![FreeBusyItem { id: "primary".to_string() }],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&credential.access_token)
            .json(&body)
            .send()
            .await
            .map_err(InfraError::from)?
            .error_for_status()
            .map_err(InfraError::from)?;

        let payload: FreeBusyResponse = response.json().await.map_err(|e| {
            InfraError(SlotwiseError::Network(format!(
                "Failed to parse Google free/busy response: {}",
                e
            )))
        })?;

        let mut intervals = Vec::new();
        for calendar in payload.calendars.into_values() {
            for period in calendar.busy {
                let start = parse_rfc3339(&period.start)?;
                let end = parse_rfc3339(&period.end)?;
                // Participant index 0 is provisional; the engine re-tags it.
                if let Some(interval) = BusyInterval::new(start, end, 0, ProviderKind::Google) {
                    intervals.push(interval);
                }
            }
        }
        Ok(intervals)
    }
}

fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(value).map_err(|e| {
        SlotwiseError::Network(format!("Unparseable busy period timestamp '{}': {}", value, e))
    })?;
    Ok(parsed.with_timezone(&Utc))
}

#[derive(Debug, Serialize)]
struct FreeBusyRequest {
    #[serde(rename = "timeMin")]
    time_min: String,
    #[serde(rename = "timeMax")]
    time_max: String,
    items: Vec<FreeBusyItem>,
}

#[derive(Debug, Serialize)]
struct FreeBusyItem {
    id: String,
}

#[derive(Debug, Deserialize)]
struct FreeBusyResponse {
    #[serde(default)]
    calendars: HashMap<String, CalendarBusy>,
}

#[derive(Debug, Deserialize)]
struct CalendarBusy {
    #[serde(default)]
    busy: Vec<BusyPeriod>,
}

#[derive(Debug, Deserialize)]
struct BusyPeriod {
    start: String,
    end: String,
}
