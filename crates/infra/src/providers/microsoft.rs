//! Microsoft Graph schedule client

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use slotwise_domain::constants::SLOT_GRANULARITY_MINUTES;
use slotwise_domain::{BusyInterval, CalendarCredential, ProviderKind, Result, SlotwiseError};

use crate::errors::InfraError;

const MICROSOFT_GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";

/// Client for the Microsoft Graph `getSchedule` endpoint.
pub struct MicrosoftBusyClient {
    client: Client,
    base_url: String,
}

impl MicrosoftBusyClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, MICROSOFT_GRAPH_API_BASE)
    }

    /// Points the client at a different API base, used by tests that run
    /// against a local mock server.
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }

    /// Fetches busy intervals for the credential owner's schedule.
    ///
    /// `getSchedule` resolves schedules by address, so the credential must
    /// carry the owner's email.
    pub async fn fetch_busy(
        &self,
        credential: &CalendarCredential,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>> {
        let Some(email) = credential.email.as_deref() else {
            return Err(SlotwiseError::Auth(
                "Microsoft schedule lookup requires the credential email".to_string(),
            ));
        };

        let url = format!("{}/me/calendar/getSchedule", self.base_url);
        let body = GetScheduleRequest {
            schedules: vec![email.to_string()],
            start_time: GraphDateTime::utc(window_start),
            end_time: GraphDateTime::utc(window_end),
            availability_view_interval: SLOT_GRANULARITY_MINUTES,
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

        let payload: GetScheduleResponse = response.json().await.map_err(|e| {
            InfraError(SlotwiseError::Network(format!(
                "Failed to parse Graph schedule response: {}",
                e
            )))
        })?;

        collect_busy(payload)
    }
}

/// Flattens schedule items into busy intervals, skipping slots Graph marks
/// as free.
fn collect_busy(payload: GetScheduleResponse) -> Result<Vec<BusyInterval>> {
    let mut intervals = Vec::new();
    for schedule in payload.value {
        for item in schedule.schedule_items {
            if item.status.eq_ignore_ascii_case("free") {
                continue;
            }
            let start = parse_graph_datetime(&item.start)?;
            let end = parse_graph_datetime(&item.end)?;
            // Participant index 0 is provisional; the engine re-tags it.
            if let Some(interval) = BusyInterval::new(start, end, 0, ProviderKind::Microsoft) {
                intervals.push(interval);
            }
        }
    }
    Ok(intervals)
}

/// Graph echoes timestamps in the zone we request, which is always UTC here.
fn parse_graph_datetime(value: &GraphDateTime) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(&value.date_time, "%Y-%m-%dT%H:%M:%S%.f").map_err(
        |e| {
            SlotwiseError::Network(format!(
                "Unparseable schedule timestamp '{}': {}",
                value.date_time, e
            ))
        },
    )?;
    Ok(naive.and_utc())
}

#[derive(Debug, Serialize)]
struct GetScheduleRequest {
    schedules: Vec<String>,
    #[serde(rename = "startTime")]
    start_time: GraphDateTime,
    #[serde(rename = "endTime")]
    end_time: GraphDateTime,
    #[serde(rename = "availabilityViewInterval")]
    availability_view_interval: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct GraphDateTime {
    #[serde(rename = "dateTime")]
    date_time: String,
    #[serde(rename = "timeZone")]
    time_zone: String,
}

impl GraphDateTime {
    fn utc(value: DateTime<Utc>) -> Self {
        Self {
            date_time: value.naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string(),
            time_zone: "UTC".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GetScheduleResponse {
    #[serde(default)]
    value: Vec<ScheduleInfo>,
}

#[derive(Debug, Deserialize)]
struct ScheduleInfo {
    #[serde(rename = "scheduleItems", default)]
    schedule_items: Vec<ScheduleItem>,
}

#[derive(Debug, Deserialize)]
struct ScheduleItem {
    #[serde(default)]
    status: String,
    start: GraphDateTime,
    end: GraphDateTime,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn free_items_are_skipped_and_busy_kept() {
        let payload: GetScheduleResponse = serde_json::from_value(serde_json::json!({
            "value": [{
                "scheduleId": "ada@example.com",
                "scheduleItems": [
                    {
                        "status": "busy",
                        "start": { "dateTime": "2026-03-02T10:00:00.0000000", "timeZone": "UTC" },
                        "end": { "dateTime": "2026-03-02T11:00:00.0000000", "timeZone": "UTC" }
                    },
                    {
                        "status": "free",
                        "start": { "dateTime": "2026-03-02T12:00:00.0000000", "timeZone": "UTC" },
                        "end": { "dateTime": "2026-03-02T13:00:00.0000000", "timeZone": "UTC" }
                    },
                    {
                        "status": "tentative",
                        "start": { "dateTime": "2026-03-02T14:00:00", "timeZone": "UTC" },
                        "end": { "dateTime": "2026-03-02T15:00:00", "timeZone": "UTC" }
                    }
                ]
            }]
        }))
        .unwrap();

        let intervals = collect_busy(payload).unwrap();
        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[0].start, Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap());
        assert_eq!(intervals[1].start, Utc.with_ymd_and_hms(2026, 3, 2, 14, 0, 0).unwrap());
        assert!(intervals.iter().all(|i| i.provider_kind == ProviderKind::Microsoft));
    }

    #[test]
    fn malformed_timestamp_is_an_error() {
        let payload: GetScheduleResponse = serde_json::from_value(serde_json::json!({
            "value": [{
                "scheduleItems": [{
                    "status": "busy",
                    "start": { "dateTime": "yesterday-ish", "timeZone": "UTC" },
                    "end": { "dateTime": "2026-03-02T11:00:00", "timeZone": "UTC" }
                }]
            }]
        }))
        .unwrap();

        assert!(collect_busy(payload).is_err());
    }
}
