//! Availability computation endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use slotwise_domain::{
    AvailabilityRequest, AvailabilityResponse, CalendarCredential, ProviderKind, SlotwiseError,
};

use crate::context::AppContext;
use crate::error::ApiError;

/// One participant's calendar access, as submitted by the client.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub access_token: String,
    #[serde(default)]
    pub provider_hint: Option<ProviderKind>,
    #[serde(default)]
    pub email: Option<String>,
}

impl ParticipantDto {
    pub fn into_credential(self) -> CalendarCredential {
        CalendarCredential {
            access_token: self.access_token,
            provider_hint: self.provider_hint,
            email: self.email,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequestDto {
    pub participants: Vec<ParticipantDto>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub slot_duration_minutes: i64,
    pub day_window_start: String,
    pub day_window_end: String,
    #[serde(default)]
    pub is_multi_day: bool,
    #[serde(default)]
    pub include_weekends: Option<bool>,
}

impl AvailabilityRequestDto {
    fn into_domain(self) -> Result<AvailabilityRequest, SlotwiseError> {
        Ok(AvailabilityRequest {
            participant_credentials: self
                .participants
                .into_iter()
                .map(ParticipantDto::into_credential)
                .collect(),
            window_start: self.window_start,
            window_end: self.window_end,
            slot_duration_minutes: self.slot_duration_minutes,
            day_window_start: parse_day_time("dayWindowStart", &self.day_window_start)?,
            day_window_end: parse_day_time("dayWindowEnd", &self.day_window_end)?,
            is_multi_day: self.is_multi_day,
            include_weekends: self.include_weekends,
        })
    }
}

/// Accepts `HH:MM` and `HH:MM:SS` clock times.
fn parse_day_time(field: &str, value: &str) -> Result<NaiveTime, SlotwiseError> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| {
            SlotwiseError::InvalidRequest(format!(
                "{field} must be a clock time such as 09:00, got {value:?}"
            ))
        })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDto {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub date: NaiveDate,
    pub weekday: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityMetadataDto {
    pub successful_calendars: usize,
    pub total_participants: usize,
    pub busy_events_considered: usize,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub cached: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponseDto {
    pub slots: Vec<SlotDto>,
    pub metadata: AvailabilityMetadataDto,
}

impl From<AvailabilityResponse> for AvailabilityResponseDto {
    fn from(response: AvailabilityResponse) -> Self {
        Self {
            slots: response
                .slots
                .into_iter()
                .map(|slot| SlotDto {
                    start: slot.start,
                    end: slot.end,
                    date: slot.date,
                    weekday: slot.weekday,
                })
                .collect(),
            metadata: AvailabilityMetadataDto {
                successful_calendars: response.metadata.successful_calendars,
                total_participants: response.metadata.total_participants,
                busy_events_considered: response.metadata.busy_events_considered,
                window_start: response.metadata.window_start,
                window_end: response.metadata.window_end,
                cached: response.metadata.cached,
            },
        }
    }
}

async fn compute(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<AvailabilityRequestDto>,
) -> Result<Json<AvailabilityResponseDto>, ApiError> {
    let request = body.into_domain()?;
    let response = ctx.engine.compute_availability(&request).await?;
    Ok(Json(response.into()))
}

pub fn router() -> Router<Arc<AppContext>> {
    Router::new().route("/availability", post(compute))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_times_accept_both_clock_formats() {
        assert_eq!(
            parse_day_time("dayWindowStart", "09:00").unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
        assert_eq!(
            parse_day_time("dayWindowStart", "17:30:15").unwrap(),
            NaiveTime::from_hms_opt(17, 30, 15).unwrap()
        );
    }

    #[test]
    fn bad_day_time_names_the_field() {
        let err = parse_day_time("dayWindowEnd", "5pm").unwrap_err();
        assert!(matches!(err, SlotwiseError::InvalidRequest(msg) if msg.contains("dayWindowEnd")));
    }

    #[test]
    fn request_dto_maps_onto_the_domain_request() {
        let dto: AvailabilityRequestDto = serde_json::from_value(serde_json::json!({
            "participants": [{ "accessToken": "ya29.tok", "providerHint": "google" }],
            "windowStart": "2026-09-07T00:00:00Z",
            "windowEnd": "2026-09-08T00:00:00Z",
            "slotDurationMinutes": 30,
            "dayWindowStart": "09:00",
            "dayWindowEnd": "17:00"
        }))
        .unwrap();

        let request = dto.into_domain().unwrap();
        assert_eq!(request.participant_credentials.len(), 1);
        assert_eq!(
            request.participant_credentials[0].provider_hint,
            Some(ProviderKind::Google)
        );
        assert!(!request.is_multi_day);
        assert_eq!(request.include_weekends, None);
    }
}
