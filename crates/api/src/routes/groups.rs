//! Group coordination endpoints
//!
//! Polling clients drive the whole lifecycle through these routes:
//! create, join, respond, suggest, vote, and the status/suggestion reads.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use slotwise_domain::{Group, GroupStatus, Membership, MembershipState, Suggestion, VoteChoice};

use crate::context::AppContext;
use crate::error::ApiError;
use crate::routes::availability::ParticipantDto;

/* ------------------------------------------------------------------------ */
/* Request and response bodies                                              */
/* ------------------------------------------------------------------------ */

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub creator_email: String,
    pub group_name: String,
    pub invitee_emails: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationDto {
    pub invitation_id: Uuid,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupResponse {
    pub group_id: Uuid,
    pub invitations: Vec<InvitationDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGroupRequest {
    pub email: String,
    #[serde(default)]
    pub credential: Option<ParticipantDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDto {
    pub email: String,
    pub state: MembershipState,
    pub joined_at: Option<DateTime<Utc>>,
}

impl From<&Membership> for MemberDto {
    fn from(membership: &Membership) -> Self {
        Self {
            email: membership.email.clone(),
            state: membership.state(),
            joined_at: membership.joined_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
    pub group_id: Uuid,
    pub group_name: String,
    pub creator_email: String,
    pub created_at: DateTime<Utc>,
    pub status: GroupStatus,
    pub members: Vec<MemberDto>,
    pub suggestion_count: usize,
}

impl From<Group> for GroupView {
    fn from(group: Group) -> Self {
        Self {
            group_id: group.id,
            status: group.status(),
            members: group.memberships.iter().map(MemberDto::from).collect(),
            suggestion_count: group.suggestions.len(),
            group_name: group.group_name,
            creator_email: group.creator_email,
            created_at: group.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondRequest {
    pub invitation_id: Uuid,
    pub accept: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRequest {
    pub from_email: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub title: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestResponse {
    pub suggestion_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub email: String,
    pub choice: VoteChoice,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub finalized: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionView {
    pub suggestion_id: Uuid,
    pub from_email: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub title: String,
    pub votes: HashMap<String, VoteChoice>,
    pub finalized: bool,
}

impl From<Suggestion> for SuggestionView {
    fn from(suggestion: Suggestion) -> Self {
        Self {
            suggestion_id: suggestion.id,
            from_email: suggestion.from_email,
            start: suggestion.start,
            end: suggestion.end,
            title: suggestion.title,
            votes: suggestion.votes,
            finalized: suggestion.finalized,
        }
    }
}

/* ------------------------------------------------------------------------ */
/* Handlers                                                                 */
/* ------------------------------------------------------------------------ */

async fn create_group(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<CreateGroupResponse>), ApiError> {
    let group = ctx
        .coordinator
        .create_group(&body.creator_email, &body.group_name, body.invitee_emails)
        .await?;
    let invitations = group
        .invitations
        .iter()
        .map(|invitation| InvitationDto {
            invitation_id: invitation.id,
            email: invitation.email.clone(),
        })
        .collect();
    Ok((
        StatusCode::CREATED,
        Json(CreateGroupResponse { group_id: group.id, invitations }),
    ))
}

async fn join_group(
    State(ctx): State<Arc<AppContext>>,
    Path(group_id): Path<Uuid>,
    Json(body): Json<JoinGroupRequest>,
) -> Result<Json<MemberDto>, ApiError> {
    let credential = body.credential.map(ParticipantDto::into_credential);
    let membership = ctx.coordinator.join_group(group_id, &body.email, credential).await?;
    Ok(Json(MemberDto::from(&membership)))
}

// Invitation ids are globally unique, so the group segment in the path is
// URL shape only; the invitation decides which group is touched.
async fn respond_invitation(
    State(ctx): State<Arc<AppContext>>,
    Path(_group_id): Path<Uuid>,
    Json(body): Json<RespondRequest>,
) -> Result<Json<GroupView>, ApiError> {
    let group = ctx.coordinator.respond_invitation(body.invitation_id, body.accept).await?;
    Ok(Json(group.into()))
}

async fn group_status(
    State(ctx): State<Arc<AppContext>>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<GroupView>, ApiError> {
    let group = ctx.coordinator.group_status(group_id).await?;
    Ok(Json(group.into()))
}

async fn propose_slot(
    State(ctx): State<Arc<AppContext>>,
    Path(group_id): Path<Uuid>,
    Json(body): Json<SuggestRequest>,
) -> Result<(StatusCode, Json<SuggestResponse>), ApiError> {
    let suggestion_id = ctx
        .coordinator
        .propose_slot(group_id, &body.from_email, body.start, body.end, &body.title)
        .await?;
    Ok((StatusCode::CREATED, Json(SuggestResponse { suggestion_id })))
}

async fn vote_slot(
    State(ctx): State<Arc<AppContext>>,
    Path((group_id, suggestion_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, ApiError> {
    let finalized =
        ctx.coordinator.vote_slot(group_id, suggestion_id, &body.email, body.choice).await?;
    Ok(Json(VoteResponse { finalized }))
}

async fn list_suggestions(
    State(ctx): State<Arc<AppContext>>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<Vec<SuggestionView>>, ApiError> {
    let suggestions = ctx.coordinator.list_suggestions(group_id).await?;
    Ok(Json(suggestions.into_iter().map(SuggestionView::from).collect()))
}

async fn delete_group(
    State(ctx): State<Arc<AppContext>>,
    Path(group_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ctx.coordinator.delete_group(group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppContext>> {
    Router::new()
        .route("/groups", post(create_group))
        .route("/groups/{id}", delete(delete_group))
        .route("/groups/{id}/join", post(join_group))
        .route("/groups/{id}/respond", post(respond_invitation))
        .route("/groups/{id}/status", get(group_status))
        .route("/groups/{id}/suggest", post(propose_slot))
        .route("/groups/{id}/suggestions", get(list_suggestions))
        .route("/groups/{id}/suggestions/{sid}/vote", post(vote_slot))
}
