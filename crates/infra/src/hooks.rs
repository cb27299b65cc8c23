//! Finalize hook adapters

use async_trait::async_trait;
use slotwise_core::FinalizeHook;
use slotwise_domain::{Group, Result, Suggestion};
use tracing::info;

/// Hook that records unanimously accepted suggestions in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingFinalizeHook;

#[async_trait]
impl FinalizeHook for LoggingFinalizeHook {
    async fn suggestion_finalized(&self, group: &Group, suggestion: &Suggestion) -> Result<()> {
        info!(
            group_id = %group.id,
            group_name = %group.group_name,
            suggestion_id = %suggestion.id,
            start = %suggestion.start,
            end = %suggestion.end,
            title = %suggestion.title,
            "suggestion finalized"
        );
        Ok(())
    }
}
