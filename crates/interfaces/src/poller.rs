use crate::messages::{BackgroundRequest, BackgroundResponse};
use crate::traits::{MessageChannel, ProtocolError};
use std::time::Duration;
use tab_sorter_tasks::{JobSnapshot, JobStatus};

/// Polls job status every `interval` until it is terminal, then resets the
/// slot so the consumed result cannot be mistaken for a later request's.
pub async fn poll_until_settled(
    channel: &dyn MessageChannel,
    interval: Duration,
    max_wait: Duration,
) -> Result<JobSnapshot, ProtocolError> {
    let settled = tokio::time::timeout(max_wait, wait_for_terminal(channel, interval))
        .await
        .map_err(|_| ProtocolError::Timeout)??;

    channel
        .send(BackgroundRequest::ResetCategorizationStatus)
        .await?;
    Ok(settled)
}

async fn wait_for_terminal(
    channel: &dyn MessageChannel,
    interval: Duration,
) -> Result<JobSnapshot, ProtocolError> {
    loop {
        match channel
            .send(BackgroundRequest::GetCategorizationStatus)
            .await?
        {
            BackgroundResponse::Status(snapshot) if snapshot.status.is_terminal() => {
                return Ok(snapshot);
            }
            BackgroundResponse::Status(snapshot) if snapshot.status == JobStatus::Analyzing => {
                tokio::time::sleep(interval).await
            }
            // Idle: no job was started, or another consumer already reset it.
            other => {
                return Err(ProtocolError::UnexpectedResponse {
                    request: "getCategorizationStatus".to_string(),
                    response: format!("{:?}", other),
                })
            }
        }
    }
}
