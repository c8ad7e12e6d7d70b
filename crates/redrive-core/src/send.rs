use crate::error::SendError;
use crate::service::QueueService;

/// Sends a single message to `queue_url`, returning the id SQS assigned to it.
pub async fn send_message<S: QueueService + ?Sized>(
    service: &S,
    queue_url: &str,
    body: &str,
) -> Result<String, SendError> {
    if queue_url.trim().is_empty() {
        return Err(SendError::MissingQueueUrl);
    }

    let message_id = service.send_message(queue_url, body).await?;
    log::debug!("sent message {message_id} to {queue_url}");
    Ok(message_id)
}
