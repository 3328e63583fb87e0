//! NATS producer for check responses

use crate::types::verdict::CheckResponse;
use anyhow::Result;
use async_nats::{Client, Subject};
use tracing::debug;

/// Publishes check responses to the verdict subject and to request inboxes
#[derive(Clone)]
pub struct VerdictProducer {
    client: Client,
    subject: String,
}

impl VerdictProducer {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish a response, replying to `reply` as well when the requester asked for one
    pub async fn publish(&self, response: &CheckResponse, reply: Option<Subject>) -> Result<()> {
        let payload = serde_json::to_vec(response)?;

        if let Some(reply) = reply {
            self.client.publish(reply, payload.clone().into()).await?;
        }
        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            request_id = %response.request_id,
            verdict = ?response.verdict,
            error = ?response.error,
            "Published check response"
        );

        Ok(())
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}
