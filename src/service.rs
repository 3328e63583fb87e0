//! NATS check service.
//!
//! Consumes check requests, runs them through the dispatcher with bounded
//! concurrency, and publishes a response for every request.

use anyhow::Result;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::consumer::CheckConsumer;
use crate::metrics::{MetricsReporter, ServiceMetrics};
use crate::models::inference::InferenceDispatcher;
use crate::producer::VerdictProducer;
use crate::types::verdict::{CheckRequest, CheckResponse};

/// Handle one raw request payload.
///
/// Never substitutes a default verdict: failures come back as a response
/// with `error` set.
pub fn process_request(
    dispatcher: &InferenceDispatcher,
    metrics: &ServiceMetrics,
    payload: &[u8],
) -> CheckResponse {
    let start = Instant::now();

    let request = match serde_json::from_slice::<CheckRequest>(payload) {
        Ok(request) => request,
        Err(e) => {
            let elapsed = start.elapsed();
            warn!(error = %e, "Failed to deserialize check request");
            metrics.record_failure("malformed_request", elapsed);
            return CheckResponse::failure(
                uuid::Uuid::new_v4().to_string(),
                format!("malformed request: {e}"),
                elapsed.as_micros() as u64,
            );
        }
    };

    let request_id = request
        .request_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let tx = request.transaction;

    let outcome = tx.validate().and_then(|()| dispatcher.check_one(&tx));
    let elapsed = start.elapsed();

    match outcome {
        Ok(verdict) => {
            metrics.record_verdict(verdict, elapsed);
            debug!(
                request_id = %request_id,
                verdict = ?verdict,
                processing_time_us = elapsed.as_micros() as u64,
                "Check complete"
            );
            CheckResponse::verdict(request_id, verdict, elapsed.as_micros() as u64)
        }
        Err(e) => {
            metrics.record_failure(e.kind(), elapsed);
            warn!(request_id = %request_id, error = %e, "Check failed");
            CheckResponse::failure(request_id, e.to_string(), elapsed.as_micros() as u64)
        }
    }
}

/// Run the check service until the subscription closes
pub async fn serve(config: &AppConfig, dispatcher: InferenceDispatcher) -> Result<()> {
    let metrics = Arc::new(ServiceMetrics::new());
    let dispatcher = Arc::new(dispatcher);

    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = CheckConsumer::new(client.clone(), &config.nats.check_subject);
    let producer = VerdictProducer::new(client, &config.nats.verdict_subject);

    let num_workers = config.service.workers.max(1);
    info!(
        workers = num_workers,
        classifier = %dispatcher.classifier_name(),
        check_subject = %consumer.subject(),
        verdict_subject = %producer.subject(),
        "Starting check service"
    );

    let semaphore = Arc::new(Semaphore::new(num_workers));

    let reporter = MetricsReporter::new(metrics.clone(), config.service.metrics_interval_secs);
    tokio::spawn(reporter.start());

    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        let permit = semaphore.clone().acquire_owned().await?;

        let dispatcher = dispatcher.clone();
        let metrics = metrics.clone();
        let producer = producer.clone();

        let reply = message.reply.clone();

        tokio::spawn(async move {
            // Inference is synchronous; keep it off the async workers
            let response = tokio::task::spawn_blocking(move || {
                process_request(&dispatcher, &metrics, &message.payload)
            })
            .await;

            match response {
                Ok(response) => {
                    if let Err(e) = producer.publish(&response, reply).await {
                        error!(
                            request_id = %response.request_id,
                            error = %e,
                            "Failed to publish check response"
                        );
                    }
                }
                Err(e) => error!(error = %e, "Check task panicked"),
            }

            drop(permit);
        });
    }

    info!("Check service shutting down...");
    metrics.print_summary();

    Ok(())
}
