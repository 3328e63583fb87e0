//! Test Check Request Producer
//!
//! Generates random UPI check requests and publishes them to NATS for
//! exercising the check service.

use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};
use upi_fraud_check::schema::CategoryFamily;
use upi_fraud_check::types::{CheckRequest, RawTransaction};

/// Request generator for testing
struct RequestGenerator {
    rng: rand::rngs::ThreadRng,
    request_counter: u64,
}

impl RequestGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            request_counter: 0,
        }
    }

    /// Generate an everyday transaction
    fn generate_routine(&mut self) -> CheckRequest {
        let amount = self.rng.gen_range(10.0..5_000.0);
        self.request(amount)
    }

    /// Generate a high-value transaction
    fn generate_high_value(&mut self) -> CheckRequest {
        let amount = self.rng.gen_range(50_000.0..500_000.0);
        self.request(amount)
    }

    fn request(&mut self, amount: f64) -> CheckRequest {
        self.request_counter += 1;

        let transaction = RawTransaction {
            amount: (amount * 100.0_f64).round() / 100.0,
            year: self.rng.gen_range(2018..=2025),
            month: self.rng.gen_range(1..=12),
            transaction_type: self.random_member(CategoryFamily::TransactionType),
            payment_gateway: self.random_member(CategoryFamily::PaymentGateway),
            transaction_state: self.random_member(CategoryFamily::TransactionState),
            merchant_category: self.random_member(CategoryFamily::MerchantCategory),
        };

        CheckRequest {
            request_id: Some(format!("req_{:012}", self.request_counter)),
            transaction,
        }
    }

    fn random_member(&mut self, family: CategoryFamily) -> String {
        let members = family.members();
        members[self.rng.gen_range(0..members.len())].to_string()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Check Request Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("upi.checks");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let high_value_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        high_value_rate = high_value_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, high_value_rate, delay_ms).await;
        }
    };

    let mut generator = RequestGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Starting to publish {} check requests...", count);

    let mut routine_count = 0;
    let mut high_value_count = 0;

    for i in 0..count {
        let request = if rng.gen_bool(high_value_rate) {
            high_value_count += 1;
            generator.generate_high_value()
        } else {
            routine_count += 1;
            generator.generate_routine()
        };

        let payload = serde_json::to_vec(&request)?;
        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} requests ({} routine, {} high value)",
                i + 1,
                count,
                routine_count,
                high_value_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    client.flush().await?;
    info!(
        "Completed! Published {} requests ({} routine, {} high value)",
        count, routine_count, high_value_count
    );

    Ok(())
}

async fn run_dry_mode(count: u64, high_value_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = RequestGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let request = if rng.gen_bool(high_value_rate) {
            generator.generate_high_value()
        } else {
            generator.generate_routine()
        };

        let json = serde_json::to_string_pretty(&request)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample request {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
