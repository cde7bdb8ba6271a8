//! Shared fixtures for the tutorial-style integration tests

#![allow(dead_code)]

use courier::core::config::ProviderConfig;
use courier::message::Message;
use std::sync::Arc;
use std::time::Duration;

/// Reply wait used by the borrower side of the tutorials, shortened for tests
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(3);

pub fn tutorial_config() -> ProviderConfig {
    ProviderConfig {
        provider_name: "tutorial".to_string(),
        auto_create_destinations: false,
        queues: vec!["LoanRequestQ".to_string(), "LoanResponseQ".to_string()],
        topics: vec!["RateTopic".to_string(), "ChatTopic".to_string()],
        request_timeout_ms: 3_000,
        shutdown_grace_ms: 500,
        ..ProviderConfig::default()
    }
}

/// Lender decision: salary to loan ratio above 0.25 below 200000, above 0.33 otherwise
pub fn loan_decision(salary: f64, loan_amount: f64) -> &'static str {
    let ratio = salary / loan_amount;
    let threshold = if loan_amount < 200_000.0 { 0.25 } else { 0.33 };
    if ratio > threshold {
        "Accepted!"
    } else {
        "Declined"
    }
}

/// Borrower advice when a new rate is published
pub fn refinance_advice(current_rate: f64, new_rate: f64) -> &'static str {
    if current_rate - new_rate >= 1.0 {
        "Consider refinancing loan"
    } else {
        "Keep existing loan"
    }
}

pub fn chat_line(user: &str, text: &str) -> String {
    format!("{user}\t:\t{text}")
}

pub fn text_of(message: &Arc<Message>) -> String {
    message.payload().as_text().unwrap_or_default().to_string()
}

/// Poll `condition` until it holds, panicking after five seconds
pub async fn wait_for(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met within five seconds");
}
