//! Provider tests

mod lifecycle;
mod persistence;
mod producer;

use crate::core::config::ProviderConfig;

pub(super) fn loan_config() -> ProviderConfig {
    ProviderConfig {
        provider_name: "loans".to_string(),
        auto_create_destinations: false,
        queues: vec!["LoanRequestQ".to_string(), "LoanResponseQ".to_string()],
        topics: vec!["RateTopic".to_string()],
        shutdown_grace_ms: 200,
        ..ProviderConfig::default()
    }
}
