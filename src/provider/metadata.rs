//! Provider metadata

use crate::core::version;
use serde::Serialize;
use std::fmt;

/// Message property names this provider maintains on every message
pub const SUPPORTED_PROPERTIES: &[&str] = &["JMSXDeliveryCount", "JMSXProducerID"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderMetadata {
    pub provider_name: String,
    pub provider_version: String,
    pub api_version: u32,
    pub build_time: String,
    pub git_hash: String,
    pub supported_properties: Vec<String>,
}

impl ProviderMetadata {
    pub(crate) fn new(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            provider_version: version::crate_version().to_string(),
            api_version: version::api_version(),
            build_time: version::build_time().to_string(),
            git_hash: version::git_hash().to_string(),
            supported_properties: SUPPORTED_PROPERTIES.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn supports_property(&self, name: &str) -> bool {
        self.supported_properties.iter().any(|p| p == name)
    }
}

impl fmt::Display for ProviderMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Provider name:    {}", self.provider_name)?;
        writeln!(f, "Provider version: {}", self.provider_version)?;
        writeln!(f, "API version:      {}", self.api_version)?;
        writeln!(f, "Built:            {} ({})", self.build_time, self.git_hash)?;
        write!(f, "Properties:       {}", self.supported_properties.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_reports_build_information() {
        let metadata = ProviderMetadata::new("loans");

        assert_eq!(metadata.provider_name, "loans");
        assert_eq!(metadata.provider_version, env!("CARGO_PKG_VERSION"));
        assert!(!metadata.build_time.is_empty());
        assert!(!metadata.git_hash.is_empty());
        assert!(metadata.supports_property("JMSXDeliveryCount"));
        assert!(metadata.supports_property("JMSXProducerID"));
        assert!(!metadata.supports_property("JMSXGroupID"));
    }

    #[test]
    fn test_display_lists_properties() {
        let text = ProviderMetadata::new("loans").to_string();

        assert!(text.starts_with("Provider name:    loans"));
        assert!(text.contains("JMSXDeliveryCount, JMSXProducerID"));
    }
}
