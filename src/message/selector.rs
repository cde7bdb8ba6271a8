//! Message selectors
//!
//! A [`Selector`] is a predicate a consumer uses to pick messages out of a
//! queue or subscription. Selectors can also be parsed from the small
//! JMS-style subset used by request/reply clients:
//!
//! ```text
//! JMSCorrelationID = 'ID:1234' AND region = 'west' AND priority IS NOT NULL
//! ```

use super::Message;
use crate::provider::error::{ProviderError, ProviderResult};
use regex::Regex;
use std::fmt;
use std::sync::{Arc, LazyLock};

const CORRELATION_ID_FIELD: &str = "JMSCorrelationID";
const MESSAGE_ID_FIELD: &str = "JMSMessageID";

static EQUALS_TERM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_$][A-Za-z0-9_.$]*)\s*=\s*'((?:[^']|'')*)'")
        .unwrap_or_else(|e| panic!("invalid equals term pattern: {e}"))
});

static NOT_NULL_TERM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*([A-Za-z_$][A-Za-z0-9_.$]*)\s+IS\s+NOT\s+NULL\b")
        .unwrap_or_else(|e| panic!("invalid not-null term pattern: {e}"))
});

static CONJUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*AND\s+").unwrap_or_else(|e| panic!("invalid conjunction pattern: {e}"))
});

#[derive(Clone, Default)]
pub enum Selector {
    /// Matches every message
    #[default]
    All,
    CorrelationId(String),
    MessageId(String),
    HeaderEquals { name: String, value: String },
    HeaderExists(String),
    AllOf(Vec<Selector>),
    Predicate(Arc<dyn Fn(&Message) -> bool + Send + Sync>),
}

impl Selector {
    pub fn correlation_id(id: impl Into<String>) -> Self {
        Selector::CorrelationId(id.into())
    }

    pub fn header_equals(name: impl Into<String>, value: impl Into<String>) -> Self {
        Selector::HeaderEquals {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn header_exists(name: impl Into<String>) -> Self {
        Selector::HeaderExists(name.into())
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Message) -> bool + Send + Sync + 'static,
    {
        Selector::Predicate(Arc::new(f))
    }

    pub fn matches(&self, message: &Message) -> bool {
        match self {
            Selector::All => true,
            Selector::CorrelationId(id) => message.correlation_id() == Some(id.as_str()),
            Selector::MessageId(id) => message.id().as_str() == id,
            Selector::HeaderEquals { name, value } => message.header(name) == Some(value.as_str()),
            Selector::HeaderExists(name) => message.header(name).is_some(),
            Selector::AllOf(selectors) => selectors.iter().all(|s| s.matches(message)),
            Selector::Predicate(f) => f(message),
        }
    }

    /// Parse selector text; empty text selects everything
    pub fn parse(text: &str) -> ProviderResult<Self> {
        let invalid = |reason: &str| ProviderError::InvalidSelector {
            selector: text.to_string(),
            reason: reason.to_string(),
        };

        if text.trim().is_empty() {
            return Ok(Selector::All);
        }

        let mut terms = Vec::new();
        let mut rest = text;
        loop {
            if let Some(caps) = EQUALS_TERM.captures(rest) {
                let name = &caps[1];
                let value = caps[2].replace("''", "'");
                terms.push(Self::equals_term(name, value));
                rest = &rest[caps[0].len()..];
            } else if let Some(caps) = NOT_NULL_TERM.captures(rest) {
                terms.push(Selector::HeaderExists(caps[1].to_string()));
                rest = &rest[caps[0].len()..];
            } else {
                return Err(invalid("expected `name = 'value'` or `name IS NOT NULL`"));
            }

            if rest.trim().is_empty() {
                break;
            }
            match CONJUNCTION.find(rest) {
                Some(m) => rest = &rest[m.end()..],
                None => return Err(invalid("expected AND between terms")),
            }
        }

        Ok(match terms.len() {
            1 => terms.remove(0),
            _ => Selector::AllOf(terms),
        })
    }

    fn equals_term(name: &str, value: String) -> Self {
        match name {
            CORRELATION_ID_FIELD => Selector::CorrelationId(value),
            MESSAGE_ID_FIELD => Selector::MessageId(value),
            _ => Selector::HeaderEquals {
                name: name.to_string(),
                value,
            },
        }
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::All => write!(f, "All"),
            Selector::CorrelationId(id) => f.debug_tuple("CorrelationId").field(id).finish(),
            Selector::MessageId(id) => f.debug_tuple("MessageId").field(id).finish(),
            Selector::HeaderEquals { name, value } => f
                .debug_struct("HeaderEquals")
                .field("name", name)
                .field("value", value)
                .finish(),
            Selector::HeaderExists(name) => f.debug_tuple("HeaderExists").field(name).finish(),
            Selector::AllOf(selectors) => f.debug_tuple("AllOf").field(selectors).finish(),
            Selector::Predicate(_) => write!(f, "Predicate(<fn>)"),
        }
    }
}
