//! Query value object

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// A spoken question from the end user (Value Object)
///
/// Always non-empty after trimming. Validation happens here so the
/// orchestrator never sees a blank query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    content: String,
}

impl Query {
    /// Try to create a new query, rejecting empty or whitespace-only input
    pub fn try_new(content: impl Into<String>) -> Result<Self, DomainError> {
        let content = content.into();
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidQuery(
                "Query cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            content: trimmed.to_string(),
        })
    }

    /// Get the query content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Consume and return the inner content
    pub fn into_content(self) -> String {
        self.content
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl TryFrom<&str> for Query {
    type Error = DomainError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Query::try_new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_creation() {
        let q = Query::try_new("What is the price of bitcoin?").unwrap();
        assert_eq!(q.content(), "What is the price of bitcoin?");
    }

    #[test]
    fn test_query_is_trimmed() {
        let q = Query::try_new("  price of eth \n").unwrap();
        assert_eq!(q.content(), "price of eth");
    }

    #[test]
    fn test_empty_query_rejected() {
        assert!(Query::try_new("").is_err());
        assert!(Query::try_new("   \t\n").is_err());
    }

    #[test]
    fn test_query_try_from() {
        let q: Query = "solana".try_into().unwrap();
        assert_eq!(q.to_string(), "solana");
    }
}
