//! Failover Review Analyst - capability probe with deterministic fallback.
//!
//! Wraps an optional rich analyst (e.g. an external reasoning capability)
//! and falls back to the deterministic keyword analyst when the primary is
//! unavailable, errors, or exceeds its timeout. Review always completes.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::ports::{AnalystError, AnalystInfo, ReviewAnalyst, ReviewAssessment, ReviewRequest};

use super::KeywordReviewAnalyst;

/// Analyst wrapper that probes the primary at call time and degrades to
/// the fallback instead of blocking the review.
pub struct FailoverReviewAnalyst {
    primary: Option<Arc<dyn ReviewAnalyst>>,
    fallback: Arc<dyn ReviewAnalyst>,
    timeout: Duration,
}

impl FailoverReviewAnalyst {
    /// Creates a wrapper with no primary: every request uses the
    /// deterministic keyword analyst.
    pub fn fallback_only() -> Self {
        Self {
            primary: None,
            fallback: Arc::new(KeywordReviewAnalyst::new()),
            timeout: Duration::from_secs(10),
        }
    }

    /// Creates a wrapper around a rich primary analyst.
    pub fn new(primary: Arc<dyn ReviewAnalyst>, timeout: Duration) -> Self {
        Self {
            primary: Some(primary),
            fallback: Arc::new(KeywordReviewAnalyst::new()),
            timeout,
        }
    }

    /// Replaces the fallback (the default is the keyword analyst).
    pub fn with_fallback(mut self, fallback: Arc<dyn ReviewAnalyst>) -> Self {
        self.fallback = fallback;
        self
    }
}

#[async_trait]
impl ReviewAnalyst for FailoverReviewAnalyst {
    async fn assess(&self, request: &ReviewRequest) -> Result<ReviewAssessment, AnalystError> {
        if let Some(primary) = &self.primary {
            // Capability probe at call time, never exception-driven control
            // flow: an unavailable primary skips straight to the fallback.
            if primary.is_available() {
                match tokio::time::timeout(self.timeout, primary.assess(request)).await {
                    Ok(Ok(assessment)) => return Ok(assessment),
                    Ok(Err(err)) => {
                        warn!(
                            analyst = %primary.analyst_info().name,
                            role = %request.role,
                            error = %err,
                            "primary analyst failed, using fallback"
                        );
                    }
                    Err(_) => {
                        warn!(
                            analyst = %primary.analyst_info().name,
                            role = %request.role,
                            timeout_secs = self.timeout.as_secs(),
                            "primary analyst timed out, using fallback"
                        );
                    }
                }
            } else {
                warn!(
                    analyst = %primary.analyst_info().name,
                    role = %request.role,
                    "primary analyst unavailable, using fallback"
                );
            }
        }
        self.fallback.assess(request).await
    }

    fn is_available(&self) -> bool {
        // The deterministic fallback keeps this wrapper always available.
        self.fallback.is_available()
    }

    fn analyst_info(&self) -> AnalystInfo {
        AnalystInfo {
            name: "failover".to_string(),
            deterministic: self.primary.is_none(),
        }
    }
}
