use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, trace};

use formbar_core::{EvalError, EvalValue, Evaluator};

use crate::error::RemoteError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings of an [`HttpEvaluator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpEvaluatorConfig {
    /// Absolute URL of the rule endpoint.
    pub url: String,
    /// Applied to connect, read and write separately.
    pub timeout: Duration,
    pub user_agent: String,
}

impl HttpEvaluatorConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: default_user_agent(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

pub fn default_user_agent() -> String {
    format!("formbar/{}", env!("CARGO_PKG_VERSION"))
}

/// Body of an evaluator answer.
#[derive(Debug, Deserialize)]
struct EvalResponse {
    #[serde(default)]
    data: EvalValue,
    #[serde(default)]
    success: Option<bool>,
}

/// Evaluator calling `GET <url>?rule=<expression>` and reading the `data`
/// member of the JSON answer.
#[derive(Debug, Clone)]
pub struct HttpEvaluator {
    agent: ureq::Agent,
    url: String,
}

impl HttpEvaluator {
    pub fn new(config: HttpEvaluatorConfig) -> Result<Self, RemoteError> {
        let url = config.url.trim();
        if url.is_empty() {
            return Err(RemoteError::EmptyUrl);
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(RemoteError::RelativeUrl(url.to_string()));
        }
        if config.timeout.is_zero() {
            return Err(RemoteError::ZeroTimeout);
        }
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.timeout)
            .timeout_read(config.timeout)
            .timeout_write(config.timeout)
            .user_agent(&config.user_agent)
            .build();
        Ok(Self {
            agent,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Evaluator for HttpEvaluator {
    fn evaluate(&self, expr: &str) -> Result<EvalValue, EvalError> {
        trace!(url = %self.url, expr, "requesting evaluation");
        let response = self
            .agent
            .get(&self.url)
            .query("rule", expr)
            .call()
            .map_err(eval_error_from_ureq)?;
        let body: EvalResponse = serde_json::from_reader(response.into_reader())
            .map_err(|err| EvalError::InvalidResponse(err.to_string()))?;
        if body.success == Some(false) {
            debug!(url = %self.url, "evaluator reported failure");
            return Err(EvalError::Rejected(expr.to_string()));
        }
        Ok(body.data)
    }
}

fn eval_error_from_ureq(err: ureq::Error) -> EvalError {
    match err {
        ureq::Error::Status(status, _) => EvalError::Status(status),
        ureq::Error::Transport(transport) => EvalError::Transport(transport.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unusable_config() {
        assert_eq!(
            HttpEvaluator::new(HttpEvaluatorConfig::new("  ")).unwrap_err(),
            RemoteError::EmptyUrl
        );
        assert_eq!(
            HttpEvaluator::new(HttpEvaluatorConfig::new("/rules/evaluate")).unwrap_err(),
            RemoteError::RelativeUrl("/rules/evaluate".to_string())
        );
        assert_eq!(
            HttpEvaluator::new(
                HttpEvaluatorConfig::new("http://localhost/x").with_timeout(Duration::ZERO)
            )
            .unwrap_err(),
            RemoteError::ZeroTimeout
        );
    }

    #[test]
    fn response_without_success_flag() {
        let body: EvalResponse = serde_json::from_str(r#"{"data": 3}"#).unwrap();
        assert_eq!(body.data, serde_json::json!(3));
        assert_eq!(body.success, None);
    }
}
