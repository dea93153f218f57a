use thiserror::Error;

/// Errors raised while setting up an [`HttpEvaluator`](crate::HttpEvaluator).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("evaluator URL is empty")]
    EmptyUrl,

    #[error("evaluator URL '{0}' is not an absolute http(s) URL")]
    RelativeUrl(String),

    #[error("evaluator timeout must be greater than zero")]
    ZeroTimeout,
}
