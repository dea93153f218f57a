//! HTTP rule evaluator.
//!
//! Implements the evaluator wire contract: the substituted expression is sent
//! as the `rule` query parameter of a `GET` request and the answer is a JSON
//! object `{"data": <value>, "success": <bool>}`. Any failure (transport,
//! non-2xx status, undecodable body, `success: false`) is returned as an
//! [`EvalError`](formbar_core::EvalError), which the engine treats as false.

pub mod error;
pub mod http;

pub use error::RemoteError;
pub use http::{DEFAULT_TIMEOUT, HttpEvaluator, HttpEvaluatorConfig, default_user_agent};
