//! Reactive conditional-evaluation engine.
//!
//! A [`FormSession`] holds the state of one loaded form: the field store, the
//! dependency index from fields to the conditionals reading them, and the
//! last result of every conditional. Field edits are fed in as
//! [`FieldChange`] messages; each one runs a dispatch chain that
//!
//! 1. substitutes current field values into the dependent expressions,
//! 2. asks the injected [`Evaluator`] for a result,
//! 3. reconciles governed fields (activate, deactivate, clear, restore),
//! 4. re-queues conditionals that read a field which just changed state.
//!
//! The chain's [`Effect`]s describe what the DOM adapter has to change.
//! Evaluation failures count as false, so a broken evaluator closes regions
//! instead of opening them.

pub mod debounce;
pub mod dispatch;
pub mod effect;
pub mod error;
pub mod evaluator;
pub mod expr;
pub mod index;
pub mod reconcile;
pub mod session;
pub mod store;

pub use debounce::{DEFAULT_DEBOUNCE, Debouncer};
pub use dispatch::{DispatchReport, FieldChange};
pub use effect::Effect;
pub use error::{Result, SessionError, SubstituteError};
pub use evaluator::{EvalError, EvalValue, Evaluator, Unavailable, display_value, is_truthy};
pub use expr::{NULL_LITERAL, Substituted, referenced_fields, substitute, tokenize};
pub use index::DependencyIndex;
pub use reconcile::{Conditionals, ReconcileOutcome};
pub use session::{FormSession, NOT_A_NUMBER, RuleOutcome};
pub use store::FieldStore;
