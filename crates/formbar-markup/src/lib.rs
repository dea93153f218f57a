//! Form-load scan of conditional form markup.
//!
//! The engine never reads the DOM itself. This crate turns the rendered form
//! markup into the declarations the engine needs:
//!
//! - **Fields**: `input`, `select`, `textarea` and `div[name]` elements,
//!   merged by name (radio and checkbox options share one field).
//! - **Conditionals**: elements classed `formbar-conditional`, governing every
//!   field nested inside them.
//! - **Computed fields**: elements classed `formbar-evaluate`.
//!
//! # Example
//!
//! ```ignore
//! use formbar_markup::FormMarkup;
//!
//! let form = FormMarkup::load(Path::new("form.xhtml"))?;
//! for conditional in &form.conditionals {
//!     println!("{} governs {:?}", conditional.id, conditional.governs);
//! }
//! ```

pub mod error;
pub mod rules;
pub mod scan;

pub use error::{MarkupError, Result};
pub use rules::parse_rules;
pub use scan::FormMarkup;
