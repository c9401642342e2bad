#![forbid(unsafe_code)]
#![deny(unreachable_patterns)]

//! A pull-based evaluation engine for tax returns.
//!
//! A [`TaxReturn`] owns the people filing and a set of [`Form`]s. Each form is a
//! map of [`Line`]s; a line's value is computed on demand and may pull in other
//! lines of the same form, lines of other forms ([`ReferenceLine`],
//! [`AccumulatorLine`], [`SymbolicLine`]) or raw input ([`InputLine`]).
//! Nothing is cached: every query recomputes its whole dependency subgraph,
//! depth first, on the calling thread.
//!
//! ```
//! use taxform_engine::{ComputedLine, Form, FormInput, InputLine, LineMap, TaxReturn};
//!
//! struct W2 {
//!     input: FormInput,
//!     lines: LineMap,
//! }
//!
//! impl W2 {
//!     fn new(wages: f64) -> Self {
//!         Self {
//!             input: FormInput::new().with("wages", wages),
//!             lines: LineMap::new()
//!                 .with("1", InputLine::new("wages"))
//!                 .with("half", ComputedLine::new(|cx| Ok(cx.sibling_as::<f64>("1")? / 2.0))),
//!         }
//!     }
//! }
//!
//! impl Form for W2 {
//!     fn name(&self) -> &str {
//!         "W-2"
//!     }
//!     fn lines(&self) -> &LineMap {
//!         &self.lines
//!     }
//!     fn input(&self) -> Option<&FormInput> {
//!         Some(&self.input)
//!     }
//! }
//!
//! let mut tr = TaxReturn::new(2019);
//! tr.add_form(W2::new(1000.0)).unwrap();
//! assert_eq!(tr.value_as::<W2, f64>("half").unwrap(), 500.0);
//! assert_eq!(tr.last_trace().unwrap().len(), 2);
//! ```
//!
//! ## Tracing
//!
//! Every evaluation carries its own [`Trace`]. [`TaxReturn::evaluate`] keeps the
//! edges of the last completed top-level line so tests and debugging tools can
//! inspect which line read which; see [`TaxReturn::last_trace`].
//!
//! ## Errors
//!
//! All failures are [`EngineError`]s. [`EngineError::kind`] sorts them into
//! missing data ([`ErrorKind::NotFound`]), setup mistakes
//! ([`ErrorKind::Inconsistency`]) and deliberately unmodeled tax features
//! ([`ErrorKind::UnsupportedFeature`]).

pub mod config;
pub mod error;
pub mod eval;
pub mod form;
pub mod input;
pub mod line;
pub mod math;
pub mod person;
pub mod tax_return;
pub mod trace;
pub mod value;

pub use crate::config::ReturnConfig;
pub use crate::error::{EngineError, EngineResult, ErrorKind};
pub use crate::eval::Evaluation;
pub use crate::form::{AsAny, Form, FormExt, LineMap};
pub use crate::input::FormInput;
pub use crate::line::{
    sum_form_lines, sum_line_of_forms, AccumulatorLine, ComputedLine, InputLine, Line,
    LineBinding, LineHeader, ReferenceLine, SymbolicLine, UnsupportedLine,
};
pub use crate::person::{Owner, Person, Relation};
pub use crate::tax_return::{FormSlot, JointFormPolicy, TaxReturn};
pub use crate::trace::{Trace, TraceEdge};
pub use crate::value::{FromValue, Value};
