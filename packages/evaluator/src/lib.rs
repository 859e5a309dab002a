//! Renders a template tree straight into a runtime backend, making the same
//! calls the compiled module makes.

mod error;
mod evaluator;
pub mod expression;
mod interpreter;
mod lexer;
mod scope;

pub use error::{EvalError, EvalResult};
pub use evaluator::Evaluator;
pub use expression::{parse_expression, Expression};
pub use interpreter::evaluate;
pub use scope::Scope;
