use crate::{Result, Value};
use std::fmt::{Debug, Display};

/// A statement compiled by the provider, with positional parameters.
///
/// Handles are reused by the statement cache: every execution starts with
/// [`clear_bindings`](Prepared::clear_bindings) and then binds all the parameters again.
///
/// Methods return `&mut Self` for fluent chaining:
/// ```rust,ignore
/// prepared.clear_bindings()?.bind(42.into())?.bind("hello".into())?;
/// ```
pub trait Prepared: Send + Sync + Display + Debug + 'static {
    /// Resets the handle so it can run again and unbinds every parameter.
    fn clear_bindings(&mut self) -> Result<&mut Self>;
    /// Append a parameter value, after the last one bound.
    fn bind(&mut self, value: Value) -> Result<&mut Self>;
    /// Bind a value at a specific index (from 0).
    fn bind_index(&mut self, value: Value, index: u64) -> Result<&mut Self>;
    /// Number of placeholders the provider found in the SQL text.
    fn parameters(&self) -> usize;
}
