//! Correlation tokens and selector filters.
//!
//! Resources provisioned for one catalog never reference each other by
//! backend identifier. Instead every producer carries the catalog's
//! [`CorrelationToken`] under [`CORRELATION_KEY`], and every consumer declares
//! a [`Selector`] of the form `(catalog.correlation=<token>)` that the backend
//! resolves when it wires the resource up.

mod selector;
mod token;

pub use selector::{Selector, SelectorError, SelectorValue};
pub use token::CorrelationToken;

/// Property key that carries the correlation token on producing resources.
pub const CORRELATION_KEY: &str = "catalog.correlation";
