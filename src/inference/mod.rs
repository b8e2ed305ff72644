//! inference — uncertainty of fitted coefficient vectors.
//!
//! Classical standard errors from the observed information at `θ̂`, computed
//! in the unconstrained coefficient space searched by the optimizer. Model
//! layers supply a gradient callback of the negative log-likelihood; see
//! [`hessian::calc_standard_errors`].

pub mod hessian;

pub use self::hessian::calc_standard_errors;
