//! Inline form validation for the verb training site
//!
//! Debounced "already in use" checks for sign-up fields, the dependent
//! selects of the admin forms, the status filters of the results table, and
//! the host page state they read.

pub mod binding;
pub mod cascade;
pub mod checker;
pub mod config;
pub mod error;
pub mod form;
pub mod host;
pub mod results;
pub mod view;

mod client;

pub use binding::{Validator, ValidatorBinding};
pub use client::*;
