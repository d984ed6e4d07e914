//! `formsync` reconciles form and question IDs between two instances of a
//! forms application and rewrites configuration that references them.
//!
//! The pipeline is: validate the exports ([`index`]), pair forms by name and
//! questions by position or content ([`mapping`]), rewrite IDs through the
//! resulting maps ([`rewrite`]), and check a formatting-preserving text patch
//! against the structural result ([`verify`]).

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod index;
pub mod logging;
pub mod mapping;
pub mod model;
pub mod rewrite;
pub mod signature;
pub mod util;
pub mod verify;

pub use error::{FormsyncError, Result, StructuredError};
