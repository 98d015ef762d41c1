//! Core types for Vitrine.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod plan;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Cents, format_brl, percentage_of};
pub use plan::{AffiliateBilling, Feature, Plan};
pub use status::*;
