//! Vitrine Core - Shared domain types.
//!
//! This crate provides the types shared by every Vitrine component:
//! - `server` - JSON API for platform admins, store owners and buyers
//! - `cli` - Command-line tools for migrations and admin bootstrap
//!
//! # Architecture
//!
//! The core crate contains only types and pure business rules - no I/O, no
//! database access, no HTTP. Plan entitlements, order status transitions and
//! money arithmetic live here so they can be tested without a database.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, statuses, plans and money helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
