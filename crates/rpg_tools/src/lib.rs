//! # RPG Development Tools
//!
//! Command-line tools for development:
//! - World config validation
//! - XP and combat level tables

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod tables;
pub mod validate;
