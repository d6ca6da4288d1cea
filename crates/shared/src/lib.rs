//! Shared utilities and common types for the guest registry backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Field validation helpers for `validator` derives
//! - Text helpers for tabular input (blank detection, lenient integer parsing)

pub mod text;
pub mod validation;
