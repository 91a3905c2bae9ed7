//! Utility functions and helpers

pub mod union_find;
pub mod pii;
pub mod control;
