//! Constants used throughout the scanner

pub mod programs;
pub mod patterns;
pub mod entities;
