//! Error handling for the privacy scanner.
//!
//! This module provides the error taxonomy of a scan. Only configuration
//! errors, cancellation and timeouts terminate a scan call; malformed records
//! and failing heuristics are recovered locally and surface as report
//! metadata instead (see [`crate::models::report`]).

use thiserror::Error;
use std::fmt;

use crate::models::report::Report;
use crate::utils::control::Interrupt;

/// Stage of a scan, used to tell the caller where an interruption happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStage {
    /// Raw input is being turned into a graph.
    Normalize,
    /// Heuristics are being evaluated.
    Evaluate,
    /// Findings are being merged into a report.
    Aggregate,
    /// The RPC collaborator is fetching ledger data.
    Fetch,
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normalize => write!(f, "normalization"),
            Self::Evaluate => write!(f, "heuristic evaluation"),
            Self::Aggregate => write!(f, "aggregation"),
            Self::Fetch => write!(f, "ledger fetch"),
        }
    }
}

/// Main error type for a scan.
///
/// `Cancelled` and `Timeout` carry the partial report when one could be
/// built from the heuristics that finished, and `None` when the scan was
/// interrupted before any report existed.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Input that cannot be turned into a graph at all.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Invalid severity policy, unknown heuristic id or invalid threshold.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The scan was cancelled through its token.
    #[error("Scan cancelled during {stage}")]
    Cancelled {
        stage: ScanStage,
        partial: Option<Box<Report>>,
    },

    /// The scan deadline elapsed.
    #[error("Scan timed out during {stage}")]
    Timeout {
        stage: ScanStage,
        partial: Option<Box<Report>>,
    },

    /// Errors from the ledger RPC collaborator.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Errors related to file I/O, such as file not found or permission denied.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failures.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScanError {
    /// The partial report attached to an interrupted scan, if any.
    pub fn partial_report(&self) -> Option<&Report> {
        match self {
            Self::Cancelled { partial, .. } | Self::Timeout { partial, .. } => partial.as_deref(),
            _ => None,
        }
    }

    /// Error for an interrupted scan
    pub fn interrupted(interrupt: Interrupt, stage: ScanStage, partial: Option<Report>) -> Self {
        let partial = partial.map(Box::new);
        match interrupt {
            Interrupt::Cancelled => Self::Cancelled { stage, partial },
            Interrupt::TimedOut => Self::Timeout { stage, partial },
        }
    }

    /// Whether the scan was interrupted (cancelled or timed out).
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Cancelled { .. } | Self::Timeout { .. })
    }
}

/// Result type alias for the scanner.
pub type ScanResult<T> = Result<T, ScanError>;

/// Error returned by a single heuristic.
///
/// The runner never propagates it; it is recorded as a
/// [`crate::models::report::HeuristicFailure`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HeuristicError(pub String);

impl HeuristicError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Which `ScanError` variant a collaborator error maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Config,
    Rpc,
}

/// Context information for errors.
///
/// Records the component and operation that failed, plus optional details
/// such as the file path or the address being fetched.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Component where the error occurred (e.g., "monitor").
    pub component: String,

    /// Operation being performed when the error occurred (e.g., "get_transaction").
    pub operation: String,

    /// Additional context details.
    pub details: Option<String>,

    /// Variant the error is reported as.
    pub category: ErrorCategory,
}

impl ErrorContext {
    pub fn new(category: ErrorCategory, component: &str, operation: &str) -> Self {
        Self {
            component: component.to_string(),
            operation: operation.to_string(),
            details: None,
            category,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "In {} while {}", self.component, self.operation)?;
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

/// Extension trait for adding context to collaborator errors.
pub trait ErrorExt<T> {
    /// Map the error into a `ScanError` of the context's category, prefixing
    /// the message with the context.
    fn with_context(self, context: ErrorContext) -> ScanResult<T>;

    /// Shorthand for [`ErrorExt::with_context`] without details.
    fn with_simple_context(self, category: ErrorCategory, component: &str, operation: &str) -> ScanResult<T>;
}

impl<T, E: fmt::Display> ErrorExt<T> for Result<T, E> {
    fn with_context(self, context: ErrorContext) -> ScanResult<T> {
        self.map_err(|e| {
            let error_msg = format!("{}: {}", context, e);
            match context.category {
                ErrorCategory::Input => ScanError::MalformedInput(error_msg),
                ErrorCategory::Config => ScanError::Configuration(error_msg),
                ErrorCategory::Rpc => ScanError::Rpc(error_msg),
            }
        })
    }

    fn with_simple_context(self, category: ErrorCategory, component: &str, operation: &str) -> ScanResult<T> {
        self.with_context(ErrorContext::new(category, component, operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_maps_category() {
        let result: Result<(), String> = Err("boom".to_string());
        let err = result
            .with_context(ErrorContext::new(ErrorCategory::Config, "config", "load").with_details("cfg.json"))
            .unwrap_err();
        match err {
            ScanError::Configuration(msg) => {
                assert_eq!(msg, "In config while load (cfg.json): boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_interrupted_errors_expose_partial() {
        let err = ScanError::Cancelled { stage: ScanStage::Normalize, partial: None };
        assert!(err.is_interrupted());
        assert!(err.partial_report().is_none());
        assert_eq!(err.to_string(), "Scan cancelled during normalization");
    }
}
