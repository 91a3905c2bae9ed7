//! Data models: raw inputs, the two canonical graphs, findings and reports

pub mod raw;
pub mod transaction;
pub mod graph;
pub mod code;
pub mod finding;
pub mod report;
#[cfg(test)]
mod tests;

pub use self::raw::{RawLedgerSnapshot, RawSourceUnit, ScanInput};
pub use self::transaction::{Address, Transaction, Instruction, DecodedInstruction};
pub use self::graph::TransactionGraph;
pub use self::code::CodePatternGraph;
pub use self::finding::{Finding, FindingType, Location, Severity};
pub use self::report::{Report, Summary};
