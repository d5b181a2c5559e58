//! Command implementations.

pub mod compare;
pub mod evaluate;
pub mod history;
pub mod report;

pub use compare::execute_compare;
pub use evaluate::execute_evaluate;
pub use history::execute_history;
pub use report::execute_report;
