//! LSF (Load Sharing Facility) integration.
//!
//! Jobs are submitted with `bsub` and tracked with `bjobs`. Both commands are
//! driven through a [`CommandRunner`](crate::exec::CommandRunner) and their
//! textual output is parsed strictly: anything unexpected is an error.

mod adapter;
pub mod parser;

pub use adapter::LsfAdapter;
pub use parser::LsfState;
