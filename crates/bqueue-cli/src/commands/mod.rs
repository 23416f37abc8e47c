//! CLI command implementations.

pub mod common;
pub mod manifest;
pub mod run;
pub mod selftest;
pub mod status;
pub mod submit;
pub mod version;
pub mod wait;
