//! Sanharness - validation and characterization harness for memory-safety
//! instrumentation
//!
//! The instrumentation tool itself is an external collaborator invoked only
//! as opaque binaries. This crate provides the two entry points around it:
//! a differential test runner that checks instrumented programs against a
//! catalog of expected outcomes, and a benchmark driver that quantifies the
//! time, memory, and binary-size overhead the instrumentation imposes.

pub mod bench;
pub mod catalog;
pub mod classify;
pub mod cli;
pub mod exec;
pub mod report;
pub mod runner;
pub mod stats;
pub mod toolchain;
