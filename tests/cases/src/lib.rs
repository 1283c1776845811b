//! # Bully group test cases
//!
//! Integration scenarios for failure detection, leader election and agreement, run over the
//! in-process broadcast bus.

#[macro_use]
extern crate log;
pub mod cases;
mod steps;
