//! End-to-end tests for the Pascaline object model
//!
//! These tests declare types and run main-block statements on a fresh
//! interpreter, verifying the globals are correct.

mod harness;
mod classes;
mod vmt;
mod properties;
mod records;
mod operators;
mod helpers;
mod interfaces;
mod types;
