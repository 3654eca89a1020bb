//! Interpreter-level tests.
//!
//! Programs are assembled with `AstBuilder` and run against a buffered
//! print handler; assertions read the captured lines and the result.

mod control_tests;
mod generator_tests;
mod test_helpers;
