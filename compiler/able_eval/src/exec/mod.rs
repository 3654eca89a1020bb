//! Evaluation helpers that do not need the interpreter.

pub mod pattern;
