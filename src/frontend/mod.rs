//! Front-end: source text in, token vector out.

pub mod compiler;

pub use compiler::compile;
