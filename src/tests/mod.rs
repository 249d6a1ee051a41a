//! In-crate smoke tests for the `Interpreter` facade. Broader end-to-end
//! coverage lives in the top-level `tests/` directory.

#[cfg(test)]
mod basic_tests {
    use crate::{Interpreter, InterpreterConfig};

    #[test]
    fn compiles_and_runs_a_trivial_program() {
        let mut interpreter = Interpreter::compile("add 2 3", InterpreterConfig::default()).unwrap();
        interpreter.run().unwrap();
        assert_eq!(interpreter.tokens().len(), 1);
    }
}
