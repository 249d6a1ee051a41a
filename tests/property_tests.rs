//! Property-based tests checking invariants from `spec.md` §8 across a
//! range of generated inputs.

use proptest::prelude::*;
use sweepvm::{Interpreter, InterpreterConfig};

/// Generates small integer literals as plain decimal words.
fn int_literal_strategy() -> impl Strategy<Value = i32> {
    -1000i32..1000
}

proptest! {
    /// `add a b` always reduces to a single token carrying `a + b`,
    /// regardless of sign, in exactly one sweep.
    #[test]
    fn add_always_reduces_to_the_sum(a in int_literal_strategy(), b in int_literal_strategy()) {
        let source = format!("add {a} {b}");
        let mut interpreter = Interpreter::compile(&source, InterpreterConfig::default()).unwrap();
        interpreter.run().unwrap();
        let tokens = interpreter.tokens();
        prop_assert_eq!(tokens.len(), 1);
        prop_assert_eq!(tokens[0].data.as_i64(), a as i64 + b as i64);
    }

    /// `if` always picks the branch matching the truthiness of its
    /// condition, never both and never neither.
    #[test]
    fn if_always_picks_exactly_one_branch(cond in int_literal_strategy()) {
        let source = format!("if {cond} q 1 q 0");
        let mut interpreter = Interpreter::compile(&source, InterpreterConfig::default()).unwrap();
        interpreter.run().unwrap();
        let tokens = interpreter.tokens();
        prop_assert_eq!(tokens.len(), 1);
        let expected = if cond != 0 { 1 } else { 0 };
        prop_assert_eq!(tokens[0].data.as_i64(), expected);
    }

    /// A fixed point, once reached, is stable: running the same program
    /// again from its own output changes nothing.
    #[test]
    fn fixed_point_is_idempotent(a in int_literal_strategy(), b in int_literal_strategy()) {
        let source = format!("add {a} {b}");
        let mut interpreter = Interpreter::compile(&source, InterpreterConfig::default()).unwrap();
        interpreter.run().unwrap();
        let first = interpreter.tokens().to_vec();

        let rendered: Vec<String> = first.iter().map(|t| t.orig_str.clone()).collect();
        let mut again = Interpreter::compile(&rendered.join(" "), InterpreterConfig::default()).unwrap();
        again.run().unwrap();
        prop_assert_eq!(again.tokens().len(), first.len());
    }
}
