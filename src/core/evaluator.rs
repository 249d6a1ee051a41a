//! Evaluator driver: runs sweeps until the token vector reaches a fixed
//! point or the iteration cap is hit, and the instruction semantics that
//! decide, per sweep, which pending operations to queue.

use tracing::{debug, trace, warn};

use crate::common::config::InterpreterConfig;
use crate::common::errors::{InterpreterError, TypeError};
use crate::core::parser;
use crate::core::scheduler::{OpPriority, PendingOps};
use crate::core::scope::ScopeTracker;
use crate::instruction::Opcode;
use crate::token::{arithmetic, Token, TokenData, TokenType};

/// Owns the single token vector and the accumulated print buffer; there is
/// no other state to preserve between runs.
pub struct Evaluator {
    pub tokens: Vec<Token>,
    pub config: InterpreterConfig,
    pub global_print_buffer: String,
    pub iterations: u64,
}

impl Evaluator {
    pub fn new(tokens: Vec<Token>, config: InterpreterConfig) -> Self {
        Self { tokens, config, global_print_buffer: String::new(), iterations: 0 }
    }

    /// Run sweeps to a fixed point or until `max_iterations` is reached.
    pub fn run(&mut self) -> Result<(), InterpreterError> {
        loop {
            if self.iterations >= self.config.max_iterations {
                warn!(iterations = self.iterations, "iteration cap reached before a fixed point");
                break;
            }
            let mut prev = self.tokens.clone();
            parser::parse(&mut prev)?;
            debug!(sweep = self.iterations, tokens = prev.len(), "starting sweep");

            let (new_tokens, local_print) = self.sweep(&prev)?;
            self.iterations += 1;
            if self.config.print_buffer_enabled && !local_print.is_empty() {
                self.global_print_buffer.push_str(&local_print);
            }
            if self.config.print_iterations {
                let rendered: Vec<String> = new_tokens.iter().map(|t| t.orig_str.clone()).collect();
                tracing::info!(sweep = self.iterations, tokens = %rendered.join(" "), "sweep result");
            }

            let fixed_point = tokens_equal_at_fixed_point(&new_tokens, &prev);
            self.tokens = new_tokens;
            if fixed_point {
                debug!(sweep = self.iterations, "reached fixed point");
                break;
            }
        }
        Ok(())
    }

    /// One left-to-right pass over `prev`, collecting pending operations.
    /// Returns the committed token vector and this sweep's local print
    /// output.
    fn sweep(&self, prev: &[Token]) -> Result<(Vec<Token>, String), InterpreterError> {
        let mut ops = PendingOps::new();
        let mut scope = ScopeTracker::new();
        let mut pc = 0usize;

        while pc < prev.len() {
            if scope.should_skip(prev) {
                let header = scope.current().expect("should_skip implies a scope").header_index;
                pc = prev[header].last_index;
                continue;
            }

            let tok = &prev[pc];
            if tok.is_end() {
                scope.pop();
                pc += 1;
                continue;
            }
            if tok.is_numeric_or_pointer() {
                pc += 1;
                continue;
            }

            let op = tok
                .opcode()
                .ok_or_else(|| InterpreterError::internal(format!("token {pc} is instr-typed with no known opcode")))?;

            if op.is_container_header() {
                scope.push(pc);
                try_dissolve_container(pc, prev, &mut ops);
                pc += 1;
                continue;
            }
            if op == Opcode::Q {
                // Opaque: shields its subtree from reduction this sweep.
                pc = tok.last_index + 1;
                continue;
            }

            // Silent dispatch for instructions whose parent is not a
            // container; root counts as a container (see DESIGN.md).
            let silent = match tok.parent_index {
                None => false,
                Some(p) => !prev[p].is_container_header(),
            };

            trace!(pc, opcode = op.name(), "dispatch");
            let fired = dispatch(op, pc, prev, &mut ops)?;
            if fired && !silent {
                scope.mark_executed();
            } else if !fired {
                warn!(pc, opcode = op.name(), "operand not yet static, retrying next sweep");
            }
            pc += 1;
        }

        let local_print = ops.print_buffer().to_string();
        let new_tokens = ops.commit(prev);
        Ok((new_tokens, local_print))
    }
}

/// Fixed-point comparison: identical length and, slot for slot, identical
/// payload with NaN normalized equal to itself.
fn tokens_equal_at_fixed_point(a: &[Token], b: &[Token]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.data.fixed_point_eq(y.data))
}

/// `ulist`/`useq` dissolve (drop header + `end`) once every child is static,
/// or once they hold a single child whose own parent is a container.
fn try_dissolve_container(header_index: usize, prev: &[Token], ops: &mut PendingOps) {
    let header = &prev[header_index];
    let Some(op) = header.opcode() else { return };
    if !op.is_unstable_container() {
        return;
    }
    let all_static = header.arguments.iter().all(|&c| prev[c].is_static());
    let single_child_in_container = header.arguments.len() == 1 && is_container_child_slot(prev, header_index);
    if all_static || single_child_in_container {
        ops.delete((header_index, header_index + 1), OpPriority::WeakDelete);
        ops.delete((header.last_index, header.last_index + 1), OpPriority::WeakDelete);
    }
}

/// Whether `index`'s parent is a container header. The root of the program
/// counts as a container (resolving the inconsistency spec.md flags between
/// `ins` and `cpy` uniformly in favor of "root is a container").
fn is_container_child_slot(prev: &[Token], index: usize) -> bool {
    match prev[index].parent_index {
        Some(p) => prev[p].is_container_header(),
        None => true,
    }
}

fn resolve_pointer_target(prev: &[Token], operand_index: usize) -> Option<usize> {
    match prev.get(operand_index)?.data {
        TokenData::Ptr(p) => {
            let target = Token::ptr_target(p, operand_index, prev.len());
            if target < prev.len() {
                Some(target)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn clone_subtree(prev: &[Token], index: usize) -> Vec<Token> {
    let first = prev[index].first_index;
    let last = prev[index].last_index;
    prev[first..=last].to_vec()
}

/// Copy the subtree at `index`, unwrapping one level of `q` if present —
/// the rule every "source"-accepting handler (`cpy`, `set`, `ins`, `repl`,
/// `if`) follows when consuming a literal subtree as data.
fn clone_subtree_unwrap_q(prev: &[Token], index: usize) -> Vec<Token> {
    if prev[index].is_opcode(Opcode::Q) {
        let inner = prev[index].arguments[0];
        clone_subtree(prev, inner)
    } else {
        clone_subtree(prev, index)
    }
}

fn end_move_range(prev: &[Token], end_index: usize) -> (usize, usize) {
    let header_index = prev[end_index].parent_index.expect("end token always has a parent");
    match prev[header_index].parent_index {
        Some(outer) => (outer + 1, prev[outer].last_index),
        None => (0, prev.len()),
    }
}

/// `move`/`mrep` targeting an `end` token get their destination clamped into
/// the legal container slot defined by the end-move range.
fn resolve_destination_anchor(prev: &[Token], dst_raw: usize) -> usize {
    if prev[dst_raw].is_end() {
        let (lower, upper) = end_move_range(prev, dst_raw);
        dst_raw.clamp(lower, upper)
    } else {
        dst_raw
    }
}

fn display_value(data: TokenData) -> String {
    match data {
        TokenData::Double(v) => format!("{v}"),
        TokenData::Float(v) => format!("{v}"),
        _ => format!("{}", data.as_i64()),
    }
}

/// Decide and queue the pending operation(s) for the instruction at `pc`,
/// reading only `prev`. Returns whether the handler fired (`false` means
/// "not ready yet, retry next sweep", not an error).
fn dispatch(op: Opcode, pc: usize, prev: &[Token], ops: &mut PendingOps) -> Result<bool, InterpreterError> {
    let tok = &prev[pc];
    let args = tok.arguments.clone();
    let whole_range = (pc, tok.last_index + 1);

    match op {
        Opcode::Add
        | Opcode::Sub
        | Opcode::Mul
        | Opcode::Div
        | Opcode::Mod
        | Opcode::Pow
        | Opcode::Atan2
        | Opcode::And
        | Opcode::Or
        | Opcode::Xor
        | Opcode::Cmp
        | Opcode::Lt
        | Opcode::Gt => {
            if args.len() != 2 || !prev[args[0]].is_numeric_or_pointer() || !prev[args[1]].is_numeric_or_pointer() {
                return Ok(false);
            }
            let a = prev[args[0]].data;
            let b = prev[args[1]].data;
            let result = if matches!(op, Opcode::Cmp | Opcode::Lt | Opcode::Gt) {
                arithmetic::compare(op, a, b)
            } else {
                arithmetic::binary(op, a, b)
            };
            ops.func_replace(whole_range, vec![Token::new(result, display_value(result))]);
            Ok(true)
        }

        Opcode::Log
        | Opcode::Log2
        | Opcode::Sin
        | Opcode::Cos
        | Opcode::Tan
        | Opcode::Asin
        | Opcode::Acos
        | Opcode::Atan
        | Opcode::Floor
        | Opcode::Ceil
        | Opcode::Not => {
            if args.len() != 1 || !prev[args[0]].is_numeric_or_pointer() {
                return Ok(false);
            }
            let result = arithmetic::unary(op, prev[args[0]].data);
            ops.func_replace(whole_range, vec![Token::new(result, display_value(result))]);
            Ok(true)
        }

        Opcode::Cpy => {
            if args.len() != 2 {
                return Ok(false);
            }
            let (Some(src), Some(dst)) = (resolve_pointer_target(prev, args[0]), resolve_pointer_target(prev, args[1])) else {
                return Ok(false);
            };
            if !is_container_child_slot(prev, dst) {
                return Ok(false);
            }
            let copied = clone_subtree(prev, src);
            ops.insert(dst, copied);
            ops.delete(whole_range, OpPriority::WeakDelete);
            Ok(true)
        }

        Opcode::Del => {
            if args.len() != 1 {
                return Ok(false);
            }
            let Some(target) = resolve_pointer_target(prev, args[0]) else {
                return Ok(false);
            };
            let (first, last) = (prev[target].first_index, prev[target].last_index);
            ops.delete((first, last + 1), OpPriority::StrongDelete);
            ops.delete(whole_range, OpPriority::WeakDelete);
            Ok(true)
        }

        Opcode::Get => {
            if args.len() != 1 {
                return Ok(false);
            }
            let Some(target) = resolve_pointer_target(prev, args[0]) else {
                return Ok(false);
            };
            let copied = clone_subtree(prev, target);
            ops.replace(whole_range, copied);
            Ok(true)
        }

        Opcode::Set => {
            if args.len() != 2 || !prev[args[1]].is_static() {
                return Ok(false);
            }
            let Some(target) = resolve_pointer_target(prev, args[0]) else {
                return Ok(false);
            };
            let (first, last) = (prev[target].first_index, prev[target].last_index);
            let copied = clone_subtree_unwrap_q(prev, args[1]);
            ops.replace((first, last + 1), copied);
            ops.delete(whole_range, OpPriority::WeakDelete);
            Ok(true)
        }

        Opcode::Ins => {
            if args.len() != 2 || !prev[args[1]].is_static() {
                return Ok(false);
            }
            let Some(dst) = resolve_pointer_target(prev, args[0]) else {
                return Ok(false);
            };
            if !is_container_child_slot(prev, dst) {
                return Ok(false);
            }
            let copied = clone_subtree_unwrap_q(prev, args[1]);
            ops.insert(dst, copied);
            ops.delete(whole_range, OpPriority::WeakDelete);
            Ok(true)
        }

        Opcode::Repl => {
            if args.len() != 2 {
                return Ok(false);
            }
            let (Some(dst), Some(src)) = (resolve_pointer_target(prev, args[0]), resolve_pointer_target(prev, args[1])) else {
                return Ok(false);
            };
            let (first, last) = (prev[dst].first_index, prev[dst].last_index);
            let copied = clone_subtree(prev, src);
            ops.replace((first, last + 1), copied);
            ops.delete(whole_range, OpPriority::WeakDelete);
            Ok(true)
        }

        Opcode::Move => {
            if args.len() != 2 {
                return Ok(false);
            }
            let (Some(src), Some(dst_raw)) = (resolve_pointer_target(prev, args[0]), resolve_pointer_target(prev, args[1])) else {
                return Ok(false);
            };
            let anchor = resolve_destination_anchor(prev, dst_raw);
            let (first, last) = (prev[src].first_index, prev[src].last_index);
            ops.move_tokens((first, last + 1), anchor);
            ops.delete(whole_range, OpPriority::WeakDelete);
            Ok(true)
        }

        Opcode::Mrep => {
            if args.len() != 2 {
                return Ok(false);
            }
            let (Some(src), Some(dst_raw)) = (resolve_pointer_target(prev, args[0]), resolve_pointer_target(prev, args[1])) else {
                return Ok(false);
            };
            let dst = resolve_destination_anchor(prev, dst_raw);
            let (s_first, s_last) = (prev[src].first_index, prev[src].last_index);
            let (d_first, d_last) = (prev[dst].first_index, prev[dst].last_index);
            ops.move_replace((s_first, s_last + 1), (d_first, d_last + 1));
            ops.delete(whole_range, OpPriority::WeakDelete);
            Ok(true)
        }

        Opcode::If => {
            if args.len() != 3 {
                return Ok(false);
            }
            let (c, t, f) = (args[0], args[1], args[2]);
            if !prev[c].is_numeric_or_pointer() || !prev[t].is_static() || !prev[f].is_static() {
                return Ok(false);
            }
            let chosen = if prev[c].data.as_i64() != 0 { t } else { f };
            let copied = clone_subtree_unwrap_q(prev, chosen);
            ops.replace(whole_range, copied);
            Ok(true)
        }

        Opcode::Cast => {
            if args.len() != 2 || !prev[args[0]].is_numeric_or_pointer() || !prev[args[1]].is_static() {
                return Ok(false);
            }
            let tau = prev[args[0]].data.as_i64();
            let ty = TokenType::from_index(tau)
                .ok_or(InterpreterError::Type(TypeError::UnknownTypeIndex { index: tau }))?;
            let x_index = args[1];
            let new_data = prev[x_index].data.cast(ty);

            if ty == TokenType::Ptr && matches!(prev[x_index].data, TokenData::Ptr(_)) {
                ops.func_replace_carrying_identity(whole_range, Token::new(new_data, display_value(new_data)), x_index);
                ops.set_new_pointer(x_index, new_data.as_i64());
            } else {
                ops.func_replace(whole_range, vec![Token::new(new_data, display_value(new_data))]);
            }
            Ok(true)
        }

        Opcode::Print => {
            if args.len() != 1 {
                return Ok(false);
            }
            let x = args[0];
            let bytes: Vec<u8> = if prev[x].is_opcode(Opcode::List) {
                if !prev[x].arguments.iter().all(|&c| prev[c].is_static()) {
                    return Ok(false);
                }
                prev[x].arguments.iter().map(|&c| prev[c].data.as_i64() as u8).collect()
            } else if prev[x].is_numeric_or_pointer() {
                vec![prev[x].data.as_i64() as u8]
            } else {
                return Ok(false);
            };
            ops.print(&bytes);
            ops.delete(whole_range, OpPriority::WeakDelete);
            Ok(true)
        }

        Opcode::Str => {
            if args.len() != 1 || !prev[args[0]].is_static() {
                return Ok(false);
            }
            let text = display_value(prev[args[0]].data);
            let mut built = Vec::with_capacity(text.len() + 2);
            built.push(Token::instr(Opcode::List, "list"));
            for byte in text.bytes() {
                built.push(Token::new(TokenData::Int32(byte as i32), (byte as char).to_string()));
            }
            built.push(Token::instr(Opcode::End, "end"));
            ops.func_replace(whole_range, built);
            Ok(true)
        }

        Opcode::Q | Opcode::List | Opcode::Seq | Opcode::Ulist | Opcode::Useq | Opcode::End => {
            unreachable!("{op:?} is handled by the scan loop before dispatch")
        }
    }
}
