//! Tree parser: a single linear pass that annotates a flat token vector with
//! per-token `parent_index`, `arguments`, `first_index` and `last_index`.

use crate::common::errors::ParseError;
use crate::instruction::Opcode;
use crate::token::Token;

/// An open parent on the parser's explicit stack: either a fixed-arity
/// instruction still waiting for its declared children, or a dynamic-arity
/// container waiting for its matching `end`.
struct Frame {
    index: usize,
    arg_count: i64,
    children: Vec<usize>,
}

/// Parse `tokens` in place. On success every token's tree fields are filled
/// in; on failure the vector is left partially annotated and the sweep must
/// abort (unmatched/missing `end` are fatal, per spec).
pub fn parse(tokens: &mut [Token]) -> Result<(), ParseError> {
    let mut stack: Vec<Frame> = Vec::new();
    let n = tokens.len();
    let mut i = 0;

    while i < n {
        if tokens[i].is_end() {
            let frame = match stack.pop() {
                Some(f) if tokens[f.index].is_container_header() => f,
                Some(_) | None => return Err(ParseError::UnmatchedEnd { index: i }),
            };
            finish_node(tokens, frame.index, frame.children, i, stack.last().map(|f| f.index));
            tokens[i].parent_index = Some(frame.index);
            tokens[i].arg_count = 0;
            tokens[i].arguments = Vec::new();
            tokens[i].first_index = i;
            tokens[i].last_index = i;
            close_and_propagate(tokens, &mut stack, frame.index, i);
            i += 1;
            continue;
        }

        let arg_count = tokens[i]
            .opcode()
            .map(Opcode::arg_count)
            .unwrap_or(0);
        stack.push(Frame { index: i, arg_count, children: Vec::new() });

        // Eagerly close every zero-arity, non-container frame just pushed,
        // bubbling the closure up through any now-complete ancestors.
        while let Some(top) = stack.last() {
            if top.arg_count == 0 && !tokens[top.index].is_container_header() {
                let frame = stack.pop().unwrap();
                finish_node(tokens, frame.index, frame.children, frame.index, stack.last().map(|f| f.index));
                close_and_propagate(tokens, &mut stack, frame.index, frame.index);
            } else {
                break;
            }
        }
        i += 1;
    }

    if let Some(frame) = stack.pop() {
        return Err(ParseError::MissingEnd { index: frame.index });
    }
    Ok(())
}

fn finish_node(
    tokens: &mut [Token],
    index: usize,
    children: Vec<usize>,
    last_index: usize,
    parent_index: Option<usize>,
) {
    let arity = tokens[index].arg_count;
    tokens[index].arg_count = if arity < 0 { children.len() as i64 } else { arity };
    tokens[index].arguments = children;
    tokens[index].first_index = index;
    tokens[index].last_index = last_index;
    tokens[index].parent_index = parent_index;
}

/// A node at `child_index` (spanning through `child_last`) has just been
/// finalized. Attach it to the new top of the stack as a child, and if that
/// completes the parent's declared arity, finalize the parent too and keep
/// bubbling upward.
fn close_and_propagate(
    tokens: &mut [Token],
    stack: &mut Vec<Frame>,
    mut child_index: usize,
    child_last: usize,
) {
    loop {
        let Some(parent) = stack.last_mut() else { break };
        parent.children.push(child_index);
        if parent.arg_count >= 0 && parent.children.len() as i64 == parent.arg_count {
            let done = stack.pop().unwrap();
            finish_node(tokens, done.index, done.children, child_last, stack.last().map(|f| f.index));
            child_index = done.index;
            continue;
        }
        break;
    }
    if stack.is_empty() {
        tokens[child_index].parent_index = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenData;

    fn instr(op: Opcode) -> Token {
        Token::instr(op, op.name())
    }

    fn num(v: i32) -> Token {
        Token::new(TokenData::Int32(v), v.to_string())
    }

    #[test]
    fn fixed_arity_instruction_attaches_its_children() {
        // add 2 3
        let mut tokens = vec![instr(Opcode::Add), num(2), num(3)];
        parse(&mut tokens).unwrap();
        assert_eq!(tokens[0].arguments, vec![1, 2]);
        assert_eq!(tokens[0].last_index, 2);
        assert_eq!(tokens[1].parent_index, Some(0));
        assert_eq!(tokens[2].parent_index, Some(0));
    }

    #[test]
    fn container_closes_on_matching_end() {
        // list 1 2 3 end
        let mut tokens = vec![instr(Opcode::List), num(1), num(2), num(3), instr(Opcode::End)];
        parse(&mut tokens).unwrap();
        assert_eq!(tokens[0].arguments, vec![1, 2, 3]);
        assert_eq!(tokens[0].last_index, 4);
        assert_eq!(tokens[4].parent_index, Some(0));
    }

    #[test]
    fn unmatched_end_is_an_error() {
        let mut tokens = vec![instr(Opcode::End)];
        assert!(matches!(parse(&mut tokens), Err(ParseError::UnmatchedEnd { index: 0 })));
    }

    #[test]
    fn missing_end_is_an_error() {
        let mut tokens = vec![instr(Opcode::List), num(1)];
        assert!(matches!(parse(&mut tokens), Err(ParseError::MissingEnd { .. })));
    }

    #[test]
    fn nested_fixed_arity_bubbles_up() {
        // add (add 1 2) 3
        let mut tokens = vec![instr(Opcode::Add), instr(Opcode::Add), num(1), num(2), num(3)];
        parse(&mut tokens).unwrap();
        assert_eq!(tokens[1].arguments, vec![2, 3]);
        assert_eq!(tokens[1].last_index, 3);
        assert_eq!(tokens[0].arguments, vec![1, 4]);
        assert_eq!(tokens[0].last_index, 4);
        assert_eq!(tokens[1].parent_index, Some(0));
    }
}
