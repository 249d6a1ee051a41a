//! The pending-operations scheduler: reconciles every structural edit queued
//! during one sweep into a single consistent rewrite of the token vector,
//! including pointer repair.
//!
//! Handlers never mutate the token vector themselves; they only push onto a
//! [`PendingOps`] queue, which [`PendingOps::commit`] reduces to a new
//! vector in the fixed commit order: delete, insert, move (reverse),
//! move-replace (reverse), replace (reverse), func-replace (reverse).

use std::collections::HashMap;

use crate::token::{Token, TokenData};

/// Total order on op kinds used to resolve overlapping edits. Declaration
/// order is ascending priority (derived `Ord` compares by discriminant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OpPriority {
    Null,
    Temp,
    FuncReplace,
    Move,
    MrepSrc,
    WeakDelete,
    Replace,
    StrongDelete,
}

/// Where a run of inserted tokens came from, for pointer-repair identity
/// tracking.
#[derive(Debug, Clone, Copy)]
pub enum InsertOrigin {
    /// Brand-new tokens with no old-index identity (e.g. an arithmetic
    /// result, a copied subtree).
    Fresh,
    /// Tokens carried over from a contiguous old range starting at
    /// `start_old_index`, so pointers that targeted them keep resolving.
    Moved { start_old_index: usize },
}

struct Insertion {
    anchor: usize,
    tokens: Vec<Token>,
    origin: InsertOrigin,
}

type Range = (usize, usize);

/// The queue of structural edits collected during one sweep.
#[derive(Default)]
pub struct PendingOps {
    delete_ranges: Vec<(Range, OpPriority)>,
    insertions: Vec<(usize, Vec<Token>)>,
    move_ops: Vec<(Range, usize)>,
    movereplace_ops: Vec<(Range, Range)>,
    replace_ops: Vec<(Range, Vec<Token>)>,
    func_replace_ops: Vec<(Range, Vec<Token>, InsertOrigin)>,
    new_pointers: HashMap<usize, i64>,
    print_buffer: String,
}

impl PendingOps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delete(&mut self, range: Range, priority: OpPriority) {
        self.delete_ranges.push((range, priority));
    }

    /// Insert freshly-built tokens before old index `anchor` (0..=N).
    pub fn insert(&mut self, anchor: usize, tokens: Vec<Token>) {
        self.insertions.push((anchor, tokens));
    }

    /// Move the subtree at `src` to sit just before old index `dst_anchor`.
    pub fn move_tokens(&mut self, src: Range, dst_anchor: usize) {
        self.move_ops.push((src, dst_anchor));
    }

    pub fn move_replace(&mut self, src: Range, dst: Range) {
        self.movereplace_ops.push((src, dst));
    }

    pub fn replace(&mut self, range: Range, tokens: Vec<Token>) {
        self.replace_ops.push((range, tokens));
    }

    pub fn func_replace(&mut self, range: Range, tokens: Vec<Token>) {
        self.func_replace_ops.push((range, tokens, InsertOrigin::Fresh));
    }

    /// Like [`Self::func_replace`], but the single replacement token keeps
    /// the identity of `carries_identity_of`, so a pointer that targeted the
    /// original operand still resolves to it. Used by `cast` when
    /// reinterpreting a `ptr` operand in place (see design notes).
    pub fn func_replace_carrying_identity(&mut self, range: Range, token: Token, carries_identity_of: usize) {
        self.func_replace_ops.push((
            range,
            vec![token],
            InsertOrigin::Moved { start_old_index: carries_identity_of },
        ));
    }

    /// Override the payload used during pointer repair for the surviving (or
    /// identity-carrying) token originally at `old_index`.
    pub fn set_new_pointer(&mut self, old_index: usize, payload: i64) {
        self.new_pointers.insert(old_index, payload);
    }

    pub fn print(&mut self, bytes: &[u8]) {
        self.print_buffer.push_str(&String::from_utf8_lossy(bytes));
    }

    pub fn print_buffer(&self) -> &str {
        &self.print_buffer
    }

    /// Reduce the queue to the next token vector, applying the fixed commit
    /// order and then repairing every surviving pointer.
    pub fn commit(self, snapshot: &[Token]) -> Vec<Token> {
        let n = snapshot.len();
        let mut slot_priority = vec![OpPriority::Null; n];
        let mut insertions: Vec<Insertion> = Vec::new();

        for (range, priority) in &self.delete_ranges {
            mark(&mut slot_priority, *range, *priority);
        }

        for (anchor, tokens) in self.insertions {
            insertions.push(Insertion { anchor, tokens, origin: InsertOrigin::Fresh });
        }

        for (src, dst_anchor) in self.move_ops.into_iter().rev() {
            if mark(&mut slot_priority, src, OpPriority::Move) {
                let tokens = snapshot[src.0..src.1].to_vec();
                insertions.push(Insertion {
                    anchor: dst_anchor,
                    tokens,
                    origin: InsertOrigin::Moved { start_old_index: src.0 },
                });
            }
        }

        for (src, dst) in self.movereplace_ops.into_iter().rev() {
            // Dry-run both halves before mutating `slot_priority`: a
            // movereplace is all-or-nothing, so neither half may be marked
            // unless both would succeed.
            if can_mark(&slot_priority, src, OpPriority::MrepSrc) && can_mark(&slot_priority, dst, OpPriority::Replace) {
                mark(&mut slot_priority, src, OpPriority::MrepSrc);
                mark(&mut slot_priority, dst, OpPriority::Replace);
                let tokens = snapshot[src.0..src.1].to_vec();
                insertions.push(Insertion {
                    anchor: dst.0,
                    tokens,
                    origin: InsertOrigin::Moved { start_old_index: src.0 },
                });
            }
        }

        for (range, tokens) in self.replace_ops.into_iter().rev() {
            if mark(&mut slot_priority, range, OpPriority::Replace) {
                insertions.push(Insertion { anchor: range.0, tokens, origin: InsertOrigin::Fresh });
            }
        }

        for (range, tokens, origin) in self.func_replace_ops.into_iter().rev() {
            if mark(&mut slot_priority, range, OpPriority::FuncReplace) {
                insertions.push(Insertion { anchor: range.0, tokens, origin });
            }
        }

        let (mut result, rev) = build(snapshot, &slot_priority, insertions);
        repair_pointers(&mut result, &rev, snapshot, &self.new_pointers);
        result
    }
}

/// Would marking `range` with `priority` succeed, without mutating
/// anything? Used to dry-run a multi-range op (like movereplace) before
/// committing to either half.
fn can_mark(slot_priority: &[OpPriority], range: Range, priority: OpPriority) -> bool {
    let (a, b) = range;
    if a > b || b > slot_priority.len() {
        return false;
    }
    !(a..b).any(|i| slot_priority[i] >= priority)
}

/// Mark `range` with `priority` unless a stronger (or equal) op already
/// claimed any slot in it. All-or-nothing: a dominated op touches nothing.
fn mark(slot_priority: &mut [OpPriority], range: Range, priority: OpPriority) -> bool {
    let (a, b) = range;
    if !can_mark(slot_priority, range, priority) {
        return false;
    }
    for p in slot_priority.iter_mut().take(b).skip(a) {
        *p = priority;
    }
    true
}

fn reset_tree_fields(token: &mut Token) {
    token.parent_index = None;
    token.arg_count = 0;
    token.arguments = Vec::new();
    token.first_index = 0;
    token.last_index = 0;
}

/// Splice deletions and insertions together into the new vector, and build
/// `index_shift_rev`: for every new index, the old index its token came
/// from (`None` for freshly-inserted tokens).
fn build(
    snapshot: &[Token],
    slot_priority: &[OpPriority],
    mut insertions: Vec<Insertion>,
) -> (Vec<Token>, Vec<Option<usize>>) {
    insertions.sort_by_key(|ins| ins.anchor);
    let n = snapshot.len();
    let mut result = Vec::new();
    let mut rev: Vec<Option<usize>> = Vec::new();
    let mut iter = insertions.into_iter().peekable();

    for i in 0..=n {
        while let Some(ins) = iter.peek() {
            if ins.anchor != i {
                break;
            }
            let ins = iter.next().unwrap();
            for (k, mut tok) in ins.tokens.into_iter().enumerate() {
                reset_tree_fields(&mut tok);
                result.push(tok);
                rev.push(match ins.origin {
                    InsertOrigin::Fresh => None,
                    InsertOrigin::Moved { start_old_index } => Some(start_old_index + k),
                });
            }
        }
        if i == n {
            break;
        }
        if matches!(slot_priority[i], OpPriority::Null | OpPriority::Temp) {
            let mut tok = snapshot[i].clone();
            reset_tree_fields(&mut tok);
            result.push(tok);
            rev.push(Some(i));
        }
    }
    (result, rev)
}

/// Final step of commit: for every `ptr` token in the new vector, trace its
/// old target through the deletions and rewrite its payload relative to its
/// new position.
fn repair_pointers(
    result: &mut [Token],
    rev: &[Option<usize>],
    snapshot: &[Token],
    overrides: &HashMap<usize, i64>,
) {
    let n_old = snapshot.len();
    let mut old_to_new: Vec<Option<usize>> = vec![None; n_old + 1];
    for (new_idx, old_idx) in rev.iter().enumerate() {
        if let Some(old) = old_idx {
            if *old < n_old {
                old_to_new[*old] = Some(new_idx);
            }
        }
    }
    let n_new = result.len();
    old_to_new[n_old] = Some(n_new);

    for (new_idx, tok) in result.iter_mut().enumerate() {
        if !matches!(tok.data, TokenData::Ptr(_)) {
            continue;
        }
        let Some(old_idx) = rev[new_idx] else { continue };

        let old_payload = overrides.get(&old_idx).copied().unwrap_or_else(|| match snapshot[old_idx].data {
            TokenData::Ptr(p) => p,
            _ => 0,
        });
        let old_target = Token::ptr_target(old_payload, old_idx, n_old);

        let mut t = old_target;
        let mut new_target = n_new;
        for _ in 0..=n_old {
            if let Some(nt) = old_to_new[t] {
                new_target = nt;
                break;
            }
            t = (t + 1) % (n_old + 1);
        }
        tok.data = TokenData::Ptr(new_target as i64 - new_idx as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(v: i32) -> Token {
        Token::new(TokenData::Int32(v), v.to_string())
    }

    #[test]
    fn delete_shifts_following_pointer() {
        // tokens: [num, num, ptr(+1 -> self+1)]; delete index 0.
        let mut snapshot = vec![num(1), num(2), Token::ptr(1)];
        snapshot[2].data = TokenData::Ptr(0); // points to itself: (2+0)%4=2
        let mut ops = PendingOps::new();
        ops.delete((0, 1), OpPriority::StrongDelete);
        let result = ops.commit(&snapshot);
        assert_eq!(result.len(), 2);
        // the ptr token is now at new index 1, still pointing at itself.
        match result[1].data {
            TokenData::Ptr(p) => assert_eq!(p, 0),
            _ => panic!("expected ptr"),
        }
    }

    #[test]
    fn higher_priority_op_wins_on_conflict() {
        let snapshot = vec![num(1), num(2)];
        let mut ops = PendingOps::new();
        ops.delete((0, 2), OpPriority::WeakDelete);
        ops.delete((0, 2), OpPriority::StrongDelete);
        let result = ops.commit(&snapshot);
        assert!(result.is_empty());
    }

    #[test]
    fn dominated_op_is_skipped_entirely() {
        let snapshot = vec![num(1), num(2)];
        let mut ops = PendingOps::new();
        ops.delete((0, 2), OpPriority::StrongDelete);
        // weaker op targeting an overlapping slot should be a no-op, not
        // partially applied.
        ops.replace((1, 2), vec![num(9)]);
        let result = ops.commit(&snapshot);
        assert!(result.is_empty());
    }

    #[test]
    fn dominated_movereplace_is_skipped_entirely() {
        // destination range is already strongly deleted by a higher-priority
        // op; the whole movereplace (both halves) must be skipped, not just
        // the destination half with the source half left dangling.
        let snapshot = vec![num(1), num(2)];
        let mut ops = PendingOps::new();
        ops.delete((1, 2), OpPriority::StrongDelete);
        ops.move_replace((0, 1), (1, 2));
        let result = ops.commit(&snapshot);
        // index 0 (the would-be source) must survive untouched, since the
        // movereplace that would have consumed it never took effect.
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].data, TokenData::Int32(1));
    }

    #[test]
    fn pointer_to_deleted_slot_resolves_to_successor() {
        let mut snapshot = vec![num(1), num(2), Token::ptr(0)];
        snapshot[2].data = TokenData::Ptr(-2); // targets index 0
        let mut ops = PendingOps::new();
        ops.delete((0, 1), OpPriority::StrongDelete);
        let result = ops.commit(&snapshot);
        // index 0 deleted; nearest surviving successor of old target 0 is old index 1, now at new index 0.
        match result[1].data {
            TokenData::Ptr(p) => assert_eq!(p, 0 - 1),
            _ => panic!("expected ptr"),
        }
    }

    #[test]
    fn func_replace_yields_to_replace() {
        let snapshot = vec![num(1)];
        let mut ops = PendingOps::new();
        ops.replace((0, 1), vec![num(2)]);
        ops.func_replace((0, 1), vec![num(3)]);
        let result = ops.commit(&snapshot);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].data, TokenData::Int32(2));
    }
}
