//! The fixed, ordered instruction table. Opcode indices are stable and may
//! appear as the payload of an `instr` token.

/// One entry in the instruction table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Log,
    Log2,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Floor,
    Ceil,
    Cmp,
    Lt,
    Gt,
    And,
    Or,
    Xor,
    Not,
    Cpy,
    Del,
    Set,
    Repl,
    Get,
    Ins,
    Move,
    Mrep,
    If,
    List,
    Seq,
    Ulist,
    Useq,
    End,
    Q,
    Cast,
    Print,
    Str,
}

/// `(name, declared arity)`; `-1` marks a dynamic-arity container header.
/// Index into this table is the opcode's stable numeric index.
const TABLE: &[(Opcode, &str, i64)] = &[
    (Opcode::Add, "add", 2),
    (Opcode::Sub, "sub", 2),
    (Opcode::Mul, "mul", 2),
    (Opcode::Div, "div", 2),
    (Opcode::Mod, "mod", 2),
    (Opcode::Pow, "pow", 2),
    (Opcode::Log, "log", 1),
    (Opcode::Log2, "log2", 1),
    (Opcode::Sin, "sin", 1),
    (Opcode::Cos, "cos", 1),
    (Opcode::Tan, "tan", 1),
    (Opcode::Asin, "asin", 1),
    (Opcode::Acos, "acos", 1),
    (Opcode::Atan, "atan", 1),
    (Opcode::Atan2, "atan2", 2),
    (Opcode::Floor, "floor", 1),
    (Opcode::Ceil, "ceil", 1),
    (Opcode::Cmp, "cmp", 2),
    (Opcode::Lt, "lt", 2),
    (Opcode::Gt, "gt", 2),
    (Opcode::And, "and", 2),
    (Opcode::Or, "or", 2),
    (Opcode::Xor, "xor", 2),
    (Opcode::Not, "not", 1),
    (Opcode::Cpy, "cpy", 2),
    (Opcode::Del, "del", 1),
    (Opcode::Set, "set", 2),
    (Opcode::Repl, "repl", 2),
    (Opcode::Get, "get", 1),
    (Opcode::Ins, "ins", 2),
    (Opcode::Move, "move", 2),
    (Opcode::Mrep, "mrep", 2),
    (Opcode::If, "if", 3),
    (Opcode::List, "list", -1),
    (Opcode::Seq, "seq", -1),
    (Opcode::Ulist, "ulist", -1),
    (Opcode::Useq, "useq", -1),
    (Opcode::End, "end", 0),
    (Opcode::Q, "q", 1),
    (Opcode::Cast, "cast", 2),
    (Opcode::Print, "print", 1),
    (Opcode::Str, "str", 1),
];

impl Opcode {
    pub fn index(self) -> usize {
        TABLE.iter().position(|(op, _, _)| *op == self).expect("opcode missing from TABLE")
    }

    pub fn from_index(index: usize) -> Option<Opcode> {
        TABLE.get(index).map(|(op, _, _)| *op)
    }

    pub fn name(self) -> &'static str {
        TABLE[self.index()].1
    }

    /// Declared arity; `-1` for `list`/`seq`/`ulist`/`useq`.
    pub fn arg_count(self) -> i64 {
        TABLE[self.index()].2
    }

    pub fn is_dynamic_arity(self) -> bool {
        self.arg_count() < 0
    }

    pub fn from_name(name: &str) -> Option<Opcode> {
        TABLE.iter().find(|(_, n, _)| *n == name).map(|(op, _, _)| *op)
    }

    pub fn is_container_header(self) -> bool {
        matches!(self, Opcode::List | Opcode::Seq | Opcode::Ulist | Opcode::Useq)
    }

    /// `ulist`/`useq` additionally dissolve once all children are static, or
    /// once reduced to a single child inside a container parent.
    pub fn is_unstable_container(self) -> bool {
        matches!(self, Opcode::Ulist | Opcode::Useq)
    }

    /// `seq`/`useq` run at most one child instruction per sweep.
    pub fn is_sequential_container(self) -> bool {
        matches!(self, Opcode::Seq | Opcode::Useq)
    }
}

pub const TABLE_LEN: usize = TABLE.len();
