//! The token model: a tagged numeric-or-instruction cell with transient tree
//! fields used only while a parsed view of the program is live.

use crate::instruction::Opcode;

/// The eight token types. Order matters: it is also the promotion rank used
/// by [`promote`], from narrowest to widest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Int32,
    Uint32,
    Int64,
    Uint64,
    Ptr,
    Float,
    Double,
    Instr,
}

impl TokenType {
    /// Rank used for arithmetic promotion; higher wins.
    fn rank(self) -> u8 {
        match self {
            TokenType::Int32 => 0,
            TokenType::Uint32 => 1,
            TokenType::Int64 => 2,
            TokenType::Uint64 => 3,
            TokenType::Ptr => 4,
            TokenType::Float => 5,
            TokenType::Double => 6,
            TokenType::Instr => 7,
        }
    }

    pub fn from_index(i: i64) -> Option<TokenType> {
        match i {
            0 => Some(TokenType::Int32),
            1 => Some(TokenType::Uint32),
            2 => Some(TokenType::Int64),
            3 => Some(TokenType::Uint64),
            4 => Some(TokenType::Ptr),
            5 => Some(TokenType::Float),
            6 => Some(TokenType::Double),
            7 => Some(TokenType::Instr),
            _ => None,
        }
    }

    pub fn index(self) -> i64 {
        self.rank() as i64
    }
}

/// The widest of two types, per the promotion lattice
/// `double > float > ptr > uint64 > int64 > uint32 > int32`.
pub fn promote(a: TokenType, b: TokenType) -> TokenType {
    if a.rank() >= b.rank() {
        a
    } else {
        b
    }
}

/// The in-band payload. Every variant stores its value in its own type;
/// reinterpretation between variants always goes through [`Token::cast`],
/// never a bitcast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenData {
    Int32(i32),
    Uint32(u32),
    Int64(i64),
    Uint64(u64),
    Ptr(i64),
    Float(f32),
    Double(f64),
    Instr(i64),
}

impl TokenData {
    pub fn token_type(self) -> TokenType {
        match self {
            TokenData::Int32(_) => TokenType::Int32,
            TokenData::Uint32(_) => TokenType::Uint32,
            TokenData::Int64(_) => TokenType::Int64,
            TokenData::Uint64(_) => TokenType::Uint64,
            TokenData::Ptr(_) => TokenType::Ptr,
            TokenData::Float(_) => TokenType::Float,
            TokenData::Double(_) => TokenType::Double,
            TokenData::Instr(_) => TokenType::Instr,
        }
    }

    /// Read the payload as a double, the widest numeric representation.
    pub fn as_f64(self) -> f64 {
        match self {
            TokenData::Int32(v) => v as f64,
            TokenData::Uint32(v) => v as f64,
            TokenData::Int64(v) => v as f64,
            TokenData::Uint64(v) => v as f64,
            TokenData::Ptr(v) => v as f64,
            TokenData::Float(v) => v as f64,
            TokenData::Double(v) => v,
            TokenData::Instr(v) => v as f64,
        }
    }

    /// Read the payload as a signed 64-bit integer, truncating floats.
    pub fn as_i64(self) -> i64 {
        match self {
            TokenData::Int32(v) => v as i64,
            TokenData::Uint32(v) => v as i64,
            TokenData::Int64(v) => v,
            TokenData::Uint64(v) => v as i64,
            TokenData::Ptr(v) => v,
            TokenData::Float(v) => v as i64,
            TokenData::Double(v) => v as i64,
            TokenData::Instr(v) => v,
        }
    }

    /// Reinterpret (never bitcast) this payload as `ty`.
    pub fn cast(self, ty: TokenType) -> TokenData {
        match ty {
            TokenType::Int32 => TokenData::Int32(self.as_i64() as i32),
            TokenType::Uint32 => TokenData::Uint32(self.as_i64() as u32),
            TokenType::Int64 => TokenData::Int64(self.as_i64()),
            TokenType::Uint64 => TokenData::Uint64(self.as_i64() as u64),
            TokenType::Ptr => TokenData::Ptr(self.as_i64()),
            TokenType::Float => TokenData::Float(self.as_f64() as f32),
            TokenType::Double => TokenData::Double(self.as_f64()),
            TokenType::Instr => TokenData::Instr(self.as_i64()),
        }
    }

    /// `true` for numeric types and `ptr`, i.e. every type except `instr`.
    pub fn is_numeric_or_pointer(self) -> bool {
        !matches!(self, TokenData::Instr(_))
    }

    /// Payload-level equality with NaN normalized to equal itself, the rule
    /// fixed-point detection relies on. Ordinary comparisons (`cmp`/`lt`/`gt`)
    /// must not use this; see [`crate::token::arithmetic::numeric_compare`].
    pub fn fixed_point_eq(self, other: TokenData) -> bool {
        match (self, other) {
            (TokenData::Float(a), TokenData::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (TokenData::Double(a), TokenData::Double(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => self == other,
        }
    }
}

/// One cell of the program stream.
///
/// The tree fields (`parent_index`, `arg_count`, `arguments`, `first_index`,
/// `last_index`) are valid only between a [`crate::core::parser::parse`] call
/// and the next mutation of the token vector; reading them afterwards is a
/// logic error in the caller, not a runtime one.
#[derive(Debug, Clone)]
pub struct Token {
    pub data: TokenData,
    pub orig_str: String,
    pub parent_index: Option<usize>,
    /// Declared arity; `-1` for dynamic-arity container headers.
    pub arg_count: i64,
    pub arguments: Vec<usize>,
    pub first_index: usize,
    pub last_index: usize,
}

impl Token {
    pub fn new(data: TokenData, orig_str: impl Into<String>) -> Token {
        Token {
            data,
            orig_str: orig_str.into(),
            parent_index: None,
            arg_count: 0,
            arguments: Vec::new(),
            first_index: 0,
            last_index: 0,
        }
    }

    pub fn instr(op: Opcode, orig_str: impl Into<String>) -> Token {
        Token::new(TokenData::Instr(op.index() as i64), orig_str)
    }

    pub fn ptr(payload: i64) -> Token {
        Token::new(TokenData::Ptr(payload), payload.to_string())
    }

    pub fn token_type(&self) -> TokenType {
        self.data.token_type()
    }

    pub fn is_numeric_or_pointer(&self) -> bool {
        self.data.is_numeric_or_pointer()
    }

    /// An instruction opcode, if this token holds one.
    pub fn opcode(&self) -> Option<Opcode> {
        match self.data {
            TokenData::Instr(i) => Opcode::from_index(i as usize),
            _ => None,
        }
    }

    pub fn is_opcode(&self, op: Opcode) -> bool {
        self.opcode() == Some(op)
    }

    pub fn is_container_header(&self) -> bool {
        matches!(
            self.opcode(),
            Some(Opcode::List) | Some(Opcode::Seq) | Some(Opcode::Ulist) | Some(Opcode::Useq)
        )
    }

    pub fn is_end(&self) -> bool {
        self.is_opcode(Opcode::End)
    }

    /// A value that cannot itself trigger further reduction this sweep: any
    /// numeric/pointer token, or a `q`-quoted subtree treated opaquely.
    pub fn is_static(&self) -> bool {
        self.is_numeric_or_pointer() || self.is_opcode(Opcode::Q)
    }

    /// Resolve a pointer's target absolute index, `(i + payload) mod (n+1)`.
    pub fn ptr_target(payload: i64, index: usize, n: usize) -> usize {
        let ring = (n + 1) as i64;
        let idx = index as i64;
        (((idx + payload) % ring) + ring) as usize % (ring as usize)
    }
}

pub mod arithmetic {
    use super::*;

    /// Euclidean modulus, `(a % b + b) % b`, so the result always shares the
    /// sign of the divisor.
    pub fn mod_euclid_i64(a: i64, b: i64) -> i64 {
        ((a % b) + b) % b
    }

    pub fn mod_euclid_f64(a: f64, b: f64) -> f64 {
        let r = a % b;
        if r != 0.0 && (r < 0.0) != (b < 0.0) {
            r + b
        } else {
            r
        }
    }

    fn is_float_like(ty: TokenType) -> bool {
        matches!(ty, TokenType::Float | TokenType::Double)
    }

    fn is_unsigned(ty: TokenType) -> bool {
        matches!(ty, TokenType::Uint32 | TokenType::Uint64)
    }

    fn make(ty: TokenType, value: f64, int_value: i64) -> TokenData {
        match ty {
            TokenType::Int32 => TokenData::Int32(int_value as i32),
            TokenType::Uint32 => TokenData::Uint32(int_value as u32),
            TokenType::Int64 => TokenData::Int64(int_value),
            TokenType::Uint64 => TokenData::Uint64(int_value as u64),
            TokenType::Ptr => TokenData::Ptr(int_value),
            TokenType::Float => TokenData::Float(value as f32),
            TokenType::Double => TokenData::Double(value),
            TokenType::Instr => TokenData::Instr(int_value),
        }
    }

    /// `add`, `sub`, `mul`, `pow`, `atan2`, `and`, `or`, `xor` computed in the
    /// promoted type. `div`/`mod` additionally promote integer division by
    /// zero to float.
    pub fn binary(op: Opcode, a: TokenData, b: TokenData) -> TokenData {
        let mut ty = promote(a.token_type(), b.token_type());
        if matches!(op, Opcode::Div | Opcode::Mod)
            && !is_float_like(ty)
            && b.as_i64() == 0
        {
            ty = TokenType::Float;
        }

        if is_float_like(ty) {
            let x = a.as_f64();
            let y = b.as_f64();
            let result = match op {
                Opcode::Add => x + y,
                Opcode::Sub => x - y,
                Opcode::Mul => x * y,
                Opcode::Div => x / y,
                Opcode::Mod => mod_euclid_f64(x, y),
                Opcode::Pow => x.powf(y),
                Opcode::Atan2 => x.atan2(y),
                Opcode::And => ((x as i64) & (y as i64)) as f64,
                Opcode::Or => ((x as i64) | (y as i64)) as f64,
                Opcode::Xor => ((x as i64) ^ (y as i64)) as f64,
                _ => unreachable!("binary() called with non-binary opcode {op:?}"),
            };
            make(ty, result, result as i64)
        } else {
            let x = a.as_i64();
            let y = b.as_i64();
            let result = match op {
                Opcode::Add => x.wrapping_add(y),
                Opcode::Sub => x.wrapping_sub(y),
                Opcode::Mul => x.wrapping_mul(y),
                Opcode::Div => x.wrapping_div(y),
                Opcode::Mod => mod_euclid_i64(x, y),
                Opcode::Pow => (x as f64).powi(y as i32) as i64,
                Opcode::Atan2 => (x as f64).atan2(y as f64) as i64,
                Opcode::And => x & y,
                Opcode::Or => x | y,
                Opcode::Xor => x ^ y,
                _ => unreachable!("binary() called with non-binary opcode {op:?}"),
            };
            let _ = is_unsigned(ty);
            make(ty, result as f64, result)
        }
    }

    /// `log`, `log2`, `sin`, `cos`, `tan`, `asin`, `acos`, `atan`, `floor`,
    /// `ceil`, `not`, computed in the operand's own type (promotion only
    /// applies to binary ops).
    pub fn unary(op: Opcode, a: TokenData) -> TokenData {
        let ty = a.token_type();
        // `not` stays in the operand's native integer width: routing it
        // through `as_f64()` would silently lose precision for Int64/Uint64
        // magnitudes beyond 2^53 before the bitwise complement is taken.
        if matches!(op, Opcode::Not) {
            let result = !a.as_i64();
            return make(ty, result as f64, result);
        }
        let x = a.as_f64();
        let result = match op {
            Opcode::Log => x.ln(),
            Opcode::Log2 => x.log2(),
            Opcode::Sin => x.sin(),
            Opcode::Cos => x.cos(),
            Opcode::Tan => x.tan(),
            Opcode::Asin => x.asin(),
            Opcode::Acos => x.acos(),
            Opcode::Atan => x.atan(),
            Opcode::Floor => x.floor(),
            Opcode::Ceil => x.ceil(),
            _ => unreachable!("unary() called with non-unary opcode {op:?}"),
        };
        make(ty, result, result as i64)
    }

    /// Ordinary numeric comparison; unlike [`TokenData::fixed_point_eq`],
    /// NaN never compares equal here.
    pub fn numeric_compare(a: TokenData, b: TokenData) -> std::cmp::Ordering {
        a.as_f64().partial_cmp(&b.as_f64()).unwrap_or(std::cmp::Ordering::Greater)
    }

    /// `cmp`, `lt`, `gt`: canonical int32 result.
    pub fn compare(op: Opcode, a: TokenData, b: TokenData) -> TokenData {
        use std::cmp::Ordering::*;
        let ord = numeric_compare(a, b);
        let v = match op {
            Opcode::Cmp => match ord {
                Less => -1,
                Equal => 0,
                Greater => 1,
            },
            Opcode::Lt => (ord == Less) as i32,
            Opcode::Gt => (ord == Greater) as i32,
            _ => unreachable!("compare() called with non-comparison opcode {op:?}"),
        };
        TokenData::Int32(v)
    }
}
