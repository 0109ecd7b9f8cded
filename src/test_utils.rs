//! Helpers for writing Whitespace programs in tests.
//!
//! Programs are written in the usual `S`/`T`/`L` notation (space, tab, line feed);
//! every other character of the notation is dropped.

pub const DUP: &str = "SLS";
pub const SWAP: &str = "SLT";
pub const DISCARD: &str = "SLL";
pub const ADD: &str = "TSSS";
pub const SUB: &str = "TSST";
pub const MUL: &str = "TSSL";
pub const DIV: &str = "TSTS";
pub const MOD: &str = "TSTT";
pub const STORE: &str = "TTS";
pub const RETRIEVE: &str = "TTT";
pub const RET: &str = "LTL";
pub const END: &str = "LLL";
pub const PUTC: &str = "TLSS";
pub const PUTN: &str = "TLST";
pub const GETC: &str = "TLTS";
pub const GETN: &str = "TLTT";

/// Translates `S`/`T`/`L` notation into real program text.
pub fn ws(notation: &str) -> String {
    notation
        .chars()
        .filter_map(|c| match c {
            'S' => Some(' '),
            'T' => Some('\t'),
            'L' => Some('\n'),
            _ => None,
        })
        .collect()
}

/// Encodes a number immediate in `S`/`T`/`L` notation.
pub fn num(n: i64) -> String {
    let sign = if n < 0 { "T" } else { "S" };
    let bits = if n == 0 {
        String::new()
    } else {
        format!("{:b}", n.unsigned_abs()).replace('0', "S").replace('1', "T")
    };
    format!("{sign}{bits}L")
}

pub fn push(n: i64) -> String {
    format!("SS{}", num(n))
}

pub fn copy(n: i64) -> String {
    format!("STS{}", num(n))
}

pub fn slide(n: i64) -> String {
    format!("STL{}", num(n))
}

pub fn mark(label: &str) -> String {
    format!("LSS{label}L")
}

pub fn call(label: &str) -> String {
    format!("LST{label}L")
}

pub fn jump(label: &str) -> String {
    format!("LSL{label}L")
}

pub fn jz(label: &str) -> String {
    format!("LTS{label}L")
}

pub fn jn(label: &str) -> String {
    format!("LTT{label}L")
}

/// Joins instructions in notation form into program text.
pub fn program<S: AsRef<str>>(parts: &[S]) -> String {
    parts.iter().map(|part| ws(part.as_ref())).collect()
}
