//! Compile-time flags and the meta-tokenization pass.
//!
//! The raw pattern is turned into a sequence of [`MetaChar`]s before the
//! grammar-level parser ever sees it: backslash sequences collapse here, so
//! `compiler.rs` only ever has to ask "is this token a metacharacter, and if
//! so which one".

use crate::error::{RegexError, Result};

/// Compile-time configuration. The only axis this grammar has is which of
/// `(`/`)` vs `\(`/`\)` denote a capture group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileFlags {
    /// When set, bare `(`/`)` are group metacharacters and `\(`/`\)` are
    /// literal. When clear (the default), it's the other way around.
    pub excompat: bool,
}

impl CompileFlags {
    pub const EXCOMPAT: Self = Self { excompat: true };
}

/// One meta-tokenized pattern character: a byte plus whether it's a
/// metacharacter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaChar {
    byte: u8,
    special: bool,
}

impl MetaChar {
    fn literal(byte: u8) -> Self {
        MetaChar {
            byte,
            special: false,
        }
    }

    fn meta(byte: u8) -> Self {
        MetaChar {
            byte,
            special: true,
        }
    }

    pub fn byte(self) -> u8 {
        self.byte
    }

    pub fn is_special(self) -> bool {
        self.special
    }

    /// True for a metacharacter matching the given ASCII symbol.
    pub fn is(self, symbol: u8) -> bool {
        self.special && self.byte == symbol
    }
}

/// Metacharacters that never need a backslash, regardless of `excompat`.
fn always_special(byte: u8) -> bool {
    matches!(byte, b'^' | b'$' | b'.' | b'*' | b'+' | b'?' | b'|' | b'[')
}

/// Turn a raw pattern into its meta-tokenized form.
///
/// A trailing `0u8` sentinel is appended, mirroring the original NUL
/// terminator; callers may also just rely on the vector's length, but the
/// sentinel is kept so the tokenized form is byte-for-byte what the data
/// model describes.
pub fn tokenize(pattern: &[u8], flags: CompileFlags) -> Result<Vec<MetaChar>> {
    let mut out = Vec::with_capacity(pattern.len() + 1);
    let mut i = 0;
    while i < pattern.len() {
        let b = pattern[i];
        i += 1;

        if b == b'\\' {
            if i >= pattern.len() {
                return Err(RegexError::PrematureEnd);
            }
            let esc = pattern[i];
            i += 1;
            out.push(match esc {
                b'b' => MetaChar::literal(0x08),
                b't' => MetaChar::literal(b'\t'),
                b'r' => MetaChar::literal(b'\r'),
                b'<' => MetaChar::meta(b'<'),
                b'>' => MetaChar::meta(b'>'),
                b'(' if flags.excompat => MetaChar::literal(b'('),
                b')' if flags.excompat => MetaChar::literal(b')'),
                b'(' => MetaChar::meta(b'('),
                b')' => MetaChar::meta(b')'),
                other => MetaChar::literal(other),
            });
            continue;
        }

        if b == b'(' || b == b')' {
            out.push(if flags.excompat {
                MetaChar::meta(b)
            } else {
                MetaChar::literal(b)
            });
            continue;
        }

        out.push(if always_special(b) {
            MetaChar::meta(b)
        } else {
            MetaChar::literal(b)
        });
    }
    out.push(MetaChar::literal(0));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags() -> CompileFlags {
        CompileFlags::default()
    }

    #[test]
    fn backslash_controls_collapse_to_literals() {
        let toks = tokenize(br"\b\t\r", flags()).unwrap();
        assert_eq!(toks[0], MetaChar::literal(0x08));
        assert_eq!(toks[1], MetaChar::literal(b'\t'));
        assert_eq!(toks[2], MetaChar::literal(b'\r'));
    }

    #[test]
    fn word_boundary_escapes_are_meta() {
        let toks = tokenize(br"\<x\>", flags()).unwrap();
        assert!(toks[0].is(b'<'));
        assert!(!toks[1].is_special());
        assert!(toks[2].is(b'>'));
    }

    #[test]
    fn parens_follow_excompat() {
        let default = tokenize(b"(a)", flags()).unwrap();
        assert!(!default[0].is_special());
        assert!(!default[2].is_special());

        let ex = tokenize(b"(a)", CompileFlags::EXCOMPAT).unwrap();
        assert!(ex[0].is(b'('));
        assert!(ex[2].is(b')'));

        let escaped_ex = tokenize(br"\(a\)", CompileFlags::EXCOMPAT).unwrap();
        assert!(!escaped_ex[0].is_special());
        assert!(!escaped_ex[2].is_special());
    }

    #[test]
    fn trailing_backslash_is_an_error() {
        assert!(tokenize(br"abc\", flags()).is_err());
    }

    #[test]
    fn arbitrary_escape_is_literal() {
        let toks = tokenize(br"\*", flags()).unwrap();
        assert!(!toks[0].is_special());
        assert_eq!(toks[0].byte(), b'*');
    }
}
