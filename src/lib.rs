//! A small Henry-Spencer-style regex engine: a two-pass compiler producing
//! a flat byte-program, a recursive backtracking matcher, template
//! substitution, and two composite string operations (`associate`,
//! `filter`) built on top of it.
//!
//! Patterns and input are both treated as raw bytes, never as Unicode
//! scalar values; there is no `char`-aware matching anywhere in this
//! crate.

pub mod compiler;
pub mod composite;
pub mod error;
pub mod matcher;
pub mod opcodes;
pub mod substitute;
pub mod syntax;

pub use composite::{associate, filter, FilterEntry};
pub use error::{RegexError, Result};
pub use syntax::CompileFlags;

/// A compiled regular expression.
///
/// Immutable once constructed: a match produces a [`Captures`] value rather
/// than mutating anything on `Regex`, so the same `Regex` can be used
/// concurrently from multiple threads (there is no interior mutable
/// scratch state to race on).
#[derive(Debug, Clone)]
pub struct Regex {
    program: Vec<u8>,
    pattern: String,
    /// First byte every match must start with, or 0 if no such byte was
    /// derived (see `compiler::compile`'s optimization-hint pass).
    start: u8,
    anchored: bool,
    must: Option<Vec<u8>>,
}

impl Regex {
    /// Compile `pattern` with the default [`CompileFlags`].
    pub fn new(pattern: &str) -> Result<Self> {
        Self::with_flags(pattern, CompileFlags::default())
    }

    /// Compile `pattern` with explicit flags.
    pub fn with_flags(pattern: &str, flags: CompileFlags) -> Result<Self> {
        compiler::compile(pattern, flags)
    }

    pub(crate) fn from_parts(
        program: Vec<u8>,
        pattern: String,
        start: u8,
        anchored: bool,
        must: Option<Vec<u8>>,
    ) -> Self {
        Regex {
            program,
            pattern,
            start,
            anchored,
            must,
        }
    }

    /// The source text this regex was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub(crate) fn program(&self) -> &[u8] {
        &self.program
    }

    pub(crate) fn must(&self) -> Option<&[u8]> {
        self.must.as_deref()
    }

    /// Whether every match is forced to start at position 0.
    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// The byte every match must start with, if the compiler could derive
    /// one from a leading literal.
    pub fn start_byte(&self) -> Option<u8> {
        if self.start == 0 {
            None
        } else {
            Some(self.start)
        }
    }

    /// Run a full search, surfacing any internal error (a corrupted
    /// program buffer, or an opcode the matcher doesn't recognize).
    pub fn exec(&self, input: &[u8]) -> Result<Option<Captures>> {
        matcher::search(self, input)
    }

    pub(crate) fn exec_from(&self, input: &[u8], from: usize) -> Result<Option<Captures>> {
        matcher::search_from(self, input, from)
    }

    /// Whether the pattern matches anywhere in `input`.
    pub fn is_match(&self, input: &[u8]) -> bool {
        matches!(self.exec(input), Ok(Some(_)))
    }

    /// The bounds of the first match, if any.
    pub fn find(&self, input: &[u8]) -> Option<(usize, usize)> {
        self.captures(input).and_then(|c| c.get(0))
    }

    /// All capture groups from the first match.
    pub fn captures(&self, input: &[u8]) -> Option<Captures> {
        self.exec(input).ok().flatten()
    }

    /// Expand `template` against `captures` taken over `input`: `&` for
    /// the whole match, `\0`..`\9` for a numbered group.
    pub fn substitute(
        &self,
        input: &[u8],
        captures: &Captures,
        template: &[u8],
        capacity: usize,
    ) -> Result<Vec<u8>> {
        substitute::substitute(captures, input, template, capacity)
    }

    /// Human-readable disassembly of the compiled program: one line per
    /// node, showing its opcode, its operand (if any), and where its
    /// next-pointer leads. Not part of matching semantics, just a
    /// diagnostic aid in the spirit of the original engine's `regdump`.
    pub fn dump(&self) -> String {
        use std::fmt::Write as _;
        let mut out = String::new();
        let _ = writeln!(out, "pattern: {:?}", self.pattern);
        let mut p = 1;
        while p < self.program.len() {
            let Some(op) = opcodes::opcode(&self.program, p) else {
                let _ = writeln!(out, "{p:5}  ??? (byte {})", self.program[p]);
                break;
            };
            let next = opcodes::next(&self.program, p);
            let mut line = format!("{p:5}  {op:?}");
            let node_size = if op.has_cstring_operand() {
                let bytes = opcodes::operand_bytes(&self.program, p);
                let _ = write!(line, " {:?}", String::from_utf8_lossy(bytes));
                3 + bytes.len() + 1
            } else {
                3
            };
            if let Some(n) = next {
                let _ = write!(line, " -> {n}");
            }
            out.push_str(&line);
            out.push('\n');
            p += node_size;
        }
        out
    }
}

/// The bounds of every capture group from one successful match. Group 0 is
/// the whole match; groups `1..=9` are the parenthesized subgroups. Stores
/// plain byte offsets rather than borrowed slices, so a `Captures` has no
/// lifetime tied to the input it was matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Captures {
    spans: [Option<(usize, usize)>; 10],
}

impl Captures {
    pub(crate) fn new(start: usize, end: usize) -> Self {
        let mut spans = [None; 10];
        spans[0] = Some((start, end));
        Captures { spans }
    }

    pub(crate) fn set(&mut self, index: usize, start: usize, end: usize) {
        self.spans[index] = Some((start, end));
    }

    /// The `(start, end)` byte offsets of group `index`, or `None` if that
    /// group didn't participate in the match.
    pub fn get(&self, index: usize) -> Option<(usize, usize)> {
        self.spans.get(index).copied().flatten()
    }

    /// Number of groups that participated, counting from group 0.
    pub fn len(&self) -> usize {
        self.spans.iter().take_while(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.spans[0].is_none()
    }
}
