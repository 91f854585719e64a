//! Error types for the regex engine.

use std::fmt;

/// Result type for regex operations.
pub type Result<T> = std::result::Result<T, RegexError>;

/// Errors that can occur during pattern compilation, matching, or
/// substitution. `Display` produces the exact one-liner a caller built
/// against the original engine's messages would expect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegexError {
    /// A capture group was opened but never closed, or closed without
    /// being opened.
    UnmatchedParens,
    /// `[` was never closed with a matching `]`.
    UnmatchedBrackets,
    /// A character class range like `z-a` has its endpoints reversed.
    InvalidRange,
    /// `*`, `+`, or `?` was applied to an atom that could match the empty
    /// string, which would let the repetition loop forever.
    EmptyOperand,
    /// Two quantifiers appeared back to back, e.g. `a**`.
    NestedQuantifiers,
    /// More than nine capture groups were opened.
    TooManyParens,
    /// The compiled program would exceed the 32766-byte size ceiling.
    RegexpTooBig,
    /// Pattern ends prematurely (trailing `\`, or unterminated `[...]`).
    PrematureEnd,
    /// A program buffer's first byte isn't the magic number.
    CorruptedProgram,
    /// The matcher reached an opcode byte it doesn't recognize.
    MemoryCorruption,
    /// `substitute`'s output buffer is too small for the expansion.
    LineTooLong,
    /// A capture referenced by `substitute` contains an embedded NUL.
    DamagedMatchString,
    /// A required argument was missing (no program, no pattern, etc).
    NullParameter,
    /// `*`, `+`, or `?` appeared with no preceding atom to repeat.
    BareOperator,
    /// Non-whitespace survived past the end of a supposedly-complete parse
    /// (in practice, a stray unopened `)`).
    JunkOnEnd,
}

impl fmt::Display for RegexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            RegexError::UnmatchedParens => "unmatched ()",
            RegexError::UnmatchedBrackets => "unmatched []",
            RegexError::InvalidRange => "invalid [] range",
            RegexError::EmptyOperand => "*+ operand could be empty",
            RegexError::NestedQuantifiers => "nested *?+",
            RegexError::TooManyParens => "too many ()",
            RegexError::RegexpTooBig => "regexp too big",
            RegexError::PrematureEnd => "premature end of regular expression",
            RegexError::CorruptedProgram => "corrupted program",
            RegexError::MemoryCorruption => "memory corruption",
            RegexError::LineTooLong => "line too long",
            RegexError::DamagedMatchString => "damaged match string",
            RegexError::NullParameter => "NULL parameter",
            RegexError::BareOperator => "?+* follows nothing",
            RegexError::JunkOnEnd => "junk on end",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for RegexError {}
