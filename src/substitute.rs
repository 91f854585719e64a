//! Template substitution: expand `&` and `\0`..`\9` against a match's
//! captures.

use crate::error::{RegexError, Result};
use crate::Captures;

/// Expand `template` against `captures`, which were produced by matching
/// against `input`. `&` expands to the whole match (group 0); `\0`..`\9`
/// expand to the corresponding numbered group; `\\` and `\&` are literal
/// backslash/ampersand; any other byte is copied verbatim. A reference to a
/// group that didn't participate in the match contributes nothing.
///
/// `capacity` bounds the output, including room for a conceptual
/// terminating NUL (mirroring the original's fixed-size destination
/// buffer): running past it fails with [`RegexError::LineTooLong`]. A
/// capture that itself contains an embedded NUL fails with
/// [`RegexError::DamagedMatchString`] rather than silently truncating.
pub fn substitute(
    captures: &Captures,
    input: &[u8],
    template: &[u8],
    capacity: usize,
) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(template.len().min(capacity));
    let limit = capacity.saturating_sub(1);
    let mut i = 0;
    while i < template.len() {
        let b = template[i];
        i += 1;
        match b {
            b'&' => append_capture(&mut out, captures, input, 0, limit)?,
            b'\\' if i < template.len() => {
                let esc = template[i];
                i += 1;
                match esc {
                    b'\\' => push(&mut out, b'\\', limit)?,
                    b'&' => push(&mut out, b'&', limit)?,
                    d @ b'0'..=b'9' => {
                        append_capture(&mut out, captures, input, (d - b'0') as usize, limit)?
                    }
                    other => {
                        push(&mut out, b'\\', limit)?;
                        push(&mut out, other, limit)?;
                    }
                }
            }
            other => push(&mut out, other, limit)?,
        }
    }
    Ok(out)
}

fn push(out: &mut Vec<u8>, b: u8, limit: usize) -> Result<()> {
    if out.len() >= limit {
        return Err(RegexError::LineTooLong);
    }
    out.push(b);
    Ok(())
}

fn append_capture(
    out: &mut Vec<u8>,
    captures: &Captures,
    input: &[u8],
    index: usize,
    limit: usize,
) -> Result<()> {
    let Some((start, end)) = captures.get(index) else {
        return Ok(());
    };
    let slice = &input[start..end];
    if slice.contains(&0) {
        return Err(RegexError::DamagedMatchString);
    }
    for &b in slice {
        push(out, b, limit)?;
    }
    Ok(())
}
