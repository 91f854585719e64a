//! The two composite string operations built on top of the matcher:
//! `associate` (tag-and-split by earliest match) and `filter` (keep/reject
//! by match).

use crate::error::Result;
use crate::Regex;

/// One kept entry from [`filter`]: either the bare string, or the string
/// with its original 1-based position, depending on whether the caller
/// asked for indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterEntry<'a> {
    Plain(&'a str),
    Indexed(usize, &'a str),
}

impl<'a> FilterEntry<'a> {
    pub fn as_str(&self) -> &'a str {
        match self {
            FilterEntry::Plain(s) => s,
            FilterEntry::Indexed(_, s) => s,
        }
    }
}

/// Split `s` by the earliest match among `patterns` (tried in array order;
/// the first pattern to produce the leftmost match wins ties), tagging each
/// matched piece with the corresponding entry in `tokens` and every
/// untouched piece with `default`. Returns two equal-length arrays of
/// `2*M + 1` elements for `M` total matches found: segment text alternating
/// with the tag that produced it, so concatenating all segments reproduces
/// `s` exactly.
///
/// A zero-length match advances the scan position by one byte past it
/// before looking for the next match, so a pattern that can match the
/// empty string (like `a*`) can't loop forever on the same spot.
pub fn associate<T: Clone>(
    s: &[u8],
    patterns: &[Regex],
    tokens: &[T],
    default: T,
) -> Result<(Vec<Vec<u8>>, Vec<T>)> {
    debug_assert_eq!(patterns.len(), tokens.len());

    let mut segments = Vec::new();
    let mut tags = Vec::new();
    // `cursor` is the real text position: every byte before it has already
    // landed in some segment. `search_from` is where the next scan starts;
    // it runs ahead of `cursor` by one byte right after a zero-length match,
    // so the same empty match can't be found again at the same spot. The
    // byte that gap skips over still gets picked up as untouched text by
    // the next segment's `s[cursor..mstart]` slice.
    let mut cursor = 0usize;
    let mut search_from = 0usize;

    loop {
        let mut best: Option<(usize, usize, usize)> = None; // (start, end, pattern index)
        for (i, pattern) in patterns.iter().enumerate() {
            if let Some(c) = pattern.exec_from(s, search_from)? {
                let (mstart, mend) = c.get(0).expect("group 0 always set on success");
                let better = match best {
                    None => true,
                    Some((bstart, _, _)) => mstart < bstart,
                };
                if better {
                    best = Some((mstart, mend, i));
                }
            }
        }

        match best {
            None => {
                segments.push(s[cursor..].to_vec());
                tags.push(default.clone());
                break;
            }
            Some((mstart, mend, i)) => {
                segments.push(s[cursor..mstart].to_vec());
                tags.push(default.clone());
                segments.push(s[mstart..mend].to_vec());
                tags.push(tokens[i].clone());
                cursor = mend;
                search_from = if mend > mstart { mend } else { mend + 1 };
            }
        }
    }

    Ok((segments, tags))
}

/// Keep (or, with bit 1 of `flag` set, reject) the entries of `strings`
/// that match `pattern`. Non-`Some` entries are always treated as
/// non-matches regardless of `flag`. Bit 0 of `flag` asks for each kept
/// entry's original 1-based position alongside its text. Order is
/// preserved.
pub fn filter<'a>(
    strings: &[Option<&'a str>],
    pattern: &Regex,
    flag: u8,
) -> Vec<FilterEntry<'a>> {
    let invert = flag & 0b10 != 0;
    let with_index = flag & 0b01 != 0;

    let mut out = Vec::new();
    for (i, entry) in strings.iter().enumerate() {
        let Some(s) = entry else {
            continue;
        };
        let is_match = pattern.is_match(s.as_bytes());
        if is_match != invert {
            out.push(if with_index {
                FilterEntry::Indexed(i + 1, s)
            } else {
                FilterEntry::Plain(s)
            });
        }
    }
    out
}
