//! Recursive backtracking matcher: `search`/`try_match`/`match_node`/
//! `repeat`, operating directly on the program's bytes. There is no
//! failure-stack VM here: `BRANCH`, `STAR`/`PLUS`, and `OPEN`/`CLOSE` are
//! the only places that recurse; every other opcode just reassigns the
//! cursor and loops.

use crate::error::{RegexError, Result};
use crate::opcodes::{self, Op};
use crate::{Captures, Regex};

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Per-attempt match state: current input cursor, the "beginning of line"
/// marker (set to wherever this attempt started, not necessarily byte 0 of
/// the whole input), and the capture arrays. Nothing here is shared across
/// attempts or across calls to [`search`].
struct Matcher<'a> {
    prog: &'a [u8],
    input: &'a [u8],
    pos: usize,
    bol: usize,
    reg_start: [Option<usize>; 10],
    reg_end: [Option<usize>; 10],
    /// `(branch node, input position)` pairs currently being explored higher
    /// up the call stack. A non-simple repetition compiles to a BRANCH that
    /// loops back to itself via BACK; if its body can match zero-width, that
    /// loop re-enters the same BRANCH at the same position forever. Refusing
    /// to recurse into an already-active pair turns that into an ordinary
    /// failed alternative instead of unbounded recursion.
    active_branches: Vec<(usize, usize)>,
}

impl<'a> Matcher<'a> {
    fn new(prog: &'a [u8], input: &'a [u8], origin: usize) -> Self {
        Matcher {
            prog,
            input,
            pos: origin,
            bol: origin,
            reg_start: [None; 10],
            reg_end: [None; 10],
            active_branches: Vec::new(),
        }
    }

    fn word_start_ok(&self) -> bool {
        if self.pos >= self.input.len() || !is_word_byte(self.input[self.pos]) {
            return false;
        }
        self.pos == 0 || !is_word_byte(self.input[self.pos - 1])
    }

    fn word_end_ok(&self) -> bool {
        if self.pos == 0 || !is_word_byte(self.input[self.pos - 1]) {
            return false;
        }
        self.pos >= self.input.len() || !is_word_byte(self.input[self.pos])
    }

    /// Count the maximal run of consecutive matches of the simple atom at
    /// `p`, advancing `self.pos` to the end of that run. Used by `STAR`/
    /// `PLUS` to find their greedy starting point before backing off.
    fn repeat(&mut self, p: usize) -> Result<usize> {
        let op = opcodes::opcode(self.prog, p).ok_or(RegexError::MemoryCorruption)?;
        let mut count = 0usize;
        match op {
            Op::Any => {
                while self.pos < self.input.len() && self.input[self.pos] != 0 {
                    self.pos += 1;
                    count += 1;
                }
            }
            Op::Exactly => {
                let lit = opcodes::operand_bytes(self.prog, p);
                if lit.len() != 1 {
                    return Err(RegexError::MemoryCorruption);
                }
                let b = lit[0];
                while self.pos < self.input.len() && self.input[self.pos] == b {
                    self.pos += 1;
                    count += 1;
                }
            }
            Op::AnyOf | Op::AnyBut => {
                let set = opcodes::operand_bytes(self.prog, p);
                while self.pos < self.input.len() {
                    let b = self.input[self.pos];
                    let in_set = set.contains(&b);
                    let matched = if op == Op::AnyOf { in_set } else { !in_set };
                    if matched && b != 0 {
                        self.pos += 1;
                        count += 1;
                    } else {
                        break;
                    }
                }
            }
            _ => return Err(RegexError::MemoryCorruption),
        }
        Ok(count)
    }

    /// Attempt to match starting from node `p`. Iterative for the linear
    /// chain of zero-width/single-step opcodes, recursive at `BRANCH`,
    /// `STAR`/`PLUS`, and `OPEN`/`CLOSE`.
    fn match_node(&mut self, mut p: usize) -> Result<bool> {
        loop {
            let op = opcodes::opcode(self.prog, p).ok_or(RegexError::MemoryCorruption)?;
            let next_p = opcodes::next(self.prog, p);

            match op {
                Op::End => return Ok(true),

                Op::Bol => {
                    if self.pos != self.bol {
                        return Ok(false);
                    }
                    p = next_p.ok_or(RegexError::MemoryCorruption)?;
                }
                Op::Eol => {
                    if self.pos != self.input.len() {
                        return Ok(false);
                    }
                    p = next_p.ok_or(RegexError::MemoryCorruption)?;
                }
                Op::Any => {
                    if self.pos >= self.input.len() || self.input[self.pos] == 0 {
                        return Ok(false);
                    }
                    self.pos += 1;
                    p = next_p.ok_or(RegexError::MemoryCorruption)?;
                }
                Op::AnyOf | Op::AnyBut => {
                    if self.pos >= self.input.len() {
                        return Ok(false);
                    }
                    let b = self.input[self.pos];
                    if b == 0 {
                        return Ok(false);
                    }
                    let set = opcodes::operand_bytes(self.prog, p);
                    let in_set = set.contains(&b);
                    let matched = if op == Op::AnyOf { in_set } else { !in_set };
                    if !matched {
                        return Ok(false);
                    }
                    self.pos += 1;
                    p = next_p.ok_or(RegexError::MemoryCorruption)?;
                }
                Op::Exactly => {
                    let lit = opcodes::operand_bytes(self.prog, p);
                    if self.pos + lit.len() > self.input.len()
                        || &self.input[self.pos..self.pos + lit.len()] != lit
                    {
                        return Ok(false);
                    }
                    self.pos += lit.len();
                    p = next_p.ok_or(RegexError::MemoryCorruption)?;
                }
                Op::Nothing | Op::Back => {
                    p = next_p.ok_or(RegexError::MemoryCorruption)?;
                }
                Op::WordStart => {
                    if !self.word_start_ok() {
                        return Ok(false);
                    }
                    p = next_p.ok_or(RegexError::MemoryCorruption)?;
                }
                Op::WordEnd => {
                    if !self.word_end_ok() {
                        return Ok(false);
                    }
                    p = next_p.ok_or(RegexError::MemoryCorruption)?;
                }

                Op::Open(k) => {
                    let save = self.pos;
                    let idx = k as usize;
                    let target = next_p.ok_or(RegexError::MemoryCorruption)?;
                    if self.match_node(target)? {
                        if self.reg_start[idx].is_none() {
                            self.reg_start[idx] = Some(save);
                        }
                        return Ok(true);
                    }
                    return Ok(false);
                }
                Op::Close(k) => {
                    let save = self.pos;
                    let idx = k as usize;
                    let target = next_p.ok_or(RegexError::MemoryCorruption)?;
                    if self.match_node(target)? {
                        if self.reg_end[idx].is_none() {
                            self.reg_end[idx] = Some(save);
                        }
                        return Ok(true);
                    }
                    return Ok(false);
                }

                Op::Branch => {
                    let is_multi = match next_p {
                        Some(np) => opcodes::opcode(self.prog, np) == Some(Op::Branch),
                        None => false,
                    };
                    if !is_multi {
                        // Only one alternative left; fall through without
                        // recursing.
                        p = opcodes::operand(p);
                        continue;
                    }
                    let mut cur = p;
                    loop {
                        let save_pos = self.pos;
                        let key = (cur, save_pos);
                        if !self.active_branches.contains(&key) {
                            self.active_branches.push(key);
                            let matched = self.match_node(opcodes::operand(cur));
                            self.active_branches.pop();
                            if matched? {
                                return Ok(true);
                            }
                        }
                        self.pos = save_pos;
                        match opcodes::next(self.prog, cur) {
                            Some(nxt) if opcodes::opcode(self.prog, nxt) == Some(Op::Branch) => {
                                cur = nxt;
                            }
                            _ => return Ok(false),
                        }
                    }
                }

                Op::Star | Op::Plus => {
                    let min = if op == Op::Star { 0usize } else { 1usize };
                    let atom_pos = opcodes::operand(p);
                    let continuation = next_p.ok_or(RegexError::MemoryCorruption)?;

                    // A single-byte literal immediately following the loop
                    // lets us reject obviously-wrong backtrack points
                    // without recursing into them.
                    let lookahead = match opcodes::opcode(self.prog, continuation) {
                        Some(Op::Exactly) => {
                            let lit = opcodes::operand_bytes(self.prog, continuation);
                            if lit.len() == 1 {
                                Some(lit[0])
                            } else {
                                None
                            }
                        }
                        _ => None,
                    };

                    let origin = self.pos;
                    let mut n = self.repeat(atom_pos)?;
                    loop {
                        if n < min {
                            return Ok(false);
                        }
                        self.pos = origin + n;
                        let lookahead_ok = match lookahead {
                            None => true,
                            Some(b) => self.pos < self.input.len() && self.input[self.pos] == b,
                        };
                        if lookahead_ok && self.match_node(continuation)? {
                            return Ok(true);
                        }
                        if n == 0 {
                            return Ok(false);
                        }
                        n -= 1;
                    }
                }
            }
        }
    }
}

/// Run one match attempt starting exactly at `origin`.
fn try_match(prog: &[u8], input: &[u8], origin: usize) -> Result<Option<Captures>> {
    let mut m = Matcher::new(prog, input, origin);
    if m.match_node(1)? {
        let mut captures = Captures::new(origin, m.pos);
        for k in 1..=9usize {
            if let (Some(s), Some(e)) = (m.reg_start[k], m.reg_end[k]) {
                captures.set(k, s, e);
            }
        }
        Ok(Some(captures))
    } else {
        Ok(None)
    }
}

fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    if needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Search `input` for the first position at which `regex` matches, honoring
/// its anchoring/start-byte/must-literal hints.
pub(crate) fn search(regex: &Regex, input: &[u8]) -> Result<Option<Captures>> {
    search_from(regex, input, 0)
}

/// Same as [`search`], but only considers start positions `>= from`. Used by
/// `associate` to resume scanning partway through a string without
/// restarting the whole search.
pub(crate) fn search_from(regex: &Regex, input: &[u8], from: usize) -> Result<Option<Captures>> {
    let prog = regex.program();
    if prog.first() != Some(&opcodes::MAGIC) {
        return Err(RegexError::CorruptedProgram);
    }
    if let Some(must) = regex.must() {
        if !contains_subslice(input, must) {
            return Ok(None);
        }
    }

    if regex.is_anchored() {
        if from == 0 {
            return try_match(prog, input, 0);
        }
        return Ok(None);
    }

    if let Some(start) = regex.start_byte() {
        for pos in from..input.len() {
            if input[pos] == start {
                if let Some(c) = try_match(prog, input, pos)? {
                    return Ok(Some(c));
                }
            }
        }
        return Ok(None);
    }

    for pos in from..=input.len() {
        if let Some(c) = try_match(prog, input, pos)? {
            return Ok(Some(c));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use crate::syntax::CompileFlags;
    use crate::Regex;

    fn re(pattern: &str) -> Regex {
        Regex::with_flags(pattern, CompileFlags::default()).unwrap()
    }

    /// Bare `(`/`)` only open capture groups under `EXCOMPAT`; the default
    /// flags treat them as literal bytes instead.
    fn re_groups(pattern: &str) -> Regex {
        Regex::with_flags(pattern, CompileFlags::EXCOMPAT).unwrap()
    }

    #[test]
    fn anchored_bol_only_matches_at_origin() {
        let r = re("^abc");
        assert!(r.is_match(b"abcdef"));
        assert!(!r.is_match(b"xabcdef"));
    }

    #[test]
    fn capture_group_records_span() {
        let r = re_groups("a(b+)c");
        let c = r.captures(b"xxabbbcyy").unwrap();
        let whole = c.get(0).unwrap();
        assert_eq!(&b"xxabbbcyy"[whole.0..whole.1], b"abbbc");
        let g1 = c.get(1).unwrap();
        assert_eq!(&b"xxabbbcyy"[g1.0..g1.1], b"bbb");
    }

    #[test]
    fn star_backtracks_to_let_tail_match() {
        let r = re("a*ab");
        assert!(r.is_match(b"aaab"));
    }

    #[test]
    fn word_boundaries() {
        let r = re(r"\<cat\>");
        assert!(r.is_match(b"a cat sat"));
        assert!(!r.is_match(b"category"));
    }

    #[test]
    fn alternation_picks_first_successful_branch() {
        let r = re("cat|dog|bird");
        assert!(r.is_match(b"a bird flew"));
        assert!(r.is_match(b"a dog barked"));
    }

    #[test]
    fn non_greedy_group_still_anchors_correctly() {
        let r = re_groups("(a|b)+");
        let c = r.captures(b"ababab!").unwrap();
        assert_eq!(c.get(0).unwrap(), (0, 6));
    }

    #[test]
    fn nested_star_over_zero_width_body_does_not_recurse_forever() {
        let r = re_groups("(a*)*");
        assert!(r.is_match(b""));
        assert!(r.is_match(b"aaaa"));
        assert_eq!(r.find(b"aaaa"), Some((0, 4)));
    }
}
