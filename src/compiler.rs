//! Two-pass (size, then emit) compiler: tokens in, a `Regex`-ready program
//! out. The grammar is the classic `regex := branch ('|' branch)*`,
//! `branch := piece*`, `piece := atom ('*'|'+'|'?')?`.
//!
//! Both passes walk the same token stream and make the same grammar
//! decisions; the only difference is whether nodes actually grow a buffer
//! (`sizing == false`) or just tally how big that buffer will need to be
//! (`sizing == true`). This is why every grammar function takes `&mut self`
//! rather than returning some intermediate tree: there is no tree, only a
//! running byte count or a running byte buffer.

use crate::error::{RegexError, Result};
use crate::opcodes::{self, Op, MAX_GROUP};
use crate::syntax::{tokenize, CompileFlags, MetaChar};
use crate::Regex;

const FLAG_HASWIDTH: u8 = 1;
const FLAG_SIMPLE: u8 = 2;
const FLAG_SPSTART: u8 = 4;

/// Compile-size ceiling: programs of 32766 bytes or fewer are allowed, a
/// size pass reaching 32767 fails compilation.
const MAX_PROGRAM_SIZE: usize = 32767;

struct Parser<'a> {
    tokens: &'a [MetaChar],
    pos: usize,
    sizing: bool,
    /// Running byte count, used only when `sizing`. Starts at 1 to account
    /// for the magic byte the emit pass pushes before calling `reg`.
    size: usize,
    /// Running buffer, used only when `!sizing`.
    buf: Vec<u8>,
    /// Next capture group number to hand out; starts at 1 (group 0 is the
    /// whole match and is never explicitly opened/closed).
    nparen: u8,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [MetaChar], sizing: bool, buf: Vec<u8>) -> Self {
        Parser {
            tokens,
            pos: 0,
            sizing,
            size: 1,
            buf,
            nparen: 1,
        }
    }

    fn peek(&self) -> MetaChar {
        self.tokens[self.pos]
    }

    fn advance(&mut self) -> MetaChar {
        let t = self.tokens[self.pos];
        self.pos += 1;
        t
    }

    /// True once only the trailing sentinel remains.
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len() - 1
    }

    /// Emit a bare 3-byte node header, returning its position.
    fn emit_node(&mut self, op: Op) -> usize {
        if self.sizing {
            self.size += 3;
            return 0;
        }
        let pos = self.buf.len();
        self.buf.push(op.to_byte());
        self.buf.push(0);
        self.buf.push(0);
        pos
    }

    fn emit_byte(&mut self, b: u8) {
        if self.sizing {
            self.size += 1;
        } else {
            self.buf.push(b);
        }
    }

    /// Insert a bare node header immediately before `at`, shifting everything
    /// from `at` onward forward by three bytes.
    fn insert_op(&mut self, op: Op, at: usize) {
        if self.sizing {
            self.size += 3;
            return;
        }
        self.buf.splice(at..at, [op.to_byte(), 0, 0]);
    }

    /// Walk the next-pointer chain starting at `p` to its end, then point
    /// that last node at `val`. A no-op during the sizing pass.
    fn set_tail(&mut self, p: usize, val: usize) {
        if self.sizing {
            return;
        }
        let mut last = p;
        while let Some(n) = opcodes::next(&self.buf, last) {
            last = n;
        }
        self.write_offset(last, val);
    }

    /// Same as `set_tail`, but walks the chain starting at `operand(p)`
    /// rather than `p` itself. A no-op unless `p` is a `BRANCH`.
    fn set_tail_operand(&mut self, p: usize, val: usize) {
        if self.sizing {
            return;
        }
        if opcodes::opcode(&self.buf, p) != Some(Op::Branch) {
            return;
        }
        self.set_tail(opcodes::operand(p), val);
    }

    fn write_offset(&mut self, p: usize, val: usize) {
        let op = opcodes::opcode(&self.buf, p).expect("node header just written");
        let off = if op == Op::Back { p - val } else { val - p };
        self.buf[p + 1] = ((off >> 8) & 0xff) as u8;
        self.buf[p + 2] = (off & 0xff) as u8;
    }

    /// `atom := '.' | '^' | '$' | '\<' | '\>' | '[' class ']' | '(' regex ')' | literal-run`
    fn regatom(&mut self) -> Result<(usize, u8)> {
        let t = self.peek();

        if t.is(b'^') {
            self.advance();
            return Ok((self.emit_node(Op::Bol), 0));
        }
        if t.is(b'$') {
            self.advance();
            return Ok((self.emit_node(Op::Eol), 0));
        }
        if t.is(b'.') {
            self.advance();
            return Ok((self.emit_node(Op::Any), FLAG_HASWIDTH | FLAG_SIMPLE));
        }
        if t.is(b'[') {
            self.advance();
            return self.regclass();
        }
        if t.is(b'(') {
            self.advance();
            let (node, flags) = self.reg(true)?;
            return Ok((node, flags & (FLAG_HASWIDTH | FLAG_SPSTART)));
        }
        if t.is(b'<') {
            self.advance();
            return Ok((self.emit_node(Op::WordStart), 0));
        }
        if t.is(b'>') {
            self.advance();
            return Ok((self.emit_node(Op::WordEnd), 0));
        }
        if t.is(b'*') || t.is(b'+') || t.is(b'?') {
            return Err(RegexError::BareOperator);
        }
        if self.at_end() || t.is(b'|') || t.is(b')') {
            return Err(RegexError::BareOperator);
        }

        // Literal run: consume non-special bytes, stopping at a bare `]`
        // too (it ends the run rather than joining it).
        let mut run: Vec<u8> = Vec::new();
        while !self.at_end() {
            let tok = self.peek();
            if tok.is_special() || tok.byte() == b']' {
                break;
            }
            run.push(self.advance().byte());
        }

        // If a quantifier follows and the run has more than one byte, peel
        // the last byte back off so it can become its own atom and carry
        // the quantifier alone.
        if run.len() > 1 && !self.at_end() {
            let nxt = self.peek();
            if nxt.is(b'*') || nxt.is(b'+') || nxt.is(b'?') {
                self.pos -= 1;
                run.pop();
            }
        }

        let flags = if run.len() == 1 {
            FLAG_HASWIDTH | FLAG_SIMPLE
        } else {
            FLAG_HASWIDTH
        };
        let ret = self.emit_node(Op::Exactly);
        for b in &run {
            self.emit_byte(*b);
        }
        self.emit_byte(0);
        Ok((ret, flags))
    }

    /// Character class body, cursor already past the opening `[`. Ignores
    /// each token's meta flag entirely and works off raw byte values, so
    /// `.`, `*`, `+`, etc. are plain members here despite being
    /// metacharacters everywhere else in the grammar.
    fn regclass(&mut self) -> Result<(usize, u8)> {
        let negate = if !self.at_end() && self.peek().byte() == b'^' {
            self.advance();
            true
        } else {
            false
        };

        let ret = self.emit_node(if negate { Op::AnyBut } else { Op::AnyOf });
        let mut set: Vec<u8> = Vec::new();

        // A leading `]` or `-` is a literal member, not the closing bracket
        // or a range operator.
        if !self.at_end() && matches!(self.peek().byte(), b']' | b'-') {
            set.push(self.advance().byte());
        }

        loop {
            if self.at_end() {
                return Err(RegexError::UnmatchedBrackets);
            }
            if self.peek().byte() == b']' {
                self.advance();
                break;
            }
            let c1 = self.advance().byte();
            let is_range = !self.at_end()
                && self.peek().byte() == b'-'
                && self.pos + 1 < self.tokens.len()
                && self.tokens[self.pos + 1].byte() != b']';
            if is_range {
                self.advance(); // '-'
                let c2 = self.advance().byte();
                if (c1 as i32) > (c2 as i32) + 1 {
                    return Err(RegexError::InvalidRange);
                }
                if c1 <= c2 {
                    for b in c1..=c2 {
                        set.push(b);
                    }
                }
            } else {
                set.push(c1);
            }
        }

        for b in &set {
            self.emit_byte(*b);
        }
        self.emit_byte(0);
        Ok((ret, FLAG_HASWIDTH | FLAG_SIMPLE))
    }

    /// `piece := atom ('*' | '+' | '?')?`
    fn regpiece(&mut self) -> Result<(usize, u8)> {
        let (ret, flags) = self.regatom()?;

        let t = self.peek();
        let op = if t.is(b'*') {
            b'*'
        } else if t.is(b'+') {
            b'+'
        } else if t.is(b'?') {
            b'?'
        } else {
            return Ok((ret, flags));
        };

        if flags & FLAG_HASWIDTH == 0 && op != b'?' {
            return Err(RegexError::EmptyOperand);
        }
        self.advance();

        let simple = flags & FLAG_SIMPLE != 0;
        match op {
            b'*' => {
                if simple {
                    self.insert_op(Op::Star, ret);
                } else {
                    // Emit x* as (x&|), where & loops back to the BRANCH.
                    self.insert_op(Op::Branch, ret);
                    let back = self.emit_node(Op::Back);
                    self.set_tail(back, ret);
                    self.set_tail_operand(ret, back);
                    let branch2 = self.emit_node(Op::Branch);
                    self.set_tail(ret, branch2);
                    let nothing = self.emit_node(Op::Nothing);
                    self.set_tail(ret, nothing);
                }
            }
            b'+' => {
                if simple {
                    self.insert_op(Op::Plus, ret);
                } else {
                    // Same shape as `*`, but the atom itself is mandatory:
                    // no BRANCH wraps it, the loop point comes after.
                    let branch1 = self.emit_node(Op::Branch);
                    self.set_tail(ret, branch1);
                    let back = self.emit_node(Op::Back);
                    self.set_tail(back, ret);
                    let branch2 = self.emit_node(Op::Branch);
                    self.set_tail(branch1, branch2);
                    let nothing = self.emit_node(Op::Nothing);
                    self.set_tail(branch1, nothing);
                }
            }
            b'?' => {
                // Emit x? as (x|), no back-edge.
                self.insert_op(Op::Branch, ret);
                let branch2 = self.emit_node(Op::Branch);
                self.set_tail(ret, branch2);
                let nothing = self.emit_node(Op::Nothing);
                self.set_tail(ret, nothing);
                self.set_tail_operand(ret, nothing);
            }
            _ => unreachable!(),
        }

        if !self.at_end() {
            let after = self.peek();
            if after.is(b'*') || after.is(b'+') || after.is(b'?') {
                return Err(RegexError::NestedQuantifiers);
            }
        }

        // `*`/`+` can match their atom zero or more times starting right
        // here, so a branch containing one is a candidate for the
        // must-literal scan (compile()'s optimisation-hint pass).
        let flags = if op == b'*' || op == b'+' {
            flags | FLAG_SPSTART
        } else {
            flags
        };

        Ok((ret, flags))
    }

    /// `branch := piece*`
    fn regbranch(&mut self) -> Result<(usize, u8)> {
        let mut flagp = 0u8;
        let ret = self.emit_node(Op::Branch);
        let mut chain: Option<usize> = None;

        loop {
            if self.at_end() {
                break;
            }
            let t = self.peek();
            if t.is(b'|') || t.is(b')') {
                break;
            }
            let (latest, flags) = self.regpiece()?;
            flagp |= flags & FLAG_HASWIDTH;
            match chain {
                None => flagp |= flags & FLAG_SPSTART,
                Some(c) => self.set_tail(c, latest),
            }
            chain = Some(latest);
        }
        if chain.is_none() {
            self.emit_node(Op::Nothing);
        }
        Ok((ret, flagp))
    }

    /// `regex := branch ('|' branch)*`, optionally wrapped in a capture
    /// group when `paren` is set.
    fn reg(&mut self, paren: bool) -> Result<(usize, u8)> {
        let mut flagp = FLAG_HASWIDTH;
        let parno = if paren {
            if self.nparen > MAX_GROUP {
                return Err(RegexError::TooManyParens);
            }
            let n = self.nparen;
            self.nparen += 1;
            Some(n)
        } else {
            None
        };

        let open = parno.map(|n| self.emit_node(Op::Open(n)));

        let (br, flags) = self.regbranch()?;
        let ret = match open {
            Some(o) => {
                self.set_tail(o, br);
                o
            }
            None => br,
        };
        if flags & FLAG_HASWIDTH == 0 {
            flagp &= !FLAG_HASWIDTH;
        }
        flagp |= flags & FLAG_SPSTART;

        while !self.at_end() && self.peek().is(b'|') {
            self.advance();
            let (br2, flags2) = self.regbranch()?;
            self.set_tail(ret, br2);
            if flags2 & FLAG_HASWIDTH == 0 {
                flagp &= !FLAG_HASWIDTH;
            }
            flagp |= flags2 & FLAG_SPSTART;
        }

        let ender = match parno {
            Some(n) => self.emit_node(Op::Close(n)),
            None => self.emit_node(Op::End),
        };
        self.set_tail(ret, ender);

        if !self.sizing {
            let mut br = Some(ret);
            while let Some(b) = br {
                self.set_tail_operand(b, ender);
                br = opcodes::next(&self.buf, b);
            }
        }

        if paren {
            if !self.at_end() && self.peek().is(b')') {
                self.advance();
            } else {
                return Err(RegexError::UnmatchedParens);
            }
        } else if !self.at_end() {
            if self.peek().is(b')') {
                return Err(RegexError::UnmatchedParens);
            }
            return Err(RegexError::JunkOnEnd);
        }

        Ok((ret, flagp))
    }
}

/// Compile a pattern into a finished [`Regex`].
pub(crate) fn compile(source: &str, flags: CompileFlags) -> Result<Regex> {
    let tokens = tokenize(source.as_bytes(), flags)?;

    let mut sizer = Parser::new(&tokens, true, Vec::new());
    sizer.reg(false)?;
    if sizer.size >= MAX_PROGRAM_SIZE {
        return Err(RegexError::RegexpTooBig);
    }

    let buf = Vec::with_capacity(sizer.size);
    let mut emitter = Parser::new(&tokens, false, buf);
    emitter.buf.push(opcodes::MAGIC);
    let (top, top_flags) = emitter.reg(false)?;
    let program = emitter.buf;

    let mut start = 0u8;
    let mut anchored = false;
    let mut must: Option<Vec<u8>> = None;

    let single_alternative = match opcodes::next(&program, top) {
        Some(n) => opcodes::opcode(&program, n) == Some(Op::End),
        None => false,
    };
    if single_alternative {
        let first = opcodes::operand(top);
        match opcodes::opcode(&program, first) {
            Some(Op::Exactly) => {
                let lit = opcodes::operand_bytes(&program, first);
                if let Some(&b) = lit.first() {
                    start = b;
                }
            }
            Some(Op::Bol) => anchored = true,
            _ => {}
        }

        if top_flags & FLAG_SPSTART != 0 {
            let mut scan = Some(first);
            let mut best: Option<Vec<u8>> = None;
            while let Some(p) = scan {
                if opcodes::opcode(&program, p) == Some(Op::Exactly) {
                    let s = opcodes::operand_bytes(&program, p);
                    if !s.is_empty() && best.as_ref().map(|b| s.len() >= b.len()).unwrap_or(true) {
                        best = Some(s.to_vec());
                    }
                }
                scan = opcodes::next(&program, p);
            }
            must = best;
        }
    }

    Ok(Regex::from_parts(
        program,
        source.to_owned(),
        start,
        anchored,
        must,
    ))
}
