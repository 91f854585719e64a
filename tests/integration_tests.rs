//! End-to-end tests exercising the public `regexpr` surface: compilation,
//! matching, substitution, and the two composite string operations.

use regexpr::{associate, filter, CompileFlags, FilterEntry, Regex, RegexError};

#[test]
fn exact_literal_match() {
    let re = Regex::new("hello").unwrap();
    assert!(re.is_match(b"hello"));
    assert!(re.is_match(b"say hello there"));
    assert!(!re.is_match(b"hi"));
}

#[test]
fn dot_matches_any_byte_but_nul() {
    let re = Regex::new("h.llo").unwrap();
    assert!(re.is_match(b"hello"));
    assert!(re.is_match(b"hallo"));
    assert!(!re.is_match(b"hllo"));
    assert!(!re.is_match(b"h\0llo"));
}

#[test]
fn star_allows_zero_or_more() {
    let re = Regex::new("ab*c").unwrap();
    assert!(re.is_match(b"ac"));
    assert!(re.is_match(b"abc"));
    assert!(re.is_match(b"abbbc"));
    assert!(!re.is_match(b"def"));
    assert!(!re.is_match(b"ab"));
}

#[test]
fn plus_requires_at_least_one() {
    let re = Regex::new("ab+c").unwrap();
    assert!(!re.is_match(b"ac"));
    assert!(re.is_match(b"abc"));
    assert!(re.is_match(b"abbbc"));
}

#[test]
fn question_mark_is_zero_or_one() {
    let re = Regex::new("colou?r").unwrap();
    assert!(re.is_match(b"color"));
    assert!(re.is_match(b"colour"));
    assert!(!re.is_match(b"colouur"));
}

#[test]
fn anchors_bind_to_line_boundaries() {
    let start = Regex::new("^hello").unwrap();
    assert!(start.is_match(b"hello world"));
    assert!(!start.is_match(b"say hello"));

    let end = Regex::new("world$").unwrap();
    assert!(end.is_match(b"hello world"));
    assert!(!end.is_match(b"world hello"));
}

#[test]
fn character_classes_and_negation() {
    let vowel = Regex::new("[aeiou]").unwrap();
    assert!(vowel.is_match(b"cat"));
    assert!(!vowel.is_match(b"xyz"));

    let not_digit = Regex::new("[^0-9]+").unwrap();
    assert!(not_digit.is_match(b"abc"));

    let range = Regex::new("[A-Z][a-z]*").unwrap();
    let (s, e) = range.find(b"Hello World").unwrap();
    assert_eq!(&b"Hello World"[s..e], b"Hello");
}

#[test]
fn capture_groups_record_spans_under_excompat() {
    let re = Regex::with_flags("a(b+)c", CompileFlags::EXCOMPAT).unwrap();
    let c = re.captures(b"xxabbbcyy").unwrap();
    let whole = c.get(0).unwrap();
    assert_eq!(&b"xxabbbcyy"[whole.0..whole.1], b"abbbc");
    let g1 = c.get(1).unwrap();
    assert_eq!(&b"xxabbbcyy"[g1.0..g1.1], b"bbb");
}

#[test]
fn default_flags_treat_bare_parens_as_literal() {
    // Under the default flags, grouping uses `\(`/`\)` instead.
    let re = Regex::new(r"\([A-Za-z]+\)").unwrap();
    assert!(re.is_match(b"(abc)"));
    assert!(!re.is_match(b"abc"));
}

#[test]
fn alternation_across_branches() {
    let re = Regex::new("cat|dog|bird").unwrap();
    assert!(re.is_match(b"a bird flew"));
    assert!(re.is_match(b"a dog barked"));
    assert!(!re.is_match(b"a fish swam"));
}

#[test]
fn word_boundary_escapes() {
    let re = Regex::new(r"\<cat\>").unwrap();
    assert!(re.is_match(b"a cat sat"));
    assert!(!re.is_match(b"category"));
    assert!(!re.is_match(b"concatenate"));
}

#[test]
fn substitution_swaps_captured_groups() {
    let re = Regex::new(r"\([A-Za-z]+\) \([A-Za-z]+\)").unwrap();
    let input = b"John Doe";
    let captures = re.captures(input).unwrap();
    let out = re.substitute(input, &captures, br"\2 \1", 64).unwrap();
    assert_eq!(out, b"Doe John");
}

#[test]
fn substitution_ampersand_is_whole_match() {
    let re = Regex::new("wor.d").unwrap();
    let input = b"a word here";
    let captures = re.captures(input).unwrap();
    let out = re.substitute(input, &captures, br"[&]", 32).unwrap();
    assert_eq!(out, b"[word]");
}

#[test]
fn substitution_overflow_is_line_too_long() {
    let re = Regex::new("a").unwrap();
    let input = b"a";
    let captures = re.captures(input).unwrap();
    assert_eq!(
        re.substitute(input, &captures, b"aaaaaaaaaaaa", 4),
        Err(RegexError::LineTooLong)
    );
}

#[test]
fn associate_tags_segments_by_earliest_match() {
    let haha = Regex::new("haha").unwrap();
    let te = Regex::new("te").unwrap();
    let (segments, tags) = associate(b"testhahatest", &[haha, te], &[2, 3], 4).unwrap();

    let joined: Vec<u8> = segments.iter().flatten().copied().collect();
    assert_eq!(joined, b"testhahatest");
    assert_eq!(segments.len(), tags.len());

    // "te" (tag 3) matches at position 0, before "haha" (tag 2) matches at
    // position 4, so it wins the race even though "haha" is listed first.
    assert_eq!(tags[0], 4); // untouched prefix before any match
    assert_eq!(segments[0], b"".to_vec());
    assert_eq!(segments[1], b"te".to_vec());
    assert_eq!(tags[1], 3);
}

#[test]
fn associate_guards_against_zero_length_matches() {
    let maybe_x = Regex::new("x*").unwrap();
    let (segments, _tags) = associate(b"abc", &[maybe_x], &[1], 0).unwrap();
    let joined: Vec<u8> = segments.iter().flatten().copied().collect();
    assert_eq!(joined, b"abc");
}

#[test]
fn filter_keeps_only_matching_strings() {
    let digits = Regex::new("^[0-9]+$").unwrap();
    let entries = [Some("abc"), Some("123"), None, Some("456")];
    let kept = filter(&entries, &digits, 0);
    assert_eq!(
        kept,
        vec![FilterEntry::Plain("123"), FilterEntry::Plain("456")]
    );
}

#[test]
fn filter_can_invert_and_report_original_index() {
    let digits = Regex::new("^[0-9]+$").unwrap();
    let entries = [Some("abc"), Some("123"), Some("xyz")];
    let kept = filter(&entries, &digits, 0b11);
    assert_eq!(
        kept,
        vec![
            FilterEntry::Indexed(1, "abc"),
            FilterEntry::Indexed(3, "xyz"),
        ]
    );
}

#[test]
fn too_many_capture_groups_is_rejected() {
    let pattern = "(".repeat(10) + &")".repeat(10);
    assert_eq!(
        Regex::with_flags(&pattern, CompileFlags::EXCOMPAT),
        Err(RegexError::TooManyParens)
    );
}

#[test]
fn trailing_backslash_is_premature_end() {
    assert_eq!(Regex::new(r"abc\"), Err(RegexError::PrematureEnd));
}

#[test]
fn bare_quantifier_with_no_atom_is_rejected() {
    assert_eq!(Regex::new("*abc"), Err(RegexError::BareOperator));
}

#[test]
fn unclosed_class_is_rejected() {
    assert_eq!(Regex::new("[abc"), Err(RegexError::UnmatchedBrackets));
}

#[test]
fn leading_bracket_and_trailing_dash_are_literal_in_classes() {
    let re = Regex::new("[]a-]").unwrap();
    assert!(re.is_match(b"]"));
    assert!(re.is_match(b"a"));
    assert!(re.is_match(b"-"));
    assert!(!re.is_match(b"b"));
}

#[test]
fn non_capturing_star_group_does_not_loop_forever() {
    // The outer `*` wraps a group that can itself match zero characters;
    // this must still terminate and compile cleanly.
    let re = Regex::with_flags("(a*)*", CompileFlags::EXCOMPAT).unwrap();
    assert!(re.is_match(b""));
    assert!(re.is_match(b"aaaa"));
}
