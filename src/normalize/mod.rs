//! Noise normalization for extracted answer text.
//!
//! Supplier reports arrive as free text scraped out of spreadsheet cells, and
//! the cells carry a lot of structure that is meaningless for matching:
//! numbering markers, section references, dates, document codes, counter
//! suffixes, stray brackets, file names. [`normalize`] strips all of it in a
//! fixed rule order and returns the semantic remainder.
//!
//! The pipeline is deterministic, side-effect free, and idempotent:
//! `normalize(normalize(x)) == normalize(x)`.


use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

macro_rules! rule_regex {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($pattern).expect("invalid noise rule pattern"));
    };
}

// Rule 1. Leading numbering markers: `1.`, `1)`, `(1)`, circled digits.
// Allows a run of consecutive markers so one pass strips `1) 2) text` whole.
rule_regex!(
    NUMBERING,
    r"(?m)^\s*(?:(?:\(\d{1,3}\)|\d{1,3}[.)]|[①②③④⑤⑥⑦⑧⑨⑩⑪⑫⑬⑭⑮⑯⑰⑱⑲⑳])\s*)+"
);

// Rule 2. Section-reference tokens: a category noun immediately followed by
// a digit sequence (`規定3`, `様式12-1`). Longer nouns listed first so the
// alternation never stops at a prefix.
rule_regex!(
    SECTION_REF,
    r"(?:該当項目|手順書|規定|規程|規則|手順|様式|基準)\s*\d+(?:[-.]\d+)*"
);

// Rule 3 candidates: digit-period fragments (`3.1`, `2.4.1項`). Whether a
// candidate is actually removed depends on classification — date-shaped
// fragments are content for rule 4, not section references.
rule_regex!(
    DOTTED_CANDIDATE,
    r"\b\d{1,4}(?:\.\d{1,4})+(?:項|条|章|節)?"
);

// Rule 4. Calendar dates in the delimiter/field-order styles seen in
// reports.
rule_regex!(
    DATE,
    r"(?x)
    \b\d{4}[/\-.]\d{1,2}[/\-.]\d{1,2}\b
    | \b\d{1,2}[/\-.]\d{1,2}[/\-.]\d{4}\b
    | \d{4}年\d{1,2}月\d{1,2}日?
    | \b\d{1,2}月\d{1,2}日
    "
);

// Rule 5. Long hyphen-segmented document codes (`QM-2023-0815-A`).
rule_regex!(DOC_CODE, r"\b[A-Za-z]{1,5}-\d{2,}(?:-[A-Za-z0-9]+)*\b");

// Rule 6. Parenthesized alphanumeric codes (`(AB-12345)`). Full-width
// parens have already been folded to ASCII by this point.
rule_regex!(PAREN_CODE, r"\([A-Za-z0-9][A-Za-z0-9\-_/]*\)");

// Rule 7. Document-count unit suffixes: digit plus counter word (`3件`).
rule_regex!(COUNTER, r"\d+\s*(?:件|枚|部|回|個|通|台|点)");

// Rule 8. Short standalone digit/mixed-alphanumeric codes (4 chars or
// fewer, containing at least one digit). Spelled out as an alternation
// because the regex engine has no lookahead to assert "contains a digit".
rule_regex!(
    SHORT_CODE,
    r"(?x)\b(?:
      \d{1,4}
    | [A-Za-z]\d{1,3}
    | [A-Za-z]{2}\d{1,2}
    | [A-Za-z]{3}\d
    | \d{1,3}[A-Za-z]
    | \d{1,2}[A-Za-z]{2}
    | \d[A-Za-z]{3}
    )\b"
);

// Rule 9 (empty pairs half; unpaired brackets need the scan in
// `strip_brackets`).
rule_regex!(EMPTY_BRACKETS, r"\(\s*\)|\[\s*\]|「\s*」|【\s*】|〈\s*〉|\{\s*\}");

// Rule 10. File-reference tokens: a basename plus a spreadsheet extension.
rule_regex!(FILE_REF, r"[\w\-]+\.(?i:xlsx|xlsm|xls|csv)\b");

rule_regex!(WHITESPACE_RUN, r"\s+");

/// Strips structural noise from raw extracted text.
///
/// Applies [`fold_width`] first, then the removal rules in contract order
/// (numbering, section references, dotted section fragments, dates,
/// document codes, parenthesized codes, counter suffixes, short codes,
/// brackets, file references), sweeps empty bracket pairs uncovered by the
/// file rule, then collapses whitespace.
///
/// Text consisting entirely of noise normalizes to the empty string;
/// callers must never treat an empty result as a keyword candidate.
pub fn normalize(raw: &str) -> String {
    let mut text = fold_width(raw);

    text = apply_rule("numbering", &NUMBERING, text);
    text = apply_rule("section_ref", &SECTION_REF, text);
    text = strip_dotted_sections(&text);
    text = apply_rule("date", &DATE, text);
    text = apply_rule("doc_code", &DOC_CODE, text);
    text = apply_rule("paren_code", &PAREN_CODE, text);
    text = apply_rule("counter", &COUNTER, text);
    text = apply_rule("short_code", &SHORT_CODE, text);
    text = strip_brackets(&text);
    text = apply_rule("file_ref", &FILE_REF, text);
    // A bracketed file name leaves an empty pair once the name is gone, so
    // the empty-pair cleanup runs once more after the file rule.
    text = strip_empty_pairs(&text);

    let collapsed = WHITESPACE_RUN.replace_all(&text, " ");
    collapsed.trim().to_string()
}

fn apply_rule(name: &'static str, pattern: &Regex, text: String) -> String {
    match pattern.replace_all(&text, " ") {
        Cow::Borrowed(_) => text,
        Cow::Owned(replaced) => {
            tracing::trace!(rule = name, "noise rule fired");
            replaced
        }
    }
}

/// Folds width and case for comparison: ASCII lowercased, full-width ASCII
/// (U+FF01–U+FF5E) mapped to half-width, ideographic space to ASCII space.
///
/// This is the key contract for exact matching and for the embedding cache:
/// two texts that fold to the same string are the same key.
pub fn fold_width(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{3000}' => ' ',
            '\u{FF01}'..='\u{FF5E}' => {
                let folded = char::from_u32(c as u32 - 0xFF01 + 0x21).unwrap_or(c);
                folded.to_ascii_lowercase()
            }
            _ => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Rule 3: removes digit-period fragments classified as section references.
/// Date-shaped fragments (`2023.05.10`) are left for the date rule so the
/// dotted-section pattern never bites chunks out of them.
fn strip_dotted_sections(text: &str) -> String {
    DOTTED_CANDIDATE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let fragment = &caps[0];
            if DATE.is_match(fragment) {
                fragment.to_string()
            } else {
                " ".to_string()
            }
        })
        .into_owned()
}

const OPEN_BRACKETS: [char; 6] = ['(', '[', '{', '「', '【', '〈'];
const CLOSE_BRACKETS: [char; 6] = [')', ']', '}', '」', '】', '〉'];

/// Removes empty bracket pairs until none remain. Runs to a fixed point
/// because removing an inner pair can expose an enclosing one (`(( ))`).
fn strip_empty_pairs(text: &str) -> String {
    let mut text = text.to_string();
    loop {
        match EMPTY_BRACKETS.replace_all(&text, " ") {
            Cow::Borrowed(_) => return text,
            Cow::Owned(replaced) => text = replaced,
        }
    }
}

/// Rule 9: removes empty bracket pairs of several styles, then drops any
/// bracket character left without a partner of its own style.
fn strip_brackets(text: &str) -> String {
    let text = strip_empty_pairs(text);

    let chars: Vec<char> = text.chars().collect();
    let mut drop = vec![false; chars.len()];
    let mut stacks: [Vec<usize>; 6] = Default::default();

    for (i, &c) in chars.iter().enumerate() {
        if let Some(style) = OPEN_BRACKETS.iter().position(|&o| o == c) {
            stacks[style].push(i);
        } else if let Some(style) = CLOSE_BRACKETS.iter().position(|&cl| cl == c) {
            if stacks[style].pop().is_none() {
                drop[i] = true;
            }
        }
    }
    for stack in &stacks {
        for &i in stack {
            drop[i] = true;
        }
    }

    chars
        .iter()
        .enumerate()
        .filter(|(i, _)| !drop[*i])
        .map(|(_, &c)| c)
        .collect()
}
