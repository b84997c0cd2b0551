// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text normalisation for recognised document text.
//
// A fixed sequence of cleanup heuristics tuned for certificate-style
// sources. Each step targets one recurring engine misread on that material
// rather than general text cleanup, so every step can be switched off
// through `NormalizeOptions`. The transform is pure, deterministic, and
// idempotent.

use serde::{Deserialize, Serialize};

/// Which cleanup steps `TextNormalizer::clean` applies. All default to on.
///
/// Documents that carry meaningful slashes or digit strings in running text
/// (serial-heavy forms, inline dates) should disable `strokes_to_i` and
/// `zero_to_o`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NormalizeOptions {
    /// Collapse runs of spaces and tabs to a single space, keeping line
    /// structure intact.
    pub collapse_whitespace: bool,
    /// Rewrite `|`, `\` and `/` to `I`; the engine misreads vertical
    /// strokes out of letter contexts.
    pub strokes_to_i: bool,
    /// Rewrite `0` to `O` where the nearest non-zero neighbour is a letter,
    /// so `R00M` heals to `ROOM` while `100` stays numeric.
    pub zero_to_o: bool,
    /// Rewrite a standalone capital `I` token to `1`.
    pub lone_i_to_one: bool,
    /// Collapse gaps of blank (or whitespace-only) lines to one line break.
    pub collapse_blank_lines: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            collapse_whitespace: true,
            strokes_to_i: true,
            zero_to_o: true,
            lone_i_to_one: true,
            collapse_blank_lines: true,
        }
    }
}

/// Cleans raw recognised text of recurring recognition artifacts.
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    options: NormalizeOptions,
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: NormalizeOptions) -> Self {
        Self { options }
    }

    /// Apply the configured steps in fixed order, then trim.
    ///
    /// Line endings fold to LF before any step runs. Empty input yields an
    /// empty string, and the transform is idempotent:
    /// `clean(clean(x)) == clean(x)`.
    pub fn clean(&self, raw: &str) -> String {
        if raw.is_empty() {
            return String::new();
        }
        let mut text = raw.replace("\r\n", "\n").replace('\r', "\n");
        if self.options.collapse_whitespace {
            text = collapse_inline_whitespace(&text);
        }
        if self.options.strokes_to_i {
            text = text.replace(['|', '\\', '/'], "I");
        }
        if self.options.zero_to_o {
            text = disambiguate_zeros(&text);
        }
        if self.options.lone_i_to_one {
            text = lone_i_to_one(&text);
        }
        if self.options.collapse_blank_lines {
            text = collapse_blank_lines(&text);
        }
        text.trim().to_string()
    }
}

/// Collapse each run of non-newline whitespace to a single space.
fn collapse_inline_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for ch in text.chars() {
        if ch == '\n' {
            out.push('\n');
            in_run = false;
        } else if ch.is_whitespace() {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}

/// Replace `0` with `O` when the nearest non-zero neighbour on either side
/// is an ASCII letter. Whole runs of zeros heal together.
fn disambiguate_zeros(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &ch) in chars.iter().enumerate() {
        if ch != '0' {
            out.push(ch);
            continue;
        }
        let before = chars[..i].iter().rev().find(|&&c| c != '0');
        let after = chars[i + 1..].iter().find(|&&c| c != '0');
        let lettered = before.is_some_and(|c| c.is_ascii_alphabetic())
            || after.is_some_and(|c| c.is_ascii_alphabetic());
        out.push(if lettered { 'O' } else { '0' });
    }
    out
}

/// Replace standalone capital `I` tokens with `1`. A token boundary is any
/// non-alphanumeric, non-underscore neighbour (or the text edge).
fn lone_i_to_one(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &ch) in chars.iter().enumerate() {
        let bounded_left = i == 0 || !is_word_char(chars[i - 1]);
        let bounded_right = i + 1 == chars.len() || !is_word_char(chars[i + 1]);
        if ch == 'I' && bounded_left && bounded_right {
            out.push('1');
        } else {
            out.push(ch);
        }
    }
    out
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Drop blank lines, joining the surviving lines with single breaks.
fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut seen_content = false;
    for line in text.split('\n') {
        if line.trim().is_empty() {
            continue;
        }
        if seen_content {
            out.push('\n');
        }
        out.push_str(line);
        seen_content = true;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_output() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.clean(""), "");
        assert_eq!(normalizer.clean("   \n  \t "), "");
    }

    #[test]
    fn whitespace_collapses_but_lines_survive() {
        let normalizer = TextNormalizer::new();
        let cleaned = normalizer.clean("Certificate\t\tof  Merit\nName:   Jane");
        assert_eq!(cleaned, "Certificate of Merit\nName: Jane");
    }

    #[test]
    fn carriage_returns_fold_to_line_feeds() {
        let normalizer = TextNormalizer::new();
        let cleaned = normalizer.clean("first\r\nsecond\rthird");
        assert_eq!(cleaned, "first\nsecond\nthird");
    }

    #[test]
    fn vertical_strokes_become_capital_i() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.clean("cert|fy"), "certIfy");
        assert_eq!(normalizer.clean(r"d\ploma"), "dIploma");
        assert_eq!(normalizer.clean("qual/ty"), "qualIty");
    }

    #[test]
    fn zeros_heal_only_in_letter_contexts() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.clean("R00M"), "ROOM");
        assert_eq!(normalizer.clean("HON0URS"), "HONOURS");
        assert_eq!(normalizer.clean("awarded 100 credits"), "awarded 100 credits");
        assert_eq!(normalizer.clean("12-05-2020"), "12-05-2020");
    }

    #[test]
    fn lone_capital_i_becomes_one() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.clean("Grade I listed"), "Grade 1 listed");
        assert_eq!(normalizer.clean("page I"), "page 1");
        // Adjacent word characters keep the letter.
        assert_eq!(normalizer.clean("III"), "III");
        assert_eq!(normalizer.clean("Ian"), "Ian");
    }

    #[test]
    fn blank_line_gaps_collapse_to_single_breaks() {
        let normalizer = TextNormalizer::new();
        let cleaned = normalizer.clean("Awarded to\n\n\nJane Doe\n \t \nMay 2020");
        assert_eq!(cleaned, "Awarded to\nJane Doe\nMay 2020");
    }

    #[test]
    fn disabled_steps_leave_text_alone() {
        let normalizer = TextNormalizer::with_options(NormalizeOptions {
            collapse_whitespace: false,
            strokes_to_i: false,
            zero_to_o: false,
            lone_i_to_one: false,
            collapse_blank_lines: false,
        });
        assert_eq!(normalizer.clean("R00M  a/b\n\nI"), "R00M  a/b\n\nI");
    }

    #[test]
    fn single_disabled_step_is_respected() {
        let normalizer = TextNormalizer::with_options(NormalizeOptions {
            zero_to_o: false,
            ..NormalizeOptions::default()
        });
        assert_eq!(normalizer.clean("R00M 12"), "R00M 12");
    }

    #[test]
    fn cleaning_is_idempotent() {
        let normalizer = TextNormalizer::new();
        let noisy = "Th|s  is to cert/fy that\r\n\r\n  Jane   D0e \n \n completed R00M I \\ checks\n\n100 credits ";
        let once = normalizer.clean(noisy);
        let twice = normalizer.clean(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn output_is_trimmed() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.clean("  Award  "), "Award");
    }
}
