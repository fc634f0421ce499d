//! Compiled shell-style glob patterns.
//!
//! Supported syntax:
//! - `*` matches zero or more characters
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]` match one character from the set or range
//! - `[!abc]` or `[^abc]` match one character NOT in the set
//! - `\x` matches `x` literally
//!
//! An unclosed `[` is treated as a literal bracket.

/// One compiled pattern element.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyChar,
    Star,
    Class(CharClass),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CharClass {
    negated: bool,
    ranges: Vec<(char, char)>,
}

impl CharClass {
    fn contains(&self, c: char) -> bool {
        let hit = self.ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi);
        hit != self.negated
    }
}

impl Token {
    fn matches(&self, c: char) -> bool {
        match self {
            Token::Literal(l) => *l == c,
            Token::AnyChar => true,
            Token::Class(class) => class.contains(c),
            Token::Star => false,
        }
    }
}

/// A glob pattern compiled once and matched against many names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    tokens: Vec<Token>,
}

impl Pattern {
    /// Compile a pattern. Never fails: malformed classes degrade to literals.
    pub fn new(source: &str) -> Self {
        let chars: Vec<char> = source.chars().collect();
        let mut tokens = Vec::with_capacity(chars.len());
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '*' => {
                    // Consecutive stars collapse into one
                    if tokens.last() != Some(&Token::Star) {
                        tokens.push(Token::Star);
                    }
                    i += 1;
                }
                '?' => {
                    tokens.push(Token::AnyChar);
                    i += 1;
                }
                '[' => match parse_class(&chars[i..]) {
                    Some((class, consumed)) => {
                        tokens.push(Token::Class(class));
                        i += consumed;
                    }
                    None => {
                        tokens.push(Token::Literal('['));
                        i += 1;
                    }
                },
                '\\' if i + 1 < chars.len() => {
                    tokens.push(Token::Literal(chars[i + 1]));
                    i += 2;
                }
                c => {
                    tokens.push(Token::Literal(c));
                    i += 1;
                }
            }
        }

        Self {
            source: source.to_string(),
            tokens,
        }
    }

    /// The text this pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True if the pattern matches the whole input.
    pub fn matches(&self, input: &str) -> bool {
        let text: Vec<char> = input.chars().collect();
        let tokens = &self.tokens;

        let (mut p, mut t) = (0usize, 0usize);
        // Position of the last star and the input offset it is currently absorbing up to
        let mut backtrack: Option<(usize, usize)> = None;

        while t < text.len() {
            if p < tokens.len() {
                if tokens[p] == Token::Star {
                    backtrack = Some((p, t));
                    p += 1;
                    continue;
                }
                if tokens[p].matches(text[t]) {
                    p += 1;
                    t += 1;
                    continue;
                }
            }
            match backtrack {
                Some((star_p, star_t)) => {
                    p = star_p + 1;
                    t = star_t + 1;
                    backtrack = Some((star_p, star_t + 1));
                }
                None => return false,
            }
        }

        while p < tokens.len() && tokens[p] == Token::Star {
            p += 1;
        }
        p == tokens.len()
    }

    /// Match a directory entry name.
    ///
    /// Names starting with `.` only match when the pattern itself starts
    /// with a literal `.`.
    pub fn matches_name(&self, name: &str) -> bool {
        if name.starts_with('.') && self.tokens.first() != Some(&Token::Literal('.')) {
            return false;
        }
        self.matches(name)
    }
}

/// Parse `[...]` at the start of `chars`. Returns the class and the number
/// of chars consumed, or `None` if the bracket is never closed.
fn parse_class(chars: &[char]) -> Option<(CharClass, usize)> {
    let mut idx = 1;
    let mut negated = false;
    if matches!(chars.get(idx), Some('!') | Some('^')) {
        negated = true;
        idx += 1;
    }

    let first = idx;
    let mut ranges = Vec::new();
    while idx < chars.len() {
        let c = chars[idx];
        // `]` closes the class unless it is the first member
        if c == ']' && idx > first {
            return Some((CharClass { negated, ranges }, idx + 1));
        }
        if chars.get(idx + 1) == Some(&'-') && chars.get(idx + 2).is_some_and(|&hi| hi != ']') {
            ranges.push((c, chars[idx + 2]));
            idx += 3;
        } else {
            ranges.push((c, c));
            idx += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("*.txt", "a.txt", true)]
    #[case("*.txt", "notes.md", false)]
    #[case("*", "", true)]
    #[case("a*b*c", "aXXbYYc", true)]
    #[case("a*b*c", "aXXcYYb", false)]
    #[case("**", "anything", true)]
    #[case("?", "", false)]
    #[case("???", "abc", true)]
    #[case("file?.log", "file12.log", false)]
    #[case("[abc]", "b", true)]
    #[case("[abc]", "d", false)]
    #[case("[a-z]x", "mx", true)]
    #[case("[!a-z]", "Q", true)]
    #[case("[^a-z]", "q", false)]
    #[case("[]ab]", "]", true)]
    #[case("[-a]", "-", true)]
    #[case("[a-]", "-", true)]
    #[case("[abc", "[abc", true)]
    #[case("\\*", "*", true)]
    #[case("\\*", "x", false)]
    #[case("*[0-9]", "run7", true)]
    #[case("*.*.txt", "a.txt", false)]
    #[case("Data", "data", false)]
    fn matches_cases(#[case] pattern: &str, #[case] input: &str, #[case] expected: bool) {
        assert_eq!(
            Pattern::new(pattern).matches(input),
            expected,
            "pattern={pattern:?} input={input:?}"
        );
    }

    #[test]
    fn star_backtracking_is_linear_enough() {
        let input = "a".repeat(2000);
        let pattern = Pattern::new(&format!("{}b", "a*".repeat(20)));
        assert!(!pattern.matches(&input));
    }

    #[test]
    fn hidden_names_need_explicit_dot() {
        assert!(!Pattern::new("*").matches_name(".hidden"));
        assert!(!Pattern::new("?hidden").matches_name(".hidden"));
        assert!(Pattern::new(".*").matches_name(".hidden"));
        assert!(Pattern::new("*").matches_name("visible"));
    }

    #[test]
    fn unicode_is_matched_per_char() {
        assert!(Pattern::new("?").matches("ü"));
        assert!(Pattern::new("[αβγ]*").matches("βeta"));
    }
}
