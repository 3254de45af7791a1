//! A small rule-driven tokenizer and token-stream editor.
//!
//! This is not a full Lua parser. It splits source into classified,
//! editable tokens that concatenate back to the exact input, which is all
//! the dialect conversion needs. Characters no rule claims become filler
//! tokens with the separator class, whitespace runs grouped.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Comment,
    Operator,
    Number,
    Str,
    Separator,
    TypeWord,
    Keyword,
    Variable,
    Function,
}

/// Lexing rules for one language dialect.
pub struct LexRules {
    pub comment_prefix: &'static str,
    pub string_delims: &'static [char],
    pub separators: &'static [char],
    pub type_words: &'static [&'static str],
    pub keywords: &'static [&'static str],
}

#[derive(Debug, Clone)]
pub struct Token {
    pub class: TokenClass,
    pub text: String,
}

pub struct TokenStream {
    tokens: Vec<Token>,
}

/// Longest operator match at the start of `chars`, or 0.
fn operator_len(chars: &[char]) -> usize {
    if chars.starts_with(&[':', ':', '=']) {
        return 3;
    }
    if chars.starts_with(&['.', '.']) {
        if chars.get(2) == Some(&'.') || chars.get(2) == Some(&'=') {
            return 3;
        }
        return 2;
    }
    if matches!(
        chars.first(),
        Some('~' | '=' | '<' | '>' | '+' | '-' | '*' | '/' | '%' | '&' | '^' | '|' | '\\' | '!')
    ) {
        if matches!(chars.get(1), Some(':' | '=')) {
            return 2;
        }
        return 1;
    }
    0
}

fn is_word_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl TokenStream {
    pub fn tokenize(rules: &LexRules, src: &str) -> Self {
        let chars: Vec<char> = src.chars().collect();
        let prefix: Vec<char> = rules.comment_prefix.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if !prefix.is_empty() && chars[i..].starts_with(&prefix) {
                // comment runs to end of line, newline excluded
                let mut j = i;
                while j < chars.len() && chars[j] != '\n' {
                    j += 1;
                }
                tokens.push(Token {
                    class: TokenClass::Comment,
                    text: chars[i..j].iter().collect(),
                });
                i = j;
                continue;
            }

            let op = operator_len(&chars[i..]);
            if op > 0 {
                tokens.push(Token {
                    class: TokenClass::Operator,
                    text: chars[i..i + op].iter().collect(),
                });
                i += op;
                continue;
            }

            if c.is_ascii_digit() {
                let mut j = i + 1;
                if c == '0' {
                    // radix prefix form: 0x1f, 0b101, 0.5
                    if matches!(chars.get(j), Some('0'..='9' | 'b' | 'x')) {
                        j += 1;
                    }
                    while matches!(chars.get(j), Some('0'..='9' | '.' | 'a'..='f')) {
                        j += 1;
                    }
                } else {
                    while matches!(chars.get(j), Some('0'..='9')) {
                        j += 1;
                    }
                }
                tokens.push(Token {
                    class: TokenClass::Number,
                    text: chars[i..j].iter().collect(),
                });
                i = j;
                continue;
            }

            if rules.string_delims.contains(&c) {
                let mut j = i + 1;
                while j < chars.len() && chars[j] != c {
                    if chars[j] == '\\' && j + 1 < chars.len() {
                        j += 1;
                    }
                    j += 1;
                }
                if j < chars.len() {
                    j += 1; // closing delimiter
                }
                tokens.push(Token {
                    class: TokenClass::Str,
                    text: chars[i..j].iter().collect(),
                });
                i = j;
                continue;
            }

            if rules.separators.contains(&c) {
                tokens.push(Token {
                    class: TokenClass::Separator,
                    text: c.to_string(),
                });
                i += 1;
                continue;
            }

            if is_word_start(c) {
                let mut j = i + 1;
                while j < chars.len() && is_word_char(chars[j]) {
                    j += 1;
                }
                let word: String = chars[i..j].iter().collect();
                let class = if rules.keywords.contains(&word.as_str()) {
                    TokenClass::Keyword
                } else if rules.type_words.contains(&word.as_str()) {
                    TokenClass::TypeWord
                } else if chars.get(j) == Some(&'(') {
                    TokenClass::Function
                } else {
                    TokenClass::Variable
                };
                tokens.push(Token { class, text: word });
                i = j;
                continue;
            }

            if c.is_whitespace() {
                let mut j = i + 1;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                tokens.push(Token {
                    class: TokenClass::Separator,
                    text: chars[i..j].iter().collect(),
                });
                i = j;
                continue;
            }

            // anything else is a single-character filler
            tokens.push(Token {
                class: TokenClass::Separator,
                text: c.to_string(),
            });
            i += 1;
        }

        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Token> {
        self.tokens.get(i)
    }

    pub fn class(&self, i: usize) -> Option<TokenClass> {
        self.tokens.get(i).map(|t| t.class)
    }

    pub fn text(&self, i: usize) -> &str {
        self.tokens.get(i).map(|t| t.text.as_str()).unwrap_or("")
    }

    /// First character of token `i`, or NUL when out of range or empty.
    pub fn first_char(&self, i: usize) -> char {
        self.text(i).chars().next().unwrap_or('\0')
    }

    /// True when tokens `i..` start with the given classes.
    pub fn matches(&self, i: usize, classes: &[TokenClass]) -> bool {
        classes
            .iter()
            .enumerate()
            .all(|(k, &c)| self.class(i + k) == Some(c))
    }

    /// Index of the next token at or after `from` with the given class and
    /// exact text.
    pub fn find_next(&self, from: usize, class: TokenClass, text: &str) -> Option<usize> {
        (from..self.tokens.len()).find(|&i| self.tokens[i].class == class && self.tokens[i].text == text)
    }

    pub fn insert(&mut self, i: usize, class: TokenClass, text: &str) {
        self.tokens.insert(
            i,
            Token {
                class,
                text: text.to_string(),
            },
        );
    }

    pub fn replace(&mut self, i: usize, class: TokenClass, text: &str) {
        self.tokens[i] = Token {
            class,
            text: text.to_string(),
        };
    }

    pub fn delete(&mut self, i: usize) {
        self.tokens.remove(i);
    }

    /// Concatenate all token texts back into source.
    pub fn serialize(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> LexRules {
        LexRules {
            comment_prefix: "--",
            string_delims: &['"', '\''],
            separators: &['[', ']', '{', '}', ',', ';', ':'],
            type_words: &["false", "local", "nil", "true"],
            keywords: &["and", "end", "if", "then", "while"],
        }
    }

    fn classes(src: &str) -> Vec<(TokenClass, String)> {
        let ts = TokenStream::tokenize(&rules(), src);
        (0..ts.len())
            .map(|i| (ts.class(i).unwrap(), ts.text(i).to_string()))
            .collect()
    }

    #[test]
    fn test_serialize_is_lossless() {
        let src = "if x>=1 then\n  y = \"a(b\" -- note\nend\n";
        let ts = TokenStream::tokenize(&rules(), src);
        assert_eq!(ts.serialize(), src);
    }

    #[test]
    fn test_keyword_vs_identifier() {
        let toks = classes("if iffy then");
        assert_eq!(toks[0], (TokenClass::Keyword, "if".to_string()));
        assert_eq!(toks[2], (TokenClass::Variable, "iffy".to_string()));
        assert_eq!(toks[4], (TokenClass::Keyword, "then".to_string()));
    }

    #[test]
    fn test_function_requires_immediate_paren() {
        let toks = classes("foo(bar)");
        assert_eq!(toks[0], (TokenClass::Function, "foo".to_string()));
        assert_eq!(toks[2], (TokenClass::Variable, "bar".to_string()));
    }

    #[test]
    fn test_operators_longest_match() {
        let toks = classes("a..=b");
        assert_eq!(toks[1], (TokenClass::Operator, "..=".to_string()));
        let toks = classes("a!=b");
        assert_eq!(toks[1], (TokenClass::Operator, "!=".to_string()));
        let toks = classes("astr..bstr");
        assert_eq!(toks[1], (TokenClass::Operator, "..".to_string()));
    }

    #[test]
    fn test_comment_runs_to_eol() {
        let toks = classes("x --[[ y\nz");
        assert_eq!(toks[2], (TokenClass::Comment, "--[[ y".to_string()));
        assert_eq!(toks[3], (TokenClass::Separator, "\n".to_string()));
    }

    #[test]
    fn test_string_with_escape() {
        let toks = classes("\"a\\\"b\" and");
        assert_eq!(toks[0], (TokenClass::Str, "\"a\\\"b\"".to_string()));
    }

    #[test]
    fn test_parens_are_single_fillers() {
        let toks = classes("if (x)");
        assert_eq!(toks[1], (TokenClass::Separator, " ".to_string()));
        assert_eq!(toks[2], (TokenClass::Separator, "(".to_string()));
        assert_eq!(toks[4], (TokenClass::Separator, ")".to_string()));
    }

    #[test]
    fn test_number_forms() {
        let toks = classes("x=0x1f+12");
        assert_eq!(toks[2], (TokenClass::Number, "0x1f".to_string()));
        assert_eq!(toks[4], (TokenClass::Number, "12".to_string()));
    }

    #[test]
    fn test_editing_operations() {
        let mut ts = TokenStream::tokenize(&rules(), "a=b");
        ts.insert(1, TokenClass::Separator, " ");
        ts.replace(0, TokenClass::Variable, "c");
        assert_eq!(ts.serialize(), "c =b");
        ts.delete(1);
        assert_eq!(ts.serialize(), "c=b");
        assert_eq!(ts.find_next(0, TokenClass::Variable, "b"), Some(2));
    }
}
