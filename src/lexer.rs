// ABOUTME: Lexer turning CheckerLang source text into a token stream with source positions

use std::fmt;
use std::rc::Rc;

use crate::errors::SyntaxError;

pub const KEYWORDS: &[&str] = &[
    "if", "then", "elif", "else", "and", "or", "not", "is", "in", "def", "fn", "for", "while",
    "do", "end", "finally", "catch", "break", "continue", "return", "error", "require", "as",
    "also",
];

/// A position in a source file, 1-based line, column of the first character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePos {
    pub filename: Rc<str>,
    pub line: i32,
    pub column: i32,
}

impl SourcePos {
    pub fn new(filename: &str, line: i32, column: i32) -> Self {
        SourcePos {
            filename: Rc::from(filename),
            line,
            column,
        }
    }

    pub fn unknown() -> Self {
        SourcePos::new("-", 1, 1)
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.filename.is_empty() {
            return write!(f, "-");
        }
        if &*self.filename == "-" {
            write!(f, ":{}:{}", self.line, self.column)
        } else {
            write!(f, "{}:{}:{}", self.filename, self.line, self.column)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Keyword,
    String,
    Int,
    Decimal,
    Boolean,
    Pattern,
    Operator,
    Interpunction,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Identifier => "identifier",
            TokenKind::Keyword => "keyword",
            TokenKind::String => "string",
            TokenKind::Int => "int",
            TokenKind::Decimal => "decimal",
            TokenKind::Boolean => "boolean",
            TokenKind::Pattern => "pattern",
            TokenKind::Operator => "operator",
            TokenKind::Interpunction => "interpunction",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub value: String,
    pub kind: TokenKind,
    pub pos: SourcePos,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut escaped = String::with_capacity(self.value.len());
        for ch in self.value.chars() {
            match ch {
                '\\' => escaped.push_str("\\\\"),
                '\'' => escaped.push_str("\\'"),
                '\n' => escaped.push_str("\\n"),
                '\r' => escaped.push_str("\\r"),
                '\t' => escaped.push_str("\\t"),
                _ => escaped.push(ch),
            }
        }
        write!(f, "{} ({})", escaped, self.kind)
    }
}

enum State {
    Initial,
    Word,
    Cmp,
    DoubleAngle,
    Str { quote: char },
    StrEscape { quote: char },
    StrHex1 { quote: char },
    StrHex2 { quote: char, first: char },
    SlashOrPattern,
    Pattern,
    IntNum,
    ZeroPrefix,
    HexNum,
    BinNum,
    DecimalNum,
    Comment,
    CompositeAssign,
}

/// Token stream over a source string, with the cursor API the parser consumes.
pub struct Lexer {
    pub name: Rc<str>,
    tokens: Vec<Token>,
    next: usize,
}

fn char_len(s: &str) -> i32 {
    s.chars().count() as i32
}

impl Lexer {
    pub fn new(script: &str, name: &str) -> Result<Self, SyntaxError> {
        let name: Rc<str> = Rc::from(name);
        let tokens = scan(script, &name)?;
        Ok(Lexer {
            name,
            tokens,
            next: 0,
        })
    }

    pub fn has_next(&self) -> bool {
        self.next < self.tokens.len()
    }

    pub fn next_token(&mut self) -> Result<Token, SyntaxError> {
        if !self.has_next() {
            return Err(SyntaxError::new("Unexpected end of input", self.get_pos()));
        }
        let token = self.tokens[self.next].clone();
        self.next += 1;
        Ok(token)
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.next)
    }

    pub fn eat(&mut self, n: usize) {
        self.next += n;
    }

    /// One-token undo; the parser relies on this to resolve the
    /// `is`-predicate/equality ambiguity.
    pub fn previous(&mut self) -> Result<(), SyntaxError> {
        if self.next == 0 {
            return Err(SyntaxError::new(
                "Cannot go before beginning",
                self.get_pos(),
            ));
        }
        self.next -= 1;
        Ok(())
    }

    /// Position of the most recently consumed token.
    pub fn get_pos(&self) -> SourcePos {
        if self.next == 0 {
            return self.get_pos_next();
        }
        self.tokens[self.next - 1].pos.clone()
    }

    /// Position of the next token to be consumed.
    pub fn get_pos_next(&self) -> SourcePos {
        match self.tokens.get(self.next) {
            Some(token) => token.pos.clone(),
            None => {
                if self.next == 0 {
                    SourcePos::new(&self.name, 1, 1)
                } else {
                    self.tokens[self.next - 1].pos.clone()
                }
            }
        }
    }

    /// Check the n-th lookahead token (1-based) for a value and kind. With
    /// `kind == None`, identifier and keyword tokens both match.
    pub fn peekn(&self, n: usize, value: &str, kind: Option<TokenKind>) -> bool {
        match self.tokens.get(self.next + n - 1) {
            Some(token) => {
                token.value == value
                    && match kind {
                        Some(kind) => token.kind == kind,
                        None => {
                            token.kind == TokenKind::Identifier || token.kind == TokenKind::Keyword
                        }
                    }
            }
            None => false,
        }
    }

    pub fn peek_one(&self, n: usize, values: &[&str], kind: Option<TokenKind>) -> bool {
        values.iter().any(|value| self.peekn(n, value, kind))
    }

    pub fn peek_kind(&self, n: usize, kind: TokenKind) -> bool {
        match self.tokens.get(self.next + n - 1) {
            Some(token) => token.kind == kind,
            None => false,
        }
    }

    pub fn match_if(&mut self, value: &str, kind: Option<TokenKind>) -> bool {
        if self.peekn(1, value, kind) {
            self.eat(1);
            return true;
        }
        false
    }

    /// Multi-token conditional match; all tokens are consumed or none.
    pub fn match_if_seq(&mut self, tokens: &[(&str, Option<TokenKind>)]) -> bool {
        for (i, (value, kind)) in tokens.iter().enumerate() {
            if !self.peekn(i + 1, value, *kind) {
                return false;
            }
        }
        self.eat(tokens.len());
        true
    }

    /// Assert and consume a specific token.
    pub fn expect(&mut self, value: &str, kind: TokenKind) -> Result<(), SyntaxError> {
        if !self.has_next() {
            return Err(SyntaxError::new("Unexpected end of input", self.get_pos()));
        }
        let token = self.next_token()?;
        if token.value != value || token.kind != kind {
            return Err(SyntaxError::new(
                format!("Expected {} but got '{}'", value, token),
                token.pos,
            ));
        }
        Ok(())
    }

    pub fn match_identifier(&mut self) -> Result<String, SyntaxError> {
        if !self.has_next() {
            return Err(SyntaxError::new("Unexpected end of input", self.get_pos()));
        }
        let token = self.next_token()?;
        if token.kind != TokenKind::Identifier {
            return Err(SyntaxError::new(
                format!("Expected identifier but got '{}'", token),
                token.pos,
            ));
        }
        Ok(token.value)
    }
}

impl fmt::Display for Lexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<String> = self.tokens.iter().map(|t| t.to_string()).collect();
        write!(f, "[{}] @{}", tokens.join(", "), self.next)
    }
}

const TERM_CHARS: &str = "()[]<>=! \t\n\r+-*/%,;#";

fn scan(script: &str, filename: &Rc<str>) -> Result<Vec<Token>, SyntaxError> {
    let mut tokens: Vec<Token> = Vec::new();
    // The trailing blank flushes any token pending at end of input.
    let chars: Vec<char> = script.chars().chain(std::iter::once(' ')).collect();

    let make_pos = |line: i32, column: i32| SourcePos {
        filename: filename.clone(),
        line,
        column,
    };

    let mut token = String::new();
    let mut state = State::Initial;
    let mut pos = 0usize;
    let mut line = 1i32;
    let mut column = 0i32;
    let mut updatepos = true;

    while pos < chars.len() {
        let ch = chars[pos];
        pos += 1;
        if updatepos {
            if ch == '\n' {
                line += 1;
                column = 0;
            } else {
                column += 1;
            }
        }
        updatepos = true;

        match state {
            State::Initial => {
                if ch == '#' {
                    state = State::Comment;
                } else if "+-*%".contains(ch) {
                    token.push(ch);
                    state = State::CompositeAssign;
                } else if "()[],;".contains(ch) {
                    tokens.push(Token {
                        value: ch.to_string(),
                        kind: TokenKind::Interpunction,
                        pos: make_pos(line, column),
                    });
                } else if ch == '/' {
                    state = State::SlashOrPattern;
                } else if "<>=!".contains(ch) {
                    token.push(ch);
                    state = State::Cmp;
                } else if ch == '"' {
                    state = State::Str { quote: '"' };
                } else if ch == '\'' {
                    state = State::Str { quote: '\'' };
                } else if ch == '0' {
                    state = State::ZeroPrefix;
                } else if ch.is_ascii_digit() {
                    token.push(ch);
                    state = State::IntNum;
                } else if !" \t\r\n".contains(ch) {
                    token.push(ch);
                    state = State::Word;
                }
            }

            State::Word => {
                if "()+-*/%[]<>=,;!\"' \t\r\n#".contains(ch) {
                    if !token.is_empty() {
                        let here = make_pos(line, column - char_len(&token));
                        let tok = std::mem::take(&mut token);
                        if tok == "TRUE" || tok == "FALSE" {
                            tokens.push(Token {
                                value: tok,
                                kind: TokenKind::Boolean,
                                pos: here,
                            });
                        } else if KEYWORDS.contains(&tok.as_str()) {
                            tokens.push(Token {
                                value: tok,
                                kind: TokenKind::Keyword,
                                pos: here,
                            });
                        } else {
                            tokens.push(Token {
                                value: tok,
                                kind: TokenKind::Identifier,
                                pos: here,
                            });
                        }
                    }
                    pos -= 1;
                    updatepos = false;
                    state = State::Initial;
                } else {
                    token.push(ch);
                    if token == "..." {
                        tokens.push(Token {
                            value: std::mem::take(&mut token),
                            kind: TokenKind::Interpunction,
                            pos: make_pos(line, column - 2),
                        });
                        state = State::Initial;
                    }
                }
            }

            State::Cmp => {
                if ch == '=' {
                    token.push(ch);
                    tokens.push(Token {
                        value: std::mem::take(&mut token),
                        kind: TokenKind::Operator,
                        pos: make_pos(line, column - 1),
                    });
                    state = State::Initial;
                } else if ch == '>' && token == "=" {
                    token.clear();
                    tokens.push(Token {
                        value: "=>".to_string(),
                        kind: TokenKind::Interpunction,
                        pos: make_pos(line, column - 1),
                    });
                    state = State::Initial;
                } else if ch == '>' && token == "<" {
                    token.clear();
                    tokens.push(Token {
                        value: "<>".to_string(),
                        kind: TokenKind::Operator,
                        pos: make_pos(line, column - 1),
                    });
                    state = State::Initial;
                } else if ch == '<' && token == "<" {
                    token.push(ch);
                    state = State::DoubleAngle;
                } else if ch == '>' && token == ">" {
                    token.push(ch);
                    state = State::DoubleAngle;
                } else if ch == '>' && token == "!" {
                    token.clear();
                    tokens.push(Token {
                        value: "!>".to_string(),
                        kind: TokenKind::Operator,
                        pos: make_pos(line, column - 1),
                    });
                    state = State::Initial;
                } else if ch == '*' && token == "<" {
                    token.clear();
                    tokens.push(Token {
                        value: "<*".to_string(),
                        kind: TokenKind::Interpunction,
                        pos: make_pos(line, column - 1),
                    });
                    state = State::Initial;
                } else {
                    tokens.push(Token {
                        value: std::mem::take(&mut token),
                        kind: TokenKind::Operator,
                        pos: make_pos(line, column - 1),
                    });
                    pos -= 1;
                    updatepos = false;
                    state = State::Initial;
                }
            }

            State::DoubleAngle => {
                if ch == '<' && token == "<<" {
                    token.clear();
                    tokens.push(Token {
                        value: "<<<".to_string(),
                        kind: TokenKind::Interpunction,
                        pos: make_pos(line, column - 2),
                    });
                    state = State::Initial;
                } else if ch == '>' && token == ">>" {
                    token.clear();
                    tokens.push(Token {
                        value: ">>>".to_string(),
                        kind: TokenKind::Interpunction,
                        pos: make_pos(line, column - 2),
                    });
                    state = State::Initial;
                } else {
                    tokens.push(Token {
                        value: std::mem::take(&mut token),
                        kind: TokenKind::Interpunction,
                        pos: make_pos(line, column - 2),
                    });
                    pos -= 1;
                    updatepos = false;
                    state = State::Initial;
                }
            }

            State::Str { quote } => {
                if ch == quote {
                    let here = make_pos(line, column - char_len(&token) - 1);
                    tokens.push(Token {
                        value: std::mem::take(&mut token),
                        kind: TokenKind::String,
                        pos: here,
                    });
                    state = State::Initial;
                } else if ch == '\\' {
                    state = State::StrEscape { quote };
                } else {
                    token.push(ch);
                }
            }

            State::StrEscape { quote } => {
                match ch {
                    'n' => token.push('\n'),
                    'r' => token.push('\r'),
                    't' => token.push('\t'),
                    'x' => {
                        state = State::StrHex1 { quote };
                        continue;
                    }
                    _ => token.push(ch),
                }
                state = State::Str { quote };
            }

            State::StrHex1 { quote } => {
                state = State::StrHex2 { quote, first: ch };
            }

            State::StrHex2 { quote, first } => {
                let code = format!("{}{}", first, ch);
                let value = u32::from_str_radix(&code, 16).map_err(|_| {
                    SyntaxError::new(
                        format!("Invalid escape sequence \\x{}", code),
                        make_pos(line, column),
                    )
                })?;
                match char::from_u32(value) {
                    Some(c) => token.push(c),
                    None => {
                        return Err(SyntaxError::new(
                            format!("Invalid escape sequence \\x{}", code),
                            make_pos(line, column),
                        ));
                    }
                }
                state = State::Str { quote };
            }

            State::SlashOrPattern => {
                if ch == '/' {
                    token.push_str("//");
                    state = State::Pattern;
                } else if ch == '=' {
                    tokens.push(Token {
                        value: "/=".to_string(),
                        kind: TokenKind::Operator,
                        pos: make_pos(line, column - 1),
                    });
                    state = State::Initial;
                } else {
                    tokens.push(Token {
                        value: "/".to_string(),
                        kind: TokenKind::Operator,
                        pos: make_pos(line, column - 1),
                    });
                    pos -= 1;
                    updatepos = false;
                    state = State::Initial;
                }
            }

            State::Pattern => {
                token.push(ch);
                if token.len() > 4 && token.ends_with("//") {
                    let here = make_pos(line, column - char_len(&token) + 1);
                    tokens.push(Token {
                        value: std::mem::take(&mut token),
                        kind: TokenKind::Pattern,
                        pos: here,
                    });
                    state = State::Initial;
                } else if token == "////" {
                    // the empty pattern
                    let here = make_pos(line, column - 3);
                    tokens.push(Token {
                        value: std::mem::take(&mut token),
                        kind: TokenKind::Pattern,
                        pos: here,
                    });
                    state = State::Initial;
                }
            }

            State::IntNum => {
                if ch == '.' {
                    token.push(ch);
                    state = State::DecimalNum;
                } else if ch.is_ascii_digit() || ch == '_' {
                    token.push(ch);
                } else if TERM_CHARS.contains(ch) {
                    let here = make_pos(line, column - char_len(&token));
                    tokens.push(Token {
                        value: std::mem::take(&mut token).replace('_', ""),
                        kind: TokenKind::Int,
                        pos: here,
                    });
                    pos -= 1;
                    updatepos = false;
                    state = State::Initial;
                } else {
                    token.push(ch);
                    state = State::Word;
                }
            }

            State::ZeroPrefix => {
                if ch == 'x' {
                    state = State::HexNum;
                } else if ch == 'b' {
                    state = State::BinNum;
                } else {
                    token.push('0');
                    pos -= 1;
                    updatepos = false;
                    state = State::IntNum;
                }
            }

            State::HexNum => {
                if ch.is_ascii_hexdigit() || ch == '_' {
                    token.push(ch);
                } else if TERM_CHARS.contains(ch) {
                    let here = make_pos(line, column - char_len(&token));
                    let cleaned = std::mem::take(&mut token).replace('_', "");
                    let value = i64::from_str_radix(&cleaned, 16).map_err(|_| {
                        SyntaxError::new(
                            format!("Invalid hex literal 0x{}", cleaned),
                            here.clone(),
                        )
                    })?;
                    tokens.push(Token {
                        value: value.to_string(),
                        kind: TokenKind::Int,
                        pos: here,
                    });
                    pos -= 1;
                    updatepos = false;
                    state = State::Initial;
                } else {
                    token.push(ch);
                    state = State::Word;
                }
            }

            State::BinNum => {
                if ch == '0' || ch == '1' || ch == '_' {
                    token.push(ch);
                } else if TERM_CHARS.contains(ch) {
                    let here = make_pos(line, column - char_len(&token));
                    let cleaned = std::mem::take(&mut token).replace('_', "");
                    let value = i64::from_str_radix(&cleaned, 2).map_err(|_| {
                        SyntaxError::new(
                            format!("Invalid binary literal 0b{}", cleaned),
                            here.clone(),
                        )
                    })?;
                    tokens.push(Token {
                        value: value.to_string(),
                        kind: TokenKind::Int,
                        pos: here,
                    });
                    pos -= 1;
                    updatepos = false;
                    state = State::Initial;
                } else {
                    token.push(ch);
                    state = State::Word;
                }
            }

            State::DecimalNum => {
                if ch.is_ascii_digit() || ch == '_' {
                    token.push(ch);
                } else if TERM_CHARS.contains(ch) {
                    let here = make_pos(line, column - char_len(&token));
                    tokens.push(Token {
                        value: std::mem::take(&mut token).replace('_', ""),
                        kind: TokenKind::Decimal,
                        pos: here,
                    });
                    pos -= 1;
                    updatepos = false;
                    state = State::Initial;
                } else {
                    token.push(ch);
                    state = State::Word;
                }
            }

            State::Comment => {
                if ch == '\n' {
                    state = State::Initial;
                }
            }

            State::CompositeAssign => {
                if ch == '=' {
                    token.push(ch);
                    tokens.push(Token {
                        value: std::mem::take(&mut token),
                        kind: TokenKind::Operator,
                        pos: make_pos(line, column - 1),
                    });
                    state = State::Initial;
                } else if token == "-" && ch == '>' {
                    token.clear();
                    tokens.push(Token {
                        value: "->".to_string(),
                        kind: TokenKind::Operator,
                        pos: make_pos(line, column - 1),
                    });
                    state = State::Initial;
                } else if token == "*" && ch == '>' {
                    token.clear();
                    tokens.push(Token {
                        value: "*>".to_string(),
                        kind: TokenKind::Interpunction,
                        pos: make_pos(line, column - 1),
                    });
                    state = State::Initial;
                } else {
                    tokens.push(Token {
                        value: std::mem::take(&mut token),
                        kind: TokenKind::Operator,
                        pos: make_pos(line, column - 1),
                    });
                    pos -= 1;
                    updatepos = false;
                    state = State::Initial;
                }
            }
        }
    }

    match state {
        State::Str { .. } | State::StrEscape { .. } | State::StrHex1 { .. }
        | State::StrHex2 { .. } => Err(SyntaxError::new(
            "Unterminated string literal",
            make_pos(line, column),
        )),
        State::Pattern => Err(SyntaxError::new(
            "Unterminated pattern",
            make_pos(line, column),
        )),
        _ => Ok(tokens),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_to_string(source: &str) -> String {
        Lexer::new(source, "-").expect("lexing failed").to_string()
    }

    #[test]
    fn test_simple() {
        assert_eq!(
            scan_to_string("1_6_V04 not empty"),
            "[1_6_V04 (identifier), not (keyword), empty (identifier)] @0"
        );
    }

    #[test]
    fn test_quotes() {
        assert_eq!(
            scan_to_string("a \"double\" b 'single' c"),
            "[a (identifier), double (string), b (identifier), single (string), \
             c (identifier)] @0"
        );
    }

    #[test]
    fn test_pattern() {
        assert_eq!(scan_to_string("//abc//"), "[//abc// (pattern)] @0");
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(scan_to_string("'one\\ntwo'"), "[one\\ntwo (string)] @0");
        assert_eq!(scan_to_string("'\\x41\\x42'"), "[AB (string)] @0");
    }

    #[test]
    fn test_int_hex_binary() {
        assert_eq!(scan_to_string("0xff"), "[255 (int)] @0");
        assert_eq!(scan_to_string("0b1010"), "[10 (int)] @0");
        assert_eq!(scan_to_string("1_000_000"), "[1000000 (int)] @0");
    }

    #[test]
    fn test_compare_ops() {
        assert_eq!(
            scan_to_string("1>2 d"),
            "[1 (int), > (operator), 2 (int), d (identifier)] @0"
        );
    }

    #[test]
    fn test_set_literal() {
        assert_eq!(
            scan_to_string("a in <<1, 2>>"),
            "[a (identifier), in (keyword), << (interpunction), 1 (int), , (interpunction), \
             2 (int), >> (interpunction)] @0"
        );
    }

    #[test]
    fn test_map_literal() {
        assert_eq!(
            scan_to_string("def m = <<<1 => 100>>>"),
            "[def (keyword), m (identifier), = (operator), <<< (interpunction), 1 (int), \
             => (interpunction), 100 (int), >>> (interpunction)] @0"
        );
    }

    #[test]
    fn test_object_literal_tokens() {
        assert_eq!(
            scan_to_string("<*a=1*>"),
            "[<* (interpunction), a (identifier), = (operator), 1 (int), *> (interpunction)] @0"
        );
    }

    #[test]
    fn test_spread_operator() {
        assert_eq!(
            scan_to_string("...a"),
            "[... (interpunction), a (identifier)] @0"
        );
        assert_eq!(
            scan_to_string("f(a, ...b)"),
            "[f (identifier), ( (interpunction), a (identifier), , (interpunction), \
             ... (interpunction), b (identifier), ) (interpunction)] @0"
        );
    }

    #[test]
    fn test_invoke_operator() {
        assert_eq!(
            scan_to_string("a!>b"),
            "[a (identifier), !> (operator), b (identifier)] @0"
        );
    }

    #[test]
    fn test_deref_property() {
        assert_eq!(
            scan_to_string("a->b ->c"),
            "[a (identifier), -> (operator), b (identifier), -> (operator), c (identifier)] @0"
        );
    }

    #[test]
    fn test_division_vs_pattern() {
        assert_eq!(
            scan_to_string("a / b"),
            "[a (identifier), / (operator), b (identifier)] @0"
        );
        assert_eq!(scan_to_string("a /= 2"), "[a (identifier), /= (operator), 2 (int)] @0");
    }

    #[test]
    fn test_composite_assign() {
        assert_eq!(
            scan_to_string("a += 1"),
            "[a (identifier), += (operator), 1 (int)] @0"
        );
        assert_eq!(
            scan_to_string("a %= 2"),
            "[a (identifier), %= (operator), 2 (int)] @0"
        );
    }

    #[test]
    fn test_comment() {
        assert_eq!(
            scan_to_string("1 # comment\n2"),
            "[1 (int), 2 (int)] @0"
        );
    }

    #[test]
    fn test_keywords_and_booleans() {
        assert_eq!(
            scan_to_string("if TRUE then FALSE"),
            "[if (keyword), TRUE (boolean), then (keyword), FALSE (boolean)] @0"
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert!(Lexer::new("'abc", "-").is_err());
        assert!(Lexer::new("\"abc", "-").is_err());
    }

    #[test]
    fn test_unterminated_pattern() {
        assert!(Lexer::new("//abc", "-").is_err());
    }

    #[test]
    fn test_positions() {
        let lexer = Lexer::new("a\n  b", "test.ckl").expect("lexing failed");
        let a = lexer.peek().expect("token").pos.clone();
        assert_eq!((a.line, a.column), (1, 1));
        let mut lexer = lexer;
        lexer.eat(1);
        let b = lexer.peek().expect("token").pos.clone();
        assert_eq!((b.line, b.column), (2, 3));
        assert_eq!(b.to_string(), "test.ckl:2:3");
    }
}
