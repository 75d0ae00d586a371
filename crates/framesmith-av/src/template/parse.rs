//! Template source to syntax tree.
//!
//! The directive set is closed: substitution, `default`, `tokens`, `set` and
//! `if`/`else if`/`else`/`end` with a handful of predicates. Anything else is a
//! parse error reported with its byte offset.

use crate::{Error, Result};
use serde_json::Value;

/// A dotted field reference such as `.Video.streams.0.codec_name`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPath {
    pub segments: Vec<String>,
}

impl FieldPath {
    pub fn display(&self) -> String {
        format!(".{}", self.segments.join("."))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Field(FieldPath),
    Literal(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn from_word(word: &str) -> Option<Self> {
        Some(match word {
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            "lt" => Self::Lt,
            "le" => Self::Le,
            "gt" => Self::Gt,
            "ge" => Self::Ge,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cond {
    Truthy(Operand),
    Not(Box<Cond>),
    And(Box<Cond>, Box<Cond>),
    Or(Box<Cond>, Box<Cond>),
    Compare(CmpOp, Operand, Operand),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Output(FieldPath),
    Default(Value, FieldPath),
    Tokens(FieldPath),
    Set(String, Operand),
    If {
        branches: Vec<(Cond, Vec<Node>)>,
        otherwise: Vec<Node>,
    },
}

/// Words inside one `{{ ... }}` action.
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Field(FieldPath),
    Str(String),
    Num(Value),
    Word(String),
    Open,
    Close,
}

/// One lexed piece of source: literal text or an action with its offset.
#[derive(Debug)]
enum Piece {
    Text(String),
    Action { offset: usize, tokens: Vec<Token> },
}

/// Parse a template whose newlines have already been collapsed.
pub fn parse(source: &str) -> Result<Vec<Node>> {
    let pieces = lex(source)?;
    let mut parser = Parser { pieces, pos: 0 };
    let (nodes, end) = parser.block()?;
    match end {
        None => Ok(nodes),
        Some((offset, word)) => Err(Error::template_parse(
            offset,
            format!("unexpected {{{{ {word} }}}}"),
        )),
    }
}

fn lex(source: &str) -> Result<Vec<Piece>> {
    let mut pieces = Vec::new();
    let mut rest = source;
    let mut offset = 0;
    let mut trim_next = false;

    while !rest.is_empty() {
        let Some(start) = rest.find("{{") else {
            push_text(&mut pieces, rest, trim_next, false);
            break;
        };

        let mut inner_start = start + 2;
        let trim_prev = rest[inner_start..].starts_with("- ");
        if trim_prev {
            inner_start += 1;
        }
        push_text(&mut pieces, &rest[..start], trim_next, trim_prev);

        let action_offset = offset + start;
        let Some(close) = find_close(&rest[inner_start..]) else {
            return Err(Error::template_parse(action_offset, "unclosed action"));
        };
        let mut inner = &rest[inner_start..inner_start + close];
        trim_next = inner.ends_with(" -");
        if trim_next {
            inner = &inner[..inner.len() - 1];
        }

        let tokens = tokenize(inner, offset + inner_start)?;
        if tokens.is_empty() {
            return Err(Error::template_parse(action_offset, "empty action"));
        }
        pieces.push(Piece::Action {
            offset: action_offset,
            tokens,
        });

        let consumed = inner_start + close + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }

    Ok(pieces)
}

fn push_text(pieces: &mut Vec<Piece>, text: &str, trim_start: bool, trim_end: bool) {
    let mut text = text;
    if trim_start {
        text = text.trim_start();
    }
    if trim_end {
        text = text.trim_end();
    }
    if !text.is_empty() {
        pieces.push(Piece::Text(text.to_string()));
    }
}

/// Find the closing `}}` of an action, skipping over string literals.
fn find_close(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    let mut in_str = false;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_str => i += 1,
            b'"' => in_str = !in_str,
            b'}' if !in_str && bytes.get(i + 1) == Some(&b'}') => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

fn tokenize(inner: &str, base: usize) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<(usize, char)> = inner.char_indices().collect();
    let mut i = 0;

    while i < chars.len() {
        let (at, c) = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::Open);
                i += 1;
            }
            ')' => {
                tokens.push(Token::Close);
                i += 1;
            }
            '"' => {
                let mut out = String::new();
                i += 1;
                loop {
                    let Some(&(_, c)) = chars.get(i) else {
                        return Err(Error::template_parse(base + at, "unterminated string"));
                    };
                    i += 1;
                    match c {
                        '"' => break,
                        '\\' => {
                            let Some(&(_, esc)) = chars.get(i) else {
                                return Err(Error::template_parse(base + at, "unterminated string"));
                            };
                            i += 1;
                            out.push(match esc {
                                'n' => '\n',
                                't' => '\t',
                                other => other,
                            });
                        }
                        other => out.push(other),
                    }
                }
                tokens.push(Token::Str(out));
            }
            _ => {
                let start = i;
                while i < chars.len() && !chars[i].1.is_whitespace() && !"()\"".contains(chars[i].1) {
                    i += 1;
                }
                let end = chars.get(i).map(|&(p, _)| p).unwrap_or(inner.len());
                let word = &inner[at..end];
                tokens.push(classify(word, base + chars[start].0)?);
            }
        }
    }

    Ok(tokens)
}

fn classify(word: &str, offset: usize) -> Result<Token> {
    if let Some(path) = word.strip_prefix('.') {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(Error::template_parse(offset, format!("bad field reference {word}")));
        }
        return Ok(Token::Field(FieldPath { segments }));
    }

    let first = word.chars().next().unwrap_or(' ');
    if first.is_ascii_digit() || first == '-' {
        let value: Value = serde_json::from_str(word)
            .map_err(|_| Error::template_parse(offset, format!("bad number {word}")))?;
        if !value.is_number() {
            return Err(Error::template_parse(offset, format!("bad number {word}")));
        }
        return Ok(Token::Num(value));
    }

    if word.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Ok(Token::Word(word.to_string()));
    }

    Err(Error::template_parse(offset, format!("unexpected {word}")))
}

struct Parser {
    pieces: Vec<Piece>,
    pos: usize,
}

/// Offset and keyword (`else` or `end`) of the action that ended a block.
type BlockEnd = Option<(usize, String)>;

impl Parser {
    /// Parse nodes until the input ends or a block keyword (`else`, `end`)
    /// appears. The keyword's action is left for the caller.
    fn block(&mut self) -> Result<(Vec<Node>, BlockEnd)> {
        let mut nodes = Vec::new();

        while self.pos < self.pieces.len() {
            let piece = &self.pieces[self.pos];
            let (offset, tokens) = match piece {
                Piece::Text(text) => {
                    nodes.push(Node::Text(text.clone()));
                    self.pos += 1;
                    continue;
                }
                Piece::Action { offset, tokens } => (*offset, tokens.clone()),
            };

            if let Token::Word(word) = &tokens[0] {
                if word == "else" || word == "end" {
                    return Ok((nodes, Some((offset, word.clone()))));
                }
            }

            self.pos += 1;
            nodes.push(self.action(offset, tokens)?);
        }

        Ok((nodes, None))
    }

    fn action(&mut self, offset: usize, tokens: Vec<Token>) -> Result<Node> {
        let mut cursor = Cursor {
            tokens,
            pos: 0,
            offset,
        };

        let node = match cursor.next() {
            Some(Token::Field(path)) => Node::Output(path),
            Some(Token::Word(word)) => match word.as_str() {
                "if" => {
                    let cond = cursor.cond()?;
                    cursor.finish()?;
                    return self.if_chain(offset, cond);
                }
                "default" => {
                    let fallback = match cursor.next() {
                        Some(Token::Str(s)) => Value::String(s),
                        Some(Token::Num(n)) => n,
                        _ => return Err(cursor.error("default needs a literal fallback")),
                    };
                    Node::Default(fallback, cursor.field("default")?)
                }
                "tokens" => Node::Tokens(cursor.field("tokens")?),
                "set" => {
                    let key = match cursor.next() {
                        Some(Token::Str(s)) if !s.is_empty() => s,
                        _ => return Err(cursor.error("set needs a quoted key")),
                    };
                    Node::Set(key, cursor.operand()?)
                }
                other => return Err(cursor.error(format!("unknown directive {other}"))),
            },
            _ => return Err(cursor.error("expected a field or directive")),
        };

        cursor.finish()?;
        Ok(node)
    }

    fn if_chain(&mut self, offset: usize, first: Cond) -> Result<Node> {
        let mut branches = Vec::new();
        let mut cond = first;

        loop {
            let (body, end) = self.block()?;
            branches.push((cond, body));

            let Some((end_offset, word)) = end else {
                return Err(Error::template_parse(offset, "if without end"));
            };
            let tokens = match &self.pieces[self.pos] {
                Piece::Action { tokens, .. } => tokens.clone(),
                Piece::Text(_) => Vec::new(),
            };
            self.pos += 1;

            if word == "end" {
                if tokens.len() != 1 {
                    return Err(Error::template_parse(end_offset, "end takes no arguments"));
                }
                return Ok(Node::If {
                    branches,
                    otherwise: Vec::new(),
                });
            }

            // else / else if
            if tokens.len() == 1 {
                let (otherwise, end) = self.block()?;
                match end {
                    Some((_, w)) if w == "end" => {
                        self.pos += 1;
                        return Ok(Node::If {
                            branches,
                            otherwise,
                        });
                    }
                    Some((o, _)) => {
                        return Err(Error::template_parse(o, "else after else"));
                    }
                    None => return Err(Error::template_parse(offset, "if without end")),
                }
            }

            let mut cursor = Cursor {
                tokens,
                pos: 1,
                offset: end_offset,
            };
            match cursor.next() {
                Some(Token::Word(w)) if w == "if" => {}
                _ => return Err(cursor.error("expected else or else if")),
            }
            cond = cursor.cond()?;
            cursor.finish()?;
        }
    }
}

struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
    offset: usize,
}

impl Cursor {
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::template_parse(self.offset, message)
    }

    fn finish(&self) -> Result<()> {
        if self.pos < self.tokens.len() {
            return Err(self.error("unexpected trailing words"));
        }
        Ok(())
    }

    fn field(&mut self, directive: &str) -> Result<FieldPath> {
        match self.next() {
            Some(Token::Field(path)) => Ok(path),
            _ => Err(self.error(format!("{directive} needs a field reference"))),
        }
    }

    fn operand(&mut self) -> Result<Operand> {
        match self.next() {
            Some(Token::Field(path)) => Ok(Operand::Field(path)),
            Some(Token::Str(s)) => Ok(Operand::Literal(Value::String(s))),
            Some(Token::Num(n)) => Ok(Operand::Literal(n)),
            Some(Token::Word(w)) if w == "true" => Ok(Operand::Literal(Value::Bool(true))),
            Some(Token::Word(w)) if w == "false" => Ok(Operand::Literal(Value::Bool(false))),
            _ => Err(self.error("expected a field or literal")),
        }
    }

    fn cond(&mut self) -> Result<Cond> {
        let word = match self.peek() {
            Some(Token::Word(w)) if w != "true" && w != "false" => w.clone(),
            Some(Token::Open) => {
                self.pos += 1;
                let inner = self.cond()?;
                return match self.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(self.error("unbalanced parenthesis")),
                };
            }
            _ => return Ok(Cond::Truthy(self.operand()?)),
        };
        self.pos += 1;

        match word.as_str() {
            "not" => Ok(Cond::Not(Box::new(self.cond()?))),
            "and" => {
                let a = self.cond()?;
                let b = self.cond()?;
                Ok(Cond::And(Box::new(a), Box::new(b)))
            }
            "or" => {
                let a = self.cond()?;
                let b = self.cond()?;
                Ok(Cond::Or(Box::new(a), Box::new(b)))
            }
            other => match CmpOp::from_word(other) {
                Some(op) => {
                    let a = self.operand()?;
                    let b = self.operand()?;
                    Ok(Cond::Compare(op, a, b))
                }
                None => Err(self.error(format!("unknown predicate {other}"))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use assert_matches::assert_matches;

    fn field(path: &str) -> FieldPath {
        FieldPath {
            segments: path.split('.').map(str::to_string).collect(),
        }
    }

    #[test]
    fn test_text_and_fields() {
        let nodes = parse(r#"{"args": ["{{ .Profile.codec }}"]}"#).unwrap();
        assert_eq!(
            nodes,
            vec![
                Node::Text(r#"{"args": [""#.into()),
                Node::Output(field("Profile.codec")),
                Node::Text(r#""]}"#.into()),
            ]
        );
    }

    #[test]
    fn test_if_else_chain() {
        let nodes =
            parse("{{ if gt .h 1080 }}a{{ else if eq .c \"hevc\" }}b{{ else }}c{{ end }}").unwrap();
        let Node::If {
            branches,
            otherwise,
        } = &nodes[0]
        else {
            panic!("expected if");
        };
        assert_eq!(branches.len(), 2);
        assert_eq!(
            branches[0].0,
            Cond::Compare(
                CmpOp::Gt,
                Operand::Field(field("h")),
                Operand::Literal(json!(1080))
            )
        );
        assert_eq!(branches[1].1, vec![Node::Text("b".into())]);
        assert_eq!(otherwise, &vec![Node::Text("c".into())]);
    }

    #[test]
    fn test_nested_conditions() {
        let nodes = parse("{{ if and (not .a) (or .b (lt .c 2)) }}x{{ end }}").unwrap();
        let Node::If { branches, .. } = &nodes[0] else {
            panic!("expected if");
        };
        assert_matches!(branches[0].0, Cond::And(_, _));
    }

    #[test]
    fn test_trim_markers() {
        let nodes = parse("[ {{- .a -}} ]").unwrap();
        assert_eq!(
            nodes,
            vec![
                Node::Text("[".into()),
                Node::Output(field("a")),
                Node::Text("]".into()),
            ]
        );
    }

    #[test]
    fn test_set_and_default() {
        let nodes = parse(r#"{{ set "crf" 23 }}{{ default "mp4" .Profile.ext }}"#).unwrap();
        assert_eq!(nodes[0], Node::Set("crf".into(), Operand::Literal(json!(23))));
        assert_eq!(nodes[1], Node::Default(json!("mp4"), field("Profile.ext")));
    }

    #[test]
    fn test_parse_errors() {
        for (source, offset) in [
            ("abc {{ .a ", 4),
            ("{{ if .a }}x", 0),
            ("x{{ end }}", 1),
            ("{{ frobnicate .a }}", 0),
            ("{{ }}", 0),
            ("{{ .a .b }}", 0),
            ("{{ if .a }}{{ else }}{{ else }}{{ end }}", 21),
            ("{{ .a..b }}", 3),
        ] {
            match parse(source) {
                Err(Error::TemplateParse { offset: got, .. }) => {
                    assert_eq!(got, offset, "offset for {source:?}")
                }
                other => panic!("expected parse error for {source:?}, got {other:?}"),
            }
        }
    }
}
