//! Recursive-descent parser turning scanner tokens into a [`JsonPath`].
//!
//! A thin public facade (this module) wraps an internal `ParserState` that
//! walks the token stream with ordinary recursive functions — no
//! combinator objects or indirection, just direct recursive descent with
//! error recovery at step boundaries.

use crate::error::{ParseError, ParseErrorCode};
use crate::scanner::{Position, Scanner, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Absolute,
    Relative,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    pub kind: PathKind,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAxis {
    Root,
    Single,
    Recursive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTestKind {
    Object,
    Array,
    String,
    Number,
    Boolean,
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    Wildcard,
    Type(TypeTestKind),
    Name(Vec<u8>),
    /// The synthesized first step of an absolute/relative path.
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Wildcard,
    Subscript {
        index: i64,
    },
    Slice {
        from: Option<i64>,
        to: Option<i64>,
        step: Option<i64>,
    },
    /// Reserved union-of-axes predicate; recognized by the grammar,
    /// unsupported at evaluation time.
    Join {
        left: JsonPath,
        right: JsonPath,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: StepAxis,
    pub test: NodeTest,
    pub predicate: Option<Predicate>,
}

/// Parses `expression` into a [`JsonPath`], or a non-empty list of
/// [`ParseError`]s collected while resynchronizing at step boundaries so
/// multiple errors can surface from a single malformed expression.
pub fn parse(expression: &[u8]) -> Result<JsonPath, Vec<ParseError>> {
    if expression.is_empty() {
        return Err(vec![ParseError::new(
            Position::default(),
            ParseErrorCode::ZeroLengthExpression,
        )]);
    }
    let text = match std::str::from_utf8(expression) {
        Ok(t) => t,
        Err(_) => {
            return Err(vec![ParseError::new(
                Position::default(),
                ParseErrorCode::NotAJsonPath,
            )])
        }
    };

    let mut state = ParserState::new(text);
    state.parse_path();

    if state.errors.is_empty() {
        Ok(JsonPath {
            kind: state.kind,
            steps: state.steps,
        })
    } else {
        Err(state.errors)
    }
}

struct ParserState<'a> {
    scanner: Scanner<'a>,
    lookahead: Option<(Token, Position)>,
    errors: Vec<ParseError>,
    kind: PathKind,
    steps: Vec<Step>,
}

impl<'a> ParserState<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            scanner: Scanner::new(input),
            lookahead: None,
            errors: Vec::new(),
            kind: PathKind::Absolute,
            steps: Vec::new(),
        }
    }

    fn peek(&mut self) -> (Token, Position) {
        if self.lookahead.is_none() {
            self.lookahead = Some(self.advance_raw());
        }
        self.lookahead.clone().unwrap()
    }

    fn bump(&mut self) -> (Token, Position) {
        match self.lookahead.take() {
            Some(t) => t,
            None => self.advance_raw(),
        }
    }

    fn advance_raw(&mut self) -> (Token, Position) {
        match self.scanner.next() {
            Ok(lexeme) => (lexeme.token, lexeme.position),
            Err(err) => {
                self.errors.push(err.into());
                (Token::Eof, Position::default())
            }
        }
    }

    fn error(&mut self, position: Position, code: ParseErrorCode) {
        self.errors.push(ParseError::new(position, code));
    }

    /// Skips tokens until the next step boundary (`.`/`..`) or `Eof`, so a
    /// single malformed step does not prevent reporting errors in the rest
    /// of the expression.
    fn resynchronize(&mut self) {
        loop {
            match self.peek().0 {
                Token::Dot | Token::DotDot | Token::Eof => break,
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn parse_path(&mut self) {
        let (token, position) = self.peek();
        match token {
            Token::Dollar => {
                self.bump();
                self.kind = PathKind::Absolute;
                self.steps.push(Step {
                    axis: StepAxis::Root,
                    test: NodeTest::None,
                    predicate: None,
                });
            }
            Token::At => {
                self.bump();
                self.kind = PathKind::Relative;
                self.steps.push(Step {
                    axis: StepAxis::Root,
                    test: NodeTest::None,
                    predicate: None,
                });
            }
            Token::Eof => {
                self.error(position, ParseErrorCode::ZeroLengthExpression);
                return;
            }
            _ => {
                self.error(position, ParseErrorCode::NotAJsonPath);
                return;
            }
        }

        loop {
            match self.peek().0 {
                Token::Eof => break,
                Token::Dot | Token::DotDot => self.parse_step(),
                Token::LBracket if self.last_step_predicate_is_open() => {
                    match self.parse_predicate() {
                        Some(predicate) => {
                            self.steps.last_mut().expect("root step pushed").predicate =
                                Some(predicate);
                        }
                        None => self.resynchronize(),
                    }
                }
                _ => {
                    let (_, position) = self.peek();
                    self.error(position, ParseErrorCode::ExtraJunkAfterPredicate);
                    self.resynchronize();
                }
            }
        }
    }

    /// `$[1:4]` and `$[$.a,$.b]` bind a predicate directly onto the
    /// synthesized root step, with no leading `.`/`..` — the same way a
    /// predicate binds onto a step's node test inside `parse_step`. Only
    /// legal when the most recently pushed step has no predicate yet.
    fn last_step_predicate_is_open(&self) -> bool {
        matches!(self.steps.last(), Some(step) if step.predicate.is_none())
    }

    fn parse_step(&mut self) {
        let (token, _) = self.bump();
        let axis = match token {
            Token::Dot => StepAxis::Single,
            Token::DotDot => StepAxis::Recursive,
            _ => unreachable!("parse_step only called at a `.`/`..` boundary"),
        };

        let (next_token, next_position) = self.peek();
        let test = match next_token {
            Token::Eof => {
                self.error(next_position, ParseErrorCode::PrematureEndOfInput);
                self.resynchronize();
                return;
            }
            Token::Dot | Token::DotDot if axis == StepAxis::Recursive => {
                // `..` with no explicit test defaults to wildcard.
                NodeTest::Wildcard
            }
            _ => match self.parse_node_test() {
                Some(test) => test,
                None => {
                    self.resynchronize();
                    return;
                }
            },
        };

        let predicate = if matches!(self.peek().0, Token::LBracket) {
            match self.parse_predicate() {
                Some(p) => Some(p),
                None => {
                    self.resynchronize();
                    return;
                }
            }
        } else {
            None
        };

        self.steps.push(Step {
            axis,
            test,
            predicate,
        });
    }

    fn parse_node_test(&mut self) -> Option<NodeTest> {
        let (token, position) = self.peek();
        match token {
            Token::Star => {
                self.bump();
                Some(NodeTest::Wildcard)
            }
            Token::Object
            | Token::Array
            | Token::String
            | Token::Number
            | Token::Boolean
            | Token::Null => {
                let kind = match token {
                    Token::Object => TypeTestKind::Object,
                    Token::Array => TypeTestKind::Array,
                    Token::String => TypeTestKind::String,
                    Token::Number => TypeTestKind::Number,
                    Token::Boolean => TypeTestKind::Boolean,
                    Token::Null => TypeTestKind::Null,
                    _ => unreachable!(),
                };
                self.bump();
                if !self.expect(Token::LParen) {
                    return None;
                }
                if !self.expect(Token::RParen) {
                    return None;
                }
                Some(NodeTest::Type(kind))
            }
            Token::Name(bytes) => {
                self.bump();
                if matches!(self.peek().0, Token::LParen) {
                    // A bare word that isn't one of the six recognized type
                    // keywords, immediately followed by `(`: e.g. `$.foo()`.
                    self.error(position, ParseErrorCode::ExpectedNodeTypeTest);
                    return None;
                }
                Some(NodeTest::Name(bytes))
            }
            Token::QuotedName(bytes) => {
                self.bump();
                Some(NodeTest::Name(bytes))
            }
            Token::LParen => {
                // `(` with no preceding name at all.
                self.error(position, ParseErrorCode::ExpectedNodeTypeTest);
                None
            }
            _ => {
                self.error(position, ParseErrorCode::ExpectedNameChar(None));
                None
            }
        }
    }

    fn expect(&mut self, expected: Token) -> bool {
        let (token, position) = self.peek();
        if token == expected {
            self.bump();
            true
        } else if expected == Token::LParen {
            self.error(position, ParseErrorCode::ExpectedNodeTypeTest);
            false
        } else {
            self.error(position, ParseErrorCode::UnexpectedValue);
            false
        }
    }

    fn parse_predicate(&mut self) -> Option<Predicate> {
        let (_, open_position) = self.bump(); // consume '['

        if matches!(self.peek().0, Token::RBracket) {
            self.error(open_position, ParseErrorCode::EmptyPredicate);
            self.bump();
            return None;
        }

        let predicate = if matches!(self.peek().0, Token::Star) {
            self.bump();
            Predicate::Wildcard
        } else if matches!(self.peek().0, Token::Dollar | Token::At) {
            self.parse_join(open_position)?
        } else {
            self.parse_integer_or_slice(open_position)?
        };

        let (token, position) = self.peek();
        match token {
            Token::RBracket => {
                self.bump();
                Some(predicate)
            }
            Token::Eof => {
                self.error(position, ParseErrorCode::UnbalancedPredicateDelimiter);
                None
            }
            _ => {
                self.error(position, ParseErrorCode::ExtraJunkAfterPredicate);
                None
            }
        }
    }

    fn parse_integer_or_slice(&mut self, open_position: Position) -> Option<Predicate> {
        let from = self.parse_optional_integer(open_position)?;

        if !matches!(self.peek().0, Token::Colon) {
            return match from {
                Some(index) => Some(Predicate::Subscript { index }),
                None => {
                    self.error(open_position, ParseErrorCode::ExpectedInteger);
                    None
                }
            };
        }

        self.bump(); // ':'
        let to = self.parse_optional_integer(open_position)?;

        let step = if matches!(self.peek().0, Token::Colon) {
            self.bump();
            let step = self.parse_optional_integer(open_position)?;
            match step {
                Some(0) => {
                    self.error(open_position, ParseErrorCode::SliceStepIsZero);
                    return None;
                }
                other => other,
            }
        } else {
            None
        };

        Some(Predicate::Slice { from, to, step })
    }

    fn parse_optional_integer(&mut self, open_position: Position) -> Option<Option<i64>> {
        match self.peek().0 {
            Token::Integer(n) => {
                self.bump();
                Some(Some(n))
            }
            Token::Colon | Token::RBracket => Some(None),
            Token::Eof => {
                self.error(open_position, ParseErrorCode::UnbalancedPredicateDelimiter);
                None
            }
            _ => {
                let (_, position) = self.peek();
                self.error(position, ParseErrorCode::ExpectedInteger);
                None
            }
        }
    }

    fn parse_join(&mut self, open_position: Position) -> Option<Predicate> {
        let left = self.parse_nested_path(open_position)?;
        if !matches!(self.peek().0, Token::Comma) {
            self.error(open_position, ParseErrorCode::UnsupportedPredicateType);
            return None;
        }
        self.bump();
        let right = self.parse_nested_path(open_position)?;
        Some(Predicate::Join { left, right })
    }

    /// Parses one `$...`/`@...` path nested inside a `[... , ...]` join
    /// predicate, sharing this parser's token stream and error list.
    fn parse_nested_path(&mut self, open_position: Position) -> Option<JsonPath> {
        let (token, _) = self.peek();
        let kind = match token {
            Token::Dollar => {
                self.bump();
                PathKind::Absolute
            }
            Token::At => {
                self.bump();
                PathKind::Relative
            }
            _ => {
                self.error(open_position, ParseErrorCode::UnsupportedPredicateType);
                return None;
            }
        };
        let mut steps = vec![Step {
            axis: StepAxis::Root,
            test: NodeTest::None,
            predicate: None,
        }];
        while matches!(self.peek().0, Token::Dot | Token::DotDot) {
            let before = self.errors.len();
            self.parse_step();
            if self.errors.len() != before {
                return None;
            }
            steps.push(self.steps.pop().expect("parse_step pushed a step"));
        }
        Some(JsonPath { kind, steps })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(expr: &str) -> JsonPath {
        parse(expr.as_bytes()).unwrap_or_else(|errs| panic!("parse({expr:?}) failed: {errs:?}"))
    }

    #[test]
    fn root_alone() {
        let path = ok("$");
        assert_eq!(path.steps.len(), 1);
        assert_eq!(path.steps[0].axis, StepAxis::Root);
    }

    #[test]
    fn single_name_steps() {
        let path = ok("$.store.book");
        assert_eq!(path.steps.len(), 3);
        assert_eq!(path.steps[1].test, NodeTest::Name(b"store".to_vec()));
        assert_eq!(path.steps[2].test, NodeTest::Name(b"book".to_vec()));
        assert_eq!(path.steps[1].axis, StepAxis::Single);
    }

    #[test]
    fn recursive_descent_name() {
        let path = ok("$..title");
        assert_eq!(path.steps[1].axis, StepAxis::Recursive);
        assert_eq!(path.steps[1].test, NodeTest::Name(b"title".to_vec()));
    }

    #[test]
    fn recursive_wildcard_defaults_when_bare() {
        let path = ok("$..*");
        assert_eq!(path.steps[1].axis, StepAxis::Recursive);
        assert_eq!(path.steps[1].test, NodeTest::Wildcard);
    }

    #[test]
    fn wildcard_predicate_and_name() {
        let path = ok("$.store.book[*].title");
        assert_eq!(path.steps.len(), 4);
        assert_eq!(path.steps[2].predicate, Some(Predicate::Wildcard));
    }

    #[test]
    fn subscript_predicate() {
        let path = ok("$[1]");
        assert_eq!(
            path.steps[0].predicate,
            Some(Predicate::Subscript { index: 1 })
        );
    }

    #[test]
    fn negative_subscript_predicate() {
        let path = ok("$[-2]");
        assert_eq!(
            path.steps[0].predicate,
            Some(Predicate::Subscript { index: -2 })
        );
    }

    #[test]
    fn slice_predicate_full() {
        let path = ok("$[1:4:2]");
        assert_eq!(
            path.steps[0].predicate,
            Some(Predicate::Slice {
                from: Some(1),
                to: Some(4),
                step: Some(2)
            })
        );
    }

    #[test]
    fn slice_predicate_all_defaults() {
        let path = ok("$[:]");
        assert_eq!(
            path.steps[0].predicate,
            Some(Predicate::Slice {
                from: None,
                to: None,
                step: None
            })
        );
    }

    #[test]
    fn type_test() {
        let path = ok("$.*.string()");
        assert_eq!(path.steps[2].test, NodeTest::Type(TypeTestKind::String));
    }

    #[test]
    fn quoted_name_equals_bare_name() {
        let a = ok("$.a.b[0]");
        let b = ok("$['a']['b'][0]");
        assert_eq!(a, b);
    }

    #[test]
    fn zero_length_expression_reports_code() {
        let errs = parse(b"").unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ParseErrorCode::ZeroLengthExpression);
        assert_eq!(errs[0].position.index, 0);
    }

    #[test]
    fn premature_end_of_input() {
        let errs = parse(b"$.").unwrap_err();
        assert_eq!(errs[0].code, ParseErrorCode::PrematureEndOfInput);
    }

    #[test]
    fn expected_integer() {
        let errs = parse(b"$[abc]").unwrap_err();
        assert_eq!(errs[0].code, ParseErrorCode::ExpectedInteger);
    }

    #[test]
    fn slice_step_is_zero() {
        let errs = parse(b"$[1:2:0]").unwrap_err();
        assert_eq!(errs[0].code, ParseErrorCode::SliceStepIsZero);
    }

    #[test]
    fn unbalanced_predicate_delimiter() {
        let errs = parse(b"$[").unwrap_err();
        assert_eq!(errs[0].code, ParseErrorCode::UnbalancedPredicateDelimiter);
    }

    #[test]
    fn unrecognized_type_keyword_reports_expected_node_type_test() {
        let errs = parse(b"$.foo()").unwrap_err();
        assert_eq!(errs[0].code, ParseErrorCode::ExpectedNodeTypeTest);
    }

    #[test]
    fn join_predicate_parses_but_is_reserved() {
        let path = ok("$[$.a,$.b]");
        assert!(matches!(
            path.steps[0].predicate,
            Some(Predicate::Join { .. })
        ));
    }
}
