//! Recursive-descent parser for XPath 1.0 expressions.
//!
//! Precedence, lowest first: `or`, `and`, equality, relational, additive,
//! multiplicative, unary minus, union, path.

use crate::ast::{Axis, BinaryOp, Expr, LocationPath, NameTest, NodeTest, Step};
use crate::error::{Result, XPathError};
use crate::lexer::{Spanned, Token, tokenize};

/// Parse an expression into an [`Expr`].
///
/// Empty input and trailing tokens are syntax errors.
pub fn parse(input: &str) -> Result<Expr> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        input,
        tokens,
        pos: 0,
    };
    if parser.tokens.is_empty() {
        return Err(XPathError::syntax("empty expression", 0, input));
    }
    let expr = parser.parse_or_expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.error(format!("unexpected {}", parser.describe_current())));
    }
    Ok(expr)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(format!(
                "expected '{}', found {}",
                token,
                self.describe_current()
            )))
        }
    }

    /// The current token as written in the expression.
    fn describe_current(&self) -> String {
        self.tokens.get(self.pos).map_or_else(
            || "end of expression".to_string(),
            |s| format!("'{}'", &self.input[s.position..s.end]),
        )
    }

    fn error(&self, message: impl Into<String>) -> XPathError {
        let position = self
            .tokens
            .get(self.pos)
            .map_or(self.input.len(), |s| s.position);
        XPathError::syntax(message, position, self.input)
    }

    fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn parse_or_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_and_expr()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and_expr()?;
            left = Self::binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_equality_expr()?;
        while self.eat(&Token::And) {
            let right = self.parse_equality_expr()?;
            left = Self::binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_relational_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Equal) => BinaryOp::Eq,
                Some(Token::NotEqual) => BinaryOp::Neq,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_relational_expr()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_relational_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_additive_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::LessThan) => BinaryOp::Lt,
                Some(Token::LessThanEqual) => BinaryOp::Lte,
                Some(Token::GreaterThan) => BinaryOp::Gt,
                Some(Token::GreaterThanEqual) => BinaryOp::Gte,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_additive_expr()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_multiplicative_expr()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary_expr()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Div) => BinaryOp::Div,
                Some(Token::Mod) => BinaryOp::Mod,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_unary_expr()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr> {
        if self.eat(&Token::Minus) {
            let inner = self.parse_unary_expr()?;
            Ok(Expr::Negate(Box::new(inner)))
        } else {
            self.parse_union_expr()
        }
    }

    fn parse_union_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_path_expr()?;
        while self.eat(&Token::Pipe) {
            let right = self.parse_path_expr()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// A location path, or a filter expression optionally followed by steps.
    fn parse_path_expr(&mut self) -> Result<Expr> {
        match self.peek() {
            Some(
                Token::Slash
                | Token::DoubleSlash
                | Token::Dot
                | Token::DotDot
                | Token::At
                | Token::AxisName(_)
                | Token::NodeType(_)
                | Token::Name(_),
            ) => self.parse_location_path().map(Expr::Path),

            Some(
                Token::VariableReference(_)
                | Token::Literal(_)
                | Token::Number(_)
                | Token::LeftParen
                | Token::FunctionName(_),
            ) => {
                let filter = self.parse_filter_expr()?;
                let mut steps = Vec::new();
                if self.eat(&Token::DoubleSlash) {
                    steps.push(Step::descendant_or_self());
                } else if !self.eat(&Token::Slash) {
                    return Ok(filter);
                }
                self.parse_relative_location_path_into(&mut steps)?;
                Ok(Expr::PathFrom {
                    base: Box::new(filter),
                    steps,
                })
            }

            _ => Err(self.error(format!(
                "expected expression, found {}",
                self.describe_current()
            ))),
        }
    }

    fn parse_filter_expr(&mut self) -> Result<Expr> {
        let primary = self.parse_primary_expr()?;
        let predicates = self.parse_predicates()?;
        if predicates.is_empty() {
            Ok(primary)
        } else {
            Ok(Expr::Filter {
                primary: Box::new(primary),
                predicates,
            })
        }
    }

    fn parse_primary_expr(&mut self) -> Result<Expr> {
        match self.peek().cloned() {
            Some(Token::VariableReference(name)) => {
                self.pos += 1;
                Ok(Expr::Variable(name))
            }
            Some(Token::Literal(value)) => {
                self.pos += 1;
                Ok(Expr::Literal(value))
            }
            Some(Token::Number(value)) => {
                self.pos += 1;
                Ok(Expr::Number(value))
            }
            Some(Token::LeftParen) => {
                self.pos += 1;
                let expr = self.parse_or_expr()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }
            Some(Token::FunctionName(name)) => {
                self.pos += 1;
                self.parse_function_args(name)
            }
            _ => Err(self.error(format!(
                "expected primary expression, found {}",
                self.describe_current()
            ))),
        }
    }

    fn parse_function_args(&mut self, name: String) -> Result<Expr> {
        self.expect(&Token::LeftParen)?;
        let mut args = Vec::new();
        if !self.check(&Token::RightParen) {
            args.push(self.parse_or_expr()?);
            while self.eat(&Token::Comma) {
                args.push(self.parse_or_expr()?);
            }
        }
        self.expect(&Token::RightParen)?;
        Ok(Expr::FunctionCall { name, args })
    }

    fn parse_location_path(&mut self) -> Result<LocationPath> {
        let mut steps = Vec::new();
        if self.eat(&Token::Slash) {
            // A lone `/` selects the document node.
            if self.is_step_start() {
                self.parse_relative_location_path_into(&mut steps)?;
            }
            return Ok(LocationPath {
                absolute: true,
                steps,
            });
        }
        if self.eat(&Token::DoubleSlash) {
            steps.push(Step::descendant_or_self());
            self.parse_relative_location_path_into(&mut steps)?;
            return Ok(LocationPath {
                absolute: true,
                steps,
            });
        }
        self.parse_relative_location_path_into(&mut steps)?;
        Ok(LocationPath {
            absolute: false,
            steps,
        })
    }

    fn parse_relative_location_path_into(&mut self, steps: &mut Vec<Step>) -> Result<()> {
        steps.push(self.parse_step()?);
        loop {
            if self.eat(&Token::DoubleSlash) {
                steps.push(Step::descendant_or_self());
                steps.push(self.parse_step()?);
            } else if self.eat(&Token::Slash) {
                steps.push(self.parse_step()?);
            } else {
                return Ok(());
            }
        }
    }

    fn is_step_start(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Token::Dot
                    | Token::DotDot
                    | Token::At
                    | Token::Name(_)
                    | Token::NodeType(_)
                    | Token::AxisName(_)
            )
        )
    }

    fn parse_step(&mut self) -> Result<Step> {
        if self.eat(&Token::Dot) {
            return Ok(Step::new(Axis::SelfAxis, NodeTest::Node));
        }
        if self.eat(&Token::DotDot) {
            return Ok(Step::new(Axis::Parent, NodeTest::Node));
        }

        let axis = self.parse_axis_specifier()?;
        let test = self.parse_node_test()?;
        let predicates = self.parse_predicates()?;
        Ok(Step {
            axis,
            test,
            predicates,
        })
    }

    fn parse_axis_specifier(&mut self) -> Result<Axis> {
        if self.eat(&Token::At) {
            return Ok(Axis::Attribute);
        }
        if let Some(Token::AxisName(name)) = self.peek().cloned() {
            let Some(axis) = Axis::from_name(&name) else {
                return Err(self.error(format!("unknown axis '{}'", name)));
            };
            self.pos += 1;
            self.expect(&Token::ColonColon)?;
            return Ok(axis);
        }
        Ok(Axis::Child)
    }

    fn parse_node_test(&mut self) -> Result<NodeTest> {
        match self.peek().cloned() {
            Some(Token::NodeType(kind)) => {
                self.pos += 1;
                self.expect(&Token::LeftParen)?;
                let test = match kind.as_str() {
                    "node" => NodeTest::Node,
                    "text" => NodeTest::Text,
                    "comment" => NodeTest::Comment,
                    _ => match self.peek().cloned() {
                        Some(Token::Literal(target)) => {
                            self.pos += 1;
                            NodeTest::ProcessingInstruction(Some(target))
                        }
                        _ => NodeTest::ProcessingInstruction(None),
                    },
                };
                self.expect(&Token::RightParen)?;
                Ok(test)
            }
            Some(Token::Name(name)) => {
                self.pos += 1;
                if name == "*" {
                    Ok(NodeTest::Any)
                } else if let Some(prefix) = name.strip_suffix(":*") {
                    Ok(NodeTest::NamespaceWildcard {
                        prefix: prefix.to_string(),
                        namespace: None,
                    })
                } else {
                    Ok(NodeTest::Name(NameTest::parse(&name)))
                }
            }
            _ => Err(self.error(format!(
                "expected node test, found {}",
                self.describe_current()
            ))),
        }
    }

    fn parse_predicates(&mut self) -> Result<Vec<Expr>> {
        let mut predicates = Vec::new();
        while self.eat(&Token::LeftBracket) {
            predicates.push(self.parse_or_expr()?);
            self.expect(&Token::RightBracket)?;
        }
        Ok(predicates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_step(axis: Axis, name: &str) -> Step {
        Step::new(axis, NodeTest::Name(NameTest::parse(name)))
    }

    #[test]
    fn test_absolute_descendant_path() {
        let expr = parse("//dependency/version").unwrap();
        assert_eq!(
            expr,
            Expr::Path(LocationPath {
                absolute: true,
                steps: vec![
                    Step::descendant_or_self(),
                    name_step(Axis::Child, "dependency"),
                    name_step(Axis::Child, "version"),
                ],
            })
        );
    }

    #[test]
    fn test_lone_slash_is_root() {
        assert_eq!(
            parse("/").unwrap(),
            Expr::Path(LocationPath {
                absolute: true,
                steps: vec![],
            })
        );
    }

    #[test]
    fn test_attribute_predicate() {
        let Expr::Path(path) = parse("//ui:define[@name='title']").unwrap() else {
            panic!("expected a path");
        };
        let step = &path.steps[1];
        assert_eq!(step.test, NodeTest::Name(NameTest::parse("ui:define")));
        assert_eq!(
            step.predicates,
            vec![Expr::Binary {
                op: BinaryOp::Eq,
                left: Box::new(Expr::Path(LocationPath {
                    absolute: false,
                    steps: vec![name_step(Axis::Attribute, "name")],
                })),
                right: Box::new(Expr::Literal("title".to_string())),
            }]
        );
    }

    #[test]
    fn test_precedence() {
        let expr = parse("1 + 2 * 3 = 7 or false()").unwrap();
        let Expr::Binary { op, left, .. } = expr else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Or);
        let Expr::Binary { op, left, .. } = *left else {
            panic!("expected equality");
        };
        assert_eq!(op, BinaryOp::Eq);
        let Expr::Binary { op, right, .. } = *left else {
            panic!("expected addition");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_explicit_axes_and_node_types() {
        let Expr::Path(path) =
            parse("ancestor-or-self::node()/preceding-sibling::comment()/processing-instruction('pi')")
                .unwrap()
        else {
            panic!("expected a path");
        };
        assert_eq!(path.steps[0], Step::new(Axis::AncestorOrSelf, NodeTest::Node));
        assert_eq!(path.steps[1], Step::new(Axis::PrecedingSibling, NodeTest::Comment));
        assert_eq!(
            path.steps[2].test,
            NodeTest::ProcessingInstruction(Some("pi".to_string()))
        );
    }

    #[test]
    fn test_filter_expression_with_steps() {
        let expr = parse("(//a)[1]//b").unwrap();
        let Expr::PathFrom { base, steps } = expr else {
            panic!("expected a filtered path");
        };
        assert!(matches!(*base, Expr::Filter { .. }));
        assert_eq!(steps[0], Step::descendant_or_self());
        assert_eq!(steps[1], name_step(Axis::Child, "b"));
    }

    #[test]
    fn test_function_calls_and_unions() {
        let expr = parse("count(//a | //b) > 1").unwrap();
        let Expr::Binary { left, .. } = expr else {
            panic!("expected comparison");
        };
        let Expr::FunctionCall { name, args } = *left else {
            panic!("expected call");
        };
        assert_eq!(name, "count");
        assert!(matches!(args[0], Expr::Union(..)));
    }

    #[test]
    fn test_namespace_wildcard() {
        let Expr::Path(path) = parse("xs:*").unwrap() else {
            panic!("expected a path");
        };
        assert_eq!(
            path.steps[0].test,
            NodeTest::NamespaceWildcard {
                prefix: "xs".to_string(),
                namespace: None
            }
        );
    }

    #[test]
    fn test_syntax_errors_carry_positions() {
        let cases = [("", 0), ("//a[", 4), ("//a]", 3), ("a b", 2), ("foo::bar", 0), ("//", 2)];
        for (input, expected) in cases {
            match parse(input) {
                Err(XPathError::Syntax { position, .. }) => {
                    assert_eq!(position, expected, "position for {:?}", input)
                }
                other => panic!("expected syntax error for {:?}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_syntax_errors_quote_source_text() {
        for (input, quoted) in [("1..2", "'.2'"), ("1 1.50", "'1.50'"), ("//a ]", "']'")] {
            let err = parse(input).unwrap_err();
            assert!(err.to_string().contains(quoted), "{:?}: {}", input, err);
        }
    }
}
