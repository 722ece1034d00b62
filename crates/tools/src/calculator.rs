//! Calculator tool: evaluates arithmetic expressions.
//!
//! Supports `+`, `-`, `*`, `/`, parentheses, unary negation and decimals,
//! via a small recursive-descent parser.

use async_trait::async_trait;
use incant_core::error::ToolError;
use incant_core::tool::Tool;
use serde_json::{Map, Value, json};

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate a mathematical expression. Supports +, -, *, /, parentheses, and decimal numbers."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "The mathematical expression to evaluate, e.g. '(2 + 3) * 4'"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let expr = arguments
            .get("expression")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'expression' argument".into()))?;

        let value = evaluate(expr).map_err(|reason| ToolError::ExecutionFailed {
            tool_name: self.name().to_string(),
            reason,
        })?;

        // Whole results come back as integers so "2 * 3" reads as 6, not 6.0.
        if value.fract() == 0.0 && value.abs() < 1e15 {
            Ok(json!(value as i64))
        } else {
            Ok(json!(value))
        }
    }
}

/// Evaluate an arithmetic expression.
pub fn evaluate(expr: &str) -> Result<f64, String> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    match parser.peek() {
        None => Ok(value),
        Some(tok) => Err(format!("Unexpected token at position {}: {tok:?}", parser.pos)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        let tok = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if !(d.is_ascii_digit() || d == '.') {
                        break;
                    }
                    end = i + d.len_utf8();
                    chars.next();
                }
                let literal = &input[start..end];
                let n = literal
                    .parse()
                    .map_err(|_| format!("Invalid number: {literal}"))?;
                tokens.push(Token::Number(n));
                continue;
            }
            other => return Err(format!("Unexpected character: '{other}'")),
        };
        tokens.push(tok);
        chars.next();
    }

    Ok(tokens)
}

/// Deepest nesting of parentheses and unary minus the parser accepts.
const MAX_DEPTH: usize = 256;

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, String>) -> Result<T, String> {
        if self.depth >= MAX_DEPTH {
            return Err("Expression nested too deeply".into());
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // expr = term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, String> {
        let mut acc = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.next();
                    acc += self.term()?;
                }
                Some(Token::Minus) => {
                    self.next();
                    acc -= self.term()?;
                }
                _ => return Ok(acc),
            }
        }
    }

    // term = unary (('*' | '/') unary)*
    fn term(&mut self) -> Result<f64, String> {
        let mut acc = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.next();
                    acc *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.next();
                    let divisor = self.unary()?;
                    if divisor == 0.0 {
                        return Err("Division by zero".into());
                    }
                    acc /= divisor;
                }
                _ => return Ok(acc),
            }
        }
    }

    // unary = '-' unary | primary
    fn unary(&mut self) -> Result<f64, String> {
        if self.peek() == Some(Token::Minus) {
            self.next();
            return Ok(-self.nested(Self::unary)?);
        }
        self.primary()
    }

    // primary = NUMBER | '(' expr ')'
    fn primary(&mut self) -> Result<f64, String> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                let inner = self.nested(Self::expr)?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err("Expected closing parenthesis".into()),
                }
            }
            Some(tok) => Err(format!("Unexpected token: {tok:?}")),
            None => Err("Unexpected end of expression".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(expression: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("expression".into(), json!(expression));
        map
    }

    #[test]
    fn precedence_and_parentheses() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("((1 + 2) * (3 + 4))").unwrap(), 21.0);
    }

    #[test]
    fn division_and_decimals() {
        assert_eq!(evaluate("10 / 4").unwrap(), 2.5);
        assert_eq!(evaluate("3.14 * 2").unwrap(), 6.28);
        assert!(evaluate("1 / 0").is_err());
    }

    #[test]
    fn unary_negation() {
        assert_eq!(evaluate("-5 + 3").unwrap(), -2.0);
        assert_eq!(evaluate("--2").unwrap(), 2.0);
    }

    #[test]
    fn complex_expression() {
        let result = evaluate("(10 + 5) / 3 - 2 * (1 + 1)").unwrap();
        assert!((result - 1.0).abs() < 1e-10);
    }

    #[test]
    fn malformed_expressions() {
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("1 2").is_err());
        assert!(evaluate("2 ^ 3").is_err());
        assert!(evaluate("1..2").is_err());
    }

    #[test]
    fn nesting_depth_is_bounded() {
        let shallow = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(evaluate(&shallow).unwrap(), 1.0);

        let deep = format!("{}1{}", "(".repeat(20_000), ")".repeat(20_000));
        assert_eq!(evaluate(&deep).unwrap_err(), "Expression nested too deeply");

        let negations = format!("{}1", "-".repeat(20_000));
        assert_eq!(evaluate(&negations).unwrap_err(), "Expression nested too deeply");
    }

    #[tokio::test]
    async fn deeply_nested_input_fails_the_tool() {
        let deep = format!("{}2{}", "(".repeat(5_000), ")".repeat(5_000));
        let err = CalculatorTool.execute(args(&deep)).await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }

    #[tokio::test]
    async fn whole_results_are_integers() {
        let out = CalculatorTool.execute(args("2 * 3")).await.unwrap();
        assert_eq!(out, json!(6));
        assert!(out.is_i64());
    }

    #[tokio::test]
    async fn fractional_results_are_floats() {
        let out = CalculatorTool.execute(args("10 / 4")).await.unwrap();
        assert_eq!(out, json!(2.5));
    }

    #[tokio::test]
    async fn evaluation_errors_fail_the_tool() {
        let err = CalculatorTool.execute(args("1 / 0")).await.unwrap_err();
        match err {
            ToolError::ExecutionFailed { tool_name, reason } => {
                assert_eq!(tool_name, "calculator");
                assert_eq!(reason, "Division by zero");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_expression_is_invalid() {
        let err = CalculatorTool.execute(Map::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
