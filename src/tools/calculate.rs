//! Arithmetic expression evaluator exposed as the `calculate` tool.
//!
//! Supports `+ - * / % **`, unary signs and parentheses. `**` binds tighter
//! than unary minus and is right-associative, so `-2 ** 2` is `-4` and
//! `2 ** 3 ** 2` is `512`.

use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_args, Tool, ToolError};
use crate::constants::CALC_MAX_DEPTH;

pub struct CalculateTool;

#[derive(Deserialize)]
struct CalculateInput {
    expression: String,
}

impl Tool for CalculateTool {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression such as '(2 + 3) * 4 ** 2'."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Arithmetic expression to evaluate"
                }
            },
            "required": ["expression"]
        })
    }

    fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let input: CalculateInput = parse_args(params)?;
        let result = evaluate(&input.expression)
            .map_err(|msg| ToolError::new("CalculationError", msg))?;
        Ok(number_value(result))
    }
}

/// Integral results are reported without a fractional part.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        json!(n as i64)
    } else {
        json!(n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Pow,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' || d == '_' {
                        end = i + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal = input[start..end].replace('_', "");
                let n = literal
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid number '{}'", literal))?;
                tokens.push(Token::Num(n));
            }
            '+' | '-' | '/' | '%' | '(' | ')' => {
                chars.next();
                tokens.push(match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '/' => Token::Slash,
                    '%' => Token::Percent,
                    '(' => Token::LParen,
                    _ => Token::RParen,
                });
            }
            '*' => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '*'))) {
                    chars.next();
                    tokens.push(Token::Pow);
                } else {
                    tokens.push(Token::Star);
                }
            }
            '^' => {
                chars.next();
                tokens.push(Token::Pow);
            }
            other => return Err(format!("Unsupported character '{}'", other)),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.peek();
        self.pos += 1;
        t
    }

    fn expr(&mut self) -> Result<f64, String> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.next();
            let rhs = self.term()?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, String> {
        let mut value = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash | Token::Percent)) = self.peek() {
            self.next();
            let rhs = self.unary()?;
            value = match op {
                Token::Star => value * rhs,
                _ if rhs == 0.0 => return Err("Division by zero".to_string()),
                Token::Slash => value / rhs,
                // Floored modulo: the result takes the sign of the divisor.
                _ => value - rhs * (value / rhs).floor(),
            };
        }
        Ok(value)
    }

    /// Every recursive path (parentheses, signs, exponents) passes through here.
    fn unary(&mut self) -> Result<f64, String> {
        if self.depth >= CALC_MAX_DEPTH {
            return Err(format!(
                "Expression is nested more than {} levels deep",
                CALC_MAX_DEPTH
            ));
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some(Token::Minus) => {
                self.next();
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.next();
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, String> {
        let base = self.primary()?;
        if self.peek() == Some(Token::Pow) {
            self.next();
            let exponent = self.unary()?;
            let value = base.powf(exponent);
            if !value.is_finite() {
                return Err("Result is not a finite number".to_string());
            }
            return Ok(value);
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, String> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err("Missing closing parenthesis".to_string()),
                }
            }
            Some(t) => Err(format!("Unexpected token {:?}", t)),
            None => Err("Unexpected end of expression".to_string()),
        }
    }
}

/// Evaluates `expression`, returning a human-readable message on failure.
pub fn evaluate(expression: &str) -> Result<f64, String> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err("Empty expression".to_string());
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some(t) = parser.peek() {
        return Err(format!("Unexpected token {:?}", t));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("-2 ** 2").unwrap(), -4.0);
        assert_eq!(evaluate("2 ** 3 ** 2").unwrap(), 512.0);
        assert_eq!(evaluate("2 ** -1").unwrap(), 0.5);
    }

    #[test]
    fn test_modulo_follows_divisor_sign() {
        assert_eq!(evaluate("7 % 3").unwrap(), 1.0);
        assert_eq!(evaluate("-7 % 3").unwrap(), 2.0);
    }

    #[test]
    fn test_errors() {
        assert!(evaluate("1 / 0").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("1 +").is_err());
        assert!(evaluate("import os").is_err());
        assert!(evaluate("").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let shallow = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(evaluate(&shallow).unwrap(), 1.0);
        assert_eq!(evaluate(&format!("{}5", "-".repeat(21))).unwrap(), -5.0);

        let deep = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        let err = evaluate(&deep).unwrap_err();
        assert!(err.contains("nested"), "{err}");
        assert!(evaluate(&format!("{}1", "-".repeat(200_000))).is_err());
        assert!(evaluate(&vec!["2"; 100_000].join(" ** ")).is_err());

        let err = CalculateTool
            .execute(json!({"expression": deep}))
            .unwrap_err();
        assert_eq!(err.name, "CalculationError");
    }

    #[test]
    fn test_tool_reports_integers_without_fraction() {
        let value = CalculateTool.execute(json!({"expression": "6 * 7"})).unwrap();
        assert_eq!(value, json!(42));
        let err = CalculateTool.execute(json!({"expression": "1/0"})).unwrap_err();
        assert_eq!(err.name, "CalculationError");
    }
}
