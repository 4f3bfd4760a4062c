//! Shunting-yard evaluation over the token stream.
//!
//! The original widget handed the normalized expression string to the host
//! runtime's generic evaluator. Here the candidate string is tokenized by
//! [`crate::lexer`] and evaluated directly with an output queue and an
//! operator stack: standard precedence, right-associative `^`, unary
//! negation, prefix functions and a comma separator for `pow(x, y)`.

use std::f64::consts::{E, PI};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::errors::{CalcError, CalcResult};
use crate::lexer::Token;

/// Operator symbol used internally for unary negation.
pub const UNARY_MINUS: char = 'n';

/// Angle unit applied by the trigonometric functions.
///
/// Forward trig converts its input from this unit to radians; inverse trig
/// converts its radian result back to this unit.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    #[default]
    Degrees,
    Radians,
}

impl AngleUnit {
    pub fn toggled(self) -> Self {
        match self {
            AngleUnit::Degrees => AngleUnit::Radians,
            AngleUnit::Radians => AngleUnit::Degrees,
        }
    }

    fn to_radians(self, x: f64) -> f64 {
        match self {
            AngleUnit::Degrees => x * PI / 180.0,
            AngleUnit::Radians => x,
        }
    }

    fn from_radians(self, x: f64) -> f64 {
        match self {
            AngleUnit::Degrees => x * 180.0 / PI,
            AngleUnit::Radians => x,
        }
    }
}

/// Named constants the evaluator resolves by identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Constant {
    Pi,
    E,
}

impl Constant {
    pub fn value(self) -> f64 {
        match self {
            Constant::Pi => PI,
            Constant::E => E,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "pi" => Some(Constant::Pi),
            "e" => Some(Constant::E),
            _ => None,
        }
    }
}

/// The function table available inside expressions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Log,
    Ln,
    Sqrt,
    Abs,
    Fact,
    Pow,
}

impl Function {
    pub fn name(self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
            Function::Log => "log",
            Function::Ln => "ln",
            Function::Sqrt => "sqrt",
            Function::Abs => "abs",
            Function::Fact => "fact",
            Function::Pow => "pow",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "sin" => Some(Function::Sin),
            "cos" => Some(Function::Cos),
            "tan" => Some(Function::Tan),
            "asin" => Some(Function::Asin),
            "acos" => Some(Function::Acos),
            "atan" => Some(Function::Atan),
            "log" => Some(Function::Log),
            "ln" => Some(Function::Ln),
            "sqrt" => Some(Function::Sqrt),
            "abs" => Some(Function::Abs),
            "fact" => Some(Function::Fact),
            "pow" => Some(Function::Pow),
            _ => None,
        }
    }

    /// Inverse counterpart for the trig keys; identity for everything else.
    pub fn inverse(self) -> Self {
        match self {
            Function::Sin => Function::Asin,
            Function::Cos => Function::Acos,
            Function::Tan => Function::Atan,
            other => other,
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Function::Pow => 2,
            _ => 1,
        }
    }

    fn apply(self, args: &[f64], angle_unit: AngleUnit) -> f64 {
        match self {
            Function::Sin => angle_unit.to_radians(args[0]).sin(),
            Function::Cos => angle_unit.to_radians(args[0]).cos(),
            Function::Tan => angle_unit.to_radians(args[0]).tan(),
            Function::Asin => angle_unit.from_radians(args[0].asin()),
            Function::Acos => angle_unit.from_radians(args[0].acos()),
            Function::Atan => angle_unit.from_radians(args[0].atan()),
            Function::Log => args[0].log10(),
            Function::Ln => args[0].ln(),
            Function::Sqrt => args[0].sqrt(),
            Function::Abs => args[0].abs(),
            Function::Fact => factorial(args[0]),
            Function::Pow => args[0].powf(args[1]),
        }
    }
}

/// Integer factorial over f64.
///
/// Defined for non-negative integral `n` up to 170 (171! overflows f64).
/// Negative or fractional input yields NaN, larger input +infinity; either
/// way the result fails the engine's finite check.
pub fn factorial(n: f64) -> f64 {
    if n < 0.0 || n.fract() != 0.0 {
        return f64::NAN;
    }
    if n > 170.0 {
        return f64::INFINITY;
    }
    let mut product = 1.0;
    let mut i = 2.0;
    while i <= n {
        product *= i;
        i += 1.0;
    }
    product
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Debug)]
enum Precedence {
    Lowest,
    Addition,
    Multiplication,
    Exponentiation,
    UnaryNegation,
}

fn precedence(op: char) -> Precedence {
    match op {
        '+' | '-' => Precedence::Addition,
        '*' | '/' | '%' => Precedence::Multiplication,
        '^' => Precedence::Exponentiation,
        UNARY_MINUS => Precedence::UnaryNegation,
        _ => Precedence::Lowest,
    }
}

fn right_associative(op: char) -> bool {
    op == '^' || op == UNARY_MINUS
}

#[derive(Debug)]
enum StackEntry {
    Op(char),
    Func(Function),
    LParen,
}

/// Evaluates a token stream to a number.
///
/// Faults on structural problems (mismatched parentheses, missing operands);
/// numeric domain problems surface as NaN/infinity and are left for the
/// caller's finite check, matching the original widget.
pub fn evaluate(tokens: &[Token], angle_unit: AngleUnit) -> CalcResult<f64> {
    let mut output: Vec<f64> = Vec::new();
    let mut stack: Vec<StackEntry> = Vec::new();

    for token in tokens {
        trace!(?token, "eval token");
        match token {
            Token::Number(v) => output.push(*v),
            Token::Func(f) => stack.push(StackEntry::Func(*f)),
            Token::LParen => stack.push(StackEntry::LParen),
            Token::RParen => {
                loop {
                    match stack.pop() {
                        Some(StackEntry::LParen) => break,
                        Some(StackEntry::Op(op)) => apply_operator(&mut output, op)?,
                        Some(StackEntry::Func(f)) => apply_function(&mut output, f, angle_unit)?,
                        None => return Err(CalcError::MismatchedParens),
                    }
                }
                // a call like sin(...) leaves the function just below its paren
                if matches!(stack.last(), Some(StackEntry::Func(_))) {
                    if let Some(StackEntry::Func(f)) = stack.pop() {
                        apply_function(&mut output, f, angle_unit)?;
                    }
                }
            }
            Token::Comma => loop {
                if matches!(stack.last(), Some(StackEntry::LParen)) {
                    break;
                }
                match stack.pop() {
                    Some(StackEntry::Op(op)) => apply_operator(&mut output, op)?,
                    Some(StackEntry::Func(f)) => apply_function(&mut output, f, angle_unit)?,
                    Some(StackEntry::LParen) => unreachable!(),
                    None => return Err(CalcError::MismatchedParens),
                }
            },
            Token::Op(op) => {
                while let Some(top) = stack.last() {
                    let pop = match top {
                        StackEntry::LParen => false,
                        StackEntry::Func(_) => true,
                        StackEntry::Op(t) => {
                            precedence(*t) > precedence(*op)
                                || (precedence(*t) == precedence(*op) && !right_associative(*op))
                        }
                    };
                    if !pop {
                        break;
                    }
                    match stack.pop() {
                        Some(StackEntry::Op(t)) => apply_operator(&mut output, t)?,
                        Some(StackEntry::Func(f)) => apply_function(&mut output, f, angle_unit)?,
                        _ => unreachable!(),
                    }
                }
                stack.push(StackEntry::Op(*op));
            }
        }
    }

    while let Some(entry) = stack.pop() {
        match entry {
            StackEntry::LParen => return Err(CalcError::MismatchedParens),
            StackEntry::Op(op) => apply_operator(&mut output, op)?,
            StackEntry::Func(f) => apply_function(&mut output, f, angle_unit)?,
        }
    }

    match output.len() {
        1 => Ok(output[0]),
        0 => Err(CalcError::EmptyExpression),
        _ => Err(CalcError::DanglingOperand),
    }
}

fn apply_operator(output: &mut Vec<f64>, op: char) -> CalcResult<()> {
    if op == UNARY_MINUS {
        let operand = output.pop().ok_or(CalcError::MissingOperand('-'))?;
        output.push(-operand);
        return Ok(());
    }
    let (Some(b), Some(a)) = (output.pop(), output.pop()) else {
        return Err(CalcError::MissingOperand(op));
    };
    let result = match op {
        '+' => a + b,
        '-' => a - b,
        '*' => a * b,
        '/' => a / b,
        // remainder keeps the sign of the dividend, as the original
        '%' => a % b,
        '^' => a.powf(b),
        _ => return Err(CalcError::UnexpectedChar(op)),
    };
    trace!(%op, a, b, result, "applied operator");
    output.push(result);
    Ok(())
}

fn apply_function(output: &mut Vec<f64>, f: Function, angle_unit: AngleUnit) -> CalcResult<()> {
    let arity = f.arity();
    if output.len() < arity {
        return Err(CalcError::MissingArguments(f.name()));
    }
    let split = output.len() - arity;
    let args: Vec<f64> = output.split_off(split);
    let result = f.apply(&args, angle_unit);
    trace!(func = f.name(), ?args, result, "applied function");
    output.push(result);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn eval_str(expr: &str, unit: AngleUnit) -> CalcResult<f64> {
        evaluate(&tokenize(expr)?, unit)
    }

    fn eval_rad(expr: &str) -> f64 {
        eval_str(expr, AngleUnit::Radians).unwrap()
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(eval_rad("2+3"), 5.0);
        assert_eq!(eval_rad("2+3*4"), 14.0);
        assert_eq!(eval_rad("(2+3)*4"), 20.0);
        assert_eq!(eval_rad("10/4"), 2.5);
        assert_eq!(eval_rad("17%5"), 2.0);
        assert_eq!(eval_rad("0-5"), -5.0);
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(eval_rad("2^10"), 1024.0);
        assert_eq!(eval_rad("2^3^2"), 512.0);
        assert_eq!(eval_rad("2*3^2"), 18.0);
    }

    #[test]
    fn implicit_multiplication() {
        assert_eq!(eval_rad("2(3+4)"), 14.0);
        assert_eq!(eval_rad("(3+4)2"), 14.0);
        assert_eq!(eval_rad("(1+2)(3+4)"), 21.0);
    }

    #[test]
    fn unary_minus() {
        assert_eq!(eval_rad("sqrt(0-0)+(-3)"), -3.0);
        assert_eq!(eval_rad("2*(-3)"), -6.0);
        assert_eq!(eval_rad("abs(-4)"), 4.0);
    }

    #[test]
    fn trig_respects_angle_unit() {
        let deg = eval_str("sin(90)", AngleUnit::Degrees).unwrap();
        assert!((deg - 1.0).abs() < 1e-10);
        let rad = eval_str("sin(90)", AngleUnit::Radians).unwrap();
        assert!((rad - 90.0f64.sin()).abs() < 1e-10);
    }

    #[test]
    fn inverse_trig_converts_result() {
        let deg = eval_str("asin(1)", AngleUnit::Degrees).unwrap();
        assert!((deg - 90.0).abs() < 1e-10);
        let rad = eval_str("asin(1)", AngleUnit::Radians).unwrap();
        assert!((rad - std::f64::consts::FRAC_PI_2).abs() < 1e-10);
    }

    #[test]
    fn named_functions_and_constants() {
        assert!((eval_rad("log(100)") - 2.0).abs() < 1e-10);
        assert!((eval_rad("ln(E)") - 1.0).abs() < 1e-10);
        assert_eq!(eval_rad("sqrt(16)"), 4.0);
        assert!((eval_rad("cos(PI)") + 1.0).abs() < 1e-10);
        assert_eq!(eval_rad("pow(2,10)"), 1024.0);
        assert_eq!(eval_rad("pow(1+1,3)"), 8.0);
    }

    #[test]
    fn factorial_domain() {
        assert_eq!(factorial(5.0), 120.0);
        assert_eq!(factorial(0.0), 1.0);
        assert_eq!(factorial(1.0), 1.0);
        assert!(factorial(-1.0).is_nan());
        assert!(factorial(2.5).is_nan());
        assert!(factorial(171.0).is_infinite());
        assert_eq!(eval_rad("fact(5)"), 120.0);
    }

    #[test]
    fn domain_errors_surface_as_non_finite() {
        assert!(eval_rad("5/0").is_infinite());
        assert!(eval_rad("sqrt(0-1)").is_nan());
        assert!(eval_rad("fact(0-1)").is_nan());
    }

    #[test]
    fn structural_faults() {
        assert_eq!(
            eval_str(")(", AngleUnit::Radians),
            Err(CalcError::MismatchedParens)
        );
        assert_eq!(
            eval_str("(1+2", AngleUnit::Radians),
            Err(CalcError::MismatchedParens)
        );
        assert_eq!(eval_str("", AngleUnit::Radians), Err(CalcError::EmptyExpression));
        assert_eq!(
            eval_str("1+", AngleUnit::Radians),
            Err(CalcError::MissingOperand('+'))
        );
    }
}
