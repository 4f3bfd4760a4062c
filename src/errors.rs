use thiserror::Error;

/// Faults raised while evaluating a candidate expression.
///
/// Every variant is recoverable. The engine catches the fault, flashes an
/// error sentinel in the display slot and restores the previous entry, so a
/// failed evaluation never corrupts calculator state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    #[error("nothing to calculate")]
    EmptyExpression,

    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("invalid number '{0}'")]
    BadNumber(String),

    #[error("unknown name '{0}'")]
    UnknownName(String),

    #[error("mismatched parentheses")]
    MismatchedParens,

    #[error("function '{0}' is missing arguments")]
    MissingArguments(&'static str),

    #[error("not enough operands for '{0}'")]
    MissingOperand(char),

    #[error("too many values in expression")]
    DanglingOperand,

    #[error("result is not a finite number")]
    NotFinite,
}

pub type CalcResult<T> = Result<T, CalcError>;
