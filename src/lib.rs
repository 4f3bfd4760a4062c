//! # Keypad scientific calculator engine
//!
//! The engine turns a sequence of discrete key presses into a well-formed
//! arithmetic expression, evaluates it and hands back a render snapshot.
//! It is deliberately split from presentation: the front end translates
//! events into engine calls and draws whatever the snapshot says, never the
//! other way around.
//!
//! Entry normalization is permissive rather than rejecting:
//! * two operators in a row keep the second one (last operator wins)
//! * a leading operator is seeded with `0`
//! * implicit multiplication appears wherever two values abut, so
//!   `2(3+4)`, `(3+4)2` and `2sin(30)` all evaluate as products
//!
//! Supported functions: `sin`, `cos`, `tan` and their inverses (angle-unit
//! aware, degrees or radians), `log` (base 10), `ln`, `sqrt`, `abs`,
//! `fact`, and two-argument `pow`. Constants `PI` and `E` are available by
//! name and as keypad insertions.
//!
//! Evaluation is a tokenizer plus shunting-yard run over `f64` with standard
//! precedence and right-associative `^`. Anything that does not come out as
//! a finite number — division by zero, `sqrt` of a negative, a factorial
//! outside its domain, malformed parentheses — is one recoverable fault: the
//! display flashes an error and reverts, and the session continues.

pub mod config;
pub mod engine;
pub mod errors;
pub mod eval;
pub mod format;
pub mod lexer;

pub use engine::{Engine, Op, Snapshot, ERROR_FLASH, ERROR_SENTINEL};
pub use errors::{CalcError, CalcResult};
pub use eval::{AngleUnit, Constant, Function};
