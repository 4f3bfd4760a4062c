//! The calculator state machine.
//!
//! One [`Engine`] value holds everything a keypad session needs: the number
//! being typed, the committed expression text, the last answer, the angle
//! unit and the inverse-trig modifier. Every user action is one method; each
//! mutates the state and returns a [`Snapshot`] for the front end to render.
//! The engine never touches presentation, and no operation here can fail —
//! input is accepted and normalized, and all correctness checking happens at
//! [`Engine::evaluate`] time.

use std::mem;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::errors::{CalcError, CalcResult};
use crate::eval::{self, AngleUnit, Constant, Function};
use crate::format::format_result;
use crate::lexer;

/// Display value shown while an evaluation fault is flashed.
pub const ERROR_SENTINEL: &str = "Error";

/// How long the error sentinel stays up before the previous entry returns.
pub const ERROR_FLASH: Duration = Duration::from_millis(1500);

const OPERATOR_CHARS: &[char] = &['+', '-', '*', '/', '%', '^'];

/// Binary operators the keypad can commit into the expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl Op {
    pub fn symbol(self) -> char {
        match self {
            Op::Add => '+',
            Op::Sub => '-',
            Op::Mul => '*',
            Op::Div => '/',
            Op::Rem => '%',
            Op::Pow => '^',
        }
    }

    /// Maps a typed character, accepting the display glyphs too.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Op::Add),
            '-' | '−' => Some(Op::Sub),
            '*' | '×' => Some(Op::Mul),
            '/' | '÷' => Some(Op::Div),
            '%' => Some(Op::Rem),
            '^' => Some(Op::Pow),
            _ => None,
        }
    }
}

/// What the front end renders after each operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    /// The in-progress number, or `"0"` when nothing is pending.
    pub display_value: String,
    /// The committed expression text.
    pub expression_text: String,
    /// The last evaluated expression, e.g. `"2+3 ="`.
    pub history_text: String,
}

/// Pending restore of the display after an evaluation fault.
///
/// Any newer operation supersedes it; only [`Engine::tick`] lets it fire.
#[derive(Debug)]
struct ErrorFlash {
    saved: String,
    since: Instant,
}

#[derive(Debug)]
pub struct Engine {
    current_token: String,
    expression: String,
    awaiting_new_entry: bool,
    last_answer: String,
    angle_unit: AngleUnit,
    inverse_trig: bool,
    history: String,
    flash: Option<ErrorFlash>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine {
            current_token: String::new(),
            expression: String::new(),
            awaiting_new_entry: false,
            last_answer: "0".to_string(),
            angle_unit: AngleUnit::default(),
            inverse_trig: false,
            history: String::new(),
            flash: None,
        }
    }
}

impl Engine {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            display_value: if self.current_token.is_empty() {
                "0".to_string()
            } else {
                self.current_token.clone()
            },
            expression_text: self.expression.clone(),
            history_text: self.history.clone(),
        }
    }

    pub fn angle_unit(&self) -> AngleUnit {
        self.angle_unit
    }

    pub fn inverse_trig(&self) -> bool {
        self.inverse_trig
    }

    pub fn last_answer(&self) -> &str {
        &self.last_answer
    }

    /// True while the error sentinel is on display.
    pub fn flashing_error(&self) -> bool {
        self.flash.is_some()
    }

    /// Appends a digit or the decimal point to the in-progress token.
    ///
    /// After a produced value the token starts fresh. The single-decimal
    /// invariant is enforced here: a second `.` is ignored and a leading `.`
    /// becomes `0.`. Characters outside `0-9.` are ignored.
    pub fn append_digit(&mut self, c: char) -> Snapshot {
        self.supersede_flash();
        if !c.is_ascii_digit() && c != '.' {
            return self.snapshot();
        }
        if self.awaiting_new_entry {
            self.current_token.clear();
            self.awaiting_new_entry = false;
        }
        if c == '.' {
            if self.current_token.contains('.') {
                return self.snapshot();
            }
            if self.current_token.is_empty() {
                self.current_token.push('0');
            }
        }
        self.current_token.push(c);
        self.snapshot()
    }

    /// Commits the pending token (if any) followed by a binary operator.
    ///
    /// A leading operator seeds the expression with `0`; two operators in a
    /// row replace rather than stack (last one wins).
    pub fn append_operator(&mut self, op: Op) -> Snapshot {
        self.supersede_flash();
        self.awaiting_new_entry = false;
        if !self.current_token.is_empty() {
            self.expression.push_str(&self.current_token);
            self.expression.push(op.symbol());
            self.current_token.clear();
        } else if self.expression.is_empty() {
            self.expression.push('0');
            self.expression.push(op.symbol());
        } else if self.expression.ends_with(OPERATOR_CHARS) {
            self.expression.pop();
            self.expression.push(op.symbol());
        } else {
            // e.g. right after a closing parenthesis
            self.expression.push(op.symbol());
        }
        self.snapshot()
    }

    /// Opens a function call, inserting implicit multiplication if the
    /// position follows a completed value.
    ///
    /// While the inverse modifier is active the trig keys map to their
    /// inverse forms; the modifier stays until toggled off.
    pub fn append_function(&mut self, func: Function) -> Snapshot {
        self.supersede_flash();
        let func = if self.inverse_trig { func.inverse() } else { func };
        self.commit_value_with_product();
        self.expression.push_str(func.name());
        self.expression.push('(');
        self.awaiting_new_entry = false;
        self.snapshot()
    }

    /// Inserts a named constant as a produced value (8 fractional digits).
    pub fn append_constant(&mut self, constant: Constant) -> Snapshot {
        self.supersede_flash();
        self.commit_value_with_product();
        self.current_token = format!("{:.8}", constant.value());
        self.awaiting_new_entry = true;
        self.snapshot()
    }

    /// Opens a grouping parenthesis, with the same implicit-multiplication
    /// rule as a function.
    pub fn open_paren(&mut self) -> Snapshot {
        self.supersede_flash();
        self.commit_value_with_product();
        self.expression.push('(');
        self.awaiting_new_entry = false;
        self.snapshot()
    }

    /// Commits the pending token ahead of the next `pow(x, y)` argument.
    pub fn append_separator(&mut self) -> Snapshot {
        self.supersede_flash();
        if !self.current_token.is_empty() {
            self.expression.push_str(&self.current_token);
            self.current_token.clear();
        }
        self.expression.push(',');
        self.awaiting_new_entry = false;
        self.snapshot()
    }

    /// Closes a group, committing the pending token first.
    pub fn close_paren(&mut self) -> Snapshot {
        self.supersede_flash();
        if !self.current_token.is_empty() {
            self.expression.push_str(&self.current_token);
            self.current_token.clear();
        }
        self.expression.push(')');
        self.awaiting_new_entry = false;
        self.snapshot()
    }

    /// Recalls the last answer into the in-progress token.
    pub fn recall_answer(&mut self) -> Snapshot {
        self.supersede_flash();
        if self.awaiting_new_entry {
            self.current_token = self.last_answer.clone();
            self.awaiting_new_entry = false;
        } else {
            if !self.current_token.is_empty() {
                self.expression.push_str(&self.current_token);
                self.expression.push('*');
            }
            self.current_token = self.last_answer.clone();
        }
        self.snapshot()
    }

    /// Resets the entry state. The last answer survives.
    pub fn clear_all(&mut self) -> Snapshot {
        self.flash = None;
        self.current_token.clear();
        self.expression.clear();
        self.history.clear();
        self.awaiting_new_entry = false;
        self.snapshot()
    }

    /// Removes the last typed character; a backspace right after a result
    /// starts over. Committed expression segments are not editable.
    pub fn delete_last(&mut self) -> Snapshot {
        self.supersede_flash();
        if self.awaiting_new_entry {
            return self.clear_all();
        }
        self.current_token.pop();
        self.snapshot()
    }

    /// Evaluates `expression + current_token`.
    ///
    /// On success the canonical result becomes both the display token and
    /// the recallable answer, the expression clears and the evaluated text is
    /// recorded as history. On any fault the display flashes
    /// [`ERROR_SENTINEL`] and reverts after [`ERROR_FLASH`] unless newer
    /// input arrives first; nothing else changes.
    pub fn evaluate(&mut self) -> Snapshot {
        self.supersede_flash();
        let candidate = format!("{}{}", self.expression, self.current_token);
        debug!(%candidate, "evaluating");
        match self.run_candidate(&candidate) {
            Ok(result) => {
                self.history = format!("{candidate} =");
                self.last_answer = result.clone();
                self.current_token = result;
                self.expression.clear();
                self.awaiting_new_entry = true;
            }
            Err(err) => {
                warn!(%candidate, %err, "evaluation fault");
                self.flash = Some(ErrorFlash {
                    saved: mem::take(&mut self.current_token),
                    since: Instant::now(),
                });
                self.current_token = ERROR_SENTINEL.to_string();
            }
        }
        self.snapshot()
    }

    pub fn set_angle_unit(&mut self, unit: AngleUnit) {
        self.angle_unit = unit;
    }

    pub fn toggle_angle_unit(&mut self) -> AngleUnit {
        self.angle_unit = self.angle_unit.toggled();
        self.angle_unit
    }

    pub fn set_inverse_trig(&mut self, active: bool) {
        self.inverse_trig = active;
    }

    pub fn toggle_inverse_trig(&mut self) -> bool {
        self.inverse_trig = !self.inverse_trig;
        self.inverse_trig
    }

    /// Fires the pending error revert once its window has elapsed.
    pub fn tick(&mut self) -> Snapshot {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> Snapshot {
        if let Some(flash) = &self.flash {
            if now.duration_since(flash.since) >= ERROR_FLASH {
                self.restore_flash();
            }
        }
        self.snapshot()
    }

    fn run_candidate(&self, candidate: &str) -> CalcResult<String> {
        let tokens = lexer::tokenize(candidate)?;
        let value = eval::evaluate(&tokens, self.angle_unit)?;
        if !value.is_finite() {
            return Err(CalcError::NotFinite);
        }
        Ok(format_result(value))
    }

    /// A newer action always wins over a pending error revert: the saved
    /// entry is restored first, then the action applies on top of it.
    fn supersede_flash(&mut self) {
        if self.flash.is_some() {
            self.restore_flash();
        }
    }

    fn restore_flash(&mut self) {
        if let Some(flash) = self.flash.take() {
            self.current_token = flash.saved;
        }
    }

    /// Commits the pending token with a trailing product, or inserts a bare
    /// product when the expression already ends in a value.
    fn commit_value_with_product(&mut self) {
        if !self.current_token.is_empty() {
            self.expression.push_str(&self.current_token);
            self.expression.push('*');
            self.current_token.clear();
        } else if !self.expression.is_empty()
            && !self.expression.ends_with(OPERATOR_CHARS)
            && !self.expression.ends_with('(')
        {
            self.expression.push('*');
        }
    }
}
