use colored::*;
use rustyline::{error::ReadlineError, Config, DefaultEditor};
use tracing_subscriber::EnvFilter;

use scicalc::config::{Preferences, Theme};
use scicalc::engine::{Engine, Op, Snapshot, ERROR_FLASH, ERROR_SENTINEL};
use scicalc::eval::{AngleUnit, Constant, Function};

/// Keypad layout. Basic hides the scientific keys; the engine underneath is
/// the same either way.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Basic,
    Scientific,
}

struct Palette {
    display: (u8, u8, u8),
    expression: (u8, u8, u8),
    history: (u8, u8, u8),
    error: (u8, u8, u8),
    message: (u8, u8, u8),
}

const LIGHT: Palette = Palette {
    display: (0x1E, 0x29, 0x3B),
    expression: (0x64, 0x74, 0x8B),
    history: (0x94, 0xA3, 0xB8),
    error: (0xDC, 0x26, 0x26),
    message: (0x47, 0x55, 0x69),
};

const DARK: Palette = Palette {
    display: (0xF1, 0xF5, 0xF9),
    expression: (0x94, 0xA3, 0xB8),
    history: (0x64, 0x74, 0x8B),
    error: (0xF8, 0x71, 0x71),
    message: (0xCB, 0xD5, 0xE1),
};

fn main() -> rustyline::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::builder().build();
    let mut rl = DefaultEditor::with_config(config)?;

    let mut prefs = Preferences::load();
    let mut mode = Mode::Basic;
    let mut engine = Engine::new();
    engine.set_angle_unit(prefs.angle_unit);

    println!("scicalc - type an expression and press enter, :help for keys");

    loop {
        let prompt = prompt_text(&engine, mode);
        match rl.readline(&prompt) {
            Ok(line) => {
                if line.is_empty() {
                    println!("Goodbye!");
                    break;
                }
                rl.add_history_entry(line.clone())?;
                let palette = palette(prefs.theme);

                if let Some(command) = line.strip_prefix(':') {
                    match run_command(command.trim(), &mut engine, &mut mode, &mut prefs) {
                        CommandOutcome::Message(msg) => {
                            println!("{}", tint(&msg, palette.message));
                        }
                        CommandOutcome::Render(snapshot) => render(&snapshot, palette),
                        CommandOutcome::Quit => break,
                    }
                    continue;
                }

                match feed_line(&mut engine, mode, &line) {
                    Ok(()) => {
                        let snapshot = engine.evaluate();
                        if snapshot.display_value == ERROR_SENTINEL && engine.flashing_error() {
                            println!("{}", tint(ERROR_SENTINEL, palette.error));
                            std::thread::sleep(ERROR_FLASH);
                            render(&engine.tick(), palette);
                        } else {
                            render(&snapshot, palette);
                        }
                    }
                    Err(msg) => {
                        println!("{}", tint(&msg, palette.message));
                        // keypresses before the bad one already landed
                        render(&engine.snapshot(), palette);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Pressing enter with no input will exit as well.");
                break;
            }
            Err(err) => {
                println!("{:?}", err);
                break;
            }
        }
    }

    Ok(())
}

fn palette(theme: Theme) -> &'static Palette {
    match theme {
        Theme::Light => &LIGHT,
        Theme::Dark => &DARK,
    }
}

fn tint(text: &str, rgb: (u8, u8, u8)) -> ColoredString {
    text.truecolor(rgb.0, rgb.1, rgb.2)
}

fn prompt_text(engine: &Engine, mode: Mode) -> String {
    let unit = match engine.angle_unit() {
        AngleUnit::Degrees => "deg",
        AngleUnit::Radians => "rad",
    };
    let mode = match mode {
        Mode::Basic => "",
        Mode::Scientific => " sci",
    };
    let inv = if engine.inverse_trig() { " inv" } else { "" };
    format!("[{unit}{mode}{inv}]> ")
}

fn render(snapshot: &Snapshot, palette: &Palette) {
    if !snapshot.history_text.is_empty() {
        println!("{}", tint(&snapshot.history_text, palette.history));
    }
    if !snapshot.expression_text.is_empty() {
        println!("{}", tint(&snapshot.expression_text, palette.expression));
    }
    println!("{}", tint(&snapshot.display_value, palette.display).bold());
    if snapshot.display_value.len() >= 26 {
        println!("{}", tint("Too long!", palette.error));
    }
}

enum CommandOutcome {
    Message(String),
    Render(Snapshot),
    Quit,
}

fn run_command(
    command: &str,
    engine: &mut Engine,
    mode: &mut Mode,
    prefs: &mut Preferences,
) -> CommandOutcome {
    match command {
        "deg" | "rad" => {
            engine.set_angle_unit(if command == "deg" {
                AngleUnit::Degrees
            } else {
                AngleUnit::Radians
            });
            prefs.angle_unit = engine.angle_unit();
            persist(prefs);
            CommandOutcome::Message(format!("Angle unit set to {command}."))
        }
        "inv" => {
            let active = engine.toggle_inverse_trig();
            CommandOutcome::Message(format!(
                "Inverse trig {}.",
                if active { "on" } else { "off" }
            ))
        }
        "basic" => {
            *mode = Mode::Basic;
            CommandOutcome::Message("Basic keypad.".to_string())
        }
        "sci" => {
            *mode = Mode::Scientific;
            CommandOutcome::Message("Scientific keypad.".to_string())
        }
        "theme" => {
            prefs.theme = prefs.theme.toggled();
            persist(prefs);
            let name = match prefs.theme {
                Theme::Light => "light",
                Theme::Dark => "dark",
            };
            CommandOutcome::Message(format!("Theme set to {name}."))
        }
        "ans" => CommandOutcome::Render(engine.recall_answer()),
        "del" => CommandOutcome::Render(engine.delete_last()),
        "clear" | "c" => CommandOutcome::Render(engine.clear_all()),
        "help" => CommandOutcome::Message(help_text().to_string()),
        "quit" | "q" => CommandOutcome::Quit,
        other => CommandOutcome::Message(format!("Unknown command ':{other}'.")),
    }
}

fn persist(prefs: &Preferences) {
    if let Err(err) = prefs.save() {
        eprintln!("Could not save preferences: {err}");
    }
}

fn help_text() -> &'static str {
    "Keys: digits . + - * / % ^ ( ) and names sin cos tan log ln sqrt abs fact pow pi e ans\n\
     Enter evaluates the line.\n\
     Commands: :deg :rad :inv :basic :sci :theme :ans :del :clear :help :quit"
}

/// Feeds one line of typed keys into the engine as discrete key presses,
/// the way the original widget's keyboard handler routed keys to buttons.
fn feed_line(engine: &mut Engine, mode: Mode, line: &str) -> Result<(), String> {
    let chars: Vec<char> = line.chars().collect();
    let mut index = 0;
    while index < chars.len() {
        let c = chars[index];
        match c {
            ' ' | '\t' => index += 1,
            '0'..='9' | '.' => {
                engine.append_digit(c);
                index += 1;
            }
            '(' => {
                engine.open_paren();
                index += 1;
            }
            ')' => {
                engine.close_paren();
                index += 1;
            }
            ',' => {
                engine.append_separator();
                index += 1;
            }
            '=' if index == chars.len() - 1 => index += 1,
            c if c.is_ascii_alphabetic() => {
                let start = index;
                while index < chars.len() && chars[index].is_ascii_alphabetic() {
                    index += 1;
                }
                let name: String = chars[start..index].iter().collect();
                press_name(engine, mode, &name)?;
                // a function press already opens its parenthesis
                if Function::from_name(&name).is_some() && chars.get(index) == Some(&'(') {
                    index += 1;
                }
            }
            c => {
                let Some(op) = Op::from_char(c) else {
                    return Err(format!("'{c}' is not a calculator key"));
                };
                if op == Op::Pow && mode == Mode::Basic {
                    return Err(format!(
                        "'{c}' is on the scientific keypad; switch with :sci"
                    ));
                }
                engine.append_operator(op);
                index += 1;
            }
        }
    }
    Ok(())
}

fn press_name(engine: &mut Engine, mode: Mode, name: &str) -> Result<(), String> {
    if name.eq_ignore_ascii_case("ans") {
        engine.recall_answer();
        return Ok(());
    }
    if mode == Mode::Basic {
        return Err(format!(
            "'{name}' is on the scientific keypad; switch with :sci"
        ));
    }
    if let Some(func) = Function::from_name(name) {
        engine.append_function(func);
        Ok(())
    } else if let Some(constant) = Constant::from_name(name) {
        engine.append_constant(constant);
        Ok(())
    } else {
        Err(format!("'{name}' is not a calculator key"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_mode_refuses_scientific_keys() {
        let mut engine = Engine::new();
        assert!(feed_line(&mut engine, Mode::Basic, "sin(3)")
            .unwrap_err()
            .contains(":sci"));
        assert!(feed_line(&mut engine, Mode::Basic, "2^3")
            .unwrap_err()
            .contains(":sci"));
        assert!(feed_line(&mut engine, Mode::Basic, "pi")
            .unwrap_err()
            .contains(":sci"));
    }

    #[test]
    fn basic_mode_still_does_arithmetic() {
        let mut engine = Engine::new();
        feed_line(&mut engine, Mode::Basic, "17%5").unwrap();
        assert_eq!(engine.evaluate().display_value, "2");
    }

    #[test]
    fn ans_is_allowed_in_basic_mode() {
        let mut engine = Engine::new();
        feed_line(&mut engine, Mode::Basic, "6*7").unwrap();
        engine.evaluate();
        feed_line(&mut engine, Mode::Basic, "ans+1").unwrap();
        assert_eq!(engine.evaluate().display_value, "43");
    }

    #[test]
    fn scientific_mode_routes_names() {
        let mut engine = Engine::new();
        feed_line(&mut engine, Mode::Scientific, "sin(90)").unwrap();
        assert_eq!(engine.snapshot().expression_text, "sin(90)");
        assert_eq!(engine.evaluate().display_value, "1");
    }

    #[test]
    fn error_mid_line_keeps_earlier_presses() {
        let mut engine = Engine::new();
        let err = feed_line(&mut engine, Mode::Basic, "2+sin(3").unwrap_err();
        assert!(err.contains(":sci"));
        assert_eq!(engine.snapshot().expression_text, "2+");
        feed_line(&mut engine, Mode::Basic, "3").unwrap();
        assert_eq!(engine.evaluate().display_value, "5");
    }
}
