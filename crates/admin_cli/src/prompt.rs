//! Reading a password from the terminal without echoing it.

use std::{
    error::Error,
    io::{Stderr, Write},
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal,
};

type PromptResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

const ATTEMPTS: usize = 3;

/// What a key press did to the secret being typed.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Continue,
    Done,
    Cancelled,
}

/// The secret typed so far. Key handling is kept apart from the terminal so
/// it can be tested without one.
#[derive(Default)]
struct Secret(String);

impl Secret {
    fn apply(&mut self, key: KeyEvent) -> Step {
        if key.kind == KeyEventKind::Release {
            return Step::Continue;
        }
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => Step::Done,
            KeyCode::Esc => Step::Cancelled,
            KeyCode::Char('c' | 'd') if control => Step::Cancelled,
            KeyCode::Char('u') if control => {
                self.0.clear();
                Step::Continue
            }
            KeyCode::Backspace => {
                self.0.pop();
                Step::Continue
            }
            KeyCode::Char(ch) if !control => {
                self.0.push(ch);
                Step::Continue
            }
            _ => Step::Continue,
        }
    }
}

/// Raw mode for as long as it lives; restored on drop, errors included.
struct Hidden(Stderr);

impl Hidden {
    fn start(label: &str) -> PromptResult<Self> {
        let mut err = std::io::stderr();
        write!(err, "{label}")?;
        err.flush()?;
        terminal::enable_raw_mode()?;
        Ok(Self(err))
    }
}

impl Drop for Hidden {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let _ = writeln!(self.0);
    }
}

fn read_secret(label: &str) -> PromptResult<String> {
    let _hidden = Hidden::start(label)?;
    let mut secret = Secret::default();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        match secret.apply(key) {
            Step::Continue => {}
            Step::Done => return Ok(secret.0),
            Step::Cancelled => return Err("password entry cancelled".into()),
        }
    }
}

/// Ask for a new password and its confirmation, with a few attempts.
pub fn new_password() -> PromptResult<String> {
    for _ in 0..ATTEMPTS {
        let first = read_secret("New password: ")?;
        if first.is_empty() {
            eprintln!("The password cannot be empty.");
            continue;
        }
        if read_secret("Repeat password: ")? == first {
            return Ok(first);
        }
        eprintln!("The two entries differ.");
    }
    Err(format!("no matching password after {ATTEMPTS} attempts").into())
}
