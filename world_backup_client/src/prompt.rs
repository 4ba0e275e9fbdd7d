use std::io::{self, BufRead, IsTerminal, Write};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;

/// Source of interactively supplied settings
pub trait Prompter {
    fn ask(&mut self, label: &str) -> io::Result<String>;
    /// Like `ask`, without echoing what is typed
    fn ask_hidden(&mut self, label: &str) -> io::Result<String>;
}

/// Reads answers from the controlling terminal
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&mut self, label: &str) -> io::Result<String> {
        Ok(read_answer(label)?.trim().to_string())
    }

    fn ask_hidden(&mut self, label: &str) -> io::Result<String> {
        // Piped input has nothing to hide
        if !io::stdin().is_terminal() {
            return Ok(strip_line_ending(&read_answer(label)?).to_string());
        }
        print!("{}", label);
        io::stdout().flush()?;

        let _raw = RawMode::enable()?;
        let mut secret = String::new();
        loop {
            let Event::Key(key) = event::read()? else { continue };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Enter => break,
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    print!("\r\n");
                    return Err(io::Error::new(io::ErrorKind::Interrupted, "input cancelled"));
                }
                KeyCode::Esc => {
                    print!("\r\n");
                    return Err(io::Error::new(io::ErrorKind::Interrupted, "input cancelled"));
                }
                KeyCode::Backspace => {
                    secret.pop();
                }
                KeyCode::Char(c) => secret.push(c),
                _ => {}
            }
        }
        print!("\r\n");
        io::stdout().flush()?;
        Ok(secret)
    }
}

fn read_answer(label: &str) -> io::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut input = String::new();
    if io::stdin().lock().read_line(&mut input)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, format!("no answer for {}", label.trim())));
    }
    Ok(input)
}

fn strip_line_ending(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

/// Terminal raw mode, restored on drop
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(RawMode)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            log::warn!("Failed to restore terminal mode: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_keeps_surrounding_spaces() {
        assert_eq!(strip_line_ending("  s3cret \r\n"), "  s3cret ");
        assert_eq!(strip_line_ending("pw\n"), "pw");
        assert_eq!(strip_line_ending("pw"), "pw");
    }
}
