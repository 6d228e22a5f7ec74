//! CLI module - goal input and result display

pub mod display;

use std::io::{self, BufRead, Write};

pub use display::render_result;

/// Words that end the session instead of starting a run
const QUIT_WORDS: [&str; 3] = ["quit", "exit", "q"];

/// Prompt for a goal on stdin.
///
/// Returns `None` when the user quits or enters nothing.
pub fn read_goal() -> io::Result<Option<String>> {
    let stdin = io::stdin();
    read_goal_from(&mut stdin.lock(), &mut io::stdout())
}

fn read_goal_from(input: &mut impl BufRead, output: &mut impl Write) -> io::Result<Option<String>> {
    writeln!(output, "Enter your goal (or 'quit' to exit):")?;
    write!(output, "> ")?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let goal = line.trim();

    if goal.is_empty() || QUIT_WORDS.contains(&goal.to_lowercase().as_str()) {
        return Ok(None);
    }
    Ok(Some(goal.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(input: &str) -> Option<String> {
        let mut out = Vec::new();
        read_goal_from(&mut input.as_bytes(), &mut out).unwrap()
    }

    #[test]
    fn test_read_goal() {
        assert_eq!(read("  list files \n").as_deref(), Some("list files"));
    }

    #[test]
    fn test_quit_and_empty() {
        assert_eq!(read("QUIT\n"), None);
        assert_eq!(read("\n"), None);
        assert_eq!(read(""), None);
    }
}
