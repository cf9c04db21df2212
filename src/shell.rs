use crate::pipeline::main::Pipeline;
use std::io::{BufRead, Write};
use std::path::PathBuf;

const HELP: &str = "Commands:
  classify <path>   classify a JPEG or PNG image
  feedback <text>   store feedback on the last predictions
  clear             discard the current predictions
  help              show this message
  quit              exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Classify(PathBuf),
    Feedback(String),
    Clear,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Option<Command>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let command = match name.to_lowercase().as_str() {
            "classify" | "upload" if rest.is_empty() => {
                return Err(format!("usage: {} <path>", name));
            }
            "classify" | "upload" => Command::Classify(PathBuf::from(rest)),
            // Empty text is passed through so the pipeline reports it.
            "feedback" => Command::Feedback(rest.to_string()),
            "clear" | "remove" => Command::Clear,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command '{}', type 'help'", other)),
        };

        Ok(Some(command))
    }
}

/// Reads commands until `quit` or end of input. Failed actions are reported
/// and the loop keeps going.
pub fn run<R: BufRead, W: Write>(
    pipeline: &mut Pipeline,
    input: R,
    mut output: W,
) -> std::io::Result<()> {
    writeln!(output, "{}", HELP)?;

    for line in input.lines() {
        let line = line?;

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                writeln!(output, "Error: {}", message)?;
                continue;
            }
        };

        match command {
            Command::Classify(path) => match pipeline.classify_path(&path) {
                Ok(predictions) => writeln!(output, "{}", predictions)?,
                Err(err) => writeln!(output, "Error: {}", err)?,
            },
            Command::Feedback(text) => match pipeline.submit_feedback(&text) {
                Ok(record) => writeln!(output, "Feedback submitted successfully! (#{})", record.id)?,
                Err(err) => writeln!(output, "Error: {}", err)?,
            },
            Command::Clear => {
                pipeline.clear();
                writeln!(output, "Cleared.")?;
            }
            Command::Help => writeln!(output, "{}", HELP)?,
            Command::Quit => break,
        }
    }

    Ok(())
}
