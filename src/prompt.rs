//! Line-based prompts for the interactive menu.
//!
//! Every prompt treats `q` or end of input as cancellation and returns
//! `None`. Invalid choices are reported and asked again.

use crate::error::{ExportError, Result};
use crate::export::ExportFormat;
use crate::persistence::PresetQuery;
use colored::Colorize;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Reads answers from `input` and writes prompts to `output`.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Consumes the prompter, returning the output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Writes a line of text.
    pub fn say(&mut self, text: impl AsRef<str>) -> Result<()> {
        writeln!(self.output, "{}", text.as_ref()).map_err(console_error)
    }

    pub fn success(&mut self, text: impl AsRef<str>) -> Result<()> {
        self.say(text.as_ref().green().to_string())
    }

    pub fn warn(&mut self, text: impl AsRef<str>) -> Result<()> {
        self.say(text.as_ref().bright_red().to_string())
    }

    /// Asks for a line of text. Returns `None` on `q` or end of input.
    pub fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}").map_err(console_error)?;
        self.output.flush().map_err(console_error)?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).map_err(console_error)?;
        if read == 0 {
            return Ok(None);
        }

        let answer = line.trim();
        if answer.eq_ignore_ascii_case("q") {
            Ok(None)
        } else {
            Ok(Some(answer.to_string()))
        }
    }

    /// Asks a yes/no question. Anything other than `y`/`yes` is a no.
    pub fn confirm(&mut self, prompt: &str) -> Result<bool> {
        Ok(self
            .ask(&format!("{prompt} [y/n]: "))?
            .is_some_and(|a| a.eq_ignore_ascii_case("y") || a.eq_ignore_ascii_case("yes")))
    }

    /// Prints a numbered list of preset table names.
    pub fn print_query_list(&mut self, queries: &[PresetQuery]) -> Result<()> {
        for (i, query) in queries.iter().enumerate() {
            self.say(format!("{}. {}", i + 1, query.table_name).cyan().to_string())?;
        }
        Ok(())
    }

    /// Asks for one entry of a numbered list, returning its 0-based index.
    pub fn choose_index(&mut self, prompt: &str, len: usize) -> Result<Option<usize>> {
        loop {
            let Some(answer) = self.ask(prompt)? else {
                return Ok(None);
            };
            match parse_choice(&answer, len) {
                Ok(index) => return Ok(Some(index)),
                Err(e) => self.warn(e.to_string())?,
            }
        }
    }

    /// Asks for comma-separated entries of a numbered list.
    ///
    /// Returns 0-based indices in the order given, without duplicates.
    pub fn choose_many(&mut self, prompt: &str, len: usize) -> Result<Option<Vec<usize>>> {
        loop {
            let Some(answer) = self.ask(prompt)? else {
                return Ok(None);
            };
            match parse_choices(&answer, len) {
                Ok(indices) => return Ok(Some(indices)),
                Err(e) => self.warn(e.to_string())?,
            }
        }
    }

    /// Shows the format menu and asks until a valid format is chosen.
    pub fn choose_format(&mut self) -> Result<Option<ExportFormat>> {
        self.say("--------------FILE EXPORT--------------".bright_blue().to_string())?;
        self.say("Please select an export file format:".blue().to_string())?;
        for (i, format) in ExportFormat::ALL.iter().enumerate() {
            let line = format!("{}. {}", i + 1, format.label());
            let line = match format {
                ExportFormat::Csv => line.cyan(),
                ExportFormat::Xlsx => line.bright_green(),
                ExportFormat::Json => line.magenta(),
            };
            self.say(line.to_string())?;
        }
        self.say("---------------------------------------".bright_blue().to_string())?;

        loop {
            let Some(answer) = self.ask("Enter your choice: ")? else {
                return Ok(None);
            };
            match ExportFormat::from_menu_choice(&answer) {
                Some(format) => return Ok(Some(format)),
                None => self.warn("Invalid choice. Please enter 1, 2, or 3.")?,
            }
        }
    }

    /// Asks for the output directory.
    ///
    /// An empty answer picks `default` when one is configured and cancels
    /// otherwise. `q` or end of input always cancels.
    pub fn choose_output_dir(&mut self, default: Option<&Path>) -> Result<Option<PathBuf>> {
        let prompt = match default {
            Some(dir) => format!(
                "Enter a folder to save the files [{}] (or 'q' to cancel): ",
                dir.display()
            ),
            None => "Enter a folder to save the files (or 'q' to cancel): ".to_string(),
        };

        match self.ask(&prompt)? {
            None => Ok(None),
            Some(answer) if answer.is_empty() => Ok(default.map(Path::to_path_buf)),
            Some(answer) => Ok(Some(PathBuf::from(answer))),
        }
    }
}

/// Parses a 1-based menu choice into a 0-based index.
pub fn parse_choice(answer: &str, len: usize) -> Result<usize> {
    let choice: usize = answer
        .trim()
        .parse()
        .map_err(|_| ExportError::input(format!("'{}' is not a number", answer.trim())))?;

    if (1..=len).contains(&choice) {
        Ok(choice - 1)
    } else {
        Err(ExportError::input(format!(
            "Choice {choice} is out of range (1-{len})"
        )))
    }
}

/// Parses a comma-separated list of 1-based menu choices.
pub fn parse_choices(answer: &str, len: usize) -> Result<Vec<usize>> {
    let mut indices = Vec::new();
    for part in answer.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let index = parse_choice(part, len)?;
        if !indices.contains(&index) {
            indices.push(index);
        }
    }

    if indices.is_empty() {
        return Err(ExportError::input("No choice entered"));
    }
    Ok(indices)
}

pub(crate) fn console_error(error: std::io::Error) -> ExportError {
    ExportError::internal(format!("Console I/O failed: {error}"))
}
