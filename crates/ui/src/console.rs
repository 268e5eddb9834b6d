use std::io::{self, BufRead, Write};

use crossterm::style::Stylize as _;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Line-oriented terminal I/O.
pub struct Console<R, W> {
    input: R,
    output: W,
    color: bool,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            color: false,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// Prints `prompt` and reads one trimmed line; `None` once input is closed.
    pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        if self.color {
            write!(self.output, "{}", prompt.bold())?;
        } else {
            write!(self.output, "{prompt}")?;
        }
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    pub fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    pub fn heading(&mut self, text: &str) -> io::Result<()> {
        if self.color {
            writeln!(self.output, "\n{}", format!("=== {text} ===").cyan().bold())
        } else {
            writeln!(self.output, "\n=== {text} ===")
        }
    }

    pub fn success(&mut self, text: &str) -> io::Result<()> {
        if self.color {
            writeln!(self.output, "{}", text.green())
        } else {
            writeln!(self.output, "{text}")
        }
    }

    pub fn warn(&mut self, text: &str) -> io::Result<()> {
        if self.color {
            writeln!(self.output, "{}", text.yellow())
        } else {
            writeln!(self.output, "{text}")
        }
    }

    pub fn dim(&mut self, text: &str) -> io::Result<()> {
        if self.color {
            writeln!(self.output, "{}", text.dark_grey())
        } else {
            writeln!(self.output, "{text}")
        }
    }
}

/// Shortens `text` to at most `max_width` terminal columns, marking the cut with `…`.
pub fn clip(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut width = 0usize;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + w + 1 > max_width {
            break;
        }
        out.push(ch);
        width += w;
    }
    out.push('…');
    out
}
