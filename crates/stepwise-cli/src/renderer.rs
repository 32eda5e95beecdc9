//! Terminal rendering for the markdown views produced by the core display
//! module.

use std::fmt;

use anyhow::Result;
use termimad::{crossterm::style::Color, MadSkin};

/// How a single output line is drawn in rich mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineStyle {
    Header,
    Failure,
    Inline,
}

impl LineStyle {
    fn of(line: &str) -> Self {
        if line.starts_with('#') {
            Self::Header
        } else if line.starts_with("Error:") {
            Self::Failure
        } else {
            Self::Inline
        }
    }
}

/// Terminal renderer that can switch between rich and plain text output
pub struct TerminalRenderer {
    rich_enabled: bool,
    skin: MadSkin,
}

impl TerminalRenderer {
    pub fn new(rich_enabled: bool) -> Self {
        let mut skin = MadSkin::default();
        skin.set_headers_fg(Color::Blue);
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::Magenta);
        skin.inline_code.set_bg(Color::AnsiValue(238));

        Self { rich_enabled, skin }
    }

    /// Prints any markdown view.
    ///
    /// Headers keep their hash marks and are coloured as a whole; `Error:`
    /// lines are printed in red.
    pub fn render<T: fmt::Display + ?Sized>(&self, content: &T) -> Result<()> {
        let markdown = content.to_string();
        if !self.rich_enabled {
            print!("{markdown}");
            return Ok(());
        }

        for line in markdown.lines() {
            match LineStyle::of(line) {
                LineStyle::Header => println!("\x1b[34m{line}\x1b[0m"),
                LineStyle::Failure => println!("\x1b[31m{line}\x1b[0m"),
                LineStyle::Inline => {
                    self.skin.print_inline(line);
                    println!();
                }
            }
        }
        Ok(())
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}
