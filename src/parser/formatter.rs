//! Help formatter that wraps text at the terminal width.

/// Characters a line may be broken after.
const DELIMITERS: [char; 5] = [' ', '.', ',', '!', '?'];

/// Narrowest width we wrap to; anything smaller produces unreadable help.
const MIN_WIDTH: usize = 20;

/// Wraps help text so no line exceeds `width` characters.
///
/// Every parser in a compiled tree shares its root's formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelpFormatter {
    width: usize,
}

impl HelpFormatter {
    pub const DEFAULT_WIDTH: usize = 80;

    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(MIN_WIDTH),
        }
    }

    /// Formatter sized to the current terminal, or [`Self::DEFAULT_WIDTH`]
    /// when stdout is not a terminal.
    pub fn from_terminal() -> Self {
        crossterm::terminal::size()
            .ok()
            .map(|(cols, _rows)| usize::from(cols))
            .filter(|cols| *cols > 0)
            .map(Self::new)
            .unwrap_or_default()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Split `text` into lines of at most `width` characters, preferring to
    /// break after a space or punctuation mark. Explicit newlines are kept.
    pub fn split_lines(&self, text: &str) -> Vec<String> {
        let mut lines = Vec::new();

        for line in text.trim().split('\n') {
            let mut rest: Vec<char> = line.trim_end().chars().collect();

            while rest.len() > self.width {
                let cut = if rest[self.width] == ' ' {
                    self.width
                } else {
                    rest[..self.width]
                        .iter()
                        .rposition(|c| DELIMITERS.contains(c))
                        .filter(|&index| index > 0)
                        .map(|index| index + 1)
                        .unwrap_or(self.width)
                };

                let head: String = rest[..cut].iter().collect();
                lines.push(head.trim_end().to_string());
                rest = rest[cut..]
                    .iter()
                    .skip_while(|c| **c == ' ')
                    .copied()
                    .collect();
            }

            if !rest.is_empty() || lines.is_empty() || line.trim().is_empty() {
                lines.push(rest.into_iter().collect());
            }
        }

        lines
    }

    /// [`Self::split_lines`] joined back into a single string.
    pub fn fill(&self, text: &str) -> String {
        self.split_lines(text).join("\n")
    }

    /// Apply this formatter's width to a clap command.
    pub(crate) fn apply(&self, command: clap::Command) -> clap::Command {
        command.term_width(self.width)
    }
}

impl Default for HelpFormatter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WIDTH)
    }
}
