//! Terminal rendering for the `routecfg` binary
//!
//! `--color=always|never|auto`. In `auto` mode `NO_COLOR` turns colors off,
//! anything else is left to `console` (`CLICOLOR`, `CLICOLOR_FORCE`,
//! `TERM=dumb` and whether stdout is a terminal).
//!
//! ```
//! use routecfg::output::{Palette, Status};
//!
//! let palette = Palette::from_flag("never");
//! assert_eq!(palette.status(Status::Error), "[ERR]");
//! assert_eq!(palette.paint_diff("+mtu 1400\n"), "+mtu 1400\n");
//! ```

use std::env;

use console::{style, StyledObject};

/// Outcome tag printed in front of a report line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Info,
    Warn,
    Error,
}

impl Status {
    fn tag(self) -> &'static str {
        match self {
            Status::Ok => "[OK]",
            Status::Info => "[INFO]",
            Status::Warn => "[WARN]",
            Status::Error => "[ERR]",
        }
    }

    fn paint(self, styled: StyledObject<&str>) -> StyledObject<&str> {
        match self {
            Status::Ok => styled.green(),
            Status::Info => styled.cyan(),
            Status::Warn => styled.yellow(),
            Status::Error => styled.red().bold(),
        }
    }
}

/// Whether and how to color output
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    color: bool,
}

impl Palette {
    /// Resolve a `--color` value; unknown values mean `auto`.
    pub fn from_flag(flag: &str) -> Self {
        let color = match flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => env::var_os("NO_COLOR").is_none() && console::colors_enabled(),
        };
        Self { color }
    }

    /// The tag for `status`, colored when enabled.
    pub fn status(&self, status: Status) -> String {
        if !self.color {
            return status.tag().to_string();
        }
        status
            .paint(style(status.tag()))
            .force_styling(true)
            .to_string()
    }

    /// Paint lines of an annotated configuration: `+` green, `-` red.
    ///
    /// Without colors the text is returned unchanged.
    pub fn paint_diff(&self, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }

        let mut painted = String::with_capacity(text.len());
        for line in text.split_inclusive('\n') {
            let (body, newline) = match line.strip_suffix('\n') {
                Some(body) => (body, "\n"),
                None => (line, ""),
            };
            let body = match body.chars().next() {
                Some('+') => style(body).green().force_styling(true).to_string(),
                Some('-') => style(body).red().force_styling(true).to_string(),
                _ => body.to_string(),
            };
            painted.push_str(&body);
            painted.push_str(newline);
        }
        painted
    }
}
