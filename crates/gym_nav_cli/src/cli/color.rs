use owo_colors::OwoColorize;

use crate::ui::Style;

/// One color policy for every command. Returns owned strings so callers can
/// format them freely.
pub struct Colors {
    pub enabled: bool,
}

impl Colors {
    pub fn new(style: &Style) -> Self {
        Self {
            enabled: style.color,
        }
    }

    fn paint(&self, s: &str, f: impl FnOnce(&str) -> String) -> String {
        if self.enabled { f(s) } else { s.to_string() }
    }

    pub fn ok(&self, s: impl AsRef<str>) -> String {
        self.paint(s.as_ref(), |s| s.green().to_string())
    }

    pub fn warn(&self, s: impl AsRef<str>) -> String {
        self.paint(s.as_ref(), |s| s.yellow().to_string())
    }

    pub fn info(&self, s: impl AsRef<str>) -> String {
        self.paint(s.as_ref(), |s| s.cyan().to_string())
    }

    pub fn dim(&self, s: impl AsRef<str>) -> String {
        self.paint(s.as_ref(), |s| s.bright_black().to_string())
    }

    pub fn key(&self, s: impl AsRef<str>) -> String {
        self.paint(s.as_ref(), |s| s.bold().to_string())
    }

    /// Gyms without a name tag are dimmed.
    pub fn gym_name(&self, s: impl AsRef<str>, named: bool) -> String {
        if named { self.ok(s) } else { self.dim(s) }
    }

    /// Distance to the destination: green when close, yellow mid-range.
    pub fn remaining(&self, meters: f64, txt: impl AsRef<str>) -> String {
        if meters <= 100.0 {
            self.ok(txt)
        } else if meters <= 1000.0 {
            self.warn(txt)
        } else {
            self.info(txt)
        }
    }
}
