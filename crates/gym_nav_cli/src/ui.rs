use owo_colors::OwoColorize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Progress,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Copy, Debug)]
pub struct Style {
    pub emoji: bool,
    pub color: bool,
}

impl Default for Style {
    fn default() -> Self {
        // plain output when piped
        let tty = atty::is(atty::Stream::Stdout);
        Self {
            emoji: tty,
            color: tty,
        }
    }
}

pub fn info(msg: impl AsRef<str>) {
    print_line(Level::Info, msg.as_ref(), Style::default());
}

pub fn progress(msg: impl AsRef<str>) {
    print_line(Level::Progress, msg.as_ref(), Style::default());
}

pub fn success(msg: impl AsRef<str>) {
    print_line(Level::Success, msg.as_ref(), Style::default());
}

pub fn warning(msg: impl AsRef<str>) {
    print_line(Level::Warning, msg.as_ref(), Style::default());
}

pub fn error(msg: impl AsRef<str>) {
    print_line(Level::Error, msg.as_ref(), Style::default());
}

pub fn print_line(level: Level, msg: &str, style: Style) {
    println!("{}", render(level, msg, style));
}

fn render(level: Level, msg: &str, style: Style) -> String {
    let prefix = match (style.emoji, level) {
        (false, _) => "",
        (true, Level::Info) => "ℹ️  ",
        (true, Level::Progress) => "🧭 ",
        (true, Level::Success) => "✅ ",
        (true, Level::Warning) => "⚠️  ",
        (true, Level::Error) => "❌ ",
    };
    let line = format!("{prefix}{msg}");

    if !style.color {
        return line;
    }
    match level {
        Level::Info => line,
        Level::Progress => line.cyan().to_string(),
        Level::Success => line.green().to_string(),
        Level::Warning => line.yellow().to_string(),
        Level::Error => line.red().to_string(),
    }
}
