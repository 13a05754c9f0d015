//! Styled terminal output for the importer.
//!
//! Progress lines go to stdout, failures to stderr.

use owo_colors::OwoColorize;

const MUTED: (u8, u8, u8) = (160, 160, 160);

/// Status marker placed in front of a progress line
#[derive(Clone, Copy)]
enum Tone {
    Ok,
    Failed,
    Caution,
    Note,
}

impl Tone {
    fn symbol(self) -> &'static str {
        match self {
            Tone::Ok => "✓",
            Tone::Failed => "✗",
            Tone::Caution => "⚠",
            Tone::Note => "ℹ",
        }
    }

    fn rgb(self) -> (u8, u8, u8) {
        match self {
            Tone::Ok => (152, 225, 152),
            Tone::Failed => (255, 160, 160),
            Tone::Caution => (255, 230, 160),
            Tone::Note => (160, 200, 255),
        }
    }
}

fn marked(tone: Tone, message: &str) -> String {
    let (r, g, b) = tone.rgb();
    format!(
        "{} {}",
        tone.symbol().truecolor(r, g, b).bold(),
        message.bright_white()
    )
}

fn muted(text: &str) -> String {
    let (r, g, b) = MUTED;
    text.truecolor(r, g, b).to_string()
}

pub fn success(message: &str) {
    println!("{}", marked(Tone::Ok, message));
}

pub fn error(message: &str) {
    eprintln!("{}", marked(Tone::Failed, message));
}

pub fn warning(message: &str) {
    println!("{}", marked(Tone::Caution, message));
}

pub fn info(message: &str) {
    println!("{}", marked(Tone::Note, message));
}

/// Bold heading followed by a rule
pub fn section(title: &str) {
    println!("\n{}", title.truecolor(181, 174, 254).bold());
    println!("{}", muted(&"─".repeat(50)));
}

pub fn key_value(key: &str, value: &str) {
    println!("  {} {}", muted(&format!("{}:", key)), value.bright_white());
}

pub fn dimmed(message: &str) {
    println!("{}", muted(message));
}

pub fn blank() {
    println!();
}
