#[cfg(test)]
use std::sync::Mutex;

/// User-facing progress sink.
///
/// Everything the importer reports to the operator goes through here;
/// diagnostics go to `tracing` instead.
pub trait Output: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warning(&self, message: &str);
    fn info(&self, message: &str);
    fn section(&self, title: &str);
    fn key_value(&self, key: &str, value: &str);
    fn dimmed(&self, message: &str);
    fn blank(&self);
}

/// Writes to the terminal through [`crate::output`]
pub struct TerminalOutput;

impl Output for TerminalOutput {
    fn success(&self, message: &str) {
        crate::output::success(message);
    }

    fn error(&self, message: &str) {
        crate::output::error(message);
    }

    fn warning(&self, message: &str) {
        crate::output::warning(message);
    }

    fn info(&self, message: &str) {
        crate::output::info(message);
    }

    fn section(&self, title: &str) {
        crate::output::section(title);
    }

    fn key_value(&self, key: &str, value: &str) {
        crate::output::key_value(key, value);
    }

    fn dimmed(&self, message: &str) {
        crate::output::dimmed(message);
    }

    fn blank(&self) {
        crate::output::blank();
    }
}

/// One line captured by [`MockOutput`]
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum OutputMessage {
    Success(String),
    Error(String),
    Warning(String),
    Info(String),
    Section(String),
    KeyValue(String, String),
    Dimmed(String),
    Blank,
}

#[cfg(test)]
impl OutputMessage {
    /// Plain rendering, close to what the terminal shows minus colors
    fn render(&self) -> String {
        match self {
            OutputMessage::Success(s) => format!("✓ {}", s),
            OutputMessage::Error(s) => format!("✗ {}", s),
            OutputMessage::Warning(s) => format!("⚠ {}", s),
            OutputMessage::Info(s) | OutputMessage::Dimmed(s) => s.clone(),
            OutputMessage::Section(s) => format!("\n{}", s),
            OutputMessage::KeyValue(k, v) => format!("  {}: {}", k, v),
            OutputMessage::Blank => String::new(),
        }
    }
}

/// Records every line so tests can assert on what the operator saw
#[cfg(test)]
#[derive(Default)]
pub struct MockOutput {
    messages: Mutex<Vec<OutputMessage>>,
}

#[cfg(test)]
impl MockOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_message(&self, message: &OutputMessage) -> bool {
        self.messages.lock().unwrap().contains(message)
    }

    pub fn get_warnings(&self) -> Vec<String> {
        self.collect(|m| match m {
            OutputMessage::Warning(s) => Some(s.clone()),
            _ => None,
        })
    }

    pub fn get_errors(&self) -> Vec<String> {
        self.collect(|m| match m {
            OutputMessage::Error(s) => Some(s.clone()),
            _ => None,
        })
    }

    pub fn to_text(&self) -> String {
        self.collect(|m| Some(m.render())).join("\n")
    }

    fn collect(&self, pick: impl Fn(&OutputMessage) -> Option<String>) -> Vec<String> {
        self.messages.lock().unwrap().iter().filter_map(pick).collect()
    }

    fn push(&self, message: OutputMessage) {
        self.messages.lock().unwrap().push(message);
    }
}

#[cfg(test)]
impl Output for MockOutput {
    fn success(&self, message: &str) {
        self.push(OutputMessage::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.push(OutputMessage::Error(message.to_string()));
    }

    fn warning(&self, message: &str) {
        self.push(OutputMessage::Warning(message.to_string()));
    }

    fn info(&self, message: &str) {
        self.push(OutputMessage::Info(message.to_string()));
    }

    fn section(&self, title: &str) {
        self.push(OutputMessage::Section(title.to_string()));
    }

    fn key_value(&self, key: &str, value: &str) {
        self.push(OutputMessage::KeyValue(key.to_string(), value.to_string()));
    }

    fn dimmed(&self, message: &str) {
        self.push(OutputMessage::Dimmed(message.to_string()));
    }

    fn blank(&self) {
        self.push(OutputMessage::Blank);
    }
}
