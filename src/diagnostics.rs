//! Diagnostic log for a compilation run.
//!
//! The compiler never aborts on malformed author input; it records what it
//! skipped and why. Every entry captures the controller, method and parameter
//! that were current when it was emitted, so a rendered transcript can point
//! at the offending annotation. Entries are also mirrored to the [`log`]
//! facade so they show up in normal `env_logger` output.

/// Severity of a diagnostic entry. Numerically `error` is 1 and `debug` is 5;
/// lower means more severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error = 1,
    Warning = 2,
    Notice = 3,
    Debug = 5,
}

impl Severity {
    /// Lowercase name used in rendered transcripts
    pub fn name(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Notice => "notice",
            Severity::Debug => "debug",
        }
    }

    fn log_level(self) -> log::Level {
        match self {
            Severity::Error => log::Level::Error,
            Severity::Warning => log::Level::Warn,
            Severity::Notice => log::Level::Info,
            Severity::Debug => log::Level::Debug,
        }
    }
}

/// Context slot kinds. The slots are overwritten in traversal order and are
/// not stack-scoped: nested model resolution can clobber a slot an enclosing
/// caller set. That matches the traversal being strictly sequential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Controller = 0,
    Method = 1,
    Parameter = 2,
}

/// A single recorded diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub severity: Severity,
    pub message: String,
    /// Controller active when the entry was emitted
    pub controller: Option<String>,
    /// Method active when the entry was emitted
    pub method: Option<String>,
    /// Parameter index active when the entry was emitted
    pub parameter: Option<String>,
}

/// Append-only message sink for one compilation run.
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    entries: Vec<Entry>,
    current: [Option<String>; 3],
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, capturing the three current context slots.
    pub fn log(&mut self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        log::log!(severity.log_level(), "{}", message);
        self.entries.push(Entry {
            severity,
            message,
            controller: self.current[ContextKind::Controller as usize].clone(),
            method: self.current[ContextKind::Method as usize].clone(),
            parameter: self.current[ContextKind::Parameter as usize].clone(),
        });
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.log(Severity::Error, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.log(Severity::Warning, message);
    }

    pub fn notice(&mut self, message: impl Into<String>) {
        self.log(Severity::Notice, message);
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        self.log(Severity::Debug, message);
    }

    /// Overwrites one context slot. The value persists until the next call
    /// for the same kind.
    pub fn set_current(&mut self, kind: ContextKind, name: impl Into<String>) {
        self.current[kind as usize] = Some(name.into());
    }

    pub fn current(&self, kind: ContextKind) -> Option<&str> {
        self.current[kind as usize].as_deref()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Renders all entries at or above `max_severity` as a transcript.
    /// Context is appended for error and warning entries only.
    pub fn render(&self, max_severity: Severity) -> String {
        let mut result = String::new();
        for entry in &self.entries {
            if entry.severity > max_severity {
                continue;
            }
            result.push_str(&format!("\n[{}] {}", entry.severity.name(), entry.message));
            if entry.severity <= Severity::Warning {
                result.push_str(&format!(
                    ". Controller: {}, Method: {}, Tag number: {}",
                    entry.controller.as_deref().unwrap_or(""),
                    entry.method.as_deref().unwrap_or(""),
                    entry.parameter.as_deref().unwrap_or("")
                ));
            }
        }
        result
    }
}
