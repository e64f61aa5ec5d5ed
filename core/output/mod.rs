//! # Output
//!
//! User-facing progress messages, kept apart from diagnostics logging. Every lifecycle operation
//! writes its `[+]` / `[-]` report lines to an [Output], which decides where they go.
//!
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const INDENT: &str = "  ";

pub trait Output: Send + Sync {
    fn write(&self, message: &str);

    fn increase_indent(&self);

    fn decrease_indent(&self);
}

impl dyn Output + '_ {
    /// Indents every message written until the returned guard is dropped.
    pub fn indent(&self) -> IndentGuard<'_> {
        self.increase_indent();
        IndentGuard { output: self }
    }
}

#[must_use]
pub struct IndentGuard<'a> {
    output: &'a dyn Output,
}

impl Drop for IndentGuard<'_> {
    fn drop(&mut self) {
        self.output.decrease_indent();
    }
}

/// Tracks the indentation level for the sinks that care about it.
#[derive(Debug, Default)]
pub struct IndentLevel(AtomicUsize);

impl IndentLevel {
    pub fn increase(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn decrease(&self) {
        let _ = self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |level| {
                level.checked_sub(1)
            });
    }

    pub fn apply(&self, message: &str) -> String {
        format!("{}{}", INDENT.repeat(self.0.load(Ordering::SeqCst)), message)
    }
}

/// Throws every message away.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

impl Output for NullOutput {
    fn write(&self, _message: &str) {}

    fn increase_indent(&self) {}

    fn decrease_indent(&self) {}
}

/// Keeps every message in memory, already indented.
#[derive(Debug, Default)]
pub struct BufferOutput {
    level: IndentLevel,
    lines: Mutex<Vec<String>>,
}

impl BufferOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// Whether any line, ignoring its indentation, equals `message`.
    pub fn contains(&self, message: &str) -> bool {
        self.lines()
            .iter()
            .any(|line| line.trim_start() == message)
    }
}

impl Output for BufferOutput {
    fn write(&self, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(self.level.apply(message));
        }
    }

    fn increase_indent(&self) {
        self.level.increase();
    }

    fn decrease_indent(&self) {
        self.level.decrease();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indents_until_the_guard_drops() {
        let buffer = BufferOutput::new();
        let output: &dyn Output = &buffer;

        output.write("Downloading");
        {
            let _indent = output.indent();
            output.write("[+] done");
        }
        output.write("Next");

        assert_eq!(buffer.lines(), vec!["Downloading", "  [+] done", "Next"]);
        assert!(buffer.contains("[+] done"));
    }

    #[test]
    fn never_goes_below_zero() {
        let buffer = BufferOutput::new();
        buffer.decrease_indent();
        buffer.write("flat");
        assert_eq!(buffer.lines(), vec!["flat"]);
    }
}
