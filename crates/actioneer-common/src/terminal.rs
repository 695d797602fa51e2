// Terminal: the host process's console output, masked against the run's
// EnvironmentStore before anything is printed.

use crate::env_store::EnvironmentStore;
use std::io::{self, Write};

/// Console color codes for terminal output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleColor {
    Red,
    Green,
    Cyan,
    Default,
}

impl ConsoleColor {
    fn ansi_code(&self) -> &'static str {
        match self {
            ConsoleColor::Red => "\x1b[31m",
            ConsoleColor::Green => "\x1b[32m",
            ConsoleColor::Cyan => "\x1b[36m",
            ConsoleColor::Default => "",
        }
    }

    fn reset() -> &'static str {
        "\x1b[0m"
    }
}

/// Masked console for action output.
#[derive(Debug, Clone)]
pub struct Terminal {
    /// Suppress all output (tests, `PrintToStdout = false`).
    pub silent: bool,
    store: EnvironmentStore,
}

impl Terminal {
    pub fn new(store: EnvironmentStore) -> Self {
        Self {
            silent: false,
            store,
        }
    }

    pub fn silent(store: EnvironmentStore) -> Self {
        Self {
            silent: true,
            store,
        }
    }

    /// Mask `line` and print it to stdout. Returns the masked text.
    pub fn write_line(&self, line: &str) -> String {
        let masked = self.store.mask_line(line);
        if !self.silent {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{masked}");
        }
        masked
    }

    /// Mask `text` and print it to stdout as-is, without adding a newline.
    pub fn write(&self, text: &str) -> String {
        let masked = self.store.mask_line(text);
        if !self.silent {
            let mut out = io::stdout().lock();
            let _ = out.write_all(masked.as_bytes());
            let _ = out.flush();
        }
        masked
    }

    /// Mask raw bytes and print them to stdout unchanged otherwise.
    pub fn write_bytes(&self, data: &[u8]) -> Vec<u8> {
        let masked = self.store.mask_bytes(data);
        if !self.silent {
            let mut out = io::stdout().lock();
            let _ = out.write_all(&masked);
            let _ = out.flush();
        }
        masked
    }

    /// Mask `line` and print it to stderr. Returns the masked text.
    pub fn write_error_line(&self, line: &str) -> String {
        let masked = self.store.mask_line(line);
        if !self.silent {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{masked}");
        }
        masked
    }

    /// Print a colored, masked heading line.
    pub fn write_section(&self, title: &str, color: ConsoleColor) {
        if self.silent {
            return;
        }
        let masked = self.store.mask_line(title);
        let mut out = io::stdout().lock();
        match color {
            ConsoleColor::Default => {
                let _ = writeln!(out, "{masked}");
            }
            _ => {
                let _ = writeln!(
                    out,
                    "{}{}{}",
                    color.ansi_code(),
                    masked,
                    ConsoleColor::reset()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_line_returns_masked_text() {
        let store = EnvironmentStore::new();
        store.set_secure_many([("PW", "hunter2")]);
        let terminal = Terminal::silent(store);
        assert_eq!(terminal.write_line("pw=hunter2"), "pw=***");
        assert_eq!(terminal.write_error_line("hunter2!"), "***!");
        assert_eq!(terminal.write("a\nhunter2\n"), "a\n***\n");
    }

    #[test]
    fn write_bytes_preserves_invalid_utf8() {
        let store = EnvironmentStore::new();
        store.set_secure_many([("PW", "hunter2")]);
        let terminal = Terminal::silent(store);
        assert_eq!(
            terminal.write_bytes(b"\x89PNG hunter2\xff"),
            b"\x89PNG ***\xff".to_vec()
        );
    }

    #[test]
    fn ansi_codes() {
        assert_eq!(ConsoleColor::Default.ansi_code(), "");
        assert!(ConsoleColor::Red.ansi_code().starts_with("\x1b["));
    }
}
