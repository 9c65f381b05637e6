//! Status-line writer honouring `--quiet` (§7).
//!
//! Grounded on the teacher's `output_writer.rs` (`Box<dyn Write>` abstraction over
//! a destination), adapted here to `internal/pkg/console`'s role in the donor:
//! short, prefixed status lines on stderr rather than record output on stdout.

use std::io::{self, Write};

/// The four status prefixes the pipeline ever prints (§7): info, success,
/// warning, fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warn,
    Fatal,
}

impl Level {
    fn prefix(self) -> &'static str {
        match self {
            Level::Info => "[*]",
            Level::Success => "[+]",
            Level::Warn => "[!]",
            Level::Fatal => "[X]",
        }
    }
}

/// Writes status messages to a destination (stderr in production, an in-memory
/// buffer in tests), dropping everything when `quiet` is set.
pub struct Console {
    writer: Box<dyn Write + Send>,
    quiet: bool,
}

impl Console {
    pub fn new(quiet: bool) -> Self {
        Self {
            writer: Box::new(io::stderr()),
            quiet,
        }
    }

    #[cfg(test)]
    pub fn buffered(quiet: bool) -> (Self, std::sync::Arc<parking_lot::Mutex<Vec<u8>>>) {
        struct Shared(std::sync::Arc<parking_lot::Mutex<Vec<u8>>>);
        impl Write for Shared {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let buf = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
        (
            Self {
                writer: Box::new(Shared(buf.clone())),
                quiet,
            },
            buf,
        )
    }

    pub fn status(&mut self, level: Level, message: impl AsRef<str>) {
        if self.quiet {
            return;
        }
        let _ = writeln!(self.writer, "{} {}", level.prefix(), message.as_ref());
    }

    pub fn info(&mut self, message: impl AsRef<str>) {
        self.status(Level::Info, message);
    }

    pub fn success(&mut self, message: impl AsRef<str>) {
        self.status(Level::Success, message);
    }

    pub fn warn(&mut self, message: impl AsRef<str>) {
        self.status(Level::Warn, message);
    }

    pub fn fatal(&mut self, message: impl AsRef<str>) {
        self.status(Level::Fatal, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_suppresses_every_level() {
        let (mut console, buf) = Console::buffered(true);
        console.info("hello");
        console.fatal("boom");
        assert!(buf.lock().is_empty());
    }

    #[test]
    fn messages_are_prefixed() {
        let (mut console, buf) = Console::buffered(false);
        console.success("done");
        let text = String::from_utf8(buf.lock().clone()).unwrap();
        assert_eq!(text, "[+] done\n");
    }
}
