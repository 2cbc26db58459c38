//! Result and error channels for conversion responses.

use std::io::Write;

/// Line-oriented destination for responses.
pub trait OutputChannel: Send + Sync {
    /// Write a successful conversion line.
    fn success(&self, line: &str);

    /// Write a failure line.
    fn failure(&self, line: &str);
}

/// Writes results to stdout and failures to stderr.
#[derive(Debug, Default)]
pub struct ConsoleOutput;

impl OutputChannel for ConsoleOutput {
    fn success(&self, line: &str) {
        // A closed stdout is not worth failing a request over.
        let _ = writeln!(std::io::stdout().lock(), "{}", line);
    }

    fn failure(&self, line: &str) {
        let _ = writeln!(std::io::stderr().lock(), "{}", line);
    }
}

/// Captures both channels in memory.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct BufferedOutput {
    successes: parking_lot::Mutex<Vec<String>>,
    failures: parking_lot::Mutex<Vec<String>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl BufferedOutput {
    /// Create empty buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines written to the result channel.
    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().clone()
    }

    /// Lines written to the error channel.
    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().clone()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl OutputChannel for BufferedOutput {
    fn success(&self, line: &str) {
        self.successes.lock().push(line.to_string());
    }

    fn failure(&self, line: &str) {
        self.failures.lock().push(line.to_string());
    }
}
