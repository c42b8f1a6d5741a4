//! Synthetic crash log builders for testing.

use crash_qa_core::domain::ScanInput;

/// Builder for crash log text.
///
/// Lines are appended in call order. The signature helpers emit text the
/// built-in analyzers recognise.
#[derive(Debug, Clone)]
pub struct CrashLogBuilder {
    key: String,
    lines: Vec<String>,
}

impl CrashLogBuilder {
    /// Starts a log identified by `key`.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            lines: Vec::new(),
        }
    }

    /// Appends a raw line.
    #[must_use]
    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    /// Appends an informational log line.
    #[must_use]
    pub fn info(self, message: &str) -> Self {
        self.line(format!("[INFO] {message}"))
    }

    /// Appends `count` filler lines.
    #[must_use]
    pub fn noise(mut self, count: usize) -> Self {
        self.lines
            .extend((0..count).map(|i| format!("[DEBUG] tick {i}")));
        self
    }

    // === Crash signatures ===

    /// Appends a segmentation fault report.
    #[must_use]
    pub fn segfault(self) -> Self {
        self.line("Program received signal SIGSEGV, Segmentation fault.")
    }

    /// Appends a stack overflow report.
    #[must_use]
    pub fn stack_overflow(self) -> Self {
        self.line("thread 'main' has overflowed its stack: stack overflow")
    }

    /// Appends an unhandled exception report.
    #[must_use]
    pub fn unhandled_exception(self) -> Self {
        self.line("Unhandled exception at 0x00007FF6: System.NullReferenceException")
    }

    // === Memory signatures ===

    /// Appends an allocation failure.
    #[must_use]
    pub fn bad_alloc(self) -> Self {
        self.line("terminate called after throwing an instance of 'std::bad_alloc'")
    }

    /// Appends an out-of-memory report.
    #[must_use]
    pub fn out_of_memory(self) -> Self {
        self.line("fatal: out of memory allocating 1048576 bytes")
    }

    /// Log text, newline-terminated.
    #[must_use]
    pub fn text(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }

    /// Builds the scan input.
    #[must_use]
    pub fn build(self) -> ScanInput {
        let text = self.text();
        ScanInput::new(self.key, text)
    }

    /// Builds `count` inputs keyed `{prefix}-{i}.log`, every `crash_every`-th
    /// one carrying a segfault (0 disables crashes).
    #[must_use]
    pub fn batch(prefix: &str, count: usize, crash_every: usize) -> Vec<ScanInput> {
        (0..count)
            .map(|i| {
                let builder = Self::new(format!("{prefix}-{i}.log")).info("starting");
                if crash_every > 0 && i % crash_every == 0 {
                    builder.segfault().build()
                } else {
                    builder.info("exiting normally").build()
                }
            })
            .collect()
    }
}
