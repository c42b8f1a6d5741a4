//! Progress bar adapter using indicatif.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crash_qa_core::ports::{ProgressEvent, ProgressSink};
use crash_qa_core::progress::{ProgressFrame, ProgressTask, TaskId};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing::debug;

/// Renders progress bus frames as one bar per active task.
pub struct ProgressRenderer {
    multi: MultiProgress,
    bars: Mutex<HashMap<TaskId, ProgressBar>>,
    style: Option<ProgressStyle>,
}

impl ProgressRenderer {
    /// Creates a renderer drawing to stderr.
    #[must_use]
    pub fn new() -> Self {
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .map(|s| s.progress_chars("#>-"))
            .map_err(|e| debug!("Invalid progress template: {e}"))
            .ok();

        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
            style,
        }
    }

    fn new_bar(&self, task: &ProgressTask) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new(task.total));
        if let Some(style) = &self.style {
            bar.set_style(style.clone());
        }
        bar
    }

    fn render(&self, frame: &ProgressFrame) {
        let mut bars = self.bars.lock().unwrap_or_else(PoisonError::into_inner);

        // Drop bars for tasks that are no longer active
        bars.retain(|id, bar| {
            let active = frame.active_task(*id).is_some();
            if !active {
                bar.finish_and_clear();
                self.multi.remove(bar);
            }
            active
        });

        for task in &frame.active {
            let bar = bars.entry(task.id).or_insert_with(|| self.new_bar(task));
            bar.set_length(task.total);
            bar.set_position(task.current);
            if task.message.is_empty() {
                bar.set_message(task.description.clone());
            } else {
                bar.set_message(format!("{} - {}", task.description, task.message));
            }
        }
    }

    fn close(&self) {
        let mut bars = self.bars.lock().unwrap_or_else(PoisonError::into_inner);
        for (_, bar) in bars.drain() {
            bar.finish_and_clear();
        }
        if let Err(e) = self.multi.clear() {
            debug!("Failed to clear progress bars: {e}");
        }
    }
}

impl Default for ProgressRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ProgressRenderer {
    fn on_event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Frame(frame) => self.render(&frame),
            ProgressEvent::Closed => self.close(),
        }
    }
}
