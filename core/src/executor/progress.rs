use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use super::traits::{RunEvent, RunObserver};

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Terminal progress for a run: one overall bar plus a spinner per running task.
pub struct ProgressMonitor {
    multi: MultiProgress,
    overall: ProgressBar,
    task_bars: Mutex<HashMap<String, ProgressBar>>,
    enabled: bool,
}

impl ProgressMonitor {
    /// `enabled = false` gives a monitor that ignores every event.
    pub fn new(enabled: bool) -> Self {
        let multi = MultiProgress::new();
        let overall = if enabled {
            let bar = multi.add(ProgressBar::new(0));
            if let Ok(style) = ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tasks ({percent}%) {msg}")
            {
                bar.set_style(style.progress_chars("█▓▒░  "));
            }
            bar
        } else {
            ProgressBar::hidden()
        };

        Self {
            multi,
            overall,
            task_bars: Mutex::new(HashMap::new()),
            enabled,
        }
    }

    fn start_task(&self, task: &str) {
        let bar = self.multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.green} {msg}") {
            bar.set_style(style.tick_strings(SPINNER_FRAMES));
        }
        bar.set_message(format!("⏳ {task}"));
        bar.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut bars) = self.task_bars.lock() {
            bars.insert(task.to_string(), bar);
        }
    }

    fn finish_task(&self, task: &str, icon: &str, detail: String) {
        let bar = self
            .task_bars
            .lock()
            .ok()
            .and_then(|mut bars| bars.remove(task));

        let message = format!("{icon} {task} {detail}");
        match bar {
            Some(bar) => bar.finish_with_message(message),
            None => {
                let _ = self.multi.println(format!("  {message}"));
            }
        }
        self.overall.inc(1);
    }
}

impl RunObserver for ProgressMonitor {
    fn on_event(&self, event: &RunEvent) {
        if !self.enabled {
            return;
        }

        match event {
            RunEvent::RunStart { order, mode, .. } => {
                self.overall.set_length(order.len() as u64);
                self.overall.set_message(format!("mode: {mode}"));
            }
            RunEvent::TaskStart { task, .. } => self.start_task(task),
            RunEvent::TaskSkipped {
                task, missing_dep, ..
            } => self.finish_task(task, "⏭", format!("(waiting on {missing_dep})")),
            RunEvent::TaskComplete {
                task,
                success,
                duration_ms,
                ..
            } => {
                let icon = if *success { "✅" } else { "❌" };
                self.finish_task(task, icon, format!("({duration_ms}ms)"));
            }
            RunEvent::RunEnd { stats, .. } => {
                self.overall.finish_with_message(format!(
                    "{}/{} succeeded ({:.0}%)",
                    stats.successful_count, stats.total, stats.success_rate
                ));
            }
        }
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        if let Ok(mut bars) = self.task_bars.lock() {
            for (_, bar) in bars.drain() {
                bar.finish_and_clear();
            }
        }
    }
}
