use std::time::{Duration, Instant};
use indicatif::{ProgressBar, ProgressStyle};
use console::style;
use crate::events::CoreEvent;
use crate::pipeline::{DeploymentStatus, StageName, StageStatus};

/// Progress bar for one deployment, driven by pipeline events.
pub struct DeployProgress {
    bar: ProgressBar,
    start_time: Instant,
}

impl DeployProgress {
    pub fn new(environment: &str, hidden: bool) -> Self {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(StageName::ORDER.len() as u64)
        };
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.cyan} {bar:30.cyan/dark_gray} {pos}/{len} stages | {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        bar.set_message(format!("Deploying to {}", environment));
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar, start_time: Instant::now() }
    }

    pub fn handle_event(&self, event: &CoreEvent) {
        match event {
            CoreEvent::StageCompleted { stage, record, .. } => match record.status {
                StageStatus::Completed => {
                    self.bar.inc(1);
                    self.bar.set_message(match stage.next() {
                        Some(next) => format!("{} done, running {}", stage, next),
                        None => format!("{} done", stage),
                    });
                }
                StageStatus::Failed => {
                    self.bar.println(format!("  {} {} failed: {}", style("✗").red(), stage, record.details));
                }
            },
            CoreEvent::DeploymentFinished { status, error, .. } => {
                let elapsed = self.start_time.elapsed().as_secs_f64();
                match status {
                    DeploymentStatus::Completed => self.bar.finish_with_message(format!(
                        "{} completed in {:.1}s",
                        style("✓").green(),
                        elapsed
                    )),
                    _ => self.bar.abandon_with_message(format!(
                        "{} {}",
                        style("✗").red(),
                        error.as_deref().unwrap_or("deployment failed")
                    )),
                }
            }
            _ => {}
        }
    }
}

/// Progress bar for one local tool run.
pub struct ToolProgressBar {
    bar: ProgressBar,
}

impl ToolProgressBar {
    pub fn new(tool_name: &str, hidden: bool) -> Self {
        let bar = if hidden { ProgressBar::hidden() } else { ProgressBar::new(100) };
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  {bar:30.yellow/dark_gray} {pos:>3}% | {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        bar.set_message(tool_name.to_string());
        Self { bar }
    }

    pub fn handle_event(&self, event: &CoreEvent) {
        match event {
            CoreEvent::ToolProgress { progress, .. } => self.bar.set_position(*progress as u64),
            CoreEvent::ToolExecuted { duration_ms, remote, .. } => {
                let path = if *remote { "remote" } else { "local" };
                self.bar.finish_with_message(format!("{} {} ms ({})", style("✓").green(), duration_ms, path));
            }
            CoreEvent::ToolFailed { error, .. } => {
                self.bar.abandon_with_message(format!("{} {}", style("✗").red(), error));
            }
            _ => {}
        }
    }
}
