use chrono::NaiveDate;
use crate::agents::Agent;

/// Mean agent progress; 0 for an empty fleet.
pub fn overall_progress(agents: &[Agent]) -> f64 {
    if agents.is_empty() {
        return 0.0;
    }
    agents.iter().map(|a| a.progress).sum::<f64>() / agents.len() as f64
}

/// Calendar days until launch, negative once it has passed.
pub fn time_to_launch(today: NaiveDate, launch: NaiveDate) -> i64 {
    (launch - today).num_days()
}

/// Tasks completed per day over the trailing window.
pub fn velocity(completed_in_window: usize, window_days: u32) -> f64 {
    if window_days == 0 {
        return 0.0;
    }
    completed_in_window as f64 / window_days as f64
}
