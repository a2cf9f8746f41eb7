use super::state::{Deployment, DeploymentStatus, PipelineSummary};

pub fn compute_summary(deployments: &[Deployment]) -> PipelineSummary {
    let completed = deployments.iter()
        .filter(|d| d.status == DeploymentStatus::Completed)
        .count();
    let failed = deployments.iter()
        .filter(|d| d.status == DeploymentStatus::Failed)
        .count();
    let finished = completed + failed;

    let success_rate = if finished == 0 {
        0.0
    } else {
        completed as f64 / finished as f64 * 100.0
    };

    let mean_duration_ms = if finished == 0 {
        0.0
    } else {
        deployments.iter()
            .filter(|d| d.status.is_terminal())
            .map(|d| d.total_duration_ms() as f64)
            .sum::<f64>() / finished as f64
    };

    PipelineSummary {
        total: deployments.len(),
        running: deployments.len() - finished,
        completed,
        failed,
        success_rate,
        mean_duration_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::state::DeploymentConfig;

    fn deployment(status: DeploymentStatus) -> Deployment {
        let mut d = Deployment::new("d".into(), DeploymentConfig::default());
        d.status = status;
        d
    }

    #[test]
    fn test_empty_summary() {
        let summary = compute_summary(&[]);
        assert_eq!(summary, PipelineSummary::default());
    }

    #[test]
    fn test_success_rate_ignores_running() {
        let summary = compute_summary(&[
            deployment(DeploymentStatus::Completed),
            deployment(DeploymentStatus::Failed),
            deployment(DeploymentStatus::Running),
            deployment(DeploymentStatus::Completed),
        ]);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.running, 1);
        assert!((summary.success_rate - 66.666).abs() < 0.01);
    }
}
