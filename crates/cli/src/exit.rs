use engine_config::report::summary::RunStatus;

/// Completed runs and runs that stopped cleanly at an incomplete checkpoint.
pub const SUCCESS: u8 = 0;
/// Configuration, connection, provisioning or whole-call failures.
pub const FAILURE: u8 = 1;

pub fn for_status(status: &RunStatus) -> u8 {
    match status {
        RunStatus::Completed | RunStatus::Aborted { .. } => SUCCESS,
        RunStatus::Failed { .. } | RunStatus::NotStarted { .. } => FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_failure_stops_cleanly() {
        assert_eq!(for_status(&RunStatus::Completed), SUCCESS);
        let aborted = RunStatus::Aborted {
            checkpoint: 2,
            expected: 10,
            succeeded: 9,
        };
        assert_eq!(for_status(&aborted), SUCCESS);
    }

    #[test]
    fn fatal_errors_exit_non_zero() {
        let failed = RunStatus::Failed {
            checkpoint: 0,
            error: "closed".into(),
        };
        assert_eq!(for_status(&failed), FAILURE);
        let not_started = RunStatus::NotStarted {
            error: "offer missing".into(),
        };
        assert_eq!(for_status(&not_started), FAILURE);
    }
}
