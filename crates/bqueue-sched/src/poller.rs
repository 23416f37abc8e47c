//! Status polling.
//!
//! Jobs that already reached a terminal state are never queried again: LSF
//! forgets finished jobs after a while and bjobs then errors on them.

use crate::error::{SchedError, SchedResult};
use crate::job::{JobId, JobStatus};
use crate::scheduler::BatchScheduler;

/// Get the status of a single job.
///
/// Unsubmitted and locally-run jobs are answered from the id alone.
pub async fn query_status(scheduler: &dyn BatchScheduler, id: JobId) -> SchedResult<JobStatus> {
    let Some(remote) = id.remote() else {
        return Ok(id.initial_status());
    };
    let statuses = query_remote(scheduler, &[remote]).await?;
    Ok(statuses[0])
}

/// Get the status of many jobs in one batched query.
///
/// Only scheduler-assigned ids reach the scheduler; the result has one entry
/// per input id, in input order.
pub async fn query_statuses(
    scheduler: &dyn BatchScheduler,
    ids: &[JobId],
) -> SchedResult<Vec<JobStatus>> {
    let mut statuses: Vec<JobStatus> = ids.iter().map(JobId::initial_status).collect();
    let targets: Vec<(usize, u64)> = ids
        .iter()
        .enumerate()
        .filter_map(|(index, id)| id.remote().map(|remote| (index, remote)))
        .collect();

    splice(scheduler, &mut statuses, &targets).await?;
    Ok(statuses)
}

/// Re-query the jobs that were in progress and splice the answers into a
/// copy of `previous`.
///
/// `previous` and `ids` run in parallel. Positions that are unsubmitted or
/// terminal pass through untouched; if nothing is in progress the scheduler
/// is not contacted at all.
pub async fn refresh_statuses(
    scheduler: &dyn BatchScheduler,
    previous: &[JobStatus],
    ids: &[JobId],
) -> SchedResult<Vec<JobStatus>> {
    debug_assert_eq!(previous.len(), ids.len());

    let mut statuses = previous.to_vec();
    let targets: Vec<(usize, u64)> = previous
        .iter()
        .zip(ids)
        .enumerate()
        .filter(|(_, (status, _))| status.is_in_progress())
        .filter_map(|(index, (_, id))| id.remote().map(|remote| (index, remote)))
        .collect();

    splice(scheduler, &mut statuses, &targets).await?;
    Ok(statuses)
}

/// Query `targets` and write each answer at its index. `statuses` is left
/// untouched if the query fails.
async fn splice(
    scheduler: &dyn BatchScheduler,
    statuses: &mut [JobStatus],
    targets: &[(usize, u64)],
) -> SchedResult<()> {
    if targets.is_empty() {
        return Ok(());
    }

    let remote_ids: Vec<u64> = targets.iter().map(|(_, remote)| *remote).collect();
    let answers = query_remote(scheduler, &remote_ids).await?;
    for ((index, _), status) in targets.iter().zip(answers) {
        statuses[*index] = status;
    }
    Ok(())
}

async fn query_remote(scheduler: &dyn BatchScheduler, ids: &[u64]) -> SchedResult<Vec<JobStatus>> {
    let statuses = scheduler.query(ids).await?;
    if statuses.len() != ids.len() {
        return Err(SchedError::ProtocolMismatch {
            command: format!("query of {} job(s)", ids.len()),
            message: format!("Expected {} statuses, got {}", ids.len(), statuses.len()),
        });
    }
    Ok(statuses)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::job::JobSpec;

    /// Scheduler with a fixed answer per id that records every query.
    #[derive(Default)]
    struct TableScheduler {
        table: HashMap<u64, JobStatus>,
        queries: Mutex<Vec<Vec<u64>>>,
        fail: bool,
    }

    impl TableScheduler {
        fn with(entries: &[(u64, JobStatus)]) -> Self {
            Self {
                table: entries.iter().copied().collect(),
                ..Default::default()
            }
        }

        fn queries(&self) -> Vec<Vec<u64>> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BatchScheduler for TableScheduler {
        async fn submit(&self, _spec: &JobSpec) -> SchedResult<u64> {
            unreachable!("poller never submits")
        }

        async fn query(&self, ids: &[u64]) -> SchedResult<Vec<JobStatus>> {
            self.queries.lock().unwrap().push(ids.to_vec());
            if self.fail {
                return Err(SchedError::ProtocolMismatch {
                    command: "bjobs".to_string(),
                    message: "out of sync".to_string(),
                });
            }
            Ok(ids.iter().map(|id| self.table[id]).collect())
        }
    }

    #[tokio::test]
    async fn test_query_status_sentinels_skip_scheduler() {
        let scheduler = TableScheduler::default();

        assert_eq!(
            query_status(&scheduler, JobId::Unsubmitted).await.unwrap(),
            JobStatus::Unsubmitted
        );
        assert_eq!(
            query_status(&scheduler, JobId::LocalSuccess).await.unwrap(),
            JobStatus::Succeeded
        );
        assert_eq!(
            query_status(&scheduler, JobId::LocalFailure).await.unwrap(),
            JobStatus::Failed
        );
        assert!(scheduler.queries().is_empty());
    }

    #[tokio::test]
    async fn test_query_status_remote() {
        let scheduler = TableScheduler::with(&[(5, JobStatus::Failed)]);
        assert_eq!(
            query_status(&scheduler, JobId::Remote(5)).await.unwrap(),
            JobStatus::Failed
        );
        assert_eq!(scheduler.queries(), vec![vec![5]]);
    }

    #[tokio::test]
    async fn test_query_statuses_mixed() {
        let scheduler = TableScheduler::with(&[
            (10, JobStatus::Succeeded),
            (11, JobStatus::InProgress),
        ]);
        let ids = [
            JobId::Remote(10),
            JobId::Unsubmitted,
            JobId::LocalFailure,
            JobId::Remote(11),
            JobId::LocalSuccess,
        ];

        let statuses = query_statuses(&scheduler, &ids).await.unwrap();
        assert_eq!(
            statuses,
            vec![
                JobStatus::Succeeded,
                JobStatus::Unsubmitted,
                JobStatus::Failed,
                JobStatus::InProgress,
                JobStatus::Succeeded,
            ]
        );
        assert_eq!(scheduler.queries(), vec![vec![10, 11]]);
    }

    #[tokio::test]
    async fn test_refresh_only_queries_in_progress() {
        let scheduler = TableScheduler::with(&[(2, JobStatus::Succeeded), (4, JobStatus::Failed)]);
        let ids = [
            JobId::Remote(1),
            JobId::Remote(2),
            JobId::Unsubmitted,
            JobId::Remote(4),
        ];
        let previous = [
            JobStatus::Succeeded,
            JobStatus::InProgress,
            JobStatus::Unsubmitted,
            JobStatus::InProgress,
        ];

        let statuses = refresh_statuses(&scheduler, &previous, &ids).await.unwrap();
        assert_eq!(
            statuses,
            vec![
                JobStatus::Succeeded,
                JobStatus::Succeeded,
                JobStatus::Unsubmitted,
                JobStatus::Failed,
            ]
        );
        assert_eq!(scheduler.queries(), vec![vec![2, 4]]);
    }

    #[tokio::test]
    async fn test_refresh_all_terminal_is_noop() {
        let scheduler = TableScheduler::default();
        let ids = [JobId::Remote(1), JobId::LocalSuccess, JobId::Remote(3)];
        let previous = [JobStatus::Succeeded, JobStatus::Succeeded, JobStatus::Failed];

        let statuses = refresh_statuses(&scheduler, &previous, &ids).await.unwrap();
        assert_eq!(statuses, previous.to_vec());
        assert!(scheduler.queries().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_error_propagates() {
        let scheduler = TableScheduler {
            fail: true,
            ..Default::default()
        };
        let ids = [JobId::Remote(1)];
        let previous = [JobStatus::InProgress];

        let result = refresh_statuses(&scheduler, &previous, &ids).await;
        assert!(matches!(result, Err(SchedError::ProtocolMismatch { .. })));
        assert_eq!(previous, [JobStatus::InProgress]);
    }

    #[tokio::test]
    async fn test_short_answer_is_protocol_mismatch() {
        struct ShortScheduler;

        #[async_trait]
        impl BatchScheduler for ShortScheduler {
            async fn submit(&self, _spec: &JobSpec) -> SchedResult<u64> {
                unreachable!()
            }

            async fn query(&self, _ids: &[u64]) -> SchedResult<Vec<JobStatus>> {
                Ok(vec![JobStatus::Succeeded])
            }
        }

        let result = query_statuses(&ShortScheduler, &[JobId::Remote(1), JobId::Remote(2)]).await;
        assert!(matches!(result, Err(SchedError::ProtocolMismatch { .. })));
    }
}
