//! Parsers for LSF command output.

use crate::error::{SchedError, SchedResult};
use crate::job::JobStatus;

/// LSF job state, as reported in the STAT column of bjobs.
///
/// The vocabulary is closed: anything else is an error rather than a
/// state to be guessed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LsfState {
    /// PEND: waiting in a queue.
    Pending,
    /// RUN: currently running.
    Running,
    /// UNKWN: the master host lost contact with the execution host.
    Unknown,
    /// SSUSP: suspended by LSF.
    SystemSuspended,
    /// PSUSP: suspended while pending.
    PendingSuspended,
    /// USUSP: suspended by the user while running.
    UserSuspended,
    /// DONE: finished with exit code zero.
    Done,
    /// EXIT: finished with a nonzero exit code, or was killed.
    Exit,
}

impl LsfState {
    /// All states, in the order bjobs documentation lists them.
    pub const ALL: [LsfState; 8] = [
        LsfState::Pending,
        LsfState::Running,
        LsfState::Unknown,
        LsfState::SystemSuspended,
        LsfState::PendingSuspended,
        LsfState::UserSuspended,
        LsfState::Done,
        LsfState::Exit,
    ];

    /// Map to the queue's status model.
    pub fn status(&self) -> JobStatus {
        match self {
            LsfState::Done => JobStatus::Succeeded,
            LsfState::Exit => JobStatus::Failed,
            LsfState::Pending
            | LsfState::Running
            | LsfState::Unknown
            | LsfState::SystemSuspended
            | LsfState::PendingSuspended
            | LsfState::UserSuspended => JobStatus::InProgress,
        }
    }

    /// Convert to the STAT token.
    pub fn to_code(&self) -> &'static str {
        match self {
            LsfState::Pending => "PEND",
            LsfState::Running => "RUN",
            LsfState::Unknown => "UNKWN",
            LsfState::SystemSuspended => "SSUSP",
            LsfState::PendingSuspended => "PSUSP",
            LsfState::UserSuspended => "USUSP",
            LsfState::Done => "DONE",
            LsfState::Exit => "EXIT",
        }
    }
}

/// Parse a bjobs STAT token.
pub fn parse_lsf_state(token: &str) -> SchedResult<LsfState> {
    LsfState::ALL
        .into_iter()
        .find(|state| state.to_code() == token)
        .ok_or_else(|| SchedError::UnknownStatus(token.to_string()))
}

/// Parse bsub output to extract the job id.
///
/// bsub output format: "Job <12345> is submitted to default queue <normal>."
/// The acknowledgement may be preceded by other lines.
pub fn parse_bsub_output(command: &str, output: &str) -> SchedResult<u64> {
    let parse_error = || SchedError::SubmissionParse {
        command: command.to_string(),
        output: output.trim().to_string(),
    };

    let tokens: Vec<&str> = output.split_whitespace().collect();
    let job_index = tokens
        .iter()
        .position(|token| *token == "Job")
        .ok_or_else(parse_error)?;

    let (id_token, is_token, submitted_token) = match tokens.get(job_index + 1..job_index + 4) {
        Some([id, is, submitted]) => (*id, *is, *submitted),
        _ => return Err(parse_error()),
    };
    if is_token != "is" || submitted_token != "submitted" {
        return Err(parse_error());
    }

    let id = id_token
        .strip_prefix('<')
        .and_then(|rest| rest.strip_suffix('>'))
        .ok_or_else(parse_error)?;
    match id.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(parse_error()),
    }
}

/// Split a bjobs data row into its job id and state.
///
/// Row format (default bjobs columns):
/// ```text
/// JOBID   USER    STAT  QUEUE      FROM_HOST   EXEC_HOST   JOB_NAME   SUBMIT_TIME
/// 12345   alice   RUN   normal     login1      node17      sleep      Jan 15 10:30
/// ```
pub fn parse_bjobs_row(command: &str, row: &str) -> SchedResult<(u64, LsfState)> {
    let tokens: Vec<&str> = row.split_whitespace().collect();
    if tokens.len() < 3 {
        return Err(SchedError::ProtocolMismatch {
            command: command.to_string(),
            message: format!("Unable to parse row: {row:?}"),
        });
    }

    let job_id = tokens[0]
        .parse::<u64>()
        .map_err(|_| SchedError::ProtocolMismatch {
            command: command.to_string(),
            message: format!("Row does not start with a job id: {row:?}"),
        })?;
    let state = parse_lsf_state(tokens[2])?;

    Ok((job_id, state))
}

/// Data rows of bjobs output: the header line is dropped, as are blank lines.
pub fn bjobs_data_rows(output: &str) -> Vec<&str> {
    output
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// Parse bjobs output for a list of ids, returning one state per id in the
/// order requested.
///
/// The rows must line up with `expected` one to one; a short or
/// misattributed answer is rejected as a whole.
pub fn parse_bjobs_output(
    command: &str,
    output: &str,
    expected: &[u64],
) -> SchedResult<Vec<LsfState>> {
    let rows = bjobs_data_rows(output);
    if rows.len() < expected.len() {
        return Err(SchedError::ProtocolMismatch {
            command: command.to_string(),
            message: format!(
                "Expected {} rows, got {}. Output was:\n{}",
                expected.len(),
                rows.len(),
                output
            ),
        });
    }

    expected
        .iter()
        .zip(rows)
        .map(|(&expected_id, row)| {
            let (job_id, state) = parse_bjobs_row(command, row)?;
            if job_id != expected_id {
                return Err(SchedError::ProtocolMismatch {
                    command: command.to_string(),
                    message: format!(
                        "The running job id ({job_id}) doesn't match the job id ({expected_id})"
                    ),
                });
            }
            Ok(state)
        })
        .collect()
}
