//! Log sink provisioning.

use super::CollaboratorError;
use serde::{Deserialize, Serialize};

/// Retention values the log service accepts, in days.
const RETENTION_DAYS: [u16; 22] = [
    1, 3, 5, 7, 14, 30, 60, 90, 120, 150, 180, 365, 400, 545, 731, 1096, 1827, 2192, 2557, 2922,
    3288, 3653,
];

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RetentionPolicy {
    pub days: u16,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogSink {
    pub logical_id: String,
    /// Reference the flow logs deliver to.
    pub arn: String,
    pub retention: RetentionPolicy,
}

pub trait LogSinkProvisioner {
    fn provision(&mut self, retention: RetentionPolicy) -> Result<LogSink, CollaboratorError>;
}

#[derive(Debug, Default)]
pub struct DeclarativeLogSinks;

impl LogSinkProvisioner for DeclarativeLogSinks {
    fn provision(&mut self, retention: RetentionPolicy) -> Result<LogSink, CollaboratorError> {
        if !RETENTION_DAYS.contains(&retention.days) {
            return Err(CollaboratorError::Rejected {
                collaborator: "logs".to_string(),
                request: "FlowLogsLogGroup".to_string(),
                reason: format!("unsupported retention of {} days", retention.days),
            });
        }
        let logical_id = "FlowLogsLogGroup".to_string();
        Ok(LogSink {
            arn: crate::plan::attribute_ref(&logical_id, "Arn"),
            logical_id,
            retention,
        })
    }
}
