//! Flow log bindings and the warnings they may degrade into.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Custom record format (version 5 fields) used for every network flow log.
pub const FLOW_LOG_FORMAT: &str = "${version} ${account-id} ${interface-id} ${srcaddr} ${dstaddr} ${srcport} ${dstport} ${protocol} ${packets} ${bytes} ${start} ${end} ${action} ${log-status} ${vpc-id} ${subnet-id} ${instance-id} ${tcp-flags} ${type} ${pkt-srcaddr} ${pkt-dstaddr} ${region} ${az-id} ${sublocation-type} ${sublocation-id} ${pkt-src-aws-service} ${pkt-dst-aws-service} ${flow-direction} ${traffic-path}";

/// Aggregation window of every network flow log, in seconds.
pub const AGGREGATION_INTERVAL: u16 = 60;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrafficType {
    Accept,
    Reject,
    All,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FlowLog {
    pub logical_id: String,
    pub network: String,
    pub resource_type: String,
    pub traffic_type: TrafficType,
    pub log_destination: String,
    pub log_destination_type: String,
    pub deliver_logs_permission: String,
    pub log_format: String,
    pub max_aggregation_interval: u16,
}

/// Non-fatal problem reported alongside a completed topology.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub component: String,
    pub message: String,
}

impl Warning {
    pub fn new(component: &str, message: impl Into<String>) -> Warning {
        Warning {
            component: component.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.component, self.message)
    }
}
