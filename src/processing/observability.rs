//! Flow logging for every network. Best effort: nothing here fails synthesis.

use crate::config::FlowLogSettings;
use crate::external::{LogSink, LogSinkProvisioner, RetentionPolicy, Role, RoleIssuer, RoleRequest};
use crate::models::{FlowLog, Network, TrafficType, Warning, AGGREGATION_INTERVAL};
use crate::plan::logical_id;

const COMPONENT: &str = "observability";

/// What could be attached, plus a warning for everything that could not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observability {
    pub log_sink: Option<LogSink>,
    pub role: Option<Role>,
    pub flow_logs: Vec<FlowLog>,
    pub warnings: Vec<Warning>,
}

/// Provision the shared sink and delivery role, then bind one flow log per network.
///
/// A collaborator failure leaves every network without a flow log and is
/// reported as a warning.
pub fn attach_observability(
    networks: &[&Network],
    settings: &FlowLogSettings,
    logs: &mut dyn LogSinkProvisioner,
    identity: &mut dyn RoleIssuer,
) -> Observability {
    log::info!("#Start attach_observability() {} networks", networks.len());
    let mut result = Observability::default();

    let sink = match logs.provision(RetentionPolicy {
        days: settings.retention_days,
    }) {
        Ok(sink) => sink,
        Err(e) => {
            log::warn!("log sink unavailable: {e}");
            result.warnings.extend(unlogged(networks, &e.to_string()));
            return result;
        }
    };
    let role = match identity.issue(&RoleRequest::flow_log_role(&sink.arn)) {
        Ok(role) => role,
        Err(e) => {
            log::warn!("flow-log role unavailable: {e}");
            result.warnings.extend(unlogged(networks, &e.to_string()));
            result.log_sink = Some(sink);
            return result;
        }
    };

    let (flow_logs, warnings) = bind_flow_logs(networks, &sink, &role, settings);
    result.flow_logs = flow_logs;
    result.warnings.extend(warnings);
    result.log_sink = Some(sink);
    result.role = Some(role);
    result
}

/// Settings a flow log cannot be bound with: anything but all traffic in
/// 60-second windows.
fn unsupported(settings: &FlowLogSettings) -> Option<String> {
    if settings.traffic_type != TrafficType::All {
        return Some(format!(
            "trafficType {:?} does not capture all traffic",
            settings.traffic_type
        ));
    }
    if settings.max_aggregation_interval != AGGREGATION_INTERVAL {
        return Some(format!(
            "maxAggregationInterval {}s is not {AGGREGATION_INTERVAL}s",
            settings.max_aggregation_interval
        ));
    }
    None
}

/// One flow log per network delivering to `sink` through `role`.
pub fn bind_flow_logs(
    networks: &[&Network],
    sink: &LogSink,
    role: &Role,
    settings: &FlowLogSettings,
) -> (Vec<FlowLog>, Vec<Warning>) {
    if let Some(reason) = unsupported(settings) {
        log::warn!("{reason}");
        return (Vec::new(), unlogged(networks, &reason));
    }

    let flow_logs = networks
        .iter()
        .map(|network| {
            let flow_log = FlowLog {
                logical_id: logical_id(&[network.logical_id.as_str(), "FlowLog"]),
                network: network.logical_id.clone(),
                resource_type: "VPC".to_string(),
                traffic_type: TrafficType::All,
                log_destination: sink.arn.clone(),
                log_destination_type: "cloud-watch-logs".to_string(),
                deliver_logs_permission: role.arn.clone(),
                log_format: settings.log_format.clone(),
                max_aggregation_interval: AGGREGATION_INTERVAL,
            };
            log::debug!("{} -> {}", flow_log.logical_id, flow_log.log_destination);
            flow_log
        })
        .collect();
    (flow_logs, Vec::new())
}

fn unlogged(networks: &[&Network], reason: &str) -> Vec<Warning> {
    networks
        .iter()
        .map(|n| {
            Warning::new(
                COMPONENT,
                format!("{} has no flow log: {reason}", n.logical_id),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{
        CollaboratorError, DeclarativeLogSinks, DeclarativeRoleIssuer,
    };
    use crate::models::{Ipv4, TrafficType, FLOW_LOG_FORMAT};

    fn network(id: &str, cidr: &str) -> Network {
        Network {
            name: id.to_string(),
            logical_id: id.to_string(),
            cidr: Ipv4::new(cidr).unwrap(),
            zones: vec![],
            tiers: vec![],
            enable_dns_hostnames: true,
            enable_dns_support: true,
            internet_gateway: None,
        }
    }

    struct DownLogs;

    impl LogSinkProvisioner for DownLogs {
        fn provision(&mut self, _: RetentionPolicy) -> Result<LogSink, CollaboratorError> {
            Err(CollaboratorError::Unavailable {
                collaborator: "logs".to_string(),
                reason: "throttled".to_string(),
            })
        }
    }

    #[test]
    fn test_one_flow_log_per_network() {
        let a = network("ProviderVPC", "10.10.0.0/24");
        let b = network("ConsumerVPC", "10.11.0.0/24");
        let out = attach_observability(
            &[&a, &b],
            &FlowLogSettings::default(),
            &mut DeclarativeLogSinks,
            &mut DeclarativeRoleIssuer,
        );
        assert!(out.warnings.is_empty());
        assert_eq!(out.flow_logs.len(), 2);
        let log = &out.flow_logs[0];
        assert_eq!(log.logical_id, "ProviderVPCFlowLog");
        assert_eq!(log.traffic_type, TrafficType::All);
        assert_eq!(log.max_aggregation_interval, 60);
        assert_eq!(log.log_destination, "${FlowLogsLogGroup.Arn}");
        assert_eq!(log.deliver_logs_permission, "${FlowLogsIamRole.Arn}");
        assert_eq!(log.log_format, FLOW_LOG_FORMAT);
    }

    #[test]
    fn test_sink_failure_is_a_warning() {
        let a = network("ProviderVPC", "10.10.0.0/24");
        let b = network("ConsumerVPC", "10.11.0.0/24");
        let out = attach_observability(
            &[&a, &b],
            &FlowLogSettings::default(),
            &mut DownLogs,
            &mut DeclarativeRoleIssuer,
        );
        assert!(out.flow_logs.is_empty());
        assert!(out.log_sink.is_none());
        assert_eq!(out.warnings.len(), 2);
        assert!(out.warnings[0].message.contains("throttled"));
        assert_eq!(out.warnings[0].component, "observability");
    }

    #[test]
    fn test_unsupported_interval_is_a_warning() {
        let a = network("ProviderVPC", "10.10.0.0/24");
        let settings = FlowLogSettings {
            max_aggregation_interval: 30,
            ..FlowLogSettings::default()
        };
        let out = attach_observability(
            &[&a],
            &settings,
            &mut DeclarativeLogSinks,
            &mut DeclarativeRoleIssuer,
        );
        assert!(out.flow_logs.is_empty());
        assert_eq!(out.warnings.len(), 1);
        assert!(out.log_sink.is_some());
    }

    #[test]
    fn test_partial_capture_is_a_warning() {
        let a = network("ProviderVPC", "10.10.0.0/24");
        let b = network("ConsumerVPC", "10.11.0.0/24");
        for settings in [
            FlowLogSettings {
                traffic_type: TrafficType::Reject,
                ..FlowLogSettings::default()
            },
            FlowLogSettings {
                traffic_type: TrafficType::Accept,
                ..FlowLogSettings::default()
            },
            FlowLogSettings {
                max_aggregation_interval: 600,
                ..FlowLogSettings::default()
            },
        ] {
            let out = attach_observability(
                &[&a, &b],
                &settings,
                &mut DeclarativeLogSinks,
                &mut DeclarativeRoleIssuer,
            );
            assert!(out.flow_logs.is_empty(), "{settings:?}");
            assert_eq!(out.warnings.len(), 2);
            assert_eq!(out.warnings[0].component, "observability");
        }
    }
}
