//! Topology configuration.
//!
//! Defaults reproduce the reference deployment: a provider and a consumer
//! `/24` network, each with a Public and an Isolated `/28` tier in two zones,
//! exposing TCP port 80.

use crate::error::{Result, TopologyError};
use crate::plan::logical_id;
use crate::models::{
    Ipv4, ServicePort, TierType, TrafficType, AGGREGATION_INTERVAL, FLOW_LOG_FORMAT,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable consulted when `account` is not configured.
pub const ACCOUNT_ENV: &str = "CDK_DEFAULT_ACCOUNT";
/// Environment variable consulted when `region` is not configured.
pub const REGION_ENV: &str = "CDK_DEFAULT_REGION";

pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TierSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub tier_type: TierType,
    pub cidr_mask: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    pub name: String,
    pub cidr: Ipv4,
    #[serde(default = "default_tiers")]
    pub tiers: Vec<TierSpec>,
}

fn default_tiers() -> Vec<TierSpec> {
    vec![
        TierSpec {
            name: "Public".to_string(),
            tier_type: TierType::Public,
            cidr_mask: 28,
        },
        TierSpec {
            name: "Isolated".to_string(),
            tier_type: TierType::Isolated,
            cidr_mask: 28,
        },
    ]
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct FlowLogSettings {
    pub retention_days: u16,
    pub max_aggregation_interval: u16,
    pub traffic_type: TrafficType,
    pub log_format: String,
}

impl Default for FlowLogSettings {
    fn default() -> Self {
        FlowLogSettings {
            retention_days: 7,
            max_aggregation_interval: AGGREGATION_INTERVAL,
            traffic_type: TrafficType::All,
            log_format: FLOW_LOG_FORMAT.to_string(),
        }
    }
}

/// Recognized options: `{cidr, tiers[], azCount, servicePort, allowedPrincipals[]}`
/// per network pair, plus the pass-through settings of the collaborators.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct TopologyConfig {
    pub account: Option<String>,
    pub region: Option<String>,
    pub provider: NetworkSpec,
    pub consumer: NetworkSpec,
    pub az_count: u8,
    /// Kept wide so out-of-range values reach validation as `InvalidPort`.
    pub service_port: u32,
    pub allowed_principals: Vec<String>,
    /// Fixed to false by default: targets see the load balancer's private
    /// address, which is what the security-group source ranges assume.
    pub preserve_client_ip: bool,
    pub instance_type: String,
    /// Reference to the bootstrap script run by the target instance.
    pub bootstrap_script: Option<String>,
    pub flow_log: FlowLogSettings,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        TopologyConfig {
            account: None,
            region: None,
            provider: NetworkSpec {
                name: "Provider VPC".to_string(),
                cidr: Ipv4 {
                    addr: std::net::Ipv4Addr::new(10, 10, 0, 0),
                    mask: 24,
                },
                tiers: default_tiers(),
            },
            consumer: NetworkSpec {
                name: "Consumer VPC".to_string(),
                cidr: Ipv4 {
                    addr: std::net::Ipv4Addr::new(10, 11, 0, 0),
                    mask: 24,
                },
                tiers: default_tiers(),
            },
            az_count: 2,
            service_port: 80,
            allowed_principals: vec![],
            preserve_client_ip: false,
            instance_type: "t3.micro".to_string(),
            bootstrap_script: Some("src/ec2/user_data_provider_ec2_instance.sh".to_string()),
            flow_log: FlowLogSettings::default(),
        }
    }
}

impl TopologyConfig {
    /// Fill `account`/`region` from the environment when the file left them out.
    pub fn with_environment(mut self) -> Self {
        if self.account.is_none() {
            self.account = std::env::var(ACCOUNT_ENV).ok().filter(|a| !a.is_empty());
        }
        if self.region.is_none() {
            self.region = std::env::var(REGION_ENV).ok().filter(|r| !r.is_empty());
        }
        self
    }

    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }

    pub fn service_port(&self) -> Result<ServicePort> {
        ServicePort::new(self.service_port)
    }

    /// Configured principals, or the owning account root when none are given.
    pub fn allowed_principals(&self) -> Result<Vec<String>> {
        if !self.allowed_principals.is_empty() {
            return Ok(self.allowed_principals.clone());
        }
        match &self.account {
            Some(account) => Ok(vec![format!("arn:aws:iam::{account}:root")]),
            None => Err(TopologyError::InvalidConfig(format!(
                "no allowedPrincipals and no account (set {ACCOUNT_ENV})"
            ))),
        }
    }

    /// Checks everything that can be checked before planning starts.
    pub fn validate(&self) -> Result<()> {
        self.service_port()?;

        if !(1..=26).contains(&self.az_count) {
            return Err(TopologyError::InvalidConfig(format!(
                "azCount {} must be within 1-26",
                self.az_count
            )));
        }

        for network in [&self.provider, &self.consumer] {
            if network.name.trim().is_empty() {
                return Err(TopologyError::InvalidConfig(
                    "network name must not be empty".to_string(),
                ));
            }
            if network.tiers.is_empty() {
                return Err(TopologyError::InvalidConfig(format!(
                    "{} declares no subnet tiers",
                    network.name
                )));
            }
            // tiers are told apart by logical id, so "Public" and "public" collide
            if let Some(dup) = network
                .tiers
                .iter()
                .map(|t| logical_id(&[t.name.as_str()]))
                .duplicates()
                .next()
            {
                return Err(TopologyError::InvalidConfig(format!(
                    "{} declares tier '{dup}' twice",
                    network.name
                )));
            }
            if network.tiers.iter().any(|t| logical_id(&[t.name.as_str()]).is_empty()) {
                return Err(TopologyError::InvalidConfig(format!(
                    "{} declares a tier without a usable name",
                    network.name
                )));
            }
        }

        let provider_id = logical_id(&[self.provider.name.as_str()]);
        let consumer_id = logical_id(&[self.consumer.name.as_str()]);
        if provider_id.is_empty() || consumer_id.is_empty() || provider_id == consumer_id {
            return Err(TopologyError::InvalidConfig(format!(
                "provider '{}' and consumer '{}' need distinct logical ids",
                self.provider.name, self.consumer.name
            )));
        }

        if self.instance_type.trim().is_empty() {
            return Err(TopologyError::InvalidConfig(
                "instanceType must not be empty".to_string(),
            ));
        }

        self.allowed_principals()?;
        Ok(())
    }
}

/// Parse a configuration document, reporting the JSON path of any error.
pub fn parse_config(json: &str) -> Result<TopologyConfig> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        TopologyError::Config(format!("path={} error={}", e.path(), e.inner()))
    })
}

/// Read the configuration file, or fall back to defaults when none is given.
pub fn load_config(config_file: Option<&str>) -> Result<TopologyConfig> {
    let config = match config_file {
        Some(file) => {
            if !Path::new(file).exists() {
                return Err(TopologyError::Config(format!(
                    "Config file does not exist: {file}"
                )));
            }
            log::info!("Reading topology config: {file}");
            let json = std::fs::read_to_string(file)?;
            parse_config(&json)?
        }
        None => {
            log::info!("No config file given, using default topology");
            TopologyConfig::default()
        }
    };
    Ok(config.with_environment())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TopologyConfig {
        TopologyConfig {
            account: Some("111122223333".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let cfg = config();
        cfg.validate().unwrap();
        assert_eq!(cfg.service_port().unwrap().get(), 80);
        assert_eq!(
            cfg.allowed_principals().unwrap(),
            vec!["arn:aws:iam::111122223333:root".to_string()]
        );
        assert!(!cfg.preserve_client_ip);
        assert_eq!(cfg.flow_log.max_aggregation_interval, 60);
    }

    #[test]
    fn test_invalid_port_caught_first() {
        let cfg = TopologyConfig {
            service_port: 0,
            az_count: 0,
            ..config()
        };
        assert_eq!(cfg.validate(), Err(TopologyError::InvalidPort(0)));
    }

    #[test]
    fn test_missing_principals_and_account() {
        let cfg = TopologyConfig::default();
        assert!(matches!(
            cfg.validate(),
            Err(TopologyError::InvalidConfig(_))
        ));
        let cfg = TopologyConfig {
            allowed_principals: vec!["arn:aws:iam::999:root".to_string()],
            ..TopologyConfig::default()
        };
        cfg.validate().unwrap();
    }

    #[test]
    fn test_duplicate_tier_rejected() {
        let mut cfg = config();
        cfg.consumer.tiers.push(cfg.consumer.tiers[0].clone());
        assert!(matches!(
            cfg.validate(),
            Err(TopologyError::InvalidConfig(msg)) if msg.contains("'Public' twice")
        ));
    }

    #[test]
    fn test_tiers_differing_in_case_rejected() {
        let mut cfg = config();
        cfg.provider.tiers[1].name = "public".to_string();
        assert!(matches!(
            cfg.validate(),
            Err(TopologyError::InvalidConfig(msg)) if msg.contains("'Public' twice")
        ));
    }

    #[test]
    fn test_network_names_with_same_logical_id_rejected() {
        let mut cfg = config();
        cfg.provider.name = "shared-vpc".to_string();
        cfg.consumer.name = "Shared Vpc".to_string();
        assert!(matches!(
            cfg.validate(),
            Err(TopologyError::InvalidConfig(msg)) if msg.contains("distinct logical ids")
        ));
    }

    #[test]
    fn test_parse_partial_document() {
        let cfg = parse_config(
            r#"{
                "account": "111122223333",
                "provider": { "name": "svc", "cidr": "10.20.0.0/16" },
                "azCount": 3,
                "servicePort": 443
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.provider.cidr, Ipv4::new("10.20.0.0/16").unwrap());
        assert_eq!(cfg.provider.tiers.len(), 2);
        assert_eq!(cfg.consumer.name, "Consumer VPC");
        assert_eq!(cfg.az_count, 3);
        assert_eq!(cfg.service_port, 443);
        assert_eq!(cfg.flow_log.retention_days, 7);
    }

    #[test]
    fn test_parse_error_reports_path() {
        let err = parse_config(r#"{ "consumer": { "name": "c", "cidr": "10.11.0.0/40" } }"#)
            .unwrap_err();
        match err {
            TopologyError::Config(msg) => assert!(msg.contains("consumer.cidr"), "{msg}"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_parse_tier_type() {
        let cfg = parse_config(
            r#"{ "provider": { "name": "p", "cidr": "10.10.0.0/24",
                 "tiers": [ { "name": "Data", "type": "Isolated", "cidrMask": 27 } ] } }"#,
        )
        .unwrap();
        assert_eq!(cfg.provider.tiers[0].tier_type, TierType::Isolated);
        assert_eq!(cfg.provider.tiers[0].cidr_mask, 27);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_config(Some("does/not/exist.json")),
            Err(TopologyError::Config(_))
        ));
    }
}
