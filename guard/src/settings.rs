// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Deployment settings for the compliance checker and the EventBridge pattern that routes
//! resource creation events to it. None of this changes how rules are evaluated.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::events::{DETAIL_TYPE, SUPPORTED_EVENT_SOURCES};
use crate::rules::errors::Error;
use crate::rules::{read_document, Result};

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_MODEL_ID: &str = "amazon.nova-2-lite-v1:0";
pub const DEFAULT_RULES_TABLE: &str = "TagComplianceRules";
pub const DEFAULT_EVENT_BUS: &str = "tag-compliance-events";
pub const EVENT_NAME_PREFIXES: [&str; 3] = ["Create", "Run", "Put"];
pub const EXTRA_EVENT_NAMES: [&str; 1] = ["AllocateAddress"];

const MEMORY_RANGE: RangeInclusive<u32> = 128..=10240;
const TIMEOUT_RANGE: RangeInclusive<u32> = 1..=900;
const EVENT_BUS_ARN_PREFIX: &str = "arn:aws:events:";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LambdaArchitecture {
    #[default]
    #[serde(rename = "arm64")]
    Arm64,
    #[serde(rename = "x86_64")]
    X86_64,
}

/// Where this deployment sits in a multi-account setup. A hub runs the checker on a custom
/// event bus, spokes forward their creation events to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum DeploymentRole {
    #[default]
    Standalone,
    #[serde(rename_all = "camelCase")]
    Hub {
        #[serde(default)]
        spoke_account_ids: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Spoke {
        hub_account_id: String,
        hub_region: String,
        hub_event_bus_arn: String,
    },
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

fn default_memory() -> u32 {
    512
}

fn default_timeout() -> u32 {
    60
}

fn default_rules_table() -> String {
    DEFAULT_RULES_TABLE.to_string()
}

fn default_event_bus() -> String {
    DEFAULT_EVENT_BUS.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSettings {
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_model_id")]
    pub bedrock_model_id: String,
    #[serde(default)]
    pub lambda_architecture: LambdaArchitecture,
    #[serde(default = "default_memory")]
    pub lambda_memory: u32,
    #[serde(default = "default_timeout")]
    pub lambda_timeout: u32,
    #[serde(default = "default_rules_table")]
    pub rules_table_name: String,
    #[serde(default = "default_event_bus")]
    pub event_bus_name: String,
    #[serde(default)]
    pub role: DeploymentRole,
}

impl Default for DeploymentSettings {
    fn default() -> Self {
        DeploymentSettings {
            region: default_region(),
            bedrock_model_id: default_model_id(),
            lambda_architecture: LambdaArchitecture::default(),
            lambda_memory: default_memory(),
            lambda_timeout: default_timeout(),
            rules_table_name: default_rules_table(),
            event_bus_name: default_event_bus(),
            role: DeploymentRole::default(),
        }
    }
}

fn is_account_id(id: &str) -> bool {
    id.len() == 12 && id.chars().all(|c| c.is_ascii_digit())
}

fn check_account_id(field: &str, id: &str) -> Result<()> {
    if is_account_id(id) {
        Ok(())
    } else {
        Err(Error::invalid_input(format!(
            "{field} `{id}` is not a 12 digit account id"
        )))
    }
}

impl DeploymentSettings {
    /// Reads settings from YAML or JSON, filling defaults for anything left out.
    pub fn from_document(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(DeploymentSettings::default());
        }
        read_document(content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.region.is_empty() {
            return Err(Error::invalid_input("region must not be empty"));
        }
        if self.rules_table_name.is_empty() {
            return Err(Error::invalid_input("rulesTableName must not be empty"));
        }
        if !MEMORY_RANGE.contains(&self.lambda_memory) {
            return Err(Error::invalid_input(format!(
                "lambdaMemory {} outside of {}..={} MB",
                self.lambda_memory,
                MEMORY_RANGE.start(),
                MEMORY_RANGE.end()
            )));
        }
        if !TIMEOUT_RANGE.contains(&self.lambda_timeout) {
            return Err(Error::invalid_input(format!(
                "lambdaTimeout {} outside of {}..={} seconds",
                self.lambda_timeout,
                TIMEOUT_RANGE.start(),
                TIMEOUT_RANGE.end()
            )));
        }

        match &self.role {
            DeploymentRole::Standalone => Ok(()),
            DeploymentRole::Hub { spoke_account_ids } => {
                if self.event_bus_name.is_empty() {
                    return Err(Error::invalid_input("a hub needs an eventBusName"));
                }
                spoke_account_ids
                    .iter()
                    .try_for_each(|id| check_account_id("spokeAccountIds", id))
            }
            DeploymentRole::Spoke {
                hub_account_id,
                hub_region,
                hub_event_bus_arn,
            } => {
                check_account_id("hubAccountId", hub_account_id)?;
                if hub_region.is_empty() {
                    return Err(Error::invalid_input("a spoke needs a hubRegion"));
                }
                if !hub_event_bus_arn.starts_with(EVENT_BUS_ARN_PREFIX) {
                    return Err(Error::invalid_input(format!(
                        "hubEventBusArn `{hub_event_bus_arn}` is not an event bus ARN"
                    )));
                }
                Ok(())
            }
        }
    }

    /// The EventBridge pattern matching the creation events the extractor understands.
    /// Hub, spoke and standalone deployments all match on the same pattern.
    pub fn event_pattern(&self) -> Value {
        let sources = SUPPORTED_EVENT_SOURCES
            .iter()
            .map(|source| {
                let service = source.trim_end_matches(".amazonaws.com");
                format!("aws.{service}")
            })
            .collect::<Vec<_>>();

        let mut event_names = EVENT_NAME_PREFIXES
            .iter()
            .map(|prefix| json!({ "prefix": prefix }))
            .collect::<Vec<_>>();
        event_names.extend(EXTRA_EVENT_NAMES.iter().map(|name| json!(name)));

        json!({
            "source": sources,
            "detail-type": [DETAIL_TYPE],
            "detail": {
                "eventSource": SUPPORTED_EVENT_SOURCES,
                "eventName": event_names,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_yields_defaults() -> Result<()> {
        let settings = DeploymentSettings::from_document("")?;
        assert_eq!(settings, DeploymentSettings::default());
        assert_eq!(settings.lambda_architecture, LambdaArchitecture::Arm64);
        assert_eq!(settings.lambda_memory, 512);
        assert_eq!(settings.lambda_timeout, 60);
        settings.validate()
    }

    #[test]
    fn hub_settings_from_yaml() -> Result<()> {
        let settings = DeploymentSettings::from_document(indoc! {r#"
            region: eu-west-1
            lambdaArchitecture: x86_64
            lambdaMemory: 1024
            role:
              mode: hub
              spokeAccountIds: ["111111111111", "222222222222"]
        "#})?;

        assert_eq!(settings.region, "eu-west-1");
        assert_eq!(settings.lambda_architecture, LambdaArchitecture::X86_64);
        assert_eq!(
            settings.role,
            DeploymentRole::Hub {
                spoke_account_ids: vec!["111111111111".to_string(), "222222222222".to_string()]
            }
        );
        assert_eq!(settings.event_bus_name, DEFAULT_EVENT_BUS);
        settings.validate()
    }

    #[test]
    fn spoke_settings_from_json() -> Result<()> {
        let settings = DeploymentSettings::from_document(
            r#"{"role": {"mode": "spoke", "hubAccountId": "123456789012", "hubRegion": "us-east-1",
                "hubEventBusArn": "arn:aws:events:us-east-1:123456789012:event-bus/tag-compliance-events"}}"#,
        )?;
        settings.validate()
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let settings = DeploymentSettings {
            lambda_memory: 64,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(Error::InvalidInput(_))));

        let settings = DeploymentSettings {
            lambda_timeout: 901,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn malformed_accounts_are_rejected() {
        let hub = DeploymentSettings {
            role: DeploymentRole::Hub {
                spoke_account_ids: vec!["12345".to_string()],
            },
            ..Default::default()
        };
        assert!(matches!(hub.validate(), Err(Error::InvalidInput(_))));

        let spoke = DeploymentSettings {
            role: DeploymentRole::Spoke {
                hub_account_id: "123456789012".to_string(),
                hub_region: "us-east-1".to_string(),
                hub_event_bus_arn: "arn:aws:sns:us-east-1:123456789012:topic".to_string(),
            },
            ..Default::default()
        };
        assert!(matches!(spoke.validate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn event_pattern_matches_creation_events() {
        let pattern = DeploymentSettings::default().event_pattern();

        assert_eq!(
            pattern,
            json!({
                "source": ["aws.ec2", "aws.s3", "aws.rds", "aws.lambda", "aws.elasticloadbalancing", "aws.autoscaling"],
                "detail-type": ["AWS API Call via CloudTrail"],
                "detail": {
                    "eventSource": [
                        "ec2.amazonaws.com",
                        "s3.amazonaws.com",
                        "rds.amazonaws.com",
                        "lambda.amazonaws.com",
                        "elasticloadbalancing.amazonaws.com",
                        "autoscaling.amazonaws.com"
                    ],
                    "eventName": [
                        {"prefix": "Create"},
                        {"prefix": "Run"},
                        {"prefix": "Put"},
                        "AllocateAddress"
                    ]
                }
            })
        );
    }
}
