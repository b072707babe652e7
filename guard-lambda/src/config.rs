// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::str::FromStr;

use log::LevelFilter;
use tag_guard::settings::{DEFAULT_MODEL_ID, DEFAULT_REGION, DEFAULT_RULES_TABLE};
use tag_guard::{Error, Result};

pub const RULES_TABLE_NAME: &str = "RULES_TABLE_NAME";
pub const SNS_TOPIC_ARN: &str = "SNS_TOPIC_ARN";
pub const REPORT_BUCKET: &str = "REPORT_BUCKET";
pub const AWS_REGION: &str = "AWS_REGION";
pub const LOG_LEVEL: &str = "LOG_LEVEL";
pub const BEDROCK_MODEL_ID: &str = "BEDROCK_MODEL_ID";

/// Function configuration, read from the environment the function is deployed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaConfig {
    pub rules_table_name: String,
    pub sns_topic_arn: Option<String>,
    pub report_bucket: Option<String>,
    pub region: String,
    pub log_level: LevelFilter,
    /// Carried for the deployment record only, the checker does not call a model.
    pub bedrock_model_id: String,
}

fn parse_level(level: &str) -> Result<LevelFilter> {
    match level.to_ascii_uppercase().as_str() {
        "WARNING" => Ok(LevelFilter::Warn),
        "CRITICAL" | "FATAL" => Ok(LevelFilter::Error),
        other => LevelFilter::from_str(other).map_err(|_| {
            Error::IllegalArguments(format!("{LOG_LEVEL} `{level}` is not a log level"))
        }),
    }
}

impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from `lookup`. Unset and empty variables are treated alike.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let or_default = |name: &str, default: &str| var(name).unwrap_or_else(|| default.to_string());

        Ok(LambdaConfig {
            rules_table_name: or_default(RULES_TABLE_NAME, DEFAULT_RULES_TABLE),
            sns_topic_arn: var(SNS_TOPIC_ARN),
            report_bucket: var(REPORT_BUCKET),
            region: or_default(AWS_REGION, DEFAULT_REGION),
            log_level: match var(LOG_LEVEL) {
                Some(level) => parse_level(&level)?,
                None => LevelFilter::Info,
            },
            bedrock_model_id: or_default(BEDROCK_MODEL_ID, DEFAULT_MODEL_ID),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() -> Result<()> {
        let config = LambdaConfig::from_lookup(lookup(&[]))?;
        assert_eq!(
            config,
            LambdaConfig {
                rules_table_name: "TagComplianceRules".to_string(),
                sns_topic_arn: None,
                report_bucket: None,
                region: "us-east-1".to_string(),
                log_level: LevelFilter::Info,
                bedrock_model_id: "amazon.nova-2-lite-v1:0".to_string(),
            }
        );
        Ok(())
    }

    #[test]
    fn values_from_environment() -> Result<()> {
        let config = LambdaConfig::from_lookup(lookup(&[
            (RULES_TABLE_NAME, "TeamRules"),
            (SNS_TOPIC_ARN, "arn:aws:sns:eu-west-1:123456789012:tag-alerts"),
            (REPORT_BUCKET, "compliance-reports"),
            (AWS_REGION, "eu-west-1"),
            (LOG_LEVEL, "DEBUG"),
        ]))?;
        assert_eq!(config.rules_table_name, "TeamRules");
        assert_eq!(
            config.sns_topic_arn.as_deref(),
            Some("arn:aws:sns:eu-west-1:123456789012:tag-alerts")
        );
        assert_eq!(config.report_bucket.as_deref(), Some("compliance-reports"));
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.log_level, LevelFilter::Debug);
        Ok(())
    }

    #[test]
    fn empty_topic_counts_as_unset() -> Result<()> {
        let config = LambdaConfig::from_lookup(lookup(&[(SNS_TOPIC_ARN, "  ")]))?;
        assert_eq!(config.sns_topic_arn, None);
        Ok(())
    }

    #[rstest]
    #[case("info", LevelFilter::Info)]
    #[case("WARNING", LevelFilter::Warn)]
    #[case("CRITICAL", LevelFilter::Error)]
    #[case("trace", LevelFilter::Trace)]
    fn log_levels(#[case] level: &str, #[case] expected: LevelFilter) -> Result<()> {
        let config = LambdaConfig::from_lookup(lookup(&[(LOG_LEVEL, level)]))?;
        assert_eq!(config.log_level, expected);
        Ok(())
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let result = LambdaConfig::from_lookup(lookup(&[(LOG_LEVEL, "LOUD")]));
        assert!(matches!(result, Err(Error::IllegalArguments(_))));
    }
}
