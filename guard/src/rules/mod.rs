// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

pub mod errors;
pub mod evaluate;
pub mod model;
pub(crate) mod display;

use std::fmt::Formatter;

use colored::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use errors::Error;
use model::{normalize_rules, Resource, Rule};

pub type Result<R> = std::result::Result<R, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Copy, Serialize)]
pub enum Status {
    PASS,
    FAIL,
}

impl Status {
    pub fn from_compliant(compliant: bool) -> Self {
        if compliant {
            Status::PASS
        } else {
            Status::FAIL
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::PASS => f.write_str(&"PASS".green())?,
            Status::FAIL => f.write_str(&"FAIL".red())?,
        }
        Ok(())
    }
}

/// Parses `content` as JSON, falling back to YAML.
pub(crate) fn read_document<T: DeserializeOwned>(content: &str) -> Result<T> {
    match serde_json::from_str::<T>(content) {
        Ok(value) => Ok(value),
        Err(_) => Ok(serde_yaml::from_str::<T>(content)?),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RulesDocument {
    List(Vec<Rule>),
    Wrapped { rules: Vec<Rule> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ResourcesDocument {
    List(Vec<Resource>),
    Single(Resource),
}

/// Reads a rules document: either a bare list of rules or `{"rules": [...]}`.
/// The rules come back normalized.
pub fn parse_rules(content: &str) -> Result<Vec<Rule>> {
    let rules = match read_document::<RulesDocument>(content)? {
        RulesDocument::List(rules) => rules,
        RulesDocument::Wrapped { rules } => rules,
    };
    normalize_rules(rules)
}

/// Reads one resource or a list of resources.
pub fn parse_resources(content: &str) -> Result<Vec<Resource>> {
    Ok(match read_document::<ResourcesDocument>(content)? {
        ResourcesDocument::List(resources) => resources,
        ResourcesDocument::Single(resource) => vec![resource],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_rules_json_list() -> Result<()> {
        let rules = parse_rules(
            r#"[{"ruleId": "rule-001", "tagKey": "site", "allowedValues": ["us", "en", "us"], "enabled": true}]"#,
        )?;
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].allowed_values, vec!["us", "en"]);
        Ok(())
    }

    #[test]
    fn parse_rules_wrapped_yaml() -> Result<()> {
        let rules = parse_rules(indoc! {r#"
            rules:
              - ruleId: rule-003
                tagKey: cost-center
                allowedValues: []
              - tagKey: owner
                enabled: false
                resourceTypes: [s3:bucket]
                description: Owning team
            count: 2
        "#})?;
        assert_eq!(rules.len(), 2);
        assert!(rules[0].enabled);
        assert_eq!(rules[1].rule_id, "owner");
        assert!(!rules[1].enabled);
        assert_eq!(rules[1].resource_types, vec!["s3:bucket"]);
        assert_eq!(rules[1].description.as_deref(), Some("Owning team"));
        Ok(())
    }

    #[test]
    fn parse_rules_rejects_missing_tag_key() {
        let result = parse_rules(r#"[{"ruleId": "rule-001", "allowedValues": []}]"#);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn parse_rules_tolerates_null_lists() -> Result<()> {
        let rules = parse_rules(r#"[{"tagKey": "site", "allowedValues": null, "resourceTypes": null}]"#)?;
        assert!(rules[0].allowed_values.is_empty());
        assert!(rules[0].resource_types.is_empty());
        Ok(())
    }

    #[test]
    fn parse_resources_accepts_both_tag_forms() -> Result<()> {
        let resources = parse_resources(indoc! {r#"
            [
              {"resourceId": "i-1", "resourceType": "ec2:instance", "tags": {"site": "us"}},
              {"resourceId": "b-1", "resourceType": "s3:bucket", "tags": [{"Key": "site", "Value": "en"}]},
              {"resourceId": "f-1", "resourceType": "lambda:function", "tags": null}
            ]
        "#})?;
        assert_eq!(resources.len(), 3);
        assert_eq!(resources[0].tags.get("site"), Some("us"));
        assert_eq!(resources[1].tags.get("site"), Some("en"));
        assert!(resources[2].tags.is_empty());
        Ok(())
    }

    #[test]
    fn parse_resources_rejects_duplicate_list_keys() {
        let result = parse_resources(
            r#"{"resourceId": "i-1", "resourceType": "ec2:instance", "tags": [{"Key": "a", "Value": "1"}, {"Key": "a", "Value": "2"}]}"#,
        );
        assert!(result.is_err());
    }
}
