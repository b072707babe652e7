// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::operation::scan::builders::ScanFluentBuilder;
use aws_sdk_dynamodb::Client;
use log::{debug, info};
use tag_guard::{normalize_rules, Error, Result, Rule};

use crate::handler::RuleSource;

// items without the attribute are enabled
const ENABLED_FILTER: &str = "attribute_not_exists(enabled) OR enabled = :enabled";
const ENABLED_VALUE: &str = ":enabled";

/// Rules kept as items of a DynamoDB table, one item per rule.
#[derive(Debug, Clone)]
pub struct DynamoDbRuleStore {
    client: Client,
    table_name: String,
}

impl DynamoDbRuleStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        DynamoDbRuleStore {
            client,
            table_name: table_name.into(),
        }
    }

    fn scan(&self, start_key: Option<HashMap<String, AttributeValue>>) -> ScanFluentBuilder {
        self.client
            .scan()
            .table_name(&self.table_name)
            .filter_expression(ENABLED_FILTER)
            .expression_attribute_values(ENABLED_VALUE, AttributeValue::Bool(true))
            .set_exclusive_start_key(start_key)
    }

    /// Scans the table for enabled rules, following pagination until the last page.
    pub async fn enabled_rules(&self) -> Result<Vec<Rule>> {
        let mut rules = Vec::new();
        let mut start_key = None;
        loop {
            let page = self
                .scan(start_key)
                .send()
                .await
                .map_err(|err| Error::RuleStore(err.to_string()))?;

            for item in page.items() {
                rules.push(rule_from_item(item)?);
            }

            start_key = page.last_evaluated_key;
            if start_key.is_none() {
                break;
            }
            debug!("Continuing scan of {} after {} rules", self.table_name, rules.len());
        }

        info!("Loaded {} enabled rules from {}", rules.len(), self.table_name);
        normalize_rules(rules)
    }
}

#[async_trait]
impl RuleSource for DynamoDbRuleStore {
    async fn rules(&self) -> Result<Vec<Rule>> {
        self.enabled_rules().await
    }
}

fn string_attribute(item: &HashMap<String, AttributeValue>, name: &str) -> Result<Option<String>> {
    match item.get(name) {
        None | Some(AttributeValue::Null(_)) => Ok(None),
        Some(AttributeValue::S(value)) => Ok(Some(value.clone())),
        Some(_) => Err(Error::InvalidInput(format!(
            "rule attribute `{name}` must be a string"
        ))),
    }
}

fn string_list_attribute(item: &HashMap<String, AttributeValue>, name: &str) -> Result<Vec<String>> {
    match item.get(name) {
        None | Some(AttributeValue::Null(_)) => Ok(vec![]),
        Some(AttributeValue::Ss(values)) => Ok(values.clone()),
        Some(AttributeValue::L(values)) => values
            .iter()
            .map(|value| match value {
                AttributeValue::S(value) => Ok(value.clone()),
                _ => Err(Error::InvalidInput(format!(
                    "rule attribute `{name}` must only contain strings"
                ))),
            })
            .collect(),
        Some(_) => Err(Error::InvalidInput(format!(
            "rule attribute `{name}` must be a list of strings"
        ))),
    }
}

/// Converts one table item into a [`Rule`]. The item must carry a string `tagKey`,
/// `enabled` defaults to true when absent.
pub fn rule_from_item(item: &HashMap<String, AttributeValue>) -> Result<Rule> {
    let tag_key = string_attribute(item, "tagKey")?
        .ok_or_else(|| Error::InvalidInput("rule item has no tagKey".to_string()))?;

    let enabled = match item.get("enabled") {
        None | Some(AttributeValue::Null(_)) => true,
        Some(AttributeValue::Bool(enabled)) => *enabled,
        Some(_) => {
            return Err(Error::InvalidInput(format!(
                "rule attribute `enabled` of tag `{tag_key}` must be a boolean"
            )))
        }
    };

    Ok(Rule {
        rule_id: string_attribute(item, "ruleId")?.unwrap_or_default(),
        tag_key,
        allowed_values: string_list_attribute(item, "allowedValues")?,
        enabled,
        resource_types: string_list_attribute(item, "resourceTypes")?,
        description: string_attribute(item, "description")?,
    })
}
