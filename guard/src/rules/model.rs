// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;
use std::convert::TryFrom;
use std::fmt::Formatter;

use indexmap::IndexMap;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::rules::errors::Error;
use crate::rules::Result;

fn default_as_true() -> bool {
    true
}

// Stored records and CloudTrail payloads use `null` for "not set" as often as they omit the field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single key/value pair in the AWS list form, `{"Key": "site", "Value": "us"}`.
/// CloudTrail payloads spell the fields in lowercase, which is accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(rename = "Key", alias = "key")]
    pub key: String,
    #[serde(rename = "Value", alias = "value", default, deserialize_with = "null_as_default")]
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Tag {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// The tag set of one resource. Keys are case-sensitive and unique, insertion order is kept
/// so reports list tags the way the resource declared them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tags(IndexMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Tags::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl TryFrom<Vec<Tag>> for Tags {
    type Error = Error;

    fn try_from(list: Vec<Tag>) -> Result<Self> {
        let mut tags = Tags::new();
        for Tag { key, value } in list {
            if tags.contains_key(&key) {
                return Err(Error::invalid_input(duplicate_key(&key)));
            }
            tags.insert(key, value);
        }
        Ok(tags)
    }
}

fn duplicate_key(key: &str) -> String {
    format!("tag key `{key}` appears more than once")
}

// Tags come either as a map or as the AWS `[{Key, Value}]` list. Both forms reject a
// repeated key instead of letting one value shadow the other.
struct TagsVisitor;

impl<'de> Visitor<'de> for TagsVisitor {
    type Value = Tags;

    fn expecting(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("a map of tag keys to values or a list of {Key, Value} pairs")
    }

    fn visit_map<A>(self, mut access: A) -> std::result::Result<Tags, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut tags = Tags::new();
        while let Some((key, value)) = access.next_entry::<String, String>()? {
            if tags.contains_key(&key) {
                return Err(de::Error::custom(duplicate_key(&key)));
            }
            tags.insert(key, value);
        }
        Ok(tags)
    }

    fn visit_seq<A>(self, mut access: A) -> std::result::Result<Tags, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut list = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(tag) = access.next_element::<Tag>()? {
            list.push(tag);
        }
        Tags::try_from(list).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for Tags {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(TagsVisitor)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Tags(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A compliance rule requiring `tag_key` on a resource, optionally constrained to
/// `allowed_values` and to a set of `resource_types`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(default, deserialize_with = "null_as_default")]
    pub rule_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag_key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub allowed_values: Vec<String>,
    #[serde(default = "default_as_true")]
    pub enabled: bool,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub resource_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Rule {
    pub fn new(rule_id: impl Into<String>, tag_key: impl Into<String>) -> Self {
        Rule {
            rule_id: rule_id.into(),
            tag_key: tag_key.into(),
            allowed_values: vec![],
            enabled: true,
            resource_types: vec![],
            description: None,
        }
    }

    pub fn with_allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_resource_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// `true` when the rule has no resource type constraint or names `resource_type`.
    pub fn applies_to(&self, resource_type: &str) -> bool {
        self.resource_types.is_empty() || self.resource_types.iter().any(|t| t == resource_type)
    }

    /// Validates a rule read from a store and fills in what the store may leave out.
    /// The rule id falls back to the tag key and duplicate allowed values are dropped,
    /// first occurrence wins.
    pub fn normalized(mut self) -> Result<Rule> {
        if self.tag_key.is_empty() {
            return Err(Error::invalid_input(format!(
                "rule `{}` has an empty tagKey",
                self.rule_id
            )));
        }
        if self.rule_id.is_empty() {
            self.rule_id = self.tag_key.clone();
        }
        let mut seen = HashSet::with_capacity(self.allowed_values.len());
        self.allowed_values.retain(|value| seen.insert(value.clone()));
        Ok(self)
    }
}

/// Store-read boundary for rules, see [`Rule::normalized`].
pub fn normalize_rules(rules: Vec<Rule>) -> Result<Vec<Rule>> {
    rules
        .into_iter()
        .enumerate()
        .map(|(position, rule)| {
            if rule.tag_key.is_empty() && rule.rule_id.is_empty() {
                return Err(Error::invalid_input(format!(
                    "rule at position {position} has an empty tagKey"
                )));
            }
            rule.normalized()
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(default, deserialize_with = "null_as_default")]
    pub resource_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resource_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub region: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub account_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Tags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_arn: Option<String>,
}

impl Resource {
    pub fn new(resource_id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Resource {
            resource_id: resource_id.into(),
            resource_type: resource_type.into(),
            region: String::default(),
            account_id: String::default(),
            tags: Tags::default(),
            resource_arn: None,
        }
    }

    pub fn in_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn in_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = account_id.into();
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key, value);
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    /// Keeps the ARN when the creating call reported one; an empty ARN is dropped.
    pub fn with_arn(mut self, arn: impl Into<String>) -> Self {
        let arn = arn.into();
        self.resource_arn = (!arn.is_empty()).then_some(arn);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    Missing,
    InvalidValue,
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationKind::Missing => f.write_str("MISSING"),
            ViolationKind::InvalidValue => f.write_str("INVALID_VALUE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub rule_id: String,
    pub tag_key: String,
    pub kind: ViolationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<String>,
    pub allowed_values: Vec<String>,
}

impl Violation {
    pub(crate) fn missing(rule: &Rule) -> Self {
        Violation {
            rule_id: rule.rule_id.clone(),
            tag_key: rule.tag_key.clone(),
            kind: ViolationKind::Missing,
            actual_value: None,
            allowed_values: rule.allowed_values.clone(),
        }
    }

    pub(crate) fn invalid_value(rule: &Rule, actual: &str) -> Self {
        Violation {
            rule_id: rule.rule_id.clone(),
            tag_key: rule.tag_key.clone(),
            kind: ViolationKind::InvalidValue,
            actual_value: Some(actual.to_string()),
            allowed_values: rule.allowed_values.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub resource_id: String,
    pub resource_type: String,
    pub region: String,
    pub account_id: String,
    pub compliant: bool,
    pub violations: Vec<Violation>,
    pub rules_evaluated: usize,
    pub rules_supplied: usize,
}

impl ComplianceReport {
    pub fn missing_tags(&self) -> Vec<&str> {
        self.violations
            .iter()
            .filter(|v| v.kind == ViolationKind::Missing)
            .map(|v| v.tag_key.as_str())
            .collect()
    }

    pub fn invalid_values(&self) -> Vec<&Violation> {
        self.violations
            .iter()
            .filter(|v| v.kind == ViolationKind::InvalidValue)
            .collect()
    }
}
