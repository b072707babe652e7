// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

pub mod commands;
pub mod events;
pub mod notify;
pub mod rules;
pub mod settings;
pub mod store;
pub mod utils;

pub use crate::rules::errors::Error;
pub use crate::rules::evaluate::{applicable_rules, evaluate};
pub use crate::rules::model::{
    normalize_rules, ComplianceReport, Resource, Rule, Tag, Tags, Violation, ViolationKind,
};
pub use crate::rules::Result;

/// Checks the resource(s) in `resource` against the rule document in `rules`, both JSON or
/// YAML, and returns the reports as pretty printed JSON. A single resource yields a single
/// report object, a list of resources a list of reports.
pub fn run_checks(resource: &str, rules: &str) -> Result<String> {
    let rules = rules::parse_rules(rules)?;
    let single = rules::read_document::<serde_json::Value>(resource)?.is_object();
    let reports = rules::parse_resources(resource)?
        .iter()
        .map(|resource| evaluate(resource, &rules))
        .collect::<Result<Vec<_>>>()?;

    Ok(match reports.as_slice() {
        [report] if single => serde_json::to_string_pretty(report)?,
        _ => serde_json::to_string_pretty(&reports)?,
    })
}
