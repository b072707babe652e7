// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::rules::errors::Error;
use crate::rules::model::{ComplianceReport, Resource, Rule, Violation};
use crate::rules::Result;

/// Rules that govern a resource of `resource_type`: enabled, and either unconstrained by
/// type or naming this type. Input order is preserved.
pub fn applicable_rules<'r>(
    resource_type: &'r str,
    rules: &'r [Rule],
) -> impl Iterator<Item = &'r Rule> + 'r {
    rules
        .iter()
        .filter(move |rule| rule.enabled && rule.applies_to(resource_type))
}

fn check_inputs(resource: &Resource, rules: &[Rule]) -> Result<()> {
    if resource.resource_id.is_empty() {
        return Err(Error::invalid_input(format!(
            "resource of type `{}` has an empty resourceId",
            resource.resource_type
        )));
    }
    if resource.resource_type.is_empty() {
        return Err(Error::invalid_input(format!(
            "resource `{}` has an empty resourceType",
            resource.resource_id
        )));
    }
    // disabled rules are validated too, a malformed record is a data problem either way
    if let Some((position, rule)) = rules
        .iter()
        .enumerate()
        .find(|(_, rule)| rule.tag_key.is_empty())
    {
        return Err(Error::invalid_input(format!(
            "rule `{}` at position {position} has an empty tagKey",
            rule.rule_id
        )));
    }
    Ok(())
}

fn check_rule(resource: &Resource, rule: &Rule) -> Option<Violation> {
    match resource.tags.get(&rule.tag_key) {
        None => Some(Violation::missing(rule)),
        Some(value)
            if !rule.allowed_values.is_empty()
                && !rule.allowed_values.iter().any(|allowed| allowed == value) =>
        {
            Some(Violation::invalid_value(rule, value))
        }
        Some(_) => None,
    }
}

///
/// Evaluates the tags of `resource` against `rules` and returns the compliance verdict.
///
/// Each applicable rule contributes at most one violation: `MISSING` when the tag key is
/// absent, `INVALID_VALUE` when the rule lists allowed values and the tag's value is not
/// one of them. Violations keep the relative order of the rules that produced them.
///
/// An empty tag value satisfies a rule with no allowed values.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the resource id or type is empty, or if any rule
/// has an empty tag key. No report is produced in that case.
///
pub fn evaluate(resource: &Resource, rules: &[Rule]) -> Result<ComplianceReport> {
    check_inputs(resource, rules)?;

    let mut rules_evaluated = 0;
    let mut violations = Vec::new();
    for rule in applicable_rules(&resource.resource_type, rules) {
        rules_evaluated += 1;
        if let Some(violation) = check_rule(resource, rule) {
            violations.push(violation);
        }
    }

    Ok(ComplianceReport {
        resource_id: resource.resource_id.clone(),
        resource_type: resource.resource_type.clone(),
        region: resource.region.clone(),
        account_id: resource.account_id.clone(),
        compliant: violations.is_empty(),
        violations,
        rules_evaluated,
        rules_supplied: rules.len(),
    })
}

#[cfg(test)]
#[path = "evaluate_tests.rs"]
mod evaluate_tests;
