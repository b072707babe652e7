// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::fmt::Formatter;
use std::io::Write;

use colored::*;

use crate::rules::evaluate::applicable_rules;
use crate::rules::model::{ComplianceReport, Rule, Violation, ViolationKind};
use crate::rules::Status;

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ViolationKind::Missing => f.write_fmt(format_args!(
                "Rule [{}] required tag `{}` is missing",
                self.rule_id, self.tag_key
            )),
            ViolationKind::InvalidValue => f.write_fmt(format_args!(
                "Rule [{}] tag `{}` has invalid value `{}`. Allowed: [{}]",
                self.rule_id,
                self.tag_key,
                self.actual_value.as_deref().unwrap_or_default(),
                self.allowed_values.join(", ")
            )),
        }
    }
}

impl std::fmt::Display for ComplianceReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "{} ({}) Status = {}",
            self.resource_id,
            self.resource_type,
            Status::from_compliant(self.compliant)
        ))
    }
}

pub(crate) fn print_report(writer: &mut dyn Write, report: &ComplianceReport) -> crate::rules::Result<()> {
    writeln!(writer, "{report}")?;
    if !report.violations.is_empty() {
        writeln!(writer, "{}", "FAILED rules".bold())?;
        for violation in &report.violations {
            writeln!(writer, "{violation}")?;
        }
    }
    writeln!(writer, "---")?;
    Ok(())
}

pub(crate) fn print_summary(
    writer: &mut dyn Write,
    report: &ComplianceReport,
    rules: &[Rule],
) -> crate::rules::Result<()> {
    let applicable = applicable_rules(&report.resource_type, rules).collect::<Vec<&Rule>>();
    let longest = applicable
        .iter()
        .map(|rule| rule.rule_id.len())
        .max()
        .unwrap_or(0);

    writeln!(
        writer,
        "{} rules evaluated of {} supplied for {}",
        report.rules_evaluated, report.rules_supplied, report.resource_id
    )?;
    // violations come in applicable-rule order, at most one per rule
    let mut violations = report.violations.iter().peekable();
    for rule in applicable {
        let failed = violations
            .next_if(|v| {
                v.rule_id == rule.rule_id
                    && v.tag_key == rule.tag_key
                    && v.allowed_values == rule.allowed_values
            })
            .is_some();
        writeln!(
            writer,
            "{resource}/{context:<0$}{status}",
            longest + 4,
            resource = report.resource_id,
            context = rule.rule_id,
            status = Status::from_compliant(!failed)
        )?;
    }
    Ok(())
}
