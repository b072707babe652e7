// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Human-readable renderings of a non-compliant [`ComplianceReport`], sized for the
//! protocols an SNS topic fans out to.

use std::fmt::Write;

use serde::Serialize;

use crate::events::EventContext;
use crate::rules::model::ComplianceReport;
use crate::rules::Result;

pub const SUBJECT_LIMIT: usize = 100;
pub const SMS_LIMIT: usize = 160;
const SMS_ID_LIMIT: usize = 20;
const SMS_KEYS_LIMIT: usize = 2;
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub subject: String,
    pub body: String,
    pub sms: String,
}

#[derive(Serialize)]
struct SnsPayload<'a> {
    default: &'a str,
    email: &'a str,
    sms: &'a str,
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

fn truncate_with_ellipsis(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut shortened = truncate(text, limit - ELLIPSIS.len());
    shortened.push_str(ELLIPSIS);
    shortened
}

fn section(body: &mut String, title: &str) -> std::fmt::Result {
    writeln!(body, "{title}")?;
    writeln!(body, "{}", "-".repeat(40))
}

impl NotificationMessage {
    pub fn for_report(report: &ComplianceReport, context: &EventContext) -> Result<Self> {
        Ok(NotificationMessage {
            subject: truncate(
                &format!("Tag Compliance Violation: {}", report.resource_type),
                SUBJECT_LIMIT,
            ),
            body: Self::body(report, context)?,
            sms: Self::sms(report),
        })
    }

    fn body(report: &ComplianceReport, context: &EventContext) -> Result<String> {
        let banner = "=".repeat(60);
        let region = &report.region;
        let mut body = String::new();

        writeln!(body, "{banner}")?;
        writeln!(body, "TAG COMPLIANCE VIOLATION DETECTED")?;
        writeln!(body, "{banner}")?;
        writeln!(body)?;

        section(&mut body, "RESOURCE DETAILS")?;
        writeln!(body, "Resource Type: {}", report.resource_type)?;
        writeln!(body, "Resource ID: {}", report.resource_id)?;
        writeln!(body, "Region: {region}")?;
        writeln!(body, "Account ID: {}", report.account_id)?;
        writeln!(body, "Created By: {}", context.creator)?;
        writeln!(body, "Event Time: {}", context.event_time)?;
        writeln!(body)?;

        let missing = report.missing_tags();
        if !missing.is_empty() {
            section(&mut body, "MISSING REQUIRED TAGS")?;
            for key in missing {
                writeln!(body, "  - {key}")?;
            }
            writeln!(body)?;
        }

        let invalid = report.invalid_values();
        if !invalid.is_empty() {
            section(&mut body, "INVALID TAG VALUES")?;
            for violation in invalid {
                writeln!(body, "  - {}", violation.tag_key)?;
                writeln!(
                    body,
                    "    Current value: {}",
                    violation.actual_value.as_deref().unwrap_or_default()
                )?;
                writeln!(
                    body,
                    "    Allowed values: {}",
                    violation.allowed_values.join(", ")
                )?;
            }
            writeln!(body)?;
        }

        section(&mut body, "REMEDIATION")?;
        writeln!(body, "Please add the missing tags and correct any invalid values")?;
        writeln!(body, "to comply with organizational tagging policies.")?;
        writeln!(body)?;
        writeln!(
            body,
            "AWS Console: https://{region}.console.aws.amazon.com/resource-groups/home?region={region}"
        )?;
        writeln!(body)?;
        write!(body, "{banner}")?;
        Ok(body)
    }

    fn sms(report: &ComplianceReport) -> String {
        let mut issues = vec![];
        let missing = report.missing_tags();
        if !missing.is_empty() {
            issues.push(format!(
                "missing: {}",
                missing
                    .iter()
                    .take(SMS_KEYS_LIMIT)
                    .copied()
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        let invalid = report.invalid_values();
        if !invalid.is_empty() {
            issues.push(format!(
                "invalid: {}",
                invalid
                    .iter()
                    .take(SMS_KEYS_LIMIT)
                    .map(|v| v.tag_key.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        let message = format!(
            "Tag violation: {} {} - {}",
            report.resource_type,
            truncate(&report.resource_id, SMS_ID_LIMIT),
            issues.join("; ")
        );
        truncate_with_ellipsis(&message, SMS_LIMIT)
    }

    /// The `MessageStructure=json` document SNS expects: one rendering per protocol.
    pub fn sns_payload(&self) -> Result<String> {
        Ok(serde_json::to_string(&SnsPayload {
            default: &self.body,
            email: &self.body,
            sms: &self.sms,
        })?)
    }
}
