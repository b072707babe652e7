// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tag_guard::events::{
    extract_resources, is_test_event, needs_tag_lookup, CloudTrailEvent, EventContext, Extraction, ResourceEvent,
};
use tag_guard::notify::NotificationMessage;
use tag_guard::{evaluate, ComplianceReport, Error, Resource, Result, Rule, Tags};

use crate::archive::archive_key;

pub const TEST_SUCCESSFUL: &str = "Test successful";
pub const NOT_APPLICABLE: &str = "Event not applicable for tag compliance check";
pub const CHECK_SKIPPED: &str = "Check skipped";
pub const CHECK_COMPLETED: &str = "Compliance check completed";
const NO_TOPIC: &str = "no notification topic configured";

#[async_trait]
pub trait RuleSource: Send + Sync {
    async fn rules(&self) -> Result<Vec<Rule>>;
}

/// Reads the current tags of a resource from the service that owns it.
#[async_trait]
pub trait TagSource: Send + Sync {
    async fn tags(&self, resource: &Resource) -> Result<Tags>;
}

/// Delivers one violation notification, returning the id the channel assigned to it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, message: &NotificationMessage) -> Result<String>;
}

/// Stores a batch of reports under `key`, returning the location written.
#[async_trait]
pub trait ReportArchive: Send + Sync {
    async fn store(&self, key: &str, body: String) -> Result<String>;
}

/// What the function returns to the runtime, shaped as an API Gateway style response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub body: String,
}

impl HandlerResponse {
    fn ok(body: Value) -> Self {
        HandlerResponse {
            status_code: 200,
            body: body.to_string(),
        }
    }

    fn message(message: &str) -> Self {
        Self::ok(json!({ "message": message }))
    }

    fn error(err: &Error) -> Self {
        HandlerResponse {
            status_code: 500,
            body: json!({ "error": err.to_string() }).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum NotificationOutcome {
    #[serde(rename_all = "camelCase")]
    Sent { message_id: String },
    Failed { error: String },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ArchiveOutcome {
    Stored { location: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckedResource {
    #[serde(flatten)]
    pub report: ComplianceReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub context: EventContext,
    pub compliant: bool,
    pub reports: Vec<CheckedResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<ArchiveOutcome>,
}

/// Runs one compliance check per incoming event: extract the created resources, fetch the
/// rules, evaluate, then notify about and archive the reports.
pub struct ComplianceHandler {
    rules: Box<dyn RuleSource>,
    tags: Option<Box<dyn TagSource>>,
    notifier: Option<Box<dyn Notifier>>,
    archive: Option<Box<dyn ReportArchive>>,
}

impl ComplianceHandler {
    pub fn new(rules: impl RuleSource + 'static) -> Self {
        ComplianceHandler {
            rules: Box::new(rules),
            tags: None,
            notifier: None,
            archive: None,
        }
    }

    pub fn with_tag_source(mut self, tags: impl TagSource + 'static) -> Self {
        self.tags = Some(Box::new(tags));
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Some(Box::new(notifier));
        self
    }

    pub fn with_archive(mut self, archive: impl ReportArchive + 'static) -> Self {
        self.archive = Some(Box::new(archive));
        self
    }

    /// Never fails: errors while reading the event, fetching rules or evaluating them come
    /// back as a 500 response and no verdict is given.
    pub async fn handle(&self, payload: Value) -> HandlerResponse {
        info!("Received event: {payload}");
        match self.process(payload).await {
            Ok(response) => response,
            Err(err) => {
                error!("Error processing event: {err}");
                HandlerResponse::error(&err)
            }
        }
    }

    async fn process(&self, payload: Value) -> Result<HandlerResponse> {
        if is_test_event(&payload) {
            info!("Test event received");
            return Ok(HandlerResponse::message(TEST_SUCCESSFUL));
        }

        let event = serde_json::from_value::<CloudTrailEvent>(payload)?;
        let ResourceEvent {
            context,
            mut resources,
        } = match extract_resources(&event)? {
            Extraction::Resources(found) => found,
            Extraction::Skipped { resource_type } => {
                info!("Skipping check for {resource_type}");
                return Ok(HandlerResponse::message(CHECK_SKIPPED));
            }
            Extraction::Unsupported {
                event_source,
                event_name,
            } => {
                info!("Unsupported event: {event_source} - {event_name}");
                return Ok(HandlerResponse::message(NOT_APPLICABLE));
            }
        };
        info!(
            "Processing {} resource(s) from {} created by {}",
            resources.len(),
            context.event_name,
            context.creator
        );

        self.look_up_tags(&mut resources).await?;

        let rules = self.rules.rules().await?;
        info!("Fetched {} rules", rules.len());

        // every resource is evaluated before anything is sent, an invalid one fails the event
        let reports = resources
            .iter()
            .map(|resource| evaluate(resource, &rules))
            .collect::<Result<Vec<_>>>()?;

        let mut checked = Vec::with_capacity(reports.len());
        for report in reports {
            info!(
                "{} ({}) compliant = {}, {} violation(s)",
                report.resource_id,
                report.resource_type,
                report.compliant,
                report.violations.len()
            );
            let notification = if report.compliant {
                None
            } else {
                Some(self.notify(&report, &context).await)
            };
            checked.push(CheckedResource {
                report,
                notification,
            });
        }

        let archive = self.archive(&context, &checked).await?;
        let result = CheckResult {
            compliant: checked.iter().all(|c| c.report.compliant),
            context,
            reports: checked,
            archive,
        };

        Ok(HandlerResponse::ok(json!({
            "message": CHECK_COMPLETED,
            "result": serde_json::to_value(&result)?,
        })))
    }

    /// Fills in the tags of resources whose creation event does not carry them. A failed
    /// lookup fails the event.
    async fn look_up_tags(&self, resources: &mut [Resource]) -> Result<()> {
        for resource in resources.iter_mut().filter(|r| needs_tag_lookup(r)) {
            match &self.tags {
                Some(source) => {
                    resource.tags = source.tags(resource).await?;
                    debug!(
                        "Looked up {} tag(s) of {} ({})",
                        resource.tags.len(),
                        resource.resource_id,
                        resource.resource_type
                    );
                }
                None => warn!(
                    "No tag source configured, checking {} with the tags of its event",
                    resource.resource_id
                ),
            }
        }
        Ok(())
    }

    async fn notify(&self, report: &ComplianceReport, context: &EventContext) -> NotificationOutcome {
        let notifier = match &self.notifier {
            Some(notifier) => notifier,
            None => {
                warn!("Not notifying about {}: {NO_TOPIC}", report.resource_id);
                return NotificationOutcome::Skipped {
                    reason: NO_TOPIC.to_string(),
                };
            }
        };

        let sent = match NotificationMessage::for_report(report, context) {
            Ok(message) => notifier.publish(&message).await,
            Err(err) => Err(err),
        };
        match sent {
            Ok(message_id) => {
                info!("Notification {message_id} sent for {}", report.resource_id);
                NotificationOutcome::Sent { message_id }
            }
            Err(err) => {
                error!("Notification for {} failed: {err}", report.resource_id);
                NotificationOutcome::Failed {
                    error: err.to_string(),
                }
            }
        }
    }

    async fn archive(
        &self,
        context: &EventContext,
        checked: &[CheckedResource],
    ) -> Result<Option<ArchiveOutcome>> {
        let archive = match &self.archive {
            Some(archive) => archive,
            None => {
                debug!("No report archive configured");
                return Ok(None);
            }
        };

        let key = archive_key(
            time::OffsetDateTime::now_utc().unix_timestamp(),
            &context.event_id,
        );
        let body = serde_json::to_string_pretty(checked)?;
        Ok(Some(match archive.store(&key, body).await {
            Ok(location) => ArchiveOutcome::Stored { location },
            Err(err) => {
                error!("Archiving reports to {key} failed: {err}");
                ArchiveOutcome::Failed {
                    error: err.to_string(),
                }
            }
        }))
    }
}
