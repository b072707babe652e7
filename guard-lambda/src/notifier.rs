// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use aws_sdk_sns::Client;
use log::{error, info};
use tag_guard::notify::NotificationMessage;
use tag_guard::{Error, Result};

use crate::handler::Notifier;

const MESSAGE_STRUCTURE: &str = "json";

/// Publishes violation notifications to an SNS topic, with per protocol bodies.
#[derive(Debug, Clone)]
pub struct SnsNotifier {
    client: Client,
    topic_arn: String,
}

impl SnsNotifier {
    pub fn new(client: Client, topic_arn: impl Into<String>) -> Self {
        SnsNotifier {
            client,
            topic_arn: topic_arn.into(),
        }
    }
}

#[async_trait]
impl Notifier for SnsNotifier {
    async fn publish(&self, message: &NotificationMessage) -> Result<String> {
        let output = self
            .client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(&message.subject)
            .message(message.sns_payload()?)
            .message_structure(MESSAGE_STRUCTURE)
            .send()
            .await
            .map_err(|err| {
                error!("failed to publish to '{}' with error: {}", self.topic_arn, err);
                Error::Notification(err.to_string())
            })?;

        let message_id = output.message_id().unwrap_or_default().to_string();
        info!("Published notification {message_id} to {}", self.topic_arn);
        Ok(message_id)
    }
}
