// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use log::{error, info};
use tag_guard::{Error, Result};

use crate::handler::ReportArchive;

const REPORT_PREFIX: &str = "reports";

/// Object key of the reports produced for one event.
pub fn archive_key(timestamp: i64, event_id: &str) -> String {
    if event_id.is_empty() {
        format!("{REPORT_PREFIX}/{timestamp}.json")
    } else {
        format!("{REPORT_PREFIX}/{timestamp}-{event_id}.json")
    }
}

#[derive(Debug, Clone)]
pub struct S3ReportArchive {
    client: Client,
    bucket: String,
}

impl S3ReportArchive {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        S3ReportArchive {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ReportArchive for S3ReportArchive {
    async fn store(&self, key: &str, body: String) -> Result<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body.into_bytes()))
            .content_type("application/json")
            .send()
            .await
            .map_err(|err| {
                error!("failed to upload file '{}' to S3 with error: {}", key, err);
                Error::ReportArchive(err.to_string())
            })?;

        let s3_location = format!("s3://{}/{}", self.bucket, key);
        info!("Successfully stored the compliance reports in S3 with the name '{s3_location}'");
        Ok(s3_location)
    }
}
