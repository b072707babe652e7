// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use aws_sdk_ec2::types::Filter;
use aws_sdk_s3::error::ProvideErrorMetadata;
use log::{debug, warn};
use tag_guard::{Error, Resource, Result, Tags};

use crate::handler::TagSource;

const NO_SUCH_TAG_SET: &str = "NoSuchTagSet";
const RESOURCE_ID_FILTER: &str = "resource-id";

/// Reads tags back from S3, EC2 and Elastic Load Balancing for resources created
/// by calls that do not echo them.
#[derive(Debug, Clone)]
pub struct AwsTagSource {
    s3: aws_sdk_s3::Client,
    ec2: aws_sdk_ec2::Client,
    elb: aws_sdk_elasticloadbalancingv2::Client,
}

impl AwsTagSource {
    pub fn new(
        s3: aws_sdk_s3::Client,
        ec2: aws_sdk_ec2::Client,
        elb: aws_sdk_elasticloadbalancingv2::Client,
    ) -> Self {
        AwsTagSource { s3, ec2, elb }
    }

    async fn bucket_tags(&self, bucket: &str) -> Result<Tags> {
        match self.s3.get_bucket_tagging().bucket(bucket).send().await {
            Ok(output) => Ok(output
                .tag_set()
                .iter()
                .map(|tag| (tag.key(), tag.value()))
                .collect()),
            // a bucket that was never tagged has no tag set at all
            Err(err) if err.code() == Some(NO_SUCH_TAG_SET) => {
                debug!("Bucket {bucket} has no tag set");
                Ok(Tags::default())
            }
            Err(err) => Err(Error::TagLookup(err.to_string())),
        }
    }

    async fn ec2_tags(&self, resource_id: &str) -> Result<Tags> {
        let mut tags = Tags::default();
        let mut next_token = None;
        loop {
            let page = self
                .ec2
                .describe_tags()
                .filters(
                    Filter::builder()
                        .name(RESOURCE_ID_FILTER)
                        .values(resource_id)
                        .build(),
                )
                .set_next_token(next_token)
                .send()
                .await
                .map_err(|err| Error::TagLookup(err.to_string()))?;

            for tag in page.tags() {
                if let Some(key) = tag.key() {
                    tags.insert(key, tag.value().unwrap_or_default());
                }
            }

            next_token = page.next_token;
            if next_token.is_none() {
                break;
            }
        }
        Ok(tags)
    }

    async fn load_balancer_tags(&self, resource: &Resource) -> Result<Tags> {
        let arn = match &resource.resource_arn {
            Some(arn) => arn,
            None => {
                warn!(
                    "Load balancer {} has no ARN, tags cannot be looked up",
                    resource.resource_id
                );
                return Ok(Tags::default());
            }
        };

        let output = self
            .elb
            .describe_tags()
            .resource_arns(arn)
            .send()
            .await
            .map_err(|err| Error::TagLookup(err.to_string()))?;

        Ok(output
            .tag_descriptions()
            .iter()
            .flat_map(|description| description.tags())
            .map(|tag| (tag.key(), tag.value().unwrap_or_default()))
            .collect())
    }
}

#[async_trait]
impl TagSource for AwsTagSource {
    async fn tags(&self, resource: &Resource) -> Result<Tags> {
        match resource.resource_type.as_str() {
            "s3:bucket" => self.bucket_tags(&resource.resource_id).await,
            "ec2:eip" | "ec2:security-group" => self.ec2_tags(&resource.resource_id).await,
            "elb:loadbalancer" => self.load_balancer_tags(resource).await,
            other => Err(Error::TagLookup(format!(
                "no tag lookup for resource type {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_config::{BehaviorVersion, Region};

    fn source() -> AwsTagSource {
        let region = Region::new("us-east-1");
        AwsTagSource::new(
            aws_sdk_s3::Client::from_conf(
                aws_sdk_s3::Config::builder()
                    .behavior_version(BehaviorVersion::latest())
                    .region(region.clone())
                    .build(),
            ),
            aws_sdk_ec2::Client::from_conf(
                aws_sdk_ec2::Config::builder()
                    .behavior_version(BehaviorVersion::latest())
                    .region(region.clone())
                    .build(),
            ),
            aws_sdk_elasticloadbalancingv2::Client::from_conf(
                aws_sdk_elasticloadbalancingv2::Config::builder()
                    .behavior_version(BehaviorVersion::latest())
                    .region(region)
                    .build(),
            ),
        )
    }

    #[tokio::test]
    async fn load_balancer_without_arn_has_no_tags() -> Result<()> {
        let tags = source()
            .tags(&Resource::new("classic-lb", "elb:loadbalancer"))
            .await?;
        assert!(tags.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn unsupported_type_is_rejected() {
        let result = source().tags(&Resource::new("i-1", "ec2:instance")).await;
        assert!(matches!(result, Err(Error::TagLookup(_))));
    }
}
