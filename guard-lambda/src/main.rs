// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use aws_config::{BehaviorVersion, Region};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use log::info;
use serde_json::Value;
use simple_logger::SimpleLogger;

use tag_guard_lambda::archive::S3ReportArchive;
use tag_guard_lambda::config::LambdaConfig;
use tag_guard_lambda::notifier::SnsNotifier;
use tag_guard_lambda::store::DynamoDbRuleStore;
use tag_guard_lambda::tags::AwsTagSource;
use tag_guard_lambda::{ComplianceHandler, HandlerResponse};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = LambdaConfig::from_env()?;
    SimpleLogger::new().with_level(config.log_level).init()?;
    info!(
        "Starting with rules table {} in {} (model {})",
        config.rules_table_name, config.region, config.bedrock_model_id
    );

    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .load()
        .await;

    let mut handler = ComplianceHandler::new(DynamoDbRuleStore::new(
        aws_sdk_dynamodb::Client::new(&sdk_config),
        config.rules_table_name.clone(),
    ))
    .with_tag_source(AwsTagSource::new(
        aws_sdk_s3::Client::new(&sdk_config),
        aws_sdk_ec2::Client::new(&sdk_config),
        aws_sdk_elasticloadbalancingv2::Client::new(&sdk_config),
    ));
    if let Some(topic_arn) = &config.sns_topic_arn {
        handler = handler.with_notifier(SnsNotifier::new(
            aws_sdk_sns::Client::new(&sdk_config),
            topic_arn.clone(),
        ));
    }
    if let Some(bucket) = &config.report_bucket {
        handler = handler.with_archive(S3ReportArchive::new(
            aws_sdk_s3::Client::new(&sdk_config),
            bucket.clone(),
        ));
    }

    let handler = &handler;
    run(service_fn(move |event: LambdaEvent<Value>| async move {
        Ok::<HandlerResponse, Error>(handler.handle(event.payload).await)
    }))
    .await
}
