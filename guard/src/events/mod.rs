// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Normalizes "AWS API Call via CloudTrail" events, as delivered by EventBridge, into
//! [`Resource`] records the rule engine can evaluate.

use std::collections::BTreeMap;
use std::convert::TryFrom;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rules::model::{null_as_default, Resource, Tag, Tags};
use crate::rules::Result;

pub const EC2_SOURCE: &str = "ec2.amazonaws.com";
pub const S3_SOURCE: &str = "s3.amazonaws.com";
pub const RDS_SOURCE: &str = "rds.amazonaws.com";
pub const LAMBDA_SOURCE: &str = "lambda.amazonaws.com";
pub const ELB_SOURCE: &str = "elasticloadbalancing.amazonaws.com";
pub const AUTOSCALING_SOURCE: &str = "autoscaling.amazonaws.com";

/// Event sources the extractor understands, in EventBridge pattern order.
pub const SUPPORTED_EVENT_SOURCES: [&str; 6] = [
    EC2_SOURCE,
    S3_SOURCE,
    RDS_SOURCE,
    LAMBDA_SOURCE,
    ELB_SOURCE,
    AUTOSCALING_SOURCE,
];

/// Resource types whose creation events carry no tags, so their tags are read back
/// from the owning service before evaluation.
pub const TAGS_NOT_IN_EVENT: [&str; 4] = [
    "s3:bucket",
    "ec2:eip",
    "ec2:security-group",
    "elb:loadbalancer",
];

pub fn needs_tag_lookup(resource: &Resource) -> bool {
    TAGS_NOT_IN_EVENT.contains(&resource.resource_type.as_str())
}

pub const DETAIL_TYPE: &str = "AWS API Call via CloudTrail";
pub const UNKNOWN_CREATOR: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloudTrailEvent {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "detail-type", default)]
    pub detail_type: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub detail: CloudTrailDetail,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudTrailDetail {
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_source: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub aws_region: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recipient_account_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_identity: UserIdentity,
    #[serde(default)]
    pub request_parameters: Option<Value>,
    #[serde(default)]
    pub response_elements: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    #[serde(rename = "type", default)]
    pub identity_type: Option<String>,
    #[serde(default)]
    pub arn: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
}

impl UserIdentity {
    pub fn creator(&self) -> &str {
        self.arn
            .as_deref()
            .or(self.user_name.as_deref())
            .unwrap_or(UNKNOWN_CREATOR)
    }
}

/// Where and by whom the resources of one event were created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
    pub event_id: String,
    pub event_name: String,
    pub event_source: String,
    pub region: String,
    pub account_id: String,
    pub event_time: String,
    pub creator: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEvent {
    pub context: EventContext,
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum Extraction {
    Resources(ResourceEvent),
    #[serde(rename_all = "camelCase")]
    Skipped { resource_type: String },
    #[serde(rename_all = "camelCase")]
    Unsupported {
        event_source: String,
        event_name: String,
    },
}

/// A payload of `{"test": true}` is a smoke test of the function wiring, not an event.
/// Any truthy `test` value counts: `true`, a non-zero number, a non-empty string, list or map.
pub fn is_test_event(payload: &Value) -> bool {
    match payload.get("test") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().map_or(true, |n| n != 0.0),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(fields)) => !fields.is_empty(),
    }
}

pub fn parse_event(content: &str) -> Result<CloudTrailEvent> {
    crate::rules::read_document(content)
}

//
// Shapes of the request and response elements we read. Everything is optional, CloudTrail
// omits or nulls fields freely.
//

#[derive(Debug, Default, Deserialize)]
struct TagSet {
    #[serde(default, deserialize_with = "null_as_default")]
    items: Vec<Tag>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstanceItem {
    #[serde(default, deserialize_with = "null_as_default")]
    instance_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    tag_set: TagSet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunInstancesResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    instances_set: InstancesSet,
}

#[derive(Debug, Default, Deserialize)]
struct InstancesSet {
    #[serde(default, deserialize_with = "null_as_default")]
    items: Vec<InstanceItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    volume_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    tag_set: TagSet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AllocateAddressResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    allocation_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VpcResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    vpc: VpcItem,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VpcItem {
    #[serde(default, deserialize_with = "null_as_default")]
    vpc_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    tag_set: TagSet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubnetResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    subnet: SubnetItem,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubnetItem {
    #[serde(default, deserialize_with = "null_as_default")]
    subnet_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    tag_set: TagSet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecurityGroupResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    group_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BucketRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    bucket_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct DbInstanceResponse {
    #[serde(rename = "dBInstance", default, deserialize_with = "null_as_default")]
    db_instance: DbInstanceItem,
}

#[derive(Debug, Default, Deserialize)]
struct DbClusterResponse {
    #[serde(rename = "dBCluster", default, deserialize_with = "null_as_default")]
    db_cluster: DbClusterItem,
}

// An Aurora cluster member carries `dBClusterIdentifier` next to its own identifier.
#[derive(Debug, Default, Deserialize)]
struct DbInstanceItem {
    #[serde(rename = "dBInstanceIdentifier", default, deserialize_with = "null_as_default")]
    identifier: String,
    #[serde(rename = "tagList", default, deserialize_with = "null_as_default")]
    tag_list: Vec<Tag>,
}

#[derive(Debug, Default, Deserialize)]
struct DbClusterItem {
    #[serde(rename = "dBClusterIdentifier", default, deserialize_with = "null_as_default")]
    identifier: String,
    #[serde(rename = "tagList", default, deserialize_with = "null_as_default")]
    tag_list: Vec<Tag>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FunctionResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    function_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadBalancerResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    load_balancers: Vec<LoadBalancerItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadBalancerItem {
    #[serde(default, deserialize_with = "null_as_default")]
    load_balancer_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    load_balancer_arn: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AutoScalingGroupRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    auto_scaling_group_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    tags: Vec<Tag>,
}

fn elements<T: DeserializeOwned + Default>(value: &Option<Value>) -> Result<T> {
    match value {
        Some(Value::Null) | None => Ok(T::default()),
        Some(value) => Ok(serde_json::from_value(value.clone())?),
    }
}

struct Found {
    resources: Vec<Resource>,
}

impl Found {
    fn one(resource_type: &'static str, id: String, tags: Tags) -> Option<Found> {
        Some(Found {
            resources: vec![Resource::new(id, resource_type).with_tags(tags)],
        })
    }
}

enum Matched {
    Found(Found),
    Skip(&'static str),
}

fn match_ec2(name: &str, detail: &CloudTrailDetail) -> Result<Option<Matched>> {
    let response = &detail.response_elements;
    let found = match name {
        "RunInstances" => {
            let instances = elements::<RunInstancesResponse>(response)?.instances_set.items;
            let resources = instances
                .into_iter()
                .map(|item| {
                    let tags = Tags::try_from(item.tag_set.items)?;
                    Ok(Resource::new(item.instance_id, "ec2:instance").with_tags(tags))
                })
                .collect::<Result<Vec<_>>>()?;
            Some(Found { resources })
        }
        "CreateVolume" => {
            let volume = elements::<VolumeResponse>(response)?;
            Found::one("ec2:volume", volume.volume_id, Tags::try_from(volume.tag_set.items)?)
        }
        "AllocateAddress" => {
            let address = elements::<AllocateAddressResponse>(response)?;
            Found::one("ec2:eip", address.allocation_id, Tags::new())
        }
        "CreateVpc" => {
            let vpc = elements::<VpcResponse>(response)?.vpc;
            Found::one("ec2:vpc", vpc.vpc_id, Tags::try_from(vpc.tag_set.items)?)
        }
        "CreateSubnet" => {
            let subnet = elements::<SubnetResponse>(response)?.subnet;
            Found::one(
                "ec2:subnet",
                subnet.subnet_id,
                Tags::try_from(subnet.tag_set.items)?,
            )
        }
        "CreateSecurityGroup" => {
            let group = elements::<SecurityGroupResponse>(response)?;
            Found::one("ec2:security-group", group.group_id, Tags::new())
        }
        _ => None,
    };
    Ok(found.map(Matched::Found))
}

fn match_s3(name: &str, detail: &CloudTrailDetail) -> Result<Option<Matched>> {
    Ok(match name {
        "CreateBucket" => {
            let request = elements::<BucketRequest>(&detail.request_parameters)?;
            Found::one("s3:bucket", request.bucket_name, Tags::new()).map(Matched::Found)
        }
        // tagging an existing bucket is how a bucket gets fixed, not a creation
        "PutBucketTagging" => Some(Matched::Skip("s3:bucket")),
        _ => None,
    })
}

fn match_rds(name: &str, detail: &CloudTrailDetail) -> Result<Option<Matched>> {
    let response = &detail.response_elements;
    let found = match name {
        "CreateDBInstance" => {
            let db = elements::<DbInstanceResponse>(response)?.db_instance;
            Found::one("rds:db", db.identifier, Tags::try_from(db.tag_list)?)
        }
        "CreateDBCluster" => {
            let db = elements::<DbClusterResponse>(response)?.db_cluster;
            Found::one("rds:cluster", db.identifier, Tags::try_from(db.tag_list)?)
        }
        _ => None,
    };
    Ok(found.map(Matched::Found))
}

fn match_lambda(name: &str, detail: &CloudTrailDetail) -> Result<Option<Matched>> {
    Ok(match name {
        "CreateFunction20150331" => {
            let function = elements::<FunctionResponse>(&detail.response_elements)?;
            let tags = function.tags.into_iter().collect::<Tags>();
            Found::one("lambda:function", function.function_name, tags).map(Matched::Found)
        }
        _ => None,
    })
}

fn match_elb(name: &str, detail: &CloudTrailDetail) -> Result<Option<Matched>> {
    Ok(match name {
        "CreateLoadBalancer" => {
            let response = elements::<LoadBalancerResponse>(&detail.response_elements)?;
            Some(Matched::Found(Found {
                resources: response
                    .load_balancers
                    .into_iter()
                    .map(|lb| {
                        Resource::new(lb.load_balancer_name, "elb:loadbalancer")
                            .with_arn(lb.load_balancer_arn)
                    })
                    .collect(),
            }))
        }
        _ => None,
    })
}

fn match_autoscaling(name: &str, detail: &CloudTrailDetail) -> Result<Option<Matched>> {
    Ok(match name {
        "CreateAutoScalingGroup" => {
            let request = elements::<AutoScalingGroupRequest>(&detail.request_parameters)?;
            Found::one(
                "autoscaling:group",
                request.auto_scaling_group_name,
                Tags::try_from(request.tags)?,
            )
            .map(Matched::Found)
        }
        _ => None,
    })
}

///
/// Extracts the created resources from a CloudTrail event.
///
/// A supported creation event yields one [`Resource`] per created resource (RunInstances
/// and CreateLoadBalancer may create several). Identifiers missing from the payload come
/// through as empty strings so that evaluation rejects them instead of passing them.
///
/// # Errors
///
/// Fails when the payload of a supported event has an unexpected shape, or when a
/// resource declares the same tag key twice.
///
pub fn extract_resources(event: &CloudTrailEvent) -> Result<Extraction> {
    let detail = &event.detail;
    let name = detail.event_name.as_str();
    let matched = match detail.event_source.as_str() {
        EC2_SOURCE => match_ec2(name, detail)?,
        S3_SOURCE => match_s3(name, detail)?,
        RDS_SOURCE => match_rds(name, detail)?,
        LAMBDA_SOURCE => match_lambda(name, detail)?,
        ELB_SOURCE => match_elb(name, detail)?,
        AUTOSCALING_SOURCE => match_autoscaling(name, detail)?,
        _ => None,
    };

    let unsupported = || Extraction::Unsupported {
        event_source: detail.event_source.clone(),
        event_name: detail.event_name.clone(),
    };

    Ok(match matched {
        Some(Matched::Skip(resource_type)) => Extraction::Skipped {
            resource_type: resource_type.to_string(),
        },
        Some(Matched::Found(found)) if !found.resources.is_empty() => {
            let context = EventContext {
                event_id: event.id.clone(),
                event_name: detail.event_name.clone(),
                event_source: detail.event_source.clone(),
                region: detail.aws_region.clone(),
                account_id: detail.recipient_account_id.clone(),
                event_time: detail.event_time.clone(),
                creator: detail.user_identity.creator().to_string(),
            };
            let resources = found
                .resources
                .into_iter()
                .map(|resource| {
                    resource
                        .in_region(context.region.as_str())
                        .in_account(context.account_id.as_str())
                })
                .collect();
            Extraction::Resources(ResourceEvent { context, resources })
        }
        _ => unsupported(),
    })
}
