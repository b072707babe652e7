// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

pub mod archive;
pub mod config;
pub mod handler;
pub mod notifier;
pub mod store;
pub mod tags;

pub use handler::{
    ComplianceHandler, HandlerResponse, Notifier, ReportArchive, RuleSource, TagSource,
};
