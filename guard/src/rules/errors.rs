// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid input `{0}`")]
    InvalidInput(String),
    #[error("Error parsing incoming JSON context {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Error parsing incoming YAML context {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("Formatting error when writing {0}")]
    FormatError(#[from] std::fmt::Error),
    #[error("I/O error when reading {0}")]
    IoError(#[from] std::io::Error),
    #[error("The path `{0}` does not exist")]
    FileNotFoundError(String),
    #[error("Could not read rules from the rule store. Error = `{0}`")]
    RuleStore(String),
    #[error("Could not deliver compliance notification. Error = `{0}`")]
    Notification(String),
    #[error("Could not archive compliance reports. Error = `{0}`")]
    ReportArchive(String),
    #[error("Could not look up resource tags. Error = `{0}`")]
    TagLookup(String),
    #[error("{0}")]
    IllegalArguments(String),
}

impl Error {
    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}
