// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::io::Write;

use clap::Args;

use crate::commands::{Executable, SUCCESS_STATUS_CODE};
use crate::rules::Result;
use crate::settings::DeploymentSettings;
use crate::utils::reader::Reader;
use crate::utils::writer::Writer;

const ABOUT: &str = "Validates deployment settings and prints the EventBridge pattern for resource creation events";
const SETTINGS_HELP: &str = "Provide a deployment settings file in JSON or YAML. Defaults apply when absent";

#[derive(Debug, Clone, Eq, PartialEq, Args)]
#[command(about = ABOUT)]
pub struct EventPattern {
    #[arg(short, long, help = SETTINGS_HELP)]
    pub(crate) settings: Option<String>,
}

impl Executable for EventPattern {
    fn execute(&self, writer: &mut Writer, _: &mut Reader) -> Result<i32> {
        let settings = match &self.settings {
            Some(file) => DeploymentSettings::from_document(&fs::read_to_string(file)?)?,
            None => DeploymentSettings::default(),
        };
        settings.validate()?;
        log::info!(
            "settings for {:?} deployment in {} are valid",
            settings.role,
            settings.region
        );

        serde_json::to_writer_pretty(&mut *writer, &settings.event_pattern())?;
        writeln!(writer)?;
        Ok(SUCCESS_STATUS_CODE)
    }
}
