// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::io::Write;

use clap::Args;

use crate::commands::{Executable, SUCCESS_STATUS_CODE};
use crate::events::{extract_resources, parse_event};
use crate::rules::Result;
use crate::utils::reader::Reader;
use crate::utils::writer::Writer;

const ABOUT: &str = "Shows the resources a CloudTrail creation event yields for checking";
const EVENT_HELP: &str = "Provide a CloudTrail event file in JSON or YAML, as delivered by EventBridge";
const YAML_HELP: &str = "Print the extraction as YAML instead of JSON";

#[derive(Debug, Clone, Eq, PartialEq, Args)]
#[command(about = ABOUT, arg_required_else_help = true)]
pub struct Extract {
    #[arg(short, long, help = EVENT_HELP)]
    pub(crate) event: String,
    #[arg(short = 'y', long = "print-yaml", help = YAML_HELP)]
    pub(crate) print_yaml: bool,
}

impl Executable for Extract {
    fn execute(&self, writer: &mut Writer, _: &mut Reader) -> Result<i32> {
        let event = parse_event(&fs::read_to_string(&self.event)?)?;
        let extraction = extract_resources(&event)?;
        if self.print_yaml {
            serde_yaml::to_writer(&mut *writer, &extraction)?;
        } else {
            serde_json::to_writer_pretty(&mut *writer, &extraction)?;
            writeln!(writer)?;
        }
        Ok(SUCCESS_STATUS_CODE)
    }
}
