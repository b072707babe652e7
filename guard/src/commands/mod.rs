// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

pub mod check;
pub mod completions;
pub mod event_pattern;
pub mod extract;

use clap::{ArgAction, Parser, Subcommand};

use crate::rules::Result;
use crate::utils::reader::Reader;
use crate::utils::writer::Writer;

//
// Constants
//
// Application metadata
pub const APP_NAME: &str = "tag-guard";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
// Commands
pub const CHECK: &str = "check";
pub const EXTRACT: &str = "extract";
pub const EVENT_PATTERN: &str = "event-pattern";
pub const COMPLETIONS: &str = "completions";
// Arguments for check
pub const RULES: (&str, char) = ("rules", 'r');
pub const RESOURCE: (&str, char) = ("resource", 'd');
pub const PAYLOAD: (&str, char) = ("payload", 'P');
pub const OUTPUT_FORMAT: (&str, char) = ("output-format", 'o');
pub const SHOW_SUMMARY: (&str, char) = ("show-summary", 'S');
// Arguments for check, extract
pub const EVENT: (&str, char) = ("event", 'e');
// Arguments for event-pattern
pub const SETTINGS: (&str, char) = ("settings", 's');

pub const FAILURE_STATUS_CODE: i32 = 19;
pub const SUCCESS_STATUS_CODE: i32 = 0;
pub const ERROR_STATUS_CODE: i32 = 5;

const ABOUT: &str = r#"
  Tag Guard checks newly created AWS resources against tag compliance rules.
  A rule names a required tag key, optionally the values it may take and the
  resource types it applies to. Resources come from JSON/YAML files or straight
  from the CloudTrail creation events EventBridge delivers."#;

pub trait Executable {
    fn execute(&self, writer: &mut Writer, reader: &mut Reader) -> Result<i32>;
}

#[derive(Debug, Parser)]
#[command(name = APP_NAME, version = APP_VERSION, about = ABOUT, arg_required_else_help = true)]
pub struct TagGuard {
    /// Raise the log level, once for info, twice for debug, three times for trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Check(check::Check),
    Extract(extract::Extract),
    EventPattern(event_pattern::EventPattern),
    Completions(completions::Completions),
}

impl Executable for Commands {
    fn execute(&self, writer: &mut Writer, reader: &mut Reader) -> Result<i32> {
        match self {
            Commands::Check(cmd) => cmd.execute(writer, reader),
            Commands::Extract(cmd) => cmd.execute(writer, reader),
            Commands::EventPattern(cmd) => cmd.execute(writer, reader),
            Commands::Completions(cmd) => cmd.execute(writer, reader),
        }
    }
}

impl TagGuard {
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
