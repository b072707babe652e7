// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::io::{Read, Write};

use clap::{ArgGroup, Args, ValueEnum};
use serde::Deserialize;

use crate::commands::{Executable, FAILURE_STATUS_CODE, SUCCESS_STATUS_CODE};
use crate::events::{extract_resources, parse_event, Extraction};
use crate::rules::display::{print_report, print_summary};
use crate::rules::evaluate::evaluate;
use crate::rules::model::{normalize_rules, ComplianceReport, Resource, Rule};
use crate::rules::Result;
use crate::store::{read_resources, FileRuleStore, RuleStore};
use crate::utils::reader::Reader;
use crate::utils::writer::Writer;

const ABOUT: &str = "Checks resources against tag compliance rules";
const RULES_HELP: &str = "Provide a rules file or a directory of rules files. Supports passing multiple values by using this option repeatedly.\
                          \nExample:\n --rules rules.yaml --rules ./team-rules\
                          \nFor directories, only .json, .jsn, .yaml and .yml files are read";
const RESOURCE_HELP: &str = "Provide a resource file or a directory of resource files, each holding one resource or a list of them. Supports passing multiple values by using this option repeatedly.";
const EVENT_HELP: &str = "Provide a CloudTrail event, as delivered by EventBridge, to take the created resources from";
const PAYLOAD_HELP: &str = "Provide rules and resources in the following JSON format via STDIN,\n{\"rules\":[{\"ruleId\":\"<id>\", \"tagKey\":\"<key>\"}, ...], \"resources\":[{\"resourceId\":\"<id>\", \"resourceType\":\"<type>\", \"tags\":{...}}, ...]}";
const OUTPUT_FORMAT_HELP: &str = "Specify the format in which the output should be displayed";
const SHOW_SUMMARY_HELP: &str = "Lists every applicable rule with its status for each resource";

#[derive(Copy, Eq, Clone, Debug, PartialEq, ValueEnum)]
pub enum OutputFormatType {
    SingleLineSummary,
    #[value(name = "json")]
    JSON,
    #[value(name = "yaml")]
    YAML,
}

#[derive(Deserialize, Debug)]
pub(crate) struct Payload {
    #[serde(default)]
    rules: Vec<Rule>,
    #[serde(default)]
    resources: Vec<Resource>,
}

#[derive(Debug, Clone, Eq, PartialEq, Args)]
#[command(about = ABOUT)]
#[command(group(ArgGroup::new("input").args(["resources", "event", "payload"]).required(true)))]
/// .
/// The check command evaluates resources against tag compliance rules and reports the
/// violations it finds
pub struct Check {
    #[arg(short, long, help = RULES_HELP, conflicts_with = "payload", required_unless_present = "payload")]
    pub(crate) rules: Vec<String>,
    #[arg(short = 'd', long = "resource", help = RESOURCE_HELP)]
    pub(crate) resources: Vec<String>,
    #[arg(short, long, help = EVENT_HELP)]
    pub(crate) event: Option<String>,
    #[arg(short = 'P', long, help = PAYLOAD_HELP)]
    pub(crate) payload: bool,
    #[arg(short, long, help = OUTPUT_FORMAT_HELP, value_enum, default_value_t = OutputFormatType::SingleLineSummary)]
    pub(crate) output_format: OutputFormatType,
    #[arg(short = 'S', long, help = SHOW_SUMMARY_HELP)]
    pub(crate) show_summary: bool,
}

impl Executable for Check {
    /// .
    /// Evaluates every resource against the rules
    ///
    /// Returns the failure status code when any resource is non-compliant. This function
    /// will return an error if
    /// - any of the specified paths do not exist
    /// - illegal json or yaml syntax is present in any of the rule or resource files
    /// - a rule has an empty tag key or a resource lacks its id or type
    fn execute(&self, writer: &mut Writer, reader: &mut Reader) -> Result<i32> {
        let (rules, resources) = if self.payload {
            let mut context = String::new();
            reader.read_to_string(&mut context)?;
            let payload = crate::rules::read_document::<Payload>(&context)?;
            (normalize_rules(payload.rules)?, payload.resources)
        } else {
            let rules = FileRuleStore::new(self.rules.iter().cloned()).rules()?;
            match &self.event {
                Some(event) => match self.resources_from_event(event, writer)? {
                    Some(resources) => (rules, resources),
                    None => return Ok(SUCCESS_STATUS_CODE),
                },
                None => (rules, read_resources(&self.resources)?),
            }
        };
        log::info!(
            "checking {} resource(s) against {} rule(s)",
            resources.len(),
            rules.len()
        );

        let reports = resources
            .iter()
            .map(|resource| evaluate(resource, &rules))
            .collect::<Result<Vec<ComplianceReport>>>()?;

        self.print(writer, &reports, &rules)?;

        Ok(if reports.iter().all(|report| report.compliant) {
            SUCCESS_STATUS_CODE
        } else {
            FAILURE_STATUS_CODE
        })
    }
}

impl Check {
    fn resources_from_event(&self, event: &str, writer: &mut Writer) -> Result<Option<Vec<Resource>>> {
        let event = parse_event(&fs::read_to_string(event)?)?;
        match extract_resources(&event)? {
            Extraction::Resources(found) => {
                log::info!(
                    "{} {} created {} resource(s), by {}",
                    found.context.event_source,
                    found.context.event_name,
                    found.resources.len(),
                    found.context.creator
                );
                Ok(Some(found.resources))
            }
            Extraction::Skipped { resource_type } => {
                writer.write_err(format!(
                    "Check skipped, {resource_type} was not created by this event"
                ))?;
                Ok(None)
            }
            Extraction::Unsupported {
                event_source,
                event_name,
            } => {
                writer.write_err(format!(
                    "Event {event_source} {event_name} is not applicable for tag compliance check"
                ))?;
                Ok(None)
            }
        }
    }

    fn print(&self, writer: &mut Writer, reports: &[ComplianceReport], rules: &[Rule]) -> Result<()> {
        match self.output_format {
            OutputFormatType::SingleLineSummary => {
                for report in reports {
                    print_report(writer, report)?;
                    if self.show_summary {
                        print_summary(writer, report, rules)?;
                    }
                }
            }
            OutputFormatType::JSON => {
                serde_json::to_writer_pretty(&mut *writer, reports)?;
                writeln!(writer)?;
            }
            OutputFormatType::YAML => serde_yaml::to_writer(&mut *writer, reports)?,
        }
        Ok(())
    }
}
