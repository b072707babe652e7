// Copyright Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use clap::Parser;
use tag_guard::commands::{Executable, TagGuard, APP_NAME, ERROR_STATUS_CODE};
use tag_guard::utils::reader::Reader;
use tag_guard::utils::writer::Writer;

#[non_exhaustive]
pub struct StatusCode;

#[allow(dead_code)]
impl StatusCode {
    pub const SUCCESS: i32 = 0;
    pub const COMMAND_MAPPING_ERROR: i32 = -2;
    pub const ERROR: i32 = ERROR_STATUS_CODE;
    pub const NON_COMPLIANT: i32 = 19;
}

pub fn get_full_path_for_resource_file(path: &str) -> String {
    let mut resource = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    resource.push(path);
    resource.display().to_string()
}

#[allow(dead_code)]
pub fn compare_write_buffer_with_string(expected_output: &str, actual_output_writer: Writer) {
    let actual_output = actual_output_writer.stripped().unwrap();
    assert_eq!(expected_output, actual_output)
}

pub trait CommandTestRunner {
    fn build_args(&self) -> Vec<String>;

    fn run(&self, writer: &mut Writer, reader: &mut Reader) -> i32 {
        let args = self.build_args();
        let command_options = std::iter::once(String::from(APP_NAME)).chain(args);

        let cli = match TagGuard::try_parse_from(command_options) {
            Ok(cli) => cli,
            Err(e) => {
                writer
                    .write_err(e.to_string())
                    .expect("failed to write to stderr");
                return StatusCode::COMMAND_MAPPING_ERROR;
            }
        };

        match cli.command.execute(writer, reader) {
            Err(e) => {
                writer
                    .write_err(format!("Error occurred {e}"))
                    .expect("failed to write to stderr");

                StatusCode::ERROR
            }
            Ok(code) => code,
        }
    }
}

#[macro_export]
macro_rules! assert_output_from_str_eq {
    ($expected_output: expr, $actual_output_writer: expr) => {
        $crate::utils::compare_write_buffer_with_string($expected_output, $actual_output_writer)
    };
}
