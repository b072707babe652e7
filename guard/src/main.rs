// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::process::exit;

use clap::Parser;
use simple_logger::SimpleLogger;

use tag_guard::commands::{Executable, TagGuard, ERROR_STATUS_CODE};
use tag_guard::utils::reader::{ReadBuffer, Reader};
use tag_guard::utils::writer::{WriteBuffer, Writer};

fn main() {
    let cli = TagGuard::parse();

    if let Err(e) = SimpleLogger::new().with_level(cli.log_level()).init() {
        eprintln!("unable to initialize logging {e}");
    }

    let mut writer = Writer::new_with_err(
        WriteBuffer::Stdout(std::io::stdout()),
        WriteBuffer::Stderr(std::io::stderr()),
    );
    let mut reader = Reader::new(ReadBuffer::Stdin(std::io::stdin()));

    match cli.command.execute(&mut writer, &mut reader) {
        Ok(code) => exit(code),
        Err(e) => {
            log::debug!("command failed {e:?}");
            if writer.write_err(format!("Error occurred {e}")).is_err() {
                eprintln!("Error occurred {e}");
            }
            exit(ERROR_STATUS_CODE)
        }
    }
}
