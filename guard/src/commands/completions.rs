// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use clap::{Args, CommandFactory, ValueEnum};

use crate::commands::{Executable, TagGuard, APP_NAME, SUCCESS_STATUS_CODE};
use crate::rules::Result;
use crate::utils::reader::Reader;
use crate::utils::writer::Writer;

#[derive(Copy, Clone, Eq, PartialEq, ValueEnum, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Debug, Clone, Eq, PartialEq, Args)]
#[command(about = "Generate auto-completions for all the sub-commands in shell")]
pub struct Completions {
    #[arg(long, short, required = true, help = "the shell you are currently running")]
    pub(crate) shell: Shell,
}

impl Executable for Completions {
    fn execute(&self, writer: &mut Writer, _: &mut Reader) -> Result<i32> {
        let mut app = TagGuard::command();

        match self.shell {
            Shell::Bash => {
                clap_complete::generate(clap_complete::shells::Bash, &mut app, APP_NAME, writer)
            }
            Shell::Zsh => {
                clap_complete::generate(clap_complete::shells::Zsh, &mut app, APP_NAME, writer)
            }
            Shell::Fish => {
                clap_complete::generate(clap_complete::shells::Fish, &mut app, APP_NAME, writer)
            }
        }

        Ok(SUCCESS_STATUS_CODE)
    }
}
