// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::io::{Stderr, Stdout, Write};

use crate::rules::errors::Error;
use crate::rules::Result;

/// Where command output lands: the process streams when run from the shell, in-memory
/// buffers when a test drives the command.
pub struct Writer {
    buffer: WriteBuffer,
    err: WriteBuffer,
}

impl Default for Writer {
    fn default() -> Self {
        Self {
            buffer: WriteBuffer::Vec(vec![]),
            err: WriteBuffer::Vec(vec![]),
        }
    }
}

impl Writer {
    pub fn new(buffer: WriteBuffer) -> Self {
        Self {
            buffer,
            err: WriteBuffer::Stderr(std::io::stderr()),
        }
    }

    pub fn new_with_err(buffer: WriteBuffer, err: WriteBuffer) -> Self {
        Self { buffer, err }
    }

    pub fn write_err(&mut self, s: String) -> std::io::Result<()> {
        writeln!(self.err, "{s}")
    }

    pub fn err_writer(&mut self) -> &mut dyn Write {
        &mut self.err
    }

    pub fn into_string(self) -> Result<String> {
        self.buffer.into_string()
    }

    /// Captured stdout without ANSI color codes.
    pub fn stripped(self) -> Result<String> {
        self.buffer.stripped()
    }

    /// Captured stderr without ANSI color codes.
    pub fn err_to_stripped(self) -> Result<String> {
        self.err.stripped()
    }
}

impl Write for Writer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.buffer.flush()
    }
}

pub enum WriteBuffer {
    Stdout(Stdout),
    Stderr(Stderr),
    Vec(Vec<u8>),
}

impl WriteBuffer {
    fn captured(self) -> Result<Vec<u8>> {
        match self {
            WriteBuffer::Vec(vec) => Ok(vec),
            WriteBuffer::Stdout(..) | WriteBuffer::Stderr(..) => Err(Error::IllegalArguments(
                "output written to a process stream cannot be read back".to_string(),
            )),
        }
    }

    fn into_string(self) -> Result<String> {
        String::from_utf8(self.captured()?)
            .map_err(|e| Error::InvalidInput(format!("output is not utf-8: {e}")))
    }

    fn stripped(self) -> Result<String> {
        let stripped = strip_ansi_escapes::strip(self.captured()?)?;
        String::from_utf8(stripped)
            .map_err(|e| Error::InvalidInput(format!("output is not utf-8: {e}")))
    }
}

impl Write for WriteBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            WriteBuffer::Stdout(stdout) => stdout.write(buf),
            WriteBuffer::Stderr(stderr) => stderr.write(buf),
            WriteBuffer::Vec(vec) => vec.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            WriteBuffer::Stdout(stdout) => stdout.flush(),
            WriteBuffer::Stderr(stderr) => stderr.flush(),
            WriteBuffer::Vec(vec) => vec.flush(),
        }
    }
}
