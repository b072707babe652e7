// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::io::{Cursor, Read, Stdin};

/// Where a command reads piped input from: stdin from the shell, a cursor in tests.
pub struct Reader {
    inner: ReadBuffer,
}

impl Read for Reader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            ReadBuffer::Stdin(stdin) => stdin.read(buf),
            ReadBuffer::Cursor(cursor) => cursor.read(buf),
        }
    }
}

impl Default for Reader {
    fn default() -> Self {
        Self::new(ReadBuffer::Cursor(Cursor::new(vec![])))
    }
}

impl Reader {
    pub fn new(stdin: ReadBuffer) -> Self {
        Self { inner: stdin }
    }

    pub fn from_payload(payload: impl Into<String>) -> Self {
        Self::new(ReadBuffer::Cursor(Cursor::new(payload.into().into_bytes())))
    }
}

pub enum ReadBuffer {
    Stdin(Stdin),
    Cursor(Cursor<Vec<u8>>),
}
