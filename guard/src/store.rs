// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::rules::errors::Error;
use crate::rules::model::{normalize_rules, Resource, Rule};
use crate::rules::{parse_resources, parse_rules, Result};

pub const DOCUMENT_EXTENSIONS: [&str; 4] = ["json", "jsn", "yaml", "yml"];

/// The read path for compliance rules. Every call returns the current rules, normalized.
pub trait RuleStore {
    fn rules(&self) -> Result<Vec<Rule>>;
}

pub(crate) fn read_file_content(file: File) -> std::result::Result<String, std::io::Error> {
    let mut file_content = String::new();
    let mut buf_reader = BufReader::new(file);
    buf_reader.read_to_string(&mut file_content)?;
    Ok(file_content)
}

pub(crate) fn alphabetical(first: &DirEntry, second: &DirEntry) -> Ordering {
    first.file_name().cmp(second.file_name())
}

fn has_document_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| DOCUMENT_EXTENSIONS.contains(&ext))
}

/// Expands `path` to the documents it names. A file is taken as is, whatever its extension;
/// a directory is walked recursively for JSON and YAML files in alphabetical order.
pub(crate) fn document_files(path: &str) -> Result<Vec<PathBuf>> {
    let base = PathBuf::from(path);
    if !base.exists() {
        return Err(Error::FileNotFoundError(path.to_string()));
    }
    if base.is_file() {
        return Ok(vec![base]);
    }

    let mut selected = Vec::with_capacity(10);
    let walker = WalkDir::new(&base).sort_by(alphabetical).into_iter();
    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() && has_document_extension(entry.path()) {
            selected.push(entry.into_path());
        }
    }
    Ok(selected)
}

/// Reads every document under `paths`, in order, pairing each with the file it came from.
pub(crate) fn read_documents(paths: &[String]) -> Result<Vec<(PathBuf, String)>> {
    let mut documents = Vec::new();
    for path in paths {
        for file in document_files(path)? {
            let content = read_file_content(File::open(&file)?)?;
            documents.push((file, content));
        }
    }
    Ok(documents)
}

fn with_file_context(file: &Path, err: Error) -> Error {
    match err {
        Error::InvalidInput(msg) => {
            Error::InvalidInput(format!("{}: {msg}", file.display()))
        }
        other => other,
    }
}

/// Rules kept as JSON or YAML files on disk, the way a CLI user maintains them next to the
/// resources they check.
#[derive(Debug, Clone)]
pub struct FileRuleStore {
    paths: Vec<String>,
}

impl FileRuleStore {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FileRuleStore {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }
}

impl RuleStore for FileRuleStore {
    fn rules(&self) -> Result<Vec<Rule>> {
        let mut rules = Vec::new();
        for (file, content) in read_documents(&self.paths)? {
            let mut from_file = parse_rules(&content).map_err(|e| with_file_context(&file, e))?;
            rules.append(&mut from_file);
        }
        // each file was normalized on its own, positions here are across all files
        normalize_rules(rules)
    }
}

pub fn read_resources(paths: &[String]) -> Result<Vec<Resource>> {
    let mut resources = Vec::new();
    for (file, content) in read_documents(paths)? {
        let mut from_file =
            parse_resources(&content).map_err(|e| with_file_context(&file, e))?;
        resources.append(&mut from_file);
    }
    Ok(resources)
}
