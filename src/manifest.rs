//! `package.json` access: read the package descriptor, read embedded defaults,
//! and rewrite the version field.
//!
//! Documents are handled as `serde_json::Value` with key order preserved, so a
//! bump only changes the `version` fields.

use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ConfigLayer;
use crate::domain::{PackageDescriptor, VersionChange};
use crate::error::{PublishError, Result};

/// Manifest file name
pub const MANIFEST_FILE: &str = "package.json";

/// Key of the defaults object embedded in the manifest
pub const CONFIG_KEY: &str = "npm-publish";

/// Lockfiles whose version mirrors the manifest
const LOCKFILES: [&str; 2] = ["package-lock.json", "npm-shrinkwrap.json"];

/// A `package.json` on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    path: PathBuf,
}

impl Manifest {
    /// Finds the nearest `package.json` in `start_dir` or its ancestors.
    pub fn discover(start_dir: &Path) -> Result<Self> {
        start_dir
            .ancestors()
            .map(|dir| dir.join(MANIFEST_FILE))
            .find(|candidate| candidate.is_file())
            .map(|path| Manifest { path })
            .ok_or_else(|| {
                PublishError::manifest(format!(
                    "no {} found in {} or its parents",
                    MANIFEST_FILE,
                    start_dir.display()
                ))
            })
    }

    /// Uses the manifest at an exact path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Manifest { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the manifest, where the registry client runs
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Reads the package name and version.
    pub fn read(&self) -> Result<PackageDescriptor> {
        let document = read_document(&self.path)?;
        descriptor_from(&document, &self.path)
    }

    /// Reads the `"npm-publish"` defaults object, if the manifest has one.
    pub fn config_defaults(&self) -> Result<Option<ConfigLayer>> {
        let document = read_document(&self.path)?;
        match document.get(CONFIG_KEY) {
            None | Some(Value::Null) => Ok(None),
            Some(section) => serde_json::from_value(section.clone())
                .map(Some)
                .map_err(|e| {
                    PublishError::config(format!(
                        "invalid \"{}\" section in {}: {}",
                        CONFIG_KEY,
                        self.path.display(),
                        e
                    ))
                }),
        }
    }

    /// Rewrites the version field and returns the updated descriptor.
    ///
    /// Sibling lockfiles get the same version. Never touches git.
    ///
    /// Documents are re-serialized with their detected indentation and line endings,
    /// so objects written on a single line come back expanded over several lines.
    pub fn bump(&self, change: &VersionChange) -> Result<PackageDescriptor> {
        let raw = read_raw(&self.path)?;
        let mut document = parse_document(&raw, &self.path)?;
        let current = descriptor_from(&document, &self.path)?;
        let next = change.resolve(&current.version)?;
        let next_str = next.to_string();

        set_version(&mut document, &next_str);
        write_document(&self.path, &document, &Layout::detect(&raw))?;

        for lockfile in LOCKFILES {
            let lock_path = self.dir().join(lockfile);
            if !lock_path.is_file() {
                continue;
            }
            let lock_raw = read_raw(&lock_path)?;
            let mut lock = parse_document(&lock_raw, &lock_path)?;
            set_version(&mut lock, &next_str);
            if let Some(root) = lock
                .get_mut("packages")
                .and_then(|packages| packages.get_mut(""))
            {
                set_version(root, &next_str);
            }
            write_document(&lock_path, &lock, &Layout::detect(&lock_raw))?;
        }

        Ok(PackageDescriptor::new(current.name, next))
    }
}

fn read_raw(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| PublishError::manifest(format!("cannot read {}: {}", path.display(), e)))
}

fn parse_document(raw: &str, path: &Path) -> Result<Value> {
    let document: Value = serde_json::from_str(raw)
        .map_err(|e| PublishError::manifest(format!("malformed {}: {}", path.display(), e)))?;
    if !document.is_object() {
        return Err(PublishError::manifest(format!(
            "{} is not a JSON object",
            path.display()
        )));
    }
    Ok(document)
}

fn read_document(path: &Path) -> Result<Value> {
    parse_document(&read_raw(path)?, path)
}

fn descriptor_from(document: &Value, path: &Path) -> Result<PackageDescriptor> {
    let name = document
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| PublishError::manifest(format!("{} has no name", path.display())))?;
    let version = document
        .get("version")
        .and_then(Value::as_str)
        .ok_or_else(|| PublishError::manifest(format!("{} has no version", path.display())))?;
    let version = semver::Version::parse(version).map_err(|e| {
        PublishError::manifest(format!(
            "{} has invalid version '{}': {}",
            path.display(),
            version,
            e
        ))
    })?;
    Ok(PackageDescriptor::new(name, version))
}

fn set_version(document: &mut Value, version: &str) {
    if let Some(object) = document.as_object_mut() {
        if object.contains_key("version") {
            object.insert("version".to_string(), Value::String(version.to_string()));
        }
    }
}

/// Whitespace conventions of a document, reused when it is written back
#[derive(Debug, Clone, PartialEq, Eq)]
struct Layout {
    indent: String,
    crlf: bool,
}

impl Layout {
    fn detect(raw: &str) -> Self {
        Layout {
            indent: detect_indent(raw),
            crlf: raw.contains("\r\n"),
        }
    }
}

/// Indentation of the first nested line, defaulting to two spaces
fn detect_indent(raw: &str) -> String {
    raw.lines()
        .nth(1)
        .map(|line| {
            line.chars()
                .take_while(|c| *c == ' ' || *c == '\t')
                .collect::<String>()
        })
        .filter(|indent| !indent.is_empty())
        .unwrap_or_else(|| "  ".to_string())
}

fn write_document(path: &Path, document: &Value, layout: &Layout) -> Result<()> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(layout.indent.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    document
        .serialize(&mut serializer)
        .map_err(|e| PublishError::manifest(format!("cannot encode {}: {}", path.display(), e)))?;
    buffer.push(b'\n');

    // serde_json escapes newlines inside strings, so every raw '\n' is a line break
    if layout.crlf {
        buffer = buffer
            .into_iter()
            .flat_map(|b| if b == b'\n' { vec![b'\r', b'\n'] } else { vec![b] })
            .collect();
    }

    fs::write(path, buffer)
        .map_err(|e| PublishError::manifest(format!("cannot write {}: {}", path.display(), e)))
}
