use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::*;

static GROUP_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*(\.[a-z_][a-z0-9_]*)*$").unwrap());

static ARTIFACT_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_-]*[a-z0-9]$").unwrap());

static VERSION_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^v?[0-9]+(\.[0-9]+){0,2}([a-z-][a-z0-9-][a-z0-9]*)?$").unwrap());

static REPOSITORY_TYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9_]+$").unwrap());

static REPOSITORY_ROOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9_-]+$").unwrap());

static PATH_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").unwrap());

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must be specified")]
    Missing { field: &'static str },

    #[error("{field} has invalid format: {value:?}")]
    InvalidFormat { field: &'static str, value: String },
}

fn check(field: &'static str, value: &str, pattern: &Regex) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Missing { field });
    }
    if !pattern.is_match(value) {
        return Err(ValidationError::InvalidFormat {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

pub fn validate_group(group: &str) -> Result<(), ValidationError> {
    check("Group name", group, &GROUP_NAME)
}

pub fn validate_artifact(artifact: &str) -> Result<(), ValidationError> {
    check("Artifact name", artifact, &ARTIFACT_NAME)
}

pub fn validate_version(version: &str) -> Result<(), ValidationError> {
    check("Version number", version, &VERSION_NUMBER)
}

pub fn validate_repository_type(repository_type: &str) -> Result<(), ValidationError> {
    check("Repository type", repository_type, &REPOSITORY_TYPE)
}

pub fn validate_repository_root(root: &str) -> Result<(), ValidationError> {
    check("Repository root", root, &REPOSITORY_ROOT)
}

/// Whether a `/`-separated relative path stays inside the directory it is joined onto.
pub fn is_contained_path(path: &str) -> bool {
    !path.starts_with('/')
        && path
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

/// A package file path is relative, `/`-separated, and never walks out of its package.
pub fn validate_file_path(path: &str) -> Result<(), ValidationError> {
    if path.is_empty() {
        return Err(ValidationError::Missing { field: "Path" });
    }

    let well_formed = path
        .split('/')
        .all(|segment| segment != "." && segment != ".." && PATH_SEGMENT.is_match(segment));

    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "Path",
            value: path.to_string(),
        });
    }
    Ok(())
}
