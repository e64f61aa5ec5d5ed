use super::validators::*;
use std::fmt;

/// The `(group, artifact, version)` triple that identifies one version of a package.
///
/// Every part is validated on construction, so holding a `PackageId` means holding a well-formed
/// identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId {
    group: String,
    artifact: String,
    version: String,
}

impl PackageId {
    pub fn new<G, A, V>(group: G, artifact: A, version: V) -> Result<Self, ValidationError>
    where
        G: Into<String>,
        A: Into<String>,
        V: Into<String>,
    {
        let group = group.into();
        let artifact = artifact.into();
        let version = version.into();

        validate_group(&group)?;
        validate_artifact(&artifact)?;
        validate_version(&version)?;

        Ok(Self {
            group,
            artifact,
            version,
        })
    }

    pub fn group(&self) -> &str {
        self.group.as_ref()
    }

    pub fn artifact(&self) -> &str {
        self.artifact.as_ref()
    }

    pub fn version(&self) -> &str {
        self.version.as_ref()
    }

    /// The group with every dot turned into a `/`, as used by all storage layouts.
    pub fn group_path(&self) -> String {
        self.group.replace('.', "/")
    }

    /// The `artifact-version` name of the directory (or archive) holding this package.
    pub fn package_name(&self) -> String {
        format!("{}-{}", self.artifact, self.version)
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_storage_names() {
        let id = PackageId::new("group1.subgroup1", "artifact1", "1.0").unwrap();
        assert_eq!(id.group_path(), "group1/subgroup1");
        assert_eq!(id.package_name(), "artifact1-1.0");
        assert_eq!(id.to_string(), "group1.subgroup1:artifact1:1.0");
    }

    #[test]
    fn rejects_malformed_parts() {
        assert_matches!(
            PackageId::new("", "artifact1", "1.0"),
            Err(ValidationError::Missing { field: "Group name" })
        );
        assert_matches!(
            PackageId::new("group1", "Artifact", "1.0"),
            Err(ValidationError::InvalidFormat { field: "Artifact name", .. })
        );
        assert_matches!(
            PackageId::new("group1", "artifact1", "one"),
            Err(ValidationError::InvalidFormat { field: "Version number", .. })
        );
    }
}
