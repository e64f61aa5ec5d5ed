use super::{Environment, PackageId};
use std::path::{Path, PathBuf};

pub const INFO_FILE: &str = "info.json";
pub const DATA_DIR: &str = "data";

/// Where a package lives on disk, for every [Environment].
///
/// The layout is:
///
/// ```text
/// {packages_dir}/{repository_type}/{repository_root}/{group path}/{environment}/{artifact}-{version}/
///     info.json
///     data/...
/// ```
///
/// Other tools read this cache directly, so it must not change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactPaths {
    group_dir: PathBuf,
    package_name: String,
}

impl ArtifactPaths {
    pub fn new(
        packages_dir: &Path,
        repository_type: &str,
        repository_root: &str,
        id: &PackageId,
    ) -> Self {
        let group_dir = id
            .group()
            .split('.')
            .fold(packages_dir.join(repository_type).join(repository_root), |dir, part| {
                dir.join(part)
            });

        Self {
            group_dir,
            package_name: id.package_name(),
        }
    }

    /// The directory holding every environment of every artifact in this group.
    pub fn group_dir(&self) -> &Path {
        &self.group_dir
    }

    pub fn artifacts_dir(&self, env: Environment) -> PathBuf {
        self.group_dir.join(env.dir_name())
    }

    pub fn artifact_dir(&self, env: Environment) -> PathBuf {
        self.artifacts_dir(env).join(&self.package_name)
    }

    pub fn data_dir(&self, env: Environment) -> PathBuf {
        self.artifact_dir(env).join(DATA_DIR)
    }

    pub fn info_path(&self, env: Environment) -> PathBuf {
        self.artifact_dir(env).join(INFO_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_the_shared_cache_layout() {
        let id = PackageId::new("group1.subgroup1", "artifact1", "1.0").unwrap();
        let paths = ArtifactPaths::new(Path::new("/packages"), "test", "test_root", &id);

        let group_dir = Path::new("/packages/test/test_root/group1/subgroup1");
        assert_eq!(paths.group_dir(), group_dir);
        assert_eq!(
            paths.data_dir(Environment::Production),
            group_dir.join(".artifacts/artifact1-1.0/data")
        );
        assert_eq!(
            paths.info_path(Environment::Local),
            group_dir.join(".local-artifacts/artifact1-1.0/info.json")
        );
        assert_eq!(
            paths.artifact_dir(Environment::Tmp),
            group_dir.join(".tmp-artifacts/artifact1-1.0")
        );
    }
}
