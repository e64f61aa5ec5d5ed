use anyhow::Context;
use darty_core::{Config, DependencyIndex};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Default, Debug, Clone, StructOpt)]
pub struct Flags {
    #[structopt(
        help = r"The settings profile to use.",
        long = "profile",
        default_value = "default"
    )]
    pub(crate) profile: String,

    #[structopt(
        help = r"Where packages are kept on this machine. Overrides the profile setting.",
        long = "packages-dir"
    )]
    pub(crate) packages_dir: Option<String>,
}

impl Flags {
    pub async fn config(&self) -> Result<Config, anyhow::Error> {
        let mut config = Config::from_profile(&self.profile)
            .await
            .context("Could not load settings")?;

        if let Some(packages_dir) = &self.packages_dir {
            config.set_packages_dir(packages_dir);
        }

        Ok(config)
    }
}

/// Flags for the commands that work on the project file.
#[derive(Default, Debug, Clone, StructOpt)]
pub struct ProjectFlags {
    #[structopt(
        help = r"Path to the project's configuration file.",
        short = "c",
        long = "config",
        default_value = "darty.yaml"
    )]
    pub(crate) config: PathBuf,

    #[structopt(help = r"Group name of the package.", long = "group")]
    pub(crate) group: Option<String>,

    #[structopt(help = r"Artifact name of the package.", long = "artifact")]
    pub(crate) artifact: Option<String>,

    #[structopt(flatten)]
    pub(crate) flags: Flags,
}

impl ProjectFlags {
    pub async fn index(&self) -> Result<DependencyIndex, anyhow::Error> {
        let config = self.flags.config().await?;
        let index = DependencyIndex::load(&config, &self.config).await?;
        Ok(index)
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn artifact(&self) -> Option<&str> {
        self.artifact.as_deref()
    }
}
