use crate::flags::ProjectFlags;
use crate::output::ConsoleOutput;
use anyhow::*;
use darty_core::{Dependency, Output};
use dialoguer::Select;
use structopt::StructOpt;

#[derive(StructOpt, Debug, Clone)]
#[structopt(
    name = "publish",
    setting = structopt::clap::AppSettings::ColoredHelp,
    about = "Publish a package to its repository"
)]
pub struct PublishCommand {
    #[structopt(
        help = r"Replace a version of the package that was published locally.",
        short = "r",
        long = "rewrite-local"
    )]
    rewrite_local: bool,

    #[structopt(flatten)]
    flags: ProjectFlags,
}

impl PublishCommand {
    pub async fn run(self) -> Result<(), anyhow::Error> {
        publish(&self.flags, false, self.rewrite_local).await
    }
}

#[derive(StructOpt, Debug, Clone)]
#[structopt(
    name = "publish-local",
    setting = structopt::clap::AppSettings::ColoredHelp,
    about = "Publish a package on this machine only"
)]
pub struct PublishLocalCommand {
    #[structopt(
        help = r"Replace the local version of the package if it exists.",
        short = "r",
        long = "rewrite"
    )]
    rewrite: bool,

    #[structopt(flatten)]
    flags: ProjectFlags,
}

impl PublishLocalCommand {
    pub async fn run(self) -> Result<(), anyhow::Error> {
        publish(&self.flags, true, self.rewrite).await
    }
}

async fn publish(flags: &ProjectFlags, local: bool, rewrite_local: bool) -> Result<(), anyhow::Error> {
    let index = flags.index().await?;
    let dependencies = index.select(flags.group(), flags.artifact())?;
    let dependency = choose(&dependencies)?;

    let output = ConsoleOutput::new();
    if !dependency.publish(local, rewrite_local, &output).await? {
        bail!("Package \"{}\" was not published", dependency.id());
    }

    Ok(())
}

/// Picks the one dependency to publish, asking the user when there is more than one.
fn choose<'a>(dependencies: &[&'a Dependency]) -> Result<&'a Dependency, anyhow::Error> {
    match dependencies {
        [] => bail!("No packages to publish"),
        [dependency] => Ok(*dependency),
        _ => {
            if !console::Term::stdout().is_term() {
                bail!("Multiple packages detected, use --group and --artifact to select one");
            }

            let theme = dialoguer::theme::ColorfulTheme::default();
            let items: Vec<String> = dependencies.iter().map(|d| d.id().to_string()).collect();
            let selected = Select::with_theme(&theme)
                .with_prompt("Multiple packages detected, select one to publish")
                .items(&items)
                .default(0)
                .interact()?;

            Ok(dependencies[selected])
        }
    }
}
