use crate::flags::ProjectFlags;
use crate::output::ConsoleOutput;
use anyhow::*;
use darty_core::Output;
use structopt::StructOpt;

#[derive(StructOpt, Debug, Clone)]
#[structopt(
    name = "download",
    setting = structopt::clap::AppSettings::ColoredHelp,
    about = "Download dependencies"
)]
pub struct DownloadCommand {
    #[structopt(flatten)]
    flags: ProjectFlags,
}

impl DownloadCommand {
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let index = self.flags.index().await?;
        let dependencies = index.select(self.flags.group(), self.flags.artifact())?;
        let output = ConsoleOutput::new();

        let mut failed = 0;
        for dependency in &dependencies {
            if dependency.download(&output).await?.is_none() {
                failed += 1;
            }
            output.write("");
        }

        if failed > 0 {
            bail!(
                "{} of {} packages could not be downloaded",
                failed,
                dependencies.len()
            );
        }

        Ok(())
    }
}
