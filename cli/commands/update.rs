use crate::flags::ProjectFlags;
use crate::output::ConsoleOutput;
use anyhow::*;
use darty_core::Output;
use structopt::StructOpt;

#[derive(StructOpt, Debug, Clone)]
#[structopt(
    name = "update",
    setting = structopt::clap::AppSettings::ColoredHelp,
    about = "Download dependencies and copy them into their working directories"
)]
pub struct UpdateCommand {
    #[structopt(
        help = r"Replace the content of working directories that are not empty.",
        short = "r",
        long = "rewrite-working-dir"
    )]
    rewrite_working_dir: bool,

    #[structopt(flatten)]
    flags: ProjectFlags,
}

impl UpdateCommand {
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let index = self.flags.index().await?;
        let dependencies = index.select(self.flags.group(), self.flags.artifact())?;
        let output = ConsoleOutput::new();

        let mut failed = 0;
        for dependency in &dependencies {
            if !dependency.update(self.rewrite_working_dir, &output).await? {
                failed += 1;
            }
            output.write("");
        }

        if failed > 0 {
            bail!(
                "{} of {} packages could not be updated",
                failed,
                dependencies.len()
            );
        }

        Ok(())
    }
}
