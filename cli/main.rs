mod commands;
pub mod flags;
mod output;

use commands::*;
use structopt::StructOpt;
use tracing::{error, log};

#[derive(StructOpt, Debug, Clone)]
#[structopt(
    name = "darty",
    setting = structopt::clap::AppSettings::ColoredHelp,
    about = "Versioned data artifacts for your projects"
)]
struct Darty {
    #[structopt(subcommand, help = "the command to run")]
    cmd: Command,
}

impl Darty {
    async fn run(self) -> Result<(), anyhow::Error> {
        human_panic::setup_panic!(Metadata {
            name: "darty".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            authors: "".into(),
            homepage: "".into(),
        });

        let _ = env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .format_timestamp_micros()
            .format_module_path(false)
            .parse_env("DARTY_LOG")
            .try_init();

        let result = self.cmd.run().await;

        if let Err(ref err) = result {
            error!("{:?}", &err);
        };

        result
    }
}

#[derive(StructOpt, Debug, Clone)]
enum Command {
    Configure(ConfigureCommand),
    Download(DownloadCommand),
    Publish(PublishCommand),
    PublishLocal(PublishLocalCommand),
    Update(UpdateCommand),
}

impl Command {
    async fn run(self) -> Result<(), anyhow::Error> {
        match self {
            Command::Configure(x) => x.run().await,
            Command::Download(x) => x.run().await,
            Command::Publish(x) => x.run().await,
            Command::PublishLocal(x) => x.run().await,
            Command::Update(x) => x.run().await,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), anyhow::Error> {
    Darty::from_args().run().await
}
