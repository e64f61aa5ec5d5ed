use crate::flags::Flags;
use anyhow::*;
use darty_core::{ProfileSettings, SettingsFile};
use dialoguer::Input;
use structopt::StructOpt;

#[derive(StructOpt, Debug, Clone)]
#[structopt(
    name = "configure",
    setting = structopt::clap::AppSettings::ColoredHelp,
    about = "Configure the tool"
)]
pub struct ConfigureCommand {
    #[structopt(flatten)]
    flags: Flags,
}

impl ConfigureCommand {
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let config = self.flags.config().await?;

        let packages_dir = match &self.flags.packages_dir {
            Some(packages_dir) => packages_dir.clone(),
            None => {
                let theme = dialoguer::theme::ColorfulTheme::default();
                let packages_dir: String = Input::with_theme(&theme)
                    .with_prompt("Directory where all the packages will be stored")
                    .default(config.packages_dir().to_string_lossy().to_string())
                    .show_default(true)
                    .interact_text()?;
                packages_dir
            }
        };

        let mut settings = SettingsFile::read(config.settings_path()).await?;
        settings.set_profile(
            config.profile(),
            ProfileSettings {
                packages_dir: Some(packages_dir),
            },
        );
        settings.save(config.settings_path()).await?;

        println!(
            "Profile \"{}\" saved to {}",
            config.profile(),
            config.settings_path().display()
        );

        Ok(())
    }
}
