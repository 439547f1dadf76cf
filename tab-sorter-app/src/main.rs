use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tab_sorter_app::cli::{Cli, Commands, ConfigAction};
use tab_sorter_app::commands::{self, Session};
use tab_sorter_app::snapshot::SnapshotFile;
use tab_sorter_settings::{SettingsStore, YamlSettingsStore};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let store = match &cli.settings {
        Some(path) => YamlSettingsStore::new(path),
        None => YamlSettingsStore::default_location(),
    };

    if let Commands::Config { action } = &cli.command {
        return match action {
            ConfigAction::Show => commands::run_config_show(&store).await,
            ConfigAction::SetKey { key } => {
                let key = key.clone();
                commands::run_config_update(&store, move |s| s.api_key = key).await
            }
            ConfigAction::SetModel { model } => {
                let model = model.clone();
                commands::run_config_update(&store, move |s| s.model_id = model).await
            }
        };
    }

    let settings = store.load().await?.with_env_overrides();
    settings.validate()?;

    let session = Session::open(SnapshotFile::new(&cli.snapshot), &settings).await?;

    match cli.command {
        Commands::Tabs => commands::run_tabs(&session).await,
        Commands::Cleanup {
            apply,
            stale_minutes,
        } => commands::run_cleanup(&session, &settings, apply, stale_minutes).await,
        Commands::Strategy => commands::run_strategy(&session).await,
        Commands::Classify {
            apply,
            model,
            exclude,
            timeout,
        } => {
            let mut settings = settings;
            if let Some(model) = model {
                settings.model_id = model;
            }
            commands::run_classify(
                &session,
                &settings,
                apply,
                &exclude,
                Duration::from_secs(timeout),
            )
            .await
        }
        Commands::Config { .. } => Ok(()),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
