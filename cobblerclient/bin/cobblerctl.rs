use clap::{CommandFactory, Parser};
use cobblerclient::{
    cli::{self, CobblerctlArgs, CobblerctlSubcommand},
    client::{CobblerClient, ReadOptions, SyncOptions},
    config::ClientConfig,
};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

//--------------------------------------------------------------------------------------------------
// Functions: main
//--------------------------------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = CobblerctlArgs::parse();

    // Initialize tracing subscriber with EnvFilter, falling back to the verbosity flag
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if args.verbose { "cobblerclient=debug" } else { "warn" })
    });
    fmt()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_level(true)
        .with_env_filter(filter)
        .init();

    let Some(subcommand) = args.subcommand else {
        CobblerctlArgs::command().print_help()?;
        return Ok(());
    };

    let mut config = ClientConfig::from_env()?;
    if let Some(url) = args.url {
        config.set_url(url);
    }

    let client = CobblerClient::from_config(&config);
    if config.has_credentials() {
        client.login_with_config(&config).await?;
    }

    match subcommand {
        CobblerctlSubcommand::Version => {
            tracing::trace!("showing server version");
            print_json(&cli::show_version(&client).await?)?;
        }
        CobblerctlSubcommand::List { kind } => {
            tracing::trace!("listing items: kind={kind}");
            for name in client.list_item_names(kind).await? {
                println!("{name}");
            }
        }
        CobblerctlSubcommand::Show {
            kind,
            name,
            resolved,
        } => {
            tracing::trace!("showing item: kind={kind}, name={name}, resolved={resolved}");
            let options = ReadOptions::builder().resolved(resolved).build();
            print_json(&cli::show_item(&client, kind, &name, options).await?)?;
        }
        CobblerctlSubcommand::Remove {
            kind,
            name,
            recursive,
        } => {
            tracing::trace!("removing item: kind={kind}, name={name}, recursive={recursive}");
            client.delete_item(kind, &name, recursive).await?;
        }
        CobblerctlSubcommand::Sync { background } => {
            tracing::trace!("syncing: background={background}");
            if background {
                let event_id = client.background_sync(&SyncOptions::default()).await?;
                println!("{event_id}");
            } else {
                client.sync().await?;
            }
        }
        CobblerctlSubcommand::Status { event_id, log } => {
            tracing::trace!("showing task status: event_id={event_id}, log={log}");
            print_json(&cli::show_task(&client, &event_id, log).await?)?;
        }
    }

    if config.has_credentials() {
        client.logout().await?;
    }

    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
