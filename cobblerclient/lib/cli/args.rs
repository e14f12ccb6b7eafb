use clap::Parser;

use crate::models::ItemKind;

use super::styles;

//-------------------------------------------------------------------------------------------------
// Types
//-------------------------------------------------------------------------------------------------

/// cobblerctl - Inspect and manage the items on a Cobbler server
#[derive(Debug, Parser)]
#[command(name = "cobblerctl", author, about, version, styles=styles::styles())]
pub struct CobblerctlArgs {
    /// The subcommand to run
    #[command(subcommand)]
    pub subcommand: Option<CobblerctlSubcommand>,

    /// The API endpoint. Overrides `COBBLER_URL`
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available subcommands
#[derive(Debug, Parser)]
pub enum CobblerctlSubcommand {
    /// Show the server version
    #[command(name = "version")]
    Version,

    /// List the names of every item of a kind
    #[command(name = "list")]
    List {
        /// The item kind, e.g. `distro` or `profiles`
        #[arg(value_name = "KIND")]
        kind: ItemKind,
    },

    /// Show an item as JSON
    #[command(name = "show")]
    Show {
        /// The item kind
        #[arg(value_name = "KIND")]
        kind: ItemKind,

        /// The item's name
        #[arg(value_name = "NAME")]
        name: String,

        /// Ask the server to resolve inherited values
        #[arg(short, long)]
        resolved: bool,
    },

    /// Remove an item
    #[command(name = "remove")]
    Remove {
        /// The item kind
        #[arg(value_name = "KIND")]
        kind: ItemKind,

        /// The item's name
        #[arg(value_name = "NAME")]
        name: String,

        /// Also remove the item's children
        #[arg(short, long)]
        recursive: bool,
    },

    /// Regenerate the server's boot configuration
    #[command(name = "sync")]
    Sync {
        /// Run the sync as a background task and print its event id
        #[arg(short, long)]
        background: bool,
    },

    /// Show the status of a background task
    #[command(name = "status")]
    Status {
        /// The task's event id
        #[arg(value_name = "EVENT_ID")]
        event_id: String,

        /// Print the task's log as well
        #[arg(short, long)]
        log: bool,
    },
}

//-------------------------------------------------------------------------------------------------
// Tests
//-------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cobblerctl_args_definition_is_valid() {
        CobblerctlArgs::command().debug_assert();
    }

    #[test]
    fn test_cobblerctl_args_parse_show() -> anyhow::Result<()> {
        let args = CobblerctlArgs::try_parse_from([
            "cobblerctl",
            "show",
            "profiles",
            "centos9-web",
            "--resolved",
            "--url",
            "http://cobbler.example.com/cobbler_api",
        ])?;

        assert_eq!(
            args.url.as_deref(),
            Some("http://cobbler.example.com/cobbler_api")
        );
        match args.subcommand {
            Some(CobblerctlSubcommand::Show {
                kind,
                name,
                resolved,
            }) => {
                assert_eq!(kind, ItemKind::Profile);
                assert_eq!(name, "centos9-web");
                assert!(resolved);
            }
            other => panic!("unexpected subcommand: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_cobblerctl_args_reject_unknown_kind() {
        let result = CobblerctlArgs::try_parse_from(["cobblerctl", "list", "widgets"]);
        assert!(result.is_err());
    }
}
