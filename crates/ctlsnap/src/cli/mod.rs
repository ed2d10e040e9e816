//! CLI subcommands: control listing, card discovery, configuration.

mod cards;
mod config_cmd;
mod list;

use std::path::Path;

use clap::Subcommand;
use serde::Serialize;

pub(super) use ctlsnap_lib::config::Config;
pub(super) use ctlsnap_lib::device::{self, DiscoveredCard};
pub(super) use ctlsnap_lib::error::Result;

const PADDING: usize = 2;

/// Compute alignment width for a column of keys, with PADDING spaces after
/// the longest one.
pub(super) fn kv_width(keys: &[&str]) -> usize {
    keys.iter()
        .map(|k| k.len())
        .max()
        .map_or(0, |max| max + PADDING)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<width$}{value}", width = w)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv(key, value, w));
}

/// Serialize for stdout, honoring the `pretty` setting.
pub(super) fn to_json(value: &impl Serialize, pretty: bool) -> Result<String> {
    let out = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    out.map_err(|e| std::io::Error::other(e).into())
}

/// Load the config from `custom_path` if given, else from the default location.
pub(super) fn load_config(custom_path: Option<&Path>) -> Config {
    match custom_path {
        Some(path) => {
            let (config, warnings) = Config::load_from(path);
            for w in &warnings {
                log::warn!("{w}");
            }
            config
        }
        None => Config::load(),
    }
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct CardsOutput {
    pub count: usize,
    pub cards: Vec<DiscoveredCard>,
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub settings: Config,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the controls of a control device
    List {
        /// Control device name, e.g. `hw:0` (default: from config)
        device: Option<String>,
        /// List the controls of every sound card
        #[arg(long, conflicts_with = "device")]
        all: bool,
    },

    /// List sound cards and their control devices
    Cards,

    /// Show current configuration and file path
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

pub fn run(cmd: Command, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    match cmd {
        Command::List { device, all } => {
            if all {
                list::cmd_list_all(&config, json)
            } else {
                let device = device.unwrap_or_else(|| config.device.clone());
                list::cmd_list(&device, &config, json)
            }
        }
        Command::Cards => cards::cmd_cards(&config, json),
        Command::Config { save } => config_cmd::cmd_config(&config, config_path, save, json),
    }
}
