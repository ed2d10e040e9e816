//! `config` subcommand: show current configuration and file path.

use std::path::Path;

use super::{Config, ConfigOutput, Result, kv, kv_width, to_json};
use ctlsnap_lib::CtlsnapError;

pub(super) fn cmd_config(
    config: &Config,
    custom_path: Option<&Path>,
    save: bool,
    json: bool,
) -> Result<()> {
    if let Err(errors) = config.validate() {
        for e in &errors {
            log::warn!("{e}");
        }
        if save {
            return Err(CtlsnapError::Config(format!(
                "refusing to save invalid configuration ({} problem{})",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            )));
        }
    }

    let config_path = custom_path.map(|p| p.to_path_buf()).or_else(Config::path);

    if save {
        match custom_path {
            Some(path) => config.save_to(path)?,
            None => config.save()?,
        }
        log::info!("configuration saved");
    }

    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());

    if json {
        let output = ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            settings: config.clone(),
        };
        println!("{}", to_json(&output, config.pretty)?);
        return Ok(());
    }

    let w = kv_width(&["Config file:", "device:", "pretty:"]);

    match &config_path {
        Some(p) if config_exists => kv("Config file:", format_args!("{} (loaded)", p.display()), w),
        Some(p) => kv(
            "Config file:",
            format_args!("{} (not found, using defaults)", p.display()),
            w,
        ),
        None => kv("Config file:", "(no config directory)", w),
    }
    println!();

    println!("Settings:");
    kv("device:", &config.device, w);
    kv("pretty:", config.pretty, w);
    Ok(())
}
