use anyhow::{Context as _, Result, bail};
use colored::Colorize;
use log::debug;
use std::sync::Arc;
use waypoint_client::{HttpBackend, VersionInfo, Waypoint};

use crate::Context;
use crate::cli::CheckArgs;
use crate::config::{self, HOST_ENV, Settings, TOKEN_ENV};
use crate::ui;

pub fn run(ctx: &Context, args: CheckArgs) -> Result<()> {
    let settings = resolve(args, Settings::load()?);

    if !ctx.quiet {
        ui::header("Waypoint Connection Check");
        ui::kv("host", settings.host.as_deref().unwrap_or("(not set)"));
        ui::kv(
            "token",
            if settings.token.is_some() { "(set)" } else { "(not set)" },
        );
        ui::kv("timeout", &format!("{}s", settings.timeout().as_secs()));
        if let Some(path) = config::settings_path().filter(|p| p.exists()) {
            ui::kv("settings", &path.display().to_string());
        }
        println!();
    }

    let Some(client_config) = settings.client_config() else {
        bail!("Both a host and a token are required. Pass --host/--token or set {HOST_ENV}/{TOKEN_ENV}.");
    };

    let client: Arc<dyn Waypoint> = Arc::new(
        HttpBackend::new(&client_config).context("Could not create the Waypoint client")?,
    );
    let info = verify(client.as_ref())?;

    if ctx.quiet {
        println!("{}", info.version);
    } else {
        ui::success(&format!(
            "Connected to Waypoint {} (API {})",
            info.version.bold(),
            info.api
        ));
    }
    Ok(())
}

/// Flags (and their environment fallbacks) over the settings file
fn resolve(args: CheckArgs, file: Settings) -> Settings {
    let flags = Settings {
        host: args.host,
        token: args.token,
        timeout_seconds: args.timeout,
    };
    flags.or(file)
}

fn verify(client: &dyn Waypoint) -> Result<VersionInfo> {
    debug!("Requesting server version");
    match client.version() {
        Ok(info) => Ok(info),
        Err(e) => {
            let category = e.category();
            ui::error(&format!("Waypoint is not reachable ({category})"));
            ui::dim(category.advice());
            Err(e).context("Version request failed")
        }
    }
}
