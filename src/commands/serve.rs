use anyhow::{Context as _, Result};
use declarative::{ProviderServer, serve};
use log::info;
use std::io::{self, BufRead, Write};

use crate::Context;
use crate::config::Settings;
use crate::provider::WaypointProvider;

pub fn run(_ctx: &Context) -> Result<()> {
    let settings = Settings::load()?;
    let provider = WaypointProvider::new(settings);

    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();
    run_with(provider, stdin, stdout)
}

/// Serve one session over the given transport
pub fn run_with(provider: WaypointProvider, input: impl BufRead, output: impl Write) -> Result<()> {
    let mut server = ProviderServer::new(provider);
    info!(
        "Serving {} resources and {} data sources",
        server.resource_types().count(),
        server.data_source_types().count()
    );

    serve(&mut server, input, output).context("Plugin transport failed")?;
    info!("Plugin session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Connector;
    use declarative::handshake;
    use serde_json::{Value, json};
    use std::io::Cursor;
    use std::sync::Arc;
    use waypoint_client::{ClientConfig, MemoryBackend, Waypoint};

    fn provider(backend: MemoryBackend) -> WaypointProvider {
        let connect: Connector = Box::new(
            move |_: &ClientConfig| -> waypoint_client::Result<Arc<dyn Waypoint>> {
                let client: Arc<dyn Waypoint> = Arc::new(backend.clone());
                Ok(client)
            },
        );
        WaypointProvider::new(Settings::default())
            .with_env(Settings::default())
            .with_connector(connect)
    }

    fn session(backend: MemoryBackend, requests: &[Value]) -> Vec<String> {
        let input: String = requests.iter().map(|r| format!("{r}\n")).collect();
        let mut output = Vec::new();
        run_with(provider(backend), Cursor::new(input), &mut output).unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    fn response(line: &str) -> Value {
        serde_json::from_str(line).unwrap()
    }

    #[test]
    fn test_project_lifecycle_over_protocol() {
        let backend = MemoryBackend::new();
        let config = json!({
            "project_name": "web",
            "data_source_git": { "git_url": "https://example.com/repo.git" }
        });
        let lines = session(
            backend.clone(),
            &[
                json!({ "method": "configure_provider", "config": { "host": "localhost:9702", "token": "abc" } }),
                json!({
                    "method": "plan_resource_change",
                    "type_name": "waypoint_project",
                    "config": config,
                    "prior_state": null,
                    "proposed_new_state": config
                }),
                json!({ "method": "stop_provider" }),
            ],
        );

        assert_eq!(lines[0], handshake());
        assert_eq!(lines.len(), 4);
        assert_eq!(response(&lines[1])["response"], "diagnostics");

        let planned = response(&lines[2]);
        assert_eq!(planned["response"], "planned_state");
        assert_eq!(
            planned["planned_state"]["data_source_git"]["ignore_changes_outside_path"],
            json!(false)
        );
        assert_eq!(backend.project_count(), 0);
    }

    #[test]
    fn test_apply_creates_project() {
        let backend = MemoryBackend::new();
        let planned = json!({
            "project_name": "web",
            "project_variables": null,
            "remote_runners_enabled": null,
            "app_status_poll_seconds": declarative::UNKNOWN_PLACEHOLDER,
            "data_source_git": {
                "git_url": "https://example.com/repo.git",
                "ignore_changes_outside_path": false
            },
            "git_auth_basic": null,
            "git_auth_ssh": null
        });
        let lines = session(
            backend.clone(),
            &[
                json!({ "method": "configure_provider", "config": { "host": "localhost:9702", "token": "abc" } }),
                json!({
                    "method": "apply_resource_change",
                    "type_name": "waypoint_project",
                    "prior_state": null,
                    "planned_state": planned
                }),
            ],
        );

        let applied = response(&lines[2]);
        assert_eq!(applied["response"], "new_state");
        assert_eq!(applied["new_state"]["app_status_poll_seconds"], json!(0));
        assert_eq!(backend.project_count(), 1);
    }

    #[test]
    fn test_malformed_line_does_not_end_session() {
        let input = "not json\n{\"method\":\"stop_provider\"}\n";
        let mut output = Vec::new();
        run_with(provider(MemoryBackend::new()), Cursor::new(input), &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(response(lines[1])["response"], "error");
        assert_eq!(response(lines[2])["response"], "diagnostics");
    }
}
