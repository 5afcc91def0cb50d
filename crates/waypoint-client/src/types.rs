//! Request and response types for the Waypoint API.
//!
//! Field names follow the API's proto names. Every struct tolerates missing
//! fields, since the server omits zero values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Projects
// =============================================================================

/// A Waypoint project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    /// Project name (its identity).
    pub name: String,
    /// Whether remote runners may run operations for this project.
    pub remote_enabled: bool,
    /// Where the project's `waypoint.hcl` comes from.
    pub data_source: Option<DataSource>,
    /// How often the data source is polled.
    pub data_source_poll: Option<Poll>,
    /// How often application status reports are generated.
    pub status_report_poll: Option<Poll>,
    /// Signal sent to applications when their config files change.
    pub file_change_signal: String,
    /// Project input variables.
    pub variables: Vec<Variable>,
    /// Applications in the project (read only).
    pub applications: Vec<Application>,
}

impl Project {
    /// Create a project with the given name and nothing else set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The git data source, if the project uses one.
    pub fn git(&self) -> Option<&Git> {
        match &self.data_source {
            Some(DataSource::Git(git)) => Some(git),
            _ => None,
        }
    }

    /// Application names in declaration order.
    pub fn application_names(&self) -> Vec<String> {
        self.applications.iter().map(|a| a.name.clone()).collect()
    }
}

/// Source of a project's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// A git repository.
    Git(Git),
    /// Files uploaded from the local machine.
    Local {},
    /// Remote data source (e.g. from a runner).
    Remote {},
}

/// Git repository settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Git {
    /// Repository URL.
    pub url: String,
    /// Ref to check out.
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Sub-directory holding `waypoint.hcl`.
    pub path: String,
    /// Ignore changes outside `path` when polling.
    pub ignore_changes_outside_path: bool,
    /// Credentials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<GitAuth>,
}

/// Git credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GitAuth {
    /// Username and password.
    Basic {
        /// Username.
        username: String,
        /// Password or token.
        password: String,
    },
    /// SSH private key.
    Ssh {
        /// Git user associated with the key.
        #[serde(default)]
        user: String,
        /// Passphrase for the key.
        #[serde(default)]
        password: String,
        /// PEM encoded private key.
        private_key_pem: String,
    },
}

impl std::fmt::Debug for GitAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Ssh { user, .. } => f
                .debug_struct("Ssh")
                .field("user", user)
                .finish_non_exhaustive(),
        }
    }
}

/// Polling settings. Intervals are duration strings such as `"30s"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Poll {
    /// Whether polling is enabled.
    pub enabled: bool,
    /// Interval between polls.
    pub interval: String,
}

impl Poll {
    /// Enabled poll with an interval in whole seconds.
    pub fn every(seconds: i64) -> Self {
        Self {
            enabled: seconds > 0,
            interval: interval::format_seconds(seconds),
        }
    }

    /// Interval in whole seconds, if it parses.
    pub fn seconds(&self) -> Option<i64> {
        interval::parse_seconds(&self.interval)
    }
}

/// A project input variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Variable {
    /// Variable name.
    pub name: String,
    /// Value.
    pub value: VariableValue,
    /// Hide the value in output.
    pub sensitive: bool,
}

/// Typed value of a project variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableValue {
    /// Plain string.
    Str(String),
    /// HCL expression.
    Hcl(String),
    /// Boolean.
    Bool(bool),
    /// Number.
    Num(i64),
}

impl Default for VariableValue {
    fn default() -> Self {
        Self::Str(String::new())
    }
}

impl VariableValue {
    /// Name of the value kind, for messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Str(_) => "str",
            Self::Hcl(_) => "hcl",
            Self::Bool(_) => "bool",
            Self::Num(_) => "num",
        }
    }
}

// =============================================================================
// Applications
// =============================================================================

/// Reference to a project by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectRef {
    /// Project name.
    pub project: String,
}

/// A Waypoint application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Application {
    /// Application name.
    pub name: String,
    /// Owning project.
    pub project: ProjectRef,
    /// Signal sent when config files change.
    pub file_change_signal: String,
}

impl Application {
    /// Create an application reference.
    pub fn new(project: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project: ProjectRef {
                project: project.into(),
            },
            file_change_signal: String::new(),
        }
    }
}

// =============================================================================
// Auth methods
// =============================================================================

/// An auth method. Only OIDC is supported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthMethod {
    /// Unique name.
    pub name: String,
    /// Name shown in the UI.
    pub display_name: String,
    /// Free-form description.
    pub description: String,
    /// Selector expression applied to claims.
    pub access_selector: String,
    /// OIDC settings.
    pub oidc: OidcConfig,
}

/// OIDC provider settings.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OidcConfig {
    /// Client ID.
    pub client_id: String,
    /// Client secret (never returned by the server).
    pub client_secret: String,
    /// Discovery URL.
    pub discovery_url: String,
    /// Allowed redirect URIs.
    pub allowed_redirect_uris: Vec<String>,
    /// Claim to variable mappings.
    pub claim_mappings: BTreeMap<String, String>,
    /// List claim to variable mappings.
    pub list_claim_mappings: BTreeMap<String, String>,
    /// CA certificates for the discovery URL.
    pub discovery_ca_pem: Vec<String>,
    /// Supported signing algorithms.
    pub signing_algs: Vec<String>,
    /// Requested scopes.
    pub scopes: Vec<String>,
    /// Required audiences.
    pub auds: Vec<String>,
}

impl std::fmt::Debug for OidcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcConfig")
            .field("client_id", &self.client_id)
            .field("discovery_url", &self.discovery_url)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Runner profiles
// =============================================================================

/// Format of a runner profile's plugin configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfigFormat {
    /// HCL (the server default).
    #[default]
    Hcl,
    /// JSON.
    Json,
}

impl ConfigFormat {
    /// Canonical name, `HCL` or `JSON`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hcl => "HCL",
            Self::Json => "JSON",
        }
    }
}

impl std::str::FromStr for ConfigFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HCL" => Ok(Self::Hcl),
            "JSON" => Ok(Self::Json),
            other => Err(format!("unknown config format '{other}', expected HCL or JSON")),
        }
    }
}

impl std::fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which runners an on-demand runner profile targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetRunner {
    /// Any runner.
    Any {},
    /// A specific runner.
    Id {
        /// Runner ID.
        id: String,
    },
    /// Runners carrying all of these labels.
    Labels {
        /// Required labels.
        labels: BTreeMap<String, String>,
    },
}

/// An on-demand runner profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerProfile {
    /// Server generated ID; empty when creating.
    pub id: String,
    /// Profile name.
    pub name: String,
    /// OCI image used to boot the runner.
    pub oci_url: String,
    /// Plugin type, e.g. `docker` or `kubernetes`.
    pub plugin_type: String,
    /// Plugin specific configuration.
    pub plugin_config: String,
    /// Format of `plugin_config`.
    pub config_format: ConfigFormat,
    /// Default profile for new projects.
    pub default: bool,
    /// Target runner selection.
    pub target_runner: Option<TargetRunner>,
    /// Environment exposed to the runner.
    pub environment_variables: BTreeMap<String, String>,
}

// =============================================================================
// Config sources
// =============================================================================

/// A dynamic config source.
///
/// Identified by its type, scope, project, application and workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigSource {
    /// Source plugin type, e.g. `vault`.
    #[serde(rename = "type")]
    pub source_type: String,
    /// `global`, `project` or `app`.
    pub scope: String,
    /// Project for project and app scopes.
    pub project: String,
    /// Application for app scope.
    pub application: String,
    /// Optional workspace restriction.
    pub workspace: String,
    /// Plugin configuration.
    pub config: BTreeMap<String, String>,
    /// Set to remove the source.
    pub delete: bool,
}

impl ConfigSource {
    /// Identity tuple.
    pub fn key(&self) -> (String, String, String, String, String) {
        (
            self.source_type.clone(),
            self.scope.to_ascii_lowercase(),
            self.project.clone(),
            self.application.clone(),
            self.workspace.clone(),
        )
    }
}

// =============================================================================
// Server info
// =============================================================================

/// Server version information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionInfo {
    /// Server version, e.g. `v0.11.4`.
    pub version: String,
    /// API protocol version.
    pub api: i64,
}

// =============================================================================
// Intervals
// =============================================================================

/// Conversion between whole seconds and the server's duration strings.
pub mod interval {
    /// Format whole seconds as a duration string, e.g. `"30s"`.
    pub fn format_seconds(seconds: i64) -> String {
        format!("{seconds}s")
    }

    /// Parse a duration string (`"1h2m3s"`, `"90s"`, `"500ms"`) into whole
    /// seconds, truncating fractions. An empty string is zero.
    pub fn parse_seconds(raw: &str) -> Option<i64> {
        let raw = raw.trim();
        if raw.is_empty() || raw == "0" {
            return Some(0);
        }
        let duration = humantime::parse_duration(raw).ok()?;
        i64::try_from(duration.as_secs()).ok()
    }
}
