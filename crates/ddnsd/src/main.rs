// # ddnsd - Aliyun DDNS updater
//
// This binary is a THIN integration layer:
// - DO NOT add DNS logic here
// - All update logic lives in ddns-core
// - Configuration is via environment variables (plus an optional JSON
//   settings file)
//
// One invocation performs one update cycle and exits. Schedule it with cron
// or a systemd timer.
//
// ## Configuration
//
// ### Credentials and domain
// - `DDNS_SETTINGS_PATH`: JSON file with `access_key`, `access_secret`, `domain`
// - Or, when unset: `DDNS_ACCESS_KEY`, `DDNS_ACCESS_SECRET`, `DDNS_DOMAIN`
//
// ### IP Source
// - `DDNS_IP_SOURCE_URL`: URL answering with the public IP (default: ipify)
// - `DDNS_IP_VERSION`: v4, v6 or both (default: both)
//
// ### DNS Provider
// - `DDNS_ENDPOINT`: API endpoint (default: https://alidns.aliyuncs.com/)
// - `DDNS_RECORD_TYPE`: Only list records of this type (optional)
// - `DDNS_MODE`: `dry-run` to list records without updating them
//
// ### State Store
// - `DDNS_STATE_PATH`: File holding the last pushed IP (default: ip.txt)
//
// ### Logging
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export DDNS_ACCESS_KEY=LTAI...
// export DDNS_ACCESS_SECRET=...
// export DDNS_DOMAIN=home.example.com
// export DDNS_STATE_PATH=/var/lib/ddns/ip.txt
//
// ddnsd
// ```

use anyhow::Result;
use ddns_core::config::{DEFAULT_ENDPOINT, DEFAULT_IP_SOURCE_URL, DEFAULT_STATE_PATH};
use ddns_core::engine::RecordOutcome;
use ddns_core::{DdnsConfig, DdnsEngine, FileStateStore, IpVersion, RunOutcome, Settings};
use ddns_ip_http::HttpIpSource;
use ddns_provider_aliyun::AliyunProvider;
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Success (records updated, or nothing to do)
/// - 1: Configuration or startup error
/// - 2: Runtime error (provider rejection, network, state file)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Run completed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl DdnsExitCode {
    fn for_error(err: &ddns_core::Error) -> Self {
        if err.is_config() {
            DdnsExitCode::ConfigError
        } else {
            DdnsExitCode::RuntimeError
        }
    }
}

/// Application configuration
struct Config {
    settings_path: Option<String>,
    access_key: Option<String>,
    access_secret: Option<String>,
    domain: Option<String>,
    ip_source_url: String,
    ip_version: String,
    endpoint: String,
    record_type: Option<String>,
    mode: String,
    state_path: String,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any variable lookup
    ///
    /// Empty values count as unset.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            settings_path: var("DDNS_SETTINGS_PATH"),
            access_key: var("DDNS_ACCESS_KEY"),
            access_secret: var("DDNS_ACCESS_SECRET"),
            domain: var("DDNS_DOMAIN"),
            ip_source_url: var("DDNS_IP_SOURCE_URL")
                .unwrap_or_else(|| DEFAULT_IP_SOURCE_URL.to_string()),
            ip_version: var("DDNS_IP_VERSION").unwrap_or_else(|| "both".to_string()),
            endpoint: var("DDNS_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            record_type: var("DDNS_RECORD_TYPE"),
            mode: var("DDNS_MODE").unwrap_or_else(|| "live".to_string()),
            state_path: var("DDNS_STATE_PATH").unwrap_or_else(|| DEFAULT_STATE_PATH.to_string()),
            log_level: var("DDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }

    /// Resolve the credentials and domain
    ///
    /// The settings file wins over the individual variables.
    fn settings(&self) -> Result<Settings> {
        if let Some(ref path) = self.settings_path {
            return Ok(Settings::from_json_file(path)?);
        }

        let access_key = self.access_key.clone().ok_or_else(|| {
            anyhow::anyhow!(
                "DDNS_ACCESS_KEY is required when DDNS_SETTINGS_PATH is not set. \
                Set it via: export DDNS_ACCESS_KEY=your_access_key_id"
            )
        })?;
        let access_secret = self.access_secret.clone().ok_or_else(|| {
            anyhow::anyhow!(
                "DDNS_ACCESS_SECRET is required when DDNS_SETTINGS_PATH is not set"
            )
        })?;
        let domain = self.domain.clone().ok_or_else(|| {
            anyhow::anyhow!(
                "DDNS_DOMAIN is required when DDNS_SETTINGS_PATH is not set. \
                Set it via: export DDNS_DOMAIN=home.example.com"
            )
        })?;

        let settings = Settings::new(access_key, access_secret, domain);
        settings.validate()?;
        Ok(settings)
    }

    fn is_dry_run(&self) -> bool {
        self.mode.eq_ignore_ascii_case("dry-run")
    }

    /// Validate the configuration
    ///
    /// Returns the resolved settings so they are read only once.
    fn validate(&self) -> Result<Settings> {
        let settings = self.settings()?;
        validate_domain_name(&settings.domain)?;

        validate_url("DDNS_IP_SOURCE_URL", &self.ip_source_url)?;
        validate_url("DDNS_ENDPOINT", &self.endpoint)?;

        self.ip_version.parse::<IpVersion>()?;

        match self.mode.to_lowercase().as_str() {
            "live" | "dry-run" => {}
            _ => anyhow::bail!(
                "DDNS_MODE '{}' is not valid. Valid modes: live, dry-run",
                self.mode
            ),
        }

        if let Some(ref record_type) = self.record_type
            && !record_type.chars().all(|c| c.is_ascii_alphanumeric())
        {
            anyhow::bail!(
                "DDNS_RECORD_TYPE '{}' is not a record type (e.g. A, AAAA)",
                record_type
            );
        }

        // Validate log level
        log_level(&self.log_level)?;

        Ok(settings)
    }

    /// Build the engine configuration from validated settings
    fn ddns_config(&self, settings: Settings) -> Result<DdnsConfig> {
        let mut config = DdnsConfig::new(settings).with_dry_run(self.is_dry_run());
        config.endpoint = self.endpoint.clone();
        config.ip_source_url = self.ip_source_url.clone();
        config.ip_version = self.ip_version.parse()?;
        config.state_path = self.state_path.clone();
        if let Some(ref record_type) = self.record_type {
            config = config.with_record_type_filter(record_type.to_uppercase());
        }
        config.validate()?;
        Ok(config)
    }
}

fn log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "DDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

fn validate_url(name: &str, url: &str) -> Result<()> {
    if !url.starts_with("https://") && !url.starts_with("http://") {
        anyhow::bail!("{} must use HTTP or HTTPS scheme. Got: {}", name, url);
    }

    if url.starts_with("http://") {
        eprintln!(
            "WARNING: {} uses HTTP (not HTTPS). \
            This is less secure. Consider using HTTPS.",
            name
        );
    }

    Ok(())
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks. The first label may also be `*` (wildcard record)
/// or `@` (apex record).
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        anyhow::bail!("Domain name cannot be empty");
    }

    // Total length limit (RFC 1035: 253 chars max)
    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for (index, label) in domain.split('.').enumerate() {
        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }

        if index == 0 && (label == "*" || label == "@") {
            continue;
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let config = Config::from_env();

    let settings = match config.validate() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let ddns_config = match config.ddns_config(settings) {
        Ok(ddns_config) => ddns_config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Already validated
    let level = log_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnsd for {}", ddns_config.settings.domain);
    if ddns_config.dry_run {
        warn!("Running in DRY-RUN mode - no record will be changed");
    }

    // The flow is strictly sequential
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        tokio::select! {
            result = run(ddns_config) => match result {
                Ok(outcome) => {
                    log_outcome(&outcome);
                    DdnsExitCode::Success
                }
                Err(e) => {
                    error!("Update failed: {}", e);
                    DdnsExitCode::for_error(&e)
                }
            },
            signal = wait_for_shutdown() => {
                warn!("Received {}, aborting run; state left untouched", signal);
                DdnsExitCode::RuntimeError
            }
        }
    });

    code.into()
}

/// Wire the components and run one update cycle
async fn run(config: DdnsConfig) -> ddns_core::Result<RunOutcome> {
    let state_store = FileStateStore::new(&config.state_path).await?;
    let ip_source = HttpIpSource::new(config.ip_source_url.clone(), config.ip_version)?;
    let provider = AliyunProvider::new(&config.settings, config.endpoint.clone(), config.dry_run)?;

    let engine = DdnsEngine::new(
        Box::new(ip_source),
        Box::new(provider),
        Box::new(state_store),
        config,
    )?;

    engine.run_once().await
}

fn log_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Unchanged { ip } => {
            info!("IP unchanged ({}), no update needed", ip);
        }
        RunOutcome::Updated {
            ip,
            previous_ip,
            report,
        } => {
            if report.is_empty() {
                warn!("No record matched; nothing was updated (IP {})", ip);
            }
            for update in &report.records {
                match &update.outcome {
                    RecordOutcome::Updated => info!(
                        "Updated {} record {} ({}) to {}",
                        update.record.record_type, update.record.record_id, update.record.rr, ip
                    ),
                    RecordOutcome::Skipped => info!(
                        "[DRY-RUN] Skipped {} record {} ({})",
                        update.record.record_type, update.record.record_id, update.record.rr
                    ),
                    RecordOutcome::Failed { message } => warn!(
                        "Failed to update {} record {} ({}): {}",
                        update.record.record_type, update.record.record_id, update.record.rr, message
                    ),
                }
            }
            info!(
                "IP {} -> {}: {} updated, {} failed",
                previous_ip.as_deref().unwrap_or("(none)"),
                ip,
                report.updated_count(),
                report.failed_count()
            );
        }
    }
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown() -> &'static str {
    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
        _ => {
            warn!("Failed to set up signal handlers; run cannot be interrupted cleanly");
            return std::future::pending().await;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    }
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> &'static str {
    match tokio::signal::ctrl_c().await {
        Ok(()) => "CTRL-C",
        Err(_) => std::future::pending().await,
    }
}
