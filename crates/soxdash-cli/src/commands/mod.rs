mod narrative;
mod refresh;
mod tiers;
mod watch;

use std::time::Duration;

use serde_json::Value;
use soxdash_core::view_model::ViewModel;
use soxdash_core::{Dashboard, DashboardBuilder, RefreshOutcome, SourceTier};

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::metadata::{Envelope, EnvelopeError, Metadata, TraceId};

pub struct CommandResult {
    pub data: Value,
    /// Set for commands that print the dashboard; drives the table layout.
    pub view: Option<ViewModel>,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub latency_ms: u64,
    pub source: Option<SourceTier>,
    pub tier_chain: Vec<SourceTier>,
    pub advisory: Option<String>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            view: None,
            warnings: Vec::new(),
            errors: Vec::new(),
            latency_ms: 0,
            source: None,
            tier_chain: Vec::new(),
            advisory: None,
        }
    }

    /// Dashboard result of a price refresh, carrying its provenance.
    pub fn from_refresh(outcome: &RefreshOutcome, view: ViewModel) -> Result<Self, CliError> {
        let snapshot = &outcome.snapshot;
        let mut result = Self::ok(serde_json::to_value(&view)?);
        result.view = Some(view);
        result.warnings = snapshot.warnings.clone();
        result.errors = outcome.errors.iter().map(EnvelopeError::from).collect();
        result.latency_ms = outcome.latency_ms;
        result.source = snapshot.source;
        result.tier_chain = snapshot.tier_chain.clone();
        result.advisory = snapshot.advisory.clone();
        if !outcome.published {
            result
                .warnings
                .push(String::from("a newer refresh published first; showing its snapshot"));
        }
        Ok(result)
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn into_envelope(self, trace_id: TraceId) -> (Envelope<Value>, Option<ViewModel>) {
        let mut meta = Metadata::new(trace_id);
        meta.source = self.source;
        meta.tier_chain = self.tier_chain;
        meta.latency_ms = self.latency_ms;
        meta.advisory = self.advisory;
        for warning in self.warnings {
            meta.push_warning(warning);
        }

        (
            Envelope {
                meta,
                data: self.data,
                errors: self.errors,
            },
            self.view,
        )
    }
}

/// Builds the dashboard from the environment plus command-line overrides.
pub fn build_dashboard(cli: &Cli) -> Result<Dashboard, CliError> {
    let mut builder = DashboardBuilder::new()
        .with_env()?
        .with_offline_mode(cli.offline);
    if let Some(model) = &cli.model {
        builder = builder.with_model(model.clone());
    }
    if let Some(timeout_ms) = cli.tier_timeout_ms {
        builder = builder.with_tier_timeout(Duration::from_millis(timeout_ms));
    }
    if let Some(timeout_ms) = cli.ai_tier_timeout_ms {
        builder = builder.with_ai_tier_timeout(Duration::from_millis(timeout_ms));
    }
    tracing::debug!(
        offline = cli.offline,
        model = %builder.config().gemini_model,
        tier_timeout_ms = builder.config().tier_timeout.as_millis() as u64,
        ai_tier_timeout_ms = builder.config().ai_tier_timeout.as_millis() as u64,
        "building dashboard"
    );
    Ok(builder.build()?)
}

/// Runs the selected command. One-shot commands hand back a result for the
/// caller to render; `watch` renders every cycle itself and returns `None`.
pub async fn run(cli: &Cli, dashboard: &Dashboard) -> Result<Option<CommandResult>, CliError> {
    let result = match &cli.command {
        Command::Refresh(args) => refresh::run(args, dashboard).await?,
        Command::Narrative => narrative::run(dashboard).await?,
        Command::Tiers => tiers::run(dashboard, cli.offline)?,
        Command::Watch(args) => {
            watch::run(args, dashboard, cli.format, cli.pretty).await?;
            return Ok(None);
        }
    };
    Ok(Some(result))
}
