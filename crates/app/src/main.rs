use std::sync::Arc;

use anyhow::Context;

use stockdash_app::{AppConfig, Dashboard};
use stockdash_auth::Credentials;
use stockdash_display::ManualSignalSource;

fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    stockdash_observability::init_with_format("info", config.log_format);

    tracing::info!(
        prefs_path = %config.prefs_path.display(),
        seed = config.seed_sample_items,
        prefers_dark = config.prefers_dark,
        "starting stockdash"
    );

    // Headless: no OS color-scheme query, so the signal comes from config.
    let source = Arc::new(ManualSignalSource::new(config.prefers_dark));
    let mut dashboard = Dashboard::from_config(&config, source);

    let session = dashboard
        .login(&Credentials::new(&config.user, &config.password))
        .context("login failed")?;

    let summary = dashboard.summary()?;
    tracing::info!(
        user = %session.display_name,
        summary = %serde_json::to_string(&summary).context("failed to encode summary")?,
        "inventory loaded"
    );

    let display_ctl = dashboard.display();
    tracing::info!(
        preference = %display_ctl.preference(),
        label = display_ctl.preference().label(),
        effective = %display_ctl.effective_mode(),
        "display mode"
    );

    Ok(())
}
