use crate::api::Mode;
use crate::app::App;
use crate::commands::{open_app, plural, Out};
use crate::{Config, Result};
use chrono::{DateTime, Utc};
use tracing::error;

/// Posts every local transaction to the remote API. Registered mode only.
pub async fn sync_up(config: Config, mode: Mode) -> Result<Out<usize>> {
    let app = open_app(config, mode).await?;
    let count = app.push_all().await?;
    Ok(Out::new(
        format!("Sent {} to the remote API", plural(count, "transaction")),
        count,
    ))
}

/// Replaces the local transactions with the remote ones, after backing up the local ones.
pub async fn sync_down(config: Config, mode: Mode) -> Result<Out<usize>> {
    // No start-up fetch here; the refresh below is the only request.
    let mut app = App::open(config, mode)?;
    let count = match app.refresh_remote().await {
        Ok(count) => count,
        Err(e) => {
            error!("Unable to download transactions, local data is unchanged");
            return Err(e);
        }
    };
    app.ensure_saved()?;
    Ok(Out::new(
        format!("Downloaded {} from the remote API", plural(count, "transaction")),
        count,
    ))
}

/// Syncs to the cloud for the signed-in user and records when that happened.
pub async fn sync_cloud(config: Config, mode: Mode) -> Result<Out<DateTime<Utc>>> {
    let mut app = open_app(config, mode).await?;
    let stamp = app.sync_cloud().await?;
    Ok(Out::new(
        format!(
            "Synced {} to the cloud at {}",
            plural(app.transactions().len(), "transaction"),
            stamp.to_rfc3339()
        ),
        stamp,
    ))
}
