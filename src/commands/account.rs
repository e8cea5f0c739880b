//! Handlers for the user mode and the signed-in identity.

use crate::api::{Identity, Mode};
use crate::args::ModeArgs;
use crate::commands::{open_app, plural, Out};
use crate::config::UserMode;
use crate::{Config, Result};

pub async fn set_mode(config: Config, mode: Mode, args: ModeArgs) -> Result<Out<UserMode>> {
    let mut app = open_app(config, mode).await?;
    let user_mode = args.user_mode();
    let loaded = app.set_user_mode(user_mode).await?;
    app.ensure_saved()?;
    let message = match loaded {
        Some(count) => format!(
            "Switched to {user_mode} mode and loaded {} from the remote API",
            plural(count, "transaction")
        ),
        None => format!("Now in {user_mode} mode"),
    };
    Ok(Out::new(message, user_mode))
}

pub async fn sign_in(config: Config, mode: Mode) -> Result<Out<Identity>> {
    let mut app = open_app(config, mode).await?;
    let identity = app.sign_in().await?;
    app.ensure_saved()?;
    Ok(Out::new(
        format!(
            "Signed in as {} <{}>, now in registered mode",
            identity.name, identity.email
        ),
        identity,
    ))
}

pub async fn sign_out(config: Config, mode: Mode) -> Result<Out<()>> {
    let mut app = open_app(config, mode).await?;
    app.sign_out().await?;
    Ok("Signed out, now in guest mode".into())
}
