use crate::api::Mode;
use crate::args::VoiceArgs;
use crate::commands::transactions::describe;
use crate::commands::{open_app, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::FuelTransaction;
use crate::{utils, Config, Result};

/// Recognizes a recording and adds the transaction heard in it.
pub async fn voice(config: Config, mode: Mode, args: VoiceArgs) -> Result<Out<FuelTransaction>> {
    let audio = match args.audio() {
        Some(path) => utils::read_bytes(path).await.pub_result(ErrorType::Io)?,
        None => Vec::new(),
    };
    let mut app = open_app(config, mode).await?;
    let tx = app.add_by_voice(&audio).await?;
    app.ensure_saved()?;
    Ok(Out::new(
        format!("Heard and added {}: {}", tx.id(), describe(&tx)),
        tx,
    ))
}
