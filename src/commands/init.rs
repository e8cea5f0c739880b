use crate::commands::Out;
use crate::{Config, Result};
use std::path::Path;

/// Creates the fuel home directory, its `.backups` directory, a default `config.json` and an
/// empty storage file.
///
/// # Errors
/// - Returns an error if the directory already holds a config file or if any file operation
///   fails.
pub async fn init(fuel_home: &Path) -> Result<Out<()>> {
    let config = Config::create(fuel_home).await?;
    Ok(format!(
        "Successfully created the fuel directory at {}",
        config.root().display()
    )
    .into())
}
