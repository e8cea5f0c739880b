use crate::api::Mode;
use crate::args::ImportArgs;
use crate::commands::{open_app, plural, Out};
use crate::error::{ErrorType, IntoResult};
use crate::{spreadsheet, utils, Config, Result};
use anyhow::Context;
use tracing::debug;

/// Imports the rows of a CSV file. The file is read and parsed completely before anything is
/// added, so a broken file imports nothing.
pub async fn import(config: Config, mode: Mode, args: ImportArgs) -> Result<Out<usize>> {
    let path = args.file();
    let data = utils::read_bytes(path).await.pub_result(ErrorType::Io)?;
    let rows = spreadsheet::parse_csv(&data)
        .with_context(|| format!("Unable to import {}", path.display()))
        .pub_result(ErrorType::Import)?;
    debug!("Read {} candidate rows from {}", rows.len(), path.display());

    let mut app = open_app(config, mode).await?;
    let count = app.import(rows).await?;
    app.ensure_saved()?;
    if count == 0 {
        return Ok(Out::new(
            format!("No valid rows found in {}", path.display()),
            0,
        ));
    }
    Ok(Out::new(
        format!("Imported {}", plural(count, "transaction")),
        count,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::IMPORT_PRE;
    use crate::commands::list;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_import() {
        let env = TestEnv::new().await;
        let file = env.config().root().join("in.csv");
        utils::write(
            &file,
            "Date,Liters,Price/L,TotalCost,LastKm,CurrentKm,DistanceKm,Location,Notes\n\
             15/03/2024,30,23000,,12000,12500,500,Station 7,\n\
             16/03/2024,0,23000,,,,,,\n\
             45366,20,24000,,,,,,\n",
        )
        .await
        .unwrap();
        let out = import(env.config(), Mode::Test, ImportArgs::new(&file))
            .await
            .unwrap();
        assert_eq!(out.structure(), Some(&2));
        assert_eq!(out.message(), "Imported 2 transactions");
        assert_eq!(env.backup_count(IMPORT_PRE).await, 1);

        let listed = list(env.config(), Mode::Test).await.unwrap();
        let txs = listed.structure().unwrap();
        assert_eq!(txs[0].location(), Some("Station 7"));
        assert_eq!(txs[1].total_cost(), 480_000.0);
    }

    #[tokio::test]
    async fn test_import_nothing_valid() {
        let env = TestEnv::new().await;
        let file = env.config().root().join("in.csv");
        utils::write(&file, "Date,Liters,Price/L\nsoon,30,23000\n")
            .await
            .unwrap();
        let out = import(env.config(), Mode::Test, ImportArgs::new(&file))
            .await
            .unwrap();
        assert_eq!(out.structure(), Some(&0));
        assert!(out.message().starts_with("No valid rows"));
        assert_eq!(env.backup_count(IMPORT_PRE).await, 0);
    }

    #[tokio::test]
    async fn test_import_broken_file() {
        let env = TestEnv::new().await;
        let file = env.config().root().join("in.csv");
        utils::write(&file, b"Date,Liters\n15/03/2024,\xff\n".as_slice())
            .await
            .unwrap();
        let err = import(env.config(), Mode::Test, ImportArgs::new(&file))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Import);

        let missing = import(
            env.config(),
            Mode::Test,
            ImportArgs::new(env.config().root().join("missing.csv")),
        )
        .await
        .unwrap_err();
        assert_eq!(missing.error_type(), ErrorType::Io);
    }
}
