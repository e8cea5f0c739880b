use crate::api::Mode;
use crate::args::{ExportArgs, ExportFormat};
use crate::commands::{open_app, plural, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::date;
use crate::{document, spreadsheet, utils, Config, Result};
use std::path::PathBuf;

/// Writes the collection as CSV or as a Markdown document and returns the path written.
pub async fn export(config: Config, mode: Mode, args: ExportArgs) -> Result<Out<PathBuf>> {
    let app = open_app(config, mode).await?;
    let today = date::today();
    let transactions = app.transactions();
    let contents = match args.format() {
        ExportFormat::Csv => spreadsheet::write_csv(transactions).pub_result(ErrorType::Io)?,
        ExportFormat::Doc => document::render(transactions, today).into_bytes(),
    };
    let path = match args.output() {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(format!(
            "fuel-transactions-{}.{}",
            today.format("%Y-%m-%d"),
            args.format().extension()
        )),
    };
    utils::write(&path, contents)
        .await
        .pub_result(ErrorType::Io)?;
    Ok(Out::new(
        format!(
            "Exported {} to {}",
            plural(transactions.len(), "transaction"),
            path.display()
        ),
        path,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::AddArgs;
    use crate::commands::add;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_export_csv_and_doc() {
        let env = TestEnv::new().await;
        add(env.config(), Mode::Test, AddArgs::new(30.0, 23000.0).with_location("A"))
            .await
            .unwrap();

        let csv_path = env.config().root().join("out.csv");
        let out = export(
            env.config(),
            Mode::Test,
            ExportArgs::new(ExportFormat::Csv, Some(csv_path.clone())),
        )
        .await
        .unwrap();
        assert_eq!(out.structure(), Some(&csv_path));
        let csv = utils::read(&csv_path).await.unwrap();
        assert!(csv.starts_with("Date,Liters,Price/L,TotalCost"));
        assert!(csv.contains(",30,23000,690000,,,,A,"));

        let doc_path = env.config().root().join("out.md");
        export(
            env.config(),
            Mode::Test,
            ExportArgs::new(ExportFormat::Doc, Some(doc_path.clone())),
        )
        .await
        .unwrap();
        let doc = utils::read(&doc_path).await.unwrap();
        assert!(doc.contains("- Total cost: 690,000"));
    }
}
