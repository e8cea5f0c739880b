//! Handlers for creating, changing and listing transactions.

use crate::api::Mode;
use crate::args::{AddArgs, IdArgs, UpdateArgs};
use crate::commands::{open_app, plural, Out};
use crate::config::UserMode;
use crate::error::{Error, ErrorType};
use crate::model::{date, FuelTransaction};
use crate::utils::format_number;
use crate::{Config, Result};
use std::fmt::Write;

pub async fn add(config: Config, mode: Mode, args: AddArgs) -> Result<Out<FuelTransaction>> {
    let mut app = open_app(config, mode).await?;
    let tx = app.add(args.fields()).await?;
    app.ensure_saved()?;
    Ok(Out::new(
        format!("Added transaction {}: {}", tx.id(), describe(&tx)),
        tx,
    ))
}

/// Changes the fields given in `args`; the others keep their current values.
pub async fn update(config: Config, mode: Mode, args: UpdateArgs) -> Result<Out<FuelTransaction>> {
    let mut app = open_app(config, mode).await?;
    let current = app.store().get(args.id()).ok_or_else(|| {
        Error::msg(
            ErrorType::NotFound,
            format!("No transaction with id '{}'", args.id()),
        )
    })?;
    let fields = args.apply(current.fields());
    let tx = app.update(args.id(), fields).await?;
    app.ensure_saved()?;
    Ok(Out::new(
        format!("Updated transaction {}: {}", tx.id(), describe(&tx)),
        tx,
    ))
}

pub async fn delete(config: Config, mode: Mode, args: IdArgs) -> Result<Out<bool>> {
    let mut app = open_app(config, mode).await?;
    let deleted = app.delete(args.id());
    app.ensure_saved()?;
    let message = if deleted && app.user_mode() == UserMode::Registered {
        format!(
            "Deleted transaction {} locally. The remote API has no delete, so it returns with \
             the next download",
            args.id()
        )
    } else if deleted {
        format!("Deleted transaction {}", args.id())
    } else {
        format!("There is no transaction {}, nothing was deleted", args.id())
    };
    Ok(Out::new(message, deleted))
}

pub async fn duplicate(config: Config, mode: Mode, args: IdArgs) -> Result<Out<FuelTransaction>> {
    let mut app = open_app(config, mode).await?;
    let tx = app.duplicate(args.id()).await?;
    app.ensure_saved()?;
    Ok(Out::new(
        format!("Duplicated {} as {}: {}", args.id(), tx.id(), describe(&tx)),
        tx,
    ))
}

pub async fn list(config: Config, mode: Mode) -> Result<Out<Vec<FuelTransaction>>> {
    let app = open_app(config, mode).await?;
    let transactions = app.transactions().to_vec();
    if transactions.is_empty() {
        return Ok(Out::new("No transactions yet", transactions));
    }
    let message = format!(
        "{}\n{}",
        plural(transactions.len(), "transaction"),
        render(&transactions)
    );
    Ok(Out::new(message, transactions))
}

/// One line, e.g. `15/03/2024 30.00 L at 23,000 = 690,000`.
pub(super) fn describe(tx: &FuelTransaction) -> String {
    format!(
        "{} {} L at {} = {}",
        date::display_date(tx.date()),
        format_number(tx.amount(), 2),
        format_number(tx.price_per_liter(), 0),
        format_number(tx.total_cost(), 0)
    )
}

/// A fixed-width table with one line per transaction.
fn render(transactions: &[FuelTransaction]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<32}  {:<10}  {:>8}  {:>8}  {:>12}  {:>8}  LOCATION",
        "ID", "DATE", "LITERS", "PRICE", "TOTAL", "KM"
    );
    for tx in transactions {
        let km = tx
            .distance()
            .map(|d| format_number(d, 0))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{:<32}  {:<10}  {:>8}  {:>8}  {:>12}  {:>8}  {}",
            tx.id(),
            date::display_date(tx.date()),
            format_number(tx.amount(), 2),
            format_number(tx.price_per_liter(), 0),
            format_number(tx.total_cost(), 0),
            km,
            tx.location().unwrap_or_default()
        );
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestMetaState;
    use crate::commands::sign_in;
    use crate::test::TestEnv;
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_add_update_duplicate_delete() {
        let env = TestEnv::new().await;
        let added = add(
            env.config(),
            Mode::Test,
            AddArgs::new(30.0, 23000.0)
                .with_date(ymd(2024, 3, 15))
                .with_km(Some(12000.0), Some(12500.0)),
        )
        .await
        .unwrap();
        let tx = added.structure().unwrap().clone();
        assert_eq!(
            added.message(),
            format!("Added transaction {}: 15/03/2024 30.00 L at 23,000 = 690,000", tx.id())
        );

        let updated = update(
            env.config(),
            Mode::Test,
            UpdateArgs::new(tx.id()).with_amount(40.0).with_notes("topped up"),
        )
        .await
        .unwrap();
        let updated_tx = updated.structure().unwrap();
        assert_eq!(updated_tx.total_cost(), 920_000.0);
        assert_eq!(updated_tx.notes(), Some("topped up"));
        assert_eq!(updated_tx.km_reading(), Some(12500.0));

        let copy = duplicate(env.config(), Mode::Test, IdArgs::new(tx.id()))
            .await
            .unwrap();
        let copy_tx = copy.structure().unwrap();
        assert_ne!(copy_tx.id(), tx.id());
        assert_eq!(copy_tx.date(), date::today());

        let listed = list(env.config(), Mode::Test).await.unwrap();
        assert_eq!(listed.structure().unwrap().len(), 2);
        assert!(listed.message().starts_with("2 transactions\nID"));
        assert!(listed.message().contains("500"));

        let deleted = delete(env.config(), Mode::Test, IdArgs::new(tx.id()))
            .await
            .unwrap();
        assert_eq!(deleted.structure(), Some(&true));
        let again = delete(env.config(), Mode::Test, IdArgs::new(tx.id()))
            .await
            .unwrap();
        assert_eq!(again.structure(), Some(&false));
    }

    #[tokio::test]
    async fn test_delete_in_registered_mode_is_local() {
        let env = TestEnv::new().await;
        env.set_meta_state(TestMetaState::new(Vec::new()));
        sign_in(env.config(), Mode::Test).await.unwrap();
        let added = add(env.config_reloaded().await, Mode::Test, AddArgs::new(30.0, 23000.0))
            .await
            .unwrap();
        let id = added.structure().unwrap().id().to_string();
        let deleted = delete(env.config_reloaded().await, Mode::Test, IdArgs::new(&id))
            .await
            .unwrap();
        assert_eq!(deleted.structure(), Some(&true));
        assert!(deleted.message().contains("locally"));
    }

    #[tokio::test]
    async fn test_add_invalid() {
        let env = TestEnv::new().await;
        let err = add(env.config(), Mode::Test, AddArgs::new(0.0, 23000.0))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Validation);
        let listed = list(env.config(), Mode::Test).await.unwrap();
        assert_eq!(listed.message(), "No transactions yet");
    }

    #[tokio::test]
    async fn test_update_missing() {
        let env = TestEnv::new().await;
        let err = update(env.config(), Mode::Test, UpdateArgs::new("nope"))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::NotFound);
    }
}
