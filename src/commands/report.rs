use crate::api::Mode;
use crate::args::ReportArgs;
use crate::commands::{open_app, plural, Out};
use crate::model::date;
use crate::report::{Report, Summary};
use crate::utils::format_number;
use crate::{Config, Result};
use std::fmt::Write;

/// Totals and averages over the whole collection.
pub async fn stats(config: Config, mode: Mode) -> Result<Out<Summary>> {
    let app = open_app(config, mode).await?;
    let summary = app.summary();
    let message = format!(
        "{}\nTotal cost: {}\nTotal liters: {}\nAverage price per liter: {}\nTotal km driven: {}\nAverage km per fill-up: {}",
        plural(summary.transaction_count, "transaction"),
        format_number(summary.total_cost, 0),
        format_number(summary.total_liters, 2),
        format_number(summary.average_price, 0),
        format_number(summary.total_km_driven, 0),
        format_number(summary.average_km_per_transaction, 1),
    );
    Ok(Out::new(message, summary))
}

/// The bucketed report for the requested period, ending today.
pub async fn report(config: Config, mode: Mode, args: ReportArgs) -> Result<Out<Report>> {
    let app = open_app(config, mode).await?;
    let report = app.report(args.period(), date::today());
    Ok(Out::new(render(&report), report))
}

fn render(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Report by {}", report.period);
    let _ = writeln!(
        out,
        "{:<10}  {:>5}  {:>12}  {:>9}  {:>8}  {:>8}  {:>8}",
        "PERIOD", "COUNT", "COST", "LITERS", "AVG/L", "KM", "KM/FILL"
    );
    let rows = report
        .buckets
        .iter()
        .map(|b| (b.label.as_str(), &b.totals))
        .chain(std::iter::once(("TOTAL", &report.totals)));
    for (label, t) in rows {
        let _ = writeln!(
            out,
            "{:<10}  {:>5}  {:>12}  {:>9}  {:>8}  {:>8}  {:>8}",
            label,
            t.transaction_count,
            format_number(t.total_cost, 0),
            format_number(t.total_liters, 2),
            format_number(t.avg_price, 0),
            format_number(t.total_km_driven, 0),
            format_number(t.avg_km_per_transaction, 1),
        );
    }
    out.trim_end().to_string()
}
