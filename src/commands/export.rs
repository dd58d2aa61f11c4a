//! `export` command handler.

use crate::cli::ExportArgs;
use crate::config::ExportSettings;
use crate::db::DatabaseClient;
use crate::error::{ExportError, Result};
use crate::export::{BatchReport, ExportEngine};
use crate::persistence::{presets, PresetQuery, StateDb};
use crate::prompt::console_error;
use colored::Colorize;
use std::io::Write;

/// Handle `export`: runs `--sql`, or every preset saved for `--table`.
///
/// Fails if any query was skipped, after reporting the ones that succeeded.
pub async fn handle_export<W: Write>(
    args: &ExportArgs,
    db: &dyn DatabaseClient,
    state: &StateDb,
    settings: &ExportSettings,
    out: &mut W,
) -> Result<BatchReport> {
    let queries = queries_for(args, state).await?;
    let format = args.format.unwrap_or_else(|| settings.format_or_default());
    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| settings.output_dir_or_default());

    let report = ExportEngine::new(db)
        .export_batch(&queries, format, &output_dir)
        .await?;

    for outcome in &report.exported {
        writeln!(
            out,
            "{}",
            format!(
                "Exported {} ({} rows) to {}",
                outcome.table_name,
                outcome.row_count,
                outcome.path.display()
            )
            .green()
        )
        .map_err(console_error)?;
    }

    if let Some((table_name, e)) = report.failed.first() {
        return Err(ExportError::query(format!(
            "{} of {} exports failed; first failure in '{}': {}",
            report.failed.len(),
            queries.len(),
            table_name,
            e
        )));
    }

    Ok(report)
}

async fn queries_for(args: &ExportArgs, state: &StateDb) -> Result<Vec<PresetQuery>> {
    if let Some(sql) = &args.sql {
        return Ok(vec![PresetQuery::new(args.table.clone(), sql.clone())]);
    }

    let queries: Vec<PresetQuery> = presets::retrieve_preset_queries(state.pool())
        .await?
        .into_iter()
        .filter(|q| q.table_name == args.table)
        .collect();

    if queries.is_empty() {
        return Err(ExportError::input(format!(
            "No preset query saved for '{}'",
            args.table
        )));
    }
    Ok(queries)
}
