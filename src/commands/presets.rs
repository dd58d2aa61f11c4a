//! `presets` command handlers.

use crate::cli::PresetCommand;
use crate::error::Result;
use crate::persistence::{presets, StateDb};
use crate::prompt::console_error;
use colored::Colorize;
use std::io::Write;
use tracing::info;

/// Handle `presets list|add|update|delete`.
pub async fn handle_presets<W: Write>(
    command: &PresetCommand,
    state: &StateDb,
    out: &mut W,
) -> Result<()> {
    let message = match command {
        PresetCommand::List => {
            let queries = presets::retrieve_preset_queries(state.pool()).await?;
            if queries.is_empty() {
                "No preset queries saved.".to_string()
            } else {
                let mut output = String::from("Preset queries:\n");
                for (i, query) in queries.iter().enumerate() {
                    output.push_str(&format!("{}. {} - {}\n", i + 1, query.table_name, query.sql));
                }
                output.trim_end().to_string()
            }
        }
        PresetCommand::Add { table, sql } => {
            presets::save_query_to_db(state.pool(), table, sql).await?;
            info!("Saved preset query for '{}'", table);
            format!("Preset query for '{table}' saved.").green().to_string()
        }
        PresetCommand::Update { table, sql } => {
            let updated = presets::update_query_in_database(state.pool(), table, sql).await?;
            info!("Updated {} preset(s) for '{}'", updated, table);
            format!("Preset query for '{table}' updated.").green().to_string()
        }
        PresetCommand::Delete { table } => {
            let deleted = presets::delete_preset(state.pool(), table).await?;
            info!("Deleted {} preset(s) for '{}'", deleted, table);
            format!("Preset query for '{table}' deleted.").green().to_string()
        }
    };

    writeln!(out, "{message}").map_err(console_error)
}
