//! Interactive menu application.
//!
//! Drives the prompt flow (choose queries, format, output folder) and hands
//! the selection to the export engine. Errors end the current operation and
//! return the user to the top-level menu.

use crate::db::{table_query, DatabaseClient};
use crate::error::Result;
use crate::export::{BatchReport, ExportEngine};
use crate::persistence::{presets, PresetQuery, StateDb};
use crate::prompt::Prompter;
use colored::Colorize;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info};

/// Top-level menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Preset,
    Custom,
    Update,
    Table,
}

impl MenuChoice {
    /// Parses a top-level menu answer.
    pub fn parse(answer: &str) -> Option<Self> {
        match answer.trim() {
            "1" => Some(Self::Preset),
            "2" => Some(Self::Custom),
            "3" => Some(Self::Update),
            "4" => Some(Self::Table),
            _ => None,
        }
    }
}

/// The interactive application: a database session, the state database and a console.
pub struct App<'a, R, W> {
    db: &'a dyn DatabaseClient,
    state: &'a StateDb,
    prompter: Prompter<R, W>,
    default_output_dir: Option<PathBuf>,
}

impl<'a, R: BufRead, W: Write> App<'a, R, W> {
    pub fn new(db: &'a dyn DatabaseClient, state: &'a StateDb, prompter: Prompter<R, W>) -> Self {
        Self {
            db,
            state,
            prompter,
            default_output_dir: None,
        }
    }

    /// Offers `dir` when the user leaves the output folder prompt empty.
    pub fn with_default_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.default_output_dir = dir;
        self
    }

    /// Consumes the app, returning the prompter.
    pub fn into_prompter(self) -> Prompter<R, W> {
        self.prompter
    }

    /// Runs the menu until the user quits or input ends.
    pub async fn run(&mut self) -> Result<()> {
        self.prompter.say("Database Export".bold().to_string())?;

        loop {
            let answer = self.prompter.ask(&format!(
                "{} ",
                "Use preset queries, enter your own, update a preset, or export a whole table? \
                 [1 preset, 2 custom, 3 update, 4 table, q quit]:"
                    .blue()
            ))?;
            let Some(answer) = answer else {
                self.prompter.say("Goodbye.")?;
                return Ok(());
            };

            let Some(choice) = MenuChoice::parse(&answer) else {
                self.prompter
                    .warn("Invalid choice. Please enter 1, 2, 3, or 4.")?;
                continue;
            };

            if let Err(e) = self.handle(choice).await {
                error!("Export operation failed: {}", e);
                self.prompter
                    .warn(format!("An error occurred while exporting table data: {e}"))?;
            }
        }
    }

    /// Runs a single menu entry to completion or cancellation.
    pub async fn handle(&mut self, choice: MenuChoice) -> Result<()> {
        let selection = match choice {
            MenuChoice::Preset => self.select_presets().await?,
            MenuChoice::Custom => self.custom_query().await?,
            MenuChoice::Table => self.select_tables().await?,
            MenuChoice::Update => {
                self.update_preset().await?;
                return Ok(());
            }
        };

        match selection {
            Some(queries) => self.export(&queries).await,
            None => self.prompter.warn("Export canceled."),
        }
    }

    async fn select_presets(&mut self) -> Result<Option<Vec<PresetQuery>>> {
        let queries = presets::retrieve_preset_queries(self.state.pool()).await?;
        if queries.is_empty() {
            self.prompter
                .warn("No preset queries saved yet. Enter a custom query first.")?;
            return Ok(None);
        }

        self.prompter.say(
            "Enter the numbers of the queries to run (separated by commas):"
                .cyan()
                .to_string(),
        )?;
        self.prompter.print_query_list(&queries)?;

        let Some(indices) = self.prompter.choose_many("> ", queries.len())? else {
            return Ok(None);
        };
        Ok(Some(indices.into_iter().map(|i| queries[i].clone()).collect()))
    }

    async fn custom_query(&mut self) -> Result<Option<Vec<PresetQuery>>> {
        let Some(table_name) = self
            .prompter
            .ask(&"Enter the name of the table to export: ".blue().to_string())?
            .filter(|t| !t.is_empty())
        else {
            return Ok(None);
        };
        let Some(sql) = self
            .prompter
            .ask("Enter the SQL query to export the table: ")?
            .filter(|s| !s.is_empty())
        else {
            return Ok(None);
        };

        if self
            .prompter
            .confirm(&"Do you want to save this custom query for future use?".blue().to_string())?
        {
            presets::save_query_to_db(self.state.pool(), &table_name, &sql).await?;
            info!("Saved preset query for '{}'", table_name);
            self.prompter.success("Custom query saved successfully!")?;
        }

        Ok(Some(vec![PresetQuery::new(table_name, sql)]))
    }

    async fn select_tables(&mut self) -> Result<Option<Vec<PresetQuery>>> {
        let tables = self.db.list_tables().await?;
        if tables.is_empty() {
            self.prompter.warn("The database has no tables.")?;
            return Ok(None);
        }

        self.prompter.say(
            "Enter the numbers of the tables to export (separated by commas):"
                .cyan()
                .to_string(),
        )?;
        for (i, table) in tables.iter().enumerate() {
            self.prompter
                .say(format!("{}. {}", i + 1, table).cyan().to_string())?;
        }

        let Some(indices) = self.prompter.choose_many("> ", tables.len())? else {
            return Ok(None);
        };
        Ok(Some(
            indices
                .into_iter()
                .map(|i| PresetQuery::new(tables[i].clone(), table_query(&tables[i])))
                .collect(),
        ))
    }

    async fn update_preset(&mut self) -> Result<()> {
        let queries = presets::retrieve_preset_queries(self.state.pool()).await?;
        if queries.is_empty() {
            return self.prompter.warn("No preset queries to update.");
        }

        self.prompter
            .say("Please select a preset query:".blue().to_string())?;
        self.prompter.print_query_list(&queries)?;

        let Some(index) = self.prompter.choose_index(
            &"Enter the number of the query to update (or 'q' to cancel): "
                .cyan()
                .to_string(),
            queries.len(),
        )?
        else {
            return self.prompter.warn("Update canceled.");
        };

        let selected = &queries[index];
        self.prompter.say(
            format!("Current query for {}: {}", selected.table_name, selected.sql)
                .cyan()
                .to_string(),
        )?;
        let Some(new_sql) = self
            .prompter
            .ask(&format!(
                "Enter the new query for {} (or 'q' to cancel): ",
                selected.table_name
            ))?
            .filter(|s| !s.is_empty())
        else {
            return self.prompter.warn("Update canceled.");
        };

        presets::update_query_in_database(self.state.pool(), &selected.table_name, &new_sql)
            .await?;
        info!("Updated preset query for '{}'", selected.table_name);
        self.prompter.success("Query updated successfully!")
    }

    async fn export(&mut self, queries: &[PresetQuery]) -> Result<()> {
        let Some(format) = self.prompter.choose_format()? else {
            return self.prompter.warn("Export canceled.");
        };
        let default_dir = self.default_output_dir.clone();
        let Some(output_dir) = self.prompter.choose_output_dir(default_dir.as_deref())? else {
            return self.prompter.warn("Export canceled.");
        };

        let report = ExportEngine::new(self.db)
            .export_batch(queries, format, &output_dir)
            .await?;
        self.print_report(&report)
    }

    fn print_report(&mut self, report: &BatchReport) -> Result<()> {
        for outcome in &report.exported {
            self.prompter.success(format!(
                "Exported {} ({} rows) to {}",
                outcome.table_name,
                outcome.row_count,
                outcome.path.display()
            ))?;
        }
        for (table_name, e) in &report.failed {
            self.prompter
                .warn(format!("Skipped {table_name}: {e}"))?;
        }
        Ok(())
    }
}
