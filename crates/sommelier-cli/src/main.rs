// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use runtime::ConsultRuntime;
use sommelier_app::{
    Catalog, Category, Coordinator, CredentialStore, PairingItem, ViewCommand, ViewEvent,
    ViewState,
};
use sommelier_db::{SettingsCredentialStore, Store};
use std::env;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SOMMELIER_LOG";

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `sommelier --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let db_path = if options.memory {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    init_logging(options.is_headless())?;

    let catalog = Catalog::load().context("load bundled pairing catalog")?;

    let store = Store::open(&db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or SOMMELIER_DB_PATH",
            db_path.display()
        )
    })?;
    store.bootstrap()?;
    let credentials = SettingsCredentialStore::open(store)?;

    let client = if config.ai_enabled() {
        Some(
            sommelier_llm::Client::new(
                config.ai_base_url(),
                config.ai_model(),
                config.ai_timeout()?,
            )
            .with_context(|| {
                format!(
                    "invalid [ai] config in {}; fix base_url/model/timeout values",
                    options.config_path.display()
                )
            })?,
        )
    } else {
        None
    };
    if let Some(client) = &client {
        tracing::debug!(
            base_url = client.base_url(),
            model = client.model(),
            timeout_ms = client.timeout().as_millis() as u64,
            "ai client configured"
        );
    }
    if options.check_only {
        tracing::info!(
            catalog_items = catalog.len(),
            ai_enabled = client.is_some(),
            has_credential = credentials.has_credential(),
            "startup check passed"
        );
        return Ok(());
    }

    let mut runtime = ConsultRuntime::new(credentials, client);

    if let Some(key) = &options.set_key {
        runtime
            .credential_store()
            .save(key)
            .context("save API key from --set-key")?;
        println!("API key saved to {}", db_path.display());
        return Ok(());
    }

    let mut coordinator = Coordinator::new(&catalog);
    if options.is_headless() {
        let mut stdout = io::stdout().lock();
        return run_headless(&mut coordinator, &mut runtime, &options, &mut stdout);
    }

    sommelier_tui::run_app(&mut coordinator, &mut runtime)
}

fn init_logging(headless: bool) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    // Log lines would corrupt the alternate screen, so the TUI logs to a file.
    if headless {
        return builder
            .with_writer(io::stderr)
            .try_init()
            .map_err(|error| anyhow!("install log subscriber: {error}"));
    }

    let log_path = log_file_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("open log file {}", log_path.display()))?;
    builder
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))
}

fn log_file_path() -> Result<PathBuf> {
    let dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("cannot resolve data directory for the log file"))?
        .join(sommelier_db::APP_NAME);
    fs::create_dir_all(&dir).with_context(|| format!("create log directory {}", dir.display()))?;
    Ok(dir.join("sommelier.log"))
}

fn run_headless<R, W>(
    coordinator: &mut Coordinator<'_>,
    runtime: &mut R,
    options: &CliOptions,
    out: &mut W,
) -> Result<()>
where
    R: sommelier_tui::AppRuntime,
    W: Write,
{
    if let Some(query) = &options.query {
        coordinator.dispatch(ViewCommand::QueryChanged(query.clone()));
    }
    if let Some(category) = options.category {
        coordinator.dispatch(ViewCommand::CategorySelected(category));
    }

    if options.ask && coordinator.view().can_consult() {
        let events = coordinator.dispatch(ViewCommand::RequestConsult);
        for event in events {
            if let ViewEvent::ConsultStarted(ticket) = event {
                let result = runtime.consult(&ticket.query);
                coordinator.dispatch(ViewCommand::ConsultFinished {
                    request_id: ticket.request_id,
                    result,
                });
            }
        }
    }

    if options.json {
        let payload = serde_json::to_string_pretty(&coordinator.view().results)
            .context("encode results as JSON")?;
        writeln!(out, "{payload}").context("write results")?;
        return Ok(());
    }

    if let Some(browse) = coordinator.browse_view() {
        write!(out, "{}", browse.to_text()).context("write browse view")?;
        return Ok(());
    }

    write!(out, "{}", render_plain_results(coordinator.view())).context("write results")?;
    Ok(())
}

fn render_plain_results(view: &ViewState) -> String {
    let mut out = String::new();
    if view.results.is_empty() {
        out.push_str(&format!("No pairings found for {:?}.\n", view.query.trim()));
        if view.can_consult() {
            out.push_str("Run again with --ask to consult the AI sommelier.\n");
        }
    }
    for item in &view.results {
        out.push_str(&plain_card(item));
    }
    if let Some(status) = &view.status_line {
        out.push_str(&format!("\n{status}\n"));
    }
    out
}

fn plain_card(item: &PairingItem) -> String {
    let mut header = item.name().to_owned();
    if item.is_ai_generated() {
        header.push_str(" [AI]");
    }
    header.push_str(&format!(" [{}]", item.tag_label()));
    if let Some(course) = item.course() {
        header.push_str(&format!(" [{}]", course.label()));
    }
    let mut card = format!("{header}\n  pairs with: {}\n", item.matches().join(", "));
    if !item.description().is_empty() {
        card.push_str(&format!("  {}\n", item.description()));
    }
    card
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_db_path: bool,
    print_example: bool,
    check_only: bool,
    memory: bool,
    query: Option<String>,
    category: Option<Category>,
    ask: bool,
    json: bool,
    set_key: Option<String>,
    show_help: bool,
}

impl CliOptions {
    fn is_headless(&self) -> bool {
        self.query.is_some()
            || self.category.is_some()
            || self.ask
            || self.json
            || self.set_key.is_some()
            || self.check_only
    }
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_db_path: false,
        print_example: false,
        check_only: false,
        memory: false,
        query: None,
        category: None,
        ask: false,
        json: false,
        set_key: None,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-path" => {
                options.print_db_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--memory" => {
                options.memory = true;
            }
            "--query" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--query requires search text, e.g. --query steak"))?;
                options.query = Some(value.as_ref().to_owned());
            }
            "--category" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow!("--category requires one of: {}", category_names())
                })?;
                let category = Category::parse(value.as_ref()).ok_or_else(|| {
                    anyhow!(
                        "unknown category {:?}; use one of: {}",
                        value.as_ref(),
                        category_names()
                    )
                })?;
                options.category = Some(category);
            }
            "--ask" => {
                options.ask = true;
            }
            "--json" => {
                options.json = true;
            }
            "--set-key" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--set-key requires the API key value"))?;
                options.set_key = Some(value.as_ref().to_owned());
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn category_names() -> String {
    Category::ALL
        .iter()
        .map(|category| category.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_help() {
    println!("sommelier: food and wine pairings in the terminal");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config, catalog, database and AI client");
    println!("  --memory                 Keep the API key in an in-memory database");
    println!("  --query <text>           Print pairings matching <text> and exit");
    println!("  --category <name>        Restrict results to {}", category_names());
    println!("  --ask                    Ask the AI sommelier when nothing matches");
    println!("  --json                   Print results as JSON");
    println!("  --set-key <key>          Save the AI API key and exit");
    println!("  --help                   Show this help");
    println!();
    println!("Set {LOG_ENV} (for example {LOG_ENV}=debug) to change log verbosity.");
}
