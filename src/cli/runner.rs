//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat, TraverseArgs};
use crate::config::{parse_filter, EndpointConfig, PaginationDef};
use crate::error::{Error, Result, ResultExt};
use crate::http::HttpListFetcher;
use crate::instrument::{InstrumentedEngine, TracingInstrumentation};
use crate::loader::load_endpoint;
use crate::pagination::{PaginationConfig, PaginationEngine, PaginationState, Paginator};
use crate::state::StateManager;
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

type Engine = InstrumentedEngine<PaginationEngine<Value>>;

/// What a traversal prints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Emit {
    Items,
    Pages,
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command, printing to stdout
    pub async fn run(&self) -> Result<()> {
        let mut stdout = std::io::stdout();
        self.run_with_output(&mut stdout).await
    }

    /// Run the CLI command, printing to `out`
    pub async fn run_with_output<W: Write>(&self, out: &mut W) -> Result<()> {
        match &self.cli.command {
            Commands::Fetch(args) => self.traverse(args, out, Emit::Items).await,
            Commands::Pages(args) => self.traverse(args, out, Emit::Pages).await,
            Commands::Validate => self.validate(out),
        }
    }

    /// Load endpoint definition
    fn load_endpoint(&self) -> Result<EndpointConfig> {
        let path = self
            .cli
            .endpoint
            .as_ref()
            .ok_or_else(|| Error::config("Endpoint file not specified (use -e flag)"))?;
        load_endpoint(path)
    }

    /// Validate endpoint definition
    fn validate<W: Write>(&self, out: &mut W) -> Result<()> {
        let endpoint = self.load_endpoint()?;
        let pagination = match endpoint.pagination {
            PaginationDef::Cursor { .. } => "cursor",
            PaginationDef::Offset { .. } => "offset",
        };

        match self.cli.format {
            OutputFormat::Json => {
                let message = json!({
                    "status": "VALID",
                    "endpoint": endpoint.name,
                    "pagination": pagination,
                    "path": endpoint.path,
                });
                writeln!(out, "{message}")?;
            }
            OutputFormat::Pretty => {
                writeln!(
                    out,
                    "Endpoint '{}' is valid ({pagination} pagination, {}{})",
                    endpoint.name, endpoint.base_url, endpoint.path
                )?;
            }
        }
        Ok(())
    }

    /// Walk the endpoint with Ctrl-C wired to cancellation
    async fn traverse<W: Write>(&self, args: &TraverseArgs, out: &mut W, emit: Emit) -> Result<()> {
        let endpoint = self.load_endpoint()?;
        let token = CancellationToken::new();
        let interrupt = spawn_interrupt_handler(token.clone());

        let result = self.walk(&endpoint, args, token, out, emit).await;

        interrupt.abort();
        result
    }

    async fn walk<W: Write>(
        &self,
        endpoint: &EndpointConfig,
        args: &TraverseArgs,
        token: CancellationToken,
        out: &mut W,
        emit: Emit,
    ) -> Result<()> {
        let resumed = match &args.resume {
            Some(path) => StateManager::new(path)
                .load(&endpoint.name)
                .await
                .with_context(|| format!("Cannot resume from '{}'", path.display()))?,
            None => None,
        };
        let saver = args.save_state.as_ref().map(StateManager::new);

        let mut engine = build_engine(endpoint, args, token, resumed)?;

        if !engine.has_next() {
            info!(endpoint = %endpoint.name, "Nothing left to fetch");
        }

        while engine.has_next() {
            let page = engine.next().await?;
            let state = engine.pagination_state();

            match emit {
                Emit::Items => self.write_items(out, &page)?,
                Emit::Pages => self.write_page_summary(out, page.len(), &state)?,
            }

            if let Some(saver) = &saver {
                saver.save(&endpoint.name, &state).await?;
            }
        }

        let state = engine.pagination_state();
        info!(
            endpoint = %endpoint.name,
            pages = state.pages_fetched,
            items = state.items_fetched,
            exhausted = !state.has_more,
            "Traversal finished"
        );
        Ok(())
    }

    fn write_items<W: Write>(&self, out: &mut W, items: &[Value]) -> Result<()> {
        for item in items {
            let line = match self.cli.format {
                OutputFormat::Json => serde_json::to_string(item)?,
                OutputFormat::Pretty => serde_json::to_string_pretty(item)?,
            };
            writeln!(out, "{line}")?;
        }
        Ok(())
    }

    fn write_page_summary<W: Write>(
        &self,
        out: &mut W,
        size: usize,
        state: &PaginationState,
    ) -> Result<()> {
        match self.cli.format {
            OutputFormat::Json => {
                let message = json!({
                    "page": state.pages_fetched,
                    "items": size,
                    "items_fetched": state.items_fetched,
                    "has_more": state.has_more,
                    "cursor": state.cursor,
                });
                writeln!(out, "{message}")?;
            }
            OutputFormat::Pretty => {
                let next = state
                    .cursor
                    .as_deref()
                    .map_or_else(|| "last page".to_string(), |c| format!("next cursor {c}"));
                writeln!(
                    out,
                    "page {}: {size} items ({} total), {next}",
                    state.pages_fetched, state.items_fetched
                )?;
            }
        }
        Ok(())
    }
}

/// Build the engine for one run: endpoint defaults overridden by flags
fn build_engine(
    endpoint: &EndpointConfig,
    args: &TraverseArgs,
    token: CancellationToken,
    resumed: Option<PaginationState>,
) -> Result<Engine> {
    let mut options = endpoint.list_options();
    if args.limit.is_some() {
        options.limit = args.limit;
    }
    if let Some(cursor) = &args.cursor {
        options.cursor = Some(cursor.clone());
    }
    for raw in &args.filters {
        let (key, value) = parse_filter(raw).ok_or_else(|| {
            Error::invalid_value("filter", format!("expected KEY=VALUE, got '{raw}'"))
        })?;
        options.filters.insert(key, value);
    }

    let mut limits = endpoint.limits();
    if args.max_items.is_some() {
        limits.max_items = args.max_items;
    }
    if args.max_pages.is_some() {
        limits.max_pages = args.max_pages;
    }

    let mut builder = PaginationConfig::builder()
        .fetch_page(HttpListFetcher::new(endpoint.clone())?)
        .initial_options(options)
        .limits(limits)
        .cancel_token(token);

    let fetch_timeout = args
        .fetch_timeout
        .map(Duration::from_secs)
        .or_else(|| endpoint.http.fetch_timeout());
    if let Some(timeout) = fetch_timeout {
        builder = builder.fetch_timeout(timeout);
    }

    let config = builder.build()?;
    let engine = match resumed {
        Some(state) => {
            info!(
                endpoint = %endpoint.name,
                pages_fetched = state.pages_fetched,
                "Resuming from saved state"
            );
            PaginationEngine::resume(config, state)
        }
        None => PaginationEngine::new(config),
    };

    Ok(
        InstrumentedEngine::new(engine, Arc::new(TracingInstrumentation))
            .with_attribute("endpoint", endpoint.name.clone()),
    )
}

/// Cancel `token` on Ctrl-C
fn spawn_interrupt_handler(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            token.cancel();
        }
    })
}
