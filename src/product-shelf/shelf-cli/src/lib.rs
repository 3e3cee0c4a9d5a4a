//! CLI for product-shelf: browse, list and filter a product catalog.

mod logging;
mod tui;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use console::style;
use shelf_catalog::{
    CatalogSource, CatalogStore, CriteriaUpdate, DEFAULT_CATALOG_URL, Product, StoreOptions,
};
use std::io::Write;
use std::path::PathBuf;

use logging::LogTarget;

#[derive(Parser)]
#[command(name = "shelf")]
#[command(version, about = "Browse and filter a product catalog", long_about = None)]
pub struct Cli {
    /// Catalog location: an http(s) URL or a local JSON file
    #[arg(
        long,
        global = true,
        env = "SHELF_CATALOG_URL",
        default_value = DEFAULT_CATALOG_URL
    )]
    pub source: String,

    /// Append logs to this file instead of stderr
    /// (`browse` defaults to shelf.log in the temp directory)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Browse the catalog interactively
    Browse {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Print the products matching the filters
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Print the products as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Print the distinct categories of the catalog
    Categories,
}

/// Filter flags shared by `browse` and `list`.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only products whose title contains this text (case-insensitive)
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Only products costing at least this much
    #[arg(long, value_parser = parse_price)]
    pub min_price: Option<f64>,

    /// Only products costing at most this much
    #[arg(long, value_parser = parse_price)]
    pub max_price: Option<f64>,

    /// Only products in this category
    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// Turn category filtering off entirely
    #[arg(long)]
    pub no_category_filter: bool,
}

impl FilterArgs {
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            category_filter: !self.no_category_filter,
        }
    }

    /// The flags as a criteria update; absent flags leave criteria untouched.
    pub fn criteria_update(&self) -> CriteriaUpdate {
        let mut update = CriteriaUpdate::new();
        if let Some(search) = &self.search {
            update = update.search(search.clone());
        }
        if self.min_price.is_some() {
            update = update.min_price(self.min_price);
        }
        if self.max_price.is_some() {
            update = update.max_price(self.max_price);
        }
        if self.category.is_some() {
            update = update.category(self.category.clone());
        }
        update
    }
}

/// Price bounds must be finite numbers; `NaN` and `inf` are rejected.
fn parse_price(value: &str) -> Result<f64, String> {
    let price: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("`{value}` is not a number"))?;
    if price.is_finite() {
        Ok(price)
    } else {
        Err(format!("`{value}` is not a finite price"))
    }
}

/// Main entry point for the CLI.
pub fn main() -> Result<()> {
    let cli = Cli::parse();
    let source = CatalogSource::parse(&cli.source);

    match cli.command {
        Commands::Browse { filters } => {
            let log_file = cli
                .log_file
                .unwrap_or_else(|| std::env::temp_dir().join("shelf.log"));
            logging::init(LogTarget::File(log_file))?;
            browse(source, &filters)
        }
        Commands::List { filters, json } => {
            logging::init(target_for(cli.log_file))?;
            let mut stdout = std::io::stdout().lock();
            list_products(&source, &filters, json, &mut stdout)
        }
        Commands::Categories => {
            logging::init(target_for(cli.log_file))?;
            let mut stdout = std::io::stdout().lock();
            list_categories(&source, &mut stdout)
        }
    }
}

fn target_for(log_file: Option<PathBuf>) -> LogTarget {
    match log_file {
        Some(path) => LogTarget::File(path),
        None => LogTarget::Stderr,
    }
}

// ============================================================================
// Commands
// ============================================================================

fn browse(source: CatalogSource, filters: &FilterArgs) -> Result<()> {
    let selected = tui::run_browse(
        Box::new(source),
        filters.store_options(),
        filters.criteria_update(),
    )?;

    if !selected.is_empty() {
        println!(
            "{}",
            style(format!("Selected {} product(s):", selected.len())).bold()
        );
        for product in &selected {
            println!("  {}", format_product_line(product));
        }
    }
    Ok(())
}

/// Load `source` into a store with the filters applied.
///
/// Unlike the interactive browser, one-shot commands have nothing to show
/// without a catalog, so a failed load is an error here.
fn load_store(source: &CatalogSource, filters: &FilterArgs) -> Result<CatalogStore> {
    let mut store = CatalogStore::new(filters.store_options());
    store.set_criteria(filters.criteria_update());
    store
        .load(source)
        .with_context(|| format!("Failed to load catalog from {}", source))?;
    Ok(store)
}

/// Write the products matching `filters` to `out`, one line each or as JSON.
pub fn list_products(
    source: &CatalogSource,
    filters: &FilterArgs,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let store = load_store(source, filters)?;

    if json {
        let visible: Vec<&Product> = store.visible().collect();
        serde_json::to_writer_pretty(&mut *out, &visible)
            .context("Failed to serialize products")?;
        writeln!(out)?;
    } else {
        for product in store.visible() {
            writeln!(out, "{}", format_product_line(product))?;
        }
    }
    Ok(())
}

/// Write the distinct categories of the full catalog to `out`.
pub fn list_categories(source: &CatalogSource, out: &mut impl Write) -> Result<()> {
    let store = load_store(source, &FilterArgs::default())?;
    for category in store.categories() {
        writeln!(out, "{}", category)?;
    }
    Ok(())
}

/// One listing row: id, title, price, rating, category.
pub fn format_product_line(product: &Product) -> String {
    format!(
        "{:<4}  {:<32}  {:>10}  ★ {:.2}  {}",
        product.id,
        product.title,
        product.display_price(),
        product.rating,
        product.category
    )
}
