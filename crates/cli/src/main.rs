//! `partsbin` — inventory and invoicing for a small auto-parts shop.
//!
//! All state lives as JSON under one data directory (the OS data dir by
//! default; override with `--data-dir` or `PARTSBIN_DATA_DIR`). Every
//! command loads the store, applies its operation and writes back
//! synchronously.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use partsbin_core::{InvoiceId, PartId, coerce_amount, coerce_quantity};
use partsbin_inventory::{
    CreateOutcome, InventoryStore, LabelArt, PartDraft, PartFilter, render_label_with_fallback,
    template_csv,
};
use partsbin_invoicing::InvoiceBook;
use partsbin_storage::JsonFileStore;
use rust_decimal::Decimal;

#[derive(Parser)]
#[command(name = "partsbin")]
#[command(about = "Inventory and invoicing for a small auto-parts shop")]
struct Cli {
    /// Store directory (defaults to the OS data dir or $PARTSBIN_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a part to the inventory
    Add {
        #[arg(long, default_value = "")]
        company: String,

        /// Product code (the dedup key)
        #[arg(long)]
        code: String,

        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        car_model: String,

        #[arg(long, default_value = "")]
        model_year: String,

        /// Stock quantity (blank or unparsable falls back to 1)
        #[arg(long, default_value = "1")]
        quantity: String,

        #[arg(long)]
        buy: String,

        #[arg(long)]
        sell: String,

        /// Keep the part as a new record even if the code already exists
        #[arg(long)]
        as_new: bool,
    },

    /// List parts, optionally filtered
    List {
        /// Free-text search across name, car model, year, company and code
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        car_model: Option<String>,

        #[arg(long)]
        model_year: Option<String>,
    },

    /// Update a part in place
    Update {
        id: PartId,

        #[arg(long, default_value = "")]
        company: String,

        #[arg(long)]
        code: String,

        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        car_model: String,

        #[arg(long, default_value = "")]
        model_year: String,

        #[arg(long, default_value = "1")]
        quantity: String,

        #[arg(long)]
        buy: String,

        #[arg(long)]
        sell: String,
    },

    /// Delete a part by id
    Delete { id: PartId },

    /// Show inventory totals
    Stats,

    /// Export the inventory as CSV (to stdout, or a file)
    Export { path: Option<PathBuf> },

    /// Import parts from a CSV file
    Import { path: PathBuf },

    /// Write the CSV import template (to stdout, or a file)
    Template { path: Option<PathBuf> },

    /// Print the QR label payload for a part
    Label { id: PartId },

    /// Build and manage invoices
    #[command(subcommand)]
    Invoice(InvoiceCommands),
}

#[derive(Subcommand)]
enum InvoiceCommands {
    /// Build and commit an invoice in one shot
    New {
        #[arg(long)]
        customer: String,

        #[arg(long, default_value = "")]
        phone: String,

        #[arg(long, default_value = "")]
        date: String,

        /// Stock line as PART_ID:QTY (repeatable)
        #[arg(long = "stock")]
        stock: Vec<String>,

        /// Manual line as DESCRIPTION:UNIT_PRICE:QTY (repeatable)
        #[arg(long = "manual")]
        manual: Vec<String>,
    },

    /// List archived invoices
    History,

    /// Show one archived invoice
    Show { id: InvoiceId },

    /// Delete an archived invoice
    Delete { id: InvoiceId },
}

fn main() -> anyhow::Result<()> {
    partsbin_observability::init();
    let cli = Cli::parse();

    let data_dir = resolve_data_dir(cli.data_dir)?;
    let kv = JsonFileStore::open(&data_dir)
        .with_context(|| format!("failed to open store at {}", data_dir.display()))?;

    match cli.command {
        Commands::Add {
            company,
            code,
            name,
            car_model,
            model_year,
            quantity,
            buy,
            sell,
            as_new,
        } => {
            let mut inventory = InventoryStore::load(kv)?;
            let draft = PartDraft {
                company,
                product_code: code,
                part_name: name,
                car_model,
                model_year,
                quantity: coerce_quantity(&quantity, 1),
                buy_price: coerce_amount(&buy),
                sell_price: coerce_amount(&sell),
            };
            match inventory.create(draft)? {
                CreateOutcome::Created(part) => {
                    println!("added part #{} ({})", part.id, part.product_code);
                }
                CreateOutcome::Duplicate(pending) if as_new => {
                    let part = inventory.resolve_as_new(pending)?;
                    println!("added part #{} (duplicate code {})", part.id, part.product_code);
                }
                CreateOutcome::Duplicate(pending) => {
                    let existing = inventory.resolve_as_edit(&pending.draft().product_code)?;
                    bail!(
                        "product code {} already exists as part #{} ({}); \
                         rerun with --as-new to keep both, or use `update {}`",
                        existing.product_code,
                        existing.id,
                        existing.part_name,
                        existing.id,
                    );
                }
            }
        }

        Commands::List {
            search,
            company,
            car_model,
            model_year,
        } => {
            let inventory = InventoryStore::load(kv)?;
            let filter = PartFilter {
                text: search,
                company,
                car_model,
                model_year,
            };
            for part in inventory.query(&filter) {
                println!(
                    "#{}\t{}\t{}\t{} {}\tqty {}\tbuy {}\tsell {}",
                    part.id,
                    part.product_code,
                    part.part_name,
                    part.car_model,
                    part.model_year,
                    part.quantity,
                    part.buy_price,
                    part.sell_price,
                );
            }
        }

        Commands::Update {
            id,
            company,
            code,
            name,
            car_model,
            model_year,
            quantity,
            buy,
            sell,
        } => {
            let mut inventory = InventoryStore::load(kv)?;
            let draft = PartDraft {
                company,
                product_code: code,
                part_name: name,
                car_model,
                model_year,
                quantity: coerce_quantity(&quantity, 1),
                buy_price: coerce_amount(&buy),
                sell_price: coerce_amount(&sell),
            };
            let part = inventory.update(id, draft)?;
            println!("updated part #{}", part.id);
        }

        Commands::Delete { id } => {
            let mut inventory = InventoryStore::load(kv)?;
            inventory.delete(id)?;
            println!("deleted part #{id}");
        }

        Commands::Stats => {
            let inventory = InventoryStore::load(kv)?;
            let totals = inventory.aggregates();
            println!("items:      {}", totals.total_items);
            println!("total cost: {}", totals.total_cost);
            println!("profit:     {}", totals.total_profit);
            println!("low stock:  {}", totals.low_stock_count);
        }

        Commands::Export { path } => {
            let inventory = InventoryStore::load(kv)?;
            let csv = inventory.export_csv();
            write_or_print(path, &csv)?;
        }

        Commands::Import { path } => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let mut inventory = InventoryStore::load(kv)?;
            let report = inventory.import_csv(&text)?;
            println!("imported {}/{} rows", report.success, report.total);
            for error in &report.errors {
                println!("  {error}");
            }
        }

        Commands::Template { path } => {
            write_or_print(path, &template_csv())?;
        }

        Commands::Label { id } => {
            let inventory = InventoryStore::load(kv)?;
            let part = inventory
                .get(id)
                .with_context(|| format!("no part #{id}"))?;
            // No QR renderer is wired into the CLI; the text placeholder is
            // the documented fallback.
            match render_label_with_fallback(&[], part) {
                LabelArt::TextPlaceholder(payload) => println!("{payload}"),
                LabelArt::Image(bytes) => println!("label image ({} bytes)", bytes.len()),
            }
        }

        Commands::Invoice(command) => run_invoice(kv, command)?,
    }

    Ok(())
}

fn run_invoice(kv: JsonFileStore, command: InvoiceCommands) -> anyhow::Result<()> {
    match command {
        InvoiceCommands::New {
            customer,
            phone,
            date,
            stock,
            manual,
        } => {
            let mut inventory = InventoryStore::load(kv.clone())?;
            let mut book = InvoiceBook::load(kv, Utc::now())?;

            for spec in &stock {
                let (part_id, quantity) = parse_stock_line(spec)?;
                book.add_from_stock(&inventory, part_id, quantity)?;
            }
            for spec in &manual {
                let (description, unit_price, quantity) = parse_manual_line(spec)?;
                book.add_manual(&description, unit_price, quantity)?;
            }
            book.set_customer(&customer, &phone, &date)?;

            let archived = book.commit(&mut inventory, Utc::now())?;
            println!(
                "{} committed for {}: total {}",
                archived.invoice_number, archived.customer_name, archived.grand_total,
            );
        }

        InvoiceCommands::History => {
            let book = InvoiceBook::load(kv, Utc::now())?;
            for invoice in book.history() {
                println!(
                    "{}\t{}\t{}\t{} items\ttotal {}",
                    invoice.id,
                    invoice.invoice_number,
                    invoice.customer_name,
                    invoice.items.len(),
                    invoice.grand_total,
                );
            }
        }

        InvoiceCommands::Show { id } => {
            let mut book = InvoiceBook::load(kv, Utc::now())?;
            let invoice = book.view_from_history(id)?;
            println!("{} / {}", invoice.invoice_number, invoice.customer_name);
            for item in &invoice.items {
                println!(
                    "  {} x{} @ {} = {}",
                    item.description(),
                    item.quantity(),
                    item.unit_price(),
                    item.line_total(),
                );
            }
            println!("total {}", invoice.grand_total);
        }

        InvoiceCommands::Delete { id } => {
            let mut book = InvoiceBook::load(kv, Utc::now())?;
            book.delete_from_history(id)?;
            println!("deleted invoice {id}");
        }
    }
    Ok(())
}

/// Parse `PART_ID:QTY`.
fn parse_stock_line(spec: &str) -> anyhow::Result<(PartId, u32)> {
    let Some((id, quantity)) = spec.split_once(':') else {
        bail!("stock line must be PART_ID:QTY, got `{spec}`");
    };
    let part_id: PartId = id.parse()?;
    Ok((part_id, coerce_quantity(quantity, 1)))
}

/// Parse `DESCRIPTION:UNIT_PRICE:QTY` (description may itself contain `:`).
fn parse_manual_line(spec: &str) -> anyhow::Result<(String, Decimal, u32)> {
    let Some((rest, quantity)) = spec.rsplit_once(':') else {
        bail!("manual line must be DESCRIPTION:UNIT_PRICE:QTY, got `{spec}`");
    };
    let Some((description, unit_price)) = rest.rsplit_once(':') else {
        bail!("manual line must be DESCRIPTION:UNIT_PRICE:QTY, got `{spec}`");
    };
    Ok((
        description.to_string(),
        coerce_amount(unit_price),
        coerce_quantity(quantity, 1),
    ))
}

fn write_or_print(path: Option<PathBuf>, content: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            fs::write(&path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("wrote {}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}

fn resolve_data_dir(flag: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    if let Ok(dir) = std::env::var("PARTSBIN_DATA_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let base = dirs::data_dir().context("failed to resolve the OS app data directory")?;
    Ok(base.join("partsbin"))
}
