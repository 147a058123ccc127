pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "storefront-cli",
    about = "Storefront operator CLI",
    long_about = "Inspect storefront configuration, check Product API readiness, and manage products.",
    after_help = "Examples:\n  storefront-cli doctor --json\n  storefront-cli products list --filter ap\n  storefront-cli products add --name Pen --price 2.00"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config and Product API reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List, create, update and delete products through the Product API")]
    Products {
        #[command(subcommand)]
        action: ProductsCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ProductsCommand {
    #[command(about = "List products, optionally filtered by a case-insensitive name substring")]
    List {
        #[arg(long)]
        filter: Option<String>,
    },
    #[command(about = "Create a product")]
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: String,
    },
    #[command(about = "Replace a product's name and price")]
    Update {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: String,
    },
    #[command(about = "Delete a product")]
    Delete { id: String },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Products { action } => match action {
            ProductsCommand::List { filter } => commands::products::list(filter.as_deref()),
            ProductsCommand::Add { name, price } => commands::products::add(&name, &price),
            ProductsCommand::Update { id, name, price } => {
                commands::products::update(&id, &name, &price)
            }
            ProductsCommand::Delete { id } => commands::products::delete(&id),
        },
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
