mod audit;
mod bootstrap;
mod input;
mod render;
mod session;

use std::sync::Arc;

use anyhow::Result;
use storefront_core::config::{AppConfig, LoadOptions};
use storefront_core::StoreEvent;
use tracing::info;

use crate::audit::TracingAuditSink;
use crate::input::{parse_command, spawn_line_reader, Command, HELP};
use crate::render::render;

fn init_logging(config: &AppConfig) {
    use storefront_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    match config.logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

async fn run() -> Result<()> {
    // Logging follows the loaded config, so load it first.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config, Arc::new(TracingAuditSink))?;
    let mut session = app.session();
    info!(
        event_name = "system.storefront.started",
        correlation_id = %session.correlation_id(),
        "storefront session started"
    );

    session.dispatch(StoreEvent::Started)?;
    println!("{}", render(session.state()));

    let mut lines = spawn_line_reader(std::io::BufReader::new(std::io::stdin()));
    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line.transpose()? else {
                    break;
                };
                match parse_command(&line) {
                    Ok(Command::Quit) => break,
                    Ok(Command::Help) => println!("{HELP}"),
                    Ok(Command::Show) => println!("{}", render(session.state())),
                    Ok(Command::Store(event)) => {
                        if let Err(error) = session.dispatch(event) {
                            println!("{}", error.user_message());
                        }
                        session.pump();
                        println!("{}", render(session.state()));
                    }
                    Err(error) => println!("{error}"),
                }
            }
            Some(event) = session.next_completion() => {
                if session.dispatch(event).is_ok() {
                    println!("{}", render(session.state()));
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!(
        event_name = "system.storefront.stopping",
        correlation_id = %session.correlation_id(),
        cart_size = session.state().cart.len(),
        "storefront session stopping"
    );
    Ok(())
}
