use std::sync::Arc;

use clap::Subcommand;
use restraint_core::{open_engine, Poller};

#[derive(Subcommand)]
pub enum CounterAction {
    /// Print current counter state as JSON
    Status,
    /// Start a countdown from the configured jump value
    Activate,
    /// Clear the stored activation and return to idle
    Reset,
    /// Poll at the configured interval, printing events until interrupted
    Watch,
}

pub fn run(action: CounterAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        CounterAction::Status => {
            let mut engine = open_engine()?;
            if let Some(event) = engine.tick() {
                println!("{}", serde_json::to_string_pretty(&event)?);
            }
            println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
        }
        CounterAction::Activate => {
            let mut engine = open_engine()?;
            let event = engine.activate()?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        CounterAction::Reset => {
            let mut engine = open_engine()?;
            let event = engine.reset()?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        CounterAction::Watch => watch()?,
    }
    Ok(())
}

/// Poll until Ctrl-C, printing one JSON event per line.
fn watch() -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async move {
        let engine = Arc::new(tokio::sync::Mutex::new(engine));
        let poller = Poller::spawn(engine, |event| match serde_json::to_string(&event) {
            Ok(line) => println!("{line}"),
            Err(e) => eprintln!("error: {e}"),
        });
        let _ = tokio::signal::ctrl_c().await;
        poller.stop().await;
    });
    Ok(())
}
