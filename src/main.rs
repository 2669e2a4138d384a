use std::{env, io, process};

use atomic_accounts::csv::{read_instructions, write_balances};
use atomic_accounts::{Config, Replay};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: atomic-accounts <instructions.csv>");
        process::exit(2);
    };

    if !path.ends_with(".csv") {
        warn!(path, "input file seems to not be a csv file");
    }

    let config = Config::from_env().unwrap_or_else(|e| {
        warn!("{e}, using defaults");
        Config::default()
    });

    let instructions = match read_instructions(path) {
        Ok(instructions) => instructions,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let mut replay = Replay::new(config);
    let (sender, receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in instructions {
            match result {
                Ok(instruction) => {
                    if sender.send(instruction).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    replay.run(ReceiverStream::new(receiver)).await;

    let balances = match replay.balances() {
        Ok(balances) => balances,
        Err(e) => {
            error!("failed to read balances: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = write_balances(io::stdout().lock(), &balances) {
        error!("failed to write balances: {e}");
        process::exit(1);
    }
}
