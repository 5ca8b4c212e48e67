use anyhow::Result;
use clap::Parser;
use song_scout::client::{HttpProxy, Orchestrator, SearchState};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "song-scout-client")]
#[command(about = "Look up a song and get AI recommendations from a song-scout server", long_about = None)]
struct Cli {
    /// Server URL
    #[arg(short, long, env = "SONG_SCOUT_URL", default_value = "http://localhost:3000")]
    server: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Song to search for. Reads queries from stdin when omitted.
    query: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let proxy = HttpProxy::new(&cli.server, Duration::from_secs(cli.timeout))?;
    let orchestrator = Orchestrator::new(Arc::new(proxy));

    if !cli.query.is_empty() {
        let state = run(&orchestrator, &cli.query.join(" ")).await;
        if matches!(state, SearchState::Failed(_)) {
            std::process::exit(1);
        }
        return Ok(());
    }

    let stdin = io::stdin();
    loop {
        print!("song> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        run(&orchestrator, &line).await;
        println!();
    }

    Ok(())
}

async fn run(orchestrator: &Orchestrator, query: &str) -> SearchState {
    let state = orchestrator.search(query).await;
    print!("{}", orchestrator.snapshot().await);
    state
}
