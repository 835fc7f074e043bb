//! Terminal host for the map assistant.
//!
//! Reads chat turns from stdin and prints the assistant's reply plus a
//! one-line summary of the reconciled map state after each turn. Map and
//! chat rendering proper live in the graphical frontends; this host stays
//! deliberately thin.
//!
//! Commands: `/voice` opens the voice session, `/stop` closes it,
//! `/reset` resets the session, `/quit` exits.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use waypoint::assistant::Assistant;
use waypoint::audio::{CpalCapture, CpalPlaybackSink};
use waypoint::config::AssistantConfig;
use waypoint::model::http::HttpModelClient;
use waypoint::voice::WsVoiceConnector;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(AssistantConfig::default_path);
    let config = AssistantConfig::load_or_default(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(run(config))
}

async fn run(config: AssistantConfig) -> anyhow::Result<()> {
    let client = Arc::new(HttpModelClient::new(&config.model));
    let connector = Arc::new(WsVoiceConnector::new(config.voice.endpoint.clone()));
    let capture = Arc::new(CpalCapture::new(&config.audio, config.voice.frame_size));
    let sink =
        Arc::new(CpalPlaybackSink::new(&config.audio).context("opening playback device")?);
    let assistant = Assistant::new(&config, client, connector, capture, sink);

    println!("waypoint — type a request, or /voice, /stop, /reset, /quit");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match line.trim() {
            "/quit" => break,
            "/reset" => {
                assistant.reset();
                println!("session reset");
            }
            "/voice" => match assistant.open_voice().await {
                Ok(()) => println!("voice session open"),
                Err(e) => println!("voice session unavailable: {e}"),
            },
            "/stop" => {
                assistant.close_voice();
                println!("voice session closed");
            }
            input => {
                let _ = assistant.submit(input).await;
                print_turn(&assistant);
            }
        }
    }
    assistant.close_voice();
    Ok(())
}

/// Print the latest assistant message and the reconciled map state.
fn print_turn(assistant: &Assistant) {
    let store = assistant.store();
    if let Some(message) = store.transcript().last() {
        println!("{}", message.content);
        if let Some(route) = &message.route {
            println!(
                "  route: {} stop(s), {} step(s){}{}",
                route.stops.len(),
                route.steps.len(),
                route
                    .duration
                    .as_deref()
                    .map(|d| format!(", {d}"))
                    .unwrap_or_default(),
                route
                    .distance
                    .as_deref()
                    .map(|d| format!(", {d}"))
                    .unwrap_or_default(),
            );
        }
    }
    let view = store.map_view();
    println!(
        "  map: {} markers | zoom {:.0} @ {:.4},{:.4} | {:?}{}",
        store.marker_count(),
        view.zoom,
        view.center.lat,
        view.center.lng,
        view.layer,
        if view.traffic_enabled { " | traffic" } else { "" },
    );
}
