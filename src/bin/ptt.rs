//! Push-to-talk recorder CLI
//!
//! Thin shim over the session controller: `record` starts capturing the
//! microphone, `stop` finishes the take, `play` renders it back.

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ptt_recorder::{Config, SessionController};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Optional config file path as the first argument
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(Path::new(&path))?,
        None => Config::default(),
    };

    tracing::info!(
        "Recording to {} ({}Hz, {} channel(s), {} samples/frame)",
        config.output_path().display(),
        config.format.sample_rate,
        config.format.channels,
        config.format.frame_size
    );

    let mut controller = SessionController::new(&config);

    println!("Commands: record | stop | play | status | quit");

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match line.trim() {
            "record" | "r" => match controller.start_recording() {
                Ok(()) => println!("Recording... type 'stop' to finish"),
                Err(e) => eprintln!("Could not start recording: {}", e),
            },
            "stop" | "s" => {
                controller.stop_recording();
                controller.stop_playback();
                println!("Stopped");
            }
            "play" | "p" => match controller.start_playback() {
                Ok(()) => println!("Playing..."),
                Err(e) => eprintln!("Could not start playback: {}", e),
            },
            "status" => {
                println!(
                    "recording: {:?}, playback: {:?}",
                    controller.recording_status(),
                    controller.playback_status()
                );
            }
            "quit" | "q" => break,
            "" => {}
            other => println!("Unknown command: {}", other),
        }
    }

    controller.stop_recording();
    controller.stop_playback();
    controller.join();

    Ok(())
}
