//! `kiosk` — terminal scan station for the muster attendance server.
//!
//! # Usage
//!
//! ```
//! kiosk --url http://localhost:8080 --station auto
//! kiosk --config /etc/muster/kiosk.toml
//! ```

mod app;
mod client;
mod ui;

use std::{
  io,
  time::{Duration, Instant},
};

use anyhow::{Context, Result};
use chrono::{FixedOffset, Local};
use app::{App, Command, Station};
use clap::Parser;
use client::ApiClient;
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;

const DEFAULT_URL: &str = "http://localhost:8080";
const DEFAULT_DEBOUNCE_MS: u64 = 500;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "kiosk", about = "Attendance scan station for muster")]
struct Args {
  /// Path to a TOML config file (url, station, debounce_ms, utc_offset).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the muster server (default: http://localhost:8080).
  #[arg(long, env = "MUSTER_URL")]
  url: Option<String>,

  /// Direction recorded by this station.
  #[arg(long, value_enum, env = "MUSTER_STATION")]
  station: Option<Station>,

  /// Idle milliseconds after the last keystroke before a scan is submitted.
  #[arg(long, env = "MUSTER_DEBOUNCE_MS")]
  debounce_ms: Option<u64>,

  /// School-local UTC offset for displayed times, e.g. `+08:00`. Should match
  /// the server's `utc_offset`; defaults to this machine's offset.
  #[arg(long, env = "MUSTER_UTC_OFFSET")]
  utc_offset: Option<String>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:         String,
  station:     Option<Station>,
  debounce_ms: Option<u64>,
  utc_offset:  Option<String>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let url = args
    .url
    .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
    .unwrap_or_else(|| DEFAULT_URL.to_string());
  let station = args.station.or(file_cfg.station).unwrap_or_default();
  let debounce = Duration::from_millis(
    args
      .debounce_ms
      .or(file_cfg.debounce_ms)
      .unwrap_or(DEFAULT_DEBOUNCE_MS),
  );

  let utc_offset = match args.utc_offset.or(file_cfg.utc_offset) {
    Some(raw) => raw
      .parse::<FixedOffset>()
      .with_context(|| format!("invalid utc_offset {raw:?}"))?,
    None => *Local::now().offset(),
  };

  let client = ApiClient::new(url)?;
  let mut app = App::new(client, station, debounce, utc_offset);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // A server that is down at startup is reported, not fatal.
  if let Err(e) = app.refresh_recent().await {
    app.apply_error(&e);
  }

  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event {
      match app.handle_key(key, Instant::now()) {
        Command::Quit => break,
        Command::Submit(code) => app.submit(code).await,
        Command::Continue => {}
      }
    }

    if let Some(code) = app.poll_idle(Instant::now()) {
      app.submit(code).await;
    }
  }

  Ok(())
}
