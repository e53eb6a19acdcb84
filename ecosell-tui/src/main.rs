//! Terminal UI for ecosell: identify recyclables from photos, see what they are worth,
//! and find recycling centers nearby.

mod app;
mod commands;
mod config;
mod input;
mod ui;

use std::{fs::File, io, sync::Arc, sync::Mutex, time::Duration as StdDuration};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ecosell_core::{
    model::ClassificationResult,
    ports::{FixedLocation, LocationPort},
    service::EcoSellService,
    upload::{ImageFile, read_image},
};
use ecosell_provider_geoip::GeoIpLocator;
use ecosell_provider_hf::HfModelLoader;
use ecosell_provider_overpass::OverpassCenters;
use ratatui::{Terminal, backend::CrosstermBackend};
use reqwest::Client;
use tracing_subscriber::EnvFilter;

use crate::app::{App, Notice};
use crate::config::{AppConfig, Cli, Command, LocationSource};
use crate::input::Action;

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let (config, command) = Cli::parse().into_config()?;
    init_tracing(&config)?;

    // HTTP + service setup
    let client = Client::builder()
        .user_agent("ecosell/0.1")
        .timeout(config.http_timeout)
        .build()?;
    let service = Arc::new(build_service(&config, &client));

    match command {
        Some(Command::Classify { path, weight }) => {
            return commands::classify(&service, &path, weight).await;
        }
        Some(Command::Centers) => return commands::centers(&service).await,
        Some(Command::Prices) => return commands::prices(),
        None => {}
    }

    // App state
    let app = App::new(service);

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

fn init_tracing(config: &AppConfig) -> Result<()> {
    // The TUI owns stdout, so logs go to a file.
    let log_file = File::create(&config.log_file)
        .with_context(|| format!("cannot open log file {}", config.log_file.display()))?;
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn build_service(config: &AppConfig, client: &Client) -> EcoSellService {
    let models = HfModelLoader::new(
        client.clone(),
        config.model.clone(),
        config.endpoints.clone(),
        config.hf_token.clone(),
    );
    let centers = OverpassCenters::with_interpreter_url(client.clone(), config.overpass_url.clone());
    let location: Arc<dyn LocationPort> = match &config.location {
        LocationSource::Fixed(coordinates) => Arc::new(FixedLocation::new(*coordinates)),
        LocationSource::GeoIp(url) => Arc::new(GeoIpLocator::with_url(client.clone(), url.clone())),
    };

    tracing::info!(
        model = %config.model,
        overpass = %config.overpass_url,
        "service configured"
    );

    EcoSellService::new(Arc::new(models), Arc::new(centers), location, config.search)
}

async fn run(terminal: &mut Tui, mut app: App) -> Result<()> {
    loop {
        // Draw current UI
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
        {
            match input::handle_key_event(key, &mut app) {
                Action::Quit => break,
                Action::None => {}
                Action::ClassifyPath => {
                    let first_result = app.result().is_none();
                    if classify_path(terminal, &mut app).await? && first_result {
                        load_centers(terminal, &mut app).await?;
                    }
                }
                Action::LoadCenters => load_centers(terminal, &mut app).await?,
            }
        }
    }

    Ok(())
}

/// Runs the upload flow for the typed path. Returns whether a result was stored.
async fn classify_path(terminal: &mut Tui, app: &mut App) -> Result<bool> {
    let path_text = app.path_input.trim();
    if path_text.is_empty() {
        app.notice = Some(Notice::Error(
            "Type the path to a photo, then press Enter".into(),
        ));
        return Ok(false);
    }

    let file = ImageFile::from_path(path_text);
    if let Err(err) = app.upload.select(file.clone()) {
        app.notice = Some(Notice::Error(err.to_string()));
        return Ok(false);
    }

    app.is_loading = true;
    app.notice = None;
    terminal.draw(|frame| ui::draw(frame, app))?;

    let image = match read_image(&file).await {
        Ok(image) => image,
        Err(err) => {
            tracing::warn!(error = %err, "reading image failed");
            app.upload.read_failed()?;
            app.is_loading = false;
            app.notice = Some(Notice::Error(err.to_string()));
            return Ok(false);
        }
    };

    app.upload.loaded(image.clone())?;
    terminal.draw(|frame| ui::draw(frame, app))?;

    let result = app.service.classify(&image).await;
    app.is_loading = false;

    app.notice = Some(if result == ClassificationResult::unknown() {
        Notice::Error("Could not identify the item. Try another photo.".into())
    } else {
        Notice::Info(format!("Identified: {}", result.label))
    });
    app.upload.classified(result)?;

    Ok(true)
}

async fn load_centers(terminal: &mut Tui, app: &mut App) -> Result<()> {
    app.is_loading = true;
    terminal.draw(|frame| ui::draw(frame, app))?;

    app.refresh_centers().await;
    app.is_loading = false;
    Ok(())
}
