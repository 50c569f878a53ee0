mod auth;
mod config;
mod controller;
mod coordinator;
mod logging;
mod model;
mod player;
mod view;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use config::Config;
use controller::AppController;
use coordinator::{LogFeedback, PlaybackCoordinator};
use model::{FixtureLibraryClient, LibraryClient, LibraryModel, SpotifyClient};
use player::{ExternalPlayer, FixturePlayer, NoopPlaybackControl, PlaybackControl};
use view::AppView;

const TOKEN_CHECK_INTERVAL: Duration = Duration::from_secs(60);
const STATUS_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Everything the library and coordinator talk to
struct Backends {
    library: Arc<dyn LibraryClient>,
    playback: Arc<dyn PlaybackControl>,
    player: Arc<dyn ExternalPlayer>,
    spotify: Option<SpotifyClient>,
}

impl Backends {
    fn fixtures() -> Self {
        tracing::info!("Using fixture library");
        Self {
            library: Arc::new(FixtureLibraryClient::new()),
            playback: Arc::new(NoopPlaybackControl),
            player: Arc::new(FixturePlayer::new()),
            spotify: None,
        }
    }

    async fn spotify(device_name: Option<String>) -> Self {
        let spotify = SpotifyClient::connect(device_name).await;
        Self {
            library: Arc::new(spotify.clone()),
            playback: Arc::new(spotify.clone()),
            player: Arc::new(spotify.clone()),
            spotify: Some(spotify),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    if let Err(e) = logging::init_logging(&config.log_dir) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!(?config, "=== Mini Music Starting ===");

    let backends = if config.fixtures {
        Backends::fixtures()
    } else {
        Backends::spotify(config.device_name.clone()).await
    };

    let shutdown = CancellationToken::new();
    let poller: Option<JoinHandle<()>> = backends
        .spotify
        .as_ref()
        .map(|spotify| spotify.spawn_queue_poller(config.poll_interval(), shutdown.clone()));

    let library = LibraryModel::new(backends.library.clone());
    let coordinator = PlaybackCoordinator::new(
        library.clone(),
        backends.playback.clone(),
        backends.player.clone(),
        Arc::new(LogFeedback),
    );
    let controller = AppController::new(library.clone(), coordinator.clone());

    let startup = controller.clone();
    tokio::spawn(async move {
        startup.library.start().await;
        startup.clamp_selection().await;
        startup.coordinator.sync_now_playing().await;
    });
    coordinator.start_observing();

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, controller, backends.spotify.clone()).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    coordinator.stop_observing();
    shutdown.cancel();
    if let Some(poller) = poller {
        if let Err(e) = poller.await {
            tracing::warn!(error = %e, "Queue poller did not stop cleanly");
        }
    }

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    tracing::info!("Mini Music shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: AppController,
    spotify: Option<SpotifyClient>,
) -> io::Result<()> {
    let mut last_token_check = Instant::now();
    let mut last_status_check: Option<Instant> = None;
    let is_playing = Arc::new(AtomicBool::new(false));

    loop {
        // Periodically check and refresh token if needed
        if last_token_check.elapsed() >= TOKEN_CHECK_INTERVAL {
            last_token_check = Instant::now();
            if let Some(spotify) = spotify.clone() {
                tokio::spawn(async move {
                    if let Err(e) = spotify.refresh_token_if_needed().await {
                        tracing::warn!("Token refresh check failed: {}", e);
                    }
                });
            }
        }

        controller.auto_clear_old_errors().await;

        let library = controller.library.snapshot().await;
        let now_playing = controller.coordinator.now_playing();
        let scrim_opacity = controller.coordinator.scrim_opacity();
        let ui_state = controller.ui_state().await;

        // Playback status is a network round trip for Spotify, so poll it
        // in the background.
        if last_status_check.is_none_or(|at| at.elapsed() >= STATUS_CHECK_INTERVAL) {
            last_status_check = Some(Instant::now());
            let coordinator = controller.coordinator.clone();
            let is_playing = is_playing.clone();
            tokio::spawn(async move {
                is_playing.store(coordinator.is_playing().await, Ordering::Relaxed);
            });
        }
        let playing = now_playing.track.is_some() && is_playing.load(Ordering::Relaxed);

        terminal.draw(|f| {
            AppView::render(f, &library, &now_playing, playing, scrim_opacity, &ui_state);
        })?;

        // Handle input with shorter poll time for smoother UI updates
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => controller.handle_key_event(key).await,
                Event::Mouse(mouse) => controller.handle_mouse_event(mouse).await,
                _ => {}
            }
        }

        if controller.should_quit().await {
            break;
        }
    }

    Ok(())
}
