mod config;
mod sound;
mod state;
mod theme;
mod ui;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    io,
    path::Path,
    sync::mpsc::{self, Receiver},
    time::{Duration, Instant},
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_logging();

    let paths = config::resolve_paths()?;
    let mut app = state::App::new(paths);
    app.refresh(true);

    let (watcher, watch_rx) = setup_watcher(&app.paths.feed_path);
    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app, watch_rx);
    restore_terminal(&mut terminal)?;
    drop(watcher);

    if let Err(err) = result {
        eprintln!("asb-board: {err}");
    }

    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut state::App,
    watch_rx: Option<Receiver<()>>,
) -> Result<()> {
    // The scheduler counts in whole seconds, so the host drives it at 1 Hz
    // while input stays responsive on a shorter poll.
    let tick_rate = Duration::from_secs(1);
    let input_poll = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui::render(f, app))?;

        if event::poll(input_poll)? {
            match event::read()? {
                Event::Key(key) => {
                    if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                        app.handle_key(key);
                    }
                }
                Event::Mouse(mouse) => {
                    app.handle_mouse(mouse);
                }
                Event::Resize(_, _) => {
                    app.mark_dirty();
                }
                _ => {}
            }
        }

        if let Some(rx) = &watch_rx {
            let mut changed = false;
            while rx.try_recv().is_ok() {
                changed = true;
            }
            if changed {
                app.refresh(true);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }

        if app.should_quit() {
            break;
        }
    }

    Ok(())
}

fn setup_watcher(feed_path: &Path) -> (Option<RecommendedWatcher>, Option<Receiver<()>>) {
    let (tx, rx) = mpsc::sync_channel(1);
    let mut watcher = match RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            if res.is_ok() {
                let _ = tx.try_send(());
            }
        },
        Config::default(),
    ) {
        Ok(watcher) => watcher,
        Err(_) => return (None, None),
    };

    let Some(feed_dir) = feed_path.parent().filter(|dir| dir.exists()) else {
        return (None, None);
    };
    if watcher.watch(feed_dir, RecursiveMode::NonRecursive).is_err() {
        return (None, None);
    }

    (Some(watcher), Some(rx))
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_enabled = matches!(
        std::env::var("ASB_LOG_STDOUT").ok().as_deref(),
        Some("1") | Some("true") | Some("TRUE")
    );
    if stdout_enabled {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .try_init();
    }
}
