use crate::config::BoardPaths;
use crate::sound::SoundBank;
use asb_core::kv::KvStore;
use asb_core::palette::{self, EntryKind, PaletteEntry};
use asb_core::platform::{self, Platform};
use asb_core::schedule::{RefreshScheduler, TickOutcome};
use asb_core::watch::{ChangeSignal, ChangeWatcher};
use asb_core::{sha256_hex, StatusFeed};
use asb_storage::{PrefsStore, SessionStore};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use fs2::FileExt;
use ratatui::widgets::TableState;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::time::SystemTime;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Board,
    Alerts,
    Learnings,
}

impl Page {
    pub fn label(self) -> &'static str {
        match self {
            Page::Board => "board",
            Page::Alerts => "alerts",
            Page::Learnings => "learnings",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Page::Board => Page::Alerts,
            Page::Alerts => Page::Learnings,
            Page::Learnings => Page::Board,
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "board" => Some(Page::Board),
            "alerts" => Some(Page::Alerts),
            "learnings" => Some(Page::Learnings),
            _ => None,
        }
    }
}

pub struct App {
    pub paths: BoardPaths,
    pub feed: Option<StatusFeed>,
    pub page: Page,
    pub scheduler: RefreshScheduler,
    pub watcher: ChangeWatcher<SessionStore>,
    pub sounds: SoundBank,
    pub platform: Platform,
    pub table_state: TableState,
    pub palette_open: bool,
    pub palette_query: String,
    pub palette_selected: usize,
    pub palette_entries: Vec<PaletteEntry>,
    pub last_signal: Option<ChangeSignal>,
    pub last_error: Option<String>,
    pub last_feed_mtime: Option<SystemTime>,
    pub last_digest: Option<String>,
    pub show_help: bool,
    pub dirty: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(paths: BoardPaths) -> Self {
        let prefs: Box<dyn KvStore> = match PrefsStore::open(&paths.prefs_path) {
            Ok(store) => Box::new(store),
            Err(err) => {
                warn!(
                    error = %err,
                    path = %paths.prefs_path.display(),
                    "Falling back to in-memory preferences"
                );
                Box::new(SessionStore::new())
            }
        };
        let sounds = SoundBank::new(prefs, paths.sounds_dir.clone());

        // The board page is the initial view, so its scheduler starts
        // counting down immediately.
        let mut scheduler = RefreshScheduler::new();
        scheduler.activate();

        Self {
            paths,
            feed: None,
            page: Page::Board,
            scheduler,
            watcher: ChangeWatcher::new(SessionStore::new()),
            sounds,
            platform: platform::detect(),
            table_state: TableState::default(),
            palette_open: false,
            palette_query: String::new(),
            palette_selected: 0,
            palette_entries: Vec::new(),
            last_signal: None,
            last_error: None,
            last_feed_mtime: None,
            last_digest: None,
            show_help: false,
            dirty: false,
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn on_tick(&mut self) {
        if self.scheduler.tick() == TickOutcome::Refresh {
            self.refresh(false);
        }
    }

    pub fn refresh(&mut self, force: bool) {
        self.read_feed(force);
    }

    fn read_feed(&mut self, force: bool) {
        if !self.paths.feed_path.exists() {
            self.set_error(format!(
                "feed not found at {}",
                self.paths.feed_path.display()
            ));
            self.feed = None;
            self.palette_entries.clear();
            return;
        }

        let metadata = match std::fs::metadata(&self.paths.feed_path) {
            Ok(meta) => meta,
            Err(err) => {
                self.set_error(format!("Failed to read feed metadata: {err}"));
                return;
            }
        };

        // Change detection runs on every poll cycle, including the ones
        // where the file is untouched; the mtime and digest guards only
        // skip re-reading and re-parsing.
        let modified = metadata.modified().ok();
        if !force && self.last_feed_mtime == modified {
            self.run_change_detection();
            return;
        }

        let content = match read_locked(&self.paths.feed_path) {
            Ok(content) => content,
            Err(err) => {
                self.set_error(format!("Failed to read feed: {err}"));
                return;
            }
        };

        let digest = sha256_hex(&content);
        if self.last_digest.as_deref() == Some(digest.as_str()) {
            self.last_feed_mtime = modified;
            self.run_change_detection();
            return;
        }

        let feed = match serde_json::from_str::<StatusFeed>(&content) {
            Ok(feed) => feed,
            Err(err) => {
                self.set_error(format!("Failed to parse feed: {err}"));
                return;
            }
        };

        self.palette_entries = palette::entries_from_feed(&feed);
        self.feed = Some(feed);
        self.last_feed_mtime = modified;
        self.last_digest = Some(digest);
        self.last_error = None;
        self.run_change_detection();
        self.clamp_selection();
    }

    fn run_change_detection(&mut self) {
        let snapshots = match &self.feed {
            Some(feed) => feed.snapshots(),
            None => return,
        };
        if let Some(signal) = self.watcher.observe(&snapshots) {
            self.last_signal = Some(signal);
            self.sounds.play(signal);
        }
    }

    fn set_error(&mut self, message: String) {
        self.last_error = Some(message);
        self.mark_dirty();
    }

    pub fn set_page(&mut self, page: Page) {
        if self.page == page {
            return;
        }
        self.page = page;
        if page == Page::Board {
            self.scheduler.activate();
        } else {
            self.scheduler.deactivate();
        }
        self.table_state.select(None);
        self.clamp_selection();
        self.mark_dirty();
    }

    pub fn rows_len(&self) -> usize {
        let Some(feed) = &self.feed else {
            return 0;
        };
        match self.page {
            Page::Board => feed.features.len(),
            Page::Alerts => feed.alerts.len(),
            Page::Learnings => feed.learnings.len(),
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.rows_len();
        if len == 0 {
            self.table_state.select(None);
            return;
        }
        match self.table_state.selected() {
            Some(idx) if idx < len => {}
            Some(_) => self.table_state.select(Some(len - 1)),
            None => self.table_state.select(Some(0)),
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.rows_len() as isize;
        if len == 0 {
            return;
        }

        let current = self.table_state.selected().unwrap_or(0) as isize;
        let mut next = current + delta;
        if next < 0 {
            next = len - 1;
        }
        if next >= len {
            next = 0;
        }
        self.table_state.select(Some(next as usize));
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.sounds.note_interaction();

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('k') {
            self.toggle_palette();
            return;
        }

        if self.palette_open {
            self.handle_palette_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Esc => {
                if self.show_help {
                    self.show_help = false;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Char('r') => self.refresh(true),
            KeyCode::Char('p') => self.scheduler.toggle_pause(),
            KeyCode::Char('m') => self.sounds.toggle_mute(),
            KeyCode::Tab => self.set_page(self.page.next()),
            KeyCode::Char('1') => self.set_page(Page::Board),
            KeyCode::Char('2') => self.set_page(Page::Alerts),
            KeyCode::Char('3') => self.set_page(Page::Learnings),
            KeyCode::Char('?') => {
                self.show_help = !self.show_help;
            }
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, event: MouseEvent) {
        self.sounds.note_interaction();
        match event.kind {
            MouseEventKind::ScrollUp => self.move_selection(-1),
            MouseEventKind::ScrollDown => self.move_selection(1),
            _ => {}
        }
    }

    /// While the palette is open, printable keys belong to the query
    /// field rather than the global bindings.
    fn handle_palette_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.close_palette(),
            KeyCode::Enter => self.apply_palette_selection(),
            KeyCode::Up => self.move_palette_selection(-1),
            KeyCode::Down => self.move_palette_selection(1),
            KeyCode::Backspace => {
                self.palette_query.pop();
                self.palette_selected = 0;
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.palette_query.push(ch);
                self.palette_selected = 0;
            }
            _ => {}
        }
    }

    pub fn palette_matches(&self) -> Vec<&PaletteEntry> {
        palette::filter(&self.palette_entries, &self.palette_query)
    }

    fn move_palette_selection(&mut self, delta: isize) {
        let len = self.palette_matches().len() as isize;
        if len == 0 {
            self.palette_selected = 0;
            return;
        }

        let mut next = self.palette_selected as isize + delta;
        if next < 0 {
            next = len - 1;
        }
        if next >= len {
            next = 0;
        }
        self.palette_selected = next as usize;
    }

    fn apply_palette_selection(&mut self) {
        let choice = self
            .palette_matches()
            .get(self.palette_selected)
            .map(|entry| (entry.kind, entry.id.clone()));
        self.close_palette();

        let Some((kind, id)) = choice else {
            return;
        };

        match kind {
            EntryKind::Page => {
                if let Some(page) = Page::from_id(&id) {
                    self.set_page(page);
                }
            }
            EntryKind::Feature => {
                self.set_page(Page::Board);
                self.select_row_by(|feed| feed.features.iter().position(|f| f.id == id));
            }
            EntryKind::Learning => {
                self.set_page(Page::Learnings);
                self.select_row_by(|feed| feed.learnings.iter().position(|l| l.id == id));
            }
        }
    }

    fn select_row_by(&mut self, locate: impl Fn(&StatusFeed) -> Option<usize>) {
        if let Some(idx) = self.feed.as_ref().and_then(locate) {
            self.table_state.select(Some(idx));
        }
    }

    fn toggle_palette(&mut self) {
        if self.palette_open {
            self.close_palette();
        } else {
            self.open_palette();
        }
    }

    fn open_palette(&mut self) {
        self.palette_open = true;
        self.palette_query.clear();
        self.palette_selected = 0;
    }

    fn close_palette(&mut self) {
        self.palette_open = false;
        self.palette_query.clear();
        self.palette_selected = 0;
    }
}

/// Reads the feed under a shared advisory lock so a collaborator mid-write
/// with an exclusive lock is never observed half-written.
fn read_locked(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    file.lock_shared()?;
    let mut content = String::new();
    let result = file.read_to_string(&mut content);
    let _ = file.unlock();
    result?;
    Ok(content)
}
