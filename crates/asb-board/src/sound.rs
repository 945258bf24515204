use asb_core::keys;
use asb_core::kv::KvStore;
use asb_core::watch::ChangeSignal;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

fn asset_name(signal: ChangeSignal) -> &'static str {
    match signal {
        ChangeSignal::Created => "feature-created.wav",
        ChangeSignal::Completed => "feature-completed.wav",
    }
}

/// Plays notification sounds through whatever player the host OS ships.
/// The mute flag is the only durable preference; everything else is
/// per-run state.
pub struct SoundBank {
    store: Box<dyn KvStore>,
    sounds_dir: PathBuf,
    muted: bool,
    interacted: bool,
}

impl SoundBank {
    pub fn new(store: Box<dyn KvStore>, sounds_dir: PathBuf) -> Self {
        let muted = match store.get(keys::MUTED) {
            Ok(value) => value.as_deref() == Some("true"),
            Err(err) => {
                warn!(error = %err, "Failed to read mute preference");
                false
            }
        };

        Self {
            store,
            sounds_dir,
            muted,
            interacted: false,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Flips the in-memory flag first. A failed write only costs
    /// persistence across restarts.
    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        let value = if self.muted { "true" } else { "false" };
        if let Err(err) = self.store.set(keys::MUTED, value) {
            warn!(error = %err, "Failed to persist mute preference");
        }
    }

    /// Recorded once the user presses a key or clicks. Playback never
    /// checks it; it exists for display and diagnostics only.
    pub fn note_interaction(&mut self) {
        self.interacted = true;
    }

    pub fn has_interacted(&self) -> bool {
        self.interacted
    }

    pub fn play(&self, signal: ChangeSignal) {
        if self.muted {
            return;
        }

        let asset = self.sounds_dir.join(asset_name(signal));
        if !asset.exists() {
            debug!(asset = %asset.display(), "Sound asset missing, skipping playback");
            return;
        }

        if let Err(err) = spawn_player(&asset) {
            debug!(error = %err, signal = signal.as_str(), "Failed to play sound");
        }
    }
}

#[cfg(target_os = "macos")]
fn spawn_player(asset: &Path) -> io::Result<()> {
    Command::new("afplay")
        .arg(asset)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
}

#[cfg(target_os = "linux")]
fn spawn_player(asset: &Path) -> io::Result<()> {
    let paplay = Command::new("paplay")
        .arg(asset)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    if paplay.is_ok() {
        return Ok(());
    }

    Command::new("aplay")
        .arg(asset)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
}

#[cfg(target_os = "windows")]
fn spawn_player(asset: &Path) -> io::Result<()> {
    let script = format!(
        "(New-Object Media.SoundPlayer '{}').PlaySync()",
        asset.display().to_string().replace('\'', "''")
    );
    Command::new("powershell")
        .args(["-Command", &script])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
}

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
fn spawn_player(_asset: &Path) -> io::Result<()> {
    Ok(())
}
