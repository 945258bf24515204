//! Fixed storage keys shared by the change watcher and the sound bank.

/// Session-scoped: JSON array of every feature id observed this run.
pub const SEEN_FEATURE_IDS: &str = "asb.seen-feature-ids";

/// Session-scoped: JSON array of every feature id observed as completed.
pub const SEEN_COMPLETED_IDS: &str = "asb.seen-completed-ids";

/// Session-scoped: `"true"` once the watcher has seeded its baseline.
pub const SESSION_INIT: &str = "asb.session-init";

/// Durable: `"true"`/`"false"` mute preference, survives across runs.
pub const MUTED: &str = "asb.muted";
