use crate::StatusFeed;

/// Built-in pages reachable from the palette alongside feed entries.
pub const PAGES: &[(&str, &str)] = &[
    ("board", "Status Board"),
    ("alerts", "Alerts"),
    ("learnings", "Learnings"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Page,
    Feature,
    Learning,
}

impl EntryKind {
    pub fn label(self) -> &'static str {
        match self {
            EntryKind::Page => "page",
            EntryKind::Feature => "feature",
            EntryKind::Learning => "learning",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaletteEntry {
    pub kind: EntryKind,
    pub id: String,
    pub label: String,
    value: String,
}

impl PaletteEntry {
    pub fn new(kind: EntryKind, id: impl Into<String>, label: impl Into<String>) -> Self {
        let id = id.into();
        let label = label.into();
        let value = format!("{} {}", id, label).to_lowercase();
        Self {
            kind,
            id,
            label,
            value,
        }
    }
}

/// Case-insensitive containment over each entry's precomputed match
/// string. An empty query passes everything through in input order.
pub fn filter<'a>(entries: &'a [PaletteEntry], query: &str) -> Vec<&'a PaletteEntry> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return entries.iter().collect();
    }
    entries
        .iter()
        .filter(|entry| entry.value.contains(&needle))
        .collect()
}

/// Build the palette contents once per feed load: static pages first,
/// then features, then learnings.
pub fn entries_from_feed(feed: &StatusFeed) -> Vec<PaletteEntry> {
    let mut entries: Vec<PaletteEntry> = PAGES
        .iter()
        .map(|(id, label)| PaletteEntry::new(EntryKind::Page, *id, *label))
        .collect();

    for feature in &feed.features {
        entries.push(PaletteEntry::new(
            EntryKind::Feature,
            feature.id.clone(),
            feature.name.clone(),
        ));
    }
    for learning in &feed.learnings {
        entries.push(PaletteEntry::new(
            EntryKind::Learning,
            learning.id.clone(),
            learning.title.clone(),
        ));
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<PaletteEntry> {
        vec![
            PaletteEntry::new(EntryKind::Page, "board", "Status Board"),
            PaletteEntry::new(EntryKind::Feature, "F1", "Feed Export"),
            PaletteEntry::new(EntryKind::Feature, "F2", "Digest Cache"),
            PaletteEntry::new(EntryKind::Learning, "L1", "Polling pitfalls"),
        ]
    }

    #[test]
    fn empty_query_passes_everything_in_order() {
        let entries = sample();
        let matched = filter(&entries, "");
        assert_eq!(matched.len(), 4);
        assert_eq!(matched[0].id, "board");

        let padded = filter(&entries, "   ");
        assert_eq!(padded.len(), 4);
    }

    #[test]
    fn matching_is_case_insensitive_over_id_and_label() {
        let entries = sample();

        let by_label = filter(&entries, "DIGEST");
        assert_eq!(by_label.len(), 1);
        assert_eq!(by_label[0].id, "F2");

        let by_id = filter(&entries, "f1");
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].label, "Feed Export");
    }

    #[test]
    fn no_match_yields_empty() {
        let entries = sample();
        assert!(filter(&entries, "zzz").is_empty());
    }

    #[test]
    fn feed_entries_list_pages_then_features_then_learnings() {
        let feed: StatusFeed = serde_json::from_str(
            r#"{
                "features": [{"id": "F1", "name": "Feed Export", "status": "OPEN"}],
                "learnings": [{"id": "L1", "title": "Polling pitfalls"}]
            }"#,
        )
        .expect("feed parses");

        let entries = entries_from_feed(&feed);
        assert_eq!(entries.len(), PAGES.len() + 2);
        assert_eq!(entries[0].kind, EntryKind::Page);
        assert_eq!(entries[PAGES.len()].kind, EntryKind::Feature);
        assert_eq!(entries.last().map(|e| e.kind), Some(EntryKind::Learning));
    }
}
