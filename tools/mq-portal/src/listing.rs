use crate::types::QueueDepthEntry;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    pub contains: Option<String>,
    pub only_positive: bool,
}

impl ListingFilter {
    pub fn is_active(&self) -> bool {
        self.only_positive || self.needle().is_some()
    }

    fn needle(&self) -> Option<String> {
        self.contains
            .as_deref()
            .map(|text| text.trim().to_lowercase())
            .filter(|text| !text.is_empty())
    }

    pub fn apply<'a>(&self, entries: &'a [QueueDepthEntry]) -> Vec<&'a QueueDepthEntry> {
        let needle = self.needle();
        entries
            .iter()
            .filter(|entry| match &needle {
                Some(needle) => entry.name.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .filter(|entry| !self.only_positive || entry.depth.is_some_and(|d| d > 0))
            .collect()
    }
}

pub fn format_entry(entry: &QueueDepthEntry) -> String {
    match entry.depth {
        Some(depth) => format!("{} ({depth})", entry.name),
        None => format!("{} (NA)", entry.name),
    }
}

pub fn format_entries<'a>(entries: impl IntoIterator<Item = &'a QueueDepthEntry>) -> Vec<String> {
    entries.into_iter().map(format_entry).collect()
}
