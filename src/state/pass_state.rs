/// Pass and per-region state definitions
use std::fmt;

/// One of the three resumable acquisition passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassKind {
    /// Enumerate the item ids visible from every region
    Ids,
    /// Scrape detail records for ids without one
    Titles,
    /// Look up thumbnails for titled ids without one
    Thumbnails,
}

impl PassKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ids => "ids",
            Self::Titles => "titles",
            Self::Thumbnails => "thumbnails",
        }
    }

    /// Passes in the order `acquire all` runs them
    pub fn all() -> [Self; 3] {
        [Self::Ids, Self::Titles, Self::Thumbnails]
    }
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a pass currently is
///
/// ```text
/// PendingRegion -> Connecting -> Connected -> Extracting -> Persisting -> NextRegion
///       |              |                                                     |
///       |              +--------------------(skip)---------------------------+
///       +--------------------------------(skip)------------------------------+
/// NextRegion -> PendingRegion | Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassState {
    /// A region is up next; its missing work has not been checked yet
    PendingRegion,

    /// Waiting for the region's network identity
    Connecting,

    /// Identity confirmed, browser session being opened
    Connected,

    /// Scraping through the open session
    Extracting,

    /// Flushing what was scraped
    Persisting,

    /// Region finished or skipped
    NextRegion,

    /// Every region has been visited and the aggregate step ran
    Done,
}

impl PassState {
    /// Returns true if moving from `self` to `next` is a legal step
    pub fn can_transition_to(&self, next: PassState) -> bool {
        use PassState::*;
        matches!(
            (self, next),
            (PendingRegion, Connecting)
                | (PendingRegion, NextRegion)
                | (PendingRegion, Done)
                | (Connecting, Connected)
                | (Connecting, NextRegion)
                | (Connected, Extracting)
                | (Connected, NextRegion)
                | (Extracting, Persisting)
                | (Extracting, NextRegion)
                | (Persisting, Extracting)
                | (Persisting, NextRegion)
                | (NextRegion, PendingRegion)
                | (NextRegion, Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingRegion => "pending_region",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Extracting => "extracting",
            Self::Persisting => "persisting",
            Self::NextRegion => "next_region",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for PassState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
