use std::sync::Arc;

use super::parser::parse_playlist;
use super::types::ChannelRecord;

/// Items per page boxes are told to expect.
pub const PAGE_SIZE: usize = 14;

/// Immutable snapshot of the parsed playlist.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    channels: Arc<Vec<ChannelRecord>>,
}

/**
    Pagination view over a catalog.

    `items` is always the whole catalog, not the requested page: boxes doing a
    full channel sync rely on getting every item in one response, while the
    counters still describe 14-item pages.
*/
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Arc<Vec<ChannelRecord>>,
    pub total_items: usize,
    pub current_page: usize,
    pub all_pages: usize,
}

impl Catalog {
    pub fn new(channels: Vec<ChannelRecord>) -> Self {
        Self {
            channels: Arc::new(channels),
        }
    }

    pub fn build(playlist: &str) -> Self {
        Self::new(parse_playlist(playlist))
    }

    pub fn channels(&self) -> &[ChannelRecord] {
        &self.channels
    }

    pub fn total_items(&self) -> usize {
        self.channels.len()
    }

    pub fn all_pages(&self) -> usize {
        self.total_items().div_ceil(PAGE_SIZE)
    }

    pub fn page(&self, page_number: usize) -> Page {
        Page {
            items: Arc::clone(&self.channels),
            total_items: self.total_items(),
            current_page: page_number.max(1),
            all_pages: self.all_pages(),
        }
    }
}
