use fx_callback::{Callback, Subscription};
use log::trace;

use crate::core::playlist::{PlaylistItem, PlaylistManager, PlaylistManagerEvent};

/// A single row within the playlist view.
///
/// Each row renders a passive preview of the item source together with the title label,
/// and highlights itself when it matches the active selection.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistRow {
    /// The index of the item within the playlist.
    pub index: usize,
    /// The item that is rendered by this row.
    pub item: PlaylistItem,
    /// Indicates if this row matches the active selection.
    pub active: bool,
}

/// The view component of the playlist.
///
/// The view itself carries no state, it projects the playlist of the manager into
/// renderable rows and reports row clicks back as selection changes.
#[derive(Debug, Clone)]
pub struct PlaylistView {
    manager: PlaylistManager,
}

impl PlaylistView {
    /// Create a new view on top of the given playlist manager.
    pub fn new(manager: PlaylistManager) -> Self {
        Self { manager }
    }

    /// The renderable rows of the playlist.
    pub async fn rows(&self) -> Vec<PlaylistRow> {
        let playlist = self.manager.playlist().await;
        let selected_index = self.manager.selected_index().await;

        playlist
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, item)| PlaylistRow {
                index,
                item,
                active: selected_index == Some(index),
            })
            .collect()
    }

    /// Report a click on the row with the given index.
    pub async fn click(&self, index: usize) {
        trace!("Playlist row {} has been clicked", index);
        self.manager.select(index).await
    }

    /// Subscribe to the changes of the underlying playlist.
    pub fn subscribe(&self) -> Subscription<PlaylistManagerEvent> {
        self.manager.subscribe()
    }
}
