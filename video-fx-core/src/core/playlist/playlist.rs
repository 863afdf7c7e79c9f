use std::slice::Iter;

use derive_more::Display;
use log::debug;

/// A struct representing an ordered playlist of media items.
///
/// The playlist retains its items while they're being played, allowing the
/// selection to wrap back around to the start when the end has been reached.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Playlist {
    items: Vec<PlaylistItem>,
}

impl Playlist {
    /// Adds a media item to the playlist.
    ///
    /// # Arguments
    ///
    /// * `item` - The item to add to the playlist.
    pub fn add(&mut self, item: PlaylistItem) {
        debug!("Adding media item {:?} to playlist", item);
        self.items.push(item);
    }

    /// Removes a media item from the playlist.
    ///
    /// # Arguments
    ///
    /// * `item` - The item to remove from the playlist.
    pub fn remove(&mut self, item: &PlaylistItem) {
        let position = self.items.iter().position(|e| e == item);

        if let Some(index) = position {
            debug!("Removing media item {} from playlist", item);
            self.items.remove(index);
        } else {
            debug!(
                "Unable to remove media {} from the playlist, item not found",
                item
            );
        }
    }

    /// Clears all media items from the playlist.
    pub fn clear(&mut self) {
        debug!("Clearing playlist");
        self.items.clear();
    }

    /// Retrieves the item at the given index within the playlist.
    pub fn get(&self, index: usize) -> Option<&PlaylistItem> {
        self.items.get(index)
    }

    /// The total number of items within the playlist.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Checks if the playlist contains any items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns an iterator over the media items in the playlist.
    pub fn iter(&self) -> Iter<'_, PlaylistItem> {
        self.items.iter()
    }
}

impl From<PlaylistItem> for Playlist {
    fn from(value: PlaylistItem) -> Self {
        let mut playlist = Playlist::default();
        playlist.add(value);
        playlist
    }
}

impl FromIterator<PlaylistItem> for Playlist {
    fn from_iter<T: IntoIterator<Item = PlaylistItem>>(iter: T) -> Self {
        let mut playlist = Self::default();
        for item in iter {
            playlist.add(item);
        }
        playlist
    }
}

/// Represents a playable item within a playlist.
#[derive(Debug, Display, Clone, PartialEq)]
#[display("url: {}, title: {}", url, title)]
pub struct PlaylistItem {
    /// The source url of the playlist item.
    pub url: String,
    /// The title of the playlist item.
    pub title: String,
    /// A caption or description for the playlist item, if available.
    pub caption: Option<String>,
    /// The thumbnail url of the playlist item, if available.
    pub thumb: Option<String>,
}

impl PlaylistItem {
    /// Creates a new builder for constructing a `PlaylistItem`.
    pub fn builder() -> PlaylistItemBuilder {
        PlaylistItemBuilder::builder()
    }
}

/// A builder for constructing a `PlaylistItem`.
#[derive(Debug, Default)]
pub struct PlaylistItemBuilder {
    url: Option<String>,
    title: Option<String>,
    caption: Option<String>,
    thumb: Option<String>,
}

impl PlaylistItemBuilder {
    /// Creates a new instance of `PlaylistItemBuilder`.
    pub fn builder() -> Self {
        Self::default()
    }

    /// Sets the source url of the playlist item.
    pub fn url<T: ToString>(mut self, url: T) -> Self {
        self.url = Some(url.to_string());
        self
    }

    /// Sets the title of the playlist item.
    pub fn title<T: ToString>(mut self, title: T) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Sets the caption of the playlist item.
    pub fn caption<T: ToString>(mut self, caption: T) -> Self {
        self.caption = Some(caption.to_string());
        self
    }

    /// Sets the thumbnail url of the playlist item.
    pub fn thumb<T: ToString>(mut self, thumb: T) -> Self {
        self.thumb = Some(thumb.to_string());
        self
    }

    /// Builds the `PlaylistItem`.
    ///
    /// # Panics
    ///
    /// Panics when the `url` or `title` has not been set.
    pub fn build(self) -> PlaylistItem {
        PlaylistItem {
            url: self.url.expect("expected the url to have been set"),
            title: self.title.expect("expected the title to have been set"),
            caption: self.caption,
            thumb: self.thumb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_item(title: &str) -> PlaylistItem {
        PlaylistItem::builder()
            .url(format!("http://localhost/{}.mp4", title))
            .title(title)
            .build()
    }

    #[test]
    fn test_add() {
        let item = new_item("Lorem");
        let mut playlist = Playlist::default();

        playlist.add(item.clone());

        assert_eq!(1, playlist.len());
        assert_eq!(Some(&item), playlist.get(0));
    }

    #[test]
    fn test_remove() {
        let item = new_item("Lorem");
        let other = new_item("Ipsum");
        let mut playlist = Playlist::from_iter(vec![item.clone(), other.clone()]);

        playlist.remove(&item);

        assert_eq!(1, playlist.len());
        assert_eq!(Some(&other), playlist.get(0));
    }

    #[test]
    fn test_clear() {
        let mut playlist = Playlist::from(new_item("Lorem"));

        playlist.clear();

        assert!(playlist.is_empty(), "expected the playlist to be empty");
    }

    #[test]
    fn test_get_out_of_bounds() {
        let playlist = Playlist::from(new_item("Lorem"));

        assert_eq!(None, playlist.get(1));
    }
}
