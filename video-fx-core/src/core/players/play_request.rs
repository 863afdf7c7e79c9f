use std::fmt::{Debug, Display, Formatter};

/// A request for starting a new media playback within a [crate::core::players::Player].
#[derive(Clone, PartialEq)]
pub struct PlayRequest {
    /// The URL of the media to be played.
    pub url: String,
    /// The title of the media.
    pub title: String,
    /// The caption of the media request (if available).
    pub caption: Option<String>,
    /// The URL of the thumbnail associated with the media (if available).
    pub thumb: Option<String>,
    /// The time in milliseconds at which the playback should be resumed (if available).
    pub auto_resume_timestamp: Option<u64>,
}

impl PlayRequest {
    pub fn builder() -> PlayRequestBuilder {
        PlayRequestBuilder::builder()
    }

    /// Get the URL of the media to be played.
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Get the title of the media.
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Get the optional caption of this request.
    pub fn caption(&self) -> Option<String> {
        self.caption.clone()
    }

    /// Get the URL of the thumbnail associated with the media (if available).
    pub fn thumbnail(&self) -> Option<String> {
        self.thumb.clone()
    }

    /// Get the auto-resume timestamp for the media playback (if available).
    pub fn auto_resume_timestamp(&self) -> Option<u64> {
        self.auto_resume_timestamp
    }
}

impl Display for PlayRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title)
    }
}

impl Debug for PlayRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayRequest")
            .field("url", &self.url)
            .field("title", &self.title)
            .field("caption", &self.caption)
            .field("thumb", &self.thumb)
            .field("auto_resume_timestamp", &self.auto_resume_timestamp)
            .finish()
    }
}

/// A builder for constructing a `PlayRequest` with optional parameters.
#[derive(Debug, Default, Clone)]
pub struct PlayRequestBuilder {
    url: Option<String>,
    title: Option<String>,
    caption: Option<String>,
    thumb: Option<String>,
    auto_resume_timestamp: Option<u64>,
}

impl PlayRequestBuilder {
    /// Creates a new instance of the builder with default values.
    pub fn builder() -> Self {
        Default::default()
    }

    /// Sets the URL for the media to be played.
    pub fn url<S: Into<String>>(mut self, url: S) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the title of the media.
    pub fn title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the caption of the associated media.
    pub fn caption<S: Into<String>>(mut self, caption: S) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Sets the URL of the thumbnail associated with the media.
    pub fn thumb<S: Into<String>>(mut self, thumb: S) -> Self {
        self.thumb = Some(thumb.into());
        self
    }

    /// Sets the time at which the media playback should be resumed.
    pub fn auto_resume_timestamp(mut self, auto_resume_timestamp: u64) -> Self {
        self.auto_resume_timestamp = Some(auto_resume_timestamp);
        self
    }

    /// Builds the `PlayRequest`.
    ///
    /// # Panics
    ///
    /// Panics when the `url` or `title` has not been set.
    pub fn build(self) -> PlayRequest {
        PlayRequest {
            url: self.url.expect("expected the url to have been set"),
            title: self.title.expect("expected the title to have been set"),
            caption: self.caption,
            thumb: self.thumb,
            auto_resume_timestamp: self.auto_resume_timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_request_builder() {
        let url = "http://localhost/my-video.mp4";
        let title = "FooBar";
        let caption = "Lorem ipsum dolor";
        let thumb = "http://localhost/my-video.png";
        let auto_resume = 84000u64;

        let result = PlayRequest::builder()
            .url(url)
            .title(title)
            .caption(caption)
            .thumb(thumb)
            .auto_resume_timestamp(auto_resume)
            .build();

        assert_eq!(url, result.url());
        assert_eq!(title, result.title());
        assert_eq!(Some(caption.to_string()), result.caption());
        assert_eq!(Some(thumb.to_string()), result.thumbnail());
        assert_eq!(Some(auto_resume), result.auto_resume_timestamp());
    }

    #[test]
    fn test_play_request_display() {
        let request = PlayRequest::builder()
            .url("http://localhost/my-video.mp4")
            .title("FooBar")
            .build();

        assert_eq!("FooBar", request.to_string().as_str());
    }
}
