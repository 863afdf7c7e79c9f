use serde::{Deserialize, Serialize};

/// The stored auto-resume data of the video playbacks.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoResume {
    pub video_positions: Vec<VideoPosition>,
}

impl VideoResume {
    /// Find the position of the playback with the given source url.
    pub fn find_url(&self, url: &str) -> Option<&VideoPosition> {
        self.video_positions.iter().find(|e| e.url == url)
    }

    /// Find the position of the playback with the given title.
    pub fn find_title(&self, title: &str) -> Option<&VideoPosition> {
        self.video_positions.iter().find(|e| e.title == title)
    }

    /// Insert or update the position of the playback identified by the given url.
    pub fn insert(&mut self, url: &str, title: &str, last_known_time: u64) {
        if let Some(position) = self.video_positions.iter_mut().find(|e| e.url == url) {
            position.title = title.to_string();
            position.last_known_time = last_known_time;
        } else {
            self.video_positions.push(VideoPosition {
                url: url.to_string(),
                title: title.to_string(),
                last_known_time,
            });
        }
    }
}

/// The last known playback position of a video.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoPosition {
    /// The source url of the video playback.
    pub url: String,
    /// The title of the video playback.
    pub title: String,
    /// The last known time of the video playback in milliseconds.
    pub last_known_time: u64,
}

impl VideoPosition {
    /// The last known time of the video playback.
    pub fn last_known_timestamp(&self) -> &u64 {
        &self.last_known_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_url() {
        let url = "http://localhost/lorem.mp4";
        let mut resume = VideoResume::default();

        resume.insert(url, "Lorem", 19000);
        let result = resume
            .find_url(url)
            .expect("expected the position to have been found");

        assert_eq!(&19000u64, result.last_known_timestamp());
        assert_eq!(None, resume.find_url("http://localhost/other.mp4"));
    }

    #[test]
    fn test_find_title() {
        let title = "Ipsum";
        let mut resume = VideoResume::default();

        resume.insert("http://localhost/ipsum.mp4", title, 42000);
        let result = resume
            .find_title(title)
            .expect("expected the position to have been found");

        assert_eq!(&42000u64, result.last_known_timestamp());
        assert_eq!(None, resume.find_title("Dolor"));
    }

    #[test]
    fn test_insert_updates_existing_position() {
        let url = "http://localhost/lorem.mp4";
        let mut resume = VideoResume::default();

        resume.insert(url, "Lorem", 19000);
        resume.insert(url, "Lorem", 0);

        assert_eq!(1, resume.video_positions.len());
        assert_eq!(
            &0u64,
            resume.find_url(url).unwrap().last_known_timestamp()
        );
    }
}
