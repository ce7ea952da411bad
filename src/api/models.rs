use serde::{Deserialize, Serialize};

/// A single audio track as served by the storefront playlist endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Track {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default, alias = "albumArt")]
    pub album_art: Option<String>,
    #[serde(default, alias = "audioUrl")]
    pub audio_url: String,
    /// Seconds. Populated lazily by the duration probe when the server
    /// did not supply it.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default, alias = "fileSize")]
    pub file_size: Option<u64>,
}

impl Track {
    pub fn has_known_duration(&self) -> bool {
        self.duration
            .map(crate::utils::is_known_duration)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlaylistTrack {
    #[serde(default)]
    pub order: i64,
    pub track: Track,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Playlist {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tracks: Vec<PlaylistTrack>,
}

impl Playlist {
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index).map(|entry| &entry.track)
    }

    pub fn position_of_id(&self, track_id: &str) -> Option<usize> {
        self.tracks.iter().position(|entry| entry.track.id == track_id)
    }

    pub fn position_of_url(&self, audio_url: &str) -> Option<usize> {
        if audio_url.is_empty() {
            return None;
        }
        self.tracks
            .iter()
            .position(|entry| entry.track.audio_url == audio_url)
    }
}

/// Payload of `GET /apps/<proxy>/music-player/playlists`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlaylistData {
    #[serde(default, alias = "selectedPlaylist")]
    pub selected_playlist: Option<Playlist>,
    #[serde(default)]
    pub playlists: Option<Vec<Playlist>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlaylistResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<PlaylistData>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_payload() {
        let raw = r#"{
            "success": true,
            "data": {
                "selectedPlaylist": {
                    "id": "pl_1",
                    "name": "Lobby",
                    "tracks": [
                        { "order": 2, "track": { "id": "t2", "title": "Two", "artist": "B",
                          "audioUrl": "https://cdn.example/2.mp3", "fileSize": 2048 } },
                        { "order": 1, "track": { "id": "t1", "title": "One", "artist": "A",
                          "albumArt": "https://cdn.example/1.jpg",
                          "audioUrl": "https://cdn.example/1.mp3", "duration": 181.5 } }
                    ]
                }
            }
        }"#;
        let response: PlaylistResponse = serde_json::from_str(raw).expect("parse");
        let playlist = response
            .data
            .and_then(|data| data.selected_playlist)
            .expect("selected playlist");
        assert_eq!(playlist.len(), 2);
        assert_eq!(playlist.tracks[0].track.file_size, Some(2048));
        assert_eq!(playlist.tracks[1].track.duration, Some(181.5));
        assert_eq!(
            playlist.tracks[1].track.album_art.as_deref(),
            Some("https://cdn.example/1.jpg")
        );
        assert_eq!(playlist.position_of_url("https://cdn.example/1.mp3"), Some(1));
        assert_eq!(playlist.position_of_id("t2"), Some(0));
    }

    #[test]
    fn zero_duration_is_not_known() {
        let track = Track {
            duration: Some(0.0),
            ..Track::default()
        };
        assert!(!track.has_known_duration());
    }
}
