//! App-proxy endpoints the storefront player talks to, and the pure
//! shaping of their payloads.

use crate::api::models::{Playlist, PlaylistResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const EMPTY_PLAYLISTS_MESSAGE: &str = "No playlists available";
pub const EMPTY_TRACKS_MESSAGE: &str = "No tracks in playlist";

/// Stagger between duration probes so metadata requests don't pile up.
pub const PROBE_STAGGER: Duration = Duration::from_millis(200);

/// Builds app-proxy URLs for one shop.
#[derive(Debug, Clone, PartialEq)]
pub struct StorefrontEndpoints {
    pub shop: String,
    pub proxy_path: String,
}

impl StorefrontEndpoints {
    pub fn new(shop: impl Into<String>, proxy_path: impl Into<String>) -> Self {
        let proxy_path = proxy_path.into();
        Self {
            shop: shop.into(),
            proxy_path: proxy_path.trim_matches('/').to_string(),
        }
    }

    fn base(&self) -> String {
        format!("/apps/{}/music-player", self.proxy_path)
    }

    pub fn playlists_url(&self) -> String {
        format!(
            "{}/playlists?shop={}",
            self.base(),
            urlencoding::encode(&self.shop)
        )
    }

    pub fn analytics_url(&self) -> String {
        format!(
            "{}/analytics?shop={}",
            self.base(),
            urlencoding::encode(&self.shop)
        )
    }
}

/// Outcome of picking the playlist to play from the endpoint response.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaylistSelection {
    Ready(Playlist),
    Empty(&'static str),
}

/// Prefer the merchant's selected playlist, else the first one listed.
pub fn select_playlist(response: PlaylistResponse) -> PlaylistSelection {
    if !response.success {
        log::warn!(
            "playlist endpoint reported failure: {}",
            response.error.as_deref().unwrap_or("unknown error")
        );
        return PlaylistSelection::Empty(EMPTY_PLAYLISTS_MESSAGE);
    }

    let Some(data) = response.data else {
        return PlaylistSelection::Empty(EMPTY_PLAYLISTS_MESSAGE);
    };

    let chosen = data.selected_playlist.or_else(|| {
        data.playlists
            .and_then(|playlists| playlists.into_iter().next())
    });

    match chosen {
        None => PlaylistSelection::Empty(EMPTY_PLAYLISTS_MESSAGE),
        Some(playlist) => {
            let playlist = normalize_playlist(playlist);
            if playlist.is_empty() {
                PlaylistSelection::Empty(EMPTY_TRACKS_MESSAGE)
            } else {
                PlaylistSelection::Ready(playlist)
            }
        }
    }
}

/// Order tracks by their advisory `order` and drop entries with no audio.
pub fn normalize_playlist(mut playlist: Playlist) -> Playlist {
    let before = playlist.tracks.len();
    playlist
        .tracks
        .retain(|entry| !entry.track.audio_url.trim().is_empty());
    if playlist.tracks.len() != before {
        log::warn!(
            "dropped {} track(s) without an audio url from playlist {}",
            before - playlist.tracks.len(),
            playlist.id
        );
    }
    playlist.tracks.sort_by_key(|entry| entry.order);
    playlist
}

/// A background metadata probe for a track that arrived without a duration.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeRequest {
    pub track_id: String,
    pub audio_url: String,
    pub delay: Duration,
}

/// Probes for every track missing a duration, delayed by `index * 200ms`.
pub fn probe_schedule(playlist: &Playlist) -> Vec<ProbeRequest> {
    playlist
        .tracks
        .iter()
        .enumerate()
        .filter(|(_, entry)| !entry.track.has_known_duration())
        .map(|(index, entry)| ProbeRequest {
            track_id: entry.track.id.clone(),
            audio_url: entry.track.audio_url.clone(),
            delay: PROBE_STAGGER * index as u32,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsKind {
    Play,
    Pause,
    Skip,
    Complete,
}

/// Body of `POST /apps/<proxy>/music-player/analytics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub shop: String,
    pub session_id: String,
    pub event: AnalyticsKind,
    pub track_id: String,
    pub playlist_id: Option<String>,
    pub position: f64,
    pub occurred_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{PlaylistData, PlaylistTrack, Track};

    fn entry(id: &str, order: i64, url: &str, duration: Option<f64>) -> PlaylistTrack {
        PlaylistTrack {
            order,
            track: Track {
                id: id.to_string(),
                title: id.to_uppercase(),
                audio_url: url.to_string(),
                duration,
                ..Track::default()
            },
        }
    }

    fn playlist(id: &str, tracks: Vec<PlaylistTrack>) -> Playlist {
        Playlist {
            id: id.to_string(),
            name: id.to_string(),
            tracks,
        }
    }

    #[test]
    fn urls_encode_shop_and_trim_proxy() {
        let endpoints = StorefrontEndpoints::new("my shop.myshopify.com", "/webexp/");
        assert_eq!(
            endpoints.playlists_url(),
            "/apps/webexp/music-player/playlists?shop=my%20shop.myshopify.com"
        );
        assert!(endpoints
            .analytics_url()
            .starts_with("/apps/webexp/music-player/analytics?shop="));
    }

    #[test]
    fn selected_playlist_wins_over_list() {
        let response = PlaylistResponse {
            success: true,
            data: Some(PlaylistData {
                selected_playlist: Some(playlist("chosen", vec![entry("a", 0, "a.mp3", None)])),
                playlists: Some(vec![playlist("first", vec![entry("b", 0, "b.mp3", None)])]),
            }),
            error: None,
        };
        match select_playlist(response) {
            PlaylistSelection::Ready(pl) => assert_eq!(pl.id, "chosen"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_first_listed_playlist() {
        let response = PlaylistResponse {
            success: true,
            data: Some(PlaylistData {
                selected_playlist: None,
                playlists: Some(vec![
                    playlist("first", vec![entry("b", 0, "b.mp3", None)]),
                    playlist("second", vec![entry("c", 0, "c.mp3", None)]),
                ]),
            }),
            error: None,
        };
        match select_playlist(response) {
            PlaylistSelection::Ready(pl) => assert_eq!(pl.id, "first"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_states() {
        let none = PlaylistResponse {
            success: true,
            data: Some(PlaylistData::default()),
            error: None,
        };
        assert_eq!(
            select_playlist(none),
            PlaylistSelection::Empty(EMPTY_PLAYLISTS_MESSAGE)
        );

        let trackless = PlaylistResponse {
            success: true,
            data: Some(PlaylistData {
                selected_playlist: Some(playlist("p", vec![entry("x", 0, "  ", None)])),
                playlists: None,
            }),
            error: None,
        };
        assert_eq!(
            select_playlist(trackless),
            PlaylistSelection::Empty(EMPTY_TRACKS_MESSAGE)
        );

        let failed = PlaylistResponse {
            success: false,
            data: None,
            error: Some("shop not found".into()),
        };
        assert_eq!(
            select_playlist(failed),
            PlaylistSelection::Empty(EMPTY_PLAYLISTS_MESSAGE)
        );
    }

    #[test]
    fn normalization_sorts_by_order_stably() {
        let pl = normalize_playlist(playlist(
            "p",
            vec![
                entry("c", 3, "c.mp3", None),
                entry("a", 1, "a.mp3", None),
                entry("b", 1, "b.mp3", None),
            ],
        ));
        let ids: Vec<_> = pl.tracks.iter().map(|e| e.track.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn probes_are_staggered_by_track_index() {
        let pl = playlist(
            "p",
            vec![
                entry("a", 0, "a.mp3", Some(120.0)),
                entry("b", 1, "b.mp3", None),
                entry("c", 2, "c.mp3", Some(0.0)),
            ],
        );
        let schedule = probe_schedule(&pl);
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule[0].track_id, "b");
        assert_eq!(schedule[0].delay, Duration::from_millis(200));
        assert_eq!(schedule[1].track_id, "c");
        assert_eq!(schedule[1].delay, Duration::from_millis(400));
    }

    #[test]
    fn analytics_event_serializes_camel_case() {
        let event = AnalyticsEvent {
            shop: "demo.myshopify.com".into(),
            session_id: "s".into(),
            event: AnalyticsKind::Complete,
            track_id: "t1".into(),
            playlist_id: Some("p1".into()),
            position: 12.5,
            occurred_at: Utc::now(),
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["event"], "complete");
        assert_eq!(json["trackId"], "t1");
        assert_eq!(json["sessionId"], "s");
        assert!(json["occurredAt"].is_string());
    }
}
