use crate::api::models::PlaylistResponse;
use crate::api::storefront::{AnalyticsEvent, StorefrontEndpoints};
use crate::error::{PlayerError, PlayerResult};
use gloo_net::http::Request;

pub async fn fetch_playlists(endpoints: &StorefrontEndpoints) -> PlayerResult<PlaylistResponse> {
    let url = endpoints.playlists_url();
    let response = Request::get(&url)
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|err| PlayerError::Network(err.to_string()))?;

    if !response.ok() {
        return Err(PlayerError::Network(format!(
            "GET {url} returned {}",
            response.status()
        )));
    }

    response
        .json::<PlaylistResponse>()
        .await
        .map_err(|err| PlayerError::Network(err.to_string()))
}

pub async fn send_analytics(
    endpoints: &StorefrontEndpoints,
    event: &AnalyticsEvent,
) -> PlayerResult<()> {
    let url = endpoints.analytics_url();
    let response = Request::post(&url)
        .json(event)
        .map_err(|err| PlayerError::Network(err.to_string()))?
        .send()
        .await
        .map_err(|err| PlayerError::Network(err.to_string()))?;

    if response.ok() {
        Ok(())
    } else {
        Err(PlayerError::Network(format!(
            "POST {url} returned {}",
            response.status()
        )))
    }
}
