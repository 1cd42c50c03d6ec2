//! REST API endpoints for Nominatim (nominatim.openstreetmap.org)

/// Free-text place search, returning up to `limit` candidates ordered by
/// relevance.
/// Usage policy: at most 1 request/sec, identifying User-Agent required.
pub async fn search(
    client: &reqwest::Client,
    base_url: &str,
    query: &str,
    limit: usize,
) -> reqwest::Result<Vec<schema::Place>> {
    tracing::info!("{query:?}: Issuing SEARCH query to Nominatim...");
    let url = format!("{}/search", base_url.trim_end_matches('/'));

    let response = client
        .get(&url)
        .query(&[("format", "json"), ("q", query)])
        .query(&[("limit", limit)])
        .send()
        .await?
        .error_for_status()?
        .json::<Vec<schema::Place>>()
        .await?;

    Ok(response)
}

pub mod schema {
    use serde::Deserialize;

    /// Nominatim reports coordinates as decimal strings.
    #[derive(Deserialize, Debug)]
    pub struct Place {
        pub lat: String,
        pub lon: String,
        #[serde(default)]
        pub display_name: String,
    }
}
