use async_trait::async_trait;
use melodymatch_core::{Backend, BackendConfig, CoreError, CredentialMode, RecommendedItem};
use reqwest::cookie::Jar;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

const AUTHENTICATE_PATH: &str = "authenticate";
const RECOMMENDATIONS_PATH: &str = "getRecommendations";
const LIKED_SONG_PATH: &str = "likedSong";
const CREATE_PLAYLIST_PATH: &str = "createPlaylist";
const SIGN_IN_PATH: &str = "oauth2/authorization/spotify";

/// Body of a like request
#[derive(Debug, Serialize)]
struct LikedSongRequest<'a> {
    #[serde(rename = "trackIds")]
    track_ids: [&'a str; 1],
}

/// MelodyMatch backend over HTTP.
///
/// With [`CredentialMode::Include`] the client keeps a cookie jar, so the
/// session cookie (configured, or set by the backend) rides along on every
/// request. No client-side timeout is set; the transport defaults apply.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    /// Create a backend client from connection settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be created.
    pub fn new(config: &BackendConfig) -> Result<Self, CoreError> {
        let base_url = config.base_url()?;
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());

        match config.credentials {
            CredentialMode::Include => {
                let jar = Arc::new(Jar::default());
                if let Some(cookie) = config
                    .session_cookie
                    .as_deref()
                    .filter(|c| !c.trim().is_empty())
                {
                    jar.add_cookie_str(cookie, &base_url);
                    debug!("Seeded session cookie for {}", base_url);
                }
                builder = builder.cookie_provider(jar);
            }
            CredentialMode::Omit => {
                if config.session_cookie.is_some() {
                    warn!("backend.session_cookie is ignored because credentials = \"omit\"");
                }
            }
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    /// Base URL every endpoint resolves against
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Page that starts the backend's Spotify sign-in flow.
    ///
    /// This is a browser redirect target, not an API call.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built from the base URL.
    pub fn sign_in_url(&self) -> Result<Url, CoreError> {
        Ok(self.base_url.join(SIGN_IN_PATH)?)
    }

    fn endpoint(&self, path: &str) -> Result<Url, CoreError> {
        Ok(self.base_url.join(path)?)
    }

    fn recommendations_url(&self, genre: &str) -> Result<String, CoreError> {
        Ok(format!(
            "{}?genre={}",
            self.endpoint(RECOMMENDATIONS_PATH)?,
            urlencoding::encode(genre)
        ))
    }
}

/// The playlist endpoint answers with either a JSON string or plain text.
fn decode_message(body: &str) -> String {
    serde_json::from_str::<String>(body).unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &'static str {
        "melodymatch"
    }

    async fn probe_session(&self) -> Result<bool, CoreError> {
        let url = self.endpoint(AUTHENTICATE_PATH)?;
        debug!("POST {}", url);

        let response = self.client.post(url).send().await?;
        debug!("Authenticate response status: {}", response.status());

        Ok(response.status() == reqwest::StatusCode::OK)
    }

    async fn fetch_recommendations(&self, genre: &str) -> Result<Vec<RecommendedItem>, CoreError> {
        let url = self.recommendations_url(genre)?;
        info!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            warn!("Recommendations returned status: {}", response.status());
            return Err(CoreError::BackendStatus {
                endpoint: RECOMMENDATIONS_PATH,
                status: response.status().as_u16(),
            });
        }

        let items: Vec<RecommendedItem> = response.json().await?;
        debug!("Received {} recommendations for {}", items.len(), genre);
        Ok(items)
    }

    async fn like_item(&self, id: &str) -> Result<(), CoreError> {
        let url = self.endpoint(LIKED_SONG_PATH)?;
        debug!("POST {} ({})", url, id);

        let response = self
            .client
            .post(url)
            .json(&LikedSongRequest { track_ids: [id] })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CoreError::BackendStatus {
                endpoint: LIKED_SONG_PATH,
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    async fn request_playlist_creation(&self) -> Result<String, CoreError> {
        let url = self.endpoint(CREATE_PLAYLIST_PATH)?;
        info!("POST {}", url);

        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CoreError::BackendStatus {
                endpoint: CREATE_PLAYLIST_PATH,
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(decode_message(&body))
    }
}
