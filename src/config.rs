/// `AppConfig` holds static configuration values for the application,
/// such as Spotify endpoints and the defaults of a sync run.
pub struct AppConfig;

impl AppConfig {
    /// Base url of the Spotify Web API.
    pub const SPOTIFY_API_URL: &'static str = "https://api.spotify.com/v1";
    /// Token endpoint used to refresh the user access token.
    pub const SPOTIFY_TOKEN_URL: &'static str = "https://accounts.spotify.com/api/token";
    /// Lookback window used when none (or an invalid one) is supplied.
    pub const DEFAULT_LOOKBACK_DAYS: i64 = 7;
    /// Maximum number of tracks Spotify accepts in a single append call.
    pub const BATCH_SIZE: usize = 100;
    /// Storage key of the cross-category registry.
    pub const GLOBAL_REGISTRY_KEY: &'static str = "global_tracks";
    /// Cover used when a genre has no image of its own.
    pub const DEFAULT_COVER_IMAGE: &'static str = "spotibot.jpg";
    pub const CONFIG_FOLDER: &'static str = ".spotibot_config";
    pub const CONFIG_PATH_ENV: &'static str = "SPOTIBOT_CONFIG";
}
