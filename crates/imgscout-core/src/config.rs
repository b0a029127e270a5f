use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Browser launch options, bounded waits and pacing between interactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run Chrome without a visible window.
    pub headless: bool,
    /// Window size as (width, height).
    pub window_size: (u32, u32),
    /// Upper bound on waiting for listing thumbnails to appear.
    pub listing_wait_secs: u64,
    /// Delay after scrolling a thumbnail into view.
    pub scroll_settle_ms: u64,
    /// Delay after clicking a thumbnail so the detail panel can render.
    pub click_settle_ms: u64,
    /// Upper bound on waiting for each high-resolution marker.
    pub marker_wait_secs: u64,
    /// Upper bound on waiting for a source page to finish loading during rescue.
    pub rescue_load_wait_secs: u64,
    /// Pause between consecutive results.
    pub between_results_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: (1920, 1080),
            listing_wait_secs: 10,
            scroll_settle_ms: 1000,
            click_settle_ms: 2000,
            marker_wait_secs: 3,
            rescue_load_wait_secs: 5,
            between_results_ms: 1000,
        }
    }
}

impl BrowserConfig {
    pub fn listing_wait(&self) -> Duration {
        Duration::from_secs(self.listing_wait_secs)
    }

    pub fn marker_wait(&self) -> Duration {
        Duration::from_secs(self.marker_wait_secs)
    }

    pub fn rescue_load_wait(&self) -> Duration {
        Duration::from_secs(self.rescue_load_wait_secs)
    }

    /// Same waits with every pacing delay removed (used by scripted sessions in tests).
    pub fn without_pacing(mut self) -> Self {
        self.scroll_settle_ms = 0;
        self.click_settle_ms = 0;
        self.between_results_ms = 0;
        self
    }
}

/// CSS selectors describing the listing and detail-panel structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Clickable thumbnails in the result listing.
    pub thumbnail: String,
    /// Full-size image currently displayed in the detail panel.
    pub primary_marker: String,
    /// Any full-size image in the detail panel region.
    pub broader_marker: String,
    /// Anchor pointing at the page that hosts the original image.
    pub source_link: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            thumbnail: ".H8Rx8c".to_string(),
            primary_marker: ".sFlh5c.FyHeAf.iPVvYb".to_string(),
            broader_marker: ".sFlh5c.FyHeAf".to_string(),
            source_link: "a.YsLeY".to_string(),
        }
    }
}

/// Fetch-and-verify policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub connect_timeout_secs: u64,
    /// Total transfer timeout.
    pub timeout_secs: u64,
    pub user_agent: String,
    pub accept: String,
    /// Reject responses whose Content-Type is not `image/*`.
    pub validate_content_type: bool,
    /// Decode saved bytes and delete them when they are not a valid raster image.
    pub verify_decodable: bool,
    /// Maximum characters of alt text used for the file name.
    pub max_alt_len: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            timeout_secs: 15,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            accept: "image/avif,image/webp,image/apng,image/*,*/*;q=0.8".to_string(),
            validate_content_type: true,
            verify_decodable: true,
            max_alt_len: 50,
        }
    }
}

impl FetchConfig {
    /// Drop both byte-level checks: save whatever a 2xx response returns.
    pub fn lenient(mut self) -> Self {
        self.validate_content_type = false;
        self.verify_decodable = false;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// URL prefixes of low-resolution thumbnail CDNs.
    pub thumbnail_prefixes: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            thumbnail_prefixes: vec!["https://encrypted-tbn".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RescueConfig {
    /// An image qualifies only if its declared width or height exceeds this many pixels.
    pub min_dimension: u32,
}

impl Default for RescueConfig {
    fn default() -> Self {
        Self { min_dimension: 300 }
    }
}

/// Rewrites a resizer CDN's quality parameter to its maximum value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityRule {
    /// Substring the URL host must contain.
    pub host_contains: String,
    /// Prefix the URL path must start with.
    pub path_prefix: String,
    /// Query parameter carrying the quality.
    pub param: String,
    /// Value written into the parameter.
    pub max_value: String,
}

pub fn default_quality_rules() -> Vec<QualityRule> {
    vec![QualityRule {
        host_contains: "reuters.com".to_string(),
        path_prefix: "/resizer".to_string(),
        param: "quality".to_string(),
        max_value: "100".to_string(),
    }]
}

/// Augmentation variants written for each input image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    /// Counter-clockwise rotation angles in degrees.
    pub rotation_angles: Vec<i32>,
    pub contrast: f32,
    pub brightness: f32,
    pub flip: bool,
    /// Exclusive upper bound of per-channel additive noise (0 disables the noise variant).
    pub noise_max: u8,
    /// Seed for the noise generator; random when unset.
    pub noise_seed: Option<u64>,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            rotation_angles: vec![-30, -15, 15, 30],
            contrast: 1.5,
            brightness: 1.2,
            flip: true,
            noise_max: 50,
            noise_seed: None,
        }
    }
}

/// Global configuration loaded from `~/.config/imgscout/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    /// Directory receiving downloaded images (relative paths resolve against the working dir).
    pub output_dir: PathBuf,
    /// Successful downloads per query before moving to the next query.
    pub per_query_quota: usize,
    /// Listing URL; `{query}` is replaced by the form-encoded query.
    pub search_url_template: String,
    /// Queries used by `scrape` when none are given on the command line.
    pub queries: Vec<String>,
    pub browser: BrowserConfig,
    pub selectors: SelectorConfig,
    pub fetch: FetchConfig,
    pub validator: ValidatorConfig,
    pub rescue: RescueConfig,
    pub quality_rules: Vec<QualityRule>,
    pub augment: AugmentConfig,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloaded_images"),
            per_query_quota: 100,
            search_url_template: "https://www.google.com/search?q={query}&tbm=isch".to_string(),
            queries: Vec::new(),
            browser: BrowserConfig::default(),
            selectors: SelectorConfig::default(),
            fetch: FetchConfig::default(),
            validator: ValidatorConfig::default(),
            rescue: RescueConfig::default(),
            quality_rules: default_quality_rules(),
            augment: AugmentConfig::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("imgscout")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ScoutConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ScoutConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: ScoutConfig =
        toml::from_str(&data).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
