//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Partner API username
    #[serde(default)]
    pub username: String,

    /// Partner API password
    #[serde(default)]
    pub password: String,

    /// Login endpoint (POST, JSON credentials)
    #[serde(default)]
    pub login_url: String,

    /// Product lookup base URL; the slug is appended as-is
    #[serde(default)]
    pub product_base_url: String,

    /// Path to the CSV export to reconcile
    #[serde(default)]
    pub csv_path: PathBuf,

    /// Expected CSV header row, in order
    #[serde(default = "default_headers")]
    pub headers: Vec<String>,

    /// Which columns carry the fields the reconciler reads
    #[serde(default)]
    pub columns: Columns,
}

/// Column names mapping the CSV export to reconciler inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Columns {
    /// Column holding the product slug
    #[serde(default = "default_slug_column")]
    pub slug: String,

    /// Column holding the variant name
    #[serde(default = "default_variant_column")]
    pub variant: String,

    /// Column holding the previously recorded price
    #[serde(default = "default_price_column")]
    pub price: String,

    /// Column holding the previously recorded stock tier
    #[serde(default = "default_stock_column")]
    pub stock: String,

    /// Optional column holding a SKU, used as the finding key when present
    #[serde(default)]
    pub sku: Option<String>,
}

fn default_headers() -> Vec<String> {
    ["product_slug", "variant_name", "price", "stock_level"]
        .map(String::from)
        .to_vec()
}

fn default_slug_column() -> String {
    "product_slug".to_string()
}

fn default_variant_column() -> String {
    "variant_name".to_string()
}

fn default_price_column() -> String {
    "price".to_string()
}

fn default_stock_column() -> String {
    "stock_level".to_string()
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            slug: default_slug_column(),
            variant: default_variant_column(),
            price: default_price_column(),
            stock: default_stock_column(),
            sku: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            login_url: String::new(),
            product_base_url: String::new(),
            csv_path: PathBuf::new(),
            headers: default_headers(),
            columns: Columns::default(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("partner-recon").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(username) = std::env::var("RECON_USERNAME") {
            self.username = username;
        }

        if let Ok(password) = std::env::var("RECON_PASSWORD") {
            self.password = password;
        }

        if let Ok(url) = std::env::var("RECON_LOGIN_URL") {
            self.login_url = url;
        }

        if let Ok(url) = std::env::var("RECON_PRODUCT_BASE_URL") {
            self.product_base_url = url;
        }

        if let Ok(path) = std::env::var("RECON_CSV_PATH") {
            self.csv_path = PathBuf::from(path);
        }

        if let Ok(headers) = std::env::var("RECON_HEADERS") {
            self.headers = headers.split(',').map(str::to_string).collect();
        }

        self
    }

    /// Checks that the configuration is usable before any I/O starts.
    pub fn validate(&self) -> Result<()> {
        if self.login_url.is_empty() {
            bail!("No login URL configured. Set login_url or RECON_LOGIN_URL.");
        }
        if self.product_base_url.is_empty() {
            bail!("No product base URL configured. Set product_base_url or RECON_PRODUCT_BASE_URL.");
        }
        if self.csv_path.as_os_str().is_empty() {
            bail!("No CSV file given. Pass a file argument or set csv_path.");
        }
        if self.headers.is_empty() {
            bail!("Expected header list is empty.");
        }

        for (name, column) in [
            ("slug", &self.columns.slug),
            ("variant", &self.columns.variant),
            ("price", &self.columns.price),
            ("stock", &self.columns.stock),
        ] {
            if !self.headers.contains(column) {
                bail!("Configured {} column '{}' is not in the expected headers.", name, column);
            }
        }
        if let Some(sku) = &self.columns.sku {
            if !self.headers.contains(sku) {
                bail!("Configured sku column '{}' is not in the expected headers.", sku);
            }
        }

        Ok(())
    }
}
