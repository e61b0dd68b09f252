use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Key file read when no explicit API key is configured.
pub const DEFAULT_KEY_FILE: &str = "openai_key.txt";
/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4";
/// Replacement for laughter runs such as "kkkk".
pub const DEFAULT_LAUGH_TOKEN: &str = "<LAUGH>";

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub cleaner: CleanerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    /// Explicit API key. Takes precedence over `key_file`.
    pub api_key: Option<String>,
    pub key_file: PathBuf,
    /// Optional API base URL override.
    /// Uses {base_url}/v1/chat/completions (or {base_url}/chat/completions if
    /// base_url already ends in /v1).
    pub base_url: Option<String>,
    /// Request timeout. No timeout is applied when unset.
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CleanerConfig {
    pub laugh_token: String,
    /// Short form → expansion, applied in the order written in the file.
    #[serde(deserialize_with = "ordered_pairs")]
    pub abbreviations: Vec<(String, String)>,
}

// --- Defaults ---

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            api_key: None,
            key_file: PathBuf::from(DEFAULT_KEY_FILE),
            base_url: None,
            timeout_ms: None,
        }
    }
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            laugh_token: DEFAULT_LAUGH_TOKEN.into(),
            abbreviations: Vec::new(),
        }
    }
}

// --- Methods ---

impl Config {
    /// Default location: `$XDG_CONFIG_HOME/chatkit/config.toml`, falling back
    /// to the platform config dir.
    pub fn default_path() -> PathBuf {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(|d| PathBuf::from(d).join("chatkit").join("config.toml"))
            .or_else(|| dirs::config_dir().map(|d| d.join("chatkit").join("config.toml")))
            .unwrap_or_else(|| PathBuf::from("~/.config/chatkit/config.toml"))
    }

    /// Load the config from the default location. Problems with the file are
    /// logged and the defaults are used instead.
    pub fn load() -> Self {
        let config_path = Self::default_path();

        if config_path.exists() {
            match Self::from_path(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load {}: {e:#}", config_path.display());
                }
            }
        }

        Config::default()
    }

    /// Load a specific config file, surfacing read and parse errors.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

/// Collect a TOML table into pairs without losing the document order.
fn ordered_pairs<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PairsVisitor;

    impl<'de> Visitor<'de> for PairsVisitor {
        type Value = Vec<(String, String)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a table of string to string")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((short, long)) = map.next_entry::<String, String>()? {
                pairs.push((short, long));
            }
            Ok(pairs)
        }
    }

    deserializer.deserialize_map(PairsVisitor)
}
