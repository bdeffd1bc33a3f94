use std::{
    io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use teloxide::types::UserId;

/// Environment variable overriding where the config file is read from.
pub const CONFIG_PATH_VAR: &str = "CONFIG_PATH";
/// Config file path used when [`CONFIG_PATH_VAR`] is not set.
pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Moderation settings. Loaded once at startup and never changed afterwards.
///
/// All phrases and domains are stored lowercased, see [`Config::normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Users whose messages are never moderated. Order is kept: the first one gets the startup
    /// status message.
    pub admin_ids: Vec<u64>,
    /// Substrings like `t.me/my_channel`; any link containing one is allowed.
    pub allowed_tme: Vec<String>,
    /// Domains allowed along with all of their subdomains.
    pub allowed_domains: Vec<String>,
    /// Phrases that get a message deleted.
    pub keywords_block: Vec<String>,
    /// Phrases cut out of the text before looking for blocked ones.
    pub keywords_allow: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        static KEYWORDS_BLOCK: &[&str] = &[
            // RU
            "заработок онлайн",
            "лёгкий заработок",
            "лёгкие деньги",
            "легкий заработок",
            "пассивный доход",
            "инвестиции от 0",
            "доход без вложений",
            "быстрые деньги",
            "ставки",
            "бинарные опционы",
            "сигналы",
            "приватный канал",
            "вип-канал",
            "обучение с нуля",
            "100% гарантия",
            "проверенная схема",
            "доверительное управление",
            "приглашаю в чат",
            "приглашаю в канал",
            "откаты",
            "арбитраж трафика",
            "переходи по ссылке",
            "жми сюда",
            "заработаешь",
            "посмотри книжку",
            "бесплатная книга",
            "pdf книга",
            "раздам курс",
            "слив курса",
            "вакансия",
            "удалённая работа",
            "удаленная работа",
            "млм",
            "сетевой маркетинг",
            "пирамида",
            "кэшбек 50%",
            "airdrop за реф",
            "реферальная ссылка",
            // EN
            "easy money",
            "passive income",
            "work from home",
            "dm me",
            "click here",
            "join my channel",
            "private",
            "vip",
        ];
        static KEYWORDS_ALLOW: &[&str] = &[
            "биткоин", "bitcoin", "эфир", "ethereum", "usdt", "binance", "okx", "bybit", "airdrops",
        ];

        let owned = |list: &[&str]| list.iter().map(ToString::to_string).collect();

        Config {
            admin_ids: Vec::new(),
            allowed_tme: owned(&["t.me/your_channel", "t.me/your_chat"]),
            allowed_domains: owned(&["your-site.com"]),
            keywords_block: owned(KEYWORDS_BLOCK),
            keywords_allow: owned(KEYWORDS_ALLOW),
        }
    }
}

/// Shape of the config file. Every key is optional; present keys replace the defaults wholesale.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    admin_ids: Option<Vec<u64>>,
    allowed_tme: Option<Vec<String>>,
    allowed_domains: Option<Vec<String>>,
    keywords_block: Option<Vec<String>>,
    keywords_allow: Option<Vec<String>>,
}

/// Whether this YAML text has no actual content, only comments and blank lines.
fn is_blank_yaml(text: &str) -> bool {
    text.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}

impl Config {
    /// Load the config from the path in `CONFIG_PATH`, or from `config.yml`.
    ///
    /// # Errors
    /// See [`Self::load_from_path`].
    pub fn load() -> Result<Config, ConfigError> {
        let path = std::env::var_os(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from_path(&path)
    }

    /// Load the config from a file. A missing file is not an error: defaults are used instead.
    ///
    /// # Errors
    /// Errors if the file exists but can't be read, or if it is not a valid config.
    pub fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::warn!("Config file {} not found, using defaults.", path.display());
                return Ok(Config::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_owned(),
                    source,
                })
            }
        };

        let config = Self::from_yaml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;

        log::info!(
            "Loaded config from {}: {} admin(s), {} allowed t.me path(s), {} allowed domain(s), \
            {} blocked and {} allowed keyword(s).",
            path.display(),
            config.admin_ids.len(),
            config.allowed_tme.len(),
            config.allowed_domains.len(),
            config.keywords_block.len(),
            config.keywords_allow.len(),
        );

        Ok(config)
    }

    /// Parse YAML config text and put it over the defaults, key by key.
    ///
    /// # Errors
    /// Errors if the text is not a YAML mapping of the expected shape.
    pub fn from_yaml_str(text: &str) -> Result<Config, serde_yaml::Error> {
        let file: ConfigFile = if is_blank_yaml(text) {
            ConfigFile::default()
        } else {
            // A lone `~` or `null` is as good as an empty file.
            serde_yaml::from_str::<Option<ConfigFile>>(text)?.unwrap_or_default()
        };

        let mut config = Config::default();

        if let Some(admin_ids) = file.admin_ids {
            config.admin_ids = admin_ids;
        }
        if let Some(allowed_tme) = file.allowed_tme {
            config.allowed_tme = allowed_tme;
        }
        if let Some(allowed_domains) = file.allowed_domains {
            config.allowed_domains = allowed_domains;
        }
        if let Some(keywords_block) = file.keywords_block {
            config.keywords_block = keywords_block;
        }
        if let Some(keywords_allow) = file.keywords_allow {
            config.keywords_allow = keywords_allow;
        }

        Ok(config.normalize())
    }

    /// Lowercase and trim all phrases and domains, dropping empty ones. Domains are punycoded.
    #[must_use]
    pub fn normalize(mut self) -> Config {
        fn normalize_list(list: &mut Vec<String>) {
            *list = list
                .iter()
                .map(|x| x.trim().to_lowercase())
                .filter(|x| !x.is_empty())
                .collect();
        }

        normalize_list(&mut self.allowed_tme);
        normalize_list(&mut self.allowed_domains);
        normalize_list(&mut self.keywords_block);
        normalize_list(&mut self.keywords_allow);

        // Hosts of parsed links are punycoded, so non-ASCII allowed domains have to be too.
        self.allowed_domains = self
            .allowed_domains
            .into_iter()
            .map(|domain| match url::Host::parse(&domain) {
                Ok(host) => host.to_string(),
                Err(_) => domain,
            })
            .collect();

        self
    }

    /// Whether this user is listed in `admin_ids`.
    #[must_use]
    pub fn is_admin(&self, user: UserId) -> bool {
        self.admin_ids.contains(&user.0)
    }

    /// The admin that receives the startup status message, if any.
    #[must_use]
    pub fn first_admin(&self) -> Option<UserId> {
        self.admin_ids.first().copied().map(UserId)
    }
}
