use {
    crate::{
        event::{
            entities::{
                UpdateEventKind,
                UpdatePolicy,
            },
            DEFAULT_EVENT_CHANNEL_SIZE,
        },
        kernel::lock::DEFAULT_LOCK_POLL_INTERVAL,
        store::DEFAULT_TOMBSTONE_RETENTION,
    },
    anyhow::{
        anyhow,
        Result,
    },
    clap::{
        crate_authors,
        crate_description,
        crate_name,
        crate_version,
        Args,
        Parser,
    },
    std::{
        collections::{
            HashMap,
            HashSet,
        },
        fs,
        time::Duration,
    },
    url::Url,
};

mod server;

// Command-line arguments of the cache server.
#[derive(Parser, Debug)]
#[command(name = crate_name!())]
#[command(author = crate_authors!())]
#[command(about = crate_description!())]
#[command(version = crate_version!())]
#[allow(clippy::large_enum_variant)]
pub enum Options {
    /// Run the resolver cache service.
    Run(RunOptions),
}

#[derive(Args, Clone, Debug)]
pub struct RunOptions {
    /// Server Options
    #[command(flatten)]
    pub server: server::Options,

    #[command(flatten)]
    pub config: ConfigOptions,
}

#[derive(Args, Clone, Debug)]
#[command(next_help_heading = "Config Options")]
#[group(id = "Config")]
pub struct ConfigOptions {
    /// Path to a configuration file containing the cached namespaces
    #[arg(long = "config")]
    #[arg(env = "RESOLVER_CACHE_CONFIG")]
    #[arg(default_value = "config.yaml")]
    pub config: String,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default = "NamespaceConfig::defaults")]
    pub namespaces:            Vec<NamespaceConfig>,
    /// Interval between two attempts to take a contended store lock.
    #[serde(with = "humantime_serde", default = "Config::default_lock_poll_interval")]
    pub lock_poll_interval:    Duration,
    /// Number of update events buffered for a slow subscriber.
    #[serde(default = "Config::default_event_channel_size")]
    pub event_channel_size:    usize,
    /// Interval of the time-based expiry worker.
    #[serde(with = "humantime_serde", default = "Config::default_expiry_check_interval")]
    pub expiry_check_interval: Duration,
    /// Timeout of a single upstream fetch.
    #[serde(with = "humantime_serde", default = "Config::default_upstream_timeout")]
    pub upstream_timeout:      Duration,
    /// How long an eviction keeps a fetch started before it from storing its value.
    #[serde(with = "humantime_serde", default = "Config::default_tombstone_retention")]
    pub tombstone_retention:   Duration,
}

impl Config {
    pub fn default_lock_poll_interval() -> Duration {
        DEFAULT_LOCK_POLL_INTERVAL
    }

    pub fn default_event_channel_size() -> usize {
        DEFAULT_EVENT_CHANNEL_SIZE
    }

    pub fn default_expiry_check_interval() -> Duration {
        Duration::from_secs(10)
    }

    pub fn default_upstream_timeout() -> Duration {
        Duration::from_secs(10)
    }

    pub fn default_tombstone_retention() -> Duration {
        DEFAULT_TOMBSTONE_RETENTION
    }

    pub fn load(path: &str) -> Result<Config> {
        let yaml_content = fs::read_to_string(path)?;
        Self::from_yaml(&yaml_content)
    }

    pub fn from_yaml(yaml_content: &str) -> Result<Config> {
        let config: Config = serde_yaml::from_str(yaml_content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for namespace in &self.namespaces {
            if !names.insert(namespace.name.as_str()) {
                return Err(anyhow!("Duplicate namespace: {}", namespace.name));
            }
            if namespace.key_argument.is_empty() {
                return Err(anyhow!(
                    "Namespace {} has an empty key argument",
                    namespace.name
                ));
            }
        }
        if self.event_channel_size == 0 {
            return Err(anyhow!("Event channel size must be positive"));
        }
        Ok(())
    }
}

/// Registration of one cached collection.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct NamespaceConfig {
    /// Namespace name, also the query name that selects it.
    pub name:           String,
    /// Query argument holding the key (or list of keys) to resolve.
    pub key_argument:   String,
    /// Age after which a cached record is refetched on read.
    #[serde(with = "humantime_serde")]
    pub ttl:            Duration,
    /// Age after which the expiry worker evicts a record. Disabled when unset.
    #[serde(default, with = "humantime_serde")]
    pub evict_after:    Option<Duration>,
    /// Backing source for records missing from the cache.
    #[serde(default)]
    pub upstream_url:   Option<Url>,
    /// Store mutation applied for each update event kind.
    #[serde(default)]
    pub event_policies: HashMap<UpdateEventKind, UpdatePolicy>,
}

impl NamespaceConfig {
    pub fn new(name: &str, key_argument: &str, ttl: Duration) -> Self {
        Self {
            name: name.to_string(),
            key_argument: key_argument.to_string(),
            ttl,
            evict_after: None,
            upstream_url: None,
            event_policies: HashMap::new(),
        }
    }

    pub fn with_policy(mut self, kind: UpdateEventKind, policy: UpdatePolicy) -> Self {
        self.event_policies.insert(kind, policy);
        self
    }

    /// Pairs, pair ESDT token lists and tokens with their event policies.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("pairs", "address", Duration::from_secs(60))
                .with_policy(UpdateEventKind::Pair, UpdatePolicy::Replace),
            Self::new("pairsEsdtTokens", "address", Duration::from_secs(300))
                .with_policy(UpdateEventKind::Pair, UpdatePolicy::Evict)
                .with_policy(UpdateEventKind::PairEsdtTokens, UpdatePolicy::Replace),
            Self::new("tokens", "identifier", Duration::from_secs(300))
                .with_policy(UpdateEventKind::Token, UpdatePolicy::Merge),
        ]
    }
}
