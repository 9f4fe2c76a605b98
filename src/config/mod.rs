mod basic;
mod store;

pub use basic::BasicConfig;
pub use store::StoreConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Process-level settings (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Embedded store location (see `store` table in config.toml).
    #[serde(default)]
    pub store: StoreConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "STORESHIM_";

impl Config {
    /// Builds a Figment that merges defaults, an optional config TOML file and
    /// `STORESHIM_*` environment variables (`__` separates nested keys).
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let figment = if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        } else {
            figment
        };
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }
}

/// Global, lazily-initialized configuration instance for the binary.
///
/// Library code never reads this; `QueryShim` takes a `StoreConfig` value.
pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::load().unwrap_or_else(|err| {
        panic!("failed to extract configuration (defaults + optional config.toml + env): {err}")
    })
});

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_without_file_or_env() {
        Jail::expect_with(|_jail| {
            let cfg = Config::load()?;
            assert_eq!(cfg.basic.loglevel, "info");
            assert_eq!(cfg.store.data_dir, PathBuf::from("data"));
            assert_eq!(cfg.store.db_file, "store.db");
            Ok(())
        });
    }

    #[test]
    fn toml_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [basic]
                loglevel = "debug"

                [store]
                data_dir = "var"
                db_file = "shop.db"
                "#,
            )?;
            jail.set_env("STORESHIM_STORE__DB_FILE", "override.db");

            let cfg = Config::load()?;
            assert_eq!(cfg.basic.loglevel, "debug");
            assert_eq!(cfg.store.data_dir, PathBuf::from("var"));
            assert_eq!(cfg.store.db_file, "override.db");
            Ok(())
        });
    }
}
