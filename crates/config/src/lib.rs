mod client_ip;
mod error;
mod loader;

use std::path::Path;

use serde::Deserialize;

pub use client_ip::ClientIpConfig;
pub use error::Error;

pub(crate) type Result<T> = std::result::Result<T, error::Error>;

#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub client_ip: ClientIpConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Config> {
        loader::load(path)
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use crate::Config;

    #[test]
    fn all_values() {
        let config = indoc! {r#"
            [client_ip]
            header = "X-Real-Ip"
            trusted_hosts = ["127.0.0.1", "10.0.0.0/8"]
        "#};

        let config: Config = toml::from_str(config).unwrap();

        insta::assert_debug_snapshot!(&config, @r#"
        Config {
            client_ip: ClientIpConfig {
                header: "X-Real-Ip",
                trusted_hosts: [
                    "127.0.0.1",
                    "10.0.0.0/8",
                ],
            },
        }
        "#);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = indoc! {r#"
            [client_ip]
            header = "X-Real-Ip"
        "#};

        std::fs::write(&path, config).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.client_ip.header, "X-Real-Ip");
    }

    #[test]
    fn load_rejects_unknown_fields() {
        let config = indoc! {r#"
            [client_ip]
            header = "X-Real-Ip"
            trusted = ["127.0.0.1"]
        "#};

        let err = toml::from_str::<Config>(config).unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn defaults() {
        let config: Config = toml::from_str("").unwrap();

        insta::assert_debug_snapshot!(&config, @r#"
        Config {
            client_ip: ClientIpConfig {
                header: "X-Forwarded-For",
                trusted_hosts: [],
            },
        }
        "#);
    }
}
