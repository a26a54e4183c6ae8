//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::{Cli, CliFallback, CliLocale};
use crate::{
    config::CutoutConfig,
    messages::Locale,
    prompt::FallbackPolicy,
};
use anyhow::{Context, Result};

/// Convert CLI arguments to a [`CutoutConfig`]
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build the configuration, starting from defaults and overriding what was given
    pub(crate) fn from_cli(cli: &Cli) -> Result<CutoutConfig> {
        let defaults = CutoutConfig::default();

        let mut builder = CutoutConfig::builder()
            .maybe_api_key(cli.api_key.clone())
            .endpoint(cli.endpoint.clone().unwrap_or(defaults.endpoint))
            .mock_delay_ms(cli.mock_delay_ms.unwrap_or(defaults.mock_delay_ms))
            .locale(Self::locale(cli.lang));
        if let Some(timeout) = cli.timeout {
            builder = builder.request_timeout_secs(timeout);
        }

        builder.build().context("Invalid configuration")
    }

    pub(crate) fn locale(lang: CliLocale) -> Locale {
        match lang {
            CliLocale::En => Locale::En,
            CliLocale::ZhCn => Locale::ZhCn,
        }
    }

    pub(crate) fn fallback_policy(fallback: CliFallback) -> FallbackPolicy {
        match fallback {
            CliFallback::Ask => FallbackPolicy::Ask,
            CliFallback::Always => FallbackPolicy::Always,
            CliFallback::Never => FallbackPolicy::Never,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["bgcutout"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_defaults_carry_through() {
        let config = CliConfigBuilder::from_cli(&parse(&["photo.jpg", "--api-key", "k"])).unwrap();
        assert_eq!(config.endpoint, crate::config::REMOVE_BG_ENDPOINT);
        assert_eq!(config.mock_delay_ms, crate::config::DEFAULT_MOCK_DELAY_MS);
        assert_eq!(config.credential(), Some("k"));
        assert_eq!(config.locale, Locale::En);
    }

    #[test]
    fn test_overrides() {
        let cli = parse(&[
            "photo.jpg",
            "--endpoint",
            "http://localhost:8080/removebg",
            "--mock-delay-ms",
            "0",
            "--timeout",
            "5",
            "--lang",
            "zh-cn",
        ]);
        let config = CliConfigBuilder::from_cli(&cli).unwrap();
        assert_eq!(config.endpoint, "http://localhost:8080/removebg");
        assert_eq!(config.mock_delay_ms, 0);
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.locale, Locale::ZhCn);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let cli = parse(&["photo.jpg", "--timeout", "0"]);
        assert!(CliConfigBuilder::from_cli(&cli).is_err());

        let cli = parse(&["photo.jpg", "--endpoint", "api.remove.bg"]);
        assert!(CliConfigBuilder::from_cli(&cli).is_err());
    }

    #[test]
    fn test_fallback_mapping() {
        assert_eq!(CliConfigBuilder::fallback_policy(CliFallback::Always), FallbackPolicy::Always);
        assert_eq!(CliConfigBuilder::fallback_policy(CliFallback::Never), FallbackPolicy::Never);
        assert_eq!(CliConfigBuilder::fallback_policy(CliFallback::Ask), FallbackPolicy::Ask);
    }
}
