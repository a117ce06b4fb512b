//! Tests for value validation and configuration display.

use crate::config::field;

use super::*;

mod invalid_values {
    use super::*;

    #[test]
    fn zero_timeout_is_rejected() {
        let result = ValidatedConfig::from_raw(&cli(&["--timeout", "0"]), None);

        assert!(matches!(
            result,
            Err(ConfigError::InvalidDuration {
                field: field::TIMEOUT,
                ..
            })
        ));
    }

    #[test]
    fn non_positive_refresh_is_rejected() {
        for refresh in ["--refresh=0", "--refresh=-1.5"] {
            let result = ValidatedConfig::from_raw(&cli(&[refresh]), None);

            assert!(
                matches!(
                    result,
                    Err(ConfigError::InvalidDuration {
                        field: field::REFRESH,
                        ..
                    })
                ),
                "refresh {refresh} should be rejected"
            );
        }
    }

    #[test]
    fn negative_refresh_from_toml_is_rejected() {
        let toml = toml("[stream]\nrefresh = -2.0\n");

        let result = ValidatedConfig::from_raw(&cli(&[]), Some(&toml));

        assert!(matches!(
            result,
            Err(ConfigError::InvalidDuration {
                field: field::REFRESH,
                ..
            })
        ));
    }

    #[test]
    fn non_finite_refresh_is_rejected() {
        let toml = toml("[stream]\nrefresh = nan\n");

        let result = ValidatedConfig::from_raw(&cli(&[]), Some(&toml));

        assert!(matches!(result, Err(ConfigError::InvalidDuration { .. })));
    }

    #[test]
    fn zero_limit_is_rejected() {
        let result = ValidatedConfig::from_raw(&cli(&["--limit", "0"]), None);

        assert!(matches!(result, Err(ConfigError::InvalidLimit)));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = ValidatedConfig::from_raw(&cli(&["--base-url", "not a url"]), None);

        assert!(matches!(
            result,
            Err(ConfigError::InvalidUrl {
                field: field::BASE_URL,
                ..
            })
        ));
    }

    #[test]
    fn invalid_webhook_url_is_rejected() {
        let toml = toml("[webhook]\nurl = \"::nope\"\n");

        let result = ValidatedConfig::from_raw(&cli(&[]), Some(&toml));

        assert!(matches!(
            result,
            Err(ConfigError::InvalidUrl {
                field: field::WEBHOOK_URL,
                ..
            })
        ));
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let result = ValidatedConfig::from_raw(&cli(&["--file-log-level", "loud"]), None);

        assert!(matches!(
            result,
            Err(ConfigError::InvalidLogLevel {
                field: field::FILE_LOG_LEVEL,
                ..
            })
        ));
    }
}

mod retry_validation {
    use super::*;

    #[test]
    fn zero_attempts_is_rejected() {
        let result = ValidatedConfig::from_raw(&cli(&["--retry-max", "0"]), None);

        assert!(matches!(result, Err(ConfigError::InvalidRetry(_))));
    }

    #[test]
    fn zero_initial_delay_is_rejected() {
        let result = ValidatedConfig::from_raw(&cli(&["--retry-delay", "0"]), None);

        assert!(matches!(result, Err(ConfigError::InvalidRetry(_))));
    }

    #[test]
    fn non_positive_multiplier_is_rejected() {
        let toml = toml("[retry]\nmultiplier = 0.0\n");

        let result = ValidatedConfig::from_raw(&cli(&[]), Some(&toml));

        assert!(matches!(result, Err(ConfigError::InvalidRetry(_))));
    }

    #[test]
    fn max_delay_below_initial_is_rejected() {
        let toml = toml("[retry]\ninitial_delay = 10\nmax_delay = 5\n");

        let result = ValidatedConfig::from_raw(&cli(&[]), Some(&toml));

        let error = result.unwrap_err();
        assert!(error.to_string().contains("max_delay (5s)"));
    }
}

mod display {
    use super::*;

    #[test]
    fn api_key_is_masked() {
        let config = ValidatedConfig::from_raw(&cli(&["--api-key", "super-secret"]), None).unwrap();

        let shown = config.to_string();

        assert!(shown.contains("api_key: ***"));
        assert!(!shown.contains("super-secret"));
    }

    #[test]
    fn env_fallback_is_shown() {
        let config = ValidatedConfig::from_raw(&cli(&[]), None).unwrap();

        assert!(config.to_string().contains("api_key: env"));
    }

    #[test]
    fn summary_lists_stream_settings() {
        let config = ValidatedConfig::from_raw(
            &cli(&["--limit", "3", "--webhook-url", "https://hooks.example.com/in"]),
            None,
        )
        .unwrap();

        let shown = config.to_string();

        assert!(shown.contains("limit: 3"));
        assert!(shown.contains("webhook: https://hooks.example.com/in"));
        assert!(shown.contains("refresh: 0.5s"));
    }
}
