//! Configuration loading for the composition root.
//!
//! Precedence, lowest to highest: built-in defaults, the optional
//! `gardener.toml` file, CLI flags. The result is one immutable
//! [`EngineConfig`] handed to the reconciler at construction.

use std::path::Path;

use anyhow::Context;

use board::EngineConfig;

/// Default config file looked for in the working directory when `--config`
/// is not given.
pub const DEFAULT_CONFIG_FILE: &str = "gardener.toml";

/// Loads the engine configuration.
///
/// An explicitly named file must exist and parse; the implicit default file
/// is optional.
pub fn load(explicit_path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match explicit_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("could not read config file {}", path.display()))?;
            parse(&raw).with_context(|| format!("invalid config file {}", path.display()))
        }
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.exists() {
                let raw = std::fs::read_to_string(default)
                    .with_context(|| format!("could not read {DEFAULT_CONFIG_FILE}"))?;
                parse(&raw).with_context(|| format!("invalid {DEFAULT_CONFIG_FILE}"))
            } else {
                Ok(EngineConfig::default())
            }
        }
    }
}

fn parse(raw: &str) -> anyhow::Result<EngineConfig> {
    Ok(toml::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use board::Priority;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.default_priority, Priority::P2);
        assert_eq!(config.stale_after_days, 30);
        assert!(!config.dry_run);
    }

    #[test]
    fn partial_file_overrides_only_named_keys() {
        let config = parse(
            r#"
            stale_after_days = 14
            agent_pending_label = "robot-queue"
            label_priorities = [["urgent", "P0"], ["docs", "P3"]]
            "#,
        )
        .unwrap();
        assert_eq!(config.stale_after_days, 14);
        assert_eq!(config.agent_pending_label, "robot-queue");
        assert_eq!(
            config.label_priorities,
            vec![
                ("urgent".to_string(), Priority::P0),
                ("docs".to_string(), Priority::P3),
            ]
        );
        // Untouched keys keep their defaults.
        assert_eq!(config.status_done, "Done");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse("stale_after_dayz = 14").is_err());
    }
}
