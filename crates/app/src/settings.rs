use anyhow::{Context, Result};
use layerflow_layout::LayoutConfig;
use std::path::Path;
use tracing::debug;

/// Load the layout theme from a RON file, or the defaults without one
///
/// Fields missing from the file keep their default value.
pub fn load_config(path: Option<&Path>) -> Result<LayoutConfig> {
    let Some(path) = path else {
        debug!("No config file given, using defaults");
        return Ok(LayoutConfig::default());
    };

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = parse_config(&text)
        .with_context(|| format!("Invalid config file {}", path.display()))?;

    debug!("Loaded config from {}: {config:?}", path.display());
    Ok(config)
}

fn parse_config(text: &str) -> Result<LayoutConfig> {
    let config: LayoutConfig = ron::from_str(text)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use layerflow_layout::CyclePolicy;
    use std::io::Write;
    use test_log::test;

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let config = parse_config(
            r#"(
                padding: 20.0,
                kind_heights: { "Conv": 140.0 },
                cycles: Reject,
            )"#,
        )
        .unwrap();

        assert_eq!(config.padding, 20.0);
        assert_eq!(config.height_for("Conv"), 140.0);
        assert_eq!(config.cycles, CyclePolicy::Reject);
        assert_eq!(config.column_step, LayoutConfig::default().column_step);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = parse_config("(vertical_step: -5.0)").unwrap_err();
        assert!(err.to_string().contains("vertical_step"), "{err}");
    }

    #[test]
    fn missing_path_means_defaults() {
        assert_eq!(load_config(None).unwrap(), LayoutConfig::default());
    }

    #[test]
    fn file_errors_name_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(padding: ").unwrap();

        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().starts_with("Invalid config file"), "{err}");
    }
}
