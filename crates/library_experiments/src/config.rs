//! TOML loading for [LibraryConfig].
//!
//! Every field is optional in the file; missing ones take the engine defaults.
//!
//! ```toml
//! horizon = 480.0
//! employees = 3
//! seed = 7
//!
//! [actions]
//! request = 0.5
//! return_book = 0.4
//! inquire = 0.1
//! ```

use std::path::Path;

use library_core::LibraryConfig;

use crate::error::ExperimentError;

/// Parses a config from TOML text and validates it.
pub fn parse_config(content: &str, file: &Path) -> Result<LibraryConfig, ExperimentError> {
    let config: LibraryConfig = toml::from_str(content).map_err(|e| ExperimentError::Parse {
        file: file.to_path_buf(),
        detail: e.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}

/// Reads and validates a TOML config file.
pub fn load_config(path: impl AsRef<Path>) -> Result<LibraryConfig, ExperimentError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    parse_config(&content, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use library_core::ConfigError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "horizon = 120.0\nemployees = 3\nseed = 9\n\n[reading]\nstep_size = 0.05"
        )
        .expect("write");

        let config = load_config(file.path()).expect("config");
        assert_eq!(config.horizon, 120.0);
        assert_eq!(config.employees, 3);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.reading.step_size, 0.05);
        assert_eq!(config.reading.macro_step, 10.0);
        assert_eq!(config.capacity, 20);
        assert_eq!(config.actions, LibraryConfig::default().actions);
    }

    #[test]
    fn invalid_values_are_rejected_after_parsing() {
        let result = parse_config("capacity = 0", Path::new("inline.toml"));
        assert!(matches!(
            result,
            Err(ExperimentError::Config(ConfigError::ZeroCapacity))
        ));
    }

    #[test]
    fn malformed_toml_reports_file() {
        let result = parse_config("horizon = [", Path::new("broken.toml"));
        match result {
            Err(ExperimentError::Parse { file, .. }) => assert_eq!(file, Path::new("broken.toml")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = load_config("/nonexistent/library.toml");
        assert!(matches!(result, Err(ExperimentError::Io(_))));
    }
}
