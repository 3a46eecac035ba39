#[cfg(test)]
mod tests {
    use crate::{Config, OutputMode};
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> String {
        let config_path = dir.path().join("baton.toml");
        fs::write(&config_path, content).unwrap();
        config_path.to_str().unwrap().to_string()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.progress.stream_tokens);
        assert_eq!(config.progress.spinner_interval_ms, 100);
        assert_eq!(config.progress.status_width, 80);
        assert_eq!(config.progress.output, OutputMode::Auto);
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            r#"
[progress]
stream_tokens = false
output = "plain"
"#,
        );

        let config = Config::load(Some(&path)).unwrap();
        assert!(!config.progress.stream_tokens);
        assert_eq!(config.progress.output, OutputMode::Plain);
        assert_eq!(config.progress.spinner_interval_ms, 100);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");
        assert!(Config::load(Some(missing.to_str().unwrap())).is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, "[progress]\nspinner_interval_ms = 1\n");
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("spinner_interval_ms"));

        let path = write_config(&temp_dir, "[progress]\nstatus_width = 5\n");
        assert!(Config::load(Some(&path)).is_err());

        let path = write_config(&temp_dir, "[logging]\nlevel = \"loud\"\n");
        assert!(Config::load(Some(&path)).is_err());

        let path = write_config(&temp_dir, "[progress]\noutput = \"fancy\"\n");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_overrides_win() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, "[progress]\nstream_tokens = true\n");
        let config =
            Config::load_with_overrides(Some(&path), Some(false), Some(OutputMode::Interactive)).unwrap();
        assert!(!config.progress.stream_tokens);
        assert_eq!(config.progress.output, OutputMode::Interactive);
    }

    #[test]
    fn test_save_round_trips_through_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("saved.toml");
        let path = path.to_str().unwrap();

        let mut config = Config::default();
        config.progress.status_width = 120;
        config.logging.level = "debug".to_string();
        config.save(path).unwrap();

        let loaded = Config::load(Some(path)).unwrap();
        assert_eq!(loaded.progress.status_width, 120);
        assert_eq!(loaded.logging.level, "debug");
    }
}
