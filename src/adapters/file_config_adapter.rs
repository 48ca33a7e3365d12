//! INI file configuration adapter.

use crate::domain::error::TraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TraderError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| TraderError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[portfolio]
starting_balance = 10000.0
state_file = saves/portfolio.json

[quotes]
base_url = https://api.coingecko.com/api/v3
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("portfolio", "state_file"),
            Some("saves/portfolio.json".to_string())
        );
        assert_eq!(
            adapter.get_string("quotes", "base_url"),
            Some("https://api.coingecko.com/api/v3".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter =
            FileConfigAdapter::from_string("[portfolio]\nstarting_balance = 100\n").unwrap();
        assert_eq!(adapter.get_string("portfolio", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value_or_default() {
        let adapter = FileConfigAdapter::from_string("[quotes]\ntimeout_secs = 5\n").unwrap();
        assert_eq!(adapter.get_int("quotes", "timeout_secs", 10), 5);
        assert_eq!(adapter.get_int("quotes", "missing", 42), 42);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[quotes]\ntimeout_secs = soon\n").unwrap();
        assert_eq!(adapter.get_int("quotes", "timeout_secs", 10), 10);
    }

    #[test]
    fn get_double_returns_value_or_default() {
        let adapter =
            FileConfigAdapter::from_string("[portfolio]\nstarting_balance = 2500.5\n").unwrap();
        assert_eq!(adapter.get_double("portfolio", "starting_balance", 0.0), 2500.5);
        assert_eq!(adapter.get_double("portfolio", "missing", 99.9), 99.9);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[portfolio]\nstarting_balance = lots\n").unwrap();
        assert_eq!(adapter.get_double("portfolio", "starting_balance", 99.9), 99.9);
    }

    #[test]
    fn get_non_empty_skips_blank_values() {
        let adapter =
            FileConfigAdapter::from_string("[quotes]\napi_key =   \nbase_url = x\n").unwrap();
        assert_eq!(adapter.get_non_empty("quotes", "api_key"), None);
        assert_eq!(adapter.get_non_empty("quotes", "base_url"), Some("x".to_string()));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[portfolio]\nstate_file = /var/lib/trader.json\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("portfolio", "state_file"),
            Some("/var/lib/trader.json".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(TraderError::ConfigParse { .. })));
    }
}
