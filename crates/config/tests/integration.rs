//! Integration tests for config

#[cfg(test)]
mod tests {
    use pkgcruft_config::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 5] = [
        "PREFIX",
        "CONCURRENCY",
        "IGNORE_UNPACKAGED",
        "IGNORE_LDD",
        "PKGCRUFT_CONFIG",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
prefix = "/opt/local"
concurrency = 8
ignore_unpackaged = ["etc/**", "var/db/**"]
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config.prefix, PathBuf::from("/opt/local"));
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.ignore_unpackaged.len(), 2);
        assert!(config.ignore_ldd.is_empty());
    }

    #[test]
    fn test_unknown_key_is_parse_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "threads = 4").unwrap();
        assert!(Config::load_from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = Config::load_from_file(std::path::Path::new("/nonexistent/pkgcruft.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("PREFIX", "/usr/pkg");
        std::env::set_var("CONCURRENCY", "4");
        std::env::set_var("IGNORE_LDD", "share/**:lib/debug/**");

        let config = Config::load().unwrap();
        assert_eq!(config.prefix, PathBuf::from("/usr/pkg"));
        assert_eq!(config.concurrency, 4);
        assert_eq!(
            config.ignore_ldd,
            vec!["share/**".to_string(), "lib/debug/**".to_string()]
        );

        clear_env();
    }

    #[test]
    fn test_env_overrides_file() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "concurrency = 2\nprefix = \"/opt/local\"").unwrap();

        std::env::set_var("PKGCRUFT_CONFIG", temp_file.path());
        std::env::set_var("CONCURRENCY", "12");

        let config = Config::load().unwrap();
        assert_eq!(config.prefix, PathBuf::from("/opt/local"));
        assert_eq!(config.concurrency, 12);

        clear_env();
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("CONCURRENCY", "64");
        assert!(Config::load().is_err());

        std::env::set_var("CONCURRENCY", "sixteen");
        assert!(Config::load().is_err());

        clear_env();
    }
}
