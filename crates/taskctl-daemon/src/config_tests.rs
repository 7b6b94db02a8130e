
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert!(!config.is_daemon);
        assert!(config.pid_file().is_none());
        assert!(config.config_file().is_none());
    }

    #[test]
    fn test_builder_methods() {
        let config = DaemonConfig::new()
            .with_daemon(true)
            .with_pid_file("/tmp/taskctl.pid")
            .with_config_file("/etc/taskctl.yaml");

        assert!(config.is_daemon);
        assert_eq!(config.pid_file(), Some(Path::new("/tmp/taskctl.pid")));
        assert_eq!(config.config_file(), Some(Path::new("/etc/taskctl.yaml")));
    }

    #[test]
    fn test_validate_valid_config() {
        let config = DaemonConfig::new().with_pid_file("/tmp/taskctl.pid");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_pid_file() {
        let config = DaemonConfig::new().with_pid_file("");
        assert!(matches!(config.validate(), Err(DaemonError::Config(_))));
    }

    #[test]
    fn test_validate_empty_config_file() {
        let config = DaemonConfig::new().with_config_file("");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, DaemonError::Config(ref msg) if msg.contains("config_file")));
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn test_serialization() {
        let config = DaemonConfig::new().with_daemon(true);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("is_daemon"));
        assert!(json.contains("pid_file"));
    }

    #[test]
    fn test_deserialization_fills_defaults() {
        let json = r#"{"pid_file": "/run/taskctl.pid"}"#;
        let config: DaemonConfig = serde_json::from_str(json).unwrap();
        assert!(!config.is_daemon);
        assert_eq!(config.pid_file(), Some(Path::new("/run/taskctl.pid")));
        assert!(config.config_file.is_none());
    }
