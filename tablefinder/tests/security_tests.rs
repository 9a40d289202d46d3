//! Security tests for credential protection
//!
//! These tests verify that database credentials are never exposed in error
//! messages, debug output or saved reports.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::uninlined_format_args)]

const SENSITIVE_PASSWORD: &str = "super_secret_password_123";
const SENSITIVE_USERNAME: &str = "admin_user";

mod credential_security {
    use super::*;
    use tablefinder::{
        ConnectionArgs, ENV_DATABASE, ENV_HOST, ENV_PASSWORD, ENV_PORT, ENV_USER, EnvConnection,
        resolve_database_url,
    };
    use tablefinder_core::error::{TableFinderError, redact_database_url};

    fn no_prompt() -> tablefinder_core::Result<zeroize::Zeroizing<String>> {
        Err(TableFinderError::configuration("prompt not expected"))
    }

    #[test]
    fn test_env_connection_debug_hides_password() {
        temp_env::with_vars(
            [
                (ENV_HOST, Some("db.internal")),
                (ENV_PORT, None),
                (ENV_DATABASE, Some("legacy")),
                (ENV_USER, Some(SENSITIVE_USERNAME)),
                (ENV_PASSWORD, Some(SENSITIVE_PASSWORD)),
            ],
            || {
                let env = EnvConnection::from_env().unwrap();
                let debug = format!("{:?}", env);
                assert!(!debug.contains(SENSITIVE_PASSWORD), "Password leaked: {}", debug);
                assert!(debug.contains("****"));
            },
        );
    }

    #[test]
    fn test_env_credential_error_lists_names_only() {
        temp_env::with_vars(
            [
                (ENV_HOST, None),
                (ENV_PORT, None),
                (ENV_DATABASE, None::<&str>),
                (ENV_USER, None),
                (ENV_PASSWORD, Some(SENSITIVE_PASSWORD)),
            ],
            || {
                let error = resolve_database_url(&ConnectionArgs::default(), no_prompt)
                    .unwrap_err()
                    .to_string();
                assert!(error.contains(ENV_DATABASE));
                assert!(error.contains(ENV_USER));
                assert!(!error.contains(SENSITIVE_PASSWORD), "Password leaked: {}", error);
            },
        );
    }

    #[test]
    fn test_assembled_url_redacts_cleanly() {
        temp_env::with_vars(
            [
                (ENV_HOST, Some("db.internal")),
                (ENV_PORT, Some("1433")),
                (ENV_DATABASE, Some("legacy")),
                (ENV_USER, Some(SENSITIVE_USERNAME)),
                (ENV_PASSWORD, Some(SENSITIVE_PASSWORD)),
            ],
            || {
                let url = resolve_database_url(&ConnectionArgs::default(), no_prompt).unwrap();
                assert!(url.contains(SENSITIVE_PASSWORD));

                let redacted = redact_database_url(&url);
                assert!(!redacted.contains(SENSITIVE_PASSWORD), "Password leaked: {}", redacted);
                assert!(redacted.contains(SENSITIVE_USERNAME));
            },
        );
    }

    #[cfg(feature = "postgresql")]
    #[tokio::test]
    async fn test_postgres_no_credentials_in_error() {
        use tablefinder_core::ConnectionConfig;
        use tablefinder_core::adapters::create_adapter;

        // Nothing listens on port 1, so the connection is refused quickly
        let connection_string = format!(
            "postgresql://{}:{}@127.0.0.1:1/testdb",
            SENSITIVE_USERNAME, SENSITIVE_PASSWORD
        );

        let config = ConnectionConfig {
            connect_timeout: std::time::Duration::from_secs(2),
            ..ConnectionConfig::default()
        };
        let error = match create_adapter(&connection_string, config).await {
            Ok(adapter) => adapter
                .test_connection()
                .await
                .expect_err("Connection to a closed port should fail"),
            Err(error) => error,
        };

        for rendered in [format!("{}", error), format!("{:?}", error)] {
            assert!(
                !rendered.contains(SENSITIVE_PASSWORD),
                "Password leaked in error message: {}",
                rendered
            );
        }
    }
}

mod report_security {
    use super::*;
    use tablefinder_core::models::{ScanResult, ScanTermination};
    use tablefinder_core::report::SearchReport;
    use tablefinder_core::search::{SearchRun, SelectionStats};
    use tablefinder_core::SearchConfig;

    fn empty_run(warnings: Vec<String>) -> SearchRun {
        SearchRun {
            selection: SelectionStats::default(),
            result: ScanResult {
                matches: Vec::new(),
                skipped_columns: Vec::new(),
                skipped_tables: Vec::new(),
                tables_scanned: 0,
                columns_scanned: 0,
                columns_considered: 0,
                termination: ScanTermination::Completed,
                elapsed_ms: 0,
                warnings,
            },
        }
    }

    #[test]
    fn test_report_with_leaked_connection_string_rejected() {
        tablefinder_core::initialize_schema_validator().unwrap();
        let leaked = format!(
            "could not reach mssql://{}:{}@db.internal:1433/legacy",
            SENSITIVE_USERNAME, SENSITIVE_PASSWORD
        );
        let report = SearchReport::new(&SearchConfig::new("foo"), &empty_run(vec![leaked]));

        let error = report.to_validated_json().unwrap_err().to_string();
        assert!(!error.contains(SENSITIVE_PASSWORD), "Password leaked: {}", error);
    }

    #[test]
    fn test_clean_report_passes() {
        tablefinder_core::initialize_schema_validator().unwrap();
        let report = SearchReport::new(&SearchConfig::new("foo"), &empty_run(Vec::new()));

        let json = report.to_validated_json().unwrap();
        let parsed = tablefinder_core::validate_and_parse_report(&json).unwrap();
        assert_eq!(parsed.total_matches, 0);
    }
}
