pub mod env_var {
    use std::path::PathBuf;

    use lazy_static::lazy_static;
    use url::Url;

    lazy_static! {
        static ref ENV_VAR: EnvVar = load_env();
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Storage {
        Postgres,
        Memory,
    }

    #[derive(Debug, Clone)]
    pub struct EnvVar {
        pub app_env: String,
        pub port: u16,
        pub base_url: Option<Url>,
        pub storage: Storage,
        pub database_url: String,
        pub database_max_connections: u32,
        pub migrate_on_start: bool,
    }

    macro_rules! get_env {
        ($env:literal) => {
            std::env::var($env).expect(concat!("Missing env var ", $env))
        };
        ($env:literal, $default:expr) => {
            std::env::var($env).unwrap_or_else(|_| $default.into())
        };
    }

    /// Loads `<APP_ENV>.env` and then `.env`, without overriding variables
    /// already present in the process environment. Returns the path of the
    /// `<APP_ENV>.env` file when one was found.
    pub fn load_env_files() -> Option<PathBuf> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let loaded = load_env_file(&format!("{app_env}.env"));
        dotenv::dotenv().ok();
        loaded
    }

    fn load_env_file(filename: &str) -> Option<PathBuf> {
        dotenv::from_filename(filename).ok()
    }

    /// Explicit `STORAGE` wins; otherwise Postgres only when a database is
    /// configured.
    fn select_storage(explicit: Option<&str>, database_configured: bool) -> Storage {
        match explicit {
            Some("memory") => Storage::Memory,
            Some("postgres") => Storage::Postgres,
            Some(other) => panic!("Invalid STORAGE {other:?}, expected \"postgres\" or \"memory\""),
            None if database_configured => Storage::Postgres,
            None => Storage::Memory,
        }
    }

    fn database_url() -> String {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            return url;
        }

        let database_host = get_env!("DATABASE_HOST");
        let database_name = get_env!("DATABASE_NAME");
        let database_user = get_env!("DATABASE_USER");
        let database_password = get_env!("DATABASE_PASSWORD");
        let database_port: u16 = get_env!("DATABASE_PORT", "5432")
            .parse()
            .expect("Invalid DATABASE_PORT");

        format!("postgres://{database_user}:{database_password}@{database_host}:{database_port}/{database_name}")
    }

    fn load_env() -> EnvVar {
        let app_env = get_env!("APP_ENV", "development");
        let port: u16 = get_env!("PORT", "3000").parse().expect("Invalid PORT");
        let base_url = std::env::var("BASE_URL")
            .ok()
            .map(|url| url.parse().expect("Invalid BASE_URL"));

        let database_configured = ["DATABASE_URL", "DATABASE_HOST"]
            .iter()
            .any(|var| std::env::var_os(var).is_some());
        let storage = select_storage(std::env::var("STORAGE").ok().as_deref(), database_configured);

        let database_url = match storage {
            Storage::Postgres => database_url(),
            Storage::Memory => String::new(),
        };
        let database_max_connections: u32 = get_env!("DATABASE_MAX_CONNECTIONS", "5")
            .parse()
            .expect("Invalid DATABASE_MAX_CONNECTIONS");
        let migrate_on_start = matches!(
            get_env!("MIGRATE_ON_START", "false").as_str(),
            "1" | "true" | "yes"
        );

        EnvVar {
            app_env,
            port,
            base_url,
            storage,
            database_url,
            database_max_connections,
            migrate_on_start,
        }
    }

    pub fn get() -> &'static EnvVar {
        &ENV_VAR
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn explicit_storage_wins() {
            assert_eq!(select_storage(Some("memory"), true), Storage::Memory);
            assert_eq!(select_storage(Some("postgres"), false), Storage::Postgres);
        }

        #[test]
        fn storage_falls_back_to_memory_without_database() {
            assert_eq!(select_storage(None, false), Storage::Memory);
            assert_eq!(select_storage(None, true), Storage::Postgres);
        }

        #[test]
        #[should_panic(expected = "Invalid STORAGE")]
        fn unknown_storage_is_rejected() {
            select_storage(Some("redis"), false);
        }

        #[test]
        fn env_file_path_is_returned_only_when_loaded() {
            assert_eq!(load_env_file("registry-no-such-environment.env"), None);

            let path = std::env::temp_dir().join("registry-config-test.env");
            std::fs::write(&path, "REGISTRY_CONFIG_TEST_VAR=loaded\n").unwrap();
            let loaded = load_env_file(path.to_str().unwrap());
            std::fs::remove_file(&path).unwrap();

            assert_eq!(loaded, Some(path));
            assert_eq!(
                std::env::var("REGISTRY_CONFIG_TEST_VAR").as_deref(),
                Ok("loaded")
            );
        }
    }
}
