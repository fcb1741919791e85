//! Engine configuration loaded from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `JWT_SECRET` | `dev-secret` (logged as insecure) |
//! | `SCOPEGATE_BIND_ADDR` | `0.0.0.0:8080` |
//! | `SCOPEGATE_DECISION_CACHE_TTL_MS` | `0` (shared cache off) |
//! | `SCOPEGATE_PROJECT_SCOPED` | `task,milestone` |
//! | `SCOPEGATE_ROLE_CATALOG` | unset (built-in catalog) |
//! | `DATABASE_URL` | unset (in-memory assignments) |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use scopegate_auth::{CatalogError, ProjectScopedPermissions, StaticRoleCatalog};

pub const DEFAULT_JWT_SECRET: &str = "dev-secret";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_PROJECT_SCOPED: &str = "task,milestone";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to read role catalog {path}: {source}")]
    CatalogIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid role catalog: {0}")]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    /// `None` keeps caching request-scoped only.
    pub decision_cache_ttl: Option<Duration>,
    pub project_scoped: Vec<String>,
    pub role_catalog_path: Option<PathBuf>,
    pub database_url: Option<String>,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEFAULT_JWT_SECRET.to_string()
        });

        let bind_raw = get("SCOPEGATE_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse::<SocketAddr>().map_err(|e| ConfigError::InvalidValue {
            var: "SCOPEGATE_BIND_ADDR",
            value: bind_raw.clone(),
            reason: e.to_string(),
        })?;

        let decision_cache_ttl = match get("SCOPEGATE_DECISION_CACHE_TTL_MS") {
            None => None,
            Some(raw) => {
                let ms = raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                    var: "SCOPEGATE_DECISION_CACHE_TTL_MS",
                    value: raw.clone(),
                    reason: e.to_string(),
                })?;
                (ms > 0).then(|| Duration::from_millis(ms))
            }
        };

        // An explicitly empty list is meaningful here, so read it unfiltered.
        let project_scoped = lookup("SCOPEGATE_PROJECT_SCOPED")
            .unwrap_or_else(|| DEFAULT_PROJECT_SCOPED.to_string())
            .split(',')
            .map(|ns| ns.trim().to_string())
            .filter(|ns| !ns.is_empty())
            .collect();

        Ok(Self {
            jwt_secret,
            bind_addr,
            decision_cache_ttl,
            project_scoped,
            role_catalog_path: get("SCOPEGATE_ROLE_CATALOG").map(PathBuf::from),
            database_url: get("DATABASE_URL"),
        })
    }

    pub fn project_scoped_permissions(&self) -> ProjectScopedPermissions {
        ProjectScopedPermissions::new(self.project_scoped.iter().cloned())
    }

    /// Role catalog from `SCOPEGATE_ROLE_CATALOG`, or the built-in one.
    pub fn load_role_catalog(&self) -> Result<StaticRoleCatalog, ConfigError> {
        let Some(path) = &self.role_catalog_path else {
            return Ok(StaticRoleCatalog::builtin());
        };

        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::CatalogIo {
            path: path.clone(),
            source,
        })?;
        let catalog = StaticRoleCatalog::from_json(&json)?;
        tracing::info!(path = %path.display(), roles = catalog.len(), "role catalog loaded");
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use scopegate_auth::perms;

    fn config(vars: &[(&str, &str)]) -> Result<EngineConfig, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        EngineConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.jwt_secret, DEFAULT_JWT_SECRET);
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(cfg.decision_cache_ttl, None);
        assert_eq!(cfg.project_scoped, vec!["task", "milestone"]);
        assert!(cfg.role_catalog_path.is_none());
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("JWT_SECRET", "s3cret"),
            ("SCOPEGATE_BIND_ADDR", "127.0.0.1:9000"),
            ("SCOPEGATE_DECISION_CACHE_TTL_MS", "250"),
            ("SCOPEGATE_PROJECT_SCOPED", "task, quote"),
            ("DATABASE_URL", "postgres://localhost/scopegate"),
        ])
        .unwrap();

        assert_eq!(cfg.jwt_secret, "s3cret");
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.decision_cache_ttl, Some(Duration::from_millis(250)));
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/scopegate"));

        let scoped = cfg.project_scoped_permissions();
        assert!(scoped.requires_project(&perms::QUOTE_MANAGE));
        assert!(!scoped.requires_project(&perms::MILESTONE_MANAGE));
    }

    #[test]
    fn zero_ttl_disables_shared_cache() {
        let cfg = config(&[("SCOPEGATE_DECISION_CACHE_TTL_MS", "0")]).unwrap();
        assert_eq!(cfg.decision_cache_ttl, None);
    }

    #[test]
    fn empty_project_scoped_list_is_allowed() {
        let cfg = config(&[("SCOPEGATE_PROJECT_SCOPED", "")]).unwrap();
        assert!(cfg.project_scoped.is_empty());
        assert!(!cfg.project_scoped_permissions().requires_project(&perms::TASK_CREATE));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = config(&[("SCOPEGATE_DECISION_CACHE_TTL_MS", "soon")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                var: "SCOPEGATE_DECISION_CACHE_TTL_MS",
                ..
            }
        ));

        let err = config(&[("SCOPEGATE_BIND_ADDR", "localhost")]).unwrap_err();
        assert!(err.to_string().contains("SCOPEGATE_BIND_ADDR"));
    }

    #[test]
    fn role_catalog_defaults_to_builtin() {
        let catalog = config(&[]).unwrap().load_role_catalog().unwrap();
        assert_eq!(catalog.len(), StaticRoleCatalog::builtin().len());
    }

    #[test]
    fn role_catalog_loads_from_file() {
        let path = std::env::temp_dir().join(format!("scopegate-catalog-{}.json", uuid::Uuid::now_v7()));
        std::fs::write(
            &path,
            r#"{"roles":[{"name":"estimator","permissions":["quote.view","quote.manage"]}]}"#,
        )
        .unwrap();

        let cfg = config(&[("SCOPEGATE_ROLE_CATALOG", path.to_str().unwrap())]).unwrap();
        let catalog = cfg.load_role_catalog().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn missing_role_catalog_file_is_an_error() {
        let cfg = config(&[("SCOPEGATE_ROLE_CATALOG", "/nonexistent/roles.json")]).unwrap();
        assert!(matches!(cfg.load_role_catalog(), Err(ConfigError::CatalogIo { .. })));
    }
}
