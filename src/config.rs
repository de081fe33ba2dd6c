//! Workload configuration file and its translation into a scheduler setup.
//!
//! The file mirrors the scheduler's inputs:
//!
//! ```yaml
//! max: 30
//! filters: [WD, EX]
//! headers:
//!   accept: application/json
//! requests:
//!   - url: http://localhost:8080/items/{1..20}
//!     weight: 4
//!   - method: POST
//!     url: http://localhost:8080/items
//!     body: '{"name": "x"}'
//! ```
//!
//! `.json` files are read as JSON, anything else as YAML.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::clock::Clock;
use crate::dispatch::{AgentHeader, DEFAULT_AGENT, DEFAULT_AGENT_HEADER};
use crate::error::{Result, WorkloadError};
use crate::filter::{Filter, FilterKind, WorkingHoursProfile};
use crate::request::{Headers, RequestTemplate};
use crate::scheduler::{DEFAULT_MAX_PER_MINUTE, SchedulerConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkloadConfig {
    /// Requests per minute
    pub max: f64,
    /// Filter chain; wins over `filter` when both are set
    pub filters: Option<Vec<FilterKind>>,
    /// Single filter
    pub filter: Option<FilterKind>,
    /// Headers sent with every request
    pub headers: Headers,
    pub requests: Vec<RequestTemplate>,
    /// Name of the identifying header
    pub agent_header: String,
    /// Value of the identifying header
    pub agent: String,
    /// Odds table for the working-hours filter
    pub working_hours: WorkingHoursProfile,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            max: DEFAULT_MAX_PER_MINUTE,
            filters: None,
            filter: None,
            headers: Headers::new(),
            requests: Vec::new(),
            agent_header: DEFAULT_AGENT_HEADER.to_string(),
            agent: DEFAULT_AGENT.to_string(),
            working_hours: WorkingHoursProfile::default(),
        }
    }
}

impl WorkloadConfig {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // An explicit path must load
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config: Self = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        log::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// The filter names in effect: `filters`, else `filter`, else none.
    pub fn filter_kinds(&self) -> Option<Vec<FilterKind>> {
        match (&self.filters, self.filter) {
            (Some(filters), _) => Some(filters.clone()),
            (None, Some(filter)) => Some(vec![filter]),
            (None, None) => None,
        }
    }

    /// Build the filter chain against `clock`.
    pub fn build_filters(&self, clock: Arc<dyn Clock>) -> Option<Vec<Arc<dyn Filter>>> {
        self.filter_kinds().map(|kinds| {
            kinds
                .iter()
                .map(|kind| kind.build(clock.clone(), &self.working_hours))
                .collect()
        })
    }

    /// Split into the scheduler's templates and settings.
    pub fn into_scheduler(self, clock: Arc<dyn Clock>) -> Result<(Vec<RequestTemplate>, SchedulerConfig)> {
        if self.agent_header.trim().is_empty() {
            return Err(WorkloadError::Config("agentHeader must not be empty".to_string()));
        }

        let filters = self.build_filters(clock);
        let config = SchedulerConfig {
            max_per_minute: self.max,
            filters,
            default_headers: self.headers,
            agent: AgentHeader::new(self.agent_header, self.agent),
        };
        Ok((self.requests, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = WorkloadConfig::default();
        assert_eq!(config.max, 12.0);
        assert!(config.filter_kinds().is_none());
        assert_eq!(config.agent_header, "user-agent");
        assert!(config.requests.is_empty());
    }

    #[test]
    fn test_load_yaml() {
        let file = write_config(
            ".yml",
            r#"
max: 30
filters: [WD, EX]
headers:
  accept: application/json
requests:
  - url: http://localhost/{1..3}
    weight: 4
  - method: POST
    url: http://localhost/items
    body: '{"a": 1}'
"#,
        );

        let config = WorkloadConfig::load(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(config.max, 30.0);
        assert_eq!(config.filter_kinds(), Some(vec![FilterKind::Workdays, FilterKind::Expand]));
        assert_eq!(config.headers.get("accept").map(String::as_str), Some("application/json"));
        assert_eq!(config.requests.len(), 2);
        assert_eq!(config.requests[0].weight, 4.0);
        assert_eq!(config.requests[1].method, "POST");
        assert_eq!(config.requests[1].weight, 1.0);
    }

    #[test]
    fn test_load_json() {
        let file = write_config(
            ".json",
            r#"{"max": 6, "filter": "workingHours", "requests": [{"url": "http://localhost/"}]}"#,
        );
        let config = WorkloadConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.max, 6.0);
        assert_eq!(config.filter_kinds(), Some(vec![FilterKind::WorkingHours]));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let path = PathBuf::from("/nonexistent/workload.yml");
        assert!(matches!(WorkloadConfig::load(Some(&path)), Err(WorkloadError::Io(_))));
    }

    #[test]
    fn test_load_invalid_yaml_fails() {
        let file = write_config(".yml", "max: [not a number");
        assert!(matches!(
            WorkloadConfig::load_from_file(file.path()),
            Err(WorkloadError::Yaml(_))
        ));
    }

    #[test]
    fn test_filters_win_over_filter() {
        let config = WorkloadConfig {
            filters: Some(vec![FilterKind::Expand]),
            filter: Some(FilterKind::Workdays),
            ..Default::default()
        };
        assert_eq!(config.filter_kinds(), Some(vec![FilterKind::Expand]));
    }

    #[test]
    fn test_empty_filters_list_is_kept() {
        let config = WorkloadConfig {
            filters: Some(Vec::new()),
            ..Default::default()
        };
        let filters = config.build_filters(Arc::new(SystemClock)).unwrap();
        assert!(filters.is_empty());
    }

    #[test]
    fn test_into_scheduler() {
        let config = WorkloadConfig {
            max: 60.0,
            filter: Some(FilterKind::Expand),
            agent_header: "X-Agent".to_string(),
            agent: "tester".to_string(),
            requests: vec![RequestTemplate::new("http://localhost/")],
            ..Default::default()
        };
        let (templates, scheduler_config) = config.into_scheduler(Arc::new(SystemClock)).unwrap();

        assert_eq!(templates.len(), 1);
        assert_eq!(scheduler_config.max_per_minute, 60.0);
        assert_eq!(scheduler_config.agent, AgentHeader::new("X-Agent", "tester"));
        let names: Vec<String> = scheduler_config
            .filters
            .unwrap()
            .iter()
            .map(|f| f.name().to_string())
            .collect();
        assert_eq!(names, vec!["expand".to_string()]);
    }

    #[test]
    fn test_into_scheduler_rejects_empty_agent_header() {
        let config = WorkloadConfig {
            agent_header: " ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.into_scheduler(Arc::new(SystemClock)),
            Err(WorkloadError::Config(_))
        ));
    }
}
