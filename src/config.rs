use crate::fs::FileSystem;
use crate::graph::NumericPolicy;
use crate::model::{AttributeSpec, ColumnRole, ColumnRow, RoleMapping};
use crate::views::{Grouping, ViewSettings};
use serde::Deserialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = ".relviz.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    /// Column roles. `None` means the suggested roles of the CSV header.
    pub roles: Option<RoleMapping>,
    pub views: ViewSettings,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    roles: Option<RawRoles>,
    aggregation: Option<RawAggregation>,
    views: Option<RawViews>,
}

#[derive(Debug, Deserialize)]
struct RawRoles {
    #[serde(default)]
    source: Vec<AttributeSpec>,
    #[serde(default)]
    target: Vec<AttributeSpec>,
    #[serde(default)]
    links: Vec<AttributeSpec>,
    date: Option<AttributeSpec>,
}

#[derive(Debug, Deserialize)]
struct RawAggregation {
    missing_numeric: Option<NumericPolicy>,
}

#[derive(Debug, Deserialize)]
struct RawViews {
    hover_window: Option<usize>,
    opacity_total_max: Option<usize>,
    hierarchy_group: Option<String>,
    hierarchy_delimiter: Option<String>,
}

impl Config {
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content)?;
        let defaults = ViewSettings::default();

        let roles = raw
            .roles
            .map(|r| RoleMapping::new(r.source, r.target, r.links, r.date));

        let numeric_policy = raw
            .aggregation
            .and_then(|a| a.missing_numeric)
            .unwrap_or(defaults.numeric_policy);

        let views = match raw.views {
            Some(v) => ViewSettings {
                numeric_policy,
                hover_window: v.hover_window.unwrap_or(defaults.hover_window),
                opacity_total_max: v.opacity_total_max.unwrap_or(defaults.opacity_total_max),
                grouping: match (v.hierarchy_group, v.hierarchy_delimiter) {
                    (Some(attribute), _) => Grouping::Attribute(attribute),
                    (None, Some(delimiter)) => Grouping::Delimiter(delimiter),
                    (None, None) => defaults.grouping,
                },
            },
            None => ViewSettings {
                numeric_policy,
                ..defaults
            },
        };

        Ok(Self { roles, views })
    }

    /// Load `explicit`, or the config file next to `csv` if there is one.
    pub fn load(
        fs: &dyn FileSystem,
        csv: &Path,
        explicit: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let implicit = config_path_for(csv);
                if !fs.exists(&implicit) {
                    return Ok(Self::default());
                }
                implicit
            }
        };

        let content = fs.read_to_string(&path)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Self::parse(&content)
    }
}

/// `.relviz.toml` in the directory of `csv`.
pub fn config_path_for(csv: &Path) -> PathBuf {
    csv.parent()
        .unwrap_or_else(|| Path::new("."))
        .join(CONFIG_FILE)
}

fn spec_line(spec: &AttributeSpec) -> String {
    format!(
        "    {{ column = {:?}, attribute = {:?} }},",
        spec.name, spec.attribute
    )
}

/// Starter config with the suggested roles of a CSV header filled in.
pub fn generate_config_template(columns: &[ColumnRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# relviz configuration");
    let _ = writeln!(out);
    let _ = writeln!(out, "# Column roles. The first source and target entries identify nodes,");
    let _ = writeln!(out, "# the first link entry is the main link attribute.");
    let _ = writeln!(out, "[roles]");

    let group = |role: ColumnRole| -> Vec<AttributeSpec> {
        columns
            .iter()
            .filter(|c| c.useas == role)
            .map(|c| AttributeSpec::new(&c.name, &c.attribute))
            .collect()
    };

    for (key, role) in [
        ("source", ColumnRole::SourceNode),
        ("target", ColumnRole::TargetNode),
        ("links", ColumnRole::Link),
    ] {
        let _ = writeln!(out, "{} = [", key);
        for spec in group(role) {
            let _ = writeln!(out, "{}", spec_line(&spec));
        }
        let _ = writeln!(out, "]");
    }
    match group(ColumnRole::Date).first() {
        Some(date) => {
            let _ = writeln!(
                out,
                "date = {{ column = {:?}, attribute = {:?} }}",
                date.name, date.attribute
            );
        }
        None => {
            let _ = writeln!(out, "# date = {{ column = \"date\", attribute = \"date\" }}");
        }
    }

    let unused: Vec<&str> = columns
        .iter()
        .filter(|c| c.useas == ColumnRole::Unused)
        .map(|c| c.name.as_str())
        .collect();
    if !unused.is_empty() {
        let _ = writeln!(out, "# unused: {}", unused.join(", "));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "[aggregation]");
    let _ = writeln!(out, "# \"zero\" counts empty or non-numeric values as 0, \"skip\" leaves the link out");
    let _ = writeln!(out, "missing_numeric = \"zero\"");
    let _ = writeln!(out);
    let _ = writeln!(out, "[views]");
    let _ = writeln!(out, "hover_window = 5");
    let _ = writeln!(out, "opacity_total_max = 50");
    let _ = writeln!(out, "# hierarchy_group = \"jobtitle\"");
    let _ = writeln!(out, "hierarchy_delimiter = \".\"");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFs;
    use crate::model::Side;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
[roles]
source = [{ column = "from", attribute = "id" }, { column = "dept", attribute = "dept" }]
target = [{ column = "to", attribute = "id" }]
links = [{ column = "weight", attribute = "weight" }]
date = { column = "sent", attribute = "date" }

[aggregation]
missing_numeric = "skip"

[views]
hover_window = 3
hierarchy_group = "dept"
"#,
        )
        .unwrap();

        let roles = config.roles.unwrap();
        assert_eq!(roles.identity(Side::Source).unwrap().name, "from");
        assert_eq!(roles.date().unwrap().attribute, "date");
        assert_eq!(config.views.numeric_policy, NumericPolicy::Skip);
        assert_eq!(config.views.hover_window, 3);
        assert_eq!(config.views.opacity_total_max, 50);
        assert_eq!(config.views.grouping, Grouping::Attribute("dept".to_string()));
    }

    #[test]
    fn test_aggregation_without_views() {
        let config = Config::parse("[aggregation]\nmissing_numeric = \"skip\"\n").unwrap();
        assert_eq!(config.views.numeric_policy, NumericPolicy::Skip);
        assert_eq!(config.views.hover_window, 5);
    }

    #[test]
    fn test_bad_policy_is_parse_error() {
        let err = Config::parse("[aggregation]\nmissing_numeric = \"nan\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_next_to_csv() {
        let fs = MockFs::with_files([("/data/.relviz.toml", "[views]\nhover_window = 2\n")]);
        let config = Config::load(&fs, Path::new("/data/mail.csv"), None).unwrap();
        assert_eq!(config.views.hover_window, 2);

        let missing = Config::load(&fs, Path::new("/other/mail.csv"), None).unwrap();
        assert_eq!(missing, Config::default());
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let fs = MockFs::new();
        let err = Config::load(&fs, Path::new("/data/mail.csv"), Some(Path::new("/cfg.toml")));
        assert!(matches!(err, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_template_round_trips() {
        let header = ["date", "fromEmail", "fromJobtitle", "toEmail", "toJobtitle", "messageType", "sentiment", "subject"];
        let columns = ColumnRow::suggest_all(header);
        let template = generate_config_template(&columns);

        assert!(template.contains("# unused: subject"));
        let config = Config::parse(&template).unwrap();
        let roles = config.roles.unwrap();
        assert_eq!(roles.group(Side::Target).len(), 2);
        assert_eq!(roles.main_link_attribute().unwrap().name, "sentiment");
        assert_eq!(config.views, ViewSettings::default());
    }
}
