use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MappingError {
    #[error("No source node attributes are mapped")]
    NoSourceAttributes,
    #[error("No target node attributes are mapped")]
    NoTargetAttributes,
    #[error("No link attributes are mapped")]
    NoLinkAttributes,
    #[error("Column '{0}' is mapped but does not exist in the CSV header")]
    UnknownColumn(String),
    #[error("Only one date attribute may be mapped, found {0}")]
    MultipleDateAttributes(usize),
}

/// Which end of a link a node was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Source,
    Target,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Source, Side::Target];

    pub fn index(self) -> usize {
        match self {
            Side::Source => 0,
            Side::Target => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => write!(f, "source"),
            Side::Target => write!(f, "target"),
        }
    }
}

/// A CSV column projected onto a semantic attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSpec {
    #[serde(alias = "column")]
    pub name: String,
    pub attribute: String,
}

impl AttributeSpec {
    pub fn new(name: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute: attribute.into(),
        }
    }
}

/// The role a column plays in the graph, as chosen in the column table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ColumnRole {
    #[serde(rename = "Source node attributes")]
    SourceNode,
    #[serde(rename = "Target node attributes")]
    TargetNode,
    #[serde(rename = "Link attributes")]
    Link,
    #[serde(rename = "Date attribute")]
    Date,
    #[default]
    #[serde(rename = "Unused")]
    Unused,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnRole::SourceNode => "Source node attributes",
            ColumnRole::TargetNode => "Target node attributes",
            ColumnRole::Link => "Link attributes",
            ColumnRole::Date => "Date attribute",
            ColumnRole::Unused => "Unused",
        };
        write!(f, "{}", label)
    }
}

/// One row of the column table: a CSV column, the attribute it projects to and its role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRow {
    pub name: String,
    pub attribute: String,
    pub useas: ColumnRole,
}

impl ColumnRow {
    /// Suggest a role for a column. Columns of the Enron e-mail export get
    /// their usual roles, everything else starts out unused.
    pub fn suggest(name: &str) -> Self {
        let (attribute, useas) = match name {
            "fromEmail" => ("email", ColumnRole::SourceNode),
            "fromJobtitle" => ("jobtitle", ColumnRole::SourceNode),
            "toEmail" => ("email", ColumnRole::TargetNode),
            "toJobtitle" => ("jobtitle", ColumnRole::TargetNode),
            "sentiment" | "messageType" => (name, ColumnRole::Link),
            "date" => (name, ColumnRole::Date),
            _ => (name, ColumnRole::Unused),
        };

        Self {
            name: name.to_string(),
            attribute: attribute.to_string(),
            useas,
        }
    }

    /// Build the column table for a CSV header.
    ///
    /// `messageType` is moved behind the other link columns so that `sentiment`
    /// stays the main link attribute.
    pub fn suggest_all<'a>(header: impl IntoIterator<Item = &'a str>) -> Vec<ColumnRow> {
        let mut rows: Vec<ColumnRow> = header.into_iter().map(Self::suggest).collect();
        if let Some(pos) = rows.iter().position(|r| r.name == "messageType") {
            let row = rows.remove(pos);
            rows.push(row);
        }
        rows
    }
}

/// Assignment of CSV columns to graph roles.
///
/// The first entry of each node group is that side's identity attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleMapping {
    pub node_groups: [Vec<AttributeSpec>; 2],
    pub link_attributes: Vec<AttributeSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub date_attribute: Vec<AttributeSpec>,
}

impl RoleMapping {
    pub fn new(
        source: Vec<AttributeSpec>,
        target: Vec<AttributeSpec>,
        links: Vec<AttributeSpec>,
        date: Option<AttributeSpec>,
    ) -> Self {
        Self {
            node_groups: [source, target],
            link_attributes: links,
            date_attribute: date.into_iter().collect(),
        }
    }

    /// Group a column table by role, keeping the table order within each group.
    pub fn from_rows(rows: &[ColumnRow]) -> Result<Self, MappingError> {
        let mut source = Vec::new();
        let mut target = Vec::new();
        let mut links = Vec::new();
        let mut dates = Vec::new();

        for row in rows {
            let spec = AttributeSpec::new(&row.name, &row.attribute);
            match row.useas {
                ColumnRole::SourceNode => source.push(spec),
                ColumnRole::TargetNode => target.push(spec),
                ColumnRole::Link => links.push(spec),
                ColumnRole::Date => dates.push(spec),
                ColumnRole::Unused => {}
            }
        }

        if dates.len() > 1 {
            return Err(MappingError::MultipleDateAttributes(dates.len()));
        }

        let mapping = Self {
            node_groups: [source, target],
            link_attributes: links,
            date_attribute: dates,
        };
        mapping.check_groups()?;
        Ok(mapping)
    }

    pub fn group(&self, side: Side) -> &[AttributeSpec] {
        &self.node_groups[side.index()]
    }

    /// The identity attribute of a side.
    pub fn identity(&self, side: Side) -> Option<&AttributeSpec> {
        self.group(side).first()
    }

    /// The first declared link attribute.
    pub fn main_link_attribute(&self) -> Option<&AttributeSpec> {
        self.link_attributes.first()
    }

    pub fn date(&self) -> Option<&AttributeSpec> {
        self.date_attribute.first()
    }

    /// Sides whose node group maps `attribute`.
    pub fn sides_with(&self, attribute: &str) -> Vec<Side> {
        Side::BOTH
            .into_iter()
            .filter(|side| self.group(*side).iter().any(|s| s.attribute == attribute))
            .collect()
    }

    /// Distinct node attribute names, source group first.
    pub fn node_attributes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for spec in self.node_groups.iter().flatten() {
            if !names.contains(&spec.attribute.as_str()) {
                names.push(&spec.attribute);
            }
        }
        names
    }

    /// Check the mapping against a CSV header.
    pub fn validate(&self, header: &[String]) -> Result<(), MappingError> {
        self.check_groups()?;

        let mapped = self
            .node_groups
            .iter()
            .flatten()
            .chain(&self.link_attributes)
            .chain(&self.date_attribute);
        for spec in mapped {
            if !header.iter().any(|h| h == &spec.name) {
                return Err(MappingError::UnknownColumn(spec.name.clone()));
            }
        }
        Ok(())
    }

    fn check_groups(&self) -> Result<(), MappingError> {
        if self.group(Side::Source).is_empty() {
            return Err(MappingError::NoSourceAttributes);
        }
        if self.group(Side::Target).is_empty() {
            return Err(MappingError::NoTargetAttributes);
        }
        if self.link_attributes.is_empty() {
            return Err(MappingError::NoLinkAttributes);
        }
        if self.date_attribute.len() > 1 {
            return Err(MappingError::MultipleDateAttributes(
                self.date_attribute.len(),
            ));
        }
        Ok(())
    }
}
