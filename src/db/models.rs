/// Catalog database models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Distribution record
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Distro {
    pub id: i64,
    pub name: String,
    pub created_on: DateTime<Utc>,
}

/// Monitored project
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    /// Denormalized pointer to a live version string, or none
    pub latest_version: Option<String>,
    pub created_on: DateTime<Utc>,
}

/// Version owned by a project
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ProjectVersion {
    pub project_id: i64,
    pub version: String,
    pub created_on: DateTime<Utc>,
}

/// Mapping of a project to a distribution package
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Package {
    pub id: i64,
    pub project_id: i64,
    pub distro_name: String,
    pub package_name: String,
}
