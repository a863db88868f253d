/// Audit Log Recorder
///
/// Appends immutable entries describing privileged mutations. Recording
/// happens on the caller's connection so the entry commits (or rolls back)
/// together with the change it describes.
use crate::admin::flags::FlagState;
use crate::admin::search::{self, BrowseParams, BrowseResult, PageRequest, SearchFilter, SearchSource, UserFilter};
use crate::admin::Actor;
use crate::db::{parse_timestamp, timestamp};
use crate::error::{RelmonError, RelmonResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};

/// Schema version of the serialized `AuditMessage` payload
pub const AUDIT_MESSAGE_VERSION: i64 = 1;

/// Structured audit payload, one variant per topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "topic")]
pub enum AuditMessage {
    #[serde(rename = "distro.add")]
    DistroAdd { agent: String, distro: String },
    #[serde(rename = "distro.edit")]
    DistroEdit { agent: String, old: String, new: String },
    #[serde(rename = "distro.remove")]
    DistroRemove { agent: String, distro: String },
    #[serde(rename = "project.remove")]
    ProjectRemove { agent: String, project: String },
    #[serde(rename = "project.map.remove")]
    ProjectMapRemove {
        agent: String,
        project: String,
        distro: String,
        package: String,
    },
    #[serde(rename = "project.version.remove")]
    ProjectVersionRemove {
        agent: String,
        project: String,
        version: String,
    },
    #[serde(rename = "flag.state.set")]
    FlagStateSet {
        agent: String,
        flag: i64,
        state: FlagState,
    },
}

impl AuditMessage {
    pub fn topic(&self) -> &'static str {
        match self {
            AuditMessage::DistroAdd { .. } => "distro.add",
            AuditMessage::DistroEdit { .. } => "distro.edit",
            AuditMessage::DistroRemove { .. } => "distro.remove",
            AuditMessage::ProjectRemove { .. } => "project.remove",
            AuditMessage::ProjectMapRemove { .. } => "project.map.remove",
            AuditMessage::ProjectVersionRemove { .. } => "project.version.remove",
            AuditMessage::FlagStateSet { .. } => "flag.state.set",
        }
    }

    /// The acting user recorded in the payload
    pub fn agent(&self) -> &str {
        match self {
            AuditMessage::DistroAdd { agent, .. }
            | AuditMessage::DistroEdit { agent, .. }
            | AuditMessage::DistroRemove { agent, .. }
            | AuditMessage::ProjectRemove { agent, .. }
            | AuditMessage::ProjectMapRemove { agent, .. }
            | AuditMessage::ProjectVersionRemove { agent, .. }
            | AuditMessage::FlagStateSet { agent, .. } => agent,
        }
    }

    /// Human-readable sentence for the log browser
    pub fn describe(&self) -> String {
        match self {
            AuditMessage::DistroAdd { agent, distro } => {
                format!("{} added the distro named: {}", agent, distro)
            }
            AuditMessage::DistroEdit { agent, old, new } => {
                format!("{} edited distro name from: {} to: {}", agent, old, new)
            }
            AuditMessage::DistroRemove { agent, distro } => {
                format!("{} deleted the distro named: {}", agent, distro)
            }
            AuditMessage::ProjectRemove { agent, project } => {
                format!("{} deleted the project: {}", agent, project)
            }
            AuditMessage::ProjectMapRemove {
                agent,
                project,
                distro,
                package,
            } => format!(
                "{} deleted the mapping of the project: {} in the distro: {} (package {})",
                agent, project, distro, package
            ),
            AuditMessage::ProjectVersionRemove {
                agent,
                project,
                version,
            } => format!("{} deleted the version {} of {}", agent, version, project),
            AuditMessage::FlagStateSet { agent, flag, state } => {
                format!("{} set flag {} to {}", agent, flag, state.as_str())
            }
        }
    }
}

/// Stored audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub topic: String,
    pub actor: String,
    pub message: AuditMessage,
    pub description: String,
    pub project_id: Option<i64>,
    pub distro_id: Option<i64>,
    pub created_on: DateTime<Utc>,
}

/// Write one entry on the caller's connection. Does not commit.
pub async fn record(
    conn: &mut SqliteConnection,
    message: &AuditMessage,
    project_id: Option<i64>,
    distro_id: Option<i64>,
) -> RelmonResult<i64> {
    let payload = serde_json::to_string(message)
        .map_err(|e| RelmonError::Internal(format!("Failed to encode audit message: {}", e)))?;

    let result = sqlx::query(
        r#"
        INSERT INTO logs (topic, actor, message, message_version, project_id, distro_id, created_on)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(message.topic())
    .bind(message.agent())
    .bind(payload)
    .bind(AUDIT_MESSAGE_VERSION)
    .bind(project_id)
    .bind(distro_id)
    .bind(timestamp(Utc::now()))
    .execute(&mut *conn)
    .await?;

    tracing::debug!("Recorded audit entry {}: {}", result.last_insert_rowid(), message.topic());

    Ok(result.last_insert_rowid())
}

const LOG_SOURCE: SearchSource = SearchSource {
    name: "logs",
    select: "SELECT l.id, l.topic, l.actor, l.message, l.project_id, l.distro_id, l.created_on",
    from: "FROM logs l LEFT JOIN projects p ON p.id = l.project_id",
    user_column: "l.actor",
    created_column: "l.created_on",
    state_column: None,
    order_by: "l.created_on DESC, l.id DESC",
};

fn parse_entry(row: SqliteRow) -> RelmonResult<AuditLogEntry> {
    let payload: String = row.get("message");
    let message: AuditMessage = serde_json::from_str(&payload)
        .map_err(|e| RelmonError::Internal(format!("Invalid audit message: {}", e)))?;

    let created_on_str: String = row.get("created_on");

    Ok(AuditLogEntry {
        id: row.get("id"),
        topic: row.get("topic"),
        actor: row.get("actor"),
        description: message.describe(),
        message,
        project_id: row.get("project_id"),
        distro_id: row.get("distro_id"),
        created_on: parse_timestamp(&created_on_str)?,
    })
}

/// Read side of the audit log
#[derive(Clone)]
pub struct AuditLogManager {
    db: SqlitePool,
    default_limit: i64,
}

impl AuditLogManager {
    pub fn new(db: SqlitePool, default_limit: i64) -> Self {
        Self { db, default_limit }
    }

    /// Search entries newest first
    #[cfg(test)]
    pub async fn search(
        &self,
        filter: &SearchFilter,
        page: PageRequest,
    ) -> RelmonResult<Vec<AuditLogEntry>> {
        search::search(&self.db, &LOG_SOURCE, filter, page, parse_entry).await
    }

    /// Count entries matching the filters
    #[cfg(test)]
    pub async fn count(&self, filter: &SearchFilter) -> RelmonResult<i64> {
        search::count(&self.db, &LOG_SOURCE, filter).await
    }

    /// Browse the log as `viewer`.
    ///
    /// Administrators may filter by any user; everyone else only sees
    /// entries recorded under their own username or email.
    pub async fn browse(&self, viewer: &Actor, params: &BrowseParams) -> BrowseResult<AuditLogEntry> {
        let mut notices = Vec::new();
        let page = PageRequest::from_params(
            params.page.as_deref(),
            params.limit.as_deref(),
            self.default_limit,
            &mut notices,
        );
        let mut filter = SearchFilter::from_params(params, &mut notices);

        if !viewer.is_admin {
            filter.user = Some(UserFilter::AnyOf(viewer.identities()));
        }

        search::browse(&self.db, &LOG_SOURCE, &filter, page, notices, parse_entry).await
    }
}
