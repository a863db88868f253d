/// Flag Lifecycle Management
///
/// Flags are user reports against a project. Administrators move them
/// between `open` and `closed`; every effective change is audited.
use crate::admin::audit::{self, AuditMessage};
use crate::admin::search::{self, BrowseParams, BrowseResult, PageRequest, SearchFilter, SearchSource};
use crate::admin::{require_admin, Actor, ActionOutcome};
use crate::db::{self, parse_timestamp, timestamp};
use crate::error::{RelmonError, RelmonResult};
use crate::metrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};

/// Flag state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagState {
    Open,
    Closed,
}

impl FlagState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagState::Open => "open",
            FlagState::Closed => "closed",
        }
    }

    pub fn from_str(s: &str) -> RelmonResult<Self> {
        match s {
            "open" => Ok(FlagState::Open),
            "closed" => Ok(FlagState::Closed),
            _ => Err(RelmonError::InvalidState(format!(
                "Invalid flag state: {} (expected open or closed)",
                s
            ))),
        }
    }
}

/// Flag record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFlag {
    pub id: i64,
    pub project_id: Option<i64>,
    pub project_name: Option<String>,
    pub state: FlagState,
    pub user: String,
    pub reason: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

const FLAG_SOURCE: SearchSource = SearchSource {
    name: "flags",
    select: "SELECT f.id, f.project_id, p.name AS project_name, f.state, f.user, f.reason, f.created_on, f.updated_on",
    from: "FROM project_flags f LEFT JOIN projects p ON p.id = f.project_id",
    user_column: "f.user",
    created_column: "f.created_on",
    state_column: Some("f.state"),
    order_by: "f.created_on DESC, f.id DESC",
};

fn parse_flag(row: SqliteRow) -> RelmonResult<ProjectFlag> {
    let state_str: String = row.get("state");
    let created_on_str: String = row.get("created_on");
    let updated_on_str: String = row.get("updated_on");

    Ok(ProjectFlag {
        id: row.get("id"),
        project_id: row.get("project_id"),
        project_name: row.get("project_name"),
        state: FlagState::from_str(&state_str)?,
        user: row.get("user"),
        reason: row.get("reason"),
        created_on: parse_timestamp(&created_on_str)?,
        updated_on: parse_timestamp(&updated_on_str)?,
    })
}

/// Look up a flag on the given connection
pub async fn find_flag(conn: &mut SqliteConnection, flag_id: i64) -> RelmonResult<Option<ProjectFlag>> {
    let row = sqlx::query(&format!("{} {} WHERE f.id = ?", FLAG_SOURCE.select, FLAG_SOURCE.from))
        .bind(flag_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(parse_flag).transpose()
}

/// Flag manager
#[derive(Clone)]
pub struct FlagManager {
    db: SqlitePool,
    default_limit: i64,
}

impl FlagManager {
    pub fn new(db: SqlitePool, default_limit: i64) -> Self {
        Self { db, default_limit }
    }

    /// Move a flag to `state`.
    ///
    /// Checks run in order: administrator, state value, flag existence.
    /// Setting the state a flag already has writes nothing.
    pub async fn set_state(
        &self,
        actor: &Actor,
        flag_id: i64,
        state: &str,
    ) -> RelmonResult<ActionOutcome> {
        require_admin(actor)?;
        let state = FlagState::from_str(state)?;

        let mut tx = db::begin_write(&self.db).await?;

        let flag = find_flag(&mut tx, flag_id)
            .await?
            .ok_or_else(|| RelmonError::NotFound(format!("Flag {} not found", flag_id)))?;

        if flag.state == state {
            return Ok(ActionOutcome::Unchanged {
                message: "Nothing to change.".to_string(),
            });
        }

        sqlx::query("UPDATE project_flags SET state = ?, updated_on = ? WHERE id = ?")
            .bind(state.as_str())
            .bind(timestamp(Utc::now()))
            .bind(flag_id)
            .execute(&mut *tx)
            .await?;

        let message = AuditMessage::FlagStateSet {
            agent: actor.username.clone(),
            flag: flag_id,
            state,
        };
        audit::record(&mut tx, &message, flag.project_id, None).await?;

        tx.commit().await?;

        metrics::record_moderation_action(message.topic());
        tracing::info!("{} set flag {} to {}", actor.username, flag_id, state.as_str());

        Ok(ActionOutcome::Completed {
            message: format!("Flag {} set to {}", flag_id, state.as_str()),
        })
    }

    /// Get a flag by id
    #[cfg(test)]
    pub async fn get_flag(&self, flag_id: i64) -> RelmonResult<Option<ProjectFlag>> {
        let mut conn = self.db.acquire().await?;
        find_flag(&mut conn, flag_id).await
    }

    /// Browse flags. Administrators only; the state filter defaults to open.
    pub async fn browse(
        &self,
        viewer: &Actor,
        params: &BrowseParams,
    ) -> RelmonResult<BrowseResult<ProjectFlag>> {
        require_admin(viewer)?;

        let mut notices = Vec::new();
        let page = PageRequest::from_params(
            params.page.as_deref(),
            params.limit.as_deref(),
            self.default_limit,
            &mut notices,
        );
        let mut filter = SearchFilter::from_params(params, &mut notices);

        filter.state = match params.state.as_deref().map(str::trim) {
            None => Some(FlagState::Open.as_str().to_string()),
            Some("") => None,
            Some(raw) => match FlagState::from_str(raw) {
                Ok(state) => Some(state.as_str().to_string()),
                Err(_) => {
                    notices.push("Incorrect state provided, using default".to_string());
                    Some(FlagState::Open.as_str().to_string())
                }
            },
        };

        Ok(search::browse(&self.db, &FLAG_SOURCE, &filter, page, notices, parse_flag).await)
    }
}
