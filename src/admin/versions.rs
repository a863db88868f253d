/// Version removal with latest-version repair
///
/// Any path that deletes a version goes through `remove_version`, which
/// clears the owning project's `latest_version` when it pointed at the
/// removed string. Both writes share the caller's transaction.
use crate::db::catalog;
use crate::db::models::Project;
use crate::error::RelmonResult;
use sqlx::SqliteConnection;

/// What a version removal changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRemoval {
    pub removed: bool,
    pub latest_cleared: bool,
}

/// Delete one version of `project` and repair `latest_version`
pub async fn remove_version(
    conn: &mut SqliteConnection,
    project: &Project,
    version: &str,
) -> RelmonResult<VersionRemoval> {
    let deleted = sqlx::query("DELETE FROM project_versions WHERE project_id = ? AND version = ?")
        .bind(project.id)
        .bind(version)
        .execute(&mut *conn)
        .await?;

    let cleared = sqlx::query(
        "UPDATE projects SET latest_version = NULL WHERE id = ? AND latest_version = ?",
    )
    .bind(project.id)
    .bind(version)
    .execute(&mut *conn)
    .await?;

    Ok(VersionRemoval {
        removed: deleted.rows_affected() > 0,
        latest_cleared: cleared.rows_affected() > 0,
    })
}

/// Delete every version owned by `project`, returning how many went
pub async fn remove_all_versions(conn: &mut SqliteConnection, project: &Project) -> RelmonResult<usize> {
    let versions = catalog::project_versions(conn, project.id).await?;

    let mut removed = 0;
    for version in &versions {
        if remove_version(conn, project, &version.version).await?.removed {
            removed += 1;
        }
    }

    Ok(removed)
}
