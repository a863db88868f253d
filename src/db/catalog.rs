/// Catalog row access used by the moderation operations
///
/// Every function takes a connection so callers can run lookups and
/// mutations inside the same transaction.
use crate::db::models::{Distro, Package, Project, ProjectVersion};
use crate::db::timestamp;
use crate::error::RelmonResult;
use chrono::Utc;
use sqlx::SqliteConnection;

/// Look up a distribution by its unique name
pub async fn find_distro_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> RelmonResult<Option<Distro>> {
    let distro = sqlx::query_as::<_, Distro>(
        "SELECT id, name, created_on FROM distros WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(distro)
}

/// Insert a distribution. A taken name surfaces as a unique violation.
pub async fn insert_distro(conn: &mut SqliteConnection, name: &str) -> RelmonResult<Distro> {
    let now = Utc::now();

    let result = sqlx::query("INSERT INTO distros (name, created_on) VALUES (?, ?)")
        .bind(name)
        .bind(timestamp(now))
        .execute(&mut *conn)
        .await?;

    Ok(Distro {
        id: result.last_insert_rowid(),
        name: name.to_string(),
        created_on: now,
    })
}

pub async fn rename_distro(conn: &mut SqliteConnection, id: i64, name: &str) -> RelmonResult<()> {
    sqlx::query("UPDATE distros SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn delete_distro(conn: &mut SqliteConnection, id: i64) -> RelmonResult<()> {
    sqlx::query("DELETE FROM distros WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Look up a project by id
pub async fn find_project(conn: &mut SqliteConnection, id: i64) -> RelmonResult<Option<Project>> {
    let project = sqlx::query_as::<_, Project>(
        "SELECT id, name, latest_version, created_on FROM projects WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(project)
}

/// All versions owned by a project
pub async fn project_versions(
    conn: &mut SqliteConnection,
    project_id: i64,
) -> RelmonResult<Vec<ProjectVersion>> {
    let versions = sqlx::query_as::<_, ProjectVersion>(
        r#"
        SELECT project_id, version, created_on
        FROM project_versions
        WHERE project_id = ?
        ORDER BY created_on DESC, version DESC
        "#,
    )
    .bind(project_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(versions)
}

/// Delete the project row itself. Owned versions must already be gone.
pub async fn delete_project_row(conn: &mut SqliteConnection, id: i64) -> RelmonResult<()> {
    sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Look up a single package mapping
pub async fn find_package(
    conn: &mut SqliteConnection,
    project_id: i64,
    distro_name: &str,
    package_name: &str,
) -> RelmonResult<Option<Package>> {
    let package = sqlx::query_as::<_, Package>(
        r#"
        SELECT id, project_id, distro_name, package_name
        FROM packages
        WHERE project_id = ? AND distro_name = ? AND package_name = ?
        "#,
    )
    .bind(project_id)
    .bind(distro_name)
    .bind(package_name)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(package)
}

pub async fn delete_package(conn: &mut SqliteConnection, id: i64) -> RelmonResult<()> {
    sqlx::query("DELETE FROM packages WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
