/// Catalog Moderation
///
/// Edit and delete operations for distros, projects, mappings and versions.
/// Each one runs in a single transaction: lookups, the administrator gate,
/// the confirmation gate, the mutation and its audit entry. Dropping the
/// transaction on any early return rolls everything back.
use crate::admin::audit::{self, AuditMessage};
use crate::admin::versions;
use crate::admin::{require_admin, Actor, ActionOutcome};
use crate::db::{self, catalog};
use crate::db::models::{Distro, Package, Project, ProjectVersion};
use crate::error::{RelmonError, RelmonResult};
use crate::metrics;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use validator::Validate;

/// Submitted distro name for add and rename
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DistroForm {
    #[validate(length(min = 1, max = 200, message = "Distro name must be 1 to 200 characters"))]
    pub name: String,
}

impl DistroForm {
    fn check(&self) -> RelmonResult<()> {
        self.validate()
            .map_err(|e| RelmonError::Validation(e.to_string()))
    }
}

/// What a project deletion would remove
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDeletePrompt {
    pub project: Project,
    pub versions: Vec<String>,
}

/// What a version deletion would remove
#[derive(Debug, Clone, Serialize)]
pub struct VersionDeletePrompt {
    pub project: Project,
    pub version: ProjectVersion,
    pub is_latest: bool,
}

/// What a mapping deletion would remove
#[derive(Debug, Clone, Serialize)]
pub struct MappingDeletePrompt {
    pub project: Project,
    pub distro: Distro,
    pub package: Package,
}

async fn load_project(conn: &mut SqliteConnection, project_id: i64) -> RelmonResult<Project> {
    catalog::find_project(conn, project_id)
        .await?
        .ok_or_else(|| RelmonError::NotFound(format!("Project {} not found", project_id)))
}

async fn load_distro(conn: &mut SqliteConnection, name: &str) -> RelmonResult<Distro> {
    catalog::find_distro_by_name(conn, name)
        .await?
        .ok_or_else(|| RelmonError::NotFound(format!("Distro {} not found", name)))
}

async fn load_mapping(
    conn: &mut SqliteConnection,
    project_id: i64,
    distro_name: &str,
    package_name: &str,
) -> RelmonResult<(Project, Distro, Package)> {
    let project = load_project(conn, project_id).await?;
    let distro = load_distro(conn, distro_name).await?;
    let package = catalog::find_package(conn, project.id, &distro.name, package_name)
        .await?
        .ok_or_else(|| {
            RelmonError::NotFound(format!(
                "Package {} not found for project {} in {}",
                package_name, project.name, distro.name
            ))
        })?;

    Ok((project, distro, package))
}

async fn load_version(
    conn: &mut SqliteConnection,
    project_id: i64,
    version: &str,
) -> RelmonResult<(Project, ProjectVersion)> {
    let project = load_project(conn, project_id).await?;
    let found = catalog::project_versions(conn, project.id)
        .await?
        .into_iter()
        .find(|v| v.version == version);

    match found {
        Some(found) => Ok((project, found)),
        None => Err(RelmonError::NotFound(format!(
            "Version {} not found for project {}",
            version, project.name
        ))),
    }
}

/// Map a storage uniqueness rejection to a user-facing conflict
fn conflict_or(err: RelmonError, message: &str) -> RelmonError {
    if err.is_unique_violation() {
        RelmonError::Conflict(message.to_string())
    } else {
        err
    }
}

fn cancelled(operation: &str, actor: &Actor) -> RelmonResult<ActionOutcome> {
    tracing::info!("{} cancelled {}", actor.username, operation);
    metrics::record_cancelled_action(operation);
    Ok(ActionOutcome::Cancelled)
}

fn completed(message: &AuditMessage, text: String) -> RelmonResult<ActionOutcome> {
    metrics::record_moderation_action(message.topic());
    tracing::info!("{}", message.describe());
    Ok(ActionOutcome::Completed { message: text })
}

/// Moderation manager
#[derive(Clone)]
pub struct ModerationManager {
    db: SqlitePool,
}

impl ModerationManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Add a distribution. A taken name is reported as a conflict.
    pub async fn add_distro(&self, actor: &Actor, form: &DistroForm) -> RelmonResult<ActionOutcome> {
        require_admin(actor)?;
        form.check()?;

        let mut tx = db::begin_write(&self.db).await?;

        let inserted = catalog::insert_distro(&mut tx, &form.name).await;
        let distro = match inserted {
            Ok(distro) => distro,
            Err(e) => {
                tx.rollback().await?;
                let err = conflict_or(e, "Could not add this distro, already exists?");
                if matches!(err, RelmonError::Conflict(_)) {
                    tracing::warn!("Distro {} already exists", form.name);
                    metrics::record_conflict("distro.add");
                }
                return Err(err);
            }
        };

        let message = AuditMessage::DistroAdd {
            agent: actor.username.clone(),
            distro: distro.name.clone(),
        };
        audit::record(&mut tx, &message, None, Some(distro.id)).await?;

        tx.commit()
            .await
            .map_err(|e| conflict_or(e.into(), "Could not add this distro, already exists?"))?;

        completed(&message, "Distribution added".to_string())
    }

    /// Rename a distribution. Renaming to the current name writes nothing.
    pub async fn edit_distro(
        &self,
        actor: &Actor,
        distro_name: &str,
        form: &DistroForm,
    ) -> RelmonResult<ActionOutcome> {
        let mut tx = db::begin_write(&self.db).await?;

        let distro = load_distro(&mut tx, distro_name).await?;
        require_admin(actor)?;
        form.check()?;

        if form.name == distro.name {
            return Ok(ActionOutcome::Unchanged {
                message: "Nothing to change.".to_string(),
            });
        }

        let renamed = catalog::rename_distro(&mut tx, distro.id, &form.name).await;
        if let Err(e) = renamed {
            tx.rollback().await?;
            let err = conflict_or(e, &format!("Could not rename distro, {} already exists", form.name));
            if matches!(err, RelmonError::Conflict(_)) {
                tracing::warn!("Rename of {} to {} rejected: name taken", distro.name, form.name);
                metrics::record_conflict("distro.edit");
            }
            return Err(err);
        }

        let message = AuditMessage::DistroEdit {
            agent: actor.username.clone(),
            old: distro.name.clone(),
            new: form.name.clone(),
        };
        audit::record(&mut tx, &message, None, Some(distro.id)).await?;

        tx.commit().await.map_err(|e| {
            conflict_or(e.into(), &format!("Could not rename distro, {} already exists", form.name))
        })?;

        completed(&message, "Distribution edited".to_string())
    }

    /// Existence and admin checks for the distro delete page
    pub async fn distro_delete_prompt(&self, actor: &Actor, distro_name: &str) -> RelmonResult<Distro> {
        let mut conn = self.db.acquire().await?;
        let distro = load_distro(&mut conn, distro_name).await?;
        require_admin(actor)?;
        Ok(distro)
    }

    /// Delete a distribution
    pub async fn delete_distro(
        &self,
        actor: &Actor,
        distro_name: &str,
        confirm: bool,
    ) -> RelmonResult<ActionOutcome> {
        let mut tx = db::begin_write(&self.db).await?;

        let distro = load_distro(&mut tx, distro_name).await?;
        require_admin(actor)?;

        if !confirm {
            return cancelled("distro.remove", actor);
        }

        let message = AuditMessage::DistroRemove {
            agent: actor.username.clone(),
            distro: distro.name.clone(),
        };
        audit::record(&mut tx, &message, None, Some(distro.id)).await?;
        catalog::delete_distro(&mut tx, distro.id).await?;

        tx.commit().await?;

        completed(&message, format!("Distro {} has been removed", distro.name))
    }

    /// Existence and admin checks for the project delete page
    pub async fn project_delete_prompt(
        &self,
        actor: &Actor,
        project_id: i64,
    ) -> RelmonResult<ProjectDeletePrompt> {
        let mut conn = self.db.acquire().await?;
        let project = load_project(&mut conn, project_id).await?;
        require_admin(actor)?;

        let versions = catalog::project_versions(&mut conn, project.id)
            .await?
            .into_iter()
            .map(|v| v.version)
            .collect();

        Ok(ProjectDeletePrompt { project, versions })
    }

    /// Delete a project and every version it owns
    pub async fn delete_project(
        &self,
        actor: &Actor,
        project_id: i64,
        confirm: bool,
    ) -> RelmonResult<ActionOutcome> {
        let mut tx = db::begin_write(&self.db).await?;

        let project = load_project(&mut tx, project_id).await?;
        require_admin(actor)?;

        if !confirm {
            return cancelled("project.remove", actor);
        }

        let message = AuditMessage::ProjectRemove {
            agent: actor.username.clone(),
            project: project.name.clone(),
        };
        audit::record(&mut tx, &message, Some(project.id), None).await?;

        let removed = versions::remove_all_versions(&mut tx, &project).await?;
        catalog::delete_project_row(&mut tx, project.id).await?;

        tx.commit().await?;

        tracing::debug!("Removed {} versions with project {}", removed, project.name);
        completed(&message, format!("Project {} has been removed", project.name))
    }

    /// Existence and admin checks for the mapping delete page
    pub async fn mapping_delete_prompt(
        &self,
        actor: &Actor,
        project_id: i64,
        distro_name: &str,
        package_name: &str,
    ) -> RelmonResult<MappingDeletePrompt> {
        let mut conn = self.db.acquire().await?;
        let (project, distro, package) =
            load_mapping(&mut conn, project_id, distro_name, package_name).await?;
        require_admin(actor)?;

        Ok(MappingDeletePrompt {
            project,
            distro,
            package,
        })
    }

    /// Delete one project-to-distro package mapping
    pub async fn delete_project_mapping(
        &self,
        actor: &Actor,
        project_id: i64,
        distro_name: &str,
        package_name: &str,
        confirm: bool,
    ) -> RelmonResult<ActionOutcome> {
        let mut tx = db::begin_write(&self.db).await?;

        let (project, distro, package) =
            load_mapping(&mut tx, project_id, distro_name, package_name).await?;
        require_admin(actor)?;

        if !confirm {
            return cancelled("project.map.remove", actor);
        }

        let message = AuditMessage::ProjectMapRemove {
            agent: actor.username.clone(),
            project: project.name.clone(),
            distro: distro.name.clone(),
            package: package.package_name.clone(),
        };
        audit::record(&mut tx, &message, Some(project.id), Some(distro.id)).await?;
        catalog::delete_package(&mut tx, package.id).await?;

        tx.commit().await?;

        completed(&message, format!("Mapping for {} has been removed", project.name))
    }

    /// Existence and admin checks for the version delete page
    pub async fn version_delete_prompt(
        &self,
        actor: &Actor,
        project_id: i64,
        version: &str,
    ) -> RelmonResult<VersionDeletePrompt> {
        let mut conn = self.db.acquire().await?;
        let (project, version) = load_version(&mut conn, project_id, version).await?;
        require_admin(actor)?;

        let is_latest = project.latest_version.as_deref() == Some(version.version.as_str());
        Ok(VersionDeletePrompt {
            project,
            version,
            is_latest,
        })
    }

    /// Delete one version, clearing `latest_version` when it pointed there
    pub async fn delete_project_version(
        &self,
        actor: &Actor,
        project_id: i64,
        version: &str,
        confirm: bool,
    ) -> RelmonResult<ActionOutcome> {
        let mut tx = db::begin_write(&self.db).await?;

        let (project, found) = load_version(&mut tx, project_id, version).await?;
        require_admin(actor)?;

        if !confirm {
            return cancelled("project.version.remove", actor);
        }

        let message = AuditMessage::ProjectVersionRemove {
            agent: actor.username.clone(),
            project: project.name.clone(),
            version: found.version.clone(),
        };
        audit::record(&mut tx, &message, Some(project.id), None).await?;

        let removal = versions::remove_version(&mut tx, &project, &found.version).await?;
        if removal.latest_cleared {
            tracing::debug!("Cleared latest version of {}", project.name);
        }

        tx.commit().await?;

        completed(&message, format!("Version for {} has been removed", found.version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;

    fn admin() -> Actor {
        Actor::new("admin", None, true)
    }

    fn user() -> Actor {
        Actor::new("alice", Some("alice@example.org"), false)
    }

    fn form(name: &str) -> DistroForm {
        DistroForm {
            name: name.to_string(),
        }
    }

    async fn logs(pool: &SqlitePool) -> Vec<(String, String)> {
        sqlx::query_as("SELECT topic, actor FROM logs ORDER BY id")
            .fetch_all(pool)
            .await
            .unwrap()
    }

    async fn distro_names(pool: &SqlitePool) -> Vec<String> {
        sqlx::query_scalar("SELECT name FROM distros ORDER BY name")
            .fetch_all(pool)
            .await
            .unwrap()
    }

    async fn latest(pool: &SqlitePool, id: i64) -> Option<String> {
        sqlx::query_scalar("SELECT latest_version FROM projects WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_distro_records_audit() {
        let pool = test_pool().await;
        let manager = ModerationManager::new(pool.clone());

        let outcome = manager.add_distro(&admin(), &form("Fedora")).await.unwrap();
        assert_eq!(
            outcome,
            ActionOutcome::Completed {
                message: "Distribution added".to_string()
            }
        );
        assert_eq!(distro_names(&pool).await, vec!["Fedora"]);
        assert_eq!(logs(&pool).await, vec![("distro.add".to_string(), "admin".to_string())]);
    }

    #[tokio::test]
    async fn test_add_duplicate_distro_is_conflict_without_audit() {
        let pool = test_pool().await;
        seed_distro(&pool, "Fedora").await;
        let manager = ModerationManager::new(pool.clone());

        let err = manager.add_distro(&admin(), &form("Fedora")).await.unwrap_err();
        assert!(matches!(err, RelmonError::Conflict(_)));
        assert_eq!(err.to_string(), "Conflict: Could not add this distro, already exists?");
        assert_eq!(count_rows(&pool, "logs").await, 0);
        assert_eq!(count_rows(&pool, "distros").await, 1);
    }

    #[tokio::test]
    async fn test_add_distro_rejects_non_admin_and_empty_name() {
        let pool = test_pool().await;
        let manager = ModerationManager::new(pool.clone());

        assert!(matches!(
            manager.add_distro(&user(), &form("Debian")).await,
            Err(RelmonError::Authorization(_))
        ));
        assert!(matches!(
            manager.add_distro(&admin(), &form("")).await,
            Err(RelmonError::Validation(_))
        ));
        assert_eq!(count_rows(&pool, "distros").await, 0);
        assert_eq!(count_rows(&pool, "logs").await, 0);
    }

    #[tokio::test]
    async fn test_edit_distro_renames_and_audits() {
        let pool = test_pool().await;
        seed_distro(&pool, "Fedora").await;
        let manager = ModerationManager::new(pool.clone());

        manager
            .edit_distro(&admin(), "Fedora", &form("Fedora Linux"))
            .await
            .unwrap();

        assert_eq!(distro_names(&pool).await, vec!["Fedora Linux"]);
        assert_eq!(logs(&pool).await, vec![("distro.edit".to_string(), "admin".to_string())]);

        let message: String = sqlx::query_scalar("SELECT message FROM logs")
            .fetch_one(&pool)
            .await
            .unwrap();
        let message: AuditMessage = serde_json::from_str(&message).unwrap();
        assert_eq!(
            message,
            AuditMessage::DistroEdit {
                agent: "admin".to_string(),
                old: "Fedora".to_string(),
                new: "Fedora Linux".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_edit_distro_same_name_is_unchanged() {
        let pool = test_pool().await;
        seed_distro(&pool, "Fedora").await;
        let manager = ModerationManager::new(pool.clone());

        let outcome = manager.edit_distro(&admin(), "Fedora", &form("Fedora")).await.unwrap();
        assert!(matches!(outcome, ActionOutcome::Unchanged { .. }));
        assert_eq!(count_rows(&pool, "logs").await, 0);
    }

    #[tokio::test]
    async fn test_rename_to_taken_name_is_conflict() {
        let pool = test_pool().await;
        seed_distro(&pool, "Fedora").await;
        seed_distro(&pool, "Debian").await;
        let manager = ModerationManager::new(pool.clone());

        let err = manager
            .edit_distro(&admin(), "Fedora", &form("Debian"))
            .await
            .unwrap_err();

        assert!(matches!(err, RelmonError::Conflict(_)));
        assert_eq!(distro_names(&pool).await, vec!["Debian", "Fedora"]);
        assert_eq!(count_rows(&pool, "logs").await, 0);
    }

    #[tokio::test]
    async fn test_edit_missing_distro_is_not_found_before_admin_check() {
        let pool = test_pool().await;
        let manager = ModerationManager::new(pool.clone());

        assert!(matches!(
            manager.edit_distro(&user(), "Nope", &form("x")).await,
            Err(RelmonError::NotFound(_))
        ));

        seed_distro(&pool, "Fedora").await;
        assert!(matches!(
            manager.edit_distro(&user(), "Fedora", &form("x")).await,
            Err(RelmonError::Authorization(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_distro_requires_confirmation() {
        let pool = test_pool().await;
        seed_distro(&pool, "Fedora").await;
        let manager = ModerationManager::new(pool.clone());

        let prompt = manager.distro_delete_prompt(&admin(), "Fedora").await.unwrap();
        assert_eq!(prompt.name, "Fedora");

        let outcome = manager.delete_distro(&admin(), "Fedora", false).await.unwrap();
        assert_eq!(outcome, ActionOutcome::Cancelled);
        assert_eq!(count_rows(&pool, "distros").await, 1);
        assert_eq!(count_rows(&pool, "logs").await, 0);

        manager.delete_distro(&admin(), "Fedora", true).await.unwrap();
        assert_eq!(count_rows(&pool, "distros").await, 0);
        assert_eq!(logs(&pool).await, vec![("distro.remove".to_string(), "admin".to_string())]);
    }

    #[tokio::test]
    async fn test_delete_project_removes_versions() {
        let pool = test_pool().await;
        seed_distro(&pool, "Fedora").await;
        let project = seed_project(&pool, "foo", &["1.0", "2.0"], Some("2.0")).await;
        let other = seed_project(&pool, "bar", &["0.1"], Some("0.1")).await;
        seed_package(&pool, project.id, "Fedora", "python-foo").await;
        let manager = ModerationManager::new(pool.clone());

        let prompt = manager.project_delete_prompt(&admin(), project.id).await.unwrap();
        assert_eq!(prompt.project.name, "foo");
        assert_eq!(prompt.versions.len(), 2);

        let outcome = manager.delete_project(&admin(), project.id, true).await.unwrap();
        assert_eq!(
            outcome,
            ActionOutcome::Completed {
                message: "Project foo has been removed".to_string()
            }
        );

        let orphans: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM project_versions WHERE project_id = ?")
                .bind(project.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(orphans, 0);
        assert_eq!(count_rows(&pool, "projects").await, 1);
        assert_eq!(count_rows(&pool, "packages").await, 0);
        assert_eq!(latest(&pool, other.id).await.as_deref(), Some("0.1"));
        assert_eq!(logs(&pool).await, vec![("project.remove".to_string(), "admin".to_string())]);

        // history outlives the project
        let project_ref: Option<i64> = sqlx::query_scalar("SELECT project_id FROM logs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(project_ref, Some(project.id));
    }

    #[tokio::test]
    async fn test_unconfirmed_project_delete_is_cancelled() {
        let pool = test_pool().await;
        let project = seed_project(&pool, "foo", &["1.0"], Some("1.0")).await;
        let manager = ModerationManager::new(pool.clone());

        let outcome = manager.delete_project(&admin(), project.id, false).await.unwrap();
        assert_eq!(outcome, ActionOutcome::Cancelled);
        assert_eq!(count_rows(&pool, "projects").await, 1);
        assert_eq!(count_rows(&pool, "project_versions").await, 1);
        assert_eq!(count_rows(&pool, "logs").await, 0);
    }

    #[tokio::test]
    async fn test_delete_project_checks() {
        let pool = test_pool().await;
        let project = seed_project(&pool, "foo", &[], None).await;
        let manager = ModerationManager::new(pool.clone());

        assert!(matches!(
            manager.delete_project(&admin(), project.id + 100, true).await,
            Err(RelmonError::NotFound(_))
        ));
        assert!(matches!(
            manager.delete_project(&user(), project.id, true).await,
            Err(RelmonError::Authorization(_))
        ));
        assert!(matches!(
            manager.project_delete_prompt(&user(), project.id).await,
            Err(RelmonError::Authorization(_))
        ));
        assert_eq!(count_rows(&pool, "projects").await, 1);
    }

    #[tokio::test]
    async fn test_delete_latest_version_clears_pointer() {
        let pool = test_pool().await;
        let project = seed_project(&pool, "foo", &["1.0", "2.0"], Some("2.0")).await;
        let manager = ModerationManager::new(pool.clone());

        let prompt = manager
            .version_delete_prompt(&admin(), project.id, "2.0")
            .await
            .unwrap();
        assert!(prompt.is_latest);

        manager
            .delete_project_version(&admin(), project.id, "2.0", true)
            .await
            .unwrap();

        assert_eq!(latest(&pool, project.id).await, None);
        assert_eq!(
            logs(&pool).await,
            vec![("project.version.remove".to_string(), "admin".to_string())]
        );
    }

    #[tokio::test]
    async fn test_delete_other_version_keeps_pointer() {
        let pool = test_pool().await;
        let project = seed_project(&pool, "foo", &["1.0", "2.0"], Some("2.0")).await;
        let manager = ModerationManager::new(pool.clone());

        manager
            .delete_project_version(&admin(), project.id, "1.0", true)
            .await
            .unwrap();

        assert_eq!(latest(&pool, project.id).await.as_deref(), Some("2.0"));
        assert_eq!(count_rows(&pool, "project_versions").await, 1);
        assert_eq!(count_rows(&pool, "logs").await, 1);
    }

    #[tokio::test]
    async fn test_delete_unknown_version_is_scoped_not_found() {
        let pool = test_pool().await;
        let project = seed_project(&pool, "foo", &["1.0"], Some("1.0")).await;
        let manager = ModerationManager::new(pool.clone());

        let err = manager
            .delete_project_version(&admin(), project.id, "1.0.0", true)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Not found: Version 1.0.0 not found for project foo");

        let outcome = manager
            .delete_project_version(&admin(), project.id, "1.0", false)
            .await
            .unwrap();
        assert_eq!(outcome, ActionOutcome::Cancelled);
        assert_eq!(count_rows(&pool, "project_versions").await, 1);
        assert_eq!(count_rows(&pool, "logs").await, 0);
    }

    #[tokio::test]
    async fn test_delete_mapping() {
        let pool = test_pool().await;
        seed_distro(&pool, "Debian").await;
        let project = seed_project(&pool, "foo", &[], None).await;
        seed_package(&pool, project.id, "Debian", "python-foo").await;
        seed_package(&pool, project.id, "Debian", "python3-foo").await;
        let manager = ModerationManager::new(pool.clone());

        let prompt = manager
            .mapping_delete_prompt(&admin(), project.id, "Debian", "python-foo")
            .await
            .unwrap();
        assert_eq!(prompt.package.package_name, "python-foo");

        let outcome = manager
            .delete_project_mapping(&admin(), project.id, "Debian", "python-foo", false)
            .await
            .unwrap();
        assert_eq!(outcome, ActionOutcome::Cancelled);
        assert_eq!(count_rows(&pool, "packages").await, 2);

        manager
            .delete_project_mapping(&admin(), project.id, "Debian", "python-foo", true)
            .await
            .unwrap();
        assert_eq!(count_rows(&pool, "packages").await, 1);
        assert_eq!(
            logs(&pool).await,
            vec![("project.map.remove".to_string(), "admin".to_string())]
        );
    }

    #[tokio::test]
    async fn test_delete_mapping_lookups_precede_admin_check() {
        let pool = test_pool().await;
        seed_distro(&pool, "Debian").await;
        let project = seed_project(&pool, "foo", &[], None).await;
        seed_package(&pool, project.id, "Debian", "python-foo").await;
        let manager = ModerationManager::new(pool.clone());

        for (distro, package) in [("Arch", "python-foo"), ("Debian", "foo")] {
            assert!(matches!(
                manager
                    .delete_project_mapping(&user(), project.id, distro, package, true)
                    .await,
                Err(RelmonError::NotFound(_))
            ));
        }
        assert!(matches!(
            manager
                .delete_project_mapping(&user(), project.id, "Debian", "python-foo", true)
                .await,
            Err(RelmonError::Authorization(_))
        ));
        assert_eq!(count_rows(&pool, "packages").await, 1);
    }
}
