//! # Organisation Repository
//!
//! Idempotent setup of the division / department / team hierarchy. Each name
//! is looked up under its parent and reused when present, so running the same
//! setup twice creates nothing new.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::demo::OrgPlacement;
use crate::error::RepositoryError;
use crate::models::{Department, Division, Team, department, division, team};

/// Names to create. Every division gets every department, and every
/// department gets every team.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct HierarchyPlan {
    pub divisions: Vec<String>,
    pub departments_per_division: Vec<String>,
    pub teams_per_department: Vec<String>,
}

/// Created versus reused counts for one level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LevelOutcome {
    pub created: u32,
    pub reused: u32,
}

impl LevelOutcome {
    fn record(&mut self, created: bool) {
        if created {
            self.created += 1;
        } else {
            self.reused += 1;
        }
    }
}

/// Result of a hierarchy setup run. Failures are collected, not fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HierarchyOutcome {
    pub divisions: LevelOutcome,
    pub departments: LevelOutcome,
    pub teams: LevelOutcome,
    pub errors: Vec<String>,
}

/// Repository for org hierarchy operations
pub struct OrganisationRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> OrganisationRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create or reuse every unit named in `plan`
    pub async fn setup_hierarchy(
        &self,
        client_id: Uuid,
        plan: &HierarchyPlan,
    ) -> Result<HierarchyOutcome, RepositoryError> {
        validate_plan(plan)?;
        let mut outcome = HierarchyOutcome::default();

        for division_name in clean_names(&plan.divisions) {
            let division_id = match self.ensure_division(client_id, division_name).await {
                Ok((id, created)) => {
                    outcome.divisions.record(created);
                    id
                }
                Err(error) => {
                    outcome
                        .errors
                        .push(format!("division '{}': {}", division_name, error));
                    continue;
                }
            };

            for department_name in clean_names(&plan.departments_per_division) {
                let key = format!("{}:{}", division_name, department_name);
                let department_id = match self.ensure_department(division_id, department_name).await
                {
                    Ok((id, created)) => {
                        outcome.departments.record(created);
                        id
                    }
                    Err(error) => {
                        outcome.errors.push(format!("department '{}': {}", key, error));
                        continue;
                    }
                };

                for team_name in clean_names(&plan.teams_per_department) {
                    match self.ensure_team(department_id, team_name).await {
                        Ok((_, created)) => outcome.teams.record(created),
                        Err(error) => outcome
                            .errors
                            .push(format!("team '{}:{}': {}", key, team_name, error)),
                    }
                }
            }
        }

        tracing::info!(
            client_id = %client_id,
            divisions_created = outcome.divisions.created,
            departments_created = outcome.departments.created,
            teams_created = outcome.teams.created,
            errors = outcome.errors.len(),
            "Hierarchy setup finished"
        );

        Ok(outcome)
    }

    async fn ensure_division(&self, client_id: Uuid, name: &str) -> Result<(Uuid, bool), RepositoryError> {
        let existing = Division::find()
            .filter(division::Column::ClientId.eq(client_id))
            .filter(division::Column::Name.eq(name))
            .one(self.db)
            .await?;
        if let Some(existing) = existing {
            return Ok((existing.id, false));
        }

        let created = division::ActiveModel {
            id: Set(Uuid::new_v4()),
            client_id: Set(client_id),
            name: Set(name.to_string()),
            active: Set(true),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.db)
        .await?;
        Ok((created.id, true))
    }

    async fn ensure_department(&self, division_id: Uuid, name: &str) -> Result<(Uuid, bool), RepositoryError> {
        let existing = Department::find()
            .filter(department::Column::DivisionId.eq(division_id))
            .filter(department::Column::Name.eq(name))
            .one(self.db)
            .await?;
        if let Some(existing) = existing {
            return Ok((existing.id, false));
        }

        let created = department::ActiveModel {
            id: Set(Uuid::new_v4()),
            division_id: Set(division_id),
            name: Set(name.to_string()),
            active: Set(true),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.db)
        .await?;
        Ok((created.id, true))
    }

    async fn ensure_team(&self, department_id: Uuid, name: &str) -> Result<(Uuid, bool), RepositoryError> {
        let existing = Team::find()
            .filter(team::Column::DepartmentId.eq(department_id))
            .filter(team::Column::Name.eq(name))
            .one(self.db)
            .await?;
        if let Some(existing) = existing {
            return Ok((existing.id, false));
        }

        let created = team::ActiveModel {
            id: Set(Uuid::new_v4()),
            department_id: Set(department_id),
            name: Set(name.to_string()),
            active: Set(true),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.db)
        .await?;
        Ok((created.id, true))
    }

    /// Every active team of the client with its department and division
    pub async fn list_placements(&self, client_id: Uuid) -> Result<Vec<OrgPlacement>, RepositoryError> {
        let divisions = Division::find()
            .filter(division::Column::ClientId.eq(client_id))
            .filter(division::Column::Active.eq(true))
            .order_by_asc(division::Column::Name)
            .all(self.db)
            .await?;
        if divisions.is_empty() {
            return Ok(Vec::new());
        }

        let departments = Department::find()
            .filter(department::Column::DivisionId.is_in(divisions.iter().map(|d| d.id)))
            .filter(department::Column::Active.eq(true))
            .order_by_asc(department::Column::Name)
            .all(self.db)
            .await?;
        if departments.is_empty() {
            return Ok(Vec::new());
        }

        let teams = Team::find()
            .filter(team::Column::DepartmentId.is_in(departments.iter().map(|d| d.id)))
            .filter(team::Column::Active.eq(true))
            .order_by_asc(team::Column::Name)
            .all(self.db)
            .await?;

        Ok(teams
            .into_iter()
            .filter_map(|team| {
                let department = departments.iter().find(|d| d.id == team.department_id)?;
                Some(OrgPlacement {
                    division_id: Some(department.division_id),
                    department_id: Some(department.id),
                    team_id: Some(team.id),
                })
            })
            .collect())
    }

    /// Resolve a team's department and division, for stamping onto records.
    /// Teams belonging to another client resolve to `None`.
    pub async fn placement_for_team(
        &self,
        client_id: Uuid,
        team_id: Uuid,
    ) -> Result<Option<OrgPlacement>, RepositoryError> {
        let Some(team) = Team::find_by_id(team_id).one(self.db).await? else {
            return Ok(None);
        };
        let Some(department) = Department::find_by_id(team.department_id).one(self.db).await? else {
            return Ok(None);
        };
        let owned = Division::find_by_id(department.division_id)
            .one(self.db)
            .await?
            .is_some_and(|division| division.client_id == client_id);
        if !owned {
            return Ok(None);
        }

        Ok(Some(OrgPlacement {
            division_id: Some(department.division_id),
            department_id: Some(department.id),
            team_id: Some(team.id),
        }))
    }
}

fn clean_names(names: &[String]) -> impl Iterator<Item = &str> {
    let mut seen = Vec::new();
    names.iter().map(|n| n.trim()).filter(move |name| {
        if name.is_empty() || seen.contains(name) {
            false
        } else {
            seen.push(*name);
            true
        }
    })
}

fn validate_plan(plan: &HierarchyPlan) -> Result<(), RepositoryError> {
    if clean_names(&plan.divisions).next().is_none() {
        return Err(RepositoryError::validation_error(
            "At least one division name is required",
        ));
    }
    if let Some(name) = plan
        .divisions
        .iter()
        .chain(&plan.departments_per_division)
        .chain(&plan.teams_per_department)
        .find(|name| name.trim().chars().count() > 200)
    {
        return Err(RepositoryError::validation_error(format!(
            "Name '{}...' exceeds 200 characters",
            name.chars().take(20).collect::<String>()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_names_trims_and_dedupes() {
        let names = vec![
            " Ops ".to_string(),
            "Ops".to_string(),
            "".to_string(),
            "Sales".to_string(),
        ];
        let cleaned: Vec<&str> = clean_names(&names).collect();
        assert_eq!(cleaned, vec!["Ops", "Sales"]);
    }

    #[test]
    fn plan_requires_a_division() {
        let plan = HierarchyPlan {
            divisions: vec!["  ".to_string()],
            ..Default::default()
        };
        assert!(matches!(validate_plan(&plan), Err(RepositoryError::Validation(_))));
    }
}
