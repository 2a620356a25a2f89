//! # Employee Repository
//!
//! Employee records and the eligibility counts used for participation.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select, Set,
};
use uuid::Uuid;

use crate::dashboard::OrgScope;
use crate::demo::OrgPlacement;
use crate::error::RepositoryError;
use crate::models::Employee;
use crate::models::employee::{ActiveModel as EmployeeActiveModel, Column, Model as EmployeeModel};

/// Data for a new employee
#[derive(Debug, Clone, Default)]
pub struct NewEmployee {
    pub first_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub placement: OrgPlacement,
}

/// Repository for Employee database operations
pub struct EmployeeRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> EmployeeRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        client_id: Uuid,
        employee: NewEmployee,
    ) -> Result<EmployeeModel, RepositoryError> {
        EmployeeActiveModel {
            id: Set(Uuid::new_v4()),
            client_id: Set(client_id),
            division_id: Set(employee.placement.division_id),
            department_id: Set(employee.placement.department_id),
            team_id: Set(employee.placement.team_id),
            first_name: Set(employee.first_name),
            phone: Set(employee.phone),
            email: Set(employee.email),
            active: Set(true),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<EmployeeModel>, RepositoryError> {
        Employee::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Active employees of the client inside `scope`
    pub async fn count_eligible(
        &self,
        client_id: Uuid,
        scope: OrgScope,
    ) -> Result<u64, RepositoryError> {
        scoped(active_for_client(client_id), scope)
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Active employees of the client, oldest first
    pub async fn list_active(&self, client_id: Uuid) -> Result<Vec<EmployeeModel>, RepositoryError> {
        active_for_client(client_id)
            .order_by_asc(Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}

fn active_for_client(client_id: Uuid) -> Select<Employee> {
    Employee::find()
        .filter(Column::ClientId.eq(client_id))
        .filter(Column::Active.eq(true))
}

fn scoped(query: Select<Employee>, scope: OrgScope) -> Select<Employee> {
    match scope {
        OrgScope::All => query,
        OrgScope::Division(id) => query.filter(Column::DivisionId.eq(id)),
        OrgScope::Department(id) => query.filter(Column::DepartmentId.eq(id)),
        OrgScope::Team(id) => query.filter(Column::TeamId.eq(id)),
    }
}
