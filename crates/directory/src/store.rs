//! Persistence contract for employees and their paired users.

use std::sync::Arc;

use async_trait::async_trait;

use hcm_core::{EmployeeId, ExpectedVersion};

use crate::error::StoreError;
use crate::model::{Employee, EmployeeProfile, NewUser, User};

/// Employee + user storage.
///
/// Reads are plain lookups. The three writes each touch an employee and its
/// paired user together and must be atomic: either both halves are visible
/// afterwards or neither is.
///
/// Implementations must:
/// - assign ids on insert and start employees at version 1
/// - enforce unique employee email, unique user email, unique username
///   (reporting [`StoreError::Duplicate`])
/// - reject an employee update or delete whose version does not match
///   `expected` (reporting [`StoreError::Conflict`])
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn employee(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError>;

    async fn employees(&self) -> Result<Vec<Employee>, StoreError>;

    async fn employees_in_department(&self, department: &str) -> Result<Vec<Employee>, StoreError>;

    async fn employee_by_email(&self, email: &str) -> Result<Option<Employee>, StoreError>;

    async fn employee_count(&self) -> Result<usize, StoreError>;

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// The employee whose paired user carries `username` (email join).
    async fn employee_for_username(&self, username: &str) -> Result<Option<Employee>, StoreError> {
        match self.user_by_username(username).await? {
            Some(user) => self.employee_by_email(&user.email).await,
            None => Ok(None),
        }
    }

    /// Insert an employee and its paired user in one unit of work.
    async fn insert_pair(
        &self,
        profile: EmployeeProfile,
        user: NewUser,
    ) -> Result<(Employee, User), StoreError>;

    /// Overwrite an employee (and, when given, its paired user by id).
    ///
    /// Returns the stored employee with its version bumped.
    async fn update_pair(
        &self,
        employee: &Employee,
        expected: ExpectedVersion,
        user: Option<&User>,
    ) -> Result<Employee, StoreError>;

    /// Remove an employee and any user sharing the email of the removed row.
    ///
    /// Returns `false` when the employee was already gone.
    async fn delete_pair(
        &self,
        id: EmployeeId,
        expected: ExpectedVersion,
    ) -> Result<bool, StoreError>;
}

#[async_trait]
impl<S> DirectoryStore for Arc<S>
where
    S: DirectoryStore + ?Sized,
{
    async fn employee(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        (**self).employee(id).await
    }

    async fn employees(&self) -> Result<Vec<Employee>, StoreError> {
        (**self).employees().await
    }

    async fn employees_in_department(&self, department: &str) -> Result<Vec<Employee>, StoreError> {
        (**self).employees_in_department(department).await
    }

    async fn employee_by_email(&self, email: &str) -> Result<Option<Employee>, StoreError> {
        (**self).employee_by_email(email).await
    }

    async fn employee_count(&self) -> Result<usize, StoreError> {
        (**self).employee_count().await
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        (**self).user_by_username(username).await
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        (**self).user_by_email(email).await
    }

    async fn employee_for_username(&self, username: &str) -> Result<Option<Employee>, StoreError> {
        (**self).employee_for_username(username).await
    }

    async fn insert_pair(
        &self,
        profile: EmployeeProfile,
        user: NewUser,
    ) -> Result<(Employee, User), StoreError> {
        (**self).insert_pair(profile, user).await
    }

    async fn update_pair(
        &self,
        employee: &Employee,
        expected: ExpectedVersion,
        user: Option<&User>,
    ) -> Result<Employee, StoreError> {
        (**self).update_pair(employee, expected, user).await
    }

    async fn delete_pair(
        &self,
        id: EmployeeId,
        expected: ExpectedVersion,
    ) -> Result<bool, StoreError> {
        (**self).delete_pair(id, expected).await
    }
}
