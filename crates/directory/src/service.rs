//! Directory operations.
//!
//! Every call runs the same pipeline, sequentially and with nothing cached
//! between calls:
//!
//! 1. shape-check the input
//! 2. role gate through the permission matrix
//! 3. load the target (if any); absent targets are `NotFound`
//! 4. derive the caller's [`AccessScope`] and check the request against it
//! 5. read/write through the store, keeping the paired user in sync
//!
//! Writes against a loaded target carry the version that was read, so a
//! target changed in between is never written under a stale decision.

use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use hcm_auth::{Permission, PasswordHasher, Principal, Role, authorize};
use hcm_core::{EmployeeId, ExpectedVersion};

use crate::error::{DirectoryError, DirectoryResult, StoreError};
use crate::model::{Employee, EmployeeProfile, NewEmployee, User};
use crate::policy::{AccessScope, department_listing};
use crate::store::DirectoryStore;
use crate::sync::{paired_user, resync};

/// Instruction for the session subsystem: the caller's own account changed,
/// install fresh claims for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimsRefresh {
    pub username: String,
    pub role: Role,
}

/// Result of a successful update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub employee: Employee,
    /// The synced paired user, when one existed.
    pub user: Option<User>,
    pub claims_refresh: Option<ClaimsRefresh>,
}

/// The access-control and consistency engine over a [`DirectoryStore`].
pub struct DirectoryService<S> {
    store: S,
    hasher: Arc<dyn PasswordHasher>,
}

impl<S> DirectoryService<S>
where
    S: DirectoryStore,
{
    pub fn new(store: S, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { store, hasher }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[instrument(skip_all, fields(caller = %principal.username(), role = %principal.role()))]
    pub async fn list_employees(&self, principal: &Principal) -> DirectoryResult<Vec<Employee>> {
        permit(principal, Permission::ListEmployees)?;

        match AccessScope::resolve(&self.store, principal).await? {
            AccessScope::Directory => Ok(self.store.employees().await?),
            AccessScope::Department { manager } => {
                let people = self.store.employees_in_department(&manager.department).await?;
                Ok(department_listing(&manager.department, people))
            }
            AccessScope::Own { employee } => Ok(vec![employee]),
        }
    }

    /// `HRAdmin` and `Manager` callers read any record without being resolved.
    #[instrument(
        skip_all,
        fields(caller = %principal.username(), role = %principal.role(), employee_id = %id)
    )]
    pub async fn get_employee(
        &self,
        id: EmployeeId,
        principal: &Principal,
    ) -> DirectoryResult<Employee> {
        permit(principal, Permission::ReadEmployee)?;

        let target = self.load(id).await?;
        if principal.role() == Role::Employee {
            let scope = AccessScope::resolve(&self.store, principal).await?;
            scope.check_read(&target).inspect_err(log_denial)?;
        }

        Ok(target)
    }

    #[instrument(skip_all, fields(caller = %principal.username(), role = %principal.role()))]
    pub async fn create_employee(
        &self,
        input: NewEmployee,
        principal: &Principal,
    ) -> DirectoryResult<Employee> {
        permit(principal, Permission::CreateEmployee)?;
        let input = input.normalized()?;

        let scope = AccessScope::resolve(&self.store, principal).await?;
        scope
            .check_assign(&input.profile, "create")
            .inspect_err(log_denial)?;

        let (employee, user) = self.insert(input).await?;
        tracing::info!(
            employee_id = %employee.id,
            username = %user.username,
            department = %employee.department,
            "employee created"
        );
        Ok(employee)
    }

    /// Replace every mutable field of `id` with `profile`.
    ///
    /// The paired user is located by the employee's email *before* the
    /// update; a missing user is tolerated. When that user is the caller's
    /// own account the outcome carries a [`ClaimsRefresh`].
    #[instrument(
        skip_all,
        fields(caller = %principal.username(), role = %principal.role(), employee_id = %id)
    )]
    pub async fn update_employee(
        &self,
        id: EmployeeId,
        profile: EmployeeProfile,
        principal: &Principal,
    ) -> DirectoryResult<UpdateOutcome> {
        permit(principal, Permission::UpdateEmployee)?;
        let profile = profile.normalized()?;

        let existing = self.load(id).await?;
        let scope = AccessScope::resolve(&self.store, principal).await?;
        scope.check_assign(&profile, "update").inspect_err(log_denial)?;

        let expected = ExpectedVersion::Exact(existing.version);
        let paired = self.store.user_by_email(&existing.email).await?;
        let updated = existing.with_profile(profile);

        let own_account = paired
            .as_ref()
            .is_some_and(|user| user.username == principal.username());
        let user = paired.map(|user| resync(user, &updated));

        let employee = match self.store.update_pair(&updated, expected, user.as_ref()).await {
            Ok(employee) => employee,
            Err(StoreError::Conflict(reason)) => {
                return Err(self.classify_conflict(id, reason).await);
            }
            Err(err) => return Err(err.into()),
        };

        let claims_refresh = user
            .as_ref()
            .filter(|_| own_account)
            .map(|user| ClaimsRefresh {
                username: user.username.clone(),
                role: user.role,
            });

        tracing::info!(
            employee_id = %employee.id,
            version = employee.version,
            user_synced = user.is_some(),
            claims_refresh = claims_refresh.is_some(),
            "employee updated"
        );

        Ok(UpdateOutcome {
            employee,
            user,
            claims_refresh,
        })
    }

    /// Remove `id` and its paired user.
    ///
    /// The delete only goes through if the record still has the version the
    /// policy check saw; otherwise it fails like a conflicting update.
    #[instrument(
        skip_all,
        fields(caller = %principal.username(), role = %principal.role(), employee_id = %id)
    )]
    pub async fn delete_employee(
        &self,
        id: EmployeeId,
        principal: &Principal,
    ) -> DirectoryResult<()> {
        permit(principal, Permission::DeleteEmployee)?;

        let target = self.load(id).await?;
        let scope = AccessScope::resolve(&self.store, principal).await?;
        scope.check_delete(&target).inspect_err(log_denial)?;

        let expected = ExpectedVersion::Exact(target.version);
        match self.store.delete_pair(id, expected).await {
            Ok(true) => {}
            Ok(false) => return Err(DirectoryError::NotFound),
            Err(StoreError::Conflict(reason)) => {
                return Err(self.classify_conflict(id, reason).await);
            }
            Err(err) => return Err(err.into()),
        }

        tracing::info!(employee_id = %id, department = %target.department, "employee deleted");
        Ok(())
    }

    /// Verify a username/password pair and return the principal it names.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> DirectoryResult<Principal> {
        let Some(user) = self.store.user_by_username(username.trim()).await? else {
            tracing::debug!("unknown username");
            return Err(DirectoryError::InvalidCredentials);
        };

        if !self.hasher.verify(&user.credential, password) {
            tracing::debug!("password mismatch");
            return Err(DirectoryError::InvalidCredentials);
        }

        Ok(Principal::new(user.username, user.role))
    }

    /// Seed an `HRAdmin` (and paired user) into an empty directory.
    ///
    /// Bypasses policy. Returns `None` without writing when any employee
    /// already exists.
    #[instrument(skip_all)]
    pub async fn bootstrap_admin(&self, input: NewEmployee) -> DirectoryResult<Option<Employee>> {
        if self.store.employee_count().await? > 0 {
            tracing::debug!("directory not empty; skipping admin bootstrap");
            return Ok(None);
        }

        let mut input = input.normalized()?;
        input.profile.role = Role::HrAdmin;

        let (employee, user) = self.insert(input).await?;
        tracing::info!(
            employee_id = %employee.id,
            username = %user.username,
            "bootstrap administrator created"
        );
        Ok(Some(employee))
    }

    async fn load(&self, id: EmployeeId) -> DirectoryResult<Employee> {
        self.store
            .employee(id)
            .await?
            .ok_or(DirectoryError::NotFound)
    }

    async fn insert(&self, input: NewEmployee) -> DirectoryResult<(Employee, User)> {
        let credential = self.hasher.hash(&input.password)?;
        let user = paired_user(&input.profile, credential);
        Ok(self.store.insert_pair(input.profile, user).await?)
    }

    /// A write conflict is only retryable if the target still exists.
    ///
    /// Re-checked exactly once; the caller decides whether to retry.
    async fn classify_conflict(&self, id: EmployeeId, reason: String) -> DirectoryError {
        match self.store.employee(id).await {
            Ok(Some(_)) => {
                tracing::debug!(%reason, "concurrent modification");
                DirectoryError::Conflict(reason)
            }
            Ok(None) => DirectoryError::NotFound,
            Err(err) => err.into(),
        }
    }
}

fn permit(principal: &Principal, permission: Permission) -> DirectoryResult<()> {
    authorize(principal, permission)
        .map_err(DirectoryError::from)
        .inspect_err(log_denial)
}

fn log_denial(err: &DirectoryError) {
    tracing::debug!(error = %err, "request denied");
}
