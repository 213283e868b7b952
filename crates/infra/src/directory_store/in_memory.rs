use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use hcm_core::{EmployeeId, ExpectedVersion, UserId};
use hcm_directory::{DirectoryStore, Employee, EmployeeProfile, NewUser, StoreError, User};

#[derive(Debug, Default)]
struct Tables {
    employees: HashMap<EmployeeId, Employee>,
    users: HashMap<UserId, User>,
}

impl Tables {
    fn employee_email_taken(&self, email: &str, except: Option<EmployeeId>) -> bool {
        self.employees
            .values()
            .any(|e| e.email == email && Some(e.id) != except)
    }

    fn username_taken(&self, username: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }

    fn user_email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

fn duplicate(field: &'static str, value: &str) -> StoreError {
    StoreError::Duplicate {
        field,
        value: value.to_string(),
    }
}

/// In-memory directory store.
///
/// Intended for tests/dev. Both tables sit behind one lock, so every pair
/// write is atomic with respect to readers.
#[derive(Debug, Default)]
pub struct InMemoryDirectoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryDirectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

#[async_trait]
impl DirectoryStore for InMemoryDirectoryStore {
    async fn employee(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        Ok(self.read()?.employees.get(&id).cloned())
    }

    async fn employees(&self) -> Result<Vec<Employee>, StoreError> {
        let mut all: Vec<_> = self.read()?.employees.values().cloned().collect();
        all.sort_by_key(|e| *e.id.as_uuid());
        Ok(all)
    }

    async fn employees_in_department(&self, department: &str) -> Result<Vec<Employee>, StoreError> {
        let mut found: Vec<_> = self
            .read()?
            .employees
            .values()
            .filter(|e| e.department == department)
            .cloned()
            .collect();
        found.sort_by_key(|e| *e.id.as_uuid());
        Ok(found)
    }

    async fn employee_by_email(&self, email: &str) -> Result<Option<Employee>, StoreError> {
        Ok(self
            .read()?
            .employees
            .values()
            .find(|e| e.email == email)
            .cloned())
    }

    async fn employee_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.employees.len())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn employee_for_username(&self, username: &str) -> Result<Option<Employee>, StoreError> {
        // Single read guard so the join sees one consistent snapshot.
        let tables = self.read()?;
        let Some(user) = tables.users.values().find(|u| u.username == username) else {
            return Ok(None);
        };
        Ok(tables
            .employees
            .values()
            .find(|e| e.email == user.email)
            .cloned())
    }

    async fn insert_pair(
        &self,
        profile: EmployeeProfile,
        user: NewUser,
    ) -> Result<(Employee, User), StoreError> {
        let mut tables = self.write()?;

        if tables.employee_email_taken(&profile.email, None) {
            return Err(duplicate("email", &profile.email));
        }
        if tables.username_taken(&user.username, None) {
            return Err(duplicate("username", &user.username));
        }
        if tables.user_email_taken(&user.email, None) {
            return Err(duplicate("email", &user.email));
        }

        let employee = Employee::from_profile(EmployeeId::new(), 1, profile);
        let user = user.into_user(UserId::new());

        tables.employees.insert(employee.id, employee.clone());
        tables.users.insert(user.id, user.clone());

        Ok((employee, user))
    }

    async fn update_pair(
        &self,
        employee: &Employee,
        expected: ExpectedVersion,
        user: Option<&User>,
    ) -> Result<Employee, StoreError> {
        let mut tables = self.write()?;

        let current = tables
            .employees
            .get(&employee.id)
            .map(|e| e.version)
            .ok_or_else(|| {
                StoreError::Conflict(format!("employee {} no longer exists", employee.id))
            })?;
        expected
            .check(current)
            .map_err(|e| StoreError::Conflict(e.to_string()))?;

        if tables.employee_email_taken(&employee.email, Some(employee.id)) {
            return Err(duplicate("email", &employee.email));
        }
        if let Some(user) = user {
            if !tables.users.contains_key(&user.id) {
                return Err(StoreError::Conflict(format!("user {} no longer exists", user.id)));
            }
            if tables.username_taken(&user.username, Some(user.id)) {
                return Err(duplicate("username", &user.username));
            }
            if tables.user_email_taken(&user.email, Some(user.id)) {
                return Err(duplicate("email", &user.email));
            }
        }

        let stored = Employee {
            version: current + 1,
            ..employee.clone()
        };
        tables.employees.insert(stored.id, stored.clone());
        if let Some(user) = user {
            tables.users.insert(user.id, user.clone());
        }

        Ok(stored)
    }

    async fn delete_pair(
        &self,
        id: EmployeeId,
        expected: ExpectedVersion,
    ) -> Result<bool, StoreError> {
        let mut tables = self.write()?;

        let Some(current) = tables.employees.get(&id).map(|e| e.version) else {
            return Ok(false);
        };
        expected
            .check(current)
            .map_err(|e| StoreError::Conflict(e.to_string()))?;

        if let Some(removed) = tables.employees.remove(&id) {
            tables.users.retain(|_, u| u.email != removed.email);
        }

        Ok(true)
    }
}
