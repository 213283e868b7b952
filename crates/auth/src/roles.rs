use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Permission;

/// Directory role carried by every principal and mirrored on every user.
///
/// The set is closed: these three names are the only ones the directory
/// recognises, both in session claims and in stored records.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Human-resources administrator: unrestricted across departments.
    #[serde(rename = "HRAdmin")]
    HrAdmin,
    /// Department manager: scoped to their own department.
    Manager,
    /// Regular employee: scoped to their own record.
    Employee,
}

const HR_ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::ListEmployees,
    Permission::ReadEmployee,
    Permission::CreateEmployee,
    Permission::UpdateEmployee,
    Permission::DeleteEmployee,
];

const MANAGER_PERMISSIONS: &[Permission] = HR_ADMIN_PERMISSIONS;

const EMPLOYEE_PERMISSIONS: &[Permission] = &[Permission::ListEmployees, Permission::ReadEmployee];

impl Role {
    pub const ALL: [Role; 3] = [Role::HrAdmin, Role::Manager, Role::Employee];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::HrAdmin => "HRAdmin",
            Role::Manager => "Manager",
            Role::Employee => "Employee",
        }
    }

    /// Permissions granted by this role.
    ///
    /// Managers hold the same permissions as HR admins; what separates them
    /// is the department scope applied by the directory's policy engine.
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::HrAdmin => HR_ADMIN_PERMISSIONS,
            Role::Manager => MANAGER_PERMISSIONS,
            Role::Employee => EMPLOYEE_PERMISSIONS,
        }
    }

    pub fn grants(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}' (expected one of: HRAdmin, Manager, Employee)")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ParseRoleError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn role_names_are_case_sensitive() {
        assert!("hradmin".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn serde_uses_directory_role_names() {
        let json = serde_json::to_string(&Role::HrAdmin).unwrap();
        assert_eq!(json, "\"HRAdmin\"");

        let role: Role = serde_json::from_str("\"Manager\"").unwrap();
        assert_eq!(role, Role::Manager);
    }

    #[test]
    fn employees_cannot_mutate() {
        assert!(Role::Employee.grants(Permission::ReadEmployee));
        assert!(!Role::Employee.grants(Permission::CreateEmployee));
        assert!(!Role::Employee.grants(Permission::UpdateEmployee));
        assert!(!Role::Employee.grants(Permission::DeleteEmployee));
    }
}
