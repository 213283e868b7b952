use serde::{Deserialize, Serialize};

/// Permission identifier for directory operations.
///
/// Rendered as dotted strings (e.g. "employees.read") in logs and errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ListEmployees,
    ReadEmployee,
    CreateEmployee,
    UpdateEmployee,
    DeleteEmployee,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ListEmployees => "employees.list",
            Permission::ReadEmployee => "employees.read",
            Permission::CreateEmployee => "employees.create",
            Permission::UpdateEmployee => "employees.update",
            Permission::DeleteEmployee => "employees.delete",
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
