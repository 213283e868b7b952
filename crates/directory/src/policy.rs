//! Access policy: the scope a caller operates in, and the checks it implies.
//!
//! The scope is derived once per request from the caller's role and (for
//! managers and employees) their resolved directory record. Every operation
//! then asks the same scope, so the per-role rules live in one place. Reads
//! are the exception: managers may read any record, so `Get` only derives a
//! scope for `Employee` callers.
//!
//! | scope        | list                    | read     | create/update             | delete                          |
//! |--------------|-------------------------|----------|---------------------------|---------------------------------|
//! | `Directory`  | everyone                | anyone   | anything                  | anyone                          |
//! | `Department` | own dept, managers first| anyone   | `Employee` in own dept    | `Employee` in own dept          |
//! | `Own`        | self only               | self     | never                     | never                           |

use hcm_auth::{Principal, Role};

use crate::error::{DirectoryError, DirectoryResult};
use crate::identity::resolve_caller;
use crate::model::{Employee, EmployeeProfile};
use crate::store::DirectoryStore;

/// What a caller may see and touch during one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessScope {
    /// `HRAdmin`: the whole directory, no caller lookup.
    Directory,
    /// `Manager`: their own department.
    Department { manager: Employee },
    /// `Employee`: their own record.
    Own { employee: Employee },
}

impl AccessScope {
    /// Derive the caller's scope, resolving their record when the role needs it.
    pub async fn resolve<S>(store: &S, principal: &Principal) -> DirectoryResult<Self>
    where
        S: DirectoryStore + ?Sized,
    {
        match principal.role() {
            Role::HrAdmin => Ok(AccessScope::Directory),
            role => {
                let caller = resolve_caller(store, principal).await?;
                Ok(Self::for_caller(role, caller))
            }
        }
    }

    /// Scope for an already-resolved caller.
    pub fn for_caller(role: Role, caller: Employee) -> Self {
        match role {
            Role::HrAdmin => AccessScope::Directory,
            Role::Manager => AccessScope::Department { manager: caller },
            Role::Employee => AccessScope::Own { employee: caller },
        }
    }

    pub fn check_read(&self, target: &Employee) -> DirectoryResult<()> {
        match self {
            AccessScope::Own { employee } if employee.id != target.id => {
                Err(DirectoryError::forbidden("employees may only view their own record"))
            }
            _ => Ok(()),
        }
    }

    /// Check the state a create or update would leave behind.
    ///
    /// Only the incoming values are checked: a manager may neither create
    /// nor edit anyone into a role or department outside their reach.
    pub fn check_assign(&self, profile: &EmployeeProfile, action: &str) -> DirectoryResult<()> {
        match self {
            AccessScope::Directory => Ok(()),
            AccessScope::Department { manager } => {
                if profile.role == Role::Employee && profile.department == manager.department {
                    Ok(())
                } else {
                    Err(DirectoryError::forbidden(format!(
                        "manager can only {action} employees in their own department"
                    )))
                }
            }
            AccessScope::Own { .. } => Err(DirectoryError::forbidden(format!(
                "employees may not {action} directory records"
            ))),
        }
    }

    pub fn check_delete(&self, target: &Employee) -> DirectoryResult<()> {
        match self {
            AccessScope::Directory => Ok(()),
            AccessScope::Department { manager } => {
                if target.department == manager.department && target.role == Role::Employee {
                    Ok(())
                } else {
                    Err(DirectoryError::forbidden("manager cannot delete this employee"))
                }
            }
            AccessScope::Own { .. } => Err(DirectoryError::forbidden(
                "employees may not delete directory records",
            )),
        }
    }
}

/// A manager's view of `department`: managers then employees, each by
/// last name then first name. Anyone else is dropped.
pub fn department_listing(department: &str, people: Vec<Employee>) -> Vec<Employee> {
    let (mut managers, mut employees): (Vec<_>, Vec<_>) = people
        .into_iter()
        .filter(|e| e.department == department)
        .filter(|e| matches!(e.role, Role::Manager | Role::Employee))
        .partition(|e| e.role == Role::Manager);

    let by_name = |a: &Employee, b: &Employee| {
        a.last_name
            .cmp(&b.last_name)
            .then_with(|| a.first_name.cmp(&b.first_name))
    };
    managers.sort_by(by_name);
    employees.sort_by(by_name);

    managers.extend(employees);
    managers
}
