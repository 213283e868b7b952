//! Keeping a user record a faithful projection of its employee.
//!
//! After every successful write the paired user carries the employee's
//! current role, email and `First_Last` username.

use hcm_auth::PasswordCredential;

use crate::model::{Employee, EmployeeProfile, NewUser, User};

/// `First_Last`, verbatim (no case folding, no collision suffix).
pub fn derive_username(first_name: &str, last_name: &str) -> String {
    format!("{first_name}_{last_name}")
}

/// The user to create alongside a new employee.
pub fn paired_user(profile: &EmployeeProfile, credential: PasswordCredential) -> NewUser {
    NewUser {
        username: derive_username(&profile.first_name, &profile.last_name),
        email: profile.email.clone(),
        role: profile.role,
        credential,
    }
}

/// Bring `user` back in line with `employee`. The credential is untouched.
pub fn resync(user: User, employee: &Employee) -> User {
    User {
        username: derive_username(&employee.first_name, &employee.last_name),
        email: employee.email.clone(),
        role: employee.role,
        ..user
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Salary;
    use hcm_auth::Role;
    use hcm_core::{EmployeeId, UserId};
    use rust_decimal::Decimal;

    fn employee() -> Employee {
        Employee {
            id: EmployeeId::new(),
            first_name: "Ada".to_string(),
            last_name: "Byron".to_string(),
            email: "ada@example.com".to_string(),
            job_title: "Analyst".to_string(),
            salary: Salary::new(Decimal::new(90_000, 0)).unwrap(),
            department: "R&D".to_string(),
            role: Role::Manager,
            version: 3,
        }
    }

    #[test]
    fn paired_user_mirrors_the_profile() {
        let profile = employee().profile();
        let user = paired_user(&profile, PasswordCredential::from_hash("h"));

        assert_eq!(user.username, "Ada_Byron");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.role, Role::Manager);
    }

    #[test]
    fn resync_rewrites_projection_and_keeps_credential() {
        let stale = User {
            id: UserId::new(),
            username: "Ada_King".to_string(),
            email: "old@example.com".to_string(),
            role: Role::Employee,
            credential: PasswordCredential::from_hash("kept"),
        };
        let id = stale.id;

        let user = resync(stale, &employee());

        assert_eq!(user.id, id);
        assert_eq!(user.username, "Ada_Byron");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.role, Role::Manager);
        assert_eq!(user.credential.as_str(), "kept");
    }
}
