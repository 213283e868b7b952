//! Directory data model.
//!
//! An [`Employee`] is the authoritative profile; its paired [`User`] is a
//! derived projection (username, role, email) plus the login credential.
//! The two are joined by email equality.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hcm_auth::{PasswordCredential, Role};
use hcm_core::{DomainError, DomainResult, EmployeeId, UserId};

// ─────────────────────────────────────────────────────────────────────────────
// Salary
// ─────────────────────────────────────────────────────────────────────────────

/// Non-negative salary amount.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Salary(Decimal);

impl Salary {
    pub const ZERO: Salary = Salary(Decimal::ZERO);

    pub fn new(amount: Decimal) -> DomainResult<Self> {
        if amount < Decimal::ZERO {
            return Err(DomainError::validation("salary cannot be negative"));
        }
        Ok(Self(amount))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Salary {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Salary> for Decimal {
    fn from(value: Salary) -> Self {
        value.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Profile (the mutable field set)
// ─────────────────────────────────────────────────────────────────────────────

/// Every caller-editable employee field.
///
/// Used as Create input (with a password, see [`NewEmployee`]) and as the
/// complete replacement value set on Update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub job_title: String,
    pub salary: Salary,
    pub department: String,
    pub role: Role,
}

impl EmployeeProfile {
    /// Trim text fields and reject blank or malformed values.
    pub fn normalized(self) -> DomainResult<Self> {
        let profile = Self {
            first_name: required("first name", self.first_name)?,
            last_name: required("last name", self.last_name)?,
            email: required("email", self.email)?,
            job_title: required("job title", self.job_title)?,
            salary: self.salary,
            department: required("department", self.department)?,
            role: self.role,
        };

        if !profile.email.contains('@') {
            return Err(DomainError::validation("invalid email format"));
        }

        Ok(profile)
    }
}

fn required(field: &str, value: String) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Create input: a profile plus the plaintext password for the paired user.
#[derive(Clone, Deserialize)]
pub struct NewEmployee {
    #[serde(flatten)]
    pub profile: EmployeeProfile,
    pub password: String,
}

impl NewEmployee {
    pub fn normalized(self) -> DomainResult<Self> {
        if self.password.trim().is_empty() {
            return Err(DomainError::validation("password is required"));
        }
        Ok(Self {
            profile: self.profile.normalized()?,
            password: self.password,
        })
    }
}

impl core::fmt::Debug for NewEmployee {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewEmployee")
            .field("profile", &self.profile)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Employee
// ─────────────────────────────────────────────────────────────────────────────

/// A directory profile.
///
/// # Invariants
/// - `id` is assigned by the store and never changes.
/// - `email` is unique across employees.
/// - `version` starts at 1 and increases by one per stored update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub job_title: String,
    pub salary: Salary,
    pub department: String,
    pub role: Role,
    pub version: u64,
}

impl Employee {
    pub fn from_profile(id: EmployeeId, version: u64, profile: EmployeeProfile) -> Self {
        Self {
            id,
            first_name: profile.first_name,
            last_name: profile.last_name,
            email: profile.email,
            job_title: profile.job_title,
            salary: profile.salary,
            department: profile.department,
            role: profile.role,
            version,
        }
    }

    /// Replace every mutable field, keeping identity and version.
    pub fn with_profile(self, profile: EmployeeProfile) -> Self {
        Self::from_profile(self.id, self.version, profile)
    }

    pub fn profile(&self) -> EmployeeProfile {
        EmployeeProfile {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            job_title: self.job_title.clone(),
            salary: self.salary,
            department: self.department.clone(),
            role: self.role,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication identity paired with an employee by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub credential: PasswordCredential,
}

/// A user record not yet persisted (the store assigns its id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub credential: PasswordCredential,
}

impl NewUser {
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            role: self.role,
            credential: self.credential,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> EmployeeProfile {
        EmployeeProfile {
            first_name: "  Grace ".to_string(),
            last_name: "Hopper".to_string(),
            email: "grace@example.com ".to_string(),
            job_title: "Engineer".to_string(),
            salary: Salary::new(Decimal::new(120_000, 0)).unwrap(),
            department: "R&D".to_string(),
            role: Role::Employee,
        }
    }

    #[test]
    fn normalized_trims_text_fields() {
        let p = profile().normalized().unwrap();
        assert_eq!(p.first_name, "Grace");
        assert_eq!(p.email, "grace@example.com");
    }

    #[test]
    fn blank_department_is_rejected() {
        let mut p = profile();
        p.department = "   ".to_string();
        let err = p.normalized().unwrap_err();
        assert_eq!(err, DomainError::validation("department is required"));
    }

    #[test]
    fn email_without_at_sign_is_rejected() {
        let mut p = profile();
        p.email = "grace.example.com".to_string();
        assert!(p.normalized().is_err());
    }

    #[test]
    fn negative_salary_is_rejected_on_deserialize() {
        let json = serde_json::json!({
            "first_name": "Grace",
            "last_name": "Hopper",
            "email": "grace@example.com",
            "job_title": "Engineer",
            "salary": "-1",
            "department": "R&D",
            "role": "Employee",
        });
        assert!(serde_json::from_value::<EmployeeProfile>(json).is_err());
    }

    #[test]
    fn new_employee_requires_password_and_hides_it() {
        let input = NewEmployee {
            profile: profile(),
            password: " ".to_string(),
        };
        assert!(format!("{input:?}").contains("<redacted>"));
        assert_eq!(
            input.normalized().unwrap_err(),
            DomainError::validation("password is required")
        );
    }

    #[test]
    fn user_json_never_carries_the_credential() {
        let user = User {
            id: UserId::new(),
            username: "Grace_Hopper".to_string(),
            email: "grace@example.com".to_string(),
            role: Role::Employee,
            credential: PasswordCredential::from_hash("$argon2id$hash"),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("credential").is_none());
        assert_eq!(value["username"], "Grace_Hopper");
    }
}
