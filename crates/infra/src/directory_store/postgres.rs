//! Postgres-backed directory store.
//!
//! Each pair write runs in one transaction. Uniqueness is enforced by
//! constraints in `migrations/0001_directory.sql`; the optimistic version
//! check is part of the `UPDATE ... WHERE` clause.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) on a pair write | `23505` | `Duplicate` | email or username already taken |
//! | Database (other) | Any other | `Unavailable` | Check violation, bad connection state, ... |
//! | PoolClosed | N/A | `Unavailable` | Connection pool was closed |
//! | Other | N/A | `Unavailable` | Network errors, decode failures, ... |

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use hcm_auth::{PasswordCredential, Role};
use hcm_core::{EmployeeId, ExpectedVersion, UserId};
use hcm_directory::{DirectoryStore, Employee, EmployeeProfile, NewUser, Salary, StoreError, User};

const SCHEMA: &str = include_str!("../../migrations/0001_directory.sql");

const EMPLOYEE_COLUMNS: &str =
    "id, first_name, last_name, email, job_title, salary, department, role, version";

/// Postgres-backed directory store.
#[derive(Debug, Clone)]
pub struct PostgresDirectoryStore {
    pool: Arc<PgPool>,
}

impl PostgresDirectoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect and make sure the directory tables exist.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, StoreError> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }

    async fn fetch_employees(
        &self,
        operation: &str,
        sql: &str,
        bind: Option<&str>,
    ) -> Result<Vec<Employee>, StoreError> {
        let mut query = sqlx::query(sql);
        if let Some(value) = bind {
            query = query.bind(value.to_string());
        }
        let rows = query
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        rows.iter()
            .map(|row| employee_from_row(row).map_err(|e| map_sqlx_error(operation, e)))
            .collect()
    }

    async fn fetch_user(
        &self,
        operation: &str,
        column: &str,
        value: &str,
    ) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "SELECT id, username, email, role, password_hash FROM users WHERE {column} = $1"
        );
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error(operation, e))
    }
}

#[async_trait]
impl DirectoryStore for PostgresDirectoryStore {
    #[instrument(skip_all, fields(employee_id = %id))]
    async fn employee(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("employee", e))?;

        row.as_ref()
            .map(employee_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("employee", e))
    }

    async fn employees(&self) -> Result<Vec<Employee>, StoreError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY id");
        self.fetch_employees("employees", &sql, None).await
    }

    async fn employees_in_department(&self, department: &str) -> Result<Vec<Employee>, StoreError> {
        let sql =
            format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE department = $1 ORDER BY id");
        self.fetch_employees("employees_in_department", &sql, Some(department))
            .await
    }

    async fn employee_by_email(&self, email: &str) -> Result<Option<Employee>, StoreError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE email = $1");
        Ok(self
            .fetch_employees("employee_by_email", &sql, Some(email))
            .await?
            .into_iter()
            .next())
    }

    async fn employee_count(&self) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("employee_count", e))?;
        Ok(count.max(0) as usize)
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.fetch_user("user_by_username", "username", username).await
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.fetch_user("user_by_email", "email", email).await
    }

    /// The email join done by the database in one statement.
    async fn employee_for_username(&self, username: &str) -> Result<Option<Employee>, StoreError> {
        let sql = "SELECT e.id, e.first_name, e.last_name, e.email, e.job_title, e.salary, \
                   e.department, e.role, e.version \
                   FROM employees e JOIN users u ON e.email = u.email \
                   WHERE u.username = $1 LIMIT 1";
        Ok(self
            .fetch_employees("employee_for_username", sql, Some(username))
            .await?
            .into_iter()
            .next())
    }

    #[instrument(skip_all, fields(email = %profile.email, username = %user.username))]
    async fn insert_pair(
        &self,
        profile: EmployeeProfile,
        user: NewUser,
    ) -> Result<(Employee, User), StoreError> {
        let employee = Employee::from_profile(EmployeeId::new(), 1, profile);
        let user = user.into_user(UserId::new());
        let unique = UniqueValues {
            employee_email: &employee.email,
            username: Some(&user.username),
            user_email: Some(&user.email),
        };

        let mut tx = self.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO employees (id, first_name, last_name, email, job_title, salary, department, role, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(*employee.id.as_uuid())
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.email)
        .bind(&employee.job_title)
        .bind(employee.salary.amount())
        .bind(&employee.department)
        .bind(employee.role.as_str())
        .bind(employee.version as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error("insert_employee", e, &unique))?;

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, role, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(*user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.credential.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error("insert_user", e, &unique))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok((employee, user))
    }

    #[instrument(skip_all, fields(employee_id = %employee.id, expected_version = ?expected))]
    async fn update_pair(
        &self,
        employee: &Employee,
        expected: ExpectedVersion,
        user: Option<&User>,
    ) -> Result<Employee, StoreError> {
        let expected_version = match expected {
            ExpectedVersion::Any => None,
            ExpectedVersion::Exact(v) => Some(v as i64),
        };
        let unique = UniqueValues {
            employee_email: &employee.email,
            username: user.map(|u| u.username.as_str()),
            user_email: user.map(|u| u.email.as_str()),
        };

        let mut tx = self.begin().await?;

        let version: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE employees
            SET first_name = $3, last_name = $4, email = $5, job_title = $6,
                salary = $7, department = $8, role = $9, version = version + 1
            WHERE id = $1 AND ($2::BIGINT IS NULL OR version = $2)
            RETURNING version
            "#,
        )
        .bind(*employee.id.as_uuid())
        .bind(expected_version)
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.email)
        .bind(&employee.job_title)
        .bind(employee.salary.amount())
        .bind(&employee.department)
        .bind(employee.role.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_write_error("update_employee", e, &unique))?;

        let Some(version) = version else {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::Conflict(format!(
                "employee {} was modified or removed (expected: {expected:?})",
                employee.id
            )));
        };

        if let Some(user) = user {
            let updated =
                sqlx::query("UPDATE users SET username = $2, email = $3, role = $4 WHERE id = $1")
                    .bind(*user.id.as_uuid())
                    .bind(&user.username)
                    .bind(&user.email)
                    .bind(user.role.as_str())
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| map_write_error("update_user", e, &unique))?;

            if updated.rows_affected() == 0 {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                return Err(StoreError::Conflict(format!("user {} no longer exists", user.id)));
            }
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(Employee {
            version: version as u64,
            ..employee.clone()
        })
    }

    #[instrument(skip_all, fields(employee_id = %id, expected_version = ?expected))]
    async fn delete_pair(
        &self,
        id: EmployeeId,
        expected: ExpectedVersion,
    ) -> Result<bool, StoreError> {
        let expected_version = match expected {
            ExpectedVersion::Any => None,
            ExpectedVersion::Exact(v) => Some(v as i64),
        };

        let mut tx = self.begin().await?;

        let removed_email: Option<String> = sqlx::query_scalar(
            r#"
            DELETE FROM employees
            WHERE id = $1 AND ($2::BIGINT IS NULL OR version = $2)
            RETURNING email
            "#,
        )
        .bind(*id.as_uuid())
        .bind(expected_version)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("delete_employee", e))?;

        let Some(email) = removed_email else {
            let still_there: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM employees WHERE id = $1)")
                    .bind(*id.as_uuid())
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(|e| map_sqlx_error("delete_employee", e))?;
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;

            if still_there {
                return Err(StoreError::Conflict(format!(
                    "employee {id} was modified (expected: {expected:?})"
                )));
            }
            return Ok(false);
        };

        sqlx::query("DELETE FROM users WHERE email = $1")
            .bind(&email)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(true)
    }
}

/// Values a pair write tries to claim, for naming the loser of a unique violation.
struct UniqueValues<'a> {
    employee_email: &'a str,
    username: Option<&'a str>,
    user_email: Option<&'a str>,
}

fn map_write_error(operation: &str, err: sqlx::Error, unique: &UniqueValues<'_>) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            let (field, value) = match db_err.constraint() {
                Some("users_username_key") => ("username", unique.username),
                Some("users_email_key") => ("email", unique.user_email),
                _ => ("email", Some(unique.employee_email)),
            };
            return StoreError::Duplicate {
                field,
                value: value.unwrap_or_default().to_string(),
            };
        }
    }
    map_sqlx_error(operation, err)
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::Unavailable(format!(
                "database error in {}: {}",
                operation,
                db_err.message()
            ))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Unavailable(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn role_column(row: &PgRow) -> Result<Role, sqlx::Error> {
    let raw: String = row.try_get("role")?;
    Role::from_str(&raw).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn employee_from_row(row: &PgRow) -> Result<Employee, sqlx::Error> {
    let salary: Decimal = row.try_get("salary")?;
    let version: i64 = row.try_get("version")?;

    Ok(Employee {
        id: EmployeeId::from_uuid(row.try_get::<Uuid, _>("id")?),
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        job_title: row.try_get("job_title")?,
        salary: Salary::new(salary).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        department: row.try_get("department")?,
        role: role_column(row)?,
        version: version as u64,
    })
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        role: role_column(row)?,
        credential: PasswordCredential::from_hash(row.try_get::<String, _>("password_hash")?),
    })
}
