//! Identity resolution: "who is the caller in the directory?"

use hcm_auth::Principal;

use crate::error::{DirectoryError, DirectoryResult};
use crate::model::Employee;
use crate::store::DirectoryStore;

/// Map an authenticated principal to their own employee record.
///
/// The principal's username selects a user; that user's email selects the
/// employee. A principal with no such pair is authenticated but unknown to
/// the directory, reported as [`DirectoryError::CallerNotFound`] rather than
/// a plain not-found.
pub async fn resolve_caller<S>(store: &S, principal: &Principal) -> DirectoryResult<Employee>
where
    S: DirectoryStore + ?Sized,
{
    match store.employee_for_username(principal.username()).await? {
        Some(employee) => Ok(employee),
        None => {
            tracing::debug!(caller = principal.username(), "caller has no directory record");
            Err(DirectoryError::CallerNotFound)
        }
    }
}
