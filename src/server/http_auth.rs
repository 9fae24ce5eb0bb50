use crate::domain::AccountId;
use axum::http::{HeaderMap, HeaderName};

/// Account id forwarded by the authenticating gateway. Missing or blank
/// headers mean an anonymous caller.
pub(super) fn extract_account_id(headers: &HeaderMap, header: &HeaderName) -> Option<AccountId> {
    headers
        .get(header)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(AccountId::new)
}
