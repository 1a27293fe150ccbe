//! Request guards
//!
//! `authenticate` resolves the session token to an account; `require_role`
//! runs after it and checks the account's role against an allow-list. Both
//! return `Err` before any handler logic runs.

use hyper::header::{AUTHORIZATION, COOKIE};
use hyper::HeaderMap;
use tracing::warn;

use crate::auth::jwt::{
    extract_token_from_cookie, extract_token_from_header, JwtValidator, TOKEN_COOKIE,
};
use crate::auth::Role;
use crate::db::{Account, AccountStore};
use crate::types::{LecternError, Result};

/// Identity attached to an authenticated request
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub account: Account,
}

impl AuthContext {
    pub fn role(&self) -> Role {
        self.account.role
    }
}

fn unauthenticated() -> LecternError {
    LecternError::Unauthenticated("Unauthenticated".into())
}

/// Session token from the `token` cookie, else from a bearer header
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let cookie = headers.get(COOKIE).and_then(|v| v.to_str().ok());
    extract_token_from_cookie(cookie, TOKEN_COOKIE).or_else(|| {
        let auth = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        extract_token_from_header(auth)
    })
}

/// Resolve the request's session to a stored account
///
/// Missing, malformed, forged and expired tokens, and tokens for accounts
/// that no longer exist, all yield the same `Unauthenticated` error.
pub async fn authenticate(
    headers: &HeaderMap,
    jwt: &JwtValidator,
    accounts: &dyn AccountStore,
) -> Result<AuthContext> {
    let token = token_from_headers(headers).ok_or_else(unauthenticated)?;

    let result = jwt.verify_token(token);
    if let Some(reason) = result.error.as_deref() {
        warn!("Rejected session token: {}", reason);
    }
    let claims = result.into_claims()?;

    let account = match accounts.find_by_id(&claims.sub).await {
        Ok(Some(account)) => account,
        Ok(None) | Err(LecternError::Validation(_)) => {
            warn!(
                "Session token for unknown account {} (issued to {})",
                claims.sub, claims.login
            );
            return Err(unauthenticated());
        }
        Err(e) => return Err(e),
    };

    Ok(AuthContext { account })
}

/// Pass only if the account's role is allowed; an empty list allows any role
pub fn require_role(ctx: &AuthContext, allowed: &[Role]) -> Result<()> {
    if allowed.is_empty() || allowed.contains(&ctx.role()) {
        return Ok(());
    }

    warn!(
        "Account {} with role {} denied (requires one of {:?})",
        ctx.account.login,
        ctx.role(),
        allowed
    );
    Err(LecternError::Forbidden("Access denied".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenInput;
    use crate::db::MemoryStore;
    use hyper::header::HeaderValue;

    fn jwt() -> JwtValidator {
        JwtValidator::new_dev(3600)
    }

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    async fn account_with_token(store: &MemoryStore, role: Role) -> (Account, String) {
        let account = AccountStore::create(store, "carol", "hash", role)
            .await
            .unwrap();
        let token = jwt()
            .generate_token(TokenInput {
                account_id: account.id.clone(),
                login: account.login.clone(),
            })
            .unwrap();
        (account, token)
    }

    #[tokio::test]
    async fn test_valid_cookie_resolves_account() {
        let store = MemoryStore::new();
        let (account, token) = account_with_token(&store, Role::User).await;

        let ctx = authenticate(&headers_with_cookie(&format!("token={token}")), &jwt(), &store)
            .await
            .unwrap();
        assert_eq!(ctx.account.id, account.id);
    }

    #[tokio::test]
    async fn test_bearer_header_fallback() {
        let store = MemoryStore::new();
        let (account, token) = account_with_token(&store, Role::User).await;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        let ctx = authenticate(&headers, &jwt(), &store).await.unwrap();
        assert_eq!(ctx.account.login, account.login);
    }

    #[tokio::test]
    async fn test_missing_and_garbage_tokens_are_unauthenticated() {
        let store = MemoryStore::new();

        let err = authenticate(&HeaderMap::new(), &jwt(), &store)
            .await
            .unwrap_err();
        assert!(matches!(err, LecternError::Unauthenticated(_)));

        let err = authenticate(&headers_with_cookie("token=garbage"), &jwt(), &store)
            .await
            .unwrap_err();
        assert!(matches!(err, LecternError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_deleted_account_is_unauthenticated() {
        let store = MemoryStore::new();
        let (account, token) = account_with_token(&store, Role::Admin).await;
        AccountStore::delete(&store, &account.id).await.unwrap();

        let err = authenticate(&headers_with_cookie(&format!("token={token}")), &jwt(), &store)
            .await
            .unwrap_err();
        assert!(matches!(err, LecternError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_role_gate() {
        let store = MemoryStore::new();
        let (account, _) = account_with_token(&store, Role::Moderator).await;
        let ctx = AuthContext { account };

        assert!(require_role(&ctx, &[]).is_ok());
        assert!(require_role(&ctx, &[Role::Admin, Role::Moderator]).is_ok());
        assert!(matches!(
            require_role(&ctx, &[Role::Admin]),
            Err(LecternError::Forbidden(_))
        ));
    }
}
