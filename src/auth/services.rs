use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::auth::{
    claims::ClaimSnapshot,
    jwt::JwtKeys,
    password::verify_password,
    token_store::{TokenPair, TokenStore},
};
use crate::error::AppError;
use crate::state::AppState;
use crate::users::{repo::UserStore, repo_types::User};

/// Checks an email/password pair. The account must be active; its status
/// is checked before the password.
pub async fn verify_credentials(
    users: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let Some(user) = users.find_by_email(email).await? else {
        warn!(%email, "login for unknown email");
        return Err(AppError::InvalidCredential);
    };
    if !user.status.can_authenticate() {
        warn!(user_id = %user.id, status = %user.status, "login for non-active account");
        return Err(AppError::AccountNotActive);
    }
    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "password mismatch");
        return Err(AppError::InvalidCredential);
    }
    Ok(user)
}

/// Mints a pair for `snapshot` and replaces whatever pair the user had.
pub async fn issue_tokens(
    keys: &JwtKeys,
    tokens: &dyn TokenStore,
    snapshot: &ClaimSnapshot,
    now: OffsetDateTime,
) -> Result<TokenPair, AppError> {
    let (access_token, refresh_token) = keys.issue_pair_at(snapshot, now)?;
    let pair = TokenPair {
        user_id: snapshot.id,
        access_token,
        refresh_token,
    };
    tokens.upsert(&pair).await?;
    debug!(user_id = %snapshot.id, "token pair stored");
    Ok(pair)
}

pub async fn login(state: &AppState, email: &str, password: &str) -> Result<TokenPair, AppError> {
    let email = email.trim().to_lowercase();
    let user = verify_credentials(state.users.as_ref(), &email, password).await?;
    let pair = issue_tokens(
        &state.keys,
        state.tokens.as_ref(),
        &ClaimSnapshot::from(&user),
        OffsetDateTime::now_utc(),
    )
    .await?;
    info!(user_id = %user.id, "user logged in");
    Ok(pair)
}

pub async fn refresh(state: &AppState, refresh_token: &str) -> Result<TokenPair, AppError> {
    refresh_at(state, refresh_token, OffsetDateTime::now_utc()).await
}

/// Exchanges a refresh token for a new pair. The live account must still
/// exist and be active; the new pair carries the refresh token's snapshot.
pub async fn refresh_at(
    state: &AppState,
    refresh_token: &str,
    now: OffsetDateTime,
) -> Result<TokenPair, AppError> {
    let claims = state.keys.verify_refresh_at(refresh_token, now).map_err(|e| {
        warn!(error = %e, "refresh token rejected");
        e
    })?;

    let Some(user) = state.users.find_by_id(claims.sub).await? else {
        warn!(user_id = %claims.sub, "refresh for missing account");
        return Err(AppError::Unauthorized);
    };
    if !user.status.can_authenticate() {
        warn!(user_id = %user.id, status = %user.status, "refresh for non-active account");
        return Err(AppError::AccountNotActive);
    }

    let pair = issue_tokens(&state.keys, state.tokens.as_ref(), &claims.data, now).await?;
    info!(user_id = %user.id, "tokens refreshed");
    Ok(pair)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::users::repo_types::{AccountStatus, Role};
    use time::macros::datetime;
    use uuid::Uuid;

    pub(crate) async fn seed_user(
        state: &AppState,
        email: &str,
        password: &str,
        role: Role,
        status: AccountStatus,
    ) -> User {
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            first_name: "Test".into(),
            last_name: "User".into(),
            email: email.into(),
            phone: "+15550100".into(),
            password_hash: hash_password(password).unwrap(),
            status,
            role,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(&user).await.unwrap();
        user
    }

    const T0: OffsetDateTime = datetime!(2024-05-01 12:00:00 UTC);

    fn secs(n: i64) -> time::Duration {
        time::Duration::seconds(n)
    }

    #[tokio::test]
    async fn login_issues_and_stores_a_pair() {
        let state = AppState::fake();
        let user = seed_user(&state, "ann@example.com", "password1", Role::User, AccountStatus::Active).await;

        let pair = login(&state, "  Ann@Example.com ", "password1").await.unwrap();
        assert_eq!(pair.user_id, user.id);
        assert_eq!(state.tokens.find_by_user(user.id).await.unwrap(), Some(pair.clone()));

        let principal = state.keys.verify_access(&pair.access_token).unwrap();
        assert_eq!(principal.id, user.id);
        assert_eq!(principal.role, Role::User);
    }

    #[tokio::test]
    async fn bad_credentials_are_rejected() {
        let state = AppState::fake();
        seed_user(&state, "ann@example.com", "password1", Role::User, AccountStatus::Active).await;

        assert!(matches!(
            login(&state, "ann@example.com", "password2").await,
            Err(AppError::InvalidCredential)
        ));
        assert!(matches!(
            login(&state, "bob@example.com", "password1").await,
            Err(AppError::InvalidCredential)
        ));
    }

    #[tokio::test]
    async fn inactive_account_cannot_log_in_and_gets_no_pair() {
        let state = AppState::fake();
        let user = seed_user(&state, "ann@example.com", "password1", Role::User, AccountStatus::Inactive).await;

        assert!(matches!(
            login(&state, "ann@example.com", "password1").await,
            Err(AppError::AccountNotActive)
        ));
        assert!(state.tokens.find_by_user(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn refresh_reissues_from_the_carried_snapshot() {
        let state = AppState::fake();
        let user = seed_user(&state, "ann@example.com", "password1", Role::User, AccountStatus::Active).await;
        let snapshot = ClaimSnapshot::from(&user);
        let first = issue_tokens(&state.keys, state.tokens.as_ref(), &snapshot, T0).await.unwrap();

        // access lifetime is 60s, refresh 75s
        let now = T0 + secs(70);
        assert!(matches!(
            state.keys.verify_access_at(&first.access_token, now),
            Err(AppError::Expired)
        ));
        let second = refresh_at(&state, &first.refresh_token, now).await.unwrap();

        assert_ne!(second, first);
        assert_eq!(state.tokens.find_by_user(user.id).await.unwrap(), Some(second.clone()));
        let claims = state.keys.decode_at(&second.access_token, now).unwrap();
        assert_eq!(claims.data, snapshot);
    }

    #[tokio::test]
    async fn expired_refresh_leaves_stored_pair_untouched() {
        let state = AppState::fake();
        let user = seed_user(&state, "ann@example.com", "password1", Role::User, AccountStatus::Active).await;
        let first = issue_tokens(&state.keys, state.tokens.as_ref(), &ClaimSnapshot::from(&user), T0)
            .await
            .unwrap();

        assert!(matches!(
            refresh_at(&state, &first.refresh_token, T0 + secs(75)).await,
            Err(AppError::Expired)
        ));
        assert_eq!(state.tokens.find_by_user(user.id).await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn refresh_checks_the_live_account() {
        let state = AppState::fake();
        let user = seed_user(&state, "ann@example.com", "password1", Role::User, AccountStatus::Active).await;
        let pair = issue_tokens(&state.keys, state.tokens.as_ref(), &ClaimSnapshot::from(&user), T0)
            .await
            .unwrap();

        state.users.update_status(user.id, AccountStatus::Inactive).await.unwrap();
        assert!(matches!(
            refresh_at(&state, &pair.refresh_token, T0 + secs(10)).await,
            Err(AppError::AccountNotActive)
        ));
        assert_eq!(state.tokens.find_by_user(user.id).await.unwrap(), Some(pair));

        let ghost = ClaimSnapshot {
            id: Uuid::new_v4(),
            ..ClaimSnapshot::from(&user)
        };
        let (_, refresh_token) = state.keys.issue_pair_at(&ghost, T0).unwrap();
        assert!(matches!(
            refresh_at(&state, &refresh_token, T0 + secs(10)).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn access_token_cannot_be_used_to_refresh() {
        let state = AppState::fake();
        let user = seed_user(&state, "ann@example.com", "password1", Role::User, AccountStatus::Active).await;
        let pair = issue_tokens(&state.keys, state.tokens.as_ref(), &ClaimSnapshot::from(&user), T0)
            .await
            .unwrap();

        assert!(matches!(
            refresh_at(&state, &pair.access_token, T0 + secs(10)).await,
            Err(AppError::MalformedToken(_))
        ));
    }
}
