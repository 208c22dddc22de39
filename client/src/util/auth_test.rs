use super::*;
use crate::state::auth::AuthMode;

#[test]
fn should_redirect_unauth_when_not_loading_and_user_missing() {
    let state = AuthState { user: None, mode: AuthMode::Oidc, loading: false };
    assert!(should_redirect_unauth(&state));
}

#[test]
fn should_not_redirect_while_loading() {
    let state = AuthState { user: None, mode: AuthMode::None, loading: true };
    assert!(!should_redirect_unauth(&state));
}

#[test]
fn should_not_redirect_when_user_exists() {
    let state = AuthState { user: Some("a@b.com".to_owned()), mode: AuthMode::Session, loading: false };
    assert!(!should_redirect_unauth(&state));
}
