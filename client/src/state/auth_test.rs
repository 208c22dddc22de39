use super::*;
use futures::executor::block_on;

use crate::config::{ClientConfig, Stage};
use crate::idp::IdpError;
use crate::net::transport::{HttpTransport, Method};
use crate::test_support::{FakeIdp, ScriptedTransport};

const LOGOUT: &str = "/api/app/v1/auth/logout";

fn api(transport: &Rc<ScriptedTransport>) -> AuthApi {
    AuthApi::new(Rc::clone(transport) as Rc<dyn HttpTransport>, &ClientConfig::for_stage(Stage::Prod))
}

fn oidc(identity: Option<&str>, idp: &Rc<FakeIdp>) -> OidcStrategy {
    OidcStrategy {
        identity: identity.map(str::to_owned),
        idp: Rc::clone(idp) as Rc<dyn IdpClient>,
        token: LiveToken::new(),
    }
}

// =============================================================================
// Secrets
// =============================================================================

#[test]
fn debug_output_redacts_secrets() {
    let token = AccessToken::new("eyJhbGciOi");
    assert!(!format!("{token:?}").contains("eyJ"));

    let creds = Credentials::new("alice", "hunter2");
    let rendered = format!("{creds:?}");
    assert!(rendered.contains("alice"));
    assert!(!rendered.contains("hunter2"));
}

#[test]
fn bearer_formats_header_value() {
    assert_eq!(AccessToken::new("abc").bearer(), "Bearer abc");
}

#[test]
fn live_token_clones_share_one_cell() {
    let a = LiveToken::new();
    let b = a.clone();
    a.set(AccessToken::new("t1"));
    assert_eq!(b.get(), Some(AccessToken::new("t1")));
    b.set(AccessToken::new("t2"));
    assert_eq!(a.get(), Some(AccessToken::new("t2")));
    a.clear();
    assert_eq!(b.get(), None);
}

// =============================================================================
// Phase derivation
// =============================================================================

#[test]
fn phase_follows_snapshot() {
    let mut session = AuthSession { loading: true, ..AuthSession::default() };
    assert_eq!(AuthPhase::derive(&session, false), AuthPhase::Initializing);

    session.loading = false;
    assert_eq!(AuthPhase::derive(&session, false), AuthPhase::Unauthenticated);

    session.mode = AuthMode::Oidc;
    assert_eq!(AuthPhase::derive(&session, false), AuthPhase::Unauthenticated);

    session.pending_delegated_signin = true;
    assert_eq!(AuthPhase::derive(&session, false), AuthPhase::AwaitingDelegatedAuth);

    session.pending_delegated_signin = false;
    session.identity = Some("a@b.com".to_owned());
    assert_eq!(AuthPhase::derive(&session, false), AuthPhase::AuthenticatedOidc);
    assert_eq!(AuthPhase::derive(&session, true), AuthPhase::SigningOut);

    session.mode = AuthMode::Session;
    assert_eq!(AuthPhase::derive(&session, false), AuthPhase::AuthenticatedSession);
}

#[test]
fn auth_state_mirrors_session() {
    let session = AuthSession {
        identity: Some("a@b.com".to_owned()),
        mode: AuthMode::Session,
        access_token: None,
        loading: false,
        pending_delegated_signin: false,
    };
    let state = AuthState::from(&session);
    assert_eq!(state.user.as_deref(), Some("a@b.com"));
    assert_eq!(state.mode, AuthMode::Session);
    assert!(!state.loading);
}

// =============================================================================
// Strategies
// =============================================================================

#[test]
fn strategies_report_mode_and_identity() {
    let idp = FakeIdp::new();
    let anon = Strategy::anonymous();
    assert_eq!(anon.as_dyn().mode(), AuthMode::None);
    assert_eq!(anon.as_dyn().identity(), None);

    let session = Strategy::Session(SessionStrategy { identity: "a@b.com".to_owned() });
    assert_eq!(session.as_dyn().mode(), AuthMode::Session);
    assert_eq!(session.as_dyn().identity(), Some("a@b.com"));
    assert_eq!(session.as_dyn().access_token(), None);

    let strategy = oidc(None, &idp);
    strategy.token.set(AccessToken::new("tok"));
    let strategy = Strategy::Oidc(strategy);
    assert_eq!(strategy.as_dyn().mode(), AuthMode::Oidc);
    assert_eq!(strategy.as_dyn().identity(), None);
    assert_eq!(strategy.as_dyn().access_token(), Some(AccessToken::new("tok")));
}

#[test]
fn session_sign_out_calls_logout_endpoint() {
    let transport = ScriptedTransport::new();
    transport.respond(Method::Post, LOGOUT, 200, "");
    let strategy = SessionStrategy { identity: "a@b.com".to_owned() };
    block_on(strategy.sign_out(&api(&transport)));
    assert_eq!(transport.count(Method::Post, LOGOUT), 1);
}

#[test]
fn oidc_sign_out_redirects_only_with_identity() {
    let transport = ScriptedTransport::new();
    let idp = FakeIdp::new();

    block_on(oidc(None, &idp).sign_out(&api(&transport)));
    assert_eq!(idp.signout_calls.get(), 0);

    block_on(oidc(Some("a@b.com"), &idp).sign_out(&api(&transport)));
    assert_eq!(idp.signout_calls.get(), 1);
    assert!(transport.requests().is_empty());
}

#[test]
fn oidc_sign_out_swallows_idp_failure() {
    let transport = ScriptedTransport::new();
    let idp = FakeIdp::new();
    idp.fail_signout(IdpError::Other("popup blocked".to_owned()));
    block_on(oidc(Some("a@b.com"), &idp).sign_out(&api(&transport)));
    assert_eq!(idp.signout_calls.get(), 1);
}
