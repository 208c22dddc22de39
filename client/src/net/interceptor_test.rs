use std::rc::Rc;

use super::*;
use futures::executor::block_on;

use crate::net::transport::Method;
use crate::state::auth::AccessToken;
use crate::test_support::ScriptedTransport;

const BASE: &str = "/api/app/v1";
const TEAMS: &str = "/api/app/v1/teams";

fn interceptor(token: &LiveToken) -> (Rc<ScriptedTransport>, BearerInterceptor<Rc<ScriptedTransport>>) {
    let transport = ScriptedTransport::new();
    transport.respond(Method::Get, TEAMS, 200, "[]");
    let wrapped = BearerInterceptor::new(Rc::clone(&transport), BASE, token.clone());
    (transport, wrapped)
}

#[test]
fn injects_bearer_for_scoped_request() {
    let token = LiveToken::new();
    token.set(AccessToken::new("tok-1"));
    let (transport, wrapped) = interceptor(&token);

    block_on(wrapped.send(ApiRequest::get(TEAMS))).unwrap();

    let sent = &transport.requests()[0];
    assert_eq!(sent.headers.get("authorization"), Some("Bearer tok-1"));
    assert_eq!(sent.credentials, CredentialsMode::Include);
}

#[test]
fn passes_through_without_token() {
    let token = LiveToken::new();
    let (transport, wrapped) = interceptor(&token);

    let request = ApiRequest::get(TEAMS);
    block_on(wrapped.send(request.clone())).unwrap();
    assert_eq!(transport.requests()[0], request);
}

#[test]
fn never_overwrites_explicit_authorization_in_any_casing() {
    let token = LiveToken::new();
    token.set(AccessToken::new("tok-1"));
    let (_, wrapped) = interceptor(&token);

    for name in ["Authorization", "authorization", "AUTHORIZATION", "aUtHoRiZaTiOn"] {
        let request = ApiRequest::get(TEAMS).header(name, "Basic abc");
        let out = wrapped.apply(request.clone());
        assert_eq!(out, request, "header {name}");
        assert_eq!(out.headers.len(), 1);
    }
}

#[test]
fn leaves_out_of_scope_urls_alone() {
    let token = LiveToken::new();
    token.set(AccessToken::new("tok-1"));
    let (_, wrapped) = interceptor(&token);

    for url in ["/api/app/v10/teams", "/api/other", "https://cdn.example.com/api/app/v1/x", "/static/app.js"] {
        let out = wrapped.apply(ApiRequest::get(url));
        assert!(!out.headers.contains("Authorization"), "url {url}");
        assert_eq!(out.credentials, CredentialsMode::SameOrigin);
    }
    for url in [BASE, "/api/app/v1?x=1", "/api/app/v1/users/me"] {
        assert!(wrapped.apply(ApiRequest::get(url)).headers.contains("Authorization"), "url {url}");
    }
}

#[test]
fn picks_up_renewed_token_on_next_send() {
    let token = LiveToken::new();
    token.set(AccessToken::new("old"));
    let (transport, wrapped) = interceptor(&token);

    block_on(wrapped.send(ApiRequest::get(TEAMS))).unwrap();
    token.set(AccessToken::new("new"));
    block_on(wrapped.send(ApiRequest::get(TEAMS))).unwrap();

    let sent = transport.requests();
    assert_eq!(sent[0].headers.get("Authorization"), Some("Bearer old"));
    assert_eq!(sent[1].headers.get("Authorization"), Some("Bearer new"));
}

#[test]
fn no_stale_bearer_after_token_cleared() {
    let token = LiveToken::new();
    token.set(AccessToken::new("tok-1"));
    let (transport, wrapped) = interceptor(&token);

    token.clear();
    block_on(wrapped.send(ApiRequest::get(TEAMS))).unwrap();
    assert!(!transport.requests()[0].headers.contains("Authorization"));
}

#[test]
fn unauthorized_response_is_returned_not_retried() {
    let token = LiveToken::new();
    token.set(AccessToken::new("tok-1"));
    let (transport, wrapped) = interceptor(&token);
    transport.respond(Method::Get, TEAMS, 401, "");

    let resp = block_on(wrapped.send(ApiRequest::get(TEAMS))).unwrap();
    assert_eq!(resp.status, 401);
    assert_eq!(transport.count(Method::Get, TEAMS), 1);
}

#[test]
fn absolute_base_matches_absolute_urls() {
    let token = LiveToken::new();
    token.set(AccessToken::new("tok-1"));
    let wrapped = BearerInterceptor::new(ScriptedTransport::new(), "http://localhost:8000/api/app/v1/", token);

    assert!(wrapped.apply(ApiRequest::get("http://localhost:8000/api/app/v1/teams")).headers.contains("Authorization"));
    assert!(!wrapped.apply(ApiRequest::get("http://evil.example/api/app/v1/teams")).headers.contains("Authorization"));
}
