use super::*;
use futures::executor::block_on;
use futures::future::join;

use crate::net::transport::Method;
use crate::test_support::ScriptedTransport;

const URL: &str = "/api/app/v1/config";
const BODY: &str = r#"{"oidc_authority_url":"https://id.example.com","oidc_client_id":"portal"}"#;

fn fetcher(transport: &Rc<ScriptedTransport>) -> ConfigFetcher {
    ConfigFetcher::new(Rc::clone(transport) as Rc<dyn HttpTransport>, URL)
}

#[test]
fn concurrent_loads_share_one_request() {
    let transport = ScriptedTransport::new();
    transport.respond(Method::Get, URL, 200, BODY);
    let fetcher = fetcher(&transport);

    let (a, b) = block_on(join(fetcher.load(), fetcher.load()));
    assert_eq!(a, b);
    assert!(a.is_some());
    assert_eq!(transport.count(Method::Get, URL), 1);
}

#[test]
fn success_is_cached_for_later_calls() {
    let transport = ScriptedTransport::new();
    transport.respond(Method::Get, URL, 200, BODY);
    let fetcher = fetcher(&transport);

    assert!(fetcher.loaded().is_none());
    block_on(fetcher.load());
    block_on(fetcher.load());
    block_on(fetcher.retry());
    assert_eq!(transport.count(Method::Get, URL), 1);
    assert_eq!(fetcher.loaded().unwrap().client_id, "portal");
}

#[test]
fn failure_stays_cached_until_retry() {
    let transport = ScriptedTransport::new();
    transport.respond_once(Method::Get, URL, 503, "");
    transport.respond(Method::Get, URL, 200, BODY);
    let fetcher = fetcher(&transport);

    assert!(block_on(fetcher.load()).is_none());
    assert!(block_on(fetcher.load()).is_none());
    assert_eq!(transport.count(Method::Get, URL), 1);
    assert!(fetcher.loaded().is_none());

    assert!(block_on(fetcher.retry()).is_some());
    assert_eq!(transport.count(Method::Get, URL), 2);
    assert!(fetcher.loaded().is_some());
}
