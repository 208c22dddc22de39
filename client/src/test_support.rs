//! In-crate fakes for the browser capabilities the bridge depends on.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::executor::LocalSpawner;
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;

use crate::idp::{IdpClient, IdpConnector, IdpError, IdpSettings, IdpSignal, IdpSignalSink, IdpSnapshot, IdpUser};
use crate::net::transport::{ApiRequest, ApiResponse, HttpTransport, Method, TransportError};
use crate::util::navigation::{Navigator, TaskSpawner};

// =============================================================================
// SUSPENSION
// =============================================================================

/// Returns `Pending` once so concurrent callers genuinely interleave.
#[derive(Default)]
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

impl TaskSpawner for LocalSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.spawn_local(task).expect("local pool is alive");
    }
}

// =============================================================================
// TRANSPORT
// =============================================================================

struct Route {
    method: Method,
    url: String,
    once: bool,
    reply: Result<ApiResponse, TransportError>,
}

/// Replies by `(method, url)`. One-shot replies win over standing ones;
/// unmatched requests get a 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: RefCell<Vec<Route>>,
    requests: RefCell<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn respond(&self, method: Method, url: &str, status: u16, body: &str) {
        self.push(method, url, false, Ok(ApiResponse::new(status, body)));
    }

    pub fn respond_once(&self, method: Method, url: &str, status: u16, body: &str) {
        self.push(method, url, true, Ok(ApiResponse::new(status, body)));
    }

    pub fn fail(&self, method: Method, url: &str) {
        self.push(method, url, false, Err(TransportError::Network("connection refused".to_owned())));
    }

    fn push(&self, method: Method, url: &str, once: bool, reply: Result<ApiResponse, TransportError>) {
        self.routes
            .borrow_mut()
            .push(Route { method, url: url.to_owned(), once, reply });
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.borrow().clone()
    }

    pub fn count(&self, method: Method, url: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }
}

#[async_trait::async_trait(?Send)]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.borrow_mut().push(request.clone());
        YieldNow::default().await;

        let mut routes = self.routes.borrow_mut();
        let matches = |r: &Route| r.method == request.method && r.url == request.url;
        if let Some(pos) = routes.iter().position(|r| r.once && matches(r)) {
            return routes.remove(pos).reply;
        }
        routes
            .iter()
            .rev()
            .find(|r| !r.once && matches(r))
            .map_or_else(|| Ok(ApiResponse::new(404, "")), |r| r.reply.clone())
    }
}

// =============================================================================
// IDENTITY PROVIDER
// =============================================================================

pub fn idp_user(email: &str, token: &str, expires_at: Option<i64>) -> IdpUser {
    serde_json::from_value(serde_json::json!({
        "access_token": token,
        "expires_at": expires_at,
        "profile": { "email": email },
    }))
    .expect("valid user")
}

pub const FAR_FUTURE: i64 = 4_102_444_800;

pub struct FakeIdp {
    snapshot: RefCell<IdpSnapshot>,
    sink: RefCell<Option<IdpSignalSink>>,
    pub signin_calls: Cell<usize>,
    pub signout_calls: Cell<usize>,
    pub silent_calls: Cell<usize>,
    signin_result: RefCell<Result<(), IdpError>>,
    signout_result: RefCell<Result<(), IdpError>>,
    silent_result: RefCell<Result<IdpUser, IdpError>>,
}

impl FakeIdp {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            snapshot: RefCell::new(IdpSnapshot { loading: false, user: None }),
            sink: RefCell::new(None),
            signin_calls: Cell::new(0),
            signout_calls: Cell::new(0),
            silent_calls: Cell::new(0),
            signin_result: RefCell::new(Ok(())),
            signout_result: RefCell::new(Ok(())),
            silent_result: RefCell::new(Err(IdpError::Other("no silent result scripted".to_owned()))),
        })
    }

    pub fn set_snapshot(&self, snapshot: IdpSnapshot) {
        *self.snapshot.borrow_mut() = snapshot;
    }

    pub fn fail_signin(&self, err: IdpError) {
        *self.signin_result.borrow_mut() = Err(err);
    }

    pub fn fail_signout(&self, err: IdpError) {
        *self.signout_result.borrow_mut() = Err(err);
    }

    pub fn set_silent_result(&self, result: Result<IdpUser, IdpError>) {
        *self.silent_result.borrow_mut() = result;
    }

    pub fn is_subscribed(&self) -> bool {
        self.sink.borrow().is_some()
    }

    pub fn emit(&self, signal: IdpSignal) {
        let sink = self.sink.borrow().clone();
        if let Some(sink) = sink {
            sink(signal);
        }
    }
}

#[async_trait::async_trait(?Send)]
impl IdpClient for FakeIdp {
    fn snapshot(&self) -> IdpSnapshot {
        self.snapshot.borrow().clone()
    }

    fn subscribe(&self, sink: IdpSignalSink) {
        *self.sink.borrow_mut() = Some(sink);
    }

    async fn signin_redirect(&self) -> Result<(), IdpError> {
        self.signin_calls.set(self.signin_calls.get() + 1);
        YieldNow::default().await;
        self.signin_result.borrow().clone()
    }

    async fn signout_redirect(&self) -> Result<(), IdpError> {
        self.signout_calls.set(self.signout_calls.get() + 1);
        YieldNow::default().await;
        self.signout_result.borrow().clone()
    }

    async fn signin_silent(&self) -> Result<IdpUser, IdpError> {
        self.silent_calls.set(self.silent_calls.get() + 1);
        YieldNow::default().await;
        self.silent_result.borrow().clone()
    }
}

pub struct FakeConnector {
    pub idp: Rc<FakeIdp>,
    pub connected: RefCell<Vec<IdpSettings>>,
}

impl FakeConnector {
    pub fn new(idp: Rc<FakeIdp>) -> Rc<Self> {
        Rc::new(Self { idp, connected: RefCell::new(Vec::new()) })
    }
}

impl IdpConnector for FakeConnector {
    fn connect(&self, settings: &IdpSettings) -> Rc<dyn IdpClient> {
        self.connected.borrow_mut().push(settings.clone());
        Rc::clone(&self.idp) as Rc<dyn IdpClient>
    }
}

// =============================================================================
// NAVIGATION
// =============================================================================

pub struct RecordingNavigator {
    path: RefCell<String>,
    pub replaced: RefCell<Vec<String>>,
}

impl RecordingNavigator {
    pub fn at(path: &str) -> Rc<Self> {
        Rc::new(Self { path: RefCell::new(path.to_owned()), replaced: RefCell::new(Vec::new()) })
    }

    pub fn go(&self, path: &str) {
        *self.path.borrow_mut() = path.to_owned();
    }

    pub fn replaced(&self) -> Vec<String> {
        self.replaced.borrow().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.path.borrow().clone()
    }

    fn origin(&self) -> String {
        "https://portal.example.com".to_owned()
    }

    fn replace(&self, path: &str) {
        self.go(path);
        self.replaced.borrow_mut().push(path.to_owned());
    }
}
