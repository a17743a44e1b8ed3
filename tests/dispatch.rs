//! Integration tests for the dispatch engine: matching, interceptor
//! ordering, and failure translation, with no network involved.

use axum::http::{Method, StatusCode};
use serde_json::json;
use std::sync::{Arc, Mutex};

use micro_router::errors::BoxError;
use micro_router::interceptor::{Flow, InterceptContext, Interceptor};
use micro_router::{App, Handler, RegistrationError, RequestContext, ResponseState};

/// Interceptor that records its before/after invocations into a shared log.
struct Recorder {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn register(app: &mut App, name: &'static str, log: &Arc<Mutex<Vec<String>>>) {
        app.interceptor(
            name,
            Arc::new(Recorder {
                name,
                log: log.clone(),
            }),
        );
    }
}

impl Interceptor for Recorder {
    fn before(&self, _ctx: &mut InterceptContext<'_>) -> Result<Flow, BoxError> {
        self.log.lock().unwrap().push(format!("{}:before", self.name));
        Ok(Flow::Continue)
    }

    fn after(&self, _ctx: &mut InterceptContext<'_>) -> Result<(), BoxError> {
        self.log.lock().unwrap().push(format!("{}:after", self.name));
        Ok(())
    }
}

/// Before-interceptor that writes a 403 and halts dispatch.
struct Gate;

impl Interceptor for Gate {
    fn before(&self, ctx: &mut InterceptContext<'_>) -> Result<Flow, BoxError> {
        ctx.response
            .set_response("denied", Some(StatusCode::FORBIDDEN), None, false);
        Ok(Flow::Halt)
    }
}

/// After-interceptor that always fails.
struct Flaky;

impl Interceptor for Flaky {
    fn after(&self, _ctx: &mut InterceptContext<'_>) -> Result<(), BoxError> {
        Err("flaky after hook".into())
    }
}

fn logging_handler(tag: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Handler {
    let log = log.clone();
    Arc::new(move |_req, res, _params| {
        log.lock().unwrap().push(format!("{}:handle", tag));
        res.set_response(tag, None, None, false);
        Ok(())
    })
}

fn get(path: &str) -> RequestContext {
    RequestContext::new(Method::GET, path)
}

fn body_json(res: &ResponseState) -> serde_json::Value {
    serde_json::from_str(res.body()).unwrap()
}

#[test]
fn test_handler_receives_params_in_placeholder_order() {
    let mut app = App::new();
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_by_handler = seen.clone();

    app.get("/users/{uid}/posts/{pid:int}", move |_req, res, params| {
        seen_by_handler.lock().unwrap().extend(params.iter().cloned());
        res.set_response("ok", None, None, false);
        Ok(())
    })
    .unwrap();

    let res = app.dispatch(&get("/users/alice/posts/42"));
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(*seen.lock().unwrap(), vec!["alice", "42"]);
}

#[test]
fn test_segment_count_mismatch_is_404() {
    let mut app = App::new();
    app.get("/a/{b}", |_req, res, _p| {
        res.set_response("ok", None, None, false);
        Ok(())
    })
    .unwrap();

    for path in ["/a", "/a/b/c", "/"] {
        let res = app.dispatch(&get(path));
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "path {path}");
        assert_eq!(
            body_json(&res),
            json!({"error": {"code": 404, "message": "Not Found"}})
        );
    }
}

#[test]
fn test_first_registered_route_wins() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut app = App::new();
    app.route(Method::GET, "/users/me", logging_handler("literal", &log), &[], &[])
        .unwrap();
    app.route(Method::GET, "/users/{id}", logging_handler("param", &log), &[], &[])
        .unwrap();

    let res = app.dispatch(&get("/users/me"));
    assert_eq!(res.body(), "literal");
    // Exactly one handler ran.
    assert_eq!(*log.lock().unwrap(), vec!["literal:handle"]);
}

#[test]
fn test_trailing_slash_matches_normalized_route() {
    let mut app = App::new();
    app.get("/users/{id}", |_req, res, params| {
        res.set_response(params[0].clone(), None, None, false);
        Ok(())
    })
    .unwrap();

    let res = app.dispatch(&get("/users/42/"));
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body(), "42");
}

#[test]
fn test_interceptor_ordering_and_dedupe() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut app = App::new();
    Recorder::register(&mut app, "global", &log);
    Recorder::register(&mut app, "explicit", &log);

    app.before(["global"]);
    app.after(["global"]);
    // "global" is also listed explicitly; it must run exactly once, in its
    // global position.
    app.route(
        Method::GET,
        "/x",
        logging_handler("h", &log),
        &["explicit", "global"],
        &["explicit"],
    )
    .unwrap();

    let res = app.dispatch(&get("/x"));
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "global:before",
            "explicit:before",
            "h:handle",
            "explicit:after",
            "global:after",
        ]
    );
}

#[test]
fn test_scoped_interceptors_apply_only_inside_load() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut app = App::new();
    Recorder::register(&mut app, "scoped", &log);

    let in_scope = logging_handler("in", &log);
    app.load(move |app| {
        app.scoped_before(["scoped"]);
        app.route(Method::GET, "/in", in_scope, &[], &[])
    })
    .unwrap();
    app.route(Method::GET, "/out", logging_handler("out", &log), &[], &[])
        .unwrap();

    app.dispatch(&get("/in"));
    app.dispatch(&get("/out"));
    assert_eq!(
        *log.lock().unwrap(),
        vec!["scoped:before", "in:handle", "out:handle"]
    );
}

#[test]
fn test_halt_skips_handler_and_after() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut app = App::new();
    app.interceptor("gate", Arc::new(Gate));
    Recorder::register(&mut app, "tail", &log);

    app.route(
        Method::GET,
        "/secret",
        logging_handler("h", &log),
        &["gate"],
        &["tail"],
    )
    .unwrap();

    let res = app.dispatch(&get("/secret"));
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(res.body(), "denied");
    // Neither the handler nor the after-interceptor ran.
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_handler_failure_becomes_correlated_500() {
    let mut app = App::new();
    app.get("/boom", |_req, _res, _p| Err("kaboom".into())).unwrap();

    let res = app.dispatch(&get("/boom"));
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(&res);
    assert_eq!(body["error"]["code"], 500);
    assert_eq!(body["error"]["message"], "Internal Server Error");
    assert_eq!(body["error"]["error_id"].as_str().unwrap().len(), 12);
    assert!(body["error"]["trace"].is_null());
}

#[test]
fn test_debug_mode_exposes_trace() {
    let mut app = App::new().with_debug(true);
    app.get("/boom", |_req, _res, _p| Err("kaboom".into())).unwrap();

    let res = app.dispatch(&get("/boom"));
    let body = body_json(&res);
    assert!(body["error"]["trace"].as_str().unwrap().contains("kaboom"));
}

#[test]
fn test_failure_overrides_finalized_response() {
    let mut app = App::new();
    app.get("/boom", |_req, res, _p| {
        res.set_response("partial", Some(StatusCode::OK), None, false);
        Err("failed after writing".into())
    })
    .unwrap();

    let res = app.dispatch(&get("/boom"));
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(&res)["error"]["code"], 500);
}

#[test]
fn test_before_failure_skips_handler() {
    struct Broken;
    impl Interceptor for Broken {
        fn before(&self, _ctx: &mut InterceptContext<'_>) -> Result<Flow, BoxError> {
            Err("auth backend down".into())
        }
    }

    let log = Arc::new(Mutex::new(Vec::new()));
    let mut app = App::new();
    app.interceptor("broken", Arc::new(Broken));
    app.route(Method::GET, "/x", logging_handler("h", &log), &["broken"], &[])
        .unwrap();

    let res = app.dispatch(&get("/x"));
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_after_failure_preserves_response() {
    let mut app = App::new();
    app.interceptor("flaky", Arc::new(Flaky));
    app.route(
        Method::GET,
        "/x",
        Arc::new(|_req, res: &mut ResponseState, _p: &[String]| {
            res.set_response("fine", Some(StatusCode::OK), None, false);
            Ok(())
        }),
        &[],
        &["flaky"],
    )
    .unwrap();

    let res = app.dispatch(&get("/x"));
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body(), "fine");
}

#[test]
fn test_registration_rejects_bad_definitions() {
    let mut app = App::new();
    let err = app.get("/x/{id:uuid}", |_req, _res, _p| Ok(())).unwrap_err();
    assert!(matches!(err, RegistrationError::UnsupportedParamType { .. }));

    app.get("/dup", |_req, _res, _p| Ok(())).unwrap();
    let err = app.get("/dup/", |_req, _res, _p| Ok(())).unwrap_err();
    assert!(matches!(err, RegistrationError::DuplicateRoute { .. }));

    let err = app
        .route(
            Method::GET,
            "/y",
            Arc::new(|_req: &RequestContext, _res: &mut ResponseState, _p: &[String]| Ok(())),
            &["missing"],
            &[],
        )
        .unwrap_err();
    assert!(matches!(err, RegistrationError::UnknownInterceptor { .. }));
}
