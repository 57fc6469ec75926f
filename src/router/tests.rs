use serde_json::json;

use super::{MvpParams, RouteMatch, Router};
use crate::request::{Params, Request};

fn noop_handler() -> impl Fn(
    &crate::application::App,
    &mut Request,
    &super::RouteParams,
) -> Result<Option<serde_json::Value>, crate::error::Error>
       + Send
       + Sync
       + 'static {
    |_, _, _| Ok(None)
}

fn match_mvp(router: &Router, path: &str) -> MvpParams {
    match router.matches(&Request::new(path, Params::new())) {
        Some(RouteMatch::Mvp(params)) => params,
        Some(RouteMatch::Handler { .. }) => panic!("expected MVP match for {path}"),
        None => panic!("expected a match for {path}"),
    }
}

#[test]
fn first_matching_rule_wins() {
    let mut router = Router::new();
    router
        .add("/ping", |_, _, _| Ok(Some(json!("first"))))
        .expect("register");
    router
        .add("/ping", |_, _, _| Ok(Some(json!("second"))))
        .expect("register");

    let request = Request::new("/ping", Params::new());
    match router.matches(&request) {
        Some(RouteMatch::Handler { handler, params }) => {
            let mut request = Request::new("/ping", Params::new());
            let app = crate::application::App::new(crate::config::Config::new())
                .expect("app");
            let value = handler(&app, &mut request, &params).expect("handler runs");
            assert_eq!(value, Some(json!("first")));
        }
        _ => panic!("expected handler match"),
    }
}

#[test]
fn literal_match_is_exact_and_case_sensitive() {
    let mut router = Router::new();
    router.add("/Ping", noop_handler()).expect("register");

    assert!(router.matches(&Request::new("/Ping", Params::new())).is_some());
    assert!(router.matches(&Request::new("/ping", Params::new())).is_none());
    assert!(router.matches(&Request::new("/Ping/", Params::new())).is_none());
}

#[test]
fn pattern_match_merges_named_and_positional_captures() {
    let mut router = Router::new();
    router
        .add_pattern(r"^/user/(?P<id>\d+)$", noop_handler())
        .expect("register");

    match router.matches(&Request::new("/user/42", Params::new())) {
        Some(RouteMatch::Handler { params, .. }) => {
            assert_eq!(params.get("id").map(String::as_str), Some("42"));
            assert_eq!(params.get("0").map(String::as_str), Some("/user/42"));
            assert_eq!(params.get("1").map(String::as_str), Some("42"));
        }
        _ => panic!("expected handler match"),
    }
}

#[test]
fn invalid_pattern_fails_at_registration() {
    let mut router = Router::new();
    assert!(router.add_pattern(r"^/user/(", noop_handler()).is_err());
}

#[test]
fn predicate_rule_matches_on_request() {
    let mut router = Router::new();
    router
        .add_callback(
            |request| request.params.contains_key("beacon"),
            noop_handler(),
        )
        .expect("register");

    let mut params = Params::new();
    params.insert("beacon".to_string(), json!(1));
    assert!(router.matches(&Request::new("/anything", params)).is_some());
    assert!(router
        .matches(&Request::new("/anything", Params::new()))
        .is_none());
}

#[test]
fn mvp_must_be_registered_last_and_only_once() {
    let mut router = Router::new();
    router.add("/first", noop_handler()).expect("register");
    router.add_mvp("app").expect("mvp as last rule");

    assert!(router.add_mvp("app").is_err());
    assert!(router.add("/late", noop_handler()).is_err());
    assert!(router
        .add_callback(|_| true, noop_handler())
        .is_err());
}

#[test]
fn mvp_parses_presenter_id_and_action() {
    let mut router = Router::new();
    router.add_mvp("app").expect("register");

    let params = match_mvp(&router, "/user-42/edit");
    assert_eq!(params.namespace, "app");
    assert_eq!(params.presenter, "user");
    assert_eq!(params.id.as_deref(), Some("42"));
    assert_eq!(params.action, "edit");
    assert_eq!(params.extended_path, "");
}

#[test]
fn mvp_root_path_uses_defaults() {
    let mut router = Router::new();
    router.add_mvp("app").expect("register");

    let params = match_mvp(&router, "/");
    assert_eq!(params.presenter, "home");
    assert_eq!(params.action, "default");
    assert_eq!(params.id, None);
    assert_eq!(params.extended_path, "");
}

#[test]
fn mvp_folds_extra_segments_into_extended_path() {
    let mut router = Router::new();
    router.add_mvp("app").expect("register");

    let params = match_mvp(&router, "/blog/show/2024/05/hello-world");
    assert_eq!(params.presenter, "blog");
    assert_eq!(params.action, "show");
    assert_eq!(params.extended_path, "/2024/05/hello-world");
}

#[test]
fn earlier_rules_shadow_the_mvp_rule() {
    let mut router = Router::new();
    router.add("/status", noop_handler()).expect("register");
    router.add_mvp("app").expect("register");

    match router.matches(&Request::new("/status", Params::new())) {
        Some(RouteMatch::Handler { .. }) => {}
        _ => panic!("literal rule should win over MVP"),
    }
    match router.matches(&Request::new("/status/extra", Params::new())) {
        Some(RouteMatch::Mvp(params)) => assert_eq!(params.presenter, "status"),
        _ => panic!("MVP should classify unmatched paths"),
    }
}

#[test]
fn reordering_non_overlapping_rules_is_observationally_equal() {
    let build = |flipped: bool| {
        let mut router = Router::new();
        let (a, b): (&str, &str) = if flipped {
            ("/b", "/a")
        } else {
            ("/a", "/b")
        };
        router.add(a, noop_handler()).expect("register");
        router.add(b, noop_handler()).expect("register");
        router
    };

    for flipped in [false, true] {
        let router = build(flipped);
        assert!(router.matches(&Request::new("/a", Params::new())).is_some());
        assert!(router.matches(&Request::new("/b", Params::new())).is_some());
        assert!(router.matches(&Request::new("/c", Params::new())).is_none());
    }
}
