//! End-to-end tests: map objects, then drive the resulting router over HTTP
//! semantics with the in-process test client.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use automap::introspection::ROUTES_PATH;
use automap::prelude::*;
use automap::testing::TestClient;

fn math() -> Module {
    Module::new("math")
        .function("add", &["a", "b"], |a: i64, b: i64| a + b)
        .function("scale", &["x", "factor"], |x: f64, factor: Option<f64>| {
            x * factor.unwrap_or(1.0)
        })
        .function("echo", &["value"], |value: Value| value)
        .function("sqrt", &["x"], |x: f64| {
            if x < 0.0 {
                Err("math domain error")
            } else {
                Ok(x.sqrt())
            }
        })
        .function("truthy", &["flag"], |flag: bool| flag)
        .value("pi", std::f64::consts::PI)
}

fn client_for(obj: &impl Exposable) -> TestClient {
    let mut mapper = Mapper::new();
    mapper.map(obj).unwrap();
    TestClient::new(mapper.into_router())
}

#[tokio::test]
async fn test_positional_arguments() {
    let client = client_for(&math());

    let response = client.get("/math/add?_args=i:3;i:4").send().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text(), "7");
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/plain; charset=utf-8"
    );
}

#[tokio::test]
async fn test_untagged_argument_is_string() {
    let client = client_for(&math());

    let response = client.get("/math/echo?_args=hello").send().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text(), "hello");
}

#[tokio::test]
async fn test_keyword_arguments() {
    let client = client_for(&math());

    let response = client.get("/math/scale?x=f:2.5").send().await;
    assert_eq!(response.text(), "2.5");

    let response = client.get("/math/scale?x=f:2.5&factor=i:4").send().await;
    assert_eq!(response.text(), "10.0");

    let response = client.get("/math/add?_args=i:1&b=i:2").send().await;
    assert_eq!(response.text(), "3");
}

#[tokio::test]
async fn test_boolean_tag() {
    let client = client_for(&math());

    for raw in ["Yes", "1", "true", "T", "y"] {
        let response = client.get(&format!("/math/truthy?flag=b:{raw}")).send().await;
        assert_eq!(response.text(), "True", "b:{raw}");
    }
    for raw in ["no", "0", "anything-else", ""] {
        let response = client.get(&format!("/math/truthy?flag=b:{raw}")).send().await;
        assert_eq!(response.text(), "False", "b:{raw}");
    }
}

#[tokio::test]
async fn test_complex_tag() {
    let client = client_for(&math());

    let response = client.get("/math/echo?value=c:1%2B2j").send().await;
    assert_eq!(response.text(), "(1+2j)");

    let response = client.get("/math/echo?value=c:3j").send().await;
    assert_eq!(response.text(), "3j");
}

#[tokio::test]
async fn test_unknown_tag_is_stripped() {
    let client = client_for(&math());

    let response = client.get("/math/echo?value=zz:hello").send().await;
    assert_eq!(response.text(), "hello");
}

#[tokio::test]
async fn test_unknown_tag_verbatim_policy() {
    let config = MapperConfig {
        fallback: FallbackPolicy::Verbatim,
        ..MapperConfig::default()
    };
    let mut mapper = Mapper::with_config(config);
    mapper.map(&math()).unwrap();
    let client = TestClient::new(mapper.into_router());

    let response = client.get("/math/echo?value=zz:hello").send().await;
    assert_eq!(response.text(), "zz:hello");
}

#[tokio::test]
async fn test_value_route_returns_snapshot() {
    struct Counter(Arc<AtomicI64>);

    impl Exposable for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn members(&self) -> Vec<Member> {
            vec![Member::value("count", self.0.load(Ordering::SeqCst))]
        }
    }

    let live = Arc::new(AtomicI64::new(1));
    let client = client_for(&Counter(live.clone()));
    live.store(42, Ordering::SeqCst);

    let response = client.get("/counter/count").send().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text(), "1");
}

#[tokio::test]
async fn test_value_route_ignores_query() {
    let client = client_for(&math());

    let response = client.get("/math/pi?_args=i:1").send().await;
    assert_eq!(response.text(), std::f64::consts::PI.to_string());
}

#[tokio::test]
async fn test_nesting_beyond_depth_is_dropped() {
    fn level(n: usize) -> Module {
        let module = Module::new(format!("l{n}")).function("id", &[], move || n as i64);
        if n < 6 {
            module.module(format!("l{}", n + 1), level(n + 1))
        } else {
            module
        }
    }

    let mut mapper = Mapper::new();
    assert_eq!(mapper.map(&level(1)), Ok(5));
    let client = TestClient::new(mapper.into_router());

    let response = client.get("/l1/l2/l3/l4/l5/id").send().await;
    assert_eq!(response.text(), "5");

    let response = client.get("/l1/l2/l3/l4/l5/l6/id").send().await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_custom_type_handler() {
    let mut mapper = Mapper::new();
    mapper.register_type_handler("h", |raw| {
        i64::from_str_radix(raw, 16)
            .map(Value::Int)
            .map_err(|e| CoerceError::new("h", raw, e))
    });
    mapper.map(&math()).unwrap();
    let client = TestClient::new(mapper.into_router());

    let response = client.get("/math/echo?_args=h:ff").send().await;
    assert_eq!(response.text(), "255");
}

#[tokio::test]
async fn test_type_handler_registered_after_map_is_not_seen() {
    let mut mapper = Mapper::new();
    mapper.map(&math()).unwrap();
    mapper.register_type_handler("h", |raw| {
        i64::from_str_radix(raw, 16)
            .map(Value::Int)
            .map_err(|e| CoerceError::new("h", raw, e))
    });
    let client = TestClient::new(mapper.into_router());

    let response = client.get("/math/echo?_args=h:ff").send().await;
    assert_eq!(response.text(), "ff");
}

#[tokio::test]
async fn test_failing_callable_returns_500() {
    let client = client_for(&math());

    let response = client.get("/math/sqrt?x=i:-1").send().await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text(), "math domain error");
}

#[tokio::test]
async fn test_panicking_callable_returns_500() {
    let module = Module::new("boom").function("now", &[], || -> i64 { panic!("kaboom") });
    let client = client_for(&module);

    let response = client.get("/boom/now").send().await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text(), "callable panicked: kaboom");
}

#[tokio::test]
async fn test_binding_errors_return_500() {
    let client = client_for(&math());

    let response = client.get("/math/add?_args=i:1;i:2;i:3").send().await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.text(),
        "takes 2 positional arguments but 3 were given"
    );

    let response = client.get("/math/add?_args=i:1").send().await;
    assert_eq!(response.text(), "missing required argument: 'b'");

    let response = client.get("/math/add?_args=i:1&a=i:2").send().await;
    assert_eq!(response.text(), "got multiple values for argument 'a'");

    let response = client.get("/math/add?c=i:1").send().await;
    assert_eq!(response.text(), "got an unexpected keyword argument 'c'");

    let response = client.get("/math/add?_args=one;two").send().await;
    assert_eq!(response.text(), "argument 'a' must be int, not str");
}

#[tokio::test]
async fn test_malformed_tagged_value_returns_500() {
    let client = client_for(&math());

    let response = client.get("/math/add?_args=i:abc;i:1").send().await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.text().starts_with("cannot coerce 'abc' with tag 'i'"));
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let client = client_for(&math());

    let response = client.get("/math/missing").send().await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.text().is_empty());

    let response = client.post("/math/add").send().await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_private_members_are_not_routed() {
    let module = Module::new("svc")
        .function("_internal", &[], || 1)
        .value("_token", "secret")
        .value("version", "1.0");
    let client = client_for(&module);

    assert_eq!(client.get("/svc/version").send().await.text(), "1.0");
    assert_eq!(
        client.get("/svc/_internal").send().await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        client.get("/svc/_token").send().await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_repeated_keys_first_wins() {
    let client = client_for(&math());

    let response = client
        .get("/math/add?_args=i:1;i:2&_args=i:10;i:20")
        .send()
        .await;
    assert_eq!(response.text(), "3");

    let response = client.get("/math/add?a=i:1&b=i:2&b=i:9").send().await;
    assert_eq!(response.text(), "3");
}

#[tokio::test]
async fn test_empty_positional_means_none() {
    let client = client_for(&math());

    let response = client.get("/math/scale?_args=&x=f:1.5").send().await;
    assert_eq!(response.text(), "1.5");
}

#[tokio::test]
async fn test_collision_rejects_whole_object() {
    let mut mapper = Mapper::new();
    mapper.map(&math()).unwrap();

    let clash = Module::new("math")
        .value("fresh", 1)
        .value("pi", 3);
    let err = mapper.map(&clash).unwrap_err();
    assert_eq!(err.to_string(), "route GET /math/pi is already registered");

    let client = TestClient::new(mapper.into_router());
    assert_eq!(
        client.get("/math/fresh").send().await.status(),
        StatusCode::NOT_FOUND
    );
    assert_ne!(client.get("/math/pi").send().await.text(), "3");
}

#[tokio::test]
async fn test_overwrite_policy_last_wins() {
    let config = MapperConfig {
        on_collision: CollisionPolicy::Overwrite,
        ..MapperConfig::default()
    };
    let mut mapper = Mapper::with_config(config);
    mapper.map(&math()).unwrap();
    mapper.map(&Module::new("math").value("pi", 3)).unwrap();
    let client = TestClient::new(mapper.into_router());

    assert_eq!(client.get("/math/pi").send().await.text(), "3");
}

#[tokio::test]
async fn test_configured_methods_and_positional_key() {
    let config = MapperConfig {
        methods: vec![Method::GET, Method::POST],
        positional_key: "args".to_string(),
        separator: ',',
        ..MapperConfig::default()
    };
    let mut mapper = Mapper::with_config(config);
    mapper.map(&math()).unwrap();
    let client = TestClient::new(mapper.into_router());

    let response = client.post("/math/add?args=i:5,i:6").send().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text(), "11");
}

#[tokio::test]
async fn test_existing_router_routes_are_kept() {
    let router = Router::new().get("/health", |_| async { "ok" });
    let mut mapper = Mapper::with_router(router, MapperConfig::default());
    mapper.map(&math()).unwrap();
    let client = TestClient::new(mapper.into_router());

    assert_eq!(client.get("/health").send().await.text(), "ok");
    assert_eq!(client.get("/math/add?a=i:1&b=i:1").send().await.text(), "2");
}

#[tokio::test]
async fn test_introspection_lists_routes() {
    let config = MapperConfig {
        introspection: true,
        ..MapperConfig::default()
    };
    let mut mapper = Mapper::with_config(config);
    mapper
        .map(&Module::new("calc").function("neg", &["x"], |x: i64| -x).value("e", 2.5))
        .unwrap();
    let client = TestClient::new(mapper.into_router());

    let response = client.get(ROUTES_PATH).send().await;
    assert_eq!(response.status(), StatusCode::OK);

    let routes: serde_json::Value = response.json();
    assert_eq!(
        routes,
        serde_json::json!([
            { "method": "GET", "path": "/calc/e", "kind": "value" },
            { "method": "GET", "path": "/calc/neg", "kind": "function" },
        ])
    );
}

#[tokio::test]
async fn test_nested_route_uses_module_name() {
    let root = Module::new("app").module(
        "helpers",
        Module::new("strings").function("upper", &["s"], |s: String| s.to_uppercase()),
    );
    let client = client_for(&root);

    let response = client.get("/app/strings/upper?s=abc").send().await;
    assert_eq!(response.text(), "ABC");

    let response = client.get("/app/helpers/upper?s=abc").send().await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_name_unusable_in_path_is_rejected() {
    let mut mapper = Mapper::new();
    let err = mapper
        .map(&Module::new("svc").value("two words", 1))
        .unwrap_err();
    assert_eq!(
        err,
        MapError::InvalidSegment {
            path: "/svc/two words".into(),
            segment: "two words".into(),
        }
    );
    assert!(mapper.routes().is_empty());
}

#[tokio::test]
async fn test_mapped_route_cannot_shadow_introspection() {
    let config = MapperConfig {
        introspection: true,
        ..MapperConfig::default()
    };
    let mut mapper = Mapper::with_config(config);
    let shadow = Module::new("__automap").value("routes", "mine");

    assert!(matches!(
        mapper.map(&shadow),
        Err(MapError::DuplicateRoute { .. })
    ));
}
