//! Router-level tests driven in-process with `tower::ServiceExt::oneshot`

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use followgraph_api::{auth::authorization_header, build_router, AppState};
use followgraph_core::config::Config;
use followgraph_core::core_admission::AdmissionQueue;
use followgraph_core::test_utils::{
    memory_store, test_auth_config, TEST_CLIENT_ID, TEST_CLIENT_SECRET,
};
use followgraph_core::Credentials;
use serde_json::{json, Value};
use tower::ServiceExt;

fn router() -> Router {
    let mut config = Config::default();
    config.auth = test_auth_config();
    let state = AppState::new(&config, memory_store()).unwrap();
    build_router(Arc::new(state))
}

fn client() -> Credentials {
    Credentials::consumer(TEST_CLIENT_ID, TEST_CLIENT_SECRET)
}

struct User {
    id: String,
    credentials: Credentials,
}

fn request(method: Method, uri: &str, credentials: Option<&Credentials>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(credentials) = credentials {
        builder = builder.header(header::AUTHORIZATION, authorization_header(credentials));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

async fn register(router: &Router, nickname: &str, password: &str) -> User {
    let body = json!({ "nickname": nickname, "password": password });
    let (status, body) = send(
        router,
        request(Method::POST, "/api/users", Some(&client()), Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let credentials = client().with_token(
        body["token"].as_str().unwrap(),
        body["token_secret"].as_str().unwrap(),
    );
    User {
        id: body["profile"]["id"].as_str().unwrap().to_string(),
        credentials,
    }
}

fn follow_body(target: &User) -> Value {
    json!({ "verb": "follow", "object": { "objectType": "person", "id": target.id } })
}

async fn follow(router: &Router, source: &str, user: &User, target: &User) -> StatusCode {
    let uri = format!("/api/user/{}/feed", source);
    let req = request(Method::POST, &uri, Some(&user.credentials), Some(follow_body(target)));
    send(router, req).await.0
}

async fn get(router: &Router, uri: &str, credentials: Option<&Credentials>) -> (StatusCode, Value) {
    send(router, request(Method::GET, uri, credentials, None)).await
}

#[tokio::test]
async fn health_needs_no_credentials() {
    let (status, body) = get(&router(), "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn client_registration_then_user_registration() {
    let router = router();
    let (status, body) = send(
        &router,
        request(
            Method::POST,
            "/api/client/register",
            None,
            Some(json!({ "type": "client_associate", "application_name": "loader" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expires_at"], 0);

    let fresh = Credentials::consumer(
        body["client_id"].as_str().unwrap(),
        body["client_secret"].as_str().unwrap(),
    );
    let (status, body) = send(
        &router,
        request(
            Method::POST,
            "/api/users",
            Some(&fresh),
            Some(json!({ "nickname": "tyrion", "password": "payURdebts", "displayName": "Tyrion" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["id"], "acct:tyrion@localhost");
    assert_eq!(body["profile"]["displayName"], "Tyrion");

    let (status, body) = send(
        &router,
        request(
            Method::POST,
            "/api/client/register",
            None,
            Some(json!({ "type": "client_update" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadRequest");
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let router = router();
    register(&router, "cersei", "i{heart}p0wer").await;

    let body = json!({ "nickname": "cersei", "password": "another-pass" });
    let (status, body) = send(
        &router,
        request(Method::POST, "/api/users", Some(&client()), Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflict");
}

#[tokio::test]
async fn empty_collection_shape() {
    let router = router();
    register(&router, "tyrion", "payURdebts").await;

    let (status, body) = get(&router, "/api/user/tyrion/followers", Some(&client())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["author"]["id"], "acct:tyrion@localhost");
    assert_eq!(body["author"]["objectType"], "person");
    assert_eq!(body["totalItems"], 0);
    assert_eq!(body["items"], json!([]));
    assert_eq!(body["displayName"], "Followers for tyrion");
    assert_eq!(body["id"], "http://localhost:4815/api/user/tyrion/followers");
    assert_eq!(body["itemsPerPage"], 20);
    assert_eq!(body["startIndex"], 0);
    assert!(body["links"]["self"]["href"].is_string());
    assert!(body["links"]["current"]["href"].is_string());
    assert!(body["links"].get("next").is_none());
    assert!(body["links"].get("prev").is_none());
    assert_eq!(body["objectTypes"], json!(["person"]));
}

#[tokio::test]
async fn access_matrix() {
    let router = router();
    let robb = register(&router, "robb", "gr3yw1nd").await;
    let tywin = register(&router, "tywin", "c4st3rly*r0ck").await;
    let uri = "/api/user/robb/following";

    assert_eq!(get(&router, uri, None).await.0, StatusCode::UNAUTHORIZED);

    let bad_consumer = Credentials::consumer(TEST_CLIENT_ID, "wrong");
    assert_eq!(get(&router, uri, Some(&bad_consumer)).await.0, StatusCode::UNAUTHORIZED);

    let bad_consumer_good_token = robb.credentials.clone();
    let bad_consumer_good_token = Credentials {
        consumer_secret: "wrong".to_string(),
        ..bad_consumer_good_token
    };
    assert_eq!(
        get(&router, uri, Some(&bad_consumer_good_token)).await.0,
        StatusCode::UNAUTHORIZED
    );

    let bad_token = client().with_token("nope", "nope");
    assert_eq!(get(&router, uri, Some(&bad_token)).await.0, StatusCode::UNAUTHORIZED);

    let (status, consumer_view) = get(&router, uri, Some(&client())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, own_view) = get(&router, uri, Some(&robb.credentials)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(own_view, consumer_view);

    let (status, third_party_view) = get(&router, uri, Some(&tywin.credentials)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(third_party_view, consumer_view);
}

#[tokio::test]
async fn options_reports_get_only() {
    let router = router();
    for uri in ["/api/user/robb/followers", "/api/user/nobody/following"] {
        let response = router
            .clone()
            .oneshot(request(Method::OPTIONS, uri, None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ALLOW], "GET");
    }
}

#[tokio::test]
async fn unknown_nickname_is_not_found() {
    let router = router();
    let (status, body) = get(&router, "/api/user/nobody/followers", Some(&client())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn malformed_paging_is_bad_request() {
    let router = router();
    register(&router, "tyrion", "payURdebts").await;

    for query in ["count=abc", "count=0", "offset=-1", "count=2.5"] {
        let uri = format!("/api/user/tyrion/followers?{}", query);
        let (status, body) = get(&router, &uri, Some(&client())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", query);
        assert_eq!(body["error"], "BadRequest");
    }
}

#[tokio::test]
async fn undecodable_query_checks_credentials_first() {
    let router = router();
    register(&router, "robb", "gr3yw1nd").await;
    let uri = "/api/user/robb/followers?count=1&count=2";

    let (status, body) = get(&router, uri, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, body) = get(&router, uri, Some(&client())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadRequest");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn follow_symmetry() {
    let router = router();
    let robb = register(&router, "robb", "gr3yw1nd").await;
    let greatjon = register(&router, "greatjon", "bl00dyt0ugh").await;

    let uri = "/api/user/greatjon/feed";
    let req = request(Method::POST, uri, Some(&greatjon.credentials), Some(follow_body(&robb)));
    let (status, activity) = send(&router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(activity["verb"], "follow");
    assert_eq!(activity["actor"]["id"], greatjon.id.as_str());
    assert_eq!(activity["object"]["id"], robb.id.as_str());
    assert!(activity["id"].is_string());
    assert!(activity["published"].is_string());

    let c = Some(&robb.credentials);
    let (_, following) = get(&router, "/api/user/greatjon/following", c).await;
    let (_, followers) = get(&router, "/api/user/robb/followers", c).await;
    let (_, none_following) = get(&router, "/api/user/robb/following", c).await;
    let (_, none_followers) = get(&router, "/api/user/greatjon/followers", c).await;

    assert_eq!(following["totalItems"], 1);
    assert_eq!(following["items"][0]["id"], robb.id.as_str());
    assert_eq!(followers["totalItems"], 1);
    assert_eq!(followers["items"][0]["id"], greatjon.id.as_str());
    assert_eq!(none_following["totalItems"], 0);
    assert_eq!(none_followers["totalItems"], 0);

    // Repeating the follow does not add a second edge
    assert_eq!(follow(&router, "greatjon", &greatjon, &robb).await, StatusCode::OK);
    let (_, followers) = get(&router, "/api/user/robb/followers", c).await;
    assert_eq!(followers["totalItems"], 1);
}

#[tokio::test]
async fn feed_rejections() {
    let router = router();
    let robb = register(&router, "robb", "gr3yw1nd").await;
    let greatjon = register(&router, "greatjon", "bl00dyt0ugh").await;

    // Someone else's token
    assert_eq!(follow(&router, "greatjon", &robb, &robb).await, StatusCode::FORBIDDEN);

    // Consumer only
    let req = request(
        Method::POST,
        "/api/user/greatjon/feed",
        Some(&client()),
        Some(follow_body(&robb)),
    );
    assert_eq!(send(&router, req).await.0, StatusCode::UNAUTHORIZED);

    // Unknown target
    let ghost = User {
        id: "acct:ghost@localhost".to_string(),
        credentials: client(),
    };
    assert_eq!(follow(&router, "greatjon", &greatjon, &ghost).await, StatusCode::NOT_FOUND);

    // Not a follow
    let req = request(
        Method::POST,
        "/api/user/greatjon/feed",
        Some(&greatjon.credentials),
        Some(json!({ "verb": "post", "object": { "objectType": "note", "id": "x" } })),
    );
    assert_eq!(send(&router, req).await.0, StatusCode::BAD_REQUEST);

    // Consumer only with a broken body is still a credential problem
    let mut req = request(Method::POST, "/api/user/greatjon/feed", Some(&client()), None);
    req.headers_mut()
        .insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
    let (status, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    // Not JSON
    let mut req = request(Method::POST, "/api/user/greatjon/feed", Some(&greatjon.credentials), None);
    req.headers_mut()
        .insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
    let (status, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadRequest");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn hundred_followers_through_admission_queue() {
    let router = router();
    let nymeria = Arc::new(register(&router, "nymeria", "gr0000wl").await);

    let mut wolves = Vec::new();
    for i in 0..100 {
        wolves.push(register(&router, &format!("wolf{}", i), "grrr-grrr").await);
    }

    let queue = AdmissionQueue::new(10);
    let handles: Vec<_> = wolves
        .into_iter()
        .enumerate()
        .map(|(i, wolf)| {
            let router = router.clone();
            let nymeria = nymeria.clone();
            queue
                .submit(async move {
                    follow(&router, &format!("wolf{}", i), &wolf, &nymeria).await
                })
                .unwrap()
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    let c = Some(&nymeria.credentials);
    let (_, page) = get(&router, "/api/user/nymeria/followers", c).await;
    assert_eq!(page["totalItems"], 100);
    assert_eq!(page["items"].as_array().unwrap().len(), 20);
    assert!(page["links"]["next"]["href"].is_string());
    assert!(page["links"].get("prev").is_none());

    let (_, page) = get(&router, "/api/user/nymeria/followers?count=40", c).await;
    assert_eq!(page["items"].as_array().unwrap().len(), 40);
    assert!(page["links"]["next"]["href"].is_string());

    let (_, page) = get(&router, "/api/user/nymeria/followers?count=200", c).await;
    assert_eq!(page["items"].as_array().unwrap().len(), 100);
    assert!(page["links"].get("next").is_none());
    assert!(page["links"].get("prev").is_none());

    let (_, page) = get(&router, "/api/user/nymeria/followers?offset=20", c).await;
    assert_eq!(page["startIndex"], 20);
    assert_eq!(
        page["links"]["next"]["href"],
        "http://localhost:4815/api/user/nymeria/followers?offset=40&count=20"
    );
    assert_eq!(
        page["links"]["prev"]["href"],
        "http://localhost:4815/api/user/nymeria/followers?offset=0&count=20"
    );
}
