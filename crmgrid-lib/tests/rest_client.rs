//! Integration tests for the REST client against a throwaway HTTP server.

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::Mutex;

use http_body_util::BodyExt;
use http_body_util::Full;
use hyper::Request;
use hyper::Response;
use hyper::body::Bytes;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crmgrid_lib::RestClient;
use crmgrid_lib::api::CollectionQuery;
use crmgrid_lib::api::RecordReader;
use crmgrid_lib::api::RecordWriter;
use crmgrid_lib::crm::leads;
use crmgrid_lib::error::ApiError;
use crmgrid_lib::model::Record;
use crmgrid_lib::model::RecordId;
use crmgrid_lib::model::Value;
use crmgrid_lib::query::SortDirective;

/// A request as the server saw it.
#[derive(Debug, Clone)]
struct Seen {
    method: String,
    uri: String,
    body: String,
}

type Responder = fn(&str, &str) -> (u16, &'static str);

struct MockServer {
    url: String,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl MockServer {
    async fn start(respond: Responder) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let seen: Arc<Mutex<Vec<Seen>>> = Arc::default();

        let log = seen.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let log = log.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let log = log.clone();
                        async move {
                            let method = req.method().to_string();
                            let uri = req.uri().to_string();
                            let bytes = req.into_body().collect().await.unwrap().to_bytes();
                            let body = String::from_utf8_lossy(&bytes).to_string();

                            let (status, reply) = respond(&method, &uri);
                            log.lock().unwrap().push(Seen { method, uri, body });

                            Ok::<_, Infallible>(
                                Response::builder()
                                    .status(status)
                                    .header("Content-Type", "application/json")
                                    .body(Full::new(Bytes::from(reply)))
                                    .unwrap(),
                            )
                        }
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        Self { url, seen }
    }

    fn client(&self) -> RestClient {
        RestClient::builder().url(&self.url).build().unwrap()
    }

    fn requests(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

fn json_server(method: &str, uri: &str) -> (u16, &'static str) {
    match (method, uri) {
        ("GET", uri) if uri.starts_with("/leads") => (
            200,
            r#"[{"id": 2, "name": "Grace", "company": "Navy", "score": 90, "status": "Qualified"},
                {"id": 1, "name": "Ada", "company": "Engines", "score": 40, "status": "New"}]"#,
        ),
        ("POST", "/leads") => (201, r#"{"id": 1718000000000, "name": "Alan"}"#),
        ("PATCH", "/leads/2") => (
            200,
            r#"{"id": 2, "name": "Grace", "company": "Navy", "score": 90, "status": "Contacted"}"#,
        ),
        ("DELETE", "/leads/2") => (200, ""),
        ("GET", "/broken") => (200, "{not json"),
        _ => (404, "{}"),
    }
}

#[tokio::test]
async fn test_fetch_sends_json_server_parameters() {
    let server = MockServer::start(json_server).await;
    let query = CollectionQuery::new("leads")
        .search(" gra ")
        .criterion("status", "Qualified")
        .sort(SortDirective::desc("score"));

    let records = server.client().fetch(&query).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id(), Some(&RecordId::Number(2)));
    assert_eq!(records[0].get("score").and_then(Value::as_f64), Some(90.0));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(
        requests[0].uri,
        "/leads?q=gra&_sort=score&_order=desc&status=Qualified"
    );
}

#[tokio::test]
async fn test_create_assigns_timestamp_id() {
    let server = MockServer::start(json_server).await;
    let created = server
        .client()
        .create("leads", &Record::new().set("name", "Alan"))
        .await
        .unwrap();

    assert_eq!(created.id(), Some(&RecordId::Number(1_718_000_000_000)));

    let sent: serde_json::Value = serde_json::from_str(&server.requests()[0].body).unwrap();
    assert!(sent["id"].as_i64().is_some_and(|id| id > 0));
    assert_eq!(sent["name"], "Alan");
}

#[tokio::test]
async fn test_update_sends_patch_without_identity() {
    let server = MockServer::start(json_server).await;
    let patch = Record::with_id(2).set("status", "Contacted");

    let echo = server
        .client()
        .update("leads", &RecordId::Number(2), &patch)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(echo.get_string("status").unwrap(), Some("Contacted"));
    let requests = server.requests();
    assert_eq!(requests[0].method, "PATCH");
    assert_eq!(requests[0].body, r#"{"status":"Contacted"}"#);
}

#[tokio::test]
async fn test_delete_accepts_empty_body() {
    let server = MockServer::start(json_server).await;
    server
        .client()
        .delete("leads", &RecordId::Number(2))
        .await
        .unwrap();
    assert_eq!(server.requests()[0].uri, "/leads/2");
}

#[tokio::test]
async fn test_error_statuses_and_bad_bodies() {
    let server = MockServer::start(json_server).await;
    let client = server.client();

    let err = client
        .delete("leads", &RecordId::Number(99))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(404));

    let err = client
        .fetch(&CollectionQuery::new("broken"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Parse { body: Some(ref b), .. } if b == "{not json"));
}

#[tokio::test]
async fn test_session_over_http() {
    let server = MockServer::start(json_server).await;
    let mut session = leads::session(server.client()).unwrap();

    session.refresh().await.unwrap();
    let page = session.page();
    assert_eq!(page.meta.total_items, 2);
    assert_eq!(
        page.items[0].record().get_string("name").unwrap(),
        Some("Grace")
    );
    assert_eq!(
        server.requests()[0].uri,
        "/leads?_sort=score&_order=desc"
    );
}
