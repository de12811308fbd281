use sync_engine::{EngineSettings, HydrateError, Hydrator, ReqwestHydrator, Resource};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn hydrator_for(server: &MockServer, prefix: &str) -> ReqwestHydrator {
    let settings = EngineSettings {
        rest_base_url: format!("{}{prefix}", server.uri()),
        ..EngineSettings::default()
    };
    ReqwestHydrator::new(&settings).expect("hydrator")
}

#[tokio::test]
async fn fetch_returns_the_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/connectors"))
        .and(header("accept", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"[{"id":"c-1","name":"Drive"}]"#, "application/json"),
        )
        .mount(&server)
        .await;

    let hydrator = hydrator_for(&server, "/api");
    let body = hydrator.fetch(Resource::Connectors).await.expect("fetch ok");
    assert_eq!(body, r#"[{"id":"c-1","name":"Drive"}]"#);
}

#[tokio::test]
async fn nested_resource_paths_join_under_the_base() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/dashboard/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;

    let hydrator = hydrator_for(&server, "/api/v1/");
    assert_eq!(
        hydrator.url_for(Resource::DashboardStats).unwrap().path(),
        "/api/v1/dashboard/stats"
    );
    assert_eq!(hydrator.fetch(Resource::DashboardStats).await.unwrap(), "{}");
}

#[tokio::test]
async fn fetch_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/documents"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let hydrator = hydrator_for(&server, "");
    let err = hydrator.fetch(Resource::Documents).await.unwrap_err();
    assert_eq!(err, HydrateError::HttpStatus(503));
}
