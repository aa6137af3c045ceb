use std::sync::Arc;

use pretty_assertions::assert_eq;
use tidewatch_core::{FilterChain, State};
use tidewatch_engine::{
    Content, ExtractUrlFilter, FetchSettings, FollowQuery, HtmlFilter, HttpQuery, Query,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

fn extract(selector: &str) -> FilterChain<Content> {
    FilterChain::new()
        .with(HtmlFilter::new())
        .with(ExtractUrlFilter::new(selector).unwrap())
}

fn follow(server: &MockServer, index: &str, selector: &str) -> FollowQuery {
    let source = HttpQuery::new(&format!("{}{index}", server.uri()), FetchSettings::default())
        .unwrap();
    FollowQuery::new(Arc::new(source), extract(selector), FetchSettings::default()).unwrap()
}

#[tokio::test]
async fn fetches_the_linked_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index.html"))
        .respond_with(html(r#"<a class="latest" href="strips/17.html">latest</a>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/strips/17.html"))
        .respond_with(html("<title>Strip 17</title>"))
        .mount(&server)
        .await;

    let state = follow(&server, "/index.html", "a.latest").fetch().await;

    let Ok(Content::Http(document)) = state.into_payload() else {
        panic!("expected the linked document");
    };
    assert_eq!(document.url, format!("{}/strips/17.html", server.uri()));
    assert_eq!(document.body, "<title>Strip 17</title>");
}

#[tokio::test]
async fn source_failure_is_handed_on() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index.html"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let state = follow(&server, "/index.html", "a.latest").fetch().await;

    assert!(state.cause().unwrap().starts_with("http status 503"));
}

#[tokio::test]
async fn page_without_link_is_a_failure_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index.html"))
        .respond_with(html("<p>nothing here</p>"))
        .mount(&server)
        .await;

    let state = follow(&server, "/index.html", "a.latest").fetch().await;

    assert_eq!(
        state.cause(),
        Some(format!("no url found in {}/index.html", server.uri()).as_str())
    );
}

#[tokio::test]
async fn linked_page_failure_is_the_query_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index.html"))
        .respond_with(html(r#"<a class="latest" href="/gone.html">latest</a>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let state = follow(&server, "/index.html", "a.latest").fetch().await;

    assert!(state.cause().unwrap().starts_with("http status 404"));
}

#[tokio::test]
async fn extracted_value_must_be_an_http_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index.html"))
        .respond_with(html(r#"<a class="latest" href="magnet:?xt=urn:btih:abc">m</a>"#))
        .mount(&server)
        .await;

    let state = follow(&server, "/index.html", "a.latest").fetch().await;

    assert!(state.cause().unwrap().contains("unsupported scheme 'magnet'"));

    let unextracted = FollowQuery::new(
        Arc::new(
            HttpQuery::new(&format!("{}/index.html", server.uri()), FetchSettings::default())
                .unwrap(),
        ),
        FilterChain::new(),
        FetchSettings::default(),
    )
    .unwrap()
    .fetch()
    .await;
    assert_eq!(unextracted.cause(), Some("expected text, got http"));
    assert!(!matches!(unextracted, State::Success { .. }));
}
