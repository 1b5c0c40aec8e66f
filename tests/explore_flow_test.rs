//! End-to-end explore screen over HTTP
//!
//! Test Coverage:
//! - Feed pages follow the last-id cursor until an empty page
//! - Search replaces the feed after the debounce and restores it when cleared

mod test_harness;

use snapgram_client::{DisplayMode, ExploreView};
use std::time::Duration;
use test_harness::{app, client_config, post_list, POSTS};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DEBOUNCE_MS: u64 = 20;

async fn settle() {
    tokio::time::sleep(Duration::from_millis(DEBOUNCE_MS * 5)).await;
}

/// Cursor-specific pages take priority over the first-page catch-all
async fn mount_feed(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(POSTS))
        .and(query_param("queries[]", r#"cursorAfter("p9")"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_list(10..12)))
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(POSTS))
        .and(query_param("queries[]", r#"cursorAfter("p11")"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_list(0..0)))
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(POSTS))
        .and(query_param("queries[]", r#"orderDesc("$updatedAt")"#))
        .and(query_param("queries[]", "limit(10)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_list(0..10)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_feed_scrolls_to_the_end() {
    let server = MockServer::start().await;
    mount_feed(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let (app, _screen) = app(client_config(&server, &dir.path().join("session"), DEBOUNCE_MS));
    let explore = app.explore();

    match explore.load().await.unwrap() {
        ExploreView::Feed {
            posts,
            has_next_page,
        } => {
            assert_eq!(posts.len(), 10);
            assert!(has_next_page);
        }
        other => panic!("expected feed, got {:?}", other),
    }

    while explore.on_visibility(true).await.unwrap() {}

    match explore.view() {
        ExploreView::Feed {
            posts,
            has_next_page,
        } => {
            let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
            assert_eq!(ids.len(), 12);
            assert_eq!(ids.first(), Some(&"p0"));
            assert_eq!(ids.last(), Some(&"p11"));
            assert!(!has_next_page);
        }
        other => panic!("expected feed, got {:?}", other),
    }
    assert!(!explore.show_load_more());
}

#[tokio::test]
async fn test_search_replaces_feed_until_cleared() {
    let server = MockServer::start().await;
    mount_feed(&server).await;
    Mock::given(method("GET"))
        .and(path(POSTS))
        .and(query_param("queries[]", r#"search("caption", ["sunset"])"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_list(20..21)))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (app, _screen) = app(client_config(&server, &dir.path().join("session"), DEBOUNCE_MS));
    let explore = app.explore();
    explore.load().await.unwrap();

    for text in ["s", "sun", "sunset"] {
        explore.set_search_input(text);
    }
    settle().await;
    assert_eq!(explore.mode(), DisplayMode::Search("sunset".to_string()));

    let results = explore.search_results().await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "p20");
    // Infinite scroll is inert while searching
    assert!(!explore.on_visibility(true).await.unwrap());

    explore.set_search_input("");
    settle().await;
    assert_eq!(explore.mode(), DisplayMode::Feed);
    assert!(matches!(explore.view(), ExploreView::Feed { .. }));
}

#[tokio::test]
async fn test_empty_feed_reports_end_of_posts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(POSTS))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_list(0..0)))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (app, _screen) = app(client_config(&server, &dir.path().join("session"), DEBOUNCE_MS));
    let explore = app.explore();

    assert_eq!(explore.load().await.unwrap(), ExploreView::EndOfPosts);
    assert!(!explore.on_visibility(true).await.unwrap());
}
