mod common;

use actix_web::test;
use serde_json::{json, Value};

use common::{FakeCompletion, FakeGraph, FakePlaces, TestApp};
use wayfarer_api::models::place::{StoreSuggestion, Weather};

#[actix_rt::test]
async fn test_qa_sends_itinerary_and_question() {
    let test_app = TestApp::new(FakeCompletion::replying("Take the metro, line 1."));
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/qa")
        .set_json(&json!({
            "question": "How do I get to the Louvre?",
            "itinerary": { "itinerary": [{ "day": 1, "activities": [{ "location": "Louvre" }] }] }
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "answer": "Take the metro, line 1." }));

    let prompt = test_app.completion.last_prompt().unwrap();
    assert!(prompt.contains(r#""location":"Louvre""#));
    assert!(prompt.contains("How do I get to the Louvre?"));
}

#[actix_rt::test]
async fn test_qa_requires_question_and_itinerary() {
    let test_app = TestApp::new(FakeCompletion::replying("unused"));
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/qa")
        .set_json(&json!({ "question": "Is it far?" }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Missing question or itinerary");
}

#[actix_rt::test]
async fn test_suggestions_for_rainy_weather() {
    let suggestion = StoreSuggestion {
        store: "Chuva Lda".to_string(),
        product: "Umbrella".to_string(),
        category: "gear".to_string(),
    };
    let test_app = TestApp::new(FakeCompletion::replying(""))
        .with_graph(FakeGraph::with_suggestions(vec![suggestion]));
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/suggestions?city=Lisbon&weather=Rainy")
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({ "suggestions": [{ "store": "Chuva Lda", "product": "Umbrella", "category": "gear" }] })
    );

    let requests = test_app
        .graph
        .as_ref()
        .unwrap()
        .suggestion_requests
        .lock()
        .unwrap()
        .clone();
    assert_eq!(requests, vec![("Lisbon".to_string(), Weather::Rainy)]);
}

#[actix_rt::test]
async fn test_suggestions_require_city_and_weather() {
    let test_app = TestApp::new(FakeCompletion::replying("")).with_graph(FakeGraph::default());
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/suggestions?city=Lisbon")
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "city and weather required");
}

#[actix_rt::test]
async fn test_suggestions_without_graph_store() {
    let test_app = TestApp::new(FakeCompletion::replying(""));
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/suggestions?city=Lisbon&weather=sunny")
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 503);
}

#[actix_rt::test]
async fn test_suggestions_graph_failure() {
    let test_app = TestApp::new(FakeCompletion::replying("")).with_graph(FakeGraph::failing());
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/suggestions?city=Lisbon&weather=sunny")
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 500);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("connection refused"));
}

#[actix_rt::test]
async fn test_health_check_reports_services() {
    let test_app = TestApp::new(FakeCompletion::replying(""))
        .with_places(FakePlaces::default())
        .with_graph(FakeGraph::default());
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get().uri("/health").to_request();

    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["services"]["completion"]["status"], "ok");
    assert_eq!(body["services"]["place_enrichment"]["status"], "ok");
    assert_eq!(body["services"]["graph_store"]["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[actix_rt::test]
async fn test_health_check_degraded_when_graph_down() {
    let test_app = TestApp::new(FakeCompletion::replying("")).with_graph(FakeGraph::failing());
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get().uri("/health").to_request();

    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["services"]["place_enrichment"]["status"], "disabled");
    assert_eq!(body["services"]["graph_store"]["status"], "error");
}
