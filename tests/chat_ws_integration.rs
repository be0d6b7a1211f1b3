//! Integration tests for the chat WebSocket + REST endpoints.
//!
//! Each test spins up an Axum server on a random port, connects via
//! tokio-tungstenite, and exercises the real WS / REST contract.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use ayursutra::assessment::Catalog;
use ayursutra::chat::ws::chat_routes;
use ayursutra::chat::{Dispatcher, SessionRegistry};
use ayursutra::config::ServerConfig;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Options that answer every question with a Vata-voting token, in
/// catalog order.
const ALL_VATA: [&str; 10] = [
    "Thin and light",
    "Dry and rough",
    "Thin and dry",
    "Irregular and variable",
    "Irregular",
    "Variable and irregular",
    "Light and interrupted",
    "Anxious and creative",
    "Worried and anxious",
    "Warm and sunny",
];

/// Start an Axum server on a random port with a zero typing delay.
async fn start_server() -> u16 {
    let config = ServerConfig {
        typing_delay: Duration::ZERO,
        ..ServerConfig::default()
    };
    let catalog = Arc::new(Catalog::standard());
    let registry = SessionRegistry::new();
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&catalog),
        Arc::clone(&registry),
        None,
        &config,
    ));
    let app = chat_routes(catalog, registry, dispatcher, config);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    port
}

/// Parse a WS text frame into a serde_json::Value.
fn parse_ws_json(msg: &Message) -> Value {
    match msg {
        Message::Text(txt) => serde_json::from_str(txt).expect("invalid JSON from server"),
        other => panic!("expected Text frame, got {:?}", other),
    }
}

/// The inbound message shape: `{ "message": "..." }`.
fn chat_frame(text: &str) -> Message {
    Message::Text(serde_json::json!({ "message": text }).to_string().into())
}

// ── WebSocket Tests ──────────────────────────────────────────────────

#[tokio::test]
async fn connect_receives_welcome_first() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server().await;

        let (mut ws, _resp) = connect_async(format!("ws://127.0.0.1:{port}/ws/chat"))
            .await
            .expect("WS connect failed");

        let msg = ws.next().await.unwrap().unwrap();
        let json = parse_ws_json(&msg);

        assert_eq!(json["type"], "message");
        assert_eq!(json["sender"], "bot");
        assert!(json["text"].as_str().unwrap().contains("Namaste"));
        assert!(json["timestamp"].is_string());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn start_keyword_yields_typing_then_first_question() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server().await;

        let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws/chat"))
            .await
            .unwrap();

        // Consume the welcome.
        let _ = ws.next().await.unwrap().unwrap();

        ws.send(chat_frame("start")).await.unwrap();

        let typing = parse_ws_json(&ws.next().await.unwrap().unwrap());
        assert_eq!(typing["type"], "typing");

        let question = parse_ws_json(&ws.next().await.unwrap().unwrap());
        assert_eq!(question["type"], "question");
        assert_eq!(question["question_id"], "body_frame");
        assert_eq!(question["progress"]["current"], 1);
        assert_eq!(question["progress"]["total"], 10);
        assert_eq!(question["options"][0], "Thin and light");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn invalid_option_reasks_the_same_question() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server().await;

        let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws/chat"))
            .await
            .unwrap();
        let _ = ws.next().await.unwrap().unwrap(); // welcome

        ws.send(chat_frame("start")).await.unwrap();
        let _ = ws.next().await.unwrap().unwrap(); // typing
        let _ = ws.next().await.unwrap().unwrap(); // question 1

        ws.send(chat_frame("definitely not an option")).await.unwrap();
        let _ = ws.next().await.unwrap().unwrap(); // typing

        let reask = parse_ws_json(&ws.next().await.unwrap().unwrap());
        assert_eq!(reask["type"], "question");
        assert_eq!(reask["question_id"], "body_frame");
        assert_eq!(reask["progress"]["current"], 1);
        assert!(reask["text"]
            .as_str()
            .unwrap()
            .ends_with("Please select one of the options below:"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn full_assessment_completes_exactly_once() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server().await;

        let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws/chat"))
            .await
            .unwrap();
        let _ = ws.next().await.unwrap().unwrap(); // welcome

        ws.send(chat_frame("start")).await.unwrap();
        for option in ALL_VATA {
            ws.send(chat_frame(option)).await.unwrap();
        }

        // Collect frames until the completion payload arrives.
        let mut questions = 0;
        let mut typings = 0;
        let completion = loop {
            let json = parse_ws_json(&ws.next().await.unwrap().unwrap());
            match json["type"].as_str().unwrap() {
                "typing" => typings += 1,
                "question" => questions += 1,
                "assessment_complete" => break json,
                other => panic!("unexpected frame type {other}"),
            }
        };

        // One question frame for the start plus one per non-final answer.
        assert_eq!(questions, 10);
        // One typing frame per inbound message (start + 10 answers).
        assert_eq!(typings, 11);

        let percentages = &completion["dosha_results"]["percentages"];
        assert_eq!(percentages["vata"], 100);
        assert_eq!(percentages["pitta"], 0);
        assert_eq!(percentages["kapha"], 0);
        assert_eq!(completion["dosha_results"]["dominant_dosha"], "vata");

        let therapies = completion["panchakarma_recs"]["therapy_details"]
            .as_array()
            .unwrap();
        assert!(!therapies.is_empty());
        assert!(therapies.iter().all(|t| t["dosha"] == "vata"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn completed_session_answers_free_text_with_notice() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server().await;

        let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws/chat"))
            .await
            .unwrap();
        let _ = ws.next().await.unwrap().unwrap(); // welcome

        ws.send(chat_frame("start")).await.unwrap();
        for option in ALL_VATA {
            ws.send(chat_frame(option)).await.unwrap();
        }
        loop {
            let json = parse_ws_json(&ws.next().await.unwrap().unwrap());
            if json["type"] == "assessment_complete" {
                break;
            }
        }

        ws.send(chat_frame("show me again")).await.unwrap();
        let _ = ws.next().await.unwrap().unwrap(); // typing

        let reply = parse_ws_json(&ws.next().await.unwrap().unwrap());
        assert_eq!(reply["type"], "message");
        assert!(reply["text"]
            .as_str()
            .unwrap()
            .contains("completed your assessment"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn reconnect_under_same_session_id_keeps_state_and_welcome_guard() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server().await;

        let (mut ws1, _) = connect_async(format!(
            "ws://127.0.0.1:{port}/ws/chat?session_id=shared"
        ))
        .await
        .unwrap();
        let welcome = parse_ws_json(&ws1.next().await.unwrap().unwrap());
        assert_eq!(welcome["type"], "message");

        ws1.send(chat_frame("start")).await.unwrap();
        let _ = ws1.next().await.unwrap().unwrap(); // typing
        let _ = ws1.next().await.unwrap().unwrap(); // question 1

        // Second connection under the same identifier while the first is
        // still open: state survives, no second welcome.
        let (mut ws2, _) = connect_async(format!(
            "ws://127.0.0.1:{port}/ws/chat?session_id=shared"
        ))
        .await
        .unwrap();

        ws2.send(chat_frame("Thin and light")).await.unwrap();

        let typing = parse_ws_json(&ws2.next().await.unwrap().unwrap());
        assert_eq!(typing["type"], "typing");

        let question = parse_ws_json(&ws2.next().await.unwrap().unwrap());
        assert_eq!(question["type"], "question");
        assert_eq!(question["question_id"], "skin_type");
        assert_eq!(question["progress"]["current"], 2);
    })
    .await
    .expect("test timed out");
}

// ── REST Endpoint Tests ──────────────────────────────────────────────

#[tokio::test]
async fn rest_health_endpoint() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server().await;

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/health"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "ayursutra");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_questions_lists_catalog() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server().await;

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/api/questions"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Vec<Value> = resp.json().await.unwrap();
        assert_eq!(body.len(), 10);
        assert_eq!(body[0]["id"], "body_frame");
        assert_eq!(body[0]["category"], "physical");
        assert_eq!(body[0]["options"].as_array().unwrap().len(), 3);
    })
    .await
    .expect("test timed out");
}

fn full_answer_map() -> Value {
    let ids = [
        "body_frame",
        "skin_type",
        "hair_texture",
        "appetite",
        "digestion",
        "energy_level",
        "sleep",
        "temperament",
        "stress_response",
        "weather_preference",
    ];
    let mut answers = serde_json::Map::new();
    for (id, option) in ids.iter().zip(ALL_VATA) {
        answers.insert(id.to_string(), Value::String(option.to_string()));
    }
    serde_json::json!({ "answers": answers })
}

#[tokio::test]
async fn rest_score_full_answer_map() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server().await;

        let client = reqwest::Client::new();
        let resp = client
            .post(format!("http://127.0.0.1:{port}/api/assessment/score"))
            .json(&full_answer_map())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        let percentages = &body["dosha_results"]["percentages"];
        let sum = percentages["vata"].as_u64().unwrap()
            + percentages["pitta"].as_u64().unwrap()
            + percentages["kapha"].as_u64().unwrap();
        assert_eq!(sum, 100);
        assert_eq!(body["dosha_results"]["dominant_dosha"], "vata");
        assert!(!body["panchakarma_recs"]["therapy_details"]
            .as_array()
            .unwrap()
            .is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_score_rejects_missing_answer() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server().await;

        let mut body = full_answer_map();
        body["answers"].as_object_mut().unwrap().remove("sleep");

        let client = reqwest::Client::new();
        let resp = client
            .post(format!("http://127.0.0.1:{port}/api/assessment/score"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);

        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("sleep"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_score_rejects_invalid_option() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server().await;

        let mut body = full_answer_map();
        body["answers"]["sleep"] = Value::String("Like a log".to_string());

        let client = reqwest::Client::new();
        let resp = client
            .post(format!("http://127.0.0.1:{port}/api/assessment/score"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_report_renders_markdown_from_engine_output() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server().await;
        let client = reqwest::Client::new();

        // Score first, then feed the exact engine output back.
        let outcome: Value = client
            .post(format!("http://127.0.0.1:{port}/api/assessment/score"))
            .json(&full_answer_map())
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        let resp = client
            .post(format!("http://127.0.0.1:{port}/api/report"))
            .json(&outcome)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let report = resp.text().await.unwrap();
        assert!(report.contains("# AyurSutra Assessment Report"));
        assert!(report.contains("| Vata | 100% |"));
        assert!(report.contains("**Basti**"));
    })
    .await
    .expect("test timed out");
}
