use std::sync::Arc;

use autofill_cli::storage::{self, LocalStore, MemoryStore, FILL_COUNT_KEY};
use autofill_cli::ContentHost;
use autofill_core_types::NodeId;
use command_channel::{
    ChannelPolicy, Command, CommandChannel, FillFormPayload, InProcessTransport,
    InsertAnswerPayload, MatchScorePayload, QuestionPayload, QuickFillPayload, SaveAnswerPayload,
};
use form_engine::{DomEvent, MemoryDom, PacingPolicy};
use serde_json::{json, Value};
use tokio::sync::broadcast;

struct Harness {
    dom: Arc<MemoryDom>,
    store: Arc<MemoryStore>,
    channel: CommandChannel,
}

fn harness(page: Value) -> Harness {
    let dom = Arc::new(MemoryDom::from_fixture(&page.to_string()).unwrap());
    let store = Arc::new(MemoryStore::new());
    let host = ContentHost::new(dom.clone(), store.clone(), PacingPolicy::immediate());
    let (bus, _rx) = broadcast::channel(16);
    let policy = ChannelPolicy {
        max_retries: 2,
        attach_settle_ms: 0,
    };
    let channel = CommandChannel::new(InProcessTransport::new(Arc::new(host)), policy, bus);
    Harness {
        dom,
        store,
        channel,
    }
}

fn application_page() -> Value {
    json!({
        "progressText": "Step 1 of 3",
        "elements": [
            {"id": 1, "type": "email", "required": true, "label": "Email", "tracked": true},
            {"id": 2, "required": true, "label": "Phone"},
            {"id": 3, "tagName": "textarea", "label": "Why us?"},
            {"id": 9, "tagName": "button", "text": "Continue"}
        ]
    })
}

fn email_catalog() -> Value {
    json!({
        "personal": [{"element": 1, "classification": "email", "type": "email", "tagName": "input"}]
    })
}

#[tokio::test]
async fn fill_form_fills_and_counts() {
    let h = harness(application_page());
    let payload: FillFormPayload = serde_json::from_value(json!({
        "profile": {"personalInfo": {"firstName": "Jane", "lastName": "Doe", "email": "jane@x.com"}},
        "fields": email_catalog()
    }))
    .unwrap();

    let response = h.channel.send(Command::FillForm(payload)).await.unwrap();

    assert!(response.success);
    assert_eq!(response.data["filledFields"][0]["field"], "email");
    assert_eq!(h.dom.value(NodeId(1)).as_deref(), Some("jane@x.com"));
    assert_eq!(storage::fill_count(h.store.as_ref()).await.unwrap(), 1);
}

#[tokio::test]
async fn fill_form_reports_unknown_tags_and_fills_the_rest() {
    let h = harness(application_page());
    let payload: FillFormPayload = serde_json::from_value(json!({
        "profile": {"personalInfo": {"email": "jane@x.com"}},
        "fields": {"personal": [
            {"element": 1, "classification": "email", "type": "email", "tagName": "input"},
            {"element": 2, "classification": "middleName", "tagName": "input"}
        ]}
    }))
    .unwrap();

    let response = h.channel.send(Command::FillForm(payload)).await.unwrap();

    assert!(response.success);
    assert_eq!(h.dom.value(NodeId(1)).as_deref(), Some("jane@x.com"));
    assert_eq!(response.data["filledFields"][0]["field"], "email");
    assert_eq!(response.data["errors"][0]["field"], "middleName");
    assert_eq!(
        response.data["errors"][0]["message"],
        "unknown classification tag 'middleName'"
    );
}

#[tokio::test]
async fn fill_form_without_profile_reports_failure() {
    let h = harness(application_page());
    let payload: FillFormPayload =
        serde_json::from_value(json!({"fields": email_catalog()})).unwrap();

    let response = h.channel.send(Command::FillForm(payload)).await.unwrap();

    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("No profile data provided"));
    assert!(h.store.get(FILL_COUNT_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn quick_fill_uses_the_stored_profile() {
    let h = harness(application_page());
    let fields = serde_json::from_value(email_catalog()).unwrap();

    let missing = h
        .channel
        .send(Command::QuickFill(QuickFillPayload { fields }))
        .await
        .unwrap();
    assert!(!missing.success);

    h.store
        .set(
            storage::PROFILE_KEY,
            json!({"personalInfo": {"email": "jane@x.com"}}),
        )
        .await
        .unwrap();
    let fields = serde_json::from_value(email_catalog()).unwrap();
    let response = h
        .channel
        .send(Command::QuickFill(QuickFillPayload { fields }))
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(h.dom.framework_value(NodeId(1)).as_deref(), Some("jane@x.com"));
}

#[tokio::test]
async fn status_and_checklist_describe_the_page() {
    let h = harness(application_page());

    let status = h.channel.send(Command::GetStatus).await.unwrap();
    assert_eq!(status.data, json!({"ready": true, "fieldCount": 3}));

    let checklist = h.channel.send(Command::GetChecklist).await.unwrap();
    assert_eq!(checklist.data["complete"], false);
    assert_eq!(checklist.data["total"], 2);
    assert_eq!(checklist.data["missing"].as_array().unwrap().len(), 2);

    h.dom.user_input(NodeId(2), "555 0100").unwrap();
    let validated = h.channel.send(Command::ValidateForm).await.unwrap();
    assert_eq!(validated.data["missing"][0]["label"], "Email");
}

#[tokio::test]
async fn step_navigation() {
    let h = harness(application_page());

    let info = h.channel.send(Command::GetStepInfo).await.unwrap();
    assert_eq!(info.data, json!({"current": 1, "total": 3}));

    let advanced = h.channel.send(Command::AdvanceStep).await.unwrap();
    assert_eq!(advanced.data["clicked"], 9);
    assert_eq!(h.dom.events_for(NodeId(9)), vec![DomEvent::Click]);
}

#[tokio::test]
async fn answer_library_round_trip() {
    let h = harness(application_page());

    let saved = h
        .channel
        .send(Command::SaveAnswer(SaveAnswerPayload {
            question: "Why do you want to work here?".into(),
            answer: "The mission.".into(),
        }))
        .await
        .unwrap();
    assert_eq!(saved.data["count"], 1);

    let library = h.channel.send(Command::GetAnswerLibrary).await.unwrap();
    assert_eq!(library.data["answers"][0]["answer"], "The mission.");

    let generated = h
        .channel
        .send(Command::GenerateAnswer(QuestionPayload {
            question: "Why do you want to work at Acme?".into(),
        }))
        .await
        .unwrap();
    assert_eq!(generated.data["source"], "library");

    let inserted = h
        .channel
        .send(Command::InsertAnswer(InsertAnswerPayload {
            node: NodeId(3),
            answer: generated.data["answer"].as_str().unwrap().to_string(),
        }))
        .await
        .unwrap();
    assert!(inserted.success);
    assert_eq!(h.dom.value(NodeId(3)).as_deref(), Some("The mission."));
}

#[tokio::test]
async fn match_score_reads_the_stored_profile() {
    let h = harness(json!({"elements": []}));
    h.store
        .set(
            storage::PROFILE_KEY,
            json!({"skills": {"technical": {"languages": ["Rust"]}, "soft": ["Leadership"]}}),
        )
        .await
        .unwrap();

    let response = h
        .channel
        .send(Command::GetMatchScore(MatchScorePayload {
            job_text: "Senior Rust engineer with leadership and Kafka experience".into(),
        }))
        .await
        .unwrap();

    assert_eq!(response.data["matched"], json!(["leadership", "rust"]));
    assert_eq!(response.data["missing"], json!(["kafka"]));
    assert_eq!(response.data["score"], 67);
}
