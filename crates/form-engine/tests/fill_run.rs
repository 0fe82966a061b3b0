use std::sync::Arc;

use autofill_core_types::{
    FieldCatalog, FieldCategory, FillPass, NodeId, Profile, RawFieldCatalog, ResumeFile,
    SkipReason,
};
use chrono::NaiveDate;
use form_engine::{
    DomEvent, FormFiller, FormFillerBuilder, Highlight, MemoryDom, PacingPolicy, StaticResume,
};
use serde_json::{json, Value};

fn page(value: Value) -> Arc<MemoryDom> {
    Arc::new(MemoryDom::from_fixture(&value.to_string()).unwrap())
}

fn catalog(value: Value) -> FieldCatalog {
    let raw: RawFieldCatalog = serde_json::from_value(value).unwrap();
    FieldCatalog::from_raw(raw)
}

fn profile(value: Value) -> Profile {
    serde_json::from_value(value).unwrap()
}

fn jane() -> Profile {
    profile(json!({
        "personalInfo": {
            "firstName": "Jane",
            "lastName": "Doe",
            "email": "jane@x.com",
            "phone": "555-123-4567"
        }
    }))
}

fn filler(dom: Arc<MemoryDom>) -> Arc<dyn FormFiller> {
    FormFillerBuilder::new(PacingPolicy::immediate())
        .with_dom(dom)
        .with_today(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
        .build()
        .unwrap()
}

#[tokio::test]
async fn fills_email_and_page_listener_sees_change() {
    let dom = page(json!({
        "elements": [{"id": 1, "type": "email", "tracked": true}]
    }));
    let mut listener = dom.subscribe();
    let fields = catalog(json!({
        "personal": [{"element": 1, "classification": "email", "type": "email", "tagName": "input"}]
    }));

    let result = filler(dom.clone()).fill(Some(&jane()), &fields).await;

    assert!(result.success);
    assert_eq!(result.filled_fields.len(), 1);
    assert_eq!(result.filled_fields[0].field, "email");
    assert_eq!(result.filled_fields[0].value, "jane@x.com");
    assert_eq!(dom.value(NodeId(1)).as_deref(), Some("jane@x.com"));
    assert_eq!(dom.framework_value(NodeId(1)).as_deref(), Some("jane@x.com"));

    let mut saw_change = false;
    while let Ok(event) = listener.try_recv() {
        if event.node == NodeId(1) && event.event == DomEvent::Change {
            assert_eq!(event.value, "jane@x.com");
            saw_change = true;
        }
    }
    assert!(saw_change);
}

#[tokio::test]
async fn text_write_replays_full_event_sequence() {
    let dom = page(json!({"elements": [{"id": 1}]}));
    let fields = catalog(json!({
        "personal": [{"element": 1, "classification": "firstName", "tagName": "input"}]
    }));

    filler(dom.clone()).fill(Some(&jane()), &fields).await;

    assert_eq!(
        dom.events_for(NodeId(1)),
        vec![
            DomEvent::Input,
            DomEvent::Change,
            DomEvent::KeyDown,
            DomEvent::KeyUp,
            DomEvent::Blur
        ]
    );
    assert_eq!(dom.highlight_of(NodeId(1)), Some(Highlight::Filled));
    // The trailing blur releases focus.
    assert_eq!(dom.focused(), None);
}

#[tokio::test]
async fn relocation_radio_group_gets_the_no_answer() {
    let dom = page(json!({
        "elements": [
            {"id": 10, "type": "radio", "name": "relocate", "value": "yes", "label": "Yes",
             "containerLabel": "Are you willing to relocate?"},
            {"id": 11, "type": "radio", "name": "relocate", "value": "no", "label": "No",
             "containerLabel": "Are you willing to relocate?"}
        ]
    }));
    let prefs = profile(json!({"preferences": {"willingToRelocate": false}}));

    let result = filler(dom.clone()).fill(Some(&prefs), &FieldCatalog::new()).await;

    assert!(dom.is_checked(NodeId(11)));
    assert!(!dom.is_checked(NodeId(10)));
    let radios: Vec<_> = result
        .filled_fields
        .iter()
        .filter(|f| f.pass == FillPass::RadioGroups)
        .collect();
    assert_eq!(radios.len(), 1);
    assert_eq!(radios[0].field, "radio:relocate");
    assert_eq!(radios[0].value, "no");
    assert_eq!(dom.events_for(NodeId(11)), vec![DomEvent::Change, DomEvent::Click]);
}

#[tokio::test]
async fn answered_radio_group_is_left_alone() {
    let dom = page(json!({
        "elements": [
            {"id": 10, "type": "radio", "name": "relocate", "value": "yes", "checked": true,
             "legend": "Willing to relocate?"},
            {"id": 11, "type": "radio", "name": "relocate", "value": "no",
             "legend": "Willing to relocate?"}
        ]
    }));
    let prefs = profile(json!({"preferences": {"willingToRelocate": false}}));

    let result = filler(dom.clone()).fill(Some(&prefs), &FieldCatalog::new()).await;

    assert!(dom.is_checked(NodeId(10)));
    assert!(dom.events().is_empty());
    assert_eq!(result.skipped_fields[0].reason, SkipReason::AlreadyAnswered);
}

#[tokio::test]
async fn equivalent_prefilled_value_is_not_rewritten() {
    let dom = page(json!({
        "elements": [{"id": 1, "type": "email", "value": "  JANE@x.com "}]
    }));
    let fields = catalog(json!({
        "personal": [{"element": 1, "classification": "email", "type": "email", "tagName": "input"}]
    }));

    let result = filler(dom.clone()).fill(Some(&jane()), &fields).await;

    assert!(result.filled_fields.is_empty());
    assert_eq!(result.skipped_fields[0].reason, SkipReason::AlreadyFilled);
    assert!(dom.events().is_empty());
    assert_eq!(dom.value(NodeId(1)).as_deref(), Some("  JANE@x.com "));
}

#[tokio::test]
async fn hidden_controls_are_skipped() {
    let dom = page(json!({
        "elements": [
            {"id": 1, "display": "none"},
            {"id": 2, "width": 0.0, "height": 0.0}
        ]
    }));
    let fields = catalog(json!({
        "personal": [
            {"element": 1, "classification": "firstName", "tagName": "input"},
            {"element": 2, "classification": "lastName", "tagName": "input"}
        ]
    }));

    let result = filler(dom.clone()).fill(Some(&jane()), &fields).await;

    assert_eq!(result.skipped_fields.len(), 2);
    assert!(result
        .skipped_fields
        .iter()
        .all(|s| s.reason == SkipReason::NotVisible));
    assert!(dom.events().is_empty());
}

#[tokio::test]
async fn fields_without_profile_data_are_not_visited() {
    let dom = page(json!({"elements": [{"id": 1}]}));
    let fields = catalog(json!({
        "personal": [{"element": 1, "classification": "linkedin", "tagName": "input"}]
    }));

    let result = filler(dom.clone()).fill(Some(&jane()), &fields).await;

    assert!(result.success);
    assert_eq!(result.total_processed(), 0);
}

#[tokio::test]
async fn select_takes_the_affirmative_option_for_a_true_preference() {
    let dom = page(json!({
        "elements": [{
            "id": 5, "tagName": "select", "tracked": true,
            "options": [
                {"value": "", "text": "Select..."},
                {"value": "1", "text": "Yes"},
                {"value": "0", "text": "No"}
            ]
        }]
    }));
    let fields = catalog(json!({
        "preferences": [{"element": 5, "classification": "sponsorship", "tagName": "select"}]
    }));
    let prefs = profile(json!({"preferences": {"sponsorshipRequired": true}}));

    let result = filler(dom.clone()).fill(Some(&prefs), &fields).await;

    assert_eq!(dom.value(NodeId(5)).as_deref(), Some("1"));
    assert_eq!(dom.framework_value(NodeId(5)).as_deref(), Some("1"));
    assert_eq!(result.filled_fields[0].value, "Yes");
}

#[tokio::test]
async fn unmatched_select_is_skipped() {
    let dom = page(json!({
        "elements": [{
            "id": 5, "tagName": "select",
            "options": [{"value": "", "text": "Choose"}, {"value": "fr", "text": "France"}]
        }]
    }));
    let fields = catalog(json!({
        "personal": [{"element": 5, "classification": "country", "tagName": "select"}]
    }));
    let who = profile(json!({"personalInfo": {"country": "Japan"}}));

    let result = filler(dom.clone()).fill(Some(&who), &fields).await;

    assert_eq!(result.skipped_fields[0].reason, SkipReason::NoMatchingOption);
    assert_eq!(dom.value(NodeId(5)).as_deref(), Some(""));
}

#[tokio::test]
async fn missing_resume_flags_the_file_input() {
    let dom = page(json!({"elements": [{"id": 7, "type": "file"}]}));
    let fields = catalog(json!({
        "resume": [{"element": 7, "classification": "resume", "type": "file", "tagName": "input"}]
    }));

    let result = filler(dom.clone()).fill(Some(&jane()), &fields).await;

    assert!(result.success);
    assert!(result.errors.is_empty());
    assert_eq!(result.skipped_fields[0].reason, SkipReason::NoResumeStored);
    assert_eq!(result.skipped_fields[0].pass, FillPass::ResumeFiles);
    assert_eq!(dom.highlight_of(NodeId(7)), Some(Highlight::MissingResume));
}

#[tokio::test]
async fn cached_resume_is_attached() {
    let dom = page(json!({"elements": [{"id": 7, "type": "file"}]}));
    let fields = catalog(json!({
        "resume": [{"element": 7, "classification": "resume", "type": "file", "tagName": "input"}]
    }));
    let resume = ResumeFile {
        name: "jane.pdf".into(),
        mime_type: "application/pdf".into(),
        size: 5,
        encoded_data: "data:application/pdf;base64,JVBERi0=".into(),
        uploaded_at: None,
    };
    let filler = FormFillerBuilder::new(PacingPolicy::immediate())
        .with_dom(dom.clone())
        .with_resumes(Arc::new(StaticResume(Some(resume))))
        .build()
        .unwrap();

    let result = filler.fill(Some(&jane()), &fields).await;

    assert_eq!(result.filled_fields[0].value, "jane.pdf");
    let files = dom.files(NodeId(7));
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].bytes, b"%PDF-");
    assert_eq!(dom.events_for(NodeId(7)), vec![DomEvent::Change, DomEvent::Input]);
}

#[tokio::test]
async fn failing_field_does_not_stop_the_run() {
    let dom = page(json!({
        "elements": [{"id": 1, "type": "email"}, {"id": 2, "type": "tel"}]
    }));
    dom.fail_writes_to(NodeId(1));
    let fields = catalog(json!({
        "personal": [
            {"element": 1, "classification": "email", "type": "email", "tagName": "input"},
            {"element": 2, "classification": "phone", "type": "tel", "tagName": "input"}
        ]
    }));

    let result = filler(dom.clone()).fill(Some(&jane()), &fields).await;

    assert!(result.success);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].field, "email");
    assert_eq!(result.filled_fields[0].field, "phone");
    assert_eq!(dom.value(NodeId(2)).as_deref(), Some("(555) 123-4567"));
}

#[tokio::test]
async fn missing_profile_fails_the_run() {
    let dom = page(json!({"elements": [{"id": 1}]}));
    let fields = catalog(json!({
        "personal": [{"element": 1, "classification": "firstName", "tagName": "input"}]
    }));

    let result = filler(dom.clone()).fill(None, &fields).await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("No profile data provided"));
    assert!(dom.events().is_empty());
}

#[tokio::test]
async fn each_pass_accounts_for_every_processed_field() {
    let dom = page(json!({
        "elements": [
            {"id": 1, "type": "email", "form": 100},
            {"id": 2, "display": "none", "form": 100},
            {"id": 3, "type": "file", "form": 100},
            {"id": 10, "type": "radio", "name": "remote", "value": "yes", "form": 100,
             "legend": "Open to remote work?"},
            {"id": 11, "type": "radio", "name": "remote", "value": "no", "form": 100,
             "legend": "Open to remote work?"},
            {"id": 12, "type": "radio", "name": "color", "value": "red", "form": 100,
             "legend": "Favourite colour"},
            {"id": 20, "type": "radio", "name": "relocate", "value": "no", "form": 200,
             "legend": "Relocate?"}
        ]
    }));
    let fields = catalog(json!({
        "personal": [
            {"element": 1, "classification": "email", "type": "email", "tagName": "input"},
            {"element": 2, "classification": "firstName", "tagName": "input"}
        ],
        "resume": [{"element": 3, "classification": "resume", "type": "file", "tagName": "input"}]
    }));
    let who = profile(json!({
        "personalInfo": {"firstName": "Jane", "email": "jane@x.com"},
        "preferences": {"remotePreferred": true, "willingToRelocate": false}
    }));

    let result = filler(dom.clone()).fill(Some(&who), &fields).await;

    assert_eq!(result.processed_in(FillPass::Category(FieldCategory::Personal)), 2);
    assert_eq!(result.processed_in(FillPass::ResumeFiles), 1);
    // The relocate group lives in another form and is out of scope.
    assert_eq!(result.processed_in(FillPass::RadioGroups), 2);
    assert_eq!(result.total_processed(), 5);
    assert!(dom.is_checked(NodeId(10)));
    assert!(!dom.is_checked(NodeId(20)));
}

#[tokio::test(start_paused = true)]
async fn default_pacing_holds_each_field() {
    let dom = page(json!({"elements": [{"id": 1}, {"id": 2}]}));
    let fields = catalog(json!({
        "personal": [
            {"element": 1, "classification": "firstName", "tagName": "input"},
            {"element": 2, "classification": "lastName", "tagName": "input"}
        ]
    }));
    let filler = FormFillerBuilder::new(PacingPolicy::default())
        .with_dom(dom.clone())
        .build()
        .unwrap();

    let started = tokio::time::Instant::now();
    let result = filler.fill(Some(&jane()), &fields).await;

    assert_eq!(result.filled_fields.len(), 2);
    // pre-focus + post-focus + blur settle + inter-field, per field
    assert!(started.elapsed() >= std::time::Duration::from_millis(2 * 400));
}

fn employed() -> Profile {
    profile(json!({
        "experience": [{"title": "Engineer", "company": "Acme", "current": true}]
    }))
}

fn currently_working_catalog() -> FieldCatalog {
    catalog(json!({
        "experience": [{"element": 1, "classification": "currentlyWorking",
                        "type": "checkbox", "tagName": "input"}]
    }))
}

#[tokio::test]
async fn currently_working_checkbox_is_ticked_with_change_then_click() {
    let dom = page(json!({"elements": [{"id": 1, "type": "checkbox"}]}));

    let result = filler(dom.clone())
        .fill(Some(&employed()), &currently_working_catalog())
        .await;

    assert!(dom.is_checked(NodeId(1)));
    assert_eq!(dom.events_for(NodeId(1)), vec![DomEvent::Change, DomEvent::Click]);
    assert_eq!(result.filled_fields.len(), 1);
    assert_eq!(result.filled_fields[0].field, "currentlyWorking");
    assert_eq!(result.filled_fields[0].value, "true");
    assert_eq!(
        result.filled_fields[0].pass,
        FillPass::Category(FieldCategory::Experience)
    );
}

#[tokio::test]
async fn checkbox_already_in_wanted_state_is_skipped() {
    let dom = page(json!({"elements": [{"id": 1, "type": "checkbox", "checked": true}]}));

    let result = filler(dom.clone())
        .fill(Some(&employed()), &currently_working_catalog())
        .await;

    assert!(result.filled_fields.is_empty());
    assert_eq!(result.skipped_fields.len(), 1);
    assert_eq!(result.skipped_fields[0].reason, SkipReason::AlreadyFilled);
    assert!(dom.is_checked(NodeId(1)));
    assert!(dom.events_for(NodeId(1)).is_empty());
}

#[tokio::test]
async fn unknown_tags_are_reported_and_the_rest_is_filled() {
    let dom = page(json!({"elements": [{"id": 1, "type": "email"}, {"id": 2}, {"id": 3}]}));
    let fields = catalog(json!({
        "personal": [
            {"element": 1, "classification": "email", "type": "email", "tagName": "input"},
            {"element": 2, "classification": "middleName", "tagName": "input"}
        ],
        "hobbies": [{"element": 3, "classification": "firstName", "tagName": "input"}]
    }));

    let result = filler(dom.clone()).fill(Some(&jane()), &fields).await;

    assert!(result.success);
    assert_eq!(dom.value(NodeId(1)).as_deref(), Some("jane@x.com"));
    assert_eq!(dom.value(NodeId(3)).as_deref(), Some(""));
    assert_eq!(result.errors.len(), 2);
    assert_eq!(result.errors[0].field, "firstName");
    assert_eq!(result.errors[0].pass, FillPass::Catalog);
    assert_eq!(result.errors[1].field, "middleName");
    assert_eq!(
        result.errors[1].pass,
        FillPass::Category(FieldCategory::Personal)
    );
    assert!(result.errors[1].message.contains("middleName"));
}
