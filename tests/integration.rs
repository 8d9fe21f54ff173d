use pretty_assertions::assert_eq;
use serde_json::json;
use zenith_array_field::controller::WrapperState;
use zenith_array_field::{
    render_request, ArrayField, ArrayFieldError, ControlEvent, ControlKind, ControlStyle, Element,
    FieldConfig, HtmlOptions, InitHookRegistry, InputKind, ModelHost, RenderRequest,
    RepeaterController,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn render_group(host: &ModelHost, attribute: &str, config: FieldConfig) -> Element {
    let mut field = ArrayField::new(host, attribute, config);
    field.text_input(&HtmlOptions::new()).unwrap();
    field.render().unwrap()
}

fn controls(states: &[WrapperState]) -> Vec<Option<ControlKind>> {
    states.iter().map(|s| s.control).collect()
}

fn names(states: &[WrapperState]) -> Vec<String> {
    states.iter().flat_map(|s| s.names.clone()).collect()
}

// ============================================================================
// Rendering scenarios
// ============================================================================

#[test]
fn empty_value_renders_single_add_slot() {
    let host = ModelHost::new("Post");
    let group = render_group(&host, "tags", FieldConfig::default());
    let states = RepeaterController::default().describe(&group);

    assert_eq!(states.len(), 1);
    assert_eq!(states[0].index, Some(0));
    assert_eq!(controls(&states), vec![Some(ControlKind::Add)]);
}

#[test]
fn three_values_and_one_blank_render_four_slots() {
    let host = ModelHost::new("Post").with_value("tags", json!(["x", "y", "z"]));
    let group = render_group(&host, "tags", FieldConfig::default().with_show_new_fields(1));
    let states = RepeaterController::default().describe(&group);

    let indices: Vec<_> = states.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![Some(0), Some(1), Some(2), Some(3)]);
    assert_eq!(
        controls(&states),
        vec![
            Some(ControlKind::Remove),
            Some(ControlKind::Remove),
            Some(ControlKind::Remove),
            Some(ControlKind::Add),
        ]
    );
}

#[test]
fn only_last_wrapper_carries_naming_metadata() {
    let host = ModelHost::new("Post").with_value("tags", json!(["x", "y"]));
    let group = render_group(&host, "tags", FieldConfig::default().with_init_hook("initTags"));
    let controller = RepeaterController::default();
    let wrappers = controller.wrappers(&group);

    assert_eq!(wrappers[0].attr("data-id"), None);
    assert_eq!(wrappers[0].attr("data-name"), None);
    assert_eq!(wrappers[1].attr("data-id"), Some("post-tags"));
    assert_eq!(wrappers[1].attr("data-name"), Some("Post[tags]"));
    assert_eq!(wrappers[1].attr("data-init"), Some("initTags"));
}

#[test]
fn render_request_round_trips_through_json() {
    let request: RenderRequest = serde_json::from_value(json!({
        "host": {
            "form_name": "Post",
            "attributes": { "tags": ["rust"] },
            "required": ["tags"],
            "errors": { "tags": ["Tags cannot be blank."] },
            "validators": {
                "tags": [{ "js": "yii.validation.required(value, messages, {});" }]
            }
        },
        "attribute": "tags",
        "input": { "kind": "textarea" },
        "config": { "show_new_fields": 1 }
    }))
    .unwrap();

    let output = render_request(&request).unwrap();
    assert_eq!(output.slot_count, 2);
    assert_eq!(output.client_options.len(), 2);
    assert_eq!(output.client_options[1]["id"], json!("post-tags-1"));
    assert_eq!(output.client_options[1]["name"], json!("tags[1]"));
    assert!(output.html.contains(r#"<textarea id="post-tags-0""#));
    assert!(output.html.contains("required has-error"));
    assert!(output.html.contains("Tags cannot be blank."));
}

#[test]
fn file_request_requires_multipart() {
    let request = RenderRequest {
        host: ModelHost::new("Upload"),
        attribute: "files".into(),
        input: InputKind::File,
        options: HtmlOptions::new(),
        config: FieldConfig::default(),
    };
    assert!(render_request(&request).unwrap().requires_multipart);
}

// ============================================================================
// Render + controller round trips
// ============================================================================

#[test]
fn add_click_on_last_slot_appends_next_index() {
    let host = ModelHost::new("").with_value("attr", json!(["a", "b"]));
    let mut group = render_group(&host, "attr", FieldConfig::default());
    let controller = RepeaterController::default();

    let outcome = controller.add(&mut group, 1).unwrap();
    assert_eq!(outcome.index, 2);

    let states = controller.describe(&group);
    let indices: Vec<_> = states.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![Some(0), Some(1), Some(2)]);
    assert_eq!(names(&states), vec!["attr[0]", "attr[1]", "attr[2]"]);
    assert_eq!(
        controls(&states),
        vec![Some(ControlKind::Remove), Some(ControlKind::Remove), Some(ControlKind::Add)]
    );
}

#[test]
fn clone_keeps_add_and_can_be_clicked_again() {
    let host = ModelHost::new("Post");
    let mut group = render_group(&host, "tags", FieldConfig::default());
    let controller = RepeaterController::default();

    controller.add(&mut group, 0).unwrap();
    controller.add(&mut group, 1).unwrap();

    let states = controller.describe(&group);
    assert_eq!(
        names(&states),
        vec!["Post[tags][0]", "Post[tags][1]", "Post[tags][2]"]
    );
    let ids: Vec<String> = states.iter().flat_map(|s| s.ids.clone()).collect();
    assert_eq!(ids, vec!["post-tags-0", "post-tags-1", "post-tags-2"]);
}

#[test]
fn removing_middle_slot_leaves_siblings_untouched() {
    let host = ModelHost::new("Post").with_value("tags", json!(["a", "b", "c"]));
    let mut group = render_group(&host, "tags", FieldConfig::default());
    let controller = RepeaterController::default();

    match controller.click(&mut group, 1).unwrap() {
        ControlEvent::Removed(wrapper) => assert_eq!(wrapper.attr("data-index"), Some("1")),
        other => panic!("expected removal, got {other:?}"),
    }

    let states = controller.describe(&group);
    let indices: Vec<_> = states.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![Some(0), Some(2)]);
    assert_eq!(names(&states), vec!["Post[tags][0]", "Post[tags][2]"]);
}

#[test]
fn input_group_layout_survives_add() {
    let host = ModelHost::new("Post");
    let mut group = render_group(&host, "tags", FieldConfig::default().with_input_group(true));
    let controller = RepeaterController::default();

    controller.add(&mut group, 0).unwrap();
    let wrappers = controller.wrappers(&group);
    for wrapper in &wrappers {
        assert!(wrapper.has_class("input-group"));
        assert!(wrapper.find(&|el| el.has_class("input-group-btn")).is_some());
    }
    assert_eq!(controller.control_kind(wrappers[0]), Some(ControlKind::Remove));
}

#[test]
fn init_hook_runs_for_each_added_slot() {
    let host = ModelHost::new("Post");
    let mut group = render_group(&host, "tags", FieldConfig::default().with_init_hook("initTags"));

    let hooks = InitHookRegistry::new();
    hooks.register("initTags", |wrapper, ctx| {
        wrapper.set_attr("data-ready", ctx.index.to_string());
    });
    let controller = RepeaterController::new(ControlStyle::default(), hooks);

    assert!(controller.add(&mut group, 0).unwrap().hook_invoked);
    assert!(controller.add(&mut group, 1).unwrap().hook_invoked);

    let ready: Vec<_> = controller
        .wrappers(&group)
        .iter()
        .map(|w| w.attr("data-ready").map(str::to_string))
        .collect();
    assert_eq!(ready, vec![None, Some("1".to_string()), Some("2".to_string())]);
}

#[test]
fn unregistered_init_hook_is_skipped() {
    let host = ModelHost::new("Post");
    let mut group = render_group(&host, "tags", FieldConfig::default().with_init_hook("nobody"));
    let outcome = RepeaterController::default().add(&mut group, 0).unwrap();
    assert!(!outcome.hook_invoked);
}

#[test]
fn custom_control_style_is_honoured_by_controller() {
    let mut config = FieldConfig::default();
    config.group_options = HtmlOptions::with_class("form-group");
    config.field_wrapper_options = HtmlOptions::new();
    config.controls.group_marker = "repeat".into();
    config.controls.wrapper_marker = "repeat-row".into();
    config.controls.add_marker = "repeat-add".into();
    config.controls.remove_marker = "repeat-remove".into();

    let host = ModelHost::new("Post");
    let mut group = render_group(&host, "tags", config.clone());
    let controller = RepeaterController::new(config.controls.clone(), InitHookRegistry::new());

    controller.add(&mut group, 0).unwrap();
    assert_eq!(
        controls(&controller.describe(&group)),
        vec![Some(ControlKind::Remove), Some(ControlKind::Add)]
    );

    // The default controller does not recognise this group.
    assert!(matches!(
        RepeaterController::default().add(&mut group, 0),
        Err(ArrayFieldError::NotAFieldGroup { .. })
    ));
}
