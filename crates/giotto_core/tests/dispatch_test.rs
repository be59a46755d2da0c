//! End-to-end dispatch tests: payloads in, handler effects and sink
//! notifications out.

use giotto_core::{
    command_handler, component_handler, guild_only, CheckPredicate, CheckResult, Command,
    CommandBuilder, ComponentBinding, DispatchConfig, DispatchCore, DispatchEvent, GroupBuilder,
    InteractionGroup, RecordingSink, SubcommandBuilder,
};
use giotto_error::{CheckFailure, DispatchErrorKind, GiottoErrorKind, HandlerError};
use giotto_model::{CommandKind, CommandOption, ComponentKind, InteractionPayload, OptionKind};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn core_with_sink() -> (DispatchCore, Arc<RecordingSink>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
    let sink = Arc::new(RecordingSink::new());
    let core = DispatchCore::new(DispatchConfig::new(42)).with_sink(sink.clone());
    (core, sink)
}

fn command_payload(data: serde_json::Value) -> InteractionPayload {
    InteractionPayload::from_value(json!({
        "id": "100",
        "type": 2,
        "token": "tok",
        "application_id": "42",
        "guild_id": "500",
        "member": {"user": {"id": "600"}, "roles": ["700"]},
        "data": data
    }))
    .expect("payload decodes")
}

fn component_payload(custom_id: &str, component_type: u8) -> InteractionPayload {
    InteractionPayload::from_value(json!({
        "id": "101",
        "type": 3,
        "token": "tok",
        "application_id": "42",
        "guild_id": "500",
        "member": {"user": {"id": "600"}, "roles": []},
        "data": {"custom_id": custom_id, "component_type": component_type}
    }))
    .expect("payload decodes")
}

#[tokio::test]
async fn leaf_command_invoked_with_remapped_args() {
    let (mut core, sink) = core_with_sink();
    let seen = Arc::new(Mutex::new(None));
    let seen_in_handler = seen.clone();
    let handler = command_handler(move |ctx| {
        let seen = seen_in_handler.clone();
        async move {
            *seen.lock().expect("seen lock") = Some(ctx);
            Ok(())
        }
    });
    core.register_command(
        CommandBuilder::new("echo", handler)
            .option(CommandOption::new("foo", OptionKind::String).with_parameter_name("bar"))
            .option(CommandOption::new("count", OptionKind::Integer))
            .build()
            .expect("builds"),
    )
    .expect("registers");

    core.process(command_payload(json!({
        "id": "1", "name": "echo", "type": 1,
        "options": [
            {"name": "foo", "type": 3, "value": "hello"},
            {"name": "count", "type": 4, "value": 3},
            {"name": "extra", "type": 5, "value": true}
        ]
    })))
    .await;

    let ctx = seen.lock().expect("seen lock").clone().expect("handler ran");
    assert_eq!(ctx.qualified_name(), "echo");
    assert_eq!(ctx.arg("bar").and_then(|v| v.as_str()), Some("hello"));
    assert_eq!(ctx.arg("count").and_then(|v| v.as_i64()), Some(3));
    // An undeclared supplied option keeps its own name.
    assert!(ctx.arg("extra").is_some());
    assert!(ctx.arg("foo").is_none());

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], DispatchEvent::CommandReceived(_)));
    assert!(matches!(events[1], DispatchEvent::CommandComplete(_)));
}

#[tokio::test]
async fn group_path_resolves_to_nested_subcommand() {
    let (mut core, sink) = core_with_sink();
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_in_handler = calls.clone();
    let handler = command_handler(move |ctx| {
        let calls = calls_in_handler.clone();
        async move {
            assert_eq!(ctx.path(), &["audio".to_string(), "volume".to_string()]);
            // Declared option "foo" is bound to parameter "bar".
            assert_eq!(ctx.arg("bar").and_then(|v| v.as_i64()), Some(7));
            assert!(ctx.arg("foo").is_none());
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    });
    core.register_command(
        CommandBuilder::container("settings")
            .group(
                GroupBuilder::new("audio")
                    .subcommand(
                        SubcommandBuilder::new("volume", handler)
                            .option(
                                CommandOption::new("foo", OptionKind::Integer)
                                    .with_parameter_name("bar"),
                            )
                            .build(),
                    )
                    .build(),
            )
            .build()
            .expect("builds"),
    )
    .expect("registers");

    core.process(command_payload(json!({
        "id": "1", "name": "settings", "type": 1,
        "options": [{
            "name": "audio", "type": 2,
            "options": [{
                "name": "volume", "type": 1,
                "options": [{"name": "foo", "type": 4, "value": 7}]
            }]
        }]
    })))
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let events = sink.events();
    match &events[1] {
        DispatchEvent::CommandComplete(ctx) => {
            assert_eq!(ctx.qualified_name(), "settings audio volume");
        }
        other => panic!("expected completion, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_subcommand_reported_as_error() {
    let (mut core, sink) = core_with_sink();
    let handler = command_handler(|_ctx| async move { Ok(()) });
    core.register_command(
        CommandBuilder::container("tag")
            .subcommand(SubcommandBuilder::new("show", handler).build())
            .build()
            .expect("builds"),
    )
    .expect("registers");

    core.process(command_payload(json!({
        "id": "1", "name": "tag", "type": 1,
        "options": [{"name": "delete", "type": 1}]
    })))
    .await;

    let events = sink.events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        DispatchEvent::Error { error, .. } => match error.kind() {
            GiottoErrorKind::Dispatch(dispatch) => {
                assert!(matches!(
                    dispatch.kind(),
                    DispatchErrorKind::UnknownSubcommand { .. }
                ));
            }
            other => panic!("expected dispatch error, got {other:?}"),
        },
        other => panic!("expected error event, got {other:?}"),
    }
}

#[tokio::test]
async fn check_failure_skips_handler_and_notifies_twice() {
    let (mut core, sink) = core_with_sink();
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_in_handler = calls.clone();
    let handler = command_handler(move |_ctx| {
        let calls = calls_in_handler.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    });
    let deny = CheckPredicate::from_sync("deny", |_| {
        CheckResult::Fail(CheckFailure::predicate("deny", "always"))
    });
    core.register_command(
        CommandBuilder::new("ping", handler)
            .check(deny)
            .build()
            .expect("builds"),
    )
    .expect("registers");

    core.process(command_payload(json!({"id": "1", "name": "ping", "type": 1})))
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    let events = sink.events();
    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], DispatchEvent::CommandReceived(_)));
    match &events[1] {
        DispatchEvent::PermissionDenied { error, .. } => assert!(error.is_check_failure()),
        other => panic!("expected permission denial, got {other:?}"),
    }
    assert!(matches!(events[2], DispatchEvent::Error { .. }));
}

#[tokio::test]
async fn global_checks_gate_every_command() {
    let (mut core, sink) = core_with_sink();
    core.global_checks_mut().add(guild_only());
    let handler = command_handler(|_ctx| async move { Ok(()) });
    core.register_command(CommandBuilder::new("ping", handler).build().expect("builds"))
        .expect("registers");

    // A DM payload carries a user but no guild or member.
    let dm = InteractionPayload::from_value(json!({
        "id": "100",
        "type": 2,
        "token": "tok",
        "application_id": "42",
        "user": {"id": "600"},
        "data": {"id": "1", "name": "ping", "type": 1}
    }))
    .expect("payload decodes");
    core.process(dm).await;

    let events = sink.events();
    assert!(matches!(events[1], DispatchEvent::PermissionDenied { .. }));
}

#[tokio::test]
async fn handler_failure_reported_through_sink() {
    let (mut core, sink) = core_with_sink();
    let handler = command_handler(|_ctx| async move { Err(HandlerError::new("boom").into()) });
    core.register_command(CommandBuilder::new("ping", handler).build().expect("builds"))
        .expect("registers");

    core.process(command_payload(json!({"id": "1", "name": "ping", "type": 1})))
        .await;

    let events = sink.events();
    assert_eq!(events.len(), 2);
    match &events[1] {
        DispatchEvent::Error { error, .. } => {
            assert!(matches!(error.kind(), GiottoErrorKind::Handler(_)));
        }
        other => panic!("expected error event, got {other:?}"),
    }
}

#[tokio::test]
async fn user_command_dispatches_from_its_own_namespace() {
    let (mut core, sink) = core_with_sink();
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_in_handler = calls.clone();
    let handler = command_handler(move |_ctx| {
        let calls = calls_in_handler.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    });
    core.register_command(Command::user("Report", handler)).expect("registers");

    core.process(command_payload(json!({
        "id": "1", "name": "Report", "type": 2, "target_id": "900"
    })))
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(
        sink.events().last(),
        Some(DispatchEvent::CommandComplete(_))
    ));
}

#[tokio::test]
async fn component_bindings_fan_out_with_kind_filter() {
    let (core, sink) = core_with_sink();
    let any_calls = Arc::new(AtomicUsize::new(0));
    let button_calls = Arc::new(AtomicUsize::new(0));
    {
        let calls = any_calls.clone();
        core.bind_component(ComponentBinding::new(
            "confirm",
            component_handler(move |_ctx| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
        ));
    }
    {
        let calls = button_calls.clone();
        core.bind_component(
            ComponentBinding::new(
                "confirm",
                component_handler(move |_ctx| {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                }),
            )
            .with_kind(ComponentKind::Button),
        );
    }

    core.process(component_payload("confirm", 2)).await;
    assert_eq!(any_calls.load(Ordering::SeqCst), 1);
    assert_eq!(button_calls.load(Ordering::SeqCst), 1);

    // A select submission skips the button-only binding.
    core.process(component_payload("confirm", 3)).await;
    assert_eq!(any_calls.load(Ordering::SeqCst), 2);
    assert_eq!(button_calls.load(Ordering::SeqCst), 1);

    let events = sink.events();
    assert_eq!(events.len(), 3);
    assert!(events
        .iter()
        .all(|event| matches!(event, DispatchEvent::ComponentComplete(_))));
}

#[tokio::test]
async fn component_check_denial_skips_handler() {
    let (core, sink) = core_with_sink();
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_in_handler = calls.clone();
    let deny = CheckPredicate::from_sync("deny", |_| {
        CheckResult::Fail(CheckFailure::predicate("deny", "always"))
    });
    core.bind_component(
        ComponentBinding::new(
            "guarded",
            component_handler(move |_ctx| {
                let calls = calls_in_handler.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
        )
        .with_check(deny),
    );

    core.process(component_payload("guarded", 2)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    let events = sink.events();
    assert_eq!(events.len(), 3);
    match &events[0] {
        DispatchEvent::ComponentDenied { error, .. } => assert!(error.is_check_failure()),
        other => panic!("expected component denial, got {other:?}"),
    }
    assert!(matches!(events[1], DispatchEvent::Error { .. }));
    // Nothing ran, so the event also surfaces as unhandled.
    assert!(matches!(events[2], DispatchEvent::ComponentsUnhandled(_)));
}

#[tokio::test]
async fn unhandled_component_event_notified() {
    let (core, sink) = core_with_sink();
    core.process(component_payload("nobody-home", 2)).await;
    let events = sink.events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        DispatchEvent::ComponentsUnhandled(ctx) => assert_eq!(ctx.custom_id(), "nobody-home"),
        other => panic!("expected unhandled notification, got {other:?}"),
    }
}

#[tokio::test]
async fn wait_for_fulfilled_by_processed_event() {
    let (core, sink) = core_with_sink();
    let core = Arc::new(core);
    let registry = core.components().clone();
    let waiter = tokio::spawn(async move {
        registry
            .wait_for(
                Some("confirm".to_string()),
                giotto_core::any_component(),
                None,
            )
            .await
    });
    while core.components().pending_waits() == 0 {
        tokio::task::yield_now().await;
    }

    core.process(component_payload("confirm", 2)).await;
    let ctx = waiter.await.expect("join").expect("fulfilled");
    assert_eq!(ctx.custom_id(), "confirm");
    // A fulfilled wait counts as handled.
    assert!(sink.events().is_empty());
}

#[tokio::test]
async fn autocomplete_resolves_path_and_focus() {
    let (mut core, sink) = core_with_sink();
    let handler = command_handler(|_ctx| async move { Ok(()) });
    core.register_command(
        CommandBuilder::container("tag")
            .subcommand(
                SubcommandBuilder::new("show", handler)
                    .option(CommandOption::new("query", OptionKind::String).with_autocomplete(true))
                    .build(),
            )
            .build()
            .expect("builds"),
    )
    .expect("registers");

    let payload = InteractionPayload::from_value(json!({
        "id": "100",
        "type": 4,
        "token": "tok",
        "application_id": "42",
        "guild_id": "500",
        "data": {
            "id": "1", "name": "tag", "type": 1,
            "options": [{
                "name": "show", "type": 1,
                "options": [{"name": "query", "type": 3, "value": "he", "focused": true}]
            }]
        }
    }))
    .expect("payload decodes");
    core.process(payload).await;

    let events = sink.events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        DispatchEvent::Autocomplete { ctx, focused } => {
            assert_eq!(ctx.qualified_name(), "tag show");
            assert_eq!(focused, &["query".to_string()]);
            assert_eq!(ctx.arg("query").and_then(|v| v.as_str()), Some("he"));
        }
        other => panic!("expected autocomplete event, got {other:?}"),
    }
}

#[tokio::test]
async fn modal_submission_flattens_inputs() {
    let (core, sink) = core_with_sink();
    let payload = InteractionPayload::from_value(json!({
        "id": "100",
        "type": 5,
        "token": "tok",
        "application_id": "42",
        "data": {
            "custom_id": "feedback",
            "components": [
                {"components": [{"custom_id": "subject", "value": "hi"}]},
                {"components": [{"custom_id": "body", "value": "long text"}]}
            ]
        }
    }))
    .expect("payload decodes");
    core.process(payload).await;

    let events = sink.events();
    match &events[0] {
        DispatchEvent::ModalSubmit {
            custom_id, inputs, ..
        } => {
            assert_eq!(custom_id, "feedback");
            assert_eq!(inputs.len(), 2);
            assert_eq!(inputs[1].custom_id(), "body");
        }
        other => panic!("expected modal event, got {other:?}"),
    }
}

#[tokio::test]
async fn group_registration_tags_commands() {
    let (mut core, sink) = core_with_sink();
    let handler = command_handler(|_ctx| async move { Ok(()) });
    core.add_group(
        InteractionGroup::new("music")
            .command(CommandBuilder::new("play", handler).build().expect("builds"))
            .component(ComponentBinding::new(
                "music-next",
                component_handler(|_ctx| async move { Ok(()) }),
            )),
    )
    .expect("group registers");

    assert!(core.commands().contains(CommandKind::ChatInput, "play"));
    assert_eq!(core.components().bindings_for("music-next").len(), 1);

    core.process(command_payload(json!({"id": "1", "name": "play", "type": 1})))
        .await;
    match sink.events().last() {
        Some(DispatchEvent::CommandComplete(ctx)) => {
            assert_eq!(ctx.group().as_deref(), Some("music"));
        }
        other => panic!("expected completion, got {other:?}"),
    }
}

#[tokio::test]
async fn ping_interactions_ignored() {
    let (core, sink) = core_with_sink();
    let payload = InteractionPayload::from_value(json!({
        "id": "100",
        "type": 1,
        "token": "tok",
        "application_id": "42"
    }))
    .expect("payload decodes");
    core.process(payload).await;
    assert!(sink.events().is_empty());
}
