use super::*;
use crate::core::conversation::ConversationRecord;
use crate::core::message::{AppMessage, ChatMessage};
use crate::core::session::GenerationSettings;
use tempfile::tempdir;

fn run(session: &mut ChatSession, input: &str) -> (CommandResult, Vec<AppMessage>) {
    let result = process_input(session, input);
    (result, session.take_app_messages())
}

fn only_message(messages: &[AppMessage]) -> &AppMessage {
    assert_eq!(messages.len(), 1, "unexpected messages: {messages:?}");
    &messages[0]
}

#[test]
fn plain_text_is_sent_as_a_message() {
    let mut session = ChatSession::default();

    let (result, messages) = run(&mut session, "What is Rust?");

    assert_eq!(
        result,
        CommandResult::ProcessAsMessage("What is Rust?".to_string())
    );
    assert!(messages.is_empty());
}

#[test]
fn unknown_commands_are_reported_not_sent() {
    let mut session = ChatSession::default();

    let (result, messages) = run(&mut session, "/frobnicate now");

    assert_eq!(result, CommandResult::Continue);
    let message = only_message(&messages);
    assert_eq!(message.kind, AppMessageKind::Warning);
    assert!(message.content.contains("/frobnicate"));
}

#[test]
fn unknown_prefixes_suggest_matching_commands() {
    let mut session = ChatSession::default();

    let (_, messages) = run(&mut session, "/me");

    let message = only_message(&messages);
    assert!(message.content.contains("Did you mean /metadata?"));
}

#[test]
fn commands_are_case_insensitive() {
    let mut session = ChatSession::default();
    assert_eq!(run(&mut session, "/QUIT").0, CommandResult::Quit);
}

#[test]
fn help_lists_every_command() {
    let mut session = ChatSession::default();

    let (_, messages) = run(&mut session, "/help");

    let help = &only_message(&messages).content;
    for command in all_commands() {
        assert!(help.contains(command.usage), "missing {}", command.name);
    }
}

#[test]
fn matching_commands_filters_by_prefix() {
    let names: Vec<&str> = matching_commands("/m")
        .into_iter()
        .map(|command| command.name)
        .collect();
    assert_eq!(names, vec!["model", "max-tokens", "mcp", "metadata"]);
}

#[test]
fn temperature_is_validated() {
    let mut session = ChatSession::default();

    let (_, messages) = run(&mut session, "/temperature 0.25");
    assert_eq!(session.settings.temperature, 0.25);
    assert_eq!(only_message(&messages).kind, AppMessageKind::Info);

    let (_, messages) = run(&mut session, "/temperature 1.5");
    assert_eq!(session.settings.temperature, 0.25);
    assert_eq!(only_message(&messages).kind, AppMessageKind::Warning);

    let (_, messages) = run(&mut session, "/temperature warm");
    assert_eq!(only_message(&messages).content, "Usage: /temperature <0.0-1.0>");
}

#[test]
fn max_tokens_must_be_positive() {
    let mut session = ChatSession::default();

    run(&mut session, "/max-tokens 0");
    assert_eq!(session.settings.max_tokens, GenerationSettings::default().max_tokens);

    run(&mut session, "/max-tokens 2048");
    assert_eq!(session.settings.max_tokens, 2048);
}

#[test]
fn model_command_lists_and_switches() {
    let mut session = ChatSession::default();

    let (_, messages) = run(&mut session, "/model");
    assert!(only_message(&messages)
        .content
        .lines()
        .any(|line| line == " * sonar"));

    let (_, messages) = run(&mut session, "/model sonar-pro");
    assert_eq!(session.settings.model, "sonar-pro");
    assert_eq!(only_message(&messages).kind, AppMessageKind::Info);

    let (_, messages) = run(&mut session, "/model custom-model");
    assert_eq!(session.settings.model, "custom-model");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].kind, AppMessageKind::Warning);
}

#[test]
fn system_command_keeps_the_whole_text() {
    let mut session = ChatSession::default();

    run(&mut session, "/system You are a  careful  librarian.");

    assert_eq!(
        session.settings.system_message,
        "You are a  careful  librarian."
    );
}

#[test]
fn mcp_command_manages_servers() {
    let mut session = ChatSession::default();

    run(&mut session, "/mcp add http://localhost:8000");
    run(&mut session, "/mcp add http://localhost:8000");
    assert_eq!(session.tool_servers().len(), 1);

    let (_, messages) = run(&mut session, "/mcp add ftp://nope");
    assert_eq!(only_message(&messages).kind, AppMessageKind::Warning);

    run(&mut session, "/mcp on");
    assert!(session.use_tool_servers());

    let (_, messages) = run(&mut session, "/mcp");
    let listing = &only_message(&messages).content;
    assert!(listing.starts_with("Tool servers: on"));
    assert!(listing.contains("http://localhost:8000"));

    run(&mut session, "/mcp remove http://localhost:8000");
    run(&mut session, "/mcp off");
    assert!(session.tool_servers().is_empty());
    assert!(!session.use_tool_servers());

    let (_, messages) = run(&mut session, "/mcp sideways");
    assert!(only_message(&messages).content.starts_with("Usage: /mcp"));
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("chat.json");
    let mut session = ChatSession::default();
    session.load_record(ConversationRecord {
        timestamp: String::new(),
        model: "sonar-pro".to_string(),
        system_message: "Be kind.".to_string(),
        messages: vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")],
    });

    let (_, messages) = run(&mut session, &format!("/save {}", path.display()));
    assert!(only_message(&messages).content.contains("chat.json"));

    let mut restored = ChatSession::default();
    let (_, messages) = run(&mut restored, &format!("/load {}", path.display()));

    assert_eq!(only_message(&messages).kind, AppMessageKind::Info);
    assert_eq!(restored.history(), session.history());
    assert_eq!(restored.settings.model, "sonar-pro");
    assert_eq!(restored.settings.system_message, "Be kind.");
}

#[test]
fn saving_an_empty_conversation_is_skipped() {
    let mut session = ChatSession::default();
    let (_, messages) = run(&mut session, "/save whatever");
    assert_eq!(only_message(&messages).content, "Nothing to save yet.");
}

#[test]
fn invalid_conversation_files_leave_state_alone() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, r#"{"messages":[{"role":"user"}]}"#).unwrap();
    let mut session = ChatSession::default();
    session.load_record(ConversationRecord {
        messages: vec![ChatMessage::user("keep"), ChatMessage::assistant("me")],
        ..Default::default()
    });

    let (_, messages) = run(&mut session, &format!("/load {}", path.display()));

    let message = only_message(&messages);
    assert_eq!(message.kind, AppMessageKind::Warning);
    assert!(message.content.contains("Message 0"));
    assert_eq!(session.history().len(), 2);
}

#[test]
fn load_requires_a_path() {
    let mut session = ChatSession::default();
    let (_, messages) = run(&mut session, "/load");
    assert_eq!(only_message(&messages).content, "Usage: /load <file>");
}

#[test]
fn attach_and_detach() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "# Notes").unwrap();
    let mut session = ChatSession::default();

    let (_, messages) = run(&mut session, &format!("/attach {}", path.display()));
    assert_eq!(only_message(&messages).kind, AppMessageKind::Info);
    assert_eq!(session.pending_attachments().len(), 1);

    let (_, messages) = run(&mut session, "/attach /no/such/file.txt");
    assert_eq!(only_message(&messages).kind, AppMessageKind::Warning);

    let (_, messages) = run(&mut session, "/detach");
    assert_eq!(only_message(&messages).content, "Removed 1 attachment.");
    assert!(session.pending_attachments().is_empty());
}

#[test]
fn metadata_without_an_answer_says_so() {
    let mut session = ChatSession::default();

    let (_, messages) = run(&mut session, "/metadata");

    assert_eq!(only_message(&messages).content, "No answer yet.");
}
