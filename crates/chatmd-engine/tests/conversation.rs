//! End-to-end pipeline tests over literal document fixtures.

use chatmd_core::constants::CELL_OUTPUT_NAME;
use chatmd_core::messages::Role;
use chatmd_engine::{ChatEngine, EngineConfig};
use chatmd_participants::ParticipantCache;
use serde_json::json;
use tempfile::TempDir;

fn parse_in(dir: &TempDir, input: &str) -> chatmd_core::Conversation {
    let engine = ChatEngine::new(EngineConfig::rooted_at(dir.path()));
    let mut cache = ParticipantCache::new();
    engine.parse(input, &mut cache).unwrap()
}

#[test]
fn single_message_document() {
    let dir = TempDir::new().unwrap();
    let convo = parse_in(&dir, "**user** Hello, assistant!\n\nThis is a multiline message.\n\n");
    assert_eq!(convo.messages.len(), 1);
    assert_eq!(convo.messages[0].name, "user");
    assert_eq!(
        convo.messages[0].content.as_text(),
        Some("Hello, assistant!\n\nThis is a multiline message.\n\n")
    );
    // A lone user gets an implicit assistant to talk to.
    assert!(convo.participants.contains_key("assistant"));
    assert_eq!(convo.next_recipient(), Some("assistant"));
}

#[test]
fn steps_execution_and_followup() {
    let dir = TempDir::new().unwrap();
    let input = "###### Steps\n- Run Shell Command [1] `{\"cmd\":\"cd /tmp\"}`\n\n###### Execution: Run Shell Command [1]\n\n<pre>\nOUTPUT 1\n</pre>\n\n**user** Here is another message.\n";
    let convo = parse_in(&dir, input);
    assert_eq!(convo.messages.len(), 3);

    let caller = &convo.messages[0];
    assert_eq!(caller.role, Role::Assistant);
    assert_eq!(caller.tool_calls.len(), 1);
    assert_eq!(caller.tool_calls[0].id, "1");
    assert_eq!(caller.tool_calls[0].function_name, "run_shell_command");
    assert_eq!(caller.tool_calls[0].arguments, json!({"cmd": "cd /tmp"}));

    let record = &convo.messages[1];
    assert_eq!(record.role, Role::Tool);
    assert_eq!(record.name, "run_shell_command");
    assert_eq!(record.tool_call_id.as_deref(), Some("1"));

    let followup = &convo.messages[2];
    assert_eq!(followup.role, Role::User);
    assert_eq!(followup.content.as_text(), Some("Here is another message.\n"));
}

#[test]
fn two_party_alternation_resolves_final_recipient() {
    let dir = TempDir::new().unwrap();
    let input = "---\nparticipants:\n  assistant1:\n    role: assistant\n---\n**user** First question.\n\n**assistant1** First answer.\n\n**user** Second question.\n";
    let convo = parse_in(&dir, input);
    assert_eq!(convo.messages.len(), 3);
    assert_eq!(convo.next_recipient(), Some("assistant1"));

    let recipients: Vec<&str> = convo
        .messages
        .iter()
        .map(|m| m.recipient.as_deref().unwrap())
        .collect();
    assert_eq!(recipients, ["assistant1", "user", "assistant1"]);
}

#[test]
fn greeting_mention_of_unknown_participant_wins() {
    let dir = TempDir::new().unwrap();
    let input =
        "---\nparticipants:\n  user1:\n    role: user\n  user2:\n    role: user\n---\n**user1** Hello @user3\nLet's discuss.\n";
    let convo = parse_in(&dir, input);
    assert_eq!(convo.next_recipient(), Some("user3"));
    assert_eq!(convo.messages.last().unwrap().recipient_role, Some(Role::Assistant));
}

#[test]
fn adjacent_duplicate_assistants_collapse_to_the_later() {
    let dir = TempDir::new().unwrap();
    let input = "**assistant** old reply\n\n**user** interlude\n\n**assistant** partial render\n\n**assistant** final render\n";
    let convo = parse_in(&dir, input);
    let contents: Vec<&str> = convo
        .messages
        .iter()
        .map(|m| m.content.as_text().unwrap())
        .collect();
    assert_eq!(
        contents,
        ["old reply\n\n", "interlude\n\n", "final render\n"]
    );
}

#[test]
fn front_matter_system_message_is_prepended() {
    let dir = TempDir::new().unwrap();
    let convo = parse_in(&dir, "---\nsystem: Keep answers short.\n---\n**user** hi\n");
    assert_eq!(convo.messages[0].role, Role::System);
    assert_eq!(convo.messages[0].content.as_text(), Some("Keep answers short."));
    assert_eq!(convo.front_matter.system(), Some("Keep answers short."));
}

#[test]
fn cell_output_round_trip() {
    let dir = TempDir::new().unwrap();
    let input = "**assistant** running:\n```python .eval\nprint(40 + 2)\n```\n\n###### Cell Output: stdout [cell-1]\n42\n";
    let convo = parse_in(&dir, input);
    assert_eq!(convo.messages.len(), 2);

    let output = &convo.messages[1];
    assert_eq!(output.name, CELL_OUTPUT_NAME);
    assert_eq!(output.role, Role::User);
    assert_eq!(output.code_cell_id.as_deref(), Some("cell-1"));
    assert_eq!(
        output.content.as_text(),
        Some("###### Cell Output: stdout [cell-1]\n42\n")
    );
    // The record threads back to the assistant that ran the cell.
    assert_eq!(output.recipient.as_deref(), Some("assistant"));
}

#[test]
fn text_transclusion_is_expanded() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("notes.md"), "remember the milk").unwrap();
    let convo = parse_in(&dir, "**user** todo: #[[notes.md]]\n");
    let text = convo.messages[0].content.as_text().unwrap();
    assert!(text.contains("remember the milk"));
    assert!(!text.contains("#[["));
}

#[test]
fn image_transclusion_produces_structured_content() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("shot.png"),
        [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00],
    )
    .unwrap();
    let convo = parse_in(&dir, "**user** see ![[shot.png]]\n");
    assert_eq!(convo.messages[0].content.image_count(), 1);
    assert_eq!(
        convo.messages[0].content.to_text(),
        "see ![[shot.png]]\n"
    );
}

#[test]
fn participant_definition_files_are_loaded_and_cached() {
    let dir = TempDir::new().unwrap();
    let participants_dir = dir.path().join("participants");
    std::fs::create_dir_all(&participants_dir).unwrap();
    std::fs::write(
        participants_dir.join("helper.md"),
        "---\nmodel: gpt-4o\n---\nYou are the helper.\n",
    )
    .unwrap();

    let engine = ChatEngine::new(EngineConfig::rooted_at(dir.path()));
    let mut cache = ParticipantCache::new();
    let input = "---\nparticipants:\n  helper:\n---\n**user** hi\n";

    let convo = engine.parse(input, &mut cache).unwrap();
    let helper = &convo.participants["helper"];
    assert_eq!(helper.model.as_deref(), Some("gpt-4o"));
    assert_eq!(helper.system_prompt.as_deref(), Some("You are the helper.\n"));
    assert!(!cache.is_empty());

    // A second parse with the same cache resolves identically.
    let again = engine.parse(input, &mut cache).unwrap();
    assert_eq!(again.participants["helper"], convo.participants["helper"]);
}

#[test]
fn malformed_document_fails_whole_parse() {
    let dir = TempDir::new().unwrap();
    let engine = ChatEngine::new(EngineConfig::rooted_at(dir.path()));
    let mut cache = ParticipantCache::new();
    let err = engine
        .parse("**user** hi\n###### Bogus Header\n", &mut cache)
        .unwrap_err();
    assert!(matches!(err, chatmd_engine::ChatError::Parse(_)));
}
