use super::*;
use clap::CommandFactory;

mod test_helpers {
    use super::*;

    pub(super) fn parse_args(argv: &[&str]) -> Args {
        Args::try_parse_from(argv)
            .unwrap_or_else(|err| panic!("argv={argv:?} should parse successfully: {err}"))
    }

    pub(super) fn assert_optional_flag_value(
        actual: Option<&str>,
        expected: Option<&str>,
        flag_name: &str,
        argv: &[&str],
    ) {
        assert_eq!(
            actual, expected,
            "unexpected value for {flag_name} when parsing argv={argv:?}"
        );
    }
}

use test_helpers::*;

#[test]
fn command_definition_is_consistent() {
    Args::command().debug_assert();
}

#[test]
fn no_subcommand_starts_chat_with_top_level_flags() {
    let argv = [
        "sonarchat",
        "-m",
        "sonar-pro",
        "-t",
        "0.2",
        "--max-tokens",
        "300",
        "--system",
        "Be brief.",
        "--load",
        "chat.json",
    ];
    let args = parse_args(&argv);

    assert!(args.command.is_none());
    let generation = &args.chat.generation;
    assert_optional_flag_value(generation.model.as_deref(), Some("sonar-pro"), "-m", &argv);
    assert_eq!(generation.temperature, Some(0.2));
    assert_eq!(generation.max_tokens, Some(300));
    assert_optional_flag_value(
        generation.system_message.as_deref(),
        Some("Be brief."),
        "--system",
        &argv,
    );
    assert_eq!(args.chat.load, Some(PathBuf::from("chat.json")));
}

#[test]
fn tool_server_flag_can_repeat() {
    let argv = [
        "sonarchat",
        "chat",
        "--tool-server",
        "http://localhost:9000",
        "--tool-server",
        "http://localhost:9001",
    ];
    let args = parse_args(&argv);

    match args.command {
        Some(Commands::Chat(options)) => {
            assert_eq!(
                options.generation.tool_servers,
                vec!["http://localhost:9000", "http://localhost:9001"]
            );
            assert_eq!(options.load, None);
        }
        other => panic!("expected chat command for argv={argv:?}, got {other:?}"),
    }
}

#[test]
fn say_collects_prompt_words_and_attachments() {
    let argv = [
        "sonarchat",
        "say",
        "--attach",
        "notes.txt",
        "-m",
        "sonar",
        "what",
        "changed",
        "today?",
    ];
    let args = parse_args(&argv);

    match args.command {
        Some(Commands::Say {
            generation,
            attachments,
            no_stream,
            prompt,
        }) => {
            assert_optional_flag_value(generation.model.as_deref(), Some("sonar"), "-m", &argv);
            assert_eq!(attachments, vec![PathBuf::from("notes.txt")]);
            assert!(!no_stream);
            assert_eq!(prompt, vec!["what", "changed", "today?"]);
        }
        other => panic!("expected say command for argv={argv:?}, got {other:?}"),
    }
}

#[test]
fn say_requires_a_prompt() {
    assert!(Args::try_parse_from(["sonarchat", "say"]).is_err());
}

#[test]
fn say_accepts_no_stream() {
    let args = parse_args(&["sonarchat", "say", "--no-stream", "hello"]);
    assert!(matches!(
        args.command,
        Some(Commands::Say {
            no_stream: true,
            ..
        })
    ));
}

#[test]
fn probe_takes_a_url_and_optional_tools_flag() {
    let args = parse_args(&["sonarchat", "probe", "http://localhost:9000", "--tools"]);
    assert_eq!(
        args.command,
        Some(Commands::Probe {
            url: "http://localhost:9000".to_string(),
            tools: true,
        })
    );
}

#[test]
fn set_keeps_multi_word_values() {
    let args = parse_args(&["sonarchat", "set", "system-message", "Cite", "-your", "sources"]);
    assert_eq!(
        args.command,
        Some(Commands::Set {
            key: Some("system-message".to_string()),
            value: vec!["Cite".to_string(), "-your".to_string(), "sources".to_string()],
        })
    );

    let listing = parse_args(&["sonarchat", "set"]);
    assert_eq!(
        listing.command,
        Some(Commands::Set {
            key: None,
            value: Vec::new(),
        })
    );
}

#[test]
fn unset_takes_an_optional_value() {
    let args = parse_args(&["sonarchat", "unset", "tool-server", "http://localhost:9000"]);
    assert_eq!(
        args.command,
        Some(Commands::Unset {
            key: "tool-server".to_string(),
            value: Some("http://localhost:9000".to_string()),
        })
    );

    let args = parse_args(&["sonarchat", "unset", "temperature"]);
    assert_eq!(
        args.command,
        Some(Commands::Unset {
            key: "temperature".to_string(),
            value: None,
        })
    );
}

#[test]
fn missing_api_key_is_explained() {
    let err = match build_client(&Config::default()) {
        Ok(_) => panic!("a client without an API key should not build"),
        Err(err) => err,
    };
    assert!(err.to_string().contains(API_KEY_ENV));
}

#[test]
fn configured_api_key_builds_a_client() {
    let config = Config {
        api_key: Some("pplx-test".to_string()),
        base_url: Some("http://localhost:1234/".to_string()),
        ..Default::default()
    };
    let client = build_client(&config).unwrap();
    assert_eq!(client.base_url(), "http://localhost:1234");
}
