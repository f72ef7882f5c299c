use clap::{CommandFactory, Parser};
use dashsync::cli::{Cli, Commands};

#[test]
fn parse_valid_command_matrix() {
    let cases: Vec<(Vec<&str>, Commands)> = vec![
        (vec!["dashsync"], Commands::Run),
        (vec!["dashsync", "run"], Commands::Run),
        (vec!["dashsync", "once"], Commands::Once),
        (vec!["dashsync", "config"], Commands::Config),
        (vec!["dashsync", "--config", "c.toml", "once"], Commands::Once),
        (vec!["dashsync", "run", "--log-output", "both"], Commands::Run),
    ];

    for (args, expected) in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_ok(), "expected valid parse for args: {args:?}");
        assert_eq!(parsed.unwrap().effective_command(), expected);
    }
}

#[test]
fn parse_rejects_unknown_commands() {
    assert!(Cli::try_parse_from(["dashsync", "sync-all"]).is_err());
    assert!(Cli::try_parse_from(["dashsync", "--config"]).is_err());
}

#[test]
fn command_definition_is_consistent() {
    Cli::command().debug_assert();
}
