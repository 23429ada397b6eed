use clap::Parser;
use stageward::cli::{Cli, Commands};

#[test]
fn test_parse_init() {
    let cli = Cli::try_parse_from(vec!["stageward", "init", "Ship the importer"]).unwrap();

    match cli.command {
        Commands::Init { objective } => assert_eq!(objective, "Ship the importer"),
        _ => panic!("Wrong command"),
    }
    assert!(!cli.json);
    assert!(cli.config.is_none());
}

#[test]
fn test_parse_check_with_stage_and_outputs() {
    let cli = Cli::try_parse_from(vec![
        "stageward",
        "check",
        "--stage",
        "PLAN",
        "--outputs",
        "records.json",
        "--id",
        "wf-1234",
    ])
    .unwrap();

    match cli.command {
        Commands::Check { id, stage, outputs } => {
            assert_eq!(id.as_deref(), Some("wf-1234"));
            assert_eq!(stage.as_deref(), Some("PLAN"));
            assert_eq!(outputs.unwrap().to_str(), Some("records.json"));
        }
        _ => panic!("Wrong command"),
    }
}

#[test]
fn test_parse_check_defaults() {
    let cli = Cli::try_parse_from(vec!["stageward", "check"]).unwrap();

    match cli.command {
        Commands::Check { id, stage, outputs } => {
            assert!(id.is_none());
            assert!(stage.is_none());
            assert!(outputs.is_none());
        }
        _ => panic!("Wrong command"),
    }
}

#[test]
fn test_parse_transition() {
    let cli =
        Cli::try_parse_from(vec!["stageward", "transition", "REVIEW_POST", "--id", "wf-9"]).unwrap();

    match cli.command {
        Commands::Transition { target, id } => {
            assert_eq!(target, "REVIEW_POST");
            assert_eq!(id.as_deref(), Some("wf-9"));
        }
        _ => panic!("Wrong command"),
    }
}

#[test]
fn test_parse_todo_with_overrides() {
    let cli = Cli::try_parse_from(vec![
        "stageward",
        "todo",
        "Wire the parser",
        "--priority",
        "high",
        "--success-criteria",
        "All fixtures parse",
        "--time-budget",
        "≤60m",
    ])
    .unwrap();

    match cli.command {
        Commands::Todo { content, priority, success_criteria, time_budget, objective, .. } => {
            assert_eq!(content, "Wire the parser");
            assert_eq!(priority, "high");
            assert_eq!(success_criteria.as_deref(), Some("All fixtures parse"));
            assert_eq!(time_budget.as_deref(), Some("≤60m"));
            assert!(objective.is_none());
        }
        _ => panic!("Wrong command"),
    }
}

#[test]
fn test_parse_todo_default_priority() {
    let cli = Cli::try_parse_from(vec!["stageward", "todo", "Small fix"]).unwrap();

    match cli.command {
        Commands::Todo { priority, .. } => assert_eq!(priority, "medium"),
        _ => panic!("Wrong command"),
    }
}

#[test]
fn test_parse_evidence() {
    let cli = Cli::try_parse_from(vec![
        "stageward",
        "evidence",
        "Tests pass on CI",
        "--location",
        "logs/ci.txt",
        "--stage",
        "TEST",
    ])
    .unwrap();

    match cli.command {
        Commands::Evidence { claim, location, stage, id } => {
            assert_eq!(claim, "Tests pass on CI");
            assert_eq!(location.as_deref(), Some("logs/ci.txt"));
            assert_eq!(stage.as_deref(), Some("TEST"));
            assert!(id.is_none());
        }
        _ => panic!("Wrong command"),
    }
}

#[test]
fn test_parse_submit_inline_and_stdin() {
    let cli = Cli::try_parse_from(vec!["stageward", "submit", r#"{"evidence":{}}"#]).unwrap();
    match cli.command {
        Commands::Submit { record, .. } => assert_eq!(record.as_deref(), Some(r#"{"evidence":{}}"#)),
        _ => panic!("Wrong command"),
    }

    // Omitting the record means it is read from stdin at execution time.
    let cli = Cli::try_parse_from(vec!["stageward", "submit"]).unwrap();
    match cli.command {
        Commands::Submit { record, .. } => assert!(record.is_none()),
        _ => panic!("Wrong command"),
    }
}

#[test]
fn test_parse_watch_interval() {
    let cli = Cli::try_parse_from(vec!["stageward", "watch", "--interval", "30"]).unwrap();

    match cli.command {
        Commands::Watch { interval, id } => {
            assert_eq!(interval, Some(30));
            assert!(id.is_none());
        }
        _ => panic!("Wrong command"),
    }
}

#[test]
fn test_global_flags_apply_anywhere() {
    let cli = Cli::try_parse_from(vec![
        "stageward",
        "status",
        "--json",
        "--config",
        "/tmp/alt-config.yaml",
        "--state-root",
        "/tmp/alt-state",
    ])
    .unwrap();

    assert!(cli.json);
    assert_eq!(cli.config.unwrap().to_str(), Some("/tmp/alt-config.yaml"));
    assert_eq!(cli.state_root.unwrap().to_str(), Some("/tmp/alt-state"));
    assert!(matches!(cli.command, Commands::Status { id: None }));
}

#[test]
fn test_missing_required_args_are_rejected() {
    assert!(Cli::try_parse_from(vec!["stageward", "init"]).is_err());
    assert!(Cli::try_parse_from(vec!["stageward", "transition"]).is_err());
    assert!(Cli::try_parse_from(vec!["stageward", "watch", "--interval", "soon"]).is_err());
    assert!(Cli::try_parse_from(vec!["stageward", "frobnicate"]).is_err());
}
