mod common;
use common::{RecordingScene, TestBot};
use slbot::parser::validators::{numeric, parses};
use slbot::{
    Callback, Command, CommandInfo, DispatchConfig, Dispatcher, HandlerError, MemberRegistry,
    Parser, ParserOutput, Scene, TextMessage, UseOutcome,
};
use std::sync::Arc;

#[tokio::test]
async fn test_unregistered_alias_is_no_match() -> anyhow::Result<()> {
    let mut bot = TestBot::new();
    bot.dispatcher
        .register(bot.command("ping").parser(Parser::raw("ping")))?;
    bot.dispatcher.register(
        bot.command("echo")
            .parser(Parser::pattern(r"^!echo", |o| o)?.whitespace()),
    )?;

    for text in ["hello", "pin", "echo !echo", "", "   "] {
        assert!(bot.send("user", text).await?.is_none(), "{:?} matched", text);
    }
    assert!(
        bot.dispatcher
            .check(&TextMessage::empty("user"))
            .await?
            .is_none()
    );
    assert!(bot.entries().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_literal_and_pattern_dispatch() -> anyhow::Result<()> {
    let mut bot = TestBot::new();
    bot.dispatcher
        .register(bot.command("ping").parser(Parser::raw("ping")))?;
    bot.dispatcher.register(
        bot.command("echo")
            .parser(Parser::pattern(r"^!echo", |o| o)?.whitespace()),
    )?;

    let resolved = bot.send("user", "ping").await?.expect("ping resolves");
    assert_eq!(resolved.command.id(), "ping");
    assert_eq!(resolved.response, UseOutcome::Handled);

    let resolved = bot
        .send("user", "!echo  hello   world")
        .await?
        .expect("echo resolves");
    assert_eq!(resolved.command.id(), "echo");

    assert_eq!(bot.entries(), vec!["ping", "echo hello world"]);
    Ok(())
}

#[tokio::test]
async fn test_invalid_argument_fails() -> anyhow::Result<()> {
    let mut bot = TestBot::new();
    bot.dispatcher.register(
        bot.command("setlevel")
            .parser(Parser::raw("setlevel").whitespace().argument(numeric)),
    )?;

    let failed = bot.send("user", "setlevel abc").await?.expect("resolves");
    assert_eq!(failed.response, UseOutcome::Failed);
    assert_eq!(
        bot.dispatcher.reply_for(&failed).as_deref(),
        Some("💬 Command help:\nsetlevel\nThe setlevel command")
    );

    let handled = bot.send("user", "setlevel 5").await?.expect("resolves");
    assert_eq!(handled.response, UseOutcome::Handled);
    assert_eq!(bot.entries(), vec!["setlevel 5"]);
    Ok(())
}

#[tokio::test]
async fn test_failed_command_stops_iteration() -> anyhow::Result<()> {
    let mut bot = TestBot::new();
    bot.dispatcher.register(
        bot.command("strict")
            .parser(Parser::raw("set").whitespace().argument(numeric)),
    )?;
    bot.dispatcher
        .register(bot.command("loose").parser(Parser::raw("set")))?;

    let resolved = bot.send("user", "set x").await?.expect("resolves");
    assert_eq!(resolved.command.id(), "strict");
    assert_eq!(resolved.response, UseOutcome::Failed);
    assert!(bot.entries().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_permission_denied_even_when_well_formed() -> anyhow::Result<()> {
    let mut bot = TestBot::new();
    bot.dispatcher.register(
        bot.command("setlevel")
            .parser(Parser::raw("setlevel").whitespace().argument(numeric))
            .permission("admin"),
    )?;

    let denied = bot.send("user", "setlevel 5").await?.expect("resolves");
    assert_eq!(denied.response, UseOutcome::Denied);
    assert!(
        bot.dispatcher
            .reply_for(&denied)
            .is_some_and(|r| r.contains("permission"))
    );

    let stranger = bot.send("stranger", "setlevel 5").await?.expect("resolves");
    assert_eq!(stranger.response, UseOutcome::Denied);

    let handled = bot.send("admin", "setlevel 5").await?.expect("resolves");
    assert_eq!(handled.response, UseOutcome::Handled);
    assert!(bot.dispatcher.reply_for(&handled).is_none());
    assert_eq!(bot.entries(), vec!["setlevel 5"]);
    Ok(())
}

#[tokio::test]
async fn test_permission_changes_apply_to_next_message() -> anyhow::Result<()> {
    let mut bot = TestBot::new();
    bot.dispatcher.register(
        bot.command("kick")
            .parser(Parser::raw("kick").whitespace())
            .permission("mod"),
    )?;

    let before = bot.send("user", "kick bob").await?.expect("resolves");
    assert_eq!(before.response, UseOutcome::Denied);

    assert!(bot.members.grant("user", "mod"));
    let after = bot.send("user", "kick bob").await?.expect("resolves");
    assert_eq!(after.response, UseOutcome::Handled);
    Ok(())
}

#[tokio::test]
async fn test_registration_order_wins() -> anyhow::Result<()> {
    let mut bot = TestBot::new();
    bot.dispatcher
        .register(bot.command("a").parser(Parser::raw("go")))?;
    bot.dispatcher
        .register(bot.command("b").parser(Parser::raw("go")))?;

    for _ in 0..5 {
        let resolved = bot.send("user", "go").await?.expect("resolves");
        assert_eq!(resolved.command.id(), "a");
    }
    assert_eq!(bot.entries(), vec!["a"; 5]);
    assert_eq!(bot.dispatcher.get_command_stats(), vec![("a", 5)]);
    Ok(())
}

#[tokio::test]
async fn test_denied_command_shadows_later_commands() -> anyhow::Result<()> {
    let mut bot = TestBot::new();
    bot.dispatcher.register(
        bot.command("admin-go")
            .parser(Parser::raw("go"))
            .permission("admin"),
    )?;
    bot.dispatcher
        .register(bot.command("go").parser(Parser::raw("go")))?;

    let resolved = bot.send("user", "go").await?.expect("resolves");
    assert_eq!(resolved.command.id(), "admin-go");
    assert_eq!(resolved.response, UseOutcome::Denied);
    assert!(bot.entries().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_commands_with_different_inputs_share_registry() -> anyhow::Result<()> {
    let mut bot = TestBot::new();
    let scene = Arc::new(RecordingScene::<u32>::new());
    let target: Arc<dyn Scene<u32>> = scene.clone();
    bot.dispatcher.register(
        Command::new(
            "roll",
            CommandInfo::new("roll <sides>", "Roll a die"),
            Callback::Scene(target),
        )
        .parser(
            Parser::literal("roll", |o: ParserOutput| {
                o.arguments[0].parse::<u32>().unwrap_or_default()
            })
            .whitespace()
            .argument(parses::<u32>()),
        ),
    )?;
    bot.dispatcher
        .register(bot.command("ping").parser(Parser::raw("ping")))?;

    bot.send("user", "roll 20").await?;
    bot.send("admin", "ping").await?;

    assert_eq!(*scene.entries.lock(), vec![("user".to_string(), 20)]);
    assert_eq!(bot.entries(), vec!["ping"]);
    Ok(())
}

#[tokio::test]
async fn test_out_of_range_level_fails() -> anyhow::Result<()> {
    let mut bot = TestBot::new();
    let levels = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let seen = levels.clone();
    bot.dispatcher.register(
        Command::new(
            "setlevel",
            CommandInfo::new("setlevel <n>", "Set the level"),
            Callback::handler(move |_, n: u32| {
                seen.lock().push(n);
                Ok(())
            }),
        )
        .parser(
            Parser::literal("setlevel", |o: ParserOutput| {
                o.arguments[0].parse::<u32>().unwrap_or_default()
            })
            .whitespace()
            .argument(parses::<u32>()),
        )
        .permission("admin"),
    )?;

    let overflow = bot.send("admin", "setlevel 99999999999").await?.expect("resolves");
    assert_eq!(overflow.response, UseOutcome::Failed);

    let handled = bot.send("admin", "setlevel 4294967295").await?.expect("resolves");
    assert_eq!(handled.response, UseOutcome::Handled);
    assert_eq!(*levels.lock(), vec![u32::MAX]);
    Ok(())
}

#[tokio::test]
async fn test_handler_error_surfaces_to_caller() -> anyhow::Result<()> {
    let mut dispatcher = Dispatcher::new(Arc::new(MemberRegistry::new()));
    dispatcher.register(
        Command::new(
            "boom",
            CommandInfo::new("boom", "Fails"),
            Callback::handler(|_, _: ParserOutput| Err(HandlerError::Handler("boom".into()))),
        )
        .parser(Parser::raw("boom")),
    )?;

    let err = dispatcher
        .check(&TextMessage::new("x", "boom"))
        .await
        .unwrap_err();
    assert_eq!(err.command, "boom");
    assert!(matches!(err.source, HandlerError::Handler(_)));
    assert_eq!(dispatcher.get_command_stats(), vec![("boom", 1)]);
    Ok(())
}

#[tokio::test]
async fn test_configured_denied_reply() -> anyhow::Result<()> {
    let config = DispatchConfig {
        denied_reply: "nope".to_string(),
        ..DispatchConfig::default()
    };
    let mut dispatcher = Dispatcher::with_config(config, Arc::new(MemberRegistry::new()));
    dispatcher.register(
        Command::new(
            "op",
            CommandInfo::new("op", "Operators only"),
            Callback::handler(|_, _: ParserOutput| Ok(())),
        )
        .parser(Parser::raw("op"))
        .permission("op"),
    )?;

    let resolved = dispatcher
        .check(&TextMessage::new("x", "op"))
        .await?
        .expect("resolves");
    assert_eq!(dispatcher.reply_for(&resolved).as_deref(), Some("nope"));
    Ok(())
}

#[tokio::test]
async fn test_concurrent_dispatch_is_consistent() -> anyhow::Result<()> {
    let mut bot = TestBot::new();
    bot.dispatcher
        .register(bot.command("ping").parser(Parser::raw("ping")))?;
    let bot = Arc::new(bot);

    let mut tasks = Vec::new();
    for i in 0..16 {
        let bot = bot.clone();
        tasks.push(tokio::spawn(async move {
            let sender = format!("sender{}", i);
            bot.send(&sender, "ping").await
        }));
    }
    for task in tasks {
        let resolved = task.await??.expect("resolves");
        assert_eq!(resolved.response, UseOutcome::Handled);
    }

    assert_eq!(bot.entries().len(), 16);
    assert_eq!(bot.dispatcher.get_command_stats(), vec![("ping", 16)]);
    Ok(())
}
