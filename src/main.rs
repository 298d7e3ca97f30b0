//! slbot console runtime.
//!
//! Reads `sender: text` lines from stdin, dispatches each one and prints the
//! bot's replies. Lines without a sender prefix come from `console`.

use async_trait::async_trait;
use dashmap::DashMap;
use slbot::config::{self, Config};
use slbot::parser::validators::parses;
use slbot::{
    Callback, Command, CommandInfo, Dispatcher, HandlerError, HandlerResult, MemberRegistry,
    Parser, ParserOutput, Scene, ScenePayload, TextMessage,
};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "slbot.toml";
const CONSOLE_SENDER: &str = "console";

type Replies = mpsc::UnboundedSender<String>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config()?;

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "configuration has {} error(s), see messages above",
            errors.len()
        ));
    }

    slbot::metrics::init();

    let members = Arc::new(MemberRegistry::from_config(&config.member)?);
    info!(members = members.len(), "Loaded members");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut dispatcher = Dispatcher::with_config(config.dispatch.clone(), members);
    register_commands(&mut dispatcher, &tx)?;
    info!(commands = dispatcher.len(), "Starting slbot");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let message = match line.split_once(':') {
            Some((sender, text)) if !sender.trim().is_empty() => {
                TextMessage::new(sender.trim(), text.trim())
            }
            _ => TextMessage::new(CONSOLE_SENDER, line.trim()),
        };

        match dispatcher.check(&message).await {
            Ok(Some(resolved)) => {
                if let Some(reply) = dispatcher.reply_for(&resolved) {
                    println!("{}", reply);
                }
            }
            Ok(None) => {}
            Err(e) => error!(
                sender = %message.sender_id,
                command = %e.command,
                error = %e.source,
                "Dispatch failed"
            ),
        }

        while let Ok(reply) = rx.try_recv() {
            println!("{}", reply);
        }
    }

    for (command, count) in dispatcher.get_command_stats() {
        info!(command = %command, count, "Command usage");
    }

    Ok(())
}

/// Load the config named on the command line, or `slbot.toml` if present.
fn load_config() -> anyhow::Result<Config> {
    let path = match std::env::args().nth(1) {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG).exists() => DEFAULT_CONFIG.to_string(),
        None => {
            warn!("No config file given, using defaults");
            return Ok(Config::default());
        }
    };

    let config = Config::load(&path).map_err(|e| {
        error!(path = %path, error = %e, "Failed to load config");
        e
    })?;
    Ok(config)
}

fn register_commands(dispatcher: &mut Dispatcher, replies: &Replies) -> anyhow::Result<()> {
    let tx = replies.clone();
    dispatcher.register(
        Command::new(
            "ping",
            CommandInfo::new("ping", "Check that the bot is alive."),
            Callback::handler(move |_, _: ParserOutput| reply(&tx, "pong")),
        )
        .parser(Parser::raw("ping")),
    )?;

    let tx = replies.clone();
    dispatcher.register(
        Command::new(
            "echo",
            CommandInfo::new("!echo <words...>", "Repeat the given words."),
            Callback::handler(move |_, words: String| reply(&tx, &words)),
        )
        .parser(
            Parser::pattern(r"^!echo", |out: ParserOutput| out.arguments.join(" "))?
                .whitespace()
                .argument(|_, _| true),
        ),
    )?;

    let level = Arc::new(AtomicU32::new(0));
    let tx = replies.clone();
    dispatcher.register(
        Command::new(
            "setlevel",
            CommandInfo::new("setlevel <n>", "Set the bot verbosity level (admin only)."),
            Callback::handler(move |_, n: u32| {
                level.store(n, Ordering::Relaxed);
                reply(&tx, &format!("Level set to {}", n))
            }),
        )
        .parser(
            // `parses::<u32>` has already accepted the token.
            Parser::literal("setlevel", |out: ParserOutput| {
                out.arguments[0].parse().unwrap_or_default()
            })
            .whitespace()
            .argument(parses::<u32>()),
        )
        .permission("admin"),
    )?;

    let survey: Arc<dyn Scene<SurveyInput>> = Arc::new(SurveyScene::new(replies.clone()));
    dispatcher.register(
        Command::new(
            "survey",
            CommandInfo::new("survey, then > <answer>", "Answer a short survey."),
            Callback::Scene(survey),
        )
        .parser(Parser::literal("survey", |_| SurveyInput::Start))
        .parser(Parser::pattern(r"^>", |out: ParserOutput| {
            SurveyInput::Answer(out.arguments.join(" "))
        })?),
    )?;

    let help = Arc::new(dispatcher.help());
    let tx = replies.clone();
    dispatcher.register(
        Command::new(
            "help",
            CommandInfo::new("help", "List available commands."),
            Callback::handler(move |_, _: ParserOutput| {
                for text in help.iter() {
                    reply(&tx, text)?;
                }
                Ok(())
            }),
        )
        .parser(Parser::raw("help")),
    )?;

    Ok(())
}

fn reply(tx: &Replies, text: &str) -> HandlerResult {
    tx.send(text.to_string())
        .map_err(|e| HandlerError::Handler(format!("reply channel closed: {}", e)))
}

/// Input of the survey scene.
enum SurveyInput {
    Start,
    Answer(String),
}

const SURVEY_QUESTIONS: &[&str] = &[
    "What is your name?",
    "What is your favourite colour?",
    "How did you find this bot?",
];

/// Three-question survey, one frame per sender.
struct SurveyScene {
    frames: DashMap<String, usize>,
    replies: Replies,
}

impl SurveyScene {
    fn new(replies: Replies) -> Self {
        Self {
            frames: DashMap::new(),
            replies,
        }
    }
}

#[async_trait]
impl Scene<SurveyInput> for SurveyScene {
    fn name(&self) -> &str {
        "survey"
    }

    async fn enter_current_frame(&self, payload: ScenePayload<'_, SurveyInput>) -> HandlerResult {
        let sender = payload.message.sender_id().to_string();
        match payload.input {
            SurveyInput::Start => {
                self.frames.insert(sender, 0);
                reply(&self.replies, SURVEY_QUESTIONS[0])
            }
            SurveyInput::Answer(answer) => {
                let Some(frame) = self.frames.get(&sender).map(|f| *f) else {
                    return reply(&self.replies, "Start the survey with `survey` first.");
                };
                info!(sender = %sender, frame, answer = %answer, "Survey answer");
                let next = frame + 1;
                match SURVEY_QUESTIONS.get(next) {
                    Some(question) => {
                        self.frames.insert(sender, next);
                        reply(&self.replies, question)
                    }
                    None => {
                        self.frames.remove(&sender);
                        reply(&self.replies, "Thanks, survey complete!")
                    }
                }
            }
        }
    }
}
