use async_trait::async_trait;
use parking_lot::Mutex;
use slbot::{
    Callback, CheckResponse, Command, CommandInfo, Dispatcher, HandlerResult, Member,
    MemberRegistry, ParserOutput, Scene, ScenePayload, TextMessage,
};
use std::sync::Arc;

/// Execution log shared between test handlers.
pub type Log = Arc<Mutex<Vec<String>>>;

/// A dispatcher wired to an in-memory member registry.
pub struct TestBot {
    pub dispatcher: Dispatcher,
    pub members: Arc<MemberRegistry>,
    pub log: Log,
}

#[allow(dead_code)]
impl TestBot {
    /// Bot with an `admin` member holding `admin` and a plain `user` member.
    pub fn new() -> Self {
        let members = Arc::new(MemberRegistry::new());
        members
            .insert(Member::new("admin").with_permission("admin"))
            .expect("fresh registry");
        members.insert(Member::new("user")).expect("fresh registry");

        Self {
            dispatcher: Dispatcher::new(members.clone()),
            members,
            log: Log::default(),
        }
    }

    /// Handler that records `"<tag> <arguments...>"`.
    pub fn recorder(&self, tag: &'static str) -> Callback<ParserOutput> {
        let log = self.log.clone();
        Callback::handler(move |_, out: ParserOutput| {
            let mut entry = tag.to_string();
            for arg in &out.arguments {
                entry.push(' ');
                entry.push_str(arg);
            }
            log.lock().push(entry);
            Ok(())
        })
    }

    /// Bare command with a recording handler and no parsers.
    pub fn command(&self, id: &'static str) -> Command<ParserOutput> {
        Command::new(
            id,
            CommandInfo::new(id, format!("The {} command", id)),
            self.recorder(id),
        )
    }

    pub async fn send(&self, sender: &str, text: &str) -> anyhow::Result<Option<CheckResponse>> {
        Ok(self.dispatcher.check(&TextMessage::new(sender, text)).await?)
    }

    pub fn entries(&self) -> Vec<String> {
        self.log.lock().clone()
    }
}

/// Scene that records the sender and input of every entry.
pub struct RecordingScene<T> {
    pub entries: Mutex<Vec<(String, T)>>,
}

#[allow(dead_code)]
impl<T> RecordingScene<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Scene<T> for RecordingScene<T> {
    fn name(&self) -> &str {
        "recording"
    }

    async fn enter_current_frame(&self, payload: ScenePayload<'_, T>) -> HandlerResult {
        self.entries
            .lock()
            .push((payload.message.sender_id().to_string(), payload.input));
        Ok(())
    }
}
