//! Headless host binary: a line-oriented REPL over one project.
//!
//! Wires the configured backend, the in-memory canvas, and the save tasks
//! together, selects the active project (creating one if none exist), and
//! sends each stdin line as a chat turn, printing the conversation as it
//! settles.
//!
//! Configuration is read from `MURAL_CONFIG` (a TOML path) when set;
//! defaults target a local backend.

use std::sync::Arc;

use mural::canvas::{CanvasDocument, CanvasHost, HttpImageFetcher, MemoryCanvas};
use mural::chat::message::Role;
use mural::chat::{ChatBackend, ChatSession};
use mural::persist::{MessageSaver, MessageSink, SaveCoalescer, SnapshotSink};
use mural::project::{migrate_document, Project, ProjectRegistry};
use mural::storage::{FsKvStore, HttpProjectStore, ImageUploader, KvStore, ProjectStore};
use mural::{MuralConfig, MuralError};

/// Persists canvas snapshots and message lists back into the project
/// document.
struct ProjectSink {
    store: Arc<dyn ProjectStore>,
    canvas: Arc<MemoryCanvas>,
    session: tokio::sync::OnceCell<Arc<ChatSession>>,
    project: Project,
}

impl ProjectSink {
    fn document(&self) -> Project {
        let mut project = self.project.clone();
        project.data = serde_json::to_value(self.canvas.snapshot()).ok();
        if let Some(session) = self.session.get() {
            project.messages = session.messages();
        }
        project
    }
}

#[async_trait::async_trait]
impl SnapshotSink for ProjectSink {
    async fn persist(&self, snapshot: CanvasDocument) -> mural::Result<()> {
        let mut project = self.document();
        project.data = Some(serde_json::to_value(snapshot)
            .map_err(|e| MuralError::StorageError(format!("encode canvas: {e}")))?);
        self.store.upsert(&project).await
    }
}

#[async_trait::async_trait]
impl MessageSink for ProjectSink {
    async fn persist(&self, messages: Vec<mural::Message>) -> mural::Result<()> {
        let mut project = self.document();
        project.messages = messages;
        self.store.upsert(&project).await
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::var("MURAL_CONFIG") {
        Ok(path) => MuralConfig::load(path)?,
        Err(_) => MuralConfig::default(),
    };
    tracing::info!(backend = %config.backend.base_url, "mural-host starting");

    let store: Arc<dyn ProjectStore> = Arc::new(HttpProjectStore::new(&config));
    let kv: Arc<dyn KvStore> = Arc::new(FsKvStore::default_location()?);

    let mut registry = ProjectRegistry::load(store.clone(), kv.clone()).await?;
    let url_param = std::env::args().nth(1);
    let project = registry.select_current(None, url_param.as_deref()).await?;
    let theme = mural::theme::load_theme(kv.as_ref()).await?;
    println!("project: {} ({}) [{theme}]", project.name, project.id);

    let canvas = Arc::new(MemoryCanvas::with_document(migrate_document(&project)));
    canvas.set_view_state({
        let mut state = serde_json::Map::new();
        state.insert("theme".into(), serde_json::Value::String(theme.to_string()));
        state
    });

    let sink = Arc::new(ProjectSink {
        store: store.clone(),
        canvas: canvas.clone(),
        session: tokio::sync::OnceCell::new(),
        project: project.clone(),
    });
    let coalescer = Arc::new(SaveCoalescer::spawn(
        canvas.clone(),
        sink.clone(),
        config.save.clone(),
    ));
    let saver = MessageSaver::spawn(sink.clone(), config.save.message_debounce());

    let session = Arc::new(
        ChatSession::new(
            project.id.clone(),
            ChatBackend::new(&config),
            canvas.clone(),
            Arc::new(HttpImageFetcher::new()),
            config.layout.clone(),
        )
        .with_saver(saver)
        .with_coalescer(coalescer.clone()),
    );
    session.set_messages(project.messages.clone());
    let _ = sink.session.set(session.clone());

    // A project created through the landing flow may carry a staged first
    // prompt; send it before reading input.
    if session.send_pending_prompt(kv.as_ref()).await? {
        print_tail(&session);
    }

    let uploader = ImageUploader::new(&config);
    let mut attachments: Vec<String> = Vec::new();

    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "/quit" {
            break;
        }
        if let Some(path) = text.strip_prefix("/attach ") {
            match attach(&uploader, path.trim()).await {
                Ok(url) => {
                    println!("attached: {url}");
                    attachments.push(url);
                }
                Err(e) => eprintln!("{e}"),
            }
            continue;
        }
        match session.send_message(text, std::mem::take(&mut attachments)).await {
            Ok(()) => print_tail(&session),
            Err(e) => eprintln!("{e}"),
        }
    }

    // Unload flush, then stop the save tasks.
    coalescer.page_hidden();
    coalescer.shutdown().await;
    tracing::info!("mural-host shut down cleanly");
    Ok(())
}

/// Upload a local image file, returning its stored URL.
async fn attach(uploader: &ImageUploader, path: &str) -> anyhow::Result<String> {
    let bytes = std::fs::read(path)?;
    let file_name = std::path::Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image")
        .to_string();
    let mime = mural::canvas::insert::mime_for_url(path);
    let uploaded = uploader.upload(bytes, file_name, mime).await?;
    Ok(uploaded.url)
}

/// Print the assistant's side of the latest turn.
fn print_tail(session: &ChatSession) {
    let messages = session.messages();
    let turn_start = messages
        .iter()
        .rposition(|m| m.role == Role::User)
        .map(|i| i + 1)
        .unwrap_or(0);
    for message in &messages[turn_start..] {
        if !message.content.is_empty() {
            println!("assistant: {}", message.content);
        }
        for call in message.tool_calls.iter().flatten() {
            match &call.image_url {
                Some(url) => println!("  [{}] {url}", call.name),
                None => println!("  [{}] {:?}", call.name, call.status),
            }
        }
    }
}
