//! Startup helpers for the learning assistant hosts.
//!
//! Two hosts share the same chat core: the HTTP panel host
//! (`learning-assistant-server`) and the interactive terminal chat
//! (`learning-assistant`).

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::chat::{
    ChatConfig, ConversationEntry, HttpChatBackend, Mode, ResultBundle, SubmissionController,
    SubmitOutcome, User,
};
use crate::server::{self, AppState, PanelHost};

/// Port variable read by the panel host.
pub const PORT_ENV: &str = "LEARNING_ASSISTANT_PORT";
/// User id variable read by the terminal chat.
pub const USER_ID_ENV: &str = "LEARNING_ASSISTANT_USER_ID";
/// User name variable read by the terminal chat.
pub const USER_NAME_ENV: &str = "LEARNING_ASSISTANT_USER_NAME";
/// User role variable read by the terminal chat.
pub const USER_ROLE_ENV: &str = "LEARNING_ASSISTANT_USER_ROLE";

fn init_tracing() {
    // A second init (tests, embedding) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to create runtime")
}

/// Run the panel host (used by the `learning-assistant-server` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run_server() -> ExitCode {
    init_tracing();
    tracing::info!("Starting learning assistant v{}", env!("CARGO_PKG_VERSION"));

    match runtime().and_then(|rt| rt.block_on(serve())) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Server error: {e:#}");
            ExitCode::from(1)
        }
    }
}

async fn serve() -> anyhow::Result<()> {
    let config = ChatConfig::from_env().context("Invalid configuration")?;
    tracing::info!("Backend endpoint: {}", config.backend_url);

    let state = AppState::new(config).context("Failed to create state")?;
    let addr = server::listen_addr(get_port());

    let host = PanelHost::bind(state, addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    host.serve(shutdown_signal()).await.context("Server stopped")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Get configured server port.
#[must_use]
pub fn get_port() -> u16 {
    std::env::var(PORT_ENV)
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(server::DEFAULT_PORT)
}

/// User the terminal chat asks as, from the environment.
#[must_use]
pub fn terminal_user() -> User {
    let var = |key: &str| std::env::var(key).unwrap_or_default();
    User::new(var(USER_ID_ENV), var(USER_NAME_ENV), var(USER_ROLE_ENV))
}

/// Run the interactive terminal chat (used by the `learning-assistant` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` when the user quits or input ends, `1` on failure.
#[must_use]
pub fn run_terminal() -> ExitCode {
    init_tracing();

    match runtime().and_then(|rt| rt.block_on(terminal())) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Terminal chat error: {e:#}");
            ExitCode::from(1)
        }
    }
}

async fn terminal() -> anyhow::Result<()> {
    let config = ChatConfig::from_env().context("Invalid configuration")?;
    let backend = HttpChatBackend::new(&config).context("Failed to create backend client")?;
    let controller = SubmissionController::new(Arc::new(backend));
    let user = terminal_user();

    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();
    chat_loop(&controller, &user, config.default_mode, input, &mut out)
        .await
        .context("Terminal I/O failed")
}

/// One line of terminal input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TerminalCommand {
    /// `/quit`: leave the chat.
    Quit,
    /// `/clear`: reset the conversation.
    Clear,
    /// `/mode internal|external`: switch mode for later questions.
    SetMode(Mode),
    /// Unrecognised slash command.
    Unknown(String),
    /// Anything else is a question.
    Ask(String),
}

impl TerminalCommand {
    /// Classify one input line.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(command) = trimmed.strip_prefix('/') else {
            return Self::Ask(line.to_string());
        };
        let (name, arg) = command
            .split_once(char::is_whitespace)
            .map_or((command, ""), |(name, arg)| (name, arg.trim()));
        match name {
            "quit" | "exit" => Self::Quit,
            "clear" => Self::Clear,
            "mode" => arg
                .parse()
                .map_or_else(|_| Self::Unknown(trimmed.to_string()), Self::SetMode),
            _ => Self::Unknown(trimmed.to_string()),
        }
    }
}

/// Drive a controller from line-based input until `/quit` or end of input.
///
/// # Errors
/// Returns an error if reading input or writing output fails.
pub async fn chat_loop<R, W>(
    controller: &SubmissionController,
    user: &User,
    initial_mode: Mode,
    input: R,
    out: &mut W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    let mut mode = initial_mode;
    let mut lines = input.lines();

    writeln!(
        out,
        "Hello {}! Mode: {mode}. Commands: /mode internal|external, /clear, /quit",
        user.name_or_default()
    )?;
    out.flush()?;

    while let Some(line) = lines.next_line().await? {
        match TerminalCommand::parse(&line) {
            TerminalCommand::Quit => break,
            TerminalCommand::Clear => {
                controller.reset().await;
                writeln!(out, "Conversation cleared.")?;
            }
            TerminalCommand::SetMode(next) => {
                mode = next;
                writeln!(out, "Mode: {mode}")?;
            }
            TerminalCommand::Unknown(command) => {
                writeln!(out, "Unknown command: {command}")?;
            }
            TerminalCommand::Ask(question) => {
                match controller.submit_text(user, mode, question).await {
                    SubmitOutcome::Answered { entry } | SubmitOutcome::Failed { entry } => {
                        writeln!(out, "{}", render_entry(&entry))?;
                    }
                    SubmitOutcome::Ignored { .. } => {}
                }
            }
        }
        out.flush()?;
    }

    Ok(())
}

/// Plain-text rendering of an assistant entry and its result panels.
#[must_use]
pub fn render_entry(entry: &ConversationEntry) -> String {
    let mut sections = vec![entry.content.clone()];
    if let Some(bundle) = &entry.result_bundle {
        sections.extend(render_bundle(bundle));
    }
    sections.join("\n\n")
}

fn render_bundle(bundle: &ResultBundle) -> Vec<String> {
    let mut sections = Vec::new();

    if let Some(web) = &bundle.web {
        let lines = web.iter().map(|r| {
            let line = format!("  - {} [{}] {}", r.title, r.source, r.url);
            if r.snippet.is_empty() {
                line
            } else {
                format!("{line}\n    {}", r.snippet)
            }
        });
        sections.push(section("Web results:", lines));
    }
    if let Some(videos) = &bundle.video {
        let lines = videos.iter().map(|v| {
            format!(
                "  - {} ({}, {}, {} views) {}",
                v.title, v.channel, v.duration, v.views, v.url
            )
        });
        sections.push(section("Videos:", lines));
    }
    if let Some(repos) = &bundle.repo {
        let lines = repos.iter().map(|r| {
            format!(
                "  - {} by {} ({}, {} stars, {} forks) {}",
                r.title, r.author, r.language, r.stars, r.forks, r.url
            )
        });
        sections.push(section("Repositories:", lines));
    }

    sections
}

fn section(heading: &str, lines: impl Iterator<Item = String>) -> String {
    std::iter::once(heading.to_string())
        .chain(lines)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::types::{EntryId, EntryKind, FAILURE_REPLY, RepoResult, WebResult};
    use crate::chat::{ChatBackend, ChatRequest, ChatResult, ChatError};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Mutex;

    #[derive(Default)]
    struct EchoBackend {
        modes: Mutex<Vec<Mode>>,
    }

    #[async_trait]
    impl ChatBackend for EchoBackend {
        async fn send(&self, request: &ChatRequest) -> ChatResult<Value> {
            if let Ok(mut modes) = self.modes.lock() {
                modes.push(request.mode);
            }
            if request.query == "fail" {
                return Err(ChatError::HttpStatus(500));
            }
            Ok(json!({"response": {"answer": format!("you said {}", request.query)}}))
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(TerminalCommand::parse("/quit"), TerminalCommand::Quit);
        assert_eq!(TerminalCommand::parse("  /clear "), TerminalCommand::Clear);
        assert_eq!(
            TerminalCommand::parse("/mode External"),
            TerminalCommand::SetMode(Mode::External)
        );
        assert_eq!(
            TerminalCommand::parse("/mode sideways"),
            TerminalCommand::Unknown("/mode sideways".to_string())
        );
        assert_eq!(
            TerminalCommand::parse("what is a trait?"),
            TerminalCommand::Ask("what is a trait?".to_string())
        );
    }

    #[tokio::test]
    async fn test_chat_loop_session() {
        let backend = Arc::new(EchoBackend::default());
        let controller = SubmissionController::new(backend.clone());
        let user = User::new("1", "Ada", "learner");
        let input: &[u8] = b"hello\n\n/mode external\nfail\n/quit\nignored\n";
        let mut out = Vec::new();

        let result = chat_loop(&controller, &user, Mode::Internal, input, &mut out).await;
        assert!(result.is_ok());

        let printed = String::from_utf8_lossy(&out);
        assert!(printed.starts_with("Hello Ada! Mode: internal."));
        assert!(printed.contains("you said hello"));
        assert!(printed.contains("Mode: external"));
        assert!(printed.contains(FAILURE_REPLY));
        assert!(!printed.contains("ignored"));

        let modes = backend.modes.lock().map(|m| m.clone()).unwrap_or_default();
        assert_eq!(modes, vec![Mode::Internal, Mode::External]);
        assert_eq!(controller.snapshot().await.entries.len(), 4);
    }

    #[tokio::test]
    async fn test_chat_loop_clear() {
        let controller = SubmissionController::new(Arc::new(EchoBackend::default()));
        let input: &[u8] = b"hello\n/clear\n";
        let mut out = Vec::new();
        let result = chat_loop(&controller, &User::default(), Mode::Internal, input, &mut out).await;
        assert!(result.is_ok());
        assert!(String::from_utf8_lossy(&out).starts_with("Hello User!"));
        assert!(controller.snapshot().await.entries.is_empty());
    }

    #[test]
    fn test_render_entry_with_web_panel() {
        let bundle = ResultBundle::from_parts(
            vec![WebResult {
                title: "A".to_string(),
                url: "u".to_string(),
                snippet: String::new(),
                source: "Web".to_string(),
            }],
            Vec::new(),
            Vec::new(),
        );
        let entry = ConversationEntry::assistant(
            EntryId::compose(1, EntryKind::Assistant),
            "Hi",
            bundle,
        );
        assert_eq!(render_entry(&entry), "Hi\n\nWeb results:\n  - A [Web] u");
    }

    #[test]
    fn test_render_entry_with_snippet_and_repo_sections() {
        let bundle = ResultBundle::from_parts(
            vec![WebResult {
                title: "Ownership".to_string(),
                url: "https://doc.rust-lang.org".to_string(),
                snippet: "Each value has an owner.".to_string(),
                source: "Rust Book".to_string(),
            }],
            Vec::new(),
            vec![RepoResult {
                title: "ripgrep".to_string(),
                url: "https://github.com/BurntSushi/ripgrep".to_string(),
                description: String::new(),
                language: "Rust".to_string(),
                stars: 40,
                forks: 2,
                updated_at: String::new(),
                author: "BurntSushi".to_string(),
            }],
        );
        let entry = ConversationEntry::assistant(
            EntryId::compose(2, EntryKind::Assistant),
            "Sources:",
            bundle,
        );
        assert_eq!(
            render_entry(&entry),
            "Sources:\n\n\
             Web results:\n  - Ownership [Rust Book] https://doc.rust-lang.org\n    Each value has an owner.\n\n\
             Repositories:\n  - ripgrep by BurntSushi (Rust, 40 stars, 2 forks) https://github.com/BurntSushi/ripgrep"
        );
    }
}
