//! Panel host binary serving the chat API over HTTP.
//! Run with: cargo run --bin learning-assistant-server

use std::process::ExitCode;

use learning_assistant::start_learning_assistant;

fn main() -> ExitCode {
    start_learning_assistant::run_server()
}
