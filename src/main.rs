//! Binary entrypoint for the interactive terminal chat.

use std::process::ExitCode;

use learning_assistant::start_learning_assistant;

/// Chat with the backend from the terminal until `/quit` or end of input.
fn main() -> ExitCode {
    start_learning_assistant::run_terminal()
}
