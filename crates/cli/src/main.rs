use std::process::ExitCode;

fn main() -> ExitCode {
    storelens_cli::run()
}
