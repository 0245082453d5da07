use std::process::ExitCode;

fn main() -> ExitCode {
    sapcli_cli::run()
}
