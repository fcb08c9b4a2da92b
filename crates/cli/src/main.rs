use std::process::ExitCode;

fn main() -> ExitCode {
    fleetcfg_cli::run()
}
