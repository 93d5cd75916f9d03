use std::process::ExitCode;

fn main() -> ExitCode {
    match wktui_lib::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("wktui: {e}");
            ExitCode::FAILURE
        }
    }
}
