use std::ffi::OsString;

fn main() {
    let args: Vec<OsString> = std::env::args_os().collect();
    if let Err(error) = taskpilot::run(args) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
