use std::process::ExitCode;

use inotify_watcher::signal::StopFlag;
use inotify_watcher::watcher::{watch, WatchOptions};
use inotify_watcher::Error;

fn main() -> ExitCode {
    pretty_env_logger::init();

    let stop = match StopFlag::install() {
        Ok(stop) => stop,
        Err(e) => {
            eprintln!("sigaction: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut args = std::env::args_os();
    let program = args
        .next()
        .map_or_else(|| "./inotify-watcher".to_owned(), |p| p.to_string_lossy().into_owned());
    let path = match (args.next(), args.next()) {
        (Some(path), None) => path,
        _ => {
            println!("{}", Error::Usage { program });
            return ExitCode::FAILURE;
        }
    };

    match watch(path, stop, WatchOptions::default()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
