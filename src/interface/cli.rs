use crate::application::app;
use crate::infrastructure::binding::BackendKind;

const DEFAULT_HEADLESS_FRAMES: u64 = 600;

pub fn run() {
    let args: Vec<String> = std::env::args().collect();
    let program = args
        .first()
        .map(String::as_str)
        .unwrap_or("glowbug")
        .to_string();

    let mut kind = BackendKind::Window;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage(&program);
                return;
            }
            "--headless" => {
                let mut frames = DEFAULT_HEADLESS_FRAMES;
                if let Some(count) = args.get(i + 1).and_then(|arg| arg.parse::<u64>().ok()) {
                    frames = count;
                    i += 1;
                }
                kind = BackendKind::Headless {
                    frame_budget: Some(frames),
                };
            }
            other => {
                eprintln!("unknown argument '{other}'");
                print_usage(&program);
                std::process::exit(2);
            }
        }
        i += 1;
    }

    match app::run(kind) {
        Ok(stats) => {
            if matches!(kind, BackendKind::Headless { .. }) {
                println!("ran {} frames in {} ms", stats.frames, stats.elapsed_ms);
            }
        }
        Err(err) => {
            eprintln!("failed to bind console backend: {err:?}");
            std::process::exit(1);
        }
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage: {program} [--headless [frames]]");
    eprintln!();
    eprintln!("  --headless [frames]  run without a window for the given number of");
    eprintln!("                       frames (default {DEFAULT_HEADLESS_FRAMES}) and print a summary");
}
