use crate::application::demo::{self, Demo};
use crate::domain::{InitError, Session};
use crate::infrastructure::binding::{self, BackendKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub frames: u64,
    pub elapsed_ms: u64,
}

/// Binds the requested backend, initializes a session with the demo
/// assets, and runs the guest loop to completion: mutate state, advance
/// the frame, repeat until the host reports the terminal false, then
/// release.
pub fn run(kind: BackendKind) -> Result<RunStats, InitError> {
    let (images, palettes) = demo::build_assets();
    let driver = binding::bind(kind);
    let mut session = Session::initialize(images, palettes, driver)?;

    let mut demo = Demo::new();
    demo.layout(&mut session);

    let mut frames: u64 = 0;
    loop {
        demo.update(&mut session);
        if !session.advance_frame() {
            break;
        }
        frames += 1;
    }

    let elapsed_ms = session.time();
    session.release();
    log::info!("session ended after {frames} frames ({elapsed_ms} ms)");
    Ok(RunStats { frames, elapsed_ms })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_run_honors_the_frame_budget() {
        let stats = run(BackendKind::Headless {
            frame_budget: Some(5),
        })
        .expect("run");

        assert_eq!(stats.frames, 5);
        assert!(stats.elapsed_ms >= stats.frames * 16);
    }

    #[test]
    fn zero_budget_session_still_releases_cleanly() {
        let stats = run(BackendKind::Headless {
            frame_budget: Some(0),
        })
        .expect("run");

        assert_eq!(stats.frames, 0);
    }
}
