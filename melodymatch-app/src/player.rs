use melodymatch_core::{AudioConfig, PlayerKind, PreviewPlayer, SilentPreview};
use std::process::{Child, Command, Stdio};
use tracing::{debug, info, warn};

/// Plays previews through an external `mpv` process, one process at a time.
pub struct MpvPreview {
    binary: String,
    child: Option<Child>,
}

impl MpvPreview {
    #[must_use]
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            child: None,
        }
    }

    fn kill_child(&mut self) {
        if let Some(mut child) = self.child.take() {
            debug!("Stopping mpv (pid {})", child.id());
            // The process may already have exited at the end of the preview
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl PreviewPlayer for MpvPreview {
    fn play(&mut self, url: &str) {
        self.kill_child();

        let spawned = Command::new(&self.binary)
            .args(["--no-video", "--really-quiet", "--"])
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(child) => {
                debug!("Playing {} with mpv (pid {})", url, child.id());
                self.child = Some(child);
            }
            Err(e) => warn!("Failed to start {}: {}", self.binary, e),
        }
    }

    fn stop(&mut self) {
        self.kill_child();
    }
}

impl Drop for MpvPreview {
    fn drop(&mut self) {
        self.kill_child();
    }
}

/// Build the preview player selected in the config
#[must_use]
pub fn build_player(config: &AudioConfig) -> Box<dyn PreviewPlayer> {
    match config.player {
        PlayerKind::None => {
            info!("Preview playback disabled");
            Box::new(SilentPreview)
        }
        PlayerKind::Mpv => {
            info!("Playing previews with {}", config.mpv_path);
            Box::new(MpvPreview::new(config.mpv_path.clone()))
        }
    }
}
