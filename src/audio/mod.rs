pub mod alert_tone;

use alert_tone::AlertTone;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};
use std::thread;

use anyhow::{anyhow, Result};
use log::warn;
use rodio::{Decoder, OutputStream, Sink};

type DoneCallback = Box<dyn FnOnce() + Send + 'static>;

enum AudioCommand {
    PlayAlert { done: DoneCallback },
}

/// Plays the posture alert on a dedicated audio thread.
///
/// The rodio output stream is not `Send`, so a long-lived `audio-engine`
/// thread owns it and is driven over a command channel. Every queued alert
/// eventually invokes its completion callback, success or failure, which is
/// what lets the caller clear its in-flight flag.
pub struct AlertPlayer {
    tx: Arc<Mutex<Option<Sender<AudioCommand>>>>,
    clip: Option<PathBuf>,
}

fn ensure_sink(stream: &mut Option<OutputStream>, sink: &mut Option<Sink>) -> Result<()> {
    if sink.is_none() {
        let (s, handle) = OutputStream::try_default()
            .map_err(|e| anyhow!("failed to create audio output stream: {e}"))?;
        let new_sink =
            Sink::try_new(&handle).map_err(|e| anyhow!("failed to create audio sink: {e}"))?;
        *stream = Some(s);
        *sink = Some(new_sink);
    }
    Ok(())
}

fn play_once(
    stream: &mut Option<OutputStream>,
    sink: &mut Option<Sink>,
    clip: Option<&Path>,
) -> Result<()> {
    ensure_sink(stream, sink)?;
    let sink = sink.as_ref().expect("sink just ensured");

    match clip {
        Some(path) => {
            let file = File::open(path).map_err(|e| anyhow!("failed to open alert clip: {e}"))?;
            let source = Decoder::new(BufReader::new(file))
                .map_err(|e| anyhow!("failed to decode alert clip: {e}"))?;
            sink.append(source);
        }
        None => sink.append(AlertTone::new()),
    }

    sink.sleep_until_end();
    Ok(())
}

impl AlertPlayer {
    pub fn new(clip: Option<PathBuf>) -> Self {
        Self {
            tx: Arc::new(Mutex::new(None)),
            clip,
        }
    }

    fn ensure_thread(&self) -> Result<Sender<AudioCommand>> {
        let mut guard = self
            .tx
            .lock()
            .map_err(|_| anyhow!("audio command channel poisoned"))?;
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<AudioCommand>();
        let clip = self.clip.clone();

        // Dedicated thread holding the non-Send audio objects
        thread::Builder::new()
            .name("audio-engine".to_string())
            .spawn(move || {
                let mut stream: Option<OutputStream> = None;
                let mut sink: Option<Sink> = None;

                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        AudioCommand::PlayAlert { done } => {
                            if let Err(err) = play_once(&mut stream, &mut sink, clip.as_deref()) {
                                warn!("alert playback failed: {err}");
                                // A dead output device fails every call; drop
                                // the sink so the next alert retries setup.
                                sink = None;
                                stream = None;
                            }
                            done();
                        }
                    }
                }
            })
            .map_err(|e| anyhow!("failed to spawn audio thread: {e}"))?;

        let tx_clone = tx.clone();
        *guard = Some(tx);
        Ok(tx_clone)
    }

    /// Queue one alert. `done` runs on the audio thread once playback ends
    /// or fails. An error here means the command was never queued and `done`
    /// will not run; the caller keeps responsibility for its flag.
    pub fn play_alert(&self, done: impl FnOnce() + Send + 'static) -> Result<()> {
        let tx = self.ensure_thread()?;
        tx.send(AudioCommand::PlayAlert {
            done: Box::new(done),
        })
        .map_err(|_| anyhow!("audio thread is gone"))
    }
}
