use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::RecognizerSettings;
use crate::ports::recognizer::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedAlternative {
    pub transcript: String,
    #[serde(default)]
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedResult {
    pub alternatives: Vec<ScriptedAlternative>,
    #[serde(default)]
    pub is_final: bool,
}

impl ScriptedResult {
    pub fn to_event(&self, default_confidence: f32) -> RecognitionEvent {
        let alternatives = self
            .alternatives
            .iter()
            .map(|a| {
                HypothesisAlternative::from_transcript(
                    &a.transcript,
                    a.confidence.unwrap_or(default_confidence),
                )
            })
            .collect();
        RecognitionEvent::new(alternatives, self.is_final)
    }
}

/// One line of a recognizer script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    Result(ScriptedResult),
    Error(String),
    End,
}

/// Parses a JSON-lines script. Blank lines and lines starting with `#` are
/// skipped.
pub fn parse_script(text: &str) -> anyhow::Result<Vec<ScriptStep>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(n, line)| {
            serde_json::from_str(line).with_context(|| format!("parsing script line {}", n + 1))
        })
        .collect()
}

type ExhaustedHook = Box<dyn FnOnce() + Send>;

struct Worker {
    stop: Arc<AtomicBool>,
}

/// A recognizer that replays a script instead of listening to a microphone.
///
/// Each start spawns a worker that sends one step per `interval`. An `end`
/// or `error` step finishes the session, as a real recognizer would; the
/// next start resumes with the following step. When the script runs out the
/// recognizer goes quiet and the exhausted hook fires once.
pub struct ScriptedRecognizer<S> {
    steps: Arc<Mutex<VecDeque<ScriptStep>>>,
    signals: S,
    interval: Duration,
    default_confidence: f32,
    on_exhausted: Arc<Mutex<Option<ExhaustedHook>>>,
    worker: Option<Worker>,
}

impl<S> ScriptedRecognizer<S>
where
    S: RecognizerSignals + Clone + Send + 'static,
{
    pub fn new(steps: Vec<ScriptStep>, signals: S, interval: Duration) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into())),
            signals,
            interval,
            default_confidence: 0.5,
            on_exhausted: Arc::new(Mutex::new(None)),
            worker: None,
        }
    }

    pub fn with_default_confidence(mut self, confidence: f32) -> Self {
        self.default_confidence = confidence;
        self
    }

    pub fn on_exhausted(self, hook: impl FnOnce() + Send + 'static) -> Self {
        *self
            .on_exhausted
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Box::new(hook));
        self
    }

    pub fn remaining(&self) -> usize {
        self.steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|w| !w.stop.load(Ordering::SeqCst))
    }

    fn spawn_worker(&mut self) {
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = stop.clone();
        let steps = self.steps.clone();
        let on_exhausted = self.on_exhausted.clone();
        let mut signals = self.signals.clone();
        let interval = self.interval;
        let default_confidence = self.default_confidence;

        thread::spawn(move || {
            replay(&worker_stop, &steps, &on_exhausted, &mut signals, interval, default_confidence);
            worker_stop.store(true, Ordering::SeqCst);
        });

        self.worker = Some(Worker { stop });
    }
}

fn replay<S: RecognizerSignals>(
    stop: &AtomicBool,
    steps: &Mutex<VecDeque<ScriptStep>>,
    on_exhausted: &Mutex<Option<ExhaustedHook>>,
    signals: &mut S,
    interval: Duration,
    default_confidence: f32,
) {
    loop {
        thread::sleep(interval);
        // `stop()` raises the flag under the same lock, so a step is either
        // taken before the stop or left in the queue.
        let step = {
            let mut steps = steps.lock().unwrap_or_else(PoisonError::into_inner);
            if stop.load(Ordering::SeqCst) {
                return;
            }
            steps.pop_front()
        };
        let Some(step) = step else {
            let hook = on_exhausted
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(hook) = hook {
                info!("recognizer script exhausted");
                hook();
            }
            return;
        };
        debug!("replaying {step:?}");
        let delivered = match step {
            ScriptStep::Result(result) => signals.result(result.to_event(default_confidence)),
            ScriptStep::Error(message) => {
                signals.error(message);
                return;
            }
            ScriptStep::End => {
                signals.end();
                return;
            }
        };
        if !delivered {
            return;
        }
    }
}

impl<S> SpeechRecognizer for ScriptedRecognizer<S>
where
    S: RecognizerSignals + Clone + Send + 'static,
{
    fn start(&mut self, _settings: &RecognizerSettings) -> Result<(), RecognizerError> {
        self.stop();
        self.spawn_worker();
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _steps = self.steps.lock().unwrap_or_else(PoisonError::into_inner);
            worker.stop.store(true, Ordering::SeqCst);
        }
    }
}
