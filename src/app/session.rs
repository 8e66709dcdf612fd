// The role of this module is to host a lifecycle controller on its own
// thread and offer a simple message interface to it. Recognizer signals,
// restart timers and caller commands all funnel into one inbox, so events
// are handled strictly one at a time.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};
use postage::mpsc::{channel, Receiver, Sender};
use postage::prelude::*;

use crate::adapters::scheduler::ThreadScheduler;
use crate::app::controller::{RecognitionLifecycleController, SessionState};
use crate::config::EngineConfig;
use crate::ports::*;

const INBOX_CAPACITY: usize = 64;

/// Messages sent to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    Started { words: usize },
    Feedback(Feedback),
    Stopped,
}

/// Messages accepted by the session thread.
#[derive(Debug, Clone)]
pub enum InMsg {
    Start(Vec<String>),
    Stop,
    SkipWord,
    Result(RecognitionEvent),
    RecognizerError(String),
    RecognizerEnd,
    RestartDue(TaskHandle),
    Shutdown,
}

/// Handed to recognizer adapters so they can report into the session.
#[derive(Clone)]
pub struct SignalSender(Sender<InMsg>);

impl SignalSender {
    fn send(&mut self, msg: InMsg) -> bool {
        self.0.blocking_send(msg).is_ok()
    }
}

impl RecognizerSignals for SignalSender {
    fn result(&mut self, event: RecognitionEvent) -> bool {
        self.send(InMsg::Result(event))
    }
    fn error(&mut self, message: String) -> bool {
        self.send(InMsg::RecognizerError(message))
    }
    fn end(&mut self) -> bool {
        self.send(InMsg::RecognizerEnd)
    }
}

struct ChannelFeedback(Sender<Msg>);

impl FeedbackSink for ChannelFeedback {
    fn emit(&mut self, feedback: Feedback) {
        if self.0.blocking_send(Msg::Feedback(feedback)).is_err() {
            debug!("feedback receiver dropped");
        }
    }
}

pub type BoxedRecognizer = Box<dyn SpeechRecognizer + Send>;
type Controller = RecognitionLifecycleController<BoxedRecognizer, ThreadScheduler, ChannelFeedback>;

pub struct ReadAlongSession {
    chan_in: Sender<InMsg>,
    thread: Option<JoinHandle<()>>,
}

impl ReadAlongSession {
    /// Spawns the session thread. `init_recognizer` runs on that thread and
    /// receives the sender the recognizer must report through.
    pub fn new(
        config: EngineConfig,
        init_recognizer: impl FnOnce(SignalSender) -> BoxedRecognizer + Send + 'static,
        chan_out: Sender<Msg>,
    ) -> Self {
        let (chan_in, receiver_in) = channel(INBOX_CAPACITY);
        let sender_in = chan_in.clone();
        let thread = thread::spawn(move || {
            let mut this = SessionThread::new(config, init_recognizer, sender_in, receiver_in, chan_out);
            this.start_msg_loop();
        });
        Self {
            chan_in,
            thread: Some(thread),
        }
    }

    pub fn send(&self, msg: InMsg) {
        if self.chan_in.clone().blocking_send(msg).is_err() {
            warn!("read-along session is gone");
        }
    }

    pub fn start<I, W>(&self, words: I)
    where
        I: IntoIterator<Item = W>,
        W: Into<String>,
    {
        self.send(InMsg::Start(words.into_iter().map(Into::into).collect()));
    }

    pub fn stop(&self) {
        self.send(InMsg::Stop);
    }

    pub fn skip_word(&self) {
        self.send(InMsg::SkipWord);
    }

    /// Stops recognition and waits for the session thread to exit.
    pub fn shutdown(mut self) {
        self.send(InMsg::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("read-along session thread panicked");
            }
        }
    }
}

impl Drop for ReadAlongSession {
    fn drop(&mut self) {
        if self.thread.is_some() {
            let _ = self.chan_in.clone().try_send(InMsg::Shutdown);
        }
    }
}

struct SessionThread {
    controller: Controller,
    receiver_in: Receiver<InMsg>,
    chan_out: Sender<Msg>,
}

impl SessionThread {
    fn new(
        config: EngineConfig,
        init_recognizer: impl FnOnce(SignalSender) -> BoxedRecognizer,
        sender_in: Sender<InMsg>,
        receiver_in: Receiver<InMsg>,
        chan_out: Sender<Msg>,
    ) -> Self {
        let recognizer = init_recognizer(SignalSender(sender_in.clone()));
        let due_sender = Mutex::new(sender_in);
        let scheduler = ThreadScheduler::new(Arc::new(move |handle| {
            let mut sender = due_sender
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            let _ = sender.blocking_send(InMsg::RestartDue(handle));
        }));
        let controller = RecognitionLifecycleController::new(
            config,
            recognizer,
            scheduler,
            ChannelFeedback(chan_out.clone()),
        );
        Self {
            controller,
            receiver_in,
            chan_out,
        }
    }

    fn start_msg_loop(&mut self) {
        debug!("session msg loop started");
        while let Some(msg) = self.receiver_in.blocking_recv() {
            if !self.handle(msg) {
                break;
            }
        }
        debug!("session msg loop ended");
    }

    // Returns false when the loop should end.
    fn handle(&mut self, msg: InMsg) -> bool {
        match msg {
            InMsg::Start(words) => {
                self.controller.start(words);
                if self.controller.state() == SessionState::Listening {
                    let words = self.controller.page().map_or(0, |p| p.expected().len());
                    self.reply(Msg::Started { words });
                }
            }
            InMsg::Stop => {
                self.controller.stop();
                self.reply(Msg::Stopped);
            }
            InMsg::SkipWord => {
                self.controller.skip_word();
            }
            InMsg::Result(event) => self.controller.on_result(&event),
            InMsg::RecognizerError(message) => self
                .controller
                .on_error(RecognizerError::Transient(message)),
            InMsg::RecognizerEnd => self.controller.on_end(),
            InMsg::RestartDue(handle) => self.controller.on_restart_due(handle),
            InMsg::Shutdown => {
                info!("shutting down read-along session");
                self.controller.stop();
                return false;
            }
        }
        true
    }

    fn reply(&mut self, msg: Msg) {
        if self.chan_out.blocking_send(msg).is_err() {
            debug!("session receiver dropped");
        }
    }
}
