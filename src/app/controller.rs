/* controller.rs
 *
 * Copyright 2022 Lorenzo Miglietta
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>.
 *
 * SPDX-License-Identifier: GPL-3.0-or-later
 */

// Owns one recognition session: feeds recognizer results through the
// matcher, reports progress, and restarts the recognizer when it errors or
// goes quiet. Nothing here blocks or spawns; deferred restarts go through
// the `Scheduler` port and come back through `on_restart_due`.

use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::matching::{ExpectedText, MatchReconciler, PageContext, PageSnapshot, SimilarityScorer};
use crate::ports::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    Listening,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub state: SessionState,
    pub page: Option<PageSnapshot>,
}

pub struct RecognitionLifecycleController<R, S, F> {
    config: EngineConfig,
    reconciler: MatchReconciler,
    recognizer: R,
    scheduler: S,
    feedback: F,
    state: SessionState,
    // None until the capability has been checked.
    supported: Option<bool>,
    page: Option<PageContext>,
    pending_restart: Option<TaskHandle>,
}

impl<R, S, F> RecognitionLifecycleController<R, S, F>
where
    R: SpeechRecognizer,
    S: Scheduler,
    F: FeedbackSink,
{
    pub fn new(config: EngineConfig, recognizer: R, scheduler: S, feedback: F) -> Self {
        let reconciler = MatchReconciler::new(
            SimilarityScorer::new(config.phonetic_threshold),
            config.match_threshold,
        );
        Self {
            config,
            reconciler,
            recognizer,
            scheduler,
            feedback,
            state: SessionState::Idle,
            supported: None,
            page: None,
            pending_restart: None,
        }
    }

    /// Shows a new page and starts listening for it.
    ///
    /// Any previous page and its session are dropped. An empty page is
    /// complete immediately and the recognizer is not started.
    pub fn start<I, W>(&mut self, words: I)
    where
        I: IntoIterator<Item = W>,
        W: Into<String>,
    {
        if !self.check_supported() {
            debug!("recognition unsupported, ignoring start");
            return;
        }

        self.cancel_pending_restart();
        if self.state == SessionState::Listening {
            self.recognizer.stop();
        }

        let page = PageContext::new(
            ExpectedText::new(words),
            self.config.buffer_capacity,
            self.config.no_match_streak_threshold,
        );
        info!("starting page of {} words", page.expected().len());
        let empty = page.is_complete();
        self.page = Some(page);

        if empty {
            self.state = SessionState::Stopped;
            if let Some(page) = self.page.as_mut() {
                page.take_completion();
            }
            info!("empty page, nothing to read");
            self.feedback.emit(Feedback::PageComplete);
            return;
        }

        self.state = SessionState::Listening;
        self.launch_recognizer();
    }

    /// Releases the recognizer and cancels any pending restart.
    pub fn stop(&mut self) {
        self.cancel_pending_restart();
        if self.supported == Some(false) {
            return;
        }
        if self.state == SessionState::Listening {
            self.recognizer.stop();
            info!("recognition stopped");
        }
        self.state = SessionState::Stopped;
        if let Some(page) = self.page.as_mut() {
            page.clear_session();
        }
    }

    pub fn on_result(&mut self, event: &RecognitionEvent) {
        if self.state != SessionState::Listening {
            debug!("ignoring result while {:?}", self.state);
            return;
        }
        let Some(page) = self.page.as_mut() else {
            return;
        };
        if event.is_empty() {
            debug!("ignoring empty recognition event");
            return;
        }
        debug!(
            "recognized {:?} (final: {}, {} alternatives)",
            event.top_transcript().unwrap_or_default(),
            event.is_final,
            event.alternatives.len()
        );

        let outcome = page.process(event, &self.reconciler);
        let cursor = page.cursor();
        debug!("after pass: {:?}", page.snapshot());

        if outcome.matched > 0 {
            self.feedback.emit(Feedback::WordsMatched {
                count: outcome.matched,
                cursor,
                is_final: event.is_final,
            });
        }
        if let Some(expected_word) = outcome.encourage {
            info!("no match for a while, encouraging {expected_word:?}");
            self.feedback.emit(Feedback::NoMatchStreak { expected_word });
        }
        if outcome.completed {
            self.finish_page();
        }
    }

    pub fn on_error(&mut self, error: RecognizerError) {
        if error == RecognizerError::Unsupported {
            if self.state == SessionState::Listening {
                self.recognizer.stop();
                if let Some(page) = self.page.as_mut() {
                    page.clear_session();
                }
            }
            self.mark_unsupported();
            return;
        }
        if self.state != SessionState::Listening {
            debug!("ignoring recognizer error while {:?}: {error}", self.state);
            return;
        }
        warn!("{error}, restarting in {}ms", self.config.error_restart_delay_ms);
        self.schedule_restart(self.config.error_restart_delay());
    }

    /// The recognizer ended its session on its own (e.g. silence timeout).
    pub fn on_end(&mut self) {
        if self.state != SessionState::Listening {
            return;
        }
        if self.is_page_complete() {
            self.cancel_pending_restart();
            self.state = SessionState::Stopped;
            info!("recognizer ended on a complete page");
            return;
        }
        debug!(
            "recognizer ended, restarting in {}ms",
            self.config.end_restart_delay_ms
        );
        self.schedule_restart(self.config.end_restart_delay());
    }

    /// Called by the host when a scheduled restart falls due. Handles that
    /// are not the current pending restart are ignored.
    pub fn on_restart_due(&mut self, handle: TaskHandle) {
        if self.pending_restart != Some(handle) {
            debug!("ignoring stale restart {handle:?}");
            return;
        }
        self.pending_restart = None;
        if self.state != SessionState::Listening {
            return;
        }
        info!("restarting recognizer");
        self.launch_recognizer();
    }

    /// Moves past the current word without hearing it.
    pub fn skip_word(&mut self) -> bool {
        let Some(page) = self.page.as_mut() else {
            return false;
        };
        if !page.skip() {
            return false;
        }
        let cursor = page.cursor();
        let completed = page.take_completion();
        self.feedback.emit(Feedback::WordSkipped { cursor });
        if completed {
            self.finish_page();
        }
        true
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_supported(&self) -> Option<bool> {
        self.supported
    }

    pub fn cursor(&self) -> usize {
        self.page.as_ref().map_or(0, PageContext::cursor)
    }

    pub fn expected_word(&self) -> Option<&str> {
        self.page.as_ref().and_then(PageContext::expected_word)
    }

    pub fn is_page_complete(&self) -> bool {
        self.page.as_ref().is_some_and(PageContext::is_complete)
    }

    pub fn page(&self) -> Option<&PageContext> {
        self.page.as_ref()
    }

    pub fn has_pending_restart(&self) -> bool {
        self.pending_restart.is_some()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            page: self.page.as_ref().map(PageContext::snapshot),
        }
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    fn finish_page(&mut self) {
        info!("page complete");
        self.feedback.emit(Feedback::PageComplete);
        if self.config.stop_on_page_complete {
            self.stop();
        }
    }

    fn check_supported(&mut self) -> bool {
        if let Some(supported) = self.supported {
            return supported;
        }
        if self.recognizer.is_supported() {
            self.supported = Some(true);
            return true;
        }
        self.mark_unsupported();
        false
    }

    fn mark_unsupported(&mut self) {
        self.cancel_pending_restart();
        self.state = SessionState::Idle;
        if self.supported == Some(false) {
            return;
        }
        self.supported = Some(false);
        warn!("speech recognition is not available");
        self.feedback.emit(Feedback::RecognitionUnsupported);
    }

    fn launch_recognizer(&mut self) {
        match self.recognizer.start(&self.config.recognizer) {
            Ok(()) => debug!("recognizer listening ({})", self.config.recognizer.language),
            Err(RecognizerError::Unsupported) => self.mark_unsupported(),
            Err(e) => {
                warn!("{e}, retrying in {}ms", self.config.error_restart_delay_ms);
                self.schedule_restart(self.config.error_restart_delay());
            }
        }
    }

    // An already pending restart is kept; a second signal for the same
    // outage (error followed by end) must not start the recognizer twice.
    fn schedule_restart(&mut self, delay: Duration) {
        if self.pending_restart.is_some() {
            debug!("restart already pending");
            return;
        }
        self.pending_restart = Some(self.scheduler.schedule(delay));
    }

    fn cancel_pending_restart(&mut self) {
        if let Some(handle) = self.pending_restart.take() {
            debug!("cancelling restart {handle:?}");
            self.scheduler.cancel(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::scheduler::ManualScheduler;
    use crate::config::RecognizerSettings;

    #[derive(Default)]
    struct FakeRecognizer {
        unsupported: bool,
        fail_starts: usize,
        starts: usize,
        stops: usize,
        running: bool,
    }

    impl SpeechRecognizer for FakeRecognizer {
        fn is_supported(&self) -> bool {
            !self.unsupported
        }
        fn start(&mut self, _settings: &RecognizerSettings) -> Result<(), RecognizerError> {
            self.starts += 1;
            if self.fail_starts > 0 {
                self.fail_starts -= 1;
                return Err(RecognizerError::Start("busy".into()));
            }
            self.running = true;
            Ok(())
        }
        fn stop(&mut self) {
            self.stops += 1;
            self.running = false;
        }
    }

    type Controller = RecognitionLifecycleController<FakeRecognizer, ManualScheduler, Vec<Feedback>>;

    fn controller(recognizer: FakeRecognizer) -> Controller {
        RecognitionLifecycleController::new(
            EngineConfig::default(),
            recognizer,
            ManualScheduler::default(),
            Vec::new(),
        )
    }

    fn fire(c: &mut Controller, millis: u64) {
        let due = c.scheduler_mut().advance(Duration::from_millis(millis));
        for handle in due {
            c.on_restart_due(handle);
        }
    }

    #[test]
    fn start_listens() {
        let mut c = controller(FakeRecognizer::default());
        assert_eq!(c.state(), SessionState::Idle);
        c.start(["the", "cat"]);
        assert_eq!(c.state(), SessionState::Listening);
        assert_eq!(c.recognizer().starts, 1);
        assert_eq!(c.expected_word(), Some("the"));
    }

    #[test]
    fn unsupported_is_reported_once() {
        let mut c = controller(FakeRecognizer {
            unsupported: true,
            ..Default::default()
        });
        c.start(["a"]);
        c.start(["b"]);
        c.stop();
        assert_eq!(c.state(), SessionState::Idle);
        assert_eq!(c.recognizer().starts, 0);
        assert_eq!(c.feedback().as_slice(), [Feedback::RecognitionUnsupported]);
    }

    #[test]
    fn unsupported_error_releases_running_recognizer() {
        let mut c = controller(FakeRecognizer::default());
        c.start(["a", "b"]);
        c.on_error(RecognizerError::Unsupported);
        c.stop();
        assert!(!c.recognizer().running);
        assert_eq!(c.recognizer().stops, 1);
        assert_eq!(c.state(), SessionState::Idle);
        assert_eq!(c.feedback().as_slice(), [Feedback::RecognitionUnsupported]);

        c.start(["c"]);
        assert_eq!(c.recognizer().starts, 1);
    }

    #[test]
    fn empty_page_completes_on_start() {
        let mut c = controller(FakeRecognizer::default());
        c.start(Vec::<String>::new());
        assert_eq!(c.feedback().as_slice(), [Feedback::PageComplete]);
        assert_eq!(c.recognizer().starts, 0);
        assert_eq!(c.state(), SessionState::Stopped);
    }

    #[test]
    fn error_restarts_after_delay() {
        let mut c = controller(FakeRecognizer::default());
        c.start(["a"]);
        c.on_error(RecognizerError::Transient("network".into()));
        fire(&mut c, 999);
        assert_eq!(c.recognizer().starts, 1);
        fire(&mut c, 1);
        assert_eq!(c.recognizer().starts, 2);
        assert!(!c.has_pending_restart());
    }

    #[test]
    fn end_restarts_quickly_unless_complete() {
        let mut c = controller(FakeRecognizer::default());
        c.config.stop_on_page_complete = false;
        c.start(["hi", "there"]);
        c.on_end();
        fire(&mut c, 100);
        assert_eq!(c.recognizer().starts, 2);

        c.on_result(&RecognitionEvent::single("hi there", 0.9, true));
        assert!(c.is_page_complete());
        assert_eq!(c.state(), SessionState::Listening);
        c.on_end();
        assert_eq!(c.state(), SessionState::Stopped);
        fire(&mut c, 1000);
        assert_eq!(c.recognizer().starts, 2);
    }

    #[test]
    fn failed_start_is_retried() {
        let mut c = controller(FakeRecognizer {
            fail_starts: 1,
            ..Default::default()
        });
        c.start(["a"]);
        assert!(c.has_pending_restart());
        fire(&mut c, 1000);
        assert!(c.recognizer().running);
        assert_eq!(c.state(), SessionState::Listening);
    }

    #[test]
    fn error_then_end_restarts_once() {
        let mut c = controller(FakeRecognizer::default());
        c.start(["a"]);
        c.on_error(RecognizerError::Transient("aborted".into()));
        c.on_end();
        fire(&mut c, 5000);
        assert_eq!(c.recognizer().starts, 2);
    }

    #[test]
    fn stale_handles_are_ignored() {
        let mut c = controller(FakeRecognizer::default());
        c.start(["a"]);
        c.on_end();
        let handle = c.pending_restart.unwrap();
        c.stop();
        c.start(["b"]);
        c.on_restart_due(handle);
        assert_eq!(c.recognizer().starts, 2);
    }

    #[test]
    fn page_completion_stops_recognizer() {
        let mut c = controller(FakeRecognizer::default());
        c.start(["go"]);
        c.on_result(&RecognitionEvent::single("go", 0.9, true));
        assert_eq!(c.state(), SessionState::Stopped);
        assert!(!c.recognizer().running);
        c.on_result(&RecognitionEvent::single("go", 0.9, true));
        let completions = c
            .feedback()
            .iter()
            .filter(|f| **f == Feedback::PageComplete)
            .count();
        assert_eq!(completions, 1);
    }

    #[test]
    fn skip_word_reports_and_completes() {
        let mut c = controller(FakeRecognizer::default());
        c.start(["one", "two"]);
        assert!(c.skip_word());
        assert!(c.skip_word());
        assert!(!c.skip_word());
        assert_eq!(
            c.feedback().as_slice(),
            [
                Feedback::WordSkipped { cursor: 1 },
                Feedback::WordSkipped { cursor: 2 },
                Feedback::PageComplete,
            ]
        );
        assert_eq!(c.state(), SessionState::Stopped);
    }

    #[test]
    fn new_page_replaces_session() {
        let mut c = controller(FakeRecognizer::default());
        c.start(["alpha", "beta"]);
        c.on_result(&RecognitionEvent::single("alpha zzz", 0.9, false));
        assert_eq!(c.cursor(), 1);
        c.start(["gamma"]);
        assert_eq!(c.cursor(), 0);
        assert!(c.page().unwrap().buffer().is_empty());
        assert_eq!(c.recognizer().stops, 1);
        assert_eq!(c.recognizer().starts, 2);
    }

    #[test]
    fn snapshot_reports_progress() {
        let mut c = controller(FakeRecognizer::default());
        c.start(["the", "cat"]);
        c.on_result(&RecognitionEvent::single("the hat", 0.9, false));
        let snapshot = c.snapshot();
        assert_eq!(snapshot.state, SessionState::Listening);
        let page = snapshot.page.unwrap();
        assert_eq!(page.cursor, 1);
        assert_eq!(page.total, 2);
        assert_eq!(page.expected_word.as_deref(), Some("cat"));
        assert_eq!(page.pile, ["hat"]);
    }
}
