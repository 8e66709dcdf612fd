use std::path;

use anyhow::Context;

use crate::config::RecognizerSettings;
use crate::ports::recognizer::*;

/// Offline recognizer backed by a Vosk model.
///
/// Audio is pushed in by the host with `feed`; each chunk yields a partial
/// (non-final, single alternative) or finalized (up to `max_alternatives`)
/// `RecognitionEvent` while the recognizer is started.
///
/// The host owns delivery: events go to `RecognizerSignals::result`, an `Err`
/// from `feed` (a failed decode) to `RecognizerSignals::error`, and the end of
/// its audio stream to `RecognizerSignals::end`.
pub struct VoskRecognizer {
    recognizer: vosk::Recognizer,
    listening: bool,
}

impl VoskRecognizer {
    pub fn new(model_path: &path::Path, sample_rate: f32) -> anyhow::Result<Self> {
        let path = model_path
            .to_str()
            .context("model path is not valid UTF-8")?;
        let model = vosk::Model::new(path)
            .with_context(|| format!("loading vosk model from {}", model_path.display()))?;
        let mut recognizer =
            vosk::Recognizer::new(&model, sample_rate).context("creating vosk recognizer")?;
        recognizer.set_words(true);
        recognizer.set_partial_words(true);
        Ok(Self {
            recognizer,
            listening: false,
        })
    }

    /// Decodes a chunk of mono 16-bit PCM. Returns `None` while stopped or
    /// when nothing was recognized yet.
    pub fn feed(&mut self, samples: &[i16]) -> anyhow::Result<Option<RecognitionEvent>> {
        if !self.listening {
            return Ok(None);
        }
        let event = match self.recognizer.accept_waveform(samples) {
            vosk::DecodingState::Finalized => self.final_event()?,
            vosk::DecodingState::Running => self.partial_event(),
            vosk::DecodingState::Failed => anyhow::bail!("vosk failed to decode audio"),
        };
        Ok(Some(event).filter(|e| !e.is_empty()))
    }

    fn final_event(&mut self) -> anyhow::Result<RecognitionEvent> {
        let result = self.recognizer.result();
        let multiple = result
            .multiple()
            .context("extracting vosk alternatives")?;
        let alternatives = multiple
            .alternatives
            .into_iter()
            .map(|alt| {
                let words = alt
                    .result
                    .into_iter()
                    .map(|w| w.word)
                    .collect::<Vec<&str>>()
                    .join(" ");
                HypothesisAlternative::from_transcript(&words, alt.confidence)
            })
            .collect();
        Ok(RecognitionEvent::new(alternatives, true))
    }

    fn partial_event(&mut self) -> RecognitionEvent {
        let partial = self.recognizer.partial_result();
        let tokens: Vec<Token> = partial
            .partial_result
            .into_iter()
            .map(|w| Token {
                word: w.word.to_owned(),
                confidence: w.conf,
            })
            .collect();
        let confidence = if tokens.is_empty() {
            0.0
        } else {
            tokens.iter().map(|t| t.confidence).sum::<f32>() / tokens.len() as f32
        };
        RecognitionEvent::new(vec![HypothesisAlternative { tokens, confidence }], false)
    }
}

impl SpeechRecognizer for VoskRecognizer {
    fn start(&mut self, settings: &RecognizerSettings) -> Result<(), RecognizerError> {
        self.recognizer.reset();
        self.recognizer.set_max_alternatives(settings.max_alternatives);
        self.listening = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.listening = false;
        self.recognizer.reset();
    }
}
