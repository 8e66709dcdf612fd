/* main.rs
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

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use futures::future::{self, Either};
use log::info;
use postage::mpsc;
use postage::prelude::*;
use serde::Serialize;

use readalong::adapters::recognizer::{parse_script, ScriptedRecognizer};
use readalong::app::{BoxedRecognizer, Msg, ReadAlongSession};
use readalong::config::{EngineConfig, VERSION};
use readalong::ports::{Feedback, PraiseLevel};

#[derive(Parser, Debug)]
#[command(name = "readalong", version = VERSION, about = "Follow a reader through a book")]
struct CliArgs {
    /// Book text; pages are separated by blank lines
    #[arg(long)]
    text: PathBuf,

    /// JSON-lines recognizer script to replay
    #[arg(long)]
    script: PathBuf,

    /// Engine configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Delay between replayed recognizer steps
    #[arg(long, default_value_t = 200)]
    interval_ms: u64,

    /// Enable debug mode with verbose logging
    #[arg(long)]
    debug: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    page: usize,
    feedback: &'a Feedback,
}

enum Event {
    Msg(Msg),
    ScriptDone,
}

// A line holding only whitespace ends the current page.
fn split_pages(text: &str) -> Vec<Vec<String>> {
    let mut pages = vec![];
    let mut page: Vec<String> = vec![];
    for line in text.lines() {
        if line.trim().is_empty() {
            if !page.is_empty() {
                pages.push(std::mem::take(&mut page));
            }
            continue;
        }
        page.extend(line.split_whitespace().map(str::to_owned));
    }
    if !page.is_empty() {
        pages.push(page);
    }
    pages
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let text = std::fs::read_to_string(&args.text)
        .with_context(|| format!("reading {}", args.text.display()))?;
    let pages = split_pages(&text);
    if pages.is_empty() {
        anyhow::bail!("{} has no words to read", args.text.display());
    }
    let script = std::fs::read_to_string(&args.script)
        .with_context(|| format!("reading {}", args.script.display()))?;
    let steps = parse_script(&script)?;
    info!("{} pages, {} script steps", pages.len(), steps.len());

    let (out_tx, mut out_rx) = mpsc::channel::<Msg>(32);
    let (done_tx, mut done_rx) = mpsc::channel::<()>(1);
    let interval = Duration::from_millis(args.interval_ms);
    let default_confidence = config.default_confidence;
    let session = ReadAlongSession::new(
        config,
        move |signals| -> BoxedRecognizer {
            let mut done_tx = done_tx;
            Box::new(
                ScriptedRecognizer::new(steps, signals, interval)
                    .with_default_confidence(default_confidence)
                    .on_exhausted(move || {
                        let _ = done_tx.blocking_send(());
                    }),
            )
        },
        out_tx,
    );

    let mut page = 0;
    let mut completed = 0;
    session.start(pages[page].clone());

    futures::executor::block_on(async {
        let mut script_done = false;
        loop {
            let event = if script_done {
                out_rx.recv().await.map(Event::Msg)
            } else {
                let msg = out_rx.recv();
                let done = done_rx.recv();
                futures::pin_mut!(msg, done);
                match future::select(msg, done).await {
                    Either::Left((msg, _)) => msg.map(Event::Msg),
                    Either::Right(_) => Some(Event::ScriptDone),
                }
            };

            match event {
                Some(Event::Msg(Msg::Started { words })) => {
                    info!("page {} started, {words} words", page + 1);
                }
                Some(Event::Msg(Msg::Feedback(feedback))) => {
                    let report = Report {
                        page,
                        feedback: &feedback,
                    };
                    println!("{}", serde_json::to_string(&report)?);
                    match feedback {
                        Feedback::WordsMatched { count, is_final, .. } => {
                            match PraiseLevel::for_match(count, is_final) {
                                PraiseLevel::Good => info!("Good!"),
                                PraiseLevel::Great => info!("Great! {count} words!"),
                                PraiseLevel::Quiet => {}
                            }
                        }
                        Feedback::NoMatchStreak { expected_word } => {
                            info!("Let's try the word {expected_word:?}");
                        }
                        Feedback::PageComplete => {
                            completed += 1;
                            page += 1;
                            if page < pages.len() {
                                session.start(pages[page].clone());
                            } else {
                                session.stop();
                            }
                        }
                        Feedback::RecognitionUnsupported => session.stop(),
                        Feedback::WordSkipped { .. } => {}
                    }
                }
                Some(Event::Msg(Msg::Stopped)) | None => break,
                Some(Event::ScriptDone) => {
                    script_done = true;
                    session.stop();
                }
            }
        }
        anyhow::Ok(())
    })?;

    session.shutdown();
    info!("{completed} of {} pages read", pages.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_are_blank_line_separated() {
        let pages = split_pages("The cat\nsat.\n\n\n\nOn the mat.\n\n   \n");
        assert_eq!(pages, [vec!["The", "cat", "sat."], vec!["On", "the", "mat."]]);
    }

    #[test]
    fn whitespace_only_lines_separate_pages() {
        let pages = split_pages("The cat sat.\n   \nOn the mat.\r\n\t\r\nThe end.");
        assert_eq!(
            pages,
            [
                vec!["The", "cat", "sat."],
                vec!["On", "the", "mat."],
                vec!["The", "end."]
            ]
        );
    }
}
