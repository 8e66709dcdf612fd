/* lib.rs
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

//! Read-along engine: follows a reader through a page of text by matching
//! a noisy stream of speech-recognition hypotheses against the expected
//! words.

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod matching;
pub mod ports;

pub use app::{RecognitionLifecycleController, ReadAlongSession, SessionState};
pub use config::{EngineConfig, RecognizerSettings};
pub use error::EngineError;
pub use ports::{Feedback, RecognitionEvent};
