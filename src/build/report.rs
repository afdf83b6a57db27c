// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::build::{Target, TargetOutcome};

use indicatif::{ProgressBar, ProgressStyle};
use std::{sync::Mutex, time::Duration};

/// Observer of build progress.
pub trait Reporter: Send + Sync {
    /// Target started building.
    fn started(&self, target: &Target);

    /// Target finished building.
    fn finished(&self, target: &Target, outcome: &TargetOutcome, elapsed: Duration);

    /// Target was rebuilt in watch mode.
    fn rebuilt(&self, target: &Target, outcome: &TargetOutcome, elapsed: Duration);
}

/// Reporter showing a spinner per target.
#[derive(Default)]
pub struct SpinnerReporter {
    current: Mutex<Option<ProgressBar>>,
}

impl SpinnerReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn spinner() -> ProgressBar {
        let style = ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("-\\|/ ");
        let bar = ProgressBar::new_spinner();
        bar.set_style(style);
        bar
    }
}

impl Reporter for SpinnerReporter {
    fn started(&self, target: &Target) {
        let bar = Self::spinner();
        bar.set_message(starting_message(target));
        bar.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut current) = self.current.lock() {
            if let Some(previous) = current.replace(bar) {
                previous.abandon();
            }
        }
    }

    fn finished(&self, target: &Target, outcome: &TargetOutcome, elapsed: Duration) {
        let bar = self
            .current
            .lock()
            .ok()
            .and_then(|mut current| current.take())
            .unwrap_or_else(Self::spinner);
        bar.finish_with_message(finished_message(target, outcome, elapsed));
    }

    fn rebuilt(&self, target: &Target, outcome: &TargetOutcome, elapsed: Duration) {
        Self::spinner().finish_with_message(rebuilt_message(target, outcome, elapsed));
    }
}

pub(crate) fn starting_message(target: &Target) -> String {
    match target {
        Target::Common => "Creating common bundle...".into(),
        Target::Island(name) => format!("Creating island {name}..."),
    }
}

pub(crate) fn finished_message(target: &Target, outcome: &TargetOutcome, elapsed: Duration) -> String {
    match outcome {
        TargetOutcome::Succeeded { .. } => {
            format!("Succeeded: {target} in {}ms.", elapsed.as_millis())
        }
        TargetOutcome::Failed(_) => format!("Failed: {target}"),
    }
}

pub(crate) fn rebuilt_message(target: &Target, outcome: &TargetOutcome, elapsed: Duration) -> String {
    match outcome {
        TargetOutcome::Succeeded { .. } => {
            format!("Rebuilt: {target} in {}ms.", elapsed.as_millis())
        }
        TargetOutcome::Failed(_) => format!("Failed: {target}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildError;
    use pretty_assertions::assert_eq;

    #[test]
    fn messages_name_target() {
        let island = Target::Island("Counter".into());
        let ok = TargetOutcome::Succeeded { emitted: vec![] };
        let failed = TargetOutcome::Failed(BuildError::Scratch(std::io::Error::other("boom")));
        let elapsed = Duration::from_millis(42);

        assert_eq!(starting_message(&island), "Creating island Counter...");
        assert_eq!(starting_message(&Target::Common), "Creating common bundle...");
        assert_eq!(finished_message(&island, &ok, elapsed), "Succeeded: Counter in 42ms.");
        assert_eq!(finished_message(&island, &failed, elapsed), "Failed: Counter");
        assert_eq!(rebuilt_message(&island, &ok, elapsed), "Rebuilt: Counter in 42ms.");
        assert_eq!(rebuilt_message(&island, &failed, elapsed), "Failed: Counter");
    }

    #[test]
    fn spinner_reporter_tolerates_unmatched_finish() {
        let reporter = SpinnerReporter::new();
        let target = Target::Common;
        let outcome = TargetOutcome::Succeeded { emitted: vec![] };

        reporter.finished(&target, &outcome, Duration::ZERO);
        reporter.started(&target);
        reporter.finished(&target, &outcome, Duration::ZERO);
        assert!(reporter.current.lock().unwrap().is_none());
    }
}
