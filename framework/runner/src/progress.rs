use indicatif::{ProgressBar, ProgressStyle};

/// Displays a progress bar over the scenarios of a run.
pub(crate) struct ScenarioProgress {
    bar: Option<ProgressBar>,
}

impl ScenarioProgress {
    pub(crate) fn start(total: usize, enabled: bool) -> Self {
        if !enabled {
            return Self { bar: None };
        }

        let bar = ProgressBar::new(total as u64);
        match ProgressStyle::with_template(
            "{spinner:.green} [{wide_bar:.cyan/blue}] {pos}/{len} scenarios [{elapsed_precise}] {msg}",
        ) {
            Ok(style) => bar.set_style(style.progress_chars("#>-")),
            Err(e) => log::debug!("Using the default progress style: {e:?}"),
        }

        Self { bar: Some(bar) }
    }

    pub(crate) fn scenario_started(&self, name: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(name.to_string());
        }
    }

    pub(crate) fn scenario_finished(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    pub(crate) fn finish(&self) {
        if let Some(bar) = &self.bar {
            log::trace!("Progress bar finishing");
            bar.finish_and_clear();
        }
    }
}
