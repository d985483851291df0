use log::info;

use crate::{
    pipeline, utils, Config, DenoiseFlags, DenoisedOutputs, FrameGraph,
    FrameInputs, History, Settings,
};

/// A single view denoised frame after frame (e.g. one eye of a stereo
/// pair); owns its own history.
///
/// Frames of a viewport must be denoised one after another, while separate
/// viewports are independent of each other.
#[derive(Debug)]
pub struct Viewport<T> {
    label: String,
    history: History<T>,
}

impl<T> Viewport<T>
where
    T: Clone,
{
    pub fn new(label: impl ToString) -> Self {
        let label = label.to_string();

        info!("Creating viewport `{label}`");

        Self {
            label,
            history: History::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Denoises a single frame, using the configuration as it is right now.
    pub fn denoise<G>(
        &mut self,
        graph: &mut G,
        config: &Config,
        inputs: &FrameInputs<T>,
        flags: DenoiseFlags,
    ) -> DenoisedOutputs<T>
    where
        G: FrameGraph<Texture = T>,
    {
        let settings = Settings::from_config(config);

        self.denoise_with(graph, &settings, inputs, flags)
    }

    /// Denoises a single frame with explicit settings.
    pub fn denoise_with<G>(
        &mut self,
        graph: &mut G,
        settings: &Settings,
        inputs: &FrameInputs<T>,
        flags: DenoiseFlags,
    ) -> DenoisedOutputs<T>
    where
        G: FrameGraph<Texture = T>,
    {
        let (out, tt) = utils::measure(|| {
            pipeline::run(graph, settings, inputs, &mut self.history, flags)
        });

        utils::report(&self.label, self.history.frame_index(), tt);

        out
    }

    pub fn history(&self) -> &History<T> {
        &self.history
    }

    /// Drops the history, so that the next frame starts from scratch.
    pub fn invalidate(&mut self) {
        info!("Invalidating viewport `{}`", self.label);

        self.history.clear();
    }
}

impl<T> Drop for Viewport<T> {
    fn drop(&mut self) {
        info!("Deleting viewport `{}`", self.label);
    }
}
