/// The one audio element the engine drives. Only the engine sets its
/// source, starts or pauses it; views read it through the engine.
pub trait MediaElement {
    fn set_src(&mut self, url: &str);
    fn load(&mut self);
    /// Request playback. The outcome arrives later as a media `play` event
    /// or through [`PlayRejection`].
    fn play(&mut self);
    /// Pausing is synchronous: `paused` flips before this returns.
    fn pause(&mut self);
    fn set_volume(&mut self, volume: f64);
    fn volume(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    fn current_time(&self) -> f64;
    /// NaN or infinite while metadata is pending or for streams.
    fn duration(&self) -> f64;
    fn paused(&self) -> bool;
}

/// Why a play request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayRejection {
    /// Browser autoplay policy; a user gesture is required.
    NotAllowed,
    /// Superseded by a newer load before it could start.
    Aborted,
    /// Unsupported source or anything else.
    Failed,
}

impl PlayRejection {
    /// Classify a `DOMException` name from a rejected `play()` promise.
    pub fn from_exception_name(name: &str) -> Self {
        match name {
            "NotAllowedError" => PlayRejection::NotAllowed,
            "AbortError" => PlayRejection::Aborted,
            _ => PlayRejection::Failed,
        }
    }
}
