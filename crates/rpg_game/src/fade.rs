use rpg_core::{Color, Rect, Renderer};

/// Door-triggered fades, in elapsed-clock units.
pub const LEVEL_TRANSITION_FADE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FadeDirection {
    ToBlack,
    FromBlack,
}

/// Full-screen black overlay drawn above everything else.
///
/// A fade starts on the first `update` after it is requested, so the
/// duration is measured on the same clock the requester was updated with.
/// `is_fading` is true from the request until the fade completes.
#[derive(Debug, Clone)]
pub struct ScreenFade {
    direction: FadeDirection,
    duration: f64,
    started_at: Option<f64>,
    fading: bool,
    alpha: u8,
}

impl ScreenFade {
    pub fn new() -> Self {
        Self {
            direction: FadeDirection::FromBlack,
            duration: 0.0,
            started_at: None,
            fading: false,
            alpha: 0,
        }
    }

    pub fn fade_to_black(&mut self, duration: f64) {
        self.start(FadeDirection::ToBlack, duration);
    }

    pub fn fade_from_black(&mut self, duration: f64) {
        self.start(FadeDirection::FromBlack, duration);
        self.alpha = 255;
    }

    fn start(&mut self, direction: FadeDirection, duration: f64) {
        log::debug!("Fade {direction:?} over {duration} units");
        self.direction = direction;
        self.duration = duration.max(0.0);
        self.started_at = None;
        self.fading = true;
    }

    /// Drops any fade in progress and uncovers the screen.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Clears a fade to black, running or finished, and leaves a fade from
    /// black alone. Used when whatever asked for the blackout goes away.
    pub fn cancel_to_black(&mut self) {
        if self.direction == FadeDirection::ToBlack && (self.fading || self.alpha > 0) {
            log::debug!("Fade to black cancelled at alpha {}", self.alpha);
            self.clear();
        }
    }

    pub fn is_fading(&self) -> bool {
        self.fading
    }

    #[cfg(test)]
    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    pub fn update(&mut self, elapsed: f64) {
        if !self.fading {
            return;
        }
        let started_at = *self.started_at.get_or_insert(elapsed);
        let progress = if self.duration > 0.0 {
            ((elapsed - started_at) / self.duration).clamp(0.0, 1.0)
        } else {
            1.0
        };

        let opacity = match self.direction {
            FadeDirection::ToBlack => progress,
            FadeDirection::FromBlack => 1.0 - progress,
        };
        self.alpha = (opacity * 255.0).round() as u8;

        if progress >= 1.0 {
            self.fading = false;
        }
    }

    pub fn draw<R: Renderer + ?Sized>(&self, renderer: &mut R) {
        if self.alpha == 0 {
            return;
        }
        let viewport = renderer.viewport();
        renderer.fill_rect(
            Rect::new(0.0, 0.0, viewport.x, viewport.y),
            Color::BLACK.with_alpha(self.alpha),
        );
    }
}

impl Default for ScreenFade {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{DrawCall, HeadlessBackend};

    #[test]
    fn fade_to_black_reports_fading_until_duration_passes() {
        let mut fade = ScreenFade::new();
        fade.fade_to_black(5.0);
        assert!(fade.is_fading());

        fade.update(10.0);
        assert!(fade.is_fading());
        assert_eq!(fade.alpha(), 0);

        fade.update(12.5);
        assert!(fade.is_fading());
        assert!(fade.alpha() > 100 && fade.alpha() < 155);

        fade.update(15.0);
        assert!(!fade.is_fading());
        assert_eq!(fade.alpha(), 255);

        // A completed fade to black stays opaque.
        fade.update(40.0);
        assert_eq!(fade.alpha(), 255);
    }

    #[test]
    fn fade_from_black_ends_transparent() {
        let mut fade = ScreenFade::new();
        fade.fade_from_black(2.0);
        assert_eq!(fade.alpha(), 255);
        fade.update(1.0);
        fade.update(3.0);
        assert!(!fade.is_fading());
        assert_eq!(fade.alpha(), 0);
    }

    #[test]
    fn zero_duration_completes_on_first_update() {
        let mut fade = ScreenFade::new();
        fade.fade_to_black(0.0);
        fade.update(7.0);
        assert!(!fade.is_fading());
        assert_eq!(fade.alpha(), 255);
    }

    #[test]
    fn cancel_only_lifts_fades_to_black() {
        let mut fade = ScreenFade::new();
        fade.fade_to_black(0.0);
        fade.update(1.0);
        assert_eq!(fade.alpha(), 255);
        fade.cancel_to_black();
        assert_eq!(fade.alpha(), 0);
        assert!(!fade.is_fading());

        fade.fade_from_black(5.0);
        fade.cancel_to_black();
        assert!(fade.is_fading());
        assert_eq!(fade.alpha(), 255);

        fade.clear();
        assert!(!fade.is_fading());
        assert_eq!(fade.alpha(), 0);
    }

    #[test]
    fn draw_covers_viewport_only_when_visible() {
        let mut backend = HeadlessBackend::new();
        let mut fade = ScreenFade::new();
        fade.draw(&mut backend);
        assert!(backend.calls.is_empty());

        fade.fade_to_black(0.0);
        fade.update(0.0);
        fade.draw(&mut backend);
        assert_eq!(
            backend.calls,
            vec![DrawCall::Fill(
                Rect::new(0.0, 0.0, backend.viewport.x, backend.viewport.y),
                Color::BLACK
            )]
        );
    }
}
