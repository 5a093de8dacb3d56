//! Board content
//!
//! Draws a word with one underlined cell per letter next to a gallows
//! figure. How much of the figure shows depends on the [`GameState`]
//! snapshot handed in for the tick; the scene itself holds no game state.

pub mod gallows;
pub mod input;

pub use gallows::Stage;
pub use input::{read_commands, Command};

use embedded_graphics::mono_font::ascii::FONT_9X15;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};

/// Default word shown on the board
pub const DEFAULT_WORD: &str = "BOEKEN";

/// Default number of turns in a game
pub const DEFAULT_MAX_TURNS: u8 = 11;

/// Left edge of the first letter cell
const WORD_X: i32 = 23;

/// Top of the letters
const WORD_Y: i32 = 4;

/// Horizontal distance between letter cells
const CELL_PITCH: i32 = 10;

/// Row of the underline bars
const UNDERLINE_Y: i32 = 20;

/// Width of one underline bar
const UNDERLINE_WIDTH: u32 = 9;

/// Game progress as seen by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameState {
    pub turns_left: u8,
    pub max_turns: u8,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            turns_left: 0,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}

impl GameState {
    pub fn new(turns_left: u8, max_turns: u8) -> Self {
        Self {
            turns_left: turns_left.min(max_turns),
            max_turns,
        }
    }

    /// Use up one turn; stays at zero
    pub fn take_turn(&mut self) {
        self.turns_left = self.turns_left.saturating_sub(1);
    }

    /// Start over with every turn available
    pub fn reset(&mut self) {
        self.turns_left = self.max_turns;
    }

    pub fn is_over(&self) -> bool {
        self.turns_left == 0
    }
}

/// The word-and-gallows scene
#[derive(Debug, Clone)]
pub struct Scene {
    word: String,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(DEFAULT_WORD)
    }
}

impl Scene {
    pub fn new(word: &str) -> Self {
        Self {
            word: word.to_uppercase(),
        }
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    /// Stages visible for a given game state
    pub fn visible_stages(state: GameState) -> impl Iterator<Item = Stage> {
        Stage::ALL
            .into_iter()
            .filter(move |stage| stage.is_visible(state.turns_left))
    }

    /// Draw the full scene over a black background
    pub fn draw<D>(&self, target: &mut D, state: GameState) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        target.clear(Rgb888::BLACK)?;

        let text_style = MonoTextStyle::new(&FONT_9X15, Rgb888::WHITE);
        let underline = PrimitiveStyle::with_fill(Rgb888::WHITE);

        for (i, letter) in self.word.chars().enumerate() {
            let x = WORD_X + CELL_PITCH * i as i32;
            let mut buf = [0u8; 4];
            Text::with_baseline(
                letter.encode_utf8(&mut buf),
                Point::new(x, WORD_Y),
                text_style,
                Baseline::Top,
            )
            .draw(target)?;

            Rectangle::new(Point::new(x, UNDERLINE_Y), Size::new(UNDERLINE_WIDTH, 1))
                .into_styled(underline)
                .draw(target)?;
        }

        for stage in Self::visible_stages(state) {
            stage.draw(target, Rgb888::WHITE)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Canvas;
    use image::Rgba;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn render(state: GameState) -> Canvas {
        let mut canvas = Canvas::new(84, 28);
        Scene::default().draw(&mut canvas, state).unwrap();
        canvas
    }

    #[test]
    fn test_game_state_turns() {
        let mut state = GameState::new(2, 11);
        state.take_turn();
        state.take_turn();
        state.take_turn();
        assert_eq!(state.turns_left, 0);
        assert!(state.is_over());

        state.reset();
        assert_eq!(state.turns_left, 11);
        assert_eq!(GameState::new(20, 11).turns_left, 11);
    }

    #[test]
    fn test_visible_stage_count() {
        assert_eq!(Scene::visible_stages(GameState::new(11, 11)).count(), 0);
        assert_eq!(Scene::visible_stages(GameState::new(10, 11)).count(), 1);
        assert_eq!(Scene::visible_stages(GameState::new(5, 11)).count(), 6);
        assert_eq!(Scene::visible_stages(GameState::default()).count(), 11);
    }

    #[test]
    fn test_background_and_underlines() {
        let canvas = render(GameState::new(11, 11));
        let image = canvas.image();

        assert_eq!(*image.get_pixel(0, 0), BLACK);
        for i in 0..6 {
            let x = 23 + 10 * i;
            assert_eq!(*image.get_pixel(x, 20), WHITE);
            assert_eq!(*image.get_pixel(x + 8, 20), WHITE);
            assert_eq!(*image.get_pixel(x + 9, 20), BLACK);
        }
        // No gallows yet
        assert_eq!(*image.get_pixel(3, 10), BLACK);
    }

    #[test]
    fn test_pole_and_base_follow_turns() {
        let canvas = render(GameState::new(10, 11));
        assert_eq!(*canvas.image().get_pixel(3, 10), WHITE);
        assert_eq!(*canvas.image().get_pixel(1, 25), BLACK);

        let canvas = render(GameState::new(7, 11));
        assert_eq!(*canvas.image().get_pixel(1, 25), WHITE);
        assert_eq!(*canvas.image().get_pixel(19, 25), WHITE);
    }

    #[test]
    fn test_full_figure_adds_pixels() {
        let partial = render(GameState::new(6, 11));
        let full = render(GameState::new(0, 11));
        let lit = |c: &Canvas| c.image().pixels().filter(|p| **p == WHITE).count();

        assert!(lit(&full) > lit(&partial));
        // Body
        assert_eq!(*full.image().get_pixel(13, 12), WHITE);
        assert_eq!(*partial.image().get_pixel(13, 12), BLACK);
    }
}
