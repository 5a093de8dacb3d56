//! Gallows figure, built up one stage per lost turn

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Line, PrimitiveStyle, Rectangle};

/// Top-left anchor of the head; everything else is placed relative to it
pub const ANCHOR: Point = Point::new(11, 5);

/// Head diameter
const HEAD_SIZE: u32 = 5;

/// Drawing stages in the order they appear
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pole,
    Beam,
    Brace,
    Base,
    Rope,
    Head,
    Body,
    RightArm,
    LeftArm,
    LeftLeg,
    RightLeg,
}

impl Stage {
    /// Every stage, first to appear first
    pub const ALL: [Stage; 11] = [
        Stage::Pole,
        Stage::Beam,
        Stage::Brace,
        Stage::Base,
        Stage::Rope,
        Stage::Head,
        Stage::Body,
        Stage::RightArm,
        Stage::LeftArm,
        Stage::LeftLeg,
        Stage::RightLeg,
    ];

    /// Highest `turns_left` at which this stage is drawn
    pub fn threshold(self) -> u8 {
        let index = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        (Self::ALL.len() - 1 - index) as u8
    }

    pub fn is_visible(self, turns_left: u8) -> bool {
        turns_left <= self.threshold()
    }

    /// Draw this stage in `color`
    pub fn draw<D>(self, target: &mut D, color: Rgb888) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let fill = PrimitiveStyle::with_fill(color);
        let stroke = PrimitiveStyle::with_stroke(color, 1);
        let at = |dx: i32, dy: i32| ANCHOR + Point::new(dx, dy);
        let bar = |dx: i32, dy: i32, w: u32, h: u32| Rectangle::new(at(dx, dy), Size::new(w, h));

        match self {
            Stage::Pole => bar(-8, -3, 1, 24).into_styled(fill).draw(target),
            Stage::Beam => bar(-8, -3, 15, 1).into_styled(fill).draw(target),
            Stage::Brace => Line::new(at(-8, 5), at(0, -3)).into_styled(stroke).draw(target),
            Stage::Base => bar(-10, 20, 19, 1).into_styled(fill).draw(target),
            Stage::Rope => bar(2, -3, 1, 3).into_styled(fill).draw(target),
            Stage::Head => Circle::new(ANCHOR, HEAD_SIZE).into_styled(fill).draw(target),
            Stage::Body => bar(2, 5, 1, 4).into_styled(fill).draw(target),
            Stage::RightArm => Line::new(at(2, 5), at(6, 9)).into_styled(stroke).draw(target),
            Stage::LeftArm => Line::new(at(3, 5), at(-1, 9)).into_styled(stroke).draw(target),
            Stage::LeftLeg => Line::new(at(3, 9), at(-1, 15)).into_styled(stroke).draw(target),
            Stage::RightLeg => Line::new(at(2, 9), at(6, 15)).into_styled(stroke).draw(target),
        }
    }
}
