//! # Cent Meter Widget
//!
//! A horizontal needle meter showing how far the detected pitch is from the
//! nearest tempered note, from -50 (flat, left) to +50 cents (sharp, right).

use iced::widget::canvas::{self, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{mouse, Color, Element, Point, Rectangle, Renderer, Size, Theme};

/// Half-width of the meter scale in cents.
const METER_RANGE: f32 = 50.0;

/// Scale marks drawn on the meter, in cents.
const TICKS: [f32; 4] = [-25.0, -10.0, 10.0, 25.0];

/// Deviation still shown as in tune.
const IN_TUNE_CENTS: f32 = 5.0;

const IN_TUNE: Color = rgb8(0x34, 0xDB, 0x98);
const CLOSE: Color = rgb8(0xFF, 0xC3, 0x00);
const OFF: Color = rgb8(0xFF, 0x33, 0x33);

const fn rgb8(r: u8, g: u8, b: u8) -> Color {
    Color {
        r: r as f32 / 255.0,
        g: g as f32 / 255.0,
        b: b as f32 / 255.0,
        a: 1.0,
    }
}

/// Color for a deviation: green when in tune, yellow when close, red otherwise.
pub fn deviation_color(cents: f32) -> Color {
    if cents.abs() < IN_TUNE_CENTS {
        IN_TUNE
    } else if cents.abs() < 20.0 {
        CLOSE
    } else {
        OFF
    }
}

pub struct CentMeter {
    /// None while there is no signal; the needle is hidden.
    cents: Option<f32>,
}

impl CentMeter {
    pub fn new(cents: Option<f32>) -> Self {
        Self { cents }
    }

    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fixed(80.0)),
        )
        .into()
    }
}

/// Horizontal position of a deviation on a meter `width` pixels wide.
fn needle_x(cents: f32, width: f32) -> f32 {
    let clamped = cents.clamp(-METER_RANGE, METER_RANGE);
    (clamped + METER_RANGE) / (2.0 * METER_RANGE) * width
}

impl<Message> canvas::Program<Message> for CentMeter {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        let background = Path::rectangle(Point::ORIGIN, bounds.size());
        frame.fill(&background, Color::from_rgb8(0x40, 0x40, 0x40));

        // In-tune band around the center
        let band_left = needle_x(-IN_TUNE_CENTS, bounds.width);
        let band_right = needle_x(IN_TUNE_CENTS, bounds.width);
        let band = Path::rectangle(
            Point::new(band_left, 0.0),
            Size::new(band_right - band_left, bounds.height),
        );
        frame.fill(&band, Color { a: 0.25, ..IN_TUNE });

        for cents in TICKS {
            let x = needle_x(cents, bounds.width);
            let tick = Path::line(Point::new(x, 0.0), Point::new(x, bounds.height * 0.3));
            frame.stroke(
                &tick,
                Stroke::default().with_width(1.0).with_color(Color::from_rgb8(0xA0, 0xA0, 0xA0)),
            );
        }

        let center_x = bounds.width / 2.0;
        let center_line = Path::line(
            Point::new(center_x, 0.0),
            Point::new(center_x, bounds.height),
        );
        frame.stroke(
            &center_line,
            Stroke::default().with_width(2.0).with_color(Color::WHITE),
        );

        if let Some(c) = self.cents {
            let x = needle_x(c, bounds.width);
            let needle = Path::rectangle(Point::new(x - 2.0, 0.0), Size::new(4.0, bounds.height));
            frame.fill(&needle, deviation_color(c));
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needle_is_centered_when_in_tune() {
        assert_eq!(needle_x(0.0, 200.0), 100.0);
    }

    #[test]
    fn needle_is_pinned_at_the_edges() {
        assert_eq!(needle_x(-80.0, 200.0), 0.0);
        assert_eq!(needle_x(80.0, 200.0), 200.0);
    }

    #[test]
    fn colors_follow_deviation() {
        assert_eq!(deviation_color(2.0), IN_TUNE);
        assert_eq!(deviation_color(-12.0), CLOSE);
        assert_eq!(deviation_color(40.0), OFF);
    }
}
