//! # Plot Widget
//!
//! Live line-style plot of one frame of data (waveform, spectrum, cepstrum or
//! autocorrelation). Each screen column shows the min..max range of the
//! samples that fall into it, so long frames stay readable at any width.

use iced::widget::canvas::{self, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{mouse, Color, Element, Point, Rectangle, Renderer, Size, Theme};

/// How values map to the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlotScale {
    /// Non-negative data drawn up from the bottom edge.
    Magnitude,
    /// Signed data drawn around a center line.
    Signed,
}

pub struct Plot {
    data: Vec<f32>,
    scale: PlotScale,
}

impl Plot {
    pub fn new(data: Vec<f32>, scale: PlotScale) -> Self {
        Self { data, scale }
    }

    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fill),
        )
        .into()
    }
}

/// Min and max of each of `columns` consecutive groups of `data`.
fn column_ranges(data: &[f32], columns: usize) -> Vec<(f32, f32)> {
    let columns = columns.clamp(1, data.len().max(1));
    let group = data.len().div_ceil(columns).max(1);
    data.chunks(group)
        .map(|values| {
            values.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
        })
        .collect()
}

impl<Message> canvas::Program<Message> for Plot {
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

        if !bounds.width.is_finite() || !bounds.height.is_finite() || self.data.is_empty() {
            return vec![frame.into_geometry()];
        }

        let peak = self
            .data
            .iter()
            .filter(|v| v.is_finite())
            .fold(0.0f32, |max, &v| max.max(v.abs()));

        let baseline = match self.scale {
            PlotScale::Magnitude => bounds.height,
            PlotScale::Signed => bounds.height / 2.0,
        };
        let axis = Path::line(Point::new(0.0, baseline), Point::new(bounds.width, baseline));
        frame.stroke(
            &axis,
            Stroke::default()
                .with_color(Color::from_rgb8(0x55, 0x55, 0x55))
                .with_width(1.0),
        );

        if peak <= 0.0 {
            return vec![frame.into_geometry()];
        }

        // The baseline's distance to the top edge is the full scale.
        let to_y = |v: f32| baseline - (v / peak) * baseline;

        let ranges = column_ranges(&self.data, bounds.width as usize);
        let bar_width = bounds.width / ranges.len() as f32;

        for (i, &(lo, hi)) in ranges.iter().enumerate() {
            // A column's range always reaches the baseline for magnitude plots.
            let (lo, hi) = match self.scale {
                PlotScale::Magnitude => (0.0, hi.max(0.0)),
                PlotScale::Signed => (lo, hi),
            };
            let top = to_y(hi);
            let height = (to_y(lo) - top).max(1.0);

            if top.is_finite() && height.is_finite() {
                let bar = Path::rectangle(
                    Point::new(i as f32 * bar_width, top),
                    Size::new(bar_width.max(1.0), height),
                );
                frame.fill(&bar, Color::from_rgb8(0x34, 0x98, 0xDB));
            }
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::column_ranges;

    #[test]
    fn groups_cover_all_samples() {
        let data: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let ranges = column_ranges(&data, 3);
        assert_eq!(ranges, vec![(0.0, 3.0), (4.0, 7.0), (8.0, 9.0)]);
    }

    #[test]
    fn more_columns_than_samples() {
        let ranges = column_ranges(&[1.0, -2.0], 800);
        assert_eq!(ranges, vec![(1.0, 1.0), (-2.0, -2.0)]);
    }
}
