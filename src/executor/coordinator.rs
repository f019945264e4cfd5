// Swipe coordinate mapping for directional scrolls.
use serde::{Deserialize, Serialize};

use crate::step::params::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Physical screen size of the target device, supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceScreen {
    pub width: u32,
    pub height: u32,
}

impl DeviceScreen {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.fraction_x(1, 2), self.fraction_y(1, 2))
    }

    /// `width * num / den`, floored.
    fn fraction_x(&self, num: i64, den: i64) -> i32 {
        (i64::from(self.width) * num / den) as i32
    }

    fn fraction_y(&self, num: i64, den: i64) -> i32 {
        (i64::from(self.height) * num / den) as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeCoordinates {
    pub start: Point,
    pub end: Point,
}

/// Start/end points of a scroll swipe.
///
/// The finger moves against the scroll direction: scrolling `Down` starts at
/// 70% of the height and travels up by `distance`. Results are not clamped to
/// the screen; keeping `distance` sane is the caller's job.
pub fn compute_swipe(direction: Direction, distance: u32, screen: DeviceScreen) -> SwipeCoordinates {
    let center = screen.center();
    let d = i32::try_from(distance).unwrap_or(i32::MAX);

    let (start, end) = match direction {
        Direction::Down => {
            let y = screen.fraction_y(7, 10);
            (Point::new(center.x, y), Point::new(center.x, y.saturating_sub(d)))
        }
        Direction::Up => {
            let y = screen.fraction_y(3, 10);
            (Point::new(center.x, y), Point::new(center.x, y.saturating_add(d)))
        }
        Direction::Left => {
            let x = screen.fraction_x(2, 10);
            (Point::new(x, center.y), Point::new(x.saturating_add(d), center.y))
        }
        Direction::Right => {
            let x = screen.fraction_x(8, 10);
            (Point::new(x, center.y), Point::new(x.saturating_sub(d), center.y))
        }
    };

    SwipeCoordinates { start, end }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHONE: DeviceScreen = DeviceScreen {
        width: 1080,
        height: 2340,
    };

    #[test]
    fn down_on_reference_phone() {
        let c = compute_swipe(Direction::Down, 600, PHONE);
        assert_eq!(c.start, Point::new(540, 1638));
        assert_eq!(c.end, Point::new(540, 1038));
    }

    #[test]
    fn up_left_right_formulas() {
        let up = compute_swipe(Direction::Up, 600, PHONE);
        assert_eq!(up.start, Point::new(540, 702));
        assert_eq!(up.end, Point::new(540, 1302));

        let left = compute_swipe(Direction::Left, 400, PHONE);
        assert_eq!(left.start, Point::new(216, 1170));
        assert_eq!(left.end, Point::new(616, 1170));

        let right = compute_swipe(Direction::Right, 400, PHONE);
        assert_eq!(right.start, Point::new(864, 1170));
        assert_eq!(right.end, Point::new(464, 1170));
    }

    #[test]
    fn deterministic_and_moving_for_positive_distance() {
        let screens = [PHONE, DeviceScreen::new(720, 1280), DeviceScreen::new(1, 1)];
        for dir in [Direction::Up, Direction::Down, Direction::Left, Direction::Right] {
            for screen in screens {
                for distance in [1, 300, 600, 5000] {
                    let a = compute_swipe(dir, distance, screen);
                    let b = compute_swipe(dir, distance, screen);
                    assert_eq!(a, b);
                    assert_ne!(a.start, a.end, "{dir:?} {distance} {screen:?}");
                }
            }
        }
    }

    #[test]
    fn out_of_range_is_not_clamped() {
        let c = compute_swipe(Direction::Down, 5000, PHONE);
        assert_eq!(c.end.y, 1638 - 5000);
    }

    #[test]
    fn zero_distance_is_a_tap_in_place() {
        let c = compute_swipe(Direction::Left, 0, PHONE);
        assert_eq!(c.start, c.end);
    }
}
