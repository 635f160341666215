use glam::Vec3;

/// World axis an animated object travels along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Axis {
    #[default]
    X,
    Y,
    Z,
}

impl Axis {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "x" => Some(Self::X),
            "y" => Some(Self::Y),
            "z" => Some(Self::Z),
            _ => None,
        }
    }

    /// Returns `position` with the component along this axis replaced.
    pub fn apply(self, position: Vec3, value: f32) -> Vec3 {
        match self {
            Self::X => Vec3::new(value, position.y, position.z),
            Self::Y => Vec3::new(position.x, value, position.z),
            Self::Z => Vec3::new(position.x, position.y, value),
        }
    }

    pub fn component(self, position: Vec3) -> f32 {
        match self {
            Self::X => position.x,
            Self::Y => position.y,
            Self::Z => position.z,
        }
    }
}

/// Moves a scalar back and forth between two bounds at a fixed per-frame speed.
///
/// The direction flips on the frame the position reaches or passes a bound,
/// and the position is clamped so it never leaves `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oscillator {
    position: f32,
    velocity: f32,
    min: f32,
    max: f32,
}

impl Oscillator {
    /// Creates an oscillator at `start` heading toward `max`.
    pub fn new(start: f32, speed: f32, min: f32, max: f32) -> Self {
        Self {
            position: start.clamp(min, max),
            velocity: speed.abs(),
            min,
            max,
        }
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Advances one frame and returns the new position.
    pub fn step(&mut self) -> f32 {
        self.position += self.velocity;
        if self.position >= self.max {
            self.position = self.max;
            self.velocity = -self.velocity.abs();
        } else if self.position <= self.min {
            self.position = self.min;
            self.velocity = self.velocity.abs();
        }
        self.position
    }
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new(0.0, 0.5, -50.0, 50.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_within_bounds() {
        let mut osc = Oscillator::new(0.0, 3.0, -50.0, 50.0);
        for _ in 0..1_000 {
            let position = osc.step();
            assert!((-50.0..=50.0).contains(&position), "escaped: {position}");
        }
    }

    #[test]
    fn reverses_on_the_frame_the_upper_bound_is_reached() {
        let mut osc = Oscillator::new(0.0, 0.5, -50.0, 50.0);
        for _ in 0..99 {
            osc.step();
            assert!(osc.velocity() > 0.0);
        }
        assert_eq!(osc.step(), 50.0);
        assert!(osc.velocity() < 0.0);
        assert_eq!(osc.step(), 49.5);
    }

    #[test]
    fn overshoot_is_clamped_and_reversed() {
        let mut osc = Oscillator::new(48.0, 3.0, -50.0, 50.0);
        assert_eq!(osc.step(), 50.0);
        assert_eq!(osc.velocity(), -3.0);
    }

    #[test]
    fn lower_bound_reverses_toward_max() {
        let mut osc = Oscillator::new(-49.0, 2.0, -50.0, 50.0);
        osc.velocity = -2.0;
        assert_eq!(osc.step(), -50.0);
        assert_eq!(osc.velocity(), 2.0);
        assert_eq!(osc.step(), -48.0);
    }

    #[test]
    fn full_period_returns_to_start() {
        let mut osc = Oscillator::default();
        // 100 frames up, 200 down, 100 back up.
        for _ in 0..400 {
            osc.step();
        }
        assert_eq!(osc.position(), 0.0);
        assert!(osc.velocity() > 0.0);
    }

    #[test]
    fn axis_names_and_application() {
        assert_eq!(Axis::from_name("Y"), Some(Axis::Y));
        assert_eq!(Axis::from_name(" z "), Some(Axis::Z));
        assert_eq!(Axis::from_name("w"), None);
        let moved = Axis::Z.apply(Vec3::new(1.0, 2.0, 3.0), -7.0);
        assert_eq!(moved, Vec3::new(1.0, 2.0, -7.0));
        assert_eq!(Axis::Z.component(moved), -7.0);
    }
}
