use std::f64::consts::FRAC_PI_2;

use crate::Vec2;

/// Fixed simulation step in seconds.
pub const DELTA_TIME: f64 = 1.0 / 60.0;
pub const ANGULAR_DAMPING: f64 = 0.7;
pub const HORIZONTAL_DAMPING: f64 = 0.3;
pub const GRAVITY: f64 = 9.81;
/// Half-length of the rail the cart moves on.
pub const RAIL_LIMIT: f64 = 1.0;

/// Pendulum mounted on a cart.
///
/// The bob rests at `angle == π/2`. It is above the rail while
/// [`bob_height`](Self::bob_height) is positive.
#[derive(Debug, Clone, PartialEq)]
pub struct Pendulum {
    pub x: f64,
    pub angle: f64,
    pub angular_velocity: f64,
    pub horizontal_velocity: f64,
    pub radius: f64,
    pub mass: f64,
}

impl Default for Pendulum {
    fn default() -> Self {
        Self {
            x: 0.0,
            angle: FRAC_PI_2,
            angular_velocity: 0.0,
            horizontal_velocity: 0.0,
            radius: 0.5,
            mass: 1.0,
        }
    }
}

impl Pendulum {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an acceleration of the cart frame for one step.
    ///
    /// Acceleration pushing the cart further into a rail end is dropped.
    pub fn apply_acceleration(&mut self, mut acceleration: Vec2) {
        if (acceleration.x < 0.0 && self.x <= -RAIL_LIMIT)
            || (acceleration.x > 0.0 && self.x >= RAIL_LIMIT)
        {
            acceleration.x = 0.0;
        }

        let force = acceleration * self.mass;
        let moment_of_inertia = self.mass * self.radius.powi(2);
        let mut angular_acceleration =
            force.cross(Vec2::from_angle(self.angle) * self.radius) / moment_of_inertia;
        angular_acceleration -= ANGULAR_DAMPING * self.angular_velocity;
        self.angular_velocity += angular_acceleration * DELTA_TIME;

        acceleration.x -= HORIZONTAL_DAMPING * self.horizontal_velocity;
        self.horizontal_velocity += acceleration.x * DELTA_TIME;
    }

    /// Advances the simulation by one step under gravity.
    pub fn update(&mut self) {
        self.apply_acceleration(Vec2::new(0.0, -GRAVITY));
        self.integrate();
    }

    fn integrate(&mut self) {
        self.angle += self.angular_velocity * DELTA_TIME;
        self.x += self.horizontal_velocity * DELTA_TIME;
        if self.x.abs() > RAIL_LIMIT {
            self.x = self.x.clamp(-RAIL_LIMIT, RAIL_LIMIT);
            self.horizontal_velocity = 0.0;
        }
    }

    /// Height of the bob relative to the cart, in units of the radius.
    #[must_use]
    pub fn bob_height(&self) -> f64 {
        -self.angle.sin()
    }

    /// Observation fed to agents, in the order of [`INPUTS`](crate::INPUTS).
    #[must_use]
    pub fn observation(&self) -> [f64; 5] {
        let (sin, cos) = self.angle.sin_cos();
        [
            self.x,
            self.horizontal_velocity,
            cos,
            sin,
            self.angular_velocity,
        ]
    }
}
