use std::f64::consts::{FRAC_PI_2, PI};

use neuroswing_network::Agent;
use neuroswing_training::{FitnessError, FitnessFunction};
use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg64;

use crate::{Pendulum, Vec2};

/// Input names, in the order of [`Pendulum::observation`].
pub const INPUTS: [&str; 5] = ["cart.x", "cart.vel", "bob.x", "bob.y", "bob.vel"];
pub const OUTPUTS: [&str; 1] = ["acceleration"];

/// Scale from the agent's output to cart acceleration.
pub const ACCELERATION_SCALE: f64 = 30.0;
/// Tick after which pushing the cart away from the center is penalized.
pub const CENTERING_GRACE_TICKS: u64 = 1200;

const START_OFFSET: f64 = 0.7;
const START_VELOCITY: f64 = 3.0;
const DISTRACTION_STRENGTH: f64 = 50.0;

/// Swing-up and balance episode scored per tick.
///
/// Per tick the agent gains `height * (1 - |x|)` while the bob is above the
/// rail and loses:
///
/// - `5 * |x|^3` for drifting toward the rail ends
/// - `0.1 * |Δoutput|` for jerky control
/// - `1` for accelerating away from the center after
///   [`CENTERING_GRACE_TICKS`]
///
/// Episode randomness is seeded with the agent's generation, so every agent
/// of a generation faces the same start state and distraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceTask {
    /// Episode length in ticks.
    pub agent_time: u64,
    /// Start odd generations from a random state instead of hanging at rest.
    pub random_start: bool,
    /// Apply one horizontal impulse at a random tick.
    pub distractions: bool,
}

impl Default for BalanceTask {
    fn default() -> Self {
        Self {
            agent_time: 3600,
            random_start: true,
            distractions: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Distraction {
    tick: u64,
    strength: f64,
}

impl BalanceTask {
    /// Builds the start state and distraction for `generation`.
    fn setup<R>(&self, generation: u64, rng: &mut R) -> (Pendulum, Option<Distraction>)
    where
        R: Rng + ?Sized,
    {
        let mut pendulum = Pendulum::new();
        if self.random_start && generation % 2 == 1 {
            pendulum.x = rng.random_range(-START_OFFSET..=START_OFFSET);
            pendulum.angle = FRAC_PI_2 + rng.random_range(-PI..=PI);
            pendulum.angular_velocity = rng.random_range(-START_VELOCITY..=START_VELOCITY);
            pendulum.horizontal_velocity = rng.random_range(-START_VELOCITY..=START_VELOCITY);
        }

        let distraction = self.distractions.then(|| Distraction {
            tick: rng.random_range(0..=self.agent_time),
            strength: rng.random_range(-DISTRACTION_STRENGTH..=DISTRACTION_STRENGTH),
        });
        (pendulum, distraction)
    }
}

impl FitnessFunction for BalanceTask {
    fn evaluate(&self, agent: &mut Agent) -> Result<f64, FitnessError> {
        let mut rng = Pcg64::seed_from_u64(agent.generation());
        let (mut pendulum, distraction) = self.setup(agent.generation(), &mut rng);

        let mut score = 0.0;
        let mut last_output = 0.0;
        while agent.ticks() < self.agent_time {
            let output = agent.run(&pendulum.observation())?[0];

            pendulum.apply_acceleration(Vec2::new(output * ACCELERATION_SCALE, 0.0));
            pendulum.update();

            if let Some(d) = distraction
                && d.tick == agent.ticks()
            {
                pendulum.apply_acceleration(Vec2::new(d.strength, 0.0));
            }

            let height = pendulum.bob_height();
            if height > 0.0 {
                score += height * (1.0 - pendulum.x.abs());
            }
            score -= pendulum.x.abs().powi(3) * 5.0;
            score -= (output - last_output).abs() * 0.1;
            last_output = output;

            if agent.ticks() > CENTERING_GRACE_TICKS
                && ((pendulum.x > 0.0 && output > 0.0) || (pendulum.x < 0.0 && output < 0.0))
            {
                score -= 1.0;
            }
        }
        Ok(score)
    }
}
