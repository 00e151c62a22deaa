//! Jump feasibility, direction selection and the glow model.
//!
//! Everything here is plain math with no DOM types, so the rabbit's
//! observable behaviour can be unit tested without a browser.

/// Minimum gap kept between the sprite and either viewport edge.
pub const EDGE_MARGIN: f64 = 20.0;

/// Chance of turning around when both directions are open. Anything else
/// continues in the previous direction, which produces runs of jumps one
/// way instead of a memoryless coin flip.
pub const FLIP_CHANCE: f64 = 1.0 / 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Sign convention: landing x is `x - sign * distance`, so Right
    /// carries -1 and moves the sprite towards larger x.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Left => 1.0,
            Direction::Right => -1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

pub fn distance(x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
    ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt()
}

pub fn can_jump_left(x: f64, jump_distance: f64) -> bool {
    x - jump_distance >= EDGE_MARGIN
}

pub fn can_jump_right(x: f64, jump_distance: f64, sprite_width: f64, viewport_width: f64) -> bool {
    x + jump_distance + sprite_width <= viewport_width - EDGE_MARGIN
}

/// The very first jump heads right when there is room, left otherwise.
pub fn first_direction(right_ok: bool) -> Direction {
    if right_ok { Direction::Right } else { Direction::Left }
}

/// Pick a jump direction from the feasible set. `roll` is a uniform sample
/// in [0, 1). Returns `None` when the sprite is trapped against both edges,
/// which cannot happen under the default configuration but is handled so a
/// pathological viewport never wedges the actor.
pub fn choose_direction(
    last: Direction,
    left_ok: bool,
    right_ok: bool,
    roll: f64,
) -> Option<Direction> {
    match (left_ok, right_ok) {
        (false, false) => None,
        (true, false) => Some(Direction::Left),
        (false, true) => Some(Direction::Right),
        (true, true) => Some(if roll < FLIP_CHANCE { last.flipped() } else { last }),
    }
}

pub fn landing_x(x: f64, direction: Direction, jump_distance: f64) -> f64 {
    x - direction.sign() * jump_distance
}

/// Normalized proximity in [0, 1]: zero at or beyond `range`, ramping up to
/// one at zero distance. An exponent above 1 keeps the ramp gentle far away
/// and steep up close.
pub fn proximity_factor(distance: f64, range: f64, exponent: f64) -> f64 {
    if range <= 0.0 || distance >= range {
        return 0.0;
    }
    (1.0 - distance / range).powf(exponent)
}

pub fn glow_intensity(factor: f64, max_proximity_glow: f64, bonus: f64) -> f64 {
    1.0 + factor * max_proximity_glow + bonus
}

pub fn glow_spread(factor: f64, max_proximity_spread: f64) -> f64 {
    1.0 + factor * max_proximity_spread
}

/// Accumulate a click boost without ever exceeding the configured ceiling.
pub fn boosted_bonus(bonus: f64, boost: f64, max_bonus: f64) -> f64 {
    (bonus + boost).min(max_bonus)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Deterministic uniform samples for the bias test.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> f64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (self.0 >> 11) as f64 / (1u64 << 53) as f64
        }
    }

    #[test]
    fn left_infeasible_forces_right() {
        // p - J < 20 means every choice must be Right, whatever the roll.
        let x = 310.0;
        let jump = 300.0;
        assert!(!can_jump_left(x, jump));
        for roll in [0.0, 0.1, 0.5, 0.99] {
            let picked = choose_direction(Direction::Left, can_jump_left(x, jump), true, roll);
            assert_eq!(picked, Some(Direction::Right));
        }
    }

    #[test]
    fn right_infeasible_forces_left() {
        // p + J + Vw > W - 20 means every choice must be Left.
        let x = 700.0;
        let jump = 300.0;
        let width = 96.0;
        let viewport = 1000.0;
        assert!(!can_jump_right(x, jump, width, viewport));
        for roll in [0.0, 0.1, 0.5, 0.99] {
            let picked = choose_direction(
                Direction::Right,
                true,
                can_jump_right(x, jump, width, viewport),
                roll,
            );
            assert_eq!(picked, Some(Direction::Left));
        }
    }

    #[test]
    fn trapped_between_both_edges_yields_none() {
        assert_eq!(choose_direction(Direction::Right, false, false, 0.5), None);
    }

    #[test]
    fn direction_bias_converges_to_one_third() {
        let mut rng = Lcg(0x5eed);
        let trials = 30_000;
        let mut flips = 0;
        for _ in 0..trials {
            match choose_direction(Direction::Right, true, true, rng.next()) {
                Some(Direction::Left) => flips += 1,
                Some(Direction::Right) => {}
                None => unreachable!(),
            }
        }
        let fraction = flips as f64 / trials as f64;
        assert!(
            (fraction - FLIP_CHANCE).abs() < 0.02,
            "flip fraction {fraction} strayed from 1/3"
        );
    }

    #[test]
    fn first_jump_from_100_in_1000px_viewport_goes_right_to_400() {
        let x = 100.0;
        let jump = 300.0;
        let width = 96.0;
        let viewport = 1000.0;
        let right_ok = can_jump_right(x, jump, width, viewport);
        assert!(right_ok);
        let direction = first_direction(right_ok);
        assert_eq!(direction, Direction::Right);
        assert_eq!(landing_x(x, direction, jump), 400.0);
    }

    #[test]
    fn first_jump_falls_back_to_left_when_right_is_blocked() {
        assert_eq!(first_direction(false), Direction::Left);
    }

    #[test]
    fn landing_follows_the_sign_convention() {
        assert_eq!(landing_x(500.0, Direction::Left, 220.0), 280.0);
        assert_eq!(landing_x(500.0, Direction::Right, 220.0), 720.0);
    }

    #[test]
    fn glow_is_flat_outside_range() {
        assert_eq!(proximity_factor(420.0, 420.0, 2.2), 0.0);
        assert_eq!(proximity_factor(1000.0, 420.0, 2.2), 0.0);
        let bonus = 0.4;
        assert_eq!(glow_intensity(0.0, 2.5, bonus), 1.0 + bonus);
        assert_eq!(glow_spread(0.0, 1.8), 1.0);
    }

    #[test]
    fn glow_peaks_at_zero_distance() {
        let t = proximity_factor(0.0, 420.0, 2.2);
        assert_eq!(t, 1.0);
        assert_eq!(glow_intensity(t, 2.5, 0.25), 1.0 + 2.5 + 0.25);
        assert_eq!(glow_spread(t, 1.8), 2.8);
    }

    #[test]
    fn proximity_ramp_is_monotonic() {
        let mut previous = f64::INFINITY;
        for step in 0..42 {
            let d = step as f64 * 10.0;
            let t = proximity_factor(d, 420.0, 2.2);
            assert!(t <= previous);
            assert!((0.0..=1.0).contains(&t));
            previous = t;
        }
    }

    #[test]
    fn bonus_saturates_at_the_ceiling() {
        let mut bonus = 0.0;
        for _ in 0..5 {
            bonus = boosted_bonus(bonus, 0.2, 1.0);
        }
        assert_eq!(bonus, 1.0);
        // Extra clicks stay clamped.
        assert_eq!(boosted_bonus(bonus, 0.2, 1.0), 1.0);
        assert!(bonus >= 0.0);
    }
}
