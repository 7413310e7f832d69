//! Lane model: ordered waypoint sequences with arc-length parameterisation.
//!
//! Lanes are immutable after level configuration. Enemy movement stores only
//! a progress fraction in `[0, 1]`; [`Lane::position_at`] maps the fraction
//! back to a world position by linear interpolation across segments.

use glam::Vec2;

/// Fixed, non-branching path an enemy walks from spawn to the defended core.
#[derive(Clone, Debug, PartialEq)]
pub struct Lane {
    waypoints: Vec<Vec2>,
    cumulative: Vec<f32>,
    total_length: f32,
}

impl Lane {
    /// Builds a lane from waypoints, precomputing cumulative segment lengths.
    ///
    /// Returns `None` for degenerate input: fewer than two waypoints, or a
    /// path whose total arc length is zero.
    #[must_use]
    pub fn from_waypoints(waypoints: Vec<Vec2>) -> Option<Self> {
        if waypoints.len() < 2 {
            return None;
        }

        let mut cumulative = Vec::with_capacity(waypoints.len());
        cumulative.push(0.0);
        let mut total = 0.0;
        for pair in waypoints.windows(2) {
            total += pair[0].distance(pair[1]);
            cumulative.push(total);
        }

        if total <= 0.0 {
            return None;
        }

        Some(Self {
            waypoints,
            cumulative,
            total_length: total,
        })
    }

    /// Total arc length of the lane in world units.
    #[must_use]
    pub const fn total_length(&self) -> f32 {
        self.total_length
    }

    /// Position where enemies enter the lane.
    #[must_use]
    pub fn start(&self) -> Vec2 {
        self.waypoints[0]
    }

    /// Position of the defended core at the end of the lane.
    #[must_use]
    pub fn end(&self) -> Vec2 {
        self.waypoints[self.waypoints.len() - 1]
    }

    /// Maps a progress fraction in `[0, 1]` to a world position.
    ///
    /// Out-of-range fractions clamp to the lane endpoints.
    #[must_use]
    pub fn position_at(&self, progress: f32) -> Vec2 {
        let distance = progress.clamp(0.0, 1.0) * self.total_length;
        let segment = match self
            .cumulative
            .partition_point(|&length| length <= distance)
        {
            0 => return self.waypoints[0],
            index if index >= self.cumulative.len() => return self.end(),
            index => index - 1,
        };

        let segment_start = self.cumulative[segment];
        let segment_length = self.cumulative[segment + 1] - segment_start;
        if segment_length <= 0.0 {
            return self.waypoints[segment];
        }

        let t = (distance - segment_start) / segment_length;
        self.waypoints[segment].lerp(self.waypoints[segment + 1], t)
    }

    /// Unit tangent direction of travel at a progress fraction.
    ///
    /// Sampled over a small progress window so callers get a stable direction
    /// even exactly on a waypoint.
    #[must_use]
    pub fn direction_at(&self, progress: f32) -> Vec2 {
        const SAMPLE_DELTA: f32 = 1.0e-3;
        let progress = progress.clamp(0.0, 1.0);
        let (before, after) = if progress + SAMPLE_DELTA <= 1.0 {
            (progress, progress + SAMPLE_DELTA)
        } else {
            (progress - SAMPLE_DELTA, progress)
        };

        let delta = self.position_at(after) - self.position_at(before);
        delta.normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::Lane;
    use glam::Vec2;

    fn l_shaped_lane() -> Lane {
        Lane::from_waypoints(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(100.0, 0.0),
            Vec2::new(100.0, 50.0),
        ])
        .expect("valid lane")
    }

    #[test]
    fn rejects_degenerate_waypoint_sets() {
        assert!(Lane::from_waypoints(Vec::new()).is_none());
        assert!(Lane::from_waypoints(vec![Vec2::ZERO]).is_none());
        assert!(Lane::from_waypoints(vec![Vec2::ZERO, Vec2::ZERO]).is_none());
    }

    #[test]
    fn arc_length_sums_segments() {
        let lane = l_shaped_lane();
        assert!((lane.total_length() - 150.0).abs() < f32::EPSILON);
    }

    #[test]
    fn position_interpolates_across_segments() {
        let lane = l_shaped_lane();
        assert_eq!(lane.position_at(0.0), Vec2::new(0.0, 0.0));
        assert_eq!(lane.position_at(1.0), Vec2::new(100.0, 50.0));
        // 1/3 of 150 units lands halfway down the first segment.
        let third = lane.position_at(1.0 / 3.0);
        assert!((third.x - 50.0).abs() < 1.0e-3);
        assert!(third.y.abs() < 1.0e-3);
        // 5/6 of 150 units lands halfway up the second segment.
        let five_sixths = lane.position_at(5.0 / 6.0);
        assert!((five_sixths.x - 100.0).abs() < 1.0e-3);
        assert!((five_sixths.y - 25.0).abs() < 1.0e-3);
    }

    #[test]
    fn out_of_range_progress_clamps_to_endpoints() {
        let lane = l_shaped_lane();
        assert_eq!(lane.position_at(-0.5), lane.start());
        assert_eq!(lane.position_at(1.5), lane.end());
    }

    #[test]
    fn direction_tracks_segment_orientation() {
        let lane = l_shaped_lane();
        let early = lane.direction_at(0.1);
        assert!((early.x - 1.0).abs() < 1.0e-3);
        let late = lane.direction_at(0.9);
        assert!((late.y - 1.0).abs() < 1.0e-3);
    }

    #[test]
    fn direction_is_stable_at_lane_end() {
        let lane = l_shaped_lane();
        let end = lane.direction_at(1.0);
        assert!((end.y - 1.0).abs() < 1.0e-2);
    }
}
