//! Synthetic data generation for benchmark batches.
//!
//! Content is random on every call (the thread RNG is never seeded); only the
//! shape is fixed: every project carries exactly one owner and one sprint, and
//! every string field has a fixed length.

use crate::models::{Project, Sprint, User};
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::time::{SystemTime, UNIX_EPOCH};

pub const NAME_LEN: usize = 10;
pub const IDENTIFIER_LEN: usize = 48;
pub const INVITE_CODE_LEN: usize = 128;
pub const OWNER_FIELD_LEN: usize = 10;

pub const MIN_SPRINT_DURATION: i32 = 1;
pub const MAX_SPRINT_DURATION: i32 = 100;

/// Lower bound for generated timestamps: three 365-day years past the epoch.
pub const TIMESTAMP_FLOOR: i64 = 3 * 365 * 24 * 60 * 60;

/// Generates `count` projects using the thread RNG and the current time.
pub fn generate_projects(count: usize) -> Vec<Project> {
    generate_projects_with(&mut rand::thread_rng(), count, unix_now())
}

/// Generates `count` projects from `rng`; timestamps fall in `[TIMESTAMP_FLOOR, now)`.
pub fn generate_projects_with<R: Rng + ?Sized>(rng: &mut R, count: usize, now: i64) -> Vec<Project> {
    (0..count).map(|_| generate_project(rng, now)).collect()
}

fn generate_project<R: Rng + ?Sized>(rng: &mut R, now: i64) -> Project {
    Project {
        name: random_string(rng, NAME_LEN),
        identifier: random_string(rng, IDENTIFIER_LEN),
        invite_code: random_string(rng, INVITE_CODE_LEN),
        sprint_duration: rng.gen_range(MIN_SPRINT_DURATION..=MAX_SPRINT_DURATION),
        owner: User {
            username: random_string(rng, OWNER_FIELD_LEN),
            first_name: random_string(rng, OWNER_FIELD_LEN),
            last_name: random_string(rng, OWNER_FIELD_LEN),
        },
        sprints: vec![Sprint {
            name: random_string(rng, NAME_LEN),
            start_date: random_timestamp(rng, now),
            end_date: random_timestamp(rng, now),
        }],
    }
}

/// Fixed-length string drawn from `[A-Za-z0-9]`.
pub fn random_string<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Uniform epoch timestamp in `[TIMESTAMP_FLOOR, now)`.
///
/// A clock at or before the floor collapses the range to the floor itself.
pub fn random_timestamp<R: Rng + ?Sized>(rng: &mut R, now: i64) -> i64 {
    if now <= TIMESTAMP_FLOOR {
        return TIMESTAMP_FLOOR;
    }
    rng.gen_range(TIMESTAMP_FLOOR..now)
}

/// Current time in epoch seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(TIMESTAMP_FLOOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn is_alphanumeric(s: &str) -> bool {
        s.chars().all(|c| c.is_ascii_alphanumeric())
    }

    #[test]
    fn produces_requested_count_with_one_owner_and_sprint() {
        for count in [0usize, 1, 7, 250] {
            let projects = generate_projects(count);
            assert_eq!(projects.len(), count);
            for project in &projects {
                assert_eq!(project.sprints.len(), 1);
                assert_eq!(project.owner.username.len(), OWNER_FIELD_LEN);
            }
        }
    }

    #[test]
    fn string_fields_have_fixed_lengths_and_charset() {
        for project in generate_projects(200) {
            assert_eq!(project.name.len(), NAME_LEN);
            assert_eq!(project.identifier.len(), IDENTIFIER_LEN);
            assert_eq!(project.invite_code.len(), INVITE_CODE_LEN);
            assert_eq!(project.owner.first_name.len(), OWNER_FIELD_LEN);
            assert_eq!(project.owner.last_name.len(), OWNER_FIELD_LEN);
            assert_eq!(project.sprints[0].name.len(), NAME_LEN);

            for field in [
                &project.name,
                &project.identifier,
                &project.invite_code,
                &project.owner.username,
                &project.owner.first_name,
                &project.owner.last_name,
                &project.sprints[0].name,
            ] {
                assert!(is_alphanumeric(field), "non-alphanumeric field: {field}");
            }
        }
    }

    #[test]
    fn sprint_durations_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let projects = generate_projects_with(&mut rng, 5_000, unix_now());
        assert!(projects
            .iter()
            .all(|p| (MIN_SPRINT_DURATION..=MAX_SPRINT_DURATION).contains(&p.sprint_duration)));
        // Both bounds are reachable with this many draws.
        assert!(projects.iter().any(|p| p.sprint_duration == MIN_SPRINT_DURATION));
        assert!(projects.iter().any(|p| p.sprint_duration == MAX_SPRINT_DURATION));
    }

    #[test]
    fn timestamps_fall_between_floor_and_now() {
        let now = unix_now();
        for project in generate_projects(1_000) {
            for sprint in &project.sprints {
                assert!((TIMESTAMP_FLOOR..=now).contains(&sprint.start_date));
                assert!((TIMESTAMP_FLOOR..=now).contains(&sprint.end_date));
            }
        }
    }

    #[test]
    fn clock_before_floor_pins_timestamps_to_floor() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(random_timestamp(&mut rng, 0), TIMESTAMP_FLOOR);
        assert_eq!(random_timestamp(&mut rng, TIMESTAMP_FLOOR), TIMESTAMP_FLOOR);
    }

    #[test]
    fn unseeded_batches_differ() {
        let a = generate_projects(3);
        let b = generate_projects(3);
        assert_ne!(a, b);
    }
}
