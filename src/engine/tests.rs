//! Scenario tests for the park engine.

use super::*;
use crate::model::{Battery, Position, RobotState, Vehicle, VehicleState, Voltage};

/// A park without random arrivals.
fn quiet_config(n_robots: usize) -> ParkConfig {
    ParkConfig {
        n_robots,
        arrival_probability: 0.0,
        ..ParkConfig::default()
    }
}

/// A park under heavy arrival pressure.
fn busy_config(seed: u64) -> ParkConfig {
    ParkConfig {
        n_robots: 2,
        arrival_probability: 0.05,
        seed,
        ..ParkConfig::default()
    }
}

fn vehicle(id: u32, spot: Position, deadline: f64, soc: f64, required: f64) -> Vehicle {
    let battery = Battery::new(Voltage::V800, 80.0, soc).unwrap();
    Vehicle::new(id, spot, deadline, battery, required).unwrap()
}

fn centre(env: &ParkEnv) -> Position {
    env.station().location
}

/// Sends every dispatchable robot to the first waiting vehicle it can serve.
fn dispatch_first_fit(env: &mut ParkEnv) {
    for robot in 0..env.robots().len() {
        let waiting: Vec<_> = env.needs_charge().to_vec();
        for id in waiting {
            if env.assign(robot, id).is_ok() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod construction {
    use super::*;

    #[test]
    fn test_new_env_is_empty() {
        let env = ParkEnv::new(ParkConfig::default()).unwrap();
        let status = env.status();
        assert_eq!(status.time.value(), 0.0);
        assert_eq!(status.robots.len(), 4);
        assert_eq!(status.active_vehicles(), 0);
        assert_eq!(status.station_soc, vec![100.0; 3]);
        assert!(status.robots.iter().all(|r| r.state == RobotState::Available));
    }

    #[test]
    fn test_robots_dock_at_station() {
        let env = ParkEnv::from_scale(MapScale::Medium, 7).unwrap();
        assert_eq!(centre(&env), Position::new(100.0, 100.0));
        assert!(env.robots().iter().all(|r| r.position == centre(&env)));
        assert_eq!(env.robots().len(), 16);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let cfg = ParkConfig {
            n_batteries: 0,
            ..ParkConfig::default()
        };
        assert_eq!(
            ParkEnv::new(cfg).unwrap_err(),
            ConfigError::ZeroCount("n_batteries")
        );
    }

    #[test]
    fn test_invalid_profile_rejected() {
        let profile = VehicleProfile {
            stay_minutes: (90.0, 20.0, (120.0, -5.0)),
            ..VehicleProfile::default()
        };
        assert!(matches!(
            ParkEnv::with_profile(ParkConfig::default(), &profile),
            Err(ConfigError::InvalidRange { field: "stay_minutes", .. })
        ));
    }

    #[test]
    fn test_invalid_tick_length_is_ignored() {
        let mut env = ParkEnv::new(busy_config(1)).unwrap();
        env.step();
        let before = env.status();
        for dt in [f64::NAN, -10.0, f64::INFINITY] {
            env.update(dt);
        }
        assert_eq!(env.status(), before);
        env.update(0.0);
        assert_eq!(env.time().value(), before.time.value());
    }

    #[test]
    fn test_run_ids_are_unique() {
        let a = ParkEnv::new(ParkConfig::default()).unwrap();
        let b = ParkEnv::new(ParkConfig::default()).unwrap();
        assert_ne!(a.run_id(), b.run_id());
    }
}

#[cfg(test)]
mod arrivals {
    use super::*;

    #[test]
    fn test_no_arrivals_at_zero_probability() {
        let mut env = ParkEnv::new(quiet_config(1)).unwrap();
        for _ in 0..200 {
            env.step();
        }
        assert!(env.vehicles().is_empty());
    }

    #[test]
    fn test_admission_respects_capacity() {
        let cfg = ParkConfig {
            max_vehicles: 3,
            arrival_probability: 0.1,
            ..ParkConfig::default()
        };
        let mut env = ParkEnv::new(cfg).unwrap();
        for _ in 0..10 {
            env.step();
            assert!(env.active_vehicles() <= 3);
        }
        assert_eq!(env.needs_charge().len(), 3);
        let ids: Vec<u32> = env.vehicles().iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = ParkEnv::new(busy_config(11)).unwrap();
        let mut b = ParkEnv::new(busy_config(11)).unwrap();
        for _ in 0..300 {
            dispatch_first_fit(&mut a);
            dispatch_first_fit(&mut b);
            a.step();
            b.step();
            assert_eq!(a.status(), b.status());
        }
    }
}

#[cfg(test)]
mod dispatch {
    use super::*;

    fn env_with_waiting_vehicle() -> (ParkEnv, usize) {
        let mut env = ParkEnv::new(quiet_config(2)).unwrap();
        let spot = Position::new(centre(&env).x + 10.0, centre(&env).y);
        let id = env.add_vehicle(vehicle(1, spot, 1000.0, 20.0, 80.0));
        (env, id)
    }

    #[test]
    fn test_assign_moves_vehicle_to_charging() {
        let (mut env, id) = env_with_waiting_vehicle();
        env.assign(0, id).unwrap();
        assert!(env.needs_charge().is_empty());
        assert_eq!(env.charging(), &[id]);
        assert_eq!(env.robots()[0].state(), RobotState::GoToVehicle);
        assert_eq!(env.robots()[0].target(), Some(id));
        assert_eq!(env.vehicle(id).unwrap().state(), VehicleState::Charging);
        env.check_invariants().unwrap();
    }

    #[test]
    fn test_unknown_handles_rejected() {
        let (mut env, id) = env_with_waiting_vehicle();
        assert_eq!(env.assign(9, id), Err(DispatchError::UnknownRobot(9)));
        assert_eq!(env.assign(0, 42), Err(DispatchError::UnknownVehicle(42)));
        assert_eq!(env.needs_charge(), &[id]);
    }

    #[test]
    fn test_vehicle_cannot_be_assigned_twice() {
        let (mut env, id) = env_with_waiting_vehicle();
        env.assign(0, id).unwrap();
        assert_eq!(env.assign(1, id), Err(DispatchError::VehicleNotWaiting(1)));
        assert_eq!(env.robots()[1].state(), RobotState::Available);
        assert_eq!(env.charging(), &[id]);
    }

    #[test]
    fn test_busy_robot_rejected() {
        let (mut env, id) = env_with_waiting_vehicle();
        let spot = Position::new(0.0, 0.0);
        let other = env.add_vehicle(vehicle(2, spot, 1000.0, 20.0, 80.0));
        env.assign(0, id).unwrap();
        assert_eq!(env.assign(0, other), Err(DispatchError::RobotBusy(1)));
        assert_eq!(env.needs_charge(), &[other]);
    }

    #[test]
    fn test_single_robot_completes_vehicle_before_deadline() {
        let mut env = ParkEnv::new(quiet_config(1)).unwrap();
        let spot = Position::new(centre(&env).x + 10.0, centre(&env).y);
        let id = env.add_vehicle(vehicle(1, spot, 1000.0, 20.0, 80.0));
        env.assign(0, id).unwrap();

        env.step();
        assert_eq!(env.robots()[0].state(), RobotState::Discharging);
        assert_eq!(env.robots()[0].position, spot);

        let mut ticks = 1;
        while env.vehicle(id).unwrap().state() == VehicleState::Charging && ticks < 200 {
            env.step();
            env.check_invariants().unwrap();
            ticks += 1;
        }
        let v = env.vehicle(id).unwrap();
        assert_eq!(v.state(), VehicleState::Completed);
        assert!(env.time().value() <= 1000.0);
        assert!(v.soc() >= 80.0);
        assert_eq!(env.completed(), &[id]);
        assert_eq!(env.robots()[0].state(), RobotState::Available);
        assert_eq!(env.robots()[0].target(), None);
    }

    #[test]
    fn test_zero_deadline_fails_while_charging() {
        let mut env = ParkEnv::new(quiet_config(1)).unwrap();
        let id = env.add_vehicle(vehicle(1, centre(&env), 0.0, 20.0, 80.0));
        env.assign(0, id).unwrap();
        env.step();
        assert_eq!(env.vehicle(id).unwrap().state(), VehicleState::Failed);
        assert_eq!(env.failed(), &[id]);
        assert!(env.charging().is_empty());
        assert_ne!(env.robots()[0].state(), RobotState::Discharging);
        env.check_invariants().unwrap();
    }

    #[test]
    fn test_waiting_vehicle_times_out() {
        let mut env = ParkEnv::new(quiet_config(1)).unwrap();
        let id = env.add_vehicle(vehicle(1, centre(&env), 25.0, 20.0, 80.0));
        env.step();
        env.step();
        assert_eq!(env.needs_charge(), &[id]);
        env.step();
        assert_eq!(env.failed(), &[id]);
        assert_eq!(env.vehicle(id).unwrap().wait_time, 30.0);
    }
}

#[cfg(test)]
mod invariants {
    use super::*;

    #[test]
    fn test_list_membership_holds_every_tick() {
        for seed in 0..5 {
            let mut env = ParkEnv::new(busy_config(seed)).unwrap();
            for _ in 0..2000 {
                dispatch_first_fit(&mut env);
                env.step();
                env.check_invariants().unwrap();
            }
            let summary = env.run_summary();
            assert_eq!(
                summary.completed + summary.failed + summary.pending,
                env.vehicles().len()
            );
        }
    }

    #[test]
    fn test_depleted_robots_swap_at_station() {
        let mut env = ParkEnv::new(busy_config(3)).unwrap();
        let mut swapped = false;
        for _ in 0..3000 {
            dispatch_first_fit(&mut env);
            env.step();
            swapped |= env
                .robots()
                .iter()
                .any(|r| r.state() == RobotState::Swapping);
        }
        assert!(swapped);
        env.check_invariants().unwrap();
    }

    #[test]
    fn test_status_is_idempotent() {
        let mut env = ParkEnv::new(busy_config(5)).unwrap();
        for _ in 0..100 {
            dispatch_first_fit(&mut env);
            env.step();
            let first = env.status();
            assert_eq!(first, env.status());
        }
    }

    #[test]
    fn test_injected_terminal_vehicle_lands_on_its_list() {
        let mut env = ParkEnv::new(quiet_config(1)).unwrap();
        let mut v = vehicle(7, centre(&env), 0.0, 20.0, 80.0);
        v.update(1.0);
        env.add_vehicle(v);
        env.check_invariants().unwrap();
        assert_eq!(env.failed().len(), 1);
    }
}

#[cfg(test)]
mod snapshots {
    use super::*;

    fn run(env: &mut ParkEnv, ticks: usize) -> Vec<Status> {
        (0..ticks)
            .map(|_| {
                dispatch_first_fit(env);
                env.step();
                env.status()
            })
            .collect()
    }

    #[test]
    fn test_restore_replays_identically() {
        let mut env = ParkEnv::new(busy_config(21)).unwrap();
        run(&mut env, 100);
        let snapshot = env.snapshot();
        let first = run(&mut env, 200);
        env.restore(&snapshot);
        let second = run(&mut env, 200);
        assert_eq!(first, second);
    }

    #[test]
    fn test_restore_rewinds_clock_and_keeps_run_id() {
        let mut env = ParkEnv::new(busy_config(2)).unwrap();
        let run_id = env.run_id().to_string();
        let snapshot = env.snapshot();
        run(&mut env, 50);
        env.restore(&snapshot);
        assert_eq!(env.time().value(), 0.0);
        assert!(env.vehicles().is_empty());
        assert_eq!(env.run_id(), run_id);
    }

    #[test]
    fn test_reseed_changes_arrivals() {
        let mut a = ParkEnv::new(busy_config(1)).unwrap();
        let mut b = ParkEnv::new(busy_config(1)).unwrap();
        b.reseed(99);
        run(&mut a, 100);
        run(&mut b, 100);
        let spots = |env: &ParkEnv| env.vehicles().iter().map(|v| v.spot).collect::<Vec<_>>();
        assert_ne!(spots(&a), spots(&b));
    }
}

#[cfg(test)]
mod accounting {
    use super::*;

    #[test]
    fn test_terminals_handed_out_once() {
        let mut env = ParkEnv::new(quiet_config(1)).unwrap();
        let failed = env.add_vehicle(vehicle(1, centre(&env), 5.0, 20.0, 80.0));
        let waiting = env.add_vehicle(vehicle(2, centre(&env), 5000.0, 20.0, 80.0));
        assert!(env.take_uncounted_terminals().is_empty());
        env.step();
        assert_eq!(env.take_uncounted_terminals(), vec![failed]);
        assert!(env.take_uncounted_terminals().is_empty());
        assert_eq!(env.needs_charge(), &[waiting]);
    }

    #[test]
    fn test_run_summary_counts_outcomes() {
        let mut env = ParkEnv::new(quiet_config(1)).unwrap();
        env.add_vehicle(vehicle(1, centre(&env), 5.0, 20.0, 80.0));
        env.add_vehicle(vehicle(2, centre(&env), 5000.0, 20.0, 80.0));
        env.step();
        let summary = env.run_summary();
        assert_eq!(summary.elapsed, 10.0);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.completed, 0);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.mean_wait, 10.0);
        assert_eq!(summary.success_rate(), 0.0);
    }
}
