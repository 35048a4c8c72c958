mod common;

use approx::assert_relative_eq;
use common::{body_offset, init, spawn, wheel_at, MockHost, MockSolver, BASE_HEIGHT, TRAVEL};
use fourwheel_control::{
    pose::PoseParameter, Buttons, CalibrationError, ControllerError, EffectIntent,
    ParameterError, RawCommand, SolverError, TickPhase, VehicleDescriptor, WheelIndex,
};

const DT: f64 = 0.1;

fn command(buttons: Buttons) -> RawCommand {
    RawCommand::new(buttons, DT)
}

fn count(effects: &[EffectIntent], intent: EffectIntent) -> usize {
    effects.iter().filter(|effect| **effect == intent).count()
}

#[test]
fn spawn_calibrates_suspension() {
    let (controller, _solver, host) = spawn();

    let calibration = controller.calibration();
    assert!(calibration.is_complete());
    let wheel = calibration.wheel(WheelIndex::RearLeft);
    assert_relative_eq!(wheel.base_height, BASE_HEIGHT);
    assert_relative_eq!(wheel.travel, TRAVEL);

    let axle = &controller.parameters().axles()[1];
    assert_relative_eq!(axle.spring.additional_length, TRAVEL);
    assert!(host.invalidations >= 3);
    assert_eq!(host.value(PoseParameter::WheelHeight(WheelIndex::FrontLeft)), Some(0.0));
    assert_eq!(host.value(PoseParameter::Speedometer), Some(0.0));

    // parked until someone drives
    assert!(controller.controls().handbrake);
    assert!(!controller.is_on());
}

#[test]
fn missing_attachment_still_spawns() {
    let mut solver = MockSolver::default();
    let mut host = MockHost {
        missing: vec!["wheel_fr"],
        ..Default::default()
    };
    let controller = init().build(&mut solver, &mut host).unwrap();

    assert_eq!(
        controller.calibration().errors(),
        &[CalibrationError::MissingAttachment { name: "wheel_fr" }]
    );
    let front = &controller.parameters().axles()[0];
    assert_relative_eq!(front.offset.x, 30.0);
    assert_relative_eq!(front.spring.additional_length, 0.0);
    assert_relative_eq!(
        controller.calibration().wheel(WheelIndex::FrontLeft).travel,
        1.0
    );
}

#[test]
fn wrong_wheel_count_is_rejected_and_cleaned_up() {
    let mut solver = MockSolver {
        wheel_count: 3,
        ..Default::default()
    };
    let mut host = MockHost::default();
    let err = init().build(&mut solver, &mut host).unwrap_err();

    assert!(matches!(
        err,
        ControllerError::Solver(SolverError::WheelCount(3))
    ));
    assert_eq!(solver.destroyed, solver.created);
}

#[test]
fn solver_refusal_propagates() {
    let mut solver = MockSolver {
        fail_create: true,
        ..Default::default()
    };
    let err = init()
        .build(&mut solver, &mut MockHost::default())
        .unwrap_err();
    assert!(matches!(
        err,
        ControllerError::Solver(SolverError::CreateFailed(_))
    ));
}

#[test]
fn invalid_descriptor_fails_before_solver() {
    let mut solver = MockSolver::default();
    let mut spawn = init();
    spawn.descriptor = VehicleDescriptor {
        axles: spawn.descriptor.axles[..1].to_vec(),
        ..spawn.descriptor
    };
    let err = spawn.build(&mut solver, &mut MockHost::default()).unwrap_err();
    assert!(matches!(
        err,
        ControllerError::Parameters(ParameterError::AxleCount(1))
    ));
    assert!(solver.created.is_empty());
}

#[test]
fn zero_throttle_time_reaches_max_in_one_tick() {
    let (mut controller, mut solver, mut host) = spawn();
    controller.turn_on(&solver);

    let output = controller.tick(&mut solver, &mut host, &command(Buttons::ACCELERATE));
    assert_relative_eq!(output.controls.throttle, 1.0);
    assert_eq!(output.controls.brake, 0.0);
    assert!(!output.controls.handbrake);
    assert_eq!(solver.steps.len(), 1);
    assert_relative_eq!(solver.steps[0].throttle, 1.0);

    controller.set_max_throttle(0.6);
    let output = controller.tick(&mut solver, &mut host, &command(Buttons::ACCELERATE));
    assert_relative_eq!(output.controls.throttle, 0.6);
}

#[test]
fn released_inputs_settle_to_zero() {
    let (mut controller, mut solver, mut host) = spawn();
    controller.turn_on(&solver);

    for _ in 0..10 {
        controller.tick(
            &mut solver,
            &mut host,
            &command(Buttons::ACCELERATE | Buttons::TURN_LEFT),
        );
    }
    assert!(controller.controls().steering < -0.9);

    let mut output = None;
    for _ in 0..5 {
        output = Some(controller.tick(&mut solver, &mut host, &command(Buttons::empty())));
    }
    let controls = output.unwrap().controls;
    assert_eq!(controls.throttle, 0.0);
    assert_eq!(controls.brake, 0.0);
    assert_eq!(controls.steering, 0.0);
}

#[test]
fn reversing_against_motion_brakes() {
    let (mut controller, mut solver, mut host) = spawn();
    solver.set_speed(20.0);

    let output = controller.tick(&mut solver, &mut host, &command(Buttons::REVERSE));
    assert_eq!(output.controls.throttle, 0.0);
    assert_relative_eq!(output.controls.brake, 0.15);
    assert!(output.controls.brake_pedal);

    solver.set_speed(0.0);
    let output = controller.tick(&mut solver, &mut host, &command(Buttons::REVERSE));
    assert_relative_eq!(output.controls.throttle, -1.0);
    assert_eq!(output.controls.brake, 0.0);
}

#[test]
fn throttle_reduction_scales_target() {
    let (mut controller, mut solver, mut host) = spawn();
    controller.add_throttle_reduction(0.25);
    controller.add_throttle_reduction(0.25);
    let output = controller.tick(&mut solver, &mut host, &command(Buttons::ACCELERATE));
    assert_relative_eq!(output.controls.throttle, 0.5);

    controller.remove_throttle_reduction(2.0);
    let output = controller.tick(&mut solver, &mut host, &command(Buttons::ACCELERATE));
    assert_relative_eq!(output.controls.throttle, 1.0);
}

#[test]
fn analog_side_move_steers_directly() {
    let (mut controller, mut solver, mut host) = spawn();
    let cmd = RawCommand::new(Buttons::empty(), DT).with_side_move(400.0);
    let output = controller.tick(&mut solver, &mut host, &cmd);
    assert_relative_eq!(output.controls.steering, 1.0);
    assert_relative_eq!(output.pose.steer, 1.0);
    assert_relative_eq!(output.pose.steer_angle_degrees, 50.0);

    let cmd = RawCommand::new(Buttons::empty(), DT).with_side_move(-200.0);
    let output = controller.tick(&mut solver, &mut host, &cmd);
    assert_relative_eq!(output.controls.steering, -0.5);
}

#[test]
fn sampling_before_step_freezes_pose() {
    let (mut controller, mut solver, mut host) = spawn();
    let first = controller.tick(&mut solver, &mut host, &command(Buttons::empty()));
    assert_eq!(controller.phase(), TickPhase::Sampled);

    solver.wheels[0] = wheel_at(WheelIndex::FrontLeft, BASE_HEIGHT - TRAVEL, 0.0);

    // nothing shaped or stepped yet
    let frozen = controller.sample(&solver, &mut host);
    assert_eq!(frozen.pose, first.pose);

    controller.shape_controls(&solver, &command(Buttons::empty()));
    let frozen = controller.sample(&solver, &mut host);
    assert_eq!(frozen.pose, first.pose);
    assert_eq!(controller.phase(), TickPhase::Shaped);

    controller.mark_stepped();
    let fresh = controller.sample(&solver, &mut host);
    assert_relative_eq!(fresh.pose.wheel_height[0], 1.0);
}

#[test]
fn suspension_pose_follows_solver_wheels() {
    let (mut controller, mut solver, mut host) = spawn();
    let moved = body_offset(100.0);
    solver.body = moved;
    solver.wheels[0] = moved * wheel_at(WheelIndex::FrontLeft, 8.0, 30.0);
    solver.wheels[3] = moved * wheel_at(WheelIndex::RearRight, -50.0, 0.0);

    let output = controller.tick(&mut solver, &mut host, &command(Buttons::empty()));
    assert_relative_eq!(output.pose.wheel_height[0], 0.5, epsilon = 1e-9);
    assert_relative_eq!(output.pose.wheel_spin[0], -30.0, epsilon = 1e-9);
    assert_relative_eq!(output.pose.wheel_height[3], 1.0);
    assert_relative_eq!(output.pose.wheel_height[1], 0.0, epsilon = 1e-9);

    let height = host
        .value(PoseParameter::WheelHeight(WheelIndex::FrontLeft))
        .unwrap();
    assert_relative_eq!(height, 0.5, epsilon = 1e-9);
    assert_relative_eq!(controller.wheels()[0].position.x, 130.0, epsilon = 1e-9);
    assert!(controller.wheels().iter().all(|w| (0.0..=1.0).contains(&w.height)));
}

#[test]
fn speedometer_only_while_powered_on() {
    let (mut controller, mut solver, mut host) = spawn();
    solver.set_speed(50.0);

    let output = controller.tick(&mut solver, &mut host, &command(Buttons::empty()));
    assert_eq!(output.pose.speedometer, None);
    assert_eq!(output.telemetry.display_speed, 50);

    controller.turn_on(&solver);
    let output = controller.tick(&mut solver, &mut host, &command(Buttons::empty()));
    assert_eq!(output.pose.speedometer, Some(0.5));
    assert_eq!(host.value(PoseParameter::Speedometer), Some(0.5));
}

#[test]
fn disabled_engine_parks_and_refuses_start() {
    let (mut controller, mut solver, mut host) = spawn();
    controller.set_engine_disabled(&mut solver, true);
    assert!(controller.is_engine_disabled(&solver));
    assert!(!controller.turn_on(&solver));

    let output = controller.tick(
        &mut solver,
        &mut host,
        &command(Buttons::ACCELERATE | Buttons::BOOST),
    );
    assert_eq!(output.controls.throttle, 0.0);
    assert!(output.controls.handbrake);
    assert!(!output.controls.boost);
    assert!(!output.telemetry.throttle_down);
}

#[test]
fn turn_off_resets_controls() {
    let (mut controller, mut solver, mut host) = spawn();
    controller.turn_on(&solver);
    controller.tick(
        &mut solver,
        &mut host,
        &command(Buttons::ACCELERATE | Buttons::TURN_RIGHT),
    );
    controller.turn_off();

    let controls = controller.controls();
    assert!(controls.handbrake);
    assert_eq!(controls.throttle, 0.0);
    assert_eq!(controls.steering, 0.0);
    assert!(!controller.is_on());
}

#[test]
fn turn_off_drops_running_cues() {
    let (mut controller, mut solver, mut host) = spawn();
    controller.turn_on(&solver);
    solver.set_speed(100.0);
    solver.operating.skid_speed = 20.0;

    controller.tick(
        &mut solver,
        &mut host,
        &command(Buttons::ACCELERATE | Buttons::BOOST),
    );
    assert!(controller.is_skidding());
    assert!(controller.is_boost_cue_active());
    assert!(controller.throttle_activity().is_down());

    controller.turn_off();
    assert!(!controller.is_skidding());
    assert!(!controller.is_boost_cue_active());
    assert!(!controller.throttle_activity().is_down());
}

#[test]
fn zero_length_tick_keeps_steering_centred() {
    let (mut controller, mut solver, mut host) = spawn();
    let cmd = RawCommand::new(Buttons::TURN_LEFT, 0.0);
    let output = controller.tick(&mut solver, &mut host, &cmd);
    assert_eq!(output.controls.steering, 0.0);
}

#[test]
fn fast_reversing_vehicle_skids_at_base_threshold() {
    let (mut controller, mut solver, mut host) = spawn();
    controller.turn_on(&solver);
    solver.operating.skid_speed = 12.0;

    // going forward this needs 15
    solver.set_speed(100.0);
    let output = controller.tick(&mut solver, &mut host, &command(Buttons::empty()));
    assert_eq!(count(&output.effects, EffectIntent::SkidStart), 0);

    solver.set_speed(-100.0);
    let output = controller.tick(&mut solver, &mut host, &command(Buttons::empty()));
    assert_eq!(count(&output.effects, EffectIntent::SkidStart), 1);
}

#[test]
fn vehicle_without_booster_never_cues() {
    let mut solver = MockSolver::default();
    let mut host = MockHost::default();
    let mut spawn = init();
    spawn.descriptor.engine.boost_delay = 0.0;
    let mut controller = spawn.build(&mut solver, &mut host).unwrap();
    controller.turn_on(&solver);

    let output = controller.tick(&mut solver, &mut host, &command(Buttons::BOOST));
    assert_eq!(count(&output.effects, EffectIntent::BoostStart), 0);
    assert!(!output.telemetry.boost_cue_active);
    assert!(!output.telemetry.has_boost);
}

#[test]
fn brief_boost_press_keeps_cue() {
    let (mut controller, mut solver, mut host) = spawn();
    controller.turn_on(&solver);
    solver.operating.boost_delay = 15.0;

    let output = controller.tick(&mut solver, &mut host, &command(Buttons::BOOST));
    assert_eq!(count(&output.effects, EffectIntent::BoostStart), 1);
    assert!(output.telemetry.boost_cue_active);
    assert!(!output.telemetry.physically_boosting);
    assert!(output.telemetry.has_boost);

    for tick in 1..=27 {
        let output = controller.tick(&mut solver, &mut host, &command(Buttons::empty()));
        assert!(output.telemetry.boost_cue_active, "cue ended at tick {tick}");
        assert_eq!(count(&output.effects, EffectIntent::BoostStart), 0);
    }
    for _ in 0..3 {
        controller.tick(&mut solver, &mut host, &command(Buttons::empty()));
    }
    assert!(!controller.is_boost_cue_active());
}

#[test]
fn skid_emits_start_dust_and_one_stop() {
    let (mut controller, mut solver, mut host) = spawn();
    controller.turn_on(&solver);
    solver.set_speed(100.0);
    solver.operating.skid_speed = 20.0;

    let output = controller.tick(&mut solver, &mut host, &command(Buttons::empty()));
    assert_eq!(count(&output.effects, EffectIntent::SkidStart), 1);
    assert!(output.telemetry.skidding);
    let contact = solver.contacts[2];
    assert!(output.effects.contains(&EffectIntent::WheelDust {
        wheel: WheelIndex::RearLeft,
        position: contact,
        scale: 1.0,
    }));

    solver.operating.skid_speed = 12.0;
    let output = controller.tick(&mut solver, &mut host, &command(Buttons::empty()));
    assert_eq!(count(&output.effects, EffectIntent::SkidStart), 0);
    assert!(output.telemetry.skidding);

    solver.operating.skid_speed = 5.0;
    let output = controller.tick(&mut solver, &mut host, &command(Buttons::empty()));
    assert_eq!(count(&output.effects, EffectIntent::SkidStop), 1);
    assert!(!output.telemetry.skidding);

    let output = controller.tick(&mut solver, &mut host, &command(Buttons::empty()));
    assert_eq!(count(&output.effects, EffectIntent::SkidStop), 0);
}

#[test]
fn carried_body_emits_no_ground_effects() {
    let (mut controller, mut solver, mut host) = spawn();
    controller.turn_on(&solver);
    solver.carried = true;
    solver.set_speed(100.0);
    solver.operating.skid_speed = 50.0;

    let output = controller.tick(&mut solver, &mut host, &command(Buttons::empty()));
    assert!(output.effects.is_empty());
    assert!(!controller.is_skidding());
}

#[test]
fn fast_vehicle_kicks_up_dust() {
    let (mut controller, mut solver, mut host) = spawn();
    controller.turn_on(&solver);
    solver.set_speed(-17.5);

    let output = controller.tick(&mut solver, &mut host, &command(Buttons::empty()));
    let scales: Vec<f64> = output
        .effects
        .iter()
        .filter_map(|effect| match effect {
            EffectIntent::WheelDust { scale, .. } => Some(*scale),
            _ => None,
        })
        .collect();
    assert_eq!(scales.len(), 4);
    // display speed 17 between 5 and 30
    assert_relative_eq!(scales[0], 12.0 / 25.0);
}

#[test]
fn action_accumulates() {
    let (mut controller, mut solver, mut host) = spawn();
    controller.set_action(2.0);
    for _ in 0..3 {
        controller.tick(&mut solver, &mut host, &command(Buttons::empty()));
    }
    let action = host.value(PoseParameter::Action).unwrap();
    assert_relative_eq!(action, 0.6, epsilon = 1e-9);
}

#[test]
fn teleport_carries_wheels() {
    let (mut controller, mut solver, _host) = spawn();
    let before = solver.wheels[1].translation.vector;
    controller.teleport(&mut solver, &body_offset(-40.0));
    assert_relative_eq!(solver.wheels[1].translation.vector.x, before.x - 40.0);
    assert_relative_eq!(solver.wheels[1].translation.vector.z, before.z);
}

#[test]
fn motion_toggles_every_wheel() {
    let (mut controller, mut solver, _host) = spawn();
    controller.disable_motion(&mut solver);
    assert_eq!(solver.motion, [false; 4]);
    controller.enable_motion(&mut solver);
    assert_eq!(solver.motion, [true; 4]);
}

#[test]
fn booster_reports_remaining_time() {
    let (mut controller, mut solver, _host) = spawn();
    solver.booster_left = 0.25;
    assert!(controller.update_booster(&mut solver, 0.1));
    assert!(!controller.update_booster(&mut solver, 0.2));
}

#[test]
fn release_destroys_vehicle_once() {
    let (mut controller, mut solver, mut host) = spawn();
    let last = controller.tick(&mut solver, &mut host, &command(Buttons::empty()));

    controller.release(&mut solver);
    controller.release(&mut solver);
    assert!(controller.is_released());
    assert_eq!(solver.destroyed.len(), 1);

    let steps = solver.steps.len();
    let output = controller.tick(&mut solver, &mut host, &command(Buttons::ACCELERATE));
    assert_eq!(solver.steps.len(), steps);
    assert_eq!(output.pose, last.pose);
    assert!(!controller.update_booster(&mut solver, DT));
}

#[test]
fn offline_solver_keeps_last_known_state() {
    let (mut controller, mut solver, mut host) = spawn();
    solver.set_speed(12.0);
    solver.wheels[2] = wheel_at(WheelIndex::RearLeft, 9.0, 0.0);
    let before = controller.tick(&mut solver, &mut host, &command(Buttons::empty()));

    solver.online = false;
    let after = controller.tick(&mut solver, &mut host, &command(Buttons::empty()));
    assert_eq!(after.pose.wheel_height, before.pose.wheel_height);
    assert_relative_eq!(after.telemetry.speed, 12.0);
}
