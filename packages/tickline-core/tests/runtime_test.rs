use std::cell::RefCell;
use std::rc::Rc;
use tickline_core::*;

fn create_test_simulator() -> (ManualClock, Simulator<TimerQueue<ManualClock>>) {
    let clock = ManualClock::new();
    let simulator = Simulator::new(TimerQueue::new(clock.clone()), Program::canonical());
    (clock, simulator)
}

/// Advance one millisecond at a time so every action fires at its own deadline.
fn step_to(clock: &ManualClock, simulator: &mut Simulator<TimerQueue<ManualClock>>, until: Millis) {
    while simulator.elapsed() < until {
        clock.advance(1);
        simulator.tick();
    }
}

fn texts(items: &[QueueItem]) -> Vec<&str> {
    items.iter().map(|item| item.text.as_str()).collect()
}

#[test]
fn test_simulator_initialization() {
    let (_clock, simulator) = create_test_simulator();
    assert_eq!(simulator.state(), RunState::Idle);
    assert!(simulator.queues().is_idle());
    assert_eq!(simulator.scheduler().pending_count(), 0);
}

#[test]
fn test_run_pushes_main_immediately() {
    let (clock, mut simulator) = create_test_simulator();
    simulator.run();

    assert_eq!(simulator.state(), RunState::Running);
    assert_eq!(texts(simulator.queues().stack()), vec!["main()"]);
    assert_eq!(simulator.scheduler().pending_count(), 12);

    step_to(&clock, &mut simulator, 500);
    assert_eq!(texts(simulator.queues().stack()), vec!["main()", "loadImage()"]);

    let log = simulator.queues().entries();
    assert_eq!(log[0].message, "main() pushed to call stack");
    assert_eq!(log[0].at_ms, 0);
    assert_eq!(log[1].message, "loadImage() pushed to call stack");
    assert_eq!(log[1].at_ms, 500);
}

#[test]
fn test_pause_freezes_everything_until_resume() {
    let (clock, mut simulator) = create_test_simulator();
    simulator.run();
    step_to(&clock, &mut simulator, 700);

    simulator.pause();
    assert_eq!(simulator.state(), RunState::Paused);
    let frozen = simulator.snapshot();

    clock.set(5000);
    assert_eq!(simulator.tick(), 0);
    let still = simulator.snapshot();
    assert_eq!(still.stack, frozen.stack);
    assert_eq!(still.pending_ops, frozen.pending_ops);
    assert_eq!(still.log, frozen.log);

    simulator.resume();
    assert_eq!(simulator.state(), RunState::Running);

    // 4300ms were spent paused, so the 1000ms step now lands at 5300
    step_to(&clock, &mut simulator, 5299);
    assert!(simulator.queues().pending_ops().is_empty());
    step_to(&clock, &mut simulator, 5300);
    assert_eq!(texts(simulator.queues().pending_ops()), vec!["Image load"]);
    assert_eq!(texts(simulator.queues().stack()), vec!["main()"]);

    let messages: Vec<_> = simulator
        .queues()
        .entries()
        .iter()
        .map(|e| (e.at_ms, e.message.as_str()))
        .collect();
    assert_eq!(
        messages,
        vec![
            (0, "main() pushed to call stack"),
            (500, "loadImage() pushed to call stack"),
            (700, "Simulation paused"),
            (5000, "Simulation resumed"),
            (5300, "loadImage() popped from call stack"),
            (5300, "Image load started (2000ms)"),
        ]
    );
}

#[test]
fn test_full_trace() {
    let (clock, mut simulator) = create_test_simulator();
    simulator.run();
    step_to(&clock, &mut simulator, 6000);

    assert_eq!(simulator.state(), RunState::Complete);
    assert!(simulator.queues().is_idle());
    assert_eq!(simulator.scheduler().pending_count(), 0);

    let messages: Vec<_> = simulator
        .queues()
        .entries()
        .iter()
        .map(|e| (e.at_ms, e.message.as_str()))
        .collect();
    let expected = vec![
        (0, "main() pushed to call stack"),
        (500, "loadImage() pushed to call stack"),
        (1000, "loadImage() popped from call stack"),
        (1000, "Image load started (2000ms)"),
        (1500, "queryDatabase() pushed to call stack"),
        (2000, "queryDatabase() popped from call stack"),
        (2000, "Database query started (1500ms)"),
        (2500, "Promise.resolve() pushed to call stack"),
        (3000, "Promise.resolve() popped from call stack"),
        (3000, "Promise callback queued as microtask"),
        (3500, "main() popped from call stack"),
        (4000, "Image load finished"),
        (4000, "Image onload queued as macrotask"),
        (4500, "Database query finished"),
        (4500, "Database callback queued as macrotask"),
        (5000, "Microtask queue drained (1 task(s))"),
        (5000, "Promise callback pushed to call stack"),
        (5000, "Promise callback popped from call stack"),
        (5500, "Image onload dequeued from macrotask queue"),
        (5500, "Image onload pushed to call stack"),
        (5500, "Image onload popped from call stack"),
        (5500, "Database callback dequeued from macrotask queue"),
        (5500, "Database callback pushed to call stack"),
        (5500, "Database callback popped from call stack"),
        (6000, "Simulation complete"),
    ];
    assert_eq!(messages, expected);
    assert_eq!(simulator.queues().next_id(), 12);
}

#[test]
fn test_macrotasks_wait_for_their_turn() {
    let (clock, mut simulator) = create_test_simulator();
    simulator.run();
    step_to(&clock, &mut simulator, 4500);

    assert_eq!(
        simulator
            .queues()
            .macrotasks()
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>(),
        vec!["Image onload", "Database callback"]
    );
    assert_eq!(simulator.queues().microtasks().len(), 1);
    assert!(simulator.queues().pending_ops().is_empty());
}

#[test]
fn test_illegal_transitions_are_ignored() {
    let (clock, mut simulator) = create_test_simulator();

    assert_eq!(simulator.try_pause(), Err(ControlError::NotRunning(RunState::Idle)));
    assert_eq!(simulator.try_resume(), Err(ControlError::NotPaused(RunState::Idle)));
    simulator.pause_or_resume();
    assert_eq!(simulator.state(), RunState::Idle);
    assert!(simulator.queues().entries().is_empty());

    simulator.run();
    assert_eq!(simulator.try_run(), Err(ControlError::AlreadyActive(RunState::Running)));
    assert_eq!(simulator.try_resume(), Err(ControlError::NotPaused(RunState::Running)));

    simulator.pause_or_resume();
    assert_eq!(simulator.state(), RunState::Paused);
    assert_eq!(simulator.try_run(), Err(ControlError::AlreadyActive(RunState::Paused)));
    assert_eq!(simulator.try_pause(), Err(ControlError::NotRunning(RunState::Paused)));

    simulator.pause_or_resume();
    assert_eq!(simulator.state(), RunState::Running);

    step_to(&clock, &mut simulator, 6000);
    assert_eq!(simulator.state(), RunState::Complete);
    let lines = simulator.queues().entries().len();
    simulator.pause_or_resume();
    assert_eq!(simulator.state(), RunState::Complete);
    assert_eq!(simulator.queues().entries().len(), lines);
}

#[test]
fn test_equal_delays_keep_program_order_across_pause() {
    let clock = ManualClock::new();
    let program = Program::new(vec![
        Step::new(1000, Action::PushStack { text: "first()".into(), kind: Kind::Timer }),
        Step::new(1000, Action::PushStack { text: "second()".into(), kind: Kind::Timer }),
        Step::new(1000, Action::PushStack { text: "third()".into(), kind: Kind::Timer }),
    ]);
    let mut simulator = Simulator::new(TimerQueue::new(clock.clone()), program);
    simulator.run();

    step_to(&clock, &mut simulator, 400);
    simulator.pause();
    clock.advance(250);
    simulator.resume();
    step_to(&clock, &mut simulator, 1250);

    assert_eq!(
        texts(simulator.queues().stack()),
        vec!["first()", "second()", "third()"]
    );
    // All three landed together, 250ms late
    assert!(simulator.queues().entries()[2..].iter().all(|e| e.at_ms == 1250));
}

#[test]
fn test_subscribers_see_every_mutation() {
    let (clock, mut simulator) = create_test_simulator();
    let seen: Rc<RefCell<Vec<Snapshot>>> = Rc::new(RefCell::new(Vec::new()));
    {
        let seen = seen.clone();
        simulator.subscribe(move |snapshot: &Snapshot| {
            seen.borrow_mut().push(snapshot.clone());
        });
    }

    simulator.run();
    step_to(&clock, &mut simulator, 6000);

    let seen = seen.borrow();
    // reset + start + one per fired step
    assert_eq!(seen.len(), 2 + 13);
    assert_eq!(seen[0].state, RunState::Idle);
    assert_eq!(seen[1].state, RunState::Running);
    assert!(seen[1].stack.is_empty());
    assert_eq!(texts(&seen[2].stack), vec!["main()"]);
    assert_eq!(seen.last().unwrap().state, RunState::Complete);
    assert_eq!(simulator.profiling.actions_fired, 13);
    assert_eq!(simulator.profiling.snapshots_sent, 15);
}

#[test]
fn test_snapshot_serializes_for_presentation() {
    let (clock, mut simulator) = create_test_simulator();
    simulator.run();
    step_to(&clock, &mut simulator, 1000);

    let json = serde_json::to_value(simulator.snapshot()).unwrap();
    assert_eq!(json["state"], "running");
    assert_eq!(json["now_ms"], 1000);
    assert_eq!(json["pending_ops"][0]["kind"], "imageLoad");
    assert_eq!(json["pending_ops"][0]["duration_ms"], 2000);
    assert_eq!(json["stack"][0]["text"], "main()");
}

#[test]
fn test_pause_fires_overdue_steps_at_their_deadline() {
    let (clock, mut simulator) = create_test_simulator();
    simulator.run();
    clock.set(500);
    simulator.tick();

    // The 1000ms step is overdue but nobody ticked before the pause
    clock.set(1005);
    simulator.pause();
    assert_eq!(texts(simulator.queues().pending_ops()), vec!["Image load"]);
    clock.advance(3000);
    simulator.resume();
    simulator.tick();

    let messages: Vec<_> = simulator
        .queues()
        .entries()
        .iter()
        .map(|e| (e.at_ms, e.message.as_str()))
        .collect();
    assert_eq!(
        messages,
        vec![
            (0, "main() pushed to call stack"),
            (500, "loadImage() pushed to call stack"),
            (1000, "loadImage() popped from call stack"),
            (1000, "Image load started (2000ms)"),
            (1005, "Simulation paused"),
            (4005, "Simulation resumed"),
        ]
    );

    // The next step keeps its 500ms gap plus the pause
    step_to(&clock, &mut simulator, 4500);
    let last = simulator.queues().entries().last().unwrap();
    assert_eq!((last.at_ms, last.message.as_str()), (4500, "queryDatabase() pushed to call stack"));
}

#[test]
fn test_overdue_steps_fire_in_deadline_order_through_pause() {
    let (clock, mut simulator) = create_test_simulator();
    simulator.run();

    clock.set(2100);
    simulator.pause();
    let stamps: Vec<_> = simulator.queues().entries().iter().map(|e| e.at_ms).collect();
    assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(texts(simulator.queues().pending_ops()), vec!["Image load", "Database query"]);
    assert_eq!(simulator.queues().entries().last().unwrap().at_ms, 2100);
}

#[test]
fn test_pause_that_reaches_completion_reports_complete() {
    let (clock, mut simulator) = create_test_simulator();
    simulator.run();

    clock.set(7000);
    assert_eq!(simulator.try_pause(), Err(ControlError::NotRunning(RunState::Complete)));
    assert_eq!(simulator.state(), RunState::Complete);
    assert_eq!(simulator.queues().entries().last().unwrap().message, "Simulation complete");
    assert_eq!(simulator.queues().entries().last().unwrap().at_ms, 6000);
}

#[test]
fn test_complete_stops_the_batch_and_cancels_later_steps() {
    let clock = ManualClock::new();
    let program = Program::new(vec![
        Step::new(100, Action::PushStack { text: "before()".into(), kind: Kind::Timer }),
        Step::new(200, Action::Complete),
        Step::new(200, Action::PushStack { text: "same_tick()".into(), kind: Kind::Timer }),
        Step::new(900, Action::PushStack { text: "later()".into(), kind: Kind::Timer }),
    ]);
    let mut simulator = Simulator::new(TimerQueue::new(clock.clone()), program);
    simulator.run();

    clock.set(300);
    assert_eq!(simulator.tick(), 2);
    assert_eq!(simulator.state(), RunState::Complete);
    assert_eq!(texts(simulator.queues().stack()), vec!["before()"]);
    assert_eq!(simulator.scheduler().pending_count(), 0);
    assert_eq!(simulator.scheduler().live_timer_count(), 0);
    assert_eq!(simulator.next_deadline(), None);

    clock.set(1000);
    assert_eq!(simulator.tick(), 0);
    assert_eq!(texts(simulator.queues().stack()), vec!["before()"]);
}
