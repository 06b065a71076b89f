//! Simulated move example.
//!
//! Runs two trapezoidal blocks through the pulse engine on the simulated
//! timer and GPIO banks, ticking the trapezoid generator at its configured
//! period, and prints what the hardware would have seen.

use stepper_pulse::engine::EngineEvent;
use stepper_pulse::hal::sim::{SimGpio, SimTimer};
use stepper_pulse::{
    Block, BlockBuffer, EngineConfig, EventRecorder, RateGenerator, StepTimer,
    StepperEngineBuilder,
};

fn report_completion(block: &Block) {
    println!("  deferred action: block of {} events done", block.steps_event_count);
}

fn main() {
    println!("=== Simulated Move Example ===\n");

    let config = EngineConfig {
        base_stepping_frequency: 20_000,
        timer_clock_hz: 1_000_000,
        acceleration_ticks_per_second: 200,
        ..EngineConfig::default()
    };

    let mut engine = StepperEngineBuilder::new()
        .timer(SimTimer::new())
        .step_gpio(SimGpio::new())
        .dir_gpio(SimGpio::new())
        .queue(BlockBuffer::<4>::new())
        .observer(EventRecorder::<512>::new())
        .config(config)
        .build()
        .expect("Failed to build engine");

    let moves = [
        Block {
            steps: [1_600, 800, 0],
            steps_event_count: 1_600,
            direction_bits: 0b000,
            nominal_rate: 240_000,
            initial_rate: 12_000,
            final_rate: 12_000,
            rate_delta: 24_000,
            accelerate_until: 400,
            decelerate_after: 1_200,
            deferred_action: Some(report_completion),
        },
        Block {
            steps: [0, 400, 1_200],
            steps_event_count: 1_200,
            direction_bits: 0b110,
            nominal_rate: 180_000,
            initial_rate: 12_000,
            final_rate: 6_000,
            rate_delta: 18_000,
            accelerate_until: 300,
            decelerate_after: 900,
            deferred_action: Some(report_completion),
        },
    ];

    // Trapezoid state belongs to the trapezoid ticker
    let mut rate = RateGenerator::new(EventRecorder::<512>::new());

    for block in moves {
        engine.queue_mut().push(block).expect("Queue full");
    }
    engine.wake_up();

    // Timer clock is 1MHz, so one clock is one microsecond
    let trapezoid_period = engine.trapezoid_period_us();
    let mut clocks: u64 = 0;
    while engine.timer().is_running() {
        engine.timer_mut().advance(1);
        engine.on_timer_interrupt();
        clocks += 1;
        if clocks % u64::from(trapezoid_period) == 0 {
            engine.on_trapezoid_tick(&mut rate);
        }
    }

    println!("\nSimulated time: {:.3} s", clocks as f64 / 1_000_000.0);
    println!("Blocks completed: {}", engine.completed_blocks());
    for (axis, pin) in engine.config().pins.step_pins().iter().enumerate() {
        println!(
            "Axis {} (step pin {}): {} pulses",
            axis,
            pin,
            engine.step_gpio().rising_edges(*pin)
        );
    }

    let rates: Vec<u32> = engine
        .observer()
        .rates()
        .chain(rate.observer().rates())
        .collect();
    let peak = rates.iter().copied().max().unwrap_or(0);
    println!("Speed changes: {} (peak {} steps/min)", rates.len(), peak);

    println!("\nLifecycle:");
    for event in engine.observer().events() {
        match event {
            EngineEvent::StateChange { from, to } => println!("  {} -> {}", from.name(), to.name()),
            EngineEvent::BlockBegin { steps } => println!("  begin {:?}", steps),
            EngineEvent::BlockEnd { steps } => println!("  end   {:?}", steps),
            EngineEvent::SpeedChange(_) => {}
        }
    }
    if engine.observer().dropped() > 0 {
        println!("  ({} events not recorded)", engine.observer().dropped());
    }
}
