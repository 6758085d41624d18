use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use event::{Event, EventBus, EventType, Subscriber};
use slog_scope::warn;

/// Fixed-timestep driver multiplexing input polling, physics stepping and frame pacing onto a
/// single thread. Ground truth: `infiniworld/controllers/loop.py::GameLoopController.run`.
///
/// The per-iteration algorithm lives in [`advance`](GameLoop::advance), a pure function of an
/// elapsed-seconds float, kept separate from [`run`](GameLoop::run)'s wall-clock sampling so it
/// can be driven deterministically by tests without sleeping.
pub struct GameLoop {
    bus: Rc<EventBus>,
    state: RefCell<State>,
    /// Set from outside the single-threaded bus/loop (e.g. a signal handler) to request
    /// termination without touching any `RefCell`-guarded state cross-thread. `run` polls it
    /// once per iteration and turns it into an ordinary `Quit` post on the loop's own thread.
    interrupted: Arc<AtomicBool>,
}

struct State {
    running: bool,
    /// The source starts with physics paused; something (a `StartGameCommand` handler, a test)
    /// must explicitly unpause it.
    paused: bool,
    input_accu: f32,
    physics_accu: f32,
    frame_accu: f32,
    frame_interp_accu: f32,
}

impl GameLoop {
    pub fn new(bus: Rc<EventBus>) -> Rc<Self> {
        Rc::new(Self {
            bus,
            state: RefCell::new(State {
                running: true,
                paused: true,
                input_accu: 0.0,
                physics_accu: 0.0,
                frame_accu: 0.0,
                frame_interp_accu: 0.0,
            }),
            interrupted: Arc::new(AtomicBool::new(false)),
        })
    }

    /// A flag the loop's own thread polls once per iteration of [`run`](Self::run). Clone it out
    /// to a signal handler or other external thread and set it to request termination; this is
    /// the only state this type exposes to another thread, and it's a plain atomic, not anything
    /// that touches the bus or the `RefCell`-guarded accumulators.
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().running
    }

    pub fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }

    pub fn pause_physics(&self, paused: bool) {
        self.state.borrow_mut().paused = paused;
        self.bus.post(Event::PhysicsPaused { paused });
    }

    /// One iteration of the loop's core algorithm, advanced by `elapsed` seconds. Posts
    /// `ProcessInputs`/`RunPhysics`/`RenderFrame` as their respective accumulators cross their
    /// period, pumping the bus after each post exactly as the source does (so e.g. a keyboard
    /// controller's reaction to `ProcessInputs` is fully drained before physics runs the same
    /// iteration). Ground truth: the body of `GameLoopController.run`'s `while self._running`
    /// loop, minus the trailing sleep, which belongs to [`run`](GameLoop::run).
    pub fn advance(&self, elapsed: f32) {
        let (input_period, physics_period, physics_runs_max, frame_period) = {
            let cfg = config::get();
            (
                cfg.simulation.input_period,
                cfg.simulation.physics_period,
                cfg.simulation.physics_runs_max,
                cfg.simulation.frame_period,
            )
        };

        {
            let mut state = self.state.borrow_mut();
            state.input_accu += elapsed;
        }
        if self.state.borrow().input_accu >= input_period {
            self.state.borrow_mut().input_accu %= input_period;
            self.bus.post(Event::ProcessInputs);
            self.bus.pump();
        }

        {
            let mut state = self.state.borrow_mut();
            if !state.paused {
                state.physics_accu += elapsed;
                state.frame_interp_accu += elapsed;
            }
        }

        let mut physics_runs = 0u32;
        loop {
            let should_run = {
                let state = self.state.borrow();
                state.physics_accu >= physics_period && physics_runs < physics_runs_max
            };
            if !should_run {
                break;
            }
            {
                let mut state = self.state.borrow_mut();
                state.physics_accu -= physics_period;
                state.frame_interp_accu %= physics_period;
            }
            physics_runs += 1;
            self.bus.post(Event::RunPhysics { timestep: physics_period });
            self.bus.pump();
        }
        let snap_to_last_physics = physics_runs >= physics_runs_max;

        self.state.borrow_mut().frame_accu += elapsed;
        let should_render = self.state.borrow().frame_accu >= frame_period;
        if should_render {
            {
                let mut state = self.state.borrow_mut();
                state.frame_accu %= frame_period;
            }
            let ratio = if snap_to_last_physics {
                1.0
            } else {
                (self.state.borrow().frame_interp_accu / physics_period).min(1.0)
            };
            self.bus.post(Event::RenderFrame { ratio });
            self.bus.pump();
        }
    }

    /// Runs `advance` until a `Quit` event is observed, sampling the wall clock with
    /// [`Instant`]. Sleeps the remainder of whichever accumulator is closest to firing next,
    /// matching the source's idle-sleep calculation.
    pub fn run(self: &Rc<Self>) {
        let mut last = Instant::now();
        while self.is_running() {
            if self.interrupted.load(Ordering::Relaxed) {
                self.bus.post(Event::Quit);
                self.bus.pump();
                break;
            }

            let now = Instant::now();
            let elapsed = match now.checked_duration_since(last) {
                Some(d) => d.as_secs_f32(),
                None => {
                    warn!("system clock went backwards, skipping this iteration");
                    last = now;
                    continue;
                }
            };
            last = now;

            self.advance(elapsed);

            let (input_period, physics_period, frame_period) = {
                let cfg = config::get();
                (cfg.simulation.input_period, cfg.simulation.physics_period, cfg.simulation.frame_period)
            };
            let closest_period = {
                let state = self.state.borrow();
                (input_period - state.input_accu)
                    .min(physics_period - state.physics_accu)
                    .min(frame_period - state.frame_accu)
            };

            let spent_this_iteration = now.elapsed().as_secs_f32();
            let sleep_for = closest_period - spent_this_iteration;
            if sleep_for > 0.0 {
                std::thread::sleep(Duration::from_secs_f32(sleep_for));
            }
        }
    }
}

impl Subscriber for GameLoop {
    fn handled_types(&self) -> &'static [EventType] {
        &[EventType::Quit, EventType::TogglePausePhysicsCommand, EventType::PausePhysicsRequest]
    }

    fn handle(&self, event: &Event) {
        match event {
            Event::Quit => self.state.borrow_mut().running = false,
            Event::TogglePausePhysicsCommand => {
                let paused = !self.state.borrow().paused;
                self.pause_physics(paused);
            }
            Event::PausePhysicsRequest { paused } => self.pause_physics(*paused),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn init_config() {
        let dir = std::env::temp_dir().join(format!("gameloop-test-config-{:?}", std::thread::current().id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.ron");
        std::fs::write(
            &path,
            r#"(
                simulation: (
                    input_period: 0.05,
                    physics_period: 0.05,
                    physics_runs_max: 10,
                    frame_period: 0.0166666,
                    fox_spawn_period: 3.0,
                    carrot_spawn_period: 10.0,
                ),
                world: (
                    width: 64,
                    height: 64,
                    obstacle_density: 0.2,
                    seed: 0,
                ),
            )"#,
        )
        .unwrap();
        let _ = config::init(path);
    }

    struct PhysicsCounter(Cell<u32>);
    impl Subscriber for PhysicsCounter {
        fn handled_types(&self) -> &'static [EventType] {
            &[EventType::RunPhysics]
        }
        fn handle(&self, _: &Event) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn advance_runs_physics_on_period() {
        init_config();
        let bus = EventBus::new();
        let gameloop = GameLoop::new(bus.clone());
        gameloop.pause_physics(false);

        let counter = Rc::new(PhysicsCounter(Cell::new(0)));
        let counter_dyn: Rc<dyn Subscriber> = counter.clone();
        bus.register(&counter_dyn).unwrap();

        // Two physics periods' worth of elapsed time in one advance call.
        gameloop.advance(0.1);
        assert_eq!(counter.0.get(), 2);
    }

    #[test]
    fn paused_physics_does_not_accumulate() {
        init_config();
        let bus = EventBus::new();
        let gameloop = GameLoop::new(bus.clone());
        // stays paused (the default)

        let counter = Rc::new(PhysicsCounter(Cell::new(0)));
        let counter_dyn: Rc<dyn Subscriber> = counter.clone();
        bus.register(&counter_dyn).unwrap();

        gameloop.advance(10.0);
        assert_eq!(counter.0.get(), 0);
    }

    #[test]
    fn physics_runs_are_capped_per_advance() {
        init_config();
        let bus = EventBus::new();
        let gameloop = GameLoop::new(bus.clone());
        gameloop.pause_physics(false);

        let counter = Rc::new(PhysicsCounter(Cell::new(0)));
        let counter_dyn: Rc<dyn Subscriber> = counter.clone();
        bus.register(&counter_dyn).unwrap();

        // Far more than physics_runs_max (10) periods' worth of elapsed time.
        gameloop.advance(100.0);
        assert_eq!(counter.0.get(), 10);
    }

    #[test]
    fn quit_event_stops_the_loop() {
        init_config();
        let bus = EventBus::new();
        let gameloop = GameLoop::new(bus.clone());
        let gameloop_dyn: Rc<dyn Subscriber> = gameloop.clone();
        bus.register(&gameloop_dyn).unwrap();

        assert!(gameloop.is_running());
        bus.post(Event::Quit);
        bus.pump();
        assert!(!gameloop.is_running());
    }

    #[test]
    fn toggle_pause_command_flips_state() {
        init_config();
        let bus = EventBus::new();
        let gameloop = GameLoop::new(bus.clone());
        let gameloop_dyn: Rc<dyn Subscriber> = gameloop.clone();
        bus.register(&gameloop_dyn).unwrap();

        assert!(gameloop.is_paused());
        bus.post(Event::TogglePausePhysicsCommand);
        bus.pump();
        assert!(!gameloop.is_paused());
    }
}
