//! Integration tests for the engine lifecycle and frame loop.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

use particle_engine::{
    AngleConvention, Engine, EngineEvent, EngineStatus, FrameOutcome, SpeedUnit, VelocityConfig,
};
use projection::{MercatorViewport, Projection};
use renderer::{PixmapCanvas, RenderError, Segment, TrailCanvas};
use test_utils::{
    angola_layout, assert_vector_approx_eq, extent, scenario_layout, uniform_payload,
    vortex_payload,
};
use velocity_common::{GeoExtent, PixelBounds, VelocityError};

const WIDTH: u32 = 160;
const HEIGHT: u32 = 150;

// ============================================================================
// Helper functions
// ============================================================================

fn test_config() -> VelocityConfig {
    VelocityConfig {
        velocity_scale: 0.1,
        particle_multiplier: 1.0 / 50.0,
        seed: Some(7),
        ..VelocityConfig::default()
    }
}

fn viewport() -> (MercatorViewport, PixelBounds, GeoExtent) {
    let extent = extent::ANGOLA;
    let viewport = MercatorViewport::new(extent, WIDTH, HEIGHT).unwrap();
    let bounds = viewport.pixel_bounds(&extent, WIDTH, HEIGHT);
    (viewport, bounds, extent)
}

fn ready_engine<C: TrailCanvas>(config: VelocityConfig, canvas: C) -> Engine<MercatorViewport, C> {
    let mut engine = Engine::new(config, canvas).unwrap();
    engine
        .notify_data_changed(&vortex_payload(&angola_layout(), 16.0, -11.0, 8.0))
        .unwrap();
    let (projection, bounds, extent) = viewport();
    engine.notify_bounds_changed(projection, bounds, extent).unwrap();
    engine
}

fn engine() -> Engine<MercatorViewport, PixmapCanvas> {
    ready_engine(test_config(), PixmapCanvas::new(WIDTH, HEIGHT).unwrap())
}

/// Run frame callbacks until the field build completes.
fn build<C: TrailCanvas>(engine: &mut Engine<MercatorViewport, C>, now: Instant) -> usize {
    for _ in 0..10_000 {
        match engine.on_animation_frame(now) {
            FrameOutcome::Building { .. } => continue,
            FrameOutcome::Started { particles } => return particles,
            other => panic!("unexpected outcome while building: {:?}", other),
        }
    }
    panic!("field build did not finish");
}

/// Clock advancing by slightly more than one frame interval per call.
struct Clock {
    now: Instant,
    step: Duration,
}

impl Clock {
    fn new(engine_interval: Duration) -> Self {
        Self {
            now: Instant::now(),
            step: engine_interval + Duration::from_millis(1),
        }
    }

    fn tick(&mut self) -> Instant {
        self.now += self.step;
        self.now
    }
}

/// Canvas whose operations fail on demand.
struct FlakyCanvas {
    inner: PixmapCanvas,
    fail: Rc<Cell<bool>>,
}

impl TrailCanvas for FlakyCanvas {
    fn size(&self) -> (u32, u32) {
        self.inner.size()
    }

    fn fade(&mut self, bounds: &PixelBounds, retain: f32) -> Result<(), RenderError> {
        if self.fail.get() {
            return Err(RenderError::Canvas("context lost".to_string()));
        }
        self.inner.fade(bounds, retain)
    }

    fn stroke_segments(
        &mut self,
        color: [u8; 4],
        line_width: f32,
        segments: &[Segment],
    ) -> Result<(), RenderError> {
        self.inner.stroke_segments(color, line_width, segments)
    }

    fn clear(&mut self) {
        self.inner.clear()
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_start_requires_data_and_viewport() {
    let mut engine: Engine<MercatorViewport, PixmapCanvas> =
        Engine::new(test_config(), PixmapCanvas::new(WIDTH, HEIGHT).unwrap()).unwrap();
    assert!(matches!(engine.start(), Err(VelocityError::NotReady(_))));

    engine
        .notify_data_changed(&uniform_payload(&angola_layout(), 1.0, 0.0))
        .unwrap();
    assert!(matches!(engine.start(), Err(VelocityError::NotReady(_))));
    assert_eq!(engine.status(), EngineStatus::Idle);

    let (projection, bounds, extent) = viewport();
    engine.notify_bounds_changed(projection, bounds, extent).unwrap();
    engine.start().unwrap();
    assert!(matches!(engine.status(), EngineStatus::Building { .. }));
}

#[test]
fn test_invalid_config_rejected() {
    let config = VelocityConfig {
        opacity: 1.5,
        ..VelocityConfig::default()
    };
    let result: Result<Engine<MercatorViewport, PixmapCanvas>, _> =
        Engine::new(config, PixmapCanvas::new(10, 10).unwrap());
    assert!(matches!(result, Err(VelocityError::InvalidConfig { .. })));
}

#[test]
fn test_unrepresentable_frame_interval_rejected() {
    let config = VelocityConfig {
        frame_rate: 1e-30,
        ..VelocityConfig::default()
    };
    let result: Result<Engine<MercatorViewport, PixmapCanvas>, _> =
        Engine::new(config, PixmapCanvas::new(10, 10).unwrap());
    match result {
        Err(VelocityError::InvalidConfig { param, .. }) => assert_eq!(param, "frameRate"),
        Err(other) => panic!("unexpected {:?}", other),
        Ok(_) => panic!("engine accepted a 1e-30 fps frame rate"),
    }
}

#[test]
fn test_lifecycle_events_in_order() {
    let mut engine = engine();
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    engine.on_event(move |event| sink.borrow_mut().push(event.clone()));

    engine.start().unwrap();
    let particles = build(&mut engine, Instant::now());
    engine.stop();

    let events = events.borrow();
    let names: Vec<&str> = events.iter().map(|e| e.name()).collect();
    assert_eq!(
        names,
        vec!["build_started", "build_complete", "animation_started", "animation_stopped"]
    );
    match (&events[0], &events[1], &events[2]) {
        (
            EngineEvent::BuildStarted { generation, columns },
            EngineEvent::BuildComplete { generation: done, .. },
            EngineEvent::AnimationStarted { particles: started },
        ) => {
            assert_eq!(generation, done);
            assert_eq!(*columns, (WIDTH as usize + 1) / 2);
            assert_eq!(*started, particles);
        }
        other => panic!("unexpected events {:?}", other),
    }
}

#[test]
fn test_stop_during_build_emits_no_animation_stopped() {
    let mut engine = engine();
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    engine.on_event(move |event| sink.borrow_mut().push(event.name()));

    engine.start().unwrap();
    assert!(matches!(engine.status(), EngineStatus::Building { .. }));
    engine.stop();

    assert_eq!(engine.status(), EngineStatus::Stopped);
    assert!(engine.field().is_none());
    assert_eq!(*events.borrow(), vec!["build_started"]);
}

#[test]
fn test_zero_budget_builds_one_column_per_frame() {
    let mut config = test_config();
    config.adaptive.batch_budget_ms = 0;
    let mut engine = ready_engine(config, PixmapCanvas::new(WIDTH, HEIGHT).unwrap());
    engine.start().unwrap();

    let columns = (WIDTH as usize + 1) / 2;
    let now = Instant::now();
    let mut last_progress = 0.0;
    for _ in 0..columns - 1 {
        match engine.on_animation_frame(now) {
            FrameOutcome::Building { progress } => {
                assert!(progress > last_progress);
                last_progress = progress;
            }
            other => panic!("expected a pending batch, got {:?}", other),
        }
    }
    assert!(matches!(
        engine.on_animation_frame(now),
        FrameOutcome::Started { .. }
    ));
    assert_eq!(engine.status(), EngineStatus::Animating);
}

#[test]
fn test_stale_build_is_cancelled() {
    let mut config = test_config();
    config.adaptive.batch_budget_ms = 0;
    let mut engine = ready_engine(config, PixmapCanvas::new(WIDTH, HEIGHT).unwrap());
    engine.start().unwrap();
    assert!(matches!(
        engine.on_animation_frame(Instant::now()),
        FrameOutcome::Building { .. }
    ));

    engine.generation_token().advance();
    assert_eq!(engine.on_animation_frame(Instant::now()), FrameOutcome::Cancelled);
    assert_eq!(engine.status(), EngineStatus::Idle);
    assert!(engine.field().is_none());

    // A fresh start still works
    engine.start().unwrap();
    assert!(build(&mut engine, Instant::now()) > 0);
}

#[test]
fn test_restart_during_build_discards_job() {
    let mut config = test_config();
    config.adaptive.batch_budget_ms = 0;
    let mut engine = ready_engine(config, PixmapCanvas::new(WIDTH, HEIGHT).unwrap());
    let generations = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&generations);
    engine.on_event(move |event| {
        if let EngineEvent::BuildStarted { generation, .. } = event {
            sink.borrow_mut().push(*generation);
        }
    });

    engine.start().unwrap();
    for _ in 0..5 {
        engine.on_animation_frame(Instant::now());
    }
    engine.start().unwrap();
    match engine.status() {
        EngineStatus::Building { progress } => assert_eq!(progress, 0.0),
        other => panic!("expected a new build, got {:?}", other),
    }
    let generations = generations.borrow();
    assert_eq!(generations.len(), 2);
    assert!(generations[1] > generations[0]);
}

#[test]
fn test_stop_then_start_reproduces_field() {
    let mut engine = engine();
    engine.start().unwrap();
    let now = Instant::now();
    build(&mut engine, now);
    let original = engine.field().unwrap().clone();
    assert!(original.defined_samples() > 0);

    let mut clock = Clock::new(engine.frame_interval());
    for _ in 0..10 {
        engine.on_animation_frame(clock.tick());
    }
    assert!(engine.canvas().painted_pixels() > 0);

    engine.stop();
    assert_eq!(engine.status(), EngineStatus::Stopped);
    assert!(engine.field().is_none());
    assert!(engine.particles().is_empty());
    assert!(engine.particles().buckets().iter().all(|b| b.is_empty()));
    assert_eq!(engine.canvas().painted_pixels(), 0);
    assert_eq!(engine.on_animation_frame(clock.tick()), FrameOutcome::Inactive);

    // Stopping twice is harmless
    engine.stop();

    engine.start().unwrap();
    build(&mut engine, clock.tick());
    assert!(engine.field().unwrap().approx_eq(&original, 1e-6));
}

#[test]
fn test_pause_and_resume() {
    let mut engine = engine();
    assert!(!engine.pause());
    engine.start().unwrap();
    let mut clock = Clock::new(engine.frame_interval());
    build(&mut engine, clock.tick());
    engine.on_animation_frame(clock.tick());

    assert!(engine.pause());
    assert_eq!(engine.status(), EngineStatus::Paused);
    let frames = engine.frames();
    assert_eq!(engine.on_animation_frame(clock.tick()), FrameOutcome::Inactive);
    assert_eq!(engine.frames(), frames);
    assert!(engine.field().is_some());

    assert!(engine.resume());
    assert!(!engine.resume());
    // Clock was reset, so the first resumed callback renders immediately
    let at = clock.now;
    assert!(matches!(
        engine.on_animation_frame(at),
        FrameOutcome::Rendered { .. }
    ));
    assert_eq!(engine.frames(), frames + 1);
}

#[test]
fn test_bounds_change_rebuilds_and_clears_canvas() {
    let mut engine = engine();
    engine.start().unwrap();
    let mut clock = Clock::new(engine.frame_interval());
    build(&mut engine, clock.tick());
    for _ in 0..5 {
        engine.on_animation_frame(clock.tick());
    }
    assert!(engine.canvas().painted_pixels() > 0);

    let extent = GeoExtent::new(10.0, -15.0, 20.0, -5.0);
    let projection = MercatorViewport::new(extent, WIDTH, HEIGHT).unwrap();
    let bounds = projection.pixel_bounds(&extent, WIDTH, HEIGHT);
    engine.notify_bounds_changed(projection, bounds, extent).unwrap();

    assert!(matches!(engine.status(), EngineStatus::Building { .. }));
    assert_eq!(engine.canvas().painted_pixels(), 0);
    assert!(engine.field().is_none());
    build(&mut engine, clock.tick());
    assert_eq!(engine.field().unwrap().bounds(), bounds);
}

#[test]
fn test_decode_error_stops_animation() {
    let mut engine = engine();
    engine.start().unwrap();
    build(&mut engine, Instant::now());
    let stopped = Rc::new(Cell::new(false));
    let flag = Rc::clone(&stopped);
    engine.on_event(move |event| {
        if *event == EngineEvent::AnimationStopped {
            flag.set(true);
        }
    });

    let mut records = uniform_payload(&angola_layout(), 1.0, 1.0);
    records.pop();
    let result = engine.notify_data_changed(&records);

    assert!(matches!(result, Err(VelocityError::Decode(_))));
    assert!(stopped.get());
    assert_eq!(engine.status(), EngineStatus::Stopped);
    assert!(engine.data().is_none());
    assert!(engine.interpolate_point(16.0, -11.0).is_none());
    assert!(matches!(engine.start(), Err(VelocityError::NotReady(_))));
}

#[test]
fn test_new_data_rebuilds_running_animation() {
    let mut engine = engine();
    engine.start().unwrap();
    build(&mut engine, Instant::now());
    let before = engine.field().unwrap().clone();

    engine
        .notify_data_changed(&uniform_payload(&angola_layout(), -3.0, 2.0))
        .unwrap();
    assert!(matches!(engine.status(), EngineStatus::Building { .. }));
    build(&mut engine, Instant::now());
    assert!(!engine.field().unwrap().approx_eq(&before, 1e-3));
}

// ============================================================================
// Frame loop
// ============================================================================

#[test]
fn test_skips_early_callbacks_up_to_limit() {
    let mut engine = engine();
    engine.start().unwrap();
    let now = Instant::now();
    build(&mut engine, now);

    assert!(matches!(engine.on_animation_frame(now), FrameOutcome::Rendered { .. }));
    for _ in 0..3 {
        assert_eq!(engine.on_animation_frame(now), FrameOutcome::Skipped);
    }
    assert!(matches!(engine.on_animation_frame(now), FrameOutcome::Rendered { .. }));
    assert_eq!(engine.frames(), 2);
}

#[test]
fn test_particles_stay_within_bounds() {
    let mut engine = engine();
    engine.start().unwrap();
    let mut clock = Clock::new(engine.frame_interval());
    build(&mut engine, clock.tick());
    let bounds = engine.field().unwrap().bounds();

    for _ in 0..300 {
        engine.on_animation_frame(clock.tick());
        for p in engine.particles().particles() {
            assert!(bounds.contains(p.x, p.y), "particle escaped: {:?}", p);
        }
    }
    assert_eq!(engine.frames(), 300);
}

#[test]
fn test_frame_callback_sees_committed_state() {
    let mut engine = engine();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    engine.on_frame(move |ctx| {
        sink.borrow_mut().push((ctx.frame, ctx.particles.len(), ctx.field.bounds()));
    });

    engine.start().unwrap();
    let mut clock = Clock::new(engine.frame_interval());
    let particles = build(&mut engine, clock.tick());
    for _ in 0..5 {
        engine.on_animation_frame(clock.tick());
    }

    let seen = seen.borrow();
    assert_eq!(seen.len(), 5);
    for (i, (frame, count, bounds)) in seen.iter().enumerate() {
        assert_eq!(*frame, i as u64 + 1);
        assert_eq!(*count, particles);
        assert_eq!(*bounds, viewport().1);
    }
}

#[test]
fn test_frame_failures_do_not_stop_the_loop() {
    let fail = Rc::new(Cell::new(false));
    let canvas = FlakyCanvas {
        inner: PixmapCanvas::new(WIDTH, HEIGHT).unwrap(),
        fail: Rc::clone(&fail),
    };
    let mut engine = ready_engine(test_config(), canvas);

    let panicked = Rc::new(Cell::new(false));
    let once = Rc::clone(&panicked);
    engine.on_frame(move |ctx| {
        if ctx.frame == 3 && !once.get() {
            once.set(true);
            panic!("overlay exploded");
        }
    });

    engine.start().unwrap();
    let mut clock = Clock::new(engine.frame_interval());
    build(&mut engine, clock.tick());

    assert!(matches!(engine.on_animation_frame(clock.tick()), FrameOutcome::Rendered { .. }));

    fail.set(true);
    assert_eq!(engine.on_animation_frame(clock.tick()), FrameOutcome::Failed);
    fail.set(false);

    assert!(matches!(engine.on_animation_frame(clock.tick()), FrameOutcome::Rendered { .. }));
    // Callback panics on frame 3
    assert_eq!(engine.on_animation_frame(clock.tick()), FrameOutcome::Failed);
    assert!(panicked.get());
    assert!(matches!(engine.on_animation_frame(clock.tick()), FrameOutcome::Rendered { .. }));

    assert_eq!(engine.status(), EngineStatus::Animating);
    assert_eq!(engine.frames(), 3);
}

#[test]
fn test_low_frame_rate_sheds_particles() {
    let mut engine = engine();
    engine.start().unwrap();
    let start = Instant::now();
    let full = build(&mut engine, start);
    assert!(full > 100);

    // Host delivers 5 callbacks per second
    for i in 0..=5u32 {
        engine.on_animation_frame(start + Duration::from_millis(200) * i);
    }

    assert_eq!(engine.monitor().particle_scale(), 0.75);
    let expected = (full as f64 * 0.75).round() as usize;
    assert_eq!(engine.particles().len(), expected);
}

// ============================================================================
// Point queries
// ============================================================================

#[test]
fn test_interpolate_point_without_animation() {
    let mut engine: Engine<MercatorViewport, PixmapCanvas> =
        Engine::new(test_config(), PixmapCanvas::new(10, 10).unwrap()).unwrap();
    assert!(engine.interpolate_point(5.0, 5.0).is_none());

    engine
        .notify_data_changed(&uniform_payload(&scenario_layout(), 1.0, 0.0))
        .unwrap();
    assert_vector_approx_eq!(engine.interpolate_point(5.0, 5.0).unwrap(), (1.0, 0.0, 1.0), 1e-6);
    assert!(engine.interpolate_point(50.0, 5.0).is_none());
    assert_eq!(engine.status(), EngineStatus::Idle);
}

#[test]
fn test_readout() {
    let mut engine: Engine<MercatorViewport, PixmapCanvas> =
        Engine::new(test_config(), PixmapCanvas::new(10, 10).unwrap()).unwrap();
    engine
        .notify_data_changed(&uniform_payload(&scenario_layout(), 1.0, 0.0))
        .unwrap();

    let readout = engine
        .readout(5.0, 5.0, SpeedUnit::KilometersPerHour, AngleConvention::MeteoCw)
        .unwrap();
    assert!((readout.speed - 3.6).abs() < 1e-5);
    assert!((readout.direction.unwrap() - 270.0).abs() < 1e-5);
    assert!(readout.to_string().starts_with("3.60 km/h @ 270°"));
}
