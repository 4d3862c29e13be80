//! The high-rate input/render context.
//!
//! Owns the [`GestureRecognizer`] outright; nothing else touches gesture state.
//! Each tick samples the knob, forwards whatever gestures it produced to the
//! coordinator, then hands the coordinator's display requests to the display.

use crate::clock::Clock;
use crate::collaborators::Display;
use crate::event::{Event, EventKind};
use crate::event_bus::{EVENT_QUEUE_CAPACITY, EventBus};
use crate::input::{EncoderInput, GestureRecognizer};

pub struct RenderContext<'a, E, C, D, const N: usize = EVENT_QUEUE_CAPACITY> {
    recognizer: GestureRecognizer<E, C>,
    display: D,
    bus: &'a EventBus<N>,
}

impl<'a, E, C, D, const N: usize> RenderContext<'a, E, C, D, N>
where
    E: EncoderInput,
    C: Clock,
    D: Display,
{
    pub fn new(recognizer: GestureRecognizer<E, C>, display: D, bus: &'a EventBus<N>) -> Self {
        Self {
            recognizer,
            display,
            bus,
        }
    }

    /// Take the hardware baselines.
    pub fn init(&mut self) {
        self.recognizer.init();
    }

    pub fn tick(&mut self) {
        self.recognizer.update();
        self.forward_gestures();

        for _ in 0..N {
            let Some(event) = self.bus.try_receive_from_main() else {
                break;
            };
            self.display.on_event(&event);
        }
        self.display.update();
    }

    fn forward_gestures(&mut self) {
        let rec = &mut self.recognizer;
        let bus = self.bus;

        let movement = rec.take_movement();
        if movement != 0 {
            bus.send_to_main(Event::with_value(EventKind::EncoderRotation, movement));
        }
        if rec.take_clicked() {
            bus.send_to_main(Event::new(EventKind::EncoderClick));
        }
        if rec.take_double_clicked() {
            bus.send_to_main(Event::new(EventKind::EncoderDoubleClick));
        }
        if rec.take_long_pressed() {
            bus.send_to_main(Event::new(EventKind::EncoderLongPress));
        }
        if rec.take_ultra_long_pressed() {
            bus.send_to_main(Event::new(EventKind::EncoderUltraLongPress));
        }

        let started = rec.take_press_and_rotate();
        let held_movement = rec.take_press_and_rotate_movement();
        if started || held_movement != 0 {
            bus.send_to_main(Event::with_value(
                EventKind::EncoderPressAndRotate,
                held_movement,
            ));
        }

        let press_time = rec.press_time();
        if press_time != 0 {
            bus.send_to_main(Event::with_value(
                EventKind::EncoderPressTime,
                clamp_ms(press_time),
            ));
        }

        let released_after = rec.last_press_duration();
        if rec.reset_last_press_duration() {
            bus.send_to_main(Event::with_value(
                EventKind::EncoderButtonReleased,
                clamp_ms(released_after),
            ));
        }
    }

    pub fn recognizer(&self) -> &GestureRecognizer<E, C> {
        &self.recognizer
    }

    pub fn display(&self) -> &D {
        &self.display
    }
}

fn clamp_ms(ms: u32) -> i32 {
    i32::try_from(ms).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GestureConfig;
    use crate::input::Level;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::vec::Vec;

    #[derive(Clone, Default)]
    struct FakeKnob {
        count: Rc<Cell<i32>>,
        pressed: Rc<Cell<bool>>,
    }

    impl EncoderInput for FakeKnob {
        fn raw_count(&mut self) -> i32 {
            self.count.get()
        }
        fn button_level(&mut self) -> Level {
            if self.pressed.get() { Level::Low } else { Level::High }
        }
    }

    #[derive(Clone, Default)]
    struct FakeClock(Rc<Cell<u64>>);

    impl Clock for FakeClock {
        fn now_ms(&self) -> u64 {
            self.0.get()
        }
    }

    #[derive(Default)]
    struct RecordingDisplay {
        events: RefCell<Vec<Event>>,
        frames: Cell<u32>,
    }

    impl Display for RecordingDisplay {
        fn on_event(&mut self, event: &Event) {
            self.events.borrow_mut().push(event.clone());
        }
        fn update(&mut self) {
            self.frames.set(self.frames.get() + 1);
        }
    }

    fn drain(bus: &EventBus) -> Vec<Event> {
        core::iter::from_fn(|| bus.try_receive_from_ui()).collect()
    }

    fn kinds(events: &[Event]) -> Vec<EventKind> {
        events.iter().map(Event::kind).collect()
    }

    fn context(
        bus: &EventBus,
    ) -> (
        RenderContext<'_, FakeKnob, FakeClock, RecordingDisplay>,
        FakeKnob,
        FakeClock,
    ) {
        let knob = FakeKnob::default();
        let clock = FakeClock::default();
        let rec = GestureRecognizer::new(knob.clone(), clock.clone(), GestureConfig::default())
            .unwrap();
        let mut ctx = RenderContext::new(rec, RecordingDisplay::default(), bus);
        ctx.init();
        (ctx, knob, clock)
    }

    #[test]
    fn test_rotation_forwarded() {
        let bus = EventBus::new();
        let (mut ctx, knob, clock) = context(&bus);
        knob.count.set(8);
        clock.0.set(33);
        ctx.tick();
        assert_eq!(
            drain(&bus),
            [Event::with_value(EventKind::EncoderRotation, 2)]
        );
        ctx.tick();
        assert!(drain(&bus).is_empty());
    }

    #[test]
    fn test_click_cycle_events() {
        let bus = EventBus::new();
        let (mut ctx, knob, clock) = context(&bus);

        knob.pressed.set(true);
        clock.0.set(0);
        ctx.tick();
        clock.0.set(33);
        ctx.tick();
        assert_eq!(
            drain(&bus),
            [Event::with_value(EventKind::EncoderPressTime, 33)]
        );

        knob.pressed.set(false);
        clock.0.set(99);
        ctx.tick();
        assert_eq!(
            drain(&bus),
            [Event::with_value(EventKind::EncoderButtonReleased, 99)]
        );

        clock.0.set(600);
        ctx.tick();
        assert_eq!(kinds(&drain(&bus)), [EventKind::EncoderClick]);
    }

    #[test]
    fn test_double_click_forwarded() {
        let bus = EventBus::new();
        let (mut ctx, knob, clock) = context(&bus);

        for (ms, pressed) in [(0, true), (33, false), (66, true)] {
            knob.pressed.set(pressed);
            clock.0.set(ms);
            ctx.tick();
        }
        drain(&bus);

        knob.pressed.set(false);
        clock.0.set(99);
        ctx.tick();
        assert_eq!(
            drain(&bus),
            [
                Event::new(EventKind::EncoderDoubleClick),
                Event::with_value(EventKind::EncoderButtonReleased, 33),
            ]
        );

        // No single click trails the pair.
        clock.0.set(1000);
        ctx.tick();
        assert!(drain(&bus).is_empty());
    }

    #[test]
    fn test_ultra_long_press_forwarded_while_held() {
        let bus = EventBus::new();
        let (mut ctx, knob, clock) = context(&bus);

        knob.pressed.set(true);
        ctx.tick();
        clock.0.set(2000);
        ctx.tick();
        assert_eq!(kinds(&drain(&bus)), [EventKind::EncoderPressTime]);

        clock.0.set(3000);
        ctx.tick();
        assert_eq!(
            drain(&bus),
            [
                Event::new(EventKind::EncoderUltraLongPress),
                Event::with_value(EventKind::EncoderPressTime, 3000),
            ]
        );

        knob.pressed.set(false);
        clock.0.set(3100);
        ctx.tick();
        assert_eq!(
            drain(&bus),
            [Event::with_value(EventKind::EncoderButtonReleased, 3100)]
        );
    }

    #[test]
    fn test_press_and_rotate_carries_movement() {
        let bus = EventBus::new();
        let (mut ctx, knob, clock) = context(&bus);

        knob.pressed.set(true);
        ctx.tick();
        knob.count.set(4);
        clock.0.set(33);
        ctx.tick();
        let events = drain(&bus);
        assert_eq!(
            events[0],
            Event::with_value(EventKind::EncoderPressAndRotate, 1)
        );
        assert_eq!(events[1].kind(), EventKind::EncoderPressTime);

        knob.count.set(12);
        clock.0.set(66);
        ctx.tick();
        assert_eq!(
            drain(&bus)[0],
            Event::with_value(EventKind::EncoderPressAndRotate, 2)
        );

        // No rotation this tick, so only the press time.
        clock.0.set(99);
        ctx.tick();
        assert_eq!(kinds(&drain(&bus)), [EventKind::EncoderPressTime]);
    }

    #[test]
    fn test_display_receives_coordinator_events() {
        let bus = EventBus::new();
        let (mut ctx, _, _) = context(&bus);
        bus.send_to_ui(Event::new(EventKind::DisplayWakeUp));
        bus.send_to_ui(Event::with_value(EventKind::EncoderRotation, -1));
        ctx.tick();

        let display = ctx.display();
        assert_eq!(
            kinds(&display.events.borrow()),
            [EventKind::DisplayWakeUp, EventKind::EncoderRotation]
        );
        assert_eq!(display.frames.get(), 1);
    }
}
