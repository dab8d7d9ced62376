//! Start/end "pick a point on the map" mode.
//!
//! The picking click handler is bound iff the mode is not `Idle`, and at most one
//! is ever bound: every transition unbinds the previous handler before anything
//! else happens.

use super::engine::{Cursor, HandlerId, MapEngine, MapHandler};
use crate::models::{EndpointKind, InteractionMode};

#[derive(Debug, Default)]
pub struct PickingMachine {
    mode: InteractionMode,
    bound: Option<HandlerId>,
}

/// Mode reached by pressing the picking button for `kind` while in `current`.
/// Pressing the button of the active endpoint toggles back to `Idle`.
#[must_use]
pub fn toggled(current: InteractionMode, kind: EndpointKind) -> InteractionMode {
    let requested = kind.picking_mode();
    if current == requested {
        InteractionMode::Idle
    } else {
        requested
    }
}

impl PickingMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    #[must_use]
    pub fn bound_handler(&self) -> Option<HandlerId> {
        self.bound
    }

    /// Move to `target`. `make_handler` builds the click callback for the endpoint
    /// being picked; it is only called when a picking state is entered.
    pub fn enter<E, F>(&mut self, engine: Option<&E>, target: InteractionMode, make_handler: F)
    where
        E: MapEngine,
        F: FnOnce(EndpointKind) -> MapHandler,
    {
        self.unbind(engine);

        let (Some(engine), Some(kind)) = (engine, target.target()) else {
            self.mode = InteractionMode::Idle;
            return;
        };

        engine.set_cursor(Cursor::Crosshair);
        self.bound = Some(engine.on_click(make_handler(kind)));
        self.mode = target;
    }

    /// Toggle picking for `kind`
    pub fn toggle<E, F>(&mut self, engine: Option<&E>, kind: EndpointKind, make_handler: F)
    where
        E: MapEngine,
        F: FnOnce(EndpointKind) -> MapHandler,
    {
        let target = toggled(self.mode, kind);
        self.enter(engine, target, make_handler);
    }

    /// Return to `Idle`, unbinding the picking handler and clearing the crosshair
    pub fn cancel<E: MapEngine>(&mut self, engine: Option<&E>) {
        self.unbind(engine);
        self.mode = InteractionMode::Idle;
    }

    fn unbind<E: MapEngine>(&mut self, engine: Option<&E>) {
        let was_picking = self.mode.is_picking();
        let bound = self.bound.take();
        if let Some(engine) = engine {
            if let Some(id) = bound {
                engine.off(id);
            }
            if was_picking {
                engine.set_cursor(Cursor::Default);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::map::engine::MapEvent;
    use crate::map::headless::{HeadlessEngine, HeadlessSurface};
    use crate::models::LngLat;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine() -> HeadlessEngine {
        HeadlessEngine::initialize(&HeadlessSurface::default(), &MapConfig::with_token("pk.test"))
            .expect("engine should start")
    }

    fn recorder(log: &Rc<RefCell<Vec<EndpointKind>>>) -> impl FnOnce(EndpointKind) -> MapHandler {
        let log = Rc::clone(log);
        move |kind| Rc::new(move |_| log.borrow_mut().push(kind))
    }

    #[test]
    fn test_toggle_table() {
        use InteractionMode::{Idle, PickingEnd, PickingStart};
        assert_eq!(toggled(Idle, EndpointKind::Start), PickingStart);
        assert_eq!(toggled(PickingStart, EndpointKind::Start), Idle);
        assert_eq!(toggled(PickingStart, EndpointKind::End), PickingEnd);
        assert_eq!(toggled(PickingEnd, EndpointKind::End), Idle);
    }

    #[test]
    fn test_entering_picking_binds_and_sets_crosshair() {
        let engine = engine();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut machine = PickingMachine::new();

        machine.toggle(Some(&engine), EndpointKind::Start, recorder(&log));
        assert_eq!(machine.mode(), InteractionMode::PickingStart);
        assert_eq!(engine.cursor(), Cursor::Crosshair);
        assert_eq!(engine.handler_count(&MapEvent::Click), 1);

        engine.click_at(LngLat::new(0.0, 0.0));
        assert_eq!(*log.borrow(), vec![EndpointKind::Start]);

        machine.toggle(Some(&engine), EndpointKind::Start, recorder(&log));
        assert_eq!(machine.mode(), InteractionMode::Idle);
        assert_eq!(engine.cursor(), Cursor::Default);
        assert_eq!(engine.handler_count(&MapEvent::Click), 0);
    }

    #[test]
    fn test_switching_endpoint_rebinds_target() {
        let engine = engine();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut machine = PickingMachine::new();

        machine.toggle(Some(&engine), EndpointKind::Start, recorder(&log));
        machine.toggle(Some(&engine), EndpointKind::End, recorder(&log));

        assert_eq!(machine.mode(), InteractionMode::PickingEnd);
        assert_eq!(engine.handler_count(&MapEvent::Click), 1);
        assert_eq!(engine.cursor(), Cursor::Crosshair);

        engine.click_at(LngLat::new(0.0, 0.0));
        assert_eq!(*log.borrow(), vec![EndpointKind::End]);
    }

    #[test]
    fn test_without_engine_stays_idle() {
        let mut machine = PickingMachine::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        machine.toggle(None::<&HeadlessEngine>, EndpointKind::End, recorder(&log));
        assert_eq!(machine.mode(), InteractionMode::Idle);
        assert!(machine.bound_handler().is_none());
    }

    #[test]
    fn test_any_action_sequence_binds_at_most_one_handler() {
        // 0 = toggle start, 1 = toggle end, 2 = cancel, 3 = toggle start twice
        const ACTIONS: usize = 4;
        const LENGTH: u32 = 6;

        for seed in 0..ACTIONS.pow(LENGTH) {
            let engine = engine();
            let log = Rc::new(RefCell::new(Vec::new()));
            let mut machine = PickingMachine::new();
            let mut rest = seed;

            for _ in 0..LENGTH {
                match rest % ACTIONS {
                    0 => machine.toggle(Some(&engine), EndpointKind::Start, recorder(&log)),
                    1 => machine.toggle(Some(&engine), EndpointKind::End, recorder(&log)),
                    2 => machine.cancel(Some(&engine)),
                    _ => {
                        machine.toggle(Some(&engine), EndpointKind::Start, recorder(&log));
                        machine.toggle(Some(&engine), EndpointKind::Start, recorder(&log));
                    }
                }
                rest /= ACTIONS;

                let bound = engine.handler_count(&MapEvent::Click);
                assert!(bound <= 1, "sequence {seed} bound {bound} handlers");
                assert_eq!(bound == 1, machine.mode().is_picking(), "sequence {seed}");
                let expected_cursor = if machine.mode().is_picking() { Cursor::Crosshair } else { Cursor::Default };
                assert_eq!(engine.cursor(), expected_cursor, "sequence {seed}");
            }
        }
    }
}
