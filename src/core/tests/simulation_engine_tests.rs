// Tests for SimulationEngine scheduling
#[cfg(test)]
mod tests {
    use super::super::{Script, Step, Trace};
    use crate::core::errors::SimError;
    use crate::core::execution::{SimulationEngine, SimulationObserver};
    use crate::core::process::Wait;
    use crate::core::types::SimTime;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn order(engine: &SimulationEngine<Trace>) -> Vec<(SimTime, String, String)> {
        engine.model().entries.clone()
    }

    fn entry(time: SimTime, process: &str, what: &str) -> (SimTime, String, String) {
        (time, process.to_string(), what.to_string())
    }

    #[test]
    fn test_same_time_resumptions_follow_insertion_order() {
        let mut engine = SimulationEngine::new(Trace::default());
        engine.spawn(Script::new("a", vec![Step::Wait(Wait::Timeout(5.0))]));
        engine.spawn(Script::new("b", vec![Step::Wait(Wait::Timeout(5.0))]));
        engine.spawn(Script::new("c", vec![Step::Wait(Wait::Timeout(5.0))]));

        engine.run(f64::INFINITY).unwrap();

        let at_five: Vec<String> = order(&engine)
            .into_iter()
            .filter(|(time, _, _)| *time == 5.0)
            .map(|(_, name, _)| name)
            .collect();
        assert_eq!(at_five, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_zero_delay_runs_after_ready_work() {
        let mut engine = SimulationEngine::new(Trace::default());
        engine.spawn(Script::new("a", vec![Step::Wait(Wait::Timeout(0.0))]));
        engine.spawn(Script::new("b", vec![]));

        engine.run(f64::INFINITY).unwrap();

        assert_eq!(
            order(&engine),
            vec![
                entry(0.0, "a", "start"),
                entry(0.0, "b", "start"),
                entry(0.0, "a", "elapsed"),
            ]
        );
    }

    #[test]
    fn test_run_stops_before_horizon() {
        let mut engine = SimulationEngine::new(Trace::default());
        engine.spawn(Script::new("a", vec![Step::Wait(Wait::Timeout(10.0))]));

        let stopped = engine.run(5.0).unwrap();
        assert_eq!(stopped, 5.0);
        assert_eq!(order(&engine), vec![entry(0.0, "a", "start")]);
        assert_eq!(engine.pending_events(), 1);

        // An event due exactly at the horizon is left for the next run
        assert_eq!(engine.run(10.0).unwrap(), 10.0);
        assert_eq!(order(&engine).len(), 1);

        assert_eq!(engine.run(20.0).unwrap(), 20.0);
        assert_eq!(order(&engine).last(), Some(&entry(10.0, "a", "elapsed")));
        assert_eq!(engine.live_processes(), 0);
    }

    #[test]
    fn test_step_reports_remaining_events() {
        let mut engine = SimulationEngine::new(Trace::default());
        engine.spawn(Script::new("a", vec![Step::Wait(Wait::Timeout(1.0))]));

        assert!(engine.step().unwrap());
        assert!(!engine.step().unwrap());
        assert!(!engine.step().unwrap());
        assert_eq!(engine.now(), 1.0);
    }

    #[test]
    fn test_negative_delay_is_fatal() {
        let mut engine = SimulationEngine::new(Trace::default());
        engine.spawn(Script::new("a", vec![Step::Wait(Wait::Timeout(-1.0))]));

        let result = engine.run(f64::INFINITY);
        assert!(matches!(result, Err(SimError::InvalidDelay(_))));
    }

    struct Advances(Rc<RefCell<Vec<(SimTime, SimTime)>>>);

    impl SimulationObserver<Trace> for Advances {
        fn on_time_advance(&mut self, old_time: SimTime, new_time: SimTime) {
            self.0.borrow_mut().push((old_time, new_time));
        }

        fn on_step_complete(&mut self, _now: SimTime, _model: &Trace) {}
    }

    #[test]
    fn test_observer_sees_each_clock_advance() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut engine = SimulationEngine::new(Trace::default());
        engine.add_observer(Box::new(Advances(seen.clone())));
        engine.spawn(Script::new(
            "a",
            vec![Step::Wait(Wait::Timeout(2.0)), Step::Wait(Wait::Timeout(3.0))],
        ));
        engine.spawn(Script::new("b", vec![Step::Wait(Wait::Timeout(2.0))]));

        engine.run(10.0).unwrap();

        assert_eq!(*seen.borrow(), vec![(0.0, 2.0), (2.0, 5.0), (5.0, 10.0)]);
    }
}
