//! Keyed finite state machine

use crate::error::{Error, Result};
use crate::state::{SimpleState, State};
use lazy_rx::{ObservableExt, SharedObservable, SimpleEvent, Subscription};
use rustc_hash::FxHashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// Published when the machine switches states
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateToggle<S> {
    pub from: S,
    pub to: S,
}

enum Slot<S> {
    Simple(SimpleState<S>),
    Custom(Box<dyn State<S>>),
}

impl<S> Slot<S> {
    fn state(&self) -> &dyn State<S> {
        match self {
            Slot::Simple(state) => state,
            Slot::Custom(state) => state.as_ref(),
        }
    }

    fn state_mut(&mut self) -> &mut dyn State<S> {
        match self {
            Slot::Simple(state) => state,
            Slot::Custom(state) => state.as_mut(),
        }
    }
}

/// A state machine whose states are registered under keys of type `S`.
///
/// The machine is driven from outside: call [`update`](Self::update) once per
/// frame and [`toggle_state`](Self::toggle_state) to request a switch. A switch
/// happens only when the target's condition accepts the current key.
pub struct FiniteStateMachine<S> {
    states: FxHashMap<S, Slot<S>>,
    current: Option<S>,
    previous: Option<S>,
    /// Frames spent in the current state
    frame_count: u64,
    /// Seconds spent in the current state
    seconds: f32,
    toggled: SimpleEvent<StateToggle<S>>,
}

impl<S> FiniteStateMachine<S>
where
    S: Eq + Hash + Clone + Debug + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            states: FxHashMap::default(),
            current: None,
            previous: None,
            frame_count: 0,
            seconds: 0.0,
            toggled: SimpleEvent::new(),
        }
    }

    /// The closure-backed state for `key`, inserted if missing
    pub fn define_state(&mut self, key: S) -> Result<&mut SimpleState<S>> {
        let name = format!("{key:?}");
        match self.states.entry(key).or_insert_with(|| Slot::Simple(SimpleState::new())) {
            Slot::Simple(state) => Ok(state),
            Slot::Custom(_) => Err(Error::NotSimpleState(name)),
        }
    }

    /// Register a custom state
    pub fn add_state<T>(&mut self, key: S, state: T) -> Result<()>
    where
        T: State<S> + 'static,
    {
        if self.states.contains_key(&key) {
            return Err(Error::DuplicateState(format!("{key:?}")));
        }
        self.states.insert(key, Slot::Custom(Box::new(state)));
        Ok(())
    }

    /// Enter `key` without checking its condition.
    ///
    /// Resets the frame counter to 0. A state that is already running is not
    /// exited.
    pub fn start_state(&mut self, key: S) -> Result<()> {
        let slot = self
            .states
            .get_mut(&key)
            .ok_or_else(|| Error::UnknownState(format!("{key:?}")))?;
        self.previous = Some(key.clone());
        self.current = Some(key);
        self.frame_count = 0;
        self.seconds = 0.0;
        slot.state_mut().enter();
        tracing::debug!(state = ?self.current, "state machine started");
        Ok(())
    }

    /// Switch to `key` if its condition accepts the current state.
    ///
    /// Returns `Ok(false)` when `key` is already current, when no state is
    /// running, or when the condition rejects the switch.
    pub fn toggle_state(&mut self, key: S) -> Result<bool> {
        if self.current.as_ref() == Some(&key) {
            return Ok(false);
        }
        let target = self
            .states
            .get(&key)
            .ok_or_else(|| Error::UnknownState(format!("{key:?}")))?;
        let Some(from) = self.current.clone() else {
            return Ok(false);
        };
        if !target.state().condition(&from) {
            return Ok(false);
        }

        if let Some(slot) = self.states.get_mut(&from) {
            slot.state_mut().exit();
        }
        self.previous = Some(from.clone());
        self.current = Some(key.clone());
        tracing::debug!(from = ?from, to = ?key, "state toggled");
        self.toggled.fire(StateToggle {
            from,
            to: key.clone(),
        })?;
        self.frame_count = 1;
        self.seconds = 0.0;
        if let Some(slot) = self.states.get_mut(&key) {
            slot.state_mut().enter();
        }
        Ok(true)
    }

    /// Run the current state's update and advance the counters
    pub fn update(&mut self, delta: f32) {
        if let Some(slot) = self.current_slot_mut() {
            slot.state_mut().update(delta);
        }
        self.frame_count += 1;
        self.seconds += delta;
    }

    pub fn fixed_update(&mut self) {
        if let Some(slot) = self.current_slot_mut() {
            slot.state_mut().fixed_update();
        }
    }

    /// Exit the current state and remove every state
    pub fn end(&mut self) {
        if let Some(slot) = self.current_slot_mut() {
            slot.state_mut().exit();
        }
        self.current = None;
        self.states.clear();
        tracing::debug!("state machine ended");
    }

    pub fn current_state_key(&self) -> Option<&S> {
        self.current.as_ref()
    }

    pub fn previous_state_key(&self) -> Option<&S> {
        self.previous.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn seconds_in_state(&self) -> f32 {
        self.seconds
    }

    pub fn contains(&self, key: &S) -> bool {
        self.states.contains_key(key)
    }

    /// Number of registered states
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Stream of state switches
    pub fn state_toggled(&self) -> SharedObservable<StateToggle<S>> {
        Arc::new(self.toggled.clone())
    }

    /// Call `f(from, to)` on every switch
    pub fn on_state_toggled<F>(&self, f: F) -> Result<Subscription>
    where
        F: Fn(&S, &S) + Send + Sync + 'static,
    {
        let subscription = self
            .toggled
            .subscribe_fn(move |toggle: StateToggle<S>| f(&toggle.from, &toggle.to))?;
        Ok(subscription)
    }

    fn current_slot_mut(&mut self) -> Option<&mut Slot<S>> {
        let key = self.current.as_ref()?;
        self.states.get_mut(key)
    }
}

impl<S> Default for FiniteStateMachine<S>
where
    S: Eq + Hash + Clone + Debug + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Drop for FiniteStateMachine<S> {
    fn drop(&mut self) {
        self.toggled.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Phase {
        Idle,
        Run,
        Jump,
    }

    #[test]
    fn test_define_state_returns_existing() {
        let mut fsm = FiniteStateMachine::new();
        fsm.define_state(Phase::Idle).unwrap().on_enter(|| {});
        fsm.define_state(Phase::Idle).unwrap();
        assert_eq!(fsm.len(), 1);
    }

    #[test]
    fn test_define_state_on_custom_state_fails() {
        struct Custom;
        impl State<Phase> for Custom {}

        let mut fsm = FiniteStateMachine::new();
        fsm.add_state(Phase::Run, Custom).unwrap();
        assert!(matches!(fsm.define_state(Phase::Run), Err(Error::NotSimpleState(_))));
        assert!(matches!(
            fsm.add_state(Phase::Run, Custom),
            Err(Error::DuplicateState(_))
        ));
    }

    #[test]
    fn test_unknown_states() {
        let mut fsm = FiniteStateMachine::<Phase>::new();
        assert!(matches!(fsm.start_state(Phase::Idle), Err(Error::UnknownState(_))));
        fsm.define_state(Phase::Idle).unwrap();
        fsm.start_state(Phase::Idle).unwrap();
        assert!(matches!(fsm.toggle_state(Phase::Jump), Err(Error::UnknownState(_))));
    }

    #[test]
    fn test_toggle_requires_running_machine() {
        let mut fsm = FiniteStateMachine::new();
        fsm.define_state(Phase::Idle).unwrap();
        fsm.define_state(Phase::Run).unwrap();
        assert!(!fsm.toggle_state(Phase::Run).unwrap());
        assert!(fsm.current_state_key().is_none());
    }

    #[test]
    fn test_frame_counter() {
        let mut fsm = FiniteStateMachine::new();
        fsm.define_state(Phase::Idle).unwrap();
        fsm.define_state(Phase::Run).unwrap();
        fsm.start_state(Phase::Idle).unwrap();
        assert_eq!(fsm.frame_count(), 0);

        fsm.update(0.25);
        fsm.update(0.25);
        assert_eq!(fsm.frame_count(), 2);
        assert!((fsm.seconds_in_state() - 0.5).abs() < f32::EPSILON);

        fsm.toggle_state(Phase::Run).unwrap();
        assert_eq!(fsm.frame_count(), 1);
        assert_eq!(fsm.seconds_in_state(), 0.0);
    }

    #[test]
    fn test_end_exits_and_clears() {
        let exits = Arc::new(Mutex::new(0));
        let e = exits.clone();
        let mut fsm = FiniteStateMachine::new();
        fsm.define_state(Phase::Idle)
            .unwrap()
            .on_exit(move || *e.lock().unwrap() += 1);
        fsm.start_state(Phase::Idle).unwrap();
        fsm.end();

        assert_eq!(*exits.lock().unwrap(), 1);
        assert!(!fsm.is_running());
        assert!(fsm.is_empty());
    }
}
