//! States and their lifecycle hooks

/// An action run on a lifecycle hook
pub type Action = Box<dyn FnMut() + Send>;

/// An action run on every update with the frame delta in seconds
pub type UpdateAction = Box<dyn FnMut(f32) + Send>;

/// A guard that decides whether a state may be entered from the current one
pub type Condition<S> = Box<dyn Fn(&S) -> bool + Send>;

/// A state of a [`FiniteStateMachine`](crate::FiniteStateMachine).
///
/// Every hook has a no-op default; `condition` allows entry by default.
pub trait State<S>: Send {
    /// Whether the machine may switch to this state from `current`
    fn condition(&self, _current: &S) -> bool {
        true
    }

    fn enter(&mut self) {}

    fn update(&mut self, _delta: f32) {}

    fn fixed_update(&mut self) {}

    fn exit(&mut self) {}
}

/// Closure-backed state, configured in place:
///
/// ```
/// use lazy_fsm::FiniteStateMachine;
///
/// #[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// enum Door { Open, Closed }
///
/// let mut fsm = FiniteStateMachine::new();
/// fsm.define_state(Door::Open)
///     .unwrap()
///     .on_condition(|current| *current == Door::Closed)
///     .on_enter(|| println!("creak"));
/// fsm.define_state(Door::Closed).unwrap();
///
/// fsm.start_state(Door::Closed).unwrap();
/// assert!(fsm.toggle_state(Door::Open).unwrap());
/// ```
pub struct SimpleState<S> {
    condition: Option<Condition<S>>,
    enter: Option<Action>,
    update: Option<UpdateAction>,
    fixed_update: Option<Action>,
    exit: Option<Action>,
}

impl<S> SimpleState<S> {
    pub fn new() -> Self {
        Self {
            condition: None,
            enter: None,
            update: None,
            fixed_update: None,
            exit: None,
        }
    }

    /// Set the entry guard
    pub fn on_condition<F: Fn(&S) -> bool + Send + 'static>(&mut self, condition: F) -> &mut Self {
        self.condition = Some(Box::new(condition));
        self
    }

    pub fn on_enter<F: FnMut() + Send + 'static>(&mut self, action: F) -> &mut Self {
        self.enter = Some(Box::new(action));
        self
    }

    pub fn on_update<F: FnMut(f32) + Send + 'static>(&mut self, action: F) -> &mut Self {
        self.update = Some(Box::new(action));
        self
    }

    pub fn on_fixed_update<F: FnMut() + Send + 'static>(&mut self, action: F) -> &mut Self {
        self.fixed_update = Some(Box::new(action));
        self
    }

    pub fn on_exit<F: FnMut() + Send + 'static>(&mut self, action: F) -> &mut Self {
        self.exit = Some(Box::new(action));
        self
    }
}

impl<S> Default for SimpleState<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> State<S> for SimpleState<S> {
    fn condition(&self, current: &S) -> bool {
        self.condition.as_ref().map_or(true, |guard| guard(current))
    }

    fn enter(&mut self) {
        if let Some(action) = &mut self.enter {
            action();
        }
    }

    fn update(&mut self, delta: f32) {
        if let Some(action) = &mut self.update {
            action(delta);
        }
    }

    fn fixed_update(&mut self) {
        if let Some(action) = &mut self.fixed_update {
            action();
        }
    }

    fn exit(&mut self) {
        if let Some(action) = &mut self.exit {
            action();
        }
    }
}
