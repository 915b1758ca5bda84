//! Actuator state machine definition
//!
//! Valve behavior is a function of the current state and an event. The
//! controller derives events from the status bus and the application mode,
//! and runs the entry action for whatever state the transition lands in.

/// Controller states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlState {
    /// Power-on; outputs held off until boot finishes
    Init,
    /// Operator jogs the plate with the up/down buttons
    Manual,
    /// Control policy drives the valves from sensor readings
    Auto,
    /// Raise valve held by the operator
    ForcedUp,
    /// Lower valve held by the operator
    ForcedDown,
    /// Fatal error active; outputs off
    Error,
}

/// Controller events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlEvent {
    /// Boot gate cleared
    Loaded,
    AutoRequested,
    ManualRequested,
    /// Sensor mode changed while in auto; reload tuning
    Retune,
    PlateUp,
    PlateDown,
    PlateStop,
    ErrorDetected,
    ErrorsCleared,
}

impl ControlState {
    /// Check if this state may energize a valve
    pub fn outputs_allowed(&self) -> bool {
        matches!(
            self,
            ControlState::Auto | ControlState::ForcedUp | ControlState::ForcedDown
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ControlState::Error)
    }

    /// Process an event and return the next state
    ///
    /// Unlisted combinations leave the state unchanged.
    pub fn transition(self, event: ControlEvent) -> Self {
        use ControlEvent::*;
        use ControlState::*;

        match (self, event) {
            (Init, Loaded) => Manual,

            (Manual, AutoRequested) => Auto,
            (Manual, PlateUp) => ForcedUp,
            (Manual, PlateDown) => ForcedDown,
            (Manual, PlateStop) => Manual,

            (Auto, Retune) => Auto,
            (Auto, ManualRequested) => Manual,

            (ForcedUp, PlateStop) => Manual,
            (ForcedDown, PlateStop) => Manual,

            (Error, ErrorsCleared) => Manual,

            (_, ErrorDetected) => Error,

            (state, _) => state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boot_to_manual() {
        assert_eq!(
            ControlState::Init.transition(ControlEvent::Loaded),
            ControlState::Manual
        );
        assert_eq!(
            ControlState::Init.transition(ControlEvent::AutoRequested),
            ControlState::Init
        );
    }

    #[test]
    fn test_manual_auto_cycle() {
        let state = ControlState::Manual.transition(ControlEvent::AutoRequested);
        assert_eq!(state, ControlState::Auto);
        assert_eq!(state.transition(ControlEvent::Retune), ControlState::Auto);
        assert_eq!(
            state.transition(ControlEvent::ManualRequested),
            ControlState::Manual
        );
    }

    #[test]
    fn test_forced_states() {
        let up = ControlState::Manual.transition(ControlEvent::PlateUp);
        assert_eq!(up, ControlState::ForcedUp);
        assert_eq!(up.transition(ControlEvent::PlateStop), ControlState::Manual);
        // Jog commands cannot switch direction without passing through Manual
        assert_eq!(up.transition(ControlEvent::PlateDown), ControlState::ForcedUp);

        let down = ControlState::Manual.transition(ControlEvent::PlateDown);
        assert_eq!(down, ControlState::ForcedDown);
        assert_eq!(down.transition(ControlEvent::PlateStop), ControlState::Manual);
    }

    #[test]
    fn test_auto_ignores_jog() {
        assert_eq!(
            ControlState::Auto.transition(ControlEvent::PlateUp),
            ControlState::Auto
        );
    }

    #[test]
    fn test_errors_from_every_running_state() {
        for state in [
            ControlState::Init,
            ControlState::Manual,
            ControlState::Auto,
            ControlState::ForcedUp,
            ControlState::ForcedDown,
            ControlState::Error,
        ] {
            assert_eq!(
                state.transition(ControlEvent::ErrorDetected),
                ControlState::Error
            );
        }
    }

    #[test]
    fn test_error_clears_to_manual() {
        assert_eq!(
            ControlState::Error.transition(ControlEvent::ErrorsCleared),
            ControlState::Manual
        );
        assert_eq!(
            ControlState::Error.transition(ControlEvent::AutoRequested),
            ControlState::Error
        );
    }

    #[test]
    fn test_outputs_allowed() {
        assert!(!ControlState::Init.outputs_allowed());
        assert!(!ControlState::Manual.outputs_allowed());
        assert!(!ControlState::Error.outputs_allowed());
        assert!(ControlState::Auto.outputs_allowed());
        assert!(ControlState::ForcedUp.outputs_allowed());
    }
}
