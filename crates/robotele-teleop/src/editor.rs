//! Robot configuration editing

use robotele_core::robot::RobotConfiguration;

/// Lets the operator edit the robot configuration
pub trait ConfigurationEditor: Send {
    /// Edit `current`. `None` means the operator cancelled.
    fn edit(&mut self, current: &RobotConfiguration) -> Option<RobotConfiguration>;
}

/// Editor for sessions without an operator panel; always cancels
#[derive(Debug, Clone, Copy, Default)]
pub struct CancelEditor;

impl ConfigurationEditor for CancelEditor {
    fn edit(&mut self, current: &RobotConfiguration) -> Option<RobotConfiguration> {
        tracing::info!("No configuration editor available, keeping {:?}", current);
        None
    }
}
