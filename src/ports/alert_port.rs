//! Alert persistence port trait.

use crate::domain::alert::Alert;
use crate::domain::error::GrainError;

pub trait AlertPort {
    fn insert_alert(&self, alert: &Alert) -> Result<(), GrainError>;

    fn get_alert(&self, id: &str) -> Result<Option<Alert>, GrainError>;

    /// Returns `false` when no such record exists.
    fn replace_alert(&self, alert: &Alert) -> Result<bool, GrainError>;

    /// Returns `false` when no such record exists.
    fn delete_alert(&self, id: &str) -> Result<bool, GrainError>;

    /// Every alert, in insertion order.
    fn list_alerts(&self) -> Result<Vec<Alert>, GrainError>;
}
