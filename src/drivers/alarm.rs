use std::fmt;
use serde::Serialize;
use crate::types::{Axis, AxisReading};
/// Acceleration magnitude (per axis) above which an alarm is raised.
pub const DEFAULT_ALARM_LIMIT: f64 = 9.0;
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlarmMessage {
    pub axis: Axis,
    pub value: f64,
    pub limit: f64,
}
impl fmt::Display for AlarmMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} axis reading {:.2} exceeds limit ±{:.2}",
            self.axis, self.value, self.limit
        )
    }
}
/// Checks only the single most recent reading of a window, one alarm per axis
/// whose magnitude is strictly above `limit`.
pub fn check_alarms(latest: &AxisReading, limit: f64) -> Vec<AlarmMessage> {
    Axis::ALL
        .iter()
        .map(|&axis| (axis, latest.get(axis)))
        .filter(|(_, value)| value.abs() > limit)
        .map(|(axis, value)| AlarmMessage { axis, value, limit })
        .collect()
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn only_the_x_axis_alarms() {
        let alarms = check_alarms(&AxisReading::new(10.0, 0.0, 0.0), 9.0);
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].axis, Axis::X);
        assert_eq!(
            alarms[0].to_string(),
            "X axis reading 10.00 exceeds limit ±9.00"
        );
    }
    #[test]
    fn readings_within_limit_are_quiet() {
        assert!(check_alarms(&AxisReading::new(5.0, 5.0, 5.0), 9.0).is_empty());
        assert!(check_alarms(&AxisReading::new(9.0, -9.0, 9.0), DEFAULT_ALARM_LIMIT).is_empty());
    }
    #[test]
    fn negative_readings_use_magnitude() {
        let alarms = check_alarms(&AxisReading::new(0.0, -12.5, 9.5), 9.0);
        let axes: Vec<Axis> = alarms.iter().map(|a| a.axis).collect();
        assert_eq!(axes, vec![Axis::Y, Axis::Z]);
    }
}
