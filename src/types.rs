// src/types.rs
use serde::{Deserialize, Serialize};

/// Timestamp column shared by every source table.
pub const TIME_COLUMN: &str = "RECORDED_TIME";

// Source tables polled by the dashboard
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, Serialize, Deserialize)]
pub enum TableKind {
    Accelerometer,
    Statistics,
}

impl TableKind {
    pub const ALL: [TableKind; 2] = [TableKind::Accelerometer, TableKind::Statistics];

    pub fn table_name(&self) -> &'static str {
        match self {
            TableKind::Accelerometer => "AccelerometerData",
            TableKind::Statistics => "StatisticsData",
        }
    }

    /// Value columns the table is expected to carry, in display order.
    pub fn value_columns(&self) -> Vec<&'static str> {
        Quantity::ALL
            .iter()
            .filter(|q| q.table() == *self)
            .flat_map(|q| Axis::ALL.iter().map(move |a| Channel::new(*q, *a).column()))
            .collect()
    }
}

#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn label(&self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// What a channel measures
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, Serialize, Deserialize)]
pub enum Quantity {
    Acceleration,
    MeanSquaredError,
    StdDeviation,
    PeakFrequency,
}

impl Quantity {
    pub const ALL: [Quantity; 4] = [
        Quantity::Acceleration,
        Quantity::MeanSquaredError,
        Quantity::StdDeviation,
        Quantity::PeakFrequency,
    ];

    pub fn table(&self) -> TableKind {
        match self {
            Quantity::Acceleration => TableKind::Accelerometer,
            _ => TableKind::Statistics,
        }
    }

    /// Short key used for file names and summaries.
    pub fn key(&self) -> &'static str {
        match self {
            Quantity::Acceleration => "xyz",
            Quantity::MeanSquaredError => "mse",
            Quantity::StdDeviation => "std",
            Quantity::PeakFrequency => "peak",
        }
    }

    pub fn surface_title(&self) -> &'static str {
        match self {
            Quantity::Acceleration => "3D Surface for XYZ Axis",
            Quantity::MeanSquaredError => "3D Surface for MSE Data",
            Quantity::StdDeviation => "3D Surface for STD Data",
            Quantity::PeakFrequency => "3D Surface for Peak Frequency Data",
        }
    }

    /// The three channels of this quantity, in x/y/z order.
    pub fn channels(&self) -> [Channel; 3] {
        Axis::ALL.map(|axis| Channel::new(*self, axis))
    }
}

/// A semantic channel (one quantity on one axis), resolved once to its table column.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Channel {
    pub quantity: Quantity,
    pub axis: Axis,
}

impl Channel {
    pub const fn new(quantity: Quantity, axis: Axis) -> Self {
        Self { quantity, axis }
    }

    pub fn table(&self) -> TableKind {
        self.quantity.table()
    }

    pub fn column(&self) -> &'static str {
        match (self.quantity, self.axis) {
            (Quantity::Acceleration, Axis::X) => "XOUT",
            (Quantity::Acceleration, Axis::Y) => "YOUT",
            (Quantity::Acceleration, Axis::Z) => "ZOUT",
            (Quantity::MeanSquaredError, Axis::X) => "MSE_X",
            (Quantity::MeanSquaredError, Axis::Y) => "MSE_Y",
            (Quantity::MeanSquaredError, Axis::Z) => "MSE_Z",
            (Quantity::StdDeviation, Axis::X) => "STD_X",
            (Quantity::StdDeviation, Axis::Y) => "STD_Y",
            (Quantity::StdDeviation, Axis::Z) => "STD_Z",
            (Quantity::PeakFrequency, Axis::X) => "PEAK_FREQ_X",
            (Quantity::PeakFrequency, Axis::Y) => "PEAK_FREQ_Y",
            (Quantity::PeakFrequency, Axis::Z) => "PEAK_FREQ_Z",
        }
    }

    pub fn title(&self) -> String {
        match self.quantity {
            Quantity::Acceleration => format!("Time Series Data for {}", self.column()),
            Quantity::MeanSquaredError => format!("Mean Squared Error (MSE) for {}", self.axis),
            Quantity::StdDeviation => format!("Standard Deviation (STD) for {}", self.axis),
            Quantity::PeakFrequency => format!("Peak Frequency for {}", self.axis),
        }
    }

    /// Every channel shown on the dashboard, grouped by quantity.
    pub fn all() -> impl Iterator<Item = Channel> {
        Quantity::ALL.into_iter().flat_map(|q| q.channels())
    }
}

/// Latest reading on the three axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisReading {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl AxisReading {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

// How a spectrum is drawn
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpectrumStyle {
    #[default]
    Bars,
    Lines,
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn channels_resolve_to_their_tables() {
        let peak_x = Channel::new(Quantity::PeakFrequency, Axis::X);
        assert_eq!(peak_x.column(), "PEAK_FREQ_X");
        assert_eq!(peak_x.table(), TableKind::Statistics);
        assert_eq!(peak_x.title(), "Peak Frequency for X");
        let accel_z = Channel::new(Quantity::Acceleration, Axis::Z);
        assert_eq!(accel_z.table(), TableKind::Accelerometer);
        assert_eq!(accel_z.title(), "Time Series Data for ZOUT");
    }
    #[test]
    fn tables_list_their_columns() {
        assert_eq!(
            TableKind::Accelerometer.value_columns(),
            vec!["XOUT", "YOUT", "ZOUT"]
        );
        assert_eq!(TableKind::Statistics.value_columns().len(), 9);
        assert_eq!(Channel::all().count(), 12);
    }
}
