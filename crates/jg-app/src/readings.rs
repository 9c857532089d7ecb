//! Latest pressure sensor readings reported by `?`.

/// Number of pressure sensors on the grid.
pub const N_SENSORS: usize = 4;

/// Pressures as acquired by the sensor frontend. `NaN` until first set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readings {
    /// Loop current [mA]
    pub pressure_ma: [f32; N_SENSORS],
    /// Pressure [bar]
    pub pressure_bar: [f32; N_SENSORS],
}

impl Default for Readings {
    fn default() -> Self {
        Self {
            pressure_ma: [f32::NAN; N_SENSORS],
            pressure_bar: [f32::NAN; N_SENSORS],
        }
    }
}

impl Readings {
    /// Tab separated status line: 1-based position, currents, pressures.
    pub fn status_line(&self, position: usize) -> String {
        let mut fields = Vec::with_capacity(1 + 2 * N_SENSORS);
        fields.push(position.to_string());
        fields.extend(self.pressure_ma.iter().map(|v| format!("{v:.2}")));
        fields.extend(self.pressure_bar.iter().map(|v| format!("{v:.3}")));
        fields.join("\t")
    }
}
