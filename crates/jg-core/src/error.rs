use core::fmt;
use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Coordinate out of range: ({x}, {y})")]
    OutOfRangeCoordinate { x: i8, y: i8 },

    #[error("Line is full: capacity is {capacity} points")]
    LineFull { capacity: usize },
}

impl CoreError {
    /// Whether this error must halt all actuation instead of being reported.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CoreError::OutOfRangeCoordinate { .. })
    }
}

/// Numeric code attached to a fatal fault, shown to the operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FaultCode(pub u8);

impl FaultCode {
    pub const USER_HALT: FaultCode = FaultCode(0);
    pub const FRAMING_OVERRUN: FaultCode = FaultCode(8);
    pub const OUT_OF_RANGE_COORDINATE: FaultCode = FaultCode(9);
    pub const INDEX_OUT_OF_RANGE: FaultCode = FaultCode(10);
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fatal fault. Once raised, actuation stays halted until restart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fault {
    pub code: FaultCode,
    pub message: String,
}

impl Fault {
    pub fn new(code: FaultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HALT {}: {}", self.code, self.message)
    }
}

impl From<&CoreError> for Fault {
    fn from(err: &CoreError) -> Self {
        let code = match err {
            CoreError::OutOfRangeCoordinate { .. } => FaultCode::OUT_OF_RANGE_COORDINATE,
            CoreError::LineFull { .. } => FaultCode::INDEX_OUT_OF_RANGE,
        };
        Fault::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_out_of_range_is_fatal() {
        assert!(CoreError::OutOfRangeCoordinate { x: 8, y: 0 }.is_fatal());
        assert!(!CoreError::LineFull { capacity: 225 }.is_fatal());
    }

    #[test]
    fn fault_display_carries_code() {
        let fault = Fault::from(&CoreError::OutOfRangeCoordinate { x: 8, y: -1 });
        assert_eq!(fault.code, FaultCode::OUT_OF_RANGE_COORDINATE);
        assert_eq!(fault.to_string(), "HALT 9: Coordinate out of range: (8, -1)");
    }
}
