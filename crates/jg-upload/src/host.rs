//! PC-side program description and its upload encoding.
//!
//! Programs are written as YAML:
//!
//! ```yaml
//! name: Test
//! lines:
//!   - duration_ms: 500
//!     points: [[0, 0]]
//!   - duration_ms: 300
//!     points: [[1, 1], [2, 2]]
//! ```

use crate::error::{HostError, HostResult};
use crate::framing::EOL;
use jg_core::{MAX_POINTS_PER_LINE, Point};
use jg_program::MAX_LINES;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One timed line of a host program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostLine {
    pub duration_ms: u16,
    #[serde(default)]
    pub points: Vec<(i8, i8)>,
}

/// A program as the host describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostProgram {
    pub name: String,
    #[serde(default)]
    pub lines: Vec<HostLine>,
}

impl HostProgram {
    /// Check that the controller would accept this program.
    pub fn validate(&self) -> HostResult<()> {
        if self.name.trim().is_empty() {
            return Err(HostError::EmptyName);
        }
        if self.name.contains(['\n', '\r']) {
            return Err(HostError::MultilineName);
        }
        if self.lines.len() > MAX_LINES {
            return Err(HostError::TooManyLines {
                count: self.lines.len(),
                max: MAX_LINES,
            });
        }

        for (idx, line) in self.lines.iter().enumerate() {
            if line.points.len() > MAX_POINTS_PER_LINE {
                return Err(HostError::TooManyPoints {
                    line: idx,
                    count: line.points.len(),
                    max: MAX_POINTS_PER_LINE,
                });
            }
            if let Some(&(x, y)) = line
                .points
                .iter()
                .find(|&&(x, y)| !Point::new(x, y).in_range())
            {
                return Err(HostError::PointOutOfRange { line: idx, x, y });
            }
            if line.points.is_empty() && line.duration_ms & 0xff == 0xff {
                return Err(HostError::SentinelCollision {
                    line: idx,
                    duration_ms: line.duration_ms,
                });
            }
        }
        Ok(())
    }

    /// Total program duration [ms]
    pub fn total_duration_ms(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.duration_ms)).sum()
    }

    /// Byte stream that uploads this program, starting with the `upload`
    /// command.
    pub fn encode_upload(&self) -> HostResult<Vec<u8>> {
        self.validate()?;

        let mut out = Vec::new();
        out.extend_from_slice(b"upload\n");
        out.extend_from_slice(self.name.as_bytes());
        out.push(b'\n');
        out.extend_from_slice(self.lines.len().to_string().as_bytes());
        out.push(b'\n');

        for line in &self.lines {
            out.extend_from_slice(&line.duration_ms.to_be_bytes());
            out.extend(line.points.iter().map(|&(x, y)| Point::new(x, y).to_byte()));
            out.extend_from_slice(&EOL);
        }
        out.extend_from_slice(&EOL);
        Ok(out)
    }

    pub fn from_yaml_str(content: &str) -> HostResult<Self> {
        let program: HostProgram = serde_yaml::from_str(content)?;
        program.validate()?;
        Ok(program)
    }

    pub fn to_yaml_string(&self) -> HostResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Load and validate a program file.
pub fn load_yaml(path: &Path) -> HostResult<HostProgram> {
    let content = std::fs::read_to_string(path)?;
    HostProgram::from_yaml_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_program() -> HostProgram {
        HostProgram {
            name: "Test".to_owned(),
            lines: vec![
                HostLine {
                    duration_ms: 500,
                    points: vec![(0, 0)],
                },
                HostLine {
                    duration_ms: 300,
                    points: vec![(1, 1), (2, 2)],
                },
            ],
        }
    }

    #[test]
    fn encode_test_program() {
        let bytes = test_program().encode_upload().unwrap();
        let mut expected = b"upload\nTest\n2\n".to_vec();
        expected.extend_from_slice(&[0x01, 0xf4, 0x77, 0xff, 0xff, 0xff]);
        expected.extend_from_slice(&[0x01, 0x2c, 0x88, 0x99, 0xff, 0xff, 0xff]);
        expected.extend_from_slice(&[0xff, 0xff, 0xff]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn yaml_round_trip() {
        let yaml = "name: Test\nlines:\n  - duration_ms: 500\n    points: [[0, 0]]\n  - duration_ms: 300\n    points: [[1, 1], [2, 2]]\n";
        let program = HostProgram::from_yaml_str(yaml).unwrap();
        assert_eq!(program, test_program());
        assert_eq!(program.total_duration_ms(), 800);

        let again = HostProgram::from_yaml_str(&program.to_yaml_string().unwrap()).unwrap();
        assert_eq!(again, program);
    }

    #[test]
    fn validation_rejects_bad_programs() {
        let mut p = test_program();
        p.name = "  ".to_owned();
        assert!(matches!(p.validate(), Err(HostError::EmptyName)));

        let mut p = test_program();
        p.name = "a\nb".to_owned();
        assert!(matches!(p.validate(), Err(HostError::MultilineName)));

        let mut p = test_program();
        p.lines[1].points.push((8, 0));
        assert!(matches!(
            p.validate(),
            Err(HostError::PointOutOfRange { line: 1, x: 8, y: 0 })
        ));

        let mut p = test_program();
        p.lines[0].points = vec![(0, 0); MAX_POINTS_PER_LINE + 1];
        assert!(matches!(p.validate(), Err(HostError::TooManyPoints { line: 0, .. })));

        let mut p = test_program();
        p.lines[0] = HostLine {
            duration_ms: 0x01ff,
            points: vec![],
        };
        assert!(matches!(
            p.validate(),
            Err(HostError::SentinelCollision { line: 0, .. })
        ));
    }

    #[test]
    fn missing_fields_are_reported() {
        assert!(matches!(
            HostProgram::from_yaml_str("lines: []"),
            Err(HostError::Yaml(_))
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::framing::HostPort;
    use jg_core::{AXIS_MAX, AXIS_MIN};
    use proptest::prelude::*;

    fn host_line() -> impl Strategy<Value = HostLine> {
        let point = (AXIS_MIN..=AXIS_MAX, AXIS_MIN..=AXIS_MAX);
        (any::<u16>(), prop::collection::vec(point, 0..40))
            .prop_map(|(duration_ms, points)| HostLine { duration_ms, points })
    }

    fn host_program() -> impl Strategy<Value = HostProgram> {
        ("[A-Za-z][A-Za-z0-9 ]{0,20}", prop::collection::vec(host_line(), 0..12))
            .prop_map(|(name, lines)| HostProgram { name, lines })
    }

    proptest! {
        #[test]
        fn port_recovers_every_encoded_frame(program in host_program()) {
            prop_assume!(program.validate().is_ok());
            let bytes = program.encode_upload().unwrap();

            let mut port = HostPort::new();
            port.feed(&bytes);
            let first = port.poll_text().unwrap();
            prop_assert_eq!(first.as_deref(), Some("upload"));
            prop_assert_eq!(port.poll_text().unwrap(), Some(program.name.trim().to_owned()));
            prop_assert_eq!(port.poll_text().unwrap(), Some(program.lines.len().to_string()));

            for line in &program.lines {
                let frame = port.poll_frame().unwrap().unwrap();
                prop_assert_eq!(&frame[..2], &line.duration_ms.to_be_bytes()[..]);
                let points: Vec<(i8, i8)> = frame[2..]
                    .iter()
                    .map(|&b| {
                        let p = Point::from_byte(b);
                        (p.x, p.y)
                    })
                    .collect();
                prop_assert_eq!(&points, &line.points);
            }

            prop_assert_eq!(port.poll_frame().unwrap(), Some(Vec::new()));
            prop_assert_eq!(port.pending(), 0);
        }
    }
}
