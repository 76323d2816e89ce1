//! Batch execution modes and the sleep budget a batch declares.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::request::RequestSpec;

/// Frame rate used to convert `sleepFrames` into wall-clock time.
pub const ASSUMED_FPS: u64 = 30;

/// How the server schedules the sub-requests of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecutionType {
    /// One after another, as fast as possible.
    #[default]
    SerialRealtime,
    /// One sub-request per rendered frame.
    SerialFrame,
    /// All at once on a thread pool.  `Sleep` is rejected by the server here.
    Parallel,
}

impl ExecutionType {
    pub const ALL: [ExecutionType; 3] = [
        ExecutionType::SerialRealtime,
        ExecutionType::SerialFrame,
        ExecutionType::Parallel,
    ];

    pub fn code(self) -> i8 {
        match self {
            ExecutionType::SerialRealtime => 0,
            ExecutionType::SerialFrame => 1,
            ExecutionType::Parallel => 2,
        }
    }

    pub fn from_code(code: i8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }
}

impl Serialize for ExecutionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.code().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ExecutionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = i8::deserialize(deserializer)?;
        Self::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown execution type {code}")))
    }
}

/// Total wait time the `Sleep` sub-requests of a batch ask the server for.
///
/// Millisecond sleeps are summed directly.  Frame sleeps are summed first and
/// then converted at [`ASSUMED_FPS`], rounding up.  The result is an upper
/// bound: under [`ExecutionType::Parallel`] the waits would not add up, and
/// the real frame rate may be higher.
pub fn declared_sleep(specs: &[RequestSpec]) -> Duration {
    let (millis, frames) = specs
        .iter()
        .filter(|spec| spec.request_type == "Sleep")
        .fold((0u64, 0u64), |(millis, frames), spec| {
            (
                millis.saturating_add(spec.data_u64("sleepMillis").unwrap_or(0)),
                frames.saturating_add(spec.data_u64("sleepFrames").unwrap_or(0)),
            )
        });
    let frame_millis = frames.saturating_mul(1000).div_ceil(ASSUMED_FPS);
    Duration::from_millis(millis.saturating_add(frame_millis))
}
