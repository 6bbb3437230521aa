/// Events leaving the core.
///
/// `HudEvent` is the closed set carried by the HUD bridge; names and payload
/// shapes are the wire contract (`level:changed` → {levelNumber, objective,
/// totalLevels}, etc.). `Cue` is what a level emits for the presentation
/// layer's flash/sound effects.

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum HudEvent {
    #[serde(rename = "level:changed", rename_all = "camelCase")]
    LevelChanged { level_number: u32, objective: String, total_levels: u32 },
    #[serde(rename = "progress:changed")]
    ProgressChanged { progress: u32 },
    #[serde(rename = "timer:reset")]
    TimerReset,
    #[serde(rename = "timer:pause")]
    TimerPause,
    #[serde(rename = "timer:resume")]
    TimerResume,
    #[serde(rename = "run:ended")]
    RunEnded,
}

impl HudEvent {
    pub fn name(&self) -> &'static str {
        match self {
            HudEvent::LevelChanged { .. } => "level:changed",
            HudEvent::ProgressChanged { .. } => "progress:changed",
            HudEvent::TimerReset => "timer:reset",
            HudEvent::TimerPause => "timer:pause",
            HudEvent::TimerResume => "timer:resume",
            HudEvent::RunEnded => "run:ended",
        }
    }
}

/// Presentation cues emitted by a level during a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    IntroShown,
    Jumped,
    Boosted,
    Success,
    Failure,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payloads_serialize_with_wire_names() {
        let ev = HudEvent::LevelChanged {
            level_number: 2,
            objective: "Climb.".into(),
            total_levels: 5,
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "level:changed");
        assert_eq!(json["payload"]["levelNumber"], 2);
        assert_eq!(json["payload"]["totalLevels"], 5);
        assert_eq!(json["payload"]["objective"], "Climb.");

        let json = serde_json::to_value(&HudEvent::TimerPause).unwrap();
        assert_eq!(json["event"], HudEvent::TimerPause.name());
    }
}
