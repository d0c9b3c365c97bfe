#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use sensory_pulse_lib::models::{
    DataBundle, EmotionRecord, EnvironmentalSnapshot, ResponseClass, SensoryRecord,
    SessionRecord,
};

pub const SUBJECT: &str = "student-1";

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
}

pub fn emotion(id: &str, label: &str, intensity: u8, day: u32, hour: u32) -> EmotionRecord {
    EmotionRecord {
        id: id.into(),
        subject_id: Some(SUBJECT.into()),
        emotion: label.into(),
        intensity,
        timestamp: at(day, hour),
        triggers: Vec::new(),
        context: None,
    }
}

pub fn sensory(id: &str, channel: &str, response: &str, day: u32) -> SensoryRecord {
    SensoryRecord {
        id: id.into(),
        subject_id: Some(SUBJECT.into()),
        channel: channel.into(),
        response: response.into(),
        response_class: ResponseClass::from_label(response),
        intensity: Some(5),
        timestamp: at(day, 10),
        context: None,
    }
}

pub fn session(
    day: u32,
    emotions: Vec<EmotionRecord>,
    sensory_inputs: Vec<SensoryRecord>,
    noise: Option<f64>,
) -> SessionRecord {
    SessionRecord {
        id: format!("session-{day:02}"),
        subject_id: SUBJECT.into(),
        timestamp: at(day, 10),
        emotions,
        sensory_inputs,
        environment: noise.map(|level| EnvironmentalSnapshot {
            noise_level: Some(level),
            ..Default::default()
        }),
    }
}

/// Bundle whose top-level streams mirror the records nested in `sessions`.
pub fn bundle_of(sessions: Vec<SessionRecord>) -> DataBundle {
    let emotions = sessions.iter().flat_map(|s| s.emotions.clone()).collect();
    let sensory_inputs = sessions.iter().flat_map(|s| s.sensory_inputs.clone()).collect();
    DataBundle {
        entries: sessions,
        emotions,
        sensory_inputs,
    }
}

/// One calm emotion per session with the given noise level.
pub fn calm_sessions_with_noise(levels: &[f64]) -> Vec<SessionRecord> {
    levels
        .iter()
        .enumerate()
        .map(|(idx, level)| {
            let day = idx as u32 + 1;
            session(
                day,
                vec![emotion(&format!("calm-{day}"), "calm", 5, day, 10)],
                Vec::new(),
                Some(*level),
            )
        })
        .collect()
}
