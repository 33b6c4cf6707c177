//! Notation boundary: expressive scores as note records and control events.
//!
//! This is the shape a MIDI-like container collaborator consumes. Positions
//! are frame indices at the score's rate. Velocity changes inside a held
//! note travel as controller 11 and timbre changes as controller 12. The
//! container cannot carry velocity 0 notes, so triangle notes are exported
//! with velocity 1 and imported back as 0.
use crate::chip::Channel;
use crate::error::ProtocolError;
use crate::score::expressive::{ExpressiveFrame, ExpressiveScore};

/// Controller carrying a velocity change of a held note.
pub const CC_VELOCITY: u8 = 11;
/// Controller carrying a timbre change.
pub const CC_TIMBRE: u8 = 12;

const TRIANGLE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteRecord {
    pub channel: Channel,
    pub pitch: u8,
    pub velocity: u8,
    /// Timbre in effect when the note starts.
    pub timbre: u8,
    pub start: usize,
    /// Exclusive.
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlEvent {
    pub channel: Channel,
    pub position: usize,
    pub controller: u8,
    pub value: u8,
}

/// An expressive score spelled as notes and controls.
#[derive(Debug, Clone, PartialEq)]
pub struct Notation {
    pub rate: f64,
    pub sample_count: usize,
    /// Total length in frames.
    pub length: usize,
    pub notes: Vec<NoteRecord>,
    pub controls: Vec<ControlEvent>,
}

impl Notation {
    /// Start time of `position` in seconds.
    pub fn seconds(&self, position: usize) -> f64 {
        position as f64 / self.rate
    }
}

/// Spell an expressive score as notes and controls.
pub fn to_notation(score: &ExpressiveScore) -> Notation {
    let mut notes = Vec::new();
    let mut controls = Vec::new();

    for (index, channel) in Channel::VOICES.into_iter().enumerate() {
        let triangle = index == TRIANGLE;
        let mut last_note = 0;
        let mut last_velocity = triangle as u8;
        let mut last_timbre = 0;
        let mut open: Option<NoteRecord> = None;

        for (position, frame) in score.frames.iter().enumerate() {
            let [note, velocity, timbre] = frame[index];
            let velocity = if triangle { 1 } else { velocity };

            if note != last_note {
                if let Some(mut record) = open.take() {
                    record.end = position;
                    notes.push(record);
                }
                if note != 0 {
                    open = Some(NoteRecord {
                        channel,
                        pitch: note,
                        velocity,
                        timbre,
                        start: position,
                        end: position,
                    });
                }
            } else if note != 0 && velocity != last_velocity {
                controls.push(ControlEvent {
                    channel,
                    position,
                    controller: CC_VELOCITY,
                    value: velocity,
                });
            }
            if timbre != last_timbre {
                controls.push(ControlEvent {
                    channel,
                    position,
                    controller: CC_TIMBRE,
                    value: timbre,
                });
            }

            last_note = note;
            last_velocity = velocity;
            last_timbre = timbre;
        }
        if let Some(mut record) = open {
            record.end = score.frames.len();
            notes.push(record);
        }
    }

    log::debug!(
        "spelled {} frames as {} notes and {} controls",
        score.frames.len(),
        notes.len(),
        controls.len()
    );
    Notation {
        rate: score.rate,
        sample_count: score.sample_count,
        length: score.frames.len(),
        notes,
        controls,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Off,
    On { pitch: u8, velocity: u8 },
    Velocity(u8),
    Timbre(u8),
}

impl Command {
    /// Order of commands landing on the same frame.
    fn rank(self) -> u8 {
        match self {
            Command::Off => 0,
            Command::On { .. } => 1,
            Command::Velocity(_) | Command::Timbre(_) => 2,
        }
    }
}

fn voice_of(channel: Channel) -> Result<usize, ProtocolError> {
    channel.voice_index().ok_or(ProtocolError::NotAVoice(channel))
}

/// Rebuild an expressive score from notes and controls.
///
/// On each frame note ends are applied first, then note starts, then
/// controls. Anything positioned at or past `length` is ignored.
///
/// # Errors
///
/// `NotAVoice` for records on a control-only channel and
/// `UnknownController` for controllers other than 11 and 12.
pub fn from_notation(notation: &Notation) -> Result<ExpressiveScore, ProtocolError> {
    let mut commands: [Vec<(usize, Command)>; 4] = Default::default();

    for note in &notation.notes {
        let index = voice_of(note.channel)?;
        let velocity = if index == TRIANGLE { 0 } else { note.velocity };
        commands[index].push((
            note.start,
            Command::On {
                pitch: note.pitch,
                velocity,
            },
        ));
        commands[index].push((note.end, Command::Off));
    }
    for control in &notation.controls {
        let index = voice_of(control.channel)?;
        let command = match control.controller {
            CC_VELOCITY => Command::Velocity(control.value),
            CC_TIMBRE => Command::Timbre(control.value),
            controller => {
                return Err(ProtocolError::UnknownController {
                    channel: control.channel,
                    controller,
                });
            }
        };
        commands[index].push((control.position, command));
    }

    let mut frames: Vec<ExpressiveFrame> = vec![[[0; 3]; 4]; notation.length];
    for (index, list) in commands.iter_mut().enumerate() {
        list.sort_by_key(|&(position, command)| (position, command.rank()));
        let mut pending = list.iter().peekable();
        let [mut note, mut velocity, mut timbre] = [0u8; 3];

        for (position, frame) in frames.iter_mut().enumerate() {
            while let Some(&(_, command)) = pending.next_if(|(at, _)| *at == position) {
                match command {
                    Command::Off => {
                        note = 0;
                        velocity = 0;
                    }
                    Command::On {
                        pitch,
                        velocity: v,
                    } => {
                        note = pitch;
                        velocity = v;
                    }
                    Command::Velocity(v) => velocity = v,
                    Command::Timbre(t) => timbre = t,
                }
            }
            frame[index] = [note, velocity, timbre];
        }
    }

    Ok(ExpressiveScore {
        rate: notation.rate,
        sample_count: notation.sample_count,
        frames,
    })
}
