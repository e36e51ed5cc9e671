//! Groove sequencer
//!
//! Pure timing logic: given the sim clock and a lookahead window, emits the
//! drum hits and arpeggio notes that fall due. No platform calls, so the
//! pattern is unit-testable on any target.

/// Drum voices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Percussion {
    Kick,
    Snare,
    Hat,
}

/// One scheduled groove voice
#[derive(Debug, Clone, PartialEq)]
pub enum GrooveVoice {
    Drum {
        kind: Percussion,
        velocity: f32,
        pan: f32,
    },
    /// Arpeggio note in Hz
    Note { freq: f32, pan: f32 },
}

/// A voice stamped with its due time on the sim clock
#[derive(Debug, Clone, PartialEq)]
pub struct GrooveEvent {
    pub at: f64,
    pub voice: GrooveVoice,
}

const BPM: f64 = 88.0;
/// A major pentatonic over the root, in semitones
const PENTATONIC: [i32; 6] = [0, 2, 4, 7, 9, 12];
const ROOT_HZ: f32 = 220.0;

/// Eight-step loop on eighth notes: kick on 0/4, snare on 2/6, hat on every
/// step, one arpeggio note per step.
#[derive(Debug, Clone)]
pub struct Sequencer {
    step: usize,
    next_step_time: f64,
    running: bool,
}

impl Sequencer {
    pub fn new() -> Self {
        Self {
            step: 0,
            next_step_time: 0.0,
            running: false,
        }
    }

    /// Seconds per eighth note
    pub fn step_duration() -> f64 {
        60.0 / BPM / 2.0
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Begin looping; the first step lands one step after `now`
    pub fn start(&mut self, now: f64) {
        self.step = 0;
        self.next_step_time = now + Self::step_duration();
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Emit every event falling due in `[now, now + lookahead)`
    pub fn advance(&mut self, now: f64, lookahead: f64) -> Vec<GrooveEvent> {
        let mut events = Vec::new();
        if !self.running {
            return events;
        }
        while self.next_step_time < now + lookahead {
            let at = self.next_step_time;
            let step = self.step % 8;
            let pan = ((step as f32) * 0.7).sin() * 0.4;

            if step == 0 || step == 4 {
                events.push(GrooveEvent {
                    at,
                    voice: GrooveVoice::Drum {
                        kind: Percussion::Kick,
                        velocity: 0.9,
                        pan: 0.0,
                    },
                });
            }
            if step == 2 || step == 6 {
                events.push(GrooveEvent {
                    at,
                    voice: GrooveVoice::Drum {
                        kind: Percussion::Snare,
                        velocity: 0.7,
                        pan: 0.0,
                    },
                });
            }
            events.push(GrooveEvent {
                at,
                voice: GrooveVoice::Drum {
                    kind: Percussion::Hat,
                    velocity: if step % 2 == 0 { 0.5 } else { 0.3 },
                    pan,
                },
            });

            // Walk the pentatonic with a coprime stride so the line does not
            // simply ascend
            let semitones = PENTATONIC[(step * 3) % PENTATONIC.len()];
            let freq = ROOT_HZ * 2.0_f32.powf(semitones as f32 / 12.0);
            events.push(GrooveEvent {
                at,
                voice: GrooveVoice::Note { freq, pan },
            });

            self.step = self.step.wrapping_add(1);
            self.next_step_time += Self::step_duration();
        }
        events
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}
