//! Audio engine
//!
//! Procedural sound driven by drained game events. The engine never reacts
//! inside the sim: the host forwards events here, they become cues stamped
//! with a due time on the sim clock, and `tick` plays whatever has fallen
//! due. Everything is scheduled through the one queue, so timing is
//! deterministic and testable without an AudioContext.

pub mod sequencer;

#[cfg(target_arch = "wasm32")]
pub mod graph;

pub use sequencer::{GrooveVoice, Percussion, Sequencer};

use crate::settings::Settings;
use crate::sim::state::{GameEvent, ItemKind};

#[cfg(target_arch = "wasm32")]
use std::cell::Cell;
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;

/// Oscillator shapes, kept platform-free so cue logic compiles natively
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
    Sawtooth,
}

/// One synthesized tone
#[derive(Debug, Clone, PartialEq)]
pub struct SoundSpec {
    pub freq: f32,
    /// Glide target, if any
    pub end_freq: Option<f32>,
    pub wave: Waveform,
    pub gain: f32,
    /// Envelope length in seconds
    pub duration: f32,
    /// -1.0 (left) to 1.0 (right)
    pub pan: f32,
    pub lowpass: Option<f32>,
    pub echo: bool,
    /// Extra start offset in seconds, applied at play time
    pub delay: f64,
}

impl SoundSpec {
    fn tone(freq: f32, wave: Waveform, gain: f32, duration: f32) -> Self {
        Self {
            freq,
            end_freq: None,
            wave,
            gain,
            duration,
            pan: 0.0,
            lowpass: None,
            echo: false,
            delay: 0.0,
        }
    }

    fn glide(mut self, end_freq: f32) -> Self {
        self.end_freq = Some(end_freq);
        self
    }

    fn with_echo(mut self) -> Self {
        self.echo = true;
        self
    }

    fn with_lowpass(mut self, cutoff: f32) -> Self {
        self.lowpass = Some(cutoff);
        self
    }

    fn with_pan(mut self, pan: f32) -> Self {
        self.pan = pan;
        self
    }
}

/// A queued playback instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Cue {
    Tone(SoundSpec),
    Drum {
        kind: Percussion,
        velocity: f32,
        pan: f32,
    },
    /// Fires after the external-track grace period; starts the synth bed and
    /// groove unless the track came through
    StartAmbience,
    /// Periodic ambience chord change
    RetunePads,
}

/// Lifecycle of the underlying audio context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioStatus {
    /// Waiting for the first user gesture
    Uninitialized,
    Running,
    /// Tab hidden or focus lost
    Suspended,
    /// Context creation failed; engine is a silent no-op
    Unavailable,
}

/// Seconds the external theme track gets before the synth bed takes over
const TRACK_GRACE_SECS: f64 = 1.8;
/// Seconds between ambience pad chord changes
const PAD_RETUNE_SECS: f64 = 9.0;
/// Minimum spacing between footstep sounds
const STEP_COOLDOWN_SECS: f64 = 0.12;
/// How far into the future tick() considers a cue due
const CUE_LOOKAHEAD_SECS: f64 = 0.02;

#[cfg(target_arch = "wasm32")]
const TRACK_URL: &str = "assets/music/theme.mp3";

pub struct AudioEngine {
    status: AudioStatus,
    muted: bool,
    /// (due sim-time, cue), kept sorted by push order per due time
    queue: Vec<(f64, Cue)>,
    sequencer: Sequencer,
    last_step_time: f64,
    step_pan_left: bool,
    #[cfg(target_arch = "wasm32")]
    graph: Option<graph::AudioGraph>,
    #[cfg(target_arch = "wasm32")]
    track_playing: Option<Rc<Cell<bool>>>,
}

impl AudioEngine {
    pub fn new(settings: &Settings) -> Self {
        Self {
            status: AudioStatus::Uninitialized,
            muted: settings.muted,
            queue: Vec::new(),
            sequencer: Sequencer::new(),
            last_step_time: f64::NEG_INFINITY,
            step_pan_left: false,
            #[cfg(target_arch = "wasm32")]
            graph: None,
            #[cfg(target_arch = "wasm32")]
            track_playing: None,
        }
    }

    pub fn status(&self) -> AudioStatus {
        self.status
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Bring the context up. Must be called from a user gesture; browsers
    /// refuse autoplaying contexts. `now` is the sim clock.
    pub fn start(&mut self, now: f64, settings: &Settings) {
        if self.status != AudioStatus::Uninitialized {
            return;
        }
        self.open_context(settings);
        if self.status != AudioStatus::Running {
            return;
        }
        // Give the external theme a grace window, then fall back to synth
        self.queue.push((now + TRACK_GRACE_SECS, Cue::StartAmbience));
        log::info!("Audio engine started");
    }

    #[cfg(target_arch = "wasm32")]
    fn open_context(&mut self, settings: &Settings) {
        match graph::AudioGraph::new(settings) {
            Some(graph) => {
                graph.set_muted(self.muted);
                self.track_playing = graph.attach_external_track(TRACK_URL);
                self.graph = Some(graph);
                self.status = AudioStatus::Running;
            }
            None => {
                log::warn!("Failed to create AudioContext, audio disabled");
                self.status = AudioStatus::Unavailable;
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn open_context(&mut self, _settings: &Settings) {
        // Headless: the cue queue still runs, playback is a no-op
        self.status = AudioStatus::Running;
    }

    pub fn suspend(&mut self) {
        if self.status != AudioStatus::Running {
            return;
        }
        self.status = AudioStatus::Suspended;
        #[cfg(target_arch = "wasm32")]
        if let Some(graph) = &self.graph {
            graph.suspend();
        }
    }

    pub fn resume(&mut self) {
        if self.status != AudioStatus::Suspended {
            return;
        }
        self.status = AudioStatus::Running;
        #[cfg(target_arch = "wasm32")]
        if let Some(graph) = &self.graph {
            graph.resume();
        }
    }

    /// Returns the new muted state
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        #[cfg(target_arch = "wasm32")]
        if let Some(graph) = &self.graph {
            graph.set_muted(self.muted);
        }
        self.muted
    }

    /// Translate a drained game event into cues. Events arriving before the
    /// context is up (or while suspended) are dropped, not buffered.
    pub fn on_event(&mut self, event: &GameEvent, now: f64) {
        if self.status != AudioStatus::Running {
            return;
        }
        match event {
            GameEvent::ItemPicked(kind) => self.cue_pickup(*kind, now),
            GameEvent::ItemDropped(_) => {
                self.queue.push((
                    now,
                    Cue::Tone(SoundSpec::tone(300.0, Waveform::Sine, 0.2, 0.12).glide(200.0)),
                ));
            }
            GameEvent::DropRefused(_) | GameEvent::NoGateNearby => {
                self.queue.push((
                    now,
                    Cue::Tone(
                        SoundSpec::tone(120.0, Waveform::Triangle, 0.18, 0.1).with_lowpass(400.0),
                    ),
                ));
            }
            GameEvent::GateOpened { .. } => self.cue_gate_open(now),
            GameEvent::GateMismatch { .. } => {
                self.queue.push((
                    now,
                    Cue::Tone(
                        SoundSpec::tone(320.0, Waveform::Sawtooth, 0.2, 0.3)
                            .glide(160.0)
                            .with_lowpass(900.0),
                    ),
                ));
            }
            GameEvent::ShardCollected => self.cue_shard(now),
            GameEvent::NpcHint { .. } => {
                for (i, freq) in [660.0, 880.0].into_iter().enumerate() {
                    self.queue.push((
                        now + i as f64 * 0.09,
                        Cue::Tone(SoundSpec::tone(freq, Waveform::Sine, 0.12, 0.12)),
                    ));
                }
            }
            GameEvent::Footstep { on_land } => self.cue_footstep(*on_land, now),
            GameEvent::Won => self.cue_fanfare(now),
        }
    }

    /// Rising gliss; a 10-stick gets a brighter third note
    fn cue_pickup(&mut self, kind: ItemKind, now: f64) {
        let notes: &[f32] = match kind {
            ItemKind::Ten => &[600.0, 800.0, 1000.0],
            ItemKind::One => &[600.0, 800.0],
        };
        for (i, &freq) in notes.iter().enumerate() {
            self.queue.push((
                now + i as f64 * 0.07,
                Cue::Tone(SoundSpec::tone(freq, Waveform::Sine, 0.22, 0.14)),
            ));
        }
    }

    /// Major arpeggio with an echo tail
    fn cue_gate_open(&mut self, now: f64) {
        for (i, freq) in [523.25, 659.25, 783.99, 1046.5].into_iter().enumerate() {
            let spec = SoundSpec::tone(freq, Waveform::Triangle, 0.25, 0.35);
            let spec = if i == 3 { spec.with_echo() } else { spec };
            self.queue.push((now + i as f64 * 0.09, Cue::Tone(spec)));
        }
    }

    /// Sparkly chime cluster
    fn cue_shard(&mut self, now: f64) {
        for (i, freq) in [1200.0, 1800.0, 2400.0].into_iter().enumerate() {
            self.queue.push((
                now + i as f64 * 0.02,
                Cue::Tone(SoundSpec::tone(freq, Waveform::Sine, 0.15, 0.3)),
            ));
        }
    }

    /// Rate-limited, alternating left/right
    fn cue_footstep(&mut self, on_land: bool, now: f64) {
        if now - self.last_step_time < STEP_COOLDOWN_SECS {
            return;
        }
        self.last_step_time = now;
        self.step_pan_left = !self.step_pan_left;
        let pan = if self.step_pan_left { -0.25 } else { 0.25 };

        let spec = if on_land {
            SoundSpec::tone(180.0, Waveform::Sine, 0.08, 0.06)
                .glide(120.0)
                .with_pan(pan)
        } else {
            SoundSpec::tone(140.0, Waveform::Triangle, 0.07, 0.09)
                .with_lowpass(500.0)
                .with_pan(pan)
        };
        self.queue.push((now, Cue::Tone(spec)));
    }

    fn cue_fanfare(&mut self, now: f64) {
        for (i, freq) in [523.25, 659.25, 783.99, 1046.5, 1318.5]
            .into_iter()
            .enumerate()
        {
            let spec = SoundSpec::tone(freq, Waveform::Triangle, 0.28, 0.5);
            let spec = if i >= 3 { spec.with_echo() } else { spec };
            self.queue.push((now + i as f64 * 0.12, Cue::Tone(spec)));
        }
    }

    /// Drain due cues and step the groove. Called once per frame with the
    /// sim clock.
    pub fn tick(&mut self, now: f64) {
        if self.status != AudioStatus::Running {
            return;
        }

        let due: Vec<Cue> = {
            let mut due = Vec::new();
            let mut i = 0;
            while i < self.queue.len() {
                if self.queue[i].0 <= now + CUE_LOOKAHEAD_SECS {
                    due.push(self.queue.remove(i).1);
                } else {
                    i += 1;
                }
            }
            due
        };
        for cue in due {
            self.play(cue, now);
        }

        let groove = self.sequencer.advance(now, CUE_LOOKAHEAD_SECS);
        for event in groove {
            match event.voice {
                GrooveVoice::Drum {
                    kind,
                    velocity,
                    pan,
                } => self.play(
                    Cue::Drum {
                        kind,
                        velocity,
                        pan,
                    },
                    now,
                ),
                GrooveVoice::Note { freq, pan } => self.play(
                    Cue::Tone(
                        SoundSpec::tone(freq, Waveform::Triangle, 0.07, 0.22)
                            .with_pan(pan)
                            .with_lowpass(2400.0),
                    ),
                    now,
                ),
            }
        }
    }

    fn play(&mut self, cue: Cue, now: f64) {
        match cue {
            Cue::StartAmbience => {
                if self.external_track_playing() {
                    log::info!("External theme playing, skipping synth ambience");
                    return;
                }
                self.start_synth_ambience();
                self.sequencer.start(now);
                self.queue.push((now + PAD_RETUNE_SECS, Cue::RetunePads));
            }
            Cue::RetunePads => {
                self.retune_pads();
                if self.sequencer.is_running() {
                    self.queue.push((now + PAD_RETUNE_SECS, Cue::RetunePads));
                }
            }
            Cue::Tone(spec) => {
                if !self.muted {
                    self.play_tone(&spec);
                }
            }
            Cue::Drum {
                kind,
                velocity,
                pan,
            } => {
                if !self.muted {
                    self.play_drum(kind, velocity, pan);
                }
            }
        }
    }

    fn external_track_playing(&self) -> bool {
        #[cfg(target_arch = "wasm32")]
        {
            self.track_playing.as_ref().is_some_and(|f| f.get())
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            false
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn start_synth_ambience(&mut self) {
        if let Some(graph) = &mut self.graph {
            graph.start_ambience();
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn retune_pads(&mut self) {
        if let Some(graph) = &mut self.graph {
            graph.retune_pads();
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn play_tone(&self, spec: &SoundSpec) {
        if let Some(graph) = &self.graph {
            graph.play_tone(spec);
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn play_drum(&self, kind: Percussion, velocity: f32, pan: f32) {
        if let Some(graph) = &self.graph {
            graph.play_drum(kind, velocity, pan);
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn start_synth_ambience(&mut self) {}
    #[cfg(not(target_arch = "wasm32"))]
    fn retune_pads(&mut self) {}
    #[cfg(not(target_arch = "wasm32"))]
    fn play_tone(&self, _spec: &SoundSpec) {}
    #[cfg(not(target_arch = "wasm32"))]
    fn play_drum(&self, _kind: Percussion, _velocity: f32, _pan: f32) {}

    /// Pending cue count (diagnostics)
    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_engine() -> AudioEngine {
        let settings = Settings::default();
        let mut engine = AudioEngine::new(&settings);
        engine.start(0.0, &settings);
        assert_eq!(engine.status(), AudioStatus::Running);
        engine
    }

    #[test]
    fn test_engine_ignores_events_until_started() {
        let mut engine = AudioEngine::new(&Settings::default());
        assert_eq!(engine.status(), AudioStatus::Uninitialized);
        engine.on_event(&GameEvent::ItemPicked(ItemKind::One), 0.5);
        engine.tick(1.0);
        assert_eq!(engine.queued(), 0);
    }

    #[test]
    fn test_suspend_resume_round_trip() {
        let mut engine = running_engine();
        engine.suspend();
        assert_eq!(engine.status(), AudioStatus::Suspended);
        // Suspending twice is harmless
        engine.suspend();
        assert_eq!(engine.status(), AudioStatus::Suspended);
        engine.resume();
        assert_eq!(engine.status(), AudioStatus::Running);
    }

    #[test]
    fn test_start_is_idempotent() {
        let settings = Settings::default();
        let mut engine = running_engine();
        let queued = engine.queued();
        engine.start(5.0, &settings);
        assert_eq!(engine.queued(), queued);
    }

    #[test]
    fn test_composite_cues_are_spread_over_time() {
        let mut engine = running_engine();
        // Drain the ambience cue out of the way
        engine.tick(TRACK_GRACE_SECS + 0.1);

        let t = 10.0;
        engine.on_event(
            &GameEvent::GateOpened {
                target: 15,
                tens: 1,
                ones: 5,
            },
            t,
        );
        assert_eq!(engine.queued() - 1, 4); // 4 arp notes + recurring retune

        // First note due immediately, the rest still pending
        engine.tick(t);
        assert_eq!(engine.queued() - 1, 3);
        // All played once the spread has elapsed
        engine.tick(t + 0.5);
        assert_eq!(engine.queued() - 1, 0);
    }

    #[test]
    fn test_footstep_rate_limit_and_pan_alternation() {
        let mut engine = running_engine();
        engine.tick(TRACK_GRACE_SECS + 0.1);
        let base = engine.queued();

        let t = 20.0;
        engine.on_event(&GameEvent::Footstep { on_land: true }, t);
        engine.on_event(&GameEvent::Footstep { on_land: true }, t + 0.01);
        engine.on_event(&GameEvent::Footstep { on_land: true }, t + 0.05);
        // Only the first lands inside the cooldown window
        assert_eq!(engine.queued() - base, 1);

        engine.on_event(&GameEvent::Footstep { on_land: true }, t + 0.2);
        assert_eq!(engine.queued() - base, 2);

        // Panning alternates between the two queued steps
        let pans: Vec<f32> = engine
            .queue
            .iter()
            .filter_map(|(_, c)| match c {
                Cue::Tone(spec) if spec.pan != 0.0 => Some(spec.pan),
                _ => None,
            })
            .collect();
        assert_eq!(pans.len(), 2);
        assert_eq!(pans[0], -pans[1]);
    }

    #[test]
    fn test_ambience_fallback_starts_groove_after_grace() {
        let mut engine = running_engine();
        assert!(!engine.sequencer.is_running());

        // Before the grace period nothing happens
        engine.tick(1.0);
        assert!(!engine.sequencer.is_running());

        engine.tick(TRACK_GRACE_SECS + 0.1);
        assert!(engine.sequencer.is_running());
        // The recurring pad retune is scheduled
        assert!(engine.queue.iter().any(|(_, c)| *c == Cue::RetunePads));
    }

    #[test]
    fn test_mute_toggle() {
        let mut engine = running_engine();
        assert!(!engine.is_muted());
        assert!(engine.toggle_mute());
        assert!(!engine.toggle_mute());
    }

    #[test]
    fn test_pickup_cue_distinguishes_denominations() {
        let mut engine = running_engine();
        engine.tick(TRACK_GRACE_SECS + 0.1);
        let base = engine.queued();

        engine.on_event(&GameEvent::ItemPicked(ItemKind::Ten), 30.0);
        let ten_notes = engine.queued() - base;
        engine.tick(31.0);

        let base = engine.queued();
        engine.on_event(&GameEvent::ItemPicked(ItemKind::One), 32.0);
        let one_notes = engine.queued() - base;

        assert_eq!(ten_notes, 3);
        assert_eq!(one_notes, 2);
    }
}
