//! Web Audio node graph
//!
//! All synthesis is procedural. Every builder returns Option and every Web
//! Audio call ends in `.ok()`: a missing or broken AudioContext degrades to
//! silence, never to a panic. One-shot voices get an explicit scheduled stop
//! so the browser can release them.

use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    AudioBuffer, AudioBufferSourceNode, AudioContext, BiquadFilterNode, BiquadFilterType,
    DelayNode, DynamicsCompressorNode, GainNode, HtmlAudioElement, OscillatorNode,
    OscillatorType, StereoPannerNode,
};

use super::{Percussion, SoundSpec, Waveform};
use crate::settings::Settings;

/// Semitone offsets of the two alternating ambience pad chords, over A2
const PAD_CHORDS: [[i32; 3]; 2] = [[0, 7, 12], [-3, 4, 9]];
const PAD_ROOT_HZ: f32 = 110.0;

fn osc_type(wave: Waveform) -> OscillatorType {
    match wave {
        Waveform::Sine => OscillatorType::Sine,
        Waveform::Triangle => OscillatorType::Triangle,
        Waveform::Square => OscillatorType::Square,
        Waveform::Sawtooth => OscillatorType::Sawtooth,
    }
}

/// Owned bus topology plus the long-lived ambience voices
pub struct AudioGraph {
    ctx: AudioContext,
    master: GainNode,
    fx: GainNode,
    ambience: GainNode,
    /// Half a second of white noise, shared by the snare/hat/ambience voices
    noise: AudioBuffer,
    /// Pad oscillators, populated once ambience starts
    pads: Vec<OscillatorNode>,
    pad_chord: usize,
    master_volume: f32,
}

impl AudioGraph {
    /// Build the bus chain: sources -> (fx | ambience) -> master ->
    /// compressor -> destination
    pub fn new(settings: &Settings) -> Option<Self> {
        let ctx = AudioContext::new().ok()?;

        let compressor: DynamicsCompressorNode = ctx.create_dynamics_compressor().ok()?;
        compressor.threshold().set_value(-24.0);
        compressor.knee().set_value(24.0);
        compressor.ratio().set_value(2.5);
        compressor.attack().set_value(0.003);
        compressor.release().set_value(0.25);
        compressor
            .connect_with_audio_node(&ctx.destination())
            .ok()?;

        let master = ctx.create_gain().ok()?;
        master.gain().set_value(settings.master_volume);
        master.connect_with_audio_node(&compressor).ok()?;

        let fx = ctx.create_gain().ok()?;
        fx.gain().set_value(settings.sfx_volume);
        fx.connect_with_audio_node(&master).ok()?;

        let ambience = ctx.create_gain().ok()?;
        ambience.gain().set_value(settings.music_volume);
        ambience.connect_with_audio_node(&master).ok()?;

        let noise = make_noise_buffer(&ctx)?;

        Some(Self {
            ctx,
            master,
            fx,
            ambience,
            noise,
            pads: Vec::new(),
            pad_chord: 0,
            master_volume: settings.master_volume,
        })
    }

    pub fn current_time(&self) -> f64 {
        self.ctx.current_time()
    }

    pub fn resume(&self) {
        let _ = self.ctx.resume();
    }

    pub fn suspend(&self) {
        let _ = self.ctx.suspend();
    }

    /// Ramp the master bus toward silence or back over ~15ms to avoid clicks
    pub fn set_muted(&self, muted: bool) {
        let target = if muted { 0.0 } else { self.master_volume };
        let t = self.ctx.current_time();
        self.master.gain().set_target_at_time(target, t, 0.015).ok();
    }

    // === One-shot voices ===

    /// osc -> [lowpass] -> gain envelope -> [panner] -> fx
    pub fn play_tone(&self, spec: &SoundSpec) {
        let Some(osc) = self.ctx.create_oscillator().ok() else {
            return;
        };
        let Some(gain) = self.ctx.create_gain().ok() else {
            return;
        };
        let t = self.ctx.current_time() + spec.delay;

        osc.set_type(osc_type(spec.wave));
        osc.frequency().set_value_at_time(spec.freq, t).ok();
        if let Some(end) = spec.end_freq {
            osc.frequency()
                .exponential_ramp_to_value_at_time(end, t + spec.duration as f64)
                .ok();
        }

        gain.gain().set_value_at_time(0.0001, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(spec.gain, t + 0.01)
            .ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.0001, t + spec.duration as f64)
            .ok();

        let mut head: &web_sys::AudioNode = osc.as_ref();
        let filter: Option<BiquadFilterNode> = spec.lowpass.and_then(|cutoff| {
            let f = self.ctx.create_biquad_filter().ok()?;
            f.set_type(BiquadFilterType::Lowpass);
            f.frequency().set_value(cutoff);
            head.connect_with_audio_node(&f).ok()?;
            Some(f)
        });
        if let Some(f) = &filter {
            head = f.as_ref();
        }
        if head.connect_with_audio_node(&gain).is_err() {
            return;
        }

        let out: &web_sys::AudioNode = gain.as_ref();
        if spec.pan != 0.0 {
            if let Some(panner) = self.panner(spec.pan) {
                if out.connect_with_audio_node(&panner).is_ok() {
                    panner.connect_with_audio_node(&self.fx).ok();
                }
            } else {
                out.connect_with_audio_node(&self.fx).ok();
            }
        } else {
            out.connect_with_audio_node(&self.fx).ok();
        }

        if spec.echo {
            self.add_echo(gain.as_ref(), t + spec.duration as f64);
        }

        osc.start_with_when(t).ok();
        osc.stop_with_when(t + spec.duration as f64 + 0.05).ok();
    }

    pub fn play_drum(&self, kind: Percussion, velocity: f32, pan: f32) {
        match kind {
            Percussion::Kick => self.play_kick(velocity),
            Percussion::Snare => self.play_noise_hit(velocity * 0.5, pan, 1200.0, 1.2, 0.18),
            Percussion::Hat => self.play_noise_hit(velocity * 0.25, pan, 3000.0, 2.0, 0.05),
        }
    }

    /// Sine drop 150 -> 50 Hz
    fn play_kick(&self, velocity: f32) {
        let Some(osc) = self.ctx.create_oscillator().ok() else {
            return;
        };
        let Some(gain) = self.ctx.create_gain().ok() else {
            return;
        };
        let t = self.ctx.current_time();

        osc.set_type(OscillatorType::Sine);
        osc.frequency().set_value_at_time(150.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(50.0, t + 0.12)
            .ok();
        gain.gain().set_value_at_time(velocity * 0.5, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.0001, t + 0.14)
            .ok();

        if osc.connect_with_audio_node(&gain).is_err() {
            return;
        }
        gain.connect_with_audio_node(&self.fx).ok();
        osc.start().ok();
        osc.stop_with_when(t + 0.16).ok();
    }

    /// noise -> bandpass -> gain envelope -> [panner] -> fx
    fn play_noise_hit(&self, gain_level: f32, pan: f32, freq: f32, q: f32, dur: f64) {
        let Some(src) = self.noise_source() else {
            return;
        };
        let Some(filter) = self.ctx.create_biquad_filter().ok() else {
            return;
        };
        let Some(gain) = self.ctx.create_gain().ok() else {
            return;
        };
        let t = self.ctx.current_time();

        filter.set_type(BiquadFilterType::Bandpass);
        filter.frequency().set_value(freq);
        filter.q().set_value(q);
        gain.gain().set_value_at_time(gain_level, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.0001, t + dur)
            .ok();

        if src.connect_with_audio_node(&filter).is_err() {
            return;
        }
        if filter.connect_with_audio_node(&gain).is_err() {
            return;
        }
        if pan != 0.0 {
            if let Some(panner) = self.panner(pan) {
                if gain.connect_with_audio_node(&panner).is_ok() {
                    panner.connect_with_audio_node(&self.fx).ok();
                }
            }
        } else {
            gain.connect_with_audio_node(&self.fx).ok();
        }
        src.start().ok();
        src.stop_with_when(t + dur + 0.05).ok();
    }

    // === Ambience bed ===

    /// Looping shore hush, lapping-water swell and a slowly breathing pad
    /// trio. Runs until the context is suspended.
    pub fn start_ambience(&mut self) {
        // Shore hush: looped noise through a gentle lowpass
        if let (Some(src), Ok(filter), Ok(gain)) = (
            self.noise_source(),
            self.ctx.create_biquad_filter(),
            self.ctx.create_gain(),
        ) {
            src.set_loop(true);
            filter.set_type(BiquadFilterType::Lowpass);
            filter.frequency().set_value(600.0);
            gain.gain().set_value(0.15);
            let ok = src.connect_with_audio_node(&filter).is_ok()
                && filter.connect_with_audio_node(&gain).is_ok()
                && gain.connect_with_audio_node(&self.ambience).is_ok();
            if ok {
                src.start().ok();
            }
        }

        // Lapping water: bandpassed noise with a slow amplitude LFO
        if let (Some(src), Ok(filter), Ok(gain)) = (
            self.noise_source(),
            self.ctx.create_biquad_filter(),
            self.ctx.create_gain(),
        ) {
            src.set_loop(true);
            filter.set_type(BiquadFilterType::Bandpass);
            filter.frequency().set_value(400.0);
            filter.q().set_value(0.8);
            gain.gain().set_value(0.12);
            let ok = src.connect_with_audio_node(&filter).is_ok()
                && filter.connect_with_audio_node(&gain).is_ok()
                && gain.connect_with_audio_node(&self.ambience).is_ok();
            if ok {
                src.start().ok();
                self.attach_lfo(gain.gain(), 0.12, 0.06);
            }
        }

        // Pad trio through a short chorus delay
        self.pads.clear();
        self.pad_chord = 0;
        if let (Ok(pad_gain), Ok(delay)) = (self.ctx.create_gain(), self.ctx.create_delay()) {
            let delay: DelayNode = delay;
            delay.delay_time().set_value(0.03);
            pad_gain.gain().set_value(0.15);
            let wired = pad_gain.connect_with_audio_node(&self.ambience).is_ok()
                && pad_gain.connect_with_audio_node(&delay).is_ok()
                && delay.connect_with_audio_node(&self.ambience).is_ok();
            if wired {
                self.attach_lfo(pad_gain.gain(), 0.05, 0.08);
                for (i, &semis) in PAD_CHORDS[0].iter().enumerate() {
                    let Ok(osc) = self.ctx.create_oscillator() else {
                        continue;
                    };
                    osc.set_type(if i == 1 {
                        OscillatorType::Sine
                    } else {
                        OscillatorType::Triangle
                    });
                    osc.frequency().set_value(pad_freq(semis));
                    osc.detune().set_value((i as f32 - 1.0) * 4.0);
                    if osc.connect_with_audio_node(&pad_gain).is_ok() {
                        osc.start().ok();
                        self.pads.push(osc);
                    }
                }
            }
        }
    }

    /// Glide the pad trio to the next chord over 2.5s
    pub fn retune_pads(&mut self) {
        if self.pads.is_empty() {
            return;
        }
        self.pad_chord = (self.pad_chord + 1) % PAD_CHORDS.len();
        let t = self.ctx.current_time();
        for (osc, &semis) in self.pads.iter().zip(&PAD_CHORDS[self.pad_chord]) {
            osc.frequency()
                .linear_ramp_to_value_at_time(pad_freq(semis), t + 2.5)
                .ok();
        }
    }

    /// Route the external theme track through the ambience bus. The returned
    /// flag flips once the element actually starts producing sound.
    pub fn attach_external_track(&self, url: &str) -> Option<Rc<Cell<bool>>> {
        let element = HtmlAudioElement::new_with_src(url).ok()?;
        element.set_loop(true);
        let source = self.ctx.create_media_element_source(&element).ok()?;
        source.connect_with_audio_node(&self.ambience).ok()?;

        let playing = Rc::new(Cell::new(false));
        let flag = playing.clone();
        let on_playing = Closure::wrap(Box::new(move || {
            flag.set(true);
        }) as Box<dyn FnMut()>);
        element
            .add_event_listener_with_callback("playing", on_playing.as_ref().unchecked_ref())
            .ok()?;
        on_playing.forget();

        // A missing or blocked track rejects the play promise asynchronously
        let promise = element.play().ok()?;
        let on_rejected = Closure::wrap(Box::new(|_: JsValue| {}) as Box<dyn FnMut(JsValue)>);
        let _ = promise.catch(&on_rejected);
        on_rejected.forget();
        Some(playing)
    }

    // === Helpers ===

    fn panner(&self, pan: f32) -> Option<StereoPannerNode> {
        let panner = self.ctx.create_stereo_panner().ok()?;
        panner.pan().set_value(pan.clamp(-1.0, 1.0));
        Some(panner)
    }

    /// osc -> depth gain -> target param, stopped with the ambience context
    fn attach_lfo(&self, param: web_sys::AudioParam, freq: f32, depth: f32) {
        let (Ok(lfo), Ok(depth_gain)) = (self.ctx.create_oscillator(), self.ctx.create_gain())
        else {
            return;
        };
        lfo.frequency().set_value(freq);
        depth_gain.gain().set_value(depth);
        let ok = lfo.connect_with_audio_node(&depth_gain).is_ok()
            && depth_gain.connect_with_audio_param(&param).is_ok();
        if ok {
            lfo.start().ok();
        }
    }

    /// Feedback delay tail from `source` into the fx bus. The feedback gain
    /// is ramped to zero after the voice ends so the loop decays and stops.
    fn add_echo(&self, source: &web_sys::AudioNode, voice_end: f64) {
        let (Ok(delay), Ok(feedback), Ok(damp)) = (
            self.ctx.create_delay(),
            self.ctx.create_gain(),
            self.ctx.create_biquad_filter(),
        ) else {
            return;
        };
        delay.delay_time().set_value(0.23);
        feedback.gain().set_value(0.3);
        damp.set_type(BiquadFilterType::Lowpass);
        damp.frequency().set_value(1600.0);

        let ok = source.connect_with_audio_node(&delay).is_ok()
            && delay.connect_with_audio_node(&damp).is_ok()
            && damp.connect_with_audio_node(&feedback).is_ok()
            && feedback.connect_with_audio_node(&delay).is_ok()
            && damp.connect_with_audio_node(&self.fx).is_ok();
        if ok {
            feedback
                .gain()
                .set_target_at_time(0.0, voice_end + 1.5, 0.3)
                .ok();
        }
    }

    fn noise_source(&self) -> Option<AudioBufferSourceNode> {
        let src = self.ctx.create_buffer_source().ok()?;
        src.set_buffer(Some(&self.noise));
        Some(src)
    }
}

/// Half a second of white noise from a small xorshift (no need to pull the
/// game RNG into the audio layer)
fn make_noise_buffer(ctx: &AudioContext) -> Option<AudioBuffer> {
    let sample_rate = ctx.sample_rate();
    let len = (sample_rate * 0.5) as u32;
    let buffer = ctx.create_buffer(1, len, sample_rate).ok()?;

    let mut state: u32 = 0x9e3779b9;
    let mut samples = vec![0.0_f32; len as usize];
    for s in &mut samples {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        *s = (state as f32 / u32::MAX as f32) * 2.0 - 1.0;
    }
    buffer.copy_to_channel(&samples, 0).ok()?;
    Some(buffer)
}

fn pad_freq(semitones: i32) -> f32 {
    PAD_ROOT_HZ * 2.0_f32.powf(semitones as f32 / 12.0)
}
