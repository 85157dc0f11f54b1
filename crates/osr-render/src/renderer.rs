//! The scene renderer: accepts per-block audio plus metadata for Objects,
//! HOA, DirectSpeakers and Binaural streams and mixes them into a
//! loudspeaker layout or a binaural pair.
//!
//! For loudspeaker targets the HOA bus decodes through AllRAD and sums with
//! the panned buses. For binaural the panned buses feed a virtual 9+10+5
//! bed that is encoded to HOA, rotated to the head orientation and
//! convolved with HRTFs (EBU Tech 3396).

use std::collections::HashMap;
use std::sync::Arc;

use log::warn;

use osr_ambi::{
    order_and_degree_to_component, order_to_components, AmbisonicEncoder, AmbisonicRotator,
    BFormat, Binauralizer, HrtfSet, RotationOrientation, SyntheticHrtf,
};
use osr_core::conversions::to_polar;
use osr_core::layout::check_layout_angles;
use osr_core::metadata::{
    is_lfe_metadata, DirectSpeakerMetadata, HoaMetadata, HoaNormalization, ObjectMetadata,
    StreamInformation, TypeDefinition,
};
use osr_core::{ConfigError, Layout, PolarPosition, Screen};
use osr_dsp::{Decorrelator, GainInterp};

use crate::allrad::AllRadDecoder;
use crate::direct_speakers::DirectSpeakerGainCalc;
use crate::object_gains::ObjectGainCalc;

/// Fade time for head-orientation changes, in milliseconds.
const ROTATION_FADE_MS: f32 = 50.0;

/// The output targets the renderer supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    /// 2.0 - BS.2051-3 System A (0+2+0)
    Stereo,
    /// Front and back pairs at +-45 / +-135
    Quad,
    /// 5.1 - System B (0+5+0)
    FivePointOne,
    /// 5.1.2 - System C (2+5+0)
    FivePointOnePointTwo,
    /// 5.1.4 - System D (4+5+0)
    FivePointOnePointFour,
    /// System E (4+5+1)
    FivePointOnePointFourPlusLow,
    /// 7.1.3 - System F (3+7+0)
    SevenPointOnePointThree,
    /// 13.1 - System G (4+9+0)
    ThirteenPointOne,
    /// 22.2 - System H (9+10+3)
    TwentyTwoPointTwo,
    /// 7.1 - System I (0+7+0)
    SevenPointOne,
    /// 7.1.4 - System J (4+7+0)
    SevenPointOnePointFour,
    /// EBU Tech 3396 BEAR layout (9+10+5)
    Bear9p10p5,
    /// 7.1.2 - IAMF v1.0.0 (2+7+0)
    SevenPointOnePointTwo,
    /// 3.1.2 - IAMF v1.0.0 (2+3+0)
    ThreePointOnePointTwo,
    /// HRTF-convolved two-channel output
    Binaural,
}

impl OutputLayout {
    fn layout_name(self) -> &'static str {
        match self {
            OutputLayout::Stereo => "0+2+0",
            OutputLayout::Quad => "0+4+0",
            OutputLayout::FivePointOne => "0+5+0",
            OutputLayout::FivePointOnePointTwo => "2+5+0",
            OutputLayout::FivePointOnePointFour => "4+5+0",
            OutputLayout::FivePointOnePointFourPlusLow => "4+5+1",
            OutputLayout::SevenPointOnePointThree => "3+7+0",
            OutputLayout::ThirteenPointOne => "4+9+0",
            OutputLayout::TwentyTwoPointTwo => "9+10+3",
            OutputLayout::SevenPointOne => "0+7+0",
            OutputLayout::SevenPointOnePointFour => "4+7+0",
            OutputLayout::Bear9p10p5 => "9+10+5",
            OutputLayout::SevenPointOnePointTwo => "2+7+0",
            OutputLayout::ThreePointOnePointTwo => "2+3+0",
            // Rendered into the BEAR bed before binauralization
            OutputLayout::Binaural => "9+10+5",
        }
    }
}

/// Everything the renderer needs to know at configure time.
pub struct RendererConfig {
    pub output: OutputLayout,
    pub hoa_order: u32,
    pub sample_rate: u32,
    pub block_size: u32,
    pub stream_info: StreamInformation,
    /// HRTF set for binaural output. Defaults to the built-in synthetic set.
    pub hrtf: Option<Arc<dyn HrtfSet>>,
    /// Path to an external HRTF dataset; loading is outside the core, so a
    /// path without a registered set fails configuration.
    pub hrtf_path: Option<String>,
    /// Render LFE channels into the binaural bed (EBU Tech 3396 sec. 3.7.1)
    pub use_lfe_binaural: bool,
    pub reproduction_screen: Option<Screen>,
    /// Real loudspeaker positions overriding the layout defaults. Empty
    /// means nominal positions.
    pub layout_positions: Vec<PolarPosition>,
}

impl RendererConfig {
    pub fn new(
        output: OutputLayout,
        hoa_order: u32,
        sample_rate: u32,
        block_size: u32,
        stream_info: StreamInformation,
    ) -> Self {
        Self {
            output,
            hoa_order,
            sample_rate,
            block_size,
            stream_info,
            hrtf: None,
            hrtf_path: None,
            use_lfe_binaural: false,
            reproduction_screen: None,
            layout_positions: Vec::new(),
        }
    }
}

/// The object-based scene renderer.
pub struct Renderer {
    output: OutputLayout,
    num_ambi_channels: usize,
    block_size: usize,
    layout: Layout,
    num_channels_to_render: usize,
    num_channels_to_output: usize,

    /// (track index, declared type) per pannable stream
    panner_tracks: Vec<(usize, TypeDefinition)>,
    channel_to_object: HashMap<usize, usize>,
    channel_to_direct_speaker: HashMap<usize, usize>,
    hoa_track_set: Vec<usize>,

    object_metadata: Vec<Option<ObjectMetadata>>,
    gain_interp_direct: Vec<GainInterp>,
    gain_interp_diffuse: Vec<GainInterp>,
    direct_speaker_gain_interp: Vec<GainInterp>,
    hoa_gain_interp: Vec<GainInterp>,
    out_gain_interp: Vec<GainInterp>,
    /// Smoothing time for metadata gain changes: one block
    gain_interp_time: u32,

    object_gain_calc: ObjectGainCalc,
    direct_speaker_gain_calc: DirectSpeakerGainCalc,
    decorrelator: Decorrelator,

    hoa_decoder: Option<AllRadDecoder>,
    hoa_encoders: Vec<AmbisonicEncoder>,
    hoa_rotator: Option<AmbisonicRotator>,
    binauralizer: Option<Binauralizer>,
    use_lfe_binaural: bool,

    hoa_bus: BFormat,
    speaker_out: Vec<Vec<f32>>,
    speaker_out_direct: Vec<Vec<f32>>,
    speaker_out_diffuse: Vec<Vec<f32>>,
    virtual_speaker_out: Vec<Vec<f32>>,
    binaural_out: Vec<Vec<f32>>,

    direct_gains: Vec<f64>,
    diffuse_gains: Vec<f64>,
    direct_speaker_gains: Vec<f64>,
}

impl Renderer {
    /// Build a renderer for the given configuration. On error the renderer
    /// does not exist; there is no partially-configured state.
    pub fn configure(config: RendererConfig) -> Result<Self, ConfigError> {
        if config.hoa_order > 3 {
            return Err(ConfigError::InvalidHoaOrder(config.hoa_order));
        }
        if config.block_size == 0 {
            return Err(ConfigError::InvalidParameter("block size must be non-zero".into()));
        }
        let block_size = config.block_size as usize;
        let num_ambi_channels = order_to_components(config.hoa_order);

        let mut layout = Layout::with_name(config.output.layout_name())
            .ok_or_else(|| ConfigError::InvalidLayout(config.output.layout_name().into()))?;
        if config.output == OutputLayout::Binaural {
            layout = layout.without_lfe();
        }

        if !config.layout_positions.is_empty() {
            if config.layout_positions.len() != layout.num_channels() {
                return Err(ConfigError::LayoutPositionCount {
                    expected: layout.num_channels(),
                    got: config.layout_positions.len(),
                });
            }
            for (channel, position) in layout.channels.iter_mut().zip(&config.layout_positions) {
                channel.polar_position = *position;
            }
        }
        if !check_layout_angles(&layout) {
            return Err(ConfigError::SpeakerOutOfRange(layout.name.clone()));
        }

        layout.reproduction_screen = config.reproduction_screen.clone();

        let num_channels_to_render = layout.num_channels();
        let num_channels_to_output = if config.output == OutputLayout::Binaural {
            2
        } else {
            num_channels_to_render
        };

        // Wire up per-track processors from the stream declaration
        let mut panner_tracks = Vec::new();
        let mut channel_to_object = HashMap::new();
        let mut channel_to_direct_speaker = HashMap::new();
        let mut hoa_track_set = Vec::new();
        let mut object_metadata = Vec::new();
        let mut gain_interp_direct = Vec::new();
        let mut gain_interp_diffuse = Vec::new();
        let mut direct_speaker_gain_interp = Vec::new();

        for (track, kind) in config.stream_info.type_definitions.iter().enumerate() {
            match kind {
                TypeDefinition::Objects => {
                    panner_tracks.push((track, TypeDefinition::Objects));
                    channel_to_object.insert(track, object_metadata.len());
                    object_metadata.push(None);
                    gain_interp_direct.push(GainInterp::new(num_channels_to_render));
                    gain_interp_diffuse.push(GainInterp::new(num_channels_to_render));
                }
                TypeDefinition::DirectSpeakers => {
                    panner_tracks.push((track, TypeDefinition::DirectSpeakers));
                    channel_to_direct_speaker.insert(track, direct_speaker_gain_interp.len());
                    direct_speaker_gain_interp.push(GainInterp::new(num_channels_to_render));
                }
                TypeDefinition::Hoa => hoa_track_set.push(track),
                TypeDefinition::Binaural => {}
            }
        }

        if !hoa_track_set.is_empty() && hoa_track_set.len() != num_ambi_channels {
            return Err(ConfigError::HoaChannelCountMismatch {
                expected: num_ambi_channels,
                got: hoa_track_set.len(),
            });
        }

        let object_gain_calc = ObjectGainCalc::new(&layout)?;
        let direct_speaker_gain_calc = DirectSpeakerGainCalc::new(&layout)?;
        let decorrelator = Decorrelator::new(num_channels_to_render, block_size);

        let mut hoa_decoder = None;
        let mut hoa_encoders = Vec::new();
        let mut hoa_rotator = None;
        let mut binauralizer = None;

        if config.output == OutputLayout::Binaural {
            for channel in &layout.channels {
                let mut encoder = AmbisonicEncoder::new(config.hoa_order, config.sample_rate, 0.0);
                let mut position = channel.polar_position;
                position.distance = 1.0;
                encoder.set_position(position);
                hoa_encoders.push(encoder);
            }
            hoa_rotator = Some(AmbisonicRotator::new(
                config.hoa_order,
                block_size,
                config.sample_rate,
                ROTATION_FADE_MS,
            ));

            let hrtf: Arc<dyn HrtfSet> = match (&config.hrtf, &config.hrtf_path) {
                (Some(set), _) => Arc::clone(set),
                (None, Some(path)) => {
                    return Err(ConfigError::HrtfNotAvailable(format!(
                        "no loader for HRTF dataset at {path}; register a set instead"
                    )))
                }
                (None, None) => Arc::new(SyntheticHrtf::new(config.sample_rate)),
            };
            if hrtf.sample_rate() != config.sample_rate {
                return Err(ConfigError::HrtfNotAvailable(format!(
                    "HRTF sample rate {} does not match stream rate {}",
                    hrtf.sample_rate(),
                    config.sample_rate
                )));
            }
            binauralizer = Some(Binauralizer::new(
                config.hoa_order,
                block_size,
                hrtf.as_ref(),
                config.sample_rate,
            )?);
        } else {
            hoa_decoder = Some(AllRadDecoder::new(
                config.hoa_order,
                config.sample_rate,
                &layout,
            )?);
        }

        let zero_bus = |ch: usize| vec![vec![0.0f32; block_size]; ch];
        let mut hoa_gain_interp: Vec<GainInterp> =
            (0..num_ambi_channels).map(|_| GainInterp::new(1)).collect();
        for interp in &mut hoa_gain_interp {
            interp.set_gain(1.0, config.block_size);
        }
        let mut out_gain_interp: Vec<GainInterp> =
            (0..num_channels_to_output).map(|_| GainInterp::new(1)).collect();
        for interp in &mut out_gain_interp {
            interp.set_gain(1.0, 0);
        }

        Ok(Self {
            output: config.output,
            num_ambi_channels,
            block_size,
            num_channels_to_render,
            num_channels_to_output,
            panner_tracks,
            channel_to_object,
            channel_to_direct_speaker,
            hoa_track_set,
            object_metadata,
            gain_interp_direct,
            gain_interp_diffuse,
            direct_speaker_gain_interp,
            hoa_gain_interp,
            out_gain_interp,
            gain_interp_time: config.block_size,
            object_gain_calc,
            direct_speaker_gain_calc,
            decorrelator,
            hoa_decoder,
            hoa_encoders,
            hoa_rotator,
            binauralizer,
            use_lfe_binaural: config.use_lfe_binaural,
            hoa_bus: BFormat::new(config.hoa_order, block_size),
            speaker_out: zero_bus(num_channels_to_render),
            speaker_out_direct: zero_bus(num_channels_to_render),
            speaker_out_diffuse: zero_bus(num_channels_to_render),
            virtual_speaker_out: zero_bus(num_channels_to_render),
            binaural_out: zero_bus(2),
            direct_gains: vec![0.0; num_channels_to_render],
            diffuse_gains: vec![0.0; num_channels_to_render],
            direct_speaker_gains: vec![0.0; num_channels_to_render],
            layout,
        })
    }

    /// Number of channels `get_rendered_audio` produces.
    pub fn speaker_count(&self) -> usize {
        self.num_channels_to_output
    }

    /// The layout being rendered to (the virtual bed for binaural).
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Apply head tracking. Only meaningful for binaural output.
    pub fn set_head_orientation(&mut self, orientation: RotationOrientation) {
        if let Some(rotator) = &mut self.hoa_rotator {
            rotator.set_orientation(orientation);
        }
    }

    /// Set the output gain; takes effect over one block.
    pub fn set_output_gain(&mut self, gain: f64) {
        let ramp = self.block_size as u32;
        for interp in &mut self.out_gain_interp {
            interp.set_gain(gain, ramp);
        }
    }

    /// Mix one Object block into the scene.
    pub fn add_object(
        &mut self,
        input: &[f32],
        n_samples: usize,
        metadata: &ObjectMetadata,
        offset: usize,
    ) {
        let converted = to_polar(metadata);

        let Some(&object_index) = self
            .track_index(converted.track_index, TypeDefinition::Objects)
            .and_then(|_| self.channel_to_object.get(&converted.track_index))
        else {
            warn!(
                "track {} was not declared as an Objects stream; input dropped",
                converted.track_index
            );
            return;
        };

        let changed = self.object_metadata[object_index]
            .as_ref()
            .map_or(true, |cached| cached != &converted);
        if changed {
            self.object_metadata[object_index] = Some(converted.clone());

            let mut for_calc = converted;
            if self.output == OutputLayout::Binaural {
                // EBU Tech 3396 sec. 3.6.1.1: no channel lock or zone
                // exclusion against the virtual bed
                for_calc.channel_lock = None;
                for_calc.zone_exclusion.clear();
            }

            self.object_gain_calc
                .calculate(&for_calc, &mut self.direct_gains, &mut self.diffuse_gains);

            // Jump-position semantics decide the interpolation span
            let interp_length = if for_calc.jump_position.flag {
                for_calc.jump_position.interpolation_length.unwrap_or(0)
            } else {
                for_calc.block_length
            };

            self.gain_interp_direct[object_index].set_gain_vector(&self.direct_gains, interp_length);
            self.gain_interp_diffuse[object_index]
                .set_gain_vector(&self.diffuse_gains, interp_length);
        }

        self.gain_interp_direct[object_index].process_accumul(
            input,
            &mut self.speaker_out_direct,
            n_samples,
            offset,
            1.0,
        );
        self.gain_interp_diffuse[object_index].process_accumul(
            input,
            &mut self.speaker_out_diffuse,
            n_samples,
            offset,
            1.0,
        );
    }

    /// Mix a HOA block (one buffer per declared HOA channel) into the
    /// scene, converting the stream normalization to SN3D.
    pub fn add_hoa(&mut self, input: &[Vec<f32>], n_samples: usize, metadata: &HoaMetadata, offset: usize) {
        if metadata
            .track_indices
            .iter()
            .any(|t| !self.hoa_track_set.contains(t))
        {
            warn!("HOA metadata names a track that was not declared as HOA; input dropped");
            return;
        }

        if metadata.orders.len() != metadata.degrees.len() {
            warn!("HOA metadata orders/degrees length mismatch; input dropped");
            return;
        }

        for (channel, (&order, &degree)) in input
            .iter()
            .zip(metadata.orders.iter().zip(metadata.degrees.iter()))
        {
            let component = order_and_degree_to_component(order, degree);
            if component >= self.num_ambi_channels {
                warn!("HOA component ({order},{degree}) exceeds the configured order; channel dropped");
                continue;
            }
            let conversion = match metadata.normalization {
                HoaNormalization::Sn3d => 1.0,
                HoaNormalization::N3d => osr_ambi::n3d_to_sn3d_factor(order),
                HoaNormalization::FuMa => osr_ambi::fuma_to_sn3d_factor(order, degree),
            } as f32;

            self.hoa_gain_interp[component].set_gain(metadata.gain, self.gain_interp_time);
            self.hoa_bus
                .add_stream(channel, component, n_samples, offset, conversion);
            self.hoa_gain_interp[component]
                .process_in_place(&mut self.hoa_bus.channel_mut(component)[offset..offset + n_samples], n_samples);
        }
    }

    /// Mix one DirectSpeakers block into the scene.
    pub fn add_direct_speaker(
        &mut self,
        input: &[f32],
        n_samples: usize,
        metadata: &DirectSpeakerMetadata,
        offset: usize,
    ) {
        let is_lfe = is_lfe_metadata(metadata);
        if self.output == OutputLayout::Binaural && is_lfe && !self.use_lfe_binaural {
            // EBU Tech 3396 sec. 3.7.1: LFE content is dropped by default
            return;
        }

        let Some(&speaker_index) = self
            .track_index(metadata.track_index, TypeDefinition::DirectSpeakers)
            .and_then(|_| self.channel_to_direct_speaker.get(&metadata.track_index))
        else {
            warn!(
                "track {} was not declared as a DirectSpeakers stream; input dropped",
                metadata.track_index
            );
            return;
        };

        if self.output == OutputLayout::Binaural {
            // Reduce to the fields that route against the virtual bed
            let mut reduced = DirectSpeakerMetadata {
                speaker_label: metadata.speaker_label.clone(),
                polar_position: metadata.polar_position,
                channel_frequency: metadata.channel_frequency,
                screen_edge_lock: metadata.screen_edge_lock,
                track_index: metadata.track_index,
                audio_pack_format_id: None,
                gain: metadata.gain,
            };
            if is_lfe {
                // The bed has no LFE; low-frequency content goes to B+000
                reduced.speaker_label = "B+000".into();
                reduced.polar_position.azimuth = 0.0;
                reduced.polar_position.elevation = -30.0;
                reduced.channel_frequency = osr_core::Frequency::default();
            }
            self.direct_speaker_gain_calc
                .calculate(&reduced, &mut self.direct_speaker_gains);
        } else {
            self.direct_speaker_gain_calc
                .calculate(metadata, &mut self.direct_speaker_gains);
        }

        self.direct_speaker_gain_interp[speaker_index]
            .set_gain_vector(&self.direct_speaker_gains, self.gain_interp_time);
        self.direct_speaker_gain_interp[speaker_index].process_accumul(
            input,
            &mut self.speaker_out,
            n_samples,
            offset,
            1.0,
        );
    }

    /// Mix a pre-rendered binaural pair straight into the output. Ignored
    /// for loudspeaker targets.
    pub fn add_binaural(&mut self, input: &[Vec<f32>], n_samples: usize, offset: usize) {
        if self.output != OutputLayout::Binaural {
            return;
        }
        for (bus, channel) in self.binaural_out.iter_mut().zip(input.iter()) {
            for (d, s) in bus[offset..offset + n_samples].iter_mut().zip(channel.iter()) {
                *d += s;
            }
        }
    }

    /// Render everything added since the last call. `output` needs
    /// `speaker_count()` channels of at least `n_samples` samples; all
    /// internal buses are cleared afterwards.
    pub fn get_rendered_audio(&mut self, output: &mut [Vec<f32>], n_samples: usize) {
        debug_assert!(n_samples <= self.block_size);
        for channel in output.iter_mut().take(self.num_channels_to_output) {
            channel[..n_samples].fill(0.0);
        }

        // Diffuseness decorrelation plus the compensating direct delay
        self.decorrelator.process(
            &mut self.speaker_out_direct,
            &mut self.speaker_out_diffuse,
            n_samples,
        );

        if self.output == OutputLayout::Binaural {
            for ch in 0..self.num_channels_to_render {
                let virtual_ch = &mut self.virtual_speaker_out[ch];
                for i in 0..n_samples {
                    virtual_ch[i] += self.speaker_out[ch][i]
                        + self.speaker_out_direct[ch][i]
                        + self.speaker_out_diffuse[ch][i];
                }
            }

            // Virtual bed to HOA, rotated for head tracking, then HRTFs
            for (encoder, channel) in self.hoa_encoders.iter_mut().zip(&self.virtual_speaker_out) {
                encoder.process_accumul(channel, n_samples, &mut self.hoa_bus, 0, 1.0);
            }
            if let Some(rotator) = &mut self.hoa_rotator {
                rotator.process(&mut self.hoa_bus, n_samples);
            }
            if let Some(binauralizer) = &mut self.binauralizer {
                binauralizer.process(&self.hoa_bus, output, n_samples);
            }

            for (out, bus) in output.iter_mut().zip(self.binaural_out.iter_mut()) {
                for (o, b) in out[..n_samples].iter_mut().zip(bus.iter()) {
                    *o += *b;
                }
                bus.fill(0.0);
            }
            for channel in &mut self.virtual_speaker_out {
                channel.fill(0.0);
            }
        } else {
            if let Some(decoder) = &mut self.hoa_decoder {
                decoder.process(&self.hoa_bus, n_samples, output);
            }
            for ch in 0..self.num_channels_to_render {
                let out_ch = &mut output[ch];
                for i in 0..n_samples {
                    out_ch[i] += self.speaker_out[ch][i]
                        + self.speaker_out_direct[ch][i]
                        + self.speaker_out_diffuse[ch][i];
                }
            }
        }

        for (interp, channel) in self.out_gain_interp.iter_mut().zip(output.iter_mut()) {
            interp.process_in_place(&mut channel[..n_samples], n_samples);
        }

        self.hoa_bus.reset();
        for bus in [
            &mut self.speaker_out,
            &mut self.speaker_out_direct,
            &mut self.speaker_out_diffuse,
        ] {
            for channel in bus.iter_mut() {
                channel.fill(0.0);
            }
        }
    }

    /// Clear every interpolator, bus and filter tail.
    pub fn reset(&mut self) {
        self.decorrelator.reset();
        if let Some(binauralizer) = &mut self.binauralizer {
            binauralizer.reset();
        }
        if let Some(decoder) = &mut self.hoa_decoder {
            decoder.reset();
        }
        if let Some(rotator) = &mut self.hoa_rotator {
            rotator.reset();
        }
        for encoder in &mut self.hoa_encoders {
            encoder.reset();
        }
        self.hoa_bus.reset();
        for bus in [
            &mut self.speaker_out,
            &mut self.speaker_out_direct,
            &mut self.speaker_out_diffuse,
            &mut self.virtual_speaker_out,
            &mut self.binaural_out,
        ] {
            for channel in bus.iter_mut() {
                channel.fill(0.0);
            }
        }
        for interp in self
            .gain_interp_direct
            .iter_mut()
            .chain(self.gain_interp_diffuse.iter_mut())
            .chain(self.direct_speaker_gain_interp.iter_mut())
            .chain(self.hoa_gain_interp.iter_mut())
            .chain(self.out_gain_interp.iter_mut())
        {
            interp.reset();
        }
    }

    fn track_index(&self, track: usize, kind: TypeDefinition) -> Option<usize> {
        self.panner_tracks
            .iter()
            .position(|(t, k)| *t == track && *k == kind)
    }
}
