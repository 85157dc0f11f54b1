//! End-to-end renderer scenarios.
//!
//! Exercises the block API the way a host would: declare streams, push
//! audio plus metadata per block, pull rendered output. The object path
//! carries the decorrelator's 255-sample compensation delay, which the
//! expected waveforms below account for.

use osr_core::metadata::{
    DirectSpeakerMetadata, ExclusionZone, Frequency, HoaMetadata, HoaNormalization, JumpPosition,
    ObjectMetadata, ObjectPosition, StreamInformation, TypeDefinition,
};
use osr_core::PolarPosition;
use osr_render::renderer::{OutputLayout, Renderer, RendererConfig};

const SAMPLE_RATE: u32 = 48000;
/// Group delay of the diffuseness decorrelation filters
const DIRECT_DELAY: usize = 255;

fn streams(kinds: &[TypeDefinition]) -> StreamInformation {
    StreamInformation {
        type_definitions: kinds.to_vec(),
    }
}

fn object_at(az: f64, el: f64, block_length: u32) -> ObjectMetadata {
    ObjectMetadata {
        position: ObjectPosition::Polar(PolarPosition::new(az, el, 1.0)),
        block_length,
        ..Default::default()
    }
}

fn render_block(renderer: &mut Renderer, block: usize) -> Vec<Vec<f32>> {
    let mut out = vec![vec![0.0f32; block]; renderer.speaker_count()];
    renderer.get_rendered_audio(&mut out, block);
    out
}

fn energy(x: &[f32]) -> f64 {
    x.iter().map(|s| (*s as f64) * (*s as f64)).sum()
}

#[test]
fn s1_stereo_centre_pan() {
    let block = 1024;
    let config = RendererConfig::new(
        OutputLayout::Stereo,
        0,
        SAMPLE_RATE,
        block as u32,
        streams(&[TypeDefinition::Objects]),
    );
    let mut renderer = Renderer::configure(config).unwrap();

    let input = vec![1.0f32; block];
    let md = object_at(0.0, 0.0, block as u32);

    renderer.add_object(&input, block, &md, 0);
    let out = render_block(&mut renderer, block);

    // After the compensation delay both channels sit at -3 dB
    let expected = std::f32::consts::FRAC_1_SQRT_2;
    for ch in 0..2 {
        assert!(
            (out[ch][block - 1] - expected).abs() < 1e-6,
            "channel {ch}: {}",
            out[ch][block - 1]
        );
        assert!(out[ch][DIRECT_DELAY - 1].abs() < 1e-9, "too early");
        assert!((out[ch][DIRECT_DELAY] - expected).abs() < 1e-6);
    }
}

#[test]
fn s2_stereo_hard_pan() {
    let block = 1024;
    let config = RendererConfig::new(
        OutputLayout::Stereo,
        0,
        SAMPLE_RATE,
        block as u32,
        streams(&[TypeDefinition::Objects]),
    );
    let mut renderer = Renderer::configure(config).unwrap();

    let input = vec![1.0f32; block];
    let md = object_at(-30.0, 0.0, block as u32);

    renderer.add_object(&input, block, &md, 0);
    let out = render_block(&mut renderer, block);

    assert!(out[0][block - 1].abs() < 1e-6, "left should be silent");
    assert!((out[1][block - 1] - 1.0).abs() < 1e-6, "right should be unity");
}

#[test]
fn s3_lfe_direct_speaker_routing() {
    let block = 512;
    let config = RendererConfig::new(
        OutputLayout::FivePointOne,
        0,
        SAMPLE_RATE,
        block as u32,
        streams(&[TypeDefinition::DirectSpeakers]),
    );
    let mut renderer = Renderer::configure(config).unwrap();

    let input: Vec<f32> = (0..block).map(|i| ((i % 7) as f32 - 3.0) / 3.0).collect();
    let md = DirectSpeakerMetadata {
        speaker_label: "LFE1".into(),
        channel_frequency: Frequency {
            low_pass: Some(100.0),
            high_pass: None,
        },
        ..Default::default()
    };

    renderer.add_direct_speaker(&input, block, &md, 0);
    let out = render_block(&mut renderer, block);

    // Channel order: M+030, M-030, M+000, LFE1, M+110, M-110
    for (i, sample) in out[3].iter().enumerate() {
        assert!((sample - input[i]).abs() < 1e-6, "LFE sample {i}");
    }
    for ch in [0, 1, 2, 4, 5] {
        assert!(energy(&out[ch]) < 1e-12, "channel {ch} not silent");
    }
}

#[test]
fn s4_jump_position_switches_within_one_sample() {
    let block = 512;
    let config = RendererConfig::new(
        OutputLayout::Stereo,
        0,
        SAMPLE_RATE,
        block as u32,
        streams(&[TypeDefinition::Objects]),
    );
    let mut renderer = Renderer::configure(config).unwrap();
    let input = vec![1.0f32; block];

    renderer.add_object(&input, block, &object_at(0.0, 0.0, block as u32), 0);
    let mut left = render_block(&mut renderer, block)[0].clone();

    let mut md = object_at(-30.0, 0.0, block as u32);
    md.jump_position = JumpPosition {
        flag: true,
        interpolation_length: Some(0),
    };
    renderer.add_object(&input, block, &md, 0);
    left.extend_from_slice(&render_block(&mut renderer, block)[0]);

    // The delayed gain curve steps from -3 dB to silence between two
    // consecutive samples
    let boundary = block + DIRECT_DELAY;
    assert!((left[boundary - 1] - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    assert!(left[boundary].abs() < 1e-6);
}

#[test]
fn s4_block_length_gives_linear_ramp() {
    let block = 512;
    let config = RendererConfig::new(
        OutputLayout::Stereo,
        0,
        SAMPLE_RATE,
        block as u32,
        streams(&[TypeDefinition::Objects]),
    );
    let mut renderer = Renderer::configure(config).unwrap();
    let input = vec![1.0f32; block];

    renderer.add_object(&input, block, &object_at(0.0, 0.0, block as u32), 0);
    let mut left = render_block(&mut renderer, block)[0].clone();

    let md = object_at(-30.0, 0.0, block as u32);
    renderer.add_object(&input, block, &md, 0);
    left.extend_from_slice(&render_block(&mut renderer, block)[0]);

    renderer.add_object(&input, block, &md, 0);
    left.extend_from_slice(&render_block(&mut renderer, block)[0]);

    // The left gain ramps linearly from -3 dB to zero over exactly one
    // block, shifted by the compensation delay
    let start = std::f32::consts::FRAC_1_SQRT_2;
    for i in [0usize, 128, 256, 384, 511] {
        let expected = start * (1.0 - i as f32 / block as f32);
        let sample = left[block + DIRECT_DELAY + i];
        assert!(
            (sample - expected).abs() < 1e-3,
            "ramp sample {i}: {sample} vs {expected}"
        );
    }
    assert!(left[2 * block + DIRECT_DELAY + 10].abs() < 1e-6, "ramp done");
}

#[test]
fn s5_zone_exclusion_conserves_energy() {
    let block = 512;
    let config = RendererConfig::new(
        OutputLayout::FivePointOne,
        0,
        SAMPLE_RATE,
        block as u32,
        streams(&[TypeDefinition::Objects]),
    );
    let mut renderer = Renderer::configure(config).unwrap();
    let input = vec![1.0f32; block];

    let mut md = object_at(0.0, 0.0, block as u32);
    md.zone_exclusion = vec![ExclusionZone::Polar {
        min_azimuth: -10.0,
        max_azimuth: 10.0,
        min_elevation: -10.0,
        max_elevation: 10.0,
    }];

    // Two blocks so the second is past the compensation delay
    renderer.add_object(&input, block, &md, 0);
    render_block(&mut renderer, block);
    renderer.add_object(&input, block, &md, 0);
    let out = render_block(&mut renderer, block);

    assert!(energy(&out[2]) < 1e-12, "excluded centre is active");
    let per_sample: f64 = (0..6).map(|ch| (out[ch][100] as f64).powi(2)).sum();
    assert!((per_sample - 1.0).abs() < 1e-6, "total power {per_sample}");
}

#[test]
fn s6_binaural_direct_speaker_lateralization() {
    let block = 512;
    let config = RendererConfig::new(
        OutputLayout::Binaural,
        1,
        SAMPLE_RATE,
        block as u32,
        streams(&[TypeDefinition::DirectSpeakers]),
    );
    let mut renderer = Renderer::configure(config).unwrap();
    assert_eq!(renderer.speaker_count(), 2);

    let input: Vec<f32> = (0..block)
        .map(|i| (2.0 * std::f64::consts::PI * 500.0 * i as f64 / SAMPLE_RATE as f64).sin() as f32)
        .collect();
    let md = DirectSpeakerMetadata {
        speaker_label: "M+030".into(),
        ..Default::default()
    };

    let mut left_energy = 0.0;
    let mut right_energy = 0.0;
    for _ in 0..4 {
        renderer.add_direct_speaker(&input, block, &md, 0);
        let out = render_block(&mut renderer, block);
        left_energy += energy(&out[0]);
        right_energy += energy(&out[1]);
    }

    assert!(left_energy > 0.0);
    assert!(
        left_energy > 1.2 * right_energy,
        "expected left dominance: L {left_energy} R {right_energy}"
    );
}

#[test]
fn hoa_round_trip_favours_matching_speaker() {
    let block = 256;
    let order = 3u32;
    let n_hoa = ((order + 1) * (order + 1)) as usize;
    let config = RendererConfig::new(
        OutputLayout::FivePointOne,
        order,
        SAMPLE_RATE,
        block as u32,
        streams(&vec![TypeDefinition::Hoa; n_hoa]),
    );
    let mut renderer = Renderer::configure(config).unwrap();

    // Encode a steady plane wave from the M+030 direction
    let mut coeffs = vec![0.0f64; n_hoa];
    osr_ambi::sh::sn3d_coefficients(PolarPosition::new(30.0, 0.0, 1.0), order, &mut coeffs);
    let input: Vec<Vec<f32>> = coeffs.iter().map(|c| vec![*c as f32; block]).collect();

    let metadata = HoaMetadata {
        orders: (0..=order as i32).flat_map(|o| std::iter::repeat(o).take((2 * o + 1) as usize)).collect(),
        degrees: (0..=order as i32).flat_map(|o| (-o..=o)).collect(),
        normalization: HoaNormalization::Sn3d,
        track_indices: (0..n_hoa).collect(),
        gain: 1.0,
    };

    renderer.add_hoa(&input, block, &metadata, 0);
    render_block(&mut renderer, block);
    renderer.add_hoa(&input, block, &metadata, 0);
    let out = render_block(&mut renderer, block);

    let levels: Vec<f64> = out.iter().map(|ch| ch[block - 1] as f64).collect();
    let best = levels
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.abs().partial_cmp(&b.1.abs()).unwrap())
        .unwrap()
        .0;
    assert_eq!(best, 0, "expected M+030 dominant, levels {levels:?}");

    let total: f64 = levels.iter().map(|l| l * l).sum();
    assert!(levels[0] * levels[0] / total > 0.4, "levels {levels:?}");
}

#[test]
fn n3d_input_matches_sn3d_input() {
    let block = 128;
    let config = |s: &StreamInformation| {
        RendererConfig::new(OutputLayout::FivePointOne, 1, SAMPLE_RATE, block as u32, s.clone())
    };
    let info = streams(&vec![TypeDefinition::Hoa; 4]);

    let mut sn3d = Renderer::configure(config(&info)).unwrap();
    let mut n3d = Renderer::configure(config(&info)).unwrap();

    let metadata_base = HoaMetadata {
        orders: vec![0, 1, 1, 1],
        degrees: vec![0, -1, 0, 1],
        normalization: HoaNormalization::Sn3d,
        track_indices: vec![0, 1, 2, 3],
        gain: 1.0,
    };

    let sn3d_input: Vec<Vec<f32>> = vec![
        vec![0.5; block],
        vec![0.2; block],
        vec![0.1; block],
        vec![0.4; block],
    ];
    // The same field expressed with N3D scaling
    let n3d_input: Vec<Vec<f32>> = sn3d_input
        .iter()
        .enumerate()
        .map(|(i, ch)| {
            let factor = if i == 0 { 1.0 } else { 3f32.sqrt() };
            ch.iter().map(|s| s * factor).collect()
        })
        .collect();

    sn3d.add_hoa(&sn3d_input, block, &metadata_base, 0);
    let out_a = render_block(&mut sn3d, block);

    let mut metadata_n3d = metadata_base.clone();
    metadata_n3d.normalization = HoaNormalization::N3d;
    n3d.add_hoa(&n3d_input, block, &metadata_n3d, 0);
    let out_b = render_block(&mut n3d, block);

    for ch in 0..6 {
        for i in 0..block {
            assert!(
                (out_a[ch][i] - out_b[ch][i]).abs() < 1e-5,
                "channel {ch} sample {i}"
            );
        }
    }
}

#[test]
fn undeclared_track_is_dropped_silently() {
    let block = 128;
    let config = RendererConfig::new(
        OutputLayout::Stereo,
        0,
        SAMPLE_RATE,
        block as u32,
        streams(&[TypeDefinition::Objects]),
    );
    let mut renderer = Renderer::configure(config).unwrap();

    let input = vec![1.0f32; block];
    let mut md = object_at(0.0, 0.0, block as u32);
    md.track_index = 7;
    renderer.add_object(&input, block, &md, 0);
    let out = render_block(&mut renderer, block);
    assert!(energy(&out[0]) + energy(&out[1]) < 1e-12);
}

#[test]
fn output_gain_ramps_over_one_block() {
    let block = 256;
    let config = RendererConfig::new(
        OutputLayout::FivePointOne,
        0,
        SAMPLE_RATE,
        block as u32,
        streams(&[TypeDefinition::DirectSpeakers]),
    );
    let mut renderer = Renderer::configure(config).unwrap();

    let input = vec![1.0f32; block];
    let md = DirectSpeakerMetadata {
        speaker_label: "M+000".into(),
        ..Default::default()
    };

    renderer.add_direct_speaker(&input, block, &md, 0);
    render_block(&mut renderer, block);

    renderer.set_output_gain(0.5);
    renderer.add_direct_speaker(&input, block, &md, 0);
    let out = render_block(&mut renderer, block);
    // Ramping from unity towards 0.5 across this block
    assert!(out[2][0] > 0.95);
    assert!((out[2][block - 1] - 0.5).abs() < 0.01);

    renderer.add_direct_speaker(&input, block, &md, 0);
    let out = render_block(&mut renderer, block);
    assert!((out[2][0] - 0.5).abs() < 1e-6);
}

#[test]
fn binaural_passthrough_is_added_unprocessed() {
    let block = 128;
    let config = RendererConfig::new(
        OutputLayout::Binaural,
        1,
        SAMPLE_RATE,
        block as u32,
        streams(&[TypeDefinition::Binaural, TypeDefinition::Binaural]),
    );
    let mut renderer = Renderer::configure(config).unwrap();

    let pair = vec![vec![0.25f32; block], vec![-0.5f32; block]];
    renderer.add_binaural(&pair, block, 0);
    let out = render_block(&mut renderer, block);
    for i in 0..block {
        assert!((out[0][i] - 0.25).abs() < 1e-6);
        assert!((out[1][i] + 0.5).abs() < 1e-6);
    }
}

#[test]
fn rendering_is_deterministic() {
    let block = 256;
    let build = || {
        let config = RendererConfig::new(
            OutputLayout::FivePointOne,
            1,
            SAMPLE_RATE,
            block as u32,
            streams(&[
                TypeDefinition::Objects,
                TypeDefinition::DirectSpeakers,
                TypeDefinition::Hoa,
                TypeDefinition::Hoa,
                TypeDefinition::Hoa,
                TypeDefinition::Hoa,
            ]),
        );
        Renderer::configure(config).unwrap()
    };

    let run = |renderer: &mut Renderer| -> Vec<u32> {
        let object_input: Vec<f32> = (0..block).map(|i| ((i * 31 % 17) as f32 / 17.0) - 0.5).collect();
        let speaker_input: Vec<f32> = (0..block).map(|i| ((i * 13 % 11) as f32 / 11.0) - 0.5).collect();
        let hoa_input: Vec<Vec<f32>> = (0..4)
            .map(|c| (0..block).map(|i| (((i + c) * 7 % 13) as f32 / 13.0) - 0.5).collect())
            .collect();

        let mut md = object_at(42.0, 7.0, block as u32);
        md.diffuse = 0.4;
        let ds = DirectSpeakerMetadata {
            speaker_label: "M-030".into(),
            track_index: 1,
            ..Default::default()
        };
        let hoa = HoaMetadata {
            orders: vec![0, 1, 1, 1],
            degrees: vec![0, -1, 0, 1],
            normalization: HoaNormalization::Sn3d,
            track_indices: vec![2, 3, 4, 5],
            gain: 0.8,
        };

        let mut bits = Vec::new();
        for _ in 0..3 {
            renderer.add_object(&object_input, block, &md, 0);
            renderer.add_direct_speaker(&speaker_input, block, &ds, 0);
            renderer.add_hoa(&hoa_input, block, &hoa, 0);
            let out = render_block(renderer, block);
            for channel in &out {
                bits.extend(channel.iter().map(|s| s.to_bits()));
            }
        }
        bits
    };

    let mut a = build();
    let mut b = build();
    assert_eq!(run(&mut a), run(&mut b));
}

#[test]
fn reset_returns_to_silence() {
    let block = 256;
    let config = RendererConfig::new(
        OutputLayout::FivePointOne,
        0,
        SAMPLE_RATE,
        block as u32,
        streams(&[TypeDefinition::Objects]),
    );
    let mut renderer = Renderer::configure(config).unwrap();

    let input = vec![1.0f32; block];
    let mut md = object_at(10.0, 0.0, block as u32);
    md.diffuse = 0.5;
    renderer.add_object(&input, block, &md, 0);
    render_block(&mut renderer, block);

    renderer.reset();
    let out = render_block(&mut renderer, block);
    let total: f64 = out.iter().map(|ch| energy(ch)).sum();
    assert!(total < 1e-12, "tails survived reset: {total}");
}

#[test]
fn configure_rejects_bad_setups() {
    let base = |order, info: StreamInformation| {
        RendererConfig::new(OutputLayout::FivePointOne, order, SAMPLE_RATE, 512, info)
    };

    assert!(Renderer::configure(base(4, streams(&[]))).is_err());

    // Three HOA channels cannot be an order-1 stream
    assert!(Renderer::configure(base(1, streams(&vec![TypeDefinition::Hoa; 3]))).is_err());

    // Wrong number of custom positions
    let mut config = base(0, streams(&[TypeDefinition::Objects]));
    config.layout_positions = vec![PolarPosition::new(30.0, 0.0, 1.0)];
    assert!(Renderer::configure(config).is_err());

    // Out-of-range loudspeaker
    let mut config = base(0, streams(&[TypeDefinition::Objects]));
    config.layout_positions = vec![
        PolarPosition::new(10.0, 0.0, 1.0), // M+030 must sit at exactly 30
        PolarPosition::new(-30.0, 0.0, 1.0),
        PolarPosition::new(0.0, 0.0, 1.0),
        PolarPosition::new(45.0, -30.0, 1.0),
        PolarPosition::new(110.0, 0.0, 1.0),
        PolarPosition::new(-110.0, 0.0, 1.0),
    ];
    assert!(Renderer::configure(config).is_err());

    // HRTF paths are not loadable by the core
    let mut config = RendererConfig::new(
        OutputLayout::Binaural,
        1,
        SAMPLE_RATE,
        512,
        streams(&[TypeDefinition::Objects]),
    );
    config.hrtf_path = Some("dataset.sofa".into());
    assert!(Renderer::configure(config).is_err());
}

#[test]
fn custom_positions_within_range_are_accepted() {
    let mut config = RendererConfig::new(
        OutputLayout::FivePointOne,
        0,
        SAMPLE_RATE,
        512,
        streams(&[TypeDefinition::Objects]),
    );
    // M+110/M-110 may sit anywhere in 100..120 degrees
    config.layout_positions = vec![
        PolarPosition::new(30.0, 0.0, 1.0),
        PolarPosition::new(-30.0, 0.0, 1.0),
        PolarPosition::new(0.0, 0.0, 1.0),
        PolarPosition::new(45.0, -30.0, 1.0),
        PolarPosition::new(105.0, 5.0, 1.0),
        PolarPosition::new(-105.0, 5.0, 1.0),
    ];
    let renderer = Renderer::configure(config).unwrap();
    assert_eq!(renderer.speaker_count(), 6);
}
