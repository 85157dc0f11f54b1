//! AllRAD ambisonic decoding to loudspeakers.
//!
//! The decode matrix pans a dense virtual-source grid through the
//! point-source panner and projects it back onto the spherical-harmonic
//! basis, with a Frobenius normalization so decoded energy matches the
//! sampled field. LFE outputs receive the low-passed omni channel.

use osr_ambi::bformat::BFormat;
use osr_ambi::sh::sn3d_coefficients;
use osr_ambi::{component_to_order, order_to_components};
use osr_core::coords::sphere_grid;
use osr_core::layout::Layout;
use osr_core::ConfigError;
use osr_dsp::BiquadTdf2;

use crate::point_source::PointSourcePanner;

/// Elevation rows of the decoding grid (2.5 degree pitch, ~6600 points).
const GRID_ROWS: usize = 73;
/// LFE feed low-pass cutoff per Rec. ITU-R BS.2127-1 sec. 6.3.
const LFE_CUTOFF_HZ: f64 = 120.0;
/// LFE feed level (-6 dB).
const LFE_GAIN: f32 = 0.5;

/// Ambisonics to loudspeaker decoder for one layout.
pub struct AllRadDecoder {
    layout: Layout,
    /// Rows per non-LFE loudspeaker, columns per ambisonic channel
    decode_matrix: Vec<Vec<f32>>,
    lfe_filters: Vec<BiquadTdf2>,
}

impl AllRadDecoder {
    pub fn new(order: u32, sample_rate: u32, layout: &Layout) -> Result<Self, ConfigError> {
        let psp = PointSourcePanner::new(layout)?;
        let n_speakers = psp.num_channels();
        let n_components = order_to_components(order);

        let grid = sphere_grid(GRID_ROWS);
        let n_grid = grid.len();
        let recip_grid = 1.0 / n_grid as f64;

        // Sample the sphere: panning gains G and (N3D) harmonics Y per
        // grid direction, then D = G * Y^T / N.
        let mut decode = vec![vec![0.0f64; n_components]; n_speakers];
        let mut sh = vec![0.0f64; n_components];
        let mut psp_gains = vec![0.0f64; n_speakers];
        let mut harmonics = vec![vec![0.0f64; n_components]; n_grid];

        for (i, point) in grid.iter().enumerate() {
            let polar = point.to_polar();
            sn3d_coefficients(polar, order, &mut sh);
            for (c, value) in sh.iter().enumerate() {
                let to_n3d = ((2 * component_to_order(c) + 1) as f64).sqrt();
                harmonics[i][c] = value * to_n3d;
            }
            psp.gains(*point, &mut psp_gains);

            for (spk, row) in decode.iter_mut().enumerate() {
                for (c, cell) in row.iter_mut().enumerate() {
                    *cell += psp_gains[spk] * harmonics[i][c] * recip_grid;
                }
            }
        }

        // Frobenius norm of the re-decoded sampling matrix fixes the level
        let mut frobenius_sq = 0.0f64;
        for point_harmonics in &harmonics {
            for row in &decode {
                let mut g = 0.0;
                for (c, cell) in row.iter().enumerate() {
                    g += cell * point_harmonics[c];
                }
                frobenius_sq += g * g;
            }
        }
        let norm_factor = (n_grid as f64).sqrt() / frobenius_sq.sqrt();

        // Fold the normalization and the SN3D input convention into the
        // matrix
        let mut decode_matrix = vec![vec![0.0f32; n_components]; n_speakers];
        for (spk, row) in decode.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let to_n3d = ((2 * component_to_order(c) + 1) as f64).sqrt();
                decode_matrix[spk][c] = (cell * norm_factor * to_n3d) as f32;
            }
        }

        let n_lfe = layout.channels.iter().filter(|c| c.is_lfe).count();
        let lfe_filters = (0..n_lfe)
            .map(|_| BiquadTdf2::lowpass(sample_rate as f64, LFE_CUTOFF_HZ, std::f64::consts::FRAC_1_SQRT_2))
            .collect();

        Ok(Self {
            layout: layout.clone(),
            decode_matrix,
            lfe_filters,
        })
    }

    pub fn num_speakers(&self) -> usize {
        self.layout.num_channels()
    }

    /// Decode a B-format block into per-speaker output (replacing the
    /// destination contents).
    pub fn process(&mut self, src: &BFormat, n_samples: usize, output: &mut [Vec<f32>]) {
        let mut decode_row = 0;
        let mut lfe_index = 0;
        for (spk, channel) in self.layout.channels.iter().enumerate() {
            let dst = &mut output[spk][..n_samples];
            if channel.is_lfe {
                dst.fill(0.0);
                let w = &src.channel(0)[..n_samples];
                self.lfe_filters[lfe_index].process_accumul(w, dst, LFE_GAIN);
                lfe_index += 1;
            } else {
                dst.fill(0.0);
                for (c, coeff) in self.decode_matrix[decode_row].iter().enumerate() {
                    if coeff.abs() < 1e-9 {
                        continue;
                    }
                    let component = &src.channel(c)[..n_samples];
                    for (d, s) in dst.iter_mut().zip(component.iter()) {
                        *d += s * coeff;
                    }
                }
                decode_row += 1;
            }
        }
    }

    pub fn reset(&mut self) {
        for filter in &mut self.lfe_filters {
            filter.reset();
        }
    }
}
