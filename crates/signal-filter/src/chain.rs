//! Filter chain: notch -> bandpass -> FIR low-pass -> IIR low-pass

use crate::design::{butterworth, firwin_lowpass, FilterBand};
use crate::error::FilterError;
use crate::preprocess::sanitize;
use crate::sos::{fir_filter, SosFilter};
use acquisition::{Acquisition, ChannelSignal};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// Filter chain configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Enable the power-line notch
    pub notch: bool,
    /// Enable the broadband bandpass
    pub bandpass: bool,
    /// Enable the causal FIR low-pass
    pub fir: bool,
    /// Enable the zero-phase IIR low-pass
    pub iir: bool,

    /// Power-line frequency (Hz)
    pub notch_freq: f64,
    /// Notch quality factor (higher = narrower)
    pub quality_factor: f64,
    /// Bandpass edges (Hz)
    pub bandpass_low: f64,
    pub bandpass_high: f64,
    /// Bandpass Butterworth order
    pub bandpass_order: usize,
    /// FIR tap count
    pub fir_taps: usize,
    /// FIR cutoff (Hz)
    pub fir_cutoff: f64,
    /// IIR cutoff (Hz)
    pub iir_cutoff: f64,
    /// IIR Butterworth order
    pub iir_order: usize,
}

/// Notch Butterworth order
const NOTCH_ORDER: usize = 2;

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            notch: true,
            bandpass: true,
            fir: true,
            iir: true,
            notch_freq: 50.0,
            quality_factor: 30.0,
            bandpass_low: 0.5,
            bandpass_high: 50.0,
            bandpass_order: 5,
            fir_taps: 101,
            fir_cutoff: 30.0,
            iir_cutoff: 30.0,
            iir_order: 4,
        }
    }
}

impl FilterConfig {
    /// All stages disabled (sanitizing only)
    pub fn passthrough() -> Self {
        Self {
            notch: false,
            bandpass: false,
            fir: false,
            iir: false,
            ..Default::default()
        }
    }
}

/// Designed filter chain for one sampling rate
#[derive(Debug, Clone)]
pub struct FilterChain {
    config: FilterConfig,
    sample_rate: f64,
    notch: Option<SosFilter>,
    bandpass: Option<SosFilter>,
    fir: Option<Vec<f64>>,
    iir: Option<SosFilter>,
}

impl FilterChain {
    /// Design every enabled stage for the given sampling rate
    pub fn new(config: FilterConfig, sample_rate: f64) -> Result<Self, FilterError> {
        let notch = if config.notch {
            let w0 = config.notch_freq;
            let half_width = w0 / config.quality_factor;
            Some(butterworth(
                NOTCH_ORDER,
                FilterBand::Bandstop(w0 - half_width, w0 + half_width),
                sample_rate,
            )?)
        } else {
            None
        };
        let bandpass = if config.bandpass {
            Some(butterworth(
                config.bandpass_order,
                FilterBand::Bandpass(config.bandpass_low, config.bandpass_high),
                sample_rate,
            )?)
        } else {
            None
        };
        let fir = if config.fir {
            Some(firwin_lowpass(config.fir_taps, config.fir_cutoff, sample_rate)?)
        } else {
            None
        };
        let iir = if config.iir {
            Some(butterworth(config.iir_order, FilterBand::Lowpass(config.iir_cutoff), sample_rate)?)
        } else {
            None
        };

        info!(
            "Filter chain at {} Hz: notch={}, bandpass={}, fir={}, iir={}",
            sample_rate, config.notch, config.bandpass, config.fir, config.iir
        );

        Ok(Self {
            config,
            sample_rate,
            notch,
            bandpass,
            fir,
            iir,
        })
    }

    /// Chain configuration
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Sampling rate the chain was designed for (Hz)
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Shortest signal every enabled zero-phase stage accepts
    pub fn min_length(&self) -> usize {
        [&self.notch, &self.bandpass, &self.iir]
            .into_iter()
            .flatten()
            .map(|f| f.padlen() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Filter one channel's samples
    pub fn filter_signal(&self, samples: &[f64]) -> Result<Vec<f64>, FilterError> {
        let mut data = sanitize(samples);

        if let Some(notch) = &self.notch {
            data = notch.filtfilt(&data)?;
        }
        if let Some(bandpass) = &self.bandpass {
            data = bandpass.filtfilt(&data)?;
        }
        if let Some(taps) = &self.fir {
            data = fir_filter(taps, &data);
        }
        if let Some(iir) = &self.iir {
            data = iir.filtfilt(&data)?;
        }

        Ok(data)
    }

    /// Filter a batch of signals (rows = channels) sharing this sampling rate
    pub fn filter_batch(&self, batch: ArrayView2<'_, f64>) -> Result<Array2<f64>, FilterError> {
        let mut out = Array2::zeros(batch.raw_dim());
        for (row_in, mut row_out) in batch.outer_iter().zip(out.outer_iter_mut()) {
            let samples = row_in.to_vec();
            let filtered = self.filter_signal(&samples)?;
            row_out.assign(&ndarray::ArrayView1::from(&filtered));
        }
        Ok(out)
    }

    /// Filter every channel of an acquisition.
    ///
    /// A channel that fails is logged and comes back as `None`; the remaining
    /// channels are still filtered.
    pub fn filter_acquisition(&self, acquisition: &Acquisition) -> Vec<Option<ChannelSignal>> {
        acquisition
            .channels()
            .iter()
            .map(|channel| match self.filter_signal(&channel.samples) {
                Ok(samples) => {
                    debug!("Filtered channel {} ({} samples)", channel.channel, samples.len());
                    Some(ChannelSignal {
                        channel: channel.channel,
                        sample_rate: channel.sample_rate,
                        samples,
                    })
                }
                Err(e) => {
                    error!("An error occurred during filtering of channel {}: {}", channel.channel, e);
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use std::f64::consts::PI;

    const FS: f64 = 500.0;

    fn tone(freq: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| (2.0 * PI * freq * i as f64 / FS).sin()).collect()
    }

    #[test]
    fn test_default_chain_min_length() {
        let chain = FilterChain::new(FilterConfig::default(), FS).unwrap();
        // bandpass order 5 -> 11 coefficients -> padlen 33
        assert_eq!(chain.min_length(), 34);
    }

    #[test]
    fn test_output_length_matches_input() {
        let chain = FilterChain::new(FilterConfig::default(), FS).unwrap();
        let out = chain.filter_signal(&tone(10.0, 1000)).unwrap();
        assert_eq!(out.len(), 1000);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_non_finite_input_is_sanitized() {
        let chain = FilterChain::new(FilterConfig::default(), FS).unwrap();
        let mut input = tone(10.0, 500);
        input[10] = f64::NAN;
        input[20] = f64::INFINITY;
        let out = chain.filter_signal(&input).unwrap();
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_passthrough_only_sanitizes() {
        let chain = FilterChain::new(FilterConfig::passthrough(), FS).unwrap();
        let out = chain.filter_signal(&[1.0, f64::NAN, 3.0]).unwrap();
        assert_eq!(out, vec![1.0, 0.0, 3.0]);
        assert_eq!(chain.min_length(), 0);
    }

    #[test]
    fn test_high_frequency_attenuated() {
        let chain = FilterChain::new(FilterConfig::default(), FS).unwrap();
        let out = chain.filter_signal(&tone(120.0, 1000)).unwrap();
        let peak = out[200..800].iter().fold(0.0f64, |m, v| m.max(v.abs()));
        assert!(peak < 0.01, "peak {}", peak);
    }

    #[test]
    fn test_short_signal_fails() {
        let chain = FilterChain::new(FilterConfig::default(), FS).unwrap();
        let result = chain.filter_signal(&[0.0; 20]);
        assert!(matches!(result, Err(FilterError::FilterLength { .. })));
    }

    #[test]
    fn test_batch_rows_filtered_independently() {
        let chain = FilterChain::new(FilterConfig::default(), FS).unwrap();
        let a = tone(10.0, 600);
        let b = tone(20.0, 600);
        let mut batch = Array2::zeros((2, 600));
        batch.row_mut(0).assign(&ndarray::ArrayView1::from(&a));
        batch.row_mut(1).assign(&ndarray::ArrayView1::from(&b));

        let out = chain.filter_batch(batch.view()).unwrap();
        assert_eq!(out.dim(), (2, 600));
        let single = chain.filter_signal(&b).unwrap();
        for (x, y) in out.row(1).iter().zip(single.iter()) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_acquisition_failure_is_per_channel() {
        let chain = FilterChain::new(FilterConfig::default(), FS).unwrap();
        let acq = Acquisition::new(FS, vec![vec![0.0; 20], vec![0.0; 20]]).unwrap();
        let out = chain.filter_acquisition(&acq);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(Option::is_none));

        let acq = Acquisition::new(FS, vec![tone(10.0, 500), tone(12.0, 500)]).unwrap();
        let out = chain.filter_acquisition(&acq);
        assert!(out.iter().all(Option::is_some));
        assert_eq!(out[1].as_ref().unwrap().channel, 1);
    }

    #[test]
    fn test_invalid_notch_for_low_sample_rate() {
        let result = FilterChain::new(FilterConfig::default(), 100.0);
        assert!(matches!(result, Err(FilterError::InvalidCutoff { .. })));
    }
}
