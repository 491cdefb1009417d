//! Channel signals and validated acquisitions

use crate::AcquisitionError;
use serde::{Deserialize, Serialize};

/// Samples of one channel at a fixed sampling rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSignal {
    /// Channel index within its acquisition
    pub channel: usize,
    /// Sampling rate (Hz)
    pub sample_rate: f64,
    /// Ordered samples
    pub samples: Vec<f64>,
}

impl ChannelSignal {
    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the signal has no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration covered by the samples (seconds)
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate
    }
}

/// Raw per-channel data as delivered by a signal source
#[derive(Debug, Clone)]
pub enum RawChannel {
    /// Already-real samples
    Samples(Vec<f64>),
    /// 16-bit ADC readings
    Adc(Vec<u16>),
    /// Big-endian byte pairs of 16-bit ADC readings
    Bytes(Vec<u8>),
}

impl RawChannel {
    /// Interpret the raw data as real samples
    pub fn into_samples(self) -> Result<Vec<f64>, AcquisitionError> {
        match self {
            RawChannel::Samples(samples) => Ok(samples),
            RawChannel::Adc(words) => Ok(words.into_iter().map(f64::from).collect()),
            RawChannel::Bytes(bytes) => {
                if bytes.len() % 2 != 0 {
                    return Err(AcquisitionError::UnsupportedFormat(format!(
                        "byte stream of length {} is not a sequence of 16-bit words",
                        bytes.len()
                    )));
                }
                Ok(bytes
                    .chunks_exact(2)
                    .map(|pair| f64::from(u16::from_be_bytes([pair[0], pair[1]])))
                    .collect())
            }
        }
    }
}

/// One synchronized batch of samples across all channels.
///
/// All channels share the same length and sampling rate and are stored in
/// ascending channel order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acquisition {
    sample_rate: f64,
    channels: Vec<ChannelSignal>,
}

impl Acquisition {
    /// Build an acquisition from per-channel samples (index = channel)
    pub fn new(sample_rate: f64, channels: Vec<Vec<f64>>) -> Result<Self, AcquisitionError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(AcquisitionError::InvalidSampleRate(sample_rate));
        }
        let Some(first) = channels.first() else {
            return Err(AcquisitionError::UnsupportedFormat(
                "acquisition has no channels".to_string(),
            ));
        };
        let len = first.len();
        if len == 0 {
            return Err(AcquisitionError::UnsupportedFormat(
                "acquisition channels are empty".to_string(),
            ));
        }
        if let Some((idx, ragged)) = channels.iter().enumerate().find(|(_, c)| c.len() != len) {
            return Err(AcquisitionError::UnsupportedFormat(format!(
                "channel {} has {} samples, expected {}",
                idx,
                ragged.len(),
                len
            )));
        }

        let channels = channels
            .into_iter()
            .enumerate()
            .map(|(channel, samples)| ChannelSignal {
                channel,
                sample_rate,
                samples,
            })
            .collect();

        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Build an acquisition from raw source data
    pub fn from_raw(sample_rate: f64, raw: Vec<RawChannel>) -> Result<Self, AcquisitionError> {
        let channels = raw
            .into_iter()
            .map(RawChannel::into_samples)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(sample_rate, channels)
    }

    /// Sampling rate (Hz)
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel
    pub fn sample_count(&self) -> usize {
        self.channels.first().map_or(0, ChannelSignal::len)
    }

    /// Channel signals in ascending channel order
    pub fn channels(&self) -> &[ChannelSignal] {
        &self.channels
    }

    /// A single channel
    pub fn channel(&self, index: usize) -> Option<&ChannelSignal> {
        self.channels.get(index)
    }

    /// Sample-wise mean of repeated acquisitions (epochs) of the same shape
    pub fn average(epochs: &[Acquisition]) -> Result<Self, AcquisitionError> {
        let Some(first) = epochs.first() else {
            return Err(AcquisitionError::UnsupportedFormat("no epochs to average".to_string()));
        };
        let shape = (first.channel_count(), first.sample_count());
        if let Some(other) = epochs
            .iter()
            .find(|e| (e.channel_count(), e.sample_count()) != shape || e.sample_rate != first.sample_rate)
        {
            return Err(AcquisitionError::UnsupportedFormat(format!(
                "epoch of {} x {} at {} Hz does not match {} x {} at {} Hz",
                other.channel_count(),
                other.sample_count(),
                other.sample_rate,
                shape.0,
                shape.1,
                first.sample_rate
            )));
        }

        let count = epochs.len() as f64;
        let channels = (0..shape.0)
            .map(|ch| {
                (0..shape.1)
                    .map(|i| epochs.iter().map(|e| e.channels[ch].samples[i]).sum::<f64>() / count)
                    .collect()
            })
            .collect();
        Self::new(first.sample_rate, channels)
    }
}

/// Demultiplex a round-robin sample stream (ch0, ch1, .., chN, ch0, ..) into
/// `channels` sequences of at most `samples_per_channel` samples each.
///
/// Trailing words that do not complete a frame are dropped.
pub fn deinterleave(words: &[u16], channels: usize, samples_per_channel: usize) -> Vec<Vec<f64>> {
    if channels == 0 {
        return Vec::new();
    }
    let frames = (words.len() / channels).min(samples_per_channel);
    let mut out = vec![Vec::with_capacity(frames); channels];
    for frame in words.chunks_exact(channels).take(frames) {
        for (channel, &word) in frame.iter().enumerate() {
            out[channel].push(f64::from(word));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_acquisition_shape() {
        let acq = Acquisition::new(500.0, vec![vec![0.0; 10], vec![1.0; 10]]).unwrap();
        assert_eq!(acq.channel_count(), 2);
        assert_eq!(acq.sample_count(), 10);
        assert_eq!(acq.channel(1).unwrap().channel, 1);
        assert!((acq.channel(0).unwrap().duration_secs() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_average_epochs() {
        let a = Acquisition::new(500.0, vec![vec![1.0, 2.0], vec![0.0, 4.0]]).unwrap();
        let b = Acquisition::new(500.0, vec![vec![3.0, 2.0], vec![2.0, -4.0]]).unwrap();
        let mean = Acquisition::average(&[a.clone(), b]).unwrap();
        assert_eq!(mean.channel(0).unwrap().samples, vec![2.0, 2.0]);
        assert_eq!(mean.channel(1).unwrap().samples, vec![1.0, 0.0]);

        let short = Acquisition::new(500.0, vec![vec![1.0], vec![1.0]]).unwrap();
        assert!(matches!(
            Acquisition::average(&[a, short]),
            Err(AcquisitionError::UnsupportedFormat(_))
        ));
        assert!(Acquisition::average(&[]).is_err());
    }

    #[test]
    fn test_ragged_channels_rejected() {
        let result = Acquisition::new(500.0, vec![vec![0.0; 10], vec![0.0; 9]]);
        assert!(matches!(result, Err(AcquisitionError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_empty_acquisition_rejected() {
        assert!(matches!(
            Acquisition::new(500.0, vec![]),
            Err(AcquisitionError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            Acquisition::new(500.0, vec![vec![]]),
            Err(AcquisitionError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_invalid_sample_rate() {
        assert!(matches!(
            Acquisition::new(0.0, vec![vec![1.0]]),
            Err(AcquisitionError::InvalidSampleRate(_))
        ));
    }

    #[test]
    fn test_raw_bytes_decoding() {
        let raw = RawChannel::Bytes(vec![0x01, 0x02, 0xFF, 0xFF]);
        assert_eq!(raw.into_samples().unwrap(), vec![258.0, 65535.0]);
    }

    #[test]
    fn test_odd_byte_stream_unsupported() {
        let result = Acquisition::from_raw(500.0, vec![RawChannel::Bytes(vec![1, 2, 3])]);
        assert!(matches!(result, Err(AcquisitionError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_deinterleave_round_robin() {
        let words = [10, 20, 11, 21, 12, 22, 13];
        let channels = deinterleave(&words, 2, 100);
        assert_eq!(channels[0], vec![10.0, 11.0, 12.0]);
        assert_eq!(channels[1], vec![20.0, 21.0, 22.0]);
    }

    proptest! {
        #[test]
        fn prop_deinterleave_equal_lengths(
            words in proptest::collection::vec(any::<u16>(), 0..200),
            channels in 1usize..8,
        ) {
            let out = deinterleave(&words, channels, usize::MAX);
            prop_assert_eq!(out.len(), channels);
            let len = out[0].len();
            prop_assert!(out.iter().all(|c| c.len() == len));
            prop_assert_eq!(len, words.len() / channels);
        }
    }
}
