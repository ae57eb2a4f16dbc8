//! LQA Metrics Collector — windowed averaging of reception quality
//!
//! Accumulates per-word measurement samples from the demodulator and FEC
//! decoder in a fixed-length window. When the window fills, the collector
//! derives the composite metrics — averaged SNR and power levels, BER
//! estimated from FEC corrections, SINAD from SNR plus a configured
//! distortion floor, a multipath score from signal-power spread, and the
//! minimum-power noise floor — and pushes one extended update into the
//! [`LqaDatabase`]. The newest sample is kept as the seed of the next
//! window so the averages stay continuous.

use serde::{Deserialize, Serialize};

use crate::lqa_database::LqaDatabase;

/// One measurement taken during word reception.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsSample {
    pub snr_db: f32,
    pub signal_power_dbm: f32,
    pub noise_power_dbm: f32,
    /// FEC errors corrected in this word.
    pub fec_errors_corrected: u32,
    /// Word decoded successfully.
    pub decode_success: bool,
    /// Estimated multipath delay in milliseconds.
    pub multipath_delay_ms: f32,
    pub timestamp_ms: u64,
}

impl Default for MetricsSample {
    fn default() -> Self {
        Self {
            snr_db: 0.0,
            signal_power_dbm: -120.0,
            noise_power_dbm: -120.0,
            fec_errors_corrected: 0,
            decode_success: false,
            multipath_delay_ms: 0.0,
            timestamp_ms: 0,
        }
    }
}

/// Collector tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Samples per averaging window.
    pub averaging_window: usize,
    /// Signal-power standard deviation (dB) treated as severe multipath.
    pub multipath_threshold_db: f32,
    /// Distortion level relative to the signal assumed for SINAD.
    pub assumed_distortion_db: f32,
    /// Compute the multipath score at all.
    pub enable_multipath: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            averaging_window: 10,
            multipath_threshold_db: 3.0,
            assumed_distortion_db: -30.0,
            enable_multipath: true,
        }
    }
}

/// Windowed metrics collector feeding the LQA database.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    config: MetricsConfig,
    samples: Vec<MetricsSample>,
    window_fec_errors: u32,
    window_words: u32,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MetricsConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn set_config(&mut self, config: MetricsConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Samples currently buffered in the window.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Feed one sample; flushes an averaged update into `db` when the
    /// window fills, keeping the newest sample for continuity.
    pub fn add_sample(
        &mut self,
        db: &mut LqaDatabase,
        sample: MetricsSample,
        frequency_hz: u32,
        remote_station: &str,
    ) {
        self.samples.push(sample);
        self.window_fec_errors += sample.fec_errors_corrected;
        self.window_words += 1;

        if self.samples.len() >= self.config.averaging_window.max(1) {
            self.flush(db, frequency_hz, remote_station);
            let tail = self.samples.pop();
            self.samples.clear();
            self.samples.extend(tail);
        }
    }

    /// Averaged view of the current window.
    pub fn averaged_sample(&self) -> MetricsSample {
        if self.samples.is_empty() {
            return MetricsSample::default();
        }
        let n = self.samples.len() as f32;
        let mut avg = MetricsSample {
            snr_db: self.samples.iter().map(|s| s.snr_db).sum::<f32>() / n,
            signal_power_dbm: self.samples.iter().map(|s| s.signal_power_dbm).sum::<f32>() / n,
            noise_power_dbm: self.samples.iter().map(|s| s.noise_power_dbm).sum::<f32>() / n,
            multipath_delay_ms: self.samples.iter().map(|s| s.multipath_delay_ms).sum::<f32>() / n,
            ..MetricsSample::default()
        };
        avg.timestamp_ms = self.samples.last().map(|s| s.timestamp_ms).unwrap_or(0);
        avg
    }

    /// SINAD in dB from an SNR and a distortion level (dB below signal).
    ///
    /// `SINAD = 10·log10((S + N + D) / (N + D))` with powers expressed
    /// relative to the noise.
    pub fn calculate_sinad(&self, snr_db: f32, distortion_db: f32) -> f32 {
        let snr_linear = 10f32.powf(snr_db / 10.0);
        let distortion_linear = 10f32.powf(distortion_db / 10.0);
        let total = snr_linear + 1.0 + distortion_linear;
        let floor = 1.0 + distortion_linear;
        10.0 * (total / floor).log10()
    }

    /// Estimated channel BER from FEC corrections over 24-bit words,
    /// clamped to [0, 1].
    pub fn estimate_ber(&self, errors_corrected: u32, total_words: u32) -> f32 {
        if total_words == 0 {
            return 0.0;
        }
        (errors_corrected as f32 / (24.0 * total_words as f32)).clamp(0.0, 1.0)
    }

    /// Multipath score 0..=1 from signal-power spread: standard deviation
    /// over the window divided by the configured threshold.
    pub fn detect_multipath(&self, signal_powers: &[f32]) -> f32 {
        if signal_powers.len() < 3 {
            return 0.0;
        }
        let n = signal_powers.len() as f32;
        let mean = signal_powers.iter().sum::<f32>() / n;
        let variance = signal_powers.iter().map(|p| (p - mean).powi(2)).sum::<f32>() / n;
        (variance.sqrt() / self.config.multipath_threshold_db).clamp(0.0, 1.0)
    }

    /// Noise floor: minimum power observed over the window.
    pub fn measure_noise_floor(&self, noise_powers: &[f32]) -> f32 {
        if noise_powers.is_empty() {
            return -120.0;
        }
        noise_powers.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// Clear the window and its accumulators.
    pub fn reset(&mut self) {
        self.samples.clear();
        self.window_fec_errors = 0;
        self.window_words = 0;
    }

    fn flush(&mut self, db: &mut LqaDatabase, frequency_hz: u32, remote_station: &str) {
        let avg = self.averaged_sample();
        let ber = self.estimate_ber(self.window_fec_errors, self.window_words);
        let sinad = self.calculate_sinad(avg.snr_db, self.config.assumed_distortion_db);

        let multipath = if self.config.enable_multipath {
            let powers: Vec<f32> = self.samples.iter().map(|s| s.signal_power_dbm).collect();
            self.detect_multipath(&powers)
        } else {
            0.0
        };

        let noise: Vec<f32> = self.samples.iter().map(|s| s.noise_power_dbm).collect();
        let noise_floor = self.measure_noise_floor(&noise);

        db.update_entry_extended(
            frequency_hz,
            remote_station,
            avg.snr_db,
            ber,
            sinad,
            multipath,
            noise_floor,
            self.window_fec_errors,
            self.window_words,
            avg.timestamp_ms,
        );

        self.window_fec_errors = 0;
        self.window_words = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(snr: f32, power: f32, errors: u32, t: u64) -> MetricsSample {
        MetricsSample {
            snr_db: snr,
            signal_power_dbm: power,
            noise_power_dbm: power - snr,
            fec_errors_corrected: errors,
            decode_success: true,
            multipath_delay_ms: 0.0,
            timestamp_ms: t,
        }
    }

    #[test]
    fn window_fills_then_updates_database() {
        let mut db = LqaDatabase::new();
        let mut col = MetricsCollector::new();

        for i in 0..9u64 {
            col.add_sample(&mut db, sample(20.0, -80.0, 1, 1000 + i), 7_073_000, "K6K");
            assert!(db.get_entry(7_073_000, "K6K").is_none());
        }
        col.add_sample(&mut db, sample(20.0, -80.0, 1, 1009), 7_073_000, "K6K");

        let e = db.get_entry(7_073_000, "K6K").unwrap();
        assert_eq!(e.total_words, 10);
        assert_eq!(e.fec_errors, 10);
        assert!((e.snr_db - 20.0).abs() < 1e-4);
        // 10 errors over 240 bits.
        assert!((e.ber - 10.0 / 240.0).abs() < 1e-5);
        // Tail sample kept for continuity.
        assert_eq!(col.sample_count(), 1);
    }

    #[test]
    fn ber_estimate_clamps() {
        let col = MetricsCollector::new();
        assert_eq!(col.estimate_ber(0, 0), 0.0);
        assert_eq!(col.estimate_ber(12, 1), 0.5);
        assert_eq!(col.estimate_ber(1000, 1), 1.0);
    }

    #[test]
    fn sinad_tracks_snr_for_low_distortion() {
        let col = MetricsCollector::new();
        // With a -30 dB distortion floor SINAD stays close to SNR.
        let sinad = col.calculate_sinad(20.0, -30.0);
        assert!((sinad - 20.0).abs() < 0.5, "sinad {sinad}");
        // Zero SNR: signal equals noise, SINAD near 3 dB.
        let low = col.calculate_sinad(0.0, -30.0);
        assert!((low - 3.0).abs() < 0.1, "low {low}");
    }

    #[test]
    fn multipath_score_from_power_spread() {
        let col = MetricsCollector::new();
        // Flat power: no multipath.
        assert_eq!(col.detect_multipath(&[-80.0; 10]), 0.0);
        // Two-point windows are too short to judge.
        assert_eq!(col.detect_multipath(&[-70.0, -90.0]), 0.0);
        // Wild fading saturates the score.
        let fading: Vec<f32> = (0..10).map(|i| if i % 2 == 0 { -70.0 } else { -95.0 }).collect();
        assert_eq!(col.detect_multipath(&fading), 1.0);
    }

    #[test]
    fn noise_floor_is_window_minimum() {
        let col = MetricsCollector::new();
        assert_eq!(col.measure_noise_floor(&[-100.0, -112.5, -104.0]), -112.5);
        assert_eq!(col.measure_noise_floor(&[]), -120.0);
    }

    #[test]
    fn averaged_sample_uses_latest_timestamp() {
        let mut db = LqaDatabase::new();
        let mut col = MetricsCollector::with_config(MetricsConfig {
            averaging_window: 4,
            ..MetricsConfig::default()
        });
        for i in 0..3u64 {
            col.add_sample(&mut db, sample(10.0 + i as f32, -85.0, 0, i * 100), 7_000_000, "");
        }
        let avg = col.averaged_sample();
        assert!((avg.snr_db - 11.0).abs() < 1e-5);
        assert_eq!(avg.timestamp_ms, 200);
    }

    #[test]
    fn reset_clears_window() {
        let mut db = LqaDatabase::new();
        let mut col = MetricsCollector::new();
        col.add_sample(&mut db, sample(10.0, -85.0, 0, 0), 7_000_000, "");
        col.reset();
        assert_eq!(col.sample_count(), 0);
    }
}
