//! LQA Database — per-channel, per-station link quality storage
//!
//! Stores Link Quality Analysis measurements keyed by (frequency, remote
//! station), where an empty station name marks channel-wide sounding data.
//! Every update folds new measurements into a time-weighted average that
//! biases toward recent samples, accumulates FEC error and word totals, and
//! recomputes a composite 0..31 score from SNR, success rate, and recency.
//!
//! The database persists to a compact little-endian binary file (magic
//! `PCALE_LQA\0`, version 1) and exports a human-readable CSV; both formats
//! round-trip every stored field.
//!
//! All timestamps are caller-supplied monotonic milliseconds; passing 0
//! falls back to the system clock as a convenience for interactive use.
//! Tests always pass explicit timestamps.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Magic header for the binary persistence format (9 chars + NUL).
const LQA_MAGIC: &[u8; 10] = b"PCALE_LQA\0";

/// Binary format version.
const LQA_VERSION: u32 = 1;

/// One channel/station quality record.
#[derive(Debug, Clone, PartialEq)]
pub struct LqaEntry {
    /// Channel frequency in Hz.
    pub frequency_hz: u32,
    /// Remote station address; empty for sounding-derived data.
    pub remote_station: String,
    /// Averaged signal-to-noise ratio in dB.
    pub snr_db: f32,
    /// Averaged bit error rate, 0.0..=1.0.
    pub ber: f32,
    /// Averaged SINAD in dB.
    pub sinad_db: f32,
    /// Accumulated FEC errors corrected.
    pub fec_errors: u32,
    /// Accumulated words received.
    pub total_words: u32,
    /// Averaged multipath severity, 0.0 (none) to 1.0 (severe).
    pub multipath_score: f32,
    /// Averaged noise floor in dBm.
    pub noise_floor_dbm: f32,
    /// Timestamp of the last sounding heard.
    pub last_sounding_ms: u64,
    /// Timestamp of the last two-way contact.
    pub last_contact_ms: u64,
    /// Composite score 0..=31.
    pub score: f32,
    /// Number of measurement updates folded in.
    pub sample_count: u32,
}

impl LqaEntry {
    fn new(frequency_hz: u32, remote_station: &str) -> Self {
        Self {
            frequency_hz,
            remote_station: remote_station.to_string(),
            snr_db: 0.0,
            ber: 0.0,
            sinad_db: 0.0,
            fec_errors: 0,
            total_words: 0,
            multipath_score: 0.0,
            noise_floor_dbm: -120.0,
            last_sounding_ms: 0,
            last_contact_ms: 0,
            score: 0.0,
            sample_count: 0,
        }
    }

    /// Most recent activity of either kind.
    pub fn last_activity_ms(&self) -> u64 {
        self.last_contact_ms.max(self.last_sounding_ms)
    }
}

/// Scoring and retention configuration.
///
/// The three component weights should sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LqaConfig {
    /// Weight of the SNR component in the composite score.
    pub snr_weight: f32,
    /// Weight of the success-rate (1 − BER) component.
    pub success_weight: f32,
    /// Weight of the recency component.
    pub recency_weight: f32,
    /// Entries older than this are stale (and score zero recency).
    pub max_age_ms: u64,
    /// Decay factor for the time-weighted average.
    pub time_decay_factor: f32,
    /// SNR at or above this is "good" in summaries.
    pub good_snr_db: f32,
    /// SNR at or below this is "poor".
    pub poor_snr_db: f32,
}

impl Default for LqaConfig {
    fn default() -> Self {
        Self {
            snr_weight: 0.5,
            success_weight: 0.3,
            recency_weight: 0.2,
            max_age_ms: 3_600_000,
            time_decay_factor: 0.9,
            good_snr_db: 20.0,
            poor_snr_db: 6.0,
        }
    }
}

/// The LQA database.
#[derive(Debug, Clone, Default)]
pub struct LqaDatabase {
    config: LqaConfig,
    entries: BTreeMap<(u32, String), LqaEntry>,
}

impl LqaDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LqaConfig) -> Self {
        Self {
            config,
            entries: BTreeMap::new(),
        }
    }

    pub fn set_config(&mut self, config: LqaConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &LqaConfig {
        &self.config
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// System clock fallback for callers passing timestamp 0.
    fn now_fallback(timestamp_ms: u64) -> u64 {
        if timestamp_ms != 0 {
            return timestamp_ms;
        }
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    /// Update an entry with basic measurements.
    ///
    /// Averaged fields use the time-weighted form
    /// `(old · decay · n + new) / (n · decay + 1)` with n prior samples.
    pub fn update_entry(
        &mut self,
        frequency_hz: u32,
        remote_station: &str,
        snr_db: f32,
        ber: f32,
        fec_errors: u32,
        total_words: u32,
        timestamp_ms: u64,
    ) {
        let now = Self::now_fallback(timestamp_ms);
        let decay = self.config.time_decay_factor;
        let key = (frequency_hz, remote_station.to_string());
        let entry = self
            .entries
            .entry(key)
            .or_insert_with(|| LqaEntry::new(frequency_hz, remote_station));

        if entry.sample_count > 0 {
            let n = entry.sample_count as f32;
            let avg = |old: f32, new: f32| (old * decay * n + new) / (n * decay + 1.0);
            entry.snr_db = avg(entry.snr_db, snr_db);
            entry.ber = avg(entry.ber, ber);
        } else {
            entry.snr_db = snr_db;
            entry.ber = ber;
        }
        entry.fec_errors += fec_errors;
        entry.total_words += total_words;
        entry.sample_count += 1;

        if remote_station.is_empty() {
            entry.last_sounding_ms = now;
        } else {
            entry.last_contact_ms = now;
        }

        entry.score = Self::score_for(&self.config, entry, now);
    }

    /// Update an entry with the full metric set.
    #[allow(clippy::too_many_arguments)]
    pub fn update_entry_extended(
        &mut self,
        frequency_hz: u32,
        remote_station: &str,
        snr_db: f32,
        ber: f32,
        sinad_db: f32,
        multipath_score: f32,
        noise_floor_dbm: f32,
        fec_errors: u32,
        total_words: u32,
        timestamp_ms: u64,
    ) {
        let now = Self::now_fallback(timestamp_ms);
        let decay = self.config.time_decay_factor;
        let key = (frequency_hz, remote_station.to_string());
        let entry = self
            .entries
            .entry(key)
            .or_insert_with(|| LqaEntry::new(frequency_hz, remote_station));

        if entry.sample_count > 0 {
            let n = entry.sample_count as f32;
            let avg = |old: f32, new: f32| (old * decay * n + new) / (n * decay + 1.0);
            entry.snr_db = avg(entry.snr_db, snr_db);
            entry.ber = avg(entry.ber, ber);
            entry.sinad_db = avg(entry.sinad_db, sinad_db);
            entry.multipath_score = avg(entry.multipath_score, multipath_score);
            entry.noise_floor_dbm = avg(entry.noise_floor_dbm, noise_floor_dbm);
        } else {
            entry.snr_db = snr_db;
            entry.ber = ber;
            entry.sinad_db = sinad_db;
            entry.multipath_score = multipath_score;
            entry.noise_floor_dbm = noise_floor_dbm;
        }
        entry.fec_errors += fec_errors;
        entry.total_words += total_words;
        entry.sample_count += 1;

        if remote_station.is_empty() {
            entry.last_sounding_ms = now;
        } else {
            entry.last_contact_ms = now;
        }

        entry.score = Self::score_for(&self.config, entry, now);
    }

    /// Look up one entry.
    pub fn get_entry(&self, frequency_hz: u32, remote_station: &str) -> Option<&LqaEntry> {
        self.entries.get(&(frequency_hz, remote_station.to_string()))
    }

    /// All entries on one frequency.
    pub fn entries_for_channel(&self, frequency_hz: u32) -> Vec<&LqaEntry> {
        self.entries
            .values()
            .filter(|e| e.frequency_hz == frequency_hz)
            .collect()
    }

    /// All entries for one station across frequencies.
    pub fn entries_for_station(&self, remote_station: &str) -> Vec<&LqaEntry> {
        self.entries
            .values()
            .filter(|e| e.remote_station == remote_station)
            .collect()
    }

    /// Every entry in key order.
    pub fn all_entries(&self) -> Vec<&LqaEntry> {
        self.entries.values().collect()
    }

    /// Remove entries whose newest activity is older than `max_age_ms`.
    /// Returns the number removed.
    pub fn prune_stale_entries(&mut self, now_ms: u64) -> usize {
        let now = Self::now_fallback(now_ms);
        let max_age = self.config.max_age_ms;
        let before = self.entries.len();
        self.entries
            .retain(|_, e| now.saturating_sub(e.last_activity_ms()) <= max_age);
        before - self.entries.len()
    }

    /// Composite score for an entry at a given time, clamped to 0..=31.
    pub fn compute_score(&self, entry: &LqaEntry, now_ms: u64) -> f32 {
        Self::score_for(&self.config, entry, Self::now_fallback(now_ms))
    }

    fn score_for(config: &LqaConfig, entry: &LqaEntry, now: u64) -> f32 {
        let snr_c = entry.snr_db.clamp(0.0, 31.0);

        let success_c = if entry.total_words > 0 {
            (1.0 - entry.ber.clamp(0.0, 1.0)) * 31.0
        } else {
            0.0
        };

        let recency_c = {
            let last = entry.last_activity_ms();
            if last > 0 {
                let age = now.saturating_sub(last) as f32;
                (1.0 - age / config.max_age_ms as f32).clamp(0.0, 1.0) * 31.0
            } else {
                0.0
            }
        };

        (snr_c * config.snr_weight
            + success_c * config.success_weight
            + recency_c * config.recency_weight)
            .clamp(0.0, 31.0)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Write the database to a binary file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut w = BufWriter::new(File::create(path.as_ref())?);

        w.write_all(LQA_MAGIC)?;
        w.write_all(&LQA_VERSION.to_le_bytes())?;

        // Config block, fixed field order.
        w.write_all(&self.config.snr_weight.to_le_bytes())?;
        w.write_all(&self.config.success_weight.to_le_bytes())?;
        w.write_all(&self.config.recency_weight.to_le_bytes())?;
        w.write_all(&self.config.max_age_ms.to_le_bytes())?;
        w.write_all(&self.config.time_decay_factor.to_le_bytes())?;
        w.write_all(&self.config.good_snr_db.to_le_bytes())?;
        w.write_all(&self.config.poor_snr_db.to_le_bytes())?;

        w.write_all(&(self.entries.len() as u32).to_le_bytes())?;
        for entry in self.entries.values() {
            w.write_all(&entry.frequency_hz.to_le_bytes())?;
            let name = entry.remote_station.as_bytes();
            w.write_all(&(name.len() as u32).to_le_bytes())?;
            w.write_all(name)?;
            w.write_all(&entry.snr_db.to_le_bytes())?;
            w.write_all(&entry.ber.to_le_bytes())?;
            w.write_all(&entry.sinad_db.to_le_bytes())?;
            w.write_all(&entry.fec_errors.to_le_bytes())?;
            w.write_all(&entry.total_words.to_le_bytes())?;
            w.write_all(&entry.multipath_score.to_le_bytes())?;
            w.write_all(&entry.noise_floor_dbm.to_le_bytes())?;
            w.write_all(&entry.last_sounding_ms.to_le_bytes())?;
            w.write_all(&entry.last_contact_ms.to_le_bytes())?;
            w.write_all(&entry.score.to_le_bytes())?;
            w.write_all(&entry.sample_count.to_le_bytes())?;
        }

        w.flush()?;
        tracing::info!(entries = self.entries.len(), "LQA database saved");
        Ok(())
    }

    /// Replace the database contents from a binary file.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut r = BufReader::new(File::open(path.as_ref())?);

        let mut magic = [0u8; 10];
        r.read_exact(&mut magic)?;
        if &magic != LQA_MAGIC {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "bad LQA magic"));
        }
        let version = read_u32(&mut r)?;
        if version != LQA_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsupported LQA version {version}"),
            ));
        }

        self.config.snr_weight = read_f32(&mut r)?;
        self.config.success_weight = read_f32(&mut r)?;
        self.config.recency_weight = read_f32(&mut r)?;
        self.config.max_age_ms = read_u64(&mut r)?;
        self.config.time_decay_factor = read_f32(&mut r)?;
        self.config.good_snr_db = read_f32(&mut r)?;
        self.config.poor_snr_db = read_f32(&mut r)?;

        let count = read_u32(&mut r)?;
        self.entries.clear();
        for _ in 0..count {
            let frequency_hz = read_u32(&mut r)?;
            let name_len = read_u32(&mut r)? as usize;
            let mut name = vec![0u8; name_len];
            r.read_exact(&mut name)?;
            let remote_station = String::from_utf8(name)
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "bad station name"))?;

            let entry = LqaEntry {
                frequency_hz,
                remote_station: remote_station.clone(),
                snr_db: read_f32(&mut r)?,
                ber: read_f32(&mut r)?,
                sinad_db: read_f32(&mut r)?,
                fec_errors: read_u32(&mut r)?,
                total_words: read_u32(&mut r)?,
                multipath_score: read_f32(&mut r)?,
                noise_floor_dbm: read_f32(&mut r)?,
                last_sounding_ms: read_u64(&mut r)?,
                last_contact_ms: read_u64(&mut r)?,
                score: read_f32(&mut r)?,
                sample_count: read_u32(&mut r)?,
            };
            self.entries.insert((frequency_hz, remote_station), entry);
        }

        tracing::info!(entries = self.entries.len(), "LQA database loaded");
        Ok(())
    }

    /// Export as CSV with one header line and one row per entry.
    pub fn export_to_csv(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut w = BufWriter::new(File::create(path.as_ref())?);
        writeln!(
            w,
            "Frequency(Hz),Station,SNR(dB),BER,SINAD(dB),FEC_Errors,Total_Words,\
             Multipath,Noise_Floor(dBm),Last_Sounding_ms,Last_Contact_ms,Score,Samples"
        )?;
        for e in self.entries.values() {
            writeln!(
                w,
                "{},{},{},{},{},{},{},{},{},{},{},{},{}",
                e.frequency_hz,
                e.remote_station,
                e.snr_db,
                e.ber,
                e.sinad_db,
                e.fec_errors,
                e.total_words,
                e.multipath_score,
                e.noise_floor_dbm,
                e.last_sounding_ms,
                e.last_contact_ms,
                e.score,
                e.sample_count
            )?;
        }
        w.flush()
    }
}

fn read_u32(r: &mut impl Read) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64(r: &mut impl Read) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_f32(r: &mut impl Read) -> io::Result<f32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}
