//! LQA Analyzer — channel ranking, selection, and sounding schedule
//!
//! Sits on top of the [`LqaDatabase`] and answers the operational
//! questions: which channel should carry a call to a given station, how do
//! all channels rank against each other, and which channels are overdue
//! for a sounding. The analyzer never owns the database; every method
//! takes it by reference so one owner can share it with the metrics
//! collector without back-references.

use serde::{Deserialize, Serialize};

use crate::lqa_database::{LqaDatabase, LqaEntry};
use crate::lqa_metrics::MetricsSample;

/// A channel with its quality ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRank {
    pub frequency_hz: u32,
    /// Composite score 0..=31 (aggregate mean for whole-channel ranks).
    pub score: f32,
    /// Station with the best score on this channel.
    pub best_station: String,
    /// Newest activity timestamp backing the rank.
    pub last_update_ms: u64,
}

/// Analyzer tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Channels scoring below this are not offered for calls.
    pub min_acceptable_score: f32,
    /// Re-sound a channel after this much silence.
    pub sounding_interval_ms: u64,
    /// Fire the sounding callback from [`LqaAnalyzer::update`].
    pub enable_automatic_sounding: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_acceptable_score: 10.0,
            sounding_interval_ms: 300_000,
            enable_automatic_sounding: false,
        }
    }
}

type SoundingSink = Box<dyn FnMut(u32)>;

/// Channel selection and sounding scheduling over an [`LqaDatabase`].
#[derive(Default)]
pub struct LqaAnalyzer {
    config: AnalyzerConfig,
    on_sounding_due: Option<SoundingSink>,
}

impl LqaAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self {
            config,
            on_sounding_due: None,
        }
    }

    pub fn set_config(&mut self, config: AnalyzerConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Callback invoked with a frequency when automatic sounding is due.
    pub fn set_sounding_callback(&mut self, cb: impl FnMut(u32) + 'static) {
        self.on_sounding_due = Some(Box::new(cb));
    }

    /// Record a received sounding: updates both the channel-wide entry
    /// (empty station) and the per-station entry.
    pub fn process_sounding(
        &self,
        db: &mut LqaDatabase,
        station: &str,
        frequency_hz: u32,
        snr_db: f32,
        ber: f32,
        timestamp_ms: u64,
    ) {
        db.update_entry(frequency_hz, "", snr_db, ber, 0, 1, timestamp_ms);
        db.update_entry(frequency_hz, station, snr_db, ber, 0, 1, timestamp_ms);
    }

    /// Record a sounding carrying a full metrics sample.
    pub fn process_sounding_extended(
        &self,
        db: &mut LqaDatabase,
        station: &str,
        frequency_hz: u32,
        sample: &MetricsSample,
    ) {
        let ber = if sample.decode_success { 0.001 } else { 0.1 };
        db.update_entry_extended(
            frequency_hz,
            station,
            sample.snr_db,
            ber,
            sample.snr_db,
            (sample.multipath_delay_ms / 10.0).clamp(0.0, 1.0),
            sample.noise_power_dbm,
            sample.fec_errors_corrected,
            1,
            sample.timestamp_ms,
        );
    }

    /// Best channel for calling one station: highest score at or above the
    /// configured minimum.
    pub fn best_channel_for_station(
        &self,
        db: &LqaDatabase,
        station: &str,
    ) -> Option<ChannelRank> {
        let entries = db.entries_for_station(station);
        let best = entries
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))?;
        if best.score < self.config.min_acceptable_score {
            return None;
        }
        Some(Self::rank_of(best))
    }

    /// Best entry overall, regardless of station.
    pub fn best_channel(&self, db: &LqaDatabase) -> Option<ChannelRank> {
        let best = db
            .all_entries()
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))?;
        if best.score < self.config.min_acceptable_score {
            return None;
        }
        Some(Self::rank_of(best))
    }

    /// Every channel ranked by its aggregate (mean) score across stations,
    /// best first.
    pub fn rank_all_channels(&self, db: &LqaDatabase) -> Vec<ChannelRank> {
        let mut by_freq: Vec<(u32, Vec<&LqaEntry>)> = Vec::new();
        for entry in db.all_entries() {
            match by_freq.iter_mut().find(|(f, _)| *f == entry.frequency_hz) {
                Some((_, list)) => list.push(entry),
                None => by_freq.push((entry.frequency_hz, vec![entry])),
            }
        }

        let mut ranks: Vec<ChannelRank> = by_freq
            .into_iter()
            .map(|(freq, entries)| {
                let aggregate =
                    entries.iter().map(|e| e.score).sum::<f32>() / entries.len() as f32;
                let best_station = entries
                    .iter()
                    .max_by(|a, b| a.score.total_cmp(&b.score))
                    .map(|e| e.remote_station.clone())
                    .unwrap_or_default();
                let last_update = entries.iter().map(|e| e.last_activity_ms()).max().unwrap_or(0);
                ChannelRank {
                    frequency_hz: freq,
                    score: aggregate,
                    best_station,
                    last_update_ms: last_update,
                }
            })
            .collect();

        ranks.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranks
    }

    /// Channels ranked for one station, best first.
    pub fn rank_channels_for_station(&self, db: &LqaDatabase, station: &str) -> Vec<ChannelRank> {
        let mut ranks: Vec<ChannelRank> = db
            .entries_for_station(station)
            .into_iter()
            .map(Self::rank_of)
            .collect();
        ranks.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranks
    }

    /// Is a sounding due on this frequency at `now_ms`? True when nothing
    /// was ever heard there or the last sounding is older than the
    /// configured interval.
    pub fn is_sounding_due(&self, db: &LqaDatabase, frequency_hz: u32, now_ms: u64) -> bool {
        let entries = db.entries_for_channel(frequency_hz);
        if entries.is_empty() {
            return true;
        }
        let latest = entries.iter().map(|e| e.last_sounding_ms).max().unwrap_or(0);
        if latest == 0 {
            return true;
        }
        now_ms.saturating_sub(latest) >= self.config.sounding_interval_ms
    }

    /// All known frequencies with an overdue sounding.
    pub fn channels_needing_sounding(&self, db: &LqaDatabase, now_ms: u64) -> Vec<u32> {
        let mut freqs: Vec<u32> = db.all_entries().iter().map(|e| e.frequency_hz).collect();
        freqs.sort_unstable();
        freqs.dedup();
        freqs
            .into_iter()
            .filter(|&f| self.is_sounding_due(db, f, now_ms))
            .collect()
    }

    /// Periodic maintenance: prune stale entries and, when enabled, fire
    /// the sounding callback for each overdue channel.
    pub fn update(&mut self, db: &mut LqaDatabase, now_ms: u64) {
        db.prune_stale_entries(now_ms);

        if self.config.enable_automatic_sounding {
            let due = self.channels_needing_sounding(db, now_ms);
            if let Some(cb) = self.on_sounding_due.as_mut() {
                for freq in due {
                    cb(freq);
                }
            }
        }
    }

    /// Short quality label for a score.
    pub fn quality_level(score: f32) -> &'static str {
        if score >= 25.0 {
            "Excellent"
        } else if score >= 20.0 {
            "Good"
        } else if score >= 15.0 {
            "Fair"
        } else if score >= 10.0 {
            "Poor"
        } else {
            "Very Poor"
        }
    }

    /// Human-readable summary of a channel's aggregate quality.
    pub fn channel_summary(&self, db: &LqaDatabase, frequency_hz: u32) -> String {
        let entries = db.entries_for_channel(frequency_hz);
        if entries.is_empty() {
            return "No data".to_string();
        }
        let n = entries.len() as f32;
        let avg_snr = entries.iter().map(|e| e.snr_db).sum::<f32>() / n;
        let avg_score = entries.iter().map(|e| e.score).sum::<f32>() / n;
        format!(
            "{} (SNR: {:.1}dB, Score: {:.0})",
            Self::quality_level(avg_score),
            avg_snr,
            avg_score
        )
    }

    /// Human-readable summary of one station on one channel.
    pub fn station_summary(&self, db: &LqaDatabase, station: &str, frequency_hz: u32) -> String {
        match db.get_entry(frequency_hz, station) {
            Some(e) => format!(
                "{} (SNR: {:.1}dB, BER: {:.2e}, Score: {:.0})",
                Self::quality_level(e.score),
                e.snr_db,
                e.ber,
                e.score
            ),
            None => "No data".to_string(),
        }
    }

    fn rank_of(entry: &LqaEntry) -> ChannelRank {
        ChannelRank {
            frequency_hz: entry.frequency_hz,
            score: entry.score,
            best_station: entry.remote_station.clone(),
            last_update_ms: entry.last_activity_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn seeded_db() -> LqaDatabase {
        let mut db = LqaDatabase::new();
        // Strong path to K6K on 14 MHz, weak on 7 MHz.
        db.update_entry(14_109_000, "K6K", 25.0, 0.001, 0, 20, 1_000);
        db.update_entry(7_073_000, "K6K", 4.0, 0.2, 10, 20, 1_000);
        // Another station only on 7 MHz.
        db.update_entry(7_073_000, "W9X", 18.0, 0.01, 1, 20, 1_000);
        db
    }

    #[test]
    fn best_channel_for_station_prefers_high_score() {
        let db = seeded_db();
        let analyzer = LqaAnalyzer::new();
        let best = analyzer.best_channel_for_station(&db, "K6K").unwrap();
        assert_eq!(best.frequency_hz, 14_109_000);
        assert_eq!(best.best_station, "K6K");
    }

    #[test]
    fn unknown_station_has_no_channel() {
        let db = seeded_db();
        let analyzer = LqaAnalyzer::new();
        assert!(analyzer.best_channel_for_station(&db, "ZZZ").is_none());
    }

    #[test]
    fn minimum_score_filters_weak_channels() {
        let mut db = LqaDatabase::new();
        db.update_entry(7_073_000, "K6K", 1.0, 0.5, 50, 10, 1_000);
        let mut strict = LqaAnalyzer::new();
        strict.set_config(AnalyzerConfig {
            min_acceptable_score: 30.0,
            ..AnalyzerConfig::default()
        });
        assert!(strict.best_channel_for_station(&db, "K6K").is_none());
        assert!(strict.best_channel(&db).is_none());
    }

    #[test]
    fn ranking_orders_by_aggregate_score() {
        let db = seeded_db();
        let analyzer = LqaAnalyzer::new();
        let ranks = analyzer.rank_all_channels(&db);
        assert_eq!(ranks.len(), 2);
        assert_eq!(ranks[0].frequency_hz, 14_109_000);
        assert!(ranks[0].score >= ranks[1].score);
    }

    #[test]
    fn per_station_ranking_sorted_descending() {
        let db = seeded_db();
        let analyzer = LqaAnalyzer::new();
        let ranks = analyzer.rank_channels_for_station(&db, "K6K");
        assert_eq!(ranks.len(), 2);
        assert_eq!(ranks[0].frequency_hz, 14_109_000);
        assert_eq!(ranks[1].frequency_hz, 7_073_000);
    }

    #[test]
    fn sounding_due_logic() {
        let mut db = LqaDatabase::new();
        let analyzer = LqaAnalyzer::new();

        // Nothing known: due.
        assert!(analyzer.is_sounding_due(&db, 7_073_000, 1_000));

        // Contact but never sounded: still due.
        db.update_entry(7_073_000, "K6K", 10.0, 0.0, 0, 1, 1_000);
        assert!(analyzer.is_sounding_due(&db, 7_073_000, 2_000));

        // Fresh sounding: not due until the interval passes.
        db.update_entry(7_073_000, "", 10.0, 0.0, 0, 1, 2_000);
        assert!(!analyzer.is_sounding_due(&db, 7_073_000, 2_000 + 299_999));
        assert!(analyzer.is_sounding_due(&db, 7_073_000, 2_000 + 300_000));
    }

    #[test]
    fn process_sounding_writes_channel_and_station_entries() {
        let mut db = LqaDatabase::new();
        let analyzer = LqaAnalyzer::new();
        analyzer.process_sounding(&mut db, "K6K", 7_073_000, 15.0, 0.01, 5_000);
        assert!(db.get_entry(7_073_000, "").is_some());
        assert!(db.get_entry(7_073_000, "K6K").is_some());
        assert_eq!(db.get_entry(7_073_000, "").unwrap().last_sounding_ms, 5_000);
        assert_eq!(db.get_entry(7_073_000, "K6K").unwrap().last_contact_ms, 5_000);
    }

    #[test]
    fn automatic_sounding_fires_callback() {
        let mut db = LqaDatabase::new();
        db.update_entry(7_073_000, "", 10.0, 0.0, 0, 1, 1_000);
        db.update_entry(14_109_000, "", 10.0, 0.0, 0, 1, 400_000);

        let fired = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&fired);
        let mut analyzer = LqaAnalyzer::with_config(AnalyzerConfig {
            enable_automatic_sounding: true,
            ..AnalyzerConfig::default()
        });
        analyzer.set_sounding_callback(move |f| sink.borrow_mut().push(f));

        // At t=500k the 7 MHz sounding (age 499s) is overdue, 14 MHz (100s) is not.
        analyzer.update(&mut db, 500_000);
        assert_eq!(*fired.borrow(), vec![7_073_000]);
    }

    #[test]
    fn update_prunes_stale_entries() {
        let mut db = LqaDatabase::new();
        db.update_entry(7_073_000, "K6K", 10.0, 0.0, 0, 1, 1_000);
        let mut analyzer = LqaAnalyzer::new();
        analyzer.update(&mut db, 4_000_000);
        assert_eq!(db.entry_count(), 0);
    }

    #[test]
    fn summaries_render_quality_levels() {
        let db = seeded_db();
        let analyzer = LqaAnalyzer::new();
        assert_eq!(analyzer.channel_summary(&db, 1), "No data");
        let summary = analyzer.channel_summary(&db, 14_109_000);
        assert!(summary.contains("SNR"));
        let station = analyzer.station_summary(&db, "K6K", 14_109_000);
        assert!(station.contains("Score"));
        assert_eq!(LqaAnalyzer::quality_level(27.0), "Excellent");
        assert_eq!(LqaAnalyzer::quality_level(5.0), "Very Poor");
    }
}
