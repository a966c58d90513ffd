//! Statistics collection and reporting
//!
//! This module derives KPIs from a finished [`RunResult`]: wait and transit
//! statistics (airport-wide and per terminal), queue peaks, fixed-grid queue
//! series, rolling service-level breach detection and the control summary of the
//! passenger mix.

use crate::simulation::metrics::{PassengerOutcome, PassengerRecord, QueueSample, RunResult, StationSeries};
use crate::types::{
    EesStatus, FlightId, GroupMix, PassengerGroup, SimulationConfig, StationKey, StationKind, Terminal,
    WaitStatistic,
};
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Width of the clock intervals breaches are reported in
pub const BREACH_INTERVAL_S: i64 = 15 * 60;

/// Rolling window of the breach detection
pub const BREACH_WINDOW_S: f64 = 15.0 * 60.0;

/// Grid step of the breach detection
pub const BREACH_STEP_S: f64 = 5.0 * 60.0;

/// Total wait above which a passenger counts as delayed
pub const DELAY_THRESHOLD_S: f64 = 30.0 * 60.0;

/// Groups whose service level is watched at the third-country desks
pub const TCN_BREACH_GROUPS: [PassengerGroup; 2] = [PassengerGroup::TcnV, PassengerGroup::TcnAt];

/// Groups whose service level is watched at the EU desks
pub const EU_BREACH_GROUPS: [PassengerGroup; 1] = [PassengerGroup::EuManual];

/// Percentile of `values` with linear interpolation between closest ranks
///
/// `p` is in percent. Returns `None` for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Largest value, `None` for an empty slice
pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().max_by(f64::total_cmp)
}

/// Evaluate a wait statistic; no observations count as zero wait
pub fn evaluate(statistic: WaitStatistic, values: &[f64]) -> f64 {
    let value = match statistic {
        WaitStatistic::Mean => mean(values),
        WaitStatistic::Percentile(p) => percentile(values, p),
        WaitStatistic::Max => max(values),
    };
    value.unwrap_or(0.0)
}

/// Waits observed at a station kind, over both terminals
///
/// With `include_censored`, passengers still queued at the horizon contribute
/// the time they had waited so far.
pub fn station_waits(result: &RunResult, station: StationKind, include_censored: bool) -> Vec<f64> {
    waits(result, station, include_censored, |_| true)
}

/// Waits observed at one terminal's desk pool
pub fn pool_waits(result: &RunResult, key: StationKey, include_censored: bool) -> Vec<f64> {
    waits(result, key.station, include_censored, |p| p.terminal == key.terminal)
}

fn waits(
    result: &RunResult,
    station: StationKind,
    include_censored: bool,
    passenger: impl Fn(&PassengerRecord) -> bool,
) -> Vec<f64> {
    let censor_at = result.horizon_s.filter(|_| include_censored);
    result
        .passengers
        .iter()
        .filter(|p| passenger(p))
        .flat_map(|p| p.visits.iter())
        .filter(|visit| visit.station == station)
        .filter_map(|visit| match (visit.wait_s(), censor_at) {
            (Some(wait), _) => Some(wait),
            (None, Some(horizon)) => Some((horizon - visit.queue_join_s).max(0.0)),
            (None, None) => None,
        })
        .collect()
}

/// Wait statistic of a station kind over both terminals, censored waits included
pub fn station_statistic(result: &RunResult, station: StationKind, statistic: WaitStatistic) -> f64 {
    evaluate(statistic, &station_waits(result, station, true))
}

/// The statistic the capacity search compares against the target for one desk pool
pub fn pool_statistic(result: &RunResult, key: StationKey, statistic: WaitStatistic) -> f64 {
    evaluate(statistic, &pool_waits(result, key, true))
}

/// Total wait of every passenger that completed its path
pub fn total_waits(result: &RunResult) -> Vec<f64> {
    completed(result).map(PassengerRecord::total_wait_s).collect()
}

/// Transit times of completed passengers
pub fn transit_times(result: &RunResult) -> Vec<f64> {
    completed(result).filter_map(PassengerRecord::transit_s).collect()
}

fn completed(result: &RunResult) -> impl Iterator<Item = &PassengerRecord> {
    result.passengers.iter().filter(|p| p.outcome == PassengerOutcome::Completed)
}

/// Share (in percent) of values strictly above a threshold
pub fn share_over(values: &[f64], threshold: f64) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().filter(|v| **v > threshold).count() as f64 * 100.0 / values.len() as f64
    }
}

/// Summary of a set of waits (or transit times), in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WaitSummary {
    /// Number of observations
    pub count: usize,
    /// Mean
    pub mean_s: f64,
    /// Median
    pub p50_s: f64,
    /// 95th percentile
    pub p95_s: f64,
    /// Maximum
    pub max_s: f64,
}

impl WaitSummary {
    /// Summarize a set of observations; all zero when empty
    pub fn from_values(values: &[f64]) -> Self {
        Self {
            count: values.len(),
            mean_s: mean(values).unwrap_or(0.0),
            p50_s: percentile(values, 50.0).unwrap_or(0.0),
            p95_s: percentile(values, 95.0).unwrap_or(0.0),
            max_s: max(values).unwrap_or(0.0),
        }
    }
}

/// Longest queue seen during a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QueuePeak {
    /// Desk pool where it happened
    pub station: StationKey,
    /// Passengers waiting
    pub queue_len: usize,
    /// First time the peak was reached
    pub t_s: f64,
}

/// Longest queue over all desk pools; `None` when nobody ever waited
pub fn max_queue(result: &RunResult) -> Option<QueuePeak> {
    peak_of(result.stations.iter())
}

/// Longest queue at one terminal's desk pools
pub fn max_queue_at(result: &RunResult, terminal: Terminal) -> Option<QueuePeak> {
    peak_of(result.stations.iter().filter(|(key, _)| key.terminal == terminal))
}

fn peak_of<'a>(pools: impl Iterator<Item = (&'a StationKey, &'a StationSeries)>) -> Option<QueuePeak> {
    let mut peak: Option<QueuePeak> = None;
    for (station, series) in pools {
        for sample in &series.samples {
            let better = match peak {
                None => sample.queue_len > 0,
                Some(current) => {
                    sample.queue_len > current.queue_len
                        || (sample.queue_len == current.queue_len && sample.t_s < current.t_s)
                }
            };
            if better {
                peak = Some(QueuePeak { station: *station, queue_len: sample.queue_len, t_s: sample.t_s });
            }
        }
    }
    peak
}

/// Resample an event-driven series onto a fixed grid `0, step, 2*step, ..` up to `end_s`
///
/// Each grid point carries the last sample at or before it (a step function);
/// points before the first sample are empty.
pub fn resample(series: &StationSeries, step_s: f64, end_s: f64) -> Vec<QueueSample> {
    if !(step_s > 0.0) || end_s < 0.0 {
        return Vec::new();
    }
    let points = (end_s / step_s).floor() as usize + 1;
    let mut grid = Vec::with_capacity(points);
    let mut next = 0;
    let mut current = (0, 0);
    for i in 0..points {
        let t_s = i as f64 * step_s;
        while next < series.samples.len() && series.samples[next].t_s <= t_s {
            current = (series.samples[next].queue_len, series.samples[next].in_service);
            next += 1;
        }
        grid.push(QueueSample { t_s, queue_len: current.0, in_service: current.1 });
    }
    grid
}

/// Rolling mean of total waits of some groups, by checkpoint arrival time
///
/// For every grid point `t` the mean covers completed passengers of `groups`
/// that arrived in `(t - window_s, t]`; windows without arrivals yield 0.
pub fn rolling_mean_wait(
    result: &RunResult,
    groups: &[PassengerGroup],
    window_s: f64,
    step_s: f64,
) -> Vec<(f64, f64)> {
    let mut points: Vec<(f64, f64)> = completed(result)
        .filter(|p| groups.contains(&p.group))
        .map(|p| (p.checkpoint_arrival_s, p.total_wait_s()))
        .collect();
    if points.is_empty() || !(step_s > 0.0) {
        return Vec::new();
    }
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let end = points[points.len() - 1].0 + window_s;
    let steps = (end / step_s).ceil().max(0.0) as usize;
    let (mut left, mut right) = (0, 0);
    let mut sum = 0.0;
    let mut grid = Vec::with_capacity(steps + 1);
    for i in 0..=steps {
        let t = i as f64 * step_s;
        while right < points.len() && points[right].0 <= t {
            sum += points[right].1;
            right += 1;
        }
        while left < right && points[left].0 <= t - window_s {
            sum -= points[left].1;
            left += 1;
        }
        let count = right - left;
        grid.push((t, if count > 0 { sum / count as f64 } else { 0.0 }));
    }
    grid
}

/// Clock intervals (`"HH:MM-HH:MM"`, 15 minutes) in which the rolling mean wait
/// of `groups` exceeded `threshold_s`
pub fn breach_intervals(
    result: &RunResult,
    groups: &[PassengerGroup],
    threshold_s: f64,
    window_s: f64,
    step_s: f64,
) -> Vec<String> {
    let Some(t0) = result.t0 else {
        return Vec::new();
    };
    let mut starts = BTreeSet::new();
    for (t, mean_wait) in rolling_mean_wait(result, groups, window_s, step_s) {
        if mean_wait > threshold_s {
            let absolute = t0.timestamp() + t.floor() as i64;
            starts.insert(absolute - absolute.rem_euclid(BREACH_INTERVAL_S));
        }
    }
    starts.into_iter().filter_map(interval_label).collect()
}

fn interval_label(start: i64) -> Option<String> {
    let from: DateTime<Utc> = Utc.timestamp_opt(start, 0).single()?;
    let to: DateTime<Utc> = Utc.timestamp_opt(start + BREACH_INTERVAL_S, 0).single()?;
    Some(format!("{}-{}", from.format("%H:%M"), to.format("%H:%M")))
}

/// Passenger count of a group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupCount {
    /// Group
    pub group: PassengerGroup,
    /// EES status, for the EES split
    pub ees: Option<EesStatus>,
    /// Passengers
    pub count: usize,
    /// Share of all passengers in percent
    pub share_pct: f64,
}

/// Target versus generated share of a group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MixCheck {
    /// Group
    pub group: PassengerGroup,
    /// Passengers generated
    pub count: usize,
    /// Generated share in percent
    pub actual_pct: f64,
    /// Configured share in percent
    pub target_pct: f64,
    /// Difference in percentage points
    pub diff_pct_points: f64,
}

/// Counts of the generated passengers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlSummary {
    /// All passengers
    pub total: usize,
    /// Per group, largest first
    pub by_group: Vec<GroupCount>,
    /// Per group and EES status for third-country groups, largest first
    pub by_group_ees: Vec<GroupCount>,
    /// Per flight
    pub by_flight: BTreeMap<FlightId, usize>,
    /// Generated mix against the configured mix
    pub mix_check: Vec<MixCheck>,
}

impl ControlSummary {
    /// Count the passengers of a run
    pub fn from_result(result: &RunResult, mix: &GroupMix) -> Self {
        let total = result.passengers.len();
        let pct = |n: usize| if total == 0 { 0.0 } else { 100.0 * n as f64 / total as f64 };

        let mut groups: BTreeMap<PassengerGroup, usize> = BTreeMap::new();
        let mut group_ees: BTreeMap<(PassengerGroup, EesStatus), usize> = BTreeMap::new();
        let mut by_flight: BTreeMap<FlightId, usize> = BTreeMap::new();
        for p in &result.passengers {
            *groups.entry(p.group).or_default() += 1;
            if let Some(ees) = p.ees {
                *group_ees.entry((p.group, ees)).or_default() += 1;
            }
            *by_flight.entry(p.flight_id.clone()).or_default() += 1;
        }

        let mut by_group: Vec<GroupCount> = groups
            .iter()
            .map(|(group, n)| GroupCount { group: *group, ees: None, count: *n, share_pct: pct(*n) })
            .collect();
        by_group.sort_by(|a, b| b.count.cmp(&a.count).then(a.group.cmp(&b.group)));

        let mut by_group_ees: Vec<GroupCount> = group_ees
            .iter()
            .map(|((group, ees), n)| GroupCount { group: *group, ees: Some(*ees), count: *n, share_pct: pct(*n) })
            .collect();
        by_group_ees.sort_by(|a, b| b.count.cmp(&a.count).then(a.group.cmp(&b.group)));

        let mix_check = PassengerGroup::ALL
            .into_iter()
            .map(|group| {
                let count = groups.get(&group).copied().unwrap_or(0);
                let actual_pct = pct(count);
                let target_pct = 100.0 * mix.share(group);
                MixCheck { group, count, actual_pct, target_pct, diff_pct_points: actual_pct - target_pct }
            })
            .collect();

        Self { total, by_group, by_group_ees, by_flight, mix_check }
    }
}

/// Headline KPIs of one terminal's checkpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerminalKpis {
    /// Passengers processed at the terminal
    pub passengers: usize,
    /// Of those, passengers that completed
    pub completed: usize,
    /// Total wait per completed passenger
    pub total_wait: WaitSummary,
    /// Share of completed passengers whose total wait exceeded the threshold
    pub share_over_threshold_pct: f64,
    /// Longest queue at the terminal's desks
    pub max_queue: Option<QueuePeak>,
}

impl TerminalKpis {
    /// KPIs of one terminal; `None` when no passenger was processed there
    pub fn from_result(result: &RunResult, terminal: Terminal, threshold_s: f64) -> Option<Self> {
        let passengers = result.passengers.iter().filter(|p| p.terminal == terminal).count();
        if passengers == 0 {
            return None;
        }
        let waits: Vec<f64> = completed(result)
            .filter(|p| p.terminal == terminal)
            .map(PassengerRecord::total_wait_s)
            .collect();

        Some(Self {
            passengers,
            completed: waits.len(),
            total_wait: WaitSummary::from_values(&waits),
            share_over_threshold_pct: share_over(&waits, threshold_s),
            max_queue: max_queue_at(result, terminal),
        })
    }
}

/// Headline KPIs of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunKpis {
    /// Passengers in the run
    pub passengers: usize,
    /// Passengers that completed
    pub completed: usize,
    /// Total wait per completed passenger
    pub total_wait: WaitSummary,
    /// Transit time per completed passenger
    pub transit: WaitSummary,
    /// Waits per desk pool (completed services only)
    pub stations: BTreeMap<StationKey, WaitSummary>,
    /// KPIs of each terminal that processed passengers
    pub terminals: BTreeMap<Terminal, TerminalKpis>,
    /// Threshold used for `share_over_threshold_pct`
    pub threshold_s: f64,
    /// Share of completed passengers whose total wait exceeded the threshold
    pub share_over_threshold_pct: f64,
    /// Longest queue
    pub max_queue: Option<QueuePeak>,
}

impl RunKpis {
    /// Compute the KPIs of a run
    pub fn from_result(result: &RunResult, threshold_s: f64) -> Self {
        let waits = total_waits(result);
        let stations = result
            .stations
            .keys()
            .map(|key| (*key, WaitSummary::from_values(&pool_waits(result, *key, false))))
            .filter(|(_, summary)| summary.count > 0)
            .collect();
        let terminals = Terminal::ALL
            .into_iter()
            .filter_map(|terminal| {
                TerminalKpis::from_result(result, terminal, threshold_s).map(|kpis| (terminal, kpis))
            })
            .collect();

        Self {
            passengers: result.passengers.len(),
            completed: result.completed_count(),
            total_wait: WaitSummary::from_values(&waits),
            transit: WaitSummary::from_values(&transit_times(result)),
            stations,
            terminals,
            threshold_s,
            share_over_threshold_pct: share_over(&waits, threshold_s),
            max_queue: max_queue(result),
        }
    }

    /// Generate a comprehensive summary report
    pub fn generate_summary_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Checkpoint Simulation Summary ===\n\n");
        report.push_str(&format!(
            "Passengers: {} ({} completed, {} incomplete)\n\n",
            self.passengers,
            self.completed,
            self.passengers - self.completed
        ));

        report.push_str("Waiting Time (total per passenger):\n");
        report.push_str(&format!("  • {}\n", self.total_wait));
        report.push_str(&format!(
            "  • Over {:.0} min: {:.1}%\n\n",
            self.threshold_s / 60.0,
            self.share_over_threshold_pct
        ));

        report.push_str("Waiting Time per Station:\n");
        for (station, summary) in &self.stations {
            report.push_str(&format!("  • {:<9} {}\n", station.to_string(), summary));
        }
        for (terminal, kpis) in &self.terminals {
            report.push_str(&format!(
                "\nTerminal {} ({} pax, {} completed):\n",
                terminal, kpis.passengers, kpis.completed
            ));
            report.push_str(&format!("  • Total wait: {}\n", kpis.total_wait));
            report.push_str(&format!(
                "  • Over {:.0} min: {:.1}%\n",
                self.threshold_s / 60.0,
                kpis.share_over_threshold_pct
            ));
            report.push_str(&format!("  • Max Queue: {}\n", peak_label(kpis.max_queue.as_ref())));
        }

        report.push_str(&format!("\nTransit Time: {}\n", self.transit));
        report.push_str(&format!("Max Queue: {}\n", peak_label(self.max_queue.as_ref())));

        report
    }
}

fn peak_label(peak: Option<&QueuePeak>) -> String {
    match peak {
        Some(peak) => format!("{} pax at {} (t = {:.1} min)", peak.queue_len, peak.station, peak.t_s / 60.0),
        None => "none".to_string(),
    }
}

impl fmt::Display for WaitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} mean {:.1} min, p50 {:.1} min, p95 {:.1} min, max {:.1} min",
            self.count,
            self.mean_s / 60.0,
            self.p50_s / 60.0,
            self.p95_s / 60.0,
            self.max_s / 60.0
        )
    }
}

impl fmt::Display for RunKpis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.generate_summary_report())
    }
}

/// Full evaluation of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Headline KPIs
    pub kpis: RunKpis,
    /// Generated passenger counts
    pub control: ControlSummary,
    /// Intervals where third-country waits broke the service level
    pub tcn_breaches: Vec<String>,
    /// Intervals where EU manual waits broke the service level
    pub eu_breaches: Vec<String>,
    /// Queue series on a fixed grid, when an interval is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_grid: Option<BTreeMap<StationKey, Vec<QueueSample>>>,
}

impl RunReport {
    /// Evaluate a run against its configuration
    pub fn build(result: &RunResult, config: &SimulationConfig) -> Self {
        let threshold = config.service_level.max_wait_s;
        let queue_grid = config.series_interval_s.map(|step| {
            let end = result
                .stations
                .values()
                .filter_map(|series| series.samples.last())
                .map(|sample| sample.t_s)
                .fold(0.0, f64::max);
            result.stations.iter().map(|(station, series)| (*station, resample(series, step, end))).collect()
        });

        Self {
            kpis: RunKpis::from_result(result, DELAY_THRESHOLD_S),
            control: ControlSummary::from_result(result, &config.mix),
            tcn_breaches: breach_intervals(result, &TCN_BREACH_GROUPS, threshold, BREACH_WINDOW_S, BREACH_STEP_S),
            eu_breaches: breach_intervals(result, &EU_BREACH_GROUPS, threshold, BREACH_WINDOW_S, BREACH_STEP_S),
            queue_grid,
        }
    }

    /// KPI report followed by the mix check and breach intervals
    pub fn generate_summary_report(&self) -> String {
        let mut report = self.kpis.generate_summary_report();

        report.push_str("\nPassenger Mix:\n");
        for check in &self.control.mix_check {
            report.push_str(&format!(
                "  • {:<9} {:>5} pax  {:>5.1}% (target {:>5.1}%, {:+.1} pp)\n",
                check.group.to_string(),
                check.count,
                check.actual_pct,
                check.target_pct,
                check.diff_pct_points
            ));
        }
        for count in &self.control.by_group_ees {
            if let Some(ees) = count.ees {
                report.push_str(&format!("  • {} {}: {}\n", count.group, ees, count.count));
            }
        }

        report.push_str("\nService Level Breaches:\n");
        report.push_str(&format!("  • TCN: {}\n", breach_list(&self.tcn_breaches)));
        report.push_str(&format!("  • EU:  {}\n", breach_list(&self.eu_breaches)));

        report
    }
}

fn breach_list(intervals: &[String]) -> String {
    if intervals.is_empty() {
        "none".to_string()
    } else {
        intervals.join(", ")
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.generate_summary_report())
    }
}
