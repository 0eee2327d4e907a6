use std::io::Write;
use std::time::Duration;

use approx::assert_abs_diff_eq;
use fdr_viewer::data::derived::{table_unit_consistency, UnitVerdict};
use fdr_viewer::data::model::{RowView, WindowView};
use fdr_viewer::data::schema::ChannelRole;
use fdr_viewer::replay::{FrameRenderer, PlaybackState, ReplaySession, TickScheduler};
use fdr_viewer::{prepare_log, PreparedLog, ViewerConfig};
use tempfile::NamedTempFile;

fn write_log(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn prepare(contents: &str) -> PreparedLog {
    let file = write_log(contents);
    prepare_log(file.path(), &ViewerConfig::default())
}

#[derive(Default)]
struct ManualScheduler {
    pending: bool,
    scheduled: usize,
}

impl TickScheduler for ManualScheduler {
    fn schedule(&mut self, _delay: Duration) {
        self.pending = true;
        self.scheduled += 1;
    }

    fn cancel(&mut self) {
        self.pending = false;
    }

    fn is_pending(&self) -> bool {
        self.pending
    }
}

#[derive(Default)]
struct Frames {
    seen: Vec<(usize, usize)>,
}

impl FrameRenderer for Frames {
    fn on_frame(&mut self, current: RowView<'_>, window: WindowView<'_>) {
        self.seen.push((current.index(), window.len()));
    }
}

#[test]
fn duplicate_headers_are_suffixed_and_kept() {
    let prepared = prepare("\"RollRate,RollRate,VelocityX\"\n0.1,0.2,10\n0.1,0.2,10\n");
    assert!(prepared.is_playable());
    assert_eq!(
        prepared.load.renamed,
        vec![("RollRate".to_string(), "RollRate_1".to_string())]
    );
    assert!(prepared.table.channel("RollRate").is_some());
    assert!(prepared.table.channel("RollRate_1").is_some());
}

#[test]
fn missing_velocity_skips_ground_speed_only() {
    let prepared = prepare("VelocityX,RollAngle\n100,0\n100,0\n");
    assert!(prepared.table.derived("GroundSpeed").is_none());
    assert!(prepared.table.derived("PosX").is_some());
    assert!(prepared
        .derived
        .skipped
        .iter()
        .any(|m| m.output == "GroundSpeed" && m.channel == "VelocityY"));
    assert!(prepared
        .diagnostics()
        .iter()
        .any(|l| l.contains("GroundSpeed skipped")));
}

#[test]
fn units_are_converted_once_and_positions_stay_in_feet() {
    let csv = "VelocityX,VelocityY,RollAngle,RollRate\n\
               100,0,3.141592653589793,0.5\n\
               100,0,3.141592653589793,0.5\n\
               100,0,3.141592653589793,0.5\n";
    let prepared = prepare(csv);
    let table = &prepared.table;

    assert_abs_diff_eq!(table.sample("VelocityX", 0).unwrap(), 59.2484, epsilon = 1e-9);
    assert_abs_diff_eq!(table.sample("RollAngle", 0).unwrap(), 180.0, epsilon = 1e-9);
    assert_abs_diff_eq!(table.sample("RollRate", 0).unwrap(), 90.0, epsilon = 1e-9);
    assert_abs_diff_eq!(table.sample("GroundSpeed", 2).unwrap(), 59.2484, epsilon = 1e-9);
    assert_abs_diff_eq!(table.sample("PosX", 2).unwrap(), 15.0, epsilon = 1e-9);
    assert_abs_diff_eq!(table.sample("RollRate_Max", 2).unwrap(), 90.0, epsilon = 1e-9);
    assert!(prepared
        .normalization
        .converted
        .contains(&("RollRate".to_string(), ChannelRole::Rate)));
}

#[test]
fn garbage_cells_are_filled_and_reported() {
    let prepared = prepare("RollAngle,PitchAngle\n0,0\nERR,0\n0,nan\n");
    assert_eq!(prepared.table.len(), 3);
    assert_eq!(prepared.load.coercion_warnings.len(), 1);
    assert_eq!(prepared.load.coercion_warnings[0].channel, "RollAngle");
    assert_eq!(prepared.table.sample("RollAngle", 1), Some(0.0));
}

#[test]
fn config_sample_rate_drives_one_second_delta() {
    let mut config_file = NamedTempFile::new().unwrap();
    config_file
        .write_all(br#"{ "sample_rate_hz": 2, "smoothing": { "enabled": false } }"#)
        .unwrap();
    let config = ViewerConfig::load(config_file.path()).unwrap();

    let log = write_log("RollAngle\n0\n0.1\n0.2\n0.3\n");
    let prepared = prepare_log(log.path(), &config);
    let delta = prepared.table.derived("RollAngle_Delta1s").unwrap();
    assert_eq!(delta.values()[1], None);
    assert_abs_diff_eq!(
        delta.values()[2].unwrap(),
        0.2_f64.to_degrees(),
        epsilon = 1e-9
    );
}

#[test]
fn replay_over_prepared_log_wraps_and_seeks() {
    let prepared = prepare("RollAngle\n0\n1\n2\n3\n4\n");
    let mut config = ViewerConfig::default();
    config.display_window = 3;
    let mut session = ReplaySession::new(prepared.table, &config, ManualScheduler::default());
    let mut frames = Frames::default();

    session.start(&mut frames);
    assert_eq!(frames.seen, vec![(0, 1)]);
    assert!(!session.scheduler().is_pending());

    assert_eq!(session.toggle_play(), PlaybackState::Playing);
    session.set_speed(2);
    session.on_tick(&mut frames);
    session.on_tick(&mut frames);
    session.on_tick(&mut frames);
    assert_eq!(&frames.seen[1..], &[(2, 3), (4, 3), (0, 1)]);

    session.seek(99, &mut frames);
    assert_eq!(frames.seen.last(), Some(&(4, 3)));
    assert!(session.driver().is_playing());

    session.close();
    session.on_tick(&mut frames);
    assert_eq!(frames.seen.len(), 5);
    assert!(!session.scheduler().is_pending());
}

#[test]
fn empty_log_replays_nothing() {
    let prepared = prepare("RollAngle,PitchAngle\n");
    assert!(prepared.table.is_empty());
    assert!(!prepared.is_playable());

    let mut session =
        ReplaySession::new(prepared.table, &ViewerConfig::default(), ManualScheduler::default());
    let mut frames = Frames::default();
    session.start(&mut frames);
    assert_eq!(session.toggle_play(), PlaybackState::Paused);
    session.seek(3, &mut frames);
    session.on_tick(&mut frames);
    assert!(frames.seen.is_empty());
    assert_eq!(session.scheduler().scheduled, 0);
}

#[test]
fn unreadable_file_yields_empty_prepared_log() {
    let prepared = prepare_log(
        std::path::Path::new("/definitely/not/here.csv"),
        &ViewerConfig::default(),
    );
    assert!(prepared.load.error.is_some());
    assert!(prepared.table.is_empty());
    assert!(prepared.diagnostics()[0].starts_with("load failed"));
}

#[test]
fn unit_check_agrees_when_distance_tracks_raw_speed() {
    let mut csv = String::from("VelocityX,VelocityY,DistanceToSteerpoint\n");
    for i in 0..40 {
        csv.push_str(&format!("100,0,{}\n", 1000.0 - 5.0 * i as f64));
    }
    let config = ViewerConfig::default();
    let prepared = prepare(&csv);
    assert!(prepared.table.is_converted("VelocityX"));

    let check = table_unit_consistency(&prepared.table, config.dt()).unwrap();
    assert_abs_diff_eq!(check.ratio, 1.0, epsilon = 1e-9);
    assert_eq!(check.verdict, UnitVerdict::Consistent);
}

#[test]
fn blank_column_is_kept_as_zeros() {
    let prepared = prepare("VelocityX,VelocityY\n3,\n4,\n");
    assert_eq!(prepared.table.channel("VelocityY"), Some(&[0.0, 0.0][..]));
    assert!(prepared.load.skipped_columns.is_empty());
    assert!(prepared.table.derived("GroundSpeed").is_some());
    assert!(prepared
        .diagnostics()
        .iter()
        .any(|l| l.contains("VelocityY has no values")));
}

#[test]
fn rate_window_comes_from_config() {
    let mut config_file = NamedTempFile::new().unwrap();
    config_file
        .write_all(br#"{ "rate_window": 1, "smoothing": { "enabled": false } }"#)
        .unwrap();
    let config = ViewerConfig::load(config_file.path()).unwrap();

    let log = write_log("RollAngle\n0\n0\n1\n1\n");
    let prepared = prepare_log(log.path(), &config);
    let rate = prepared.table.derived("RollAngle_Rate").unwrap();
    assert_eq!(rate.values()[0], None);
    assert_abs_diff_eq!(rate.values()[1].unwrap(), 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(
        rate.values()[2].unwrap(),
        1.0_f64.to_degrees() / config.dt(),
        epsilon = 1e-6
    );
}
