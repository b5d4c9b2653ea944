use std::io::Write;

use tale_core::builder::{multiplex, parallel, wait, wait_ticks};
use tale_runtime::{ConfigLoader, Director, RecoveryPolicy, RuntimeError};

#[test]
fn loads_director_settings_from_a_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
fps = 30
max_frames = 120

[director]
recovery = "halt"
time_scale = 0.5

[director.scheduler.queue]
base_capacity = 100

[director.scheduler.pool]
max_capacity = -1
"#
    )
    .unwrap();

    let config = ConfigLoader::load(file.path()).unwrap();
    assert_eq!(config.fps, 30);
    assert_eq!(config.max_frames, 120);
    assert_eq!(config.director.recovery, RecoveryPolicy::Halt);
    assert_eq!(config.director.scheduler.pool.max_capacity, -1);

    // Non power-of-two capacities are rounded up when the director is built.
    let director = Director::new(&config.director).unwrap();
    assert_eq!(director.scheduler().queue_capacity(), 128);
    assert_eq!(director.clock().time_scale(), 0.5);
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConfigLoader::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, RuntimeError::ReadConfig { .. }));
}

#[test]
fn time_scale_stretches_scaled_waits() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[director]\ntime_scale = 0.5").unwrap();
    let config = ConfigLoader::load(file.path()).unwrap();

    let mut director = Director::new(&config.director).unwrap();
    director.scheduler_mut().enqueue_task(wait(1.0));

    // Half speed: one second of scaled time takes two of wall-clock time.
    let summary = director.run_until_idle(0.25, 100).unwrap();
    assert!(summary.completed);
    assert_eq!(summary.frames, 8);
}

#[test]
fn scene_change_drops_work_and_shrinks_containers() {
    let mut director = Director::new(&Default::default()).unwrap();
    let burst: Vec<_> = (0..20_000).map(|_| wait_ticks(1_000)).collect();
    director
        .scheduler_mut()
        .enqueue_task(multiplex(vec![parallel(burst), wait_ticks(1_000)]));
    director.frame(0.016).unwrap();
    assert!(director.scheduler().parallel_capacity() >= 16_384);

    director.change_scene();

    let scheduler = director.scheduler();
    assert!(scheduler.is_idle());
    assert_eq!(scheduler.parallel_capacity(), 64);
    assert!(director.overlay().contains("0 live"));
}
