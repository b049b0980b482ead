// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[yare::parameterized(
    clean          = { 0 },
    ctrl_c         = { 0xC000_013A },
    logoff         = { 0x4001_0004 },
)]
fn normal_codes(code: i64) {
    assert!(is_normal_exit(code));
}

#[yare::parameterized(
    one       = { 1 },
    segfault  = { 139 },
    negative  = { -1 },
    nt_other  = { 0xC000_0005 },
)]
fn abnormal_codes(code: i64) {
    assert!(!is_normal_exit(code));
}

#[test]
fn clean_exit_is_normal_regardless_of_run_time() {
    assert_eq!(
        classify(Some(0), Duration::from_millis(100)),
        ExitClass::NormalTermination
    );
    assert_eq!(
        classify(Some(0), Duration::from_secs(3600)),
        ExitClass::NormalTermination
    );
}

#[test]
fn ctrl_c_is_normal_even_during_startup() {
    assert_eq!(
        classify(Some(0xC000_013A), Duration::from_millis(200)),
        ExitClass::NormalTermination
    );
}

#[test]
fn early_crash_is_startup_crash() {
    assert_eq!(
        classify(Some(1), Duration::from_secs(2)),
        ExitClass::StartupCrash
    );
}

#[test]
fn crash_at_window_boundary_is_runtime_crash() {
    assert_eq!(
        classify(Some(1), STARTUP_CRASH_WINDOW),
        ExitClass::RuntimeCrash
    );
}

#[test]
fn late_crash_is_runtime_crash() {
    assert_eq!(
        classify(Some(1), Duration::from_secs(10)),
        ExitClass::RuntimeCrash
    );
}

#[test]
fn signal_death_is_abnormal() {
    assert_eq!(
        classify(None, Duration::from_secs(1)),
        ExitClass::StartupCrash
    );
    assert_eq!(
        classify(None, Duration::from_secs(30)),
        ExitClass::RuntimeCrash
    );
}
