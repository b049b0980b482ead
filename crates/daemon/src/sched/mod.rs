// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cron-driven and missed-run execution of scheduled apps.
//!
//! A job per app is installed when a schedule is declared and enabled; any
//! config change cancels and reinstalls the whole table. Firing is driven
//! by the daemon's tick interval, which shares the process table with
//! interactive launches — the composite `:sync` key keeps the two from
//! colliding.

pub mod cron;

pub use cron::{CronError, CronExpr};

use chrono::{Local, NaiveDateTime};
use parking_lot::Mutex;
use ql_storage::{ConfigDocument, ScheduleRecord};
use std::collections::HashMap;
use tracing::{debug, warn};

/// One installed schedule job.
#[derive(Debug, Clone)]
struct ScheduleJob {
    expr: CronExpr,
    next_fire: Option<NaiveDateTime>,
}

/// The cooperative scheduler. Holds only bookkeeping; execution goes
/// through the supervisor so scheduled and interactive launches share one
/// process table.
#[derive(Default)]
pub struct Scheduler {
    jobs: Mutex<HashMap<String, ScheduleJob>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel-and-reinstall all jobs from the config document.
    pub fn reload(&self, doc: &ConfigDocument, now: NaiveDateTime) {
        let mut jobs = self.jobs.lock();
        jobs.clear();
        for app in &doc.apps {
            if !app.schedule_enabled {
                continue;
            }
            let Some(schedule) = app.schedule.as_deref().filter(|s| !s.is_empty()) else {
                continue;
            };
            match CronExpr::parse(schedule) {
                Ok(expr) => {
                    let next_fire = expr.next_after(now);
                    debug!(app = %app.id, schedule, next = ?next_fire, "schedule installed");
                    jobs.insert(app.id.clone(), ScheduleJob { expr, next_fire });
                }
                Err(e) => {
                    warn!(app = %app.id, schedule, error = %e, "invalid schedule, skipping");
                }
            }
        }
    }

    /// App ids whose next fire time has arrived; their timers advance.
    pub fn due(&self, now: NaiveDateTime) -> Vec<String> {
        let mut fired = Vec::new();
        let mut jobs = self.jobs.lock();
        for (app_id, job) in jobs.iter_mut() {
            if let Some(next) = job.next_fire {
                if next <= now {
                    fired.push(app_id.clone());
                    job.next_fire = job.expr.next_after(now);
                }
            }
        }
        fired
    }

    /// Next fire time for an app, if a job is installed.
    pub fn next_fire(&self, app_id: &str) -> Option<NaiveDateTime> {
        self.jobs.lock().get(app_id).and_then(|j| j.next_fire)
    }

    /// Whether a job is installed for an app.
    pub fn is_installed(&self, app_id: &str) -> bool {
        self.jobs.lock().contains_key(app_id)
    }
}

/// Apps whose scheduled run was missed and should execute at startup.
///
/// Missed means: the schedule was due earlier today, and the recorded last
/// run (if any) happened on a previous calendar day.
pub fn missed_apps(
    doc: &ConfigDocument,
    state: &HashMap<String, ScheduleRecord>,
    now: NaiveDateTime,
) -> Vec<String> {
    let today = now.date();
    let mut missed = Vec::new();
    for app in &doc.apps {
        if !app.schedule_enabled || !app.run_if_missed {
            continue;
        }
        let Some(schedule) = app.schedule.as_deref().filter(|s| !s.is_empty()) else {
            continue;
        };
        let Ok(expr) = CronExpr::parse(schedule) else {
            continue;
        };
        if !expr.due_today_before(now) {
            continue;
        }
        let ran_today = state
            .get(&app.id)
            .and_then(|r| r.last_run)
            .map(|lr| lr.with_timezone(&Local).date_naive() == today)
            .unwrap_or(false);
        if !ran_today {
            missed.push(app.id.clone());
        }
    }
    missed
}

#[cfg(test)]
#[path = "sched_tests.rs"]
mod tests;
