use std::env;
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveTime;

use crate::store::slots::SlotPolicy;

const MAX_PANEL_IDLE_MINUTES: u64 = 7 * 24 * 60;

#[derive(Clone, Debug)]
pub struct Config {
    /// Postgres collaborators when set, in-memory otherwise.
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub seed_file: Option<PathBuf>,
    pub panel_idle_minutes: u64,
    pub slot_policy: SlotPolicy,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string());
        let seed_file = lookup("SEED_FILE").map(PathBuf::from);
        let panel_idle_minutes = match lookup("PANEL_IDLE_MINUTES") {
            Some(raw) => parse_in_range(&raw, 1, MAX_PANEL_IDLE_MINUTES)
                .context("PANEL_IDLE_MINUTES must be a number of minutes")?,
            None => 30,
        };

        let defaults = SlotPolicy::default();
        let workday_start = match lookup("WORKDAY_START") {
            Some(raw) => parse_hhmm(&raw).context("WORKDAY_START must be HH:MM")?,
            None => defaults.workday_start,
        };
        let workday_end = match lookup("WORKDAY_END") {
            Some(raw) => parse_hhmm(&raw).context("WORKDAY_END must be HH:MM")?,
            None => defaults.workday_end,
        };
        if workday_end <= workday_start {
            anyhow::bail!("WORKDAY_END must be after WORKDAY_START");
        }
        let slot_minutes = match lookup("SLOT_MINUTES") {
            Some(raw) => parse_in_range(&raw, 1, SlotPolicy::MAX_SLOT_MINUTES)
                .context("SLOT_MINUTES must be a number of minutes")?,
            None => defaults.slot_minutes,
        };
        let search_days = match lookup("SLOT_SEARCH_DAYS") {
            Some(raw) => parse_in_range(&raw, 1, SlotPolicy::MAX_SEARCH_DAYS)
                .context("SLOT_SEARCH_DAYS must be a number of days")?,
            None => defaults.search_days,
        };

        Ok(Self {
            database_url,
            bind_addr,
            seed_file,
            panel_idle_minutes,
            slot_policy: SlotPolicy {
                workday_start,
                workday_end,
                slot_minutes,
                search_days,
            },
        })
    }
}

fn parse_hhmm(raw: &str) -> anyhow::Result<NaiveTime> {
    Ok(NaiveTime::parse_from_str(raw.trim(), "%H:%M")?)
}

fn parse_in_range<T>(raw: &str, min: T, max: T) -> anyhow::Result<T>
where
    T: std::str::FromStr + PartialOrd + std::fmt::Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value: T = raw.trim().parse()?;
    if value < min || value > max {
        anyhow::bail!("{value} is outside {min}..={max}");
    }
    Ok(value)
}
