//! Level-scaled combatant stats.
//!
//! `StatValues` holds the arithmetic. `Stat` and `VariableStat` wrap it in a
//! per-instance lock so a display thread can read values while the battle
//! thread mutates them. No lock ever spans two stats.

use parking_lot::Mutex;
use schema::StatGrowth;

/// Removing a modifier that lands this close to 1.0 snaps it back to exactly 1.0.
const MODIFIER_SNAP_EPSILON: f64 = 0.1;

/// Plain stat arithmetic: base + per-level gain, scaled by a multiplicative modifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatValues {
    pub base: i32,
    pub gain: i32,
    pub modifier: f64,
}

impl StatValues {
    pub fn new(base: i32, gain: i32) -> Self {
        Self {
            base,
            gain,
            modifier: 1.0,
        }
    }

    /// `round((base + gain * level) * modifier)`
    pub fn effective(&self, level: u32) -> i32 {
        let raw = self.base as f64 + self.gain as f64 * level as f64;
        (raw * self.modifier).round() as i32
    }

    pub fn add_modifier(&mut self, modifier: f64) {
        self.modifier *= modifier;
    }

    pub fn remove_modifier(&mut self, modifier: f64) {
        self.modifier /= modifier;
        if (self.modifier - 1.0).abs() < MODIFIER_SNAP_EPSILON {
            self.modifier = 1.0;
        }
    }
}

impl From<StatGrowth> for StatValues {
    fn from(growth: StatGrowth) -> Self {
        Self::new(growth.base, growth.gain)
    }
}

/// A fixed attribute such as strength or defense.
#[derive(Debug)]
pub struct Stat {
    values: Mutex<StatValues>,
}

impl Stat {
    pub fn new(base: i32, gain: i32) -> Self {
        Self::from_values(StatValues::new(base, gain))
    }

    pub fn from_values(values: StatValues) -> Self {
        Self {
            values: Mutex::new(values),
        }
    }

    pub fn effective(&self, level: u32) -> i32 {
        self.values.lock().effective(level)
    }

    pub fn modifier(&self) -> f64 {
        self.values.lock().modifier
    }

    pub fn add_modifier(&self, modifier: f64) {
        self.values.lock().add_modifier(modifier);
    }

    pub fn remove_modifier(&self, modifier: f64) {
        self.values.lock().remove_modifier(modifier);
    }

    /// Copy of the current values, taken under the lock.
    pub fn snapshot(&self) -> StatValues {
        *self.values.lock()
    }
}

impl Clone for Stat {
    fn clone(&self) -> Self {
        Self::from_values(self.snapshot())
    }
}

impl From<StatGrowth> for Stat {
    fn from(growth: StatGrowth) -> Self {
        Self::from_values(growth.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct VariableValues {
    stat: StatValues,
    current: i32,
}

impl VariableValues {
    /// Re-derive `current` from the ratio it held before a max change.
    fn rescale(&mut self, percent: f64, was_alive: bool, level: u32) {
        let max = self.stat.effective(level);
        let mut current = (max as f64 * percent).round() as i32;
        if was_alive {
            current = current.max(1);
        }
        self.current = current.clamp(0, max.max(0));
    }

    fn percent(&self, level: u32) -> f64 {
        let max = self.stat.effective(level);
        if max <= 0 {
            0.0
        } else {
            self.current as f64 / max as f64
        }
    }
}

/// A stat with a bounded current value (hp, mp).
///
/// Invariant: `0 <= current <= max(level)`. Modifier changes keep the
/// current/max ratio and never take a living value down to 0.
#[derive(Debug)]
pub struct VariableStat {
    values: Mutex<VariableValues>,
}

impl VariableStat {
    /// Create a vital already restored to its max at `level`.
    pub fn new(base: i32, gain: i32, level: u32) -> Self {
        let stat = StatValues::new(base, gain);
        Self {
            values: Mutex::new(VariableValues {
                current: stat.effective(level).max(0),
                stat,
            }),
        }
    }

    pub fn from_growth(growth: StatGrowth, level: u32) -> Self {
        Self::new(growth.base, growth.gain, level)
    }

    pub fn current(&self) -> i32 {
        self.values.lock().current
    }

    pub fn max(&self, level: u32) -> i32 {
        self.values.lock().stat.effective(level)
    }

    /// Current and max read under a single lock, for display.
    pub fn read(&self, level: u32) -> (i32, i32) {
        let values = self.values.lock();
        (values.current, values.stat.effective(level))
    }

    pub fn modifier(&self) -> f64 {
        self.values.lock().stat.modifier
    }

    pub fn is_depleted(&self) -> bool {
        self.current() <= 0
    }

    /// Refill to max.
    pub fn restore(&self, level: u32) {
        let mut values = self.values.lock();
        values.current = values.stat.effective(level).max(0);
    }

    /// Overwrite the current value, clamped into `0..=max`.
    pub fn set_current(&self, current: i32, level: u32) {
        let mut values = self.values.lock();
        let max = values.stat.effective(level).max(0);
        values.current = current.clamp(0, max);
    }

    /// Add up to `amount`, capped at max. Returns whether the full amount fit.
    pub fn gain(&self, amount: u32, level: u32) -> bool {
        let mut values = self.values.lock();
        let max = values.stat.effective(level).max(0);
        let target = values.current as i64 + amount as i64;
        if target > max as i64 {
            values.current = max;
            false
        } else {
            values.current = target as i32;
            true
        }
    }

    /// Remove up to `amount`, floored at 0. Returns whether the full amount was taken.
    pub fn lose(&self, amount: u32) -> bool {
        let mut values = self.values.lock();
        let target = values.current as i64 - amount as i64;
        if target < 0 {
            values.current = 0;
            false
        } else {
            values.current = target as i32;
            true
        }
    }

    pub fn add_modifier(&self, modifier: f64, level: u32) {
        let mut values = self.values.lock();
        let percent = values.percent(level);
        let was_alive = values.current > 0;
        values.stat.add_modifier(modifier);
        values.rescale(percent, was_alive, level);
    }

    pub fn remove_modifier(&self, modifier: f64, level: u32) {
        let mut values = self.values.lock();
        let percent = values.percent(level);
        let was_alive = values.current > 0;
        values.stat.remove_modifier(modifier);
        values.rescale(percent, was_alive, level);
    }
}

impl Clone for VariableStat {
    fn clone(&self) -> Self {
        Self {
            values: Mutex::new(*self.values.lock()),
        }
    }
}
